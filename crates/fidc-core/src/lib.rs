#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/fidc-data/fidc-data/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types for the FIDC filings ETL.
//!
//! This crate provides the foundational pieces shared by the client, parser and
//! pipeline crates:
//!
//! - [`FundId`](types::FundId) - normalized 14-digit fund identifier (CNPJ)
//! - [`FilingDescriptor`](types::FilingDescriptor) - one discoverable filing
//! - [`FinancialSnapshot`](snapshot::FinancialSnapshot) - one fund's parsed monthly filing
//! - [`FieldValue`](types::FieldValue) - tagged text-or-numeric field value
//! - [`CacheStore`](cache::CacheStore) - caching abstraction
//! - [`Error`](error::Error) / [`ProcessingStatus`](error::ProcessingStatus) - failure taxonomy

/// Cache trait for storing fetched payloads.
pub mod cache;
/// Brazilian-locale numeric and date conversion.
pub mod convert;
/// Error types and the per-snapshot status taxonomy.
pub mod error;
/// Derived financial risk indicators.
pub mod indicators;
/// The parsed filing record.
pub mod snapshot;
/// Identifier, descriptor and field-value types.
pub mod types;

// Re-export commonly used items at crate root
pub use cache::CacheStore;
pub use error::{Error, ProcessingStatus, Result};
pub use snapshot::{FinancialSnapshot, ValidationFlags};
pub use types::{FieldKind, FieldValue, FilingDescriptor, FundId};
