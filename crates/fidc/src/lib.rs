#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/fidc-data/fidc-data/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! End-to-end ETL for FIDC monthly regulatory filings.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fidc::{DiskCache, EtlPipeline, Exporter, FnetClient, FundId};
//!
//! #[tokio::main]
//! async fn main() -> fidc::Result<()> {
//!     let cache = Arc::new(DiskCache::new(".cache_api"));
//!     let pipeline = EtlPipeline::new(FnetClient::new(cache));
//!
//!     let funds = vec![FundId::new("51.199.121/0001-45")];
//!     let table = pipeline.run(&funds).await;
//!     let flags = fidc::validator::validate_all(&table);
//!
//!     Exporter::new("output").export_snapshots(&table, &flags)?;
//!     Ok(())
//! }
//! ```

// Core types
pub use fidc_core::*;

// Cache implementations
pub use fidc_cache::{DiskCache, InMemoryCache, NoopCache};

// Remote-registry client
pub use fidc_client::{ClientConfig, Fetched, FnetClient};

// Filing parser
pub use fidc_parser::parse;

pub mod diff;
pub mod export;
pub mod pipeline;
pub mod validator;

pub use diff::{DiffRecord, diff_tables};
pub use export::Exporter;
pub use pipeline::{EtlPipeline, PipelineConfig, summarize};
