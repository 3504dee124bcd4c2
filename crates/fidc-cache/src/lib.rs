#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/fidc-data/fidc-data/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Caching implementations for the FIDC filings ETL.
//!
//! This crate provides implementations of the [`CacheStore`] trait from
//! `fidc-core`:
//!
//! - [`DiskCache`] - persistent flat-directory cache (default)
//! - [`InMemoryCache`] - simple in-memory cache for testing
//! - [`NoopCache`] - no-op cache that doesn't store anything

/// Disk-backed cache implementation.
pub mod disk;
/// In-memory cache implementation.
pub mod memory;
/// No-op cache implementation.
pub mod noop;

// Re-export the trait for convenience
pub use fidc_core::CacheStore;

// Re-export implementations
pub use disk::DiskCache;
pub use memory::InMemoryCache;
pub use noop::NoopCache;
