//! Error types and the per-snapshot status taxonomy.
//!
//! Every failure that is local to one fund identifier maps onto a
//! [`ProcessingStatus`] so the pipeline can record it in the output table
//! instead of aborting the batch.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while discovering, downloading or parsing filings.
#[derive(Error, Debug)]
pub enum Error {
    /// Discovery returned no filings, or the search call failed terminally.
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// No active monthly filing among the discovered documents.
    #[error("No monthly filing: {0}")]
    NoMonthlyFiling(String),

    /// No filing with a parseable reference period.
    #[error("No valid reference date: {0}")]
    NoValidDate(String),

    /// Filing download failed terminally.
    #[error("Download error: {0}")]
    Download(String),

    /// Filing content could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The transport timed out after exhausting retries.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The transport could not connect after exhausting retries.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Error interacting with the cache.
    #[error("Cache error: {0}")]
    Cache(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Any other error.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// The status code this error collapses to in the output table.
    #[must_use]
    pub const fn status(&self) -> ProcessingStatus {
        match self {
            Self::Discovery(_) => ProcessingStatus::NoDocuments,
            Self::NoMonthlyFiling(_) => ProcessingStatus::NoMonthlyFiling,
            Self::NoValidDate(_) => ProcessingStatus::NoValidDate,
            Self::Download(_) => ProcessingStatus::DownloadError,
            Self::Parse(_) => ProcessingStatus::ParseError,
            Self::Timeout(_) => ProcessingStatus::Timeout,
            Self::Connection(_) => ProcessingStatus::ConnectionError,
            Self::Cache(_) | Self::InvalidParameter(_) | Self::Unexpected(_) => {
                ProcessingStatus::UnexpectedError
            }
        }
    }
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Closed status taxonomy for one processed snapshot.
///
/// Serialized in SCREAMING_SNAKE_CASE, which is also the form written to the
/// output table's `STATUS` column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    /// The filing was discovered, downloaded and parsed.
    #[default]
    Success,
    /// Discovery returned nothing for this identifier.
    NoDocuments,
    /// Documents exist but none is an active monthly filing.
    NoMonthlyFiling,
    /// Monthly filings exist but none has a parseable reference period.
    NoValidDate,
    /// The filing content could not be downloaded.
    DownloadError,
    /// The filing content could not be parsed.
    ParseError,
    /// The transport timed out.
    Timeout,
    /// The transport could not connect.
    ConnectionError,
    /// Anything not covered above.
    UnexpectedError,
}

impl ProcessingStatus {
    /// Stable string form used in the output table.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::NoDocuments => "NO_DOCUMENTS",
            Self::NoMonthlyFiling => "NO_MONTHLY_FILING",
            Self::NoValidDate => "NO_VALID_DATE",
            Self::DownloadError => "DOWNLOAD_ERROR",
            Self::ParseError => "PARSE_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::ConnectionError => "CONNECTION_ERROR",
            Self::UnexpectedError => "UNEXPECTED_ERROR",
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
