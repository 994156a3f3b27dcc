//! # Google Sheets
//!
//! Read-only access to the spreadsheet holding the student records.
//!
//! ## Flow
//!
//! - Sign a JWT assertion with the service account private key (RS256)
//! - Exchange it for an access token at the OAuth token endpoint
//! - `GET` the value range with the token as a bearer credential
//! - A range with no data comes back without a `values` field, treated as zero rows
//!
//! ## Notes
//!
//! A fresh token is requested per lookup. Lookups are rare enough that holding a token
//! around is not worth the bookkeeping.
//!
//! Private keys usually arrive through environment variables with literal `\n` sequences,
//! those are turned back into real newlines before the key is parsed.
use async_trait::async_trait;

pub mod auth;
pub mod client;
pub mod error;

pub use auth::ServiceAccount;
pub use client::{SheetsClient, ValueRange};
pub use error::SheetsError;

/// Anything that can hand back the rows of a range, top to bottom.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch_rows(&self, range: &str) -> Result<Vec<Vec<String>>, SheetsError>;
}
