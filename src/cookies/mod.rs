//! Cookie ledger.
//!
//! Users thank each other by giving cookies, at most one per recipient and
//! per release cycle. Grants are stored in SQLite and never removed.
//!
//! # Modules
//!
//! - `ledger` - [`CookieLedger`] enforcing the giving rules
//! - `store` - SQLite table of grants

mod ledger;
mod store;

use thiserror::Error;

pub use crate::cookies::ledger::{CookieLedger, GiveOutcome};

/// Failure of the cookie ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The grant already exists for this giver, recipient and release.
    #[error("cookie already given during this release")]
    DuplicateGrant,

    #[error("cookie storage failure: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("cookie storage lock poisoned")]
    Poisoned,
}
