//! Cookie giving rules on top of [`CookieStore`].

use std::{path::Path, sync::Arc};

use log::{debug, info};

use crate::{
    cookies::{
        LedgerError,
        store::{CookieGrant, CookieStore},
    },
    releases::ReleasePeriod,
};

/// Result of a give attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiveOutcome {
    /// The cookie was recorded, `total` is the new all-time count of the recipient.
    Recorded { total: u64 },
    /// The giver already gave a cookie to the recipient during this release.
    AlreadyGiven,
}

/// Shared handle to the cookie ledger.
///
/// A user can give one cookie per recipient and per release. Cloning the
/// ledger shares the underlying database.
#[derive(Clone)]
pub struct CookieLedger {
    store: Arc<CookieStore>,
}

impl CookieLedger {
    /// Opens the ledger stored at `path`.
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        Ok(CookieLedger {
            store: Arc::new(CookieStore::open(path)?),
        })
    }

    /// Opens a ledger that is not persisted.
    #[cfg(test)]
    pub fn in_memory() -> Result<Self, LedgerError> {
        Ok(CookieLedger {
            store: Arc::new(CookieStore::open_in_memory()?),
        })
    }

    /// Gives a cookie from `giver` to `recipient` for `period`.
    ///
    /// Both users are directory usernames. When two gives for the same
    /// triple race, the unique constraint of the store lets exactly one of
    /// them through.
    ///
    /// # Arguments
    ///
    /// * `giver` - Username of the user giving the cookie
    /// * `recipient` - Username of the user receiving the cookie
    /// * `period` - Current release period
    pub fn give(
        &self,
        giver: &str,
        recipient: &str,
        period: &ReleasePeriod,
    ) -> Result<GiveOutcome, LedgerError> {
        let grant = CookieGrant {
            from_user: giver.to_owned(),
            to_user: recipient.to_owned(),
            release: period.version.clone(),
        };

        if self.store.has_grant(&grant)? {
            debug!("{} already gave a cookie to {} during {}", giver, recipient, period.label());
            return Ok(GiveOutcome::AlreadyGiven);
        }

        match self.store.insert_grant(&grant) {
            Ok(()) => {}
            Err(LedgerError::DuplicateGrant) => {
                debug!("concurrent cookie from {} to {} during {}", giver, recipient, period.label());
                return Ok(GiveOutcome::AlreadyGiven);
            }
            Err(e) => return Err(e),
        }

        let total = self.store.count_for(recipient)?;
        info!("{} gave a cookie to {}, total {}", giver, recipient, total);
        Ok(GiveOutcome::Recorded { total })
    }

    /// Number of cookies `user` received over all releases.
    pub fn count(&self, user: &str) -> Result<u64, LedgerError> {
        self.store.count_for(user)
    }
}
