//! Release catalog backed by Bodhi.
//!
//! Cookies are rate limited per release cycle. [`current_period`] asks
//! Bodhi for the supported releases and picks the one cookies are currently
//! given for: the most recent release of the main distribution.
//!
//! # Modules
//!
//! - `client` - [`ReleaseClient`] trait and its HTTP implementation [`BodhiClient`]
//! - `structs` - Releases as returned by Bodhi

mod client;
mod structs;

use log::debug;

#[cfg(test)]
pub use crate::releases::client::MockReleaseClient;
pub use crate::releases::client::{BodhiClient, ReleaseClient};
pub use crate::releases::structs::ReleasePeriod;

use crate::error::InfoGatherError;

const RELEASE_SERVICE: &str = "Bodhi";

/// Returns the current release period.
///
/// Only releases whose `id_prefix` is exactly `primary_prefix` are
/// considered, which leaves out containers, flatpaks and the like. The
/// highest numeric version wins, ties are broken by the latest end of life.
///
/// # Arguments
///
/// * `client` - Release catalog client
/// * `primary_prefix` - Update id prefix of the main distribution, e.g. `FEDORA`
pub async fn current_period<R: ReleaseClient>(
    client: &R,
    primary_prefix: &str,
) -> Result<ReleasePeriod, InfoGatherError> {
    let releases = client
        .get_current_releases()
        .await
        .map_err(|e| InfoGatherError::unavailable(RELEASE_SERVICE, e))?;

    let current = releases
        .into_iter()
        .filter(|release| release.id_prefix == primary_prefix)
        .max_by(|a, b| {
            a.numeric_version()
                .cmp(&b.numeric_version())
                .then_with(|| a.eol.cmp(&b.eol))
        })
        .ok_or(InfoGatherError::NoCurrentRelease)?;

    debug!(
        "current release is {} ({})",
        current.label(),
        current.long_name.as_deref().unwrap_or("unnamed")
    );
    Ok(current)
}
