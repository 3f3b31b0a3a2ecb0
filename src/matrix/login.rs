//! Login of the bot account.
//!
//! The first start logs in with the password and persists the session, the
//! next starts restore it. The local store is encrypted with the passphrase.

use log::{debug, info};
use matrix_sdk::{Client, ruma::OwnedUserId};

use crate::matrix::{UserCredentials, session::SessionStore};

/// Returns a logged in client, restoring the stored session if any.
pub async fn setup_client(
    user_credentials: &UserCredentials,
    session_store: &SessionStore,
) -> Result<Client, anyhow::Error> {
    info!(
        "setting up matrix client for user {}",
        user_credentials.user_id
    );

    let user_id: OwnedUserId = user_credentials.user_id.clone().try_into()?;
    let client = Client::builder()
        .server_name(user_id.server_name())
        .sqlite_store(
            session_store.sqlite_path(),
            Some(&user_credentials.passphrase),
        )
        .build()
        .await?;
    debug!("matrix client created");

    match session_store.user_session() {
        Some(user_session) => {
            info!("restoring matrix session from disk");
            client.restore_session(user_session.clone()).await?;
        }
        None => {
            info!("logging in as {}", user_id);
            client
                .matrix_auth()
                .login_username(&user_id, &user_credentials.password)
                .initial_device_display_name("cookiebot")
                .send()
                .await?;

            let user_session = client
                .matrix_auth()
                .session()
                .ok_or_else(|| anyhow::anyhow!("no session after login"))?;
            session_store.persist_user_session(&user_session).await?;
        }
    }

    info!("matrix client setup complete");
    Ok(client)
}
