//! Matrix client synchronization and event handling.
//!
//! The [`MatrixSync::sync`] method:
//! 1. Performs an initial sync to catch up on offline events (especially invites)
//! 2. Sets up event handlers for auto-joining rooms and message processing
//! 3. Enters a continuous sync loop with automatic token persistence
//!
//! Only text messages sent by other users in joined rooms reach the message
//! handler, as [`ChatMessage`]s.

use anyhow::Result;
use std::sync::Arc;

use log::{error, info, warn};
use matrix_sdk::{
    Client, LoopCtrl, Room, RoomState,
    config::SyncSettings,
    ruma::{
        api::client::filter::FilterDefinition,
        events::room::{
            member::StrippedRoomMemberEvent,
            message::{MessageFormat, MessageType, OriginalSyncRoomMessageEvent},
        },
    },
};
use tokio::time::{Duration, sleep};

use crate::{
    matrix::session::SessionStore,
    message::{ChatMessage, strip_html_reply_fallback, strip_reply_fallback},
};

pub struct MatrixSync {
    client: Client,
    session: SessionStore,
}

impl MatrixSync {
    pub fn new(client: &Client, session: &SessionStore) -> Self {
        MatrixSync {
            client: client.to_owned(),
            session: session.to_owned(),
        }
    }

    pub async fn sync<F>(&self, on_message: F) -> Result<()>
    where
        F: Fn(ChatMessage) + Send + Sync + 'static,
    {
        info!("start syncing");

        // Auto join rooms when invited
        self.client.add_event_handler(auto_join_rooms);

        // Enable room members lazy-loading
        // See <https://spec.matrix.org/v1.6/client-server-api/#lazy-loading-room-members>.
        let filter = FilterDefinition::with_lazy_loading();
        let mut sync_settings = SyncSettings::default().filter(filter.into());

        if let Some(sync_token) = self.session.sync_token() {
            sync_settings = sync_settings.token(sync_token);
        }

        // First sync to only get the invitations received while the bot was offline
        let response = loop {
            match self.client.sync_once(sync_settings.clone()).await {
                Ok(response) => break response,
                Err(error) => {
                    error!("an error occurred during initial sync: {error}, trying again");
                    sleep(Duration::from_secs(5)).await;
                }
            }
        };
        if let Err(err) = self
            .session
            .persist_sync_token(response.next_batch.clone())
            .await
        {
            error!("failed to persist sync token: {:?}", err);
        }

        let on_message = Arc::new(on_message);

        // Listen to incoming room messages. Because we are listening after the sync_once, we only get new messages.
        self.client.add_event_handler({
            let on_message = Arc::clone(&on_message);
            move |event: OriginalSyncRoomMessageEvent, room: Room| {
                let on_message = Arc::clone(&on_message);
                async move { on_room_message(event, room, on_message.as_ref()) }
            }
        });

        // Since we called `sync_once` before we entered our sync loop we must pass
        // that sync token to `sync_with_result_callback`
        sync_settings = sync_settings.token(response.next_batch);

        self.client
            .sync_with_result_callback(sync_settings, |sync_result| async move {
                let response = sync_result?;

                // We persist the token each time to be able to restore our session
                if let Err(err) = self.session.persist_sync_token(response.next_batch).await {
                    error!("failed to persist sync token: {:?}", err);
                }

                Ok(LoopCtrl::Continue)
            })
            .await?;

        Ok(())
    }
}

async fn auto_join_rooms(room_member: StrippedRoomMemberEvent, client: Client, room: Room) {
    let Some(user_id) = client.user_id() else {
        warn!("could not get user id from client");
        return;
    };

    // Ignore if the invite is not for us
    if room_member.state_key != user_id {
        return;
    }

    tokio::spawn(async move {
        info!("auto joining room {}", room.room_id());
        let mut delay = 2;

        while let Err(err) = room.join().await {
            // Synapse may send the invite before the invited user can join, see
            // https://github.com/matrix-org/synapse/issues/4345
            error!(
                "failed to join room {} ({err:?}), retrying in {delay}s",
                room.room_id()
            );

            sleep(Duration::from_secs(delay)).await;
            delay *= 2;

            if delay > 3600 {
                error!("can't join room {} ({err:?})", room.room_id());
                return;
            }
        }
        info!("successfully joined room {}", room.room_id());
    });
}

fn on_room_message<F>(event: OriginalSyncRoomMessageEvent, room: Room, on_message: &F)
where
    F: Fn(ChatMessage),
{
    // Ignore messages from non-joined rooms
    if room.state() != RoomState::Joined {
        return;
    }

    // Ignore our own messages
    if event.sender.as_str() == room.own_user_id().as_str() {
        return;
    }

    // Only handle text messages
    let MessageType::Text(text_content) = event.content.msgtype else {
        return;
    };

    let formatted_body = text_content
        .formatted
        .filter(|formatted| formatted.format == MessageFormat::Html)
        .map(|formatted| strip_html_reply_fallback(&formatted.body));

    on_message(ChatMessage {
        body: strip_reply_fallback(&text_content.body).to_owned(),
        formatted_body,
        sender: event.sender.to_string(),
        room_id: room.room_id().to_string(),
        event_id: event.event_id.to_string(),
    });
}
