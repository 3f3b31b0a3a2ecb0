//! Matrix client wrapper for bot messaging and synchronization.
//!
//! This module provides a high-level [`MatrixClient`] interface that wraps the
//! Matrix SDK client and handles replies, room member lookups,
//! synchronization and session management.

use std::{collections::HashSet, path::Path};

use anyhow::Context;
use log::{error, info};
use matrix_sdk::{
    Client, RoomMemberships,
    ruma::{
        EventId, RoomId, UserId,
        events::room::message::{
            AddMentions, ForwardThread, ReplyMetadata, RoomMessageEventContent,
        },
    },
};

use crate::{
    commands::CommandResult,
    matrix::{UserCredentials, login::setup_client, session::SessionStore, sync::MatrixSync},
    message::ChatMessage,
};

pub struct MatrixClient {
    matrix_sync: MatrixSync,
    client: Client,
}

impl MatrixClient {
    /// Logs in, or restores the session stored in `data_dir`.
    pub async fn new(
        user_credentials: &UserCredentials,
        data_dir: &Path,
    ) -> Result<Self, anyhow::Error> {
        let session_store = SessionStore::open(data_dir)
            .await
            .context("failed to open matrix session")?;

        let client = setup_client(user_credentials, &session_store)
            .await
            .context("failed to setup matrix client")?;

        let matrix_sync = MatrixSync::new(&client, &session_store);

        Ok(MatrixClient {
            matrix_sync,
            client,
        })
    }

    /// Syncs forever, calling `on_message` for every new text message.
    pub async fn sync<F>(&self, on_message: F) -> Result<(), anyhow::Error>
    where
        F: Fn(ChatMessage) + Send + Sync + 'static,
    {
        match self.matrix_sync.sync(on_message).await {
            Ok(_) => info!("matrix sync ended successfully"),
            Err(e) => error!("matrix sync ended with error: {:?}", e),
        }

        Ok(())
    }

    /// Matrix ids of the users currently joined to a room.
    pub async fn get_joined_members(&self, room_id: &str) -> Result<HashSet<String>, anyhow::Error> {
        let room_id = RoomId::parse(room_id)?;
        let room = self
            .client
            .get_room(&room_id)
            .ok_or_else(|| anyhow::anyhow!("unknown room {}", room_id))?;

        let members = room.members(RoomMemberships::JOIN).await?;
        Ok(members
            .iter()
            .map(|member| member.user_id().to_string())
            .collect())
    }

    /// Replies to `message` with the result of a command.
    ///
    /// Results with an HTML rendering are sent as is, the others are
    /// rendered from Markdown.
    pub async fn send_reply(&self, message: &ChatMessage, result: &CommandResult) {
        let content = match &result.html_response {
            Some(html) => RoomMessageEventContent::text_html(&result.response, html),
            None => RoomMessageEventContent::text_markdown(&result.response),
        };

        let (sender, event) = match (
            UserId::parse(&message.sender),
            EventId::parse(&message.event_id),
        ) {
            (Ok(sender), Ok(event)) => (sender, event),
            _ => {
                error!(
                    "cannot reply to event {} of {}",
                    message.event_id, message.sender
                );
                return;
            }
        };

        let content = content.make_reply_to(
            ReplyMetadata::new(&event, &sender, None),
            ForwardThread::No,
            AddMentions::No,
        );

        self.send(&message.room_id, content).await;
    }

    async fn send(&self, room_id: &str, content: RoomMessageEventContent) {
        let Ok(room_id) = RoomId::parse(room_id) else {
            error!("invalid room id {}", room_id);
            return;
        };

        if let Some(room) = self.client.get_room(&room_id)
            && let Err(e) = room.send(content).await
        {
            error!("Failed to send message: {:?}", e);
        }
    }
}
