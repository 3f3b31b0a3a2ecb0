//! Bot module wiring the Matrix transport to the command pipeline.
//!
//! The [`Bot`] owns the Matrix client and the [`Commander`]. Every message
//! received during the sync is handled in its own task:
//!
//! ```text
//! Matrix Message → Parse → (room members) → Execute → Send Reply
//! ```
//!
//! Messages that are neither a command nor an increment get no reply.

use std::{path::Path, sync::Arc};

use chrono::Utc;
use log::{info, warn};

use crate::{
    commands::{CommandContext, CommandParseError, CommandResult, Commander, CommanderSettings},
    config::Config,
    cookies::CookieLedger,
    directory::FasJsonClient,
    matrix::{MatrixClient, UserCredentials},
    message::ChatMessage,
    releases::BodhiClient,
};

type BotCommander = Commander<FasJsonClient, BodhiClient>;

pub struct Bot {
    /// Matrix client for receiving messages and sending replies
    matrix_client: Arc<MatrixClient>,
    /// Command parser and executor, shared by every message task
    commander: Arc<BotCommander>,
}

impl Bot {
    /// Creates a new Bot instance from configuration and the data directory.
    ///
    /// Logs in to Matrix, or restores the session stored in `data_dir`, and
    /// opens the cookie ledger `cookies.sqlite` of the same directory.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - Matrix login fails (invalid credentials, network issues)
    /// - Session restoration fails (corrupted session file)
    /// - The cookie ledger cannot be opened
    pub async fn new(config: Config, data_dir: &Path) -> Result<Self, anyhow::Error> {
        let matrix_client = Arc::new(
            MatrixClient::new(
                &UserCredentials {
                    user_id: config.matrix.user_id,
                    password: config.matrix.password,
                    passphrase: config.matrix.passphrase,
                },
                data_dir,
            )
            .await?,
        );

        let ledger = CookieLedger::open(&data_dir.join("cookies.sqlite"))?;
        let directory = FasJsonClient::new(&config.directory.url, config.directory.timeout())?;
        let releases = BodhiClient::new(&config.releases.url, config.releases.timeout())?;

        let commander = Arc::new(Commander::new(
            CommanderSettings {
                command_prefix: config.bot.command_prefix,
                home_server: config.bot.home_server,
                primary_release_prefix: config.releases.primary_id_prefix,
            },
            directory,
            releases,
            ledger,
        ));

        Ok(Bot {
            matrix_client,
            commander,
        })
    }

    /// Syncs with the homeserver and handles messages until the sync stops.
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let matrix_client = Arc::clone(&self.matrix_client);
        let commander = Arc::clone(&self.commander);

        let on_message = move |message: ChatMessage| {
            Self::handle_matrix_message(message, Arc::clone(&matrix_client), Arc::clone(&commander))
        };

        self.matrix_client.sync(on_message).await
    }

    /// Handles an incoming message in a new task.
    ///
    /// 1. Parse the message, silently ignore it if it is not for the bot
    /// 2. Reply with the usage if the command is malformed
    /// 3. Fetch the room members when the command mentions users
    /// 4. Execute the command and reply with its result
    fn handle_matrix_message(
        message: ChatMessage,
        matrix_client: Arc<MatrixClient>,
        commander: Arc<BotCommander>,
    ) {
        tokio::spawn(async move {
            let command = match commander.parse(&message) {
                Ok(command) => command,
                Err(e) => match e {
                    // Return silently if the message is not for the bot
                    CommandParseError::NotForBot => return,
                    // Send error message if the command is invalid
                    CommandParseError::InvalidCommand(usage) => {
                        matrix_client
                            .send_reply(&message, &CommandResult::markdown(usage))
                            .await;
                        return;
                    }
                },
            };

            info!("{} sent {:?} in {}", message.sender, command, message.room_id);

            let joined_members = match command.needs_room_members() {
                true => matrix_client
                    .get_joined_members(&message.room_id)
                    .await
                    .unwrap_or_else(|e| {
                        warn!("failed to get members of {}: {:?}", message.room_id, e);
                        Default::default()
                    }),
                false => Default::default(),
            };

            let context = CommandContext {
                message,
                joined_members,
                now: Utc::now(),
            };

            let result = commander.parse_command(&command, &context).await;

            matrix_client.send_reply(&context.message, &result).await;
        });
    }
}
