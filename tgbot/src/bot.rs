use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    api::{Api, Message},
    config::BotConfig,
    error::Result,
    events::{ChatInput, ChatOutput, MessagePart},
};

pub const IAMTHE_USAGE: &str = "Usage: /iamthe <minecraft_nickname>";
pub const NO_USERNAME: &str = "Set a Telegram username to use /iamthe";
const UNSUPPORTED_STICKER: &str = "[unsupported sticker]";
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BotState {
    Running,
    Stopping,
    Stopped,
}

enum BotInput {
    Input(ChatInput),
    Terminate,
}

pub struct ChatBot {
    config: Arc<BotConfig>,
    api: Arc<Api>,
    bot_to_main: mpsc::UnboundedSender<ChatOutput>,
    to_inputs: Option<mpsc::UnboundedSender<BotInput>>,
    shutdown: Option<watch::Sender<bool>>,
    tasks: Vec<JoinHandle<()>>,
    state: BotState,
}

impl ChatBot {
    /// Check that the token works and build a stopped bot.
    pub async fn connect(config: BotConfig, bot_to_main: mpsc::UnboundedSender<ChatOutput>) -> Result<ChatBot> {
        let api = Api::new(config.api_token.clone())?;
        info!("checking telegram bot api accessibility");
        let me = api.get_me().await?;
        info!(username = ?me.username, first_name = %me.first_name, "running as telegram bot");
        if config.admin_username.is_none() {
            info!("running without an admin username");
        }

        Ok(ChatBot {
            config: Arc::new(config),
            api: Arc::new(api),
            bot_to_main,
            to_inputs: None,
            shutdown: None,
            tasks: Vec::new(),
            state: BotState::Stopped,
        })
    }

    pub fn start(&mut self) {
        if self.state != BotState::Stopped {
            warn!("trying to start the bot twice");
            return;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (to_inputs, inputs_from_main) = mpsc::unbounded_channel();

        self.tasks.push(tokio::spawn(poll_updates(
            self.api.clone(),
            self.config.clone(),
            self.bot_to_main.clone(),
            shutdown_rx,
        )));
        self.tasks.push(tokio::spawn(handle_inputs(
            self.api.clone(),
            self.config.chat_id,
            inputs_from_main,
            self.bot_to_main.clone(),
        )));

        self.to_inputs = Some(to_inputs);
        self.shutdown = Some(shutdown_tx);
        self.state = BotState::Running;
    }

    /// Returns once both bot tasks have exited. Messages queued before the
    /// call are still sent.
    pub async fn stop(&mut self) {
        if self.state != BotState::Running {
            warn!("trying to stop the bot twice");
            return;
        }

        self.state = BotState::Stopping;
        if let Some(shutdown) = self.shutdown.take() {
            shutdown.send_replace(true);
        }
        if let Some(to_inputs) = self.to_inputs.take() {
            let _ = to_inputs.send(BotInput::Terminate);
        }
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!("bot task failed: {e}");
            }
        }
        self.state = BotState::Stopped;
    }

    pub fn is_running(&self) -> bool {
        self.state != BotState::Stopped
    }

    pub fn send(&self, input: ChatInput) {
        match &self.to_inputs {
            Some(to_inputs) => {
                let _ = to_inputs.send(BotInput::Input(input));
            }
            None => warn!("bot is not running, dropping {input:?}"),
        }
    }
}

async fn poll_updates(
    api: Arc<Api>,
    config: Arc<BotConfig>,
    bot_to_main: mpsc::UnboundedSender<ChatOutput>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut offset = 0;
    loop {
        if *shutdown.borrow() {
            break;
        }
        let result = tokio::select! {
            _ = shutdown.changed() => break,
            result = api.get_updates(offset) => result,
        };

        let updates = match result {
            Ok(updates) => updates,
            Err(e) => {
                warn!("error while polling telegram updates: {e}");
                let _ = bot_to_main.send(ChatOutput::Error(e));
                tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                continue;
            }
        };

        for update in updates {
            // Confirms the update to telegram on the next poll
            offset = offset.max(update.update_id + 1);

            if let Some(message) = update.message {
                if let Some(event) = message_event(&api, &config, message).await {
                    let _ = bot_to_main.send(event);
                }
            }
            if let Some(edited) = update.edited_message {
                if let Some(event) = edited_event(&config, &edited) {
                    let _ = bot_to_main.send(event);
                }
            }
        }
    }
    debug!("telegram update poller exited");
}

async fn handle_inputs(
    api: Arc<Api>,
    chat_id: i64,
    mut inputs_from_main: mpsc::UnboundedReceiver<BotInput>,
    bot_to_main: mpsc::UnboundedSender<ChatOutput>,
) {
    while let Some(input) = inputs_from_main.recv().await {
        match input {
            BotInput::Terminate => break,
            BotInput::Input(ChatInput::SendMessage(text)) => {
                if let Err(e) = api.send_message(chat_id, &text).await {
                    warn!("error while sending message: {e}");
                    let _ = bot_to_main.send(ChatOutput::Error(e));
                }
            }
        }
    }
    debug!("telegram input handler exited");
}

/// Slash commands recognized in the chat. `None` means the text is chat.
/// `identity` is the sender's username, if they have one.
pub fn command_event(config: &BotConfig, identity: Option<&str>, text: &str) -> Option<ChatOutput> {
    let admin = identity.is_some_and(|identity| config.is_admin(identity));

    match text {
        "/players" => return Some(ChatOutput::ListPlayers),
        "/kill-server" if admin => return Some(ChatOutput::KillServer),
        _ => {}
    }

    let argv = text.split_whitespace().collect::<Vec<_>>();
    if argv.first() == Some(&"/iamthe") {
        let Some(chat_name) = identity else {
            return Some(ChatOutput::UserError(NO_USERNAME.into()));
        };
        return Some(match argv[..] {
            [_, display_name] if is_player_name(display_name) => ChatOutput::BindUser {
                chat_name: chat_name.to_owned(),
                display_name: display_name.to_owned(),
            },
            _ => ChatOutput::UserError(IAMTHE_USAGE.into()),
        });
    }

    if admin && text.starts_with('/') {
        return Some(ChatOutput::Command(text.to_owned()));
    }

    None
}

/// Same characters the server accepts in player names.
fn is_player_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// The command a message from the bridged chat carries, if any.
pub fn message_command(config: &BotConfig, message: &Message) -> Option<ChatOutput> {
    if message.chat.id != config.chat_id {
        return None;
    }
    command_event(config, message.from.identity(), message.text.as_deref().unwrap_or_default())
}

pub fn edited_event(config: &BotConfig, message: &Message) -> Option<ChatOutput> {
    if message.chat.id != config.chat_id {
        return None;
    }
    let text = message.text.as_deref().filter(|text| !text.is_empty())?;
    Some(ChatOutput::EditMessage {
        author: message.from.display_name().to_owned(),
        text: text.to_owned(),
    })
}

async fn message_event(api: &Api, config: &BotConfig, message: Message) -> Option<ChatOutput> {
    if message.chat.id != config.chat_id {
        return None;
    }

    if let Some(event) = message_command(config, &message) {
        return Some(event);
    }

    let author = message.from.display_name().to_owned();
    let text = message.text.unwrap_or_default();

    let mut parts = Vec::new();
    if !text.is_empty() {
        parts.push(MessagePart::Text(text));
    }
    if let Some(caption) = message.caption.filter(|caption| !caption.is_empty()) {
        parts.push(MessagePart::Text(caption));
    }
    if let Some(sticker) = message.sticker {
        match fetch_image(api, &sticker.file_id).await {
            Ok(image) => parts.push(MessagePart::Image(image)),
            Err(e) => {
                warn!(file_id = %sticker.file_id, "could not fetch sticker: {e}");
                parts.push(MessagePart::Text(UNSUPPORTED_STICKER.into()));
            }
        }
    }
    if let Some(photo) = message.photo.iter().max_by_key(|photo| photo.width) {
        match fetch_image(api, &photo.file_id).await {
            Ok(image) => parts.push(MessagePart::Image(image)),
            Err(e) => warn!(file_id = %photo.file_id, "could not fetch photo: {e}"),
        }
    }

    if parts.is_empty() {
        return None;
    }
    Some(ChatOutput::Message { author, parts })
}

async fn fetch_image(api: &Api, file_id: &str) -> Result<image::DynamicImage> {
    debug!(file_id, "downloading image");
    let file = api.get_file(file_id).await?;
    let bytes = api.download(&file).await?;
    Ok(image::load_from_memory(&bytes)?)
}
