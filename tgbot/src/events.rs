use image::DynamicImage;

use crate::error::BotError;

#[derive(Debug, Clone)]
pub enum MessagePart {
    Text(String),
    Image(DynamicImage),
}

/// What the chat produced.
#[derive(Debug)]
pub enum ChatOutput {
    Message {
        author: String,
        parts: Vec<MessagePart>,
    },
    EditMessage {
        author: String,
        text: String,
    },
    /// Raw console command from the admin
    Command(String),
    BindUser {
        chat_name: String,
        display_name: String,
    },
    ListPlayers,
    KillServer,
    /// Shown back to the chat as is
    UserError(String),
    Error(BotError),
}

#[derive(Debug, Clone)]
pub enum ChatInput {
    SendMessage(String),
}
