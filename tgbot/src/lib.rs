pub mod api;
pub mod bot;
pub mod config;
pub mod error;
pub mod events;

pub use bot::ChatBot;
pub use config::BotConfig;
pub use error::BotError;
pub use events::{ChatInput, ChatOutput, MessagePart};
