pub mod config;
pub mod console;
mod console_reader;
mod console_writer;
pub mod error;
pub mod events;
mod exit_watcher;
pub mod roster;
pub mod server;
pub mod team_mapping;
pub mod tellraw;
pub mod text_image;

pub use config::ServerConfig;
pub use error::ServerError;
pub use events::{MessagePart, Origin, ServerInput, ServerOutput, EXIT_CODE_UNKNOWN};
pub use server::ServerProcess;
pub use team_mapping::TeamMapping;
