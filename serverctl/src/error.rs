use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("server is already running")]
    AlreadyRunning,

    #[error("server command line is empty")]
    EmptyCommandLine,

    #[error("could not start the server process: {0}")]
    Spawn(std::io::Error),

    #[error("server process has no {0} pipe")]
    MissingPipe(&'static str),

    #[error("error while reading server output: {0}")]
    Read(std::io::Error),

    #[error("error while writing to server console: {0}")]
    Write(std::io::Error),

    #[error("could not encode tellraw command: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0:?} is not a valid name")]
    InvalidName(String),

    #[error("{display_name} is already bound to {owner}")]
    DuplicateRename {
        display_name: String,
        owner: String,
    },
}

impl ServerError {
    /// True for errors caused by something a chat user asked for.
    pub fn is_user_error(&self) -> bool {
        matches!(self, ServerError::DuplicateRename { .. } | ServerError::InvalidName(_))
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
