use image::DynamicImage;

use crate::error::ServerError;

/// Where a relayed chat message was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Chat,
    Server,
}

#[derive(Debug, Clone)]
pub enum MessagePart {
    Text(String),
    Image(DynamicImage),
}

#[derive(Debug, Clone)]
pub enum ServerInput {
    Chat {
        origin: Origin,
        author: String,
        parts: Vec<MessagePart>,
    },
    EditChat {
        author: String,
        text: String,
    },
    BindRename {
        chat_name: String,
        display_name: String,
    },
    RawCommand(String),
    ListPlayers,
    KillServer,
}

#[derive(Debug)]
pub enum ServerOutput {
    Log(String),
    Message {
        /// The mod does not echo its own chat, so these need a tellraw back into the console.
        relay: bool,
        author: String,
        text: String,
    },
    PlayerDeath {
        username: String,
        message: String,
    },
    PlayerAchievement {
        username: String,
        achievement: String,
    },
    PlayerJoined {
        username: String,
    },
    PlayerLeft {
        username: String,
    },
    ServerLoaded,
    ListPlayersResult {
        players: Vec<String>,
    },
    Error(ServerError),
    /// -2 if the exit status could not be obtained
    Exit {
        code: i32,
    },
}

pub const EXIT_CODE_UNKNOWN: i32 = -2;

// Queue consumed by the stdin writer. Everything except Input is produced
// by the supervisor itself.
#[derive(Debug)]
pub(crate) enum WriterEvent {
    Input(ServerInput),
    FetchTeams,
    ClearTeams,
    RequestTeam(String),
    UpdateTeam { team: String, members: Vec<String> },
    Terminate,
}
