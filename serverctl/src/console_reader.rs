use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::ChildStdout,
    sync::{mpsc, oneshot, watch},
};
use tracing::{debug, warn};

use crate::{
    console::{parse_line, ConsoleEvent},
    error::ServerError,
    events::{ServerOutput, WriterEvent},
    roster::Roster,
};

/// Apply one parsed console event. Roster changes happen here, team sync is
/// forwarded to the writer, everything else becomes output for the bridge.
pub(crate) fn apply(
    event: ConsoleEvent,
    roster: &watch::Sender<Roster>,
    to_writer: &mpsc::UnboundedSender<WriterEvent>,
) -> Option<ServerOutput> {
    match event {
        ConsoleEvent::Log(line) => Some(ServerOutput::Log(line)),
        ConsoleEvent::Message { relay, author, text } => Some(ServerOutput::Message { relay, author, text }),
        ConsoleEvent::PlayerDeath { username, message } => Some(ServerOutput::PlayerDeath { username, message }),
        ConsoleEvent::TeamsListed(teams) => {
            let _ = to_writer.send(WriterEvent::ClearTeams);
            for team in teams {
                let _ = to_writer.send(WriterEvent::RequestTeam(team));
            }
            None
        }
        ConsoleEvent::TeamMembers { team, members } => {
            let _ = to_writer.send(WriterEvent::UpdateTeam { team, members });
            None
        }
        ConsoleEvent::PlayerJoined(username) => {
            roster.send_modify(|roster| roster.insert(&username));
            Some(ServerOutput::PlayerJoined { username })
        }
        ConsoleEvent::PlayerLeft(username) => {
            roster.send_modify(|roster| roster.remove(&username));
            Some(ServerOutput::PlayerLeft { username })
        }
        ConsoleEvent::PlayerAchievement { username, achievement } => {
            Some(ServerOutput::PlayerAchievement { username, achievement })
        }
        ConsoleEvent::ServerLoaded => Some(ServerOutput::ServerLoaded),
    }
}

pub(crate) fn spawn_console_reader(
    stdout: ChildStdout,
    reader_to_main: mpsc::Sender<ServerOutput>,
    reader_to_writer: mpsc::UnboundedSender<WriterEvent>,
    roster: watch::Sender<Roster>,
    done: oneshot::Sender<()>,
) {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stdout);
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            match reader.read_until(b'\n', &mut buffer).await {
                Ok(0) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&buffer);
                    let line = text.trim_end_matches(&['\r', '\n'][..]);
                    for event in parse_line(line) {
                        if let Some(output) = apply(event, &roster, &reader_to_writer) {
                            let _ = reader_to_main.send(output).await;
                        }
                    }
                }
                Err(e) => {
                    warn!("error while reading server output: {e}");
                    let _ = reader_to_main.send(ServerOutput::Error(ServerError::Read(e))).await;
                    break;
                }
            }
        }
        debug!("console reader exited");
        let _ = done.send(());
    });
}
