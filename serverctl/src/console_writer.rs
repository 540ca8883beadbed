use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::{mpsc, oneshot, watch},
};
use tracing::{debug, warn};

use crate::{
    error::ServerError,
    events::{MessagePart, Origin, ServerInput, ServerOutput, WriterEvent},
    roster::Roster,
    team_mapping::{rename_team_name, TeamMapping, RENAME_TEAM_PREFIX},
    tellraw, text_image,
};

/// Turns writer events into console command lines. Owns the team mapping.
pub(crate) struct Console {
    teams: watch::Sender<TeamMapping>,
    roster: watch::Receiver<Roster>,
}

#[derive(Debug, Default)]
pub(crate) struct Rendered {
    pub lines: Vec<String>,
    pub outputs: Vec<ServerOutput>,
}

impl Rendered {
    fn lines(lines: Vec<String>) -> Rendered {
        Rendered { lines, outputs: Vec::new() }
    }

    fn output(output: ServerOutput) -> Rendered {
        Rendered { lines: Vec::new(), outputs: vec![output] }
    }
}

impl Console {
    pub(crate) fn new(teams: watch::Sender<TeamMapping>, roster: watch::Receiver<Roster>) -> Console {
        Console { teams, roster }
    }

    pub(crate) fn render(&self, event: WriterEvent) -> Rendered {
        match event {
            WriterEvent::FetchTeams => Rendered::lines(vec!["/team list".into()]),
            WriterEvent::ClearTeams => {
                self.teams.send_modify(|teams| teams.clear());
                Rendered::default()
            }
            WriterEvent::RequestTeam(team) => Rendered::lines(vec![format!("/team list {team}")]),
            WriterEvent::UpdateTeam { team, members } => {
                debug!(%team, ?members, "team updated");
                self.teams.send_modify(|teams| teams.push(team, members));
                Rendered::default()
            }
            WriterEvent::Input(input) => self.render_input(input),
            WriterEvent::Terminate => Rendered::default(),
        }
    }

    fn render_input(&self, input: ServerInput) -> Rendered {
        match input {
            ServerInput::Chat { origin, author, parts } => {
                let display_name = self.teams.borrow().display_name(&author);
                match chat_lines(origin, &display_name, &parts) {
                    Ok(lines) => Rendered::lines(lines),
                    Err(e) => Rendered::output(ServerOutput::Error(e.into())),
                }
            }
            ServerInput::EditChat { author, text } => {
                let display_name = self.teams.borrow().display_name(&author);
                let lines = text
                    .split('\n')
                    .map(|line| tellraw::encode(&tellraw::chat_line(Origin::Chat, &display_name, line, true)))
                    .collect::<serde_json::Result<Vec<_>>>();
                match lines {
                    Ok(lines) => Rendered::lines(lines),
                    Err(e) => Rendered::output(ServerOutput::Error(e.into())),
                }
            }
            ServerInput::BindRename { chat_name, display_name } => self.bind_rename(chat_name, display_name),
            ServerInput::RawCommand(command) => Rendered::lines(command.split('\n').map(str::to_owned).collect()),
            ServerInput::ListPlayers => Rendered::output(ServerOutput::ListPlayersResult {
                players: self.roster.borrow().players().to_vec(),
            }),
            ServerInput::KillServer => Rendered::lines(vec!["/stop".into()]),
        }
    }

    fn bind_rename(&self, chat_name: String, display_name: String) -> Rendered {
        // Both names end up as arguments of a single console command
        for name in [&chat_name, &display_name] {
            if !is_command_argument(name) {
                return Rendered::output(ServerOutput::Error(ServerError::InvalidName(name.clone())));
            }
        }

        let taken_by = self
            .teams
            .borrow()
            .player_teams(&display_name)
            .iter()
            .filter_map(|team| team.strip_prefix(RENAME_TEAM_PREFIX))
            .find(|owner| *owner != chat_name)
            .map(str::to_owned);

        if let Some(owner) = taken_by {
            return Rendered::output(ServerOutput::Error(ServerError::DuplicateRename { display_name, owner }));
        }

        let team = rename_team_name(&chat_name);
        Rendered::lines(vec![
            format!("/team remove {team}"),
            format!("/team add {team}"),
            format!("/team join {team} {display_name}"),
            "/team list".into(),
        ])
    }
}

fn is_command_argument(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(|c| c.is_whitespace() || c.is_control())
}

fn chat_lines(origin: Origin, display_name: &str, parts: &[MessagePart]) -> serde_json::Result<Vec<String>> {
    let mut lines = Vec::new();
    for part in parts {
        match part {
            MessagePart::Text(text) => {
                for line in text.split('\n') {
                    lines.push(tellraw::encode(&tellraw::chat_line(origin, display_name, line, false))?);
                }
            }
            MessagePart::Image(image) => {
                lines.push(tellraw::encode(&tellraw::chat_line(origin, display_name, "", false))?);
                for row in text_image::render(image) {
                    lines.push(tellraw::encode(&tellraw::glyph_row(&row))?);
                }
            }
        }
    }
    Ok(lines)
}

pub(crate) fn spawn_console_writer<W>(
    mut stdin: W,
    mut writer_from_supervisor: mpsc::UnboundedReceiver<WriterEvent>,
    writer_to_main: mpsc::Sender<ServerOutput>,
    alive: watch::Receiver<bool>,
    console: Console,
    done: oneshot::Sender<()>,
) where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut broken = false;
        while let Some(event) = writer_from_supervisor.recv().await {
            if let WriterEvent::Terminate = event {
                break;
            }
            // The process is gone or its console is, only the terminate sentinel matters now
            if broken || !*alive.borrow() {
                continue;
            }

            let rendered = console.render(event);
            for output in rendered.outputs {
                let _ = writer_to_main.send(output).await;
            }
            for line in rendered.lines {
                let mut bytes = line.into_bytes();
                bytes.push(b'\n');
                if let Err(e) = stdin.write_all(&bytes).await {
                    warn!("error while writing to server console: {e}");
                    let _ = writer_to_main.send(ServerOutput::Error(ServerError::Write(e))).await;
                    broken = true;
                    break;
                }
            }
            if broken {
                continue;
            }
            if let Err(e) = stdin.flush().await {
                warn!("error while flushing server console: {e}");
            }
        }
        drop(stdin);
        debug!("console writer exited");
        let _ = done.send(());
    });
}
