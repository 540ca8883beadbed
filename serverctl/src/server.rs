use std::process::Stdio;

use tokio::{
    process::Command,
    sync::{mpsc, oneshot, watch},
};
use tracing::{info, warn};

use crate::{
    config::ServerConfig,
    console_reader::spawn_console_reader,
    console_writer::{spawn_console_writer, Console},
    error::{Result, ServerError},
    events::{ServerInput, ServerOutput, WriterEvent},
    exit_watcher::{spawn_exit_watcher, IoDone},
    roster::Roster,
    team_mapping::TeamMapping,
};

/// Supervisor for one game server process at a time.
///
/// Every run gets a stdin writer, a stdout reader and an exit watcher. They
/// talk to each other and to the owner of this value only through channels.
/// Output of all runs goes to the sender given to [`ServerProcess::new`].
pub struct ServerProcess {
    config: ServerConfig,
    server_to_main: mpsc::Sender<ServerOutput>,
    to_writer: Option<mpsc::UnboundedSender<WriterEvent>>,
    alive: Option<watch::Receiver<bool>>,
    roster: watch::Receiver<Roster>,
    teams: watch::Receiver<TeamMapping>,
    restart_on_exit: bool,
    stopping: bool,
}

impl ServerProcess {
    pub fn new(config: ServerConfig, server_to_main: mpsc::Sender<ServerOutput>) -> ServerProcess {
        ServerProcess {
            config,
            server_to_main,
            to_writer: None,
            alive: None,
            roster: watch::channel(Roster::new()).1,
            teams: watch::channel(TeamMapping::new()).1,
            restart_on_exit: true,
            stopping: false,
        }
    }

    /// Spawn the configured command line and attach to its console. Returns
    /// as soon as the process is running.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(ServerError::AlreadyRunning);
        }

        let (program, args) = self.config.cmdline.split_first().ok_or(ServerError::EmptyCommandLine)?;
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(ServerError::Spawn)?;
        let stdin = child.stdin.take().ok_or(ServerError::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(ServerError::MissingPipe("stdout"))?;
        info!(pid = ?child.id(), cmdline = ?self.config.cmdline, "server process started");

        let (alive_tx, alive_rx) = watch::channel(true);
        let (roster_tx, roster_rx) = watch::channel(Roster::new());
        let (teams_tx, teams_rx) = watch::channel(TeamMapping::new());
        let (to_writer, writer_from_supervisor) = mpsc::unbounded_channel();
        let (reader_done_tx, reader_done_rx) = oneshot::channel();
        let (writer_done_tx, writer_done_rx) = oneshot::channel();

        let _ = to_writer.send(WriterEvent::FetchTeams);

        spawn_console_writer(
            stdin,
            writer_from_supervisor,
            self.server_to_main.clone(),
            alive_rx.clone(),
            Console::new(teams_tx, roster_rx.clone()),
            writer_done_tx,
        );
        spawn_console_reader(stdout, self.server_to_main.clone(), to_writer.clone(), roster_tx, reader_done_tx);
        spawn_exit_watcher(
            child,
            alive_tx,
            to_writer.clone(),
            IoDone { reader: reader_done_rx, writer: writer_done_rx },
            self.server_to_main.clone(),
        );

        self.to_writer = Some(to_writer);
        self.alive = Some(alive_rx);
        self.roster = roster_rx;
        self.teams = teams_rx;
        self.restart_on_exit = true;
        self.stopping = false;
        Ok(())
    }

    /// Ask the server to shut down with `/stop`. The exit watcher reports
    /// the outcome as [`ServerOutput::Exit`]. Restart is disabled.
    pub fn stop(&mut self) {
        if !self.is_running() {
            info!("server is not running, nothing to stop");
            return;
        }
        if self.stopping {
            info!("server is already stopping");
            return;
        }
        self.stopping = true;
        self.send(ServerInput::KillServer);
    }

    pub fn send(&mut self, input: ServerInput) {
        if let ServerInput::KillServer = input {
            self.restart_on_exit = false;
        }
        match (&self.to_writer, self.is_running()) {
            (Some(to_writer), true) => {
                let _ = to_writer.send(WriterEvent::Input(input));
            }
            _ => warn!("server is not running, dropping input"),
        }
    }

    pub fn is_running(&self) -> bool {
        self.alive.as_ref().is_some_and(|alive| *alive.borrow())
    }

    pub fn restart_on_exit(&self) -> bool {
        self.restart_on_exit
    }

    pub fn players(&self) -> Vec<String> {
        self.roster.borrow().players().to_vec()
    }

    pub fn teams(&self) -> TeamMapping {
        self.teams.borrow().clone()
    }

    /// Chat identity bound to an in-game name, or the name itself.
    pub fn reverse_rename(&self, username: &str) -> String {
        self.teams.borrow().reverse_rename(username)
    }
}
