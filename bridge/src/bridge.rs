use serverctl::{Origin, ServerError, ServerInput, ServerOutput};
use tgbot::{ChatInput, ChatOutput};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::{
    control::{ChatControl, ServerControl},
    log_tail::LogTail,
};

/// Couples the chat front to the game server. Owns both sides and the only
/// cross-side policy state.
pub struct Bridge<S, C> {
    server: S,
    chat: C,
    from_server: mpsc::Receiver<ServerOutput>,
    from_chat: mpsc::UnboundedReceiver<ChatOutput>,
    log_tail: LogTail,
    stopping: bool,
}

impl<S: ServerControl, C: ChatControl> Bridge<S, C> {
    pub fn new(
        server: S,
        chat: C,
        from_server: mpsc::Receiver<ServerOutput>,
        from_chat: mpsc::UnboundedReceiver<ChatOutput>,
        log_lines: usize,
    ) -> Bridge<S, C> {
        Bridge {
            server,
            chat,
            from_server,
            from_chat,
            log_tail: LogTail::new(log_lines),
            stopping: false,
        }
    }

    /// Runs until both sides are down after a shutdown was decided.
    pub async fn run(&mut self) {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut interrupted = false;

        while !self.finished() {
            tokio::select! {
                Some(output) = self.from_server.recv() => self.handle_server_output(output).await,
                Some(output) = self.from_chat.recv() => self.handle_chat_output(output),
                result = &mut ctrl_c, if !interrupted => {
                    interrupted = true;
                    if let Err(e) = result {
                        warn!("could not listen for ctrl-c: {e}");
                        continue;
                    }
                    self.interrupt().await;
                }
                else => break,
            }
        }
        info!("bridge stopped");
    }

    pub fn finished(&self) -> bool {
        self.stopping && !self.server.is_running() && !self.chat.is_running()
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping
    }

    pub fn server(&self) -> &S {
        &self.server
    }

    pub fn chat(&self) -> &C {
        &self.chat
    }

    pub fn handle_chat_output(&mut self, output: ChatOutput) {
        let input = match output {
            ChatOutput::Message { author, parts } => ServerInput::Chat {
                origin: Origin::Chat,
                author,
                parts: parts.into_iter().map(server_part).collect(),
            },
            ChatOutput::EditMessage { author, text } => ServerInput::EditChat { author, text },
            ChatOutput::Command(command) => {
                info!(%command, "running admin command");
                ServerInput::RawCommand(command)
            }
            ChatOutput::BindUser { chat_name, display_name } => ServerInput::BindRename { chat_name, display_name },
            ChatOutput::ListPlayers => ServerInput::ListPlayers,
            ChatOutput::KillServer => {
                info!("server kill requested from chat");
                ServerInput::KillServer
            }
            ChatOutput::UserError(text) => {
                self.say(text);
                return;
            }
            ChatOutput::Error(e) => {
                warn!("chat error: {e}");
                return;
            }
        };
        self.server.send(input);
    }

    pub async fn handle_server_output(&mut self, output: ServerOutput) {
        match output {
            ServerOutput::Log(line) => {
                info!(target: "console", "{line}");
                self.log_tail.push(line);
            }
            ServerOutput::Message { relay, author, text } => {
                self.say(format!("{}: {text}", self.display(&author)));
                if relay {
                    self.server.send(ServerInput::Chat {
                        origin: Origin::Server,
                        author,
                        parts: vec![serverctl::MessagePart::Text(text)],
                    });
                }
            }
            ServerOutput::PlayerDeath { message, .. } => self.say(message),
            ServerOutput::PlayerAchievement { username, achievement } => {
                self.say(format!("{} has made the advancement [{achievement}]", self.display(&username)))
            }
            ServerOutput::PlayerJoined { username } => self.say(format!("{} joined the game", self.display(&username))),
            ServerOutput::PlayerLeft { username } => self.say(format!("{} left the game", self.display(&username))),
            ServerOutput::ServerLoaded => {
                info!("server finished loading");
                self.say("Server started!".into());
            }
            ServerOutput::ListPlayersResult { players } => {
                let names = players.iter().map(|player| self.display(player)).collect::<Vec<_>>();
                self.say(format!("{} active players:\n{}", names.len(), names.join(", ")));
            }
            ServerOutput::Error(ServerError::DuplicateRename { display_name, owner }) => {
                self.say(format!("{display_name} is already taken by @{owner}"))
            }
            ServerOutput::Error(e @ ServerError::InvalidName(_)) => self.say(e.to_string()),
            ServerOutput::Error(e) => warn!("server error: {e}"),
            ServerOutput::Exit { code } => self.server_exited(code).await,
        }
    }

    async fn server_exited(&mut self, code: i32) {
        info!(code, "server exited");
        self.say(format!("Server exited with code {code}"));
        if code != 0 {
            warn!(code, "last console lines before the exit:");
            for line in self.log_tail.lines() {
                warn!(target: "console", "{line}");
            }
        }
        self.log_tail.clear();

        if !self.stopping && self.server.restart_on_exit() {
            self.say("Restarting the server...".into());
            match self.server.start() {
                Ok(()) => return,
                Err(e) => {
                    error!("failed to restart the server: {e}");
                    self.say(format!("Failed to restart the server: {e}"));
                }
            }
        }
        self.shutdown().await;
    }

    async fn interrupt(&mut self) {
        info!("interrupted, shutting down");
        if self.server.is_running() {
            // The resulting Exit finishes the shutdown
            self.server.stop();
        } else {
            self.shutdown().await;
        }
    }

    async fn shutdown(&mut self) {
        if self.stopping {
            return;
        }
        self.stopping = true;
        if self.chat.is_running() {
            self.chat.stop().await;
        }
    }

    /// `name (@identity)` for players bound to a chat identity.
    fn display(&self, username: &str) -> String {
        let identity = self.server.reverse_rename(username);
        if identity == username {
            username.to_owned()
        } else {
            format!("{username} (@{identity})")
        }
    }

    fn say(&self, text: String) {
        self.chat.send(ChatInput::SendMessage(text));
    }
}

fn server_part(part: tgbot::MessagePart) -> serverctl::MessagePart {
    match part {
        tgbot::MessagePart::Text(text) => serverctl::MessagePart::Text(text),
        tgbot::MessagePart::Image(image) => serverctl::MessagePart::Image(image),
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::HashMap, io};

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct FakeServer {
        running: bool,
        restart: bool,
        fail_start: bool,
        starts: usize,
        stops: usize,
        inputs: Vec<ServerInput>,
        renames: HashMap<String, String>,
    }

    impl ServerControl for FakeServer {
        fn start(&mut self) -> serverctl::error::Result<()> {
            self.starts += 1;
            if self.fail_start {
                return Err(ServerError::Spawn(io::Error::new(io::ErrorKind::NotFound, "no java")));
            }
            self.running = true;
            self.restart = true;
            Ok(())
        }

        fn send(&mut self, input: ServerInput) {
            if let ServerInput::KillServer = input {
                self.restart = false;
            }
            self.inputs.push(input);
        }

        fn stop(&mut self) {
            self.stops += 1;
            self.restart = false;
        }

        fn is_running(&self) -> bool {
            self.running
        }

        fn restart_on_exit(&self) -> bool {
            self.restart
        }

        fn reverse_rename(&self, username: &str) -> String {
            self.renames.get(username).cloned().unwrap_or_else(|| username.to_owned())
        }
    }

    #[derive(Default)]
    struct FakeChat {
        running: bool,
        stops: usize,
        sent: RefCell<Vec<String>>,
    }

    #[async_trait]
    impl ChatControl for FakeChat {
        fn start(&mut self) {
            self.running = true;
        }

        async fn stop(&mut self) {
            self.stops += 1;
            self.running = false;
        }

        fn is_running(&self) -> bool {
            self.running
        }

        fn send(&self, input: ChatInput) {
            let ChatInput::SendMessage(text) = input;
            self.sent.borrow_mut().push(text);
        }
    }

    struct Harness {
        bridge: Bridge<FakeServer, FakeChat>,
        to_bridge_from_server: mpsc::Sender<ServerOutput>,
        to_bridge_from_chat: mpsc::UnboundedSender<ChatOutput>,
    }

    fn harness(server: FakeServer) -> Harness {
        let (to_bridge_from_server, from_server) = mpsc::channel(100);
        let (to_bridge_from_chat, from_chat) = mpsc::unbounded_channel();
        let chat = FakeChat { running: true, ..FakeChat::default() };
        Harness {
            bridge: Bridge::new(server, chat, from_server, from_chat, 3),
            to_bridge_from_server,
            to_bridge_from_chat,
        }
    }

    fn running_server() -> FakeServer {
        FakeServer { running: true, restart: true, ..FakeServer::default() }
    }

    fn sent(bridge: &Bridge<FakeServer, FakeChat>) -> Vec<String> {
        bridge.chat().sent.borrow().clone()
    }

    #[tokio::test]
    async fn crash_with_restart_keeps_running() {
        let mut h = harness(running_server());
        h.bridge.server.running = false;
        h.bridge.handle_server_output(ServerOutput::Exit { code: 1 }).await;

        assert!(!h.bridge.is_stopping());
        assert!(h.bridge.chat().is_running());
        assert!(h.bridge.server().is_running());
        assert_eq!(h.bridge.server().starts, 1);
        assert_eq!(sent(&h.bridge), ["Server exited with code 1", "Restarting the server..."]);
    }

    #[tokio::test]
    async fn exit_without_restart_stops_both_sides() {
        let mut h = harness(running_server());
        h.bridge.handle_chat_output(ChatOutput::KillServer);
        assert!(matches!(h.bridge.server().inputs[..], [ServerInput::KillServer]));

        h.bridge.server.running = false;
        h.bridge.handle_server_output(ServerOutput::Exit { code: 1 }).await;

        assert!(h.bridge.is_stopping());
        assert_eq!(h.bridge.server().starts, 0);
        assert_eq!(h.bridge.chat().stops, 1);
        assert!(h.bridge.finished());
        assert_eq!(sent(&h.bridge), ["Server exited with code 1"]);
    }

    #[tokio::test]
    async fn failed_restart_falls_through_to_shutdown() {
        let mut h = harness(FakeServer { fail_start: true, ..running_server() });
        h.bridge.server.running = false;
        h.bridge.handle_server_output(ServerOutput::Exit { code: 137 }).await;

        assert!(h.bridge.is_stopping());
        assert!(h.bridge.finished());
        let sent = sent(&h.bridge);
        assert_eq!(sent[..2], ["Server exited with code 137", "Restarting the server..."]);
        assert!(sent[2].starts_with("Failed to restart the server: "));
    }

    #[tokio::test]
    async fn run_returns_once_both_sides_are_down() {
        let mut h = harness(FakeServer { running: false, restart: false, ..FakeServer::default() });
        h.to_bridge_from_server.send(ServerOutput::Log("[Server thread/INFO]: Stopping server".into())).await.unwrap();
        h.to_bridge_from_server.send(ServerOutput::Exit { code: 0 }).await.unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(5), h.bridge.run()).await.unwrap();
        assert!(h.bridge.finished());
        assert_eq!(sent(&h.bridge), ["Server exited with code 0"]);
    }

    #[tokio::test]
    async fn run_keeps_going_after_a_restart() {
        let mut h = harness(running_server());
        h.bridge.server.running = false;
        h.to_bridge_from_server.send(ServerOutput::Exit { code: 1 }).await.unwrap();
        h.to_bridge_from_chat.send(ChatOutput::ListPlayers).unwrap();

        let run = tokio::time::timeout(std::time::Duration::from_millis(200), h.bridge.run()).await;
        assert!(run.is_err(), "bridge must not stop after a successful restart");
        assert!(!h.bridge.is_stopping());
        assert!(matches!(h.bridge.server().inputs[..], [ServerInput::ListPlayers]));
    }

    #[tokio::test]
    async fn chat_commands_are_routed_to_the_server() {
        let mut h = harness(running_server());
        h.bridge.handle_chat_output(ChatOutput::Message {
            author: "alice".into(),
            parts: vec![tgbot::MessagePart::Text("hi".into())],
        });
        h.bridge.handle_chat_output(ChatOutput::EditMessage { author: "alice".into(), text: "hi!".into() });
        h.bridge.handle_chat_output(ChatOutput::Command("/time set day".into()));
        h.bridge.handle_chat_output(ChatOutput::BindUser { chat_name: "alice".into(), display_name: "Al_99".into() });
        h.bridge.handle_chat_output(ChatOutput::UserError("Usage: /iamthe <minecraft_nickname>".into()));

        let inputs = &h.bridge.server().inputs;
        assert_eq!(inputs.len(), 4);
        assert!(matches!(
            &inputs[0],
            ServerInput::Chat { origin: Origin::Chat, author, parts }
                if author == "alice" && matches!(&parts[..], [serverctl::MessagePart::Text(t)] if t == "hi")
        ));
        assert!(matches!(&inputs[1], ServerInput::EditChat { text, .. } if text == "hi!"));
        assert!(matches!(&inputs[2], ServerInput::RawCommand(c) if c == "/time set day"));
        assert!(matches!(
            &inputs[3],
            ServerInput::BindRename { chat_name, display_name } if chat_name == "alice" && display_name == "Al_99"
        ));
        assert_eq!(sent(&h.bridge), ["Usage: /iamthe <minecraft_nickname>"]);
    }

    #[tokio::test]
    async fn server_events_are_announced_with_chat_identities() {
        let mut server = running_server();
        server.renames.insert("Al_99".into(), "alice".into());
        let mut h = harness(server);

        for output in [
            ServerOutput::Log("noise".into()),
            ServerOutput::PlayerJoined { username: "Al_99".into() },
            ServerOutput::PlayerJoined { username: "bob".into() },
            ServerOutput::PlayerAchievement { username: "bob".into(), achievement: "Stone Age".into() },
            ServerOutput::PlayerDeath { username: "bob".into(), message: "bob fell from a high place".into() },
            ServerOutput::ServerLoaded,
            ServerOutput::ListPlayersResult { players: vec!["Al_99".into(), "bob".into()] },
            ServerOutput::PlayerLeft { username: "Al_99".into() },
            ServerOutput::Error(ServerError::DuplicateRename { display_name: "Al_99".into(), owner: "alice".into() }),
            ServerOutput::Error(ServerError::InvalidName("x /op".into())),
        ] {
            h.bridge.handle_server_output(output).await;
        }

        assert_eq!(
            sent(&h.bridge),
            [
                "Al_99 (@alice) joined the game",
                "bob joined the game",
                "bob has made the advancement [Stone Age]",
                "bob fell from a high place",
                "Server started!",
                "2 active players:\nAl_99 (@alice), bob",
                "Al_99 (@alice) left the game",
                "Al_99 is already taken by @alice",
                "\"x /op\" is not a valid name",
            ]
        );
        assert!(h.bridge.server().inputs.is_empty());
    }

    #[tokio::test]
    async fn console_chat_is_relayed_back_when_flagged() {
        let mut h = harness(running_server());
        h.bridge
            .handle_server_output(ServerOutput::Message { relay: false, author: "bob".into(), text: "gg".into() })
            .await;
        h.bridge
            .handle_server_output(ServerOutput::Message { relay: true, author: "Server".into(), text: "restart soon".into() })
            .await;

        assert_eq!(sent(&h.bridge), ["bob: gg", "Server: restart soon"]);
        assert!(matches!(
            &h.bridge.server().inputs[..],
            [ServerInput::Chat { origin: Origin::Server, author, .. }] if author == "Server"
        ));
    }

    #[tokio::test]
    async fn interrupt_stops_a_running_server_first() {
        let mut h = harness(running_server());
        h.bridge.interrupt().await;
        assert_eq!(h.bridge.server().stops, 1);
        assert!(!h.bridge.is_stopping());

        h.bridge.server.running = false;
        h.bridge.handle_server_output(ServerOutput::Exit { code: 0 }).await;
        assert!(h.bridge.finished());
    }

    #[tokio::test]
    async fn interrupt_without_server_shuts_down_directly() {
        let mut h = harness(FakeServer::default());
        h.bridge.interrupt().await;
        assert!(h.bridge.finished());
        assert_eq!(h.bridge.chat().stops, 1);
    }
}
