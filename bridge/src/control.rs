//! The two sides the bridge drives, as traits so the bridge can run
//! against fakes.

use async_trait::async_trait;
use serverctl::{ServerInput, ServerProcess};
use tgbot::{ChatBot, ChatInput};

pub trait ServerControl {
    fn start(&mut self) -> serverctl::error::Result<()>;
    fn send(&mut self, input: ServerInput);
    fn stop(&mut self);
    fn is_running(&self) -> bool;
    fn restart_on_exit(&self) -> bool;
    fn reverse_rename(&self, username: &str) -> String;
}

#[async_trait]
pub trait ChatControl: Send {
    fn start(&mut self);
    async fn stop(&mut self);
    fn is_running(&self) -> bool;
    fn send(&self, input: ChatInput);
}

impl ServerControl for ServerProcess {
    fn start(&mut self) -> serverctl::error::Result<()> {
        ServerProcess::start(self)
    }

    fn send(&mut self, input: ServerInput) {
        ServerProcess::send(self, input)
    }

    fn stop(&mut self) {
        ServerProcess::stop(self)
    }

    fn is_running(&self) -> bool {
        ServerProcess::is_running(self)
    }

    fn restart_on_exit(&self) -> bool {
        ServerProcess::restart_on_exit(self)
    }

    fn reverse_rename(&self, username: &str) -> String {
        ServerProcess::reverse_rename(self, username)
    }
}

#[async_trait]
impl ChatControl for ChatBot {
    fn start(&mut self) {
        ChatBot::start(self)
    }

    async fn stop(&mut self) {
        ChatBot::stop(self).await
    }

    fn is_running(&self) -> bool {
        ChatBot::is_running(self)
    }

    fn send(&self, input: ChatInput) {
        ChatBot::send(self, input)
    }
}
