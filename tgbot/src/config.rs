#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BotConfig {
    pub api_token: String,
    /// The only chat the bot listens to and writes in.
    pub chat_id: i64,
    /// Telegram username allowed to run console commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_username: Option<String>,
}

impl BotConfig {
    pub fn is_admin(&self, username: &str) -> bool {
        self.admin_username.as_deref().is_some_and(|admin| !admin.is_empty() && admin == username)
    }
}
