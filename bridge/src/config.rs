use anyhow::Context;
use serverctl::ServerConfig;
use tgbot::BotConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const TOKEN_ENV: &str = "SERVERBOT_TOKEN";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Config {
    pub bot: BotConfig,
    pub server: ServerConfig,
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Config> {
        let json = std::fs::read_to_string(path).with_context(|| format!("could not read config file {path}"))?;
        let mut config = Config::parse(&json).with_context(|| format!("invalid config file {path}"))?;
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            config.bot.api_token = token;
        }
        Ok(config)
    }

    pub fn parse(json: &str) -> anyhow::Result<Config> {
        Ok(serde_json::from_str::<Config>(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_sections() {
        let config = Config::parse(
            r#"{
                "bot": {"api_token": "123:abc", "chat_id": -100123, "admin_username": "greg"},
                "server": {"cmdline": ["java", "-jar", "server.jar", "nogui"], "log_lines": 30}
            }"#,
        )
        .unwrap();
        assert_eq!(config.bot.chat_id, -100123);
        assert_eq!(config.bot.admin_username.as_deref(), Some("greg"));
        assert_eq!(config.server.cmdline, ["java", "-jar", "server.jar", "nogui"]);
        assert_eq!(config.server.log_lines, 30);
    }

    #[test]
    fn missing_section_is_rejected() {
        assert!(Config::parse(r#"{"bot": {"api_token": "t", "chat_id": 1}}"#).is_err());
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = Config::load("/nonexistent/serverbot.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/serverbot.json"));
    }
}
