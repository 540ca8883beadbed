fn default_log_lines() -> usize {
    15
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ServerConfig {
    /// Program and arguments used to launch the game server.
    pub cmdline: Vec<String>,
    /// Console lines kept in memory by the bridge.
    #[serde(default = "default_log_lines")]
    pub log_lines: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_lines_defaults_when_missing() {
        let config: ServerConfig = serde_json::from_str(r#"{"cmdline": ["java", "-jar", "server.jar"]}"#).unwrap();
        assert_eq!(config.cmdline.len(), 3);
        assert_eq!(config.log_lines, 15);
    }
}
