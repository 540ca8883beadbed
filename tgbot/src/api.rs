//! The small part of the Telegram Bot API the bridge needs.

use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{BotError, Result};

pub const API_BASE: &str = "https://api.telegram.org/bot";
pub const API_FILE_BASE: &str = "https://api.telegram.org/file/bot";

/// Seconds telegram holds a getUpdates call open.
pub const LONG_POLL_TIMEOUT: u64 = 30;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(LONG_POLL_TIMEOUT + 15);

#[derive(Debug, Deserialize)]
pub struct ExchangeResult<T> {
    pub ok: bool,
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub description: String,
    pub result: Option<T>,
}

impl<T> ExchangeResult<T> {
    pub fn into_result(self) -> Result<T> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(BotError::Api {
                code: self.error_code,
                description: self.description,
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetMe {
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct User {
    #[serde(default)]
    pub first_name: String,
    pub username: Option<String>,
}

impl User {
    /// The only name that identifies a sender. Users without a username have
    /// no identity in the bridge.
    pub fn identity(&self) -> Option<&str> {
        self.username.as_deref().filter(|username| !username.is_empty())
    }

    pub fn display_name(&self) -> &str {
        self.identity().unwrap_or(&self.first_name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sticker {
    pub file_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: User,
    pub chat: Chat,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub sticker: Option<Sticker>,
    #[serde(default)]
    pub photo: Vec<PhotoSize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub edited_message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct File {
    pub file_id: String,
    pub file_path: Option<String>,
}

#[derive(Serialize)]
struct GetUpdates {
    offset: i64,
    timeout: u64,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Serialize)]
struct GetFile<'a> {
    file_id: &'a str,
}

pub struct Api {
    token: String,
    http: reqwest::Client,
}

impl Api {
    pub fn new(token: String) -> Result<Api> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Api { token, http })
    }

    fn uri(&self, endpoint: &str) -> String {
        format!("{API_BASE}{}/{endpoint}", self.token)
    }

    fn file_uri(&self, file_path: &str) -> String {
        format!("{API_FILE_BASE}{}/{file_path}", self.token)
    }

    async fn call<P: Serialize, T: DeserializeOwned>(&self, endpoint: &str, params: &P) -> Result<T> {
        let response = self.http.post(self.uri(endpoint)).json(params).send().await?;
        let result = response.json::<ExchangeResult<T>>().await?;
        result.into_result()
    }

    pub async fn get_me(&self) -> Result<GetMe> {
        let response = self.http.get(self.uri("getMe")).send().await?;
        response.json::<ExchangeResult<GetMe>>().await?.into_result()
    }

    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let params = GetUpdates { offset, timeout: LONG_POLL_TIMEOUT };
        self.call("getUpdates", &params).await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message> {
        self.call("sendMessage", &SendMessage { chat_id, text }).await
    }

    pub async fn get_file(&self, file_id: &str) -> Result<File> {
        self.call("getFile", &GetFile { file_id }).await
    }

    pub async fn download(&self, file: &File) -> Result<Vec<u8>> {
        let path = file
            .file_path
            .as_deref()
            .ok_or_else(|| BotError::UnsupportedFile(file.file_id.clone()))?;
        let response = self.http.get(self.file_uri(path)).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}
