use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("request to telegram failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("telegram api error code {code}: {description}")]
    Api { code: i64, description: String },

    #[error("could not decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("telegram returned no path for file {0}")]
    UnsupportedFile(String),
}

pub type Result<T> = std::result::Result<T, BotError>;
