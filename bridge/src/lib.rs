pub mod bridge;
pub mod config;
pub mod control;
pub mod log_tail;

pub use bridge::Bridge;
pub use config::Config;
