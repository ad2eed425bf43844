mod settings;

pub use settings::{ServerConfig, SessionSettings, Settings, UploadConfig};
