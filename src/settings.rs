use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Http {
    pub listen: String,
    pub static_dir: String,
}

#[derive(Debug, Deserialize)]
pub struct Sqlite {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct Email {
    pub api_url: String,
    pub sender: String,
    pub auth_token: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub http: Http,
    pub sqlite: Sqlite,
    pub email: Email,
}

impl Settings {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("WAITLIST").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
