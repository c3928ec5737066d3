//! Handles settings for the admin CLI. Configuration is written in
//! `settings.toml`; every field is optional and can be overridden by flags
//! or environment variables.

use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub discrepancy_tolerance_minor: Option<i64>,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .build()?;

        settings.try_deserialize()
    }
}
