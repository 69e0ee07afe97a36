//! Settings for the service, read from `settings.toml` in the working
//! directory and overridden by `PATCHPAIR__<SECTION>__<KEY>` variables.
//!
//! See `settings.toml` for an annotated example.
use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use engine::SelectionStrategy;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Patches {
    /// Directory holding `real/` and `fake/`.
    pub dir: PathBuf,
    #[serde(default)]
    pub load_on_start: bool,
    /// Wipe the pool (and all verdicts) before loading.
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub strategy: SelectionStrategy,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Server,
    pub patches: Patches,
    #[serde(default)]
    pub selection: Selection,
}

fn default_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("PATCHPAIR").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
