use ghostline_core::{
    completion::CompletionOptions,
    history::HistoryOptions,
    keymap::{Provider, SendShortcut},
};
use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};

/// User configuration, read from `ghostline.toml`.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub provider: Provider,
    pub send_shortcut: SendShortcut,

    /// Text shown after the permission mode at the start of the line.
    pub prompt: String,

    /// Names offered by the `/` popup.
    pub commands: Vec<String>,

    /// Names offered by the `#` popup.
    pub agents: Vec<String>,
    pub completion: CompletionOptions,
    pub history: HistoryOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            send_shortcut: SendShortcut::default(),
            prompt: "›".into(),
            commands: ["clear", "completion", "help", "history", "mode"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            agents: Vec::new(),
            completion: CompletionOptions::default(),
            history: HistoryOptions::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Config {
    /// Load the config at `path`. A missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("no config file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }
}
