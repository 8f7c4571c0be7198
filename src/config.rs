// Where the CLI keeps its files. Flags win over environment variables,
// which win over the defaults in the working directory.

use std::env;
use std::path::PathBuf;

pub const STATE_PATH_ENV: &str = "BOTC_STATE_PATH";
pub const NAMES_PATH_ENV: &str = "BOTC_NAMES_PATH";
pub const SCRIPTS_PATH_ENV: &str = "BOTC_SCRIPTS_PATH";

pub const DEFAULT_STATE_PATH: &str = "botc-night-state.json";
pub const DEFAULT_NAMES_PATH: &str = "botc-player-names.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub state_path: PathBuf,
    pub names_path: PathBuf,
    /// Script catalog override; `None` uses the builtin catalog.
    pub scripts_path: Option<PathBuf>,
}

impl Settings {
    pub fn resolve(
        state_path: Option<PathBuf>,
        names_path: Option<PathBuf>,
        scripts_path: Option<PathBuf>,
    ) -> Self {
        Settings::resolve_with(state_path, names_path, scripts_path, |key| env::var(key).ok())
    }

    fn resolve_with(
        state_path: Option<PathBuf>,
        names_path: Option<PathBuf>,
        scripts_path: Option<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let from_env = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
        };
        Settings {
            state_path: state_path
                .or_else(|| from_env(STATE_PATH_ENV))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH)),
            names_path: names_path
                .or_else(|| from_env(NAMES_PATH_ENV))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_NAMES_PATH)),
            scripts_path: scripts_path.or_else(|| from_env(SCRIPTS_PATH_ENV)),
        }
    }
}
