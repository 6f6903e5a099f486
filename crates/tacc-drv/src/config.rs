//! Driver configuration: a `tacc.toml` file layered under CLI flags,
//! on a single flat surface since `tacc` has no subcommands.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::emit::EmitStage;

fn default_input() -> PathBuf {
    PathBuf::from("./input/test.txt")
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("./compiler-steps")
}

/// Driver configuration. CLI flags always win over whatever a loaded
/// `tacc.toml` supplies (see `Cli::apply_to` in `lib.rs`); this struct's
/// `Default`/`serde(default = ...)` fields are the literal defaults used
/// when neither a config file nor a CLI flag supplies a value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_input")]
    pub input: PathBuf,

    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    #[serde(default)]
    pub emit: EmitStage,

    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub no_color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: default_input(),
            out_dir: default_out_dir(),
            emit: EmitStage::default(),
            verbose: false,
            no_color: false,
        }
    }
}

impl Config {
    /// Load a `tacc.toml` from `path`. Any field it omits falls back to
    /// this struct's own defaults via `#[serde(default = ...)]`.
    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config {}: {e}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("failed to parse config {}: {e}", path.display()))?;
        Ok(config)
    }
}
