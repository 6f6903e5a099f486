//! tacc-drv - the `tacc` command-line driver.
//!
//! Wires the lexer, parser, TAC emitter, and CFG builder together behind
//! a `clap`-derive CLI: global `verbose`/`config`/`no_color` flags,
//! `tracing-subscriber` logging init, and a `Config` loaded from an
//! optional file with CLI flags always winning over it.

pub mod config;
pub mod emit;
pub mod session;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser as ClapParser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::Config;
use emit::EmitStage;
use session::Session;

/// `tacc [OPTIONS] [INPUT]` - compile a source file and print its
/// extracted-function control-flow graph.
#[derive(ClapParser, Debug)]
#[command(name = "tacc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Toy-language compiler front end: lex, parse, lower to TAC, build a CFG")]
struct Cli {
    /// Source file to compile.
    #[arg(default_value = "./input/test.txt")]
    input: PathBuf,

    /// Enable debug-level logging.
    #[arg(short, long, env = "TACC_VERBOSE")]
    verbose: bool,

    /// Directory for tokens.json/ast.json.
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Stop after this stage.
    #[arg(long, value_enum)]
    emit: Option<EmitStage>,

    /// Path to a tacc.toml config file.
    #[arg(short, long, env = "TACC_CONFIG")]
    config: Option<PathBuf>,

    /// Disable ANSI color in CFG/error output.
    #[arg(long, env = "TACC_NO_COLOR")]
    no_color: bool,
}

impl Cli {
    /// Fold this invocation's flags over a loaded (or default) `Config`,
    /// with any flag the user actually passed winning over the file.
    fn apply_to(&self, mut config: Config) -> Config {
        if self.input != PathBuf::from("./input/test.txt") {
            config.input = self.input.clone();
        }
        if let Some(out_dir) = &self.out_dir {
            config.out_dir = out_dir.clone();
        }
        if let Some(emit) = self.emit {
            config.emit = emit;
        }
        config.verbose = config.verbose || self.verbose;
        config.no_color = config.no_color || self.no_color;
        config
    }
}

fn init_logging(verbose: bool, no_color: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let subscriber = fmt::layer()
        .with_ansi(!no_color)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    Ok(())
}

fn load_config(config_path: Option<&std::path::Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load_from_path(path),
        None => Ok(Config::default()),
    }
}

/// Entry point called by `main.rs`. Parses arguments, initializes
/// logging, resolves configuration, and runs the pipeline. Any `Err`
/// returned here is the only one `main.rs` prints and exits non-zero on.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.no_color)?;

    let config = load_config(cli.config.as_deref())?;
    let config = cli.apply_to(config);

    let mut session = Session::new(config);
    session.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_match_reference_behavior() {
        let cli = Cli::parse_from(["tacc"]);
        assert_eq!(cli.input, PathBuf::from("./input/test.txt"));
        assert!(!cli.verbose);
        assert!(cli.emit.is_none());
    }

    #[test]
    fn cli_accepts_positional_input_and_emit_stage() {
        let cli = Cli::parse_from(["tacc", "prog.txt", "--emit", "tokens"]);
        assert_eq!(cli.input, PathBuf::from("prog.txt"));
        assert_eq!(cli.emit, Some(EmitStage::Tokens));
    }

    #[test]
    fn cli_flags_override_loaded_config() {
        let cli = Cli::parse_from(["tacc", "other.txt", "--verbose"]);
        let config = cli.apply_to(Config::default());
        assert_eq!(config.input, PathBuf::from("other.txt"));
        assert!(config.verbose);
    }

    #[test]
    fn unset_flags_leave_loaded_config_untouched() {
        let cli = Cli::parse_from(["tacc"]);
        let mut loaded = Config::default();
        loaded.out_dir = PathBuf::from("/custom/out");
        let config = cli.apply_to(loaded);
        assert_eq!(config.out_dir, PathBuf::from("/custom/out"));
    }
}
