//! The four stopping points the driver can stop at: an early-return-per-
//! phase pipeline structure that lets a caller halt after lexing,
//! parsing, TAC lowering, or the full CFG build.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[clap(rename_all = "lowercase")]
pub enum EmitStage {
    /// Lex only, write `tokens.json`, stop.
    Tokens,
    /// Lex and parse, write `tokens.json` and `ast.json`, stop.
    Ast,
    /// Also lower to three-address code, print it to stdout, stop.
    Tac,
    /// Full pipeline: also build the extracted-function CFG and print it.
    /// This is the reference default.
    Cfg,
}

impl Default for EmitStage {
    fn default() -> Self {
        EmitStage::Cfg
    }
}
