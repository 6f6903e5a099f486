//! Compilation session: one `tacc` invocation from source file to
//! printed CFG. Single-file, single-result: multi-file compilation is
//! out of scope.

use std::fs;

use anyhow::{Context, Result};
use tacc_lex::{Lexer, Token};
use tacc_par::{Block, Parser};
use tacc_tac::{cfg, Emitter};

use crate::config::Config;
use crate::emit::EmitStage;

pub struct Session {
    config: Config,
    source: String,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            source: String::new(),
        }
    }

    /// Run the pipeline end to end: read the source, lex, parse, lower
    /// to TAC, build the CFG, writing/printing artifacts as each stage's
    /// `--emit` cutoff allows.
    pub fn run(&mut self) -> Result<()> {
        self.read_source()?;

        let tokens = self.lex();
        self.write_tokens(&tokens)?;
        if self.config.emit == EmitStage::Tokens {
            return Ok(());
        }

        let block = self.parse(&tokens)?;
        self.write_ast(&block)?;
        if self.config.emit == EmitStage::Ast {
            return Ok(());
        }

        let program = Emitter::new().emit(&block);
        tracing::info!(
            instr_count = program.instrs.len(),
            "lowered program to three-address code"
        );
        if self.config.emit == EmitStage::Tac {
            let json = serde_json::to_string_pretty(program.instrs.as_slice())
                .context("failed to serialize TAC")?;
            println!("{json}");
            return Ok(());
        }

        let graph = cfg::extract_functions(&program.instrs, program.head);
        tracing::info!(block_count = graph.blocks.len(), "built control-flow graph");
        let json = serde_json::to_string_pretty(&graph).context("failed to serialize CFG")?;
        println!("{json}");
        Ok(())
    }

    fn read_source(&mut self) -> Result<()> {
        let path = &self.config.input;
        tracing::info!(path = %path.display(), "reading source file");
        self.source = fs::read_to_string(path)
            .with_context(|| format!("failed to read source file {}", path.display()))?;
        Ok(())
    }

    fn lex(&self) -> Vec<Token> {
        let tokens: Vec<_> = Lexer::new(&self.source).collect();
        tracing::debug!(count = tokens.len(), "lexed tokens");
        tokens
    }

    fn parse(&self, tokens: &[Token]) -> Result<Block> {
        let file_name = self.config.input.display().to_string();
        let mut parser = Parser::new(tokens, &self.source, &file_name);
        let block = parser.parse().map_err(|e| {
            let body = e.render_body();
            anyhow::anyhow!("{e}\n{body}")
        })?;
        tracing::info!(top_level_stmts = block.stmts.len(), "parsed program");
        Ok(block)
    }

    fn write_tokens(&self, tokens: &[Token]) -> Result<()> {
        self.write_json("tokens.json", tokens)
    }

    fn write_ast(&self, block: &Block) -> Result<()> {
        self.write_json("ast.json", block)
    }

    fn write_json<T: serde::Serialize>(&self, file_name: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.config.out_dir).with_context(|| {
            format!(
                "failed to create output directory {}",
                self.config.out_dir.display()
            )
        })?;
        let path = self.config.out_dir.join(file_name);
        let json = serde_json::to_string_pretty(value)
            .with_context(|| format!("failed to serialize {file_name}"))?;
        fs::write(&path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::debug!(path = %path.display(), "wrote artifact");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_source(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join("test.txt");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn writes_tokens_and_ast_and_succeeds_on_valid_source() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_source(&dir, "def x = 1\n");
        let config = Config {
            input,
            out_dir: dir.path().join("out"),
            emit: EmitStage::Cfg,
            verbose: false,
            no_color: false,
        };
        let mut session = Session::new(config);
        session.run().unwrap();
        assert!(dir.path().join("out").join("tokens.json").exists());
        assert!(dir.path().join("out").join("ast.json").exists());
    }

    #[test]
    fn stops_after_tokens_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_source(&dir, "def x = 1\n");
        let config = Config {
            input,
            out_dir: dir.path().join("out"),
            emit: EmitStage::Tokens,
            verbose: false,
            no_color: false,
        };
        let mut session = Session::new(config);
        session.run().unwrap();
        assert!(dir.path().join("out").join("tokens.json").exists());
        assert!(!dir.path().join("out").join("ast.json").exists());
    }

    #[test]
    fn fatal_parse_error_surfaces_rendered_body() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_source(&dir, "def = 5\n");
        let config = Config {
            input,
            out_dir: dir.path().join("out"),
            emit: EmitStage::Cfg,
            verbose: false,
            no_color: false,
        };
        let mut session = Session::new(config);
        let err = session.run().unwrap_err();
        let message = format!("{err}");
        assert!(message.contains("parse error:"));
        assert!(message.contains("Expected token"));
    }

    #[test]
    fn missing_source_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            input: dir.path().join("does-not-exist.txt"),
            out_dir: dir.path().join("out"),
            emit: EmitStage::Cfg,
            verbose: false,
            no_color: false,
        };
        let mut session = Session::new(config);
        assert!(session.run().is_err());
    }
}
