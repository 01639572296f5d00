//! CLI command implementations.

pub mod doctor;
pub mod generate;
pub mod machines;
pub mod probe;

use anyhow::{bail, Result};
use bfdgen_pipeline::{ProgressObserver, Stage};

/// Report format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Human,
    Json,
}

impl Format {
    pub fn parse(format: Option<&str>) -> Result<Self> {
        match format.unwrap_or("human") {
            "human" | "text" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            other => bail!("unknown format '{other}' (expected human or json)"),
        }
    }
}

/// Prints `[+] <stage>: <detail>` lines to stdout.
pub struct ConsoleObserver;

impl ProgressObserver for ConsoleObserver {
    fn stage(&mut self, stage: Stage, detail: &str) {
        println!("[+] {stage}: {detail}");
    }
}
