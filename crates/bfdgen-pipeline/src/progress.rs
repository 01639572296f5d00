//! Stage progress reporting.

use std::fmt;

use serde::Serialize;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Policy,
    Libraries,
    Header,
    Probe,
    Generate,
    Bootstrap,
    Registry,
    Write,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Self::Policy => "policy",
            Self::Libraries => "libraries",
            Self::Header => "header",
            Self::Probe => "probe",
            Self::Generate => "generate",
            Self::Bootstrap => "bootstrap",
            Self::Registry => "registry",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Receives one structured line per completed stage step.
pub trait ProgressObserver {
    fn stage(&mut self, stage: Stage, detail: &str);
}

/// Discards progress.
#[derive(Debug, Default)]
pub struct Silent;

impl ProgressObserver for Silent {
    fn stage(&mut self, _stage: Stage, _detail: &str) {}
}

/// Keeps every progress line, in order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub events: Vec<(Stage, String)>,
}

impl RecordingObserver {
    /// Stages reported so far, consecutive repeats collapsed.
    pub fn stages(&self) -> Vec<Stage> {
        let mut stages: Vec<Stage> = self.events.iter().map(|(stage, _)| *stage).collect();
        stages.dedup();
        stages
    }
}

impl ProgressObserver for RecordingObserver {
    fn stage(&mut self, stage: Stage, detail: &str) {
        self.events.push((stage, detail.to_string()));
    }
}
