//! Per-owner script sequencing.
//!
//! An `AttackSequence` owns an ordered list of scripts and drives them one
//! after another through `PatternRun`, optionally wrapping around forever.
//! It never re-checks owner liveness itself — the run's own yield-point
//! polling decides that — it only reacts: a cancelled run stops the
//! sequence without advancing.

use bevy::prelude::*;
use thiserror::Error;

use super::run::{EmitterContext, PatternRun, RunStatus};
use super::script::{PatternScript, ScriptError};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("attack sequence has no scripts")]
    EmptyScriptList,
    #[error("script {index} is invalid: {source}")]
    InvalidScript { index: usize, source: ScriptError },
}

#[derive(Debug)]
enum SequenceState {
    Idle,
    Running(PatternRun),
    /// Gap between two patterns; a non-positive remainder still consumes
    /// one tick before the next run starts.
    Between { remaining: f32 },
    Stopped,
}

#[derive(Component, Debug)]
pub struct AttackSequence {
    scripts: Vec<PatternScript>,
    looping: bool,
    pattern_gap: f32,
    index: usize,
    state: SequenceState,
}

impl AttackSequence {
    /// Validate and build. An empty list or an invalid script is a
    /// configuration error — the caller reports it and withholds the
    /// component rather than running with partial state.
    pub fn new(
        scripts: Vec<PatternScript>,
        looping: bool,
        pattern_gap: f32,
    ) -> Result<Self, ConfigError> {
        if scripts.is_empty() {
            return Err(ConfigError::EmptyScriptList);
        }
        for (index, script) in scripts.iter().enumerate() {
            script
                .validate()
                .map_err(|source| ConfigError::InvalidScript { index, source })?;
        }

        Ok(Self {
            scripts,
            looping,
            pattern_gap,
            index: 0,
            state: SequenceState::Idle,
        })
    }

    /// Advance the sequence by `dt` seconds.
    pub fn tick(&mut self, dt: f32, ctx: &mut dyn EmitterContext) {
        let mut dt = dt;
        match &mut self.state {
            SequenceState::Stopped => return,
            SequenceState::Idle => {
                self.state = SequenceState::Running(PatternRun::new(self.scripts[self.index]));
            }
            SequenceState::Between { remaining } => {
                *remaining -= dt;
                if *remaining > 0.0 {
                    return;
                }
                self.state = SequenceState::Running(PatternRun::new(self.scripts[self.index]));
                // The gap consumed this quantum's budget.
                dt = 0.0;
            }
            SequenceState::Running(_) => {}
        }

        let SequenceState::Running(run) = &mut self.state else { return };
        match run.advance(dt, ctx) {
            RunStatus::Running => {}
            RunStatus::Cancelled => self.state = SequenceState::Stopped,
            RunStatus::Completed => self.advance_script(),
        }
    }

    fn advance_script(&mut self) {
        self.index += 1;
        if self.index >= self.scripts.len() {
            if !self.looping {
                self.state = SequenceState::Stopped;
                return;
            }
            self.index = 0;
        }
        self.state = SequenceState::Between { remaining: self.pattern_gap };
    }

    /// Cancel the in-flight run and halt advancement. Idempotent.
    pub fn stop(&mut self) {
        self.state = SequenceState::Stopped;
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.state, SequenceState::Stopped)
    }

    /// Index of the script currently running or queued next.
    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn scripts(&self) -> &[PatternScript] {
        &self.scripts
    }
}
