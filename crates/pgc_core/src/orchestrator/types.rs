//! Run state, requests and reports.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};
use parking_lot::Mutex;

use super::errors::ConversionError;
use crate::models::FilePlan;

/// What the active process is doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Single,
    Merged,
    /// 1-based position in a batch.
    Batch { index: usize, total: usize },
    /// First half of a two-stage run: inputs to LaTeX.
    Intermediate,
    /// Second half of a two-stage run: LaTeX to the final format.
    Final,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Single => write!(f, "single"),
            Stage::Merged => write!(f, "merged"),
            Stage::Batch { index, total } => write!(f, "batch {} of {}", index, total),
            Stage::Intermediate => write!(f, "stage1-intermediate"),
            Stage::Final => write!(f, "stage2-final"),
        }
    }
}

/// Observable orchestrator state.
///
/// `Idle -> Running(..) -> Succeeded | Failed | Cancelled -> Idle`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running(Stage),
    Succeeded,
    Failed {
        message: String,
        exit_code: Option<i32>,
    },
    Cancelled,
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running(_))
    }
}

/// Which stream a chunk of output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
    /// Lines written by the orchestrator itself (commands, progress markers).
    Log,
}

/// One conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub plan: FilePlan,
    /// Encoded arguments appended to every invocation.
    pub tokens: Vec<String>,
    /// Produce `<output>.tex` first, then convert that to the output.
    pub two_stage: bool,
}

/// Per-file counts for the run. Single and merged runs count as one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Finished. A batch may still contain failed files; see the summary.
    Succeeded,
    Failed(ConversionError),
    Cancelled,
}

/// Everything a caller gets back from a run.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub summary: RunSummary,
    /// Last lines of output, oldest first.
    pub output_tail: Vec<String>,
    /// Processes started (pre-flight not included).
    pub invocations: usize,
    pub started_at: DateTime<Local>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RunOutcome::Succeeded) && self.summary.failed == 0
    }

    /// Exit code of the failing process for a failed run.
    pub fn exit_code(&self) -> Option<i32> {
        match &self.outcome {
            RunOutcome::Failed(e) => e.exit_code(),
            _ => None,
        }
    }
}

/// Bounded line buffer fed with raw output chunks.
#[derive(Debug)]
pub(crate) struct OutputTail {
    inner: Mutex<TailInner>,
    limit: usize,
}

#[derive(Debug, Default)]
struct TailInner {
    lines: VecDeque<String>,
    partial: String,
}

impl OutputTail {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            inner: Mutex::new(TailInner::default()),
            limit,
        }
    }

    pub(crate) fn push(&self, chunk: &str) {
        if self.limit == 0 {
            return;
        }
        let mut inner = self.inner.lock();
        inner.partial.push_str(chunk);
        while let Some(pos) = inner.partial.find('\n') {
            let line: String = inner.partial.drain(..=pos).collect();
            inner.lines.push_back(line.trim_end_matches(['\n', '\r']).to_string());
            if inner.lines.len() > self.limit {
                inner.lines.pop_front();
            }
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<String> {
        let inner = self.inner.lock();
        let mut lines: Vec<String> = inner.lines.iter().cloned().collect();
        if !inner.partial.is_empty() {
            lines.push(inner.partial.clone());
            if lines.len() > self.limit {
                lines.remove(0);
            }
        }
        lines
    }
}

/// State of the run in progress. Exists only while a run is active.
#[derive(Debug)]
pub struct ConversionJob {
    plan: FilePlan,
    stage: Option<Stage>,
    output: OutputTail,
    terminated: bool,
    started_at: DateTime<Local>,
}

impl ConversionJob {
    pub(crate) fn new(plan: FilePlan, tail_lines: usize) -> Self {
        Self {
            plan,
            stage: None,
            output: OutputTail::new(tail_lines),
            terminated: false,
            started_at: Local::now(),
        }
    }

    pub fn plan(&self) -> &FilePlan {
        &self.plan
    }

    pub fn stage(&self) -> Option<&Stage> {
        self.stage.as_ref()
    }

    /// True once the active process was killed by a cancel.
    pub fn terminated(&self) -> bool {
        self.terminated
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn output_tail(&self) -> Vec<String> {
        self.output.snapshot()
    }

    pub(crate) fn set_stage(&mut self, stage: Stage) {
        self.stage = Some(stage);
    }

    pub(crate) fn mark_terminated(&mut self) {
        self.terminated = true;
    }

    pub(crate) fn output(&self) -> &OutputTail {
        &self.output
    }
}
