//! The conversion state machine.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::command;
use super::errors::{ConversionError, ConversionResult};
use super::observer::ConversionObserver;
use super::runner::{CancelHandle, CommandLine, ProcessExit, TokioRunner, ToolRunner};
use super::types::{
    ConversionJob, ConversionRequest, OutputStream, RunOutcome, RunReport, RunState, RunSummary,
    Stage,
};
use crate::config::ToolSettings;
use crate::logging::MessagePrefix;
use crate::models::FilePlan;

/// Drives pandoc through one run at a time.
///
/// `run` takes `&mut self`, so a second run cannot start while one is
/// active. Cancel from elsewhere through [`Orchestrator::cancel_handle`].
pub struct Orchestrator<R: ToolRunner = TokioRunner> {
    runner: R,
    tool: ToolSettings,
    state: RunState,
    cancel: CancelHandle,
    job: Option<ConversionJob>,
}

impl Orchestrator<TokioRunner> {
    /// Orchestrator spawning real processes.
    pub fn with_tokio(tool: ToolSettings) -> Self {
        Self::new(TokioRunner, tool)
    }
}

impl<R: ToolRunner> Orchestrator<R> {
    pub fn new(runner: R, tool: ToolSettings) -> Self {
        Self {
            runner,
            tool,
            state: RunState::Idle,
            cancel: CancelHandle::new(),
            job: None,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Handle for cancelling the active run from another task.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// The active job. Always `None` outside of `run`.
    pub fn job(&self) -> Option<&ConversionJob> {
        self.job.as_ref()
    }

    pub fn tool(&self) -> &ToolSettings {
        &self.tool
    }

    /// Execute a conversion request to completion.
    ///
    /// Every state change is reported to `observer`; the orchestrator is back
    /// in `Idle` when this returns.
    pub async fn run(
        &mut self,
        request: ConversionRequest,
        observer: &dyn ConversionObserver,
    ) -> RunReport {
        self.cancel.reset();
        let clock = Instant::now();
        let job = self.job.insert(ConversionJob::new(
            request.plan.clone(),
            self.tool.output_tail_lines,
        ));
        let started_at = job.started_at();

        tracing::info!(
            "Starting {} conversion(s) from {} file(s)",
            request.plan.unit_count(),
            request.plan.inputs().len()
        );

        let mut execution = Execution {
            runner: &self.runner,
            tool: &self.tool,
            cancel: &self.cancel,
            job,
            state: &mut self.state,
            observer,
            summary: RunSummary::default(),
            invocations: 0,
        };
        let result = execution.drive(&request).await;
        let summary = execution.summary;
        let invocations = execution.invocations;

        let outcome = match result {
            Ok(()) => {
                execution.log(MessagePrefix::Phase, "Conversion complete");
                RunOutcome::Succeeded
            }
            Err(Halt::Cancelled) => {
                execution.log(MessagePrefix::Warning, "Conversion cancelled");
                RunOutcome::Cancelled
            }
            Err(Halt::Failed(error)) => {
                execution.log(MessagePrefix::Error, &error.to_string());
                RunOutcome::Failed(error)
            }
        };

        let terminal = match &outcome {
            RunOutcome::Succeeded => RunState::Succeeded,
            RunOutcome::Cancelled => RunState::Cancelled,
            RunOutcome::Failed(error) => RunState::Failed {
                message: error.to_string(),
                exit_code: error.exit_code(),
            },
        };
        execution.set_state(terminal);
        execution.set_state(RunState::Idle);

        let output_tail = self
            .job
            .take()
            .map(|job| job.output_tail())
            .unwrap_or_default();

        let elapsed = clock.elapsed();
        tracing::info!(
            "Conversion finished in {:.1}s: {} succeeded, {} failed",
            elapsed.as_secs_f64(),
            summary.succeeded,
            summary.failed
        );

        RunReport {
            outcome,
            summary,
            output_tail,
            invocations,
            started_at,
            elapsed,
        }
    }
}

/// Why a run stopped early.
enum Halt {
    Cancelled,
    Failed(ConversionError),
}

impl From<ConversionError> for Halt {
    fn from(error: ConversionError) -> Self {
        Halt::Failed(error)
    }
}

/// Borrowed view of the orchestrator for the duration of one run.
struct Execution<'a, R: ToolRunner> {
    runner: &'a R,
    tool: &'a ToolSettings,
    cancel: &'a CancelHandle,
    job: &'a mut ConversionJob,
    state: &'a mut RunState,
    observer: &'a dyn ConversionObserver,
    summary: RunSummary,
    invocations: usize,
}

impl<R: ToolRunner> Execution<'_, R> {
    async fn drive(&mut self, request: &ConversionRequest) -> Result<(), Halt> {
        if request.plan.inputs().is_empty() {
            return Err(ConversionError::EmptyPlan.into());
        }

        self.preflight().await?;
        self.check_cancelled()?;

        let tokens = request.tokens.as_slice();
        let two_stage = request.two_stage;

        match &request.plan {
            FilePlan::Single { input, output } => {
                let inputs = std::slice::from_ref(input);
                self.convert_counted(Stage::Single, inputs, output, tokens, two_stage)
                    .await
            }
            FilePlan::Merged { inputs, output } => {
                self.log(MessagePrefix::Section, &format!("Merging {} files", inputs.len()));
                for (i, input) in inputs.iter().enumerate() {
                    self.log(MessagePrefix::None, &format!("  {}. {}", i + 1, file_name(input)));
                }
                self.convert_counted(Stage::Merged, inputs, output, tokens, two_stage)
                    .await
            }
            FilePlan::Batch {
                inputs,
                output_dir,
                output_format,
            } => {
                let total = inputs.len();
                for (i, input) in inputs.iter().enumerate() {
                    self.check_cancelled()?;

                    let stage = Stage::Batch { index: i + 1, total };
                    self.log(
                        MessagePrefix::Section,
                        &format!("Converting ({}/{}): {}", i + 1, total, file_name(input)),
                    );
                    let output = FilePlan::batch_output(output_dir, input, output_format);

                    match self
                        .convert(stage, std::slice::from_ref(input), &output, tokens, two_stage)
                        .await
                    {
                        Ok(()) => {
                            self.summary.succeeded += 1;
                            self.log(MessagePrefix::Success, &file_name(input));
                        }
                        Err(Halt::Cancelled) => return Err(Halt::Cancelled),
                        Err(Halt::Failed(error)) => {
                            self.summary.failed += 1;
                            tracing::warn!("Batch item {} failed: {}", input.display(), error);
                            let message = format!("{}: {}", file_name(input), error);
                            self.log(MessagePrefix::Error, &message);
                        }
                    }
                }
                self.log(
                    MessagePrefix::Phase,
                    &format!(
                        "Batch finished: {} succeeded, {} failed",
                        self.summary.succeeded, self.summary.failed
                    ),
                );
                Ok(())
            }
        }
    }

    /// Check that the tool answers `--version` before touching any file.
    async fn preflight(&self) -> ConversionResult<String> {
        let program = self.tool.program.as_str();
        let timeout = Duration::from_secs(self.tool.preflight_timeout_secs);

        let version = self.runner.query_version(program, timeout).await.map_err(|e| {
            tracing::error!("Pre-flight check for {} failed: {}", program, e);
            ConversionError::tool_unavailable(program, e)
        })?;
        tracing::debug!("Pre-flight ok: {}", version);
        Ok(version)
    }

    /// A single or merged conversion, counted in the summary.
    async fn convert_counted(
        &mut self,
        stage: Stage,
        inputs: &[PathBuf],
        output: &Path,
        tokens: &[String],
        two_stage: bool,
    ) -> Result<(), Halt> {
        let result = self.convert(stage, inputs, output, tokens, two_stage).await;
        match &result {
            Ok(()) => self.summary.succeeded += 1,
            Err(Halt::Failed(_)) => self.summary.failed += 1,
            Err(Halt::Cancelled) => {}
        }
        result
    }

    /// One output, either directly or through an intermediate `.tex`.
    async fn convert(
        &mut self,
        stage: Stage,
        inputs: &[PathBuf],
        output: &Path,
        tokens: &[String],
        two_stage: bool,
    ) -> Result<(), Halt> {
        let resource_path = command::resource_path(inputs);

        let intermediate = if two_stage {
            command::intermediate_path(output)
        } else {
            None
        };
        let Some(tex) = intermediate else {
            return self.invoke(stage, inputs, output, &resource_path, tokens).await;
        };

        self.set_state(RunState::Running(stage));
        self.invoke(Stage::Intermediate, inputs, &tex, &resource_path, tokens)
            .await?;
        self.log(MessagePrefix::Success, &format!("LaTeX written: {}", file_name(&tex)));

        let final_tokens = command::strip_header_includes(tokens);
        self.invoke(Stage::Final, &[tex], output, &resource_path, &final_tokens)
            .await
    }

    /// Start one process and wait for it.
    async fn invoke(
        &mut self,
        stage: Stage,
        inputs: &[PathBuf],
        output: &Path,
        resource_path: &str,
        tokens: &[String],
    ) -> Result<(), Halt> {
        self.check_cancelled()?;
        self.set_state(RunState::Running(stage.clone()));
        self.job.set_stage(stage.clone());

        if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                ConversionError::io(format!("creating {}", dir.display()), e)
            })?;
        }

        let program = self.tool.program.as_str();
        let command = command::invocation(program, inputs, output, resource_path, tokens);
        self.log(MessagePrefix::Command, &command.to_string());
        tracing::debug!("[{}] {}", stage, command);

        self.observer.on_started(&stage, &command);
        self.invocations += 1;

        let recorder = Recorder {
            inner: self.observer,
            job: &*self.job,
        };
        let exit = self
            .runner
            .run(&command, &recorder, self.cancel)
            .await
            .map_err(|e| ConversionError::spawn(program, e))?;

        self.observer.on_finished(&stage, &exit);
        self.finish(&stage, &command, exit)
    }

    fn finish(
        &mut self,
        stage: &Stage,
        command: &CommandLine,
        exit: ProcessExit,
    ) -> Result<(), Halt> {
        match exit {
            ProcessExit::Exited(0) => Ok(()),
            ProcessExit::Cancelled => {
                self.job.mark_terminated();
                tracing::info!("[{}] {} terminated", stage, command.program);
                Err(Halt::Cancelled)
            }
            other => {
                let code = other.code().unwrap_or(-1);
                tracing::warn!("[{}] {} exited with {}", stage, command.program, code);
                Err(ConversionError::process_failure(&command.program, code).into())
            }
        }
    }

    fn check_cancelled(&self) -> Result<(), Halt> {
        if self.cancel.is_cancelled() {
            Err(Halt::Cancelled)
        } else {
            Ok(())
        }
    }

    fn set_state(&mut self, state: RunState) {
        if *self.state != state {
            *self.state = state;
            self.observer.on_state_changed(self.state);
        }
    }

    /// A line in the user-facing log (observer and output tail).
    fn log(&self, prefix: MessagePrefix, message: &str) {
        let line = prefix.line(message);
        self.job.output().push(&line);
        self.observer.on_output(OutputStream::Log, &line);
    }
}

/// Forwards process output to the caller's observer and keeps the tail.
struct Recorder<'a> {
    inner: &'a dyn ConversionObserver,
    job: &'a ConversionJob,
}

impl ConversionObserver for Recorder<'_> {
    fn on_output(&self, stream: OutputStream, chunk: &str) {
        self.job.output().push(chunk);
        self.inner.on_output(stream, chunk);
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_tracing;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::io;
    use tempfile::tempdir;

    /// Runner that replays scripted exits and records every command.
    #[derive(Default)]
    struct ScriptedRunner {
        version_error: Option<String>,
        exits: Mutex<VecDeque<ProcessExit>>,
        calls: Mutex<Vec<CommandLine>>,
        version_queries: Mutex<usize>,
        /// Invocation number (1-based) that triggers a cancel.
        cancel_on: Option<usize>,
    }

    impl ScriptedRunner {
        fn with_exits(exits: &[ProcessExit]) -> Self {
            Self {
                exits: Mutex::new(exits.iter().copied().collect()),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<CommandLine> {
            self.calls.lock().clone()
        }
    }

    impl ToolRunner for ScriptedRunner {
        async fn query_version(&self, _program: &str, _timeout: Duration) -> io::Result<String> {
            *self.version_queries.lock() += 1;
            match &self.version_error {
                Some(reason) => Err(io::Error::new(io::ErrorKind::NotFound, reason.clone())),
                None => Ok("pandoc 3.1.11".to_string()),
            }
        }

        async fn run(
            &self,
            command: &CommandLine,
            observer: &dyn ConversionObserver,
            cancel: &CancelHandle,
        ) -> io::Result<ProcessExit> {
            let call = {
                let mut calls = self.calls.lock();
                calls.push(command.clone());
                calls.len()
            };
            observer.on_output(OutputStream::Stderr, &format!("call {}\n", call));

            if self.cancel_on == Some(call) {
                cancel.cancel();
                return Ok(ProcessExit::Cancelled);
            }
            Ok(self.exits.lock().pop_front().unwrap_or(ProcessExit::Exited(0)))
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        states: Mutex<Vec<RunState>>,
        output: Mutex<String>,
    }

    impl ConversionObserver for RecordingObserver {
        fn on_state_changed(&self, state: &RunState) {
            self.states.lock().push(state.clone());
        }

        fn on_output(&self, _stream: OutputStream, chunk: &str) {
            self.output.lock().push_str(chunk);
        }
    }

    fn orchestrator(runner: ScriptedRunner) -> Orchestrator<ScriptedRunner> {
        init_test_tracing();
        Orchestrator::new(runner, ToolSettings::default())
    }

    fn request(plan: FilePlan, tokens: &[&str], two_stage: bool) -> ConversionRequest {
        ConversionRequest {
            plan,
            tokens: tokens.iter().map(|s| s.to_string()).collect(),
            two_stage,
        }
    }

    fn batch_of_three(root: &Path) -> FilePlan {
        FilePlan::Batch {
            inputs: vec![root.join("a.md"), root.join("b.md"), root.join("c.md")],
            output_dir: root.join("out"),
            output_format: "html".to_string(),
        }
    }

    #[tokio::test]
    async fn single_run_succeeds_and_returns_to_idle() {
        let dir = tempdir().unwrap();
        let mut orch = orchestrator(ScriptedRunner::default());
        let observer = RecordingObserver::default();
        let plan = FilePlan::Single {
            input: dir.path().join("a.md"),
            output: dir.path().join("build").join("a.pdf"),
        };

        let report = orch.run(request(plan, &["--toc"], false), &observer).await;

        assert!(report.is_success());
        assert_eq!(report.invocations, 1);
        assert_eq!(report.summary, RunSummary { succeeded: 1, failed: 0 });
        assert!(dir.path().join("build").is_dir());
        assert_eq!(
            *observer.states.lock(),
            vec![RunState::Running(Stage::Single), RunState::Succeeded, RunState::Idle]
        );
        assert_eq!(orch.state(), &RunState::Idle);
        assert!(orch.job().is_none());

        let call = &orch.runner.calls()[0];
        let input = paths_token(&dir.path().join("a.md"));
        let out = paths_token(&dir.path().join("build").join("a.pdf"));
        let res = paths_token(&crate::paths::absolute(dir.path()));
        assert_eq!(
            call.args,
            vec![input, "-o".into(), out, "--resource-path".into(), res, "--toc".into()]
        );
        assert!(report.output_tail.iter().any(|line| line == "call 1"));
    }

    fn paths_token(path: &Path) -> String {
        crate::paths::to_token(path)
    }

    #[tokio::test]
    async fn batch_continues_after_a_failure() {
        let dir = tempdir().unwrap();
        let runner = ScriptedRunner::with_exits(&[
            ProcessExit::Exited(0),
            ProcessExit::Exited(43),
            ProcessExit::Exited(0),
        ]);
        let mut orch = orchestrator(runner);
        let observer = RecordingObserver::default();

        let report = orch
            .run(request(batch_of_three(dir.path()), &[], false), &observer)
            .await;

        assert!(matches!(report.outcome, RunOutcome::Succeeded));
        assert_eq!(report.summary, RunSummary { succeeded: 2, failed: 1 });
        assert!(!report.is_success());

        let calls = orch.runner.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[2].args[0], paths_token(&dir.path().join("c.md")));
        assert_eq!(
            calls[2].args[2],
            paths_token(&dir.path().join("out").join("c.html"))
        );

        let states = observer.states.lock();
        assert!(states.contains(&RunState::Running(Stage::Batch { index: 3, total: 3 })));
        assert_eq!(states[states.len() - 2], RunState::Succeeded);
        assert!(observer.output.lock().contains("exit code 43"));
    }

    #[tokio::test]
    async fn two_stage_stops_when_latex_fails() {
        let dir = tempdir().unwrap();
        let runner = ScriptedRunner::with_exits(&[ProcessExit::Exited(2)]);
        let mut orch = orchestrator(runner);
        let plan = FilePlan::Single {
            input: dir.path().join("a.md"),
            output: dir.path().join("a.pdf"),
        };

        let report = orch
            .run(request(plan, &[], true), &RecordingObserver::default())
            .await;

        assert_eq!(orch.runner.calls().len(), 1);
        assert!(matches!(report.outcome, RunOutcome::Failed(_)));
        assert_eq!(report.exit_code(), Some(2));
        assert_eq!(report.summary, RunSummary { succeeded: 0, failed: 1 });
    }

    #[tokio::test]
    async fn two_stage_converts_through_tex_without_header() {
        let dir = tempdir().unwrap();
        let mut orch = orchestrator(ScriptedRunner::default());
        let observer = RecordingObserver::default();
        let plan = FilePlan::Single {
            input: dir.path().join("a.md"),
            output: dir.path().join("a.pdf"),
        };
        let tokens = ["--toc", "--include-in-header", "/tmp/h.tex"];

        let report = orch.run(request(plan, &tokens, true), &observer).await;
        assert!(report.is_success());

        let calls = orch.runner.calls();
        assert_eq!(calls.len(), 2);

        let tex = paths_token(&dir.path().join("a.tex"));
        assert_eq!(calls[0].args[2], tex);
        assert!(calls[0].args.ends_with(&[
            "--toc".to_string(),
            "--include-in-header".to_string(),
            "/tmp/h.tex".to_string()
        ]));

        assert_eq!(calls[1].args[0], tex);
        assert_eq!(calls[1].args[2], paths_token(&dir.path().join("a.pdf")));
        assert!(!calls[1].args.iter().any(|a| a == "--include-in-header"));
        assert_eq!(calls[1].args.last().map(String::as_str), Some("--toc"));

        let states = observer.states.lock();
        assert!(states.contains(&RunState::Running(Stage::Intermediate)));
        assert!(states.contains(&RunState::Running(Stage::Final)));
    }

    #[tokio::test]
    async fn cancel_during_batch_stops_further_files() {
        let dir = tempdir().unwrap();
        let runner = ScriptedRunner {
            cancel_on: Some(2),
            ..Default::default()
        };
        let mut orch = orchestrator(runner);
        let observer = RecordingObserver::default();

        let report = orch
            .run(request(batch_of_three(dir.path()), &[], false), &observer)
            .await;

        assert!(matches!(report.outcome, RunOutcome::Cancelled));
        assert_eq!(orch.runner.calls().len(), 2);
        assert_eq!(report.summary, RunSummary { succeeded: 1, failed: 0 });

        let states = observer.states.lock();
        assert!(!states.contains(&RunState::Running(Stage::Batch { index: 3, total: 3 })));
        assert_eq!(
            states[states.len() - 2..],
            [RunState::Cancelled, RunState::Idle]
        );
    }

    #[tokio::test]
    async fn preflight_failure_spawns_nothing() {
        let dir = tempdir().unwrap();
        let runner = ScriptedRunner {
            version_error: Some("No such file or directory".into()),
            ..Default::default()
        };
        let mut orch = orchestrator(runner);
        let plan = FilePlan::Single {
            input: dir.path().join("a.md"),
            output: dir.path().join("never").join("a.pdf"),
        };

        let report = orch
            .run(request(plan, &[], false), &RecordingObserver::default())
            .await;

        assert!(matches!(
            report.outcome,
            RunOutcome::Failed(ConversionError::ToolUnavailable { .. })
        ));
        assert_eq!(report.invocations, 0);
        assert!(orch.runner.calls().is_empty());
        assert!(!dir.path().join("never").exists());
        assert_eq!(orch.state(), &RunState::Idle);
    }

    #[tokio::test]
    async fn empty_plan_is_rejected_without_probing() {
        let dir = tempdir().unwrap();
        let mut orch = orchestrator(ScriptedRunner::default());
        let plan = FilePlan::Batch {
            inputs: Vec::new(),
            output_dir: dir.path().to_path_buf(),
            output_format: "pdf".into(),
        };

        let report = orch
            .run(request(plan, &[], false), &RecordingObserver::default())
            .await;

        assert!(matches!(report.outcome, RunOutcome::Failed(ConversionError::EmptyPlan)));
        assert_eq!(*orch.runner.version_queries.lock(), 0);
    }

    #[tokio::test]
    async fn new_run_after_cancel_starts_clean() {
        let dir = tempdir().unwrap();
        let runner = ScriptedRunner {
            cancel_on: Some(1),
            ..Default::default()
        };
        let mut orch = orchestrator(runner);
        let plan = FilePlan::Single {
            input: dir.path().join("a.md"),
            output: dir.path().join("a.pdf"),
        };

        let first = orch
            .run(request(plan.clone(), &[], false), &RecordingObserver::default())
            .await;
        assert!(matches!(first.outcome, RunOutcome::Cancelled));

        let second = orch
            .run(request(plan, &[], false), &RecordingObserver::default())
            .await;
        assert!(second.is_success());
        assert_eq!(orch.runner.calls().len(), 2);
    }

    #[tokio::test]
    async fn signal_exit_reports_minus_one() {
        let dir = tempdir().unwrap();
        let runner = ScriptedRunner::with_exits(&[ProcessExit::Signalled]);
        let mut orch = orchestrator(runner);
        let plan = FilePlan::Merged {
            inputs: vec![dir.path().join("a.md"), dir.path().join("b.md")],
            output: dir.path().join("a_merged.pdf"),
        };

        let report = orch
            .run(request(plan, &[], false), &RecordingObserver::default())
            .await;
        assert_eq!(report.exit_code(), Some(-1));
    }
}
