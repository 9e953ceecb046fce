//! Background job executor.
//!
//! Each submission gets one Tokio worker task that drives the record from
//! `Pending` to a terminal status through fixed checkpoints, plus a small
//! supervisor task that awaits the worker's `JoinHandle`. If the worker
//! panics, the supervisor records the job as `Failed`, so no record is left
//! non-terminal by a crashed executor.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use carbuy_core::job::{JobRecord, JobStatus, JobUpdate};
use carbuy_core::report::{FormatError, ReportFormatter};
use carbuy_core::request::AnalysisRequest;
use tokio::task::JoinHandle;

use crate::analysis::{
    AnalysisEngine, AnalysisError, AnalysisFactory, AnalysisInputs, AnalysisVariant,
};
use crate::registry::{new_session_id, JobRegistry, RegistryError};

pub const PROGRESS_INITIALIZING: u8 = 10;
pub const PROGRESS_PREPARING: u8 = 20;
pub const PROGRESS_INVOKING: u8 = 30;

pub const TASK_INITIALIZING: &str = "Initializing";
pub const TASK_PREPARING: &str = "Preparing analysis context";
pub const TASK_INVOKING: &str = "Invoking analysis";

/// Result stored when the formatter fails on an empty transcript.
pub const NO_RESULTS: &str = "No results generated";

/// Runs analysis jobs and records their lifecycle in the registry.
#[derive(Clone)]
pub struct JobExecutor {
    registry: Arc<JobRegistry>,
    factory: Arc<dyn AnalysisFactory>,
    formatter: Arc<dyn ReportFormatter>,
    analysis_timeout: Option<Duration>,
}

impl JobExecutor {
    pub fn new(
        registry: Arc<JobRegistry>,
        factory: Arc<dyn AnalysisFactory>,
        formatter: Arc<dyn ReportFormatter>,
        analysis_timeout: Option<Duration>,
    ) -> Self {
        Self {
            registry,
            factory,
            formatter,
            analysis_timeout,
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Collaborator variant new jobs will run with.
    pub fn variant(&self) -> AnalysisVariant {
        self.factory.variant()
    }

    /// Register a new job for `request` and start it in the background.
    ///
    /// Returns the freshly created `Pending` snapshot; the caller never
    /// waits on the analysis.
    pub async fn submit(&self, request: AnalysisRequest) -> Result<JobRecord, RegistryError> {
        let record = self.registry.create(new_session_id(), request).await?;
        tracing::info!(session_id = %record.session_id, "Job submitted");

        self.spawn(record.session_id.clone());
        Ok(record)
    }

    /// Start the worker and its supervisor for a record `submit` just created.
    fn spawn(&self, session_id: String) -> JoinHandle<()> {
        let executor = self.clone();
        tokio::spawn(async move {
            let worker = tokio::spawn(executor.clone().run(session_id.clone()));
            if let Err(join_err) = worker.await {
                let cause = if join_err.is_panic() {
                    panic_message(join_err.into_panic())
                } else {
                    "worker task was cancelled".to_string()
                };
                tracing::error!(session_id = %session_id, cause = %cause, "Job worker crashed");
                executor
                    .record_failure(&session_id, format!("Internal error: {cause}"))
                    .await;
            }
        })
    }

    async fn run(self, session_id: String) {
        if let Err(e) = self.drive(&session_id).await {
            tracing::error!(session_id = %session_id, error = %e, "Job bookkeeping failed");
            self.record_failure(&session_id, format!("Internal error: {e}"))
                .await;
        }
    }

    async fn drive(&self, session_id: &str) -> Result<(), RegistryError> {
        let record = self
            .checkpoint(session_id, JobUpdate::start(PROGRESS_INITIALIZING, TASK_INITIALIZING))
            .await?;
        let request = record.request;
        let inputs = AnalysisInputs::from_request(&request);

        self.checkpoint(session_id, JobUpdate::progress(PROGRESS_PREPARING, TASK_PREPARING))
            .await?;
        let engine = match self.factory.build() {
            Ok(engine) => engine,
            Err(e) => return self.fail(session_id, e).await,
        };

        self.checkpoint(session_id, JobUpdate::progress(PROGRESS_INVOKING, TASK_INVOKING))
            .await?;
        let raw = match self.invoke(engine.as_ref(), &inputs).await {
            Ok(raw) => raw,
            Err(e) => return self.fail(session_id, e).await,
        };

        let report = self.format_report(session_id, &raw, &request);
        self.registry
            .update(session_id, JobUpdate::complete(report))
            .await?;
        tracing::info!(
            session_id,
            engine = engine.name(),
            transcript_len = raw.len(),
            "Job completed",
        );
        Ok(())
    }

    async fn checkpoint(
        &self,
        session_id: &str,
        update: JobUpdate,
    ) -> Result<JobRecord, RegistryError> {
        let record = self.registry.update(session_id, update).await?;
        tracing::info!(
            session_id,
            progress = record.progress,
            task = %record.current_task,
            "Job checkpoint",
        );
        Ok(record)
    }

    async fn invoke(
        &self,
        engine: &dyn AnalysisEngine,
        inputs: &AnalysisInputs,
    ) -> Result<String, AnalysisError> {
        match self.analysis_timeout {
            Some(limit) => tokio::time::timeout(limit, engine.run_analysis(inputs))
                .await
                .map_err(|_| AnalysisError::Timeout(limit.as_secs()))?,
            None => engine.run_analysis(inputs).await,
        }
    }

    async fn fail(&self, session_id: &str, error: AnalysisError) -> Result<(), RegistryError> {
        tracing::warn!(session_id, error = %error, "Job failed");
        self.registry
            .update(session_id, JobUpdate::fail(error.to_string()))
            .await?;
        Ok(())
    }

    /// Format `raw`, falling back to the raw transcript if the formatter
    /// errors or panics.
    fn format_report(&self, session_id: &str, raw: &str, request: &AnalysisRequest) -> String {
        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
            self.formatter.format(raw, request)
        }))
        .unwrap_or_else(|payload| Err(FormatError::Panicked(panic_message(payload))));

        match outcome {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(session_id, error = %e, "Formatting failed, storing raw transcript");
                if raw.trim().is_empty() {
                    NO_RESULTS.to_string()
                } else {
                    raw.to_string()
                }
            }
        }
    }

    /// Move a non-terminal record to `Failed`. A record that is gone or
    /// already terminal is left alone.
    async fn record_failure(&self, session_id: &str, message: String) {
        let record = match self.registry.get(session_id).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(session_id, error = %e, "Cannot record failure");
                return;
            }
        };
        if record.status.is_terminal() {
            return;
        }

        if record.status == JobStatus::Pending {
            let started = JobUpdate::start(PROGRESS_INITIALIZING, TASK_INITIALIZING);
            if let Err(e) = self.registry.update(session_id, started).await {
                tracing::error!(session_id, error = %e, "Failed to start job before failing it");
                return;
            }
        }

        if let Err(e) = self.registry.update(session_id, JobUpdate::fail(message)).await {
            tracing::error!(session_id, error = %e, "Failed to record job failure");
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use carbuy_core::report::sections::REQUIRED_MARKERS;
    use carbuy_core::report::StandardReportFormatter;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use tokio::sync::Notify;

    use super::*;

    #[derive(Clone)]
    enum Behavior {
        Succeed(&'static str),
        Fail(&'static str),
        Panic,
        Hang,
        Unavailable,
        Gated(Arc<Notify>),
        Delays(Arc<Vec<u64>>, Arc<AtomicUsize>),
    }

    struct StubEngine(Behavior);

    #[async_trait]
    impl AnalysisEngine for StubEngine {
        async fn run_analysis(&self, _inputs: &AnalysisInputs) -> Result<String, AnalysisError> {
            match &self.0 {
                Behavior::Succeed(text) => Ok(text.to_string()),
                Behavior::Fail(msg) => Err(AnalysisError::Failed(msg.to_string())),
                Behavior::Panic => panic!("engine exploded"),
                Behavior::Hang => std::future::pending().await,
                Behavior::Unavailable => unreachable!("never built"),
                Behavior::Gated(gate) => {
                    gate.notified().await;
                    Ok("gated transcript".into())
                }
                Behavior::Delays(delays, next) => {
                    let idx = next.fetch_add(1, Ordering::SeqCst) % delays.len();
                    tokio::time::sleep(Duration::from_millis(delays[idx])).await;
                    Ok("delayed transcript".into())
                }
            }
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    struct StubFactory(Behavior);

    impl AnalysisFactory for StubFactory {
        fn build(&self) -> Result<Arc<dyn AnalysisEngine>, AnalysisError> {
            match &self.0 {
                Behavior::Unavailable => Err(AnalysisError::Unavailable("no credentials".into())),
                other => Ok(Arc::new(StubEngine(other.clone()))),
            }
        }

        fn variant(&self) -> AnalysisVariant {
            AnalysisVariant::Fallback
        }
    }

    struct RejectingFormatter;

    impl ReportFormatter for RejectingFormatter {
        fn format(&self, _raw: &str, _request: &AnalysisRequest) -> Result<String, FormatError> {
            Err(FormatError::Rejected("unparseable".into()))
        }
    }

    struct PanickingFormatter;

    impl ReportFormatter for PanickingFormatter {
        fn format(&self, _raw: &str, _request: &AnalysisRequest) -> Result<String, FormatError> {
            panic!("formatter bug")
        }
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            user_requirements: "black, 50000 miles, cash".into(),
            car_type: "SUV".into(),
            budget_range: "$20,000 - $30,000".into(),
            current_state: "California".into(),
        }
    }

    fn executor_with(
        behavior: Behavior,
        formatter: Arc<dyn ReportFormatter>,
        timeout: Option<Duration>,
    ) -> JobExecutor {
        JobExecutor::new(
            Arc::new(JobRegistry::new()),
            Arc::new(StubFactory(behavior)),
            formatter,
            timeout,
        )
    }

    fn executor(behavior: Behavior) -> JobExecutor {
        executor_with(behavior, Arc::new(StandardReportFormatter), None)
    }

    async fn wait_terminal(executor: &JobExecutor, session_id: &str) -> JobRecord {
        for _ in 0..5_000 {
            let record = executor.registry().get(session_id).await.unwrap();
            if record.status.is_terminal() {
                return record;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("job {session_id} never reached a terminal status");
    }

    #[tokio::test]
    async fn successful_job_completes_with_formatted_report() {
        let executor = executor(Behavior::Succeed("Detailed Reasons\nThe CR-V is great."));
        let submitted = executor.submit(request()).await.unwrap();
        assert!(submitted.progress < 100);
        assert_matches!(submitted.status, JobStatus::Pending | JobStatus::Running);

        let done = wait_terminal(&executor, &submitted.session_id).await;
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.progress, 100);
        assert_eq!(done.current_task, "Analysis complete!");
        assert!(done.error.is_none());

        let report = done.result.unwrap();
        assert!(report.starts_with("Comprehensive Car Buying Report"));
        assert!(report.contains("The CR-V is great."));
        for marker in REQUIRED_MARKERS {
            assert_eq!(report.matches(marker).count(), 1, "{marker}");
        }
    }

    #[tokio::test]
    async fn collaborator_failure_marks_job_failed() {
        let executor = executor(Behavior::Fail("upstream 500"));
        let submitted = executor.submit(request()).await.unwrap();

        let done = wait_terminal(&executor, &submitted.session_id).await;
        assert_eq!(done.status, JobStatus::Failed);
        assert!(done.result.is_none());
        let error = done.error.unwrap();
        assert!(error.contains("upstream 500"));
        assert_eq!(done.current_task, format!("Error: {error}"));
        assert_eq!(done.progress, PROGRESS_INVOKING);
    }

    #[tokio::test]
    async fn construction_failure_marks_job_failed() {
        let executor = executor(Behavior::Unavailable);
        let submitted = executor.submit(request()).await.unwrap();

        let done = wait_terminal(&executor, &submitted.session_id).await;
        assert_eq!(done.status, JobStatus::Failed);
        assert!(done.error.unwrap().contains("no credentials"));
        assert_eq!(done.progress, PROGRESS_PREPARING);
    }

    #[tokio::test]
    async fn formatter_error_stores_raw_transcript() {
        let executor = executor_with(
            Behavior::Succeed("raw analysis text"),
            Arc::new(RejectingFormatter),
            None,
        );
        let submitted = executor.submit(request()).await.unwrap();

        let done = wait_terminal(&executor, &submitted.session_id).await;
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.result.as_deref(), Some("raw analysis text"));
    }

    #[tokio::test]
    async fn formatter_panic_stores_raw_transcript() {
        let executor = executor_with(
            Behavior::Succeed("raw analysis text"),
            Arc::new(PanickingFormatter),
            None,
        );
        let submitted = executor.submit(request()).await.unwrap();

        let done = wait_terminal(&executor, &submitted.session_id).await;
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.result.as_deref(), Some("raw analysis text"));
    }

    #[tokio::test]
    async fn formatter_failure_on_empty_transcript_stores_placeholder() {
        let executor = executor_with(Behavior::Succeed(""), Arc::new(RejectingFormatter), None);
        let submitted = executor.submit(request()).await.unwrap();

        let done = wait_terminal(&executor, &submitted.session_id).await;
        assert_eq!(done.result.as_deref(), Some(NO_RESULTS));
    }

    #[tokio::test]
    async fn collaborator_panic_is_recorded_as_failure() {
        let executor = executor(Behavior::Panic);
        let submitted = executor.submit(request()).await.unwrap();

        let done = wait_terminal(&executor, &submitted.session_id).await;
        assert_eq!(done.status, JobStatus::Failed);
        assert!(done.error.unwrap().contains("engine exploded"));
        assert!(done.result.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn hung_collaborator_times_out() {
        let executor = executor_with(
            Behavior::Hang,
            Arc::new(StandardReportFormatter),
            Some(Duration::from_secs(5)),
        );
        let submitted = executor.submit(request()).await.unwrap();

        let done = wait_terminal(&executor, &submitted.session_id).await;
        assert_eq!(done.status, JobStatus::Failed);
        assert_eq!(done.error.as_deref(), Some("Analysis timed out after 5s"));
    }

    #[tokio::test]
    async fn running_job_is_visible_before_completion() {
        let gate = Arc::new(Notify::new());
        let executor = executor(Behavior::Gated(Arc::clone(&gate)));
        let submitted = executor.submit(request()).await.unwrap();

        let mut seen_invoking = false;
        for _ in 0..1_000 {
            let record = executor.registry().get(&submitted.session_id).await.unwrap();
            if record.progress == PROGRESS_INVOKING {
                assert_eq!(record.status, JobStatus::Running);
                assert_eq!(record.current_task, TASK_INVOKING);
                assert!(record.result.is_none());
                seen_invoking = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert!(seen_invoking);

        gate.notify_one();
        let done = wait_terminal(&executor, &submitted.session_id).await;
        assert_eq!(done.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn each_submission_has_its_own_worker() {
        let gate = Arc::new(Notify::new());
        let executor = executor(Behavior::Gated(Arc::clone(&gate)));
        let first = executor.submit(request()).await.unwrap();
        let second = executor.submit(request()).await.unwrap();
        assert_ne!(first.session_id, second.session_id);

        for id in [&first.session_id, &second.session_id] {
            for _ in 0..1_000 {
                let record = executor.registry().get(id).await.unwrap();
                if record.progress == PROGRESS_INVOKING {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        }

        // Releasing one waiter finishes exactly one job.
        gate.notify_one();
        let mut finished = None;
        for _ in 0..1_000 {
            let a = executor.registry().get(&first.session_id).await.unwrap();
            let b = executor.registry().get(&second.session_id).await.unwrap();
            if a.status.is_terminal() || b.status.is_terminal() {
                finished = Some((a, b));
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        let (a, b) = finished.expect("one job should finish");
        let (done, waiting) = if a.status.is_terminal() { (a, b) } else { (b, a) };
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(waiting.status, JobStatus::Running);
        assert!(waiting.error.is_none());

        gate.notify_one();
        let other = wait_terminal(&executor, &waiting.session_id).await;
        assert_eq!(other.status, JobStatus::Completed);
    }

    #[test]
    fn variant_comes_from_the_factory() {
        assert_eq!(
            executor(Behavior::Succeed("x")).variant(),
            AnalysisVariant::Fallback
        );
    }

    #[tokio::test]
    async fn failure_is_not_recorded_over_terminal_or_missing_records() {
        let executor = executor(Behavior::Succeed("x"));
        let submitted = executor.submit(request()).await.unwrap();
        let done = wait_terminal(&executor, &submitted.session_id).await;

        executor
            .record_failure(&submitted.session_id, "late".into())
            .await;
        let after = executor.registry().get(&submitted.session_id).await.unwrap();
        assert_eq!(after, done);

        // Unknown ids are ignored.
        executor.record_failure("session_missing", "late".into()).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn polled_progress_never_moves_backwards() {
        let mut rng = StdRng::seed_from_u64(0x00ca_7b11);
        let delays: Vec<u64> = (0..16).map(|_| rng.random_range(0..20)).collect();
        let executor = executor(Behavior::Delays(
            Arc::new(delays),
            Arc::new(AtomicUsize::new(0)),
        ));

        let mut ids = Vec::new();
        for _ in 0..16 {
            ids.push(executor.submit(request()).await.unwrap().session_id);
        }

        let mut last_seen: HashMap<String, (JobStatus, u8)> = HashMap::new();
        for _ in 0..20_000 {
            if last_seen.len() == ids.len() && last_seen.values().all(|(s, _)| s.is_terminal()) {
                break;
            }

            let id = &ids[rng.random_range(0..ids.len())];
            let record = executor.registry().get(id).await.unwrap();
            if let Some(&(status, progress)) = last_seen.get(id) {
                assert!(record.status.rank() >= status.rank(), "status regressed for {id}");
                assert!(record.progress >= progress, "progress regressed for {id}");
                if status.is_terminal() {
                    assert_eq!(record.status, status, "terminal status changed for {id}");
                }
            }
            last_seen.insert(id.clone(), (record.status, record.progress));

            if rng.random_bool(0.3) {
                tokio::time::sleep(Duration::from_millis(rng.random_range(0..3))).await;
            } else {
                tokio::task::yield_now().await;
            }
        }

        for id in &ids {
            let done = wait_terminal(&executor, id).await;
            assert_eq!(done.status, JobStatus::Completed);
        }
    }
}
