//! APEX service
//!
//! Owns the pipeline stages and the optional collaborators, and implements
//! the operation contracts. Nothing here returns an error to the caller:
//! bad input yields `success = false` with a message, and collaborator
//! failures are collected as publication warnings.

use crate::collaborators::{ArtifactStore, IssueTracker};
use crate::config::ApexConfig;
use crate::error::CollaboratorError;
use crate::operations::{
    ClassifyRequest, ClassifyResponse, PipelineResponse, Publication, RunExecutionRequest,
    RunExecutionResponse, RunSummary, SynthesizeRequest, SynthesizeResponse,
};
use apex_design::{ScriptDialect, TestSynthesizer};
use apex_execution::{
    aggregate, ExecutionScheduler, OutcomePolicy, SimulatedInvoker, SystemClock, WeightedOutcome,
};
use apex_model::{ExecutionReport, Requirement, TestCase};
use apex_requirements::{RequirementClassifier, TraceabilityMatrix, TrackerExport};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Entry point for all operations
pub struct ApexService {
    config: ApexConfig,
    classifier: RequirementClassifier,
    synthesizer: TestSynthesizer,
    scheduler: ExecutionScheduler,
    tracker: Option<Arc<dyn IssueTracker>>,
    store: Option<Arc<dyn ArtifactStore>>,
}

impl std::fmt::Debug for ApexService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApexService")
            .field("config", &self.config)
            .field("scheduler", &self.scheduler)
            .field("tracker", &self.tracker.is_some())
            .field("store", &self.store.is_some())
            .finish_non_exhaustive()
    }
}

impl ApexService {
    /// Service running cases on the simulated invoker and wall clock
    #[must_use]
    pub fn new(config: ApexConfig) -> Self {
        let clock = Arc::new(SystemClock);
        let outcome: Arc<dyn OutcomePolicy> = match config.execution.seed {
            Some(seed) => Arc::new(WeightedOutcome::seeded(seed)),
            None => Arc::new(WeightedOutcome::new()),
        };
        let mut invoker = SimulatedInvoker::new(clock.clone(), outcome);
        if let Some(seed) = config.execution.seed {
            invoker = invoker.with_seed(seed);
        }
        if !config.execution.simulate_delays {
            invoker = invoker.without_delays();
        }
        let scheduler = ExecutionScheduler::new(Arc::new(invoker), clock)
            .with_case_timeout(config.execution.case_timeout());

        Self {
            config,
            classifier: RequirementClassifier::new(),
            synthesizer: TestSynthesizer::new(),
            scheduler,
            tracker: None,
            store: None,
        }
    }

    /// With a custom scheduler (clock, invoker)
    #[inline]
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: ExecutionScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// With a custom synthesizer (template registry)
    #[inline]
    #[must_use]
    pub fn with_synthesizer(mut self, synthesizer: TestSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    /// With an issue tracker
    #[inline]
    #[must_use]
    pub fn with_issue_tracker(mut self, tracker: Arc<dyn IssueTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// With an artifact store
    #[inline]
    #[must_use]
    pub fn with_artifact_store(mut self, store: Arc<dyn ArtifactStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &ApexConfig {
        &self.config
    }

    /// `ClassifyRequirements`
    #[instrument(
        skip_all,
        fields(
            lines = request.source_lines.len(),
            structured = request.structured_config.is_some()
        )
    )]
    pub fn classify(&self, request: &ClassifyRequest) -> ClassifyResponse {
        let requirements = match &request.structured_config {
            Some(structured) => {
                match TrackerExport::parse(&structured.content, structured.format) {
                    Ok(export) => export.classify(&self.classifier),
                    Err(err) => {
                        warn!(error = %err, "structured requirements rejected");
                        return self.classified(Vec::new(), Some(err.to_string()));
                    }
                }
            }
            None => self.classifier.classify(&request.source_lines),
        };

        let message = requirements
            .is_empty()
            .then(|| "no requirements found: no line mentions shall or must".to_string());
        self.classified(requirements, message)
    }

    fn classified(
        &self,
        requirements: Vec<Requirement>,
        message: Option<String>,
    ) -> ClassifyResponse {
        let threshold = self.config.ambiguity_threshold;
        let ambiguous_count = requirements.iter().filter(|r| r.is_ambiguous(threshold)).count();
        let testable_count = requirements.iter().filter(|r| r.testable).count();
        info!(
            requirements = requirements.len(),
            ambiguous = ambiguous_count,
            testable = testable_count,
            "requirements classified"
        );

        ClassifyResponse {
            success: !requirements.is_empty(),
            message,
            traceability: TraceabilityMatrix::build(&requirements),
            ambiguous_count,
            testable_count,
            requirements,
        }
    }

    /// `SynthesizeTests`
    #[instrument(skip_all, fields(requirements = request.requirements.len()))]
    pub fn synthesize(&self, request: &SynthesizeRequest) -> SynthesizeResponse {
        let dialect = request
            .dialect
            .as_deref()
            .unwrap_or(&self.config.default_dialect);
        let suite = self
            .synthesizer
            .synthesize_suite(&request.requirements, dialect);

        let (success, message) = if suite.test_cases.is_empty() {
            (false, Some("no test cases: request carried no requirements".to_string()))
        } else if dialect.parse::<ScriptDialect>().is_err() {
            warn!(dialect, "unsupported script dialect; scripts left empty");
            (true, Some(format!("unsupported script dialect '{dialect}': scripts are empty")))
        } else {
            (true, None)
        };
        SynthesizeResponse::from_suite(suite, success, message)
    }

    /// `RunExecution`
    #[instrument(skip_all, fields(cases = request.test_cases.len()))]
    pub async fn run_execution(&self, request: &RunExecutionRequest) -> RunExecutionResponse {
        let mut plan = self.config.execution.run_plan();
        if let Some(environment) = &request.environment {
            plan.environment.clone_from(environment);
        }
        if let Some(parallel) = request.parallel {
            plan.parallel = parallel;
        }
        if let Some(max_parallel) = request.max_parallel {
            plan.max_parallel = max_parallel;
        }
        plan.suite_id.clone_from(&request.suite_id);

        let outcome = self.scheduler.execute(&request.test_cases, &plan).await;
        let report = aggregate(&outcome.executions, &outcome.batch);
        let summary = RunSummary::from_report(&report);
        info!(
            batch_id = %report.batch_id,
            total = report.total,
            passed = report.passed,
            failed = report.failed,
            errors = report.errors,
            skipped = report.skipped,
            pass_rate = %report.pass_rate_display(),
            "execution report ready"
        );

        let publication = if self.config.publish_reports && !report.no_data {
            self.publish(&report, &request.test_cases).await
        } else {
            Publication::default()
        };

        let message = if report.no_data {
            Some("no test cases were executed".to_string())
        } else if publication.warnings.is_empty() {
            None
        } else {
            Some(format!(
                "run completed; {} publication warning(s)",
                publication.warnings.len()
            ))
        };

        RunExecutionResponse {
            success: !report.no_data,
            message,
            batch: outcome.batch,
            batches: outcome.batches,
            peak_running: outcome.peak_running,
            executions: outcome.executions,
            report,
            summary,
            publication,
        }
    }

    /// Classify a document, synthesize its suite and execute it
    pub async fn pipeline(&self, request: &ClassifyRequest) -> PipelineResponse {
        let classification = self.classify(request);
        if !classification.success {
            return PipelineResponse {
                success: false,
                message: classification.message.clone(),
                classification,
                design: None,
                execution: None,
            };
        }

        let design = self.synthesize(&SynthesizeRequest {
            requirements: classification.requirements.clone(),
            dialect: None,
        });
        if !design.success {
            return PipelineResponse {
                success: false,
                message: design.message.clone(),
                classification,
                design: Some(design),
                execution: None,
            };
        }

        let execution = self
            .run_execution(&RunExecutionRequest {
                test_cases: design.test_cases.clone(),
                suite_id: Some(design.suite_id.clone()),
                ..RunExecutionRequest::default()
            })
            .await;

        PipelineResponse {
            success: execution.success,
            message: execution.message.clone(),
            classification,
            design: Some(design),
            execution: Some(execution),
        }
    }

    async fn publish(&self, report: &ExecutionReport, cases: &[TestCase]) -> Publication {
        let mut publication = Publication::default();

        if let Some(store) = &self.store {
            match self.bounded("artifact store", store.save_report(report)).await {
                Ok(artifact) => {
                    info!(
                        artifact_id = %artifact.artifact_id,
                        url = %artifact.url,
                        "report stored"
                    );
                    publication.artifact = Some(artifact);
                }
                Err(err) => {
                    warn!(error = %err, "report not stored");
                    publication.warnings.push(err.to_string());
                }
            }
        }

        if let Some(tracker) = &self.tracker {
            let mut requirement_ids: Vec<&str> = Vec::new();
            for case in cases {
                if !requirement_ids.contains(&case.requirement_id.as_str()) {
                    requirement_ids.push(&case.requirement_id);
                }
            }

            for requirement_id in requirement_ids {
                let issue = match self
                    .bounded("issue tracker", tracker.find_by_requirement_id(requirement_id))
                    .await
                {
                    Ok(Some(issue)) => issue,
                    Ok(None) => continue,
                    Err(err) => {
                        warn!(requirement_id, error = %err, "issue lookup failed");
                        publication.warnings.push(err.to_string());
                        continue;
                    }
                };
                match self
                    .bounded("issue tracker", tracker.post_result(&issue, report))
                    .await
                {
                    Ok(()) => publication.notified_issues.push(issue.key),
                    Err(err) => {
                        warn!(issue = %issue.key, error = %err, "result not posted");
                        publication.warnings.push(err.to_string());
                    }
                }
            }
        }

        publication
    }

    /// Await a collaborator call under the publish deadline
    async fn bounded<T>(
        &self,
        service: &'static str,
        call: impl Future<Output = Result<T, CollaboratorError>>,
    ) -> Result<T, CollaboratorError> {
        let timeout = self.config.publish_timeout();
        tokio::time::timeout(timeout, call)
            .await
            .unwrap_or(Err(CollaboratorError::TimedOut {
                service,
                secs: timeout.as_secs(),
            }))
    }
}
