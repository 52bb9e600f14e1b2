//! Suite runs: decoration around each test.
//!
//! For every test the runner executes the Setup phases of its enclosing
//! groups (outermost first) and of the test itself, runs the test body if
//! all of them succeeded, and then executes the Cleanup phases (test first,
//! then groups innermost first) no matter what happened before.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::defaults::{DefaultsChain, DefaultsResolver};
use crate::dispatch::DispatchRegistry;
use crate::error::UnsupportedCommandError;
use crate::executor::PhaseExecutor;
use crate::outcome::PhaseResult;
use crate::phase::{Phase, PhaseKind};
use crate::run_once::RunOnceTracker;
use crate::scope::{CommandId, ExecutionScope, GroupKey};
use crate::suite::{TestContext, TestSuite};

/// Errors that abort a suite run.
#[derive(Debug, Error)]
pub enum RunError {
    /// Reports of every test that ran, the aborted one last, are kept.
    #[error("Test '{test}': {source}")]
    Unsupported {
        test: String,
        #[source]
        source: UnsupportedCommandError,
        tests: Vec<TestReport>,
    },
}

impl RunError {
    /// Reports of the tests executed before the run stopped.
    pub fn reports(&self) -> &[TestReport] {
        match self {
            RunError::Unsupported { tests, .. } => tests,
        }
    }
}

/// What happened to the test body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "status", content = "reason")]
pub enum BodyOutcome {
    Passed,
    Failed(String),
    /// Setup failed, so the body was not run.
    NotRun,
}

/// Decoration and body outcomes of one test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestReport {
    pub key: String,
    pub test: String,
    pub setup: Vec<PhaseResult>,
    pub body: BodyOutcome,
    pub cleanup: Vec<PhaseResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl TestReport {
    pub fn setup_succeeded(&self) -> bool {
        self.setup.iter().all(PhaseResult::is_success)
    }

    pub fn cleanup_succeeded(&self) -> bool {
        self.cleanup.iter().all(PhaseResult::is_success)
    }

    /// Returns true if setup, body, and cleanup all succeeded.
    pub fn passed(&self) -> bool {
        self.setup_succeeded() && self.body == BodyOutcome::Passed && self.cleanup_succeeded()
    }
}

/// Reports of every test in one suite run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub run_id: String,
    pub suite: String,
    pub tests: Vec<TestReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SuiteReport {
    pub fn passed(&self) -> bool {
        self.tests.iter().all(TestReport::passed)
    }

    pub fn failed_count(&self) -> usize {
        self.tests.iter().filter(|t| !t.passed()).count()
    }
}

/// Runs decorated tests with one run-once tracker per suite run.
#[derive(Debug, Clone)]
pub struct SuiteRunner {
    executor: PhaseExecutor,
}

impl SuiteRunner {
    /// Creates a runner around a registry.
    pub fn new(registry: Arc<DispatchRegistry>, resolver: DefaultsResolver) -> Self {
        let tracker = Arc::new(RunOnceTracker::new());
        Self {
            executor: PhaseExecutor::new(registry, tracker, resolver),
        }
    }

    /// Creates a runner with the built-in executors.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(DispatchRegistry::with_builtins(config)),
            DefaultsResolver::from_config(&config.execution),
        )
    }

    pub fn executor(&self) -> &PhaseExecutor {
        &self.executor
    }

    /// Starts a new suite run: forgets run-once claims and returns the run id.
    pub fn begin_run(&self) -> Uuid {
        self.executor.tracker().clear();
        Uuid::new_v4()
    }

    /// Runs every test of the suite in order.
    ///
    /// `body` produces the test body for each test. It is called only after
    /// the test's setup succeeded, and never for tests whose setup failed.
    pub async fn run_suite<F, Fut>(&self, suite: &TestSuite, mut body: F) -> Result<SuiteReport, RunError>
    where
        F: FnMut(&TestContext<'_>) -> Fut,
        Fut: Future<Output = Result<(), String>>,
    {
        let run_id = self.begin_run();
        let span = info_span!("suite_run", %run_id, suite = %suite.name);

        async move {
            let started_at = Utc::now();
            let mut tests = Vec::with_capacity(suite.test_count());

            for context in suite.tests() {
                match self.run_test(suite, &context, || body(&context)).await {
                    Ok(report) => tests.push(report),
                    Err(RunError::Unsupported {
                        test,
                        source,
                        tests: aborted,
                    }) => {
                        tests.extend(aborted);
                        warn!(%test, error = %source, "suite run aborted");
                        return Err(RunError::Unsupported {
                            test,
                            source,
                            tests,
                        });
                    }
                }
            }

            let report = SuiteReport {
                run_id: run_id.to_string(),
                suite: suite.name.clone(),
                tests,
                started_at,
                finished_at: Utc::now(),
            };
            info!(tests = report.tests.len(), failed = report.failed_count(), "suite run finished");
            Ok(report)
        }
        .instrument(span)
        .await
    }

    /// Runs one test: setup phases, body, then cleanup phases.
    ///
    /// An unsupported command aborts the remaining setup, but cleanup still
    /// runs before the error is returned; the error carries this test's report.
    pub async fn run_test<F, Fut>(
        &self,
        suite: &TestSuite,
        context: &TestContext<'_>,
        body: F,
    ) -> Result<TestReport, RunError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), String>>,
    {
        let span = info_span!("test", key = %context.key, test = %context.test.name);
        async move {
            let started_at = Utc::now();

            // Defaults visible from each group level, then from the test
            let mut chain = DefaultsChain::root(&suite.defaults);
            let mut group_chains = Vec::with_capacity(context.groups.len());
            for group in &context.groups {
                chain = chain.nested(&group.group.defaults);
                group_chains.push(chain.clone());
            }
            let test_chain = chain.nested(&context.test.defaults);

            let mut plan: Vec<(GroupKey, &str, &Phase, DefaultsChain<'_>)> = context
                .groups
                .iter()
                .zip(&group_chains)
                .map(|(g, c)| (g.key.clone(), g.key.as_str(), &g.group.setup, c.clone()))
                .collect();
            plan.push((context.group_key(), context.key.as_str(), &context.test.setup, test_chain.clone()));

            let mut fatal = None;
            let mut setup = Vec::new();
            for (group, scope_key, phase, defaults) in plan {
                match self.run_phase(PhaseKind::Setup, phase, group, scope_key, defaults).await {
                    Ok(Some(result)) => {
                        let ok = result.is_success();
                        setup.push(result);
                        if !ok {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        fatal = Some(err);
                        break;
                    }
                }
            }

            let setup_ok = fatal.is_none() && setup.iter().all(PhaseResult::is_success);
            let body_outcome = if setup_ok {
                match body().await {
                    Ok(()) => BodyOutcome::Passed,
                    Err(reason) => {
                        warn!(%reason, "test body failed");
                        BodyOutcome::Failed(reason)
                    }
                }
            } else {
                BodyOutcome::NotRun
            };

            let mut cleanup = Vec::new();
            let mut plan: Vec<(GroupKey, &str, &Phase, DefaultsChain<'_>)> =
                vec![(context.group_key(), context.key.as_str(), &context.test.cleanup, test_chain)];
            plan.extend(
                context
                    .groups
                    .iter()
                    .zip(&group_chains)
                    .rev()
                    .map(|(g, c)| (g.key.clone(), g.key.as_str(), &g.group.cleanup, c.clone())),
            );
            for (group, scope_key, phase, defaults) in plan {
                match self.run_phase(PhaseKind::Cleanup, phase, group, scope_key, defaults).await {
                    Ok(Some(result)) => cleanup.push(result),
                    Ok(None) => {}
                    Err(err) => {
                        fatal.get_or_insert(err);
                    }
                }
            }

            let report = TestReport {
                key: context.key.clone(),
                test: context.full_name(),
                setup,
                body: body_outcome,
                cleanup,
                started_at,
                finished_at: Utc::now(),
            };
            if let Some(source) = fatal {
                return Err(RunError::Unsupported {
                    test: report.test.clone(),
                    source,
                    tests: vec![report],
                });
            }

            if report.passed() {
                info!("test passed");
            } else {
                warn!(
                    setup = report.setup_succeeded(),
                    cleanup = report.cleanup_succeeded(),
                    "test did not pass"
                );
            }
            Ok(report)
        }
        .instrument(span)
        .await
    }

    /// Executes one non-empty phase in its own scope.
    async fn run_phase(
        &self,
        kind: PhaseKind,
        phase: &Phase,
        group: GroupKey,
        scope_key: &str,
        defaults: DefaultsChain<'_>,
    ) -> Result<Option<PhaseResult>, UnsupportedCommandError> {
        if phase.is_empty() {
            return Ok(None);
        }

        let scope = ExecutionScope::new(group, CommandId::phase(scope_key, kind), defaults);
        self.executor.execute(kind, phase, &scope).await.map(Some)
    }
}
