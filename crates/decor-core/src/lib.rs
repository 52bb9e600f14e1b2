pub mod config;
pub mod defaults;
pub mod descriptor;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod executors;
pub mod logging;
pub mod outcome;
pub mod phase;
pub mod run_once;
pub mod runner;
pub mod scope;
pub mod suite;

pub use config::{Config, ConfigError};
pub use defaults::{Defaults, DefaultsChain, DefaultsResolver};
pub use descriptor::{Command, CommandGroup, CommandKind, Descriptor};
pub use dispatch::{CommandExecutor, Dispatch, DispatchRegistry};
pub use error::{ExecutionError, UnsupportedCommandError};
pub use executor::PhaseExecutor;
pub use outcome::{CommandOutcome, CommandStatus, PhaseResult};
pub use phase::{Phase, PhaseKind};
pub use run_once::{RunOnceKey, RunOnceTracker};
pub use runner::{BodyOutcome, RunError, SuiteReport, SuiteRunner, TestReport};
pub use scope::{CommandId, ExecutionScope, GroupKey};
pub use suite::{DocumentError, Group, Test, TestContext, TestSuite};
