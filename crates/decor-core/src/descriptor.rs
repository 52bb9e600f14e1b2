//! Declared setup and cleanup commands.
//!
//! A [`Descriptor`] is one unit of decoration work as written in a suite
//! document: common attributes (run-once, timeout) plus a [`Command`] that
//! names the concrete action. Descriptors are built once when the document
//! is loaded and only read afterwards; optional fields stay unset until the
//! [`DefaultsResolver`](crate::defaults::DefaultsResolver) fills them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A declared command together with its common attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Descriptor {
    /// Execute at most once per enclosing group (default: false).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_once: Option<bool>,

    /// Timeout in milliseconds. Unset means "inherit or use the variant default".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// The concrete action.
    #[serde(flatten)]
    pub command: Command,
}

impl Descriptor {
    /// Wraps a command with no explicit common attributes.
    pub fn new(command: Command) -> Self {
        Self {
            run_once: None,
            timeout: None,
            command,
        }
    }

    /// Marks the descriptor as run-once.
    pub fn run_once(mut self, run_once: bool) -> Self {
        self.run_once = Some(run_once);
        self
    }

    /// Sets an explicit timeout in milliseconds.
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = Some(timeout_ms);
        self
    }

    /// Returns true if the descriptor executes at most once per group.
    pub fn is_run_once(&self) -> bool {
        self.run_once.unwrap_or(false)
    }

    /// Returns the timeout in milliseconds, 0 when unset.
    pub fn timeout_ms(&self) -> u64 {
        self.timeout.unwrap_or(0)
    }

    /// Returns the variant tag of the wrapped command.
    pub fn kind(&self) -> CommandKind {
        self.command.kind()
    }
}

impl From<Command> for Descriptor {
    fn from(command: Command) -> Self {
        Descriptor::new(command)
    }
}

/// The closed set of decoration commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Command {
    /// Container of child commands.
    Group(CommandGroup),
    /// Truncate a table.
    TableReset(TableReset),
    /// Bulk-load a file into a table.
    TableLoad(TableLoad),
    /// Start a named OS service.
    ServiceStart(ServiceTarget),
    /// Stop a named OS service.
    ServiceStop(ServiceTarget),
    /// Check that a named OS service is running; fails otherwise.
    ServiceRunning(ServiceTarget),
    /// Launch an executable.
    ProcessRun(ProcessRun),
    /// Execute a script file against a data source.
    BatchRun(BatchRun),
    /// Execute an ETL package.
    EtlRun(EtlRun),
    /// Remove a file.
    FileDelete(FileDelete),
    /// Copy a file.
    FileCopy(FileTransfer),
    /// Move a file.
    FileMove(FileTransfer),
}

impl Command {
    /// Returns the variant tag.
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Group(_) => CommandKind::Group,
            Command::TableReset(_) => CommandKind::TableReset,
            Command::TableLoad(_) => CommandKind::TableLoad,
            Command::ServiceStart(_) => CommandKind::ServiceStart,
            Command::ServiceStop(_) => CommandKind::ServiceStop,
            Command::ServiceRunning(_) => CommandKind::ServiceRunning,
            Command::ProcessRun(_) => CommandKind::ProcessRun,
            Command::BatchRun(_) => CommandKind::BatchRun,
            Command::EtlRun(_) => CommandKind::EtlRun,
            Command::FileDelete(_) => CommandKind::FileDelete,
            Command::FileCopy(_) => CommandKind::FileCopy,
            Command::FileMove(_) => CommandKind::FileMove,
        }
    }

    /// Short human-readable subject of the command, used in logs and reports.
    pub fn label(&self) -> String {
        match self {
            Command::Group(group) => format!("{} commands", group.commands.len()),
            Command::TableReset(cmd) => cmd.table_name.clone(),
            Command::TableLoad(cmd) => format!("{} <- {}", cmd.table_name, cmd.source_file),
            Command::ServiceStart(cmd) | Command::ServiceStop(cmd) | Command::ServiceRunning(cmd) => {
                cmd.service_name.clone()
            }
            Command::ProcessRun(cmd) => cmd.full_path.clone(),
            Command::BatchRun(cmd) => cmd.full_path.clone(),
            Command::EtlRun(cmd) => format!("{}{}", cmd.path, cmd.name),
            Command::FileDelete(cmd) => cmd.full_path.clone(),
            Command::FileCopy(cmd) | Command::FileMove(cmd) => {
                format!("{} -> {}", cmd.source_full_path, cmd.full_path)
            }
        }
    }

    /// Mutable access to the connection string of variants that carry one.
    pub(crate) fn connection_string_mut(&mut self) -> Option<&mut Option<String>> {
        match self {
            Command::TableReset(cmd) => Some(&mut cmd.connection_string),
            Command::TableLoad(cmd) => Some(&mut cmd.connection_string),
            Command::BatchRun(cmd) => Some(&mut cmd.connection_string),
            Command::EtlRun(cmd) => Some(&mut cmd.connection_string),
            _ => None,
        }
    }

    /// The connection string of variants that carry one.
    pub fn connection_string(&self) -> Option<&str> {
        match self {
            Command::TableReset(cmd) => cmd.connection_string.as_deref(),
            Command::TableLoad(cmd) => cmd.connection_string.as_deref(),
            Command::BatchRun(cmd) => cmd.connection_string.as_deref(),
            Command::EtlRun(cmd) => cmd.connection_string.as_deref(),
            _ => None,
        }
    }

    /// File paths the command reads or writes; program paths are not included.
    pub fn file_paths(&self) -> Vec<&str> {
        match self {
            Command::TableLoad(cmd) => vec![cmd.source_file.as_str()],
            Command::BatchRun(cmd) => vec![cmd.full_path.as_str()],
            Command::FileDelete(cmd) => vec![cmd.full_path.as_str()],
            Command::FileCopy(cmd) | Command::FileMove(cmd) => {
                vec![cmd.source_full_path.as_str(), cmd.full_path.as_str()]
            }
            _ => Vec::new(),
        }
    }

    pub(crate) fn file_paths_mut(&mut self) -> Vec<&mut String> {
        match self {
            Command::TableLoad(cmd) => vec![&mut cmd.source_file],
            Command::BatchRun(cmd) => vec![&mut cmd.full_path],
            Command::FileDelete(cmd) => vec![&mut cmd.full_path],
            Command::FileCopy(cmd) | Command::FileMove(cmd) => {
                vec![&mut cmd.source_full_path, &mut cmd.full_path]
            }
            _ => Vec::new(),
        }
    }

    /// Returns true if the variant declares a connection string field.
    pub fn accepts_connection_string(&self) -> bool {
        matches!(
            self,
            Command::TableReset(_) | Command::TableLoad(_) | Command::BatchRun(_) | Command::EtlRun(_)
        )
    }
}

/// Variant tag of a [`Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandKind {
    Group,
    TableReset,
    TableLoad,
    ServiceStart,
    ServiceStop,
    ServiceRunning,
    ProcessRun,
    BatchRun,
    EtlRun,
    FileDelete,
    FileCopy,
    FileMove,
}

impl CommandKind {
    /// All variant tags, in declaration order.
    pub const ALL: [CommandKind; 12] = [
        CommandKind::Group,
        CommandKind::TableReset,
        CommandKind::TableLoad,
        CommandKind::ServiceStart,
        CommandKind::ServiceStop,
        CommandKind::ServiceRunning,
        CommandKind::ProcessRun,
        CommandKind::BatchRun,
        CommandKind::EtlRun,
        CommandKind::FileDelete,
        CommandKind::FileCopy,
        CommandKind::FileMove,
    ];

    /// Stable name as written in suite documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Group => "group",
            CommandKind::TableReset => "table-reset",
            CommandKind::TableLoad => "table-load",
            CommandKind::ServiceStart => "service-start",
            CommandKind::ServiceStop => "service-stop",
            CommandKind::ServiceRunning => "service-running",
            CommandKind::ProcessRun => "process-run",
            CommandKind::BatchRun => "batch-run",
            CommandKind::EtlRun => "etl-run",
            CommandKind::FileDelete => "file-delete",
            CommandKind::FileCopy => "file-copy",
            CommandKind::FileMove => "file-move",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered container of child descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandGroup {
    /// Run children concurrently (default: true).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,

    /// Children, in declaration order.
    #[serde(default)]
    pub commands: Vec<Descriptor>,
}

impl CommandGroup {
    /// Creates a group with unset attributes.
    pub fn new(commands: Vec<Descriptor>) -> Self {
        Self {
            parallel: None,
            commands,
        }
    }

    /// Creates a group that runs its children one after another.
    pub fn sequential(commands: Vec<Descriptor>) -> Self {
        Self {
            parallel: Some(false),
            commands,
        }
    }

    /// Returns true if the children run concurrently.
    pub fn is_parallel(&self) -> bool {
        self.parallel.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TableReset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
    pub table_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TableLoad {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
    pub table_name: String,
    /// File whose rows are loaded into the table.
    pub source_file: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServiceTarget {
    pub service_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProcessRun {
    pub full_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BatchRun {
    pub full_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EtlRun {
    /// Server hosting the package; empty means "run from the file system".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default)]
    pub path: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileDelete {
    pub full_path: String,
}

/// Copy or move: `full_path` is the destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileTransfer {
    pub full_path: String,
    pub source_full_path: String,
}
