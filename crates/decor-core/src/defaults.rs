//! Defaults cascade.
//!
//! Optional descriptor fields left unset in the document are inherited from
//! the nearest enclosing scope that defines them (test → group → … →
//! document). When no scope defines a value the variant default applies.
//!
//! A `base-path` default anchors relative file paths (loaded files, scripts,
//! files deleted, copied or moved). Paths that are absolute or already under
//! the base path are left alone, which keeps resolution idempotent.

use std::borrow::Cow;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{ExecutionConfig, DEFAULT_PROCESS_TIMEOUT_MS, DEFAULT_SERVICE_TIMEOUT_MS};
use crate::descriptor::{Command, CommandKind, Descriptor};

/// Default values declared at document, group, or test scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Defaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,

    /// Timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Directory that relative file paths are joined onto.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
}

impl Defaults {
    pub fn with_connection_string(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: Some(connection_string.into()),
            ..Default::default()
        }
    }

    pub fn with_base_path(base_path: impl Into<String>) -> Self {
        Self {
            base_path: Some(base_path.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.connection_string.is_none() && self.timeout.is_none() && self.base_path.is_none()
    }
}

/// The defaults visible from one scope, nearest layer first.
#[derive(Debug, Clone, Default)]
pub struct DefaultsChain<'a> {
    layers: Vec<&'a Defaults>,
}

impl<'a> DefaultsChain<'a> {
    /// A chain rooted at the document defaults.
    pub fn root(document: &'a Defaults) -> Self {
        Self {
            layers: vec![document],
        }
    }

    /// A chain with `layer` in front of this one's layers.
    pub fn nested(&self, layer: &'a Defaults) -> Self {
        let mut layers = Vec::with_capacity(self.layers.len() + 1);
        layers.push(layer);
        layers.extend(self.layers.iter().copied());
        Self { layers }
    }

    /// Nearest non-empty connection string.
    pub fn connection_string(&self) -> Option<&'a str> {
        self.layers
            .iter()
            .filter_map(|layer| layer.connection_string.as_deref())
            .find(|value| !value.trim().is_empty())
    }

    /// Nearest non-empty base path.
    pub fn base_path(&self) -> Option<&'a str> {
        self.layers
            .iter()
            .filter_map(|layer| layer.base_path.as_deref())
            .find(|value| !value.trim().is_empty())
    }

    /// Nearest declared timeout.
    pub fn timeout(&self) -> Option<u64> {
        self.layers.iter().find_map(|layer| layer.timeout)
    }

    pub fn depth(&self) -> usize {
        self.layers.len()
    }
}

/// Fills unset descriptor fields from a [`DefaultsChain`].
///
/// Resolution is pure and idempotent: resolving an already resolved
/// descriptor returns it unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultsResolver {
    /// Variant default for service start/stop and running checks.
    pub service_timeout_ms: u64,
    /// Variant default for process runs; 0 means "do not wait".
    pub process_timeout_ms: u64,
}

impl Default for DefaultsResolver {
    fn default() -> Self {
        Self {
            service_timeout_ms: DEFAULT_SERVICE_TIMEOUT_MS,
            process_timeout_ms: DEFAULT_PROCESS_TIMEOUT_MS,
        }
    }
}

impl DefaultsResolver {
    pub fn from_config(config: &ExecutionConfig) -> Self {
        Self {
            service_timeout_ms: config.service_timeout_ms,
            process_timeout_ms: config.process_timeout_ms,
        }
    }

    /// Timeout used when neither the descriptor nor any scope sets one.
    pub fn variant_timeout(&self, kind: CommandKind) -> u64 {
        match kind {
            CommandKind::ServiceStart | CommandKind::ServiceStop | CommandKind::ServiceRunning => {
                self.service_timeout_ms
            }
            CommandKind::ProcessRun => self.process_timeout_ms,
            _ => 0,
        }
    }

    /// Resolves the descriptor's optional fields against `chain`.
    ///
    /// Groups are returned as-is; their children are resolved when they run.
    pub fn resolve<'d>(
        &self,
        descriptor: &'d Descriptor,
        chain: &DefaultsChain<'_>,
    ) -> Cow<'d, Descriptor> {
        if matches!(descriptor.command, Command::Group(_)) {
            return Cow::Borrowed(descriptor);
        }

        let timeout = descriptor
            .timeout
            .or_else(|| chain.timeout())
            .unwrap_or_else(|| self.variant_timeout(descriptor.kind()));

        let inherited = if descriptor.command.accepts_connection_string()
            && is_blank(descriptor.command.connection_string())
        {
            chain.connection_string()
        } else {
            None
        };

        let base = chain.base_path().filter(|base| {
            descriptor
                .command
                .file_paths()
                .into_iter()
                .any(|path| needs_base(path, base))
        });

        if descriptor.timeout == Some(timeout) && inherited.is_none() && base.is_none() {
            return Cow::Borrowed(descriptor);
        }

        let mut resolved = descriptor.clone();
        resolved.timeout = Some(timeout);
        if let (Some(value), Some(slot)) = (inherited, resolved.command.connection_string_mut()) {
            *slot = Some(value.to_string());
        }
        if let Some(base) = base {
            for path in resolved.command.file_paths_mut() {
                if needs_base(path, base) {
                    *path = Path::new(base).join(path.as_str()).to_string_lossy().into_owned();
                }
            }
        }
        Cow::Owned(resolved)
    }
}

fn needs_base(path: &str, base: &str) -> bool {
    let path = Path::new(path);
    !path.as_os_str().is_empty() && !path.is_absolute() && !path.starts_with(base)
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{CommandGroup, FileTransfer, ProcessRun, ServiceTarget, TableReset};

    fn reset(connection_string: Option<&str>) -> Descriptor {
        Descriptor::new(Command::TableReset(TableReset {
            connection_string: connection_string.map(str::to_string),
            table_name: "Users".to_string(),
        }))
    }

    #[test]
    fn test_nearest_layer_wins() {
        let document = Defaults::with_connection_string("document");
        let group = Defaults::with_connection_string("group");
        let test = Defaults::with_connection_string("test");

        let chain = DefaultsChain::root(&document).nested(&group);
        assert_eq!(chain.connection_string(), Some("group"));

        let chain = chain.nested(&test);
        assert_eq!(chain.connection_string(), Some("test"));
        assert_eq!(chain.depth(), 3);
    }

    #[test]
    fn test_empty_layer_is_skipped() {
        let document = Defaults::with_connection_string("document");
        let blank = Defaults::with_connection_string("  ");
        let chain = DefaultsChain::root(&document).nested(&blank);
        assert_eq!(chain.connection_string(), Some("document"));
    }

    #[test]
    fn test_explicit_value_is_kept() {
        let document = Defaults::with_connection_string("document");
        let chain = DefaultsChain::root(&document);
        let resolver = DefaultsResolver::default();

        let descriptor = reset(Some("explicit"));
        let resolved = resolver.resolve(&descriptor, &chain);
        assert_eq!(resolved.command.connection_string(), Some("explicit"));
    }

    #[test]
    fn test_blank_value_is_inherited() {
        let document = Defaults::with_connection_string("document");
        let chain = DefaultsChain::root(&document);
        let resolver = DefaultsResolver::default();

        let descriptor = reset(Some(""));
        let resolved = resolver.resolve(&descriptor, &chain);
        assert_eq!(resolved.command.connection_string(), Some("document"));
    }

    #[test]
    fn test_service_variant_timeout() {
        let document = Defaults::default();
        let chain = DefaultsChain::root(&document);
        let resolver = DefaultsResolver::default();
        let start = Descriptor::new(Command::ServiceStart(ServiceTarget {
            service_name: "MyService".to_string(),
        }));

        let resolved = resolver.resolve(&start, &chain);
        assert_eq!(resolved.timeout, Some(5000));
    }

    #[test]
    fn test_group_is_borrowed() {
        let document = Defaults::with_connection_string("document");
        let chain = DefaultsChain::root(&document);
        let resolver = DefaultsResolver::default();
        let group = Descriptor::new(Command::Group(CommandGroup::new(vec![reset(None)])));

        let resolved = resolver.resolve(&group, &chain);
        assert!(matches!(resolved, Cow::Borrowed(_)));
        assert_eq!(resolved.timeout, None);
    }

    #[test]
    fn test_resolved_descriptor_is_borrowed_on_second_pass() {
        let document = Defaults::with_connection_string("document");
        let chain = DefaultsChain::root(&document);
        let resolver = DefaultsResolver::default();

        let once = resolver.resolve(&reset(None), &chain).into_owned();
        let twice = resolver.resolve(&once, &chain);
        assert!(matches!(twice, Cow::Borrowed(_)));
        assert_eq!(*twice, once);
    }

    #[test]
    fn test_relative_paths_join_base_path() {
        let document = Defaults::with_base_path("/data/suite");
        let chain = DefaultsChain::root(&document);
        let resolver = DefaultsResolver::default();
        let copy = Descriptor::new(Command::FileCopy(FileTransfer {
            full_path: "work/out.csv".to_string(),
            source_full_path: "/abs/in.csv".to_string(),
        }));

        let resolved = resolver.resolve(&copy, &chain);
        assert_eq!(resolved.command.file_paths(), vec!["/abs/in.csv", "/data/suite/work/out.csv"]);

        let twice = resolver.resolve(&resolved, &chain);
        assert!(matches!(twice, Cow::Borrowed(_)));
    }

    #[test]
    fn test_relative_base_path_is_idempotent() {
        let document = Defaults::with_base_path("fixtures");
        let chain = DefaultsChain::root(&document);
        let resolver = DefaultsResolver::default();
        let copy = Descriptor::new(Command::FileMove(FileTransfer {
            full_path: "out.csv".to_string(),
            source_full_path: "fixtures/in.csv".to_string(),
        }));

        let once = resolver.resolve(&copy, &chain).into_owned();
        assert_eq!(once.command.file_paths(), vec!["fixtures/in.csv", "fixtures/out.csv"]);
        assert_eq!(*resolver.resolve(&once, &chain), once);
    }

    #[test]
    fn test_program_path_is_not_rebased() {
        let document = Defaults::with_base_path("/data/suite");
        let chain = DefaultsChain::root(&document);
        let exe = Descriptor::new(Command::ProcessRun(ProcessRun {
            full_path: "clean.exe".to_string(),
            argument: None,
        }));

        let resolved = DefaultsResolver::default().resolve(&exe, &chain);
        assert_eq!(resolved.command.label(), "clean.exe");
    }

    #[test]
    fn test_nearest_base_path_wins() {
        let document = Defaults::with_base_path("/suite");
        let group = Defaults::with_base_path("/group");
        let blank = Defaults::with_base_path(" ");
        let chain = DefaultsChain::root(&document).nested(&group).nested(&blank);
        assert_eq!(chain.base_path(), Some("/group"));
    }
}
