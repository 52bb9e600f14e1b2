//! Test suites, groups, and tests.
//!
//! A suite document is parsed once into this tree and only read afterwards.
//! Documents may be YAML or JSON:
//!
//! ```yaml
//! name: warehouse
//! defaults:
//!   connection-string: "Data Source=(local);Initial Catalog=Dw"
//! groups:
//!   - name: users
//!     setup:
//!       - kind: service-start
//!         service-name: MyService
//!     tests:
//!       - name: load users
//!         setup:
//!           - kind: table-load
//!             table-name: Users
//!             source-file: Users.csv
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::defaults::Defaults;
use crate::phase::Phase;
use crate::scope::GroupKey;

/// Errors that can occur while loading a suite document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown document format (expected .yaml, .yml or .json): {0}")]
    UnknownFormat(PathBuf),
}

/// One test: its own defaults plus a Setup and a Cleanup phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Test {
    pub name: String,
    #[serde(default, skip_serializing_if = "Defaults::is_empty")]
    pub defaults: Defaults,
    #[serde(default)]
    pub setup: Phase,
    #[serde(default)]
    pub cleanup: Phase,
}

impl Test {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Tests sharing parent Setup/Cleanup phases and defaults.
///
/// The group's phases run around each of its tests (once per test unless a
/// command is marked run-once).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Group {
    pub name: String,
    #[serde(default, skip_serializing_if = "Defaults::is_empty")]
    pub defaults: Defaults,
    #[serde(default)]
    pub setup: Phase,
    #[serde(default)]
    pub cleanup: Phase,
    #[serde(default)]
    pub tests: Vec<Test>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Root of a suite document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestSuite {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Defaults::is_empty")]
    pub defaults: Defaults,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub tests: Vec<Test>,
}

impl TestSuite {
    /// Loads a suite document, picking the format from the extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match extension.as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => Err(DocumentError::UnknownFormat(path.to_path_buf())),
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, DocumentError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Every test with its group ancestry, in execution order: top-level
    /// tests first, then each group's tests followed by its nested groups.
    pub fn tests(&self) -> Vec<TestContext<'_>> {
        let mut contexts = Vec::new();

        for (index, test) in self.tests.iter().enumerate() {
            contexts.push(TestContext {
                key: format!("test[{index}]"),
                test,
                groups: Vec::new(),
            });
        }

        for (index, group) in self.groups.iter().enumerate() {
            collect_group(group, format!("group[{index}]"), &[], &mut contexts);
        }

        contexts
    }

    pub fn test_count(&self) -> usize {
        fn count(group: &Group) -> usize {
            group.tests.len() + group.groups.iter().map(count).sum::<usize>()
        }
        self.tests.len() + self.groups.iter().map(count).sum::<usize>()
    }
}

fn collect_group<'a>(
    group: &'a Group,
    key: String,
    ancestors: &[GroupContext<'a>],
    contexts: &mut Vec<TestContext<'a>>,
) {
    let mut lineage = ancestors.to_vec();
    lineage.push(GroupContext {
        key: GroupKey::new(key.clone()),
        group,
    });

    for (index, test) in group.tests.iter().enumerate() {
        contexts.push(TestContext {
            key: format!("{key}/test[{index}]"),
            test,
            groups: lineage.clone(),
        });
    }

    for (index, nested) in group.groups.iter().enumerate() {
        collect_group(nested, format!("{key}/group[{index}]"), &lineage, contexts);
    }
}

/// A group on a test's ancestry path.
#[derive(Debug, Clone)]
pub struct GroupContext<'a> {
    pub key: GroupKey,
    pub group: &'a Group,
}

/// A test together with its enclosing groups, outermost first.
#[derive(Debug, Clone)]
pub struct TestContext<'a> {
    /// Positional key, e.g. `group[0]/test[1]`.
    pub key: String,
    pub test: &'a Test,
    pub groups: Vec<GroupContext<'a>>,
}

impl TestContext<'_> {
    /// Key of the innermost enclosing group, or the suite key.
    pub fn group_key(&self) -> GroupKey {
        self.groups
            .last()
            .map(|g| g.key.clone())
            .unwrap_or_else(GroupKey::suite)
    }

    /// Group names and the test name joined with `/`.
    pub fn full_name(&self) -> String {
        self.groups
            .iter()
            .map(|g| g.group.name.as_str())
            .chain(std::iter::once(self.test.name.as_str()))
            .collect::<Vec<_>>()
            .join("/")
    }
}
