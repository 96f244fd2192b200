//! Patch plans
//!
//! A plan is an ordered list of upserts grouped per target file, loaded from
//! YAML or JSON and applied in a single [`PatchSession`]:
//!
//! ```yaml
//! files:
//!   - path: /etc/mysql/mysql.conf.d/mysqld.cnf
//!     section: mysqld
//!     set:
//!       - { key: bind-address, value: 0.0.0.0 }
//!       - { key: max_connections, value: 500 }
//!   - path: /etc/ssh/sshd_config
//!     syntax: ssh
//!     set:
//!       - { key: PermitRootLogin, value: "no" }
//! ```
//!
//! Application is fail-fast: the first failing upsert aborts the plan.

pub mod preset;

pub use preset::{
    Category, ModuleDescriptor, PRESETS, Preset, Selection, find_preset, unknown_preset,
};

use crate::patcher::{
    ConfigKey, LineSyntax, PatchError, PatchOutcome, PatchSession, PlanError, SectionHeader,
};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// A single key/value assignment of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Key to set
    pub key: ConfigKey,
    /// Value, written verbatim
    #[serde(deserialize_with = "scalar_string")]
    pub value: String,
}

impl Assignment {
    /// Creates an assignment
    ///
    /// # Errors
    ///
    /// Returns `PatchError::InvalidKey` for malformed keys.
    pub fn new(key: &str, value: impl Into<String>) -> Result<Self, PatchError> {
        Ok(Self {
            key: ConfigKey::new(key)?,
            value: value.into(),
        })
    }
}

/// All assignments targeting one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Target configuration file
    pub path: PathBuf,
    /// Line syntax of the file
    #[serde(default)]
    pub syntax: LineSyntax,
    /// Section receiving new assignments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<SectionHeader>,
    /// Assignments, applied in order
    pub set: Vec<Assignment>,
}

/// An ordered set of upserts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchPlan {
    /// File entries, applied in order
    pub files: Vec<FileEntry>,
}

impl PatchPlan {
    /// Loads and validates a plan; `.json` files are JSON, anything else YAML
    ///
    /// # Errors
    ///
    /// Returns `PlanError::Read`, `PlanError::Parse`, or any validation error.
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let content = fs::read_to_string(path).map_err(|e| PlanError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let plan: Self = if is_json {
            let mut raw: serde_json::Value =
                serde_json::from_str(&content).map_err(|e| parse_error(path, &e))?;
            quote_json_values(&mut raw);
            serde_json::from_value(raw).map_err(|e| parse_error(path, &e))?
        } else {
            serde_yaml::from_str(&content).map_err(|e| parse_error(path, &e))?
        };

        tracing::debug!(plan = %path.display(), files = plan.files.len(), "Loaded plan");
        plan.validate()?;
        Ok(plan)
    }

    /// Checks that every entry has assignments and every value is one line
    ///
    /// # Errors
    ///
    /// Returns `PlanError::EmptyEntry` or `PlanError::Patch` wrapping
    /// `PatchError::InvalidValue`.
    pub fn validate(&self) -> Result<(), PlanError> {
        for entry in &self.files {
            if entry.set.is_empty() {
                return Err(PlanError::EmptyEntry {
                    path: entry.path.clone(),
                });
            }
            for assignment in &entry.set {
                if assignment.value.contains(['\n', '\r']) {
                    return Err(PatchError::InvalidValue {
                        key: assignment.key.to_string(),
                        reason: "value must not contain a line break".to_string(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Total number of assignments
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.iter().map(|f| f.set.len()).sum()
    }

    /// Returns true if the plan sets nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies every assignment in order within `session`
    ///
    /// Each entry switches the session to its syntax; the session's own
    /// syntax is restored afterwards, even on error.
    ///
    /// # Errors
    ///
    /// Stops at the first failing upsert and returns its error.
    pub fn apply(&self, session: &mut PatchSession) -> Result<PlanReport, PlanError> {
        self.validate()?;

        let syntax = session.options().syntax;
        let result = self.apply_entries(session);
        session.set_syntax(syntax);
        result
    }

    fn apply_entries(&self, session: &mut PatchSession) -> Result<PlanReport, PlanError> {
        let mut report = PlanReport::default();
        for entry in &self.files {
            session.set_syntax(entry.syntax);
            let section = entry.section.as_ref().map(SectionHeader::name);

            for assignment in &entry.set {
                let outcome = session.set_value(
                    &entry.path,
                    section,
                    assignment.key.as_str(),
                    &assignment.value,
                )?;
                report.steps.push(PlanStep {
                    path: entry.path.clone(),
                    key: assignment.key.to_string(),
                    outcome,
                });
            }
        }

        tracing::info!(
            steps = report.steps.len(),
            changed = report.changed(),
            "Applied plan"
        );
        Ok(report)
    }
}

/// Outcome of one plan step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStep {
    /// Target file
    pub path: PathBuf,
    /// Key that was set
    pub key: String,
    /// What happened
    pub outcome: PatchOutcome,
}

/// Outcomes of an applied plan, in application order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanReport {
    /// Steps in application order
    pub steps: Vec<PlanStep>,
}

impl PlanReport {
    /// Number of steps that changed a file
    #[must_use]
    pub fn changed(&self) -> usize {
        self.steps.iter().filter(|s| s.outcome.is_change()).count()
    }

    /// Human readable report
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for step in &self.steps {
            let _ = writeln!(out, "{}: {} {}", step.path.display(), step.key, step.outcome);
        }
        let _ = write!(
            out,
            "{} changed, {} unchanged",
            self.changed(),
            self.steps.len() - self.changed()
        );
        out
    }

    /// JSON report
    ///
    /// # Errors
    ///
    /// Returns the serializer error, which only happens for non UTF-8 paths.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn parse_error(path: &Path, err: &dyn std::fmt::Display) -> PlanError {
    PlanError::Parse {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

/// Reads a value as the scalar's source text so `value: 500` works unquoted
///
/// YAML plain scalars are taken verbatim (`0x10` stays `0x10`). JSON numbers
/// are quoted beforehand by [`quote_json_values`].
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct ScalarVisitor;

    impl Visitor<'_> for ScalarVisitor {
        type Value = String;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("a scalar value")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_str(ScalarVisitor)
}

/// Replaces numeric and boolean `value`s with their JSON source text
fn quote_json_values(plan: &mut serde_json::Value) {
    use serde_json::Value;

    let files = plan.get_mut("files").and_then(Value::as_array_mut);
    for entry in files.into_iter().flatten() {
        let set = entry.get_mut("set").and_then(Value::as_array_mut);
        for assignment in set.into_iter().flatten() {
            let scalar = assignment
                .get_mut("value")
                .filter(|v| v.is_number() || v.is_boolean());
            if let Some(value) = scalar {
                *value = Value::String(value.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patcher::{BackupPolicy, PatchOptions};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn session() -> PatchSession {
        PatchSession::new(PatchOptions {
            backup: BackupPolicy::Disabled,
            ..PatchOptions::default()
        })
    }

    #[test]
    fn test_load_yaml_plan() {
        let temp_dir = TempDir::new().unwrap();
        let plan_path = temp_dir.path().join("plan.yaml");
        fs::write(
            &plan_path,
            r#"
files:
  - path: /etc/mysql/my.cnf
    section: "[mysqld]"
    set:
      - { key: max_connections, value: 500 }
      - { key: bind-address, value: 0.0.0.0 }
  - path: /etc/ssh/sshd_config
    syntax: ssh
    set:
      - { key: PermitRootLogin, value: "no" }
"#,
        )
        .unwrap();

        let plan = PatchPlan::load(&plan_path).unwrap();

        assert_eq!(plan.files.len(), 2);
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.files[0].syntax, LineSyntax::Ini);
        assert_eq!(plan.files[0].section.as_ref().unwrap().name(), "mysqld");
        assert_eq!(plan.files[0].set[0].value, "500");
        assert_eq!(plan.files[1].syntax, LineSyntax::Ssh);
        assert_eq!(plan.files[1].set[0].value, "no");
    }

    #[test]
    fn test_load_json_plan() {
        let temp_dir = TempDir::new().unwrap();
        let plan_path = temp_dir.path().join("plan.json");
        fs::write(
            &plan_path,
            r#"{"files":[{"path":"/etc/sysctl.conf","set":[{"key":"vm.swappiness","value":10}]}]}"#,
        )
        .unwrap();

        let plan = PatchPlan::load(&plan_path).unwrap();
        assert_eq!(plan.files[0].set[0].key.as_str(), "vm.swappiness");
        assert_eq!(plan.files[0].set[0].value, "10");
    }

    #[test]
    fn test_load_rejects_invalid_key() {
        let temp_dir = TempDir::new().unwrap();
        let plan_path = temp_dir.path().join("plan.yaml");
        fs::write(
            &plan_path,
            "files:\n  - path: /tmp/x\n    set:\n      - { key: 1bad-key, value: x }\n",
        )
        .unwrap();

        let err = PatchPlan::load(&plan_path).unwrap_err();
        assert!(matches!(err, PlanError::Parse { .. }), "got {err:?}");
    }

    #[test]
    fn test_load_rejects_empty_entry() {
        let temp_dir = TempDir::new().unwrap();
        let plan_path = temp_dir.path().join("plan.yaml");
        fs::write(&plan_path, "files:\n  - path: /tmp/x\n    set: []\n").unwrap();

        assert_eq!(
            PatchPlan::load(&plan_path),
            Err(PlanError::EmptyEntry {
                path: PathBuf::from("/tmp/x")
            })
        );
    }

    #[test]
    fn test_apply_plan() {
        let temp_dir = TempDir::new().unwrap();
        let cnf = temp_dir.path().join("my.cnf");
        let sshd = temp_dir.path().join("sshd_config");
        fs::write(&cnf, "[mysqld]\n#bind-address = 127.0.0.1\n").unwrap();
        fs::write(&sshd, "#PermitRootLogin yes\n").unwrap();

        let plan = PatchPlan {
            files: vec![
                FileEntry {
                    path: cnf.clone(),
                    syntax: LineSyntax::Ini,
                    section: Some(SectionHeader::new("mysqld").unwrap()),
                    set: vec![
                        Assignment::new("bind-address", "0.0.0.0").unwrap(),
                        Assignment::new("max_connections", "500").unwrap(),
                    ],
                },
                FileEntry {
                    path: sshd.clone(),
                    syntax: LineSyntax::Ssh,
                    section: None,
                    set: vec![Assignment::new("PermitRootLogin", "no").unwrap()],
                },
            ],
        };

        let mut session = session();
        let report = plan.apply(&mut session).unwrap();

        assert_eq!(report.steps.len(), 3);
        assert_eq!(report.changed(), 3);
        assert_eq!(
            fs::read_to_string(&cnf).unwrap(),
            "[mysqld]\nmax_connections = 500\nbind-address = 0.0.0.0\n"
        );
        assert_eq!(fs::read_to_string(&sshd).unwrap(), "PermitRootLogin no\n");

        let again = plan.apply(&mut session).unwrap();
        assert_eq!(again.changed(), 0);
        assert!(again.to_text().ends_with("0 changed, 3 unchanged"));
    }

    #[test]
    fn test_apply_stops_at_first_error() {
        let temp_dir = TempDir::new().unwrap();
        let present = temp_dir.path().join("present.cnf");
        let missing = temp_dir.path().join("missing.cnf");
        fs::write(&present, "").unwrap();

        let plan = PatchPlan {
            files: vec![
                FileEntry {
                    path: missing.clone(),
                    syntax: LineSyntax::Ini,
                    section: None,
                    set: vec![Assignment::new("a", "1").unwrap()],
                },
                FileEntry {
                    path: present.clone(),
                    syntax: LineSyntax::Ini,
                    section: None,
                    set: vec![Assignment::new("b", "2").unwrap()],
                },
            ],
        };

        let err = plan.apply(&mut session()).unwrap_err();
        assert_eq!(
            err,
            PlanError::Patch(PatchError::FileNotFound { path: missing })
        );
        assert_eq!(fs::read_to_string(&present).unwrap(), "");
    }

    #[test]
    fn test_report_json() {
        let report = PlanReport {
            steps: vec![PlanStep {
                path: PathBuf::from("/etc/my.cnf"),
                key: "port".to_string(),
                outcome: PatchOutcome::Unchanged { line: 3 },
            }],
        };
        let json = report.to_json().unwrap();
        assert!(json.contains(r#""action": "unchanged""#));
        assert!(json.contains(r#""line": 3"#));
    }

    #[test]
    fn test_load_keeps_yaml_scalar_text() {
        let temp_dir = TempDir::new().unwrap();
        let plan_path = temp_dir.path().join("plan.yaml");
        fs::write(
            &plan_path,
            "files:\n  - path: /etc/sysctl.conf\n    set:\n      - { key: kernel.shmmax, value: 18446744073692774399 }\n      - { key: a, value: 1.10 }\n      - { key: b, value: 0x10 }\n      - { key: c, value: yes }\n",
        )
        .unwrap();

        let plan = PatchPlan::load(&plan_path).unwrap();
        let values: Vec<_> = plan.files[0].set.iter().map(|a| a.value.as_str()).collect();

        assert_eq!(values, ["18446744073692774399", "1.10", "0x10", "yes"]);
    }

    #[test]
    fn test_load_keeps_json_number_text() {
        let temp_dir = TempDir::new().unwrap();
        let plan_path = temp_dir.path().join("plan.json");
        fs::write(
            &plan_path,
            r#"{"files":[{"path":"/etc/sysctl.conf","set":[
                {"key":"kernel.shmmax","value":18446744073692774399},
                {"key":"a","value":1.10},
                {"key":"b","value":true}
            ]}]}"#,
        )
        .unwrap();

        let plan = PatchPlan::load(&plan_path).unwrap();
        let values: Vec<_> = plan.files[0].set.iter().map(|a| a.value.as_str()).collect();

        assert_eq!(values, ["18446744073692774399", "1.10", "true"]);
    }

    #[test]
    fn test_apply_restores_session_syntax() {
        let temp_dir = TempDir::new().unwrap();
        let sshd = temp_dir.path().join("sshd_config");
        fs::write(&sshd, "").unwrap();
        let entry = |path: PathBuf| FileEntry {
            path,
            syntax: LineSyntax::Ssh,
            section: None,
            set: vec![Assignment::new("Port", "2222").unwrap()],
        };

        let mut session = session();
        PatchPlan {
            files: vec![entry(sshd)],
        }
        .apply(&mut session)
        .unwrap();
        assert_eq!(session.options().syntax, LineSyntax::Ini);

        let failing = PatchPlan {
            files: vec![entry(temp_dir.path().join("missing"))],
        };
        assert!(failing.apply(&mut session).is_err());
        assert_eq!(session.options().syntax, LineSyntax::Ini);
    }
}
