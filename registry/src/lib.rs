//! The read-only workflow plugin registry: schema, trigger matching, and
//! prompt-template rendering. Reloading requires a process restart — the
//! external supervisor handles that via file-change detection (spec.md §3).

pub mod template;
mod trigger;

pub use template::{render_template, RenderError, TemplateContext};
pub use trigger::{any_trigger_holds, Trigger};

use ipc::schema::SessionSummary;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("io error reading {path}: {source}")]
    Io { path: std::path::PathBuf, #[source] source: std::io::Error },
    #[error("malformed registry at {path}: {source}")]
    Parse { path: std::path::PathBuf, #[source] source: serde_json::Error },
    #[error("workflow {0:?} is missing a required field")]
    MissingField(String),
}

/// One entry in `workflows.json`. `id`, `name`, `prompt_template`, and
/// `triggers` are required (spec.md §4.4); every other field is optional.
/// Unrecognized keys are captured in `extra` rather than rejected, since
/// §4.4 says unknown fields are "preserved but ignored."
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub prompt_template: String,
    pub triggers: Vec<Trigger>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub estimated_duration: Option<String>,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The full registry, preserving the declaration order of `workflows.json`
/// (entries are eligible-workflow-ordered by that declaration order, per
/// spec.md §4.1 step 5 and §4.2.3 step 3).
#[derive(Clone, Debug)]
pub struct WorkflowRegistry {
    entries: Vec<WorkflowEntry>,
}

impl WorkflowRegistry {
    /// Loads and validates `workflows.json`. Fails fast on parse/schema
    /// error — per the Open Question in spec.md §9, resolved in favor of
    /// fail-fast to match §7's category-4 policy for the Bot and
    /// Orchestrator's startup-time resource errors.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| RegistryError::Io { path: path.to_path_buf(), source: e })?;
        let entries: Vec<WorkflowEntry> = serde_json::from_slice(&bytes)
            .map_err(|e| RegistryError::Parse { path: path.to_path_buf(), source: e })?;

        for entry in &entries {
            if entry.id.is_empty() {
                return Err(RegistryError::MissingField("id".to_string()));
            }
            if entry.name.is_empty() {
                return Err(RegistryError::MissingField(format!("{}: name", entry.id)));
            }
            if entry.prompt_template.is_empty() {
                return Err(RegistryError::MissingField(format!("{}: prompt_template", entry.id)));
            }
        }

        Ok(WorkflowRegistry { entries })
    }

    /// An empty registry, for callers that degrade gracefully when
    /// `workflows.json` is missing or fails to load (no workflow is ever
    /// eligible, rather than aborting the caller).
    pub fn empty() -> Self {
        WorkflowRegistry { entries: Vec::new() }
    }

    pub fn entries(&self) -> &[WorkflowEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&WorkflowEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Returns workflow IDs eligible for `summary`, in registry declaration
    /// order (spec.md §4.1 step 5, §8 boundary behaviors).
    pub fn eligible_workflow_ids(&self, summary: &SessionSummary) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| any_trigger_holds(&e.triggers, summary))
            .map(|e| e.id.clone())
            .collect()
    }

    /// Groups eligible entries by `category`, preserving category-then
    /// declaration order — the grouping the Bot's menu-rendering (§4.2.2
    /// step 3) needs.
    pub fn eligible_grouped_by_category<'a>(
        &'a self,
        summary: &SessionSummary,
    ) -> Vec<(String, Vec<&'a WorkflowEntry>)> {
        let mut order: Vec<String> = Vec::new();
        let mut groups: std::collections::HashMap<String, Vec<&'a WorkflowEntry>> = std::collections::HashMap::new();

        for entry in self.entries.iter().filter(|e| any_trigger_holds(&e.triggers, summary)) {
            let category = entry.category.clone().unwrap_or_else(|| "general".to_string());
            if !groups.contains_key(&category) {
                order.push(category.clone());
            }
            groups.entry(category).or_default().push(entry);
        }

        order
            .into_iter()
            .map(|category| {
                let items = groups.remove(&category).unwrap_or_default();
                (category, items)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipc::schema::{GitStatus, LycheeStatus};
    use ipc::{CorrelationId, WorkspaceHash};

    fn write_registry(dir: &Path) -> std::path::PathBuf {
        let json = serde_json::json!([
            {
                "id": "prune-legacy",
                "name": "Prune Legacy Code",
                "icon": "\u{1FA93}",
                "category": "housekeeping",
                "prompt_template": "Clean up {{ workspace_path }}",
                "triggers": ["always"]
            },
            {
                "id": "fix-docstrings",
                "name": "Fix Docstrings",
                "category": "housekeeping",
                "prompt_template": "Fix docstrings in {{ workspace_path }}",
                "triggers": ["git_modified"]
            },
            {
                "id": "lychee-autofix",
                "name": "Lychee Autofix",
                "category": "links",
                "prompt_template": "Lychee found {{ lychee_status.error_count }} broken links",
                "triggers": ["lychee_errors"]
            }
        ]);
        let path = dir.join("workflows.json");
        std::fs::write(&path, serde_json::to_vec_pretty(&json).unwrap()).unwrap();
        path
    }

    fn summary(modified: u32, lychee_errors: u32) -> SessionSummary {
        SessionSummary {
            correlation_id: CorrelationId::generate(),
            session_id: "s".into(),
            workspace_path: "/tmp/ws".into(),
            workspace_id: WorkspaceHash::of(std::path::Path::new("/tmp/ws")),
            timestamp: chrono::Utc::now(),
            duration_seconds: 0,
            git_status: GitStatus { modified_files: modified, ..Default::default() },
            lychee_status: LycheeStatus { ran: lychee_errors > 0, error_count: lychee_errors, ..Default::default() },
            available_workflows: vec![],
            user_prompt: String::new(),
            last_response: String::new(),
        }
    }

    #[test]
    fn zero_errors_zero_changes_yields_only_always_workflows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_registry(dir.path());
        let registry = WorkflowRegistry::load(&path).unwrap();
        let ids = registry.eligible_workflow_ids(&summary(0, 0));
        assert_eq!(ids, vec!["prune-legacy".to_string()]);
    }

    #[test]
    fn trigger_rules_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_registry(dir.path());
        let registry = WorkflowRegistry::load(&path).unwrap();
        let s = summary(4, 3);
        let first = registry.eligible_workflow_ids(&s);
        let second = registry.eligible_workflow_ids(&s);
        assert_eq!(first, second);
        assert_eq!(first, vec!["prune-legacy", "fix-docstrings", "lychee-autofix"]);
    }

    #[test]
    fn grouping_preserves_category_then_declaration_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_registry(dir.path());
        let registry = WorkflowRegistry::load(&path).unwrap();
        let groups = registry.eligible_grouped_by_category(&summary(4, 3));
        let category_names: Vec<_> = groups.iter().map(|(c, _)| c.clone()).collect();
        assert_eq!(category_names, vec!["housekeeping".to_string(), "links".to_string()]);
        assert_eq!(groups[0].1.len(), 2);
    }

    #[test]
    fn missing_prompt_template_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let bad = serde_json::json!([{ "id": "x", "name": "X", "prompt_template": "", "triggers": ["always"] }]);
        let path = dir.path().join("workflows.json");
        std::fs::write(&path, serde_json::to_vec(&bad).unwrap()).unwrap();
        assert!(WorkflowRegistry::load(&path).is_err());
    }
}
