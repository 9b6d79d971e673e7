//! `registry.json`: maps a workspace hash to a display label so chat
//! messages show "🦀 my-project" instead of a raw 8-char hash.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Clone, Debug, Deserialize)]
pub struct WorkspaceEntry {
    #[serde(default)]
    pub icon: String,
    pub name: String,
    #[serde(default)]
    pub path: String,
}

#[derive(Clone, Debug, Default)]
pub struct WorkspaceRegistry {
    entries: HashMap<String, WorkspaceEntry>,
}

impl WorkspaceRegistry {
    /// Loads `registry.json`. Missing or malformed registry degrades to an
    /// empty map — every workspace then falls back to its raw hash, which
    /// is always a valid (if less friendly) label.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let entries = std::fs::read(path)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<HashMap<String, WorkspaceEntry>>(&bytes).ok())
            .unwrap_or_default();
        if entries.is_empty() {
            tracing::debug!(path = %path.display(), "workspace registry empty or unreadable");
        }
        WorkspaceRegistry { entries }
    }

    /// Returns `"{icon} {name}"`, falling back to the bare workspace id
    /// when it is unknown to the registry (spec.md §4.2.2 step 2).
    pub fn display_label(&self, workspace_id: &str) -> String {
        match self.entries.get(workspace_id) {
            Some(entry) if entry.icon.is_empty() => entry.name.clone(),
            Some(entry) => format!("{} {}", entry.icon, entry.name),
            None => workspace_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_workspace_falls_back_to_hash() {
        let registry = WorkspaceRegistry::default();
        assert_eq!(registry.display_label("abcd1234"), "abcd1234");
    }

    #[test]
    fn known_workspace_renders_icon_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(
            &path,
            r#"{"abcd1234": {"icon": "🦀", "name": "my-project", "path": "/home/x/my-project"}}"#,
        )
        .unwrap();
        let registry = WorkspaceRegistry::load(&path);
        assert_eq!(registry.display_label("abcd1234"), "🦀 my-project");
    }
}
