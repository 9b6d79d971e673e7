use ipc::schema::SessionSummary;
use serde::{Deserialize, Serialize};

/// A named predicate over a session summary. A workflow is eligible when
/// *any* of its triggers holds (spec.md §3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    LycheeErrors,
    GitModified,
    Always,
}

impl Trigger {
    pub fn eval(&self, summary: &SessionSummary) -> bool {
        match self {
            Trigger::LycheeErrors => summary.lychee_status.error_count > 0,
            Trigger::GitModified => {
                summary.git_status.modified_files + summary.git_status.staged_files > 0
            }
            Trigger::Always => true,
        }
    }
}

/// Evaluates a set of triggers against a summary: eligible iff any holds.
pub fn any_trigger_holds(triggers: &[Trigger], summary: &SessionSummary) -> bool {
    triggers.iter().any(|t| t.eval(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipc::schema::{GitStatus, LycheeStatus};
    use ipc::{CorrelationId, WorkspaceHash};

    fn summary_with(modified: u32, staged: u32, lychee_errors: u32) -> SessionSummary {
        SessionSummary {
            correlation_id: CorrelationId::generate(),
            session_id: "s".into(),
            workspace_path: "/tmp".into(),
            workspace_id: WorkspaceHash::of(std::path::Path::new("/tmp")),
            timestamp: chrono::Utc::now(),
            duration_seconds: 0,
            git_status: GitStatus { modified_files: modified, staged_files: staged, ..Default::default() },
            lychee_status: LycheeStatus { ran: lychee_errors > 0, error_count: lychee_errors, ..Default::default() },
            available_workflows: vec![],
            user_prompt: String::new(),
            last_response: String::new(),
        }
    }

    #[test]
    fn always_is_always_eligible() {
        let s = summary_with(0, 0, 0);
        assert!(Trigger::Always.eval(&s));
    }

    #[test]
    fn git_modified_counts_staged_and_modified() {
        assert!(Trigger::GitModified.eval(&summary_with(1, 0, 0)));
        assert!(Trigger::GitModified.eval(&summary_with(0, 1, 0)));
        assert!(!Trigger::GitModified.eval(&summary_with(0, 0, 0)));
    }

    #[test]
    fn lychee_errors_requires_positive_count() {
        assert!(Trigger::LycheeErrors.eval(&summary_with(0, 0, 3)));
        assert!(!Trigger::LycheeErrors.eval(&summary_with(0, 0, 0)));
    }

    #[test]
    fn any_trigger_holds_is_an_or() {
        let s = summary_with(0, 0, 0);
        assert!(any_trigger_holds(&[Trigger::GitModified, Trigger::Always], &s));
        assert!(!any_trigger_holds(&[Trigger::GitModified, Trigger::LycheeErrors], &s));
    }
}
