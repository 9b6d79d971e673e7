//! `{{ expr }}` prompt-template rendering over a fixed, explicit set of
//! dotted paths into a session summary. No general expression evaluator: the
//! teacher's own prompt-building code (`loom/src/prompts`) favors explicit
//! named substitution over pulling in a template-language dependency, and
//! spec.md doesn't call for conditionals or loops in `prompt_template`.

use ipc::schema::SessionSummary;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    #[error("unknown template field: {0}")]
    UnknownField(String),
}

/// The context a `prompt_template` is rendered against (spec.md §4.3 step a).
pub struct TemplateContext<'a> {
    pub workspace_path: &'a str,
    pub session_id: &'a str,
    pub correlation_id: String,
    pub summary: &'a SessionSummary,
}

impl<'a> TemplateContext<'a> {
    pub fn from_summary(summary: &'a SessionSummary) -> Self {
        TemplateContext {
            workspace_path: &summary.workspace_path,
            session_id: &summary.session_id,
            correlation_id: summary.correlation_id.to_string(),
            summary,
        }
    }

    fn resolve(&self, path: &str) -> Option<String> {
        Some(match path {
            "workspace_path" => self.workspace_path.to_string(),
            "session_id" => self.session_id.to_string(),
            "correlation_id" => self.correlation_id.clone(),
            "user_prompt" => self.summary.user_prompt.clone(),
            "last_response" => self.summary.last_response.clone(),
            "git_status.branch" => self.summary.git_status.branch.clone(),
            "git_status.modified_files" => self.summary.git_status.modified_files.to_string(),
            "git_status.untracked_files" => self.summary.git_status.untracked_files.to_string(),
            "git_status.staged_files" => self.summary.git_status.staged_files.to_string(),
            "git_status.ahead_commits" => self.summary.git_status.ahead_commits.to_string(),
            "git_status.behind_commits" => self.summary.git_status.behind_commits.to_string(),
            "lychee_status.ran" => self.summary.lychee_status.ran.to_string(),
            "lychee_status.error_count" => self.summary.lychee_status.error_count.to_string(),
            "lychee_status.details" => self.summary.lychee_status.details.clone(),
            _ => return None,
        })
    }
}

/// Renders `template`, replacing every `{{ path }}` with the resolved value.
/// Whitespace around `path` is trimmed. Fails on the first unknown field so
/// registry authors get immediate, specific feedback rather than a silently
/// blank substitution.
pub fn render_template(template: &str, ctx: &TemplateContext<'_>) -> Result<String, RenderError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            // Unterminated expression: emit the rest verbatim, matching the
            // "accept that some corner cases render imperfectly" posture
            // spec.md §9 takes for markup, applied here to malformed templates.
            out.push_str(&rest[open..]);
            return Ok(out);
        };
        let field = after_open[..close].trim();
        let value = ctx
            .resolve(field)
            .ok_or_else(|| RenderError::UnknownField(field.to_string()))?;
        out.push_str(&value);
        rest = &after_open[close + 2..];
    }
    out.push_str(rest);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipc::schema::{GitStatus, LycheeStatus};
    use ipc::{CorrelationId, WorkspaceHash};

    fn summary() -> SessionSummary {
        SessionSummary {
            correlation_id: CorrelationId::generate(),
            session_id: "sess-42".into(),
            workspace_path: "/work/proj".into(),
            workspace_id: WorkspaceHash::of(std::path::Path::new("/work/proj")),
            timestamp: chrono::Utc::now(),
            duration_seconds: 90,
            git_status: GitStatus { modified_files: 4, ..Default::default() },
            lychee_status: LycheeStatus { ran: true, error_count: 3, details: "3 broken links".into(), ..Default::default() },
            available_workflows: vec![],
            user_prompt: "please fix the docs".into(),
            last_response: "done".into(),
        }
    }

    #[test]
    fn renders_known_fields() {
        let s = summary();
        let ctx = TemplateContext::from_summary(&s);
        let out = render_template(
            "modified_files={{ git_status.modified_files }} in {{workspace_path}}",
            &ctx,
        )
        .unwrap();
        assert_eq!(out, "modified_files=4 in /work/proj");
    }

    #[test]
    fn renders_lychee_error_count_from_scenario_2() {
        let s = summary();
        let ctx = TemplateContext::from_summary(&s);
        let out = render_template("Lychee found {{ lychee_status.error_count }} broken links", &ctx).unwrap();
        assert_eq!(out, "Lychee found 3 broken links");
    }

    #[test]
    fn unknown_field_is_an_error() {
        let s = summary();
        let ctx = TemplateContext::from_summary(&s);
        let err = render_template("{{ nonexistent.field }}", &ctx).unwrap_err();
        assert_eq!(err, RenderError::UnknownField("nonexistent.field".to_string()));
    }

    #[test]
    fn plain_text_with_no_expressions_passes_through() {
        let s = summary();
        let ctx = TemplateContext::from_summary(&s);
        assert_eq!(render_template("no expressions here", &ctx).unwrap(), "no expressions here");
    }
}
