use rusqlite::Row;

/// The component that appended an event row. Matches the SQL `CHECK`
/// constraint on `session_events.component` exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Component {
    Hook,
    Bot,
    Orchestrator,
    Cli,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Hook => "hook",
            Component::Bot => "bot",
            Component::Orchestrator => "orchestrator",
            Component::Cli => "cli",
        }
    }
}

impl std::str::FromStr for Component {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hook" => Ok(Component::Hook),
            "bot" => Ok(Component::Bot),
            "orchestrator" => Ok(Component::Orchestrator),
            "cli" => Ok(Component::Cli),
            other => Err(format!("unknown component: {other}")),
        }
    }
}

/// The closed vocabulary of event types from spec.md §3. Every started
/// phase either completes or leaves a dangling in-flight marker; nothing
/// outside this list may be appended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventType {
    HookStarted,
    HookCompleted,
    SummaryCreated,
    SummaryReceived,
    SummaryProcessed,
    SelectionCreated,
    SelectionReceived,
    WorkflowStarted,
    WorkflowTemplateRendered,
    ClaudeCliStarted,
    ClaudeCliCompleted,
    WorkflowCompleted,
    ExecutionCreated,
    BotStarted,
    BotShutdown,
    ProgressEmitted,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventType::HookStarted => "hook.started",
            EventType::HookCompleted => "hook.completed",
            EventType::SummaryCreated => "summary.created",
            EventType::SummaryReceived => "summary.received",
            EventType::SummaryProcessed => "summary.processed",
            EventType::SelectionCreated => "selection.created",
            EventType::SelectionReceived => "selection.received",
            EventType::WorkflowStarted => "workflow.started",
            EventType::WorkflowTemplateRendered => "workflow.template_rendered",
            EventType::ClaudeCliStarted => "claude_cli.started",
            EventType::ClaudeCliCompleted => "claude_cli.completed",
            EventType::WorkflowCompleted => "workflow.completed",
            EventType::ExecutionCreated => "execution.created",
            EventType::BotStarted => "bot.started",
            EventType::BotShutdown => "bot.shutdown",
            EventType::ProgressEmitted => "progress.emitted",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for EventType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "hook.started" => EventType::HookStarted,
            "hook.completed" => EventType::HookCompleted,
            "summary.created" => EventType::SummaryCreated,
            "summary.received" => EventType::SummaryReceived,
            "summary.processed" => EventType::SummaryProcessed,
            "selection.created" => EventType::SelectionCreated,
            "selection.received" => EventType::SelectionReceived,
            "workflow.started" => EventType::WorkflowStarted,
            "workflow.template_rendered" => EventType::WorkflowTemplateRendered,
            "claude_cli.started" => EventType::ClaudeCliStarted,
            "claude_cli.completed" => EventType::ClaudeCliCompleted,
            "workflow.completed" => EventType::WorkflowCompleted,
            "execution.created" => EventType::ExecutionCreated,
            "bot.started" => EventType::BotStarted,
            "bot.shutdown" => EventType::BotShutdown,
            "progress.emitted" => EventType::ProgressEmitted,
            other => return Err(format!("unknown event type: {other}")),
        })
    }
}

/// One row of `session_events`, as read back for tracing.
#[derive(Clone, Debug)]
pub struct SessionEvent {
    pub id: i64,
    pub correlation_id: String,
    pub workspace_id: Option<String>,
    pub session_id: Option<String>,
    pub component: Component,
    pub event_type: EventType,
    pub timestamp: String,
    pub metadata: serde_json::Value,
}

impl SessionEvent {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let component_str: String = row.get(4)?;
        let event_type_str: String = row.get(5)?;
        let metadata_str: String = row.get(7)?;
        Ok(SessionEvent {
            id: row.get(0)?,
            correlation_id: row.get(1)?,
            workspace_id: row.get(2)?,
            session_id: row.get(3)?,
            component: component_str.parse().map_err(|_| {
                rusqlite::Error::InvalidColumnType(4, "component".into(), rusqlite::types::Type::Text)
            })?,
            event_type: event_type_str.parse().map_err(|_| {
                rusqlite::Error::InvalidColumnType(5, "event_type".into(), rusqlite::types::Type::Text)
            })?,
            timestamp: row.get(6)?,
            metadata: serde_json::from_str(&metadata_str).unwrap_or(serde_json::Value::Null),
        })
    }
}
