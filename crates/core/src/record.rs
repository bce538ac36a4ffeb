use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Upload status of an invocation as reported by the build event service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvocationStatus {
    Complete,
    /// The build is still streaming events.
    Partial,
    Disconnected,
    #[default]
    #[serde(other)]
    Unknown,
}

/// One raw invocation record, as returned by `GetInvocation`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvocationRecord {
    pub invocation_id: String,
    pub invocation_status: InvocationStatus,
    pub user: String,
    pub command: String,
    pub pattern: Vec<String>,
    pub host: String,
    pub success: bool,
    pub duration_usec: i64,
    /// Recorded build events, in stream order.
    pub event: Vec<InvocationEvent>,
}

impl InvocationRecord {
    pub fn is_partial(&self) -> bool {
        self.invocation_status == InvocationStatus::Partial
    }

    pub fn has_events(&self) -> bool {
        !self.event.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationEvent {
    #[serde(default)]
    pub sequence_number: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<DateTime<Utc>>,
    pub build_event: BuildEvent,
}

/// The subset of build event payloads the invocation page understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum BuildEvent {
    Started(BuildStarted),
    Pattern(PatternExpanded),
    TargetConfigured(TargetConfigured),
    TargetCompleted(TargetCompleted),
    TestSummary(TestSummary),
    Aborted(Aborted),
    Progress(Progress),
    NamedSetOfFiles(NamedSetOfFiles),
    BuildMetadata(BuildMetadata),
    OptionsParsed(OptionsParsed),
    Finished(BuildFinished),
    #[serde(other)]
    Unknown,
}

impl BuildEvent {
    /// Short name used by the raw log listing.
    pub fn kind(&self) -> &'static str {
        match self {
            BuildEvent::Started(_) => "started",
            BuildEvent::Pattern(_) => "pattern",
            BuildEvent::TargetConfigured(_) => "target_configured",
            BuildEvent::TargetCompleted(_) => "target_completed",
            BuildEvent::TestSummary(_) => "test_summary",
            BuildEvent::Aborted(_) => "aborted",
            BuildEvent::Progress(_) => "progress",
            BuildEvent::NamedSetOfFiles(_) => "named_set_of_files",
            BuildEvent::BuildMetadata(_) => "build_metadata",
            BuildEvent::OptionsParsed(_) => "options_parsed",
            BuildEvent::Finished(_) => "finished",
            BuildEvent::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildStarted {
    pub uuid: String,
    pub command: String,
    pub build_tool_version: String,
    pub workspace_directory: String,
    pub start_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternExpanded {
    pub pattern: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfigured {
    pub label: String,
    pub target_kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetCompleted {
    pub label: String,
    pub success: bool,
    /// Output files produced by the target.
    pub important_output: Vec<File>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestStatus {
    Passed,
    Flaky,
    Timeout,
    Failed,
    Incomplete,
    RemoteFailure,
    FailedToBuild,
    ToolHaltedBeforeTesting,
    #[default]
    #[serde(other)]
    NoStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestSummary {
    pub label: String,
    pub overall_status: TestStatus,
    pub total_run_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Aborted {
    pub reason: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct File {
    pub name: String,
    pub uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamedSetOfFiles {
    pub files: Vec<File>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildMetadata {
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsParsed {
    pub explicit_cmd_line: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildFinished {
    pub overall_success: bool,
    pub exit_code: i32,
    pub finish_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_decodes_with_missing_fields() {
        let json = r#"{"invocation_id":"abc123","invocation_status":"PARTIAL"}"#;
        let record: InvocationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.invocation_id, "abc123");
        assert!(record.is_partial());
        assert!(!record.has_events());
        assert!(record.pattern.is_empty());
    }

    #[test]
    fn unrecognised_status_falls_back_to_unknown() {
        let json = r#"{"invocation_status":"SOMETHING_NEW"}"#;
        let record: InvocationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.invocation_status, InvocationStatus::Unknown);
    }

    #[test]
    fn build_event_decodes_adjacent_tag() {
        let json = r#"{
            "sequence_number": 4,
            "build_event": {
                "type": "test_summary",
                "data": {"label": "//pkg:test", "overall_status": "FLAKY"}
            }
        }"#;
        let event: InvocationEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.sequence_number, 4);
        assert_eq!(event.build_event.kind(), "test_summary");
        match event.build_event {
            BuildEvent::TestSummary(summary) => {
                assert_eq!(summary.label, "//pkg:test");
                assert_eq!(summary.overall_status, TestStatus::Flaky);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn unknown_event_type_without_payload_is_tolerated() {
        let json = r#"{"build_event": {"type": "workspace_status"}}"#;
        let event: InvocationEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.build_event, BuildEvent::Unknown);
    }
}
