use crate::record::{
    Aborted, BuildEvent, File, InvocationEvent, InvocationRecord, InvocationStatus,
    PatternExpanded, Progress, TargetCompleted, TargetConfigured, TestStatus, TestSummary,
};

/// Record with the given id and status and no events.
pub fn record(invocation_id: &str, status: InvocationStatus) -> InvocationRecord {
    InvocationRecord {
        invocation_id: invocation_id.to_string(),
        invocation_status: status,
        ..Default::default()
    }
}

pub fn record_with_events(
    invocation_id: &str,
    status: InvocationStatus,
    events: Vec<InvocationEvent>,
) -> InvocationRecord {
    InvocationRecord {
        event: events,
        ..record(invocation_id, status)
    }
}

/// Wrap a payload with the next sequence number.
pub fn event(build_event: BuildEvent) -> InvocationEvent {
    InvocationEvent {
        sequence_number: next_sequence(),
        event_time: Some(chrono::Utc::now()),
        build_event,
    }
}

pub fn configured(label: &str) -> InvocationEvent {
    event(BuildEvent::TargetConfigured(TargetConfigured {
        label: label.to_string(),
        target_kind: "test_rule".to_string(),
    }))
}

pub fn completed(label: &str, success: bool) -> InvocationEvent {
    completed_with_outputs(label, success, Vec::new())
}

pub fn completed_with_outputs(label: &str, success: bool, outputs: Vec<File>) -> InvocationEvent {
    event(BuildEvent::TargetCompleted(TargetCompleted {
        label: label.to_string(),
        success,
        important_output: outputs,
    }))
}

pub fn test_summary(label: &str, status: TestStatus) -> InvocationEvent {
    event(BuildEvent::TestSummary(TestSummary {
        label: label.to_string(),
        overall_status: status,
        total_run_count: 1,
    }))
}

pub fn pattern(patterns: &[&str]) -> InvocationEvent {
    event(BuildEvent::Pattern(PatternExpanded {
        pattern: patterns.iter().map(|p| p.to_string()).collect(),
    }))
}

pub fn progress(stdout: &str, stderr: &str) -> InvocationEvent {
    event(BuildEvent::Progress(Progress {
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }))
}

pub fn aborted(reason: &str, description: &str) -> InvocationEvent {
    event(BuildEvent::Aborted(Aborted {
        reason: reason.to_string(),
        description: description.to_string(),
    }))
}

fn next_sequence() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}
