use crate::record::{
    Aborted, BuildEvent, BuildFinished, BuildStarted, File, InvocationEvent, InvocationRecord,
    InvocationStatus, TestStatus,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

/// How a target ended up, as shown on the invocation page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeCategory {
    Failed,
    Broken,
    Flaky,
    Succeeded,
}

/// A single target and the evidence that placed it in its category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetOutcome {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_status: Option<TestStatus>,
}

impl TargetOutcome {
    fn category(&self) -> Option<OutcomeCategory> {
        match (self.test_status, self.success) {
            (Some(TestStatus::Flaky), _) => Some(OutcomeCategory::Flaky),
            (Some(TestStatus::Passed), _) => Some(OutcomeCategory::Succeeded),
            (Some(_), _) => Some(OutcomeCategory::Failed),
            (None, Some(false)) => Some(OutcomeCategory::Broken),
            (None, Some(true)) => Some(OutcomeCategory::Succeeded),
            (None, None) => None,
        }
    }
}

/// Targets keyed by label, remembering first-seen order.
#[derive(Default)]
struct TargetTable {
    order: Vec<String>,
    by_label: HashMap<String, TargetOutcome>,
}

impl TargetTable {
    fn entry(&mut self, label: &str) -> &mut TargetOutcome {
        if !self.by_label.contains_key(label) {
            self.order.push(label.to_string());
        }
        self.by_label
            .entry(label.to_string())
            .or_insert_with(|| TargetOutcome {
                label: label.to_string(),
                target_kind: None,
                success: None,
                test_status: None,
            })
    }

    fn into_outcomes(mut self) -> Vec<TargetOutcome> {
        self.order
            .iter()
            .filter_map(|label| self.by_label.remove(label))
            .collect()
    }
}

/// Read-only snapshot derived from the records of one `GetInvocation` call.
///
/// A model is never patched: every fetch builds a fresh one through
/// [`InvocationModel::from_invocations`]. `Default` is the blank snapshot used
/// before the first response arrives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvocationModel {
    invocations: Vec<InvocationRecord>,
    pub failed: Vec<TargetOutcome>,
    pub broken: Vec<TargetOutcome>,
    pub flaky: Vec<TargetOutcome>,
    pub succeeded: Vec<TargetOutcome>,
    pub aborted: Option<Aborted>,
    started: Option<BuildStarted>,
    finished: Option<BuildFinished>,
    expanded_pattern: Vec<String>,
    console: String,
    artifacts: Vec<File>,
    metadata: BTreeMap<String, String>,
    options: Vec<String>,
}

impl InvocationModel {
    pub fn from_invocations(invocations: &[InvocationRecord]) -> Self {
        let mut model = Self {
            invocations: invocations.to_vec(),
            ..Self::default()
        };

        let mut table = TargetTable::default();
        let mut seen_files: HashSet<File> = HashSet::new();

        for event in invocations.iter().flat_map(|inv| &inv.event) {
            match &event.build_event {
                BuildEvent::Started(started) => model.started = Some(started.clone()),
                BuildEvent::Pattern(pattern) => {
                    model.expanded_pattern = pattern.pattern.clone();
                }
                BuildEvent::TargetConfigured(configured) => {
                    let kind = configured.target_kind.clone();
                    let outcome = table.entry(&configured.label);
                    if !kind.is_empty() {
                        outcome.target_kind = Some(kind);
                    }
                }
                BuildEvent::TargetCompleted(completed) => {
                    table.entry(&completed.label).success = Some(completed.success);
                    for file in &completed.important_output {
                        if seen_files.insert(file.clone()) {
                            model.artifacts.push(file.clone());
                        }
                    }
                }
                BuildEvent::TestSummary(summary) => {
                    table.entry(&summary.label).test_status = Some(summary.overall_status);
                }
                BuildEvent::Aborted(aborted) => model.aborted = Some(aborted.clone()),
                BuildEvent::Progress(progress) => {
                    model.console.push_str(&progress.stderr);
                    model.console.push_str(&progress.stdout);
                }
                BuildEvent::NamedSetOfFiles(set) => {
                    for file in &set.files {
                        if seen_files.insert(file.clone()) {
                            model.artifacts.push(file.clone());
                        }
                    }
                }
                BuildEvent::BuildMetadata(meta) => {
                    model
                        .metadata
                        .extend(meta.metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                BuildEvent::OptionsParsed(options) => {
                    model.options = options.explicit_cmd_line.clone();
                }
                BuildEvent::Finished(finished) => model.finished = Some(finished.clone()),
                BuildEvent::Unknown => {}
            }
        }

        for outcome in table.into_outcomes() {
            match outcome.category() {
                Some(OutcomeCategory::Failed) => model.failed.push(outcome),
                Some(OutcomeCategory::Broken) => model.broken.push(outcome),
                Some(OutcomeCategory::Flaky) => model.flaky.push(outcome),
                Some(OutcomeCategory::Succeeded) => model.succeeded.push(outcome),
                None => {}
            }
        }

        model
    }

    fn first(&self) -> Option<&InvocationRecord> {
        self.invocations.first()
    }

    pub fn invocations(&self) -> &[InvocationRecord] {
        &self.invocations
    }

    pub fn invocation_id(&self) -> &str {
        self.first().map(|i| i.invocation_id.as_str()).unwrap_or("")
    }

    pub fn status(&self) -> InvocationStatus {
        self.first()
            .map(|i| i.invocation_status)
            .unwrap_or_default()
    }

    pub fn is_partial(&self) -> bool {
        self.status() == InvocationStatus::Partial
    }

    /// Events recorded on the first invocation record.
    pub fn event_count(&self) -> usize {
        self.first().map(|i| i.event.len()).unwrap_or(0)
    }

    pub fn user(&self) -> &str {
        self.first().map(|i| i.user.as_str()).unwrap_or("")
    }

    pub fn host(&self) -> &str {
        self.first().map(|i| i.host.as_str()).unwrap_or("")
    }

    pub fn command(&self) -> &str {
        match self.first() {
            Some(inv) if !inv.command.is_empty() => &inv.command,
            _ => self
                .started
                .as_ref()
                .map(|s| s.command.as_str())
                .unwrap_or(""),
        }
    }

    /// Target patterns joined with spaces.
    pub fn pattern(&self) -> String {
        match self.first() {
            Some(inv) if !inv.pattern.is_empty() => inv.pattern.join(" "),
            _ => self.expanded_pattern.join(" "),
        }
    }

    pub fn success(&self) -> Option<bool> {
        if let Some(finished) = &self.finished {
            return Some(finished.overall_success);
        }
        match self.first() {
            Some(inv) if inv.invocation_status == InvocationStatus::Complete => {
                Some(inv.success)
            }
            _ => None,
        }
    }

    pub fn aborted(&self) -> Option<&Aborted> {
        self.aborted.as_ref()
    }

    /// The abort description, when the build was aborted with one.
    pub fn abort_description(&self) -> Option<&str> {
        self.aborted
            .as_ref()
            .map(|a| a.description.as_str())
            .filter(|d| !d.is_empty())
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.started.as_ref().and_then(|s| s.start_time)
    }

    pub fn duration(&self) -> Duration {
        let usec = self.first().map(|i| i.duration_usec).unwrap_or(0);
        Duration::from_micros(u64::try_from(usec).unwrap_or(0))
    }

    pub fn console_log(&self) -> &str {
        &self.console
    }

    pub fn artifacts(&self) -> &[File] {
        &self.artifacts
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Every event from every record, in response order.
    pub fn raw_events(&self) -> impl Iterator<Item = &InvocationEvent> {
        self.invocations.iter().flat_map(|inv| inv.event.iter())
    }

    pub fn outcomes(&self, category: OutcomeCategory) -> &[TargetOutcome] {
        match category {
            OutcomeCategory::Failed => &self.failed,
            OutcomeCategory::Broken => &self.broken,
            OutcomeCategory::Flaky => &self.flaky,
            OutcomeCategory::Succeeded => &self.succeeded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn blank_model_is_empty() {
        let model = InvocationModel::default();
        assert_eq!(model.user(), "");
        assert_eq!(model.command(), "");
        assert_eq!(model.pattern(), "");
        assert_eq!(model.status(), InvocationStatus::Unknown);
        assert_eq!(model.event_count(), 0);
        assert!(model.abort_description().is_none());
        assert!(model.failed.is_empty() && model.succeeded.is_empty());
    }

    #[test]
    fn empty_record_set_builds_blank_model() {
        assert_eq!(
            InvocationModel::from_invocations(&[]),
            InvocationModel::default()
        );
    }

    #[test]
    fn targets_are_partitioned_by_outcome() {
        let record = testing::record_with_events(
            "inv",
            InvocationStatus::Complete,
            vec![
                testing::configured("//a:lib"),
                testing::configured("//b:test"),
                testing::configured("//c:test"),
                testing::configured("//d:test"),
                testing::configured("//e:bin"),
                testing::completed("//a:lib", true),
                testing::completed("//b:test", true),
                testing::test_summary("//b:test", TestStatus::Failed),
                testing::completed("//c:test", true),
                testing::test_summary("//c:test", TestStatus::Flaky),
                testing::test_summary("//d:test", TestStatus::Passed),
                testing::completed("//e:bin", false),
            ],
        );
        let model = InvocationModel::from_invocations(&[record]);

        let labels = |outcomes: &[TargetOutcome]| {
            outcomes.iter().map(|o| o.label.clone()).collect::<Vec<_>>()
        };
        assert_eq!(labels(&model.succeeded), vec!["//a:lib", "//d:test"]);
        assert_eq!(labels(&model.failed), vec!["//b:test"]);
        assert_eq!(labels(&model.flaky), vec!["//c:test"]);
        assert_eq!(labels(&model.broken), vec!["//e:bin"]);
    }

    #[test]
    fn configured_but_unfinished_targets_are_not_categorised() {
        let record = testing::record_with_events(
            "inv",
            InvocationStatus::Partial,
            vec![testing::configured("//still:building")],
        );
        let model = InvocationModel::from_invocations(&[record]);
        assert!(model.failed.is_empty());
        assert!(model.broken.is_empty());
        assert!(model.flaky.is_empty());
        assert!(model.succeeded.is_empty());
    }

    #[test]
    fn a_target_lands_in_exactly_one_category() {
        let record = testing::record_with_events(
            "inv",
            InvocationStatus::Complete,
            vec![
                testing::completed("//x:test", false),
                testing::test_summary("//x:test", TestStatus::Passed),
            ],
        );
        let model = InvocationModel::from_invocations(&[record]);
        let total = model.failed.len() + model.broken.len() + model.flaky.len()
            + model.succeeded.len();
        assert_eq!(total, 1);
        assert_eq!(model.succeeded[0].label, "//x:test");
    }

    #[test]
    fn summary_fields_come_from_first_record() {
        let mut record = testing::record("abc123", InvocationStatus::Complete);
        record.user = "siggi".to_string();
        record.command = "build".to_string();
        record.pattern = vec!["//...".to_string(), "-//slow/...".to_string()];
        let model = InvocationModel::from_invocations(&[record]);
        assert_eq!(model.invocation_id(), "abc123");
        assert_eq!(model.user(), "siggi");
        assert_eq!(model.command(), "build");
        assert_eq!(model.pattern(), "//... -//slow/...");
    }

    #[test]
    fn pattern_falls_back_to_pattern_event() {
        let record = testing::record_with_events(
            "inv",
            InvocationStatus::Complete,
            vec![testing::pattern(&["//server/..."])],
        );
        let model = InvocationModel::from_invocations(&[record]);
        assert_eq!(model.pattern(), "//server/...");
    }

    #[test]
    fn abort_console_and_artifacts_are_collected() {
        let file = File {
            name: "bin/app".to_string(),
            uri: "bytestream://cache/app".to_string(),
        };
        let record = testing::record_with_events(
            "inv",
            InvocationStatus::Complete,
            vec![
                testing::progress("Loading: 0 packages\n", ""),
                testing::progress("", "ERROR: boom\n"),
                testing::completed_with_outputs("//a:app", true, vec![file.clone()]),
                testing::event(BuildEvent::NamedSetOfFiles(
                    crate::record::NamedSetOfFiles {
                        files: vec![file.clone()],
                    },
                )),
                testing::aborted("USER_INTERRUPTED", "Build was interrupted"),
            ],
        );
        let model = InvocationModel::from_invocations(&[record]);
        assert_eq!(model.abort_description(), Some("Build was interrupted"));
        assert_eq!(model.console_log(), "Loading: 0 packages\nERROR: boom\n");
        assert_eq!(model.artifacts(), &[file]);
        assert_eq!(model.raw_events().count(), 5);
    }

    #[test]
    fn blank_abort_description_is_ignored() {
        let record = testing::record_with_events(
            "inv",
            InvocationStatus::Complete,
            vec![testing::aborted("INCOMPLETE", "")],
        );
        let model = InvocationModel::from_invocations(&[record]);
        assert!(model.aborted().is_some());
        assert!(model.abort_description().is_none());
    }

    #[test]
    fn details_come_from_record_and_lifecycle_events() {
        use crate::record::{BuildMetadata, OptionsParsed};
        use chrono::TimeZone;

        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut record = testing::record_with_events(
            "inv",
            InvocationStatus::Complete,
            vec![
                testing::event(BuildEvent::Started(BuildStarted {
                    command: "test".to_string(),
                    start_time: Some(start),
                    ..Default::default()
                })),
                testing::event(BuildEvent::OptionsParsed(OptionsParsed {
                    explicit_cmd_line: vec!["--config=ci".to_string()],
                })),
                testing::event(BuildEvent::BuildMetadata(BuildMetadata {
                    metadata: BTreeMap::from([("ROLE".to_string(), "CI".to_string())]),
                })),
                testing::event(BuildEvent::Finished(BuildFinished {
                    overall_success: false,
                    exit_code: 3,
                    finish_time: None,
                })),
            ],
        );
        record.host = "runner-7".to_string();
        record.success = true;
        record.duration_usec = 2_500_000;

        let model = InvocationModel::from_invocations(&[record]);
        assert_eq!(model.host(), "runner-7");
        assert_eq!(model.command(), "test");
        assert_eq!(model.start_time(), Some(start));
        assert_eq!(model.duration(), Duration::from_millis(2_500));
        assert_eq!(model.options(), &["--config=ci".to_string()]);
        assert_eq!(model.metadata().get("ROLE").map(String::as_str), Some("CI"));
        // The finished event wins over the record's success flag.
        assert_eq!(model.success(), Some(false));
    }

    #[test]
    fn success_is_unknown_until_the_build_completes() {
        let mut partial = testing::record("inv", InvocationStatus::Partial);
        partial.success = true;
        assert_eq!(InvocationModel::from_invocations(&[partial]).success(), None);

        let mut complete = testing::record("inv", InvocationStatus::Complete);
        complete.success = true;
        complete.duration_usec = -1;
        let model = InvocationModel::from_invocations(&[complete]);
        assert_eq!(model.success(), Some(true));
        assert_eq!(model.duration(), Duration::ZERO);
    }
}
