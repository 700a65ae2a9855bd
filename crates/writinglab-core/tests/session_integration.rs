//! Integration tests for the writing lab lifecycle.
//!
//! A manual clock drives batching deterministically; in-memory stores stand
//! in for the draft cache and persistence gateway.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use writinglab_core::{
    BatchingConfig, DraftCache, EventKind, FormResponses, LabParts, ManualClock, MemoryDrafts,
    MemoryStore, PersistError, PersistenceGateway, SequentialIds, SessionError, SessionId,
    RuleState, SessionPhase, SessionRecord, WritingLab,
};

/// Gateway that fails a configurable number of times before succeeding.
#[derive(Default)]
struct FlakyGateway {
    failures_left: Cell<usize>,
    calls: Cell<usize>,
    saved: RefCell<Vec<SessionRecord>>,
}

impl FlakyGateway {
    fn failing(times: usize) -> Self {
        Self {
            failures_left: Cell::new(times),
            ..Self::default()
        }
    }
}

impl PersistenceGateway for FlakyGateway {
    fn name(&self) -> &str {
        "flaky"
    }

    fn save(&self, _id: &SessionId, record: &SessionRecord) -> Result<(), PersistError> {
        self.calls.set(self.calls.get() + 1);
        if self.failures_left.get() > 0 {
            self.failures_left.set(self.failures_left.get() - 1);
            return Err(PersistError::Remote {
                status: 503,
                body: "unavailable".into(),
            });
        }
        self.saved.borrow_mut().push(record.clone());
        Ok(())
    }

    fn load(&self, _id: &SessionId) -> Result<Option<SessionRecord>, PersistError> {
        Ok(self.saved.borrow().last().cloned())
    }
}

struct Fixture {
    clock: ManualClock,
    drafts: Rc<MemoryDrafts>,
}

impl Fixture {
    fn new() -> Self {
        Self::with_drafts(MemoryDrafts::new())
    }

    fn with_drafts(drafts: MemoryDrafts) -> Self {
        Self {
            clock: ManualClock::default(),
            drafts: Rc::new(drafts),
        }
    }

    fn lab(&self, gateway: Box<dyn PersistenceGateway>) -> WritingLab {
        WritingLab::start(LabParts {
            clock: Box::new(self.clock.clone()),
            ids: Box::new(SequentialIds::new("test")),
            drafts: Box::new(Rc::clone(&self.drafts)),
            gateway,
            batching: BatchingConfig::default(),
        })
    }
}

fn event_types(lab: &WritingLab) -> Vec<&'static str> {
    lab.session().events().iter().map(|e| e.type_name()).collect()
}

fn type_chars(lab: &mut WritingLab, clock: &ManualClock, text: &str, gap_ms: i64) {
    let mut current = lab.session().current_text().to_string();
    for ch in text.chars() {
        current.push(ch);
        let data = ch.to_string();
        lab.input(&current, Some(&data)).unwrap();
        clock.advance_ms(gap_ms);
        lab.tick();
    }
}

fn finished_story() -> String {
    format!(
        "In the morning Anna faced a problem. {} She finally understood.",
        vec!["word"; 200].join(" ")
    )
}

fn write_and_submit(lab: &mut WritingLab) {
    lab.input(&finished_story(), None).unwrap();
    lab.settle();
    lab.submit().unwrap();
}

#[test]
fn rapid_typing_is_one_typed_event() {
    let fx = Fixture::new();
    let mut lab = fx.lab(Box::new(MemoryStore::new()));

    type_chars(&mut lab, &fx.clock, "Hello", 200);
    assert_eq!(lab.session().events().of_type("typed").count(), 0);

    fx.clock.advance_ms(1000);
    lab.tick();

    let typed: Vec<String> = lab
        .session()
        .events()
        .iter()
        .filter_map(|e| match &e.kind {
            EventKind::Typed { content } => Some(content.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(typed, vec!["Hello"]);
    assert_eq!(fx.drafts.load_draft().as_deref(), Some("Hello"));
}

#[test]
fn delete_flushes_pending_typing_first() {
    let fx = Fixture::new();
    let mut lab = fx.lab(Box::new(MemoryStore::new()));

    type_chars(&mut lab, &fx.clock, "abc", 100);
    lab.input("ab", None).unwrap();
    lab.key_down("Backspace").unwrap();

    assert_eq!(
        event_types(&lab),
        vec!["session_started", "typed", "deleted"]
    );
    assert!(lab.pending_input().is_empty());

    // Other keys are ignored.
    lab.key_down("Shift").unwrap();
    assert_eq!(lab.session().events().len(), 3);
}

#[test]
fn paste_logs_sentinel_when_clipboard_unreadable() {
    let fx = Fixture::new();
    let mut lab = fx.lab(Box::new(MemoryStore::new()));

    type_chars(&mut lab, &fx.clock, "x", 10);
    lab.paste(None).unwrap();

    let last = lab.session().events().last().unwrap();
    assert_eq!(
        last.kind,
        EventKind::Pasted {
            content: "unknown content".into()
        }
    );
    assert_eq!(lab.session().events().of_type("typed").count(), 1);
}

#[test]
fn long_silence_is_logged_as_pause() {
    let fx = Fixture::new();
    let mut lab = fx.lab(Box::new(MemoryStore::new()));

    fx.clock.advance_ms(4000);
    type_chars(&mut lab, &fx.clock, "a", 0);
    fx.clock.advance_ms(1000);
    lab.tick();

    let pauses: Vec<u64> = lab
        .session()
        .events()
        .iter()
        .filter_map(|e| match e.kind {
            EventKind::Paused { duration } => Some(duration),
            _ => None,
        })
        .collect();
    assert_eq!(pauses, vec![5000]);
}

#[test]
fn submit_with_unmet_rules_keeps_drafting() {
    let fx = Fixture::new();
    let mut lab = fx.lab(Box::new(MemoryStore::new()));

    // Rules are only evaluated when the debounce elapses, so nothing is met yet.
    lab.input("Anna", Some("Anna")).unwrap();
    let err = lab.submit().unwrap_err();
    match &err {
        SessionError::IncompleteRequiredRules { titles } => assert_eq!(
            titles,
            &vec![
                "Begin with an intriguing opening".to_string(),
                "Introduce a main character".to_string(),
                "Establish a vivid setting".to_string(),
                "Introduce a conflict".to_string(),
                "Work toward a resolution".to_string(),
            ]
        ),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.user_message().starts_with("Please complete all required elements:"));
    assert_eq!(lab.phase(), SessionPhase::Drafting);
    // Pending typing was still flushed.
    assert_eq!(lab.session().events().of_type("typed").count(), 1);
}

#[test]
fn submit_rejects_whitespace_story() {
    let fx = Fixture::new();
    let mut lab = fx.lab(Box::new(MemoryStore::new()));

    lab.input("   ", Some("   ")).unwrap();
    let err = lab.submit().unwrap_err();
    assert_eq!(err.user_message(), "Please write something before submitting.");
    assert_eq!(lab.phase(), SessionPhase::Drafting);
}

#[test]
fn duplicate_feedback_is_rejected_while_pending() {
    let fx = Fixture::new();
    let store = Rc::new(MemoryStore::new());
    let mut lab = fx.lab(Box::new(Rc::clone(&store)));
    write_and_submit(&mut lab);

    let pending = lab.begin_feedback(FormResponses::new()).unwrap();
    assert!(matches!(
        lab.begin_feedback(FormResponses::new()),
        Err(SessionError::FeedbackInFlight)
    ));
    assert!(matches!(
        lab.submit_feedback(FormResponses::new()),
        Err(SessionError::FeedbackInFlight)
    ));

    // The session stays readable while the save is outstanding.
    assert_eq!(lab.phase(), SessionPhase::AwaitingFeedback);
    assert!(!lab.session().final_story().is_empty());

    let outcome = lab.gateway().save(&pending.session_id, &pending.record);
    lab.finish_feedback(outcome).unwrap();

    assert_eq!(lab.phase(), SessionPhase::Completed);
    assert_eq!(store.save_count(), 1);
    assert_eq!(lab.session().events().of_type("feedback_submitted").count(), 1);
}

#[test]
fn failed_save_keeps_draft_and_allows_retry() {
    let fx = Fixture::new();
    let gateway = Rc::new(FlakyGateway::failing(1));
    let mut lab = fx.lab(Box::new(Rc::clone(&gateway)));
    write_and_submit(&mut lab);
    fx.drafts.save_draft("draft text");

    let mut responses = FormResponses::new();
    responses.insert("enjoyment".into(), "4".into());

    let err = lab.submit_feedback(responses.clone()).unwrap_err();
    assert!(err.is_retriable());
    assert_eq!(
        err.user_message(),
        "There was a problem saving your data. Please try again."
    );
    assert_eq!(lab.phase(), SessionPhase::AwaitingFeedback);
    assert_eq!(fx.drafts.load_draft().as_deref(), Some("draft text"));

    lab.submit_feedback(responses).unwrap();
    assert_eq!(lab.phase(), SessionPhase::Completed);
    assert_eq!(gateway.calls.get(), 2);
    assert!(fx.drafts.load_draft().is_none());

    let saved = gateway.load(lab.session().id()).unwrap().unwrap();
    assert_eq!(saved.form_responses["enjoyment"], "4");
    assert_eq!(saved.session_id.as_str(), "test-1");
}

#[test]
fn saved_record_has_flat_feedback_event() {
    let fx = Fixture::new();
    let store = Rc::new(MemoryStore::new());
    let mut lab = fx.lab(Box::new(Rc::clone(&store)));
    write_and_submit(&mut lab);

    let mut responses = FormResponses::new();
    responses.insert("difficulty".into(), "3".into());
    lab.submit_feedback(responses).unwrap();

    let record = store.load(lab.session().id()).unwrap().unwrap();
    let json = serde_json::to_value(&record).unwrap();
    let last = json["events"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["type"], "feedback_submitted");
    assert_eq!(last["difficulty"], "3");
    assert!(last["timestamp"].is_string());
}

#[test]
fn startup_restores_draft() {
    let fx = Fixture::with_drafts(MemoryDrafts::with_draft("At night, Anna waited."));
    let lab = fx.lab(Box::new(MemoryStore::new()));

    assert_eq!(lab.session().current_text(), "At night, Anna waited.");
    let types = event_types(&lab);
    assert_eq!(types.first(), Some(&"session_started"));
    assert_eq!(types.last(), Some(&"draft_loaded"));
    assert_eq!(lab.session().events().of_type("rule_met").count(), 2);
    assert_eq!(
        lab.session().events().last().unwrap().kind,
        EventKind::DraftLoaded { length: 22 }
    );
}

#[test]
fn reset_from_completed_starts_over() {
    let fx = Fixture::new();
    let mut lab = fx.lab(Box::new(MemoryStore::new()));
    write_and_submit(&mut lab);
    lab.submit_feedback(FormResponses::new()).unwrap();

    lab.reset();
    assert_eq!(lab.phase(), SessionPhase::Drafting);
    assert_eq!(lab.session().id().as_str(), "test-2");
    assert_eq!(event_types(&lab), vec!["session_started"]);
    assert!(lab.session().rules().unmet_required().len() == 5);
}

#[test]
fn export_round_trips() {
    let fx = Fixture::new();
    let mut lab = fx.lab(Box::new(MemoryStore::new()));
    type_chars(&mut lab, &fx.clock, "Anna", 50);
    lab.settle();

    let snapshot = lab.session().record();
    let doc = lab.export().unwrap();

    assert_eq!(doc.file_name, "writinglab-test-1.json");
    assert_eq!(doc.reload().unwrap(), snapshot);
    assert_eq!(
        lab.session().events().last().unwrap().kind,
        EventKind::SessionExported
    );
}

#[test]
fn rule_events_agree_with_rule_states() {
    const ACTIVATED: &[RuleState] = &[RuleState::Active, RuleState::Met, RuleState::Skipped];
    const MET: &[RuleState] = &[RuleState::Met];
    const SKIPPED: &[RuleState] = &[RuleState::Skipped];

    let fx = Fixture::new();
    let mut lab = fx.lab(Box::new(MemoryStore::new()));

    lab.input(&finished_story(), None).unwrap();
    lab.settle();
    lab.skip_rule("dialog").unwrap();
    lab.submit().unwrap();

    let session = lab.session();
    let mut checked = 0;
    for event in session.events() {
        let (rule_id, expected) = match &event.kind {
            EventKind::RuleActivated { rule_id } => (rule_id, ACTIVATED),
            EventKind::RuleMet { rule_id } => (rule_id, MET),
            EventKind::RuleSkipped { rule_id } => (rule_id, SKIPPED),
            _ => continue,
        };
        let state = session.rules().state_of(rule_id).unwrap();
        assert!(expected.contains(&state), "{rule_id} logged but is {state}");
        checked += 1;
    }
    assert!(checked > 0);
    assert_eq!(session.events().of_type("rule_skipped").count(), 1);
}
