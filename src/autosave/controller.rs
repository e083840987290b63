use super::config::{AutosaveConfig, RetryPolicy};
use crate::models::Note;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NoteField {
    Title,
    Content,
}

/// The (title, content) pair that autosave keeps in sync.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct NoteFields {
    pub title: String,
    pub content: String,
}

impl NoteFields {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    fn set(&mut self, field: NoteField, value: String) {
        match field {
            NoteField::Title => self.title = value,
            NoteField::Content => self.content = value,
        }
    }
}

impl From<&Note> for NoteFields {
    fn from(note: &Note) -> Self {
        Self::new(note.title.clone(), note.content.clone())
    }
}

/// Logical timer handle. The driver maps it to whatever the host timer API returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct TimerId(pub u64);

/// The single save request allowed in flight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PendingSave {
    pub ticket: u64,
    pub fields: NoteFields,
    /// Edit counter at the time the snapshot was taken.
    edits_at_send: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SaveStatus {
    Clean,
    Dirty,
    Saving,
}

impl SaveStatus {
    pub fn label(self) -> &'static str {
        match self {
            SaveStatus::Clean => "Changes saved.",
            SaveStatus::Dirty | SaveStatus::Saving => "Saving...",
        }
    }
}

/// Side effects requested by the controller. The controller never performs I/O itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum AutosaveAction {
    ArmTimer { timer: TimerId, delay_ms: i64 },
    CancelTimer { timer: TimerId },
    SendSave {
        note_id: String,
        ticket: u64,
        fields: NoteFields,
    },
    /// Fire-and-forget recompute of the note's derived artifact (search embedding).
    RefreshDerived { note_id: String },
    StatusChanged(SaveStatus),
    /// The last-synced snapshot was replaced by a server response.
    Synced(NoteFields),
}

/// Autosave state machine for one note editing session.
///
/// Leading+trailing debounce: an edit saves immediately when nothing is in flight and a
/// full window has passed since the last attempt; otherwise exactly one timer is armed
/// for `now + window`, replacing any timer armed by an earlier edit. At most one save is
/// in flight; its response is applied only if its ticket matches, after which dirtiness
/// is re-evaluated against the current editable state.
///
/// All operations take the current time and return the actions to execute.
pub(crate) struct AutosaveController {
    note_id: String,
    config: AutosaveConfig,

    editable: NoteFields,
    synced: NoteFields,

    in_flight: Option<PendingSave>,
    /// Session start counts as an attempt, so the first edit after opening is debounced.
    last_attempt_ms: i64,

    armed: Option<TimerId>,
    next_timer: u64,
    next_ticket: u64,
    edit_count: u64,

    status: SaveStatus,
    ended: bool,
}

impl AutosaveController {
    pub fn new(
        note_id: impl Into<String>,
        initial: NoteFields,
        config: AutosaveConfig,
        now_ms: i64,
    ) -> Self {
        Self {
            note_id: note_id.into(),
            config,
            editable: initial.clone(),
            synced: initial,
            in_flight: None,
            last_attempt_ms: now_ms,
            armed: None,
            next_timer: 0,
            next_ticket: 0,
            edit_count: 0,
            status: SaveStatus::Clean,
            ended: false,
        }
    }

    pub fn note_id(&self) -> &str {
        &self.note_id
    }

    pub fn editable(&self) -> &NoteFields {
        &self.editable
    }

    pub fn synced(&self) -> &NoteFields {
        &self.synced
    }

    pub fn in_flight(&self) -> Option<&PendingSave> {
        self.in_flight.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.editable != self.synced
    }

    pub fn status(&self) -> SaveStatus {
        self.status
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn on_edit(&mut self, field: NoteField, value: String, now_ms: i64) -> Vec<AutosaveAction> {
        if self.ended {
            return vec![];
        }

        let mut actions = vec![];
        self.editable.set(field, value);
        self.edit_count += 1;
        self.schedule_save(now_ms, &mut actions);
        self.refresh_status(&mut actions);
        actions
    }

    pub fn on_timer_fired(&mut self, timer: TimerId, now_ms: i64) -> Vec<AutosaveAction> {
        if self.armed != Some(timer) {
            return vec![];
        }
        self.armed = None;

        let mut actions = vec![];
        // The response handler re-evaluates once the current request resolves.
        if self.in_flight.is_none() && self.is_dirty() && !self.ended {
            self.perform_save(now_ms, &mut actions);
        }
        self.refresh_status(&mut actions);
        actions
    }

    pub fn on_save_succeeded(
        &mut self,
        ticket: u64,
        server: NoteFields,
        now_ms: i64,
    ) -> Vec<AutosaveAction> {
        if self.in_flight.as_ref().map(|p| p.ticket) != Some(ticket) {
            return vec![];
        }
        self.in_flight = None;

        let mut actions = vec![];
        self.synced = server.clone();
        actions.push(AutosaveAction::Synced(server));

        if !self.ended {
            if !self.is_dirty() {
                self.cancel_timer(&mut actions);
            } else if self.armed.is_none() {
                self.schedule_save(now_ms, &mut actions);
            }
        }
        self.refresh_status(&mut actions);
        actions
    }

    pub fn on_save_failed(&mut self, ticket: u64, now_ms: i64) -> Vec<AutosaveAction> {
        let Some(failed) = self.in_flight.take_if(|p| p.ticket == ticket) else {
            return vec![];
        };

        let mut actions = vec![];
        if !self.ended && self.is_dirty() && self.armed.is_none() {
            if self.edit_count > failed.edits_at_send {
                // Newer edits whose timer already fired while this request was out.
                self.schedule_save(now_ms, &mut actions);
            } else if let RetryPolicy::After { delay_ms } = self.config.retry {
                self.arm_timer(delay_ms, &mut actions);
            }
        }
        self.refresh_status(&mut actions);
        actions
    }

    /// Editing view torn down. Emits the derived refresh exactly once per session.
    pub fn end_session(&mut self) -> Vec<AutosaveAction> {
        if self.ended {
            return vec![];
        }
        self.ended = true;

        let mut actions = vec![];
        self.cancel_timer(&mut actions);
        actions.push(AutosaveAction::RefreshDerived {
            note_id: self.note_id.clone(),
        });
        actions
    }

    /// Host is about to navigate away or close. Save state is untouched.
    pub fn on_page_hide(&mut self) -> Vec<AutosaveAction> {
        vec![AutosaveAction::RefreshDerived {
            note_id: self.note_id.clone(),
        }]
    }

    fn schedule_save(&mut self, now_ms: i64, actions: &mut Vec<AutosaveAction>) {
        if !self.is_dirty() {
            self.cancel_timer(actions);
            return;
        }

        let window_elapsed = now_ms - self.last_attempt_ms > self.config.window_ms;
        if self.in_flight.is_none() && window_elapsed {
            self.cancel_timer(actions);
            self.perform_save(now_ms, actions);
        } else {
            self.arm_timer(self.config.window_ms, actions);
        }
    }

    fn perform_save(&mut self, now_ms: i64, actions: &mut Vec<AutosaveAction>) {
        self.next_ticket += 1;
        let pending = PendingSave {
            ticket: self.next_ticket,
            fields: self.editable.clone(),
            edits_at_send: self.edit_count,
        };
        self.last_attempt_ms = now_ms;

        actions.push(AutosaveAction::SendSave {
            note_id: self.note_id.clone(),
            ticket: pending.ticket,
            fields: pending.fields.clone(),
        });
        self.in_flight = Some(pending);
    }

    fn arm_timer(&mut self, delay_ms: i64, actions: &mut Vec<AutosaveAction>) {
        self.cancel_timer(actions);
        self.next_timer += 1;
        let timer = TimerId(self.next_timer);
        self.armed = Some(timer);
        actions.push(AutosaveAction::ArmTimer { timer, delay_ms });
    }

    fn cancel_timer(&mut self, actions: &mut Vec<AutosaveAction>) {
        if let Some(timer) = self.armed.take() {
            actions.push(AutosaveAction::CancelTimer { timer });
        }
    }

    fn refresh_status(&mut self, actions: &mut Vec<AutosaveAction>) {
        let next = if self.in_flight.is_some() {
            SaveStatus::Saving
        } else if self.is_dirty() {
            SaveStatus::Dirty
        } else {
            SaveStatus::Clean
        };

        if next != self.status {
            self.status = next;
            actions.push(AutosaveAction::StatusChanged(next));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: i64 = 1000;

    fn session(started_ms: i64) -> AutosaveController {
        AutosaveController::new(
            "42",
            NoteFields::new("Untitled Note", ""),
            AutosaveConfig::default(),
            started_ms,
        )
    }

    fn sent(actions: &[AutosaveAction]) -> Vec<(u64, NoteFields)> {
        actions
            .iter()
            .filter_map(|a| match a {
                AutosaveAction::SendSave { ticket, fields, .. } => Some((*ticket, fields.clone())),
                _ => None,
            })
            .collect()
    }

    fn armed(actions: &[AutosaveAction]) -> Option<(TimerId, i64)> {
        actions.iter().rev().find_map(|a| match a {
            AutosaveAction::ArmTimer { timer, delay_ms } => Some((*timer, *delay_ms)),
            _ => None,
        })
    }

    fn refreshes(actions: &[AutosaveAction]) -> usize {
        actions
            .iter()
            .filter(|a| matches!(a, AutosaveAction::RefreshDerived { .. }))
            .count()
    }

    fn title(c: &mut AutosaveController, v: &str, now: i64) -> Vec<AutosaveAction> {
        c.on_edit(NoteField::Title, v.to_string(), now)
    }

    #[test]
    fn test_burst_within_window_coalesces_into_one_save() {
        let mut c = session(0);

        let a0 = title(&mut c, "A", 0);
        assert!(sent(&a0).is_empty());
        let (t1, d1) = armed(&a0).expect("first edit arms the trailing timer");
        assert_eq!(d1, W);

        let a1 = title(&mut c, "AB", 200);
        assert!(a1.contains(&AutosaveAction::CancelTimer { timer: t1 }));
        let (t2, d2) = armed(&a1).expect("second edit re-arms");
        assert_ne!(t1, t2);
        assert_eq!(200 + d2, 1200);

        // The superseded timer may still fire in the host; it must be a no-op.
        assert!(c.on_timer_fired(t1, 1000).is_empty());

        let fired = c.on_timer_fired(t2, 1200);
        let saves = sent(&fired);
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].1, NoteFields::new("AB", ""));
        assert_eq!(c.status(), SaveStatus::Saving);
    }

    #[test]
    fn test_first_edit_in_fresh_session_saves_one_window_later() {
        let mut c = session(0);
        let a = c.on_edit(NoteField::Content, "hello".to_string(), 300);
        let (t, delay) = armed(&a).expect("debounced");
        assert_eq!(300 + delay, 1300);
        assert_eq!(c.status(), SaveStatus::Dirty);

        let fired = c.on_timer_fired(t, 1300);
        assert_eq!(sent(&fired), vec![(1, NoteFields::new("Untitled Note", "hello"))]);
    }

    #[test]
    fn test_leading_edge_after_idle_then_new_cycle() {
        let mut c = session(-5000);

        let a = title(&mut c, "X", 0);
        assert_eq!(sent(&a).len(), 1, "idle long enough: save immediately");
        assert!(armed(&a).is_none());

        let done = c.on_save_succeeded(1, NoteFields::new("X", ""), 50);
        assert!(armed(&done).is_none());
        assert_eq!(c.status(), SaveStatus::Clean);
        assert!(done.contains(&AutosaveAction::StatusChanged(SaveStatus::Clean)));

        let b = title(&mut c, "XY", 60);
        assert!(sent(&b).is_empty());
        let (t, delay) = armed(&b).expect("new debounce cycle");
        assert_eq!(60 + delay, 1060);

        let fired = c.on_timer_fired(t, 1060);
        assert_eq!(sent(&fired), vec![(2, NoteFields::new("XY", ""))]);
    }

    #[test]
    fn test_edit_exactly_one_window_after_attempt_is_debounced() {
        let mut c = session(0);

        let a = title(&mut c, "on the edge", W);
        assert!(sent(&a).is_empty());
        let (t, delay) = armed(&a).expect("boundary edit waits");
        assert_eq!(W + delay, 2 * W);

        let fired = c.on_timer_fired(t, 2 * W);
        assert_eq!(sent(&fired), vec![(1, NoteFields::new("on the edge", ""))]);

        // One millisecond later the window has strictly elapsed.
        let mut c = session(0);
        assert_eq!(sent(&title(&mut c, "past the edge", W + 1)).len(), 1);
    }

    #[test]
    fn test_clean_is_judged_against_normalized_response() {
        let mut c = session(-5000);
        title(&mut c, "X", 0);

        let done = c.on_save_succeeded(1, NoteFields::new("X-normalized", ""), 40);
        assert!(done.contains(&AutosaveAction::Synced(NoteFields::new("X-normalized", ""))));
        assert_eq!(c.synced().title, "X-normalized");
        // The editor still shows "X", which now differs from the server copy.
        assert!(c.is_dirty());
        assert!(armed(&done).is_some(), "diverged state schedules another cycle");

        let mut c = session(-5000);
        title(&mut c, "X", 0);
        // A user who retyped the normalized value converges without another request.
        title(&mut c, "X-normalized", 10);
        let done = c.on_save_succeeded(1, NoteFields::new("X-normalized", ""), 40);
        assert!(!c.is_dirty());
        assert_eq!(c.status(), SaveStatus::Clean);
        assert!(sent(&done).is_empty());
    }

    #[test]
    fn test_edit_during_flight_is_saved_after_response() {
        let mut c = session(-5000);
        title(&mut c, "one", 0);

        let during = title(&mut c, "one two", 100);
        assert!(sent(&during).is_empty(), "never two requests in flight");
        let (t, _) = armed(&during).expect("trailing timer while in flight");

        let done = c.on_save_succeeded(1, NoteFields::new("one", ""), 300);
        assert!(sent(&done).is_empty());
        assert!(armed(&done).is_none(), "existing timer kept");
        assert_eq!(c.status(), SaveStatus::Dirty);

        let fired = c.on_timer_fired(t, 1100);
        assert_eq!(sent(&fired), vec![(2, NoteFields::new("one two", ""))]);
    }

    #[test]
    fn test_timer_firing_during_flight_defers_to_response() {
        let mut c = session(-5000);
        title(&mut c, "a", 0);
        let during = title(&mut c, "ab", 10);
        let (t, _) = armed(&during).unwrap();

        // Slow request: the trailing timer fires before the response.
        let fired = c.on_timer_fired(t, 1010);
        assert!(sent(&fired).is_empty());

        let done = c.on_save_succeeded(1, NoteFields::new("a", ""), 1500);
        let saves = sent(&done);
        assert_eq!(saves, vec![(2, NoteFields::new("ab", ""))]);
        assert_eq!(c.in_flight().map(|p| p.ticket), Some(2));
    }

    #[test]
    fn test_failed_save_keeps_snapshot_and_stays_dirty() {
        let mut c = session(-5000);
        title(&mut c, "draft", 0);

        let failed = c.on_save_failed(1, 80);
        assert_eq!(c.synced(), &NoteFields::new("Untitled Note", ""));
        assert!(c.is_dirty());
        assert_eq!(c.status(), SaveStatus::Dirty);
        assert!(sent(&failed).is_empty());
        assert!(armed(&failed).is_none(), "default policy waits for the next edit");

        let next = title(&mut c, "draft!", 2000);
        assert_eq!(sent(&next), vec![(2, NoteFields::new("draft!", ""))]);
    }

    #[test]
    fn test_retry_policy_rearms_after_failure() {
        let config = AutosaveConfig {
            window_ms: W,
            retry: RetryPolicy::After { delay_ms: 5000 },
        };
        let mut c = AutosaveController::new("42", NoteFields::default(), config, -5000);
        title(&mut c, "t", 0);

        let failed = c.on_save_failed(1, 100);
        let (t, delay) = armed(&failed).expect("retry timer");
        assert_eq!(delay, 5000);

        let fired = c.on_timer_fired(t, 5100);
        assert_eq!(sent(&fired), vec![(2, NoteFields::new("t", ""))]);
    }

    #[test]
    fn test_failure_with_newer_edits_reschedules() {
        let mut c = session(-5000);
        title(&mut c, "v1", 0);
        let during = title(&mut c, "v2", 20);
        let (t, _) = armed(&during).unwrap();
        assert!(c.on_timer_fired(t, 1020).is_empty());

        let failed = c.on_save_failed(1, 1500);
        assert_eq!(sent(&failed), vec![(2, NoteFields::new("v2", ""))]);
    }

    #[test]
    fn test_stale_responses_are_ignored() {
        let mut c = session(-5000);
        title(&mut c, "x", 0);

        assert!(c.on_save_succeeded(99, NoteFields::new("bogus", ""), 10).is_empty());
        assert!(c.on_save_failed(99, 10).is_empty());
        assert_eq!(c.in_flight().map(|p| p.ticket), Some(1));

        c.on_save_succeeded(1, NoteFields::new("x", ""), 20);
        // A duplicate delivery of the same response is stale too.
        assert!(c.on_save_succeeded(1, NoteFields::new("old", ""), 30).is_empty());
        assert_eq!(c.synced().title, "x");
    }

    #[test]
    fn test_reverting_to_synced_cancels_pending_timer() {
        let mut c = session(0);
        let a = title(&mut c, "changed", 100);
        let (t, _) = armed(&a).unwrap();

        let b = title(&mut c, "Untitled Note", 200);
        assert!(b.contains(&AutosaveAction::CancelTimer { timer: t }));
        assert_eq!(c.status(), SaveStatus::Clean);
        assert!(c.on_timer_fired(t, 1100).is_empty());
    }

    #[test]
    fn test_status_changes_are_reported_once() {
        let mut c = session(0);
        let a = title(&mut c, "a", 10);
        let b = title(&mut c, "ab", 20);
        let changes = |xs: &[AutosaveAction]| {
            xs.iter()
                .filter(|x| matches!(x, AutosaveAction::StatusChanged(_)))
                .count()
        };
        assert_eq!(changes(&a), 1);
        assert_eq!(changes(&b), 0);
        assert_eq!(SaveStatus::Dirty.label(), "Saving...");
        assert_eq!(SaveStatus::Clean.label(), "Changes saved.");
    }

    #[test]
    fn test_end_session_refreshes_once_and_cancels_timer() {
        let mut c = session(0);
        let a = title(&mut c, "x", 10);
        let (t, _) = armed(&a).unwrap();

        let end = c.end_session();
        assert!(end.contains(&AutosaveAction::CancelTimer { timer: t }));
        assert_eq!(
            end.iter()
                .filter(|x| **x == AutosaveAction::RefreshDerived { note_id: "42".to_string() })
                .count(),
            1
        );
        assert!(c.end_session().is_empty());
        assert!(c.on_timer_fired(t, 1010).is_empty());
        assert!(title(&mut c, "ignored", 2000).is_empty());
        assert_eq!(c.editable().title, "x");
    }

    #[test]
    fn test_end_session_refreshes_even_when_clean() {
        let mut c = session(0);
        assert_eq!(refreshes(&c.end_session()), 1);
    }

    #[test]
    fn test_in_flight_response_applies_after_end_without_rescheduling() {
        let mut c = session(-5000);
        title(&mut c, "last words", 0);
        title(&mut c, "last words!", 5);
        c.end_session();

        let done = c.on_save_succeeded(1, NoteFields::new("last words", ""), 200);
        assert_eq!(c.synced().title, "last words");
        assert!(sent(&done).is_empty());
        assert!(armed(&done).is_none());
    }

    #[test]
    fn test_page_hide_does_not_touch_save_state() {
        let mut c = session(0);
        let a = title(&mut c, "x", 10);
        let (t, _) = armed(&a).unwrap();

        let hide = c.on_page_hide();
        assert_eq!(hide, vec![AutosaveAction::RefreshDerived { note_id: "42".to_string() }]);
        assert_eq!(refreshes(&c.on_page_hide()), 1);
        assert_eq!(c.status(), SaveStatus::Dirty);

        let fired = c.on_timer_fired(t, 1010);
        assert_eq!(sent(&fired).len(), 1);
    }
}
