//! Integration tests for the row navigator driving bound controls.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use swingset::binding::{BoundField, BoundSelection, BoundTextField, CursorContext, FieldContainer};
use swingset::cursor::{ColumnSpec, ColumnType, CursorOp, MemoryCursor, TabularCursor};
use swingset::navigator::{
    DataNavigator, EnablementPolicy, NavOutcome, NavState, NavigationDirection, NavigationHook,
    attach_navigation_selector,
};
use swingset::notice::{NoticeLevel, RecordingNotifier};
use swingset_core::SharedTaskQueue;

#[derive(Default)]
struct CountingHook {
    calls: Mutex<Vec<&'static str>>,
    deny_insert: AtomicBool,
}

impl CountingHook {
    fn count(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|call| **call == name).count()
    }
}

impl NavigationHook for CountingHook {
    fn allow_insertion(&self) -> bool {
        !self.deny_insert.load(Ordering::SeqCst)
    }

    fn perform_post_insert_ops(&self) {
        self.calls.lock().push("post_insert");
    }

    fn perform_pre_deletion_ops(&self) {
        self.calls.lock().push("pre_deletion");
    }

    fn perform_post_deletion_ops(&self) {
        self.calls.lock().push("post_deletion");
    }

    fn perform_post_update_ops(&self) {
        self.calls.lock().push("post_update");
    }

    fn perform_cancel_ops(&self) {
        self.calls.lock().push("cancel");
    }

    fn perform_refresh_ops(&self) {
        self.calls.lock().push("refresh");
    }

    fn perform_navigation_ops(&self, _direction: NavigationDirection) {
        self.calls.lock().push("navigation");
    }
}

struct Form {
    cursor: Arc<MemoryCursor>,
    notifier: Arc<RecordingNotifier>,
    context: Arc<CursorContext>,
    navigator: Arc<DataNavigator>,
    hook: Arc<CountingHook>,
    name: Arc<BoundTextField>,
}

fn people() -> Arc<MemoryCursor> {
    let cursor = MemoryCursor::new(vec![
        ColumnSpec::new("id", ColumnType::Integer).not_null(),
        ColumnSpec::new("name", ColumnType::VarChar),
        ColumnSpec::new("age", ColumnType::Integer),
    ]);
    for (id, name) in [(1, "Ada"), (2, "Brian"), (3, "Cleo"), (4, "Dmitri"), (5, "Eve")] {
        cursor.push_row([Some(id.to_string()), Some(name.to_string()), None]);
    }
    Arc::new(cursor)
}

fn form_at(row: usize) -> Form {
    let cursor = people();
    cursor.absolute(row).unwrap();
    let notifier = Arc::new(RecordingNotifier::new());
    let context = CursorContext::with_parts(
        cursor.clone(),
        Arc::new(SharedTaskQueue::new()),
        notifier.clone(),
    );
    let navigator = DataNavigator::new(context.clone());
    let hook = Arc::new(CountingHook::default());
    navigator.set_hook(hook.clone());

    let name = Arc::new(BoundTextField::new("name"));
    name.bind(context.clone(), "name").unwrap();
    context.process_events();

    Form {
        cursor,
        notifier,
        context,
        navigator,
        hook,
        name,
    }
}

#[test]
fn scenario_c_next_without_edits() {
    let f = form_at(2);
    assert_eq!(f.navigator.next(), NavOutcome::Done);
    f.context.process_events();

    assert_eq!(f.cursor.current_row().unwrap(), 3);
    assert_eq!(f.navigator.row_state().current_row, 3);
    let buttons = f.navigator.buttons();
    assert!(buttons.previous && buttons.first);
    assert_eq!(f.hook.count("post_update"), 0);
    assert_eq!(f.name.text(), "Cleo");
}

#[test]
fn scenario_d_add_on_last_row() {
    let f = form_at(5);
    assert_eq!(f.navigator.add(), NavOutcome::Done);
    f.context.process_events();

    let state = f.navigator.row_state();
    assert_eq!(state.nav_state(), NavState::Inserting);
    assert_eq!(state.row_count, 5);
    let buttons = f.navigator.buttons();
    assert!(!buttons.any_navigation());
    assert!(buttons.commit && buttons.undo);
    assert!(!buttons.add && !buttons.delete);
    assert_eq!(f.name.value(), None);
}

#[test]
fn scenario_e_undo_insert() {
    let f = form_at(5);
    f.navigator.add();
    f.name.edit(Some("Zed".to_string()));
    assert_eq!(f.navigator.undo(), NavOutcome::Done);
    f.context.process_events();

    assert_eq!(f.navigator.row_state().nav_state(), NavState::Browsing);
    assert_eq!(f.cursor.current_row().unwrap(), 5);
    assert_eq!(f.cursor.row_count().unwrap(), 5);
    assert_eq!(f.hook.count("cancel"), 1);
    assert_eq!(f.name.text(), "Eve");
}

#[test]
fn committed_insert_lands_on_last_row() {
    let f = form_at(2);
    f.navigator.add();
    f.cursor.set_column_text("id", Some("6")).unwrap();
    f.name.edit(Some("Finn".to_string()));
    assert!(f.context.is_row_modified());

    assert_eq!(f.navigator.commit(), NavOutcome::Done);
    f.context.process_events();

    assert!(!f.context.is_inserting());
    assert!(!f.context.is_row_modified());
    assert_eq!(f.cursor.row_count().unwrap(), 6);
    assert_eq!(f.cursor.current_row().unwrap(), 6);
    assert_eq!(f.name.text(), "Finn");
    assert_eq!(f.hook.count("post_insert"), 1);
}

#[test]
fn rejected_or_failed_insert_stays_inserting() {
    let f = form_at(1);
    f.navigator.add();
    f.hook.deny_insert.store(true, Ordering::SeqCst);
    assert_eq!(f.navigator.commit(), NavOutcome::Rejected);
    assert!(f.context.is_inserting());
    assert_eq!(f.notifier.count(NoticeLevel::Critical), 0);

    // `id` is NOT NULL and still empty.
    f.hook.deny_insert.store(false, Ordering::SeqCst);
    assert_eq!(f.navigator.commit(), NavOutcome::Failed);
    assert!(f.context.is_inserting());
    assert_eq!(f.notifier.count(NoticeLevel::Critical), 1);
    assert_eq!(f.cursor.row_count().unwrap(), 5);
}

#[test]
fn commit_failure_keeps_edits() {
    let f = form_at(3);
    f.name.edit(Some("Clio".to_string()));
    f.cursor.fail_next(CursorOp::Update);

    assert_eq!(f.navigator.commit(), NavOutcome::Failed);
    assert!(f.context.is_row_modified());
    assert_eq!(f.notifier.count(NoticeLevel::Critical), 1);
    assert_eq!(f.cursor.row_values(3).unwrap()[1].as_deref(), Some("Cleo"));

    assert_eq!(f.navigator.commit(), NavOutcome::Done);
    assert_eq!(f.cursor.row_values(3).unwrap()[1].as_deref(), Some("Clio"));
    assert_eq!(f.hook.count("post_update"), 1);
}

#[test]
fn undo_rereads_modified_row() {
    let f = form_at(3);
    f.name.edit(Some("Clio".to_string()));
    assert_eq!(f.navigator.undo(), NavOutcome::Done);

    assert!(!f.context.is_row_modified());
    assert_eq!(f.name.text(), "Cleo");
    assert_eq!(f.hook.count("cancel"), 1);
}

#[test]
fn delete_moves_to_following_row() {
    let f = form_at(2);
    assert_eq!(f.navigator.delete(), NavOutcome::Done);
    assert_eq!(f.cursor.row_count().unwrap(), 4);
    assert_eq!(f.cursor.current_row().unwrap(), 2);
    assert_eq!(f.name.text(), "Cleo");

    f.navigator.last();
    assert_eq!(f.navigator.delete(), NavOutcome::Done);
    assert_eq!(f.cursor.current_row().unwrap(), 3);
    assert_eq!(f.name.text(), "Dmitri");
    assert_eq!(f.hook.count("pre_deletion"), 2);
    assert_eq!(f.hook.count("post_deletion"), 2);
}

#[test]
fn declined_delete_changes_nothing() {
    let f = form_at(2);
    f.notifier.set_answer(false);
    assert_eq!(f.navigator.delete(), NavOutcome::Rejected);
    assert_eq!(f.cursor.row_count().unwrap(), 5);
    assert_eq!(f.notifier.count(NoticeLevel::Question), 1);
    assert_eq!(f.hook.count("pre_deletion"), 0);
}

#[test]
fn failed_delete_keeps_the_row() {
    let f = form_at(2);
    f.cursor.fail_next(CursorOp::Delete);
    assert_eq!(f.navigator.delete(), NavOutcome::Failed);

    assert_eq!(f.cursor.row_count().unwrap(), 5);
    assert_eq!(f.cursor.current_row().unwrap(), 2);
    assert_eq!(f.name.text(), "Brian");
    assert_eq!(f.notifier.count(NoticeLevel::Critical), 1);
    assert_eq!(f.hook.count("post_deletion"), 0);
    assert!(f.navigator.buttons().delete);
}

#[test]
fn failed_move_stays_on_the_row() {
    let f = form_at(2);
    f.cursor.fail_next(CursorOp::Navigate);
    assert_eq!(f.navigator.next(), NavOutcome::Failed);
    f.context.process_events();

    assert_eq!(f.cursor.current_row().unwrap(), 2);
    assert_eq!(f.name.text(), "Brian");
    assert_eq!(f.navigator.row_state().nav_state(), NavState::Browsing);
    assert!(!f.context.is_row_modified());
    assert!(!f.context.is_inserting());
    assert_eq!(f.hook.count("navigation"), 0);
    assert_eq!(f.notifier.count(NoticeLevel::Critical), 1);
    assert!(f.navigator.buttons().next);
}

#[test]
fn failed_search_snaps_selector_back() {
    let f = form_at(2);
    let picker: Arc<BoundSelection<i32>> = Arc::new(BoundSelection::new());
    picker
        .set_options(vec![1, 2, 5], vec!["Ada".into(), "Brian".into(), "Eve".into()])
        .unwrap();
    let _selector = attach_navigation_selector(&f.navigator, &picker, "id").unwrap();
    assert_eq!(picker.selected_mapping(), Some(2));

    f.cursor.fail_next(CursorOp::Navigate);
    let eve = picker.store().find_mapping(&5).unwrap();
    picker.select_item(eve.id());

    assert_eq!(f.cursor.current_row().unwrap(), 2);
    assert_eq!(f.name.text(), "Brian");
    assert_eq!(f.notifier.count(NoticeLevel::Critical), 1);
    assert!(!picker.is_selection_pending());
    assert_eq!(picker.selected_mapping(), Some(2));
    assert!(!f.cursor.signals().cursor_moved.is_blocked());
}

#[test]
fn input_errors_block_only_in_strict_mode() {
    let f = form_at(2);
    let age: Arc<BoundField<i32>> = Arc::new(BoundField::new("age"));
    age.bind(f.context.clone(), "age").unwrap();

    assert!(age.edit_text("forty").is_err());
    f.context.process_events();
    assert!(f.context.has_errors());
    assert!(!f.navigator.buttons().commit);
    assert_eq!(f.navigator.next(), NavOutcome::Blocked);

    f.navigator.set_policy(EnablementPolicy::Legacy);
    assert!(f.navigator.buttons().commit);
    assert_eq!(f.navigator.next(), NavOutcome::Done);
    assert!(!f.context.has_errors());
}

#[test]
fn refresh_runs_hook_and_resets_position() {
    let f = form_at(4);
    assert_eq!(f.navigator.refresh(), NavOutcome::Done);
    assert_eq!(f.cursor.current_row().unwrap(), 1);
    assert_eq!(f.name.text(), "Ada");
    assert_eq!(f.hook.count("refresh"), 1);

    f.cursor.fail_next(CursorOp::Execute);
    assert_eq!(f.navigator.refresh(), NavOutcome::Failed);
    assert_eq!(f.hook.count("refresh"), 1);
}

#[test]
fn buttons_changed_fires_only_on_change() {
    let f = form_at(2);
    let changes = Arc::new(AtomicUsize::new(0));
    let changes_clone = changes.clone();
    f.navigator.signals().buttons_changed.connect(move |_| {
        changes_clone.fetch_add(1, Ordering::SeqCst);
    });

    // Rows 2 and 3 of 5 enable the same buttons.
    f.navigator.next();
    f.context.process_events();
    assert_eq!(changes.load(Ordering::SeqCst), 0);

    f.navigator.last();
    assert_eq!(changes.load(Ordering::SeqCst), 1);
}

#[test]
fn many_notifications_one_refresh() {
    let f = form_at(1);
    let states = Arc::new(Mutex::new(Vec::new()));
    let states_clone = states.clone();
    f.navigator.signals().state_refreshed.connect(move |state| {
        states_clone.lock().push(*state);
    });

    f.cursor.next().unwrap();
    f.cursor.next().unwrap();
    f.cursor.refresh_row().unwrap();
    f.context.process_events();

    let states = states.lock();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].current_row, 3);
}

#[test]
fn add_blanks_registered_fields() {
    let f = form_at(1);
    let nickname = Arc::new(BoundTextField::new("nickname"));
    nickname.set_value(Some("left over".to_string()));
    f.navigator
        .set_field_container(Some(Arc::new(FieldContainer::new("form").with_field(nickname.clone()))));

    f.navigator.add();
    assert_eq!(nickname.value(), None);
}

#[test]
fn selector_navigates_and_follows() {
    let f = form_at(1);
    let picker: Arc<BoundSelection<i32>> = Arc::new(BoundSelection::new());
    picker
        .set_options(
            vec![1, 2, 3, 4, 5],
            ["Ada", "Brian", "Cleo", "Dmitri", "Eve"].map(String::from).to_vec(),
        )
        .unwrap();
    let selector = attach_navigation_selector(&f.navigator, &picker, "id").unwrap();
    assert_eq!(selector.column(), "id");
    assert_eq!(picker.selected_mapping(), Some(1));

    let cleo = picker.store().find_mapping(&3).unwrap();
    assert!(picker.select_item(cleo.id()));
    assert_eq!(f.cursor.current_row().unwrap(), 3);
    assert_eq!(f.name.text(), "Cleo");
    assert!(!f.context.is_row_modified());
    assert!(picker.is_selection_pending());
    assert_eq!(picker.selected_mapping(), None);

    f.context.process_events();
    assert!(!picker.is_selection_pending());
    assert_eq!(picker.selected_mapping(), Some(3));
    assert!(!picker.store().has_null_item());

    f.navigator.next();
    f.context.process_events();
    assert_eq!(picker.selected_mapping(), Some(4));

    // A dirty row blocks the jump and the picker snaps back.
    f.name.edit(Some("Dima".to_string()));
    let eve = picker.store().find_mapping(&5).unwrap();
    picker.select_item(eve.id());
    assert_eq!(f.cursor.current_row().unwrap(), 4);
    assert_eq!(picker.selected_mapping(), Some(4));

    drop(selector);
    assert_eq!(picker.signals().activated.connection_count(), 0);
}
