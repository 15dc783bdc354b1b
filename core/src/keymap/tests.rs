use super::*;
use crate::{
    completion::CompletionOptions,
    store::{self, MemoryStore},
};
use std::time::Duration;

fn enter() -> KeyPress {
    KeyPress::new(Key::Enter)
}

fn dispatch(dispatcher: &mut KeyDispatcher, key: KeyPress, text: &str) -> Dispatch {
    dispatcher.dispatch(&key, &InputState::new(text, text.len()))
}

fn history_store(entries: &[&str]) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store::write_history(&*store, &entries.iter().map(|s| s.to_string()).collect::<Vec<_>>()).unwrap();
    store
}

#[test]
fn plain_keys_fall_through() {
    let mut dispatcher = KeyDispatcher::new(SendShortcut::Enter);

    for key in [Key::Char('x'), Key::Left, Key::Backspace, Key::Up, Key::Tab] {
        assert_eq!(dispatch(&mut dispatcher, KeyPress::new(key), "text"), Dispatch::Default);
    }
}

#[test]
fn cursor_shortcuts() {
    let mut dispatcher = KeyDispatcher::new(SendShortcut::Enter);

    assert_eq!(
        dispatch(&mut dispatcher, KeyPress::ctrl('a'), "abc").into_action(),
        Some(Action::MoveCursor(CursorMotion::LineStart))
    );
    assert_eq!(
        dispatch(&mut dispatcher, KeyPress::new(Key::End), "abc").into_action(),
        Some(Action::MoveCursor(CursorMotion::LineEnd))
    );
    assert_eq!(
        dispatch(&mut dispatcher, KeyPress::alt('b'), "abc").into_action(),
        Some(Action::MoveCursor(CursorMotion::WordLeft))
    );
    assert_eq!(
        dispatch(&mut dispatcher, KeyPress::with(Key::Right, Modifiers::CTRL), "abc").into_action(),
        Some(Action::MoveCursor(CursorMotion::WordRight))
    );
}

#[test]
fn enter_mode_sends_on_plain_enter_only() {
    let mut dispatcher = KeyDispatcher::new(SendShortcut::Enter);

    assert_eq!(
        dispatch(&mut dispatcher, enter(), "hi"),
        Dispatch::Consumed {
            stage: Stage::Send,
            action: Action::Send,
        }
    );
    assert_eq!(dispatch(&mut dispatcher, KeyPress::with(Key::Enter, Modifiers::SHIFT), "hi"), Dispatch::Default);
    assert_eq!(dispatch(&mut dispatcher, KeyPress::with(Key::Enter, Modifiers::CTRL), "hi"), Dispatch::Default);
}

#[test]
fn mod_enter_mode_needs_a_modifier() {
    let mut dispatcher = KeyDispatcher::new(SendShortcut::ModEnter);

    assert_eq!(dispatch(&mut dispatcher, enter(), "hi"), Dispatch::Default);

    for modifiers in [Modifiers::CTRL, Modifiers::META, Modifiers::ALT] {
        assert_eq!(
            dispatch(&mut dispatcher, KeyPress::with(Key::Enter, modifiers), "hi").into_action(),
            Some(Action::Send)
        );
    }
}

#[test]
fn composition_blocks_send() {
    let mut dispatcher = KeyDispatcher::new(SendShortcut::Enter);
    let start = Instant::now();

    assert_eq!(dispatch(&mut dispatcher, enter().composing(), "日本"), Dispatch::Default);

    dispatcher.composition_start();
    let mut input = InputState::new("日本", "日本".len());
    input.now = start;
    assert_eq!(dispatcher.dispatch(&enter(), &input), Dispatch::Default);

    dispatcher.composition_end(start);
    input.now = start + Duration::from_millis(50);
    assert_eq!(dispatcher.dispatch(&enter(), &input), Dispatch::Default);

    input.now = start + Duration::from_millis(150);
    assert_eq!(dispatcher.dispatch(&enter(), &input).into_action(), Some(Action::Send));
}

#[test]
fn mode_cycle_only_for_claude() {
    let mut dispatcher = KeyDispatcher::new(SendShortcut::Enter);
    let shift_tab = KeyPress::with(Key::Tab, Modifiers::SHIFT);

    let mut input = InputState::new("", 0);
    assert_eq!(
        dispatcher.dispatch(&shift_tab, &input).into_action(),
        Some(Action::SetMode(PermissionMode::Plan))
    );
    assert_eq!(dispatcher.mode(), PermissionMode::Plan);

    input.provider = Provider::Codex;
    assert_eq!(dispatcher.dispatch(&shift_tab, &input), Dispatch::Default);
    assert_eq!(dispatcher.mode(), PermissionMode::Plan);
}

#[test]
fn open_popup_takes_enter_before_send() {
    let mut dispatcher = KeyDispatcher::new(SendShortcut::Enter);
    dispatcher
        .popup_mut(PopupKind::Command)
        .open(vec!["clear".into(), "help".into()], "he");

    assert_eq!(dispatcher.open_popup().map(|(kind, _)| kind), Some(PopupKind::Command));
    assert_eq!(
        dispatch(&mut dispatcher, enter(), "/he"),
        Dispatch::Consumed {
            stage: Stage::Popup(PopupKind::Command),
            action: Action::PopupAccept {
                kind: PopupKind::Command,
                item: "help".into(),
            },
        }
    );

    // Closed now, so Enter sends again.
    assert!(dispatcher.open_popup().is_none());
    assert_eq!(dispatch(&mut dispatcher, enter(), "/help ").into_action(), Some(Action::Send));
}

#[test]
fn popups_are_checked_in_order() {
    let mut dispatcher = KeyDispatcher::new(SendShortcut::Enter);
    dispatcher.popup_mut(PopupKind::Agent).open(vec!["reviewer".into()], "");
    dispatcher.popup_mut(PopupKind::FileReference).open(vec!["Cargo.toml".into()], "");

    assert_eq!(
        dispatch(&mut dispatcher, KeyPress::new(Key::Escape), "@").into_action(),
        Some(Action::PopupDismiss(PopupKind::FileReference))
    );
    assert_eq!(
        dispatch(&mut dispatcher, KeyPress::new(Key::Escape), "@").into_action(),
        Some(Action::PopupDismiss(PopupKind::Agent))
    );
    assert_eq!(dispatch(&mut dispatcher, KeyPress::new(Key::Escape), "@"), Dispatch::Default);
}

#[tokio::test(start_paused = true)]
async fn tab_accepts_ghost_suggestion() {
    let store = history_store(&["deploy staging"]);
    let completion = HistoryCompletion::new(store, CompletionOptions::default());
    let mut dispatcher = KeyDispatcher::new(SendShortcut::Enter);

    let tab = KeyPress::new(Key::Tab);
    let mut input = InputState::new("dep", 3);
    input.completion = Some(&completion);

    // No suggestion yet, so Tab is left alone.
    assert_eq!(dispatcher.dispatch(&tab, &input), Dispatch::Default);

    completion.update_query("dep");
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(
        dispatcher.dispatch(&tab, &input),
        Dispatch::Consumed {
            stage: Stage::AcceptSuggestion,
            action: Action::AcceptSuggestion("deploy staging".into()),
        }
    );
    assert!(!completion.has_suggestion());
}

#[tokio::test(start_paused = true)]
async fn right_arrow_accepts_only_at_end() {
    let store = history_store(&["deploy staging"]);
    let completion = HistoryCompletion::new(store, CompletionOptions::default());
    let mut dispatcher = KeyDispatcher::new(SendShortcut::Enter);

    completion.update_query("dep");
    tokio::time::sleep(Duration::from_millis(150)).await;

    let right = KeyPress::new(Key::Right);
    let mut input = InputState::new("dep", 1);
    input.completion = Some(&completion);
    assert_eq!(dispatcher.dispatch(&right, &input), Dispatch::Default);

    input.cursor = 3;
    assert_eq!(
        dispatcher.dispatch(&right, &input).into_action(),
        Some(Action::AcceptSuggestion("deploy staging".into()))
    );
}

#[tokio::test(start_paused = true)]
async fn stale_suggestion_is_not_accepted() {
    let store = history_store(&["deploy staging"]);
    let completion = HistoryCompletion::new(store, CompletionOptions::default());
    let mut dispatcher = KeyDispatcher::new(SendShortcut::Enter);
    let tab = KeyPress::new(Key::Tab);

    completion.update_query("dep");
    tokio::time::sleep(Duration::from_millis(150)).await;

    // Typed past the match before the next search landed.
    completion.update_query("depot");
    let mut input = InputState::new("depot", 5);
    input.completion = Some(&completion);
    assert_eq!(dispatcher.dispatch(&tab, &input), Dispatch::Default);

    // Cursor moved back into the text.
    let mut input = InputState::new("dep", 1);
    input.completion = Some(&completion);
    assert_eq!(dispatcher.dispatch(&tab, &input), Dispatch::Default);

    assert!(completion.has_suggestion());
}

#[tokio::test(start_paused = true)]
async fn popup_tab_wins_over_suggestion() {
    let store = history_store(&["@src/main.rs please"]);
    let completion = HistoryCompletion::new(store, CompletionOptions::default());
    let mut dispatcher = KeyDispatcher::new(SendShortcut::Enter);
    dispatcher
        .popup_mut(PopupKind::FileReference)
        .open(vec!["src/main.rs".into()], "src");

    completion.update_query("@src");
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(completion.has_suggestion());

    let mut input = InputState::new("@src", 4);
    input.completion = Some(&completion);

    assert_eq!(
        dispatcher.dispatch(&KeyPress::new(Key::Tab), &input).into_action(),
        Some(Action::PopupAccept {
            kind: PopupKind::FileReference,
            item: "src/main.rs".into(),
        })
    );
    assert!(completion.has_suggestion());
}

#[test]
fn history_navigation_walks_and_restores() {
    let store = history_store(&["first", "second"]);
    let mut dispatcher = KeyDispatcher::new(SendShortcut::Enter).with_history(store);
    let up = KeyPress::new(Key::Up);
    let down = KeyPress::new(Key::Down);

    // Down does nothing until navigation has started.
    assert_eq!(dispatch(&mut dispatcher, down, "draft"), Dispatch::Default);

    assert_eq!(dispatch(&mut dispatcher, up, "draft").into_action(), Some(Action::Recall("second".into())));
    assert!(dispatcher.is_navigating_history());
    assert_eq!(dispatch(&mut dispatcher, up, "second").into_action(), Some(Action::Recall("first".into())));
    assert_eq!(dispatch(&mut dispatcher, up, "first"), Dispatch::Default);

    assert_eq!(dispatch(&mut dispatcher, down, "first").into_action(), Some(Action::Recall("second".into())));
    assert_eq!(dispatch(&mut dispatcher, down, "second").into_action(), Some(Action::Recall("draft".into())));
    assert!(!dispatcher.is_navigating_history());
}

#[test]
fn history_navigation_respects_lines() {
    let store = history_store(&["first"]);
    let mut dispatcher = KeyDispatcher::new(SendShortcut::Enter).with_history(store);
    let up = KeyPress::new(Key::Up);

    // Cursor on the second line: Up moves within the input.
    let text = "line one\nline two";
    assert_eq!(dispatcher.dispatch(&up, &InputState::new(text, text.len())), Dispatch::Default);
    assert_eq!(
        dispatcher.dispatch(&up, &InputState::new(text, 3)).into_action(),
        Some(Action::Recall("first".into()))
    );
}

#[test]
fn send_ends_navigation() {
    let store = history_store(&["first"]);
    let mut dispatcher = KeyDispatcher::new(SendShortcut::Enter).with_history(store);

    dispatch(&mut dispatcher, KeyPress::new(Key::Up), "");
    assert!(dispatcher.is_navigating_history());

    assert_eq!(dispatch(&mut dispatcher, enter(), "first").into_action(), Some(Action::Send));
    assert!(!dispatcher.is_navigating_history());
}

#[test]
fn reset_closes_popups() {
    let mut dispatcher = KeyDispatcher::new(SendShortcut::Enter);
    dispatcher.popup_mut(PopupKind::Agent).open(vec!["planner".into()], "");
    assert!(dispatcher.open_popup().is_some());

    dispatcher.reset();
    assert!(dispatcher.open_popup().is_none());
    assert_eq!(dispatch(&mut dispatcher, enter(), "#planner ").into_action(), Some(Action::Send));
}

#[test]
fn cursor_motion_positions() {
    let text = "one two\nthree four";

    assert_eq!(CursorMotion::LineStart.apply(text, 12), 8);
    assert_eq!(CursorMotion::LineEnd.apply(text, 2), 7);
    assert_eq!(CursorMotion::WordLeft.apply(text, 7), 4);
    assert_eq!(CursorMotion::WordRight.apply(text, 8), 13);
}
