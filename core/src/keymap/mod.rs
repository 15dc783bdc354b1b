//! Key dispatch for an input box.
//!
//! Every key press runs through [`CHAIN`], a fixed, ordered list of stages.
//! The first stage that applies consumes the key and produces an [`Action`]
//! for the caller to carry out; the caller must then skip its default
//! handling of the key. If no stage applies the key is left to the default
//! (inserting characters, moving the cursor by one, and so on).
//!
//! Stages are evaluated independently for each key press against the current
//! input and flags. The only state carried between presses is the popups, the
//! history navigator, the permission mode and the composition guard, all of
//! which live in [`KeyDispatcher`].

use crate::{
    completion::HistoryCompletion,
    history::HistoryNavigator,
    store::Store,
    text,
};
use std::{sync::Arc, time::Instant};

mod composition;
mod mode;
mod popup;

pub use composition::{CompositionGuard, COMPOSITION_GRACE};
pub use mode::{PermissionMode, Provider, SendShortcut};
pub use popup::{Popup, PopupKind, Trigger};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };

    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };

    pub const ALT: Modifiers = Modifiers {
        alt: true,
        ..Modifiers::NONE
    };

    pub const META: Modifiers = Modifiers {
        meta: true,
        ..Modifiers::NONE
    };

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

/// A single key-down.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyPress {
    pub key: Key,
    pub modifiers: Modifiers,

    /// Set if the key arrived as part of an input-method composition.
    pub composing: bool,
}

impl KeyPress {
    pub fn new(key: Key) -> Self {
        Self::with(key, Modifiers::NONE)
    }

    pub fn with(key: Key, modifiers: Modifiers) -> Self {
        Self {
            key,
            modifiers,
            composing: false,
        }
    }

    pub fn ctrl(c: char) -> Self {
        Self::with(Key::Char(c), Modifiers::CTRL)
    }

    pub fn alt(c: char) -> Self {
        Self::with(Key::Char(c), Modifiers::ALT)
    }

    pub fn composing(self) -> Self {
        Self {
            composing: true,
            ..self
        }
    }

    fn is(&self, key: Key, modifiers: Modifiers) -> bool {
        self.key == key && self.modifiers == modifiers
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CursorMotion {
    LineStart,
    LineEnd,
    WordLeft,
    WordRight,
}

impl CursorMotion {
    /// New cursor position for this motion.
    pub fn apply(self, text: &str, cursor: usize) -> usize {
        match self {
            CursorMotion::LineStart => text::line_start(text, cursor),
            CursorMotion::LineEnd => text::line_end(text, cursor),
            CursorMotion::WordLeft => text::word_start(text, cursor),
            CursorMotion::WordRight => text::word_end(text, cursor),
        }
    }
}

/// What the caller should do with a consumed key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Action {
    MoveCursor(CursorMotion),
    PopupSelect {
        kind: PopupKind,
        index: usize,
    },
    PopupAccept {
        kind: PopupKind,
        item: String,
    },
    PopupDismiss(PopupKind),
    SetMode(PermissionMode),

    /// Replace the input with an accepted ghost suggestion.
    AcceptSuggestion(String),

    /// Replace the input with a history entry or the saved draft.
    Recall(String),
    Send,

    /// Consumed with nothing further to do.
    Noop,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Dispatch {
    Consumed {
        stage: Stage,
        action: Action,
    },
    Default,
}

impl Dispatch {
    pub fn is_consumed(&self) -> bool {
        matches!(self, Dispatch::Consumed { .. })
    }

    pub fn into_action(self) -> Option<Action> {
        match self {
            Dispatch::Consumed {
                action, ..
            } => Some(action),
            Dispatch::Default => None,
        }
    }
}

/// The input box as seen by the dispatch chain for one key press.
pub struct InputState<'a> {
    pub text: &'a str,

    /// Byte offset of the cursor in `text`.
    pub cursor: usize,
    pub provider: Provider,
    pub completion: Option<&'a HistoryCompletion>,
    pub now: Instant,
}

impl<'a> InputState<'a> {
    pub fn new(text: &'a str, cursor: usize) -> Self {
        Self {
            text,
            cursor,
            provider: Provider::default(),
            completion: None,
            now: Instant::now(),
        }
    }

    fn on_first_line(&self) -> bool {
        !self.text[..self.cursor].contains('\n')
    }

    fn on_last_line(&self) -> bool {
        !self.text[self.cursor..].contains('\n')
    }

    fn at_end(&self) -> bool {
        self.cursor == self.text.len()
    }
}

/// One link of the dispatch chain.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    CursorMovement,
    Popup(PopupKind),
    ModeCycle,
    AcceptSuggestion,
    HistoryNavigation,
    Send,
}

/// The dispatch chain, highest priority first.
pub const CHAIN: [Stage; 8] = [
    Stage::CursorMovement,
    Stage::Popup(PopupKind::FileReference),
    Stage::Popup(PopupKind::Command),
    Stage::Popup(PopupKind::Agent),
    Stage::ModeCycle,
    Stage::AcceptSuggestion,
    Stage::HistoryNavigation,
    Stage::Send,
];

impl Stage {
    /// Whether this stage consumes `key`.
    pub fn applies(self, dispatcher: &KeyDispatcher, key: &KeyPress, input: &InputState<'_>) -> bool {
        match self {
            Stage::CursorMovement => cursor_motion(key).is_some(),

            Stage::Popup(kind) => dispatcher.popup(kind).recognizes(key),

            Stage::ModeCycle => {
                input.provider == Provider::Claude && key.is(Key::Tab, Modifiers::SHIFT)
            }

            // Only a suggestion still visible after the cursor can be taken.
            Stage::AcceptSuggestion => {
                let accept_key = key.is(Key::Tab, Modifiers::NONE) || key.is(Key::Right, Modifiers::NONE);

                accept_key
                    && input.at_end()
                    && input
                        .completion
                        .map_or(false, |completion| completion.suffix_for(input.text).is_some())
            }

            Stage::HistoryNavigation => {
                let store = match dispatcher.history.as_deref() {
                    Some(store) => store,
                    None => return false,
                };

                if key.is(Key::Up, Modifiers::NONE) {
                    input.on_first_line() && dispatcher.navigator.has_older(store)
                } else if key.is(Key::Down, Modifiers::NONE) {
                    input.on_last_line() && dispatcher.navigator.is_active()
                } else {
                    false
                }
            }

            Stage::Send => {
                if key.key != Key::Enter
                    || key.composing
                    || dispatcher.composition.suppresses(input.now)
                {
                    return false;
                }

                match dispatcher.send_shortcut {
                    SendShortcut::Enter => key.modifiers.is_empty(),
                    SendShortcut::ModEnter => {
                        !key.modifiers.shift
                            && (key.modifiers.ctrl || key.modifiers.meta || key.modifiers.alt)
                    }
                }
            }
        }
    }

    /// Carry out the stage for a key it applies to.
    pub fn handle(self, dispatcher: &mut KeyDispatcher, key: &KeyPress, input: &InputState<'_>) -> Action {
        match self {
            Stage::CursorMovement => cursor_motion(key).map_or(Action::Noop, Action::MoveCursor),

            Stage::Popup(kind) => dispatcher.popups[kind.index()].handle(kind, key),

            Stage::ModeCycle => {
                dispatcher.mode = dispatcher.mode.next();
                Action::SetMode(dispatcher.mode)
            }

            Stage::AcceptSuggestion => input
                .completion
                .and_then(HistoryCompletion::apply_suggestion)
                .map_or(Action::Noop, Action::AcceptSuggestion),

            Stage::HistoryNavigation => {
                let recalled = match (key.key, dispatcher.history.clone()) {
                    (Key::Up, Some(store)) => dispatcher
                        .navigator
                        .older(&*store, input.text)
                        .map(String::from),
                    (Key::Down, _) => dispatcher.navigator.newer(),
                    _ => None,
                };

                recalled.map_or(Action::Noop, Action::Recall)
            }

            Stage::Send => {
                dispatcher.reset();
                Action::Send
            }
        }
    }
}

fn cursor_motion(key: &KeyPress) -> Option<CursorMotion> {
    let motion = match (key.key, key.modifiers) {
        (Key::Home, Modifiers::NONE) => CursorMotion::LineStart,
        (Key::Char('a'), Modifiers::CTRL) => CursorMotion::LineStart,
        (Key::End, Modifiers::NONE) => CursorMotion::LineEnd,
        (Key::Char('e'), Modifiers::CTRL) => CursorMotion::LineEnd,
        (Key::Left, Modifiers::CTRL) => CursorMotion::WordLeft,
        (Key::Char('b'), Modifiers::ALT) => CursorMotion::WordLeft,
        (Key::Right, Modifiers::CTRL) => CursorMotion::WordRight,
        (Key::Char('f'), Modifiers::ALT) => CursorMotion::WordRight,
        _ => return None,
    };

    Some(motion)
}

/// Runs key presses through the dispatch chain and keeps the state the
/// chain needs between presses.
pub struct KeyDispatcher {
    send_shortcut: SendShortcut,
    mode: PermissionMode,
    popups: [Popup; 3],
    navigator: HistoryNavigator,
    history: Option<Arc<dyn Store>>,
    composition: CompositionGuard,
}

impl KeyDispatcher {
    pub fn new(send_shortcut: SendShortcut) -> Self {
        Self {
            send_shortcut,
            mode: PermissionMode::default(),
            popups: Default::default(),
            navigator: HistoryNavigator::new(),
            history: None,
            composition: CompositionGuard::default(),
        }
    }

    /// Enable history navigation over the history kept in `store`.
    pub fn with_history(mut self, store: Arc<dyn Store>) -> Self {
        self.history = Some(store);
        self
    }

    pub fn send_shortcut(&self) -> SendShortcut {
        self.send_shortcut
    }

    pub fn set_send_shortcut(&mut self, send_shortcut: SendShortcut) {
        self.send_shortcut = send_shortcut;
    }

    pub fn mode(&self) -> PermissionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: PermissionMode) {
        self.mode = mode;
    }

    pub fn popup(&self, kind: PopupKind) -> &Popup {
        &self.popups[kind.index()]
    }

    pub fn popup_mut(&mut self, kind: PopupKind) -> &mut Popup {
        &mut self.popups[kind.index()]
    }

    /// The popup currently shown, if any.
    pub fn open_popup(&self) -> Option<(PopupKind, &Popup)> {
        PopupKind::ALL
            .iter()
            .map(|&kind| (kind, self.popup(kind)))
            .find(|(_, popup)| popup.is_open())
    }

    pub fn composition_start(&mut self) {
        self.composition.start();
    }

    pub fn composition_end(&mut self, at: Instant) {
        self.composition.end(at);
    }

    pub fn is_navigating_history(&self) -> bool {
        self.navigator.is_active()
    }

    /// Close popups and stop history navigation.
    pub fn reset(&mut self) {
        for popup in &mut self.popups {
            popup.close();
        }

        self.navigator.reset();
    }

    pub fn dispatch(&mut self, key: &KeyPress, input: &InputState<'_>) -> Dispatch {
        for stage in CHAIN {
            if stage.applies(self, key, input) {
                let action = stage.handle(self, key, input);
                log::trace!("{:?} consumed {:?}: {:?}", stage, key, action);

                return Dispatch::Consumed {
                    stage,
                    action,
                };
            }
        }

        Dispatch::Default
    }
}

#[cfg(test)]
mod tests;
