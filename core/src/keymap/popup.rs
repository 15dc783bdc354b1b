use super::{Action, Key, KeyPress};

/// The three completion popups an input box can show.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PopupKind {
    /// `@path` file references.
    FileReference,

    /// `/command` at the start of the input.
    Command,

    /// `#agent` mentions.
    Agent,
}

impl PopupKind {
    pub const ALL: [PopupKind; 3] = [PopupKind::FileReference, PopupKind::Command, PopupKind::Agent];

    pub fn trigger(self) -> char {
        match self {
            PopupKind::FileReference => '@',
            PopupKind::Command => '/',
            PopupKind::Agent => '#',
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            PopupKind::FileReference => 0,
            PopupKind::Command => 1,
            PopupKind::Agent => 2,
        }
    }
}

/// A popup trigger found at the cursor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Trigger {
    pub kind: PopupKind,

    /// Byte offset of the trigger character.
    pub start: usize,

    /// Text typed after the trigger character, up to the cursor.
    pub query: String,
}

impl Trigger {
    /// Find the popup trigger, if any, for the token ending at `cursor`.
    pub fn at(text: &str, cursor: usize) -> Option<Self> {
        let before = &text[..cursor];
        let start = before
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);

        let mut token = before[start..].chars();

        let kind = match token.next()? {
            '@' => PopupKind::FileReference,
            '#' => PopupKind::Agent,
            '/' if start == 0 => PopupKind::Command,
            _ => return None,
        };

        Some(Self {
            kind,
            start,
            query: token.as_str().to_owned(),
        })
    }

    /// Replace the trigger token with the chosen `item`. Returns the new text
    /// and cursor.
    pub fn complete(&self, text: &str, cursor: usize, item: &str) -> (String, usize) {
        let mut completed = String::with_capacity(text.len() + item.len() + 2);
        completed.push_str(&text[..self.start]);
        completed.push(self.kind.trigger());
        completed.push_str(item);
        completed.push(' ');

        let new_cursor = completed.len();
        completed.push_str(&text[cursor..]);

        (completed, new_cursor)
    }
}

/// Open/closed state, items and selection of one popup.
#[derive(Clone, Debug, Default)]
pub struct Popup {
    open: bool,
    items: Vec<String>,
    matches: Vec<String>,
    selected: usize,
}

impl Popup {
    /// Show `items`, filtered by `query`.
    pub fn open(&mut self, items: Vec<String>, query: &str) {
        self.items = items;
        self.open = true;
        self.selected = 0;
        self.filter(query);
    }

    /// Re-filter the items for an updated query.
    pub fn filter(&mut self, query: &str) {
        let query = query.to_lowercase();

        self.matches = self
            .items
            .iter()
            .filter(|item| item.to_lowercase().contains(&query))
            .cloned()
            .collect();

        if self.selected >= self.matches.len() {
            self.selected = 0;
        }
    }

    pub fn close(&mut self) {
        self.open = false;
        self.items.clear();
        self.matches.clear();
        self.selected = 0;
    }

    /// A popup with nothing to show counts as closed.
    pub fn is_open(&self) -> bool {
        self.open && !self.matches.is_empty()
    }

    pub fn matches(&self) -> &[String] {
        &self.matches
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_item(&self) -> Option<&str> {
        self.matches.get(self.selected).map(String::as_str)
    }

    /// Whether this popup, while open, takes `key`.
    pub fn recognizes(&self, key: &KeyPress) -> bool {
        self.is_open()
            && key.modifiers.is_empty()
            && matches!(key.key, Key::Up | Key::Down | Key::Enter | Key::Tab | Key::Escape)
    }

    pub(crate) fn handle(&mut self, kind: PopupKind, key: &KeyPress) -> Action {
        let len = self.matches.len();

        match key.key {
            Key::Up => {
                self.selected = (self.selected + len - 1) % len;
                Action::PopupSelect {
                    kind,
                    index: self.selected,
                }
            }
            Key::Down => {
                self.selected = (self.selected + 1) % len;
                Action::PopupSelect {
                    kind,
                    index: self.selected,
                }
            }
            Key::Enter | Key::Tab => {
                let item = self.selected_item().map(String::from).unwrap_or_default();
                self.close();
                Action::PopupAccept {
                    kind,
                    item,
                }
            }
            _ => {
                self.close();
                Action::PopupDismiss(kind)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<String> {
        vec!["src/main.rs".into(), "src/lib.rs".into(), "README.md".into()]
    }

    #[test]
    fn triggers() {
        assert_eq!(
            Trigger::at("look at @src/ma", 15),
            Some(Trigger {
                kind: PopupKind::FileReference,
                start: 8,
                query: "src/ma".into(),
            })
        );
        assert_eq!(Trigger::at("/he", 3).map(|t| t.kind), Some(PopupKind::Command));
        assert_eq!(Trigger::at("ask #rev", 8).map(|t| t.kind), Some(PopupKind::Agent));
        assert_eq!(Trigger::at("a/b", 3), None);
        assert_eq!(Trigger::at("echo /tmp", 9), None);
        assert_eq!(Trigger::at("mail me@host", 12), None);
        assert_eq!(Trigger::at("@file done", 10), None);
        assert_eq!(Trigger::at("", 0), None);
    }

    #[test]
    fn complete_replaces_token() {
        let text = "look at @src/ma please";
        let trigger = Trigger::at(text, 15).unwrap();

        let (completed, cursor) = trigger.complete(text, 15, "src/main.rs");

        assert_eq!(completed, "look at @src/main.rs  please");
        assert_eq!(&completed[..cursor], "look at @src/main.rs ");
    }

    #[test]
    fn filter_and_select() {
        let mut popup = Popup::default();
        popup.open(items(), "SRC");

        assert!(popup.is_open());
        assert_eq!(popup.matches(), ["src/main.rs", "src/lib.rs"]);

        let up = KeyPress::new(Key::Up);
        assert_eq!(
            popup.handle(PopupKind::FileReference, &up),
            Action::PopupSelect {
                kind: PopupKind::FileReference,
                index: 1,
            }
        );
        assert_eq!(popup.selected_item(), Some("src/lib.rs"));

        popup.filter("main");
        assert_eq!(popup.selected(), 0);

        popup.filter("nothing");
        assert!(!popup.is_open());
        assert!(!popup.recognizes(&up));
    }

    #[test]
    fn accept_and_dismiss_close() {
        let mut popup = Popup::default();
        popup.open(items(), "");

        assert_eq!(
            popup.handle(PopupKind::Command, &KeyPress::new(Key::Tab)),
            Action::PopupAccept {
                kind: PopupKind::Command,
                item: "src/main.rs".into(),
            }
        );
        assert!(!popup.is_open());

        popup.open(items(), "");
        assert_eq!(
            popup.handle(PopupKind::Agent, &KeyPress::new(Key::Escape)),
            Action::PopupDismiss(PopupKind::Agent)
        );
        assert!(!popup.is_open());
    }
}
