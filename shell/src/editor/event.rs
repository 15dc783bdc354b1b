use ghostline_core::keymap::KeyPress;

/// Enumeration of possible input events that could be received from the user.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Event {
    Key(KeyPress),
    Eof,
}
