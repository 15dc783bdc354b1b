/// Terminal control sequences the editor emits.
pub enum Command {
    Clear,
    ClearAfterCursor,
    MoveCursorUp(usize),
    MoveCursorRight(usize),
    MoveCursorToAbsolute(usize, usize),
}

impl Command {
    pub fn sequence(&self) -> String {
        match *self {
            Command::Clear => "\x1b[2J".into(),
            Command::ClearAfterCursor => "\x1b[J".into(),
            Command::MoveCursorUp(n) => format!("\x1b[{}A", n),
            Command::MoveCursorRight(n) => format!("\x1b[{}C", n),
            Command::MoveCursorToAbsolute(row, col) => format!("\x1b[{};{}H", row, col),
        }
    }
}
