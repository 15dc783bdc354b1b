#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub use unix::{input::TerminalInput, output::TerminalOutput};
