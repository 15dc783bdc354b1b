//! Inline history completion for chat-style input boxes.
//!
//! The crate is split along the seams of an input box:
//!
//! - [`store`]: the synchronous key-value contract that history, usage counts
//!   and settings are persisted through.
//! - [`history`]: recording submitted lines and walking back through them.
//! - [`completion`]: the debounced ghost-text engine that proposes the best
//!   continuation of what the user is typing.
//! - [`keymap`]: the ordered chain of key interceptors an input box runs on
//!   every key press.

pub mod completion;
mod error;
pub mod history;
pub mod keymap;
pub mod store;
pub mod text;

pub use crate::error::{Error, Result};

pub mod prelude {
    pub use crate::completion::{CompletionOptions, HistoryCompletion, Suggestion};
    pub use crate::history::{HistoryNavigator, HistoryOptions};
    pub use crate::keymap::{Action, Dispatch, InputState, KeyDispatcher, KeyPress};
    pub use crate::store::{MemoryStore, SqliteStore, Store};
}
