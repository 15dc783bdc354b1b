use crate::{
    buffer::Buffer,
    config::Config,
    editor::{command::Command, event::Event},
    os::{TerminalInput, TerminalOutput},
    popups::PopupSources,
};
use ghostline_core::{
    completion::HistoryCompletion,
    history,
    keymap::{Action, InputState, Key, KeyDispatcher, KeyPress, PopupKind, Trigger},
    store::Store,
};
use std::{io, os::unix::io::AsRawFd, sync::Arc, time::Instant};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use yansi::Paint;

pub mod command;
pub mod event;

/// Popup rows drawn below the input.
const POPUP_ROWS: usize = 8;

/// Controls the interactive command line editor.
pub struct Editor<I, O: AsRawFd> {
    stdin: TerminalInput<I>,
    stdout: TerminalOutput<O>,
    store: Arc<dyn Store>,
    completion: HistoryCompletion,
    suggestions: flume::Receiver<()>,
    dispatcher: KeyDispatcher,
    sources: PopupSources,
    config: Config,
    buffer: Buffer,

    /// Rows between the prompt line and the cursor at the last redraw.
    cursor_row: usize,
}

pub enum ReadLine {
    Input(String),
    Eof,
}

/// What a single input event asks the read loop to do.
enum Flow {
    Continue,
    Submit,
    Eof,
}

/// Whatever woke the read loop.
enum Wake {
    Input(io::Result<Event>),
    Suggestion,
}

impl<I, O: AsRawFd> Editor<I, O> {
    /// Create an editor. Must be called from within a tokio runtime.
    pub fn new(stdin: I, stdout: O, store: Arc<dyn Store>, config: Config, sources: PopupSources) -> io::Result<Self> {
        let completion = HistoryCompletion::new(store.clone(), config.completion.clone());
        let suggestions = completion.subscribe();
        let dispatcher = KeyDispatcher::new(config.send_shortcut).with_history(store.clone());

        Ok(Self {
            stdin: TerminalInput::new(stdin),
            stdout: TerminalOutput::new(stdout)?,
            store,
            completion,
            suggestions,
            dispatcher,
            sources,
            config,
            buffer: Buffer::new(),
            cursor_row: 0,
        })
    }

    pub fn completion(&self) -> &HistoryCompletion {
        &self.completion
    }

    pub fn dispatcher_mut(&mut self) -> &mut KeyDispatcher {
        &mut self.dispatcher
    }

    fn prompt(&self) -> String {
        format!("{} {} ", self.dispatcher.mode(), self.config.prompt)
    }

    fn handle_event(&mut self, event: Event) -> Flow {
        let key = match event {
            Event::Key(key) => key,
            Event::Eof => return Flow::Eof,
        };

        let dispatch = {
            let input = InputState {
                text: self.buffer.text(),
                cursor: self.buffer.cursor(),
                provider: self.config.provider,
                completion: Some(&self.completion),
                now: Instant::now(),
            };

            self.dispatcher.dispatch(&key, &input)
        };

        match dispatch.into_action() {
            Some(action) => self.apply(action),
            None => self.default_key(key),
        }
    }

    fn apply(&mut self, action: Action) -> Flow {
        match action {
            Action::MoveCursor(motion) => {
                let cursor = motion.apply(self.buffer.text(), self.buffer.cursor());
                self.buffer.move_cursor_to(cursor);
            }
            Action::PopupAccept {
                kind,
                item,
            } => {
                if let Some(trigger) = Trigger::at(self.buffer.text(), self.buffer.cursor()) {
                    if trigger.kind == kind {
                        let (text, cursor) = trigger.complete(self.buffer.text(), self.buffer.cursor(), &item);
                        self.buffer.set(text, cursor);
                        self.text_changed();
                    }
                }
            }
            Action::AcceptSuggestion(full) => {
                self.buffer.replace(full);
                self.refresh_popups();
            }
            Action::Recall(entry) => {
                self.completion.clear();
                self.buffer.replace(entry);
            }
            Action::Send => return Flow::Submit,
            Action::SetMode(mode) => log::debug!("permission mode is now {}", mode),
            Action::PopupSelect {
                ..
            }
            | Action::PopupDismiss(_)
            | Action::Noop => {}
        }

        Flow::Continue
    }

    /// Editing behavior for keys no stage consumed.
    fn default_key(&mut self, key: KeyPress) -> Flow {
        let modifiers = key.modifiers;

        match key.key {
            Key::Char('c') if modifiers.ctrl => {
                self.buffer.clear();
                self.dispatcher.reset();
                self.completion.clear();
            }
            Key::Char('d') if modifiers.ctrl => {
                if self.buffer.is_empty() {
                    return Flow::Eof;
                }

                self.buffer.delete_after_cursor();
                self.text_changed();
            }
            Key::Char(c) if !modifiers.ctrl && !modifiers.alt && !modifiers.meta => {
                self.buffer.insert_char(c);
                self.text_changed();
            }
            Key::Enter => {
                self.buffer.insert_char('\n');
                self.text_changed();
            }
            Key::Backspace => {
                self.buffer.delete_before_cursor();
                self.text_changed();
            }
            Key::Delete => {
                self.buffer.delete_after_cursor();
                self.text_changed();
            }
            Key::Left => {
                self.buffer.move_cursor_relative(-1);
            }
            Key::Right => {
                self.buffer.move_cursor_relative(1);
            }
            Key::Escape => self.completion.clear(),
            _ => log::trace!("unhandled key: {:?}", key),
        }

        Flow::Continue
    }

    fn text_changed(&mut self) {
        self.completion.update_query(self.buffer.text());
        self.refresh_popups();
    }

    /// Open the popup whose trigger is under the cursor and close the rest.
    fn refresh_popups(&mut self) {
        let trigger = Trigger::at(self.buffer.text(), self.buffer.cursor());

        for kind in PopupKind::ALL {
            match &trigger {
                Some(trigger) if trigger.kind == kind => {
                    let items = self.sources.items(kind, &trigger.query);
                    self.dispatcher.popup_mut(kind).open(items, &trigger.query);
                }
                _ => self.dispatcher.popup_mut(kind).close(),
            }
        }
    }
}

impl<I: AsyncRead + Unpin, O: AsyncWrite + AsRawFd + Unpin> Editor<I, O> {
    /// Show a command prompt to the user and await for the user to input a
    /// command. The typed command is returned once submitted.
    pub async fn read_line(&mut self) -> io::Result<ReadLine> {
        self.redraw().await?;
        self.stdout.set_raw_mode(true)?;

        let mut guard = scopeguard::guard(self, |editor| {
            if let Err(e) = editor.stdout.set_raw_mode(false) {
                log::warn!("failed to restore terminal mode: {}", e);
            }
        });
        let editor = &mut **guard;

        loop {
            let wake = tokio::select! {
                event = editor.stdin.next_event() => Wake::Input(event),
                Ok(()) = editor.suggestions.recv_async() => Wake::Suggestion,
            };

            let event = match wake {
                Wake::Input(event) => event?,
                Wake::Suggestion => {
                    editor.redraw().await?;
                    continue;
                }
            };

            log::trace!("event: {:?}", event);

            match editor.handle_event(event) {
                Flow::Continue => editor.redraw().await?,
                Flow::Submit => break,
                Flow::Eof => {
                    editor.finish_line().await?;
                    return Ok(ReadLine::Eof);
                }
            }
        }

        let text = editor.buffer.take_text();

        // Keep the submitted text on screen without a ghost or popups.
        editor.buffer.insert_str(&text);
        editor.dispatcher.reset();
        editor.completion.clear();
        editor.finish_line().await?;
        editor.buffer.clear();

        if let Err(e) = history::record(&*editor.store, &text, &editor.config.history) {
            log::warn!("failed to record history: {}", e);
        }

        Ok(ReadLine::Input(text))
    }

    /// Draw the line one last time with the cursor at the end, then move to
    /// a fresh line.
    async fn finish_line(&mut self) -> io::Result<()> {
        let end = self.buffer.text().len();
        self.buffer.move_cursor_to(end);
        self.redraw().await?;
        self.cursor_row = 0;
        self.stdout.write_all(b"\r\n").await?;
        self.stdout.flush().await
    }

    pub async fn clear_screen(&mut self) -> io::Result<()> {
        self.stdout.command(Command::Clear).await?;
        self.stdout.command(Command::MoveCursorToAbsolute(1, 1)).await?;
        self.cursor_row = 0;
        self.stdout.flush().await
    }

    /// Redraw the prompt, the buffer, the ghost suffix and any open popup.
    pub async fn redraw(&mut self) -> io::Result<()> {
        let prompt = self.prompt();
        let text = self.buffer.text();
        let cursor = self.buffer.cursor();
        let open_popup = self.dispatcher.open_popup();

        let ghost = if open_popup.is_none() && self.buffer.cursor_is_at_end_of_line() {
            self.completion.suffix_for(text).unwrap_or_default()
        } else {
            String::new()
        };

        let mut out = String::new();

        if self.cursor_row > 0 {
            out.push_str(&Command::MoveCursorUp(self.cursor_row).sequence());
        }

        out.push('\r');
        out.push_str(&Command::ClearAfterCursor.sequence());
        out.push_str(&format!("{}", Paint::blue(&prompt)));
        out.push_str(&text.replace('\n', "\r\n"));

        // Render the ghost suggestion.
        if !ghost.is_empty() {
            out.push_str(&format!("{}", Paint::new(ghost.replace('\n', "\r\n")).dimmed()));
        }

        let mut rows = text.matches('\n').count() + ghost.matches('\n').count();

        if let Some((kind, popup)) = open_popup {
            for (i, item) in popup.matches().iter().enumerate().take(POPUP_ROWS) {
                let label = format!("{}{}", kind.trigger(), item);

                out.push_str("\r\n");
                if i == popup.selected() {
                    out.push_str(&format!("  {}", Paint::new(label).invert()));
                } else {
                    out.push_str(&format!("  {}", label));
                }

                rows += 1;
            }
        }

        // Update the cursor position.
        let before = &text[..cursor];
        let cursor_row = before.matches('\n').count();
        let cursor_col = match before.rfind('\n') {
            Some(i) => before[i + 1..].chars().count(),
            None => prompt.chars().count() + before.chars().count(),
        };

        if rows > cursor_row {
            out.push_str(&Command::MoveCursorUp(rows - cursor_row).sequence());
        }

        out.push('\r');
        if cursor_col > 0 {
            out.push_str(&Command::MoveCursorRight(cursor_col).sequence());
        }

        self.cursor_row = cursor_row;

        self.stdout.write_all(out.as_bytes()).await?;
        self.stdout.flush().await
    }
}
