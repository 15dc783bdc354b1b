use crate::editor::event::Event;
use ghostline_core::keymap::{Key, KeyPress, Modifiers};
use std::{collections::VecDeque, io};
use tokio::io::{AsyncRead, AsyncReadExt};

pub struct TerminalInput<I> {
    stdin: I,
    events: VecDeque<Event>,
    parser: vte::Parser,
}

impl<I> TerminalInput<I> {
    pub fn new(stdin: I) -> Self {
        Self {
            stdin,
            events: VecDeque::default(),
            parser: vte::Parser::new(),
        }
    }

    fn parse_input(&mut self, byte: u8) {
        struct Perform<'a> {
            events: &'a mut VecDeque<Event>,
        }

        impl Perform<'_> {
            fn key(&mut self, key: KeyPress) {
                self.events.push_back(Event::Key(key));
            }
        }

        impl vte::Perform for Perform<'_> {
            fn print(&mut self, c: char) {
                self.key(match c {
                    '\x7f' => KeyPress::new(Key::Backspace),
                    c => KeyPress::new(Key::Char(c)),
                });
            }

            fn execute(&mut self, byte: u8) {
                let key = match byte {
                    0 => {
                        self.events.push_back(Event::Eof);
                        return;
                    }
                    b'\r' => KeyPress::new(Key::Enter),
                    // Ctrl+J, which most terminals also send for Ctrl+Enter.
                    b'\n' => KeyPress::with(Key::Enter, Modifiers::CTRL),
                    b'\t' => KeyPress::new(Key::Tab),
                    0x08 => KeyPress::new(Key::Backspace),
                    0x01..=0x1a => KeyPress::ctrl((byte - 0x01 + b'a') as char),
                    0x1c..=0x1f => KeyPress::ctrl((byte - 0x1c + b'4') as char),
                    _ => {
                        log::debug!("unknown character: {}", byte);
                        return;
                    }
                };

                self.key(key);
            }

            fn csi_dispatch(
                &mut self,
                params: &vte::Params,
                intermediates: &[u8],
                ignore: bool,
                action: char,
            ) {
                let params = params
                    .iter()
                    .map(|param| param.first().copied().unwrap_or(0))
                    .collect::<Vec<u16>>();
                let modifiers = params.get(1).copied().map(decode_modifiers).unwrap_or_default();

                let key = match (action, params.first().copied().unwrap_or(0)) {
                    ('A', _) => Key::Up,
                    ('B', _) => Key::Down,
                    ('C', _) => Key::Right,
                    ('D', _) => Key::Left,
                    ('F', _) | ('~', 4) | ('~', 8) => Key::End,
                    ('H', _) | ('~', 1) | ('~', 7) => Key::Home,
                    ('Z', _) => {
                        self.key(KeyPress::with(Key::Tab, Modifiers::SHIFT));
                        return;
                    }
                    ('~', 2) => Key::Insert,
                    ('~', 3) => Key::Delete,
                    ('~', 5) => Key::PageUp,
                    ('~', 6) => Key::PageDown,
                    _ => {
                        log::debug!("CSI {:?} / {:?} / {} / {}", params, intermediates, ignore, action);
                        return;
                    }
                };

                self.key(KeyPress::with(key, modifiers));
            }

            fn esc_dispatch(&mut self, intermediates: &[u8], ignore: bool, byte: u8) {
                // Meta-prefixed keys.
                if intermediates.is_empty() && byte.is_ascii_graphic() {
                    self.key(KeyPress::alt(byte as char));
                } else {
                    log::debug!("ESC {:?} / {} / {}", intermediates, ignore, byte);
                }
            }
        }

        let mut perform = Perform {
            events: &mut self.events,
        };

        self.parser.advance(&mut perform, byte);
    }
}

/// Decode an xterm modifier parameter, which is one more than a bit set of
/// shift, alt, ctrl and meta.
fn decode_modifiers(param: u16) -> Modifiers {
    let bits = param.saturating_sub(1);

    Modifiers {
        shift: bits & 1 != 0,
        alt: bits & 2 != 0,
        ctrl: bits & 4 != 0,
        meta: bits & 8 != 0,
    }
}

impl<I: AsyncRead + Unpin> TerminalInput<I> {
    pub async fn next_event(&mut self) -> io::Result<Event> {
        let mut buf = [0; 1024];

        loop {
            // If there's at least 1 pending event, return it.
            if let Some(event) = self.events.pop_front() {
                return Ok(event);
            }

            // Grab some more input.
            let count = self.stdin.read(&mut buf).await?;

            if count == 0 {
                return Ok(Event::Eof);
            }

            // A lone escape byte is the escape key rather than the start of a
            // sequence.
            if buf[..count] == [0x1b] {
                self.events.push_back(Event::Key(KeyPress::new(Key::Escape)));
                continue;
            }

            // Parse any events from the input if any.
            for &byte in &buf[..count] {
                self.parse_input(byte);
            }
        }
    }
}
