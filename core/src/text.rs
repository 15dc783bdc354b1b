//! Text helpers shared by the completion engine and the key dispatch chain.

/// Zero-width and otherwise invisible marker characters that editors and
/// clipboards leave behind in input text.
const INVISIBLE: &[char] = &[
    '\u{200B}', // zero width space
    '\u{200C}', // zero width non-joiner
    '\u{200D}', // zero width joiner
    '\u{2060}', // word joiner
    '\u{FEFF}', // byte order mark
];

/// Remove invisible marker characters and surrounding whitespace.
pub fn clean(text: &str) -> String {
    let visible = text
        .chars()
        .filter(|c| !INVISIBLE.contains(c))
        .collect::<String>();

    visible.trim().to_owned()
}

/// Length of a string in characters, which is what minimum lengths and
/// ranking tie-breaks are measured in.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Strip `prefix` from the start of `text`, comparing characters by their
/// lowercase forms. Returns the remainder of `text` in its original case.
pub fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let mut chars = text.char_indices();

    for expected in prefix.chars() {
        let (_, actual) = chars.next()?;

        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }

    let offset = chars.next().map(|(i, _)| i).unwrap_or(text.len());

    Some(&text[offset..])
}

/// Byte offset of the start of the line containing `cursor`.
pub fn line_start(text: &str, cursor: usize) -> usize {
    text[..cursor].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

/// Byte offset of the end of the line containing `cursor`.
pub fn line_end(text: &str, cursor: usize) -> usize {
    text[cursor..].find('\n').map(|i| cursor + i).unwrap_or(text.len())
}

/// Byte offset of the start of the word before `cursor`.
pub fn word_start(text: &str, cursor: usize) -> usize {
    let before = text[..cursor].trim_end();

    before
        .rfind(char::is_whitespace)
        .map(|i| i + before[i..].chars().next().map_or(1, char::len_utf8))
        .unwrap_or(0)
}

/// Byte offset of the end of the word after `cursor`.
pub fn word_end(text: &str, cursor: usize) -> usize {
    let after = &text[cursor..];
    let skipped = after.len() - after.trim_start().len();

    after[skipped..]
        .find(char::is_whitespace)
        .map(|i| cursor + skipped + i)
        .unwrap_or(text.len())
}
