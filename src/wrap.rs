//! Greedy word wrapping for text boxes with a fixed character width.

/// Line width used for item, skill and actor descriptions
pub const DESCRIPTION_WIDTH: usize = 55;

/// Line width used for map dialog messages
pub const DIALOG_WIDTH: usize = 40;

/// Split `text` into lines of at most `width` characters.
///
/// Words are taken greedily; a word longer than `width` gets a line of its
/// own and is never split.
pub fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

/// Wrap `text` and join the lines with `\n`.
///
/// Returns `text` untouched when there is nothing to wrap or the width is
/// unusable.
pub fn wrap(text: &str, width: usize) -> String {
    if width == 0 || text.trim().is_empty() {
        return text.to_string();
    }
    wrap_lines(text, width).join("\n")
}
