//! Outbound message length limits and chunking
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Per-platform limits for daily posts and command replies

/// Discord message content limit (characters)
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;
/// Slack `chat.postMessage` text limit (characters)
pub const SLACK_MESSAGE_LIMIT: usize = 40_000;

/// Split text into pieces of at most `max_chars` characters.
///
/// Prefers line boundaries and never splits inside a UTF-8 character. Text that
/// already fits is returned as a single piece, unchanged. Blank lines that land
/// on a boundary are carried into the next piece as leading newlines.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    // Lines joined with '\n'; `None` until the first line is taken
    let mut current: Option<String> = None;
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = line.chars().count();

        if let Some(open) = current.as_mut() {
            if current_len + 1 + line_len <= max_chars {
                open.push('\n');
                open.push_str(line);
                current_len += 1 + line_len;
                continue;
            }
        } else if line_len <= max_chars {
            current = Some(line.to_string());
            current_len = line_len;
            continue;
        }

        let line = match current.take() {
            // Only blank lines so far: an empty message cannot be posted
            Some(blank) if blank.chars().all(|c| c == '\n') => format!("{blank}\n{line}"),
            Some(full) => {
                chunks.push(full);
                line.to_string()
            }
            None => line.to_string(),
        };

        let line_len = line.chars().count();
        if line_len <= max_chars {
            current = Some(line);
            current_len = line_len;
            continue;
        }

        let mut pieces = split_on_char_boundaries(&line, max_chars);
        // Keep the tail open so following short lines can join it
        if let Some(last) = pieces.pop() {
            chunks.extend(pieces);
            current_len = last.chars().count();
            current = Some(last);
        }
    }

    match current {
        // A trailing newline has nothing left to carry into
        Some(last) if last.chars().all(|c| c == '\n') && !chunks.is_empty() => {}
        Some(last) => chunks.push(last),
        None => {}
    }
    chunks
}

fn split_on_char_boundaries(line: &str, max_chars: usize) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for ch in line.chars() {
        if current_len + 1 > max_chars && !current.is_empty() {
            result.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push(ch);
        current_len += 1;
    }

    if !current.is_empty() {
        result.push(current);
    }
    result
}
