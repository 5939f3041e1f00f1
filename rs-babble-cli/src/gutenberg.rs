//! Cleanup of Project Gutenberg plain-text books.
//!
//! Link to Project Gutenberg: https://www.gutenberg.org/

const BOOK_START: &str = "*** START OF THE PROJECT GUTENBERG EBOOK";
const BOOK_END: &str = "*** END OF THE PROJECT GUTENBERG EBOOK";

/// Extracts the prose of a book as a list of paragraphs.
///
/// # Behavior
/// - Keeps only the text between the Gutenberg start and end markers.
///   A text without a start marker is kept whole.
/// - Drops lines starting with `_`, the `CONTENTS` caption and
///   `chapter N` / `letter N` headings.
/// - Joins hard-wrapped lines; blank lines separate paragraphs.
pub fn paragraphs(text: &str) -> Vec<String> {
    let mut lines = text.lines();
    if text.lines().any(|line| line.starts_with(BOOK_START)) {
        lines.by_ref().find(|line| line.starts_with(BOOK_START));
    }

    join_paragraphs(
        lines
            .take_while(|line| !line.starts_with(BOOK_END))
            .filter(|line| !is_noise(line.trim())),
    )
}

/// Splits any text into paragraphs on blank lines, without the book cleanup.
///
/// Line endings may be `\n` or `\r\n`.
pub fn raw_paragraphs(text: &str) -> Vec<String> {
    join_paragraphs(text.lines())
}

fn join_paragraphs<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
            continue;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(line);
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    paragraphs
}

/// Lines that are structure rather than prose.
fn is_noise(line: &str) -> bool {
    if line.starts_with('_') || line == "CONTENTS" {
        return true;
    }
    is_heading(line)
}

/// `chapter 12`, `LETTER 3`, ... followed by anything.
fn is_heading(line: &str) -> bool {
    let lower = line.to_lowercase();
    let mut words = lower.split_whitespace();
    matches!(words.next(), Some("chapter" | "letter"))
        && words
            .next()
            .is_some_and(|number| number.starts_with(|c: char| c.is_ascii_digit()))
}
