use std::sync::LazyLock;

use icu_normalizer::ComposingNormalizerBorrowed;
use regex::Regex;

static START_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\*\*\* START OF (?:THIS|THE) PROJECT GUTENBERG EBOOK .+ \*\*\*").unwrap()
});
static END_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\*\*\* END OF (?:THIS|THE) PROJECT GUTENBERG EBOOK .+ \*\*\*").unwrap()
});
static TRAILING_LICENSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\n\n\s*End of (?:the |this )?Project Gutenberg.*$").unwrap()
});
static LEADING_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ims)^.*?Project Gutenberg.*?\n\n").unwrap());
static AUTHOR_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-z]+ [A-Z][a-z]+$").unwrap());
static BY_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^by\s+").unwrap());

/// Lines scanned for title and author.
const METADATA_LINES: usize = 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CleanedText {
    pub text: String,
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Normalise line endings, tabs and Unicode composition so that every char of
/// the result is one keystroke.
pub fn normalize(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n").replace('\t', "  ");
    ComposingNormalizerBorrowed::new_nfc()
        .normalize(&text)
        .into_owned()
}

/// Cut the book body out of a Project Gutenberg file. Text without markers
/// falls back to stripping the usual header and licence paragraphs.
pub fn strip_gutenberg(text: &str) -> String {
    let start_match = START_MARKER.find(text);
    let end_match = END_MARKER.find(text);

    let start = start_match.map(|m| m.end()).unwrap_or(0);
    let end = end_match
        .map(|m| m.start())
        .filter(|&end| end >= start)
        .unwrap_or(text.len());
    let mut body = text[start..end].trim().to_string();

    if start_match.is_none() || end_match.is_none() {
        body = TRAILING_LICENSE.replace(&body, "").into_owned();
        body = LEADING_HEADER.replace(&body, "").into_owned();
    }
    body
}

fn looks_like_title(line: &str) -> bool {
    let len = line.chars().count();
    len > 10
        && len < 100
        && line.starts_with(|c: char| c.is_ascii_uppercase())
        && !line.contains("Project Gutenberg")
        && !line.contains("Copyright")
}

fn looks_like_author(line: &str) -> bool {
    line.contains("by ") || AUTHOR_NAME.is_match(line)
}

/// Guess title and author from the first lines of a cleaned book.
pub fn extract_metadata(text: &str) -> (Option<String>, Option<String>) {
    let mut title = None;
    let mut author = None;

    for line in text.lines().take(METADATA_LINES).map(str::trim) {
        if title.is_none() && looks_like_title(line) {
            title = Some(line.to_string());
        }
        if author.is_none() && looks_like_author(line) {
            author = Some(BY_PREFIX.replace(line, "").into_owned());
        }
    }
    (title, author)
}

pub fn clean_text(raw: &str) -> CleanedText {
    let text = strip_gutenberg(&normalize(raw));
    let (title, author) = extract_metadata(&text);
    CleanedText {
        text: text.trim().to_string(),
        title,
        author,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUTENBERG: &str = "The Project Gutenberg eBook of Emma\r\n\r\n\
*** START OF THE PROJECT GUTENBERG EBOOK EMMA ***\r\n\r\n\
EMMA: A NOVEL IN THREE VOLUMES\r\n\
Jane Austen\r\n\r\n\
Emma Woodhouse, handsome, clever, and rich.\r\n\r\n\
*** END OF THE PROJECT GUTENBERG EBOOK EMMA ***\r\n\
Licence text.\r\n";

    #[test]
    fn test_normalize_line_endings_and_tabs() {
        assert_eq!(normalize("a\r\nb\rc\td"), "a\nb\nc  d");
    }

    #[test]
    fn test_normalize_composes_accents() {
        // "e" + combining acute accent becomes a single char.
        let text = normalize("caf\u{0065}\u{0301}");
        assert_eq!(text, "caf\u{00e9}");
        assert_eq!(text.chars().count(), 4);
    }

    #[test]
    fn test_strip_between_markers() {
        let cleaned = clean_text(GUTENBERG);
        assert!(cleaned.text.starts_with("EMMA: A NOVEL"));
        assert!(cleaned.text.ends_with("clever, and rich."));
        assert!(!cleaned.text.contains("Licence"));
    }

    #[test]
    fn test_metadata_heuristics() {
        let cleaned = clean_text(GUTENBERG);
        assert_eq!(cleaned.title.as_deref(), Some("EMMA: A NOVEL IN THREE VOLUMES"));
        assert_eq!(cleaned.author.as_deref(), Some("Jane Austen"));
    }

    #[test]
    fn test_author_by_prefix_is_removed() {
        let (_, author) = extract_metadata("Some Long Title Here\nby Mary Shelley\n");
        assert_eq!(author.as_deref(), Some("Mary Shelley"));
    }

    #[test]
    fn test_fallback_strips_trailing_licence() {
        let text = "Body paragraph one.\n\nBody two.\n\nEnd of the Project Gutenberg EBook\nmore licence";
        assert_eq!(strip_gutenberg(text), "Body paragraph one.\n\nBody two.");
    }

    #[test]
    fn test_plain_text_passes_through() {
        let cleaned = clean_text("  just some words\n");
        assert_eq!(cleaned.text, "just some words");
        assert_eq!(cleaned.title, None);
    }
}
