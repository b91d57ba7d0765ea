use regex::Regex;
use std::sync::LazyLock;

/// Marks the legal disclaimer that closes many article pages
pub const DISCLAIMER_MARKER: &str = "免责声明";

/// Marks the "responsible editor" attribution line
pub const EDITOR_MARKER: &str = "责任编辑";

/// Separator placed between surviving paragraphs before final cleanup
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

static TRAILING_DISCLAIMER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\s*免责声明：.*$").expect("disclaimer pattern"));

static TRAILING_EDITOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\s*【责任编辑.*$").expect("editor pattern"));

/// Collapses every whitespace run to a single space and trims both ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True for paragraphs that carry a disclaimer or editor attribution
/// rather than article text
pub fn is_boilerplate(paragraph: &str) -> bool {
    paragraph.contains(DISCLAIMER_MARKER) || paragraph.contains(EDITOR_MARKER)
}

/// Keeps non-empty, non-boilerplate paragraphs and joins them with a blank line
pub fn join_paragraphs<I, S>(paragraphs: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    paragraphs
        .into_iter()
        .filter_map(|p| {
            let text = p.as_ref().trim();
            (!text.is_empty() && !is_boilerplate(text)).then(|| text.to_string())
        })
        .collect::<Vec<_>>()
        .join(PARAGRAPH_SEPARATOR)
}

/// Cuts a trailing disclaimer block and a trailing editor block.
///
/// Each block runs from its label to the end of the text.
pub fn strip_trailing_boilerplate(text: &str) -> String {
    let text = TRAILING_DISCLAIMER.replace(text, "");
    TRAILING_EDITOR.replace(&text, "").into_owned()
}

/// Final cleanup applied to every extracted body
pub fn clean_article_text(text: &str) -> String {
    normalize_whitespace(&strip_trailing_boilerplate(text))
}
