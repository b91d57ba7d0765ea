use crate::parsers::text;
use scraper::{ElementRef, Html, Selector};

/// Compiles one of the built-in selectors
pub fn css(selector: &str) -> Selector {
    Selector::parse(selector).expect("built-in selectors are valid CSS")
}

/// One entry of an ordered fallback list: where to look and how to read it.
///
/// Only the first element matching `selector` is handed to `extract`, the same
/// way a WebDriver `find_element` would behave.
pub struct Probe<T> {
    pub label: &'static str,
    pub selector: Selector,
    pub extract: fn(ElementRef<'_>) -> Option<T>,
}

impl<T> Probe<T> {
    pub fn new(label: &'static str, extract: fn(ElementRef<'_>) -> Option<T>) -> Self {
        Self {
            label,
            selector: css(label),
            extract,
        }
    }

    fn run(&self, doc: &Html) -> Option<T> {
        let element = doc.select(&self.selector).next()?;
        (self.extract)(element)
    }
}

/// Tries each probe in order and commits to the first one that yields a value.
///
/// An earlier probe always wins over a later one, even when both would match.
pub fn probe_first<T>(doc: &Html, probes: &[Probe<T>]) -> Option<(&'static str, T)> {
    probes.iter().find_map(|probe| {
        let value = probe.run(doc)?;
        ::log::trace!("Probe '{}' matched", probe.label);
        Some((probe.label, value))
    })
}

/// All text below an element, whitespace collapsed
pub fn element_text(element: ElementRef<'_>) -> String {
    text::normalize_whitespace(&element.text().collect::<String>())
}

/// Elements whose content a browser never renders as text
const NON_RENDERED: [&str; 4] = ["script", "style", "noscript", "template"];

/// Elements that start a new line in rendered text
const LINE_BREAKING: [&str; 28] = [
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "ol", "p",
    "pre", "section", "table", "tr", "ul",
];

/// Text of an element as a browser would render it, whitespace collapsed.
///
/// Scripts and styles are skipped; inline markup adds no separator, block
/// elements do.
pub fn rendered_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_rendered(element, &mut out);
    text::normalize_whitespace(&out)
}

fn push_rendered(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            let name = child.value().name();
            if NON_RENDERED.contains(&name) {
                continue;
            }
            let breaks = LINE_BREAKING.contains(&name);
            if breaks {
                out.push('\n');
            }
            push_rendered(child, out);
            if breaks {
                out.push('\n');
            }
        }
    }
}

/// Text of the first element matching `selector` below `scope`
pub fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope.select(selector).next().map(element_text)
}

/// Text of the first element matching `selector` in the document
pub fn first_text_in(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector).next().map(element_text)
}

/// Non-empty collapsed text, or nothing
pub fn non_empty_text(element: ElementRef<'_>) -> Option<String> {
    let text = element_text(element);
    (!text.is_empty()).then_some(text)
}
