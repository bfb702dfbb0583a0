// ABOUTME: WebArticle strategy: readable text from an HTML page.
// ABOUTME: Prefers the first <article> element, falling back to every <p> in document order.

use ego_tree::NodeRef;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};

use crate::request::SourceKind;
use crate::result::ExtractionResult;

static ARTICLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

/// Elements whose boundaries start a new line of text.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "details", "div", "dl", "dt",
    "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li",
    "main", "nav", "ol", "p", "pre", "section", "summary", "table", "td", "th", "tr", "ul",
];

/// Elements whose text is never part of the article.
const SKIP_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Run the WebArticle strategy over raw HTML.
pub fn extract(html: &str) -> ExtractionResult {
    let doc = Html::parse_document(html);
    ExtractionResult::from_text(SourceKind::WebArticle, article_text(&doc))
}

/// Text of the first `<article>`, or of every `<p>` if there is none.
///
/// An `<article>` that holds no text still wins over the paragraphs.
pub fn article_text(doc: &Html) -> String {
    if let Some(article) = doc.select(&ARTICLE_SELECTOR).next() {
        return block_text(article);
    }

    doc.select(&PARAGRAPH_SELECTOR)
        .map(inline_text)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text of an element with block boundaries and `<br>` as line breaks.
fn block_text(element: ElementRef) -> String {
    let mut lines = Vec::new();
    let mut current = String::new();
    walk(*element, &mut lines, &mut current);
    flush_line(&mut lines, &mut current);
    lines.join("\n")
}

fn walk(node: NodeRef<Node>, lines: &mut Vec<String>, current: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => current.push_str(&**text),
            Node::Element(el) => {
                let tag = el.name();
                if SKIP_TAGS.contains(&tag) {
                    continue;
                }
                if tag == "br" {
                    flush_line(lines, current);
                    continue;
                }
                let is_block = BLOCK_TAGS.contains(&tag);
                if is_block {
                    flush_line(lines, current);
                }
                walk(child, lines, current);
                if is_block {
                    flush_line(lines, current);
                }
            }
            _ => {}
        }
    }
}

fn flush_line(lines: &mut Vec<String>, current: &mut String) {
    let line = collapse_whitespace(current);
    if !line.is_empty() {
        lines.push(line);
    }
    current.clear();
}

/// Single-line text of a paragraph.
fn inline_text(element: ElementRef) -> String {
    let mut raw = String::new();
    collect_inline(*element, &mut raw);
    collapse_whitespace(&raw)
}

fn collect_inline(node: NodeRef<Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&**text),
            Node::Element(el) if SKIP_TAGS.contains(&el.name()) => {}
            Node::Element(el) if el.name() == "br" => out.push(' '),
            Node::Element(_) => collect_inline(child, out),
            _ => {}
        }
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
