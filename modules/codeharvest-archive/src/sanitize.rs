// Remove struck-through and "expired" content from markup before any
// pattern sees it. Works on the parsed DOM so nested deletion markers
// disappear together with everything inside them.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Node, Selector};

static STRUCK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("del, s, strike").expect("valid selector"));

static EXPIRED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)expired").expect("valid regex"));

static DOCUMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<html[\s>]").expect("valid regex"));

/// Strip `<del>`, `<s>` and `<strike>` subtrees and elide the word "expired"
/// (any case) from text. Fragments stay fragments: no `<html>`/`<body>`
/// wrapper is added to input that did not have one.
pub fn strip_expired_markup(markup: &str) -> String {
    let is_document = DOCUMENT_RE.is_match(markup);
    let mut doc = if is_document {
        Html::parse_document(markup)
    } else {
        Html::parse_fragment(markup)
    };

    let struck: Vec<_> = doc.select(&STRUCK).map(|el| el.id()).collect();
    for id in struck {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }

    let marked: Vec<_> = doc
        .tree
        .nodes()
        .filter(|n| matches!(n.value(), Node::Text(t) if EXPIRED_RE.is_match(t)))
        .map(|n| n.id())
        .collect();
    for id in marked {
        if let Some(mut node) = doc.tree.get_mut(id) {
            if let Node::Text(text) = node.value() {
                let cleaned = EXPIRED_RE.replace_all(&text.text, "").into_owned();
                text.text = cleaned.as_str().into();
            }
        }
    }

    if is_document {
        doc.html()
    } else {
        doc.root_element().inner_html()
    }
}
