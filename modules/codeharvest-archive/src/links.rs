use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Google's HTML results wrap every organic hit in `/url?q=<target>&...`.
static RESULT_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"/url\?q=([^&"'\s<>]+)"#).expect("valid regex"));

/// Percent-decode a `q=` value.
fn decode_target(raw: &str) -> Option<String> {
    url::form_urlencoded::parse(format!("q={raw}").as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
}

/// Extract up to `limit` organic result links from a search results page.
/// Only https targets are kept, search-engine self links are skipped,
/// fragments are stripped, duplicates removed, order preserved.
pub fn search_result_links(html: &str, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for cap in RESULT_LINK_RE.captures_iter(html) {
        if links.len() >= limit {
            break;
        }
        let Some(target) = decode_target(&cap[1]) else {
            continue;
        };
        let Ok(mut parsed) = url::Url::parse(&target) else {
            continue;
        };
        if parsed.scheme() != "https" {
            continue;
        }
        if parsed
            .host_str()
            .is_some_and(|h| h == "google.com" || h.ends_with(".google.com"))
        {
            continue;
        }
        parsed.set_fragment(None);
        let resolved = parsed.to_string();
        if seen.insert(resolved.clone()) {
            links.push(resolved);
        }
    }

    links
}
