/// Render markup to the text a reader would see. Wide lines so that tokens
/// are never split by wrapping.
pub fn visible_text(html: &str) -> String {
    html2text::from_read(html.as_bytes(), 400).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_tags_and_keeps_text() {
        let text = visible_text("<div><p>Use code <b>SPRING2025</b> now</p></div>");
        assert!(text.contains("SPRING2025"));
        assert!(!text.contains("<b>"));
    }

    #[test]
    fn script_bodies_are_not_visible() {
        let text = visible_text("<script>var HIDDEN1 = 1;</script><p>SHOWN1</p>");
        assert!(!text.contains("HIDDEN1"));
        assert!(text.contains("SHOWN1"));
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(visible_text("").trim().is_empty());
    }
}
