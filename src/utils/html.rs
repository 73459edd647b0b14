// src/utils/html.rs

use ammonia::Builder;

/// Strips every HTML tag from user text before it is stored.
///
/// Text content is kept; `<script>` and `<style>` bodies are dropped entirely.
/// The result is plain text: entities produced by the cleaner are decoded again,
/// so `&` and `<` typed by the user come back unchanged.
pub fn strip_tags(input: &str) -> String {
    let cleaned = Builder::empty().clean(input).to_string();
    html_escape::decode_html_entities(&cleaned).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_markup_and_scripts() {
        assert_eq!(strip_tags("<b>Need</b> help"), "Need help");
        assert_eq!(strip_tags("hi<script>alert(1)</script>"), "hi");
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(strip_tags("Groceries in Rabat"), "Groceries in Rabat");
        assert_eq!(strip_tags("Fish & chips for kids"), "Fish & chips for kids");
        assert_eq!(strip_tags("Need 5 < 10 meals"), "Need 5 < 10 meals");
        assert_eq!(strip_tags("Owner's \"urgent\" request"), "Owner's \"urgent\" request");
    }

    #[test]
    fn entities_in_input_decode_to_text() {
        assert_eq!(strip_tags("&lt;b&gt;bold&lt;/b&gt;"), "<b>bold</b>");
    }
}
