use std::sync::OnceLock;

use regex::Regex;

/// Internal-form message links: `t.me/c/<path>/<id>`, scheme optional.
fn internal_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:https?://)?t\.me/c/([A-Za-z0-9_]+/\d+)").expect("valid regex")
    })
}

/// Rewrite internal message links to the public `https://t.me/<path>` form.
///
/// Rewritten links no longer match, so applying this twice is a no-op.
pub fn rewrite_links(text: &str) -> String {
    internal_link_re()
        .replace_all(text, "https://t.me/$1")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_internal_links_with_and_without_scheme() {
        assert_eq!(
            rewrite_links("see t.me/c/alpha/12 now"),
            "see https://t.me/alpha/12 now"
        );
        assert_eq!(
            rewrite_links("https://t.me/c/1234567/89\nhttp://t.me/c/beta_x/1"),
            "https://t.me/1234567/89\nhttps://t.me/beta_x/1"
        );
    }

    #[test]
    fn leaves_other_text_untouched() {
        let text = "🧠 News\nhttps://t.me/alpha/12\nt.me/c/ broken and t.me/cx/1/2";
        assert_eq!(rewrite_links(text), text);
    }

    #[test]
    fn rewriting_is_idempotent() {
        let once = rewrite_links("a t.me/c/alpha/1 b https://t.me/c/99/2");
        assert_eq!(rewrite_links(&once), once);
    }
}
