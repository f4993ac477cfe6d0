//! Markdown → Telegram HTML, for sinks that only speak HTML parse mode.
//!
//! The generated digest uses a loose markdown dialect (`**bold**`, bare URLs,
//! `- ` bullets). Telegram HTML supports only `<b>`, `<i>`, `<code>`, `<pre>`,
//! `<a href>` and `<blockquote>`.

use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Fragments that must survive escaping and emphasis untouched
/// (code, links, URLs). Each is replaced by a NUL-delimited token.
struct Stash {
    tag: &'static str,
    items: Vec<String>,
}

impl Stash {
    fn new(tag: &'static str) -> Self {
        Self {
            tag,
            items: Vec::new(),
        }
    }

    fn put(&mut self, html: String) -> String {
        let token = format!("\0{}{}\0", self.tag, self.items.len());
        self.items.push(html);
        token
    }

    fn stash_all(
        &mut self,
        re: &Regex,
        text: &str,
        render: impl Fn(&Captures) -> String,
    ) -> String {
        re.replace_all(text, |caps: &Captures| self.put(render(caps)))
            .into_owned()
    }

    fn restore(&self, mut text: String) -> String {
        for (i, html) in self.items.iter().enumerate() {
            text = text.replace(&format!("\0{}{i}\0", self.tag), html);
        }
        text
    }
}

fn re(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("valid regex"))
}

fn code_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    re(&RE, r"(?s)```[A-Za-z0-9_]*\n?(.*?)```")
}

fn inline_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    re(&RE, r"`([^`\n]+)`")
}

fn md_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    re(&RE, r"\[([^\]\n]+)\]\(([^)\s]+)\)")
}

fn bare_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    re(&RE, r#"https?://[^\s<>()"]+"#)
}

/// Convert the digest's markdown subset to Telegram-compatible HTML.
pub fn markdown_to_telegram_html(input: &str) -> String {
    let mut stash = Stash::new("FRAG");

    let text = stash.stash_all(code_block_re(), input, |c| {
        format!("<pre>{}</pre>", escape_html(&c[1]))
    });
    let text = stash.stash_all(inline_code_re(), &text, |c| {
        format!("<code>{}</code>", escape_html(&c[1]))
    });
    let text = stash.stash_all(md_link_re(), &text, |c| {
        format!(
            r#"<a href="{}">{}</a>"#,
            escape_html(&c[2]),
            escape_html(&c[1])
        )
    });
    // Bare URLs often contain `_`, which would otherwise turn into italics.
    let text = stash.stash_all(bare_url_re(), &text, |c| escape_html(&c[0]));

    let escaped = escape_html(&text);

    let mut lines = Vec::new();
    for line in escaped.split('\n') {
        let mut l = convert_header_line(line);
        l = replace_delimited(&l, "**", "<b>", "</b>");
        l = replace_delimited(&l, "__", "<b>", "</b>");
        l = replace_single_delim(&l, '_', "<i>", "</i>");
        l = replace_single_delim(&l, '*', "<b>", "</b>");
        if let Some(rest) = l.strip_prefix("- ").or_else(|| l.strip_prefix("* ")) {
            l = format!("• {rest}");
        }
        if is_horizontal_rule(&l) {
            continue;
        }
        lines.push(l);
    }
    let mut out = convert_blockquotes(&lines.join("\n"));

    while out.contains("\n\n\n") {
        out = out.replace("\n\n\n", "\n\n");
    }

    stash.restore(out)
}

fn is_horizontal_rule(line: &str) -> bool {
    let t = line.trim();
    t.len() >= 3 && t.chars().all(|c| c == '-' || c == '*')
}

fn convert_header_line(line: &str) -> String {
    let hashes = line.bytes().take(6).take_while(|b| *b == b'#').count();
    match line[hashes..].strip_prefix(' ') {
        Some(rest) if hashes > 0 => format!("<b>{rest}</b>"),
        _ => line.to_string(),
    }
}

fn replace_delimited(text: &str, delim: &str, open: &str, close: &str) -> String {
    let mut out = String::new();
    let mut rest = text;
    while let Some(start) = rest.find(delim) {
        let after = &rest[start + delim.len()..];
        let Some(end) = after.find(delim) else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push_str(open);
        out.push_str(&after[..end]);
        out.push_str(close);
        rest = &after[end + delim.len()..];
    }
    out.push_str(rest);
    out
}

/// Single-character emphasis; doubled delimiters are left alone.
fn replace_single_delim(text: &str, delim: char, open: &str, close: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let is_single = |i: usize| {
        chars[i] == delim
            && !(i > 0 && chars[i - 1] == delim)
            && !(i + 1 < chars.len() && chars[i + 1] == delim)
    };

    let mut out = String::new();
    let mut i = 0usize;
    while i < chars.len() {
        if is_single(i) {
            if let Some(j) = (i + 1..chars.len()).find(|&j| is_single(j)) {
                out.push_str(open);
                out.extend(&chars[i + 1..j]);
                out.push_str(close);
                i = j + 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn convert_blockquotes(text: &str) -> String {
    let mut result: Vec<String> = Vec::new();
    let mut quoted: Vec<String> = Vec::new();

    let flush = |quoted: &mut Vec<String>, result: &mut Vec<String>| {
        if !quoted.is_empty() {
            result.push(format!("<blockquote>{}</blockquote>", quoted.join("\n")));
            quoted.clear();
        }
    };

    for line in text.split('\n') {
        if line == "&gt;" {
            quoted.push(String::new());
        } else if let Some(content) = line.strip_prefix("&gt; ") {
            quoted.push(content.to_string());
        } else {
            flush(&mut quoted, &mut result);
            result.push(line.to_string());
        }
    }
    flush(&mut quoted, &mut result);

    result.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_html() {
        let s = r#"<a href="x&y">"#;
        assert_eq!(escape_html(s), "&lt;a href=&quot;x&amp;y&quot;&gt;");
    }

    #[test]
    fn converts_bold_headings() {
        let html = markdown_to_telegram_html("**📰 Основные новости**\n\n🧠 Item");
        assert_eq!(html, "<b>📰 Основные новости</b>\n\n🧠 Item");
    }

    #[test]
    fn bare_urls_with_underscores_are_not_italicised() {
        let html = markdown_to_telegram_html("🧠 News\nhttps://t.me/some_chan_name/12");
        assert_eq!(html, "🧠 News\nhttps://t.me/some_chan_name/12");
    }

    #[test]
    fn converts_links_and_escapes_text() {
        let html = markdown_to_telegram_html("[a < b](https://example.com/x_y)");
        assert_eq!(html, r#"<a href="https://example.com/x_y">a &lt; b</a>"#);
    }

    #[test]
    fn keeps_code_contents_verbatim() {
        let md = "hi\n```rust\nlet x = '<b>';\n```\nand `a_b_c`";
        let html = markdown_to_telegram_html(md);
        assert!(html.contains("<pre>let x = '&lt;b&gt;';\n</pre>"));
        assert!(html.contains("<code>a_b_c</code>"));
    }

    #[test]
    fn converts_blockquotes_and_bullets() {
        let html = markdown_to_telegram_html("> hello\n> world\n- item\nok");
        assert_eq!(html, "<blockquote>hello\nworld</blockquote>\n• item\nok");
    }

    #[test]
    fn italic_and_collapsed_blank_lines() {
        let html = markdown_to_telegram_html("_quiet_\n\n\n\nnext\n---");
        assert_eq!(html, "<i>quiet</i>\n\nnext");
    }
}
