//! Turns wiki markup and the HTML subset Atlassian products emit into
//! terminal text.

use colored::*;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static WIKI_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^h([1-6])\.\s*(.+)$").unwrap());
static WIKI_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*\n]+)\*").unwrap());
static WIKI_MONOSPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{([^}]+)\}\}").unwrap());

static CDATA: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").unwrap());
static HTML_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<h([1-6])[^>]*>(.*?)</h[1-6]>").unwrap());
static STRONG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<(?:strong|b)(?:\s[^>]*)?>(.*?)</(?:strong|b)>").unwrap());
static EMPHASIS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<(?:em|i)(?:\s[^>]*)?>(.*?)</(?:em|i)>").unwrap());
static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<a[^>]*href=["']([^"']*)["'][^>]*>(.*?)</a>"#).unwrap());
static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"<br[^>]*>").unwrap());
static PARAGRAPH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<p(?:\s[^>]*)?>(.*?)</p>").unwrap());
static LIST_EDGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?(?:ul|ol)[^>]*>").unwrap());
static LIST_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<li(?:\s[^>]*)?>(.*?)</li>").unwrap());
static CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<code(?:\s[^>]*)?>(.*?)</code>").unwrap());
static DIV_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"</div>").unwrap());
static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn heading(level: &str, text: &str) -> String {
    let marker = "#".repeat(level.parse::<usize>().unwrap_or(1));
    let line = format!("{} {}", marker, text.trim());
    if level == "1" || level == "2" {
        line.cyan().bold().to_string()
    } else {
        line.blue().bold().to_string()
    }
}

fn monospace(text: &str) -> String {
    format!(" {} ", text).bright_black().on_white().to_string()
}

pub fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Colored rendering of a ticket description or comment body.
pub fn format_markup(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }

    let text = WIKI_HEADING.replace_all(content, |c: &Captures| heading(&c[1], &c[2]));
    let text = WIKI_BOLD.replace_all(&text, |c: &Captures| c[1].yellow().bold().to_string());
    let text = WIKI_MONOSPACE.replace_all(&text, |c: &Captures| monospace(&c[1]));

    let text = HTML_HEADING.replace_all(&text, |c: &Captures| format!("\n{}\n", heading(&c[1], &c[2])));
    let text = STRONG.replace_all(&text, |c: &Captures| format!("**{}**", &c[1]).yellow().to_string());
    let text = EMPHASIS.replace_all(&text, |c: &Captures| format!("*{}*", &c[1]).yellow().to_string());
    let text = LINK.replace_all(&text, |c: &Captures| {
        format!("[{}]({})", &c[2], &c[1]).green().underline().to_string()
    });
    let text = LINE_BREAK.replace_all(&text, "\n");
    let text = PARAGRAPH.replace_all(&text, "\n$1\n");
    let text = LIST_EDGE.replace_all(&text, "\n");
    let text = LIST_ITEM.replace_all(&text, "• $1\n");
    let text = CODE.replace_all(&text, |c: &Captures| monospace(&c[1]));
    let text = DIV_CLOSE.replace_all(&text, "\n");
    let text = ANY_TAG.replace_all(&text, "");
    let text = BLANK_RUN.replace_all(&text, "\n\n");

    text.trim().to_string()
}

/// Plain-text rendering of a wiki page's storage-format body.
pub fn storage_to_text(storage: &str) -> String {
    let text = CDATA.replace_all(storage, "$1");
    let text = HTML_HEADING.replace_all(&text, |c: &Captures| {
        let marker = "#".repeat(c[1].parse::<usize>().unwrap_or(1));
        format!("\n{} {}\n", marker, &c[2])
    });
    let text = PARAGRAPH.replace_all(&text, "$1\n\n");
    let text = LINE_BREAK.replace_all(&text, "\n");
    let text = LINK.replace_all(&text, "$2 ($1)");
    let text = STRONG.replace_all(&text, "**$1**");
    let text = EMPHASIS.replace_all(&text, "*$1*");
    let text = CODE.replace_all(&text, "`$1`");
    let text = LIST_ITEM.replace_all(&text, "  • $1\n");
    let text = LIST_EDGE.replace_all(&text, "\n");
    let text = ANY_TAG.replace_all(&text, "");
    let text = decode_entities(&text);
    let text = BLANK_RUN.replace_all(&text, "\n\n");

    text.trim().to_string()
}

/// Removes tags and collapses whitespace; used for search excerpts.
pub fn strip_tags(html: &str) -> String {
    let text = ANY_TAG.replace_all(html, "");
    let text = decode_entities(&text);
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_wiki_headings_and_bold() {
        plain();
        let out = format_markup("h1. Overview\nSome *important* text\nh3.  Details");
        assert_eq!(out, "# Overview\nSome important text\n### Details");
    }

    #[test]
    fn test_monospace() {
        plain();
        assert_eq!(format_markup("run {{cargo test}} now"), "run  cargo test  now");
    }

    #[test]
    fn test_html_description() {
        plain();
        let out = format_markup(
            "<p>See <a href=\"https://x.io\">docs</a></p><ul><li>one</li><li>two</li></ul>",
        );
        assert!(out.contains("See [docs](https://x.io)"));
        assert!(out.contains("• one\n• two"));
        assert!(!out.contains('<'));
    }

    #[test]
    fn test_empty_markup() {
        assert_eq!(format_markup(""), "");
    }

    #[test]
    fn test_storage_to_text() {
        let storage = "<h2>Setup</h2><p>Install <strong>jet</strong> &amp; run <code>jet init</code></p><ul><li>fast</li></ul><ac:structured-macro><![CDATA[raw]]></ac:structured-macro>";
        let text = storage_to_text(storage);
        assert!(text.starts_with("## Setup"));
        assert!(text.contains("Install **jet** & run `jet init`"));
        assert!(text.contains("  • fast"));
        assert!(text.contains("raw"));
        assert!(!text.contains("<"));
        assert!(!text.contains("\n\n\n"));
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            strip_tags("  <b>Deploy</b>   the\n&quot;app&quot; "),
            "Deploy the \"app\""
        );
    }

    #[test]
    fn test_entities_decode_amp_last() {
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }
}
