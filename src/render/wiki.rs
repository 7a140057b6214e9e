use super::markup::{storage_to_text, strip_tags};
use super::{truncate, RULE};
use crate::models::page::{Page, SearchResponse};
use colored::*;

const EXCERPT_LEN: usize = 200;

pub fn page_readable(page: &Page) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", format!("📄 {}", page.title).cyan().bold()));
    out.push_str(&format!("{}\n", RULE.bright_black()));
    out.push_str(&format!("{} {}\n", "ID:".bright_black(), page.id));
    if !page.space_id.is_empty() {
        out.push_str(&format!("{} {}\n", "Space:".bright_black(), page.space_id));
    }
    if let Some(version) = &page.version {
        out.push_str(&format!("{} {}\n", "Version:".bright_black(), version.number));
    }
    if let Some(url) = page.web_url() {
        out.push_str(&format!("{} {}\n", "URL:".bright_black(), url.green()));
    }
    out.push('\n');

    match page.storage() {
        Some(storage) if !storage.trim().is_empty() => {
            out.push_str(&storage_to_text(storage));
            out.push('\n');
        }
        _ => out.push_str(&format!("{}\n", "(no content)".bright_black())),
    }
    out
}

pub fn search_results(response: &SearchResponse) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n",
        format!("🔍 Found {} result(s)", response.results.len()).cyan().bold()
    ));
    out.push_str(&format!("{}\n\n", RULE.bright_black()));

    for (i, result) in response.results.iter().enumerate() {
        out.push_str(&format!(
            "{} {}\n",
            format!("{}.", i + 1).yellow().bold(),
            result.display_title().bold()
        ));

        let mut meta = Vec::new();
        if !result.content.id.is_empty() {
            meta.push(format!("ID: {}", result.content.id));
        }
        if !result.content.space.key.is_empty() {
            meta.push(format!("Space: {}", result.content.space.key));
        }
        if !meta.is_empty() {
            out.push_str(&format!("   {}\n", meta.join(" | ").bright_black()));
        }

        if let Some(url) = result.content.links.web_url() {
            out.push_str(&format!("   {} {}\n", "URL:".bright_black(), url.green()));
        } else if !result.url.is_empty() {
            out.push_str(&format!("   {} {}\n", "Path:".bright_black(), result.url));
        }

        let excerpt = strip_tags(&result.excerpt);
        if !excerpt.is_empty() {
            out.push_str(&format!("   {}\n", truncate(&excerpt, EXCERPT_LEN)));
        }
        out.push('\n');
    }
    out
}
