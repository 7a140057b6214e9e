use super::markup::format_markup;
use super::{
    date_prefix, format_file_size, priority_color, status_color, truncate, RULE, SHORT_RULE,
};
use crate::domain::search::{SearchResults, TotalCount};
use crate::models::ticket::{Attachment, Ticket};
use colored::*;

/// Only the most recent comments are shown.
const COMMENTS_SHOWN: usize = 5;

pub fn ticket_readable(ticket: &Ticket) -> String {
    let fields = &ticket.fields;
    let mut out = String::new();

    out.push_str(&format!("{}\n", format!("🎫 TICKET: {}", ticket.key).cyan().bold()));
    out.push_str(&format!("{}\n", RULE.bright_black()));
    out.push_str(&format!("{} {}\n", "📝 Summary:".yellow().bold(), fields.summary));
    out.push_str(&format!(
        "{} {}\n",
        "📊 Status:".blue(),
        status_color(&fields.status.name)
    ));
    out.push_str(&format!("{} {}\n", "🏷️  Type:".magenta(), fields.issue_type.name));
    match fields.priority_name() {
        Some(priority) => out.push_str(&format!(
            "{} {}\n",
            "⚡ Priority:".red(),
            priority_color(priority)
        )),
        None => out.push_str(&format!("{} {}\n", "⚡ Priority:".red(), "None".bright_black())),
    }
    out.push_str(&format!(
        "{} {} ({})\n",
        "📁 Project:".green(),
        fields.project.name,
        fields.project.key.green()
    ));

    if let Some((key, summary)) = fields.epic_ref() {
        out.push_str(&reference_line("🎯 Epic:", key, summary));
    } else if let Some((key, summary)) = fields.parent_ref() {
        out.push_str(&reference_line("🔗 Parent:", key, summary));
    }

    let links: Vec<_> = fields.issue_links.iter().filter_map(|l| l.resolve()).collect();
    if !links.is_empty() {
        out.push_str(&format!(
            "\n{}\n",
            format!("🔗 Linked Issues ({}):", links.len()).cyan().bold()
        ));
        out.push_str(&format!("{}\n", SHORT_RULE.bright_black()));
        for (_, relationship, linked) in links {
            out.push_str(&format!(
                "  {} {}\n",
                format!("{}:", relationship).magenta(),
                linked.key.cyan()
            ));
            out.push_str(&format!("    {} {}\n", "Summary:".bright_black(), linked.fields.summary));
            out.push_str(&format!(
                "    {} {} | {} {}\n",
                "Status:".bright_black(),
                status_color(&linked.fields.status.name),
                "Type:".bright_black(),
                linked.fields.issue_type.name
            ));
        }
        out.push('\n');
    }

    let assignee = fields.assignee_label();
    if assignee == "Unassigned" {
        out.push_str(&format!("{} {}\n", "👤 Assignee:".blue(), assignee.bright_black()));
    } else {
        out.push_str(&format!("{} {}\n", "👤 Assignee:".blue(), assignee));
    }
    if let Some(reporter) = &fields.reporter {
        out.push_str(&format!("{} {}\n", "📝 Reporter:".blue(), reporter.display_label()));
    }
    if !fields.labels.is_empty() {
        out.push_str(&format!("{} {}\n", "🏷️  Labels:".magenta(), fields.labels.join(", ")));
    }
    if !fields.components.is_empty() {
        let names: Vec<&str> = fields.components.iter().map(|c| c.name.as_str()).collect();
        out.push_str(&format!("{} {}\n", "🔧 Components:".green(), names.join(", ")));
    }
    if !fields.fix_versions.is_empty() {
        let names: Vec<&str> = fields.fix_versions.iter().map(|v| v.name.as_str()).collect();
        out.push_str(&format!("{} {}\n", "🎯 Fix Versions:".yellow().bold(), names.join(", ")));
    }
    if fields.created.len() >= 10 {
        out.push_str(&format!("{} {}\n", "📅 Created:".bright_black(), date_prefix(&fields.created)));
    }
    if fields.updated.len() >= 10 {
        out.push_str(&format!("{} {}\n", "🔄 Updated:".bright_black(), date_prefix(&fields.updated)));
    }

    if !fields.description_text.is_empty() {
        out.push_str(&format!("\n{}\n", "📖 Description:".yellow().bold()));
        out.push_str(&format!("{}\n", SHORT_RULE.bright_black()));
        out.push_str(&format!("{}\n", format_markup(&fields.description_text)));
    }

    if !fields.attachment.is_empty() {
        out.push_str(&format!(
            "\n{}\n",
            format!("📎 Attachments ({}):", fields.attachment.len()).green()
        ));
        out.push_str(&format!("{}\n", SHORT_RULE.bright_black()));
        for (i, attachment) in fields.attachment.iter().enumerate() {
            out.push_str(&attachment_entry(i + 1, attachment));
        }
    }

    let comments = &fields.comment.comments;
    if !comments.is_empty() {
        out.push_str(&format!(
            "\n{}\n",
            format!("💬 Comments ({}):", comments.len()).cyan().bold()
        ));
        out.push_str(&format!("{}\n", SHORT_RULE.bright_black()));
        let start = comments.len().saturating_sub(COMMENTS_SHOWN);
        for (i, comment) in comments[start..].iter().enumerate() {
            out.push_str(&format!(
                "{} {} ({}):\n",
                format!("{}.", i + 1).yellow().bold(),
                comment.author.display_label(),
                date_prefix(&comment.created).bright_black()
            ));
            out.push_str(&format!("   {}\n\n", format_markup(&comment.text())));
        }
    }

    out
}

fn reference_line(label: &str, key: &str, summary: &str) -> String {
    if summary.is_empty() {
        format!("{} {}\n", label.cyan().bold(), key.cyan().bold())
    } else {
        format!("{} {} ({})\n", label.cyan().bold(), summary, key.cyan().bold())
    }
}

fn attachment_entry(index: usize, attachment: &Attachment) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {} ({})\n",
        format!("{}.", index).yellow().bold(),
        attachment.filename,
        format_file_size(attachment.size).blue()
    ));
    out.push_str(&format!("   {} {}\n", "Type:".bright_black(), attachment.mime_type));
    out.push_str(&format!(
        "   {} {} ({})\n",
        "Uploaded by:".bright_black(),
        attachment.author.display_label(),
        date_prefix(&attachment.created)
    ));
    if !attachment.content.is_empty() {
        out.push_str(&format!("   {} {}\n", "URL:".bright_black(), attachment.content.green()));
    }
    out.push('\n');
    out
}

pub fn attachment_list(key: &str, attachments: &[Attachment]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n",
        format!("📎 Attachments for {}", key).cyan().bold()
    ));
    out.push_str(&format!("{}\n", RULE.bright_black()));
    for (i, attachment) in attachments.iter().enumerate() {
        out.push_str(&attachment_entry(i + 1, attachment));
    }
    out.push_str(&format!("💡 {}\n", "Use --download to download attachments".bright_black()));
    out.push_str(&format!(
        "💡 {}\n",
        "Use --index 1,3 to download specific attachments".bright_black()
    ));
    out
}

/// Header line for a search; an inferred total is marked as an estimate.
fn total_line(total: TotalCount, shown: usize) -> String {
    let mut line = match total {
        TotalCount::Reported(n) => format!("📋 Found {} ticket(s)", n).cyan().bold().to_string(),
        TotalCount::Inferred(n) => format!("📋 Found ~{} ticket(s)", n).cyan().bold().to_string(),
    };
    if (total.value() as usize) > shown {
        line.push_str(&format!(" {}", format!("(showing {})", shown).bright_black()));
    }
    if total.is_inferred() {
        line.push_str(&format!(
            " {}",
            "(estimated: the server did not report a total)".bright_black()
        ));
    }
    line
}

pub fn issue_list(results: &SearchResults) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{}\n", total_line(results.total, results.tickets.len())));
    out.push_str(&format!("{}\n", RULE.bright_black()));

    for ticket in &results.tickets {
        let fields = &ticket.fields;
        out.push_str(&format!("{}  {}\n", ticket.key.cyan().bold(), fields.summary.yellow()));

        let mut details = vec![
            status_color(&fields.status.name).to_string(),
            fields.issue_type.name.clone(),
        ];
        if let Some(priority) = fields.priority_name() {
            details.push(priority_color(priority).to_string());
        }
        details.push(format!("👤 {}", fields.assignee_label()));
        out.push_str(&format!("   {}\n", details.join(" • ")));
        out.push_str(&format!(
            "   {} {}\n\n",
            "📁".green(),
            format!("{} ({})", fields.project.name, fields.project.key).bright_black()
        ));
    }
    out
}

/// Aligned table of an epic's children.
pub fn epic_table(epic_key: &str, children: &[Ticket], show_all: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", format!("Epic: {}", epic_key).cyan().bold()));
    let qualifier = if show_all { "" } else { "open " };
    out.push_str(&format!(
        "Found {} {}child ticket(s):\n\n",
        children.len(),
        qualifier
    ));

    let rows: Vec<[String; 5]> = children
        .iter()
        .map(|child| {
            let f = &child.fields;
            [
                child.key.clone(),
                f.status.name.clone(),
                truncate(f.assignee_label(), 20),
                f.issue_type.name.clone(),
                truncate(&f.summary, 50),
            ]
        })
        .collect();

    let headers = ["KEY", "STATUS", "ASSIGNEE", "TYPE", "SUMMARY"];
    let rules = ["---", "------", "--------", "----", "-------"];
    let mut widths: [usize; 4] = [0; 4];
    for (i, width) in widths.iter_mut().enumerate() {
        *width = rows
            .iter()
            .map(|r| r[i].chars().count())
            .chain(std::iter::once(headers[i].len()))
            .max()
            .unwrap_or(0);
    }

    // Pad before coloring so escape codes do not skew the columns.
    let pad = |text: &str, i: usize| format!("{:<w$}  ", text, w = widths[i]);

    let header: String = (0..4).map(|i| pad(headers[i], i)).collect::<String>() + headers[4];
    out.push_str(&format!("{}\n", header.yellow().bold()));
    let rule: String = (0..4).map(|i| pad(rules[i], i)).collect::<String>() + rules[4];
    out.push_str(&format!("{}\n", rule.bright_black()));

    for row in &rows {
        let assignee = if row[2] == "Unassigned" {
            pad(row[2].as_str(), 2).bright_black().to_string()
        } else {
            pad(row[2].as_str(), 2).white().to_string()
        };
        out.push_str(&format!(
            "{}{}{}{}{}\n",
            pad(row[0].as_str(), 0).blue(),
            status_color(&pad(row[1].as_str(), 1)),
            assignee,
            pad(row[3].as_str(), 3).white(),
            row[4]
        ));
    }
    out
}
