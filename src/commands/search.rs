use super::{parse_ticket_ref, OutputFormat, OutputOptions};
use crate::api::jira::{children_source, ChildStrategy, JiraClient, JqlSearch};
use crate::config::settings::Settings;
use crate::domain::search::{collect, SearchOptions, SearchResults};
use crate::models::ticket::Ticket;
use crate::render::is_closed_status;
use crate::render::ticket::{epic_table, issue_list};
use colored::*;

const LIST_PAGE_SIZE: u32 = 50;

pub const DEFAULT_STATUSES: &str =
    "To Do,In Progress,Open,New,Backlog,In Review,In Development,In Validation";

#[derive(Debug, Clone)]
pub struct ListArgs {
    pub assignee: String,
    pub status: String,
    pub project: Option<String>,
    pub max: usize,
    pub all: bool,
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Filter expression for `list`, newest activity first.
pub fn build_list_jql(assignee: &str, status: &str, project: Option<&str>) -> String {
    let mut parts = Vec::new();

    match assignee.trim() {
        "" => {}
        a if a.eq_ignore_ascii_case("me") => parts.push("assignee = currentUser()".to_string()),
        a if a.eq_ignore_ascii_case("unassigned") => parts.push("assignee is EMPTY".to_string()),
        a => parts.push(format!("assignee = {}", quote(a))),
    }

    let statuses: Vec<&str> = status
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    match statuses.as_slice() {
        [] => {}
        [one] => parts.push(format!("status = {}", quote(one))),
        many => {
            let quoted: Vec<String> = many.iter().map(|s| quote(s)).collect();
            parts.push(format!("status IN ({})", quoted.join(",")));
        }
    }

    if let Some(project) = project.map(str::trim).filter(|p| !p.is_empty()) {
        parts.push(format!("project = {}", quote(&project.to_uppercase())));
    }

    if parts.is_empty() {
        "order by updated DESC".to_string()
    } else {
        format!("{} order by updated DESC", parts.join(" AND "))
    }
}

pub async fn list(settings: &Settings, args: ListArgs, output: &OutputOptions) -> anyhow::Result<()> {
    let jql = build_list_jql(&args.assignee, &args.status, args.project.as_deref());
    tracing::debug!(%jql, "listing tickets");

    let client = JiraClient::new(settings.jira()?)?;
    let source = JqlSearch::new(&client, jql);
    let options = if args.all {
        SearchOptions::exhaustive(LIST_PAGE_SIZE)
    } else {
        SearchOptions::limited(LIST_PAGE_SIZE, args.max)
    };
    let results = collect(&source, options).await?;
    log_estimate(&results);

    if results.tickets.is_empty() && output.format == OutputFormat::Readable {
        return output.write(&"No tickets found".yellow().to_string());
    }
    output.emit(&results, || issue_list(&results))
}

pub async fn epic(
    settings: &Settings,
    epic: &str,
    strategy: ChildStrategy,
    all: bool,
    output: &OutputOptions,
) -> anyhow::Result<()> {
    let key = parse_ticket_ref(epic)?;
    let client = JiraClient::new(settings.jira()?)?;
    let (source, page_size) = children_source(&client, strategy, &key);
    let results = collect(source.as_ref(), SearchOptions::exhaustive(page_size)).await?;
    log_estimate(&results);

    let children: Vec<Ticket> = results
        .tickets
        .into_iter()
        .filter(|t| all || !is_closed_status(&t.fields.status.name))
        .collect();

    if children.is_empty() && output.format == OutputFormat::Readable {
        let message = if all {
            format!("No child tickets found for epic {}", key)
        } else {
            format!(
                "No open child tickets found for epic {} (use --all to include closed ones)",
                key
            )
        };
        return output.write(&message.yellow().to_string());
    }

    output.emit(&children, || epic_table(&key, &children, all))
}

fn log_estimate(results: &SearchResults) {
    if results.total.is_inferred() {
        tracing::info!(
            total = results.total.value(),
            pages = results.pages_fetched,
            "provider reported no total; count is a best-effort estimate"
        );
    }
}
