use super::parse_ticket_ref;
use crate::api::jira::JiraClient;
use crate::config::settings::Settings;
use crate::domain::resolver::{resolve_closing, resolve_transition, LinkPlan};
use colored::*;

pub async fn shift(settings: &Settings, ticket: &str, status: &str) -> anyhow::Result<()> {
    let key = parse_ticket_ref(ticket)?;
    let client = JiraClient::new(settings.jira()?)?;
    let options = client.transitions(&key).await?;
    let transition = resolve_transition(&options, status)?;

    tracing::debug!(key = %key, id = %transition.id, "applying transition");
    client.transition_issue(&key, &transition.id).await?;
    println!(
        "{} {} to {}",
        "✓ Transitioned".green().bold(),
        key.cyan(),
        transition.label().bold()
    );
    Ok(())
}

pub async fn close(settings: &Settings, ticket: &str) -> anyhow::Result<()> {
    let key = parse_ticket_ref(ticket)?;
    let client = JiraClient::new(settings.jira()?)?;
    let options = client.transitions(&key).await?;
    let transition = resolve_closing(&options)?;

    client.transition_issue(&key, &transition.id).await?;
    println!(
        "{} {} → {}",
        "✓ Closed".green().bold(),
        key.cyan(),
        transition.label().bold()
    );
    Ok(())
}

pub async fn link(settings: &Settings, first: &str, relationship: &str, second: &str) -> anyhow::Result<()> {
    // Validate the word before touching the network.
    let plan = LinkPlan::parse(relationship)?;
    let first = parse_ticket_ref(first)?;
    let second = parse_ticket_ref(second)?;

    let client = JiraClient::new(settings.jira()?)?;
    client.link_issues(&plan.build_request(&first, &second)).await?;
    println!(
        "{} {} {} {}",
        "✓ Successfully linked".green().bold(),
        first.cyan(),
        relationship.to_lowercase(),
        second.cyan()
    );
    Ok(())
}
