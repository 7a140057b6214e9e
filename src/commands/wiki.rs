use super::{parse_page_ref, read_text_input, OutputOptions};
use crate::api::confluence::ConfluenceClient;
use crate::config::settings::Settings;
use crate::errors::JetError;
use crate::models::page::CreatePageRequest;
use crate::render::wiki::{page_readable, search_results};
use colored::*;
use std::path::PathBuf;

pub async fn view(settings: &Settings, page: &str, output: &OutputOptions) -> anyhow::Result<()> {
    let id = parse_page_ref(page)?;
    let client = ConfluenceClient::new(settings.confluence()?)?;
    let page = client.get_page(&id).await?;
    output.emit(&page, || page_readable(&page))
}

pub async fn search(
    settings: &Settings,
    query: &str,
    space: Option<&str>,
    limit: u32,
    output: &OutputOptions,
) -> anyhow::Result<()> {
    let query = query.trim();
    let space = space.map(str::trim).filter(|s| !s.is_empty());
    let client = ConfluenceClient::new(settings.confluence()?)?;

    let response = match (query.is_empty(), space) {
        (false, _) => client.search_text(query, space, limit).await?,
        (true, Some(space)) => client.search_space(space, limit).await?,
        (true, None) => {
            return Err(JetError::invalid("search text is empty; pass a query or --space").into())
        }
    };

    if response.results.is_empty() {
        return output.write(&"No results found".yellow().to_string());
    }
    output.emit(&response, || search_results(&response))
}

#[derive(Debug, Clone)]
pub struct CreatePageArgs {
    pub title: String,
    pub space: String,
    pub parent: Option<String>,
    pub file: Option<PathBuf>,
}

pub async fn create(settings: &Settings, args: CreatePageArgs) -> anyhow::Result<()> {
    if args.title.trim().is_empty() {
        return Err(JetError::invalid("page title is empty").into());
    }
    let path = args.file.unwrap_or_else(|| PathBuf::from("-"));
    let content = read_text_input(&path)?;
    if content.trim().is_empty() {
        return Err(JetError::invalid("page content is empty").into());
    }

    let client = ConfluenceClient::new(settings.confluence()?)?;
    let space_id = client.resolve_space_id(args.space.trim()).await?;
    let request = CreatePageRequest::storage(
        &space_id,
        args.title.trim(),
        &content,
        args.parent.as_deref(),
    );
    let page = client.create_page(&request).await?;

    println!("{}", "✓ Page created successfully".green().bold());
    println!("  {} {}", "Title:".bright_black(), page.title);
    println!("  {} {}", "ID:".bright_black(), page.id);
    println!("  {} {}", "Space:".bright_black(), args.space);
    if let Some(url) = page.web_url() {
        println!("  {} {}", "URL:".bright_black(), url.green());
    }
    Ok(())
}
