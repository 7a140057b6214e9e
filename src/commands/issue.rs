use super::{parse_ticket_ref, read_text_input, OutputOptions};
use crate::api::jira::JiraClient;
use crate::config::settings::Settings;
use crate::errors::JetError;
use crate::models::ticket::{Attachment, FieldUpdate, KeyRef, NameRef, NewIssue};
use crate::render::ticket::{attachment_list, ticket_readable};
use anyhow::Context;
use colored::*;
use std::path::{Path, PathBuf};

pub async fn view(settings: &Settings, ticket: &str, output: &OutputOptions) -> anyhow::Result<()> {
    let key = parse_ticket_ref(ticket)?;
    let client = JiraClient::new(settings.jira()?)?;
    let ticket = client.get_issue(&key).await?;
    output.emit(&ticket, || ticket_readable(&ticket))
}

pub async fn comment(
    settings: &Settings,
    ticket: &str,
    text: Option<String>,
    file: Option<PathBuf>,
) -> anyhow::Result<()> {
    let key = parse_ticket_ref(ticket)?;
    let body = match (file, text) {
        (Some(path), _) => read_text_input(&path)?,
        (None, Some(text)) => text,
        (None, None) => String::new(),
    };
    let body = body.trim();
    if body.is_empty() {
        return Err(JetError::invalid("comment text is empty").into());
    }

    let client = JiraClient::new(settings.jira()?)?;
    client.add_comment(&key, body).await?;
    println!("{} {}", "✓ Comment added to".green().bold(), key.cyan());
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct EditArgs {
    pub description: Option<String>,
    pub description_file: Option<PathBuf>,
    pub epic: Option<String>,
    pub parent: Option<String>,
    pub assign_to_me: bool,
}

impl EditArgs {
    /// Field changes that need no lookup; assignment is resolved separately.
    fn field_update(&self) -> anyhow::Result<FieldUpdate> {
        let description = match (&self.description_file, &self.description) {
            (Some(path), _) => Some(read_text_input(path)?.trim().to_string()),
            (None, Some(text)) => Some(text.clone()),
            (None, None) => None,
        };
        // Epics and parents share one field on current sites.
        let parent = self
            .parent
            .as_deref()
            .or(self.epic.as_deref())
            .map(|key| KeyRef {
                key: key.trim().to_uppercase(),
            });
        Ok(FieldUpdate {
            description,
            parent,
            assignee: None,
        })
    }
}

pub async fn edit(settings: &Settings, ticket: &str, args: EditArgs) -> anyhow::Result<()> {
    let key = parse_ticket_ref(ticket)?;
    let mut update = args.field_update()?;
    if update.is_empty() && !args.assign_to_me {
        return Err(JetError::invalid(
            "nothing to update: pass --description, --description-file, --epic, --parent or --assign-to-me",
        )
        .into());
    }

    let client = JiraClient::new(settings.jira()?)?;
    if args.assign_to_me {
        update.assignee = Some(client.current_user().await?.assignee_ref());
    }
    client.update_issue(&key, update).await?;
    println!("{} {}", "✓ Updated".green().bold(), key.cyan());
    Ok(())
}

#[derive(Debug, Clone)]
pub struct CreateArgs {
    pub project: String,
    pub summary: String,
    pub description: Option<String>,
    pub description_file: Option<PathBuf>,
    pub issue_type: String,
    pub epic: Option<String>,
}

pub async fn create(settings: &Settings, args: CreateArgs) -> anyhow::Result<()> {
    if args.summary.trim().is_empty() {
        return Err(JetError::invalid("summary is empty").into());
    }
    let description = match (&args.description_file, args.description) {
        (Some(path), _) => read_text_input(path)?.trim().to_string(),
        (None, Some(text)) => text,
        (None, None) => String::new(),
    };

    let client = JiraClient::new(settings.jira()?)?;
    let created = client
        .create_issue(NewIssue {
            project: KeyRef {
                key: args.project.trim().to_uppercase(),
            },
            summary: args.summary.trim().to_string(),
            description,
            issue_type: NameRef {
                name: args.issue_type,
            },
            parent: args.epic.map(|key| KeyRef {
                key: key.trim().to_uppercase(),
            }),
        })
        .await?;

    println!("{} {}", "✓ Created".green().bold(), created.key.cyan().bold());
    println!("  {}", client.browse_url(&created.key).bright_black());
    Ok(())
}

pub async fn assign(settings: &Settings, ticket: &str) -> anyhow::Result<()> {
    let key = parse_ticket_ref(ticket)?;
    let client = JiraClient::new(settings.jira()?)?;
    let me = client.current_user().await?;
    client
        .update_issue(
            &key,
            FieldUpdate {
                assignee: Some(me.assignee_ref()),
                ..Default::default()
            },
        )
        .await?;
    println!(
        "{} {} to {}",
        "✓ Assigned".green().bold(),
        key.cyan(),
        me.display_label()
    );
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct AttachmentArgs {
    pub download: bool,
    pub index: Option<String>,
    pub output: Option<PathBuf>,
}

pub async fn attachments(settings: &Settings, ticket: &str, args: AttachmentArgs) -> anyhow::Result<()> {
    let key = parse_ticket_ref(ticket)?;
    let client = JiraClient::new(settings.jira()?)?;
    let ticket = client.get_issue(&key).await?;
    let all = &ticket.fields.attachment;

    if all.is_empty() {
        println!("{}", format!("No attachments found for {}", key).yellow());
        return Ok(());
    }

    if !args.download {
        print!("{}", attachment_list(&key, all));
        return Ok(());
    }

    let selected: Vec<&Attachment> = match &args.index {
        Some(spec) => parse_indices(spec, all.len())?
            .into_iter()
            .map(|i| &all[i])
            .collect(),
        None => all.iter().collect(),
    };

    let dir = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}_attachments", key)));
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    println!(
        "{}",
        format!("📥 Downloading {} attachment(s) to {}", selected.len(), dir.display())
            .cyan()
            .bold()
    );

    let mut failed = 0;
    for attachment in &selected {
        match download_one(&client, attachment, &dir).await {
            Ok(path) => println!("  {} {}", "✓".green(), path.display()),
            Err(e) => {
                failed += 1;
                tracing::warn!(file = %attachment.filename, error = %e, "download failed");
                eprintln!("  {} {}: {}", "✗".red(), attachment.filename, e);
            }
        }
    }

    let done = selected.len() - failed;
    println!("\n{} {}/{} downloaded", "Done:".bold(), done, selected.len());
    Ok(())
}

async fn download_one(client: &JiraClient, attachment: &Attachment, dir: &Path) -> anyhow::Result<PathBuf> {
    let bytes = client.download_attachment(attachment).await?;
    let path = dir.join(safe_file_name(attachment));
    std::fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// The file-name component of the attachment name, never a path.
fn safe_file_name(attachment: &Attachment) -> String {
    Path::new(&attachment.filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("attachment-{}", attachment.id))
}

/// Parses a 1-based, comma-separated index list into 0-based indices.
fn parse_indices(spec: &str, count: usize) -> Result<Vec<usize>, JetError> {
    let mut indices = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let n: usize = part
            .parse()
            .map_err(|_| JetError::invalid(format!("invalid attachment index '{}'", part)))?;
        if n == 0 || n > count {
            return Err(JetError::invalid(format!(
                "attachment index {} out of range (1-{})",
                n, count
            )));
        }
        if !indices.contains(&(n - 1)) {
            indices.push(n - 1);
        }
    }
    if indices.is_empty() {
        return Err(JetError::invalid("no attachment indices given"));
    }
    Ok(indices)
}
