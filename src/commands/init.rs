use crate::config::settings::Settings;
use crate::errors::JetError;
use anyhow::Context;
use colored::*;
use dialoguer::{Input, Password};

/// Answers collected by the prompts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitAnswers {
    pub url: String,
    pub email: String,
    pub username: String,
    pub token: String,
}

impl InitAnswers {
    fn validate(&self) -> Result<(), JetError> {
        let url = self.url.trim();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(JetError::invalid("Jira URL must start with https:// or http://"));
        }
        if self.email.trim().is_empty() && self.username.trim().is_empty() {
            return Err(JetError::invalid("either an email or a username is required"));
        }
        if self.token.trim().is_empty() {
            return Err(JetError::invalid("API token cannot be empty"));
        }
        Ok(())
    }

    fn entries(&self) -> Vec<(&str, &str)> {
        vec![
            ("url", self.url.trim().trim_end_matches('/')),
            ("email", self.email.trim()),
            ("username", self.username.trim()),
            ("token", self.token.trim()),
        ]
    }
}

pub fn run() -> anyhow::Result<()> {
    let path = Settings::config_path()
        .ok_or_else(|| JetError::ConfigInvalid("HOME environment variable not set".into()))?;

    println!("{}", "jet configuration".cyan().bold());
    println!();
    println!(
        "{}",
        format!("Credentials are stored in {}", path.display()).bright_black()
    );
    println!("{}", "The file is only readable by you (600)".bright_black());
    println!();

    let answers = prompt_answers()?;
    answers.validate()?;

    Settings::save_jira_section(&path, &answers.entries())
        .with_context(|| format!("failed to save {}", path.display()))?;

    println!();
    println!("{}", "✓ Configuration saved!".green().bold());
    println!("  Location: {}", path.display().to_string().cyan());
    println!("{}", "  Wiki commands reuse these credentials unless a [confluence] section is added".bright_black());
    Ok(())
}

fn prompt_answers() -> anyhow::Result<InitAnswers> {
    let url: String = Input::new()
        .with_prompt("Jira URL (e.g., https://acme.atlassian.net)")
        .interact_text()?;
    let email: String = Input::new()
        .with_prompt("Email (Jira Cloud, leave empty for server)")
        .allow_empty(true)
        .interact_text()?;
    let username: String = Input::new()
        .with_prompt("Username (Jira Server, leave empty for cloud)")
        .allow_empty(true)
        .interact_text()?;

    println!(
        "{}",
        "Create a token at https://id.atlassian.com/manage-profile/security/api-tokens"
            .bright_black()
    );
    let token = Password::new().with_prompt("API token").interact()?;

    Ok(InitAnswers {
        url,
        email,
        username,
        token,
    })
}
