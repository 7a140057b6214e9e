//! One handler per subcommand. Handlers receive everything they need as
//! arguments and return `anyhow::Result`; `main` renders failures.

use crate::errors::JetError;
use anyhow::Context;
use clap::ValueEnum;
use colored::*;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};

pub mod init;
pub mod issue;
pub mod search;
pub mod wiki;
pub mod workflow;

static BROWSE_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"/browse/([A-Z][A-Z0-9]*-\d+)").unwrap());
static PAGE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/pages/(\d+)").unwrap());

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Readable,
    Json,
}

/// Where and how a command writes its result.
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

impl OutputOptions {
    /// Picks the JSON or readable rendering and prints or saves it.
    pub fn emit<T: Serialize + ?Sized>(
        &self,
        value: &T,
        readable: impl FnOnce() -> String,
    ) -> anyhow::Result<()> {
        let content = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
            OutputFormat::Readable => readable(),
        };
        self.write(&content)
    }

    pub fn write(&self, content: &str) -> anyhow::Result<()> {
        match &self.output {
            Some(path) => {
                // Files never carry color codes.
                let plain = strip_ansi(content);
                std::fs::write(path, plain)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!(
                    "{} {}",
                    "✓ Output written to".green(),
                    path.display().to_string().cyan()
                );
            }
            None => println!("{}", content),
        }
        Ok(())
    }
}

fn strip_ansi(text: &str) -> String {
    static ANSI: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());
    ANSI.replace_all(text, "").into_owned()
}

/// Accepts a bare ticket key or a browse URL on an Atlassian-hosted site.
pub fn parse_ticket_ref(input: &str) -> Result<String, JetError> {
    let input = input.trim();
    if !input.contains("://") {
        if input.is_empty() {
            return Err(JetError::invalid("ticket key is empty"));
        }
        return Ok(input.to_uppercase());
    }

    let rest = input
        .strip_prefix("https://")
        .ok_or_else(|| JetError::invalid("invalid URL: only https is supported"))?;
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = host.rsplit('@').next().unwrap_or(host);
    let host = host.split(':').next().unwrap_or(host).to_lowercase();
    if !is_jira_host(&host) {
        return Err(JetError::invalid(format!(
            "invalid URL: {} is not a Jira host",
            host
        )));
    }

    BROWSE_KEY
        .captures(input)
        .map(|c| c[1].to_string())
        .ok_or_else(|| JetError::invalid("could not find a ticket key in the URL"))
}

fn is_jira_host(host: &str) -> bool {
    ["atlassian.net", "jira.com"].iter().any(|&domain| {
        host == domain
            || host
                .strip_suffix(domain)
                .is_some_and(|sub| sub.ends_with('.'))
    })
}

/// Accepts a numeric page id or a page URL.
pub fn parse_page_ref(input: &str) -> Result<String, JetError> {
    let input = input.trim();
    if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
        return Ok(input.to_string());
    }
    if input.contains("://") {
        if let Some(c) = PAGE_ID.captures(input) {
            return Ok(c[1].to_string());
        }
        return Err(JetError::invalid("could not find a page id in the URL"));
    }
    Err(JetError::invalid(format!(
        "'{}' is neither a page id nor a page URL",
        input
    )))
}

/// Reads text from a file, or from stdin when the path is `-`.
pub fn read_text_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Settings pointing both providers at a mock server.
#[cfg(test)]
pub(crate) fn test_settings(url: &str) -> crate::config::settings::Settings {
    let url = url.to_string();
    let env = move |name: &str| match name {
        "JIRA_URL" => Some(url.clone()),
        "JIRA_EMAIL" => Some("dev@acme.io".to_string()),
        "JIRA_API_TOKEN" => Some("secret".to_string()),
        _ => None,
    };
    crate::config::settings::Settings::from_sources(&env, None).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_key_is_uppercased() {
        assert_eq!(parse_ticket_ref("proj-12").unwrap(), "PROJ-12");
    }

    #[test]
    fn test_browse_url() {
        assert_eq!(
            parse_ticket_ref("https://acme.atlassian.net/browse/PROJ-12?focus=1").unwrap(),
            "PROJ-12"
        );
        assert_eq!(
            parse_ticket_ref("https://tracker.jira.com/browse/AB2-7").unwrap(),
            "AB2-7"
        );
    }

    #[test]
    fn test_rejected_urls() {
        assert!(parse_ticket_ref("http://acme.atlassian.net/browse/PROJ-1").is_err());
        assert!(parse_ticket_ref("https://evil.example.com/browse/PROJ-1").is_err());
        assert!(parse_ticket_ref("https://acme.atlassian.net/projects/PROJ").is_err());
        assert!(parse_ticket_ref("https://acme.atlassian.net.evil.com/browse/PROJ-1").is_err());
        assert!(parse_ticket_ref("https://evilatlassian.net/browse/PROJ-1").is_err());
        assert!(parse_ticket_ref("https://notjira.com/browse/PROJ-1").is_err());
    }

    #[test]
    fn test_page_refs() {
        assert_eq!(parse_page_ref("123456").unwrap(), "123456");
        assert_eq!(
            parse_page_ref("https://acme.atlassian.net/wiki/spaces/ENG/pages/98765/Runbook").unwrap(),
            "98765"
        );
        assert!(parse_page_ref("Runbook").is_err());
        assert!(parse_page_ref("https://acme.atlassian.net/wiki/spaces/ENG").is_err());
    }

    #[test]
    fn test_write_to_file_strips_color() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let options = OutputOptions {
            format: OutputFormat::Readable,
            output: Some(path.clone()),
        };
        options.write("\x1b[1;36mPROJ-1\x1b[0m done").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "PROJ-1 done");
    }

    #[test]
    fn test_emit_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let options = OutputOptions {
            format: OutputFormat::Json,
            output: Some(path.clone()),
        };
        options
            .emit(&serde_json::json!({"key": "PROJ-1"}), || unreachable!())
            .unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["key"], "PROJ-1");
    }

    #[test]
    fn test_read_text_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desc.md");
        std::fs::write(&path, "hello\n").unwrap();
        assert_eq!(read_text_input(&path).unwrap(), "hello\n");
        assert!(read_text_input(&dir.path().join("missing")).is_err());
    }
}
