use colored::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JetError {
    // Configuration errors
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("authentication credentials not provided")]
    AuthMissing,

    // Provider errors
    #[error("authentication failed - check your credentials")]
    AuthFailed,

    #[error("access denied - you may not have permission to {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("request rejected ({status}): {detail}")]
    Validation { status: u16, detail: String },

    #[error("HTTP {status}: failed to {action}")]
    Api { status: u16, action: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    // Network errors
    #[error("request failed: {0}")]
    Network(String),

    // Resolver errors
    #[error("no transition found for status '{target}'")]
    NoSuchTransition {
        target: String,
        available: Vec<String>,
    },

    #[error("unknown relationship type '{0}'")]
    UnknownRelationship(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl JetError {
    pub fn forbidden(action: impl Into<String>) -> Self {
        JetError::Forbidden(action.into())
    }

    pub fn not_found(entity: impl Into<String>) -> Self {
        JetError::NotFound(entity.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        JetError::InvalidInput(msg.into())
    }

    /// Multi-line, colored explanation printed by `main` before exiting.
    pub fn render(&self) -> String {
        let mut out = String::new();
        match self {
            JetError::ConfigInvalid(msg) => {
                out.push_str(&format!("{}\n", "Invalid configuration".red().bold()));
                out.push_str(&format!("   {}\n\n", msg.dimmed()));
                out.push_str("   To fix:\n");
                out.push_str("   1. Set JIRA_URL / JIRA_API_TOKEN in your environment\n");
                out.push_str(&format!("   2. Or write ~/.jira_config: {}", "jet init".green()));
            }
            JetError::AuthMissing => {
                out.push_str(&format!("{}\n", "No credentials configured".red().bold()));
                out.push_str(&format!(
                    "   {}\n\n",
                    "An API token plus an email (cloud) or username (server) is required".dimmed()
                ));
                out.push_str("   To fix:\n");
                out.push_str("   1. Export JIRA_EMAIL or JIRA_USERNAME, and JIRA_API_TOKEN\n");
                out.push_str(&format!("   2. Or run: {}", "jet init".green()));
            }
            JetError::AuthFailed => {
                out.push_str(&format!("{}\n", "Authentication failed".red().bold()));
                out.push_str(&format!(
                    "   {}\n\n",
                    "Your API token may have expired or is invalid".dimmed()
                ));
                out.push_str("   To fix:\n");
                out.push_str(&format!(
                    "   1. Generate new token: {}\n",
                    "https://id.atlassian.com/manage-profile/security/api-tokens".cyan()
                ));
                out.push_str(&format!("   2. Update config: {}", "jet init".green()));
            }
            JetError::Forbidden(action) => {
                out.push_str(&format!("{}\n", "Access denied".red().bold()));
                out.push_str(&format!(
                    "   {}",
                    format!("You may not have permission to {}", action).dimmed()
                ));
            }
            JetError::NotFound(entity) => {
                out.push_str(&format!("{}\n", format!("{} not found", entity).red().bold()));
                out.push_str(&format!(
                    "   {}\n\n",
                    "It doesn't exist or you don't have access to it".dimmed()
                ));
                out.push_str("   To fix:\n");
                out.push_str("   1. Check the key or ID is correct\n");
                out.push_str("   2. Verify you have access to this project or space");
            }
            JetError::Validation { status, detail } => {
                out.push_str(&format!(
                    "{}\n",
                    format!("Request rejected ({})", status).red().bold()
                ));
                out.push_str(&format!("   {}", detail.dimmed()));
            }
            JetError::Api { status, action } => {
                out.push_str(&format!("{}\n", format!("API error ({})", status).red().bold()));
                out.push_str(&format!("   {}\n\n", format!("Failed to {}", action).dimmed()));
                out.push_str("   Try again or check your network connection");
            }
            JetError::Decode(msg) => {
                out.push_str(&format!("{}\n", "Unexpected response".red().bold()));
                out.push_str(&format!("   {}", msg.dimmed()));
            }
            JetError::Network(msg) => {
                out.push_str(&format!("{}\n", "Network error".red().bold()));
                out.push_str(&format!("   {}\n\n", msg.dimmed()));
                out.push_str("   To fix:\n");
                out.push_str("   1. Check your internet connection\n");
                out.push_str("   2. Verify you can reach the API endpoints\n");
                out.push_str("   3. Try again in a moment");
            }
            JetError::NoSuchTransition { target, available } => {
                out.push_str(&format!(
                    "{}\n",
                    format!("No transition found for status '{}'", target).red().bold()
                ));
                if available.is_empty() {
                    out.push_str(&format!("   {}", "No transitions are available".dimmed()));
                } else {
                    out.push_str(&format!("\n{}\n", "Available transitions:".cyan().bold()));
                    for label in available {
                        out.push_str(&format!("  {} {}\n", "→".bright_black(), label));
                    }
                }
            }
            JetError::UnknownRelationship(word) => {
                out.push_str(&format!(
                    "{}\n",
                    format!("Unknown relationship type '{}'", word).red().bold()
                ));
                out.push_str(&format!(
                    "   {}",
                    "Common types: blocks, relates-to, duplicates, clones, causes".dimmed()
                ));
            }
            JetError::InvalidInput(msg) => {
                out.push_str(&format!("{}\n", "Invalid input".red().bold()));
                out.push_str(&format!("   {}", msg.dimmed()));
            }
            JetError::Io(err) => {
                out.push_str(&format!("{}\n", "Error".red().bold()));
                out.push_str(&format!("   {}", err.to_string().dimmed()));
            }
        }
        out
    }
}

impl From<reqwest::Error> for JetError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            JetError::Network(err.to_string())
        } else if err.is_decode() {
            JetError::Decode(err.to_string())
        } else {
            JetError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for JetError {
    fn from(err: serde_json::Error) -> Self {
        JetError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, JetError>;
