use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod api;
mod commands;
mod config;
mod domain;
mod errors;
mod models;
mod render;

use api::jira::ChildStrategy;
use commands::search::DEFAULT_STATUSES;
use commands::{OutputFormat, OutputOptions};
use crate::config::settings::Settings;
use errors::JetError;

#[derive(Parser)]
#[command(name = "jet")]
#[command(version)]
#[command(about = "Jira tickets and Confluence pages from the terminal", long_about = None)]
struct Cli {
    /// Log requests and pagination decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// `--format` and `-o`, shared by commands that print a result.
#[derive(clap::Args, Debug, Clone)]
struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Readable)]
    format: OutputFormat,

    /// Write the result to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl From<OutputArgs> for OutputOptions {
    fn from(args: OutputArgs) -> Self {
        OutputOptions {
            format: args.format,
            output: args.output,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write ~/.jira_config interactively
    Init,

    /// Show a ticket
    View {
        /// Ticket key or browse URL (e.g., PROJ-123)
        ticket: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Add a comment to a ticket
    Comment {
        ticket: String,

        /// Comment text
        text: Option<String>,

        /// Read the comment from a file ("-" for stdin)
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },

    /// Update ticket fields
    Edit {
        ticket: String,

        #[arg(long, conflicts_with = "description_file")]
        description: Option<String>,

        /// Read the description from a file ("-" for stdin)
        #[arg(long)]
        description_file: Option<PathBuf>,

        /// Move the ticket under this epic
        #[arg(long, conflicts_with = "parent")]
        epic: Option<String>,

        #[arg(long)]
        parent: Option<String>,

        #[arg(long)]
        assign_to_me: bool,
    },

    /// Create a ticket
    Create {
        /// Project key
        #[arg(short, long)]
        project: String,

        #[arg(short, long)]
        summary: String,

        #[arg(short, long, conflicts_with = "description_file")]
        description: Option<String>,

        #[arg(long)]
        description_file: Option<PathBuf>,

        /// Issue type
        #[arg(short = 't', long = "type", default_value = "Story")]
        issue_type: String,

        /// Parent epic key
        #[arg(short, long)]
        epic: Option<String>,
    },

    /// List the children of an epic
    Epic {
        /// Epic key or browse URL
        epic: String,

        /// Include closed, done and resolved tickets
        #[arg(long)]
        all: bool,

        /// How children are looked up
        #[arg(long, value_enum, default_value_t = ChildStrategy::Agile)]
        strategy: ChildStrategy,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Search tickets, most recently updated first
    List {
        /// "me", "unassigned" or a user name
        #[arg(short, long, default_value = "me")]
        assignee: String,

        /// Comma-separated statuses
        #[arg(short, long, default_value = DEFAULT_STATUSES)]
        status: String,

        #[arg(short, long)]
        project: Option<String>,

        /// Maximum number of tickets
        #[arg(short, long, default_value_t = 50)]
        max: usize,

        /// Fetch every matching ticket
        #[arg(long, conflicts_with = "max")]
        all: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Assign a ticket to yourself
    #[command(alias = "grab")]
    Assign { ticket: String },

    /// Move a ticket to another status
    Shift {
        ticket: String,

        /// Target status (partial names match)
        status: String,
    },

    /// Move a ticket to Done or Closed
    Close { ticket: String },

    /// Link two tickets (e.g., `jet link PROJ-1 blocks PROJ-2`)
    Link {
        first: String,

        /// blocks, is-blocked-by, relates-to, duplicates, clones, causes, ...
        relationship: String,

        second: String,
    },

    /// List or download a ticket's attachments
    Attachments {
        ticket: String,

        #[arg(short, long)]
        download: bool,

        /// 1-based, comma-separated (e.g., 1,3)
        #[arg(short, long, requires = "download")]
        index: Option<String>,

        /// Download directory (default: KEY_attachments)
        #[arg(short, long, requires = "download")]
        output: Option<PathBuf>,
    },

    /// Confluence pages
    #[command(alias = "confluence")]
    Con {
        #[command(subcommand)]
        action: ConAction,
    },
}

#[derive(Subcommand)]
enum ConAction {
    /// Show a page
    View {
        /// Page id or page URL
        page: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Full-text page search
    Search {
        #[arg(default_value = "")]
        query: String,

        /// Restrict to a space key
        #[arg(short, long)]
        space: Option<String>,

        #[arg(short, long, default_value_t = 10)]
        limit: u32,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Create a page from storage-format content
    Create {
        title: String,

        /// Space key or numeric id
        #[arg(short, long)]
        space: String,

        /// Parent page id
        #[arg(short, long)]
        parent: Option<String>,

        /// Content file (stdin when absent)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command).await {
        match e.downcast_ref::<JetError>() {
            Some(err) => eprintln!("\n{}", err.render()),
            None => eprintln!("\n{} {:#}", "Error:".red().bold(), e),
        }
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    // init must work even when the existing config file is broken
    let settings = match command {
        Commands::Init => return commands::init::run(),
        _ => Settings::load()?,
    };
    dispatch(&settings, command).await
}

async fn dispatch(settings: &Settings, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Init => commands::init::run(),

        Commands::View { ticket, output } => {
            commands::issue::view(settings, &ticket, &output.into()).await
        }

        Commands::Comment { ticket, text, file } => {
            commands::issue::comment(settings, &ticket, text, file).await
        }

        Commands::Edit {
            ticket,
            description,
            description_file,
            epic,
            parent,
            assign_to_me,
        } => {
            let args = commands::issue::EditArgs {
                description,
                description_file,
                epic,
                parent,
                assign_to_me,
            };
            commands::issue::edit(settings, &ticket, args).await
        }

        Commands::Create {
            project,
            summary,
            description,
            description_file,
            issue_type,
            epic,
        } => {
            let args = commands::issue::CreateArgs {
                project,
                summary,
                description,
                description_file,
                issue_type,
                epic,
            };
            commands::issue::create(settings, args).await
        }

        Commands::Epic {
            epic,
            all,
            strategy,
            output,
        } => commands::search::epic(settings, &epic, strategy, all, &output.into()).await,

        Commands::List {
            assignee,
            status,
            project,
            max,
            all,
            output,
        } => {
            let args = commands::search::ListArgs {
                assignee,
                status,
                project,
                max,
                all,
            };
            commands::search::list(settings, args, &output.into()).await
        }

        Commands::Assign { ticket } => commands::issue::assign(settings, &ticket).await,

        Commands::Shift { ticket, status } => {
            commands::workflow::shift(settings, &ticket, &status).await
        }

        Commands::Close { ticket } => commands::workflow::close(settings, &ticket).await,

        Commands::Link {
            first,
            relationship,
            second,
        } => commands::workflow::link(settings, &first, &relationship, &second).await,

        Commands::Attachments {
            ticket,
            download,
            index,
            output,
        } => {
            let args = commands::issue::AttachmentArgs {
                download,
                index,
                output,
            };
            commands::issue::attachments(settings, &ticket, args).await
        }

        Commands::Con { action } => match action {
            ConAction::View { page, output } => {
                commands::wiki::view(settings, &page, &output.into()).await
            }
            ConAction::Search {
                query,
                space,
                limit,
                output,
            } => {
                commands::wiki::search(settings, &query, space.as_deref(), limit, &output.into())
                    .await
            }
            ConAction::Create {
                title,
                space,
                parent,
                file,
            } => {
                let args = commands::wiki::CreatePageArgs {
                    title,
                    space,
                    parent,
                    file,
                };
                commands::wiki::create(settings, args).await
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("jet").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_list_defaults() {
        match parse(&["list"]).command {
            Commands::List {
                assignee,
                status,
                max,
                all,
                output,
                ..
            } => {
                assert_eq!(assignee, "me");
                assert_eq!(status, DEFAULT_STATUSES);
                assert_eq!(max, 50);
                assert!(!all);
                assert_eq!(output.format, OutputFormat::Readable);
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_grab_alias_and_verbose_anywhere() {
        let cli = parse(&["grab", "PROJ-1", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Assign { ref ticket } if ticket == "PROJ-1"));
    }

    #[test]
    fn test_epic_strategy_and_json() {
        match parse(&["epic", "PROJ-9", "--strategy", "search", "-f", "json", "--all"]).command {
            Commands::Epic {
                strategy,
                all,
                output,
                ..
            } => {
                assert_eq!(strategy, ChildStrategy::Search);
                assert!(all);
                assert_eq!(output.format, OutputFormat::Json);
            }
            _ => panic!("expected epic"),
        }
    }

    #[test]
    fn test_confluence_alias() {
        let cli = parse(&["confluence", "search", "deploy", "-s", "ENG", "-l", "5"]);
        match cli.command {
            Commands::Con {
                action: ConAction::Search {
                    query, space, limit, ..
                },
            } => {
                assert_eq!(query, "deploy");
                assert_eq!(space.as_deref(), Some("ENG"));
                assert_eq!(limit, 5);
            }
            _ => panic!("expected con search"),
        }
    }

    #[test]
    fn test_attachment_index_requires_download() {
        let result = Cli::try_parse_from(["jet", "attachments", "PROJ-1", "--index", "1"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_link_takes_three_words() {
        match parse(&["link", "PROJ-1", "is-blocked-by", "PROJ-2"]).command {
            Commands::Link {
                first,
                relationship,
                second,
            } => {
                assert_eq!((first.as_str(), relationship.as_str(), second.as_str()), ("PROJ-1", "is-blocked-by", "PROJ-2"));
            }
            _ => panic!("expected link"),
        }
    }
}
