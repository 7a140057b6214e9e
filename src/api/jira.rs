use crate::api::transport::{with_query, Transport};
use crate::config::settings::ProviderConfig;
use crate::domain::search::{PageSource, SearchPage};
use crate::errors::{JetError, Result};
use crate::models::ticket::{
    Attachment, CommentRequest, CreateIssueRequest, CreatedIssue, FieldUpdate, IssueLinkRequest,
    NewIssue, SearchResponse, Ticket, Transition, TransitionRef, TransitionRequest,
    TransitionsResponse, UpdateIssueRequest, User,
};
use async_trait::async_trait;
use clap::ValueEnum;

/// Fields requested for every ticket in a search result.
const SEARCH_FIELDS: &str = "summary,description,status,assignee,reporter,priority,labels,components,fixVersions,created,updated,issuetype,project,parent,customfield_10014";

pub const EPIC_LISTING_PAGE_SIZE: u32 = 50;
pub const EPIC_SEARCH_PAGE_SIZE: u32 = 100;

pub struct JiraClient {
    transport: Transport,
}

impl JiraClient {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(config)?,
        })
    }

    pub fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{}", self.transport.base_url(), key)
    }

    pub async fn get_issue(&self, key: &str) -> Result<Ticket> {
        let path = format!("/rest/api/2/issue/{}", urlencoding::encode(key));
        let response = self
            .transport
            .get(&path)
            .await?
            .classify("view this issue", &format!("Issue {}", key))?;

        let mut ticket: Ticket = response.json()?;
        ticket.normalize_description();
        Ok(ticket)
    }

    pub async fn add_comment(&self, key: &str, body: &str) -> Result<()> {
        let path = format!("/rest/api/2/issue/{}/comment", urlencoding::encode(key));
        let request = CommentRequest {
            body: body.to_string(),
        };
        self.transport
            .post(&path, &request)
            .await?
            .classify("comment on this issue", &format!("Issue {}", key))?;
        Ok(())
    }

    pub async fn update_issue(&self, key: &str, fields: FieldUpdate) -> Result<()> {
        let path = format!("/rest/api/2/issue/{}", urlencoding::encode(key));
        self.transport
            .put(&path, &UpdateIssueRequest { fields })
            .await?
            .classify("update this issue", &format!("Issue {}", key))?;
        Ok(())
    }

    pub async fn create_issue(&self, fields: NewIssue) -> Result<CreatedIssue> {
        let project = fields.project.key.clone();
        let response = self
            .transport
            .post("/rest/api/2/issue", &CreateIssueRequest { fields })
            .await?
            .classify(
                "create issues in this project",
                &format!("Project {}", project),
            )?;
        response.json()
    }

    /// One page of a JQL search.
    pub async fn search_page(&self, jql: &str, start_at: u32, max_results: u32) -> Result<SearchPage> {
        let path = with_query(
            "/rest/api/3/search/jql",
            &[
                ("jql", jql.to_string()),
                ("startAt", start_at.to_string()),
                ("maxResults", max_results.to_string()),
                ("fields", SEARCH_FIELDS.to_string()),
            ],
        );
        let response = self
            .transport
            .get(&path)
            .await?
            .classify("search issues", "Search")?;

        let parsed: SearchResponse = response.json()?;
        Ok(SearchPage {
            tickets: parsed.issues,
            reported_total: parsed.total,
        })
    }

    /// One page of the agile board's direct listing of an epic's children.
    pub async fn epic_issues_page(&self, epic: &str, start_at: u32, max_results: u32) -> Result<SearchPage> {
        let path = with_query(
            &format!("/rest/agile/1.0/epic/{}/issue", urlencoding::encode(epic)),
            &[
                ("startAt", start_at.to_string()),
                ("maxResults", max_results.to_string()),
                ("fields", SEARCH_FIELDS.to_string()),
            ],
        );
        let response = self
            .transport
            .get(&path)
            .await?
            .classify("view epic issues", &format!("Epic {}", epic))?;

        let parsed: SearchResponse = response.json()?;
        Ok(SearchPage {
            tickets: parsed.issues,
            reported_total: parsed.total,
        })
    }

    pub async fn current_user(&self) -> Result<User> {
        self.transport
            .get("/rest/api/2/myself")
            .await?
            .classify("view user information", "Current user")?
            .json()
    }

    pub async fn transitions(&self, key: &str) -> Result<Vec<Transition>> {
        let path = format!("/rest/api/2/issue/{}/transitions", urlencoding::encode(key));
        let response: TransitionsResponse = self
            .transport
            .get(&path)
            .await?
            .classify("view transitions", &format!("Issue {}", key))?
            .json()?;
        Ok(response.transitions)
    }

    pub async fn transition_issue(&self, key: &str, transition_id: &str) -> Result<()> {
        let path = format!("/rest/api/2/issue/{}/transitions", urlencoding::encode(key));
        let request = TransitionRequest {
            transition: TransitionRef {
                id: transition_id.to_string(),
            },
        };
        self.transport
            .post(&path, &request)
            .await?
            .classify("transition this issue", &format!("Issue {}", key))?;
        Ok(())
    }

    pub async fn link_issues(&self, request: &IssueLinkRequest) -> Result<()> {
        self.transport
            .post("/rest/api/2/issueLink", request)
            .await?
            .classify("link issues", "Issue")?;
        Ok(())
    }

    pub async fn download_attachment(&self, attachment: &Attachment) -> Result<Vec<u8>> {
        if attachment.content.is_empty() {
            return Err(JetError::invalid("no download URL available"));
        }
        self.transport.download(&attachment.content).await
    }
}

/// How the children of an epic are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChildStrategy {
    /// The agile board's epic listing.
    Agile,
    /// A filter query on the epic link field.
    Search,
}

pub struct JqlSearch<'a> {
    client: &'a JiraClient,
    jql: String,
}

impl<'a> JqlSearch<'a> {
    pub fn new(client: &'a JiraClient, jql: impl Into<String>) -> Self {
        Self {
            client,
            jql: jql.into(),
        }
    }
}

#[async_trait]
impl<'a> PageSource for JqlSearch<'a> {
    async fn fetch_page(&self, start_at: u32, page_size: u32) -> Result<SearchPage> {
        self.client.search_page(&self.jql, start_at, page_size).await
    }

    fn describe(&self) -> String {
        format!("jql search `{}`", self.jql)
    }
}

pub struct EpicIssueListing<'a> {
    client: &'a JiraClient,
    epic: String,
}

#[async_trait]
impl<'a> PageSource for EpicIssueListing<'a> {
    async fn fetch_page(&self, start_at: u32, page_size: u32) -> Result<SearchPage> {
        self.client.epic_issues_page(&self.epic, start_at, page_size).await
    }

    fn describe(&self) -> String {
        format!("agile listing of epic {}", self.epic)
    }
}

/// Picks the page source and page size for listing an epic's children.
pub fn children_source<'a>(
    client: &'a JiraClient,
    strategy: ChildStrategy,
    epic: &str,
) -> (Box<dyn PageSource + 'a>, u32) {
    match strategy {
        ChildStrategy::Agile => (
            Box::new(EpicIssueListing {
                client,
                epic: epic.to_string(),
            }),
            EPIC_LISTING_PAGE_SIZE,
        ),
        ChildStrategy::Search => (
            Box::new(JqlSearch::new(client, epic_child_jql(epic))),
            EPIC_SEARCH_PAGE_SIZE,
        ),
    }
}

pub fn epic_child_jql(epic: &str) -> String {
    format!("\"Epic Link\" = {} ORDER BY key ASC", epic)
}
