use crate::api::transport::{with_query, Transport};
use crate::config::settings::ProviderConfig;
use crate::errors::{JetError, Result};
use crate::models::page::{CreatePageRequest, Page, SearchResponse, Space, SpaceList};

pub struct ConfluenceClient {
    transport: Transport,
}

impl ConfluenceClient {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(config)?,
        })
    }

    pub async fn get_page(&self, page_id: &str) -> Result<Page> {
        let path = with_query(
            &format!("/wiki/api/v2/pages/{}", urlencoding::encode(page_id)),
            &[("body-format", "storage".to_string())],
        );
        self.transport
            .get(&path)
            .await?
            .classify("view this page", &format!("Page {}", page_id))?
            .json()
    }

    /// Raw CQL search.
    pub async fn search(&self, cql: &str, limit: u32) -> Result<SearchResponse> {
        let path = with_query(
            "/wiki/rest/api/search",
            &[("cql", cql.to_string()), ("limit", limit.to_string())],
        );
        self.transport
            .get(&path)
            .await?
            .classify("search", "Search")?
            .json()
    }

    /// Full-text page search, optionally restricted to one space.
    pub async fn search_text(&self, text: &str, space: Option<&str>, limit: u32) -> Result<SearchResponse> {
        self.search(&text_query(text, space), limit).await
    }

    pub async fn search_space(&self, space_key: &str, limit: u32) -> Result<SearchResponse> {
        let cql = format!("type=page AND space=\"{}\"", escape_cql(space_key));
        self.search(&cql, limit).await
    }

    pub async fn get_space(&self, space_key: &str) -> Result<Space> {
        let path = with_query("/wiki/api/v2/spaces", &[("keys", space_key.to_string())]);
        let list: SpaceList = self
            .transport
            .get(&path)
            .await?
            .classify("view this space", &format!("Space {}", space_key))?
            .json()?;

        list.results
            .into_iter()
            .next()
            .ok_or_else(|| JetError::not_found(format!("Space {}", space_key)))
    }

    /// Resolves a space key to its numeric id; numeric input is returned as-is.
    pub async fn resolve_space_id(&self, space: &str) -> Result<String> {
        if !space.is_empty() && space.chars().all(|c| c.is_ascii_digit()) {
            return Ok(space.to_string());
        }
        tracing::debug!(space, "looking up space id");
        Ok(self.get_space(space).await?.id)
    }

    pub async fn create_page(&self, request: &CreatePageRequest) -> Result<Page> {
        self.transport
            .post("/wiki/api/v2/pages", request)
            .await?
            .classify("create pages in this space", "Space")?
            .json()
    }
}

fn escape_cql(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

pub fn text_query(text: &str, space: Option<&str>) -> String {
    match space.filter(|s| !s.is_empty()) {
        Some(space) => format!(
            "type=page AND space=\"{}\" AND text~\"{}\"",
            escape_cql(space),
            escape_cql(text)
        ),
        None => format!("type=page AND text~\"{}\"", escape_cql(text)),
    }
}
