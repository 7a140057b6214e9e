use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub space_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<PageBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    #[serde(default, rename = "_links", skip_serializing_if = "Option::is_none")]
    pub links: Option<PageLinks>,
}

impl Page {
    /// Storage-format markup, if the body was requested.
    pub fn storage(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| b.storage.as_ref())
            .map(|c| c.value.as_str())
    }

    pub fn web_url(&self) -> Option<String> {
        self.links.as_ref().and_then(PageLinks::web_url)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PageBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<BodyContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<BodyContent>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BodyContent {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub representation: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Version {
    #[serde(default)]
    pub number: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub struct PageLinks {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub webui: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tinyui: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub editui: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base: String,
}

impl PageLinks {
    /// Absolute URL; needs both the site base and the page path.
    pub fn web_url(&self) -> Option<String> {
        if self.base.is_empty() || self.webui.is_empty() {
            None
        } else {
            Some(format!("{}{}", self.base, self.webui))
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub start: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub size: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(default)]
    pub content: ContentInfo,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub last_modified: String,
}

impl SearchResult {
    /// Content title wins over the highlighted result title.
    pub fn display_title(&self) -> &str {
        if self.content.title.is_empty() {
            &self.title
        } else {
            &self.content.title
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContentInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub space: SpaceInfo,
    #[serde(default, rename = "_links")]
    pub links: PageLinks,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SpaceInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Space {
    pub id: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub space_type: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpaceList {
    #[serde(default)]
    pub results: Vec<Space>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePageRequest {
    pub space_id: String,
    pub status: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub body: CreatePageBody,
}

impl CreatePageRequest {
    /// A published page with a storage-format body.
    pub fn storage(space_id: &str, title: &str, content: &str, parent_id: Option<&str>) -> Self {
        Self {
            space_id: space_id.to_string(),
            status: "current".to_string(),
            title: title.to_string(),
            parent_id: parent_id.filter(|p| !p.is_empty()).map(str::to_string),
            body: CreatePageBody {
                representation: "storage".to_string(),
                value: content.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePageBody {
    pub representation: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_from_v2_payload() {
        let page: Page = serde_json::from_value(json!({
            "id": "123456",
            "status": "current",
            "title": "Runbook",
            "spaceId": "98304",
            "body": {"storage": {"value": "<p>Hi</p>", "representation": "storage"}},
            "version": {"number": 4},
            "_links": {"webui": "/spaces/ENG/pages/123456/Runbook", "base": "https://acme.atlassian.net/wiki"}
        }))
        .unwrap();
        assert_eq!(page.storage(), Some("<p>Hi</p>"));
        assert_eq!(page.version.as_ref().map(|v| v.number), Some(4));
        assert_eq!(
            page.web_url().as_deref(),
            Some("https://acme.atlassian.net/wiki/spaces/ENG/pages/123456/Runbook")
        );
    }

    #[test]
    fn test_web_url_needs_base() {
        let links = PageLinks {
            webui: "/x".into(),
            ..Default::default()
        };
        assert_eq!(links.web_url(), None);
    }

    #[test]
    fn test_search_result_title_preference() {
        let result: SearchResult = serde_json::from_value(json!({
            "title": "@@@hl@@@Runbook@@@endhl@@@",
            "content": {"id": "1", "title": "Runbook"}
        }))
        .unwrap();
        assert_eq!(result.display_title(), "Runbook");
    }

    #[test]
    fn test_create_request_shape() {
        let req = CreatePageRequest::storage("98304", "Notes", "<p>x</p>", Some(""));
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "spaceId": "98304",
                "status": "current",
                "title": "Notes",
                "body": {"representation": "storage", "value": "<p>x</p>"}
            })
        );
    }
}
