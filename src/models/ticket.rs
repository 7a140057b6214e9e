use crate::domain::description;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Jira sends `null` for empty lists and strings as often as it omits them.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Ticket {
    pub key: String,
    #[serde(default, deserialize_with = "null_default")]
    pub fields: TicketFields,
}

impl Ticket {
    /// Recomputes the flat description from the raw payload.
    pub fn normalize_description(&mut self) {
        self.fields.description_text = description::normalize(self.fields.description.as_ref());
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketFields {
    #[serde(default, deserialize_with = "null_default")]
    pub summary: String,
    #[serde(default)]
    pub description: Option<Value>,
    /// Derived from `description`; never sent back to the provider.
    #[serde(default, skip_deserializing)]
    pub description_text: String,
    #[serde(default, deserialize_with = "null_default")]
    pub status: Named,
    #[serde(default, rename = "issuetype", deserialize_with = "null_default")]
    pub issue_type: Named,
    #[serde(default)]
    pub priority: Option<Named>,
    #[serde(default, deserialize_with = "null_default")]
    pub project: ProjectRef,
    #[serde(default)]
    pub assignee: Option<User>,
    #[serde(default)]
    pub reporter: Option<User>,
    #[serde(default, deserialize_with = "null_default")]
    pub labels: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub components: Vec<Named>,
    #[serde(default, deserialize_with = "null_default")]
    pub fix_versions: Vec<Named>,
    #[serde(default, deserialize_with = "null_default")]
    pub created: String,
    #[serde(default, deserialize_with = "null_default")]
    pub updated: String,
    #[serde(default, deserialize_with = "null_default")]
    pub comment: CommentList,
    #[serde(default, deserialize_with = "null_default")]
    pub attachment: Vec<Attachment>,
    #[serde(default)]
    pub parent: Option<LinkedIssue>,
    #[serde(default, rename = "customfield_10014")]
    pub epic_link: Option<EpicLink>,
    #[serde(default, rename = "issuelinks", deserialize_with = "null_default")]
    pub issue_links: Vec<IssueLink>,
}

impl TicketFields {
    pub fn priority_name(&self) -> Option<&str> {
        self.priority
            .as_ref()
            .map(|p| p.name.as_str())
            .filter(|name| !name.is_empty())
    }

    pub fn assignee_label(&self) -> &str {
        self.assignee
            .as_ref()
            .map(User::display_label)
            .filter(|name| !name.is_empty())
            .unwrap_or("Unassigned")
    }

    /// Epic reference as `(key, summary)`; summary may be empty.
    pub fn epic_ref(&self) -> Option<(&str, &str)> {
        match self.epic_link.as_ref()? {
            EpicLink::Key(key) if !key.is_empty() => Some((key.as_str(), "")),
            EpicLink::Ref { key, summary } if !key.is_empty() => {
                Some((key.as_str(), summary.as_str()))
            }
            _ => None,
        }
    }

    pub fn parent_ref(&self) -> Option<(&str, &str)> {
        self.parent
            .as_ref()
            .filter(|p| !p.key.is_empty())
            .map(|p| (p.key.as_str(), p.fields.summary.as_str()))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Named {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProjectRef {
    #[serde(default, deserialize_with = "null_default")]
    pub key: String,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, deserialize_with = "null_default")]
    pub account_id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub display_name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub email_address: String,
}

impl User {
    pub fn display_label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CommentList {
    #[serde(default, deserialize_with = "null_default")]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Comment {
    #[serde(default, deserialize_with = "null_default")]
    pub id: String,
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default, deserialize_with = "null_default")]
    pub author: User,
    #[serde(default, deserialize_with = "null_default")]
    pub created: String,
    #[serde(default, deserialize_with = "null_default")]
    pub updated: String,
}

impl Comment {
    /// Comment bodies use the same string-or-document encoding as descriptions.
    pub fn text(&self) -> String {
        description::normalize(self.body.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(default, deserialize_with = "null_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub filename: String,
    #[serde(default, deserialize_with = "null_default")]
    pub size: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub mime_type: String,
    /// Download URL.
    #[serde(default, deserialize_with = "null_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_default")]
    pub author: User,
    #[serde(default, deserialize_with = "null_default")]
    pub created: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LinkedIssue {
    #[serde(default, deserialize_with = "null_default")]
    pub key: String,
    #[serde(default, deserialize_with = "null_default")]
    pub fields: LinkedFields,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LinkedFields {
    #[serde(default, deserialize_with = "null_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_default")]
    pub status: Named,
    #[serde(default, rename = "issuetype", deserialize_with = "null_default")]
    pub issue_type: Named,
}

/// `customfield_10014` is a bare key on cloud sites and an object on some servers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum EpicLink {
    Key(String),
    Ref {
        key: String,
        #[serde(default, deserialize_with = "null_default")]
        summary: String,
    },
    Other(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDirection {
    Inward,
    Outward,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueLink {
    #[serde(default, rename = "type", deserialize_with = "null_default")]
    pub link_type: IssueLinkType,
    #[serde(default)]
    pub inward_issue: Option<LinkedIssue>,
    #[serde(default)]
    pub outward_issue: Option<LinkedIssue>,
}

impl IssueLink {
    /// The linked ticket together with the phrase describing it from this ticket's side.
    pub fn resolve(&self) -> Option<(LinkDirection, &str, &LinkedIssue)> {
        if let Some(issue) = &self.outward_issue {
            Some((LinkDirection::Outward, self.link_type.outward.as_str(), issue))
        } else {
            self.inward_issue
                .as_ref()
                .map(|issue| (LinkDirection::Inward, self.link_type.inward.as_str(), issue))
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IssueLinkType {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub inward: String,
    #[serde(default, deserialize_with = "null_default")]
    pub outward: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "null_default")]
    pub issues: Vec<Ticket>,
    #[serde(default)]
    pub start_at: Option<u32>,
    #[serde(default)]
    pub max_results: Option<u32>,
    #[serde(default)]
    pub total: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Transition {
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub to: Named,
}

impl Transition {
    /// Target status name, falling back to the transition's own name.
    pub fn label(&self) -> &str {
        if self.to.name.is_empty() {
            &self.name
        } else {
            &self.to.name
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransitionsResponse {
    #[serde(default, deserialize_with = "null_default")]
    pub transitions: Vec<Transition>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyRef {
    pub key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NameRef {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewIssue {
    pub project: KeyRef,
    pub summary: String,
    pub description: String,
    #[serde(rename = "issuetype")]
    pub issue_type: NameRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<KeyRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateIssueRequest {
    pub fields: NewIssue,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CreatedIssue {
    #[serde(default)]
    pub id: String,
    pub key: String,
}

/// Only the fields that are set are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FieldUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<KeyRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<AssigneeRef>,
}

impl FieldUpdate {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.parent.is_none() && self.assignee.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateIssueRequest {
    pub fields: FieldUpdate,
}

/// Cloud sites identify users by account id, older servers by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AssigneeRef {
    Id { id: String },
    Name { name: String },
}

impl User {
    pub fn assignee_ref(&self) -> AssigneeRef {
        if self.account_id.is_empty() {
            AssigneeRef::Name {
                name: self.name.clone(),
            }
        } else {
            AssigneeRef::Id {
                id: self.account_id.clone(),
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentRequest {
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitionRequest {
    pub transition: TransitionRef,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitionRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueLinkRequest {
    #[serde(rename = "type")]
    pub link_type: LinkTypeRef,
    pub inward_issue: LinkKey,
    pub outward_issue: LinkKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkTypeRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkKey {
    pub key: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ticket_tolerates_nulls() {
        let raw = json!({
            "key": "PROJ-1",
            "fields": {
                "summary": "Fix login",
                "description": null,
                "status": {"name": "To Do"},
                "issuetype": {"name": "Bug"},
                "priority": null,
                "assignee": null,
                "labels": null,
                "components": [],
                "customfield_10014": null
            }
        });
        let ticket: Ticket = serde_json::from_value(raw).unwrap();
        assert_eq!(ticket.fields.summary, "Fix login");
        assert!(ticket.fields.labels.is_empty());
        assert_eq!(ticket.fields.assignee_label(), "Unassigned");
        assert_eq!(ticket.fields.priority_name(), None);
        assert_eq!(ticket.fields.epic_ref(), None);
    }

    #[test]
    fn test_epic_link_shapes() {
        let bare: TicketFields =
            serde_json::from_value(json!({"customfield_10014": "PROJ-9"})).unwrap();
        assert_eq!(bare.epic_ref(), Some(("PROJ-9", "")));

        let object: TicketFields = serde_json::from_value(
            json!({"customfield_10014": {"key": "PROJ-9", "summary": "Checkout"}}),
        )
        .unwrap();
        assert_eq!(object.epic_ref(), Some(("PROJ-9", "Checkout")));

        let odd: TicketFields =
            serde_json::from_value(json!({"customfield_10014": 42})).unwrap();
        assert_eq!(odd.epic_ref(), None);
    }

    #[test]
    fn test_normalize_description_from_document() {
        let mut ticket: Ticket = serde_json::from_value(json!({
            "key": "PROJ-2",
            "fields": {
                "description": {
                    "type": "doc",
                    "content": [{"type": "paragraph", "content": [{"type": "text", "text": "Hello"}]}]
                }
            }
        }))
        .unwrap();
        ticket.normalize_description();
        assert!(ticket.fields.description_text.contains("Hello"));
    }

    #[test]
    fn test_description_text_is_not_read_from_payload() {
        let ticket: Ticket = serde_json::from_value(json!({
            "key": "PROJ-3",
            "fields": {"descriptionText": "injected"}
        }))
        .unwrap();
        assert_eq!(ticket.fields.description_text, "");
    }

    #[test]
    fn test_issue_link_resolution_prefers_outward() {
        let link: IssueLink = serde_json::from_value(json!({
            "type": {"name": "Blocks", "inward": "is blocked by", "outward": "blocks"},
            "inwardIssue": {"key": "PROJ-7", "fields": {"summary": "Upstream"}}
        }))
        .unwrap();
        let (direction, label, issue) = link.resolve().unwrap();
        assert_eq!(direction, LinkDirection::Inward);
        assert_eq!(label, "is blocked by");
        assert_eq!(issue.key, "PROJ-7");
    }

    #[test]
    fn test_transition_label_falls_back_to_name() {
        let t: Transition = serde_json::from_value(json!({"id": "11", "name": "Start"})).unwrap();
        assert_eq!(t.label(), "Start");
        let t: Transition =
            serde_json::from_value(json!({"id": "21", "name": "Start", "to": {"name": "In Progress"}}))
                .unwrap();
        assert_eq!(t.label(), "In Progress");
    }

    #[test]
    fn test_create_request_omits_missing_parent() {
        let req = CreateIssueRequest {
            fields: NewIssue {
                project: KeyRef { key: "PROJ".into() },
                summary: "New".into(),
                description: String::new(),
                issue_type: NameRef { name: "Story".into() },
                parent: None,
            },
        };
        let value = serde_json::to_value(&req).unwrap();
        assert!(value["fields"].get("parent").is_none());
        assert_eq!(value["fields"]["issuetype"]["name"], "Story");
    }

    #[test]
    fn test_field_update_sends_only_set_fields() {
        let update = FieldUpdate {
            parent: Some(KeyRef { key: "PROJ-9".into() }),
            ..Default::default()
        };
        assert!(!update.is_empty());
        let value = serde_json::to_value(UpdateIssueRequest { fields: update }).unwrap();
        assert_eq!(value, json!({"fields": {"parent": {"key": "PROJ-9"}}}));
        assert!(FieldUpdate::default().is_empty());
    }

    #[test]
    fn test_assignee_prefers_account_id() {
        let cloud = User {
            account_id: "5b10".into(),
            name: "dev".into(),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(cloud.assignee_ref()).unwrap(), json!({"id": "5b10"}));

        let server = User {
            name: "dev".into(),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(server.assignee_ref()).unwrap(), json!({"name": "dev"}));
    }
}
