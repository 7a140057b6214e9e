//! Maps the words people type onto the identifiers the provider expects.

use crate::errors::{JetError, Result};
use crate::models::ticket::{IssueLinkRequest, LinkKey, LinkTypeRef, Transition};

const CLOSING_STATUSES: [&str; 4] = ["done", "closed", "resolved", "complete"];

/// Picks the transition whose target status best matches `target`.
///
/// An exact case-insensitive match wins over a partial one; among equals the
/// provider's order decides.
pub fn resolve_transition<'a>(options: &'a [Transition], target: &str) -> Result<&'a Transition> {
    let wanted = target.trim().to_lowercase();

    let exact = options
        .iter()
        .find(|t| t.label().to_lowercase() == wanted);

    let found = exact.or_else(|| {
        if wanted.is_empty() {
            return None;
        }
        options.iter().find(|t| {
            let label = t.label().to_lowercase();
            !label.is_empty() && (label.contains(&wanted) || wanted.contains(&label))
        })
    });

    found.ok_or_else(|| no_such_transition(options, target))
}

/// Finds a transition that closes the ticket (done, closed, resolved or complete).
pub fn resolve_closing(options: &[Transition]) -> Result<&Transition> {
    options
        .iter()
        .find(|t| {
            let label = t.label().to_lowercase();
            CLOSING_STATUSES
                .iter()
                .any(|status| label == *status || label.contains(status))
        })
        .ok_or_else(|| no_such_transition(options, "Done/Closed"))
}

fn no_such_transition(options: &[Transition], target: &str) -> JetError {
    JetError::NoSuchTransition {
        target: target.to_string(),
        available: options.iter().map(|t| t.label().to_string()).collect(),
    }
}

/// `(word, link type name)`; `is-` words are the inverse reading of the same type.
const RELATIONSHIPS: &[(&str, &str)] = &[
    ("blocks", "Blocks"),
    ("is-blocked-by", "Blocks"),
    ("relates-to", "Relates"),
    ("relates", "Relates"),
    ("duplicates", "Duplicate"),
    ("is-duplicated-by", "Duplicate"),
    ("clones", "Cloners"),
    ("is-cloned-by", "Cloners"),
    ("causes", "Causes"),
    ("is-caused-by", "Causes"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkPlan {
    pub link_type: &'static str,
    /// Operands are swapped before submission.
    pub inverse: bool,
}

impl LinkPlan {
    pub fn parse(word: &str) -> Result<Self> {
        let word = word.trim().to_lowercase();
        RELATIONSHIPS
            .iter()
            .find(|(name, _)| *name == word)
            .map(|(name, link_type)| LinkPlan {
                link_type: *link_type,
                inverse: name.starts_with("is-"),
            })
            .ok_or(JetError::UnknownRelationship(word))
    }

    /// Builds the request for "`first` <word> `second`".
    pub fn build_request(&self, first: &str, second: &str) -> IssueLinkRequest {
        let (inward, outward) = if self.inverse {
            (second, first)
        } else {
            (first, second)
        };
        IssueLinkRequest {
            link_type: LinkTypeRef {
                name: self.link_type.to_string(),
            },
            inward_issue: LinkKey {
                key: inward.to_string(),
            },
            outward_issue: LinkKey {
                key: outward.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transitions() -> Vec<Transition> {
        serde_json::from_value(json!([
            {"id": "11", "name": "Start", "to": {"name": "In Progress"}},
            {"id": "21", "name": "Review", "to": {"name": "In Review"}},
            {"id": "31", "name": "Finish", "to": {"name": "Done"}}
        ]))
        .unwrap()
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let options = transitions();
        let t = resolve_transition(&options, "done").unwrap();
        assert_eq!(t.id, "31");
    }

    #[test]
    fn test_partial_match_in_provider_order() {
        let options = transitions();
        assert_eq!(resolve_transition(&options, "prog").unwrap().id, "11");
        // "in" is contained in both "In Progress" and "In Review"; first wins
        assert_eq!(resolve_transition(&options, "in").unwrap().id, "11");
    }

    #[test]
    fn test_exact_beats_earlier_partial() {
        let options: Vec<Transition> = serde_json::from_value(json!([
            {"id": "1", "name": "a", "to": {"name": "Done Later"}},
            {"id": "2", "name": "b", "to": {"name": "Done"}}
        ]))
        .unwrap();
        assert_eq!(resolve_transition(&options, "DONE").unwrap().id, "2");
    }

    #[test]
    fn test_target_containing_label_matches() {
        let options = transitions();
        assert_eq!(resolve_transition(&options, "done now").unwrap().id, "31");
    }

    #[test]
    fn test_no_match_lists_every_label() {
        let options = transitions();
        let err = resolve_transition(&options, "Cancelled").unwrap_err();
        match err {
            JetError::NoSuchTransition { target, available } => {
                assert_eq!(target, "Cancelled");
                assert_eq!(available, vec!["In Progress", "In Review", "Done"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_options() {
        let err = resolve_transition(&[], "Done").unwrap_err();
        assert!(matches!(
            err,
            JetError::NoSuchTransition { ref available, .. } if available.is_empty()
        ));
    }

    #[test]
    fn test_closing_transition() {
        let options: Vec<Transition> = serde_json::from_value(json!([
            {"id": "1", "name": "Reopen", "to": {"name": "To Do"}},
            {"id": "2", "name": "Resolve", "to": {"name": "Resolved"}}
        ]))
        .unwrap();
        assert_eq!(resolve_closing(&options).unwrap().id, "2");
        assert!(resolve_closing(&options[..1]).is_err());
    }

    #[test]
    fn test_link_words() {
        let plan = LinkPlan::parse("Blocks").unwrap();
        assert_eq!(plan.link_type, "Blocks");
        assert!(!plan.inverse);

        let plan = LinkPlan::parse("is-duplicated-by").unwrap();
        assert_eq!(plan.link_type, "Duplicate");
        assert!(plan.inverse);

        assert_eq!(LinkPlan::parse("relates").unwrap().link_type, "Relates");
    }

    #[test]
    fn test_unknown_relationship() {
        let err = LinkPlan::parse("eats").unwrap_err();
        assert!(matches!(err, JetError::UnknownRelationship(ref w) if w == "eats"));
    }

    #[test]
    fn test_inverse_words_swap_operands() {
        let forward = LinkPlan::parse("blocks").unwrap().build_request("A-1", "B-2");
        assert_eq!(forward.inward_issue.key, "A-1");
        assert_eq!(forward.outward_issue.key, "B-2");

        let inverse = LinkPlan::parse("is-blocked-by")
            .unwrap()
            .build_request("B-2", "A-1");
        assert_eq!(forward, inverse);
    }

    #[test]
    fn test_link_request_shape() {
        let req = LinkPlan::parse("clones").unwrap().build_request("A-1", "B-2");
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "type": {"name": "Cloners"},
                "inwardIssue": {"key": "A-1"},
                "outwardIssue": {"key": "B-2"}
            })
        );
    }
}
