//! Knowledge base and paper entities

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use validator::{Validate, ValidationError};

/// Bibliographic record nested inside a knowledge base.
///
/// Ids are unique within the owning knowledge base only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    pub id: i64,
    pub title: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub publish_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Paper payload before an id has been assigned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewPaper {
    #[validate(length(min = 1, max = 1000))]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    #[serde(default)]
    pub publish_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl NewPaper {
    pub fn with_id(self, id: i64) -> Paper {
        Paper {
            id,
            title: self.title,
            authors: self.authors,
            abstract_text: self.abstract_text,
            publish_date: self.publish_date,
            doi: self.doi,
            url: self.url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBase {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Owner; not checked against the user collection
    pub user_id: i64,
    pub papers: Vec<Paper>,
    pub tags: Vec<String>,
    pub stars: u64,
    pub forks: u64,
    pub created_at: NaiveDate,
    pub updated_at: NaiveDate,
}

impl KnowledgeBase {
    /// Next paper id: `max(existing, 0) + 1`
    pub fn next_paper_id(&self) -> i64 {
        self.papers.iter().map(|p| p.id).max().unwrap_or(0).max(0) + 1
    }

    pub fn paper(&self, paper_id: i64) -> Option<&Paper> {
        self.papers.iter().find(|p| p.id == paper_id)
    }
}

/// Knowledge base payload; id, dates and counters are assigned on insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewKnowledgeBase {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub user_id: i64,
    #[validate(custom(function = "unique_paper_ids"))]
    #[serde(default)]
    pub papers: Vec<Paper>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn unique_paper_ids(papers: &[Paper]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(papers.len());
    if papers.iter().all(|p| seen.insert(p.id)) {
        Ok(())
    } else {
        Err(ValidationError::new("duplicate_paper_id")
            .with_message("paper ids must be unique within a knowledge base".into()))
    }
}

/// Input of the composite "create with papers" flow. The owner is always
/// the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseDraft {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(nested)]
    #[serde(default)]
    pub papers: Vec<NewPaper>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(id: i64) -> Paper {
        NewPaper {
            title: format!("Paper {}", id),
            authors: vec![],
            abstract_text: String::new(),
            publish_date: "2023-01-01".into(),
            doi: None,
            url: None,
        }
        .with_id(id)
    }

    #[test]
    fn test_next_paper_id_uses_max_not_len() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let mut kb = KnowledgeBase {
            id: 1,
            title: "kb".into(),
            description: String::new(),
            user_id: 0,
            papers: vec![],
            tags: vec![],
            stars: 0,
            forks: 0,
            created_at: date,
            updated_at: date,
        };
        assert_eq!(kb.next_paper_id(), 1);

        kb.papers = vec![paper(2), paper(9)];
        assert_eq!(kb.next_paper_id(), 10);
    }

    #[test]
    fn test_paper_json_shape() {
        let json = serde_json::to_value(paper(3)).unwrap();
        assert_eq!(json["publishDate"], "2023-01-01");
        assert!(json.get("abstract").is_some());
        assert!(json.get("doi").is_none());
    }

    #[test]
    fn test_duplicate_paper_ids_rejected() {
        let mut kb = NewKnowledgeBase {
            title: "Dupes".into(),
            description: String::new(),
            user_id: 0,
            papers: vec![paper(1), paper(1)],
            tags: vec![],
        };
        let errors = kb.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("papers"));

        kb.papers = vec![paper(1), paper(2)];
        assert!(kb.validate().is_ok());
    }

    #[test]
    fn test_empty_title_rejected() {
        let draft = KnowledgeBaseDraft {
            title: String::new(),
            description: String::new(),
            papers: vec![],
            tags: vec![],
        };
        assert!(draft.validate().is_err());
    }
}
