//! Article metadata copied in at submission time

use crate::error::ApprovalError;
use crate::ids::ArticleId;
use crate::record::ApprovalRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Threat severity; ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Informational,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Informational => "informational",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ApprovalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "informational" => Ok(Severity::Informational),
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(ApprovalError::Validation(format!(
                "unknown severity: {}",
                other
            ))),
        }
    }
}

/// The slice of an article the workflow needs for routing and filtering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

/// An article together with its approval record, as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedArticle {
    pub article: Article,
    pub record: ApprovalRecord,
}

impl TrackedArticle {
    /// Start tracking a newly submitted article
    pub fn submit(article: Article) -> Self {
        let record = ApprovalRecord::new(article.id, article.created_at);
        Self { article, record }
    }

    pub fn id(&self) -> ArticleId {
        self.article.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::ApprovalStatus;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Informational < Severity::Low);
        assert_eq!("critical".parse::<Severity>().unwrap(), Severity::Critical);
        assert!("severe".parse::<Severity>().is_err());
    }

    #[test]
    fn test_submit_starts_at_marketing() {
        let article = Article {
            id: ArticleId::generate(),
            title: "CVE-2024-3400 exploited in the wild".into(),
            category: Some("vulnerabilities".into()),
            severity: Some(Severity::Critical),
            created_at: Utc::now(),
            published_at: None,
        };
        let tracked = TrackedArticle::submit(article.clone());
        assert_eq!(tracked.id(), article.id);
        assert_eq!(tracked.record.article_id, article.id);
        assert_eq!(tracked.record.status, ApprovalStatus::initial());
        assert_eq!(tracked.record.created_at, article.created_at);
    }
}
