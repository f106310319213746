//! Queue resolver
//!
//! A queue is a pure function of the stored records and the caller's role:
//! gate-bound roles see exactly the items waiting at their gate, admins see
//! every pending item (optionally narrowed to one gate).

use approval_types::{
    ApprovalError, ApprovalResult, Gate, Role, Severity, TrackedArticle,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Optional narrowing of a queue
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueFilters {
    pub category: Option<String>,
    pub severity: Option<Severity>,
    /// Inclusive lower bound on `published_at`
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `published_at`
    pub date_to: Option<DateTime<Utc>>,
    /// Only honored for admins
    pub gate: Option<Gate>,
}

impl QueueFilters {
    fn matches(&self, item: &TrackedArticle) -> bool {
        let article = &item.article;
        if let Some(category) = &self.category {
            if article.category.as_ref() != Some(category) {
                return false;
            }
        }
        if let Some(severity) = self.severity {
            if article.severity != Some(severity) {
                return false;
            }
        }
        if self.date_from.is_some() || self.date_to.is_some() {
            let Some(published) = article.published_at else {
                return false;
            };
            if self.date_from.is_some_and(|from| published < from) {
                return false;
            }
            if self.date_to.is_some_and(|to| published > to) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    CreatedAt,
    PublishedAt,
    Severity,
    Title,
}

impl FromStr for SortBy {
    type Err = ApprovalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(SortBy::CreatedAt),
            "published_at" => Ok(SortBy::PublishedAt),
            "severity" => Ok(SortBy::Severity),
            "title" => Ok(SortBy::Title),
            other => Err(ApprovalError::Validation(format!(
                "sortBy must be one of created_at, published_at, severity, title; got {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = ApprovalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(ApprovalError::Validation(format!(
                "sortOrder must be asc or desc; got {}",
                other
            ))),
        }
    }
}

/// 1-based page selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn validate(&self) -> ApprovalResult<()> {
        if self.page < 1 {
            return Err(ApprovalError::Validation("page must be at least 1".into()));
        }
        if self.page_size < 1 || self.page_size > MAX_PAGE_SIZE {
            return Err(ApprovalError::Validation(format!(
                "pageSize must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        Ok(())
    }

    fn offset(&self) -> usize {
        (self.page as usize - 1) * self.page_size as usize
    }
}

/// Everything that determines a queue page besides the caller's role
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueQuery {
    pub filters: QueueFilters,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub pagination: Pagination,
}

impl QueueQuery {
    pub fn validate(&self) -> ApprovalResult<()> {
        self.pagination.validate()?;
        if let (Some(from), Some(to)) = (self.filters.date_from, self.filters.date_to) {
            if from > to {
                return Err(ApprovalError::Validation(
                    "dateFrom must not be after dateTo".into(),
                ));
            }
        }
        Ok(())
    }
}

/// One page of a role's queue
#[derive(Debug, Clone, PartialEq)]
pub struct QueuePage {
    pub items: Vec<TrackedArticle>,
    pub role: Role,
    /// Gate the queue was resolved for; `None` for an admin's all-gates view
    pub target_gate: Option<Gate>,
    pub page: u32,
    pub page_size: u32,
    /// Matching items across all pages
    pub total_items: usize,
}

impl QueuePage {
    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.page_size.max(1) as usize)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QueueResolver;

impl QueueResolver {
    pub const fn new() -> Self {
        Self
    }

    /// The gate whose items `role` sees, after ignoring filters it may not use
    pub fn target_gate(
        &self,
        role: Role,
        requested: Option<Gate>,
    ) -> ApprovalResult<Option<Gate>> {
        if let Some(home) = role.home_gate() {
            return Ok(Some(home));
        }
        if role.is_admin() {
            return Ok(requested);
        }
        Err(ApprovalError::InsufficientRole(format!(
            "role {} has no approval queue",
            role
        )))
    }

    pub fn resolve(
        &self,
        role: Role,
        query: &QueueQuery,
        records: Vec<TrackedArticle>,
    ) -> ApprovalResult<QueuePage> {
        let target_gate = self.target_gate(role, query.filters.gate)?;
        query.validate()?;

        let mut items: Vec<TrackedArticle> = records
            .into_iter()
            .filter(|item| match (item.record.current_gate(), target_gate) {
                (Some(current), Some(target)) => current == target,
                (Some(_), None) => true,
                (None, _) => false,
            })
            .filter(|item| query.filters.matches(item))
            .collect();

        items.sort_by(|a, b| {
            let primary = compare(query.sort_by, a, b);
            let primary = match query.sort_order {
                SortOrder::Asc => primary,
                SortOrder::Desc => primary.reverse(),
            };
            primary.then_with(|| a.id().cmp(&b.id()))
        });

        let total_items = items.len();
        let items = items
            .into_iter()
            .skip(query.pagination.offset())
            .take(query.pagination.page_size as usize)
            .collect();

        Ok(QueuePage {
            items,
            role,
            target_gate,
            page: query.pagination.page,
            page_size: query.pagination.page_size,
            total_items,
        })
    }
}

fn compare(sort_by: SortBy, a: &TrackedArticle, b: &TrackedArticle) -> Ordering {
    match sort_by {
        SortBy::CreatedAt => a.article.created_at.cmp(&b.article.created_at),
        SortBy::PublishedAt => a.article.published_at.cmp(&b.article.published_at),
        SortBy::Severity => a.article.severity.cmp(&b.article.severity),
        SortBy::Title => a.article.title.cmp(&b.article.title),
    }
}
