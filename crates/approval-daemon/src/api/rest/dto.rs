//! Request and response bodies

use approval_engine::{
    Pagination, QueueFilters, QueuePage, QueueQuery, Submission, DEFAULT_PAGE_SIZE,
};
use approval_types::{
    ApprovalError, ApprovalProgress, ApprovalRecord, ApprovalResult, ApprovalStatus, ArticleId,
    Gate, HistoryEntry, RejectionDetails, ReleaseDetails, Role, RoleAssignment, Severity,
    TrackedArticle,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest {
    pub reason: String,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// Body for release and reset; may be empty
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionedRequest {
    #[serde(default)]
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde(default)]
    pub id: Option<ArticleId>,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl From<SubmitRequest> for Submission {
    fn from(req: SubmitRequest) -> Self {
        Submission {
            id: req.id,
            title: req.title,
            category: req.category,
            severity: req.severity,
            published_at: req.published_at,
        }
    }
}

/// Queue query string; accepts both `pageSize` and `page_size` spellings
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueParams {
    pub page: Option<u32>,
    #[serde(alias = "page_size")]
    pub page_size: Option<u32>,
    pub category: Option<String>,
    pub severity: Option<String>,
    #[serde(alias = "date_from")]
    pub date_from: Option<String>,
    #[serde(alias = "date_to")]
    pub date_to: Option<String>,
    pub gate: Option<String>,
    #[serde(alias = "sort_by")]
    pub sort_by: Option<String>,
    #[serde(alias = "sort_order")]
    pub sort_order: Option<String>,
}

impl QueueParams {
    pub fn into_query(self) -> ApprovalResult<QueueQuery> {
        let filters = QueueFilters {
            category: self.category.filter(|c| !c.is_empty()),
            severity: non_empty(self.severity).map(|s| s.parse()).transpose()?,
            date_from: non_empty(self.date_from)
                .map(|d| parse_date("dateFrom", &d))
                .transpose()?,
            date_to: non_empty(self.date_to)
                .map(|d| parse_date("dateTo", &d))
                .transpose()?,
            gate: non_empty(self.gate).map(|g| g.parse::<Gate>()).transpose()?,
        };

        let query = QueueQuery {
            filters,
            sort_by: non_empty(self.sort_by)
                .map(|s| s.parse())
                .transpose()?
                .unwrap_or_default(),
            sort_order: non_empty(self.sort_order)
                .map(|s| s.parse())
                .transpose()?
                .unwrap_or_default(),
            pagination: Pagination {
                page: self.page.unwrap_or(1),
                page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            },
        };
        query.validate()?;
        Ok(query)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_date(field: &str, value: &str) -> ApprovalResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| ApprovalError::Validation(format!("{} must be an RFC 3339 timestamp", field)))
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Minimal article status returned after an action
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleStatusDto {
    pub id: ArticleId,
    pub approval_status: ApprovalStatus,
    pub rejected: bool,
    pub version: u64,
    pub approval_progress: ApprovalProgress,
}

impl From<&ApprovalRecord> for ArticleStatusDto {
    fn from(record: &ApprovalRecord) -> Self {
        Self {
            id: record.article_id,
            approval_status: record.status,
            rejected: record.is_rejected(),
            version: record.version,
            approval_progress: record.progress(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalActionResponse {
    pub success: bool,
    pub message: String,
    pub article: ArticleStatusDto,
}

impl ApprovalActionResponse {
    pub fn new(message: impl Into<String>, record: &ApprovalRecord) -> Self {
        Self {
            success: true,
            message: message.into(),
            article: record.into(),
        }
    }
}

/// An article as listed in a queue
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleForApprovalDto {
    pub id: ArticleId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    pub approval_status: ApprovalStatus,
    pub rejected: bool,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub approval_progress: ApprovalProgress,
}

impl From<&TrackedArticle> for ArticleForApprovalDto {
    fn from(tracked: &TrackedArticle) -> Self {
        let article = &tracked.article;
        let record = &tracked.record;
        Self {
            id: article.id,
            title: article.title.clone(),
            category: article.category.clone(),
            severity: article.severity,
            approval_status: record.status,
            rejected: record.is_rejected(),
            version: record.version,
            created_at: article.created_at,
            published_at: article.published_at,
            approval_progress: record.progress(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationDto {
    pub page: u32,
    pub page_size: u32,
    pub total_items: usize,
    pub total_pages: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMetaDto {
    pub user_role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_gate: Option<Gate>,
    pub queue_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApprovalQueueResponse {
    pub data: Vec<ArticleForApprovalDto>,
    pub pagination: PaginationDto,
    pub meta: QueueMetaDto,
}

impl From<&QueuePage> for ApprovalQueueResponse {
    fn from(page: &QueuePage) -> Self {
        Self {
            data: page.items.iter().map(ArticleForApprovalDto::from).collect(),
            pagination: PaginationDto {
                page: page.page,
                page_size: page.page_size,
                total_items: page.total_items,
                total_pages: page.total_pages(),
            },
            meta: QueueMetaDto {
                user_role: page.role,
                target_gate: page.target_gate,
                queue_count: page.total_items,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalHistoryResponse {
    pub article_id: ArticleId,
    pub current_status: ApprovalStatus,
    pub rejected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_details: Option<RejectionDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_details: Option<ReleaseDetails>,
    pub version: u64,
    pub entries: Vec<HistoryEntry>,
    pub progress: ApprovalProgress,
}

impl From<&ApprovalRecord> for ApprovalHistoryResponse {
    fn from(record: &ApprovalRecord) -> Self {
        Self {
            article_id: record.article_id,
            current_status: record.status,
            rejected: record.is_rejected(),
            rejection_details: record.rejection.clone(),
            release_details: record.release.clone(),
            version: record.version,
            entries: record.history.clone(),
            progress: record.progress(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleUpdateResponse {
    pub success: bool,
    pub message: String,
    pub assignment: RoleAssignment,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusCountsResponse {
    pub counts: std::collections::BTreeMap<String, u64>,
    pub total: u64,
}
