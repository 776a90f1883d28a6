//! Stats service.
//!
//! Branch-scoped aggregates backing the admin analytics page.

use campusdesk_common::AppResult;
use campusdesk_db::{
    entities::complaint::{Category, Status},
    repositories::ComplaintRepository,
};
use chrono::{Datelike, Duration, Utc};
use serde::Serialize;

/// Weekday labels, Monday first, matching the activity chart.
const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Headline counts for a branch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    /// All complaints ever filed in the branch.
    pub total: u64,
    /// Complaints not yet resolved.
    pub pending: u64,
    /// Resolved complaints.
    pub resolved: u64,
}

/// Complaint count for one category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    /// Category name.
    pub category: String,
    /// Number of complaints.
    pub count: u64,
}

/// Complaint count for one weekday of the trailing week.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCount {
    /// Weekday label (Mon..Sun).
    pub day: String,
    /// Number of complaints filed that day.
    pub count: u64,
}

/// Stats service for business logic.
#[derive(Clone)]
pub struct StatsService {
    complaint_repo: ComplaintRepository,
}

impl StatsService {
    /// Create a new stats service.
    #[must_use]
    pub const fn new(complaint_repo: ComplaintRepository) -> Self {
        Self { complaint_repo }
    }

    /// Total / pending / resolved counts for a branch.
    pub async fn overview(&self, branch: &str) -> AppResult<Overview> {
        let total = self.complaint_repo.count_by_branch(branch).await?;
        let resolved = self
            .complaint_repo
            .count_by_branch_and_status(branch, Status::Resolved)
            .await?;

        Ok(Overview {
            total,
            pending: total.saturating_sub(resolved),
            resolved,
        })
    }

    /// Per-category counts for a branch, zero-filled over all categories.
    pub async fn by_category(&self, branch: &str) -> AppResult<Vec<CategoryCount>> {
        let mut counts = Vec::with_capacity(Category::ALL.len());

        for category in Category::ALL {
            let count = self
                .complaint_repo
                .count_by_branch_and_category(branch, category)
                .await?;
            counts.push(CategoryCount {
                category: category.as_str().to_string(),
                count,
            });
        }

        Ok(counts)
    }

    /// Complaints filed per weekday over the trailing seven days,
    /// Monday-first.
    pub async fn daily(&self, branch: &str) -> AppResult<Vec<DayCount>> {
        let since = Utc::now() - Duration::days(7);
        let complaints = self.complaint_repo.find_created_since(branch, since).await?;

        let mut buckets = [0u64; 7];
        for complaint in &complaints {
            let weekday = complaint.created_at.weekday().num_days_from_monday() as usize;
            buckets[weekday] += 1;
        }

        Ok(WEEKDAYS
            .iter()
            .zip(buckets)
            .map(|(day, count)| DayCount {
                day: (*day).to_string(),
                count,
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use campusdesk_db::entities::complaint;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_complaint(id: &str, created_at: chrono::DateTime<Utc>) -> complaint::Model {
        complaint::Model {
            id: id.to_string(),
            user_id: "u1".to_string(),
            title: "Broken WiFi".to_string(),
            description: "Router down".to_string(),
            category: Category::WiFi,
            status: Status::Open,
            branch: "Kochi".to_string(),
            image_url: None,
            score: 0,
            rating: None,
            review_comment: None,
            admin_remark: None,
            created_at: created_at.into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_daily_buckets_by_weekday() {
        // Two complaints on the same day land in the same bucket
        let now = Utc::now();
        let c1 = create_test_complaint("c1", now);
        let c2 = create_test_complaint("c2", now);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[c1, c2]])
                .into_connection(),
        );

        let service = StatsService::new(ComplaintRepository::new(db));
        let daily = service.daily("Kochi").await.unwrap();

        assert_eq!(daily.len(), 7);
        assert_eq!(daily[0].day, "Mon");
        assert_eq!(daily[6].day, "Sun");

        let today = now.weekday().num_days_from_monday() as usize;
        assert_eq!(daily[today].count, 2);
        assert_eq!(daily.iter().map(|d| d.count).sum::<u64>(), 2);
    }
}
