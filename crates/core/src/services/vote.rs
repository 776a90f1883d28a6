//! Vote service.
//!
//! One like/dislike per user per complaint. Casting the same direction again
//! retracts the vote, casting the opposite direction flips it. The complaint
//! score is adjusted with a single atomic UPDATE so concurrent voters
//! compose instead of overwriting each other.

use crate::services::event_publisher::EventPublisherService;
use campusdesk_common::{AppResult, IdGenerator};
use campusdesk_db::{
    entities::vote::{self, VoteType},
    repositories::{ComplaintRepository, VoteRepository},
};
use sea_orm::Set;

/// Outcome of casting a vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastResult {
    /// The caller's vote after the cast (None when retracted).
    pub vote: Option<VoteType>,
    /// Score delta that was applied.
    pub delta: i32,
    /// Resulting score as seen by this request.
    pub score: i32,
}

/// Score delta for casting `cast` when the user's current vote is `current`.
///
/// - same direction: retraction (a removed like subtracts 1, a removed
///   dislike adds 1)
/// - opposite direction: flip (worth two points in the new direction)
/// - no existing vote: fresh vote (one point in the cast direction)
#[must_use]
pub const fn score_delta(current: Option<VoteType>, cast: VoteType) -> i32 {
    match (current, cast) {
        (Some(VoteType::Like), VoteType::Like) => -1,
        (Some(VoteType::Dislike), VoteType::Dislike) => 1,
        (Some(VoteType::Dislike), VoteType::Like) => 2,
        (Some(VoteType::Like), VoteType::Dislike) => -2,
        (None, VoteType::Like) => 1,
        (None, VoteType::Dislike) => -1,
    }
}

/// Vote service for business logic.
#[derive(Clone)]
pub struct VoteService {
    vote_repo: VoteRepository,
    complaint_repo: ComplaintRepository,
    event_publisher: Option<EventPublisherService>,
    id_gen: IdGenerator,
}

impl VoteService {
    /// Create a new vote service.
    #[must_use]
    pub const fn new(vote_repo: VoteRepository, complaint_repo: ComplaintRepository) -> Self {
        Self {
            vote_repo,
            complaint_repo,
            event_publisher: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Cast a like/dislike on a complaint.
    ///
    /// The vote row is reconciled first; the score delta is only applied
    /// once the row mutation has committed, as one atomic increment.
    pub async fn cast(
        &self,
        user_id: &str,
        complaint_id: &str,
        cast: VoteType,
    ) -> AppResult<CastResult> {
        let complaint = self.complaint_repo.get_by_id(complaint_id).await?;

        let existing = self
            .vote_repo
            .find_by_user_and_complaint(user_id, complaint_id)
            .await?;

        let current = existing.as_ref().map(|v| v.vote_type);
        let delta = score_delta(current, cast);

        let new_vote = match existing {
            Some(v) if v.vote_type == cast => {
                // Retraction
                self.vote_repo.delete(&v.id).await?;
                None
            }
            Some(v) => {
                // Flip in place
                let mut active: vote::ActiveModel = v.into();
                active.vote_type = Set(cast);
                self.vote_repo.update(active).await?;
                Some(cast)
            }
            None => {
                let model = vote::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    user_id: Set(user_id.to_string()),
                    complaint_id: Set(complaint_id.to_string()),
                    vote_type: Set(cast),
                    ..Default::default()
                };
                self.vote_repo.create(model).await?;
                Some(cast)
            }
        };

        self.complaint_repo.adjust_score(complaint_id, delta).await?;
        let score = complaint.score + delta;

        if let Some(ref event_publisher) = self.event_publisher {
            if let Err(e) = event_publisher
                .publish_vote_cast(
                    complaint_id,
                    user_id,
                    &complaint.branch,
                    new_vote.map(VoteType::as_str),
                    delta,
                    score,
                )
                .await
            {
                tracing::warn!(error = %e, "Failed to publish vote cast event");
            }
        }

        Ok(CastResult {
            vote: new_vote,
            delta,
            score,
        })
    }

    /// Get all votes cast by a user, for decorating their feed.
    pub async fn votes_by_user(&self, user_id: &str) -> AppResult<Vec<vote::Model>> {
        self.vote_repo.find_by_user(user_id).await
    }

    /// Get a user's vote on a single complaint.
    pub async fn vote_on(
        &self,
        user_id: &str,
        complaint_id: &str,
    ) -> AppResult<Option<vote::Model>> {
        self.vote_repo
            .find_by_user_and_complaint(user_id, complaint_id)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use campusdesk_common::AppError;
    use campusdesk_db::entities::complaint::{self, Category, Status};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_complaint(id: &str, score: i32) -> complaint::Model {
        complaint::Model {
            id: id.to_string(),
            user_id: "author".to_string(),
            title: "Broken WiFi".to_string(),
            description: "Router down".to_string(),
            category: Category::WiFi,
            status: Status::Open,
            branch: "Kochi".to_string(),
            image_url: None,
            score,
            rating: None,
            review_comment: None,
            admin_remark: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_vote(id: &str, user_id: &str, vote_type: VoteType) -> vote::Model {
        vote::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            complaint_id: "c1".to_string(),
            vote_type,
            created_at: Utc::now().into(),
        }
    }

    // Delta arithmetic: the properties the portal's score depends on.
    #[test]
    fn test_fresh_like_adds_one() {
        assert_eq!(score_delta(None, VoteType::Like), 1);
    }

    #[test]
    fn test_fresh_dislike_subtracts_one() {
        assert_eq!(score_delta(None, VoteType::Dislike), -1);
    }

    #[test]
    fn test_retracting_like_subtracts_one() {
        assert_eq!(score_delta(Some(VoteType::Like), VoteType::Like), -1);
    }

    #[test]
    fn test_retracting_dislike_adds_one() {
        assert_eq!(score_delta(Some(VoteType::Dislike), VoteType::Dislike), 1);
    }

    #[test]
    fn test_flip_like_to_dislike_swings_two() {
        assert_eq!(score_delta(Some(VoteType::Like), VoteType::Dislike), -2);
    }

    #[test]
    fn test_flip_dislike_to_like_swings_two() {
        assert_eq!(score_delta(Some(VoteType::Dislike), VoteType::Like), 2);
    }

    #[test]
    fn test_concurrent_fresh_likes_compose() {
        // Two voters with no prior vote: both deltas apply through the
        // atomic UPDATE, so the net effect is +2 regardless of interleaving.
        let d1 = score_delta(None, VoteType::Like);
        let d2 = score_delta(None, VoteType::Like);
        assert_eq!(d1 + d2, 2);
    }

    #[test]
    fn test_cast_then_retract_is_neutral() {
        let cast = score_delta(None, VoteType::Like);
        let retract = score_delta(Some(VoteType::Like), VoteType::Like);
        assert_eq!(cast + retract, 0);
    }

    #[tokio::test]
    async fn test_cast_complaint_not_found() {
        let vote_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let complaint_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<complaint::Model>::new()])
                .into_connection(),
        );

        let service = VoteService::new(
            VoteRepository::new(vote_db),
            ComplaintRepository::new(complaint_db),
        );

        let result = service.cast("u1", "nonexistent", VoteType::Like).await;
        match result {
            Err(AppError::ComplaintNotFound(id)) => assert_eq!(id, "nonexistent"),
            _ => panic!("Expected ComplaintNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_cast_surfaces_vote_write_failure() {
        // The vote row mutation fails; the error propagates and no score
        // delta is ever issued.
        let complaint = create_test_complaint("c1", 3);

        let vote_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<vote::Model>::new()])
                .into_connection(),
        );
        let complaint_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[complaint]])
                .into_connection(),
        );

        let service = VoteService::new(
            VoteRepository::new(vote_db),
            ComplaintRepository::new(complaint_db),
        );

        let result = service.cast("u1", "c1", VoteType::Like).await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_cast_fresh_like() {
        let complaint = create_test_complaint("c1", 3);
        let inserted = create_test_vote("v1", "u1", VoteType::Like);

        // no existing vote, then the insert's returning row
        let vote_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<vote::Model>::new()])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[inserted]])
                .into_connection(),
        );
        let complaint_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[complaint]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let service = VoteService::new(
            VoteRepository::new(vote_db),
            ComplaintRepository::new(complaint_db),
        );

        let result = service.cast("u1", "c1", VoteType::Like).await.unwrap();
        assert_eq!(result.vote, Some(VoteType::Like));
        assert_eq!(result.delta, 1);
        assert_eq!(result.score, 4);
    }

    #[tokio::test]
    async fn test_cast_retraction() {
        let complaint = create_test_complaint("c1", 5);
        let existing = create_test_vote("v1", "u1", VoteType::Like);

        // existing vote lookup, then delete's fetch-by-id
        let vote_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing.clone()], [existing]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let complaint_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[complaint]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let service = VoteService::new(
            VoteRepository::new(vote_db),
            ComplaintRepository::new(complaint_db),
        );

        let result = service.cast("u1", "c1", VoteType::Like).await.unwrap();
        assert_eq!(result.vote, None);
        assert_eq!(result.delta, -1);
        assert_eq!(result.score, 4);
    }

    #[tokio::test]
    async fn test_cast_flip() {
        let complaint = create_test_complaint("c1", 0);
        let existing = create_test_vote("v1", "u1", VoteType::Dislike);
        let flipped = create_test_vote("v1", "u1", VoteType::Like);

        let vote_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[flipped]])
                .into_connection(),
        );
        let complaint_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[complaint]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let service = VoteService::new(
            VoteRepository::new(vote_db),
            ComplaintRepository::new(complaint_db),
        );

        let result = service.cast("u1", "c1", VoteType::Like).await.unwrap();
        assert_eq!(result.vote, Some(VoteType::Like));
        assert_eq!(result.delta, 2);
        assert_eq!(result.score, 2);
    }
}
