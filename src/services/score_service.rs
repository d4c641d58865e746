use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use crate::database::store::ScoreRepository;
use crate::models::student_score::ScoreSnapshot;
use crate::utils::time::is_older_than;

#[derive(Clone)]
pub struct ScoreService {
    scores: Arc<dyn ScoreRepository>,
    stale_after: Duration,
}

impl ScoreService {
    pub fn new(scores: Arc<dyn ScoreRepository>, stale_after: Duration) -> Self {
        Self {
            scores,
            stale_after,
        }
    }

    /// Latest score for a student. Never fails: a missing row yields an
    /// unavailable all-zero snapshot and a read error a degraded one.
    pub async fn get_score(&self, student_id: Uuid) -> ScoreSnapshot {
        let row = match self.scores.latest_score(student_id).await {
            Ok(Some(row)) => row,
            Ok(None) => return ScoreSnapshot::unavailable(),
            Err(err) => {
                tracing::warn!(%student_id, error = %err, "score lookup failed");
                return ScoreSnapshot::degraded("Unable to calculate score");
            }
        };

        if !is_older_than(row.last_calculated_at, self.stale_after) {
            return row.into();
        }

        match self.scores.recalculate_score(student_id).await {
            Ok(fresh) => ScoreSnapshot {
                is_temporary: true,
                ..fresh.into()
            },
            Err(err) => {
                tracing::warn!(%student_id, error = %err, "score recalculation failed, serving stale row");
                ScoreSnapshot {
                    stale: true,
                    ..row.into()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::store::MockScoreRepository;
    use crate::error::Error;
    use crate::models::student_score::StudentScore;
    use crate::utils::time::now;
    use rust_decimal::Decimal;

    fn row(student_id: Uuid, overall: i64, age_hours: i64) -> StudentScore {
        StudentScore {
            student_id,
            overall_score: Some(Decimal::new(overall, 0)),
            course_average: Some(Decimal::new(60, 0)),
            test_average: None,
            project_average: None,
            hackathon_average: None,
            last_calculated_at: Some(now() - Duration::hours(age_hours)),
        }
    }

    fn service(mock: MockScoreRepository) -> ScoreService {
        ScoreService::new(Arc::new(mock), Duration::hours(24))
    }

    #[tokio::test]
    async fn fresh_row_is_returned_as_is() {
        let id = Uuid::new_v4();
        let mut mock = MockScoreRepository::new();
        mock.expect_latest_score()
            .returning(move |_| Ok(Some(row(id, 82, 1))));
        mock.expect_recalculate_score().never();

        let snapshot = service(mock).get_score(id).await;
        assert!(snapshot.available);
        assert!(!snapshot.is_temporary);
        assert_eq!(snapshot.overall_score, Decimal::new(82, 0));
        assert_eq!(snapshot.test_average, Decimal::ZERO);
    }

    #[tokio::test]
    async fn missing_row_is_unavailable_zero() {
        let mut mock = MockScoreRepository::new();
        mock.expect_latest_score().returning(|_| Ok(None));
        mock.expect_recalculate_score().never();

        let snapshot = service(mock).get_score(Uuid::new_v4()).await;
        assert_eq!(snapshot, ScoreSnapshot::unavailable());
    }

    #[tokio::test]
    async fn read_error_degrades_instead_of_failing() {
        let mut mock = MockScoreRepository::new();
        mock.expect_latest_score()
            .returning(|_| Err(Error::Internal("connection reset".into())));

        let snapshot = service(mock).get_score(Uuid::new_v4()).await;
        assert_eq!(snapshot.overall_score, Decimal::ZERO);
        assert!(snapshot.is_temporary);
        assert_eq!(snapshot.error.as_deref(), Some("Unable to calculate score"));
    }

    #[tokio::test]
    async fn stale_row_is_recalculated() {
        let id = Uuid::new_v4();
        let mut mock = MockScoreRepository::new();
        mock.expect_latest_score()
            .returning(move |_| Ok(Some(row(id, 40, 48))));
        mock.expect_recalculate_score()
            .times(1)
            .returning(move |_| Ok(row(id, 77, 0)));

        let snapshot = service(mock).get_score(id).await;
        assert!(snapshot.is_temporary);
        assert!(!snapshot.stale);
        assert_eq!(snapshot.overall_score, Decimal::new(77, 0));
    }

    #[tokio::test]
    async fn failed_recalculation_serves_stale_row() {
        let id = Uuid::new_v4();
        let mut mock = MockScoreRepository::new();
        mock.expect_latest_score()
            .returning(move |_| Ok(Some(row(id, 40, 48))));
        mock.expect_recalculate_score()
            .returning(|_| Err(Error::Internal("relation \"enrollments\" does not exist".into())));

        let snapshot = service(mock).get_score(id).await;
        assert!(snapshot.stale);
        assert!(snapshot.available);
        assert_eq!(snapshot.overall_score, Decimal::new(40, 0));
    }
}
