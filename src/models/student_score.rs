use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Aggregated scores maintained by the external LMS scoring system.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentScore {
    pub student_id: Uuid,
    pub overall_score: Option<Decimal>,
    pub course_average: Option<Decimal>,
    pub test_average: Option<Decimal>,
    pub project_average: Option<Decimal>,
    pub hackathon_average: Option<Decimal>,
    pub last_calculated_at: Option<DateTime<Utc>>,
}

/// Raw activity averages read from the LMS tables.
#[derive(Debug, Clone, Copy, Default, FromRow)]
pub struct LmsAverages {
    pub test_average: Decimal,
    pub course_average: Decimal,
    pub hackathon_average: Decimal,
}

impl StudentScore {
    /// Temporary weighted score: tests 50%, course progress 30%, hackathons 20%.
    pub fn legacy(student_id: Uuid, averages: LmsAverages) -> Self {
        let overall = averages.test_average * Decimal::new(5, 1)
            + averages.course_average * Decimal::new(3, 1)
            + averages.hackathon_average * Decimal::new(2, 1);

        Self {
            student_id,
            overall_score: Some(overall.round_dp(2)),
            course_average: Some(averages.course_average.round_dp(2)),
            test_average: Some(averages.test_average.round_dp(2)),
            project_average: Some(Decimal::ZERO),
            hackathon_average: Some(averages.hackathon_average.round_dp(2)),
            last_calculated_at: Some(Utc::now()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub overall_score: Decimal,
    pub course_average: Decimal,
    pub test_average: Decimal,
    pub project_average: Decimal,
    pub hackathon_average: Decimal,
    pub last_calculated_at: Option<DateTime<Utc>>,
    /// False when no score row exists for the student.
    pub available: bool,
    /// Produced by the legacy recomputation rather than the scoring system.
    pub is_temporary: bool,
    /// Older than the staleness window and could not be refreshed.
    pub stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScoreSnapshot {
    fn zero() -> Self {
        Self {
            overall_score: Decimal::ZERO,
            course_average: Decimal::ZERO,
            test_average: Decimal::ZERO,
            project_average: Decimal::ZERO,
            hackathon_average: Decimal::ZERO,
            last_calculated_at: None,
            available: false,
            is_temporary: false,
            stale: false,
            error: None,
        }
    }

    pub fn unavailable() -> Self {
        Self::zero()
    }

    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            is_temporary: true,
            error: Some(reason.into()),
            ..Self::zero()
        }
    }
}

impl From<StudentScore> for ScoreSnapshot {
    fn from(row: StudentScore) -> Self {
        Self {
            overall_score: row.overall_score.unwrap_or_default(),
            course_average: row.course_average.unwrap_or_default(),
            test_average: row.test_average.unwrap_or_default(),
            project_average: row.project_average.unwrap_or_default(),
            hackathon_average: row.hackathon_average.unwrap_or_default(),
            last_calculated_at: row.last_calculated_at,
            available: true,
            is_temporary: false,
            stale: false,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_score_weights_and_rounds() {
        let score = StudentScore::legacy(
            Uuid::new_v4(),
            LmsAverages {
                test_average: Decimal::new(80_333, 3),
                course_average: Decimal::new(60, 0),
                hackathon_average: Decimal::new(90, 0),
            },
        );
        // 40.1665 + 18 + 18
        assert_eq!(score.overall_score, Some(Decimal::new(7617, 2)));
        assert_eq!(score.test_average, Some(Decimal::new(8033, 2)));
        assert_eq!(score.project_average, Some(Decimal::ZERO));
        assert!(score.last_calculated_at.is_some());
    }

    #[test]
    fn snapshot_from_row_fills_missing_parts_with_zero() {
        let snapshot = ScoreSnapshot::from(StudentScore {
            student_id: Uuid::new_v4(),
            overall_score: Some(Decimal::new(72, 0)),
            course_average: None,
            test_average: None,
            project_average: None,
            hackathon_average: None,
            last_calculated_at: None,
        });
        assert!(snapshot.available);
        assert_eq!(snapshot.overall_score, Decimal::new(72, 0));
        assert_eq!(snapshot.course_average, Decimal::ZERO);
    }
}
