use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Lenient numeric coercion for score inputs: anything that cannot be read
/// as a finite number counts as zero.
pub trait ScoreValue {
    fn to_score(&self) -> Decimal;
}

impl ScoreValue for Decimal {
    fn to_score(&self) -> Decimal {
        *self
    }
}

impl ScoreValue for f64 {
    fn to_score(&self) -> Decimal {
        if !self.is_finite() {
            return Decimal::ZERO;
        }
        Decimal::try_from(*self).unwrap_or(Decimal::ZERO)
    }
}

impl ScoreValue for f32 {
    fn to_score(&self) -> Decimal {
        f64::from(*self).to_score()
    }
}

impl ScoreValue for i32 {
    fn to_score(&self) -> Decimal {
        Decimal::from(*self)
    }
}

impl ScoreValue for i64 {
    fn to_score(&self) -> Decimal {
        Decimal::from(*self)
    }
}

impl ScoreValue for str {
    fn to_score(&self) -> Decimal {
        let trimmed = self.trim();
        Decimal::from_str(trimmed)
            .ok()
            .or_else(|| trimmed.parse::<f64>().ok().map(|v| v.to_score()))
            .unwrap_or(Decimal::ZERO)
    }
}

impl ScoreValue for String {
    fn to_score(&self) -> Decimal {
        self.as_str().to_score()
    }
}

impl ScoreValue for JsonValue {
    fn to_score(&self) -> Decimal {
        match self {
            JsonValue::Number(n) => n.as_f64().map(|v| v.to_score()).unwrap_or(Decimal::ZERO),
            JsonValue::String(s) => s.to_score(),
            _ => Decimal::ZERO,
        }
    }
}

impl<T: ScoreValue + ?Sized> ScoreValue for &T {
    fn to_score(&self) -> Decimal {
        (**self).to_score()
    }
}

impl<T: ScoreValue> ScoreValue for Option<T> {
    fn to_score(&self) -> Decimal {
        self.as_ref().map(|v| v.to_score()).unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualification {
    pub qualified: bool,
    pub reason: String,
}

/// A student qualifies when their score is at least the required score.
/// Equal scores qualify, including `0 >= 0`.
pub fn evaluate<S, R>(student_score: S, required_score: R) -> Qualification
where
    S: ScoreValue,
    R: ScoreValue,
{
    let student = student_score.to_score();
    let required = required_score.to_score();
    let qualified = student >= required;

    let reason = if qualified {
        "Score requirement met".to_string()
    } else {
        format!(
            "Score {} is below required {}",
            student.normalize(),
            required.normalize()
        )
    };

    Qualification { qualified, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;

    #[test]
    fn equal_scores_qualify() {
        assert!(evaluate(0.0, 0.0).qualified);
        assert!(evaluate(70.0, 70.0).qualified);
        assert!(evaluate(Decimal::new(7000, 2), 70).qualified);
    }

    #[test]
    fn just_below_threshold_fails_with_both_values() {
        let result = evaluate(69.99, 70.0);
        assert!(!result.qualified);
        assert_eq!(result.reason, "Score 69.99 is below required 70");
    }

    #[test]
    fn missing_and_malformed_inputs_default_to_zero() {
        assert!(evaluate(None::<f64>, None::<f64>).qualified);
        assert!(evaluate("not a number", 0).qualified);
        assert!(!evaluate(None::<Decimal>, 10).qualified);
        assert!(evaluate(f64::NAN, json!(null)).qualified);
        assert!(!evaluate("", "0.01").qualified);
    }

    #[test]
    fn parses_numeric_strings_and_json() {
        assert!(evaluate(" 85.5 ", json!(85.5)).qualified);
        assert!(!evaluate(json!("90"), "1e2").qualified);
        assert!(evaluate(Some(String::from("75")), Some(75_i64)).qualified);
    }

    #[test]
    fn qualified_reason_is_generic() {
        assert_eq!(evaluate(90, 50).reason, "Score requirement met");
    }
}
