use chrono::{DateTime, Duration, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// True when `at` lies further than `window` in the past, or is unknown.
pub fn is_older_than(at: Option<DateTime<Utc>>, window: Duration) -> bool {
    match at {
        Some(at) => now().signed_duration_since(at) >= window,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_timestamp_counts_as_old() {
        assert!(is_older_than(None, Duration::hours(24)));
    }

    #[test]
    fn compares_against_window() {
        assert!(!is_older_than(Some(now() - Duration::hours(23)), Duration::hours(24)));
        assert!(is_older_than(Some(now() - Duration::hours(25)), Duration::hours(24)));
    }
}
