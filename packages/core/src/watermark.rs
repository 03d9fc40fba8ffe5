//! In-memory watermark.
//!
//! The watermark is the `createdAt` boundary below which orders count as
//! already processed. It starts at process start time and is lost on
//! restart, so orders created while the process was down are never sent.
//!
//! Only the polling task owns a `Watermark`; the poll cycle reads its value
//! and reports the next one, which the scheduler writes back.

use chrono::{DateTime, SecondsFormat, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watermark {
    value: DateTime<Utc>,
}

impl Watermark {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { value: start }
    }

    /// A watermark at the current wall-clock time.
    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    pub fn get(&self) -> DateTime<Utc> {
        self.value
    }

    /// Move the watermark forward. Earlier values are ignored so the
    /// watermark never goes backwards.
    pub fn set(&mut self, next: DateTime<Utc>) {
        if next < self.value {
            tracing::debug!(
                current = %self.value,
                rejected = %next,
                "Ignoring watermark regression"
            );
            return;
        }
        self.value = next;
    }
}

/// Store-side text form of a timestamp: millisecond precision with a `Z`
/// suffix, so string comparison agrees with chronological order.
pub fn to_store_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn new_watermark_holds_start_value() {
        let watermark = Watermark::new(t0());
        assert_eq!(watermark.get(), t0());
    }

    #[test]
    fn set_advances_forward() {
        let mut watermark = Watermark::new(t0());
        watermark.set(t0() + Duration::seconds(10));
        assert_eq!(watermark.get(), t0() + Duration::seconds(10));
    }

    #[test]
    fn set_ignores_earlier_values() {
        let mut watermark = Watermark::new(t0());
        watermark.set(t0() - Duration::seconds(1));
        assert_eq!(watermark.get(), t0());
    }

    #[test]
    fn set_to_same_value_is_a_no_op() {
        let mut watermark = Watermark::new(t0());
        watermark.set(t0());
        assert_eq!(watermark.get(), t0());
    }

    #[test]
    fn starting_now_is_close_to_wall_clock() {
        let before = Utc::now();
        let watermark = Watermark::starting_now();
        assert!(watermark.get() >= before);
    }

    #[test]
    fn store_timestamp_matches_javascript_iso_format() {
        let ts = t0() + Duration::milliseconds(7);
        assert_eq!(to_store_timestamp(ts), "2024-05-01T12:00:00.007Z");
    }

    #[test]
    fn store_timestamps_sort_chronologically() {
        let earlier = to_store_timestamp(t0() + Duration::milliseconds(999));
        let later = to_store_timestamp(t0() + Duration::seconds(1));
        assert!(earlier < later);
    }
}
