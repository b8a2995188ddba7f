use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Characters per word in the WPM formula.
const CHARS_PER_WORD: f64 = 5.0;

/// Running counters for a book, persisted with every progress snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total_typed: u32,
    pub total_errors: u32,
    pub accuracy: u32,
    pub wpm: u32,
    pub last_session_at: DateTime<Utc>,
}

impl SessionStats {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            total_typed: 0,
            total_errors: 0,
            accuracy: 100,
            wpm: 0,
            last_session_at: now,
        }
    }

    pub fn correct_count(&self) -> u32 {
        self.total_typed.saturating_sub(self.total_errors)
    }

    /// Recompute the derived fields from the counters.
    pub fn recompute(&mut self, elapsed_secs: f64) {
        self.wpm = calculate_wpm(self.total_typed, elapsed_secs);
        self.accuracy = calculate_accuracy(self.correct_count(), self.total_typed);
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

pub fn calculate_wpm(chars_typed: u32, elapsed_secs: f64) -> u32 {
    if elapsed_secs <= 0.0 || !elapsed_secs.is_finite() {
        return 0;
    }
    let words = chars_typed as f64 / CHARS_PER_WORD;
    let minutes = elapsed_secs / 60.0;
    (words / minutes).round() as u32
}

pub fn calculate_accuracy(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 100;
    }
    let correct = correct.min(total);
    (correct as f64 / total as f64 * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wpm_zero_without_elapsed_time() {
        assert_eq!(calculate_wpm(120, 0.0), 0);
        assert_eq!(calculate_wpm(120, -3.0), 0);
    }

    #[test]
    fn test_wpm_standard_word_length() {
        // 300 chars = 60 words in one minute.
        assert_eq!(calculate_wpm(300, 60.0), 60);
        // 25 chars = 5 words in 30 seconds.
        assert_eq!(calculate_wpm(25, 30.0), 10);
    }

    #[test]
    fn test_wpm_rounds_to_nearest() {
        // 7 chars in 60s = 1.4 words per minute.
        assert_eq!(calculate_wpm(7, 60.0), 1);
        // 8 chars in 60s = 1.6 words per minute.
        assert_eq!(calculate_wpm(8, 60.0), 2);
    }

    #[test]
    fn test_accuracy_starts_at_100() {
        assert_eq!(calculate_accuracy(0, 0), 100);
    }

    #[test]
    fn test_accuracy_rounds_and_stays_in_range() {
        assert_eq!(calculate_accuracy(2, 3), 67);
        assert_eq!(calculate_accuracy(0, 5), 0);
        assert_eq!(calculate_accuracy(9, 5), 100);
    }

    #[test]
    fn test_recompute_uses_counters() {
        let mut stats = SessionStats::new(Utc::now());
        stats.total_typed = 10;
        stats.total_errors = 1;
        stats.recompute(60.0);
        assert_eq!(stats.accuracy, 90);
        assert_eq!(stats.wpm, 2);
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let stats = SessionStats::new(Utc::now());
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("totalTyped").is_some());
        assert!(json.get("lastSessionAt").is_some());
    }
}
