//! Sliding-window popularity tracker: records tokens with timestamps and
//! answers "most frequent token in the last W" with amortized O(1) eviction.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

struct FreqWord {
    word: String,
    entered_at: Instant,
}

/// Tracks word frequency over a sliding window. Owned by exactly one room
/// task; `&mut self` access is what keeps it free of internal locking.
pub struct PopularityTracker {
    hold_duration: Duration,
    queue: VecDeque<FreqWord>,
    freq: HashMap<String, u32>,
    max_freq: u32,
    top_word: Option<String>,
    need_calc: bool,
    last_check_at: Instant,
}

impl PopularityTracker {
    pub fn new(hold_duration: Duration, now: Instant) -> Self {
        PopularityTracker {
            hold_duration,
            queue: VecDeque::new(),
            freq: HashMap::new(),
            max_freq: 0,
            top_word: None,
            need_calc: false,
            last_check_at: now,
        }
    }

    /// Records one occurrence of `word` at time `now`.
    pub fn record(&mut self, word: &str, now: Instant) {
        self.queue.push_back(FreqWord {
            word: word.to_string(),
            entered_at: now,
        });
        let count = self.freq.entry(word.to_string()).or_insert(0);
        *count += 1;
        if *count > self.max_freq {
            self.max_freq = *count;
            self.top_word = Some(word.to_string());
        }

        if now.saturating_duration_since(self.last_check_at) >= Duration::from_secs(1) {
            let cutoff = now.checked_sub(self.hold_duration).unwrap_or(now);
            self.check_pos_from(cutoff);
            self.last_check_at = now;
        }
    }

    /// Returns the most frequent word spoken within `lately` of `now`,
    /// clamped to the tracker's configured hold duration.
    pub fn top_word(&mut self, lately: Duration, now: Instant) -> Option<String> {
        let lately = lately.min(self.hold_duration);
        let cutoff = now.checked_sub(lately).unwrap_or(now);
        self.check_pos_from(cutoff);

        if self.need_calc {
            self.rescan();
            self.need_calc = false;
        }
        self.top_word.clone()
    }

    fn check_pos_from(&mut self, cutoff: Instant) {
        while let Some(front) = self.queue.front() {
            if front.entered_at >= cutoff {
                break;
            }
            let evicted = self.queue.pop_front().unwrap();
            if let Some(count) = self.freq.get_mut(&evicted.word) {
                let was_at_max = *count >= self.max_freq;
                *count -= 1;
                if *count == 0 {
                    self.freq.remove(&evicted.word);
                }
                if was_at_max {
                    self.need_calc = true;
                }
            }
        }
    }

    fn rescan(&mut self) {
        self.max_freq = 0;
        self.top_word = None;
        for (word, &count) in self.freq.iter() {
            if count > self.max_freq {
                self.max_freq = count;
                self.top_word = Some(word.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_frequent_wins() {
        let t0 = Instant::now();
        let mut tracker = PopularityTracker::new(Duration::from_secs(600), t0);
        for w in ["aaa", "bbb", "ccc", "ccc", "aaa", "ccc", "bbb", "ccc"] {
            tracker.record(w, t0);
        }
        assert_eq!(tracker.top_word(Duration::from_secs(600), t0), Some("ccc".to_string()));
    }

    #[test]
    fn eviction_drops_old_words() {
        let t0 = Instant::now();
        let mut tracker = PopularityTracker::new(Duration::from_millis(50), t0);
        tracker.record("old", t0);
        let t1 = t0 + Duration::from_millis(100);
        tracker.record("new", t1);
        assert_eq!(tracker.top_word(Duration::from_millis(50), t1), Some("new".to_string()));
    }

    #[test]
    fn empty_tracker_has_no_top_word() {
        let t0 = Instant::now();
        let mut tracker = PopularityTracker::new(Duration::from_secs(600), t0);
        assert_eq!(tracker.top_word(Duration::from_secs(600), t0), None);
    }
}
