//! Fixed-capacity circular buffer of the most recent chat messages in a
//! room, replayed in chronological order to late joiners.

use crate::protocol::messages::SmChatContent;

pub struct OfflineRing {
    slots: Vec<Option<SmChatContent>>,
    write_idx: usize,
}

impl OfflineRing {
    pub fn new(capacity: usize) -> Self {
        OfflineRing {
            slots: vec![None; capacity],
            write_idx: 0,
        }
    }

    /// Stores `msg` in the current slot, overwriting the oldest entry once
    /// the ring has wrapped, then advances the write index.
    pub fn save(&mut self, msg: SmChatContent) {
        let cap = self.slots.len();
        if cap == 0 {
            return;
        }
        self.slots[self.write_idx] = Some(msg);
        self.write_idx = (self.write_idx + 1) % cap;
    }

    /// Returns stored messages oldest-to-newest, skipping empty slots.
    pub fn replay(&self) -> Vec<SmChatContent> {
        let cap = self.slots.len();
        if cap == 0 {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(cap);
        for i in 0..cap {
            let idx = (self.write_idx + i) % cap;
            if let Some(msg) = &self.slots[idx] {
                out.push(msg.clone());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(content: &str) -> SmChatContent {
        SmChatContent {
            nickname: "alice".to_string(),
            content: content.to_string(),
            send_time: 0,
        }
    }

    #[test]
    fn replays_in_chronological_order() {
        let mut ring = OfflineRing::new(3);
        ring.save(msg("hi"));
        ring.save(msg("there"));
        ring.save(msg("friend"));
        let replayed: Vec<String> = ring.replay().into_iter().map(|m| m.content).collect();
        assert_eq!(replayed, vec!["hi", "there", "friend"]);
    }

    #[test]
    fn overwrites_oldest_when_full() {
        let mut ring = OfflineRing::new(2);
        ring.save(msg("a"));
        ring.save(msg("b"));
        ring.save(msg("c"));
        let replayed: Vec<String> = ring.replay().into_iter().map(|m| m.content).collect();
        assert_eq!(replayed, vec!["b", "c"]);
    }

    #[test]
    fn empty_ring_replays_nothing() {
        let ring = OfflineRing::new(0);
        assert!(ring.replay().is_empty());
    }
}
