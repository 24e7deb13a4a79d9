//! ASCII-only Aho-Corasick sensitive-word filter.
//!
//! Nodes live in a single arena (`Vec<Node>`); children and failure links are
//! `u32` indices into that vector rather than pointers, so the whole trie is
//! one contiguous allocation and the root's self-loop is just index `0`.

use crate::error::ConfigError;

const ROOT: u32 = 0;
const ALPHABET: usize = 128;

const IS_EMIT: u8 = 0b01;
const HAS_EMIT: u8 = 0b10;

#[derive(Clone)]
struct Node {
    children: [u32; ALPHABET],
    failure: u32,
    depth: u16,
    emit: u8,
}

impl Node {
    fn new(depth: u16) -> Self {
        Node {
            children: [u32::MAX; ALPHABET],
            failure: ROOT,
            depth,
            emit: 0,
        }
    }
}

/// Whether a byte is skippable punctuation/symbol noise under `skip_symbol`.
fn is_skippable(b: u8) -> bool {
    !(b.is_ascii_alphanumeric())
}

fn to_lower_ascii(b: u8) -> u8 {
    if b.is_ascii_uppercase() {
        b + 32
    } else {
        b
    }
}

/// An immutable, thread-shareable sensitive-word matcher.
///
/// Built once at startup from a dictionary and then shared read-only (behind
/// an `Arc`) across every room and connection task.
pub struct Filter {
    nodes: Vec<Node>,
    skip_symbol: bool,
}

impl Filter {
    /// Builds a filter from a dictionary of ASCII words. `skip_symbol`
    /// controls whether non-alphanumeric bytes are ignored when matching
    /// (so `f*u!c~k` still matches the word `fuck`).
    pub fn build<I, S>(words: I, skip_symbol: bool) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut nodes = vec![Node::new(0)];
        for word in words {
            let word = word.as_ref();
            if !word.is_ascii() {
                return Err(ConfigError::NotAscii(word.to_string()));
            }
            Self::insert(&mut nodes, word.as_bytes(), skip_symbol);
        }
        Self::build_failure_links(&mut nodes);
        Ok(Filter { nodes, skip_symbol })
    }

    /// A filter over an empty dictionary: matches nothing, rewrites nothing.
    pub fn empty() -> Self {
        Filter {
            nodes: vec![Node::new(0)],
            skip_symbol: true,
        }
    }

    fn insert(nodes: &mut Vec<Node>, word: &[u8], skip_symbol: bool) {
        let mut cur = ROOT;
        for &raw in word {
            if skip_symbol && is_skippable(raw) {
                continue;
            }
            let c = to_lower_ascii(raw) as usize;
            let next = nodes[cur as usize].children[c];
            cur = if next != u32::MAX {
                next
            } else {
                let depth = nodes[cur as usize].depth + 1;
                nodes.push(Node::new(depth));
                let idx = (nodes.len() - 1) as u32;
                nodes[cur as usize].children[c] = idx;
                idx
            };
        }
        nodes[cur as usize].emit |= IS_EMIT;
    }

    /// Breadth-first construction of failure links: depth-1 nodes fail to
    /// root; a child `v` reached from `u` via byte `c` fails to
    /// `g(fail(u), c)`. `HAS_EMIT` propagates from the failure target.
    fn build_failure_links(nodes: &mut [Node]) {
        let mut queue = std::collections::VecDeque::new();

        for c in 0..ALPHABET {
            let child = nodes[ROOT as usize].children[c];
            if child != u32::MAX {
                nodes[child as usize].failure = ROOT;
                queue.push_back(child);
            }
        }

        while let Some(u) = queue.pop_front() {
            let u_children = nodes[u as usize].children;
            for c in 0..ALPHABET {
                let v = u_children[c];
                if v == u32::MAX {
                    continue;
                }
                let fail_u = nodes[u as usize].failure;
                let f = Self::goto(nodes, fail_u, c as u8);
                nodes[v as usize].failure = f;
                if nodes[f as usize].emit != 0 {
                    nodes[v as usize].emit |= HAS_EMIT;
                }
                queue.push_back(v);
            }
        }
    }

    /// `delta(n, c)`: the full transition function used while the trie is
    /// under construction — follow the child edge if present, else ascend
    /// the failure chain (already built for every node up to `n`'s depth)
    /// until one is found or root is reached.
    fn goto(nodes: &[Node], n: u32, c: u8) -> u32 {
        let mut cur = n;
        loop {
            let child = nodes[cur as usize].children[c as usize];
            if child != u32::MAX {
                return child;
            }
            if cur == ROOT {
                return ROOT;
            }
            cur = nodes[cur as usize].failure;
        }
    }

    fn step(&self, state: u32, byte: u8) -> u32 {
        if byte >= 128 {
            return ROOT;
        }
        let c = to_lower_ascii(byte);
        let mut cur = state;
        loop {
            let child = self.nodes[cur as usize].children[c as usize];
            if child != u32::MAX {
                return child;
            }
            if cur == ROOT {
                return ROOT;
            }
            cur = self.nodes[cur as usize].failure;
        }
    }

    /// True as soon as any suffix of `input` ends on an emitting state.
    pub fn has_black_word(&self, input: &[u8]) -> bool {
        let mut state = ROOT;
        for &b in input {
            if self.skip_symbol && b < 128 && is_skippable(b) {
                continue;
            }
            state = self.step(state, b);
            if self.nodes[state as usize].emit != 0 {
                return true;
            }
        }
        false
    }

    /// Overwrites every matched dictionary occurrence in `buf` with `*`,
    /// in place. Returns the number of bytes rewritten.
    pub fn filter(&self, buf: &mut [u8]) -> usize {
        let mut state = ROOT;
        let mut n: usize = 0; // significant bytes consumed since word start
        let mut rewritten = 0usize;
        let mut pos = 0usize;

        while pos < buf.len() {
            let raw = buf[pos];
            if raw >= 128 {
                state = ROOT;
                n = 0;
                pos += 1;
                continue;
            }
            if self.skip_symbol && is_skippable(raw) {
                pos += 1;
                continue;
            }

            let c = to_lower_ascii(raw);
            let child = self.nodes[state as usize].children[c as usize];

            if child != u32::MAX {
                state = child;
                n += 1;
                if self.nodes[state as usize].emit & IS_EMIT != 0 {
                    rewritten += Self::blank_back(buf, pos, n);
                    // curr stays at the matched node so a word beginning
                    // inside or right after this one is still found via its
                    // failure link; only the length counter resets.
                    n = 0;
                }
                pos += 1;
                continue;
            }

            if state == ROOT {
                // no edge anywhere: this byte starts nothing
                n = 0;
                pos += 1;
                continue;
            }

            let pred_was_emit = self.nodes[state as usize].emit & IS_EMIT != 0;
            state = self.nodes[state as usize].failure;
            if pred_was_emit {
                // the predecessor already completed a word; retry this byte
                // from the failure state without consuming it, matching a
                // fresh word start (e.g. "per" inside "Superman").
                n = self.nodes[state as usize].depth as usize;
                continue;
            }
            n = self.nodes[state as usize].depth as usize;
            // retry the same byte against the (shorter) failure state
        }

        rewritten
    }

    /// Walks backward from `end_pos`, blanking every byte of the matched
    /// span: exactly `n` significant (non-skippable) bytes plus any
    /// interleaved symbol bytes between them.
    fn blank_back(buf: &mut [u8], end_pos: usize, n: usize) -> usize {
        let mut count = 0;
        let mut i = end_pos;
        let mut remaining = n;
        while remaining > 0 {
            let significant = !(buf[i] < 128 && is_skippable(buf[i]));
            buf[i] = b'*';
            count += 1;
            if significant {
                remaining -= 1;
            }
            if i == 0 {
                break;
            }
            i -= 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_has_black_word(dict: &[&str], input: &str) -> bool {
        let lower = input.to_ascii_lowercase();
        let cleaned: String = lower.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        dict.iter().any(|w| {
            let w_lower = w.to_ascii_lowercase();
            let w_cleaned: String = w_lower.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
            cleaned.contains(&w_cleaned)
        })
    }

    #[test]
    fn detects_plain_word() {
        let f = Filter::build(["fuck"], true).unwrap();
        assert!(f.has_black_word(b"you fuck off"));
        assert!(!f.has_black_word(b"hello there"));
    }

    #[test]
    fn detects_symbol_obfuscated_word() {
        let f = Filter::build(["fuck"], true).unwrap();
        assert!(f.has_black_word(b"f*u!c~k off"));
    }

    #[test]
    fn filters_in_place() {
        let f = Filter::build(["fuck"], true).unwrap();
        let mut buf = b"f*u!c~k off".to_vec();
        let n = f.filter(&mut buf);
        assert!(n > 0);
        assert!(!f.has_black_word(&buf));
    }

    #[test]
    fn filter_idempotent() {
        let f = Filter::build(["abc", "xyz"], true).unwrap();
        let mut once = b"abcxyzdef".to_vec();
        f.filter(&mut once);
        let mut twice = once.clone();
        f.filter(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn detect_filter_agreement() {
        let f = Filter::build(["cat", "dog"], true).unwrap();
        for s in ["the cat sat", "no match here", "dogcatdog"] {
            let had = f.has_black_word(s.as_bytes());
            let mut buf = s.as_bytes().to_vec();
            f.filter(&mut buf);
            assert_eq!(had, buf != s.as_bytes());
        }
    }

    #[test]
    fn rejects_non_ascii_dictionary_entry() {
        let res = Filter::build(["café"], true);
        assert!(res.is_err());
    }

    #[test]
    fn backtrack_finds_suffix_word() {
        let f = Filter::build(["per"], true).unwrap();
        assert!(f.has_black_word(b"superman"));
    }

    #[test]
    fn overlapping_matches_via_failure_link_are_both_found() {
        let f = Filter::build(["aab", "bc"], true).unwrap();
        let mut buf = b"aabc".to_vec();
        f.filter(&mut buf);
        assert_eq!(buf, b"****");
    }
}
