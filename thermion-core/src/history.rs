//! Bounded sample history
//!
//! The graph screens want "the last few minutes" of temperature and
//! power; the capacity matches the display width so one entry maps to
//! one pixel column. Timestamps are strictly monotonic (single writer,
//! one control tick per entry), so evict-oldest is always pop-front.

use heapless::Deque;

/// Capacity of each history ring.
pub const HISTORY_DEPTH: usize = 128;

/// Insertion-ordered (timestamp → value) ring with evict-oldest overflow.
#[derive(Debug, Default)]
pub struct History<T, const N: usize = HISTORY_DEPTH> {
    samples: Deque<(u64, T), N>,
}

impl<T: Copy, const N: usize> History<T, N> {
    pub const fn new() -> Self {
        Self {
            samples: Deque::new(),
        }
    }

    /// Record a sample, evicting the oldest entry when full.
    pub fn push(&mut self, timestamp_ms: u64, value: T) {
        if self.samples.is_full() {
            self.samples.pop_front();
        }
        // Cannot fail: a slot was just freed.
        let _ = self.samples.push_back((timestamp_ms, value));
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<(u64, T)> {
        self.samples.back().copied()
    }

    /// Oldest retained sample.
    pub fn oldest(&self) -> Option<(u64, T)> {
        self.samples.front().copied()
    }

    /// Oldest-to-newest iteration.
    pub fn iter(&self) -> impl Iterator<Item = (u64, T)> + '_ {
        self.samples.iter().copied()
    }

    /// Copy values oldest-to-newest into `out`; returns how many were
    /// written. Used to flatten the ring for rendering.
    pub fn copy_values_into(&self, out: &mut [T]) -> usize {
        let mut n = 0;
        for (_, v) in self.iter() {
            if n == out.len() {
                break;
            }
            out[n] = v;
            n += 1;
        }
        n
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn push_and_latest() {
        let mut h: History<i16, 4> = History::new();
        assert!(h.is_empty());
        h.push(10, 100);
        h.push(20, 101);
        assert_eq!(h.len(), 2);
        assert_eq!(h.latest(), Some((20, 101)));
        assert_eq!(h.oldest(), Some((10, 100)));
    }

    #[test]
    fn overflow_evicts_oldest() {
        let mut h: History<i16, 4> = History::new();
        for i in 0..6u64 {
            h.push(i * 10, i as i16);
        }
        assert_eq!(h.len(), 4);
        // Entries 0 and 1 were evicted.
        assert_eq!(h.oldest(), Some((20, 2)));
        assert_eq!(h.latest(), Some((50, 5)));
    }

    #[test]
    fn iteration_is_insertion_ordered() {
        let mut h: History<i16, 4> = History::new();
        for i in 0..7u64 {
            h.push(i, i as i16);
        }
        let collected: heapless::Vec<i16, 8> = h.iter().map(|(_, v)| v).collect();
        assert_eq!(&collected[..], &[3, 4, 5, 6]);
    }

    #[test]
    fn copy_values_flattens() {
        let mut h: History<u16, 8> = History::new();
        for i in 0..5u64 {
            h.push(i, (i * 2) as u16);
        }
        let mut buf = [0u16; 8];
        let n = h.copy_values_into(&mut buf);
        assert_eq!(n, 5);
        assert_eq!(&buf[..n], &[0, 2, 4, 6, 8]);
    }

    proptest! {
        #[test]
        fn never_exceeds_capacity(pushes in 0usize..500) {
            let mut h: History<i16, HISTORY_DEPTH> = History::new();
            for i in 0..pushes {
                h.push(i as u64, 0);
                prop_assert!(h.len() <= HISTORY_DEPTH);
            }
            prop_assert_eq!(h.len(), pushes.min(HISTORY_DEPTH));
        }

        #[test]
        fn timestamps_stay_sorted(pushes in 1usize..300) {
            let mut h: History<i16, HISTORY_DEPTH> = History::new();
            for i in 0..pushes {
                h.push(i as u64 * 371, 0);
            }
            let mut last = None;
            for (ts, _) in h.iter() {
                if let Some(prev) = last {
                    prop_assert!(ts > prev);
                }
                last = Some(ts);
            }
        }
    }
}
