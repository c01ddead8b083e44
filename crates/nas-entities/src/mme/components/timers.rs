use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use nas_core::UeId;
use nas_saps::control::NasTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledExpiry {
    pub deadline: Instant,
    pub ue: UeId,
    pub timer: NasTimer,
    pub generation: u64,
}

// Reversed on the deadline so that BinaryHeap pops the earliest first
impl Ord for ScheduledExpiry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.deadline.cmp(&self.deadline).then_with(|| other.generation.cmp(&self.generation))
    }
}

impl PartialOrd for ScheduledExpiry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Deadlines of the timers armed by one procedure engine. Entries are never removed
/// when a timer is stopped; the generation kept in the UE context tells live from stale.
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<ScheduledExpiry>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: Instant, ue: UeId, timer: NasTimer, generation: u64) {
        tracing::trace!("schedule {} for ue {} gen {}", timer, ue, generation);
        self.heap.push(ScheduledExpiry { deadline, ue, timer, generation });
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|e| e.deadline)
    }

    /// Removes and returns all entries due at `now`, earliest first
    pub fn pop_due(&mut self, now: Instant) -> Vec<ScheduledExpiry> {
        let mut due = Vec::new();
        while let Some(next) = self.heap.peek() {
            if next.deadline > now {
                break;
            }
            if let Some(e) = self.heap.pop() {
                due.push(e);
            }
        }
        due
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_pop_due_in_order() {
        let t0 = Instant::now();
        let mut q = TimerQueue::new();
        q.schedule(t0 + Duration::from_secs(3), 1, NasTimer::T3460, 1);
        q.schedule(t0 + Duration::from_secs(1), 2, NasTimer::T3413, 2);
        q.schedule(t0 + Duration::from_secs(2), 3, NasTimer::T3450, 3);
        assert_eq!(q.next_deadline(), Some(t0 + Duration::from_secs(1)));

        assert!(q.pop_due(t0).is_empty());
        let due = q.pop_due(t0 + Duration::from_secs(2));
        assert_eq!(due.iter().map(|e| e.ue).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop_due(t0 + Duration::from_secs(10)).len(), 1);
        assert!(q.is_empty());
    }
}
