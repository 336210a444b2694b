//! Per-item visible lifetime and the deadline queue that drives expiry.
//!
//! Timers are plain entries in a [`TimerQueue`] owned by the controller. The
//! event loop sleeps until [`TimerQueue::next_deadline`] and then pops due
//! entries. Cancelling a [`TimerHandle`] deletes its queue entry, so a
//! cancelled or replaced timer has nothing left that could fire.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::types::EntryId;

/// Handle to one scheduled expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    deadline: Instant,
    ticket: u64,
}

impl TimerHandle {
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

/// Ordered set of pending expiries.
#[derive(Debug, Default)]
pub struct TimerQueue {
    due: BTreeMap<(Instant, u64), EntryId>,
    next_ticket: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `entry` to expire at `deadline`.
    ///
    /// Tickets are unique, so two timers with the same deadline fire in the
    /// order they were scheduled.
    pub fn schedule(&mut self, entry: EntryId, deadline: Instant) -> TimerHandle {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.due.insert((deadline, ticket), entry);
        TimerHandle { deadline, ticket }
    }

    /// Cancel a timer. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.due.remove(&(handle.deadline, handle.ticket)).is_some()
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.due.keys().next().map(|&(deadline, _)| deadline)
    }

    /// Remove and return the earliest timer whose deadline is `<= now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<(EntryId, TimerHandle)> {
        let (&(deadline, ticket), _) = self.due.first_key_value()?;
        if deadline > now {
            return None;
        }
        let entry = self.due.remove(&(deadline, ticket))?;
        Some((entry, TimerHandle { deadline, ticket }))
    }

    pub fn len(&self) -> usize {
        self.due.len()
    }

    pub fn is_empty(&self) -> bool {
        self.due.is_empty()
    }

    pub fn clear(&mut self) {
        self.due.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    Running,
    Paused,
}

/// Outcome of a pointer leaving a paused item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// The item was on screen for at least its remaining time.
    Expired,
    /// Timer restarted; it should fire at the contained instant.
    Rearmed(Instant),
}

/// Remaining visible time of one item.
///
/// `started_at` marks the start of the current display stretch: render time,
/// or the last resume. Time spent paused still counts toward it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerState {
    pub remaining: Duration,
    pub started_at: Instant,
    pub status: TimerStatus,
}

impl TimerState {
    pub fn start(remaining: Duration, now: Instant) -> Self {
        Self {
            remaining,
            started_at: now,
            status: TimerStatus::Running,
        }
    }

    /// Deadline of the current display stretch.
    pub fn deadline(&self) -> Instant {
        self.started_at + self.remaining
    }

    pub fn is_paused(&self) -> bool {
        self.status == TimerStatus::Paused
    }

    /// Running -> paused. Returns `false` if already paused.
    pub fn pause(&mut self) -> bool {
        if self.is_paused() {
            return false;
        }
        self.status = TimerStatus::Paused;
        true
    }

    /// Paused -> running, charging the elapsed display time against
    /// `remaining`.
    pub fn resume(&mut self, now: Instant) -> Resume {
        let displayed = now.saturating_duration_since(self.started_at);
        if displayed >= self.remaining {
            return Resume::Expired;
        }
        self.remaining -= displayed;
        self.started_at = now;
        self.status = TimerStatus::Running;
        Resume::Rearmed(self.deadline())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn pop_due_respects_deadline_order() {
        let t0 = Instant::now();
        let mut queue = TimerQueue::new();
        queue.schedule(EntryId(1), t0 + ms(300));
        queue.schedule(EntryId(2), t0 + ms(100));
        queue.schedule(EntryId(3), t0 + ms(200));

        assert_eq!(queue.next_deadline(), Some(t0 + ms(100)));
        assert!(queue.pop_due(t0 + ms(99)).is_none());

        let fired: Vec<_> = std::iter::from_fn(|| queue.pop_due(t0 + ms(250)))
            .map(|(entry, _)| entry)
            .collect();
        assert_eq!(fired, vec![EntryId(2), EntryId(3)]);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn equal_deadlines_fire_in_schedule_order() {
        let t0 = Instant::now();
        let mut queue = TimerQueue::new();
        queue.schedule(EntryId(7), t0);
        queue.schedule(EntryId(3), t0);

        assert_eq!(queue.pop_due(t0).map(|(e, _)| e), Some(EntryId(7)));
        assert_eq!(queue.pop_due(t0).map(|(e, _)| e), Some(EntryId(3)));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let t0 = Instant::now();
        let mut queue = TimerQueue::new();
        let handle = queue.schedule(EntryId(1), t0 + ms(10));

        assert!(queue.cancel(handle));
        assert!(!queue.cancel(handle));
        assert!(queue.pop_due(t0 + ms(1000)).is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn replacing_a_timer_leaves_only_the_new_one() {
        let t0 = Instant::now();
        let mut queue = TimerQueue::new();
        let old = queue.schedule(EntryId(1), t0 + ms(10));
        queue.cancel(old);
        let new = queue.schedule(EntryId(1), t0 + ms(50));

        assert!(queue.pop_due(t0 + ms(10)).is_none());
        assert_eq!(queue.pop_due(t0 + ms(50)), Some((EntryId(1), new)));
    }

    #[test]
    fn resume_charges_display_time() {
        let t0 = Instant::now();
        let mut state = TimerState::start(ms(3000), t0);
        assert!(state.pause());
        assert!(!state.pause());

        let outcome = state.resume(t0 + ms(1000));

        assert_eq!(outcome, Resume::Rearmed(t0 + ms(3000)));
        assert_eq!(state.remaining, ms(2000));
        assert_eq!(state.started_at, t0 + ms(1000));
        assert_eq!(state.status, TimerStatus::Running);
    }

    #[test]
    fn resume_after_full_duration_expires() {
        let t0 = Instant::now();
        let mut state = TimerState::start(ms(200), t0);
        state.pause();

        assert_eq!(state.resume(t0 + ms(200)), Resume::Expired);
        assert_eq!(state.resume(t0 + ms(900)), Resume::Expired);
    }

    #[test]
    fn successive_resumes_accumulate() {
        let t0 = Instant::now();
        let mut state = TimerState::start(ms(1000), t0);
        state.pause();
        assert_eq!(state.resume(t0 + ms(300)), Resume::Rearmed(t0 + ms(1000)));
        state.pause();
        assert_eq!(state.resume(t0 + ms(800)), Resume::Rearmed(t0 + ms(1000)));
        assert_eq!(state.remaining, ms(200));
    }
}
