//! Display controller: pending queue, bounded active set, container
//! lifecycle.
//!
//! The controller is a plain owned state machine. Every entry point takes
//! the current instant, so it can be driven by the event loop in
//! [`crate::runtime`] or stepped by hand in tests.


use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::host::{NodeId, ViewHost};
use crate::item::{NotificationItem, Removed};
use crate::timer::TimerQueue;
use crate::types::{EntryId, NotificationKind, NotificationPayload, Position};
use crate::{CONTAINER_CLASS, OVERRIDE_CLASS};

pub const DEFAULT_MAX_DISPLAYED: usize = 3;
pub const DEFAULT_DISPLAY_TIMER: Duration = Duration::from_millis(3000);

/// Validated settings the controller runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerOptions {
    pub max_displayed: usize,
    pub display_timer: Duration,
    pub position: Position,
    /// Caller-owned container. When `None` the controller generates one
    /// under the host body.
    pub container: Option<NodeId>,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            max_displayed: DEFAULT_MAX_DISPLAYED,
            display_timer: DEFAULT_DISPLAY_TIMER,
            position: Position::default(),
            container: None,
        }
    }
}

/// A notification waiting for a free display slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub id: EntryId,
    pub payload: NotificationPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveSummary {
    pub id: EntryId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub paused: bool,
}

/// Point-in-time view of the controller, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerSnapshot {
    pub active: Vec<ActiveSummary>,
    pub pending: Vec<EntryId>,
    pub container: Option<NodeId>,
    pub destroyed: bool,
    /// Removal signals consumed so far.
    pub removed: u64,
}

pub struct DisplayController<H: ViewHost> {
    host: H,
    options: ControllerOptions,
    /// Container currently in use, acquired on the first intake.
    container: Option<NodeId>,
    pending: VecDeque<QueueEntry>,
    active: Vec<NotificationItem>,
    timers: TimerQueue,
    next_id: u64,
    removed: u64,
    destroyed: bool,
}

impl<H: ViewHost> DisplayController<H> {
    pub fn new(host: H, options: ControllerOptions) -> Self {
        let options = ControllerOptions {
            max_displayed: options.max_displayed.max(1),
            ..options
        };
        Self {
            host,
            options,
            container: None,
            pending: VecDeque::new(),
            active: Vec::new(),
            timers: TimerQueue::new(),
            next_id: 0,
            removed: 0,
            destroyed: false,
        }
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn container(&self) -> Option<NodeId> {
        self.container
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn active_ids(&self) -> Vec<EntryId> {
        self.active.iter().map(NotificationItem::id).collect()
    }

    pub fn pending_ids(&self) -> Vec<EntryId> {
        self.pending.iter().map(|entry| entry.id).collect()
    }

    pub fn item(&self, id: EntryId) -> Option<&NotificationItem> {
        self.active.iter().find(|item| item.id() == id)
    }

    /// Removal signals consumed so far.
    pub fn removed_count(&self) -> u64 {
        self.removed
    }

    /// Earliest instant at which an active item may expire.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            active: self
                .active
                .iter()
                .map(|item| ActiveSummary {
                    id: item.id(),
                    kind: item.payload().kind,
                    message: item.payload().message.clone(),
                    paused: item.is_paused(),
                })
                .collect(),
            pending: self.pending_ids(),
            container: self.container,
            destroyed: self.destroyed,
            removed: self.removed,
        }
    }

    /// Queue a notification and show it as soon as a slot is free.
    ///
    /// Returns `None` once the controller has been destroyed.
    pub fn intake(&mut self, payload: NotificationPayload, now: Instant) -> Option<EntryId> {
        if self.destroyed {
            tracing::debug!("Intake ignored: controller destroyed");
            return None;
        }

        self.ensure_container();

        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.pending.push_back(QueueEntry { id, payload });
        tracing::debug!(entry = %id, pending = self.pending.len(), "Notification queued");

        self.schedule(now);
        Some(id)
    }

    /// Pointer entered an active item.
    pub fn pointer_enter(&mut self, id: EntryId) {
        if let Some(item) = self.active.iter_mut().find(|item| item.id() == id) {
            item.pointer_enter(&mut self.timers);
        }
    }

    /// Pointer left an active item towards `related`.
    pub fn pointer_leave(&mut self, id: EntryId, related: Option<NodeId>, now: Instant) {
        let Some(item) = self.active.iter_mut().find(|item| item.id() == id) else {
            return;
        };
        if let Some(removed) = item.pointer_leave(&mut self.host, related, now, &mut self.timers) {
            self.on_entry_removed(removed, now);
        }
    }

    /// Dismiss an active item. Returns `false` if `id` is not on screen.
    pub fn close(&mut self, id: EntryId, now: Instant) -> bool {
        let Some(item) = self.active.iter_mut().find(|item| item.id() == id) else {
            tracing::debug!(entry = %id, "Close ignored: entry not active");
            return false;
        };
        match item.remove(&mut self.host, &mut self.timers) {
            Some(removed) => {
                tracing::debug!(entry = %id, "Notification closed");
                self.on_entry_removed(removed, now);
                true
            }
            None => false,
        }
    }

    /// Route a click on `target` to the close button it belongs to.
    pub fn click(&mut self, target: NodeId, now: Instant) -> Option<EntryId> {
        let id = self
            .active
            .iter()
            .find(|item| {
                item.close_button()
                    .is_some_and(|button| self.host.contains(button, target))
            })
            .map(NotificationItem::id)?;
        self.close(id, now).then_some(id)
    }

    /// Expire every item whose timer is due at `now`.
    pub fn fire_due_timers(&mut self, now: Instant) -> usize {
        let mut expired = 0;
        while let Some((entry, handle)) = self.timers.pop_due(now) {
            let Some(item) = self.active.iter_mut().find(|item| item.id() == entry) else {
                tracing::warn!(entry = %entry, "Timer fired for an entry that is not active");
                continue;
            };
            if let Some(removed) = item.expire(handle, &mut self.host, &mut self.timers) {
                self.on_entry_removed(removed, now);
                expired += 1;
            }
        }
        expired
    }

    /// Tear everything down: cancel timers, detach views, drop the queue.
    ///
    /// No removal signals are processed. A generated container is detached;
    /// a caller-supplied one is left where it is.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        let dropped_active = self.active.len();
        let dropped_pending = self.pending.len();
        for mut item in self.active.drain(..) {
            let _ = item.remove(&mut self.host, &mut self.timers);
        }
        self.pending.clear();
        self.timers.clear();
        self.release_container();

        tracing::info!(
            active = dropped_active,
            pending = dropped_pending,
            "Notification controller destroyed"
        );
    }

    /// Move pending entries to the screen while capacity allows.
    fn schedule(&mut self, now: Instant) {
        while self.active.len() < self.options.max_displayed {
            let Some(entry) = self.pending.pop_front() else {
                break;
            };
            let container = self.ensure_container();
            let mut item = NotificationItem::new(entry.id, entry.payload);
            item.render(
                &mut self.host,
                container,
                self.options.display_timer,
                now,
                &mut self.timers,
            );
            self.active.push(item);
        }
        debug_assert!(self.active.len() <= self.options.max_displayed);
    }

    fn on_entry_removed(&mut self, removed: Removed, now: Instant) {
        let Removed(id) = removed;
        let Some(index) = self.active.iter().position(|item| item.id() == id) else {
            panic!("removal signal for {id}, which is not active");
        };
        self.active.remove(index);
        self.removed += 1;
        tracing::debug!(entry = %id, active = self.active.len(), pending = self.pending.len(), "Notification removed");

        self.schedule(now);

        if self.active.is_empty() {
            self.release_container();
        }
    }

    fn ensure_container(&mut self) -> NodeId {
        if let Some(container) = self.container {
            return container;
        }

        let container = match self.options.container {
            Some(supplied) => supplied,
            None => {
                let position_class = self.options.position.class_name();
                let node = self.host.create_element(
                    "div",
                    &[OVERRIDE_CLASS, position_class.as_str(), CONTAINER_CLASS],
                    None,
                );
                let body = self.host.body();
                self.host.append_child(body, node);
                tracing::debug!(position = %self.options.position, "Notification container attached");
                node
            }
        };
        self.container = Some(container);
        container
    }

    /// Collapse the surface once nothing is displayed.
    fn release_container(&mut self) {
        let Some(container) = self.container.take() else {
            return;
        };
        if self.options.container.is_none() {
            let body = self.host.body();
            self.host.remove_child(body, container);
            tracing::debug!("Notification container detached");
        }
    }
}
