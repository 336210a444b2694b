//! A single on-screen notification: its view nodes, its timer and its
//! hover state.

use std::time::Duration;

use tokio::time::Instant;

use crate::host::{NodeId, ViewHost};
use crate::timer::{Resume, TimerHandle, TimerQueue, TimerState};
use crate::types::{EntryId, NotificationPayload};
use crate::{CLOSE_CLASS, ITEM_CLASS, MESSAGE_CLASS};

/// One-shot signal that an item left the screen. Produced at most once per
/// item; the controller is its only consumer.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removed(pub EntryId);

#[derive(Debug, Clone, Copy)]
struct ItemView {
    container: NodeId,
    root: NodeId,
    close_button: NodeId,
}

#[derive(Debug)]
enum Lifecycle {
    Created,
    Rendered {
        view: ItemView,
        timer: TimerState,
        /// `None` while paused.
        handle: Option<TimerHandle>,
    },
    Removed,
}

#[derive(Debug)]
pub struct NotificationItem {
    id: EntryId,
    payload: NotificationPayload,
    lifecycle: Lifecycle,
}

impl NotificationItem {
    pub fn new(id: EntryId, payload: NotificationPayload) -> Self {
        Self {
            id,
            payload,
            lifecycle: Lifecycle::Created,
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn payload(&self) -> &NotificationPayload {
        &self.payload
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Rendered { .. })
    }

    pub fn is_removed(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Removed)
    }

    pub fn is_paused(&self) -> bool {
        matches!(&self.lifecycle, Lifecycle::Rendered { timer, .. } if timer.is_paused())
    }

    pub fn timer(&self) -> Option<&TimerState> {
        match &self.lifecycle {
            Lifecycle::Rendered { timer, .. } => Some(timer),
            _ => None,
        }
    }

    /// Root node of the rendered view.
    pub fn root(&self) -> Option<NodeId> {
        match &self.lifecycle {
            Lifecycle::Rendered { view, .. } => Some(view.root),
            _ => None,
        }
    }

    pub fn close_button(&self) -> Option<NodeId> {
        match &self.lifecycle {
            Lifecycle::Rendered { view, .. } => Some(view.close_button),
            _ => None,
        }
    }

    /// Build the view, insert it in front of any existing siblings in
    /// `container`, and start the expiry timer.
    pub fn render<H: ViewHost>(
        &mut self,
        host: &mut H,
        container: NodeId,
        visible: Duration,
        now: Instant,
        timers: &mut TimerQueue,
    ) {
        if !matches!(self.lifecycle, Lifecycle::Created) {
            tracing::warn!(entry = %self.id, "render called on an item that was already rendered");
            return;
        }

        let kind_class = format!("{ITEM_CLASS}-{}", self.payload.kind);
        let root = host.create_element("div", &[ITEM_CLASS, kind_class.as_str()], None);
        let message = host.create_element("span", &[MESSAGE_CLASS], Some(&self.payload.message));
        let close_button = host.create_element("button", &[CLOSE_CLASS], Some("\u{d7}"));
        host.append_child(root, message);
        host.append_child(root, close_button);
        host.prepend_child(container, root);

        let timer = TimerState::start(visible, now);
        let handle = timers.schedule(self.id, timer.deadline());
        tracing::debug!(entry = %self.id, kind = %self.payload.kind, visible = ?visible, "Notification rendered");

        self.lifecycle = Lifecycle::Rendered {
            view: ItemView {
                container,
                root,
                close_button,
            },
            timer,
            handle: Some(handle),
        };
    }

    /// Pointer entered the item (or one of its children): hold the timer.
    pub fn pointer_enter(&mut self, timers: &mut TimerQueue) {
        let Lifecycle::Rendered { timer, handle, .. } = &mut self.lifecycle else {
            return;
        };
        if !timer.pause() {
            return;
        }
        if let Some(h) = handle.take() {
            timers.cancel(h);
        }
        tracing::debug!(entry = %self.id, remaining = ?timer.remaining, "Notification paused");
    }

    /// Pointer left the item towards `related`.
    ///
    /// Moving onto the item's own subtree is not a leave. Otherwise a paused
    /// item either expires right away or restarts its timer for whatever
    /// display time is left.
    pub fn pointer_leave<H: ViewHost>(
        &mut self,
        host: &mut H,
        related: Option<NodeId>,
        now: Instant,
        timers: &mut TimerQueue,
    ) -> Option<Removed> {
        let Lifecycle::Rendered {
            view,
            timer,
            handle,
        } = &mut self.lifecycle
        else {
            return None;
        };
        if related.is_some_and(|node| host.contains(view.root, node)) {
            return None;
        }
        if !timer.is_paused() {
            return None;
        }

        match timer.resume(now) {
            Resume::Expired => {
                tracing::debug!(entry = %self.id, "Notification overstayed while hovered");
                self.remove(host, timers)
            }
            Resume::Rearmed(deadline) => {
                *handle = Some(timers.schedule(self.id, deadline));
                tracing::debug!(entry = %self.id, remaining = ?timer.remaining, "Notification resumed");
                None
            }
        }
    }

    /// The timer identified by `fired` went off.
    ///
    /// Handles that no longer match the item's live timer are ignored.
    pub fn expire<H: ViewHost>(
        &mut self,
        fired: TimerHandle,
        host: &mut H,
        timers: &mut TimerQueue,
    ) -> Option<Removed> {
        let is_live = matches!(
            &self.lifecycle,
            Lifecycle::Rendered { handle: Some(live), .. } if *live == fired
        );
        if !is_live {
            return None;
        }
        tracing::debug!(entry = %self.id, "Notification expired");
        self.remove(host, timers)
    }

    /// Detach the view and cancel the timer. Only the first call on a
    /// rendered item yields a [`Removed`] signal.
    pub fn remove<H: ViewHost>(&mut self, host: &mut H, timers: &mut TimerQueue) -> Option<Removed> {
        if !self.is_rendered() {
            return None;
        }
        let Lifecycle::Rendered { view, handle, .. } =
            std::mem::replace(&mut self.lifecycle, Lifecycle::Removed)
        else {
            return None;
        };
        if let Some(h) = handle {
            timers.cancel(h);
        }
        host.remove_child(view.container, view.root);
        Some(Removed(self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryTree;
    use crate::types::NotificationKind;

    const VISIBLE: Duration = Duration::from_millis(3000);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    struct Fixture {
        host: MemoryTree,
        timers: TimerQueue,
        container: NodeId,
        t0: Instant,
    }

    fn fixture() -> Fixture {
        let mut host = MemoryTree::new();
        let container = host.create_element("div", &["gi-notify-container"], None);
        let body = host.body();
        host.append_child(body, container);
        Fixture {
            host,
            timers: TimerQueue::new(),
            container,
            t0: Instant::now(),
        }
    }

    fn rendered(fx: &mut Fixture, id: u64) -> NotificationItem {
        let mut item = NotificationItem::new(
            EntryId(id),
            NotificationPayload::new(NotificationKind::Success, format!("message {id}")),
        );
        item.render(&mut fx.host, fx.container, VISIBLE, fx.t0, &mut fx.timers);
        item
    }

    #[test]
    fn render_builds_view_and_arms_timer() {
        let mut fx = fixture();
        let item = rendered(&mut fx, 1);

        let root = item.root().unwrap();
        assert!(fx.host.is_attached(root));
        assert!(fx.host.has_class(root, "gi-notify"));
        assert!(fx.host.has_class(root, "gi-notify-success"));
        assert!(fx.host.contains(root, item.close_button().unwrap()));
        assert_eq!(fx.timers.next_deadline(), Some(fx.t0 + VISIBLE));
        assert!(!item.is_paused());
    }

    #[test]
    fn newer_items_render_in_front() {
        let mut fx = fixture();
        let first = rendered(&mut fx, 1);
        let second = rendered(&mut fx, 2);

        assert_eq!(
            fx.host.children(fx.container),
            vec![second.root().unwrap(), first.root().unwrap()]
        );
    }

    #[test]
    fn remove_is_idempotent() {
        let mut fx = fixture();
        let mut item = rendered(&mut fx, 1);
        let root = item.root().unwrap();

        assert_eq!(item.remove(&mut fx.host, &mut fx.timers), Some(Removed(EntryId(1))));
        assert_eq!(item.remove(&mut fx.host, &mut fx.timers), None);
        assert!(!fx.host.is_attached(root));
        assert!(fx.timers.is_empty());
        assert!(item.is_removed());
    }

    #[test]
    fn removing_an_unrendered_item_does_nothing() {
        let mut fx = fixture();
        let mut item = NotificationItem::new(EntryId(9), NotificationPayload::info("queued"));

        assert_eq!(item.remove(&mut fx.host, &mut fx.timers), None);
        assert!(!item.is_removed());
        assert!(!item.is_rendered());
    }

    #[test]
    fn hover_cancels_and_leave_rearms_for_the_rest() {
        let mut fx = fixture();
        let mut item = rendered(&mut fx, 1);

        item.pointer_enter(&mut fx.timers);
        assert!(item.is_paused());
        assert!(fx.timers.is_empty());

        let leave_at = fx.t0 + ms(1000);
        let signal = item.pointer_leave(&mut fx.host, None, leave_at, &mut fx.timers);

        assert_eq!(signal, None);
        assert!(!item.is_paused());
        assert_eq!(item.timer().unwrap().remaining, ms(2000));
        assert_eq!(fx.timers.next_deadline(), Some(leave_at + ms(2000)));
    }

    #[test]
    fn leaving_towards_a_child_keeps_the_pause() {
        let mut fx = fixture();
        let mut item = rendered(&mut fx, 1);
        let button = item.close_button().unwrap();

        item.pointer_enter(&mut fx.timers);
        let signal = item.pointer_leave(&mut fx.host, Some(button), fx.t0 + ms(10_000), &mut fx.timers);

        assert_eq!(signal, None);
        assert!(item.is_paused());
        assert!(fx.timers.is_empty());
    }

    #[test]
    fn leaving_after_the_full_duration_removes_immediately() {
        let mut fx = fixture();
        let mut item = rendered(&mut fx, 1);

        item.pointer_enter(&mut fx.timers);
        let signal = item.pointer_leave(&mut fx.host, Some(fx.container), fx.t0 + VISIBLE, &mut fx.timers);

        assert_eq!(signal, Some(Removed(EntryId(1))));
        assert!(item.is_removed());
    }

    #[test]
    fn leave_without_enter_is_ignored() {
        let mut fx = fixture();
        let mut item = rendered(&mut fx, 1);

        let signal = item.pointer_leave(&mut fx.host, None, fx.t0 + ms(500), &mut fx.timers);

        assert_eq!(signal, None);
        assert_eq!(fx.timers.next_deadline(), Some(fx.t0 + VISIBLE));
    }

    #[test]
    fn second_enter_does_not_disturb_pause() {
        let mut fx = fixture();
        let mut item = rendered(&mut fx, 1);

        item.pointer_enter(&mut fx.timers);
        item.pointer_enter(&mut fx.timers);

        assert!(item.is_paused());
        assert_eq!(item.timer().unwrap().remaining, VISIBLE);
    }

    #[test]
    fn live_handle_expires() {
        let mut fx = fixture();
        let mut item = rendered(&mut fx, 1);
        let (entry, fired) = fx.timers.pop_due(fx.t0 + VISIBLE).unwrap();
        assert_eq!(entry, EntryId(1));

        assert_eq!(item.expire(fired, &mut fx.host, &mut fx.timers), Some(Removed(EntryId(1))));
        assert_eq!(item.expire(fired, &mut fx.host, &mut fx.timers), None);
    }

    #[test]
    fn stale_handle_does_not_expire() {
        let mut fx = fixture();
        let mut item = rendered(&mut fx, 1);
        let (_, original) = fx.timers.pop_due(fx.t0 + VISIBLE).unwrap();

        item.pointer_enter(&mut fx.timers);
        let _ = item.pointer_leave(&mut fx.host, None, fx.t0 + ms(10), &mut fx.timers);

        assert_eq!(item.expire(original, &mut fx.host, &mut fx.timers), None);
        assert!(item.is_rendered());
        assert_eq!(fx.timers.len(), 1);
    }
}
