//! Single-task event loop that owns a [`DisplayController`].
//!
//! Intake, pointer, close and teardown requests arrive over an unbounded
//! channel; timer expiry comes from sleeping until the controller's next
//! deadline. Each event runs to completion before the next one is looked at,
//! so the controller itself needs no locking.

use std::future::pending;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::controller::{ControllerSnapshot, DisplayController};
use crate::host::{NodeId, ViewHost};
use crate::types::{EntryId, NotificationPayload};

type Inspect<H> = Box<dyn FnOnce(&DisplayController<H>) + Send>;

enum Command<H: ViewHost> {
    Intake(NotificationPayload),
    PointerEnter(EntryId),
    PointerLeave {
        entry: EntryId,
        related: Option<NodeId>,
    },
    Close(EntryId),
    Click(NodeId),
    Inspect(Inspect<H>),
    Destroy(oneshot::Sender<()>),
}

/// Cloneable sender side of a running controller.
///
/// All calls are fire-and-forget. Once the loop has stopped they are silently
/// ignored, which is how intake after teardown becomes a no-op.
pub struct ControllerHandle<H: ViewHost> {
    tx: mpsc::UnboundedSender<Command<H>>,
}

impl<H: ViewHost> Clone for ControllerHandle<H> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<H: ViewHost + Send + 'static> ControllerHandle<H> {
    pub fn intake(&self, payload: NotificationPayload) {
        self.send(Command::Intake(payload));
    }

    pub fn pointer_enter(&self, entry: EntryId) {
        self.send(Command::PointerEnter(entry));
    }

    pub fn pointer_leave(&self, entry: EntryId, related: Option<NodeId>) {
        self.send(Command::PointerLeave { entry, related });
    }

    pub fn close(&self, entry: EntryId) {
        self.send(Command::Close(entry));
    }

    pub fn click(&self, target: NodeId) {
        self.send(Command::Click(target));
    }

    /// Run `f` against the controller between two events.
    ///
    /// Returns `None` if the loop has stopped.
    pub async fn inspect<R, F>(&self, f: F) -> Option<R>
    where
        R: Send + 'static,
        F: FnOnce(&DisplayController<H>) -> R + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Inspect(Box::new(move |controller| {
            let _ = reply_tx.send(f(controller));
        })));
        reply_rx.await.ok()
    }

    pub async fn snapshot(&self) -> Option<ControllerSnapshot> {
        self.inspect(|controller| controller.snapshot()).await
    }

    /// Tear the controller down and stop the loop. Returns once teardown is
    /// complete; calling it again is a no-op.
    pub async fn destroy(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.send(Command::Destroy(ack_tx));
        let _ = ack_rx.await;
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, command: Command<H>) {
        if self.tx.send(command).is_err() {
            tracing::debug!("Notification event loop stopped; command dropped");
        }
    }
}

/// Start the event loop on the current tokio runtime.
///
/// The join handle yields the controller back after teardown, either from
/// [`ControllerHandle::destroy`] or from every handle being dropped.
pub fn spawn<H>(controller: DisplayController<H>) -> (ControllerHandle<H>, JoinHandle<DisplayController<H>>)
where
    H: ViewHost + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(event_loop(controller, rx));
    tracing::info!("Notification event loop started");
    (ControllerHandle { tx }, task)
}

async fn event_loop<H: ViewHost>(
    mut controller: DisplayController<H>,
    mut rx: mpsc::UnboundedReceiver<Command<H>>,
) -> DisplayController<H> {
    loop {
        let deadline = controller.next_deadline();
        tokio::select! {
            biased;

            _ = wait_for(deadline) => {
                controller.fire_due_timers(Instant::now());
            }
            command = rx.recv() => {
                let Some(command) = command else {
                    tracing::debug!("All controller handles dropped");
                    break;
                };
                if let Some(ack) = apply(&mut controller, command) {
                    let _ = ack.send(());
                    break;
                }
            }
        }
    }

    controller.destroy();
    tracing::info!("Notification event loop stopped");
    controller
}

/// Apply one command. Returns the destroy acknowledgement when the loop
/// should stop.
fn apply<H: ViewHost>(
    controller: &mut DisplayController<H>,
    command: Command<H>,
) -> Option<oneshot::Sender<()>> {
    let now = Instant::now();
    match command {
        Command::Intake(payload) => {
            controller.intake(payload, now);
        }
        Command::PointerEnter(entry) => controller.pointer_enter(entry),
        Command::PointerLeave { entry, related } => controller.pointer_leave(entry, related, now),
        Command::Close(entry) => {
            controller.close(entry, now);
        }
        Command::Click(target) => {
            controller.click(target, now);
        }
        Command::Inspect(f) => f(controller),
        Command::Destroy(ack) => {
            controller.destroy();
            return Some(ack);
        }
    }
    None
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::sleep;

    use super::*;
    use crate::controller::ControllerOptions;
    use crate::host::MemoryTree;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn start(
        max_displayed: usize,
        display_ms: u64,
    ) -> (
        ControllerHandle<MemoryTree>,
        JoinHandle<DisplayController<MemoryTree>>,
    ) {
        spawn(DisplayController::new(
            MemoryTree::new(),
            ControllerOptions {
                max_displayed,
                display_timer: ms(display_ms),
                ..ControllerOptions::default()
            },
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_five_drains_through_three_slots() {
        let (handle, task) = start(3, 200);
        for n in 0..5 {
            handle.intake(NotificationPayload::info(format!("note {n}")));
        }

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.active.len(), 3);
        assert_eq!(snapshot.pending.len(), 2);
        assert!(snapshot.container.is_some());

        sleep(ms(250)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.active.len(), 2);
        assert!(snapshot.pending.is_empty());

        sleep(ms(200)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.active.is_empty());
        assert_eq!(snapshot.removed, 5);
        assert_eq!(snapshot.container, None);

        handle.destroy().await;
        let controller = task.await.unwrap();
        assert_eq!(controller.host().attached_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn destroy_right_after_intake_cancels_the_timer() {
        let (handle, task) = start(3, 200);
        handle.intake(NotificationPayload::info("short lived"));
        handle.destroy().await;

        sleep(ms(1_000)).await;
        handle.intake(NotificationPayload::info("ignored"));

        let controller = task.await.unwrap();
        assert!(controller.is_destroyed());
        assert_eq!(controller.removed_count(), 0);
        assert_eq!(controller.next_deadline(), None);
        assert_eq!(controller.host().attached_count(), 1);
        assert!(handle.is_closed());
        assert_eq!(handle.snapshot().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn second_destroy_is_a_no_op() {
        let (handle, task) = start(3, 200);
        handle.destroy().await;
        handle.destroy().await;

        assert!(task.await.unwrap().is_destroyed());
    }

    #[tokio::test(start_paused = true)]
    async fn hovered_item_outlives_its_timer_and_resumes() {
        let (handle, _task) = start(3, 1_000);
        handle.intake(NotificationPayload::info("hover me"));
        let id = handle.snapshot().await.unwrap().active[0].id;

        handle.pointer_enter(id);
        sleep(ms(300)).await;
        handle.pointer_leave(id, None);
        // Displayed for 300ms of 1000ms; 700ms remain from here.
        sleep(ms(5_000)).await;
        assert!(handle.snapshot().await.unwrap().active.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn release_counts_remaining_time_from_the_leave() {
        let (handle, _task) = start(3, 1_000);
        handle.intake(NotificationPayload::info("hover me"));
        let id = handle.snapshot().await.unwrap().active[0].id;

        handle.pointer_enter(id);
        sleep(ms(400)).await;
        handle.pointer_leave(id, None);

        sleep(ms(590)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.active.len(), 1);
        assert!(!snapshot.active[0].paused);

        sleep(ms(20)).await;
        assert!(handle.snapshot().await.unwrap().active.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn paused_item_never_expires() {
        let (handle, _task) = start(3, 100);
        handle.intake(NotificationPayload::info("stay"));
        let id = handle.snapshot().await.unwrap().active[0].id;

        handle.pointer_enter(id);
        sleep(ms(60_000)).await;

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.active.len(), 1);
        assert!(snapshot.active[0].paused);
    }

    #[tokio::test(start_paused = true)]
    async fn click_on_close_button_goes_through_the_loop() {
        let (handle, _task) = start(3, 10_000);
        handle.intake(NotificationPayload::info("dismiss me"));
        let id = handle.snapshot().await.unwrap().active[0].id;
        let button = handle
            .inspect(move |c| c.item(id).and_then(|item| item.close_button()))
            .await
            .flatten()
            .unwrap();

        handle.click(button);

        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.active.is_empty());
        assert_eq!(snapshot.removed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_every_handle_tears_down() {
        let (handle, task) = start(3, 10_000);
        handle.intake(NotificationPayload::info("orphan"));
        handle.snapshot().await.unwrap();
        drop(handle);

        let controller = task.await.unwrap();
        assert!(controller.is_destroyed());
        assert_eq!(controller.host().attached_count(), 1);
    }
}
