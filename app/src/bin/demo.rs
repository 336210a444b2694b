//! Demo binary: two connections share a room, one publishes a burst of
//! notifications and the other displays them on an in-memory surface.
//!
//! Options come from the environment (`NOTIFY_*`, `.env`). Stop early with
//! Ctrl+C.

use std::time::Duration;

use chrono::Local;
use room_channel::Hub;
use tokio_util::sync::CancellationToken;
use toast_queue::NotificationKind;

use room_notifications_lib::config::defaults::OPTION_DEFS;
use room_notifications_lib::logging;
use room_notifications_lib::shutdown::{graceful_shutdown, sleep_or_cancel};
use room_notifications_lib::{Notifications, NotificationsOptions, PublishOptions};

const DEMO_ROOM: &str = "demo-room";
const BURST: usize = 6;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    tracing::info!("Starting room notifications demo");

    for def in OPTION_DEFS.iter() {
        tracing::info!(
            option = def.key,
            env = def.env.unwrap_or("-"),
            default = %def.default,
            "{}",
            def.description
        );
    }
    let options = NotificationsOptions::from_env()?;
    let summary = serde_json::to_string(&options)?;
    tracing::info!(options = %summary, "Options loaded");

    let hub = Hub::new();
    let viewer = hub.join(DEMO_ROOM);
    let publisher = hub.join(DEMO_ROOM);

    let mut widget = Notifications::with_memory_surface(options.clone())?;
    widget.subscribe(&[viewer])?;

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl+C received");
            ctrl_c.cancel();
        }
    });

    for (n, kind) in NotificationKind::ALL.iter().cycle().take(BURST).enumerate() {
        let message = format!("Build #{} finished ({kind})", n + 1);
        widget.publish(PublishOptions::new(&publisher, message).kind(*kind))?;
    }

    // Give the forwarder a moment, then hover the oldest visible item.
    sleep_or_cancel(&token, Duration::from_millis(10)).await;
    let hovered = widget
        .handle()
        .snapshot()
        .await
        .and_then(|s| s.active.first().map(|item| item.id));
    if let Some(id) = hovered {
        tracing::info!(entry = %id, "Hovering notification");
        widget.handle().pointer_enter(id);
    }

    let tick = (options.display_timer() / 4).max(Duration::from_millis(100));
    let hover_for = options.display_timer();
    let mut elapsed = Duration::ZERO;

    loop {
        let Some(snapshot) = widget.handle().snapshot().await else {
            break;
        };
        let outline = widget
            .handle()
            .inspect(|controller| controller.host().outline())
            .await
            .unwrap_or_default();

        println!("[{}] {}", Local::now().format("%H:%M:%S%.3f"), serde_json::to_string(&snapshot)?);
        println!("{outline}");

        if snapshot.active.is_empty() && snapshot.pending.is_empty() {
            tracing::info!(removed = snapshot.removed, "Queue drained");
            break;
        }
        if sleep_or_cancel(&token, tick).await {
            tracing::info!("Demo interrupted");
            break;
        }
        elapsed += tick;

        match hovered {
            Some(id) if elapsed >= hover_for && elapsed < hover_for + tick => {
                tracing::info!(entry = %id, "Pointer left notification");
                widget.handle().pointer_leave(id, None);
            }
            _ => {}
        }
    }

    graceful_shutdown(&token, &mut widget).await;
    Ok(())
}
