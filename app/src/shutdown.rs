use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use toast_queue::ViewHost;

use crate::notifications::Notifications;

/// Sleep for `duration` unless `token` is cancelled first. Returns `true`
/// when cancelled.
pub async fn sleep_or_cancel(token: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => true,
        _ = sleep(duration) => false,
    }
}

pub async fn graceful_shutdown<H>(token: &CancellationToken, widget: &mut Notifications<H>)
where
    H: ViewHost + Send + 'static,
{
    tracing::info!("Shutdown sequence started");

    token.cancel();
    tracing::info!("Shutdown: background loops cancelled");

    widget.unsubscribe();
    tracing::info!("Shutdown: room subscriptions closed");

    if widget.destroy().await.is_some() {
        tracing::info!("Shutdown: notification controller destroyed");
    }

    tracing::info!("Shutdown sequence completed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotificationsOptions;

    #[tokio::test(start_paused = true)]
    async fn sleep_or_cancel_reports_cancellation() {
        let token = CancellationToken::new();
        assert!(!sleep_or_cancel(&token, Duration::from_millis(10)).await);

        token.cancel();
        assert!(sleep_or_cancel(&token, Duration::from_secs(60)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_and_destroys() {
        let token = CancellationToken::new();
        let mut widget = Notifications::with_memory_surface(NotificationsOptions::default()).unwrap();

        graceful_shutdown(&token, &mut widget).await;

        assert!(token.is_cancelled());
        assert!(widget.is_destroyed());
        // Safe to run twice.
        graceful_shutdown(&token, &mut widget).await;
    }
}
