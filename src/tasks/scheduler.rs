use tokio::sync::watch;
use tokio::time::{interval, Duration};

use crate::core::state::AppState;
use crate::tasks::reaper;

/// Background loop driving the expiry reaper on a fixed tick, independent
/// of request traffic. Errors are logged and the loop waits for the next
/// tick; it never takes the process down.
pub(crate) async fn run(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let mut tick =
        interval(Duration::from_secs(state.settings().session().reaper_interval_seconds));

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                if let Err(err) = reaper::auto_submit_expired(&state).await {
                    tracing::error!(error = %err, "auto_submit_expired failed");
                }
            }
        }
    }

    tracing::info!("Expiry reaper stopped");
}
