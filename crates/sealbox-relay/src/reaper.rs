use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use sealbox_store::Store;

/// Spawn the periodic TTL reaper. Runs until the handle is aborted at
/// shutdown; the first reap happens immediately.
pub fn spawn_reaper(store: Store, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match store.reap_expired(Utc::now()).await {
                Ok((messages, tokens)) => {
                    if messages > 0 || tokens > 0 {
                        debug!(messages, tokens, "reaped expired rows");
                    }
                }
                Err(e) => warn!(error = %e, "reap failed"),
            }
        }
    })
}
