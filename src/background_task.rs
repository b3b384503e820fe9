use actix_web::web;
use chrono::Utc;
use tokio::time::{interval, Duration};

use crate::{constants::SWEEP_INTERVAL_SECS, AppState};

/// Drops expired contact rate-limit windows and revoked sessions whose token
/// has expired anyway.
pub async fn start_sweep_task(state: web::Data<AppState>) {
    let mut interval = interval(Duration::from_secs(SWEEP_INTERVAL_SECS));

    loop {
        interval.tick().await;

        let windows = state.contact_handler.limiter.sweep();
        let now = Utc::now().timestamp().max(0) as usize;
        let sessions = state.auth_handler.sessions.revocations().purge_expired(now);

        if windows > 0 || sessions > 0 {
            tracing::debug!(windows, sessions, "Swept expired rate-limit windows and revoked sessions");
        }
    }
}
