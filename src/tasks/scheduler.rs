//! Background loops: the one-second attempt countdown and the periodic
//! purge of expired auth sessions.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories::sessions;
use crate::services::attempt::{self, AttemptError, AttemptPhase, Countdown, SubmissionDraft};

pub(crate) fn spawn(state: AppState, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
    vec![
        tokio::spawn(countdown_loop(state.clone(), shutdown.clone())),
        tokio::spawn(purge_sessions_loop(state, shutdown)),
    ]
}

/// Drives every in-progress attempt one second forward and force-submits the
/// ones whose time ran out.
async fn countdown_loop(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let mut tick = interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => force_submit_expired(&state).await,
        }
    }
}

async fn force_submit_expired(state: &AppState) {
    let expired: Vec<(String, String, Vec<SubmissionDraft>)> = {
        let mut attempts = state.attempts().lock().await;
        let mut expired = Vec::new();
        for (student_id, session) in attempts.iter_mut() {
            let due = match session.phase() {
                AttemptPhase::InProgress => session.tick() == Countdown::Expired,
                // A previous forced submit failed to persist; try again.
                AttemptPhase::Submitting => session.remaining_seconds() == 0,
                AttemptPhase::Confirmed | AttemptPhase::Closed => false,
            };
            if !due {
                continue;
            }
            match session.begin_submit() {
                Ok(drafts) => {
                    expired.push((student_id.clone(), session.test_id().to_string(), drafts));
                }
                // A manual submit holds the latch; leave it to finish.
                Err(AttemptError::SubmitInFlight) => {}
                Err(err) => {
                    tracing::warn!(student_id = %student_id, error = %err, "Could not force-submit attempt");
                }
            }
        }
        expired
    };

    for (student_id, test_id, drafts) in expired {
        match attempt::persist_drafts(state.db(), &test_id, &student_id, &drafts).await {
            Ok(submitted) => {
                let mut attempts = state.attempts().lock().await;
                attempts.remove(&student_id);
                metrics::counter!("attempts_submitted_total", "trigger" => "timeout").increment(1);
                tracing::info!(
                    test_id = %test_id,
                    student_id = %student_id,
                    submitted,
                    "attempt auto-submitted on timeout"
                );
            }
            Err(err) => {
                let mut attempts = state.attempts().lock().await;
                if let Some(session) = attempts.get_mut(&student_id) {
                    session.submit_failed();
                }
                tracing::error!(
                    test_id = %test_id,
                    student_id = %student_id,
                    error = %err,
                    "Failed to persist auto-submitted attempt"
                );
            }
        }
    }
}

async fn purge_sessions_loop(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let every = state.settings().attempt().session_purge_interval_seconds.max(1);
    let mut tick = interval(Duration::from_secs(every));
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                match sessions::delete_expired(state.db(), primitive_now_utc()).await {
                    Ok(0) => {}
                    Ok(purged) => tracing::info!(purged, "expired auth sessions purged"),
                    Err(err) => tracing::error!(error = %err, "Failed to purge expired sessions"),
                }
            }
        }
    }
}
