use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::select;
use tokio::sync::Mutex;
use tokio::sync::mpsc::Receiver;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::events::ControlCommand;
use crate::synthesis::{Synthesizer, UpdateOutcome};

/// Drives the synthesizer from a timer and from control commands.
///
/// Rules:
/// - Ticks call `update_if_changed` only if no render is running; a busy tick
///   is dropped, the next one catches up through the fingerprint.
/// - Control commands wait for the lock so none are lost.
/// - Rendering happens on the blocking pool; a render in flight is allowed to
///   finish on cancellation.
pub async fn run(
    synth: Arc<Mutex<Synthesizer>>,
    tick_interval: Duration,
    mut control_rx: Receiver<ControlCommand>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut ticker = interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        select! {
            _ = cancel.cancelled() => break,

            _ = ticker.tick() => {
                let Ok(guard) = synth.clone().try_lock_owned() else {
                    debug!("render in progress; dropping tick");
                    continue;
                };
                tokio::spawn(async move {
                    let outcome = tokio::task::spawn_blocking(move || {
                        let mut synth = guard;
                        synth.update_if_changed()
                    })
                    .await;
                    match outcome {
                        Ok(UpdateOutcome::Failed) => warn!("tick update failed"),
                        Ok(outcome) => debug!(?outcome, "tick handled"),
                        Err(err) => warn!(%err, "tick update panicked"),
                    }
                });
            }

            maybe_cmd = control_rx.recv() => {
                let Some(command) = maybe_cmd else {
                    debug!("control channel closed");
                    break;
                };
                let guard = synth.clone().lock_owned().await;
                let outcome = tokio::task::spawn_blocking(move || {
                    let mut synth = guard;
                    apply(&mut synth, command)
                })
                .await
                .context("control command task failed")?;
                info!(?command, ?outcome, "control command handled");
            }
        }
    }

    Ok(())
}

/// Execute one control command against the synthesizer.
pub fn apply(synth: &mut Synthesizer, command: ControlCommand) -> UpdateOutcome {
    let persisted = match command {
        ControlCommand::Refresh => return synth.update(),
        ControlCommand::ShiftOffset(delta) => synth.adjust_offset(delta).map(|_| ()),
        ControlCommand::AdjustIntensity(delta) => synth.adjust_intensity(delta).map(|_| ()),
    };
    match persisted {
        Ok(()) => synth.update_if_changed(),
        Err(err) => {
            warn!(%err, ?command, "failed to persist setting");
            UpdateOutcome::Failed
        }
    }
}
