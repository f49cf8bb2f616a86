//! Fixed-rate tick loop.

use std::time::Duration;

use status_core::Timestamp;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use crate::error::Result;

/// Stops a running [`TickDriver`]. Dropping the handle stops it too.
#[derive(Debug)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        // The driver may already be gone.
        let _ = self.tx.send(true);
    }
}

/// Calls a step function every `interval` with the session clock until
/// shut down or until a step fails.
#[derive(Debug)]
pub struct TickDriver {
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl TickDriver {
    pub fn new(interval: Duration) -> (Self, ShutdownHandle) {
        let (tx, shutdown) = watch::channel(false);
        (Self { interval, shutdown }, ShutdownHandle { tx })
    }

    /// Runs the loop. The clock starts at zero on the first tick. Returns the
    /// number of completed steps.
    pub async fn run<F>(mut self, mut step: F) -> Result<u64>
    where
        F: FnMut(Timestamp) -> Result<()>,
    {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let start = Instant::now();
        let mut steps = 0;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let elapsed = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                    step(Timestamp::from_millis(elapsed))?;
                    steps += 1;
                }
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        debug!(steps, "tick driver stopped");
        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;

    #[tokio::test]
    async fn stops_on_shutdown() {
        let (driver, handle) = TickDriver::new(Duration::from_millis(2));
        let stopper = tokio::spawn(async move {
            time::sleep(Duration::from_millis(20)).await;
            handle.shutdown();
        });

        let mut clock = Vec::new();
        let steps = driver
            .run(|now| {
                clock.push(now);
                Ok(())
            })
            .await
            .unwrap();
        stopper.await.unwrap();

        assert!(steps > 0);
        assert_eq!(clock.len() as u64, steps);
        assert!(clock.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[tokio::test]
    async fn failing_step_stops_the_loop() {
        let (driver, _handle) = TickDriver::new(Duration::from_millis(1));
        let result = driver.run(|_| Err(RuntimeError::NotNetworked)).await;
        assert!(matches!(result, Err(RuntimeError::NotNetworked)));
    }
}
