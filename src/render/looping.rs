//! Fixed-period render loop thread.

use crossbeam_channel::{bounded, select, tick, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A running render loop.
///
/// Each period the loop calls its tick function once. Ticks never queue:
/// a tick that cannot draw simply returns and the next one waits for the
/// following period.
pub struct RenderLoop {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl RenderLoop {
    /// Spawns the loop thread.
    pub fn spawn<F>(name: &str, interval: Duration, mut on_tick: F) -> std::io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let ticker = tick(interval);

        let handle = thread::Builder::new()
            .name(format!("{name}-render"))
            .spawn(move || loop {
                select! {
                    recv(stop_rx) -> _ => break,
                    recv(ticker) -> _ => on_tick(),
                }
            })?;

        tracing::debug!(interval_ms = interval.as_millis() as u64, "render loop started");
        Ok(Self { stop_tx, handle })
    }

    /// Stops the loop and waits for the thread to exit.
    ///
    /// No tick runs after this returns.
    pub fn cancel(self) {
        let _ = self.stop_tx.send(());
        if self.handle.join().is_err() {
            tracing::warn!("render loop thread panicked");
        }
        tracing::debug!("render loop cancelled");
    }
}
