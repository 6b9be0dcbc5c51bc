use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// One timer firing, tagged with the driver run that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickMessage {
    pub generation: u64,
}

/// Owns at most one interval task. Acquired when a session enters RUNNING
/// and released on every exit from it; dropping the driver releases it too.
#[derive(Debug, Default)]
pub struct TickDriver {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl TickDriver {
    /// Starts a fresh interval, stopping any previous one. Must be called
    /// from within a tokio runtime.
    pub fn start(&mut self, period: Duration, sender: UnboundedSender<TickMessage>) -> u64 {
        self.stop();
        self.generation += 1;
        let generation = self.generation;
        let period = period.max(Duration::from_millis(1));
        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if sender.send(TickMessage { generation }).is_err() {
                    break;
                }
            }
        }));
        debug!(target: "drill::console", generation, period_ms = period.as_millis() as u64, "driver.started");
        generation
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(target: "drill::console", generation = self.generation, "driver.stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Messages from stopped or superseded runs are stale.
    pub fn accepts(&self, message: TickMessage) -> bool {
        self.is_running() && message.generation == self.generation
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<TickMessage>) -> Vec<TickMessage> {
        let mut received = Vec::new();
        while let Ok(message) = rx.try_recv() {
            received.push(message);
        }
        received
    }

    #[tokio::test(start_paused = true)]
    async fn emits_one_tick_per_period_until_stopped() {
        let (tx, mut rx) = unbounded_channel();
        let mut driver = TickDriver::default();
        let generation = driver.start(Duration::from_millis(1000), tx.clone());

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(drain(&mut rx), vec![TickMessage { generation }; 3]);

        driver.stop();
        assert!(!driver.is_running());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_invalidates_previous_generation() {
        let (tx, _rx) = unbounded_channel();
        let mut driver = TickDriver::default();
        let first = driver.start(Duration::from_millis(100), tx.clone());
        let second = driver.start(Duration::from_millis(100), tx);
        assert!(!driver.accepts(TickMessage { generation: first }));
        assert!(driver.accepts(TickMessage { generation: second }));
        driver.stop();
        assert!(!driver.accepts(TickMessage { generation: second }));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_driver_cancels_timer() {
        let (tx, mut rx) = unbounded_channel();
        {
            let mut driver = TickDriver::default();
            driver.start(Duration::from_millis(250), tx.clone());
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(drain(&mut rx).is_empty());
    }
}
