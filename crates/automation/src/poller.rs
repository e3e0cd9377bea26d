use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Periodic unit of work driven by a [`Poller`].
#[async_trait]
pub trait Automaton: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn tick(&self);
}

struct Running {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Runs an automaton on a fixed interval. Ticks never overlap: a slow tick
/// delays the next one instead of running alongside it.
pub struct Poller {
    automaton: Arc<dyn Automaton>,
    interval: Duration,
    running: Mutex<Option<Running>>,
}

impl Poller {
    pub fn new(automaton: Arc<dyn Automaton>, interval: Duration) -> Self {
        Self {
            automaton,
            interval,
            running: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        self.automaton.name()
    }

    /// Returns false when the poller was already running.
    pub fn start(&self) -> bool {
        let mut running = self.running.lock();
        if running
            .as_ref()
            .is_some_and(|current| !current.handle.is_finished())
        {
            return false;
        }

        let (stop, mut stop_rx) = watch::channel(false);
        let automaton = Arc::clone(&self.automaton);
        let period = self.interval;
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => automaton.tick().await,
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("{} poller stopped", automaton.name());
        });

        info!("{} poller started ({:?})", self.automaton.name(), period);
        *running = Some(Running { stop, handle });
        true
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|current| !current.handle.is_finished())
    }

    /// Signal the loop to stop. A tick already in flight runs to completion;
    /// await the returned handle to wait for it.
    pub fn stop(&self) -> Option<JoinHandle<()>> {
        let current = self.running.lock().take()?;
        let _ = current.stop.send(true);
        Some(current.handle)
    }

    pub async fn shutdown(&self) {
        if let Some(handle) = self.stop() {
            let _ = handle.await;
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(current) = self.running.get_mut().take() {
            let _ = current.stop.send(true);
        }
    }
}
