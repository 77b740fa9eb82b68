use crate::data_sync::config::ServiceConfig;
use crate::data_sync::observer::ChainObserver;
use crate::logic::types::ObservedEvent;
use alloy_primitives::Address;
use eyre::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Polls a chain observer on a fixed interval and forwards its events to the logic layer.
///
/// The observer is the only producer; the engine consumes the receiver returned by `start`.
pub struct ObserverService {
    config: ServiceConfig,
    pool: Address,
    observer: Arc<dyn ChainObserver>,
    poll_interval: Duration,

    poll_task: Option<JoinHandle<()>>,
    shutdown_tx: Option<mpsc::Sender<()>>,

    polls: Arc<AtomicU64>,
    poll_errors: Arc<AtomicU64>,
    events_forwarded: Arc<AtomicU64>,
}

/// Counters of the polling loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ObserverStats {
    pub polls: u64,
    pub poll_errors: u64,
    pub events_forwarded: u64,
}

impl ObserverService {
    pub fn new(config: ServiceConfig, pool: Address, observer: Arc<dyn ChainObserver>) -> Self {
        let poll_interval = config.poll_interval();
        Self {
            config,
            pool,
            observer,
            poll_interval,
            poll_task: None,
            shutdown_tx: None,
            polls: Arc::new(AtomicU64::new(0)),
            poll_errors: Arc::new(AtomicU64::new(0)),
            events_forwarded: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Overrides the configured interval, e.g. for sub-second polling
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Spawns the polling loop and returns the event receiver
    pub fn start(&mut self) -> Result<mpsc::Receiver<ObservedEvent>> {
        if self.is_running() {
            return Err(eyre::eyre!("ObserverService already started"));
        }
        info!("Starting ObserverService for pool {} every {:?}", self.pool, self.poll_interval);

        let (event_tx, event_rx) = mpsc::channel(self.config.channel_buffer_size.max(1));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let observer = Arc::clone(&self.observer);
        let pool = self.pool;
        let poll_interval = self.poll_interval;
        let polls = Arc::clone(&self.polls);
        let poll_errors = Arc::clone(&self.poll_errors);
        let events_forwarded = Arc::clone(&self.events_forwarded);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                let polled = tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Polling loop received shutdown");
                        break;
                    }
                    _ = interval.tick() => {
                        polls.fetch_add(1, Ordering::Relaxed);
                        observer.poll_events(pool).await
                    }
                };

                let events = match polled {
                    Ok(events) => events,
                    Err(e) => {
                        poll_errors.fetch_add(1, Ordering::Relaxed);
                        warn!("Polling pool {} failed: {}", pool, e);
                        continue;
                    }
                };

                if !events.is_empty() {
                    debug!("Forwarding {} events for pool {}", events.len(), pool);
                }
                // Back-pressure instead of dropping: the engine must see every trade in order
                for event in events {
                    tokio::select! {
                        sent = event_tx.send(event) => {
                            if sent.is_err() {
                                error!("Event channel is closed, stopping polling loop");
                                return;
                            }
                            events_forwarded.fetch_add(1, Ordering::Relaxed);
                        }
                        _ = shutdown_rx.recv() => {
                            info!("Polling loop received shutdown while waiting for channel capacity");
                            return;
                        }
                    }
                }
            }
        });

        self.poll_task = Some(task);
        self.shutdown_tx = Some(shutdown_tx);
        Ok(event_rx)
    }

    /// Stops the polling loop. Dropping the sender closes the event channel.
    pub async fn stop(&mut self) -> Result<()> {
        info!("Stopping ObserverService");

        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(()).await;
        }
        if let Some(poll_task) = self.poll_task.take() {
            if let Err(e) = poll_task.await {
                warn!("Polling task error during shutdown: {}", e);
            }
        }

        info!("ObserverService stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.poll_task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn get_stats(&self) -> ObserverStats {
        ObserverStats {
            polls: self.polls.load(Ordering::Relaxed),
            poll_errors: self.poll_errors.load(Ordering::Relaxed),
            events_forwarded: self.events_forwarded.load(Ordering::Relaxed),
        }
    }

    pub fn get_config(&self) -> &ServiceConfig {
        &self.config
    }
}

impl Drop for ObserverService {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("ObserverService dropped while running, aborting polling task");
            if let Some(task) = self.poll_task.take() {
                task.abort();
            }
        }
    }
}
