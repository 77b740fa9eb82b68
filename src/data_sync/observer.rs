use crate::logic::types::ObservedEvent;
use alloy_primitives::Address;
use async_trait::async_trait;
use eyre::Result;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Source of pool events: swaps, reserve snapshots and treasury top-ups.
///
/// Each poll returns the events that appeared since the previous poll, in chain order.
#[async_trait]
pub trait ChainObserver: Send + Sync {
    async fn poll_events(&self, pool: Address) -> Result<Vec<ObservedEvent>>;
}

/// Replays pre-recorded batches, one per poll. Empty once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedObserver {
    batches: Mutex<VecDeque<Result<Vec<ObservedEvent>, String>>>,
}

impl ScriptedObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batches(batches: impl IntoIterator<Item = Vec<ObservedEvent>>) -> Self {
        Self { batches: Mutex::new(batches.into_iter().map(Ok).collect()) }
    }

    pub async fn push_batch(&self, events: Vec<ObservedEvent>) {
        self.batches.lock().await.push_back(Ok(events));
    }

    /// Makes the next poll fail with `message`
    pub async fn push_failure(&self, message: impl Into<String>) {
        self.batches.lock().await.push_back(Err(message.into()));
    }

    pub async fn remaining(&self) -> usize {
        self.batches.lock().await.len()
    }
}

#[async_trait]
impl ChainObserver for ScriptedObserver {
    async fn poll_events(&self, pool: Address) -> Result<Vec<ObservedEvent>> {
        match self.batches.lock().await.pop_front() {
            Some(Ok(events)) => Ok(events),
            Some(Err(message)) => Err(eyre::eyre!("observer failure for pool {}: {}", pool, message)),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    #[tokio::test]
    async fn test_batches_replayed_in_order() -> Result<()> {
        let observer = ScriptedObserver::with_batches([
            vec![ObservedEvent::Funding(U256::from(1))],
            vec![ObservedEvent::Funding(U256::from(2)), ObservedEvent::Funding(U256::from(3))],
        ]);

        assert_eq!(observer.poll_events(Address::ZERO).await?.len(), 1);
        assert_eq!(observer.poll_events(Address::ZERO).await?.len(), 2);
        assert!(observer.poll_events(Address::ZERO).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let observer = ScriptedObserver::new();
        observer.push_failure("rpc down").await;
        observer.push_batch(vec![]).await;

        let err = observer.poll_events(Address::ZERO).await.unwrap_err();
        assert!(err.to_string().contains("rpc down"));
        assert_eq!(observer.remaining().await, 1);
    }
}
