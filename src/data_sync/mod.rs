/// Data Synchronization Layer
///
/// This layer feeds the guard engine. It provides:
///
/// - The `ChainObserver` boundary that turns chain data into trades,
///   reserve snapshots and treasury top-ups
/// - Interval polling of one pool with bounded, in-order delivery
///   to the logic layer

pub mod config;
pub mod observer;
pub mod service;


// Re-export main components for easy usage
pub use config::ServiceConfig;
pub use observer::{ChainObserver, ScriptedObserver};
pub use service::{ObserverService, ObserverStats};
