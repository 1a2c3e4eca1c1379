//! Scheduler owning the publish and receive tasks

use super::cycle::{publish_cycle, receive_cycle};
use crate::hub::{MessageSink, MessageSource};
use crate::sensor::SensorFleet;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Periods of the two tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub publish: Duration,
    pub receive: Duration,
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            publish: Duration::from_secs(10),
            receive: Duration::from_secs(30 * 60),
        }
    }
}

/// Handles to the two periodic tasks
///
/// Both fire immediately on start. Each task finishes a firing before its
/// next tick; the two tasks interleave freely.
pub struct Scheduler {
    publish: JoinHandle<()>,
    receive: JoinHandle<()>,
}

impl Scheduler {
    /// Spawn both tasks; the publish task takes ownership of the fleet
    pub fn start<R>(
        fleet: SensorFleet,
        rng: R,
        sink: Arc<dyn MessageSink>,
        source: Arc<dyn MessageSource>,
        cadence: Cadence,
    ) -> Self
    where
        R: Rng + Send + 'static,
    {
        let publish = tokio::spawn(run_publish(fleet, rng, sink, cadence.publish));
        let receive = tokio::spawn(run_receive(source, cadence.receive));

        info!(
            "Scheduler started: publish every {:?}, receive every {:?}",
            cadence.publish, cadence.receive
        );

        Self { publish, receive }
    }

    /// Abort both tasks
    pub fn stop(self) {
        self.publish.abort();
        self.receive.abort();
        info!("Scheduler stopped");
    }
}

async fn run_publish<R: Rng + Send>(
    mut fleet: SensorFleet,
    mut rng: R,
    sink: Arc<dyn MessageSink>,
    period: Duration,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let report = publish_cycle(&mut fleet, sink.as_ref(), &mut rng).await;
        if !report.failed.is_empty() {
            warn!(
                "Publish cycle: {} sent, failed for {}",
                report.sent.len(),
                report.failed.join(", ")
            );
        }
    }
}

async fn run_receive(source: Arc<dyn MessageSource>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let outcome = receive_cycle(source.as_ref()).await;
        debug!("Receive cycle: {:?}", outcome);
    }
}
