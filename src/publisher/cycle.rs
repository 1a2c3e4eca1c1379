//! One firing of each periodic task

use super::report::report_result;
use crate::hub::{MessageSink, MessageSource, Received};
use crate::sensor::SensorFleet;
use bytes::Bytes;
use rand::Rng;
use tracing::{error, info};

/// Per-device results of one publish cycle
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PublishReport {
    /// Devices the sink accepted, in fleet order
    pub sent: Vec<String>,
    /// Devices whose serialization or send failed, in fleet order
    pub failed: Vec<String>,
}

/// What one receive poll did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// 204: nothing queued
    Empty,
    /// A message was logged and acknowledged (`completed` is false if the
    /// acknowledgement itself failed)
    Delivered { completed: bool },
    /// A non-204 status without a message
    Status(u16),
    /// The poll failed
    Failed,
}

/// Step every reading in fleet order and send its telemetry body
///
/// A failed send is logged and the remaining devices are still sent.
pub async fn publish_cycle<R: Rng + ?Sized>(
    fleet: &mut SensorFleet,
    sink: &dyn MessageSink,
    rng: &mut R,
) -> PublishReport {
    info!("Publishing telemetry for {} devices", fleet.len());
    let mut report = PublishReport::default();

    for index in 0..fleet.len() {
        let Some(reading) = fleet.step_device(index, rng) else {
            break;
        };
        let device_id = reading.device_id().to_string();

        let payload = match reading.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to serialize telemetry for {}: {}", device_id, e);
                report.failed.push(device_id);
                continue;
            }
        };

        info!("Sending message: {}", payload);
        let result = sink.send(Bytes::from(payload)).await;
        report_result("send", &result);

        match result {
            Ok(_) => report.sent.push(device_id),
            Err(_) => report.failed.push(device_id),
        }
    }

    report
}

/// Poll the source once; log and acknowledge a delivered message
pub async fn receive_cycle(source: &dyn MessageSource) -> ReceiveOutcome {
    match source.receive().await {
        Ok(Received { status, .. }) if status.is_no_content() => ReceiveOutcome::Empty,
        Ok(Received {
            message: Some(message),
            ..
        }) => {
            info!("Received data: {}", String::from_utf8_lossy(&message.payload));
            let result = source.complete(&message).await;
            report_result("complete", &result);
            ReceiveOutcome::Delivered {
                completed: result.is_ok(),
            }
        }
        Ok(Received { status, .. }) => {
            let code = status.code;
            report_result("receive", &Ok(status));
            ReceiveOutcome::Status(code)
        }
        Err(e) => {
            report_result("receive", &Err(e));
            ReceiveOutcome::Failed
        }
    }
}
