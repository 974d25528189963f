//! Broker integration: publish accepted submits, consume delivery
//! reports, route reports back onto live sessions.

mod amqp;
mod payload;
mod report;

use async_trait::async_trait;
use thiserror::Error;

pub use amqp::AmqpBridge;
pub use payload::{DeliveryReportMessage, SubmitSmMessage};
pub use report::ReportRouter;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("broker error: {0}")]
    Broker(#[from] lapin::Error),

    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("not connected to broker")]
    NotConnected,
}

/// Publish seam for the submit path. The handlers only see this trait,
/// so tests swap the AMQP client for a recording fake.
#[async_trait]
pub trait SubmitPublisher: Send + Sync {
    async fn publish_submit(&self, message: &SubmitSmMessage) -> Result<(), BridgeError>;
}

/// Publisher used when the server runs without a broker configured.
/// Accepts everything and drops it, matching the best-effort contract.
pub struct NullPublisher;

#[async_trait]
impl SubmitPublisher for NullPublisher {
    async fn publish_submit(&self, message: &SubmitSmMessage) -> Result<(), BridgeError> {
        tracing::debug!(message_id = %message.message_id, "no broker configured, dropping submit");
        Ok(())
    }
}
