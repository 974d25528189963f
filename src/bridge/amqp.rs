//! AMQP publisher and delivery-report consumer.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicPublishOptions, ExchangeDeclareOptions,
    QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::BrokerConfig;
use crate::telemetry::counters;

use super::payload::{DeliveryReportMessage, SubmitSmMessage};
use super::report::ReportRouter;
use super::{BridgeError, SubmitPublisher};

pub const SUBMIT_ROUTING_KEY: &str = "submit_sm";
pub const REPORT_ROUTING_KEY: &str = "delivery_report";

const PERSISTENT: u8 = 2;

/// Broker client: one connection, one channel, a durable direct
/// exchange with the submit and delivery-report queues bound to it.
pub struct AmqpBridge {
    channel: Channel,
    exchange: String,
    report_queue: String,
    // Held so the connection outlives the channel.
    _connection: Connection,
}

impl AmqpBridge {
    /// Connect and declare the full topology. Declarations are
    /// idempotent on the broker side.
    pub async fn connect(config: &BrokerConfig) -> Result<Self, BridgeError> {
        let connection =
            Connection::connect(&config.url, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;

        let durable = ExchangeDeclareOptions {
            durable: true,
            ..Default::default()
        };
        channel
            .exchange_declare(
                &config.exchange,
                ExchangeKind::Direct,
                durable,
                FieldTable::default(),
            )
            .await?;

        let queue_opts = QueueDeclareOptions {
            durable: true,
            ..Default::default()
        };
        channel
            .queue_declare(&config.submit_queue, queue_opts, FieldTable::default())
            .await?;
        channel
            .queue_bind(
                &config.submit_queue,
                &config.exchange,
                SUBMIT_ROUTING_KEY,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;

        channel
            .queue_declare(&config.report_queue, queue_opts, FieldTable::default())
            .await?;
        channel
            .queue_bind(
                &config.report_queue,
                &config.exchange,
                REPORT_ROUTING_KEY,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;

        info!(
            url = %config.url,
            exchange = %config.exchange,
            "connected to broker"
        );

        Ok(Self {
            channel,
            exchange: config.exchange.clone(),
            report_queue: config.report_queue.clone(),
            _connection: connection,
        })
    }

    /// Consume the delivery-report queue until shutdown. Manual ack,
    /// after routing; a malformed payload is acked and dropped.
    pub async fn run_report_consumer(
        self: Arc<Self>,
        router: Arc<ReportRouter>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), BridgeError> {
        let mut consumer = self
            .channel
            .basic_consume(
                &self.report_queue,
                "smppgw-reports",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;
        info!(queue = %self.report_queue, "delivery report consumer started");

        loop {
            tokio::select! {
                delivery = consumer.next() => {
                    match delivery {
                        Some(Ok(delivery)) => {
                            match serde_json::from_slice::<DeliveryReportMessage>(&delivery.data) {
                                Ok(report) => {
                                    debug!(
                                        message_id = %report.message_id,
                                        system_id = %report.system_id,
                                        "delivery report received"
                                    );
                                    router.route(report).await;
                                }
                                Err(err) => {
                                    warn!(error = %err, "malformed delivery report, dropping");
                                    counters::report_dropped("malformed");
                                }
                            }
                            if let Err(err) = delivery.ack(BasicAckOptions::default()).await {
                                warn!(error = %err, "report ack failed");
                            }
                        }
                        Some(Err(err)) => {
                            error!(error = %err, "report consumer failed");
                            return Err(err.into());
                        }
                        None => {
                            warn!("report consumer stream ended");
                            return Ok(());
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("delivery report consumer stopping");
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[async_trait]
impl SubmitPublisher for AmqpBridge {
    async fn publish_submit(&self, message: &SubmitSmMessage) -> Result<(), BridgeError> {
        let payload = serde_json::to_vec(message)?;
        self.channel
            .basic_publish(
                &self.exchange,
                SUBMIT_ROUTING_KEY,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default().with_delivery_mode(PERSISTENT),
            )
            .await?
            .await?;
        debug!(message_id = %message.message_id, "submit published");
        Ok(())
    }
}
