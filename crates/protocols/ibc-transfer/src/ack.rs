//! Acknowledgement tracking
//!
//! After broadcast the source chain is polled until the transaction is
//! included, the `send_packet` event names the packet, and then until the
//! relayer brings back either an acknowledgement or a timeout for it.

use std::time::Duration;

use lcd_client::{LcdClient, TxResponse};
use terpdash_core::{PollConfig, TransferError};
use tokio::time::Instant;

/// The packet a transfer put on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketRef {
    pub sequence: String,
    pub src_channel: String,
}

impl PacketRef {
    /// Read the packet from the included transaction's `send_packet` event
    pub fn from_tx(tx: &TxResponse) -> Option<Self> {
        Some(Self {
            sequence: tx.find_attribute("send_packet", "packet_sequence")?.to_string(),
            src_channel: tx.find_attribute("send_packet", "packet_src_channel")?.to_string(),
        })
    }

    fn search_events(&self, event_type: &str) -> Vec<String> {
        vec![
            format!("{}.packet_sequence='{}'", event_type, self.sequence),
            format!("{}.packet_src_channel='{}'", event_type, self.src_channel),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckOutcome {
    /// The destination acknowledged the packet
    Ack,
    /// The packet timed out and was refunded
    Timeout,
    /// Nothing conclusive before the poll cap
    Expired,
}

/// Polls one chain for the fate of a broadcast transfer
#[derive(Debug, Clone)]
pub struct AckTracker {
    interval: Duration,
    cap: Duration,
}

impl AckTracker {
    pub fn new(interval: Duration, cap: Duration) -> Self {
        Self { interval, cap }
    }

    pub fn from_config(config: &PollConfig) -> Self {
        Self::new(config.ack_interval(), config.ack_timeout())
    }

    /// Follow `tx_hash` on `lcd` until it resolves or the cap is reached
    ///
    /// A transaction that is included with a non-zero code is a
    /// `BroadcastFailed` error. LCD hiccups during polling are logged and
    /// retried on the next tick.
    pub async fn track(&self, lcd: &LcdClient, tx_hash: &str) -> Result<AckOutcome, TransferError> {
        let deadline = Instant::now() + self.cap;

        let packet = loop {
            match lcd.get_tx(tx_hash).await {
                Ok(Some(tx)) if !tx.is_success() => {
                    return Err(TransferError::BroadcastFailed {
                        code: tx.code,
                        raw_log: tx.raw_log,
                    });
                }
                Ok(Some(tx)) => match PacketRef::from_tx(&tx) {
                    Some(packet) => break packet,
                    None => {
                        return Err(TransferError::BroadcastFailed {
                            code: 0,
                            raw_log: format!("transaction {} carries no send_packet event", tx_hash),
                        });
                    }
                },
                Ok(None) => tracing::debug!(tx_hash, "Transaction not indexed yet"),
                Err(e) => tracing::warn!(tx_hash, error = %e, "Transaction lookup failed"),
            }
            if !self.pause(deadline).await {
                return Ok(AckOutcome::Expired);
            }
        };

        tracing::info!(
            tx_hash,
            sequence = %packet.sequence,
            channel = %packet.src_channel,
            "Packet sent, waiting for acknowledgement"
        );

        loop {
            if self.found(lcd, &packet, "acknowledge_packet").await {
                return Ok(AckOutcome::Ack);
            }
            if self.found(lcd, &packet, "timeout_packet").await {
                return Ok(AckOutcome::Timeout);
            }
            if !self.pause(deadline).await {
                tracing::warn!(tx_hash, "Gave up waiting for acknowledgement");
                return Ok(AckOutcome::Expired);
            }
        }
    }

    async fn found(&self, lcd: &LcdClient, packet: &PacketRef, event_type: &str) -> bool {
        match lcd.search_txs(&packet.search_events(event_type)).await {
            Ok(txs) => !txs.is_empty(),
            Err(e) => {
                tracing::warn!(event_type, error = %e, "Packet search failed");
                false
            }
        }
    }

    /// Sleep one interval; false once the deadline has passed
    async fn pause(&self, deadline: Instant) -> bool {
        if Instant::now() + self.interval > deadline {
            return false;
        }
        tokio::time::sleep(self.interval).await;
        true
    }
}
