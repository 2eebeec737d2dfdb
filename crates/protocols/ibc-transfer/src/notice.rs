//! Per-submission notice
//!
//! Each submission owns exactly one notice. Every update replaces the previous
//! value; the final one carries the transfer result.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Loading,
    Info,
    Success,
    Warning,
    Error,
}

/// The single mutable toast of one submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferNotice {
    pub id: String,
    pub level: NoticeLevel,
    pub message: String,
    pub tx_hash: Option<String>,
    /// No further updates follow
    pub done: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Success,
    Timeout,
    Error,
}

/// Final outcome of a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferResult {
    pub status: TransferStatus,
    pub tx_hash: Option<String>,
    pub message: String,
}

impl TransferNotice {
    pub fn loading(id: &str, message: String) -> Self {
        Self {
            id: id.to_string(),
            level: NoticeLevel::Loading,
            message,
            tx_hash: None,
            done: false,
        }
    }

    /// Broadcast accepted; the packet is on its way
    pub fn broadcast(&self, message: String, tx_hash: String) -> Self {
        Self {
            id: self.id.clone(),
            level: NoticeLevel::Info,
            message,
            tx_hash: Some(tx_hash),
            done: false,
        }
    }

    /// Terminal update at `level`, keeping any tx hash already known
    pub fn finish(&self, level: NoticeLevel, message: String) -> Self {
        Self {
            id: self.id.clone(),
            level,
            message,
            tx_hash: self.tx_hash.clone(),
            done: true,
        }
    }

    /// The transfer result, once the notice is final
    pub fn result(&self) -> Option<TransferResult> {
        if !self.done {
            return None;
        }
        let status = match self.level {
            NoticeLevel::Success => TransferStatus::Success,
            NoticeLevel::Warning => TransferStatus::Timeout,
            _ => TransferStatus::Error,
        };
        Some(TransferResult {
            status,
            tx_hash: self.tx_hash.clone(),
            message: self.message.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_only_when_done() {
        let notice = TransferNotice::loading("t1", "Sending".into());
        assert!(notice.result().is_none());

        let notice = notice.broadcast("Receiving".into(), "ABC".into());
        assert_eq!(notice.level, NoticeLevel::Info);
        assert!(notice.result().is_none());

        let done = notice.finish(NoticeLevel::Warning, "Timed out".into());
        let result = done.result().unwrap();
        assert_eq!(result.status, TransferStatus::Timeout);
        assert_eq!(result.tx_hash.as_deref(), Some("ABC"));
    }
}
