use super::record::{Record, RecordKind, SkipReason};
use serde::{Deserialize, Serialize};

/// Folder a message was read from. Inbox is drained before Sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmsBox {
    Inbox,
    Sent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsRecord {
    pub sms_id: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    pub body: String,
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub message_box: SmsBox,
    #[serde(default)]
    pub is_read: bool,
}

impl SmsRecord {
    pub fn inbox(
        sms_id: impl Into<String>,
        from: impl Into<String>,
        body: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            sms_id: sms_id.into(),
            from: from.into(),
            to: String::new(),
            body: body.into(),
            timestamp,
            message_box: SmsBox::Inbox,
            is_read: false,
        }
    }

    pub fn sent(
        sms_id: impl Into<String>,
        to: impl Into<String>,
        body: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            sms_id: sms_id.into(),
            from: String::new(),
            to: to.into(),
            body: body.into(),
            timestamp,
            message_box: SmsBox::Sent,
            is_read: true,
        }
    }

    pub fn read(mut self, is_read: bool) -> Self {
        self.is_read = is_read;
        self
    }

    /// The other party: sender for inbox messages, recipient for sent ones.
    pub fn counterparty(&self) -> &str {
        match self.message_box {
            SmsBox::Inbox => &self.from,
            SmsBox::Sent => &self.to,
        }
    }
}

impl Record for SmsRecord {
    const KIND: RecordKind = RecordKind::Sms;
    const STAMP_RECEIVED_AT: bool = true;

    fn record_id(&self) -> &str {
        &self.sms_id
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn check(&self) -> Result<(), SkipReason> {
        if self.counterparty().trim().is_empty() {
            return Err(SkipReason::MissingAddress {
                id: self.sms_id.clone(),
            });
        }
        Ok(())
    }
}
