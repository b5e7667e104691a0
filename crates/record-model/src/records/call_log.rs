use super::record::{Record, RecordKind, SkipReason};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Incoming,
    Outgoing,
    Missed,
    Rejected,
    Blocked,
    Unknown,
}

impl CallType {
    /// Maps the integer type column of the platform call log.
    pub fn from_provider_code(code: i32) -> Self {
        match code {
            1 => CallType::Incoming,
            2 => CallType::Outgoing,
            3 => CallType::Missed,
            5 => CallType::Rejected,
            6 => CallType::Blocked,
            _ => CallType::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallLogRecord {
    pub call_id: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub name: String,
    pub call_type: CallType,
    pub timestamp: i64,
    /// Seconds.
    pub duration: i64,
}

impl CallLogRecord {
    pub fn new(
        call_id: impl Into<String>,
        number: impl Into<String>,
        call_type: CallType,
        timestamp: i64,
        duration: i64,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            number: number.into(),
            name: String::new(),
            call_type,
            timestamp,
            duration,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Record for CallLogRecord {
    const KIND: RecordKind = RecordKind::CallLogs;
    const STAMP_RECEIVED_AT: bool = true;

    fn record_id(&self) -> &str {
        &self.call_id
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    // Private and withheld numbers come through blank and are still uploaded.
    fn check(&self) -> Result<(), SkipReason> {
        if self.duration < 0 {
            return Err(SkipReason::NegativeDuration {
                id: self.call_id.clone(),
                duration: self.duration,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_codes_map_to_call_types() {
        assert_eq!(CallType::from_provider_code(1), CallType::Incoming);
        assert_eq!(CallType::from_provider_code(2), CallType::Outgoing);
        assert_eq!(CallType::from_provider_code(3), CallType::Missed);
        assert_eq!(CallType::from_provider_code(4), CallType::Unknown);
        assert_eq!(CallType::from_provider_code(5), CallType::Rejected);
        assert_eq!(CallType::from_provider_code(6), CallType::Blocked);
        assert_eq!(CallType::from_provider_code(-1), CallType::Unknown);
    }

    #[test]
    fn call_type_serializes_lowercase() {
        let call = CallLogRecord::new("c1", "", CallType::Missed, 5, 0);
        let value = serde_json::to_value(&call).unwrap();
        assert_eq!(value["call_type"], "missed");
        assert!(call.check().is_ok(), "blank numbers are uploaded");
    }
}
