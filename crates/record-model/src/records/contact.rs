use super::record::{Record, RecordKind, SkipReason};
use serde::{Deserialize, Serialize};

/// One phone number of one contact. A contact with three numbers yields three rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub contact_id: String,
    pub name: String,
    pub phone_number: String,
}

impl ContactRecord {
    pub fn new(
        contact_id: impl Into<String>,
        name: impl Into<String>,
        phone_number: impl Into<String>,
    ) -> Self {
        Self {
            contact_id: contact_id.into(),
            name: name.into(),
            phone_number: phone_number.into(),
        }
    }

    /// Flattens a contact into one row per non-blank number.
    /// Contacts without any number produce no rows.
    pub fn rows_for<I, S>(contact_id: &str, name: &str, phones: I) -> Vec<ContactRecord>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        phones
            .into_iter()
            .filter_map(|phone| {
                let phone = phone.as_ref().trim();
                (!phone.is_empty()).then(|| ContactRecord::new(contact_id, name, phone))
            })
            .collect()
    }
}

impl Record for ContactRecord {
    const KIND: RecordKind = RecordKind::Contacts;
    const STAMP_RECEIVED_AT: bool = false;

    fn record_id(&self) -> &str {
        &self.contact_id
    }

    fn timestamp(&self) -> i64 {
        0
    }

    fn check(&self) -> Result<(), SkipReason> {
        if self.phone_number.trim().is_empty() {
            return Err(SkipReason::MissingPhoneNumber {
                id: self.contact_id.clone(),
            });
        }
        Ok(())
    }
}
