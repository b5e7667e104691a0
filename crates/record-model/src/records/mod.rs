pub mod batch;
pub mod call_log;
pub mod contact;
pub mod record;
pub mod sms;
