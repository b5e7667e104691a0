pub mod http;
pub mod jsonl;
pub mod memory;
pub mod source;
pub mod transport;
