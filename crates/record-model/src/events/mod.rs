pub mod progress;
pub mod result;
