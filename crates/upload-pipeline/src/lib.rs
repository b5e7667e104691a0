pub mod error;
pub mod sender;
pub mod uploader;

mod guard;
mod job;
mod reporter;

#[cfg(test)]
mod tests;
