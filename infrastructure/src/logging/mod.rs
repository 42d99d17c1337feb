//! Logging infrastructure: structured dispatch event logging.
//!
//! Provides [`JsonlDispatchLogger`], a JSONL file writer that implements
//! the [`DispatchLogger`](relay_application::DispatchLogger) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlDispatchLogger;
