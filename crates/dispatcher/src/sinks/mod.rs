//! Built-in sink implementations.

mod file;
mod log;

pub use file::{FileFormat, FileSink, FileSinkConfig};
pub use log::LogSink;
