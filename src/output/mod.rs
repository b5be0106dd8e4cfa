pub mod progress;
pub mod writer;
pub mod writer_jsonl;

pub use progress::{progress_bar, spawn_progress};
pub use writer::{spawn_error_writer, spawn_result_writer, OutputFiles, Sinks};
pub use writer_jsonl::JsonlWriter;
