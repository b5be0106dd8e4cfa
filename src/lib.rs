pub mod concurrent;
pub mod config;
pub mod error;
pub mod gather;
pub mod http_client;
pub mod output;
pub mod plugin;
pub mod probe;
pub mod result;
pub mod state;
pub mod utils;
pub mod wildcard;

// re-export the types most callers and tests need
pub use crate::concurrent::{RunHandle, Scheduler};
pub use crate::config::{Mode, Options};
pub use crate::error::{BusterError, Result};
pub use crate::plugin::{DirPlugin, DnsPlugin, Plugin};
pub use crate::result::{Candidate, ProbeResult, Rendered};
pub use crate::state::{Progress, RunState};
