//! Probing strategies the scheduler drives without knowing their semantics.

pub mod dir;
pub mod dns;

use async_trait::async_trait;

use crate::error::Result;
use crate::result::{Candidate, ProbeResult, Rendered};

pub use dir::DirPlugin;
pub use dns::DnsPlugin;

#[async_trait]
pub trait Plugin: Send + Sync {
    /// One-time preparation. Runs to completion before the plugin is shared
    /// with any worker, so whatever it records is read-only afterwards.
    async fn setup(&mut self) -> Result<()>;

    /// Probe one candidate. Called concurrently from every worker.
    async fn process(&self, candidate: &Candidate) -> Result<Vec<ProbeResult>>;

    /// Render a result for the console and the archive. No I/O.
    fn result_to_string(&self, result: &ProbeResult) -> Result<Rendered>;
}
