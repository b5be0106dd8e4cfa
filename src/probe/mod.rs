//! Collaborators that touch the network. The core only sees these traits.

pub mod dns;
pub mod http_probe;

use std::net::IpAddr;

use async_trait::async_trait;

use crate::error::{LookupError, TransportError};

pub use dns::HickoryResolver;
pub use http_probe::ReqwestTransport;

/// What a single GET returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub size: Option<u64>,
    pub body: String,
    /// Absolute target of a 301/302.
    pub redirect: Option<String>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn probe(&self, url: &str) -> Result<ProbeResponse, TransportError>;
}

#[async_trait]
pub trait Resolver: Send + Sync {
    async fn lookup_host(&self, name: &str) -> Result<Vec<IpAddr>, LookupError>;
    async fn lookup_cname(&self, name: &str) -> Result<String, LookupError>;
}
