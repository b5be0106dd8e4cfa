use std::net::IpAddr;

use async_trait::async_trait;
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::TokioAsyncResolver;

use crate::error::{BusterError, LookupError, Result};
use crate::probe::Resolver;

/// `Resolver` using the system DNS configuration.
#[derive(Clone)]
pub struct HickoryResolver {
    inner: TokioAsyncResolver,
}

impl std::fmt::Debug for HickoryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HickoryResolver").finish_non_exhaustive()
    }
}

impl HickoryResolver {
    pub fn from_system_conf() -> Result<Self> {
        let inner = TokioAsyncResolver::tokio_from_system_conf().map_err(|e| BusterError::Resolve {
            name: "system resolver configuration".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { inner })
    }
}

fn classify(err: ResolveError) -> LookupError {
    match err.kind() {
        ResolveErrorKind::NoRecordsFound { .. } => LookupError::NotFound,
        _ => LookupError::Failed(err.to_string()),
    }
}

#[async_trait]
impl Resolver for HickoryResolver {
    async fn lookup_host(&self, name: &str) -> std::result::Result<Vec<IpAddr>, LookupError> {
        let lookup = self.inner.lookup_ip(name).await.map_err(classify)?;
        let addrs: Vec<IpAddr> = lookup.iter().collect();
        if addrs.is_empty() {
            return Err(LookupError::NotFound);
        }
        Ok(addrs)
    }

    async fn lookup_cname(&self, name: &str) -> std::result::Result<String, LookupError> {
        let lookup = self.inner.lookup(name, RecordType::CNAME).await.map_err(classify)?;
        lookup
            .iter()
            .find_map(|rdata| match rdata {
                RData::CNAME(cname) => Some(cname.0.to_utf8()),
                _ => None,
            })
            .ok_or(LookupError::NotFound)
    }
}
