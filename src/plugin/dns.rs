use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::config::Options;
use crate::error::{BusterError, LookupError, Result};
use crate::plugin::Plugin;
use crate::probe::{HickoryResolver, Resolver};
use crate::result::{Candidate, ProbeResult, Rendered};

/// Subdomain busting through DNS resolution.
#[derive(Debug)]
pub struct DnsPlugin<R = HickoryResolver> {
    resolver: R,
    opts: Arc<Options>,
}

impl<R: Resolver> DnsPlugin<R> {
    pub fn new(resolver: R, opts: Arc<Options>) -> Self {
        Self { resolver, opts }
    }

    fn hostname(&self, candidate: &Candidate) -> String {
        if candidate.pre_resolved {
            candidate.value.clone()
        } else {
            format!("{}.{}", candidate.value, self.opts.url)
        }
    }

    pub fn render_at(&self, result: &ProbeResult, now: DateTime<Local>) -> Rendered {
        let extra = result.extra.as_deref().map(|e| format!(" [{}]", e)).unwrap_or_default();
        Rendered {
            display: format!("Found: {}{}", result.entity, extra),
            archive: format!("{} - {}{}", now.format("[%Y-%m-%d %H:%M:%S]"), result.entity, extra),
            status: result.status,
        }
    }
}

fn join_addrs<'a>(addrs: impl Iterator<Item = &'a IpAddr>) -> String {
    addrs.map(|a| a.to_string()).collect::<Vec<_>>().join(", ")
}

#[async_trait]
impl<R: Resolver> Plugin for DnsPlugin<R> {
    async fn setup(&mut self) -> Result<()> {
        tracing::debug!(domain = %self.opts.url, "dns mode needs no calibration");
        Ok(())
    }

    async fn process(&self, candidate: &Candidate) -> Result<Vec<ProbeResult>> {
        let name = self.hostname(candidate);
        let addrs = match self.resolver.lookup_host(&name).await {
            Ok(addrs) => addrs,
            Err(LookupError::NotFound) => return Ok(Vec::new()),
            Err(LookupError::Failed(reason)) => return Err(BusterError::Resolve { name, reason }),
        };
        tracing::debug!(name = %name, count = addrs.len(), "resolved");

        if self.opts.show_ips {
            // One result per address family, v4 first.
            let (v4, v6): (Vec<&IpAddr>, Vec<&IpAddr>) = addrs.iter().partition(|a| a.is_ipv4());
            let results = [v4, v6]
                .into_iter()
                .filter(|family| !family.is_empty())
                .map(|family| ProbeResult {
                    extra: Some(join_addrs(family.into_iter())),
                    ..ProbeResult::entity(name.clone())
                })
                .collect();
            return Ok(results);
        }

        let mut result = ProbeResult::entity(name.clone());
        if self.opts.show_cname {
            match self.resolver.lookup_cname(&name).await {
                Ok(cname) => result.extra = Some(cname),
                Err(e) => tracing::debug!(name = %name, error = %e, "no CNAME"),
            }
        }
        Ok(vec![result])
    }

    fn result_to_string(&self, result: &ProbeResult) -> Result<Rendered> {
        Ok(self.render_at(result, Local::now()))
    }
}
