use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::header::{CONTENT_LENGTH, COOKIE, LOCATION, USER_AGENT};
use reqwest::{Client, Response};

use crate::config::Options;
use crate::error::{Result, TransportError};
use crate::http_client::create_client;
use crate::probe::{ProbeResponse, Transport};

/// `Transport` backed by a pooled reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    cookie: Option<String>,
    auth: Option<(String, String)>,
    random_agents: Vec<String>,
    include_length: bool,
}

impl ReqwestTransport {
    pub fn new(client: Client, opts: &Options) -> Self {
        let auth = match (&opts.username, &opts.password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        };
        Self {
            client,
            cookie: opts.cookies.clone().filter(|c| !c.is_empty()),
            auth,
            random_agents: opts.random_agents.clone(),
            include_length: opts.include_length,
        }
    }

    pub fn from_options(opts: &Options) -> Result<Self> {
        Ok(Self::new(create_client(opts)?, opts))
    }

    /// Per-request pick, so concurrent probes never share a mutable agent.
    fn pick_agent(&self) -> Option<&str> {
        self.random_agents.choose(&mut rand::thread_rng()).map(String::as_str)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn probe(&self, url: &str) -> std::result::Result<ProbeResponse, TransportError> {
        let mut req = self.client.get(url);
        if let Some(cookie) = &self.cookie {
            req = req.header(COOKIE, cookie);
        }
        if let Some(agent) = self.pick_agent() {
            req = req.header(USER_AGENT, agent);
        }
        if let Some((user, pass)) = &self.auth {
            req = req.basic_auth(user, Some(pass));
        }

        let resp = req.send().await.map_err(classify)?;
        let status = resp.status().as_u16();
        let header_length = resp
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let redirect = match status {
            301 | 302 => Some(redirect_location(&resp)),
            _ => None,
        };

        // Always drain the body so the connection goes back to the pool,
        // even when the redirect turns out to be malformed.
        let body = match resp.text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(url, error = %e, "failed to read response body");
                String::new()
            }
        };
        let redirect = redirect.transpose()?;

        let mut size = body.chars().count() as u64;
        if self.include_length {
            if let Some(n) = header_length.filter(|n| *n > 0) {
                size = n;
            }
        }

        Ok(ProbeResponse { status, size: Some(size), body, redirect })
    }
}

fn redirect_location(resp: &Response) -> std::result::Result<String, TransportError> {
    let raw = resp
        .headers()
        .get(LOCATION)
        .ok_or_else(|| TransportError::BadLocation("missing Location header".to_string()))?
        .to_str()
        .map_err(|e| TransportError::BadLocation(e.to_string()))?;
    resp.url()
        .join(raw)
        .map(|u| u.to_string())
        .map_err(|e| TransportError::BadLocation(format!("{}: {}", raw, e)))
}

/// Certificate failures are reported apart from every other failure.
fn classify(err: reqwest::Error) -> TransportError {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&err);
    while let Some(e) = source {
        let text = e.to_string();
        let lower = text.to_lowercase();
        if lower.contains("certificate") || lower.contains("x509") {
            return TransportError::InvalidCertificate(text);
        }
        source = e.source();
    }
    TransportError::Request(err.to_string())
}
