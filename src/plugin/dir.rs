use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use url::Url;

use crate::config::Options;
use crate::error::{BusterError, Result};
use crate::plugin::Plugin;
use crate::probe::{ReqwestTransport, Transport};
use crate::result::{Candidate, ProbeResult, Rendered};
use crate::wildcard::{self, Scope, WildcardSignature};

/// Directory and file busting over HTTP.
#[derive(Debug)]
pub struct DirPlugin<T = ReqwestTransport> {
    transport: T,
    opts: Arc<Options>,
    signature: Option<WildcardSignature>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Found,
    FalsePositive,
    Missed,
}

impl Verdict {
    fn label(self) -> &'static str {
        match self {
            Verdict::Found => "FOUND",
            Verdict::FalsePositive => "FALSE POSITIVE",
            Verdict::Missed => "MISSED",
        }
    }
}

impl<T: Transport> DirPlugin<T> {
    pub fn new(transport: T, opts: Arc<Options>) -> Self {
        Self { transport, opts, signature: None }
    }

    /// Use an existing calibration instead of probing in `setup`.
    pub fn with_signature(transport: T, opts: Arc<Options>, signature: WildcardSignature) -> Self {
        Self { transport, opts, signature: Some(signature) }
    }

    pub fn signature(&self) -> Option<&WildcardSignature> {
        self.signature.as_ref()
    }

    /// URL that was actually requested for a result.
    fn probed_url(&self, result: &ProbeResult) -> String {
        if result.is_entity_url {
            result.entity.clone()
        } else {
            format!("{}{}", self.opts.url, result.entity)
        }
    }

    fn verdict(&self, signature: &WildcardSignature, result: &ProbeResult) -> Verdict {
        let probed = self.probed_url(result);
        let scope = Scope::of(&result.entity);
        if signature.is_false_positive(scope, result.status, result.content(), &probed) {
            return Verdict::FalsePositive;
        }

        let excluded_status = self.opts.excluded_status_parsed.contains(&result.status);
        let excluded_content = self
            .opts
            .exclude_string
            .as_deref()
            .is_some_and(|needle| !needle.is_empty() && result.content().contains(needle));
        if excluded_status || excluded_content {
            Verdict::Missed
        } else {
            Verdict::Found
        }
    }

    /// Render with an explicit clock.
    pub fn render_at(&self, result: &ProbeResult, now: DateTime<Local>) -> Result<Rendered> {
        let signature = self.signature.as_ref().ok_or(BusterError::NotCalibrated)?;
        let verdict = self.verdict(signature, result);

        let mut rendered = Rendered { status: result.status, ..Rendered::default() };
        if verdict != Verdict::Found && !self.opts.verbose {
            return Ok(rendered);
        }

        let redirect = result
            .redirect_url
            .as_deref()
            .filter(|r| !r.is_empty())
            .map(|r| format!("  ->  {}", r))
            .unwrap_or_default();

        let display = &mut rendered.display;
        if self.opts.verbose {
            let _ = write!(display, "{:<16}", verdict.label());
        }
        let _ = write!(
            display,
            "{}{:>8}{:>12} B     -     {}{}",
            now.format("[%H:%M:%S]"),
            result.status,
            result.size.unwrap_or(0),
            self.probed_url(result),
            redirect
        );

        if verdict == Verdict::Found {
            rendered.archive = format!(
                "{} - /{} - {}{}",
                now.format("[%Y-%m-%d %H:%M:%S]"),
                archive_path(result),
                result.status,
                redirect
            );
        }
        Ok(rendered)
    }
}

/// Entity without `scheme://host/`, so the archive holds paths only.
fn archive_path(result: &ProbeResult) -> String {
    if !result.is_entity_url {
        return result.entity.clone();
    }
    let Ok(u) = Url::parse(&result.entity) else {
        return result.entity.clone();
    };
    let host = match u.port() {
        Some(port) => format!("{}:{}", u.host_str().unwrap_or_default(), port),
        None => u.host_str().unwrap_or_default().to_string(),
    };
    let prefix = format!("{}://{}/", u.scheme(), host);
    result.entity.strip_prefix(&prefix).unwrap_or(&result.entity).to_string()
}

#[async_trait]
impl<T: Transport> Plugin for DirPlugin<T> {
    async fn setup(&mut self) -> Result<()> {
        let signature = wildcard::calibrate(&self.transport, &self.opts.url).await?;
        if !signature.is_wildcard() {
            tracing::debug!(url = %self.opts.url, "no wildcard responses detected");
        }
        self.signature = Some(signature);
        Ok(())
    }

    async fn process(&self, candidate: &Candidate) -> Result<Vec<ProbeResult>> {
        let (entity, url) = if candidate.pre_resolved {
            (candidate.value.clone(), candidate.value.clone())
        } else {
            let word = candidate.value.strip_prefix('/').unwrap_or(&candidate.value);
            let suffix = if self.opts.use_slash { "/" } else { "" };
            let entity = format!("{}{}", word, suffix);
            let url = format!("{}{}", self.opts.url, entity);
            (entity, url)
        };

        let resp = self.transport.probe(&url).await.map_err(|e| e.at(&url))?;
        tracing::debug!(url = %url, status = resp.status, "probed");

        Ok(vec![ProbeResult {
            entity,
            status: resp.status,
            size: resp.size,
            content: Some(resp.body),
            is_entity_url: candidate.pre_resolved,
            redirect_url: resp.redirect,
            extra: None,
        }])
    }

    fn result_to_string(&self, result: &ProbeResult) -> Result<Rendered> {
        self.render_at(result, Local::now())
    }
}
