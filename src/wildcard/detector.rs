use crate::error::{BusterError, Result};
use crate::probe::Transport;
use crate::utils::random_token;
use crate::wildcard::signature::{
    extract_title, stripped_len, Discriminator, Scope, ScopeSignature, WildcardSignature,
};

/// One calibration probe, reduced to what classification needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub url: String,
    pub status: u16,
    pub title: Option<String>,
    pub stripped_len: usize,
}

impl Sample {
    pub fn new(url: &str, status: u16, body: &str) -> Self {
        Self {
            url: url.to_string(),
            status,
            title: extract_title(body),
            stripped_len: stripped_len(body, url),
        }
    }
}

/// Compare two probes of non-existent paths within one scope.
///
/// Differing status codes mean the target answers honestly and no
/// signature is recorded.
pub fn classify(long: &Sample, short: &Sample) -> Option<ScopeSignature> {
    if long.status != short.status {
        tracing::info!(url = %long.url, status = long.status, "wildcard response NOT found");
        tracing::info!(url = %short.url, status = short.status, "wildcard response NOT found");
        return None;
    }

    tracing::info!(url = %long.url, status = long.status, "wildcard response found");
    tracing::info!(url = %short.url, status = short.status, "wildcard response found");

    let discriminator = match (&long.title, &short.title) {
        (Some(a), Some(b)) if !a.is_empty() && a == b => {
            tracing::info!(title = %a, " --> wildcard by title");
            Discriminator::Title(a.clone())
        }
        _ if long.stripped_len == short.stripped_len => {
            tracing::info!(length = long.stripped_len, " --> wildcard by content length");
            Discriminator::ContentLength(long.stripped_len)
        }
        _ => {
            tracing::warn!(
                status = long.status,
                " --> wildcard by status code only, every {} response will be suppressed",
                long.status
            );
            Discriminator::StatusOnly
        }
    };

    Some(ScopeSignature { status: long.status, discriminator })
}

/// Probe names for a scope, long one first. The lengths differ so that a
/// target special-casing one probe length is still caught.
fn tokens(scope: Scope) -> (String, String) {
    match scope {
        Scope::File => (random_token(16), random_token(8)),
        Scope::Directory => (format!("{}/", random_token(15)), format!("{}/", random_token(7))),
    }
}

async fn sample<T: Transport + ?Sized>(transport: &T, url: &str) -> Result<Sample> {
    let resp = transport.probe(url).await.map_err(|e| BusterError::Connectivity {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    Ok(Sample::new(url, resp.status, &resp.body))
}

async fn calibrate_scope<T: Transport + ?Sized>(
    transport: &T,
    base_url: &str,
    scope: Scope,
) -> Result<Option<ScopeSignature>> {
    let (long, short) = tokens(scope);
    let long = sample(transport, &format!("{}{}", base_url, long)).await?;
    let short = sample(transport, &format!("{}{}", base_url, short)).await?;
    Ok(classify(&long, &short))
}

/// Check connectivity to `base_url`, then calibrate both scopes.
///
/// Any failed probe aborts with [`BusterError::Connectivity`].
pub async fn calibrate<T: Transport + ?Sized>(transport: &T, base_url: &str) -> Result<WildcardSignature> {
    transport.probe(base_url).await.map_err(|e| BusterError::Connectivity {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;

    let file = calibrate_scope(transport, base_url, Scope::File).await?;
    let directory = calibrate_scope(transport, base_url, Scope::Directory).await?;
    Ok(WildcardSignature::new(file, directory))
}
