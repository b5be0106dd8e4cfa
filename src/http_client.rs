use std::time::Duration;

use reqwest::{Client, ClientBuilder};

use crate::config::Options;
use crate::error::{BusterError, Result};

pub fn default_user_agent() -> String {
    format!("ybuster/{}", env!("CARGO_PKG_VERSION"))
}

/// Build the shared HTTP client for a run.
///
/// One client serves every worker so connections are pooled and reused.
pub fn create_client(opts: &Options) -> Result<Client> {
    let redirect = if opts.follow_redirect {
        reqwest::redirect::Policy::limited(10)
    } else {
        reqwest::redirect::Policy::none()
    };

    let mut builder = ClientBuilder::new()
        // Connection pooling - one idle connection per worker
        .pool_max_idle_per_host(opts.workers.max(1))
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .tcp_nodelay(true)
        .timeout(opts.timeout)
        .gzip(true)
        .brotli(true)
        .use_rustls_tls()
        .redirect(redirect)
        .user_agent(opts.user_agent.clone().unwrap_or_else(default_user_agent))
        .danger_accept_invalid_certs(opts.insecure_tls);

    if let Some(proxy) = &opts.proxy {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| BusterError::InvalidOptions(vec![format!("proxy URL is invalid ({})", e)]))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| BusterError::InvalidOptions(vec![format!("failed to build HTTP client: {}", e)]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let opts = Options { proxy: Some("http://127.0.0.1:8080".into()), ..Options::default() };
        assert!(create_client(&opts).is_ok());
    }

    #[test]
    fn bad_proxy_is_an_option_error() {
        let opts = Options { proxy: Some("http://[::1".into()), ..Options::default() };
        assert!(matches!(create_client(&opts), Err(BusterError::InvalidOptions(_))));
    }
}
