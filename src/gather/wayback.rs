//! Normalization of archived URL corpora (e.g. `waybackurls` output) into a
//! canonical, non-redundant list of probe targets.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use ahash::AHashSet;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::config::meaningful_lines;
use crate::error::{BusterError, Result};

/// A final path segment naming a static asset.
static ASSET_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^[^/]+\.(jpg|jpeg|woff|woff2|ico|css|eot|pdf|ttf|gif|doc|docx|xls|xlsx|svg|csv|mp3|mp4|wma|ppt|png|pptx|swf)$",
    )
    .expect("valid asset regex")
});

/// A corpus entry split into the parts that decide equivalence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedUrl {
    pub host: String,
    pub path: String,
    /// Query keys only; values never matter for equivalence.
    pub query: BTreeSet<String>,
    pub url: String,
}

impl ParsedUrl {
    /// Parse one raw entry. An asset file in the last path segment is
    /// dropped together with the query and fragment.
    ///
    /// Unparseable entries become opaque hosts with no path or query.
    pub fn parse(raw: &str) -> Self {
        let Ok(mut parsed) = Url::parse(raw) else {
            return Self { host: raw.to_string(), path: String::new(), query: BTreeSet::new(), url: raw.to_string() };
        };
        let url = if strip_asset(&mut parsed) { parsed.to_string() } else { raw.to_string() };
        Self {
            host: host_with_port(&parsed),
            path: parsed.path().to_string(),
            query: parsed.query_pairs().map(|(k, _)| k.into_owned()).collect(),
            url,
        }
    }

    fn key(&self) -> (&str, &str, &BTreeSet<String>) {
        (&self.host, &self.path, &self.query)
    }
}

fn host_with_port(u: &Url) -> String {
    let host = u.host_str().unwrap_or_default();
    match u.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Cut an asset segment back to its directory. Returns whether anything changed.
fn strip_asset(u: &mut Url) -> bool {
    let path = u.path();
    let Some(cut) = path.rfind('/') else {
        return false;
    };
    if !ASSET_SEGMENT.is_match(&path[cut + 1..]) {
        return false;
    }
    let dir = path[..=cut].to_string();
    u.set_path(&dir);
    u.set_query(None);
    u.set_fragment(None);
    true
}

/// Collapse a raw URL corpus into one canonical URL per
/// (host, path, query-key-set) class. The first entry in sorted order wins.
pub fn normalize<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut lines: Vec<String> = raw
        .into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    lines.sort();

    let parsed: Vec<ParsedUrl> = lines.iter().map(|l| ParsedUrl::parse(l)).collect();

    let mut seen = AHashSet::with_capacity(parsed.len());
    let mut unique = Vec::new();
    for p in &parsed {
        if seen.insert(p.key()) {
            unique.push(p.url.clone());
        }
    }
    unique
}

/// Read and normalize a corpus file. Comment and blank lines are ignored.
pub fn normalize_file(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path).map_err(|e| BusterError::Corpus {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let text = String::from_utf8_lossy(&bytes);
    let raw: Vec<&str> = meaningful_lines(&text).collect();
    let unique = normalize(&raw);
    tracing::info!(
        path = %path.display(),
        loaded = raw.len(),
        unique = unique.len(),
        "URL corpus normalized"
    );
    Ok(unique)
}

/// `<scheme>_<host><path>` with separators flattened, for output file names.
pub fn target_slug(base_url: &str) -> String {
    let Ok(u) = Url::parse(base_url) else {
        return base_url.replace(['.', ':', '/'], "_");
    };
    let host = host_with_port(&u).replace(['.', ':'], "_");
    let path = if u.path() == "/" {
        String::new()
    } else {
        u.path().trim_end_matches('/').replace('/', "_")
    };
    format!("{}_{}{}", u.scheme(), host, path)
}

/// Persist the canonical list under `<folder>/output_waybackurls/`.
pub fn write_parsed(folder: &Path, base_url: &str, urls: &[String]) -> Result<PathBuf> {
    let dir = folder.join("output_waybackurls");
    crate::utils::ensure_dir(&dir)?;
    let path = dir.join(format!(
        "waybackurls_parsed_{}_{}.txt",
        chrono::Utc::now().timestamp(),
        target_slug(base_url)
    ));
    let mut body = urls.join("\n");
    body.push('\n');
    std::fs::write(&path, body)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn differing_values_collapse() {
        let out = normalize(["http://h/a?x=1", "http://h/a?x=2"]);
        assert_eq!(out, vec!["http://h/a?x=1"]);
    }

    #[test]
    fn differing_key_sets_stay_apart() {
        let out = normalize(["http://h/a?x=1", "http://h/a?x=1&y=2"]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn key_order_does_not_matter() {
        let out = normalize(["http://h/a?y=1&x=2", "http://h/a?x=9&y=8"]);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn empty_queries_are_equivalent() {
        let out = normalize(["http://h/a", "http://h/a", "http://h/b"]);
        assert_eq!(out, vec!["http://h/a", "http://h/b"]);
    }

    #[test]
    fn asset_segment_is_stripped() {
        let p = ParsedUrl::parse("http://h/img/pic.jpg?ver=3");
        assert_eq!(p.path, "/img/");
        assert_eq!(p.url, "http://h/img/");
        assert!(p.query.is_empty());

        let p = ParsedUrl::parse("http://h/static/Site.CSS");
        assert_eq!(p.url, "http://h/static/");
    }

    #[test]
    fn assets_only_match_the_last_segment() {
        let p = ParsedUrl::parse("http://docs.example.com/pdf.viewer/open");
        assert_eq!(p.url, "http://docs.example.com/pdf.viewer/open");
    }

    #[test]
    fn asset_names_in_the_query_are_left_alone() {
        let p = ParsedUrl::parse("http://h/view?img=x.png");
        assert_eq!(p.url, "http://h/view?img=x.png");
        assert_eq!(p.path, "/view");
        assert_eq!(p.query, BTreeSet::from(["img".to_string()]));

        let out = normalize(["http://h/view", "http://h/view?img=x.png"]);
        assert_eq!(out, vec!["http://h/view", "http://h/view?img=x.png"]);
    }

    #[test]
    fn asset_fragment_goes_with_the_segment() {
        let p = ParsedUrl::parse("http://h:8080/a/b/font.woff2#iefix");
        assert_eq!(p.url, "http://h:8080/a/b/");
        assert_eq!(p.host, "h:8080");
    }

    #[test]
    fn unparseable_entries_are_opaque_hosts() {
        let p = ParsedUrl::parse("not a url");
        assert_eq!(p.host, "not a url");
        assert!(p.path.is_empty());
    }

    #[test]
    fn normalize_is_idempotent() {
        let corpus = [
            "http://h/b?z=1",
            "http://h/a?x=1",
            "http://h/img/logo.png",
            "http://h/img/",
            "https://other/a?x=2&y=3",
            "garbage",
            "http://h/a?x=5",
        ];
        let once = normalize(corpus);
        let twice = normalize(&once);
        let a: BTreeSet<_> = once.iter().collect();
        let b: BTreeSet<_> = twice.iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn slug_flattens_host_and_path() {
        assert_eq!(target_slug("https://www.site.com:8443/app/v1/"), "https_www_site_com_8443_app_v1");
        assert_eq!(target_slug("http://site.com/"), "http_site_com");
    }
}
