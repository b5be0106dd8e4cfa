use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::{BusterError, Result};

static EXPLICIT_PORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^/]+:(\d+)").expect("valid port regex"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Dir,
    Dns,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Dir => f.write_str("dir"),
            Mode::Dns => f.write_str("dns"),
        }
    }
}

/// Run configuration.
///
/// Raw string fields (`extensions`, `excluded_status_codes`) are parsed into
/// their `*_parsed` counterparts by [`Options::validate`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Options {
    pub mode: Mode,
    /// Base URL in dir mode, domain in dns mode.
    pub url: String,
    pub workers: usize,
    /// `-` reads the wordlist from stdin.
    pub wordlist: String,
    pub wayback_urls: Option<PathBuf>,
    pub output_folder: PathBuf,
    pub output_filename: Option<String>,
    pub json_output: Option<PathBuf>,
    pub excluded_status_codes: String,
    pub exclude_string: Option<String>,
    pub extensions: String,
    pub blank_extension: bool,
    pub cookies: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub user_agent: Option<String>,
    pub random_agents_file: Option<PathBuf>,
    pub proxy: Option<String>,
    #[serde(with = "secs")]
    pub timeout: Duration,
    pub follow_redirect: bool,
    pub include_length: bool,
    pub insecure_tls: bool,
    pub use_slash: bool,
    pub show_ips: bool,
    pub show_cname: bool,
    pub verbose: bool,
    pub quiet: bool,
    pub no_progress: bool,

    #[serde(skip)]
    pub extensions_parsed: BTreeSet<String>,
    #[serde(skip)]
    pub excluded_status_parsed: BTreeSet<u16>,
    #[serde(skip)]
    pub random_agents: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            mode: Mode::Dir,
            url: String::new(),
            workers: 10,
            wordlist: String::new(),
            wayback_urls: None,
            output_folder: PathBuf::from("./results"),
            output_filename: None,
            json_output: None,
            excluded_status_codes: String::new(),
            exclude_string: None,
            extensions: String::new(),
            blank_extension: false,
            cookies: None,
            username: None,
            password: None,
            user_agent: None,
            random_agents_file: None,
            proxy: None,
            timeout: Duration::from_secs(10),
            follow_redirect: false,
            include_length: false,
            insecure_tls: false,
            use_slash: false,
            show_ips: false,
            show_cname: false,
            verbose: false,
            quiet: false,
            no_progress: false,
            extensions_parsed: BTreeSet::new(),
            excluded_status_parsed: BTreeSet::new(),
            random_agents: Vec::new(),
        }
    }
}

mod secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

impl Options {
    /// Check every option, collecting all problems before failing.
    pub fn validate(&mut self) -> Result<()> {
        let mut problems = Vec::new();

        if self.workers == 0 {
            problems.push(format!("Workers (-t): Invalid value: {}", self.workers));
        }

        if self.wordlist.is_empty() {
            problems.push("Wordlist (-w): Must be specified (use `-w -` for stdin)".to_string());
        } else if self.wordlist != "-" && !Path::new(&self.wordlist).exists() {
            problems.push(format!("Wordlist (-w): File does not exist: {}", self.wordlist));
        }

        if self.url.is_empty() {
            problems.push("Url/Domain (-u): Must be specified".to_string());
        }

        if !self.excluded_status_codes.is_empty() {
            match parse_status_codes(&self.excluded_status_codes) {
                Ok(codes) => self.excluded_status_parsed = codes,
                Err(e) => problems.push(e),
            }
        }

        if !self.extensions.is_empty() {
            self.extensions_parsed = parse_extensions(&self.extensions);
        }

        if self.show_ips && self.show_cname {
            problems.push("Show IPs (-i) and show CNAME (--cn) cannot be used together".to_string());
        }

        if self.mode == Mode::Dir && !self.url.is_empty() {
            match normalize_base_url(&self.url) {
                Ok(url) => self.url = url,
                Err(e) => problems.push(e),
            }
            if self.username.is_some() && self.password.is_none() {
                problems.push("username was provided but password is missing".to_string());
            }
        }

        if let Some(path) = &self.wayback_urls {
            if !path.exists() {
                problems.push(format!("Wayback urls (--wayback-urls): File does not exist: {}", path.display()));
            }
        }

        if let Some(path) = self.random_agents_file.clone() {
            if !path.exists() {
                problems.push(format!("Random agent (--random-agent): File does not exist: {}", path.display()));
            } else {
                match std::fs::read_to_string(&path) {
                    Ok(text) => self.random_agents = meaningful_lines(&text).map(str::to_string).collect(),
                    Err(e) => problems.push(format!("failed to read random agents: {}", e)),
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(BusterError::InvalidOptions(problems))
        }
    }

    /// Human-readable summary of the effective configuration.
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("[+] Mode                  : {}", self.mode),
            format!("[+] Url/Domain            : {}", self.url),
            format!("[+] Workers               : {}", self.workers),
            format!(
                "[+] Wordlist              : {}",
                if self.wordlist == "-" { "stdin (pipe)" } else { self.wordlist.as_str() }
            ),
        ];

        if self.mode == Mode::Dir {
            if !self.excluded_status_parsed.is_empty() {
                let codes: Vec<String> = self.excluded_status_parsed.iter().map(|c| c.to_string()).collect();
                lines.push(format!("[+] Excluded status codes : {}", codes.join(",")));
            }
            if let Some(proxy) = &self.proxy {
                lines.push(format!("[+] Proxy                 : {}", proxy));
            }
            if let Some(cookies) = &self.cookies {
                lines.push(format!("[+] Cookies               : {}", cookies));
            }
            if let Some(agent) = &self.user_agent {
                lines.push(format!("[+] User Agent            : {}", agent));
            }
            if let Some(user) = &self.username {
                lines.push(format!("[+] Auth User             : {}", user));
            }
            if !self.extensions_parsed.is_empty() {
                let exts: Vec<&str> = self.extensions_parsed.iter().map(String::as_str).collect();
                lines.push(format!("[+] Extensions            : {}", exts.join(",")));
            }
            for (flag, label) in [
                (self.include_length, "Show length           "),
                (self.use_slash, "Add Slash             "),
                (self.follow_redirect, "Follow Redir          "),
                (self.blank_extension, "Blank extension       "),
                (self.verbose, "Verbose               "),
            ] {
                if flag {
                    lines.push(format!("[+] {}: true", label));
                }
            }
            lines.push(format!("[+] Timeout               : {}s", self.timeout.as_secs()));
            if let Some(path) = &self.wayback_urls {
                lines.push(format!("[+] Wayback urls          : {}", path.display()));
            }
            if let Some(path) = &self.random_agents_file {
                lines.push(format!("[+] Random agent          : {}", path.display()));
            }
            if let Some(s) = &self.exclude_string {
                lines.push(format!("[+] Exclude string        : {}", s));
            }
            lines.push(format!("[+] Output folder         : {}", self.output_folder.display()));
        } else {
            if self.show_ips {
                lines.push("[+] Show IPs              : true".to_string());
            }
            if self.show_cname {
                lines.push("[+] Show CNAME            : true".to_string());
            }
        }

        lines.join("\n")
    }
}

/// Lines of a list file that carry content: trimmed, no blanks, no `#` comments.
pub fn meaningful_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty() && !l.starts_with('#'))
}

pub fn parse_extensions(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(|e| e.trim().trim_start_matches('.').to_string())
        .filter(|e| !e.is_empty())
        .collect()
}

pub fn parse_status_codes(raw: &str) -> std::result::Result<BTreeSet<u16>, String> {
    raw.split(',')
        .map(str::trim)
        .map(|c| c.parse::<u16>().map_err(|_| format!("invalid status code given: {}", c)))
        .collect()
}

/// Give a dir-mode target a scheme and a trailing slash.
pub fn normalize_base_url(raw: &str) -> std::result::Result<String, String> {
    let mut url = raw.to_string();
    if !url.ends_with('/') {
        url.push('/');
    }
    if url.starts_with("http") {
        return Ok(url);
    }

    match EXPLICIT_PORT.captures(&url).and_then(|c| c.get(1)) {
        None => Ok(format!("http://{}", url)),
        Some(port) => match port.as_str().parse::<u16>() {
            Ok(80) => Ok(format!("http://{}", url)),
            Ok(443) => Ok(format!("https://{}", url)),
            _ => Err("url scheme not specified".to_string()),
        },
    }
}
