use once_cell::sync::Lazy;
use regex::Regex;

static TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<title>(.*?)</title>").expect("valid title regex"));

/// Which calibration applies to a result: paths ending in `/` are directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    File,
    Directory,
}

impl Scope {
    pub fn of(entity: &str) -> Self {
        if entity.ends_with('/') {
            Scope::Directory
        } else {
            Scope::File
        }
    }
}

/// What distinguishes a wildcard response beyond its status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discriminator {
    Title(String),
    /// Body length once the probed URL has been removed from it.
    ContentLength(usize),
    /// Neither title nor length matched during calibration, so every
    /// response with the wildcard status is suppressed. This can hide real
    /// findings that share that status code.
    StatusOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeSignature {
    pub status: u16,
    pub discriminator: Discriminator,
}

impl ScopeSignature {
    pub fn matches(&self, status: u16, body: &str, probed_url: &str) -> bool {
        if status != self.status {
            return false;
        }
        match &self.discriminator {
            Discriminator::Title(title) => extract_title(body).is_some_and(|t| t == *title),
            Discriminator::ContentLength(len) => stripped_len(body, probed_url) == *len,
            Discriminator::StatusOnly => true,
        }
    }
}

/// Calibration outcome for a run. Built once before enumeration and only
/// read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WildcardSignature {
    file: Option<ScopeSignature>,
    directory: Option<ScopeSignature>,
}

impl WildcardSignature {
    pub fn new(file: Option<ScopeSignature>, directory: Option<ScopeSignature>) -> Self {
        Self { file, directory }
    }

    pub fn scope(&self, scope: Scope) -> Option<&ScopeSignature> {
        match scope {
            Scope::File => self.file.as_ref(),
            Scope::Directory => self.directory.as_ref(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.file.is_some() || self.directory.is_some()
    }

    pub fn is_false_positive(&self, scope: Scope, status: u16, body: &str, probed_url: &str) -> bool {
        self.scope(scope).is_some_and(|sig| sig.matches(status, body, probed_url))
    }
}

/// First `<title>` of a page, trimmed. Case-insensitive, spans lines.
pub fn extract_title(body: &str) -> Option<String> {
    TITLE.captures(body).and_then(|c| c.get(1)).map(|m| m.as_str().trim().to_string())
}

pub fn stripped_len(body: &str, probed_url: &str) -> usize {
    if probed_url.is_empty() {
        return body.len();
    }
    body.replace(probed_url, "").len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_case_insensitive_and_multiline() {
        let body = "<html><HEAD><TITLE>\n  Not Found\n</TITLE></HEAD><title>second</title>";
        assert_eq!(extract_title(body).as_deref(), Some("Not Found"));
        assert_eq!(extract_title("<p>no title</p>"), None);
    }

    #[test]
    fn stripped_len_removes_every_echo_of_the_url() {
        let url = "http://h/abc";
        let body = format!("missing {} and {} again", url, url);
        assert_eq!(stripped_len(&body, url), "missing  and  again".len());
    }

    #[test]
    fn scope_follows_trailing_slash() {
        assert_eq!(Scope::of("admin/"), Scope::Directory);
        assert_eq!(Scope::of("admin.php"), Scope::File);
    }

    #[test]
    fn status_only_signature_matches_on_status_alone() {
        let sig = WildcardSignature::new(
            Some(ScopeSignature { status: 200, discriminator: Discriminator::StatusOnly }),
            None,
        );
        assert!(sig.is_false_positive(Scope::File, 200, "anything", "http://h/x"));
        assert!(!sig.is_false_positive(Scope::File, 404, "anything", "http://h/x"));
        assert!(!sig.is_false_positive(Scope::Directory, 200, "anything", "http://h/x/"));
    }

    #[test]
    fn title_signature_needs_same_title() {
        let sig = ScopeSignature { status: 200, discriminator: Discriminator::Title("Not Found".into()) };
        assert!(sig.matches(200, "<title>Not Found</title>", ""));
        assert!(!sig.matches(200, "<title>Admin</title>", ""));
        assert!(!sig.matches(200, "no title here", ""));
    }
}
