use std::collections::BTreeSet;
use std::pin::Pin;

use futures::future;
use futures::stream::{self, Stream, StreamExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::config::meaningful_lines;
use crate::error::{BusterError, Result};
use crate::result::Candidate;

/// Placeholder expanded into every configured extension.
pub const EXT_PLACEHOLDER: &str = "%EXT%";

pub type CandidateStream = Pin<Box<dyn Stream<Item = Candidate> + Send>>;

/// How a single word turns into candidates.
#[derive(Debug, Clone, Default)]
pub struct Expansion {
    extensions: Vec<String>,
    blank: bool,
}

impl Expansion {
    pub fn new(extensions: &BTreeSet<String>, blank: bool) -> Self {
        Self { extensions: extensions.iter().cloned().collect(), blank }
    }

    pub fn expand(&self, word: &str) -> Vec<String> {
        if !word.contains(EXT_PLACEHOLDER) {
            return vec![word.to_string()];
        }

        let mut out = Vec::with_capacity(self.extensions.len() + 1);
        if self.blank {
            out.push(word.replace(&format!(".{}", EXT_PLACEHOLDER), ""));
        }
        for ext in &self.extensions {
            out.push(word.replace(EXT_PLACEHOLDER, ext));
        }
        out
    }

    /// Number of candidates a word list will produce.
    pub fn expected_count(&self, text: &str) -> usize {
        meaningful_lines(text).map(|w| self.expand(w).len()).sum()
    }
}

/// Open a wordlist; `-` means stdin.
pub async fn open(path: &str) -> Result<Box<dyn AsyncBufRead + Send + Unpin>> {
    if path == "-" {
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }
    let file = tokio::fs::File::open(path).await.map_err(|e| BusterError::Corpus {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    Ok(Box::new(BufReader::new(file)))
}

/// Pre-scan a wordlist file to size the progress report. Stdin is not scanned.
pub async fn count_expected(path: &str, expansion: &Expansion) -> Result<Option<usize>> {
    if path == "-" {
        return Ok(None);
    }
    let bytes = tokio::fs::read(path).await.map_err(|e| BusterError::Corpus {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    Ok(Some(expansion.expected_count(&String::from_utf8_lossy(&bytes))))
}

/// Stream relative-word candidates from a line-oriented reader.
///
/// Blank and `#` lines are skipped and every remaining word is expanded.
/// Lines that are not valid UTF-8 are decoded lossily. A read error ends the stream.
pub fn word_candidates<R>(reader: R, expansion: Expansion) -> CandidateStream
where
    R: AsyncBufRead + Send + Unpin + 'static,
{
    let lines = stream::unfold(reader.split(b'\n'), |mut lines| async move {
        match lines.next_segment().await {
            Ok(Some(raw)) => Some((String::from_utf8_lossy(&raw).into_owned(), lines)),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "wordlist read failed, stopping");
                None
            }
        }
    });

    lines
        .filter_map(|line| {
            let word = line.trim();
            let keep = !word.is_empty() && !word.starts_with('#');
            future::ready(keep.then(|| word.to_string()))
        })
        .flat_map(move |word| stream::iter(expansion.expand(&word).into_iter().map(Candidate::word)))
        .boxed()
}

/// Stream pre-resolved URL candidates from the canonical corpus.
pub fn url_candidates(urls: Vec<String>) -> CandidateStream {
    stream::iter(urls.into_iter().map(Candidate::url)).boxed()
}
