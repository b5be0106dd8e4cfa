use std::path::Path;

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::result::ProbeResult;

/// Append-only JSON-lines sink for reported results.
///
/// The body of a result is never serialized, only entity, status, size,
/// redirect and extra.
#[derive(Debug)]
pub struct JsonlWriter {
    file: File,
}

impl JsonlWriter {
    pub async fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path).await?;
        Ok(Self { file })
    }

    pub async fn write(&mut self, result: &ProbeResult) -> Result<()> {
        let mut line = serde_json::to_vec(result).map_err(std::io::Error::from)?;
        // serde_json::to_vec doesn't include newline; add it
        line.push(b'\n');
        self.file.write_all(&line).await?;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<()> {
        self.file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lines_are_appended_without_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        let mut w = JsonlWriter::open(&path).await.unwrap();
        let mut r = ProbeResult::entity("admin");
        r.status = 200;
        r.content = Some("secret body".into());
        w.write(&r).await.unwrap();
        w.write(&ProbeResult::entity("www")).await.unwrap();
        w.flush().await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(!lines[0].contains("secret"));
        let back: ProbeResult = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(back.entity, "admin");
        assert_eq!(back.status, 200);
    }
}
