use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::ProgressBar;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::Options;
use crate::error::{BusterError, Result};
use crate::gather::wayback::target_slug;
use crate::output::writer_jsonl::JsonlWriter;
use crate::plugin::Plugin;
use crate::result::ProbeResult;
use crate::utils::ensure_dir;

/// Where a run's findings go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFiles {
    /// Display lines of this run.
    pub matches: PathBuf,
    /// Archive lines of every run against any target.
    pub archive: PathBuf,
    pub json: Option<PathBuf>,
}

impl OutputFiles {
    /// Resolve file names and create the output directories.
    pub fn prepare(opts: &Options) -> Result<Self> {
        let root = &opts.output_folder;
        let matches_dir = root.join("output_matches");
        ensure_dir(root)?;
        ensure_dir(&matches_dir)?;
        ensure_dir(&root.join("output_waybackurls"))?;

        let matches = match &opts.output_filename {
            Some(name) => root.join(name),
            None => matches_dir.join(format!(
                "matches_{}_{}.txt",
                chrono::Utc::now().timestamp(),
                target_slug(&opts.url)
            )),
        };

        Ok(Self { matches, archive: root.join("all_time_matches.txt"), json: opts.json_output.clone() })
    }

    pub async fn open(&self) -> Result<Sinks> {
        Ok(Sinks {
            matches: truncate(&self.matches).await?,
            archive: append(&self.archive).await?,
            json: match &self.json {
                Some(path) => Some(JsonlWriter::open(path).await?),
                None => None,
            },
        })
    }
}

/// The per-run matches file starts empty.
async fn truncate(path: &Path) -> Result<File> {
    Ok(OpenOptions::new().create(true).write(true).truncate(true).open(path).await?)
}

/// The archive accumulates across runs.
async fn append(path: &Path) -> Result<File> {
    Ok(OpenOptions::new().create(true).append(true).open(path).await?)
}

/// Open handles for a run's output files.
#[derive(Debug)]
pub struct Sinks {
    matches: File,
    archive: File,
    json: Option<JsonlWriter>,
}

impl Sinks {
    async fn write_line(file: &mut File, line: &str) -> Result<()> {
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        Ok(())
    }

    async fn record(&mut self, display: &str, archive: &str, result: &ProbeResult) -> Result<()> {
        Self::write_line(&mut self.matches, display).await?;
        if !archive.is_empty() {
            Self::write_line(&mut self.archive, archive).await?;
        }
        if let Some(json) = self.json.as_mut() {
            json.write(result).await?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.matches.flush().await?;
        self.archive.flush().await?;
        if let Some(json) = self.json.as_mut() {
            json.flush().await?;
        }
        Ok(())
    }
}

/// Drain the result stream: render through the plugin, print what is
/// reported and append it to the output files.
///
/// Resolves to the number of reported results.
pub fn spawn_result_writer<P>(
    plugin: Arc<P>,
    mut rx: mpsc::Receiver<ProbeResult>,
    mut sinks: Sinks,
    bar: ProgressBar,
) -> JoinHandle<usize>
where
    P: Plugin + ?Sized + 'static,
{
    tokio::spawn(async move {
        let mut reported = 0usize;
        while let Some(result) = rx.recv().await {
            let rendered = match plugin.result_to_string(&result) {
                Ok(r) => r,
                Err(e) => {
                    tracing::error!(entity = %result.entity, error = %e, "failed to render result");
                    continue;
                }
            };
            if !rendered.is_reported() {
                continue;
            }

            reported += 1;
            bar.suspend(|| println!("{}", rendered.display));
            if let Err(e) = sinks.record(&rendered.display, &rendered.archive, &result).await {
                tracing::error!(entity = %result.entity, error = %e, "failed to write result");
            }
        }
        if let Err(e) = sinks.flush().await {
            tracing::error!(error = %e, "failed to flush output files");
        }
        reported
    })
}

/// Drain the error stream, logging each error when verbose.
///
/// Resolves to the number of errors seen.
pub fn spawn_error_writer(mut rx: mpsc::Receiver<BusterError>, verbose: bool, bar: ProgressBar) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut seen = 0usize;
        while let Some(e) = rx.recv().await {
            seen += 1;
            if verbose {
                bar.suspend(|| tracing::warn!(error = %e, "[!] probe error"));
            }
        }
        seen
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{Candidate, Rendered};
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl Plugin for Echo {
        async fn setup(&mut self) -> Result<()> {
            Ok(())
        }

        async fn process(&self, _: &Candidate) -> Result<Vec<ProbeResult>> {
            Ok(Vec::new())
        }

        fn result_to_string(&self, result: &ProbeResult) -> Result<Rendered> {
            if result.entity == "hidden" {
                return Ok(Rendered::default());
            }
            Ok(Rendered {
                display: format!("Found: {}", result.entity),
                archive: format!("- {}", result.entity),
                status: result.status,
            })
        }
    }

    #[test]
    fn named_output_lands_in_the_output_folder() {
        let dir = tempfile::tempdir().unwrap();
        let opts = Options {
            url: "http://example.com/".into(),
            output_folder: dir.path().to_path_buf(),
            output_filename: Some("mine.txt".into()),
            ..Options::default()
        };
        let files = OutputFiles::prepare(&opts).unwrap();
        assert_eq!(files.matches, dir.path().join("mine.txt"));
        assert_eq!(files.archive, dir.path().join("all_time_matches.txt"));
        assert!(dir.path().join("output_matches").is_dir());
    }

    #[test]
    fn default_matches_file_is_named_after_the_target() {
        let dir = tempfile::tempdir().unwrap();
        let opts = Options {
            url: "http://example.com/".into(),
            output_folder: dir.path().to_path_buf(),
            ..Options::default()
        };
        let files = OutputFiles::prepare(&opts).unwrap();
        let name = files.matches.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("matches_"));
        assert!(name.ends_with("_http_example_com.txt"));
    }

    #[tokio::test]
    async fn only_reported_results_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let files = OutputFiles {
            matches: dir.path().join("m.txt"),
            archive: dir.path().join("a.txt"),
            json: Some(dir.path().join("r.jsonl")),
        };
        let sinks = files.open().await.unwrap();

        let (tx, rx) = mpsc::channel(4);
        let writer = spawn_result_writer(Arc::new(Echo), rx, sinks, ProgressBar::hidden());
        for entity in ["admin", "hidden", "login"] {
            tx.send(ProbeResult::entity(entity)).await.unwrap();
        }
        drop(tx);
        assert_eq!(writer.await.unwrap(), 2);

        let matches = std::fs::read_to_string(&files.matches).unwrap();
        assert_eq!(matches, "Found: admin\nFound: login\n");
        let archive = std::fs::read_to_string(&files.archive).unwrap();
        assert_eq!(archive, "- admin\n- login\n");
        let json = std::fs::read_to_string(files.json.as_ref().unwrap()).unwrap();
        assert_eq!(json.lines().count(), 2);
    }

    #[tokio::test]
    async fn reopening_replaces_matches_but_keeps_the_archive() {
        let dir = tempfile::tempdir().unwrap();
        let files = OutputFiles { matches: dir.path().join("m.txt"), archive: dir.path().join("a.txt"), json: None };
        std::fs::write(&files.matches, "stale line from an earlier run\n").unwrap();
        std::fs::write(&files.archive, "- earlier\n").unwrap();

        let sinks = files.open().await.unwrap();
        let (tx, rx) = mpsc::channel(1);
        let writer = spawn_result_writer(Arc::new(Echo), rx, sinks, ProgressBar::hidden());
        tx.send(ProbeResult::entity("admin")).await.unwrap();
        drop(tx);
        writer.await.unwrap();

        assert_eq!(std::fs::read_to_string(&files.matches).unwrap(), "Found: admin\n");
        assert_eq!(std::fs::read_to_string(&files.archive).unwrap(), "- earlier\n- admin\n");
    }

    #[tokio::test]
    async fn errors_are_counted() {
        let (tx, rx) = mpsc::channel(2);
        let writer = spawn_error_writer(rx, true, ProgressBar::hidden());
        tx.send(BusterError::NotCalibrated).await.unwrap();
        drop(tx);
        assert_eq!(writer.await.unwrap(), 1);
    }
}
