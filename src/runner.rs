use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::cli::Cli;
use ybuster::concurrent::Scheduler;
use ybuster::config::{Mode, Options};
use ybuster::gather::wordlist::{self, CandidateStream, Expansion};
use ybuster::gather::{normalize_file, wayback};
use ybuster::output::{progress_bar, spawn_error_writer, spawn_progress, spawn_result_writer, OutputFiles};
use ybuster::plugin::{DirPlugin, DnsPlugin, Plugin};
use ybuster::probe::{HickoryResolver, ReqwestTransport};
use ybuster::state::RunState;

const RULER: &str = "=====================================================";

fn print_banner(opts: &Options) {
    println!("{}", RULER);
    println!("ybuster v{}", env!("CARGO_PKG_VERSION"));
    println!("{}", RULER);
    println!("{}", opts.summary());
    println!("{}", RULER);
}

fn init_tracing(debug: bool, verbose: bool) {
    // Keep external crates at INFO so a debug run stays readable.
    use tracing_subscriber::EnvFilter;
    let crate_level = if debug { "debug" } else if verbose { "info" } else { "warn" };
    let filter_str = format!(
        "ybuster={crate},reqwest=info,hyper=info,h2=info,hickory_resolver=info,hickory_proto=info",
        crate = crate_level
    );
    let env_filter = EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new(crate_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(true)
        .with_target(false)
        .init();
}

pub async fn run_from_cli(cli: Cli) -> anyhow::Result<()> {
    init_tracing(cli.debug, cli.verbose);

    let mut opts = cli.options();
    opts.validate()?;
    if !opts.quiet {
        print_banner(&opts);
    }
    let opts = Arc::new(opts);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\n[!] Keyboard interrupt detected, terminating.");
                cancel.cancel();
            }
        });
    }

    match opts.mode {
        Mode::Dir => {
            let transport = ReqwestTransport::from_options(&opts)?;
            let mut plugin = DirPlugin::new(transport, Arc::clone(&opts));
            plugin.setup().await?;
            enumerate(Arc::new(plugin), opts, cancel).await
        }
        Mode::Dns => {
            let resolver = HickoryResolver::from_system_conf()?;
            let mut plugin = DnsPlugin::new(resolver, Arc::clone(&opts));
            plugin.setup().await?;
            enumerate(Arc::new(plugin), opts, cancel).await
        }
    }
}

/// Chain the URL corpus (if any) ahead of the wordlist and size the run.
///
/// Returns the candidate stream and whether the total is known up front.
async fn candidate_sources(opts: &Options, state: &RunState) -> anyhow::Result<(CandidateStream, bool)> {
    let mut sources: Vec<CandidateStream> = Vec::new();

    if let Some(path) = &opts.wayback_urls {
        let urls = normalize_file(path)?;
        let written = wayback::write_parsed(&opts.output_folder, &opts.url, &urls)?;
        tracing::info!(path = %written.display(), count = urls.len(), "canonical URL list written");
        state.add_expected(urls.len());
        sources.push(wordlist::url_candidates(urls));
    }

    let expansion = Expansion::new(&opts.extensions_parsed, opts.blank_extension);
    let expected = wordlist::count_expected(&opts.wordlist, &expansion).await?;
    if let Some(n) = expected {
        state.add_expected(n);
    }
    let reader = wordlist::open(&opts.wordlist).await?;
    sources.push(wordlist::word_candidates(reader, expansion));

    Ok((stream::iter(sources).flatten().boxed(), expected.is_some()))
}

async fn enumerate<P>(plugin: Arc<P>, opts: Arc<Options>, cancel: CancellationToken) -> anyhow::Result<()>
where
    P: Plugin + 'static,
{
    let state = Arc::new(RunState::new());
    let files = OutputFiles::prepare(&opts)?;
    let (candidates, known_total) = candidate_sources(&opts, &state).await?;
    let sinks = files.open().await?;

    let expected = known_total.then(|| state.snapshot().expected);
    let bar = progress_bar(expected, !opts.quiet && !opts.no_progress);
    let stop = CancellationToken::new();
    let progress = spawn_progress(bar.clone(), Arc::clone(&state), stop.clone());

    if !opts.quiet {
        bar.suspend(|| {
            println!("{} Starting ybuster", chrono::Local::now().format("%Y/%m/%d %H:%M:%S"));
            println!("{}", RULER);
        });
    }

    let scheduler = Scheduler::new(Arc::clone(&plugin), opts.workers, Arc::clone(&state), cancel);
    let (results, errors, done) = scheduler.run(candidates).into_parts();
    let writer = spawn_result_writer(plugin, results, sinks, bar.clone());
    let error_writer = spawn_error_writer(errors, opts.verbose, bar.clone());

    let (reported, failed, done) = tokio::join!(writer, error_writer, done);
    done?;
    let reported = reported?;
    let failed = failed?;

    stop.cancel();
    progress.await?;

    let totals = state.snapshot();
    tracing::info!(issued = totals.issued, errors = totals.errors, reported, "run complete");
    if !opts.quiet {
        println!("{}", RULER);
        println!(
            "{} Finished ({} found, {} errors, matches in {})",
            chrono::Local::now().format("%Y/%m/%d %H:%M:%S"),
            reported,
            failed,
            files.matches.display()
        );
        println!("{}", RULER);
    }
    Ok(())
}
