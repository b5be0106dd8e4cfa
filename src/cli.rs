use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser};

use ybuster::config::{Mode, Options};

#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable detailed debug logging (global)
    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    /// Verbose output: also print MISSED / FALSE POSITIVE lines and errors (global)
    #[arg(short = 'v', long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Brute-force directories and files on a web server
    Dir {
        /// Target URL (e.g. http://example.com, or example.com:443)
        #[arg(short = 'u', long)]
        url: String,

        #[command(flatten)]
        common: CommonArgs,

        /// Comma-separated status codes to hide (e.g. 404,400)
        #[arg(short = 'x', long = "exclude-status", default_value = "")]
        excluded_status_codes: String,

        /// Hide responses whose body contains this string
        #[arg(long = "exclude-string")]
        exclude_string: Option<String>,

        /// Comma-separated extensions substituted for %EXT% in words
        #[arg(short = 'e', long = "ext", default_value = "")]
        extensions: String,

        /// Also request words with `.%EXT%` removed
        #[arg(long = "blank-ext", default_value_t = false)]
        blank_extension: bool,

        /// Cookie header sent with each request
        #[arg(short = 'c', long)]
        cookies: Option<String>,

        /// Basic auth username
        #[arg(short = 'U', long)]
        username: Option<String>,

        /// Basic auth password
        #[arg(short = 'P', long)]
        password: Option<String>,

        /// User-Agent header
        #[arg(short = 'a', long = "user-agent")]
        user_agent: Option<String>,

        /// File of user agents to pick from at random per request
        #[arg(long = "random-agent")]
        random_agents_file: Option<PathBuf>,

        /// Proxy for requests [http(s)://host:port]
        #[arg(short = 'p', long)]
        proxy: Option<String>,

        /// HTTP timeout in seconds
        #[arg(long, default_value_t = 10_u64)]
        timeout: u64,

        /// Follow redirects
        #[arg(short = 'r', long = "follow-redirect", default_value_t = false)]
        follow_redirect: bool,

        /// Report the Content-Length header as size when present
        #[arg(short = 'l', long = "include-length", default_value_t = false)]
        include_length: bool,

        /// Skip TLS certificate verification
        #[arg(short = 'k', long = "insecure", default_value_t = false)]
        insecure_tls: bool,

        /// Append a forward slash to each request
        #[arg(short = 'f', long = "add-slash", default_value_t = false)]
        use_slash: bool,

        /// Deduplicate this URL corpus and probe it before the wordlist
        #[arg(long = "waybackurls")]
        wayback_urls: Option<PathBuf>,
    },

    /// Brute-force subdomains through DNS
    Dns {
        /// Target domain (e.g. example.com)
        #[arg(short = 'd', long = "domain")]
        domain: String,

        #[command(flatten)]
        common: CommonArgs,

        /// Show the IP addresses of found subdomains
        #[arg(short = 'i', long = "show-ips", default_value_t = false)]
        show_ips: bool,

        /// Show the CNAME of found subdomains (not with --show-ips)
        #[arg(long = "show-cname", default_value_t = false)]
        show_cname: bool,
    },
}

#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Path to the wordlist, or `-` for stdin
    #[arg(short = 'w', long)]
    pub wordlist: String,

    /// Number of concurrent workers
    #[arg(short = 't', long = "threads", default_value_t = 10_usize)]
    pub workers: usize,

    /// Output directory
    #[arg(long = "output-folder", default_value = "./results")]
    pub output_folder: PathBuf,

    /// Matches file name inside the output directory
    #[arg(short = 'o', long = "output")]
    pub output_filename: Option<String>,

    /// Also write reported results as JSON lines to this file
    #[arg(long = "json")]
    pub json_output: Option<PathBuf>,

    /// Don't print the banner and other noise
    #[arg(short = 'q', long, default_value_t = false)]
    pub quiet: bool,

    /// Don't display progress
    #[arg(long = "no-progress", default_value_t = false)]
    pub no_progress: bool,
}

impl CommonArgs {
    fn apply(self, opts: &mut Options) {
        opts.wordlist = self.wordlist;
        opts.workers = self.workers;
        opts.output_folder = self.output_folder;
        opts.output_filename = self.output_filename;
        opts.json_output = self.json_output;
        opts.quiet = self.quiet;
        opts.no_progress = self.no_progress;
    }
}

impl Cli {
    /// Unvalidated run options; `Options::validate` runs in the runner.
    pub fn options(self) -> Options {
        let mut opts = Options { verbose: self.verbose, ..Options::default() };
        match self.command {
            Commands::Dir {
                url,
                common,
                excluded_status_codes,
                exclude_string,
                extensions,
                blank_extension,
                cookies,
                username,
                password,
                user_agent,
                random_agents_file,
                proxy,
                timeout,
                follow_redirect,
                include_length,
                insecure_tls,
                use_slash,
                wayback_urls,
            } => {
                opts.mode = Mode::Dir;
                opts.url = url;
                common.apply(&mut opts);
                opts.excluded_status_codes = excluded_status_codes;
                opts.exclude_string = exclude_string;
                opts.extensions = extensions;
                opts.blank_extension = blank_extension;
                opts.cookies = cookies;
                opts.username = username;
                opts.password = password;
                opts.user_agent = user_agent;
                opts.random_agents_file = random_agents_file;
                opts.proxy = proxy;
                opts.timeout = Duration::from_secs(timeout);
                opts.follow_redirect = follow_redirect;
                opts.include_length = include_length;
                opts.insecure_tls = insecure_tls;
                opts.use_slash = use_slash;
                opts.wayback_urls = wayback_urls;
            }
            Commands::Dns { domain, common, show_ips, show_cname } => {
                opts.mode = Mode::Dns;
                opts.url = domain;
                common.apply(&mut opts);
                opts.show_ips = show_ips;
                opts.show_cname = show_cname;
            }
        }
        opts
    }
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
