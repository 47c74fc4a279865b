use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dsff::corpus::{load_from_path, Corpus, Entry};
use dsff::output;
use dsff::query::{PageInfo, SearchExecutor, SearchMode};
use dsff::utils::{
    get_config_path, is_valid_letter, normalize_for_search, parse_page_param, AppConfig,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[cfg(all(unix, feature = "daemon"))]
use dsff::server::{self, CorpusClient};

#[derive(Parser)]
#[command(name = "dsff")]
#[command(about = "Search engine for a Catalan dictionary of idioms")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Corpus file (gzipped or plain JSON), overrides the configured one
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Load the corpus in this process even if the daemon is running
    #[arg(long, global = true)]
    direct: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search phrases
    Search {
        /// Query words
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Match mode: contains, starts-with, ends-with, exact-match (or the Catalan labels)
        #[arg(short, long, default_value = "contains")]
        mode: String,

        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: String,

        /// Results per page
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Show every entry of a concept
    Concept {
        /// Concept slug, e.g. fer_goig
        slug: String,
    },
    /// List letters, or the concepts of one letter
    Letter {
        /// Single uppercase letter A-Z
        letter: Option<String>,
    },
    /// Check whether a phrase is in the dictionary
    Exists {
        /// Phrase words
        #[arg(required = true, num_args = 1..)]
        phrase: Vec<String>,
    },
    /// Show corpus statistics
    Stats,
    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
    /// Control the corpus server daemon (keeps the corpus warm)
    #[cfg(all(unix, feature = "daemon"))]
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,
    },
}

#[cfg(all(unix, feature = "daemon"))]
#[derive(Subcommand)]
enum DaemonAction {
    /// Start the daemon in background
    Start,
    /// Stop the running daemon
    Stop,
    /// Check daemon status
    Status,
    /// Run daemon in foreground (for debugging)
    Foreground,
    /// Reload the corpus, from the current file or from --data
    Reload,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not read config, using defaults");
        AppConfig::default()
    });
    if let Some(data) = &cli.data {
        config.data_path = data.clone();
    }

    let color = !cli.no_color;
    let explicit_data = cli.data.is_some();
    let direct = cli.direct;

    match cli.command {
        Commands::Search {
            query,
            mode,
            page,
            page_size,
        } => {
            if let Some(page_size) = page_size {
                config.page_size = page_size;
            }
            let options = SearchOptions {
                mode: SearchMode::from_param(&mode),
                page: parse_page_param(&page),
                page_size: config.effective_page_size(),
            };
            run_search(&config, &query.join(" "), options, explicit_data, direct, color)?;
        }
        Commands::Concept { slug } => {
            let mut source = Source::open(&config, explicit_data, direct)?;
            let (concept, entries) = source.concept(&slug)?;
            let Some(concept) = concept else {
                anyhow::bail!("Concept not found: {}", slug);
            };
            output::print_concept(&mut output::stdout(color), &concept, &entries)?;
        }
        Commands::Letter { letter } => {
            let mut source = Source::open(&config, explicit_data, direct)?;
            let mut out = output::stdout(color);
            match letter {
                None => output::print_letters(&mut out, &source.letters()?)?,
                Some(letter) => {
                    if !is_valid_letter(&letter) {
                        anyhow::bail!("Letter not found: {}", letter);
                    }
                    let concepts = source.letter(&letter)?;
                    if concepts.is_empty() {
                        anyhow::bail!("Letter not found: {}", letter);
                    }
                    output::print_letter(&mut out, &letter, &concepts)?;
                }
            }
        }
        Commands::Exists { phrase } => {
            let phrase = phrase.join(" ");
            let mut source = Source::open(&config, explicit_data, direct)?;
            if source.phrase_exists(&phrase)? {
                println!("yes");
            } else {
                println!("no");
                std::process::exit(1);
            }
        }
        Commands::Stats => {
            dsff::corpus::stats::show_stats(&config.data_path)?;
        }
        Commands::Config { save } => {
            if save {
                config.save()?;
                println!("Saved to {}", get_config_path()?.display());
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        #[cfg(all(unix, feature = "daemon"))]
        Commands::Daemon { action } => {
            handle_daemon_command(action, &config, explicit_data)?;
        }
    }

    Ok(())
}

/// Search parameters after boundary parsing
struct SearchOptions {
    mode: SearchMode,
    page: usize,
    page_size: usize,
}

fn run_search(
    config: &AppConfig,
    query: &str,
    options: SearchOptions,
    explicit_data: bool,
    direct: bool,
    color: bool,
) -> Result<()> {
    // An empty query is the homepage: nothing to list
    if normalize_for_search(query).is_empty() {
        return Ok(());
    }

    let SearchOptions {
        mode,
        page,
        page_size,
    } = options;

    let mut source = Source::open(config, explicit_data, direct)?;
    let (entries, total) = source.search(query, mode, page, page_size)?;
    let info = PageInfo::new(page, total, page_size);
    output::print_search_page(
        &mut output::stdout(color),
        query,
        mode,
        &entries,
        total,
        &info,
    )?;
    Ok(())
}

/// Where lookups are answered: the warm daemon or a corpus loaded here
enum Source {
    #[cfg(all(unix, feature = "daemon"))]
    Daemon(CorpusClient),
    Direct(Box<Corpus>),
}

impl Source {
    /// Prefer a running daemon serving the same corpus file, else load it
    fn open(config: &AppConfig, explicit_data: bool, direct: bool) -> Result<Self> {
        if !direct && let Some(source) = Self::daemon(config, explicit_data) {
            return Ok(source);
        }

        let corpus = load_from_path(&config.data_path)
            .with_context(|| format!("Failed to load corpus from {}", config.data_path.display()))?;
        Ok(Source::Direct(Box::new(corpus)))
    }

    #[cfg(all(unix, feature = "daemon"))]
    fn daemon(config: &AppConfig, explicit_data: bool) -> Option<Self> {
        connect_matching_daemon(&config.data_path, explicit_data).map(Source::Daemon)
    }

    #[cfg(not(all(unix, feature = "daemon")))]
    fn daemon(_config: &AppConfig, _explicit_data: bool) -> Option<Self> {
        None
    }

    fn search(
        &mut self,
        query: &str,
        mode: SearchMode,
        page: usize,
        page_size: usize,
    ) -> Result<(Vec<Entry>, usize)> {
        match self {
            #[cfg(all(unix, feature = "daemon"))]
            Source::Daemon(client) => {
                let response = client.search(query, mode, page, page_size)?;
                Ok((response.entries, response.total))
            }
            Source::Direct(corpus) => {
                let normalized = normalize_for_search(query);
                let result = SearchExecutor::new(corpus).search(&normalized, mode, page, page_size);
                Ok((result.entries, result.total))
            }
        }
    }

    fn concept(&mut self, slug: &str) -> Result<(Option<String>, Vec<Entry>)> {
        match self {
            #[cfg(all(unix, feature = "daemon"))]
            Source::Daemon(client) => {
                let response = client.concept(slug)?;
                Ok((response.concept, response.entries))
            }
            Source::Direct(corpus) => {
                let entries = SearchExecutor::new(corpus).entries_for_slug(slug);
                let concept = entries.first().map(|entry| entry.concept.clone());
                Ok((concept, entries))
            }
        }
    }

    fn letter(&mut self, letter: &str) -> Result<Vec<String>> {
        match self {
            #[cfg(all(unix, feature = "daemon"))]
            Source::Daemon(client) => Ok(client.letter(letter)?),
            Source::Direct(corpus) => Ok(corpus
                .concepts_for_letter(letter)
                .map(<[String]>::to_vec)
                .unwrap_or_default()),
        }
    }

    fn letters(&mut self) -> Result<Vec<(String, usize)>> {
        match self {
            #[cfg(all(unix, feature = "daemon"))]
            Source::Daemon(client) => Ok(client
                .letters()?
                .into_iter()
                .map(|summary| (summary.letter, summary.concepts))
                .collect()),
            Source::Direct(corpus) => Ok(corpus
                .concepts_by_letter()
                .iter()
                .map(|(letter, concepts)| (letter.clone(), concepts.len()))
                .collect()),
        }
    }

    fn phrase_exists(&mut self, phrase: &str) -> Result<bool> {
        match self {
            #[cfg(all(unix, feature = "daemon"))]
            Source::Daemon(client) => Ok(client.phrase_exists(phrase)?),
            Source::Direct(corpus) => Ok(corpus.phrase_exists(phrase)),
        }
    }
}

/// Connect to the daemon if it answers and serves the configured corpus
#[cfg(all(unix, feature = "daemon"))]
fn connect_matching_daemon(data_path: &std::path::Path, explicit_data: bool) -> Option<CorpusClient> {
    let mut client = CorpusClient::connect()?;
    let status = client.status().ok()?;
    if !serves_requested_corpus(&status.data_path, data_path, explicit_data) {
        tracing::debug!(
            daemon = %status.data_path.display(),
            wanted = %data_path.display(),
            "daemon serves another corpus, loading directly"
        );
        return None;
    }
    Some(client)
}

/// Whether a daemon serving `served` can answer for `requested`.
///
/// A configured path that does not resolve is left to the daemon, unless it
/// came from `--data`, in which case the direct load reports the error.
#[cfg(all(unix, feature = "daemon"))]
fn serves_requested_corpus(served: &std::path::Path, requested: &std::path::Path, explicit_data: bool) -> bool {
    match requested.canonicalize() {
        Ok(wanted) => served == wanted,
        Err(_) => !explicit_data,
    }
}

/// Absolute corpus path, so the detached daemon does not depend on our cwd
#[cfg(all(unix, feature = "daemon"))]
fn absolute_data_path(data_path: &std::path::Path) -> Result<PathBuf> {
    data_path
        .canonicalize()
        .with_context(|| format!("Corpus file not found: {}", data_path.display()))
}

#[cfg(all(unix, feature = "daemon"))]
fn handle_daemon_command(action: DaemonAction, config: &AppConfig, explicit_data: bool) -> Result<()> {
    use server::{get_socket_path, is_daemon_running};

    match action {
        DaemonAction::Start => {
            if is_daemon_running() {
                println!("Daemon is already running");
                return Ok(());
            }

            // Load before forking so a bad corpus is reported here
            let data_path = absolute_data_path(&config.data_path)?;
            let corpus = load_from_path(&data_path)?;

            println!("Starting dsff daemon...");
            server::daemon::daemonize(corpus, data_path, config.effective_cache_size())?;

            if server::daemon::wait_for_socket(&get_socket_path(), std::time::Duration::from_secs(3)) {
                println!("Daemon started (socket: {})", get_socket_path().display());
            } else {
                println!("Daemon may have failed to start. Check /tmp/dsff-daemon-error.log");
            }
        }

        DaemonAction::Stop => {
            if !is_daemon_running() {
                println!("Daemon is not running");
                return Ok(());
            }

            println!("Stopping daemon...");
            server::daemon::stop_daemon()?;
            println!("Daemon stopped");
        }

        DaemonAction::Status => {
            if !is_daemon_running() {
                println!("Daemon is not running");
                return Ok(());
            }

            match CorpusClient::connect() {
                Some(mut client) => match client.status() {
                    Ok(status) => {
                        println!("dsff daemon status:");
                        println!("  Uptime: {}s", status.uptime_secs);
                        println!("  Corpus: {}", status.data_path.display());
                        println!("  Loaded: {}s ago", status.corpus_age_secs);
                        println!("  Entries: {}", status.entries);
                        println!("  Letters: {}", status.letters);
                        println!("  Queries served: {}", status.queries_served);
                        println!("  Cache hit rate: {:.1}%", status.cache_hit_rate * 100.0);
                        println!("  Reloads: {}", status.reloads);
                    }
                    Err(e) => {
                        println!("Failed to get status: {}", e);
                    }
                },
                None => {
                    println!("Daemon is running but not responding");
                }
            }
        }

        DaemonAction::Foreground => {
            if is_daemon_running() {
                println!("Daemon is already running in background. Stop it first with 'dsff daemon stop'");
                return Ok(());
            }

            let data_path = absolute_data_path(&config.data_path)?;
            let corpus = load_from_path(&data_path)?;
            println!("Running daemon in foreground (Ctrl+C to stop)...");
            server::daemon::run_foreground(corpus, data_path, config.effective_cache_size())?;
        }

        DaemonAction::Reload => {
            if !is_daemon_running() {
                println!("Daemon is not running. Start it with 'dsff daemon start'");
                return Ok(());
            }

            // Without --data the daemon reloads the file it already serves
            let data_path = if explicit_data {
                Some(absolute_data_path(&config.data_path)?)
            } else {
                None
            };

            let mut client = CorpusClient::connect_required()?;
            let (success, message) = client.reload(data_path)?;
            if success {
                println!("Reloaded: {}", message);
            } else {
                anyhow::bail!("Reload failed: {}", message);
            }
        }
    }

    Ok(())
}
