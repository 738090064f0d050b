//! Cinera CLI
//!
//! Terminal host for the annotation browser: loads configured project
//! indexes, searches them and prints the rendered results.

mod sink;

use anyhow::{bail, Context, Result};
use cinera_core::{BrowserConfig, Corpus, Loader, SortOrder, SourceConfig};
use cinera_index::parse_index;
use cinera_search::{RenderSink, Session, SessionHandle, SessionOptions};
use clap::{Args, Parser, Subcommand};
use sink::{JsonSink, TextSink};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cinera")]
#[command(about = "Cinera - search timestamped video annotations across projects")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every configured project and run one query
    Search {
        /// Query (empty shows the full index)
        #[arg(default_value = "")]
        query: String,

        #[command(flatten)]
        browse: BrowseArgs,

        /// Print the results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse a single index document
    Parse {
        /// Index file
        file: PathBuf,

        /// Print episodes and warnings as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read one query per line from stdin and re-render after each
    Repl {
        #[command(flatten)]
        browse: BrowseArgs,
    },
}

#[derive(Args)]
struct BrowseArgs {
    /// Config file (default: ~/.cinera/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read indexes from this directory instead of the configured source
    #[arg(long)]
    root: Option<PathBuf>,

    /// Newest episodes first
    #[arg(short, long)]
    reverse: bool,

    /// Hide a project by id (repeatable)
    #[arg(long = "hide", value_name = "PROJECT_ID")]
    hide: Vec<String>,

    /// Also print results of hidden projects
    #[arg(long)]
    show_hidden: bool,

    /// Render units per turn
    #[arg(long)]
    budget: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            query,
            browse,
            json,
        } => cmd_search(query, browse, json).await,
        Commands::Parse { file, json } => {
            init_logging("warn");
            cmd_parse(&file, json)
        }
        Commands::Repl { browse } => cmd_repl(browse).await,
    }
}

/// Log to stderr so stdout carries only results. `RUST_LOG` wins over the
/// configured level.
fn init_logging(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Everything a browsing command needs before its session starts.
struct Browser {
    corpus: Arc<Corpus>,
    loader: Loader,
    options: SessionOptions,
    show_hidden: bool,
}

impl Browser {
    fn open(args: BrowseArgs) -> Result<Self> {
        let (mut config, fallback) = match &args.config {
            Some(path) => {
                let config = BrowserConfig::load_from(path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))?;
                (config, None)
            }
            None => BrowserConfig::load_or_default(),
        };

        init_logging(&config.log_level);
        if let Some(e) = fallback {
            tracing::warn!(error = %e, "Failed to load config file, using defaults");
        }

        if let Some(root) = args.root {
            config.source = SourceConfig::File { root };
        }
        if let Some(budget) = args.budget {
            if budget == 0 {
                bail!("--budget must be positive");
            }
            config.render_budget = budget;
        }
        if args.reverse {
            config.order = SortOrder::Reverse;
        }
        if config.projects.is_empty() {
            bail!("No projects configured. Add some under `projects:` in the config file.");
        }

        let source = config
            .source
            .build()
            .context("Failed to set up index source")?;

        let corpus = Arc::new(Corpus::new(config.projects.clone()));
        for id in &args.hide {
            corpus
                .set_filtered_out_by_id(id, true)
                .with_context(|| format!("Cannot hide {}", id))?;
        }

        tracing::info!(
            projects = corpus.len(),
            budget = config.render_budget,
            "Starting Cinera v{}",
            env!("CARGO_PKG_VERSION")
        );

        Ok(Self {
            corpus,
            loader: Loader::new(source),
            options: SessionOptions {
                render_budget: config.render_budget,
                order: config.order,
                initial_query: None,
            },
            show_hidden: args.show_hidden,
        })
    }

    fn session<S: RenderSink>(
        &self,
        sink: S,
        query: Option<String>,
    ) -> (Session<S>, SessionHandle) {
        let options = SessionOptions {
            initial_query: query,
            ..self.options.clone()
        };
        let (mut session, handle) = Session::new(self.corpus.clone(), sink, options);
        session.load_all(&self.loader);
        (session, handle)
    }

    fn report_failures(&self) {
        let failed: Vec<_> = self
            .corpus
            .snapshot()
            .into_iter()
            .filter_map(|p| match p.state {
                cinera_core::LoadState::Errored(reason) => Some((p.spec.id.clone(), reason)),
                _ => None,
            })
            .collect();

        for (id, reason) in &failed {
            eprintln!("✗ {} not loaded: {}", id, reason);
        }
    }
}

async fn cmd_search(query: String, args: BrowseArgs, json: bool) -> Result<()> {
    let browser = Browser::open(args)?;

    if json {
        let (session, handle) = browser.session(JsonSink::default(), Some(query));
        drop(handle);
        let report = session.run().await.into_report();
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let sink = TextSink::new(browser.corpus.clone(), false, browser.show_hidden);
        let (session, handle) = browser.session(sink, Some(query));
        drop(handle);
        let sink = session.run().await;
        for line in sink.lines() {
            println!("{}", line);
        }
    }

    browser.report_failures();
    Ok(())
}

fn cmd_parse(file: &Path, json: bool) -> Result<()> {
    let document = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let parsed =
        parse_index(&document).with_context(|| format!("Failed to parse {}", file.display()))?;

    if json {
        let value = serde_json::json!({
            "episodes": parsed.episodes,
            "warnings": parsed.warnings,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let markers: usize = parsed.episodes.iter().map(|e| e.markers.len()).sum();
    println!(
        "{}: {} episodes, {} markers",
        file.display(),
        parsed.episodes.len(),
        markers
    );
    for episode in &parsed.episodes {
        println!("  {} [{}]", episode.label(), episode.name);
        for marker in &episode.markers {
            println!("    {} {}", marker.pretty_time, marker.text);
        }
    }

    if !parsed.warnings.is_empty() {
        println!();
        println!("{} warnings:", parsed.warnings.len());
        for warning in &parsed.warnings {
            println!("  {}", warning);
        }
    }

    Ok(())
}

async fn cmd_repl(args: BrowseArgs) -> Result<()> {
    let browser = Browser::open(args)?;
    let sink = TextSink::new(browser.corpus.clone(), true, browser.show_hidden);
    let (session, handle) = browser.session(sink, None);

    eprintln!(
        "Type a query per line. :reverse flips ordering, \
         :hide/:show <id> toggle a project, :quit exits."
    );

    let input = tokio::spawn(read_commands(handle));
    session.run().await;

    input.await.context("Input task panicked")??;
    browser.report_failures();
    Ok(())
}

/// Feed stdin lines to the session until EOF or `:quit`.
async fn read_commands(handle: SessionHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end();
        let (command, arg) = line.split_once(' ').unwrap_or((line, ""));

        let sent = match command {
            ":quit" | ":q" => {
                handle.shutdown()?;
                break;
            }
            ":reverse" => handle.toggle_order().map(|order| {
                eprintln!("order: {:?}", order);
            }),
            ":hide" | ":show" => handle.set_filtered_out_by_id(arg.trim(), command == ":hide"),
            _ => handle.set_query(line),
        };

        if let Err(e) = sent {
            eprintln!("✗ {}", e);
        }
    }

    Ok(())
}
