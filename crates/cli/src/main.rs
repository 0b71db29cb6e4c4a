mod config;
mod error;

use std::path::{Path, PathBuf};

use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};
use dedupe::CoverageMatcher;
use runtime::{Agent, ArticleDraft, ArticleKind, Generator, RunContext};
use storage::{Event, EventKind, EventStore, Role};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use error::{Error, Result};

const DEFAULT_LOG_FILTER: &str =
    "warn,draftsmith=info,runtime=info,connectors=info,storage=warn,dedupe=warn";
const PREVIEW_CHARS: usize = 200;

#[derive(Parser)]
#[command(name = "draftsmith")]
#[command(about = "An AI agent that turns interviews and ideas into CMS drafts", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./draftsmith.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hand a natural-language request to the tool-using agent
    Run {
        /// What the agent should do, e.g. "List all interviews"
        request: String,
        /// Interviews folder (overrides documents.interviews_folder)
        #[arg(long)]
        folder: Option<String>,
        /// Ideas folder (overrides documents.ideas_folder)
        #[arg(long)]
        ideas_folder: Option<String>,
        /// Do not record this run in the journal
        #[arg(long)]
        no_journal: bool,
    },
    /// Write one article with a single model call
    Generate {
        #[command(subcommand)]
        source: Source,
        /// File the result as a CMS draft
        #[arg(long, global = true)]
        publish: bool,
    },
    /// List interviews not yet covered by an existing article
    Pending {
        /// Show at most N interviews
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// List journaled runs
    Runs {
        /// Show only the last N runs
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Show the journal of one run
    Logs {
        /// Run ID (prefix match supported)
        #[arg(short, long)]
        run: String,
        /// Filter by event kind (message, tool_call, tool_result, ...)
        #[arg(short, long)]
        kind: Option<String>,
    },
}

#[derive(Subcommand)]
enum Source {
    /// Profile article from an interview transcript
    Interview {
        #[arg(short, long)]
        document: String,
    },
    /// Article developed from an idea note
    Idea {
        #[arg(short, long)]
        document: String,
    },
    /// Researched article on a topic
    Topic {
        #[arg(short, long)]
        topic: String,
    },
}

impl From<Source> for ArticleKind {
    fn from(source: Source) -> Self {
        match source {
            Source::Interview { document } => ArticleKind::Interview {
                document_id: document,
            },
            Source::Idea { document } => ArticleKind::Idea {
                document_id: document,
            },
            Source::Topic { topic } => ArticleKind::Topic { topic },
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::discover(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            request,
            folder,
            ideas_folder,
            no_journal,
        } => cmd_run(&config, &request, folder, ideas_folder, no_journal).await,
        Commands::Generate { source, publish } => cmd_generate(&config, source.into(), publish).await,
        Commands::Pending { limit } => cmd_pending(&config, limit).await,
        Commands::Runs { limit } => cmd_runs(&config, limit),
        Commands::Logs { run, kind } => cmd_logs(&config, &run, kind.as_deref()),
    }
}

async fn cmd_run(
    config: &Config,
    request: &str,
    folder: Option<String>,
    ideas_folder: Option<String>,
    no_journal: bool,
) -> Result<()> {
    let mut agent = Agent::new(config.backend()?, config.services()?).with_config(config.agent_config());
    if !no_journal {
        let path = journal_path(config);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        agent = agent.with_journal(EventStore::open(&path)?);
        info!(journal = %path.display(), "journaling run");
    }

    let mut context =
        RunContext::new(folder.unwrap_or_else(|| config.documents.interviews_folder.clone()));
    if let Some(ideas) = ideas_folder.or_else(|| config.documents.ideas_folder.clone()) {
        context = context.with_ideas_folder(ideas);
    }

    let outcome = agent.run_detailed(request, &context).await?;
    info!(
        run = %outcome.run_id,
        iterations = outcome.iterations,
        input_tokens = outcome.usage.input_tokens,
        output_tokens = outcome.usage.output_tokens,
        "done"
    );
    println!("{}", outcome.text);
    Ok(())
}

async fn cmd_generate(config: &Config, kind: ArticleKind, publish: bool) -> Result<()> {
    let generator = Generator::new(config.backend()?, config.services()?)
        .with_model_timeout(config.agent_config().model_timeout);

    let draft = generator.generate(&kind).await?;
    print_draft(&draft);

    if publish {
        if draft.title.is_empty() || draft.html.is_empty() {
            return Err(Error::Config(
                "refusing to publish a draft without a title or body".into(),
            ));
        }
        let receipt = generator.publish(&draft).await?;
        println!("\nDraft created: {}", receipt.url);
    }
    Ok(())
}

fn print_draft(draft: &ArticleDraft) {
    println!("Title: {}", draft.title);
    println!("Meta Title: {}", draft.meta_title);
    println!("Meta Description: {}", draft.meta_description);
    println!("Excerpt: {}", draft.excerpt);
    println!("Tags: {}", draft.tags.join(", "));
    println!("\n{}", draft.html);
}

async fn cmd_pending(config: &Config, limit: usize) -> Result<()> {
    let services = config.services()?;
    let matcher = CoverageMatcher::new(config.key_phrases()?);

    let interviews = services
        .documents
        .list_documents(&config.documents.interviews_folder)
        .await?;
    let articles = services.publishing.list_articles().await?;
    let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();

    let pending = matcher.uncovered(&interviews, |doc| doc.title.as_str(), &titles);
    if pending.is_empty() {
        println!("Every interview is covered by an existing article.");
        return Ok(());
    }

    println!("{:<40}  {:<12}  TITLE", "DOCUMENT ID", "CREATED");
    println!("{}", "-".repeat(80));
    for doc in pending.into_iter().take(limit) {
        let created = doc
            .created_at
            .map(|t| Local.from_utc_datetime(&t.naive_utc()).format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<40}  {:<12}  {}", doc.id, created, doc.title);
    }
    Ok(())
}

fn cmd_runs(config: &Config, limit: usize) -> Result<()> {
    let store = open_journal(config)?;
    let runs = store.list_runs()?;

    if runs.is_empty() {
        println!("No runs found.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<16}  {:<8}  {:<5}  {:<10}  REQUEST",
        "RUN ID", "STARTED", "TOOK", "TOOLS", "STATUS"
    );
    println!("{}", "-".repeat(110));

    for summary in runs.into_iter().take(limit) {
        let started = Local
            .from_utc_datetime(&summary.started_at.naive_utc())
            .format("%Y-%m-%d %H:%M");
        let status = match summary.limit_reached {
            Some(true) => "limit",
            Some(false) => "done",
            None => "incomplete",
        };
        let took = summary
            .ended_at
            .map(|end| elapsed(end - summary.started_at))
            .unwrap_or_else(|| "-".to_string());
        let request = summary.request.as_deref().map(|r| preview(r, 40)).unwrap_or_default();
        println!(
            "{:<36}  {:<16}  {took:<8}  {:<5}  {status:<10}  {request}",
            summary.id, started, summary.tool_calls
        );
    }

    Ok(())
}

fn cmd_logs(config: &Config, prefix: &str, kind_filter: Option<&str>) -> Result<()> {
    let store = open_journal(config)?;

    let matching = store.find_runs(prefix)?;
    let run_id = match matching.as_slice() {
        [] => {
            return Err(Error::RunNotFound {
                prefix: prefix.to_string(),
            });
        }
        [only] => *only,
        many => {
            return Err(Error::AmbiguousRun {
                prefix: prefix.to_string(),
                matches: many.iter().map(ToString::to_string).collect(),
            });
        }
    };

    let events = store.load_events(run_id, kind_filter)?;

    if events.is_empty() {
        println!("No events found for run {run_id}");
        return Ok(());
    }

    println!("Run: {run_id}\n");

    for event in events {
        print_event(&event);
    }

    Ok(())
}

fn print_event(event: &Event) {
    let time = Local
        .from_utc_datetime(&event.timestamp.naive_utc())
        .format("%H:%M:%S");

    match &event.kind {
        EventKind::RunStart { request } => {
            println!("[{time}] === Run started: {} ===", preview(request, PREVIEW_CHARS));
        }
        EventKind::Message { role, content } => {
            let role_str = match role {
                Role::User => "USER",
                Role::Assistant => "ASSISTANT",
            };
            println!("[{time}] {role_str}: {}", preview(content, PREVIEW_CHARS));
        }
        EventKind::ToolCall { call_id, name, input } => {
            println!("[{time}] TOOL CALL {call_id}: {name} {input}");
        }
        EventKind::ToolResult {
            call_id,
            name,
            output,
            is_error,
        } => {
            let label = if *is_error { "TOOL ERROR" } else { "TOOL RESULT" };
            println!(
                "[{time}] {label} {call_id}: {name} {}",
                preview(output, PREVIEW_CHARS)
            );
        }
        EventKind::RunEnd {
            iterations,
            limit_reached,
        } => {
            let note = if *limit_reached { " (iteration limit)" } else { "" };
            println!("[{time}] === Run ended after {iterations} model calls{note} ===");
        }
    }
}

/// Compact run duration, e.g. `42s` or `3m05s`.
fn elapsed(duration: chrono::TimeDelta) -> String {
    let secs = duration.num_seconds().max(0);
    if secs < 60 {
        format!("{secs}s")
    } else {
        format!("{}m{:02}s", secs / 60, secs % 60)
    }
}

/// First `max` characters of `text` on one line.
fn preview(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &flat[..idx]),
        None => flat,
    }
}

fn open_journal(config: &Config) -> Result<EventStore> {
    let path = journal_path(config);
    if !path.exists() {
        return Err(Error::JournalNotFound { path });
    }
    Ok(EventStore::open(&path)?)
}

fn journal_path(config: &Config) -> PathBuf {
    config.journal.path.clone().unwrap_or_else(|| {
        dirs_data_dir()
            .unwrap_or_else(|| Path::new(".draftsmith").to_path_buf())
            .join("runs.db")
    })
}

fn dirs_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share/draftsmith"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share")))
            .map(|p| p.join("draftsmith"))
    }
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|h| PathBuf::from(h).join("draftsmith"))
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_generate_with_publish() {
        let cli = Cli::try_parse_from([
            "draftsmith",
            "generate",
            "interview",
            "--document",
            "interviews/sarah.md",
            "--publish",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate { source, publish } => {
                assert!(publish);
                assert_eq!(
                    ArticleKind::from(source),
                    ArticleKind::Interview {
                        document_id: "interviews/sarah.md".into()
                    }
                );
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn parses_run_options() {
        let cli = Cli::try_parse_from([
            "draftsmith",
            "--config",
            "alt.toml",
            "run",
            "List all interviews",
            "--ideas-folder",
            "notes",
            "--no-journal",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
        match cli.command {
            Commands::Run {
                request,
                folder,
                ideas_folder,
                no_journal,
            } => {
                assert_eq!(request, "List all interviews");
                assert_eq!(folder, None);
                assert_eq!(ideas_folder.as_deref(), Some("notes"));
                assert!(no_journal);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn preview_flattens_and_cuts() {
        assert_eq!(preview("a\n  b", 10), "a b");
        assert_eq!(preview("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn elapsed_is_compact() {
        assert_eq!(elapsed(chrono::TimeDelta::seconds(42)), "42s");
        assert_eq!(elapsed(chrono::TimeDelta::seconds(185)), "3m05s");
        assert_eq!(elapsed(chrono::TimeDelta::seconds(-1)), "0s");
    }

    #[test]
    fn journal_path_prefers_config() {
        let mut config = Config::default();
        config.journal.path = Some(PathBuf::from("/tmp/custom.db"));
        assert_eq!(journal_path(&config), PathBuf::from("/tmp/custom.db"));
    }
}
