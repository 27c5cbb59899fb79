mod logging;

use std::io::{self, StdinLock, Stdout};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use docsync_core::config::{DEFAULT_CONFIG_FILENAME, Overrides, Settings, load_config, resolve_settings};
use docsync_core::model::slug_from_argument;
use docsync_core::prompt::TerminalPrompt;
use docsync_core::remote::{ReadmeClient, RemoteApi};
use docsync_core::selection::{Selection, choose_category, choose_document};
use docsync_core::store::LocalStore;
use docsync_core::{PullAction, PullReport, PushReport, SyncOptions, Syncer};
use tracing::debug;

#[derive(Debug, Parser)]
#[command(
    name = "docsync",
    version,
    about = "Mirror ReadMe documentation pages to local files and push edits back"
)]
struct Cli {
    #[arg(short = 'k', long, global = true, value_name = "KEY", help = "API key of the project")]
    api_key: Option<String>,
    #[arg(short = 'd', long, global = true, value_name = "PATH", help = "Directory holding the local copies")]
    doc_root: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH", help = "Config file (default: docsync.toml)")]
    config: Option<PathBuf>,
    #[arg(short = 'j', long, global = true, help = "Print raw request and response JSON")]
    json: bool,
    #[arg(short = 'y', long, global = true, help = "Answer yes to every confirmation")]
    yes: bool,
    #[arg(short = 'v', long, global = true, help = "Log debug output to stderr")]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone)]
struct RuntimeOptions {
    api_key: Option<String>,
    doc_root: Option<PathBuf>,
    config: Option<PathBuf>,
    json: bool,
    yes: bool,
}

impl RuntimeOptions {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            api_key: cli.api_key.clone(),
            doc_root: cli.doc_root.clone(),
            config: cli.config.clone(),
            json: cli.json,
            yes: cli.yes,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Pull a doc, a category or the whole project into the doc root")]
    Pull(TargetArgs),
    #[command(about = "Pull every doc of the project")]
    Sync,
    #[command(about = "Push a locally edited doc back to the project")]
    Push(TargetArgs),
    #[command(about = "List the project's categories")]
    Categories,
    #[command(about = "List the docs of a category")]
    Docs(DocsArgs),
    #[command(about = "Print a remote doc")]
    Doc(TargetArgs),
}

#[derive(Debug, Args)]
struct TargetArgs {
    #[arg(value_name = "SLUG|URL|FILE", help = "Doc slug, viewer URL or local file name")]
    target: Option<String>,
}

#[derive(Debug, Args)]
struct DocsArgs {
    #[arg(value_name = "CATEGORY")]
    category: Option<String>,
}

type Terminal = TerminalPrompt<StdinLock<'static>, Stdout>;

/// Collaborators for one command invocation.
struct Session {
    client: ReadmeClient,
    prompt: Terminal,
    store: LocalStore,
    options: SyncOptions,
}

impl Session {
    fn open(runtime: &RuntimeOptions) -> Result<Self> {
        let settings = resolve_runtime_settings(runtime)?;
        debug!(
            endpoint = %settings.remote.endpoint,
            doc_root = %normalize_path(&settings.doc_root),
            "resolved settings"
        );
        let client = ReadmeClient::new(&settings.remote)?.with_json_echo(runtime.json);
        Ok(Self {
            client,
            prompt: TerminalPrompt::new(io::stdin().lock(), io::stdout()),
            store: LocalStore::new(settings.doc_root),
            options: SyncOptions {
                assume_yes: runtime.yes,
            },
        })
    }

    fn syncer(&mut self) -> Syncer<'_, ReadmeClient, Terminal> {
        Syncer::new(
            &mut self.client,
            &mut self.prompt,
            &self.store,
            self.options,
        )
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose)?;
    let runtime = RuntimeOptions::from_cli(&cli);

    match cli.command {
        Some(Commands::Pull(TargetArgs { target })) => run_pull(&runtime, target.as_deref()),
        Some(Commands::Sync) => run_sync(&runtime),
        Some(Commands::Push(TargetArgs { target })) => run_push(&runtime, target.as_deref()),
        Some(Commands::Categories) => run_categories(&runtime),
        Some(Commands::Docs(DocsArgs { category })) => run_docs(&runtime, category.as_deref()),
        Some(Commands::Doc(TargetArgs { target })) => run_doc(&runtime, target.as_deref()),
        None => {
            let mut command = Cli::command();
            command.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn run_pull(runtime: &RuntimeOptions, target: Option<&str>) -> Result<()> {
    let mut session = Session::open(runtime)?;
    let report = match target {
        Some(target) => session.syncer().pull_document(&slug_from_argument(target))?,
        None => match choose_category(&mut session.client, &mut session.prompt, true)? {
            Selection::Cancelled => return report_cancelled(),
            Selection::All => session.syncer().pull_project()?,
            Selection::One(category) => {
                match choose_document(&mut session.client, &mut session.prompt, &category, true)? {
                    Selection::Cancelled => return report_cancelled(),
                    Selection::All => session.syncer().pull_category(&category)?,
                    Selection::One(slug) => session.syncer().pull_document(&slug)?,
                }
            }
        },
    };
    print_pull_summary(&report);
    Ok(())
}

fn run_sync(runtime: &RuntimeOptions) -> Result<()> {
    let mut session = Session::open(runtime)?;
    let report = session.syncer().pull_project()?;
    print_pull_summary(&report);
    Ok(())
}

fn run_push(runtime: &RuntimeOptions, target: Option<&str>) -> Result<()> {
    let mut session = Session::open(runtime)?;
    let slug = match target {
        Some(target) => slug_from_argument(target),
        None => match choose_document_interactively(&mut session)? {
            Some(slug) => slug,
            None => return report_cancelled(),
        },
    };
    let report = session.syncer().push_document(&slug)?;
    print_push_summary(&report);
    Ok(())
}

fn run_categories(runtime: &RuntimeOptions) -> Result<()> {
    let mut session = Session::open(runtime)?;
    for category in session.client.categories()? {
        println!("{} : {}", category.slug, category.title);
    }
    Ok(())
}

fn run_docs(runtime: &RuntimeOptions, category: Option<&str>) -> Result<()> {
    let mut session = Session::open(runtime)?;
    let category = match category {
        Some(category) => category.to_string(),
        None => match choose_category(&mut session.client, &mut session.prompt, false)? {
            Selection::One(category) => category,
            Selection::All | Selection::Cancelled => return report_cancelled(),
        },
    };
    for document in session.client.documents(&category)? {
        println!(
            "{} : {}{}",
            document.slug,
            document.title,
            hidden_marker(document.hidden)
        );
    }
    Ok(())
}

fn run_doc(runtime: &RuntimeOptions, target: Option<&str>) -> Result<()> {
    let mut session = Session::open(runtime)?;
    let slug = match target {
        Some(target) => slug_from_argument(target),
        None => match choose_document_interactively(&mut session)? {
            Some(slug) => slug,
            None => return report_cancelled(),
        },
    };
    let document = session.client.document(&slug)?;
    println!("Title: {}{}", document.title, hidden_marker(document.hidden));
    if !document.excerpt.is_empty() {
        println!("Excerpt: {}", document.excerpt);
    }
    println!();
    println!("{}", document.body);
    Ok(())
}

fn choose_document_interactively(session: &mut Session) -> Result<Option<String>> {
    let Selection::One(category) = choose_category(&mut session.client, &mut session.prompt, false)?
    else {
        return Ok(None);
    };
    match choose_document(&mut session.client, &mut session.prompt, &category, false)? {
        Selection::One(slug) => Ok(Some(slug)),
        Selection::All | Selection::Cancelled => Ok(None),
    }
}

fn resolve_runtime_settings(runtime: &RuntimeOptions) -> Result<Settings> {
    let config_path = runtime
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME));
    let file = load_config(&config_path)?;
    let overrides = Overrides {
        api_key: runtime.api_key.clone(),
        doc_root: runtime.doc_root.clone(),
    };

    let initial = resolve_settings(&file, &overrides)?;
    let root_env = initial.doc_root.join(".env");
    if root_env.exists() {
        let _ = dotenvy::from_path_override(&root_env);
        return resolve_settings(&file, &overrides);
    }
    Ok(initial)
}

fn print_pull_summary(report: &PullReport) {
    println!(
        "pull: written {}, aligned {}, declined {}, manifest written: {}, requests: {}",
        report.written(),
        report.count(PullAction::Aligned),
        report.count(PullAction::Declined),
        format_flag(report.manifest_written),
        report.request_count
    );
}

fn print_push_summary(report: &PushReport) {
    println!(
        "push: {} {}, requests: {}",
        report.slug,
        report.outcome.as_str(),
        report.request_count
    );
}

fn report_cancelled() -> Result<()> {
    println!("Nothing selected");
    Ok(())
}

fn hidden_marker(hidden: bool) -> &'static str {
    if hidden { " (hidden)" } else { "" }
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn format_flag(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Cli, Commands, DocsArgs, TargetArgs};

    #[test]
    fn command_surface_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_work_after_the_subcommand() {
        let cli = Cli::try_parse_from(["docsync", "push", "guides/quick-start.md", "-y", "-k", "key"])
            .expect("parse");
        assert!(cli.yes);
        assert_eq!(cli.api_key.as_deref(), Some("key"));
        assert!(matches!(
            cli.command,
            Some(Commands::Push(TargetArgs { target: Some(ref target) })) if target == "guides/quick-start.md"
        ));
    }

    #[test]
    fn targets_are_optional() {
        let cli = Cli::try_parse_from(["docsync", "pull"]).expect("parse");
        assert!(matches!(
            cli.command,
            Some(Commands::Pull(TargetArgs { target: None }))
        ));
        let cli = Cli::try_parse_from(["docsync", "docs"]).expect("parse");
        assert!(matches!(
            cli.command,
            Some(Commands::Docs(DocsArgs { category: None }))
        ));
    }
}
