use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use concept_document::FsDocumentStore;
use concept_hierarchy::{Classifier, Diagnostic, HierarchySnapshot};
use concept_service::{
    ChangeWatcher, ModelCoordinator, RebuildOutcome, Settings, WatcherConfig, SETTINGS_FILE,
};
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "concept-hierarchy")]
#[command(about = "Concept hierarchy model over linked JSON documents", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root directory (defaults to the current directory)
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    /// Settings file (defaults to <project>/concept-hierarchy.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for output)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Persist the root document path in the project settings
    SetRoot {
        /// Project-relative or absolute path to the root document
        path: String,
    },

    /// Rebuild the hierarchy once and print it
    Build {
        /// Root document, overriding the configured one
        #[arg(long)]
        root: Option<String>,

        /// Print the full snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every inclusion edge discovered from the root
    Includes {
        /// Root document, overriding the configured one
        #[arg(long)]
        root: Option<String>,

        /// Print the edges as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify a concept against the built hierarchy
    Query {
        concept: String,

        /// Additionally test descent from this ancestor
        #[arg(long)]
        ancestor: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build, then rebuild whenever a contributing document changes
    Watch {
        /// Debounce window in milliseconds
        #[arg(long, default_value_t = 750)]
        debounce_ms: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let project = match &cli.project {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("cannot determine current directory")?,
    };
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| project.join(SETTINGS_FILE));

    match cli.command {
        Commands::SetRoot { ref path } => {
            let mut settings = Settings::load_or_default(&config_path)?;
            settings.root_path = Some(path.clone());
            settings.save(&config_path)?;
            println!("Root document set to {path}");
            Ok(())
        }
        Commands::Build { ref root, json } => {
            let (snapshot, diagnostics) = rebuild(&project, &config_path, root.as_deref())?;
            if json {
                print_json(&BuildReport {
                    snapshot: &snapshot,
                    diagnostics: &diagnostics,
                })?;
            } else {
                print_summary(&snapshot, &diagnostics);
            }
            Ok(())
        }
        Commands::Includes { ref root, json } => {
            let (snapshot, _) = rebuild(&project, &config_path, root.as_deref())?;
            if json {
                print_json(&snapshot.edges)?;
            } else {
                for edge in &snapshot.edges {
                    match &edge.target {
                        Some(target) => {
                            println!("{} -> {} ({:?})", edge.source, target, edge.kind)
                        }
                        None => println!("{} -> {} UNRESOLVED", edge.source, edge.path),
                    }
                }
            }
            Ok(())
        }
        Commands::Query {
            ref concept,
            ref ancestor,
            json,
        } => {
            let settings = Settings::load_or_default(&config_path)?;
            let (snapshot, _) = rebuild(&project, &config_path, None)?;
            let classifier = Classifier::new(&snapshot, &settings.classification);

            let report = QueryReport {
                concept,
                is_concept: classifier.is_concept(concept),
                is_function: classifier.is_function(concept),
                is_value_domain: classifier.is_value_domain(concept),
                ancestors: snapshot.ancestors_of(concept),
                descends_from: ancestor
                    .as_deref()
                    .map(|a| snapshot.is_descendant_of(concept, a)),
            };
            if json {
                print_json(&report)?;
            } else {
                report.print();
            }
            Ok(())
        }
        Commands::Watch { debounce_ms } => watch(&project, &config_path, debounce_ms),
    }
}

fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn coordinator(
    project: &Path,
    config_path: &Path,
    root_override: Option<&str>,
) -> Result<ModelCoordinator> {
    let mut settings = Settings::load_or_default(config_path)?;
    if let Some(root) = root_override {
        settings.root_path = Some(root.to_string());
    }
    let store = Arc::new(FsDocumentStore::new(project));
    Ok(ModelCoordinator::new(store, settings))
}

fn rebuild(
    project: &Path,
    config_path: &Path,
    root_override: Option<&str>,
) -> Result<(Arc<HierarchySnapshot>, Vec<Diagnostic>)> {
    let coordinator = coordinator(project, config_path, root_override)?;
    match coordinator.rebuild().context("rebuild failed")? {
        RebuildOutcome::Built {
            snapshot,
            diagnostics,
        } => Ok((snapshot, diagnostics)),
        RebuildOutcome::NoRoot => {
            bail!("no root document configured; run `concept-hierarchy set-root <path>`")
        }
    }
}

fn watch(project: &Path, config_path: &Path, debounce_ms: u64) -> Result<()> {
    let coordinator = Arc::new(coordinator(project, config_path, None)?);
    match coordinator.rebuild() {
        Ok(RebuildOutcome::NoRoot) => {
            bail!("no root document configured; run `concept-hierarchy set-root <path>`")
        }
        Ok(RebuildOutcome::Built { snapshot, .. }) => {
            log::info!("Initial build: {} concepts", snapshot.concepts.len());
        }
        // Keep watching: the next change may fix the build.
        Err(err) => log::warn!("Initial build failed: {err}"),
    }

    let config = WatcherConfig {
        debounce: Duration::from_millis(debounce_ms),
    };
    let _watcher = ChangeWatcher::spawn(Arc::clone(&coordinator), project, config)?;
    loop {
        std::thread::sleep(Duration::from_secs(60));
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_summary(snapshot: &HierarchySnapshot, diagnostics: &[Diagnostic]) {
    println!("Root: {}", snapshot.root);
    println!("Included documents: {}", snapshot.included_documents.len());
    println!("Concepts: {}", snapshot.concepts.len());
    println!("Topological order:");
    for concept in &snapshot.topological_order {
        println!("  {concept}");
    }
    let unresolved = snapshot.unresolved_edges().count();
    if unresolved > 0 {
        println!("Unresolved references: {unresolved}");
    }
    if !diagnostics.is_empty() {
        println!("Diagnostics: {}", diagnostics.len());
    }
}

#[derive(Serialize)]
struct BuildReport<'a> {
    snapshot: &'a HierarchySnapshot,
    diagnostics: &'a [Diagnostic],
}

#[derive(Serialize)]
struct QueryReport<'a> {
    concept: &'a str,
    is_concept: bool,
    is_function: bool,
    is_value_domain: bool,
    ancestors: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    descends_from: Option<bool>,
}

impl QueryReport<'_> {
    fn print(&self) {
        println!("Concept:      {}", self.concept);
        println!("Is concept:   {}", self.is_concept);
        println!("Is function:  {}", self.is_function);
        println!("Value domain: {}", self.is_value_domain);
        if !self.ancestors.is_empty() {
            println!("Ancestors:    {}", self.ancestors.join(", "));
        }
        if let Some(descends) = self.descends_from {
            println!("Descends:     {descends}");
        }
    }
}
