//! CLI binary for the GBPN importer: import gazetteer places and query their hierarchy.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use gbpn_core::config::GbpnConfig;
use gbpn_core::graph::{PlaceGraph, PlaceId, PlaceRef};
use gbpn_import::Importer;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gbpn", about = "Gazetteer of British Place Names importer")]
struct Cli {
    /// Project root directory (defaults to current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import the primary-name rows of one GBPN ID
    Import {
        /// Numeric GBPN identifier
        id: String,

        /// Gazetteer CSV (defaults to [source].path in .gbpn/config.toml)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Run the import without saving the graph
        #[arg(long)]
        dry_run: bool,
    },

    /// Show a place and its enclosing places
    Show {
        /// Exact place name
        name: String,

        /// Only follow links valid on this date (YYYY-MM-DD)
        #[arg(long)]
        at: Option<NaiveDate>,

        /// Print the matching places as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show place graph statistics
    Info,

    /// Validate graph integrity (duplicate places, dangling or repeated links)
    Validate,

    /// Show the effective configuration
    Config {
        /// Write a default .gbpn/config.toml if none exists
        #[arg(long)]
        init: bool,
    },
}

fn get_project_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.project {
        Some(p) => Ok(p.clone()),
        None => std::env::current_dir().context("failed to get current directory"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let project_root = get_project_root(&cli)?;

    match cli.command {
        Commands::Import {
            id,
            source,
            dry_run,
        } => cmd_import(&project_root, &id, source, dry_run),
        Commands::Show { name, at, json } => cmd_show(&project_root, &name, at, json),
        Commands::Info => cmd_info(&project_root),
        Commands::Validate => cmd_validate(&project_root),
        Commands::Config { init } => cmd_config(&project_root, init),
    }
}

fn cmd_import(
    project_root: &Path,
    id: &str,
    source: Option<PathBuf>,
    dry_run: bool,
) -> Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};

    let config = GbpnConfig::load(project_root)?;
    let source = source.unwrap_or_else(|| config.source_path(project_root));
    let mut graph = gbpn_core::storage::load_or_new(project_root)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    spinner.set_message(format!("Importing GBPN ID {} from {}...", id, source.display()));
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = Importer::new(&config).run_source(&mut graph, &source, id);
    spinner.finish_and_clear();

    let summary = match result {
        Ok(summary) => summary,
        Err(err) => {
            if let Some(processed) = err.processed()
                && processed > 0
                && !dry_run
            {
                graph.note_imported_id(id);
                graph.refresh_metadata();
                gbpn_core::storage::save(project_root, &graph)?;
                eprintln!("Saved {} record(s) committed before the failure.", processed);
            }
            return Err(anyhow::Error::new(err).context(format!("import of GBPN ID {} failed", id)));
        }
    };

    if summary.records_processed == 0 {
        eprintln!("No primary-name rows found for GBPN ID {}.", id);
        return Ok(());
    }

    graph.note_imported_id(id);
    graph.refresh_metadata();
    if dry_run {
        eprintln!("Dry run: graph not saved.");
    } else {
        gbpn_core::storage::save(project_root, &graph)?;
    }

    eprintln!("Imported GBPN ID {}:", id);
    eprintln!("  Records processed: {}", summary.records_processed);
    eprintln!("  Places created: {}", summary.places_created);
    eprintln!("  Links added: {}", summary.links_added);
    eprintln!(
        "  Graph: {} places, {} links",
        graph.metadata.total_places, graph.metadata.total_links
    );

    Ok(())
}

fn cmd_show(project_root: &Path, name: &str, at: Option<NaiveDate>, json: bool) -> Result<()> {
    if !gbpn_core::storage::graph_exists(project_root) {
        anyhow::bail!("No place graph found. Run `gbpn import <ID>` first.");
    }
    let graph = gbpn_core::storage::load(project_root)?;

    let matches: Vec<_> = graph.find_by_name(name).collect();
    if matches.is_empty() {
        anyhow::bail!("no place named '{}'", name);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    for place in matches {
        println!("{} [{}] {}", place.name, place.place_type, place.id);
        if let Some(coordinates) = &place.coordinates {
            println!("  Coordinates: {}, {}", coordinates.latitude, coordinates.longitude);
        }
        if !place.alternative_names.is_empty() {
            println!("  Also known as: {}", place.alternative_names.join(", "));
        }
        for url in &place.urls {
            println!("  {}: {} ({})", url.kind, url.path, url.description);
        }
        let mut seen = HashSet::from([place.id]);
        print_ancestors(&graph, &place.parents, at, 1, &mut seen);
        let children = graph.children_of(place.id);
        if !children.is_empty() {
            println!("  Contains {} place(s)", children.len());
        }
    }

    Ok(())
}

/// Print the parent chain of a place, one level per indent.
fn print_ancestors(
    graph: &PlaceGraph,
    links: &[PlaceRef],
    at: Option<NaiveDate>,
    depth: usize,
    seen: &mut HashSet<PlaceId>,
) {
    for link in links {
        if at.is_some_and(|date| !link.is_valid_on(date)) {
            continue;
        }
        let indent = "  ".repeat(depth);
        let validity = link
            .span
            .map(|span| format!(" ({})", span))
            .unwrap_or_default();
        let Some(parent) = graph.get(link.parent) else {
            println!("{}<- {} (missing){}", indent, link.parent, validity);
            continue;
        };
        println!(
            "{}<- {} [{}]{}",
            indent, parent.name, parent.place_type, validity
        );
        if seen.insert(parent.id) {
            print_ancestors(graph, &parent.parents, at, depth + 1, seen);
            seen.remove(&parent.id);
        }
    }
}

fn cmd_validate(project_root: &Path) -> Result<()> {
    if !gbpn_core::storage::graph_exists(project_root) {
        anyhow::bail!("No place graph found. Run `gbpn import <ID>` first.");
    }

    let graph = gbpn_core::storage::load(project_root)?;
    let issues = gbpn_core::integrity::check(&graph);

    for issue in &issues {
        println!("WARN: {}", issue);
    }

    if issues.is_empty() {
        eprintln!("Graph is valid. No integrity issues found.");
        eprintln!(
            "  {} places, {} links",
            graph.places.len(),
            graph.places.values().map(|p| p.parents.len()).sum::<usize>()
        );
    } else {
        eprintln!("\nFound {} integrity issue(s).", issues.len());
    }

    Ok(())
}

fn cmd_info(project_root: &Path) -> Result<()> {
    if !gbpn_core::storage::graph_exists(project_root) {
        eprintln!("No place graph found. Run `gbpn import <ID>` first.");
        return Ok(());
    }

    let graph = gbpn_core::storage::load(project_root)?;

    println!("GBPN place graph v{}", graph.version);
    println!("Created: {}", graph.created_at);
    println!("Updated: {}", graph.updated_at);
    println!();
    println!("Places: {}", graph.metadata.total_places);
    println!("Parent links: {}", graph.metadata.total_links);
    println!("Lineage links: {}", graph.metadata.lineage_links);
    println!("Roots: {}", graph.roots().len());

    let counts = graph.count_by_type();
    if !counts.is_empty() {
        println!("\nBy type:");
        for (label, count) in &counts {
            println!("  {}: {}", label, count);
        }
    }

    if !graph.metadata.imported_ids.is_empty() {
        println!("\nImported GBPN IDs: {}", graph.metadata.imported_ids.join(", "));
    }

    Ok(())
}

fn cmd_config(project_root: &Path, init: bool) -> Result<()> {
    let config_path = gbpn_core::config::config_file(project_root);
    if init {
        if config_path.exists() {
            anyhow::bail!("{} already exists", config_path.display());
        }
        GbpnConfig::default().save(project_root)?;
        eprintln!("Wrote {}", config_path.display());
        return Ok(());
    }

    let config = GbpnConfig::load(project_root)?;
    print!(
        "{}",
        toml::to_string_pretty(&config).context("failed to serialize config")?
    );
    Ok(())
}
