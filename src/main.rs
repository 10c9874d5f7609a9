//! keeptree - inspect and rearrange credential group trees.
//!
//! Usage:
//!   keeptree tree LAYOUT                      Show the group tree
//!   keeptree search LAYOUT TERM               Search entries
//!   keeptree move LAYOUT GROUP DEST           Move a group, write the result
//!   keeptree events LAYOUT GROUP DEST         Move a group, show notifications
//!   keeptree reconcile TARGET SOURCE          Replay tombstones of SOURCE
//!   keeptree --help                           Show help

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};
use itertools::Itertools;
use tracing_subscriber::EnvFilter;

use keeptree_model::{CaseSensitivity, DatabaseId, EventRecorder, Forest, GroupId, TreeEvent};
use keeptree_ops::{
    DatabaseLayout, KeepLive, LastWriterWins, MergePolicy, ReconcileOptions, export,
    find_group_by_path, group_path, import, reconcile,
};

#[derive(Parser)]
#[command(
    name = "keeptree",
    version,
    about = "Inspect and rearrange credential group trees",
    long_about = "keeptree loads a JSON layout of a credential database and works on its \
                  group tree: showing resolved policies, searching entries, moving groups \
                  and replaying deletions from another copy."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the group tree with resolved search and auto-type flags
    Tree {
        /// Layout file
        layout: PathBuf,

        /// Maximum depth to display
        #[arg(short, long, default_value = "8")]
        depth: usize,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Search entries below a group
    Search {
        /// Layout file
        layout: PathBuf,

        /// Text to look for in titles, usernames, urls and notes
        term: String,

        /// Group to start from, as a path below the root
        #[arg(long, default_value = "/")]
        from: String,

        /// Match case exactly
        #[arg(short = 'c', long)]
        case_sensitive: bool,

        /// Only honor the start group's own searching flag
        #[arg(long)]
        no_inherit: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Move a group and write the resulting layout
    Move {
        /// Layout file
        layout: PathBuf,

        /// Path of the group to move
        group: String,

        /// Path of the new parent
        destination: String,

        /// Position among the new siblings (defaults to last)
        #[arg(short, long)]
        index: Option<usize>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Move a group and show the notifications it produces
    Events {
        /// Layout file
        layout: PathBuf,

        /// Path of the group to move
        group: String,

        /// Path of the new parent
        destination: String,

        /// Position among the new siblings (defaults to last)
        #[arg(short, long)]
        index: Option<usize>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Replay the deletions of one layout onto another
    Reconcile {
        /// Layout receiving the deletions
        target: PathBuf,

        /// Layout whose tombstones are replayed
        source: PathBuf,

        /// How to decide between a tombstone and a live object
        #[arg(short, long, default_value = "last-writer-wins")]
        policy: PolicyChoice,

        /// Report without changing anything
        #[arg(long)]
        dry_run: bool,

        /// Output file for the reconciled target (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum PolicyChoice {
    #[default]
    LastWriterWins,
    KeepLive,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("keeptree=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Tree {
            layout,
            depth,
            format,
        } => run_tree(&layout, depth, format)?,
        Command::Search {
            layout,
            term,
            from,
            case_sensitive,
            no_inherit,
            format,
        } => {
            let case = if case_sensitive {
                CaseSensitivity::Sensitive
            } else {
                CaseSensitivity::Insensitive
            };
            run_search(&layout, &term, &from, case, !no_inherit, format)?;
        }
        Command::Move {
            layout,
            group,
            destination,
            index,
            output,
        } => run_move(&layout, &group, &destination, index, output)?,
        Command::Events {
            layout,
            group,
            destination,
            index,
            format,
        } => run_events(&layout, &group, &destination, index, format)?,
        Command::Reconcile {
            target,
            source,
            policy,
            dry_run,
            output,
        } => run_reconcile(&target, &source, policy, dry_run, output)?,
    }

    Ok(())
}

/// Load a layout file into a fresh forest.
fn load(forest: &mut Forest, path: &Path) -> Result<DatabaseId> {
    let layout = DatabaseLayout::load(path)
        .wrap_err_with(|| format!("Failed to load {}", path.display()))?;
    let database = import(forest, &layout).wrap_err("Failed to build group tree")?;
    tracing::info!(path = %path.display(), groups = forest.group_count(), "loaded layout");
    Ok(database)
}

/// Print the group tree.
fn run_tree(path: &Path, max_depth: usize, format: OutputFormat) -> Result<()> {
    let mut forest = Forest::default();
    let database = load(&mut forest, path)?;

    match format {
        OutputFormat::Text => {
            let root = forest.root_group(database)?;
            println!();
            println!("{}", "─".repeat(70));
            println!(
                " {} - {} groups, {} entries",
                path.display(),
                forest.group_count(),
                forest.entry_count()
            );
            println!("{}", "─".repeat(70));
            println!();
            print_group(&forest, root, 0, max_depth)?;
        }
        OutputFormat::Json => {
            println!("{}", export(&forest, database)?.to_json_pretty()?);
        }
    }

    Ok(())
}

/// Print a group and its children.
fn print_group(forest: &Forest, group: GroupId, depth: usize, max_depth: usize) -> Result<()> {
    let Some(node) = forest.group(group) else {
        bail!("Group {group} vanished while printing");
    };
    let flag = |enabled: bool| if enabled { "on" } else { "off" };

    println!(
        "{}{}{:<40} {:>4} entries  search:{:<3} autotype:{}",
        "  ".repeat(depth),
        if node.children().is_empty() { "  " } else { "▼ " },
        truncate(node.name(), 40),
        node.entries().len(),
        flag(forest.resolve_searching_enabled(group)?),
        flag(forest.resolve_autotype_enabled(group)?),
    );

    if depth < max_depth {
        for child in node.children() {
            print_group(forest, *child, depth + 1, max_depth)?;
        }
    } else if !node.children().is_empty() {
        println!("{}  ... {} more", "  ".repeat(depth + 1), node.children().len());
    }
    Ok(())
}

/// Search entries and print the matches.
fn run_search(
    path: &Path,
    term: &str,
    from: &str,
    case: CaseSensitivity,
    resolve_inherit: bool,
    format: OutputFormat,
) -> Result<()> {
    let mut forest = Forest::default();
    let database = load(&mut forest, path)?;
    let start = find_group_by_path(&forest, database, from)?;
    let matches = forest.search(start, term, case, resolve_inherit)?;

    let rows = matches
        .iter()
        .filter_map(|id| forest.entry(*id))
        .map(|entry| -> Result<serde_json::Value> {
            let location = match entry.group() {
                Some(group) => group_path(&forest, group)?,
                None => String::new(),
            };
            Ok(serde_json::json!({
                "uuid": entry.uuid(),
                "title": entry.title(),
                "username": entry.username(),
                "url": entry.url(),
                "group": location,
            }))
        })
        .collect::<Result<Vec<_>>>()?;

    match format {
        OutputFormat::Text => {
            if rows.is_empty() {
                println!(" No entries match '{term}'.");
            } else {
                println!(" {} entries match '{}'", rows.len(), term);
                println!();
                for row in &rows {
                    println!(
                        "   {:<30} {:<20} {}",
                        truncate(row["title"].as_str().unwrap_or_default(), 30),
                        truncate(row["username"].as_str().unwrap_or_default(), 20),
                        row["group"].as_str().unwrap_or_default()
                    );
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    Ok(())
}

/// Resolve both paths and reparent, collecting the notifications.
fn apply_move(
    forest: &mut Forest,
    database: DatabaseId,
    group: &str,
    destination: &str,
    index: Option<usize>,
) -> Result<Vec<TreeEvent>> {
    let group = find_group_by_path(forest, database, group)?;
    let parent = find_group_by_path(forest, database, destination)?;

    let recorder = EventRecorder::new();
    let observer = forest.subscribe(recorder.clone());
    let result = forest.set_parent(group, parent, index);
    forest.unsubscribe(observer);
    result.wrap_err("Move rejected")?;

    Ok(recorder.take())
}

/// Move a group and write the resulting layout.
fn run_move(
    path: &Path,
    group: &str,
    destination: &str,
    index: Option<usize>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut forest = Forest::default();
    let database = load(&mut forest, path)?;
    let events = apply_move(&mut forest, database, group, destination, index)?;
    if events.is_empty() {
        eprintln!("Group already in place, nothing changed");
    }

    write_layout(&export(&forest, database)?, output)
}

/// Move a group and print the notifications in delivery order.
fn run_events(
    path: &Path,
    group: &str,
    destination: &str,
    index: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let mut forest = Forest::default();
    let database = load(&mut forest, path)?;
    let events = apply_move(&mut forest, database, group, destination, index)?;

    match format {
        OutputFormat::Text => {
            for (i, event) in events.iter().enumerate() {
                let name = forest
                    .group(event.group())
                    .map(|g| g.name().to_string())
                    .unwrap_or_default();
                println!(" {:>3}. {:<16} {}", i + 1, event.name(), name);
            }
            if events.is_empty() {
                println!(" No notifications.");
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
    }

    Ok(())
}

/// Replay tombstones and write the reconciled target.
fn run_reconcile(
    target: &Path,
    source: &Path,
    policy: PolicyChoice,
    dry_run: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut forest = Forest::default();
    let target_db = load(&mut forest, target)?;
    let source_db = load(&mut forest, source)?;

    let policy: &dyn MergePolicy = match policy {
        PolicyChoice::LastWriterWins => &LastWriterWins,
        PolicyChoice::KeepLive => &KeepLive,
    };
    let options = ReconcileOptions::builder().dry_run(dry_run).build()?;
    let report = reconcile(&mut forest, target_db, source_db, policy, &options)?;

    eprintln!(
        "Deleted {} entries and {} groups, kept {}, imported {} tombstones{}",
        report.deleted_entries.len(),
        report.deleted_groups.len(),
        report.kept.len(),
        report.tombstones_imported,
        if dry_run { " (dry run)" } else { "" }
    );
    if !report.kept.is_empty() {
        eprintln!("Kept: {}", report.kept.iter().join(", "));
    }

    if dry_run {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    write_layout(&export(&forest, target_db)?, output)
}

fn write_layout(layout: &DatabaseLayout, output: Option<PathBuf>) -> Result<()> {
    match output {
        Some(output_path) => {
            layout.save(&output_path)?;
            eprintln!("Written to {}", output_path.display());
        }
        None => {
            println!("{}", layout.to_json_pretty()?);
        }
    }
    Ok(())
}

/// Truncate a string to a maximum number of characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
