//! GregTech production planner CLI

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use gt_planner::catalog::{Catalog, SqliteCatalog, tier_names};
use gt_planner::{db, import, render, script, session::Session};

#[derive(Parser)]
#[command(name = "gt-planner")]
#[command(about = "Production planner for GregTech recipe chains")]
struct Cli {
    /// Path to the SQLite catalog database
    #[arg(short, long, default_value = "gt_catalog.db")]
    database: PathBuf,

    /// Log more (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize empty database with schema
    Init,

    /// Load the built-in sample catalog
    LoadSample,

    /// Import `.recipes` files from a directory tree
    Import {
        dir: PathBuf,

        /// Clear the catalog before importing
        #[arg(long)]
        clear: bool,
    },

    /// List all goods in the catalog
    ListGoods,

    /// List all recipes in the catalog
    ListRecipes,

    /// Show details for a specific recipe
    Recipe {
        /// Recipe ID
        id: String,
    },

    /// Replay an event script against a fresh project
    Run {
        /// Script file; reads stdin when omitted
        script: Option<PathBuf>,

        /// Only print the project once, after the last event
        #[arg(short, long)]
        quiet: bool,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let catalog = SqliteCatalog::open(&cli.database)
        .with_context(|| format!("opening catalog {}", cli.database.display()))?;
    let conn = catalog.connection();

    match cli.command {
        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            let stats = import::load_sample(conn)?;
            println!("{}", stats);
        }

        Commands::Import { dir, clear } => {
            if clear {
                println!("Clearing existing catalog...");
                db::clear_catalog(conn)?;
            }
            let stats = import::import_directory(conn, &dir)
                .with_context(|| format!("importing {}", dir.display()))?;
            println!("\n{}", stats);
        }

        Commands::ListGoods => {
            let goods = db::list_goods(conn)?;
            if goods.is_empty() {
                println!("No goods in database. Run 'import' or 'load-sample' first.");
            } else {
                println!("{:<24} {:<6} Name", "ID", "Kind");
                println!("{}", "-".repeat(50));
                for g in goods {
                    println!("{:<24} {:<6} {}", g.id, g.kind.as_str(), g.name);
                }
            }
        }

        Commands::ListRecipes => {
            let recipes = db::list_recipes(conn)?;
            if recipes.is_empty() {
                println!("No recipes in database. Run 'import' or 'load-sample' first.");
            } else {
                println!("{:<24} {:<28} {:>8} {:>5}", "ID", "Machine", "Time (s)", "Tier");
                println!("{}", "-".repeat(68));
                for r in recipes {
                    println!(
                        "{:<24} {:<28} {:>8} {:>5}",
                        r.id,
                        r.machine,
                        r.duration_secs,
                        gt_planner::models::tier_name(r.min_tier)
                    );
                }
            }
        }

        Commands::Recipe { id } => {
            let Some(recipe) = catalog.recipe(&id)? else {
                println!("Recipe '{}' not found", id);
                return Ok(());
            };
            println!("Recipe: {}", recipe.id);
            println!("  Machine: {}", recipe.machine);
            println!("  Duration: {}s", recipe.duration_secs);
            if let Some(range) = catalog.voltage_tier_range(&id)? {
                let names: Vec<&str> = tier_names(range).map(|(_, name)| name).collect();
                println!("  Tiers: {}", names.join(" "));
            }

            let inputs = db::get_recipe_inputs(conn, &id)?;
            if !inputs.is_empty() {
                println!("  Inputs:");
                for i in inputs {
                    println!("    {} x {}", i.goods_id, i.amount);
                }
            }
            let outputs = db::get_recipe_outputs(conn, &id)?;
            if !outputs.is_empty() {
                println!("  Outputs:");
                for o in outputs {
                    println!("    {} x {}", o.goods_id, o.amount);
                }
            }
        }

        Commands::Run { script: path, quiet } => {
            let text = match &path {
                Some(path) => fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut text = String::new();
                    io::stdin().read_to_string(&mut text).context("reading script from stdin")?;
                    text
                }
            };
            let commands = script::parse_script(&text)?;

            let mut session = Session::new(catalog);
            if !quiet {
                // listeners outlive this borrow of the catalog, so they get their own connection
                let listener_catalog = SqliteCatalog::open(&cli.database)
                    .with_context(|| format!("opening catalog {}", cli.database.display()))?;
                session.on_project_change(move |project| match render::render_project(project, &listener_catalog) {
                    Ok(text) => println!("{}", text),
                    Err(e) => warn!(error = %e, "failed to render project"),
                });
            }

            let stats = script::run_script(&mut session, &commands, |project, catalog| {
                match render::render_project(project, catalog) {
                    Ok(text) => println!("{}", text),
                    Err(e) => warn!(error = %e, "failed to render project"),
                }
            })?;

            if quiet {
                println!("{}", render::render_project(session.project(), session.catalog())?);
            }
            println!("{} events applied, {} ignored", stats.applied, stats.ignored);
        }
    }

    Ok(())
}
