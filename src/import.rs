//! Catalog import from `.recipes` definition files
//!
//! Line format (one definition per line). A line starting with `#` is a
//! comment, and so is a `#` preceded by whitespace, except on `goods` lines
//! whose display name runs to the end of the line:
//!
//! ```text
//! goods iron_ingot item Iron Ingot
//! recipe bend_iron_plate "Bending Machine" 2.5 tier=LV
//! in iron_ingot 1
//! out iron_plate 1
//! ```
//!
//! `in`/`out` lines belong to the closest `recipe` line above them.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use rusqlite::Connection;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::db::{self, Result};
use crate::error::CatalogError;
use crate::models::{Goods, GoodsKind, Recipe, RecipeIo, parse_tier};

const SAMPLE_CATALOG: &str = include_str!("../data/sample.recipes");

/// Recipe with its inputs and outputs, before database insertion
#[derive(Debug)]
struct ParsedRecipe {
    recipe: Recipe,
    inputs: Vec<RecipeIo>,
    outputs: Vec<RecipeIo>,
}

#[derive(Debug, Default)]
struct ParsedFile {
    goods: Vec<Goods>,
    recipes: Vec<ParsedRecipe>,
    skipped: usize,
}

struct Patterns {
    goods: Regex,
    recipe: Regex,
    io: Regex,
    comment: Regex,
}

impl Patterns {
    fn new() -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            // goods <id> <item|fluid> <display name>
            goods: Regex::new(r"^goods\s+(\S+)\s+(item|fluid)\s+(.+)$")?,
            // recipe <id> "<machine>" <duration secs> [tier=<name|index>]
            recipe: Regex::new(r#"^recipe\s+(\S+)\s+"([^"]+)"\s+([\d.]+)(?:\s+tier=(\w+))?$"#)?,
            // in|out <goods id> <amount>
            io: Regex::new(r"^(in|out)\s+(\S+)\s+([\d.]+)$")?,
            comment: Regex::new(r"\s+#.*$")?,
        })
    }
}

fn parse_error(path: &Path, line: usize, message: impl Into<String>) -> CatalogError {
    CatalogError::Parse {
        path: path.to_path_buf(),
        line,
        message: message.into(),
    }
}

fn parse_number(path: &Path, line: usize, text: &str) -> Result<f64> {
    text.parse()
        .map_err(|_| parse_error(path, line, format!("invalid number {text:?}")))
}

fn parse_recipes_file(patterns: &Patterns, content: &str, path: &Path) -> Result<ParsedFile> {
    let mut parsed = ParsedFile::default();

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let full = raw.trim();
        if full.is_empty() || full.starts_with('#') {
            continue;
        }
        let line = patterns.comment.replace(full, "");

        if let Some(cap) = patterns.goods.captures(full) {
            let kind = GoodsKind::parse(&cap[2]).unwrap_or(GoodsKind::Item);
            parsed.goods.push(Goods {
                id: cap[1].to_string(),
                name: cap[3].trim().to_string(),
                kind,
            });
        } else if let Some(cap) = patterns.recipe.captures(&line) {
            let min_tier = match cap.get(4) {
                Some(tier) => parse_tier(tier.as_str())
                    .ok_or_else(|| parse_error(path, line_no, format!("unknown voltage tier {:?}", tier.as_str())))?,
                None => 0,
            };
            parsed.recipes.push(ParsedRecipe {
                recipe: Recipe {
                    id: cap[1].to_string(),
                    machine: cap[2].to_string(),
                    duration_secs: parse_number(path, line_no, &cap[3])?,
                    min_tier,
                },
                inputs: Vec::new(),
                outputs: Vec::new(),
            });
        } else if let Some(cap) = patterns.io.captures(&line) {
            let Some(current) = parsed.recipes.last_mut() else {
                return Err(parse_error(path, line_no, "ingredient before any recipe"));
            };
            let io = RecipeIo {
                recipe_id: current.recipe.id.clone(),
                goods_id: cap[2].to_string(),
                amount: parse_number(path, line_no, &cap[3])?,
            };
            if &cap[1] == "in" {
                current.inputs.push(io);
            } else {
                current.outputs.push(io);
            }
        } else {
            warn!(path = %path.display(), line = line_no, text = %line, "skipping unrecognized line");
            parsed.skipped += 1;
        }
    }

    Ok(parsed)
}

fn store(conn: &Connection, parsed: &ParsedFile, stats: &mut ImportStats) -> Result<()> {
    for goods in &parsed.goods {
        db::upsert_goods(conn, goods)?;
    }
    for entry in &parsed.recipes {
        db::upsert_recipe(conn, &entry.recipe)?;
        for input in &entry.inputs {
            db::insert_recipe_input(conn, input)?;
        }
        for output in &entry.outputs {
            db::insert_recipe_output(conn, output)?;
        }
    }
    stats.goods += parsed.goods.len();
    stats.recipes += parsed.recipes.len();
    stats.skipped += parsed.skipped;
    Ok(())
}

/// Find all `*.recipes` files below `dir`, in a stable order
pub fn find_recipe_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "recipes"))
        .collect();
    files.sort();
    files
}

/// Import every `.recipes` file below `dir` into the catalog.
///
/// A file that cannot be read or parsed is counted as an error and left out
/// entirely; the others are still imported.
pub fn import_directory(conn: &Connection, dir: &Path) -> Result<ImportStats> {
    let patterns = Patterns::new().map_err(|e| parse_error(dir, 0, e.to_string()))?;
    let mut stats = ImportStats::default();

    let files = find_recipe_files(dir);
    info!(dir = %dir.display(), files = files.len(), "importing recipe files");

    let tx = conn.unchecked_transaction()?;
    for path in &files {
        stats.files += 1;
        let parsed = fs::read_to_string(path)
            .map_err(|source| CatalogError::Read {
                path: path.clone(),
                source,
            })
            .and_then(|content| parse_recipes_file(&patterns, &content, path));
        match parsed {
            Ok(parsed) => store(&tx, &parsed, &mut stats)?,
            Err(e) => {
                warn!(error = %e, "failed to import file");
                stats.errors += 1;
            }
        }
    }
    tx.commit()?;

    info!(%stats, "import finished");
    Ok(stats)
}

/// Load the built-in sample catalog, replacing whatever is stored
pub fn load_sample(conn: &Connection) -> Result<ImportStats> {
    let patterns = Patterns::new().map_err(|e| parse_error(Path::new("sample"), 0, e.to_string()))?;
    let parsed = parse_recipes_file(&patterns, SAMPLE_CATALOG, Path::new("sample.recipes"))?;

    let tx = conn.unchecked_transaction()?;
    db::clear_catalog(&tx)?;
    let mut stats = ImportStats {
        files: 1,
        ..ImportStats::default()
    };
    store(&tx, &parsed, &mut stats)?;
    tx.commit()?;
    Ok(stats)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportStats {
    pub files: usize,
    pub goods: usize,
    pub recipes: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} goods and {} recipes from {} files. Skipped lines: {}, Errors: {}",
            self.goods, self.recipes, self.files, self.skipped, self.errors
        )
    }
}
