//! Catalog lookups consumed by the project model
//!
//! The project only ever asks the catalog three things: what a goods id is,
//! what a recipe flows at a given voltage tier, and which tiers a recipe can
//! run at.

use std::ops::RangeInclusive;
use std::path::Path;

use rusqlite::Connection;

use crate::db::{self, Result};
use crate::flow::Flow;
use crate::models::{Goods, MAX_TIER, Recipe, RecipeIo, tier_name};

/// Shortest craft time the game can express (one tick)
const MIN_DURATION_SECS: f64 = 0.05;

pub trait Catalog {
    fn goods(&self, id: &str) -> Result<Option<Goods>>;

    fn recipe(&self, id: &str) -> Result<Option<Recipe>>;

    /// Per-minute flow of one machine running `recipe_id` at `tier`.
    fn recipe_flow(&self, recipe_id: &str, tier: u8) -> Result<Option<Flow>>;

    fn voltage_tier_range(&self, recipe_id: &str) -> Result<Option<RangeInclusive<u8>>> {
        Ok(self.recipe(recipe_id)?.map(|r| r.min_tier.min(MAX_TIER)..=MAX_TIER))
    }
}

/// Tier indices paired with their display names, in ascending order.
pub fn tier_names(range: RangeInclusive<u8>) -> impl Iterator<Item = (u8, &'static str)> {
    range.map(|tier| (tier, tier_name(tier)))
}

/// Computes a recipe's per-minute flow. Every tier above the recipe's
/// minimum halves the craft time; tiers below it run at the minimum.
pub fn recipe_flow_at(recipe: &Recipe, inputs: &[RecipeIo], outputs: &[RecipeIo], tier: u8) -> Flow {
    let overclocks = tier.saturating_sub(recipe.min_tier);
    let crafts_per_min = 60.0 / recipe.duration_secs.max(MIN_DURATION_SECS) * 2f64.powi(overclocks as i32);

    let mut flow = Flow::new();
    for input in inputs {
        flow.add_input(&input.goods_id, input.amount * crafts_per_min);
    }
    for output in outputs {
        flow.add_output(&output.goods_id, output.amount * crafts_per_min);
    }
    flow
}

/// Catalog stored in a SQLite database
pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    pub fn new(conn: Connection) -> Result<Self> {
        db::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open(path: &Path) -> Result<Self> {
        Self::new(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Catalog for SqliteCatalog {
    fn goods(&self, id: &str) -> Result<Option<Goods>> {
        db::get_goods(&self.conn, id)
    }

    fn recipe(&self, id: &str) -> Result<Option<Recipe>> {
        db::get_recipe(&self.conn, id)
    }

    fn recipe_flow(&self, recipe_id: &str, tier: u8) -> Result<Option<Flow>> {
        let Some(recipe) = db::get_recipe(&self.conn, recipe_id)? else {
            return Ok(None);
        };
        let inputs = db::get_recipe_inputs(&self.conn, recipe_id)?;
        let outputs = db::get_recipe_outputs(&self.conn, recipe_id)?;
        Ok(Some(recipe_flow_at(&recipe, &inputs, &outputs, tier)))
    }
}
