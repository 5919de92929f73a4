//! Catalog database schema and operations

use rusqlite::{Connection, OptionalExtension, Row};

use crate::error::CatalogError;
use crate::models::{Goods, GoodsKind, Recipe, RecipeIo};

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Items and fluids
        CREATE TABLE IF NOT EXISTS goods (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            kind TEXT NOT NULL
        );

        -- Recipe definitions; min_tier indexes the voltage tier table
        CREATE TABLE IF NOT EXISTS recipes (
            id TEXT PRIMARY KEY,
            machine TEXT NOT NULL,
            duration_secs REAL NOT NULL,
            min_tier INTEGER NOT NULL DEFAULT 0
        );

        -- Goods consumed per craft
        CREATE TABLE IF NOT EXISTS recipe_inputs (
            recipe_id TEXT,
            goods_id TEXT,
            amount REAL NOT NULL,
            PRIMARY KEY (recipe_id, goods_id)
        );

        -- Goods produced per craft
        CREATE TABLE IF NOT EXISTS recipe_outputs (
            recipe_id TEXT,
            goods_id TEXT,
            amount REAL NOT NULL,
            PRIMARY KEY (recipe_id, goods_id)
        );

        CREATE INDEX IF NOT EXISTS idx_recipe_outputs_goods ON recipe_outputs(goods_id);
        "#,
    )?;
    Ok(())
}

/// Insert or replace a goods entry
pub fn upsert_goods(conn: &Connection, goods: &Goods) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO goods (id, name, kind) VALUES (?1, ?2, ?3)",
        (&goods.id, &goods.name, goods.kind.as_str()),
    )?;
    Ok(())
}

/// Insert or replace a recipe, dropping any inputs/outputs it had before
pub fn upsert_recipe(conn: &Connection, recipe: &Recipe) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO recipes (id, machine, duration_secs, min_tier)
         VALUES (?1, ?2, ?3, ?4)",
        (&recipe.id, &recipe.machine, recipe.duration_secs, recipe.min_tier),
    )?;
    conn.execute("DELETE FROM recipe_inputs WHERE recipe_id = ?1", [&recipe.id])?;
    conn.execute("DELETE FROM recipe_outputs WHERE recipe_id = ?1", [&recipe.id])?;
    Ok(())
}

/// Insert a recipe input; repeated goods accumulate
pub fn insert_recipe_input(conn: &Connection, input: &RecipeIo) -> Result<()> {
    conn.execute(
        "INSERT INTO recipe_inputs (recipe_id, goods_id, amount) VALUES (?1, ?2, ?3)
         ON CONFLICT (recipe_id, goods_id) DO UPDATE SET amount = amount + excluded.amount",
        (&input.recipe_id, &input.goods_id, input.amount),
    )?;
    Ok(())
}

/// Insert a recipe output; repeated goods accumulate
pub fn insert_recipe_output(conn: &Connection, output: &RecipeIo) -> Result<()> {
    conn.execute(
        "INSERT INTO recipe_outputs (recipe_id, goods_id, amount) VALUES (?1, ?2, ?3)
         ON CONFLICT (recipe_id, goods_id) DO UPDATE SET amount = amount + excluded.amount",
        (&output.recipe_id, &output.goods_id, output.amount),
    )?;
    Ok(())
}

/// Clear the whole catalog (for re-import)
pub fn clear_catalog(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM recipe_outputs;
        DELETE FROM recipe_inputs;
        DELETE FROM recipes;
        DELETE FROM goods;
        "#,
    )?;
    Ok(())
}

fn goods_from_row(row: &Row<'_>) -> rusqlite::Result<Goods> {
    let kind: String = row.get(2)?;
    Ok(Goods {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: GoodsKind::parse(&kind).unwrap_or(GoodsKind::Item),
    })
}

fn recipe_from_row(row: &Row<'_>) -> rusqlite::Result<Recipe> {
    Ok(Recipe {
        id: row.get(0)?,
        machine: row.get(1)?,
        duration_secs: row.get(2)?,
        min_tier: row.get(3)?,
    })
}

pub fn get_goods(conn: &Connection, id: &str) -> Result<Option<Goods>> {
    let goods = conn
        .query_row("SELECT id, name, kind FROM goods WHERE id = ?1", [id], goods_from_row)
        .optional()?;
    Ok(goods)
}

pub fn get_recipe(conn: &Connection, id: &str) -> Result<Option<Recipe>> {
    let recipe = conn
        .query_row(
            "SELECT id, machine, duration_secs, min_tier FROM recipes WHERE id = ?1",
            [id],
            recipe_from_row,
        )
        .optional()?;
    Ok(recipe)
}

fn get_recipe_io(conn: &Connection, table: &str, recipe_id: &str) -> Result<Vec<RecipeIo>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT recipe_id, goods_id, amount FROM {table} WHERE recipe_id = ?1 ORDER BY goods_id"
    ))?;

    let rows = stmt.query_map([recipe_id], |row| {
        Ok(RecipeIo {
            recipe_id: row.get(0)?,
            goods_id: row.get(1)?,
            amount: row.get(2)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Get all inputs for a recipe
pub fn get_recipe_inputs(conn: &Connection, recipe_id: &str) -> Result<Vec<RecipeIo>> {
    get_recipe_io(conn, "recipe_inputs", recipe_id)
}

/// Get all outputs for a recipe
pub fn get_recipe_outputs(conn: &Connection, recipe_id: &str) -> Result<Vec<RecipeIo>> {
    get_recipe_io(conn, "recipe_outputs", recipe_id)
}

/// List all goods in the catalog
pub fn list_goods(conn: &Connection) -> Result<Vec<Goods>> {
    let mut stmt = conn.prepare("SELECT id, name, kind FROM goods ORDER BY name")?;
    let rows = stmt.query_map([], goods_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// List all recipes in the catalog
pub fn list_recipes(conn: &Connection) -> Result<Vec<Recipe>> {
    let mut stmt = conn.prepare(
        "SELECT id, machine, duration_secs, min_tier FROM recipes ORDER BY machine, id",
    )?;
    let rows = stmt.query_map([], recipe_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn io(recipe: &str, goods: &str, amount: f64) -> RecipeIo {
        RecipeIo {
            recipe_id: recipe.into(),
            goods_id: goods.into(),
            amount,
        }
    }

    #[test]
    fn recipe_round_trips_with_io() {
        let conn = conn();
        let recipe = Recipe {
            id: "bend_iron".into(),
            machine: "Bending Machine".into(),
            duration_secs: 5.0,
            min_tier: 1,
        };
        upsert_recipe(&conn, &recipe).unwrap();
        insert_recipe_input(&conn, &io("bend_iron", "iron_ingot", 1.0)).unwrap();
        insert_recipe_input(&conn, &io("bend_iron", "iron_ingot", 1.0)).unwrap();
        insert_recipe_output(&conn, &io("bend_iron", "iron_plate", 1.0)).unwrap();

        assert_eq!(get_recipe(&conn, "bend_iron").unwrap(), Some(recipe));
        assert_eq!(
            get_recipe_inputs(&conn, "bend_iron").unwrap(),
            vec![io("bend_iron", "iron_ingot", 2.0)]
        );
        assert_eq!(get_recipe_outputs(&conn, "bend_iron").unwrap().len(), 1);
        assert_eq!(get_recipe(&conn, "missing").unwrap(), None);
    }

    #[test]
    fn replacing_a_recipe_drops_its_old_io() {
        let conn = conn();
        let recipe = Recipe {
            id: "r".into(),
            machine: "Furnace".into(),
            duration_secs: 1.0,
            min_tier: 0,
        };
        upsert_recipe(&conn, &recipe).unwrap();
        insert_recipe_input(&conn, &io("r", "ore", 1.0)).unwrap();
        upsert_recipe(&conn, &recipe).unwrap();
        assert!(get_recipe_inputs(&conn, "r").unwrap().is_empty());
    }

    #[test]
    fn clear_empties_everything() {
        let conn = conn();
        upsert_goods(
            &conn,
            &Goods {
                id: "water".into(),
                name: "Water".into(),
                kind: GoodsKind::Fluid,
            },
        )
        .unwrap();
        assert_eq!(list_goods(&conn).unwrap().len(), 1);
        assert_eq!(get_goods(&conn, "water").unwrap().map(|g| g.kind), Some(GoodsKind::Fluid));
        clear_catalog(&conn).unwrap();
        assert!(list_goods(&conn).unwrap().is_empty());
        assert!(list_recipes(&conn).unwrap().is_empty());
    }
}
