//! Test fixtures shared across modules

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use crate::catalog::{Catalog, recipe_flow_at};
use crate::db::Result;
use crate::error::CatalogError;
use crate::flow::Flow;
use crate::models::{Goods, GoodsKind, Recipe, RecipeIo};
use crate::project::{Node, Project};
use crate::registry::Iid;

/// Catalog held in memory, for model tests that do not need SQLite.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    goods: HashMap<String, Goods>,
    recipes: HashMap<String, (Recipe, Vec<RecipeIo>, Vec<RecipeIo>)>,
    /// Recipes that exist but whose flow lookup fails
    broken: HashSet<String>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_goods(mut self, id: &str, kind: GoodsKind) -> Self {
        self.goods.insert(
            id.to_string(),
            Goods {
                id: id.to_string(),
                name: id.to_string(),
                kind,
            },
        );
        self
    }

    /// Adds a recipe whose one-minute flow at `min_tier` is exactly the
    /// given amounts.
    pub fn with_recipe(mut self, id: &str, min_tier: u8, inputs: &[(&str, f64)], outputs: &[(&str, f64)]) -> Self {
        let io = |list: &[(&str, f64)]| {
            list.iter()
                .map(|(goods, amount)| RecipeIo {
                    recipe_id: id.to_string(),
                    goods_id: goods.to_string(),
                    amount: *amount,
                })
                .collect::<Vec<_>>()
        };
        let recipe = Recipe {
            id: id.to_string(),
            machine: format!("{id} machine"),
            duration_secs: 60.0,
            min_tier,
        };
        self.recipes.insert(id.to_string(), (recipe, io(inputs), io(outputs)));
        self
    }

    /// Adds a recipe that resolves but whose flow lookup always fails.
    pub fn with_broken_recipe(self, id: &str) -> Self {
        let mut catalog = self.with_recipe(id, 0, &[], &[]);
        catalog.broken.insert(id.to_string());
        catalog
    }
}

impl Catalog for MemoryCatalog {
    fn goods(&self, id: &str) -> Result<Option<Goods>> {
        Ok(self.goods.get(id).cloned())
    }

    fn recipe(&self, id: &str) -> Result<Option<Recipe>> {
        Ok(self.recipes.get(id).map(|(recipe, ..)| recipe.clone()))
    }

    fn recipe_flow(&self, recipe_id: &str, tier: u8) -> Result<Option<Flow>> {
        if self.broken.contains(recipe_id) {
            return Err(CatalogError::Parse {
                path: PathBuf::from("memory"),
                line: 0,
                message: format!("recipe {recipe_id} is broken"),
            });
        }
        Ok(self
            .recipes
            .get(recipe_id)
            .map(|(recipe, inputs, outputs)| recipe_flow_at(recipe, inputs, outputs, tier)))
    }
}

/// Panics unless parent links and child lists agree and every node is
/// reachable from the page or the root group exactly once.
pub fn assert_consistent(project: &Project) {
    let page = project.page_iid();
    let root = project.root_iid();
    assert_eq!(project.parent_of(page), None);
    assert_eq!(project.parent_of(root), None);

    for iid in project.iids() {
        if iid == page || iid == root {
            continue;
        }
        let parent = project
            .parent_of(iid)
            .unwrap_or_else(|| panic!("{iid} has no parent"));
        let siblings: &[Iid] = match project.node(parent) {
            Some(Node::Group(group)) => group.elements(),
            Some(Node::Page(p)) => p.products(),
            other => panic!("{iid} has parent {parent} of unexpected kind {other:?}"),
        };
        let count = siblings.iter().filter(|s| **s == iid).count();
        assert_eq!(count, 1, "{iid} listed {count} times under {parent}");
    }

    let mut reached: BTreeMap<Iid, usize> = BTreeMap::new();
    for visit in project.walk() {
        *reached.entry(visit.iid).or_default() += 1;
    }
    *reached.entry(page).or_default() += 1;
    for product in project.page().products() {
        *reached.entry(*product).or_default() += 1;
    }
    assert!(reached.values().all(|n| *n == 1), "node reached twice: {reached:?}");
    assert_eq!(reached.len(), project.node_count(), "orphaned nodes");
}
