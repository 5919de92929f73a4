//! Action dispatch: verbs attached to rendered elements, mapped to project
//! mutations.
//!
//! A handler first checks that the target (and, for deletions, its parent)
//! is the node variant it expects. Anything else is ignored without error,
//! since the UI may still show nodes that a previous event already removed.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::error::{CatalogError, TreeError};
use crate::models::MAX_TIER;
use crate::project::{NEW_GROUP_NAME, NodeKind, Project};
use crate::registry::Iid;

/// The input event that fired an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Click,
    /// A form field committed a new value
    Change(String),
    /// The goods/recipe browser returned a choice
    Select(String),
}

/// What the project needs after an action ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ignored,
    /// Mutated without any notification
    Mutated,
    /// Display state changed; re-render without recomputing flows
    Redraw,
    Recompute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    DeleteProduct,
    UpdateAmount,
    AddRecipe,
    AddGroup,
    ToggleCollapse,
    AddProduct,
    DeleteRecipe,
    DeleteGroup,
    UpdateGroupName,
    UpdateVoltageTier,
    AddLink,
    RemoveLink,
}

pub const VERBS: [(&str, Action); 12] = [
    ("delete_product", Action::DeleteProduct),
    ("update_amount", Action::UpdateAmount),
    ("add_recipe", Action::AddRecipe),
    ("add_group", Action::AddGroup),
    ("toggle_collapse", Action::ToggleCollapse),
    ("add_product", Action::AddProduct),
    ("delete_recipe", Action::DeleteRecipe),
    ("delete_group", Action::DeleteGroup),
    ("update_group_name", Action::UpdateGroupName),
    ("update_voltage_tier", Action::UpdateVoltageTier),
    ("add_link", Action::AddLink),
    ("remove_link", Action::RemoveLink),
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action verb {0:?}")]
pub struct UnknownVerb(pub String);

impl FromStr for Action {
    type Err = UnknownVerb;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VERBS
            .iter()
            .find(|(verb, _)| *verb == s)
            .map(|(_, action)| *action)
            .ok_or_else(|| UnknownVerb(s.to_string()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = VERBS
            .iter()
            .find(|(_, action)| action == self)
            .map_or("?", |(verb, _)| verb);
        f.write_str(verb)
    }
}

fn commit<T>(result: Result<T, TreeError>, outcome: Outcome) -> Outcome {
    match result {
        Ok(_) => outcome,
        Err(e) => {
            debug!(error = %e, "action rejected by project tree");
            Outcome::Ignored
        }
    }
}

impl Action {
    /// Apply the action to `target`, whose parent is `parent`.
    ///
    /// Catalog errors propagate; everything else that does not fit is
    /// reported as [`Outcome::Ignored`].
    pub fn apply<C: Catalog + ?Sized>(
        self,
        project: &mut Project,
        catalog: &C,
        target: Iid,
        parent: Option<Iid>,
        trigger: &Trigger,
    ) -> Result<Outcome, CatalogError> {
        let kind = project.node(target).map(|n| n.kind());
        let parent_kind = parent.and_then(|p| project.node(p)).map(|n| n.kind());

        let outcome = match (self, kind, parent, trigger) {
            (Action::DeleteProduct, Some(NodeKind::Product), Some(parent), _)
                if parent_kind == Some(NodeKind::Page) =>
            {
                commit(project.remove_child(parent, target), Outcome::Recompute)
            }

            (Action::UpdateAmount, Some(NodeKind::Product), _, Trigger::Change(value)) => {
                match value.trim().parse::<f64>() {
                    Ok(amount) if amount.is_finite() => {
                        commit(project.set_product_amount(target, amount), Outcome::Recompute)
                    }
                    _ => {
                        warn!(%target, value = %value, "ignoring non-numeric product amount");
                        Outcome::Ignored
                    }
                }
            }

            (Action::AddRecipe, Some(NodeKind::Group), _, Trigger::Select(recipe_id)) => {
                match catalog.recipe(recipe_id)? {
                    Some(recipe) => commit(
                        project.add_recipe(target, &recipe.id, recipe.min_tier),
                        Outcome::Recompute,
                    ),
                    None => {
                        warn!(%recipe_id, "selected recipe is not in the catalog");
                        Outcome::Ignored
                    }
                }
            }

            (Action::AddGroup, Some(NodeKind::Group), _, _) => {
                commit(project.add_group(target, NEW_GROUP_NAME), Outcome::Recompute)
            }

            (Action::ToggleCollapse, Some(NodeKind::Group), _, _) => {
                commit(project.toggle_collapsed(target), Outcome::Redraw)
            }

            (Action::AddProduct, Some(NodeKind::Page), _, Trigger::Select(goods_id)) => {
                match catalog.goods(goods_id)? {
                    Some(goods) => {
                        project.add_product(&goods.id, goods.default_product_amount());
                        Outcome::Recompute
                    }
                    None => {
                        warn!(%goods_id, "selected goods is not in the catalog");
                        Outcome::Ignored
                    }
                }
            }

            (Action::DeleteRecipe, Some(NodeKind::Recipe), Some(parent), _)
            | (Action::DeleteGroup, Some(NodeKind::Group), Some(parent), _)
                if parent_kind == Some(NodeKind::Group) =>
            {
                commit(project.remove_child(parent, target), Outcome::Recompute)
            }

            (Action::UpdateGroupName, Some(NodeKind::Group), _, Trigger::Change(name)) => {
                commit(project.rename_group(target, name), Outcome::Mutated)
            }

            (Action::UpdateVoltageTier, Some(NodeKind::Recipe), _, Trigger::Change(value)) => {
                self.update_voltage_tier(project, catalog, target, value)?
            }

            (Action::AddLink, Some(NodeKind::Group), _, Trigger::Select(goods_id)) => {
                match project.add_link(target, goods_id) {
                    Ok(true) => Outcome::Recompute,
                    other => commit(other, Outcome::Ignored),
                }
            }

            (Action::RemoveLink, Some(NodeKind::Group), _, Trigger::Select(goods_id)) => {
                match project.remove_link(target, goods_id) {
                    Ok(true) => Outcome::Recompute,
                    other => commit(other, Outcome::Ignored),
                }
            }

            _ => {
                debug!(action = %self, %target, ?kind, ?parent_kind, ?trigger, "action does not apply");
                Outcome::Ignored
            }
        };
        Ok(outcome)
    }

    fn update_voltage_tier<C: Catalog + ?Sized>(
        self,
        project: &mut Project,
        catalog: &C,
        target: Iid,
        value: &str,
    ) -> Result<Outcome, CatalogError> {
        let Ok(requested) = value.trim().parse::<i64>() else {
            warn!(%target, value = %value, "ignoring non-integer voltage tier");
            return Ok(Outcome::Ignored);
        };
        let Some(recipe) = project.recipe(target) else {
            return Ok(Outcome::Ignored);
        };
        let range = catalog
            .voltage_tier_range(&recipe.recipe_id)?
            .unwrap_or(0..=MAX_TIER);
        let tier = requested.clamp(i64::from(*range.start()), i64::from(*range.end())) as u8;
        Ok(commit(project.set_voltage_tier(target, tier), Outcome::Recompute))
    }
}
