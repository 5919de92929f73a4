//! Plain-text rendering of a project
//!
//! Rendering is a full redraw from current project state every time; there
//! is no incremental patching.

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::flow::{Flow, Quantities};
use crate::models::tier_name;
use crate::project::{Node, Project};

/// Abbreviate large amounts: thousands above 100k, millions above 10M.
pub fn format_amount(amount: f64) -> String {
    if amount <= 100_000.0 {
        let fixed = format!("{:.2}", amount);
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    } else if amount <= 10_000_000.0 {
        format!("{}K", (amount / 1_000.0).round())
    } else {
        format!("{}M", (amount / 1_000_000.0).round())
    }
}

fn goods_name<C: Catalog + ?Sized>(catalog: &C, id: &str) -> Result<String, CatalogError> {
    Ok(catalog.goods(id)?.map_or_else(|| id.to_string(), |g| g.name))
}

/// Goods sorted by absolute amount, largest first.
fn format_quantities<C: Catalog + ?Sized>(catalog: &C, items: &Quantities) -> Result<String, CatalogError> {
    let mut sorted: Vec<(&String, &f64)> = items.iter().collect();
    sorted.sort_by(|(_, a), (_, b)| b.abs().partial_cmp(&a.abs()).unwrap_or(std::cmp::Ordering::Equal));

    let mut parts = Vec::with_capacity(sorted.len());
    for (goods, amount) in sorted {
        parts.push(format!("{} {}", format_amount(*amount), goods_name(catalog, goods)?));
    }
    Ok(parts.join(", "))
}

fn format_flow<C: Catalog + ?Sized>(catalog: &C, flow: &Flow) -> Result<String, CatalogError> {
    if flow.is_empty() {
        return Ok(String::new());
    }
    Ok(format!(
        "  [in: {} | out: {}]",
        format_quantities(catalog, &flow.input)?,
        format_quantities(catalog, &flow.output)?
    ))
}

/// Products with a non-zero target, largest target first, with how much of
/// each the recipe tree currently delivers.
pub fn render_products<C: Catalog + ?Sized>(project: &Project, catalog: &C) -> Result<String, CatalogError> {
    let mut balance: Vec<_> = project
        .product_balance()
        .into_iter()
        .filter(|b| b.target != 0.0)
        .collect();
    balance.sort_by(|a, b| b.target.partial_cmp(&a.target).unwrap_or(std::cmp::Ordering::Equal));

    let mut output = String::from("Products:\n");
    if balance.is_empty() {
        output.push_str("  (none)\n");
    }
    for b in balance {
        let surplus = b.surplus();
        let status = if surplus.abs() < 1e-9 {
            "met".to_string()
        } else if surplus > 0.0 {
            format!("+{}", format_amount(surplus))
        } else {
            format!("short {}", format_amount(-surplus))
        };
        output.push_str(&format!(
            "  #{} {} {}/min (producing {}, {})\n",
            b.iid,
            goods_name(catalog, &b.goods_id)?,
            format_amount(b.target),
            format_amount(b.produced),
            status
        ));
    }
    Ok(output)
}

/// The group tree, indented by depth. Collapsed groups hide their children.
pub fn render_tree<C: Catalog + ?Sized>(project: &Project, catalog: &C) -> Result<String, CatalogError> {
    let mut output = String::new();

    for visit in project.walk_visible() {
        let prefix = "  ".repeat(visit.depth);
        match visit.node {
            Node::Group(group) => {
                let marker = if visit.depth == 0 {
                    "="
                } else if group.collapsed {
                    ">"
                } else {
                    "v"
                };
                output.push_str(&format!(
                    "{}{} #{} {}{}\n",
                    prefix,
                    marker,
                    visit.iid,
                    group.name,
                    format_flow(catalog, group.flow())?
                ));
                if !group.links.is_empty() && (!group.collapsed || visit.depth == 0) {
                    let mut names = Vec::with_capacity(group.links.len());
                    for goods in &group.links {
                        names.push(goods_name(catalog, goods)?);
                    }
                    output.push_str(&format!("{}    links: {}\n", prefix, names.join(", ")));
                }
            }
            Node::Recipe(recipe) => {
                let label = match catalog.recipe(&recipe.recipe_id)? {
                    Some(def) => format!("[{}] {}", tier_name(recipe.voltage_tier), def.machine),
                    None => format!("Unknown recipe {}", recipe.recipe_id),
                };
                output.push_str(&format!(
                    "{}- #{} {}{}\n",
                    prefix,
                    visit.iid,
                    label,
                    format_flow(catalog, recipe.flow())?
                ));
            }
            Node::Page(_) | Node::Product(_) => {}
        }
    }

    Ok(output)
}

pub fn render_project<C: Catalog + ?Sized>(project: &Project, catalog: &C) -> Result<String, CatalogError> {
    Ok(format!(
        "{}\n{}",
        render_products(project, catalog)?,
        render_tree(project, catalog)?
    ))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::GoodsKind;
    use crate::testing::MemoryCatalog;

    #[test]
    fn large_amounts_are_abbreviated() {
        assert_eq!(format_amount(26.666666), "26.67");
        assert_eq!(format_amount(1600.0), "1600");
        assert_eq!(format_amount(100_000.0), "100000");
        assert_eq!(format_amount(250_400.0), "250K");
        assert_eq!(format_amount(10_000_000.0), "10000K");
        assert_eq!(format_amount(12_600_000.0), "13M");
        assert_eq!(format_amount(-5.5), "-5.5");
    }

    #[test]
    fn tree_rendering_respects_collapse() {
        let catalog = MemoryCatalog::new()
            .with_goods("water", GoodsKind::Fluid)
            .with_recipe("boil", 1, &[("water", 10.0)], &[("steam", 1600.0)]);
        let mut project = Project::new();
        let root = project.root_iid();
        let group = project.add_group(root, "Boilers").unwrap();
        project.add_recipe(group, "boil", 1).unwrap();
        project.add_link(group, "steam").unwrap();
        project.recompute(&catalog).unwrap();

        let expanded = render_tree(&project, &catalog).unwrap();
        assert_eq!(
            expanded,
            format!(
                "= #{root} Recipes  [in: 10 water | out: 1600 steam]\n\
                 \x20 v #{group} Boilers  [in: 10 water | out: 1600 steam]\n\
                 \x20     links: steam\n\
                 \x20   - #{} [LV] boil machine  [in: 10 water | out: 1600 steam]\n",
                project.group(group).unwrap().elements()[0]
            )
        );

        project.toggle_collapsed(group).unwrap();
        let collapsed = render_tree(&project, &catalog).unwrap();
        assert_eq!(collapsed.lines().count(), 2);
        assert!(collapsed.contains("> #"));
    }

    #[test]
    fn products_hide_zero_targets_and_sort_descending() {
        let catalog = MemoryCatalog::new();
        let mut project = Project::new();
        project.add_product("small", 1.0);
        project.add_product("zero", 0.0);
        project.add_product("big", 50.0);

        let text = render_products(&project, &catalog).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("big 50/min (producing 0, short 50)"));
        assert!(lines[2].contains("small"));
    }
}
