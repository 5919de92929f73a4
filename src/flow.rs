//! Input/output flow of recipes and recipe groups
//!
//! A recipe's flow comes straight from the catalog. A group's flow is derived
//! from its children: both sides are summed per goods, then goods appearing
//! on both sides are netted unless the group links them.

use std::collections::{BTreeMap, BTreeSet};

/// Relative tolerance under which produced and consumed amounts cancel out.
const NET_EPSILON: f64 = 1e-9;

/// Per-minute quantities keyed by goods id.
pub type Quantities = BTreeMap<String, f64>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flow {
    /// Goods consumed from outside the subtree
    pub input: Quantities,
    /// Goods produced for outside the subtree
    pub output: Quantities,
}

impl Flow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty() && self.output.is_empty()
    }

    pub fn add_input(&mut self, goods: &str, amount: f64) {
        *self.input.entry(goods.to_string()).or_default() += amount;
    }

    pub fn add_output(&mut self, goods: &str, amount: f64) {
        *self.output.entry(goods.to_string()).or_default() += amount;
    }

    /// Sum `other` into this flow, side by side, without netting.
    pub fn merge(&mut self, other: &Flow) {
        for (goods, amount) in &other.input {
            self.add_input(goods, *amount);
        }
        for (goods, amount) in &other.output {
            self.add_output(goods, *amount);
        }
    }

    /// Output minus input for one goods.
    pub fn net(&self, goods: &str) -> f64 {
        self.output.get(goods).copied().unwrap_or(0.0) - self.input.get(goods).copied().unwrap_or(0.0)
    }

    pub fn scaled(&self, factor: f64) -> Flow {
        let scale = |q: &Quantities| q.iter().map(|(g, a)| (g.clone(), a * factor)).collect();
        Flow {
            input: scale(&self.input),
            output: scale(&self.output),
        }
    }
}

/// Flow of a group with the given child flows and linked goods.
pub fn aggregate<'a>(children: impl IntoIterator<Item = &'a Flow>, links: &BTreeSet<String>) -> Flow {
    let mut merged = Flow::new();
    for child in children {
        merged.merge(child);
    }

    let shared: Vec<String> = merged
        .input
        .keys()
        .filter(|goods| merged.output.contains_key(*goods) && !links.contains(*goods))
        .cloned()
        .collect();

    for goods in shared {
        let consumed = merged.input.remove(&goods).unwrap_or(0.0);
        let produced = merged.output.remove(&goods).unwrap_or(0.0);
        let remainder = produced - consumed;
        if remainder.abs() <= NET_EPSILON * produced.abs().max(consumed.abs()) {
            continue;
        }
        if remainder > 0.0 {
            merged.output.insert(goods, remainder);
        } else {
            merged.input.insert(goods, -remainder);
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn flow(input: &[(&str, f64)], output: &[(&str, f64)]) -> Flow {
        let mut f = Flow::new();
        for (g, a) in input {
            f.add_input(g, *a);
        }
        for (g, a) in output {
            f.add_output(g, *a);
        }
        f
    }

    #[test]
    fn internal_production_is_netted() {
        let producer = flow(&[("ore", 10.0)], &[("ingot", 100.0)]);
        let consumer = flow(&[("ingot", 60.0)], &[("plate", 60.0)]);
        let group = aggregate([&producer, &consumer], &BTreeSet::new());
        assert_eq!(group, flow(&[("ore", 10.0)], &[("ingot", 40.0), ("plate", 60.0)]));
    }

    #[test]
    fn shortfall_stays_on_the_input_side() {
        let producer = flow(&[], &[("ingot", 30.0)]);
        let consumer = flow(&[("ingot", 50.0)], &[]);
        let group = aggregate([&producer, &consumer], &BTreeSet::new());
        assert_eq!(group, flow(&[("ingot", 20.0)], &[]));
    }

    #[test]
    fn balanced_goods_disappear() {
        let producer = flow(&[], &[("steam", 0.1 + 0.2)]);
        let consumer = flow(&[("steam", 0.3)], &[]);
        let group = aggregate([&producer, &consumer], &BTreeSet::new());
        assert!(group.is_empty());
    }

    #[test]
    fn linked_goods_keep_both_raw_sides() {
        let producer = flow(&[], &[("ingot", 100.0)]);
        let consumer = flow(&[("ingot", 60.0)], &[]);
        let links = BTreeSet::from(["ingot".to_string()]);
        let group = aggregate([&producer, &consumer], &links);
        assert_eq!(group, flow(&[("ingot", 60.0)], &[("ingot", 100.0)]));
    }

    #[test]
    fn same_side_amounts_are_summed() {
        let a = flow(&[("water", 1000.0)], &[]);
        let b = flow(&[("water", 500.0)], &[]);
        let group = aggregate([&a, &b], &BTreeSet::new());
        assert_eq!(group.input["water"], 1500.0);
        assert_eq!(group.net("water"), -1500.0);
    }

    #[test]
    fn scaling_applies_to_both_sides() {
        let f = flow(&[("ore", 2.0)], &[("ingot", 1.0)]).scaled(4.0);
        assert_eq!(f, flow(&[("ore", 8.0)], &[("ingot", 4.0)]));
    }
}
