//! Project model: products, recipes and nested recipe groups
//!
//! All nodes live in one [`Registry`] keyed by iid. Containment is stored
//! twice and kept in step by every mutation here: each group lists its
//! children in order, and each child records its parent's iid.

use std::collections::{BTreeSet, HashMap};

use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::error::{CatalogError, TreeError};
use crate::flow::{Flow, aggregate};
use crate::registry::{Iid, Registry};

pub const ROOT_GROUP_NAME: &str = "Recipes";
pub const NEW_GROUP_NAME: &str = "Group";

#[derive(Debug, Clone, PartialEq)]
pub struct PageModel {
    products: Vec<Iid>,
    root_group: Iid,
}

impl PageModel {
    pub fn products(&self) -> &[Iid] {
        &self.products
    }

    pub fn root_group(&self) -> Iid {
        self.root_group
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductModel {
    pub goods_id: String,
    /// Target rate per minute; negative means a required external input
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecipeModel {
    pub recipe_id: String,
    pub voltage_tier: u8,
    flow: Flow,
}

impl RecipeModel {
    pub fn new(recipe_id: impl Into<String>, voltage_tier: u8) -> Self {
        Self {
            recipe_id: recipe_id.into(),
            voltage_tier,
            flow: Flow::new(),
        }
    }

    pub fn flow(&self) -> &Flow {
        &self.flow
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupModel {
    pub name: String,
    pub collapsed: bool,
    /// Goods kept visible on the group boundary instead of being netted
    pub links: BTreeSet<String>,
    elements: Vec<Iid>,
    flow: Flow,
}

impl GroupModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collapsed: false,
            links: BTreeSet::new(),
            elements: Vec::new(),
            flow: Flow::new(),
        }
    }

    pub fn elements(&self) -> &[Iid] {
        &self.elements
    }

    pub fn flow(&self) -> &Flow {
        &self.flow
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Page,
    Product,
    Recipe,
    Group,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Page(PageModel),
    Product(ProductModel),
    Recipe(RecipeModel),
    Group(GroupModel),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Page(_) => NodeKind::Page,
            Node::Product(_) => NodeKind::Product,
            Node::Recipe(_) => NodeKind::Recipe,
            Node::Group(_) => NodeKind::Group,
        }
    }

    /// Flow of recipes and groups; pages and products have none.
    pub fn flow(&self) -> Option<&Flow> {
        match self {
            Node::Recipe(r) => Some(&r.flow),
            Node::Group(g) => Some(&g.flow),
            Node::Page(_) | Node::Product(_) => None,
        }
    }

    fn is_element(&self) -> bool {
        matches!(self, Node::Recipe(_) | Node::Group(_))
    }
}

/// Where a node lands inside its new parent group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    End,
    Before(Iid),
}

/// One step of a depth-first traversal of the group tree.
#[derive(Debug, Clone, Copy)]
pub struct Visit<'a> {
    pub depth: usize,
    pub iid: Iid,
    pub node: &'a Node,
}

pub struct Walk<'a> {
    project: &'a Project,
    stack: Vec<(usize, Iid)>,
    skip_collapsed: bool,
}

impl<'a> Iterator for Walk<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (depth, iid) = self.stack.pop()?;
            let Some(node) = self.project.nodes.get(iid) else {
                continue;
            };
            if let Node::Group(group) = node {
                let expand = !(self.skip_collapsed && group.collapsed && depth > 0);
                if expand {
                    self.stack
                        .extend(group.elements.iter().rev().map(|child| (depth + 1, *child)));
                }
            }
            return Some(Visit { depth, iid, node });
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductBalance {
    pub iid: Iid,
    pub goods_id: String,
    pub target: f64,
    /// Net output of the root group for this goods
    pub produced: f64,
}

impl ProductBalance {
    pub fn surplus(&self) -> f64 {
        self.produced - self.target
    }
}

#[derive(Debug, Clone)]
pub struct Project {
    nodes: Registry<Node>,
    page: Iid,
    root: Iid,
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

impl Project {
    pub fn new() -> Self {
        let mut nodes = Registry::new();
        let root = nodes.register(Node::Group(GroupModel::new(ROOT_GROUP_NAME)), None);
        let page = nodes.register(
            Node::Page(PageModel {
                products: Vec::new(),
                root_group: root,
            }),
            None,
        );
        Self { nodes, page, root }
    }

    pub fn page_iid(&self) -> Iid {
        self.page
    }

    pub fn root_iid(&self) -> Iid {
        self.root
    }

    /// Look up a node and its parent's iid.
    pub fn resolve(&self, iid: Iid) -> Option<(&Node, Option<Iid>)> {
        self.nodes.resolve(iid)
    }

    pub fn node(&self, iid: Iid) -> Option<&Node> {
        self.nodes.get(iid)
    }

    pub fn parent_of(&self, iid: Iid) -> Option<Iid> {
        self.nodes.parent_of(iid)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn iids(&self) -> impl Iterator<Item = Iid> + '_ {
        self.nodes.iids()
    }

    pub fn page(&self) -> &PageModel {
        match self.nodes.get(self.page) {
            Some(Node::Page(page)) => page,
            _ => unreachable!("project page is always registered"),
        }
    }

    pub fn root_group(&self) -> &GroupModel {
        match self.nodes.get(self.root) {
            Some(Node::Group(group)) => group,
            _ => unreachable!("root group is always registered"),
        }
    }

    pub fn group(&self, iid: Iid) -> Option<&GroupModel> {
        match self.nodes.get(iid)? {
            Node::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn recipe(&self, iid: Iid) -> Option<&RecipeModel> {
        match self.nodes.get(iid)? {
            Node::Recipe(recipe) => Some(recipe),
            _ => None,
        }
    }

    pub fn product(&self, iid: Iid) -> Option<&ProductModel> {
        match self.nodes.get(iid)? {
            Node::Product(product) => Some(product),
            _ => None,
        }
    }

    pub fn flow(&self, iid: Iid) -> Option<&Flow> {
        self.nodes.get(iid)?.flow()
    }

    /// Products in page order.
    pub fn products(&self) -> impl Iterator<Item = (Iid, &ProductModel)> + '_ {
        self.page()
            .products
            .iter()
            .filter_map(|iid| self.product(*iid).map(|p| (*iid, p)))
    }

    /// Depth-first traversal of the whole group tree, root first.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            project: self,
            stack: vec![(0, self.root)],
            skip_collapsed: false,
        }
    }

    /// Like [`Project::walk`] but does not descend into collapsed groups.
    pub fn walk_visible(&self) -> Walk<'_> {
        Walk {
            project: self,
            stack: vec![(0, self.root)],
            skip_collapsed: true,
        }
    }

    /// Whether `ancestor` lies on the parent chain of `iid` (or is `iid`).
    ///
    /// Walks upward from `iid`, so the cost is bounded by its depth.
    pub fn is_ancestor_or_self(&self, ancestor: Iid, iid: Iid) -> bool {
        let mut current = Some(iid);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.nodes.parent_of(c);
        }
        false
    }

    fn group_mut(&mut self, iid: Iid) -> Result<&mut GroupModel, TreeError> {
        match self.nodes.get_mut(iid) {
            Some(Node::Group(group)) => Ok(group),
            Some(_) => Err(TreeError::NotAGroup(iid)),
            None => Err(TreeError::NotFound(iid)),
        }
    }

    fn page_mut(&mut self) -> &mut PageModel {
        match self.nodes.get_mut(self.page) {
            Some(Node::Page(page)) => page,
            _ => unreachable!("project page is always registered"),
        }
    }

    fn require_group(&self, iid: Iid) -> Result<&GroupModel, TreeError> {
        match self.nodes.get(iid) {
            Some(Node::Group(group)) => Ok(group),
            Some(_) => Err(TreeError::NotAGroup(iid)),
            None => Err(TreeError::NotFound(iid)),
        }
    }

    fn insert_index(&self, parent: Iid, position: Position) -> Result<usize, TreeError> {
        let group = self.require_group(parent)?;
        match position {
            Position::End => Ok(group.elements.len()),
            Position::Before(sibling) => group
                .elements
                .iter()
                .position(|e| *e == sibling)
                .ok_or(TreeError::WrongParent {
                    node: sibling,
                    parent,
                }),
        }
    }

    /// Register a new recipe or group under `parent`.
    pub fn insert_child(&mut self, parent: Iid, node: Node, position: Position) -> Result<Iid, TreeError> {
        let index = self.insert_index(parent, position)?;
        if !node.is_element() {
            return Err(TreeError::NotDraggable(parent));
        }
        if let Node::Group(group) = &node {
            debug_assert!(group.elements.is_empty(), "new groups start empty");
        }
        let kind = node.kind();
        let iid = self.nodes.register(node, Some(parent));
        self.group_mut(parent)?.elements.insert(index, iid);
        info!(%iid, %parent, ?kind, "inserted node");
        Ok(iid)
    }

    pub fn add_recipe(&mut self, parent: Iid, recipe_id: &str, voltage_tier: u8) -> Result<Iid, TreeError> {
        self.insert_child(parent, Node::Recipe(RecipeModel::new(recipe_id, voltage_tier)), Position::End)
    }

    pub fn add_group(&mut self, parent: Iid, name: &str) -> Result<Iid, TreeError> {
        self.insert_child(parent, Node::Group(GroupModel::new(name)), Position::End)
    }

    pub fn add_product(&mut self, goods_id: &str, amount: f64) -> Iid {
        let product = Node::Product(ProductModel {
            goods_id: goods_id.to_string(),
            amount,
        });
        let iid = self.nodes.register(product, Some(self.page));
        self.page_mut().products.push(iid);
        info!(%iid, goods_id, amount, "added product");
        iid
    }

    /// Permanently remove `iid` from `parent`, unregistering its subtree.
    pub fn remove_child(&mut self, parent: Iid, iid: Iid) -> Result<Node, TreeError> {
        if iid == self.root || iid == self.page {
            return Err(TreeError::RootImmovable);
        }
        if !self.nodes.contains(iid) {
            return Err(TreeError::NotFound(iid));
        }
        if self.nodes.parent_of(iid) != Some(parent) {
            return Err(TreeError::WrongParent { node: iid, parent });
        }

        match self.nodes.get_mut(parent) {
            Some(Node::Group(group)) => group.elements.retain(|e| *e != iid),
            Some(Node::Page(page)) => page.products.retain(|p| *p != iid),
            Some(_) => return Err(TreeError::NotAGroup(parent)),
            None => return Err(TreeError::NotFound(parent)),
        }

        let mut pending = vec![iid];
        let mut removed = None;
        while let Some(next) = pending.pop() {
            let Some(node) = self.nodes.unregister(next) else {
                continue;
            };
            if let Node::Group(group) = &node {
                pending.extend(group.elements.iter().copied());
            }
            if next == iid {
                removed = Some(node);
            }
        }
        info!(%iid, %parent, "removed node");
        removed.ok_or(TreeError::NotFound(iid))
    }

    /// Detach `iid` from its current group and attach it under `new_parent`.
    ///
    /// Every check runs before anything is touched, so a rejected move
    /// leaves the project exactly as it was.
    pub fn move_node(&mut self, iid: Iid, new_parent: Iid, position: Position) -> Result<(), TreeError> {
        if iid == self.root {
            return Err(TreeError::RootImmovable);
        }
        match self.nodes.get(iid) {
            Some(node) if node.is_element() => {}
            Some(_) => return Err(TreeError::NotDraggable(iid)),
            None => return Err(TreeError::NotFound(iid)),
        }
        self.require_group(new_parent)?;
        if self.is_ancestor_or_self(iid, new_parent) {
            return Err(TreeError::Cycle {
                node: iid,
                parent: new_parent,
            });
        }
        if position == Position::Before(iid) {
            return Err(TreeError::Cycle {
                node: iid,
                parent: new_parent,
            });
        }
        // validate the sibling before detaching
        self.insert_index(new_parent, position)?;
        let old_parent = self.nodes.parent_of(iid).ok_or(TreeError::NotFound(iid))?;

        self.group_mut(old_parent)?.elements.retain(|e| *e != iid);
        let index = self.insert_index(new_parent, position)?;
        self.group_mut(new_parent)?.elements.insert(index, iid);
        self.nodes.set_parent(iid, Some(new_parent));
        info!(%iid, from = %old_parent, to = %new_parent, "moved node");
        Ok(())
    }

    pub fn rename_group(&mut self, iid: Iid, name: &str) -> Result<(), TreeError> {
        self.group_mut(iid)?.name = name.to_string();
        Ok(())
    }

    /// Flip the display-only collapsed flag; returns the new value.
    pub fn toggle_collapsed(&mut self, iid: Iid) -> Result<bool, TreeError> {
        let group = self.group_mut(iid)?;
        group.collapsed = !group.collapsed;
        Ok(group.collapsed)
    }

    /// Returns false when the goods was already linked.
    pub fn add_link(&mut self, iid: Iid, goods_id: &str) -> Result<bool, TreeError> {
        Ok(self.group_mut(iid)?.links.insert(goods_id.to_string()))
    }

    /// Returns false when the goods was not linked.
    pub fn remove_link(&mut self, iid: Iid, goods_id: &str) -> Result<bool, TreeError> {
        Ok(self.group_mut(iid)?.links.remove(goods_id))
    }

    pub fn set_product_amount(&mut self, iid: Iid, amount: f64) -> Result<(), TreeError> {
        match self.nodes.get_mut(iid) {
            Some(Node::Product(product)) => {
                product.amount = amount;
                Ok(())
            }
            Some(_) => Err(TreeError::WrongKind(iid)),
            None => Err(TreeError::NotFound(iid)),
        }
    }

    pub fn set_voltage_tier(&mut self, iid: Iid, tier: u8) -> Result<(), TreeError> {
        match self.nodes.get_mut(iid) {
            Some(Node::Recipe(recipe)) => {
                recipe.voltage_tier = tier;
                Ok(())
            }
            Some(_) => Err(TreeError::WrongKind(iid)),
            None => Err(TreeError::NotFound(iid)),
        }
    }

    /// Recompute every recipe and group flow from the catalog, bottom-up.
    ///
    /// New flows are collected first and stored only once every catalog
    /// lookup succeeded; on error every node keeps its previous flow.
    pub fn recompute<C: Catalog + ?Sized>(&mut self, catalog: &C) -> Result<(), CatalogError> {
        let mut computed: HashMap<Iid, Flow> = HashMap::with_capacity(self.nodes.len());
        // post-order: a group is pushed back as `expanded` before its children
        let mut stack = vec![(self.root, false)];

        while let Some((iid, expanded)) = stack.pop() {
            match self.nodes.get(iid) {
                Some(Node::Recipe(recipe)) => {
                    let flow = match catalog.recipe_flow(&recipe.recipe_id, recipe.voltage_tier)? {
                        Some(flow) => flow,
                        None => {
                            warn!(%iid, recipe_id = %recipe.recipe_id, "recipe not found in catalog");
                            Flow::new()
                        }
                    };
                    computed.insert(iid, flow);
                }
                Some(Node::Group(group)) if !expanded => {
                    stack.push((iid, true));
                    stack.extend(group.elements.iter().map(|child| (*child, false)));
                }
                Some(Node::Group(group)) => {
                    let children = group.elements.iter().filter_map(|child| computed.get(child));
                    let flow = aggregate(children, &group.links);
                    computed.insert(iid, flow);
                }
                _ => {}
            }
        }

        for (iid, flow) in computed {
            match self.nodes.get_mut(iid) {
                Some(Node::Recipe(recipe)) => recipe.flow = flow,
                Some(Node::Group(group)) => group.flow = flow,
                _ => {}
            }
        }
        Ok(())
    }

    /// How well the root group meets each product target.
    pub fn product_balance(&self) -> Vec<ProductBalance> {
        let root_flow = &self.root_group().flow;
        self.products()
            .map(|(iid, product)| ProductBalance {
                iid,
                goods_id: product.goods_id.clone(),
                target: product.amount,
                produced: root_flow.net(&product.goods_id),
            })
            .collect()
    }
}
