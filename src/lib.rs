//! GregTech production planner
//!
//! A recipe project is a tree of recipe groups under a page of target
//! products. Every group carries the net per-minute flow of everything
//! below it, recomputed whenever the tree changes.

pub mod actions;
pub mod catalog;
pub mod db;
pub mod dnd;
pub mod error;
pub mod flow;
pub mod import;
pub mod models;
pub mod notify;
pub mod project;
pub mod registry;
pub mod render;
pub mod script;
pub mod session;

#[cfg(test)]
mod testing;
