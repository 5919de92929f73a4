//! Error types for the catalog, the project tree and event scripts

use std::path::PathBuf;

use crate::registry::Iid;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

/// Structural violations rejected by the project tree.
///
/// Callers on the interactive path (drag-and-drop, action dispatch) treat
/// every variant as a silent no-op.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("no node with iid {0}")]
    NotFound(Iid),

    #[error("node {0} is not a recipe group")]
    NotAGroup(Iid),

    #[error("moving {node} under {parent} would create a cycle")]
    Cycle { node: Iid, parent: Iid },

    #[error("the root group cannot be moved or removed")]
    RootImmovable,

    #[error("node {node} is not a child of {parent}")]
    WrongParent { node: Iid, parent: Iid },

    #[error("node {0} cannot be placed in a recipe group")]
    NotDraggable(Iid),

    #[error("node {0} is the wrong kind of node for this edit")]
    WrongKind(Iid),
}

#[derive(Debug, thiserror::Error)]
#[error("line {line}: {message}: {text:?}")]
pub struct ScriptError {
    pub line: usize,
    pub message: &'static str,
    pub text: String,
}
