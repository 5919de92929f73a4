//! Editing session: the current project, its catalog and its listeners
//!
//! Every entry point runs to completion, recomputes what it invalidated and
//! notifies listeners before returning. When recomputation fails the edit is
//! rolled back, listeners are not called and the error is returned.

use tracing::{debug, warn};

use crate::actions::{Action, Outcome, Trigger};
use crate::catalog::Catalog;
use crate::dnd::{self, DropTarget};
use crate::error::CatalogError;
use crate::notify::{ChangeNotifier, ListenerId};
use crate::project::Project;
use crate::registry::Iid;

pub struct Session<C> {
    project: Project,
    catalog: C,
    notifier: ChangeNotifier,
}

impl<C: Catalog> Session<C> {
    pub fn new(catalog: C) -> Self {
        Self {
            project: Project::new(),
            catalog,
            notifier: ChangeNotifier::new(),
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn on_project_change(&mut self, listener: impl FnMut(&Project) + 'static) -> ListenerId {
        self.notifier.subscribe(listener)
    }

    pub fn off_project_change(&mut self, id: ListenerId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Recompute flows (unless only display state changed) and notify.
    pub fn update_project(&mut self, visual_only: bool) -> Result<(), CatalogError> {
        if !visual_only {
            self.project.recompute(&self.catalog)?;
        }
        self.notifier.notify(&self.project);
        Ok(())
    }

    /// Switch to another project wholesale. The current project stays if
    /// the new one fails to recompute.
    pub fn replace_project(&mut self, mut project: Project) -> Result<(), CatalogError> {
        project.recompute(&self.catalog)?;
        self.project = project;
        self.notifier.notify(&self.project);
        Ok(())
    }

    /// Recompute and notify after an edit, restoring `before` if the
    /// recompute fails.
    fn finish_edit(&mut self, before: Project, visual_only: bool) -> Result<(), CatalogError> {
        if let Err(e) = self.update_project(visual_only) {
            warn!(error = %e, "recompute failed, rolling back edit");
            self.project = before;
            return Err(e);
        }
        Ok(())
    }

    /// Run `verb` against the node `iid` names. A missing or zero iid addresses the
    /// project page itself.
    pub fn dispatch(&mut self, verb: &str, iid: Option<Iid>, trigger: &Trigger) -> Result<Outcome, CatalogError> {
        let action: Action = match verb.parse() {
            Ok(action) => action,
            Err(e) => {
                debug!(error = %e, "ignoring action");
                return Ok(Outcome::Ignored);
            }
        };
        // iid 0 is never issued; like a missing attribute it means the page
        let iid = iid.filter(|iid| iid.get() != 0).unwrap_or(self.project.page_iid());
        let Some((_, parent)) = self.project.resolve(iid) else {
            debug!(%iid, %action, "action target no longer exists");
            return Ok(Outcome::Ignored);
        };

        let before = self.project.clone();
        let outcome = match action.apply(&mut self.project, &self.catalog, iid, parent, trigger) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.project = before;
                return Err(e);
            }
        };
        match outcome {
            Outcome::Recompute => self.finish_edit(before, false)?,
            Outcome::Redraw => self.finish_edit(before, true)?,
            Outcome::Mutated | Outcome::Ignored => {}
        }
        Ok(outcome)
    }

    /// Handle a drop of the node named by the drag `payload`.
    pub fn drop_onto(&mut self, payload: &str, target: DropTarget) -> Result<bool, CatalogError> {
        let Some(dragged) = dnd::parse_drag_payload(payload) else {
            debug!(payload, "drag payload is not an iid");
            return Ok(false);
        };
        let before = self.project.clone();
        let moved = dnd::drag_and_drop(&mut self.project, dragged, target);
        if moved {
            self.finish_edit(before, false)?;
        }
        Ok(moved)
    }
}
