//! The panel boundary: one on-screen surface per open dataset

use crate::data::clipboard::TextClipboard;
use crate::data::datatable::CellEdit;
use crate::error::Result;
use crate::store::{DatasetEntry, ViewMode};
use std::ops::{Deref, DerefMut};
use tracing::debug;

/// A surface bound to one dataset entry.
///
/// Panels never mutate the store. A paste produces cell edits that the host
/// applies through the store, which then asks the panel to reload.
pub trait Panel {
    fn name(&self) -> &str;

    /// Called when the panel becomes the visible one
    fn activate(&mut self);

    /// Called when another panel (or the empty state) replaces this one
    fn deactivate(&mut self);

    fn is_active(&self) -> bool;

    /// Put the current selection on the clipboard, returning the number of cells copied
    fn copy_selection(&self, clipboard: &mut dyn TextClipboard, with_headers: bool)
        -> Result<usize>;

    /// Turn clipboard text into edits anchored at the cursor
    fn paste(&self, clipboard: &mut dyn TextClipboard) -> Result<Vec<CellEdit>>;

    fn active_view_mode(&self) -> ViewMode;

    /// Pick up a new payload or view state from the entry
    fn reload(&mut self, entry: &DatasetEntry);

    /// Free whatever the panel holds; runs exactly once, when it is unmounted
    fn release(&mut self);
}

/// Builds panels for entries as they appear in the store
pub trait PanelFactory {
    type Panel: Panel;

    fn create(&mut self, entry: &DatasetEntry) -> Self::Panel;
}

/// A panel owned by the view synchronizer. Dropping it releases the panel,
/// so teardown also happens when a sync step fails or unwinds.
pub struct MountedPanel<P: Panel> {
    panel: P,
}

impl<P: Panel> MountedPanel<P> {
    pub fn mount(panel: P) -> Self {
        debug!("Mounting panel '{}'", panel.name());
        Self { panel }
    }
}

impl<P: Panel> Deref for MountedPanel<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.panel
    }
}

impl<P: Panel> DerefMut for MountedPanel<P> {
    fn deref_mut(&mut self) -> &mut P {
        &mut self.panel
    }
}

impl<P: Panel> Drop for MountedPanel<P> {
    fn drop(&mut self) {
        debug!("Releasing panel '{}'", self.panel.name());
        if self.panel.is_active() {
            self.panel.deactivate();
        }
        self.panel.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViewerError;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct ProbePanel {
        log: Rc<RefCell<Vec<String>>>,
        active: bool,
    }

    impl Panel for ProbePanel {
        fn name(&self) -> &str {
            "probe"
        }
        fn activate(&mut self) {
            self.active = true;
        }
        fn deactivate(&mut self) {
            self.active = false;
            self.log.borrow_mut().push("deactivate".into());
        }
        fn is_active(&self) -> bool {
            self.active
        }
        fn copy_selection(&self, _: &mut dyn TextClipboard, _: bool) -> Result<usize> {
            Ok(0)
        }
        fn paste(&self, _: &mut dyn TextClipboard) -> Result<Vec<CellEdit>> {
            Err(ViewerError::Clipboard("unsupported".into()))
        }
        fn active_view_mode(&self) -> ViewMode {
            ViewMode::Data
        }
        fn reload(&mut self, _: &DatasetEntry) {}
        fn release(&mut self) {
            self.log.borrow_mut().push("release".into());
        }
    }

    #[test]
    fn test_drop_deactivates_then_releases() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut mounted = MountedPanel::mount(ProbePanel {
            log: log.clone(),
            active: false,
        });
        mounted.activate();
        drop(mounted);
        assert_eq!(*log.borrow(), vec!["deactivate", "release"]);
    }

    #[test]
    fn test_release_runs_during_unwind() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let probe_log = log.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _mounted = MountedPanel::mount(ProbePanel {
                log: probe_log,
                active: false,
            });
            panic!("sync step failed");
        }));
        assert!(result.is_err());
        assert_eq!(*log.borrow(), vec!["release"]);
    }
}
