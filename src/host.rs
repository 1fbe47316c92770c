//! The rendering surface the stack drives, and the presentation facts a host
//! derives from a snapshot.

use serde::Serialize;

use crate::options::DEFAULT_Z_INDEX;
use crate::stack::PanelEntry;

/// Overlay z-index used while no panel is open.
pub const DEFAULT_OVERLAY_Z_INDEX: i32 = DEFAULT_Z_INDEX - 1;

/// Hooks into whatever renders the stack.
pub trait HostSurface: Send + Sync {
    /// Attach the host. Called at most once per stack, on the first open.
    fn mount(&self);

    /// Called after every snapshot change; `locked` is true while any panel
    /// is open so the page underneath can stop scrolling.
    fn set_scroll_lock(&self, _locked: bool) {}
}

/// Host for stacks that are not attached to a renderer.
pub struct DetachedHost;

impl HostSurface for DetachedHost {
    fn mount(&self) {
        tracing::debug!("no side page host attached");
    }
}

/// Backdrop and layering state for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostView {
    pub show_backdrop: bool,
    /// Backdrop class of the topmost panel, or empty.
    pub backdrop_class: String,
    /// One below the highest panel z-index. An unset or zero z-index counts
    /// as the default 1000.
    pub overlay_z_index: i32,
}

impl HostView {
    pub fn from_snapshot<C>(entries: &[PanelEntry<C>]) -> Self {
        let show_backdrop = entries.iter().any(|e| e.options.wants_backdrop());
        let backdrop_class = entries
            .last()
            .and_then(|e| e.options.backdrop_class.clone())
            .unwrap_or_default();
        let overlay_z_index = entries
            .iter()
            .map(|e| e.options.z_index.filter(|z| *z != 0).unwrap_or(DEFAULT_Z_INDEX))
            .max()
            .map_or(DEFAULT_OVERLAY_Z_INDEX, |z| z - 1);

        Self {
            show_backdrop,
            backdrop_class,
            overlay_z_index,
        }
    }
}
