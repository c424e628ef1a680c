//! Viewport render manager.
//!
//! Decides which zones and boundaries to draw for the current viewport and
//! edit mode, and keeps the layer under edit alive across re-renders.

mod debounce;
mod manager;
mod registry;
mod viewport;

pub use debounce::Debouncer;
pub use manager::{
    select_candidates, Popup, PopupAction, RenderManager, RenderScope, RenderStats, Renderer,
};
pub use registry::HandleRegistry;
pub use viewport::Viewport;

#[cfg(test)]
pub(crate) use manager::tests::{square_zone, RecordingRenderer};
