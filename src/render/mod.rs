//! Per-frame drawing: painter backends, surface sizing and the scene renderer.

/// `vello_cpu` raster backend and PNG output.
pub mod cpu;
/// Frame context, post effects and scene dispatch.
pub mod frame;
/// Drawing trait and the recording backend.
pub mod painter;
/// Viewport to surface sizing and the resize subscription.
pub mod surface;
