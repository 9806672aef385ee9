use crate::foundation::error::{TenebraError, TenebraResult};

/// Host viewport in CSS pixels plus its device pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    /// Width in CSS pixels.
    pub width: u32,
    /// Height in CSS pixels.
    pub height: u32,
    /// Device pixels per CSS pixel.
    pub device_pixel_ratio: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            device_pixel_ratio: 1.0,
        }
    }
}

impl Viewport {
    /// Viewport of `width` x `height` at ratio 1.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio: 1.0,
        }
    }

    /// Same viewport at another ratio.
    pub fn with_dpr(self, device_pixel_ratio: f64) -> Self {
        Self {
            device_pixel_ratio,
            ..self
        }
    }

    /// Reject empty or non-finite viewports.
    pub fn validate(&self) -> TenebraResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(TenebraError::validation("viewport must be non-empty"));
        }
        if !(self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0) {
            return Err(TenebraError::validation("device pixel ratio must be > 0"));
        }
        Ok(())
    }
}

/// Drawing surface dimensions in device pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct Surface {
    /// Width in device pixels.
    pub width: u32,
    /// Height in device pixels.
    pub height: u32,
    /// Effective pixel ratio after capping.
    pub dpr: f64,
}

impl Surface {
    /// Size a surface for `viewport`, capping the pixel ratio at `dpr_cap`.
    pub fn fit(viewport: Viewport, dpr_cap: f64) -> Self {
        let dpr = if viewport.device_pixel_ratio.is_finite() && viewport.device_pixel_ratio > 0.0 {
            viewport.device_pixel_ratio.min(dpr_cap.max(f64::MIN_POSITIVE))
        } else {
            1.0
        };
        let scale = |v: u32| ((f64::from(v) * dpr).floor() as u32).max(1);
        Self {
            width: scale(viewport.width),
            height: scale(viewport.height),
            dpr,
        }
    }
}

/// Keeps the surface in step with the viewport, but only while subscribed.
///
/// The controller subscribes when a session starts and unsubscribes when it stops. Viewport
/// changes outside a session are remembered and applied at the next subscribe.
#[derive(Clone, Debug)]
pub struct ResizeSubscription {
    dpr_cap: f64,
    viewport: Viewport,
    surface: Surface,
    active: bool,
    resyncs: u64,
}

impl ResizeSubscription {
    /// Inactive subscription for `viewport`.
    pub fn new(viewport: Viewport, dpr_cap: f64) -> Self {
        Self {
            dpr_cap,
            viewport,
            surface: Surface::fit(viewport, dpr_cap),
            active: false,
            resyncs: 0,
        }
    }

    /// Start following the viewport, syncing immediately.
    pub fn subscribe(&mut self) -> Surface {
        self.active = true;
        self.sync()
    }

    /// Stop following the viewport.
    pub fn unsubscribe(&mut self) {
        self.active = false;
    }

    /// True while subscribed.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Record a viewport change. Returns the new surface if it was re-synced.
    pub fn viewport_changed(&mut self, viewport: Viewport) -> Option<Surface> {
        self.viewport = viewport;
        if self.active {
            Some(self.sync())
        } else {
            None
        }
    }

    /// Current surface.
    pub fn surface(&self) -> Surface {
        self.surface
    }

    /// Latest known viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Number of re-syncs performed.
    pub fn resyncs(&self) -> u64 {
        self.resyncs
    }

    fn sync(&mut self) -> Surface {
        self.surface = Surface::fit(self.viewport, self.dpr_cap);
        self.resyncs += 1;
        self.surface
    }
}
