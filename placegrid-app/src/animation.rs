use placegrid_core::{PixelPos, Vec2, ViewportController};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Motion {
    /// Scale goes from `from` to `from * factor`, geometrically.
    Zoom {
        at: Vec2,
        factor: f64,
        from: Option<f64>,
    },
    /// The centered global point moves linearly to `to`.
    Pan { to: Vec2, from: Option<Vec2> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Animation {
    motion: Motion,
    duration_ms: f64,
    started_ms: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationStatus {
    Idle,
    Running,
    /// The last frame was just applied.
    Finished,
}

/// Drives one programmatic zoom or pan at a time.
///
/// Starting values are captured on the first [`tick`](Self::tick), which also
/// fixes the start time. Each tick sets the view to where it should be at that
/// moment rather than stepping, so dropped frames only cost smoothness.
#[derive(Debug, Clone, Default)]
pub struct AnimationScheduler {
    current: Option<Animation>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Zoom by `factor` about the screen point `at`. Replaces any running
    /// animation.
    pub fn zoom(&mut self, at: Vec2, factor: f64, duration_ms: f64) {
        self.start(
            Motion::Zoom {
                at,
                factor,
                from: None,
            },
            duration_ms,
        );
    }

    /// Move the continuous global point `to` to the frame center.
    pub fn pan_to(&mut self, to: Vec2, duration_ms: f64) {
        self.start(Motion::Pan { to, from: None }, duration_ms);
    }

    /// Center the midpoint of a global pixel.
    pub fn pan_to_pixel(&mut self, pixel: PixelPos, duration_ms: f64) {
        self.pan_to(pixel.center(), duration_ms);
    }

    fn start(&mut self, motion: Motion, duration_ms: f64) {
        if self.current.is_some() {
            debug!("Replacing running animation");
        }
        self.current = Some(Animation {
            motion,
            duration_ms,
            started_ms: None,
        });
    }

    pub fn cancel(&mut self) {
        self.current = None;
    }

    /// Advance to `now_ms`. The caller runs `viewport.update()` afterwards.
    pub fn tick(&mut self, now_ms: f64, viewport: &mut ViewportController) -> AnimationStatus {
        let Some(anim) = self.current.as_mut() else {
            return AnimationStatus::Idle;
        };
        let started = *anim.started_ms.get_or_insert(now_ms);
        let progress = if anim.duration_ms > 0.0 {
            ((now_ms - started) / anim.duration_ms).clamp(0.0, 1.0)
        } else {
            1.0
        };

        match &mut anim.motion {
            Motion::Zoom { at, factor, from } => {
                let from = *from.get_or_insert(viewport.scale());
                let target = from * factor.powf(progress);
                viewport.zoom_at(*at, target / viewport.scale());
            }
            Motion::Pan { to, from } => {
                let from = *from.get_or_insert_with(|| viewport.centered_global());
                viewport.center_global(from + (*to - from) * progress);
            }
        }

        if progress >= 1.0 {
            self.current = None;
            AnimationStatus::Finished
        } else {
            AnimationStatus::Running
        }
    }
}
