//! Raw pointer, touch, wheel and key input turned into view changes.
//!
//! The controller only interprets input; it never touches the viewport.
//! [`PlaceCanvas`](crate::PlaceCanvas) applies the resulting actions.

use placegrid_core::Vec2;
use tracing::trace;

use crate::config::GestureConfig;

/// Pinches whose reference finger sits closer than this to the pinch center
/// produce no zoom.
const MIN_PINCH_RADIUS: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    pub id: u64,
    pub pos: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Left,
    Right,
    Up,
    Down,
    ZoomIn,
    ZoomOut,
}

/// Input in screen coordinates. Touch events carry every touch still on the
/// surface after the change, like the DOM `touches` list.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown(Vec2),
    PointerMove(Vec2),
    PointerUp(Vec2),
    PointerLeave,
    Wheel { at: Vec2, delta_y: f64 },
    TouchStart(Vec<Touch>),
    TouchMove(Vec<Touch>),
    TouchEnd(Vec<Touch>),
    Key(NavKey),
}

impl InputEvent {
    /// Whether this event begins a new user gesture. A wheel notch is a
    /// gesture of its own.
    pub fn starts_gesture(&self) -> bool {
        matches!(
            self,
            InputEvent::PointerDown(_) | InputEvent::TouchStart(_) | InputEvent::Wheel { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    Idle,
    Panning {
        prev: Vec2,
        start: Vec2,
    },
    /// `center` is fixed when the second finger lands.
    PinchZooming {
        prev: [Touch; 2],
        center: Vec2,
    },
}

/// What the viewport should do in response to input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureAction {
    Pan(Vec2),
    Zoom { at: Vec2, factor: f64 },
    /// Center the global pixel under this screen point.
    CenterOn(Vec2),
    /// Move the reticle by whole global pixels.
    MoveReticle { dx: i64, dy: i64 },
    ZoomAtCenter(f64),
}

#[derive(Debug, Clone)]
pub struct GestureController {
    config: GestureConfig,
    state: GestureState,
}

impl GestureController {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            state: GestureState::Idle,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn handle(&mut self, event: &InputEvent) -> Vec<GestureAction> {
        let mut actions = Vec::new();
        match event {
            InputEvent::PointerDown(pos) => {
                self.state = GestureState::Panning {
                    prev: *pos,
                    start: *pos,
                };
            }
            InputEvent::PointerMove(pos) => {
                if let GestureState::Panning { prev, .. } = &mut self.state {
                    actions.push(GestureAction::Pan(*pos - *prev));
                    *prev = *pos;
                }
            }
            InputEvent::PointerUp(pos) => {
                if let GestureState::Panning { start, .. } = self.state {
                    if self.config.click_to_center && *pos == start {
                        actions.push(GestureAction::CenterOn(start));
                    }
                }
                self.state = GestureState::Idle;
            }
            InputEvent::PointerLeave => self.state = GestureState::Idle,
            InputEvent::Wheel { at, delta_y } => {
                let f = self.config.wheel_zoom_factor;
                if *delta_y < 0.0 {
                    actions.push(GestureAction::Zoom { at: *at, factor: f });
                } else if *delta_y > 0.0 {
                    actions.push(GestureAction::Zoom {
                        at: *at,
                        factor: 1.0 / f,
                    });
                }
            }
            InputEvent::TouchStart(touches) => match touches.as_slice() {
                [t] => {
                    self.state = GestureState::Panning {
                        prev: t.pos,
                        start: t.pos,
                    };
                }
                [t1, t2] => {
                    self.state = GestureState::PinchZooming {
                        prev: [*t1, *t2],
                        center: (t1.pos + t2.pos) / 2.0,
                    };
                }
                _ => {}
            },
            InputEvent::TouchMove(touches) => match (touches.as_slice(), &mut self.state) {
                ([t], GestureState::Panning { prev, .. }) => {
                    actions.push(GestureAction::Pan(t.pos - *prev));
                    *prev = t.pos;
                }
                ([a, b], GestureState::PinchZooming { prev, center }) => {
                    let (pan, zoom, next) = pinch_step(*prev, *center, *a, *b);
                    actions.push(GestureAction::Pan(pan));
                    if let Some(factor) = zoom {
                        actions.push(GestureAction::Zoom {
                            at: *center,
                            factor,
                        });
                    }
                    *prev = next;
                }
                _ => {}
            },
            InputEvent::TouchEnd(remaining) => match remaining.as_slice() {
                // Continue as a pan from where the remaining finger is now.
                [t] => {
                    self.state = GestureState::Panning {
                        prev: t.pos,
                        start: t.pos,
                    };
                }
                [] => self.state = GestureState::Idle,
                _ => {}
            },
            InputEvent::Key(key) => {
                let f = self.config.wheel_zoom_factor;
                actions.push(match key {
                    NavKey::Left => GestureAction::MoveReticle { dx: -1, dy: 0 },
                    NavKey::Right => GestureAction::MoveReticle { dx: 1, dy: 0 },
                    NavKey::Up => GestureAction::MoveReticle { dx: 0, dy: -1 },
                    NavKey::Down => GestureAction::MoveReticle { dx: 0, dy: 1 },
                    NavKey::ZoomIn => GestureAction::ZoomAtCenter(f),
                    NavKey::ZoomOut => GestureAction::ZoomAtCenter(1.0 / f),
                });
            }
        }
        if !actions.is_empty() {
            trace!("{event:?} -> {actions:?}");
        }
        actions
    }
}

/// One pinch update. Returns the pan, the zoom factor about `center` (if
/// defined), and the touches to use as the next reference.
///
/// The pan is the movement both fingers share. What is left over is the
/// zoom delta; its length says how far the fingers spread and the sign of
/// its dot product with the center-to-first-finger vector says in which
/// direction.
fn pinch_step(
    prev: [Touch; 2],
    center: Vec2,
    a: Touch,
    b: Touch,
) -> (Vec2, Option<f64>, [Touch; 2]) {
    // Keep fingers paired with their previous positions.
    let (t1, t2) = if b.id == prev[0].id { (b, a) } else { (a, b) };
    let d1 = t1.pos - prev[0].pos;
    let d2 = t2.pos - prev[1].pos;

    let same = (d1 + d2) / 2.0;
    let zoom_delta = (d1 - d2) / 2.0;
    let sign = if zoom_delta.dot(t1.pos - center) < 0.0 {
        -1.0
    } else {
        1.0
    };
    let radius = (prev[0].pos + same - center).length();
    let factor = if radius > MIN_PINCH_RADIUS {
        Some((sign * zoom_delta.length() + radius) / radius)
    } else {
        None
    };
    (same, factor, [t1, t2])
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn controller() -> GestureController {
        GestureController::new(GestureConfig::default())
    }

    fn touch(id: u64, x: f64, y: f64) -> Touch {
        Touch {
            id,
            pos: Vec2::new(x, y),
        }
    }

    fn zoom_factor(actions: &[GestureAction]) -> Option<f64> {
        actions.iter().find_map(|a| match a {
            GestureAction::Zoom { factor, .. } => Some(*factor),
            _ => None,
        })
    }

    #[test]
    fn wheel_and_presses_start_gestures() {
        let at = Vec2::new(3.0, 4.0);
        assert!(InputEvent::Wheel { at, delta_y: 1.0 }.starts_gesture());
        assert!(InputEvent::PointerDown(at).starts_gesture());
        assert!(InputEvent::TouchStart(vec![touch(0, 3.0, 4.0)]).starts_gesture());
        assert!(!InputEvent::PointerMove(at).starts_gesture());
        assert!(!InputEvent::Key(NavKey::Left).starts_gesture());
    }

    #[test]
    fn drag_pans_by_pointer_delta() {
        let mut g = controller();
        g.handle(&InputEvent::PointerDown(Vec2::new(10.0, 10.0)));
        let a = g.handle(&InputEvent::PointerMove(Vec2::new(15.0, 7.0)));
        assert_eq!(a, vec![GestureAction::Pan(Vec2::new(5.0, -3.0))]);
        let a = g.handle(&InputEvent::PointerMove(Vec2::new(16.0, 7.0)));
        assert_eq!(a, vec![GestureAction::Pan(Vec2::new(1.0, 0.0))]);
        // Moving back to the start is still a drag, not a click.
        g.handle(&InputEvent::PointerMove(Vec2::new(10.0, 10.0)));
        let a = g.handle(&InputEvent::PointerUp(Vec2::new(11.0, 10.0)));
        assert!(a.is_empty());
        assert_eq!(g.state(), GestureState::Idle);
        // Moves while idle do nothing.
        assert!(g.handle(&InputEvent::PointerMove(Vec2::new(0.0, 0.0))).is_empty());
    }

    #[test]
    fn click_without_movement_centers() {
        let mut g = controller();
        let p = Vec2::new(42.0, 24.0);
        g.handle(&InputEvent::PointerDown(p));
        assert_eq!(g.handle(&InputEvent::PointerUp(p)), vec![GestureAction::CenterOn(p)]);

        let mut g = GestureController::new(GestureConfig {
            click_to_center: false,
            ..GestureConfig::default()
        });
        g.handle(&InputEvent::PointerDown(p));
        assert!(g.handle(&InputEvent::PointerUp(p)).is_empty());
    }

    #[test]
    fn leave_cancels_panning() {
        let mut g = controller();
        g.handle(&InputEvent::PointerDown(Vec2::ZERO));
        g.handle(&InputEvent::PointerLeave);
        assert!(g.handle(&InputEvent::PointerMove(Vec2::new(3.0, 3.0))).is_empty());
    }

    #[test]
    fn wheel_zooms_by_configured_factor() {
        let mut g = controller();
        let at = Vec2::new(1.0, 2.0);
        assert_eq!(
            g.handle(&InputEvent::Wheel { at, delta_y: -100.0 }),
            vec![GestureAction::Zoom { at, factor: 1.2 }]
        );
        let out = zoom_factor(&g.handle(&InputEvent::Wheel { at, delta_y: 3.0 })).unwrap();
        assert!((out - 1.0 / 1.2).abs() < EPSILON);
        assert!(g.handle(&InputEvent::Wheel { at, delta_y: 0.0 }).is_empty());
    }

    #[test]
    fn spreading_fingers_zooms_in_about_fixed_center() {
        let mut g = controller();
        g.handle(&InputEvent::TouchStart(vec![touch(1, 90.0, 100.0), touch(2, 110.0, 100.0)]));
        let a = g.handle(&InputEvent::TouchMove(vec![touch(1, 80.0, 100.0), touch(2, 120.0, 100.0)]));
        assert_eq!(a[0], GestureAction::Pan(Vec2::ZERO));
        // Zoom delta (-10, 0) points the same way as center -> finger 1,
        // reference radius 10: factor (10 + 10) / 10.
        assert_eq!(
            a[1],
            GestureAction::Zoom {
                at: Vec2::new(100.0, 100.0),
                factor: 2.0
            }
        );

        // Pinching back in zooms out; the center does not follow the fingers.
        let a = g.handle(&InputEvent::TouchMove(vec![touch(1, 85.0, 100.0), touch(2, 115.0, 100.0)]));
        match a[1] {
            GestureAction::Zoom { at, factor } => {
                assert_eq!(at, Vec2::new(100.0, 100.0));
                assert!((factor - 0.75).abs() < EPSILON);
            }
            other => panic!("expected zoom, got {other:?}"),
        }
    }

    #[test]
    fn shared_finger_movement_pans() {
        let mut g = controller();
        g.handle(&InputEvent::TouchStart(vec![touch(1, 90.0, 100.0), touch(2, 110.0, 100.0)]));
        // Touch order in the list is swapped; ids keep the pairing.
        let a = g.handle(&InputEvent::TouchMove(vec![touch(2, 110.0, 105.0), touch(1, 90.0, 105.0)]));
        assert_eq!(a[0], GestureAction::Pan(Vec2::new(0.0, 5.0)));
        assert!((zoom_factor(&a).unwrap() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn lifting_one_finger_resets_pan_reference() {
        let mut g = controller();
        g.handle(&InputEvent::TouchStart(vec![touch(1, 0.0, 0.0)]));
        g.handle(&InputEvent::TouchStart(vec![touch(1, 0.0, 0.0), touch(2, 50.0, 50.0)]));
        g.handle(&InputEvent::TouchMove(vec![touch(1, -20.0, 0.0), touch(2, 70.0, 50.0)]));
        g.handle(&InputEvent::TouchEnd(vec![touch(2, 70.0, 50.0)]));
        let a = g.handle(&InputEvent::TouchMove(vec![touch(2, 72.0, 51.0)]));
        assert_eq!(a, vec![GestureAction::Pan(Vec2::new(2.0, 1.0))]);

        g.handle(&InputEvent::TouchEnd(vec![]));
        assert_eq!(g.state(), GestureState::Idle);
    }

    #[test]
    fn keys_move_reticle_and_zoom() {
        let mut g = controller();
        assert_eq!(
            g.handle(&InputEvent::Key(NavKey::Left)),
            vec![GestureAction::MoveReticle { dx: -1, dy: 0 }]
        );
        assert_eq!(
            g.handle(&InputEvent::Key(NavKey::Down)),
            vec![GestureAction::MoveReticle { dx: 0, dy: 1 }]
        );
        assert_eq!(
            g.handle(&InputEvent::Key(NavKey::ZoomIn)),
            vec![GestureAction::ZoomAtCenter(1.2)]
        );
    }
}
