//! Pointer automation for replaying moves.
//!
//! Clicks go through a small trait so the driver can swap the real pointer
//! for a logging stub (`--dry-run`) and tests never move anyone's mouse.

use std::thread;
use std::time::Duration;

use rdev::{simulate, Button, EventType, SimulateError};
use tracing::{info, warn};

use crate::geometry::Point;

/// A pointer backend that can click capture coordinates.
pub trait Clicker {
    fn click(&mut self, target: Point);
    fn name(&self) -> &'static str;
}

/// Drives the real pointer through simulated OS events.
pub struct RdevClicker {
    click_delay: Duration,
}

impl RdevClicker {
    pub fn new(click_delay_ms: u64) -> Self {
        Self {
            click_delay: Duration::from_millis(click_delay_ms),
        }
    }

    fn send(&self, event: EventType) {
        match simulate(&event) {
            Ok(()) => (),
            Err(SimulateError) => {
                warn!(?event, "could not send pointer event");
            }
        }
        // let the OS deliver the event before the next one
        thread::sleep(Duration::from_millis(20));
    }
}

impl Clicker for RdevClicker {
    fn click(&mut self, target: Point) {
        self.send(EventType::MouseMove {
            x: target.x as f64,
            y: target.y as f64,
        });
        self.send(EventType::ButtonPress(Button::Left));
        self.send(EventType::ButtonRelease(Button::Left));
        // pacing between clicks keeps the game's animations ahead of us
        thread::sleep(self.click_delay);
    }

    fn name(&self) -> &'static str {
        "pointer"
    }
}

/// Logs every click without touching the pointer.
pub struct DryRunClicker;

impl Clicker for DryRunClicker {
    fn click(&mut self, target: Point) {
        info!(x = target.x, y = target.y, "dry run: would click");
    }

    fn name(&self) -> &'static str {
        "dry run"
    }
}
