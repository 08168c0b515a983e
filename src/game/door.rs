//! Sliding doors
//!
//! A door runs one fixed cycle each time it is triggered: slide open, hold,
//! slide shut. The cycle is stamped as absolute times when triggered, so the
//! door's state at any moment is a pure function of the clock and a late or
//! skipped tick never drifts it.

use crate::config::DoorSettings;
use crate::math::{Vec2, Vec3};
use crate::world::{DoorOrientation, DoorSpawn};
use super::components::Footprint;
use super::event::{DoorEvent, Events, Opener};
use super::transform::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorState {
    Closed,
    Opening,
    Open,
    Closing,
}

/// Absolute times (seconds) of one open/close cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoorTimeline {
    pub opening_start: f64,
    pub open: f64,
    pub closing_start: f64,
    pub close: f64,
}

impl DoorTimeline {
    pub fn starting_at(now: f64, settings: &DoorSettings) -> Self {
        let open = now + settings.time_to_open;
        let closing_start = open + settings.close_delay;
        Self {
            opening_start: now,
            open,
            closing_start,
            close: closing_start + settings.time_to_open,
        }
    }
}

impl DoorState {
    /// State of a running cycle at `now`
    pub fn at(timeline: &DoorTimeline, now: f64) -> DoorState {
        if now < timeline.open {
            DoorState::Opening
        } else if now < timeline.closing_start {
            DoorState::Open
        } else if now < timeline.close {
            DoorState::Closing
        } else {
            DoorState::Closed
        }
    }
}

fn progress(now: f64, start: f64, end: f64) -> f32 {
    if end <= start {
        return 1.0;
    }
    ((now - start) / (end - start)).clamp(0.0, 1.0) as f32
}

#[derive(Debug, Clone)]
pub struct Door {
    pub transform: Transform,
    pub cell: (usize, usize),
    orientation: DoorOrientation,
    size: Vec2,
    closed_position: Vec3,
    open_position: Vec3,
    state: DoorState,
    timeline: Option<DoorTimeline>,
    settings: DoorSettings,
}

impl Door {
    pub fn new(spawn: &DoorSpawn, settings: &DoorSettings) -> Self {
        let rotation = Vec3::new(0.0, spawn.orientation.yaw(), 0.0);
        Self {
            transform: Transform::from_position_rotation(spawn.closed_position, rotation),
            cell: spawn.cell,
            orientation: spawn.orientation,
            size: spawn.orientation.footprint(settings),
            closed_position: spawn.closed_position,
            open_position: spawn.open_position,
            state: DoorState::Closed,
            timeline: None,
            settings: settings.clone(),
        }
    }

    pub fn state(&self) -> DoorState {
        self.state
    }

    pub fn orientation(&self) -> DoorOrientation {
        self.orientation
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn timeline(&self) -> Option<&DoorTimeline> {
        self.timeline.as_ref()
    }

    /// Current ground rectangle, following the door while it slides
    pub fn footprint(&self) -> Footprint {
        Footprint::new(self.transform.position.xz(), self.size)
    }

    /// Start a cycle. Returns false (and does nothing) mid-cycle.
    pub fn open(&mut self, now: f64) -> bool {
        if let Some(timeline) = &self.timeline {
            if DoorState::at(timeline, now) != DoorState::Closed {
                return false;
            }
        }
        self.timeline = Some(DoorTimeline::starting_at(now, &self.settings));
        self.state = DoorState::Opening;
        true
    }

    pub fn update(&mut self, now: f64) {
        let Some(timeline) = self.timeline else {
            return;
        };

        self.state = DoorState::at(&timeline, now);
        self.transform.position = match self.state {
            DoorState::Opening => {
                let t = progress(now, timeline.opening_start, timeline.open);
                self.closed_position.lerp(self.open_position, t)
            }
            DoorState::Open => self.open_position,
            DoorState::Closing => {
                let t = progress(now, timeline.closing_start, timeline.close);
                self.open_position.lerp(self.closed_position, t)
            }
            DoorState::Closed => {
                self.timeline = None;
                self.closed_position
            }
        };
    }
}

/// Trigger every door within `reach` of `pos` (ground distance).
/// Returns how many doors started a new cycle.
pub fn open_doors_near(
    doors: &mut [Door],
    pos: Vec3,
    reach: f32,
    now: f64,
    opener: Opener,
    events: &mut Events,
) -> usize {
    let mut opened = 0;
    for (index, door) in doors.iter_mut().enumerate() {
        if door.position().distance_xz(pos) >= reach {
            continue;
        }
        if door.open(now) {
            log::debug!("door {} at {:?} opened by {:?}", index, door.cell, opener);
            events.door_opened.send(DoorEvent { door: index, opener });
            opened += 1;
        }
    }
    opened
}
