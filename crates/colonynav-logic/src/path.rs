//! Waypoint route with a cursor.

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// Ordered waypoints plus the index of the one currently being walked to.
///
/// The cursor only moves forward and stays within `[0, len]`; `cursor == len`
/// means the route is exhausted and waits for a replan or an arrival check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    waypoints: Vec<Vec2>,
    cursor: usize,
}

impl Path {
    pub fn new(waypoints: Vec<Vec2>) -> Self {
        Self {
            waypoints,
            cursor: 0,
        }
    }

    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Nothing left to walk: empty, or the cursor has passed the last waypoint.
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.waypoints.len()
    }

    /// Waypoint under the cursor.
    pub fn current(&self) -> Option<Vec2> {
        self.waypoints.get(self.cursor).copied()
    }

    /// Final waypoint of the route.
    pub fn destination(&self) -> Option<Vec2> {
        self.waypoints.last().copied()
    }

    /// Waypoints not yet reached.
    pub fn remaining(&self) -> &[Vec2] {
        &self.waypoints[self.cursor.min(self.waypoints.len())..]
    }

    /// Step to the next waypoint; saturates at `len`.
    pub fn advance(&mut self) {
        if self.cursor < self.waypoints.len() {
            self.cursor += 1;
        }
    }

    pub fn clear(&mut self) {
        self.waypoints.clear();
        self.cursor = 0;
    }
}
