//! Uniform-random stationary placement inside a room or a cluster cell,
//! via rejection sampling against the polygon boundary.

use rand::Rng;

use crate::cluster::ClusterCell;
use crate::error::ConfigError;
use crate::geometry::{Coordinate, Room};

/// Generous bound on rejection-sampling attempts before giving up. A
/// well-formed room or cluster cell accepts on the first or second draw;
/// repeated rejection past this bound means the polygon test can never
/// succeed for the requested bounding rectangle.
const MAX_ATTEMPTS: u32 = 10_000;

/// Draw a uniform-random point strictly inside `room`.
pub fn place_in_room(room: &Room, rng: &mut impl Rng) -> Result<Coordinate, ConfigError> {
    let (min, max) = room.bounds();
    for _ in 0..MAX_ATTEMPTS {
        let x = rng.gen_range(min.x..=max.x);
        let y = rng.gen_range(min.y..=max.y);
        let candidate = Coordinate::new(x, y);
        if room.contains_point(&candidate) {
            return Ok(candidate);
        }
    }
    Err(ConfigError::PlacementExhausted { attempts: MAX_ATTEMPTS })
}

/// Draw a uniform-random point inside `cell`, additionally constrained to
/// lie inside `room` (the cell is already validated to be fully contained
/// in the room at construction time, but this keeps the invariant explicit
/// at the call site that matters).
pub fn place_in_cluster_cell(cell: &ClusterCell, room: &Room, rng: &mut impl Rng) -> Result<Coordinate, ConfigError> {
    for _ in 0..MAX_ATTEMPTS {
        let x = rng.gen_range(cell.top_left.x..=cell.bottom_right().x);
        let y = rng.gen_range(cell.top_left.y..=cell.bottom_right().y);
        let candidate = Coordinate::new(x, y);
        if cell.contains(&candidate) && room.contains_point(&candidate) {
            return Ok(candidate);
        }
    }
    Err(ConfigError::PlacementExhausted { attempts: MAX_ATTEMPTS })
}
