//! Cluster cells: square sub-regions of a room used to confine groups of
//! hosts, and the INTRA/INTER communication-mode filter built on top of them.

use crate::geometry::{Coordinate, Room};

/// A square sub-region of side `side` placed at grid position `(col, row)`
/// inside a room, holding up to `capacity` hosts.
#[derive(Debug, Clone)]
pub struct ClusterCell {
    pub id: usize,
    pub top_left: Coordinate,
    pub side: f64,
    capacity: usize,
    hosts: Vec<u32>,
}

impl ClusterCell {
    pub fn bottom_right(&self) -> Coordinate {
        Coordinate::new(self.top_left.x + self.side, self.top_left.y + self.side)
    }

    pub fn contains(&self, p: &Coordinate) -> bool {
        p.x >= self.top_left.x && p.x <= self.top_left.x + self.side && p.y >= self.top_left.y && p.y <= self.top_left.y + self.side
    }

    pub fn is_full(&self) -> bool {
        self.hosts.len() >= self.capacity
    }

    pub fn hosts(&self) -> &[u32] {
        &self.hosts
    }

    pub fn assign_host(&mut self, address: u32) {
        debug_assert!(!self.is_full());
        self.hosts.push(address);
    }
}

/// Enumerate the integer grid of side-`cell_side` cells that fit inside
/// `room`'s bounding box, keeping only cells whose NW and SE corners both
/// lie inside the polygon. Cell `i` of the result becomes cluster `i`.
pub fn valid_cluster_cells(room: &Room, cell_side: f64, capacity: usize) -> Vec<ClusterCell> {
    let (min, _max) = room.bounds();
    let cols = (room.width() / cell_side).floor() as i64;
    let rows = (room.height() / cell_side).floor() as i64;

    let mut cells = Vec::new();
    let mut next_id = 0usize;
    for row in 0..rows.max(0) {
        for col in 0..cols.max(0) {
            let top_left = Coordinate::new(min.x + col as f64 * cell_side, min.y + row as f64 * cell_side);
            let bottom_right = Coordinate::new(top_left.x + cell_side, top_left.y + cell_side);
            if room.contains_point(&top_left) && room.contains_point(&bottom_right) {
                cells.push(ClusterCell {
                    id: next_id,
                    top_left,
                    side: cell_side,
                    capacity,
                    hosts: Vec::new(),
                });
                next_id += 1;
            }
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f64) -> Room {
        Room::new(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(side, 0.0),
            Coordinate::new(side, side),
            Coordinate::new(0.0, side),
        ])
    }

    #[test]
    fn grid_fits_expected_cell_count() {
        let room = square(100.0);
        let cells = valid_cluster_cells(&room, 10.0, 5);
        assert_eq!(cells.len(), 100);
    }

    #[test]
    fn cell_ids_are_sequential() {
        let room = square(20.0);
        let cells = valid_cluster_cells(&room, 10.0, 5);
        for (i, cell) in cells.iter().enumerate() {
            assert_eq!(cell.id, i);
        }
    }

    #[test]
    fn assigned_host_location_is_inside_cell_and_room() {
        let room = square(100.0);
        let mut cells = valid_cluster_cells(&room, 10.0, 5);
        let cell = &mut cells[0];
        cell.assign_host(7);
        let probe = Coordinate::new(cell.top_left.x + 1.0, cell.top_left.y + 1.0);
        assert!(cell.contains(&probe));
        assert!(room.contains_point(&probe));
    }
}
