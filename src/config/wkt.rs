//! WKT-style room file parser: one `(x y)` coordinate pair per line,
//! surrounding text ignored, floats rounded to millimetres.

use crate::error::DataError;
use crate::geometry::{Coordinate, Room};

/// Parse a room polygon out of WKT-style text. Malformed lines are skipped
/// with a warning rather than aborting the whole load, per the `DataError`
/// recovery policy.
pub fn parse_room(path: &str, text: &str) -> Result<Room, crate::error::ConfigError> {
    let mut vertices = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        match parse_coordinate_line(path, line_no + 1, line) {
            Ok(Some(coord)) => vertices.push(coord),
            Ok(None) => {}
            Err(err) => log::warn!("{err}"),
        }
    }
    if vertices.len() < 3 {
        return Err(crate::error::ConfigError::Parse {
            path: path.to_string(),
            line: 0,
            message: format!("room needs at least 3 vertices, found {}", vertices.len()),
        });
    }
    Ok(Room::new(vertices))
}

fn parse_coordinate_line(path: &str, line_no: usize, line: &str) -> Result<Option<Coordinate>, DataError> {
    let Some(open) = line.find('(') else { return Ok(None) };
    let Some(close) = line[open..].find(')').map(|i| i + open) else {
        return Err(DataError::MalformedCoordinate { path: path.to_string(), line: line_no, content: line.to_string() });
    };
    let inner = &line[open + 1..close];
    let mut tokens = inner.split_whitespace();
    let (Some(x_tok), Some(y_tok)) = (tokens.next(), tokens.next()) else {
        return Err(DataError::MalformedCoordinate { path: path.to_string(), line: line_no, content: line.to_string() });
    };
    let x: f64 = x_tok.parse().map_err(|_| DataError::NonNumericCoordinate { path: path.to_string(), line: line_no, token: x_tok.to_string() })?;
    let y: f64 = y_tok.parse().map_err(|_| DataError::NonNumericCoordinate { path: path.to_string(), line: line_no, token: y_tok.to_string() })?;
    Ok(Some(Coordinate::new(x, y).rounded_to_mm()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_square() {
        let text = "(0 0)\n(100 0)\n(100 100)\n(0 100)\n";
        let room = parse_room("room.wkt", text).unwrap();
        assert_eq!(room.vertices.len(), 4);
    }

    #[test]
    fn ignores_surrounding_text_and_skips_malformed_lines() {
        let text = "POINT (0 0) extra junk\n(100 0)\n(bad line)\n(100 100)\n(0 100)\n";
        let room = parse_room("room.wkt", text).unwrap();
        assert_eq!(room.vertices.len(), 4);
    }

    #[test]
    fn rejects_room_with_too_few_vertices() {
        let text = "(0 0)\n(1 1)\n";
        assert!(parse_room("room.wkt", text).is_err());
    }
}
