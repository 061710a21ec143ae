/*!
Buffer operations.

Points become circles approximated as polygons. Lines and polygons are grown by the union of a capsule around
every segment, polygons are shrunk by removing that union along their rings.
 */
use std::f64::consts::PI;

use geo::{BooleanOps, Coord, Geometry, LineString, MultiPolygon, Polygon};

use crate::error::{Error, Result};

/// Number of segments used to approximate a full circle
pub const CIRCLE_SEGMENTS: usize = 32;

/// Circle around `center` approximated by a closed ring of `segments` vertices
pub fn circle(center: Coord<f64>, radius: f64, segments: usize) -> Polygon<f64> {
    let n = segments.max(4);
    let r = radius.abs();

    let mut coords = Vec::with_capacity(n + 1);
    for i in 0..n {
        let angle = 2.0 * PI * i as f64 / n as f64;
        coords.push(Coord {
            x: center.x + r * angle.cos(),
            y: center.y + r * angle.sin(),
        });
    }
    coords.push(coords[0]);

    Polygon::new(LineString::new(coords), vec![])
}

/// Rectangle of half width `distance` along a segment. Degenerate segments give `None`.
fn segment_strip(start: Coord<f64>, end: Coord<f64>, distance: f64) -> Option<Polygon<f64>> {
    let (dx, dy) = (end.x - start.x, end.y - start.y);
    let length = dx.hypot(dy);
    if length == 0.0 {
        return None;
    }
    let normal = Coord {
        x: -dy / length * distance,
        y: dx / length * distance,
    };
    Some(Polygon::new(
        LineString::new(vec![
            start + normal,
            end + normal,
            end - normal,
            start - normal,
            start + normal,
        ]),
        vec![],
    ))
}

/// Union of the capsules of radius `distance` around every segment of every line
fn capsules<'a>(lines: impl IntoIterator<Item = &'a LineString<f64>>, distance: f64) -> MultiPolygon<f64> {
    let mut pieces = Vec::new();
    for line in lines {
        for coord in line.coords() {
            pieces.push(circle(*coord, distance, CIRCLE_SEGMENTS));
        }
        pieces.extend(line.lines().filter_map(|segment| segment_strip(segment.start, segment.end, distance)));
    }
    union_all(pieces)
}

pub(crate) fn union_all(pieces: impl IntoIterator<Item = Polygon<f64>>) -> MultiPolygon<f64> {
    pieces
        .into_iter()
        .fold(MultiPolygon::new(vec![]), |acc, piece| {
            if acc.0.is_empty() {
                MultiPolygon::new(vec![piece])
            } else {
                acc.union(&MultiPolygon::new(vec![piece]))
            }
        })
}

fn rings(polygons: &MultiPolygon<f64>) -> Vec<&LineString<f64>> {
    polygons
        .iter()
        .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
        .collect()
}

/**
Buffer a geometry by `distance`.

# Errors
`InvalidInput` for a negative distance on a point or line geometry, or when shrinking a polygon empties it.
 */
pub fn buffer_geometry(geometry: &Geometry<f64>, distance: f64) -> Result<Geometry<f64>> {
    if !distance.is_finite() {
        return Err(Error::InvalidInput(format!("buffer distance must be finite, got {distance}")));
    }
    if distance == 0.0 {
        return Ok(geometry.clone());
    }
    if distance < 0.0 && !matches!(geometry, Geometry::Polygon(_) | Geometry::MultiPolygon(_)) {
        return Err(Error::InvalidInput(
            "negative buffer distance needs a polygonal geometry".to_string(),
        ));
    }
    let buffered = match geometry {
        Geometry::Point(point) => MultiPolygon::new(vec![circle(point.0, distance, CIRCLE_SEGMENTS)]),
        Geometry::MultiPoint(points) => {
            union_all(points.iter().map(|point| circle(point.0, distance, CIRCLE_SEGMENTS)))
        }
        Geometry::LineString(line) => capsules([line], distance),
        Geometry::MultiLineString(lines) => capsules(lines, distance),
        Geometry::Polygon(polygon) => grow_or_shrink(MultiPolygon::new(vec![polygon.clone()]), distance),
        Geometry::MultiPolygon(polygons) => grow_or_shrink(polygons.clone(), distance),
        other => {
            return Err(Error::InvalidType(format!("cannot buffer {other:?}")));
        }
    };
    if buffered.0.is_empty() {
        return Err(Error::InvalidInput(format!("buffer by {distance} leaves an empty geometry")));
    }
    Ok(collapse(buffered))
}

fn grow_or_shrink(polygons: MultiPolygon<f64>, distance: f64) -> MultiPolygon<f64> {
    let strip = capsules(rings(&polygons), distance.abs());
    if distance > 0.0 {
        polygons.union(&strip)
    } else {
        polygons.difference(&strip)
    }
}

/// A multi polygon with a single member is returned as a plain polygon.
pub(crate) fn collapse(mut polygons: MultiPolygon<f64>) -> Geometry<f64> {
    if polygons.0.len() == 1 {
        Geometry::Polygon(polygons.0.remove(0))
    } else {
        Geometry::MultiPolygon(polygons)
    }
}
