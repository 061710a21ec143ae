/*!
Prepared polygon for repeated point-in-polygon tests on a grid.

Edges are indexed once. For a given row the polygon is reduced to a sorted list of closed x spans covering the
interior and the boundary of that row, so testing a grid point is a binary search instead of a walk over every
edge. Points on the boundary are inside.
 */
use geo::{CoordsIter, Polygon};

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
struct Edge {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl Edge {
    fn is_horizontal(&self) -> bool {
        (self.y1 - self.y0).abs() <= EPSILON
    }

    fn x_at(&self, y: f64) -> f64 {
        self.x0 + (y - self.y0) * (self.x1 - self.x0) / (self.y1 - self.y0)
    }

    fn y_range(&self) -> (f64, f64) {
        (self.y0.min(self.y1), self.y0.max(self.y1))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PreparedPolygon {
    edges: Vec<Edge>,
}

impl PreparedPolygon {
    pub(crate) fn new(polygon: &Polygon<f64>) -> Self {
        let edges = std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .flat_map(|ring| ring.lines())
            .map(|line| Edge {
                x0: line.start.x,
                y0: line.start.y,
                x1: line.end.x,
                y1: line.end.y,
            })
            .collect::<Vec<_>>();
        // A ring reduced to a single coordinate has no line, keep it as a degenerate edge.
        let edges = if edges.is_empty() {
            polygon
                .exterior_coords_iter()
                .take(1)
                .map(|c| Edge { x0: c.x, y0: c.y, x1: c.x, y1: c.y })
                .collect()
        } else {
            edges
        };
        Self { edges }
    }

    /**
    Closed spans of the row at height `y` that are inside or on the boundary of the polygon.
     */
    pub(crate) fn row(&self, y: f64) -> RowSpans {
        let mut crossings = self
            .edges
            .iter()
            .filter(|edge| !edge.is_horizontal())
            .filter(|edge| (edge.y0 <= y && y < edge.y1) || (edge.y1 <= y && y < edge.y0))
            .map(|edge| edge.x_at(y))
            .collect::<Vec<_>>();
        crossings.sort_by(f64::total_cmp);

        let mut spans = crossings
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
            .collect::<Vec<_>>();

        for edge in &self.edges {
            let (low, high) = edge.y_range();
            if y < low - EPSILON || y > high + EPSILON {
                continue;
            }
            if edge.is_horizontal() {
                spans.push((edge.x0.min(edge.x1), edge.x0.max(edge.x1)));
            } else {
                let x = edge.x_at(y);
                spans.push((x, x));
            }
        }
        RowSpans::merged(spans)
    }

    pub(crate) fn intersects_point(&self, x: f64, y: f64) -> bool {
        self.row(y).contains(x)
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RowSpans {
    spans: Vec<(f64, f64)>,
}

impl RowSpans {
    fn merged(mut spans: Vec<(f64, f64)>) -> Self {
        spans.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut merged: Vec<(f64, f64)> = Vec::with_capacity(spans.len());
        for (start, end) in spans {
            match merged.last_mut() {
                Some(last) if start <= last.1 + EPSILON => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }
        Self { spans: merged }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub(crate) fn contains(&self, x: f64) -> bool {
        let i = self.spans.partition_point(|span| span.1 < x - EPSILON);
        self.spans
            .get(i)
            .map_or(false, |span| span.0 <= x + EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Intersects, Point};

    #[test]
    fn triangle_boundary_is_inside() {
        let triangle = polygon![(x: 2.0, y: 1.0), (x: 3.0, y: 3.0), (x: 2.0, y: 3.0)];
        let prepared = PreparedPolygon::new(&triangle);
        assert!(prepared.intersects_point(2.0, 1.0));
        assert!(prepared.intersects_point(2.0, 2.0));
        assert!(prepared.intersects_point(3.0, 3.0));
        assert!(prepared.intersects_point(2.5, 2.0));
        assert!(!prepared.intersects_point(3.0, 2.0));
        assert!(!prepared.intersects_point(3.0, 1.0));
    }

    #[test]
    fn holes_are_outside_but_their_edges_are_not() {
        let square = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 6.0, y: 0.0), (x: 6.0, y: 6.0), (x: 0.0, y: 6.0)],
            interiors: [[(x: 2.0, y: 2.0), (x: 4.0, y: 2.0), (x: 4.0, y: 4.0), (x: 2.0, y: 4.0)]]
        );
        let prepared = PreparedPolygon::new(&square);
        assert!(!prepared.intersects_point(3.0, 3.0));
        assert!(prepared.intersects_point(2.0, 3.0));
        assert!(prepared.intersects_point(1.0, 3.0));
        assert!(prepared.intersects_point(6.0, 6.0));
        assert!(!prepared.intersects_point(7.0, 3.0));
    }

    #[test]
    fn degenerate_polygon_is_a_segment() {
        let segment = polygon![(x: 0.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 0.0)];
        let prepared = PreparedPolygon::new(&segment);
        assert!(prepared.intersects_point(2.0, 2.0));
        assert!(!prepared.intersects_point(2.0, 3.0));
        assert!(prepared.row(5.0).is_empty());
    }

    #[test]
    fn agrees_with_geo_intersects() {
        let concave = polygon![
            (x: 0.0, y: 0.0),
            (x: 8.0, y: 0.0),
            (x: 8.0, y: 7.0),
            (x: 4.0, y: 3.0),
            (x: 0.0, y: 7.0)
        ];
        let prepared = PreparedPolygon::new(&concave);
        for y in -1..=8 {
            let row = prepared.row(y as f64);
            for x in -1..=9 {
                let point = Point::new(x as f64, y as f64);
                assert_eq!(
                    row.contains(x as f64),
                    concave.intersects(&point),
                    "disagreement at ({x}, {y})"
                );
            }
        }
    }
}
