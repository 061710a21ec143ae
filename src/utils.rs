use geo::{Coord, LineString};

use crate::pixels::{PixelCoordinate, Pixels};

const GRID_TOLERANCE: f64 = 1e-9;

pub trait PixelsExt {
    fn to_coords(&self) -> Vec<Coord<f64>>;
    fn to_closed_ring(&self) -> LineString<f64>;
}

impl PixelsExt for Pixels {
    fn to_coords(&self) -> Vec<Coord<f64>> {
        self.iter().map(|pixel| Coord::from(*pixel)).collect()
    }

    fn to_closed_ring(&self) -> LineString<f64> {
        close_ring(self.to_coords())
    }
}

pub trait CoordExt {
    fn to_pixel(&self) -> PixelCoordinate;
}

impl CoordExt for Coord<f64> {
    fn to_pixel(&self) -> PixelCoordinate {
        PixelCoordinate::new(self.x, self.y)
    }
}

/**
Append the first coordinate at the end of the ring if it is not already closed.
 */
pub(crate) fn close_ring(mut coords: Vec<Coord<f64>>) -> LineString<f64> {
    if let (Some(first), Some(last)) = (coords.first().copied(), coords.last().copied()) {
        if first != last {
            coords.push(first);
        }
    }
    LineString::new(coords)
}

/**
Multiples of `resolution` lying in `[min, max]`: the lower bound is snapped up and the upper bound down.
 */
pub(crate) fn grid_axis(min: f64, max: f64, resolution: f64) -> Vec<f64> {
    let start = (min / resolution - GRID_TOLERANCE).ceil() as i64;
    let end = (max / resolution + GRID_TOLERANCE).floor() as i64;
    (start..=end).map(|k| k as f64 * resolution).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_is_closed_once() {
        let open = Pixels::from_iterable([(0i64, 0i64), (1, 0), (1, 1)]).unwrap();
        assert_eq!(open.to_closed_ring().0.len(), 4);
        let closed = Pixels::from_iterable([(0i64, 0i64), (1, 0), (1, 1), (0, 0)]).unwrap();
        assert_eq!(closed.to_closed_ring().0.len(), 4);
    }

    #[test]
    fn grid_snaps_inwards() {
        assert_eq!(grid_axis(0.5, 3.5, 1.0), vec![1.0, 2.0, 3.0]);
        assert_eq!(grid_axis(10.0, 12.0, 1.0), vec![10.0, 11.0, 12.0]);
        assert_eq!(grid_axis(0.0, 5.0, 2.0), vec![0.0, 2.0, 4.0]);
        assert!(grid_axis(1.4, 1.6, 1.0).is_empty());
        assert_eq!(grid_axis(0.3, 0.3, 0.1).len(), 1);
    }
}
