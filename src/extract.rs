/*!
Extraction of spectral signatures from an image cube inside a shape.
 */
use geo::BoundingRect;
use log::{debug, trace};

use crate::{
    cube::SpectralImage,
    error::Result,
    pixels::{PixelCoordinate, Pixels},
    shapes::{prepared::PreparedPolygon, Shape},
    signals::Signals,
    signatures::Signatures,
};

/**
Signatures of the image pixels covered by `shape`.

Point shapes give a single [`Signatures`] with the nearest image pixel of every point. Other shapes give one
[`Signatures`] per disjoint component, using every native image pixel inside or on the boundary of the component.
A component outside the image gives zero rows, pixels missing from the image are skipped.
 */
pub fn get_signatures_within_convex_hull<I>(image: &I, shape: &Shape) -> Result<Vec<Signatures>>
where
    I: SpectralImage + ?Sized,
{
    if shape.is_point() {
        let pixels = crate::shapes::point_pixels(shape.geometry())?;
        let signals = pixels
            .iter()
            .map(|pixel| image.lookup_nearest(pixel.x, pixel.y))
            .collect::<Result<Vec<_>>>()?;
        return Ok(vec![assemble(image, pixels, signals)?]);
    }

    shape
        .hull_components()
        .iter()
        .enumerate()
        .map(|(i, hull)| {
            let Some(bounds) = hull.bounding_rect() else {
                return Ok(Signatures::empty(image.bands()));
            };
            let xs = image.x_coords_within(bounds.min().x, bounds.max().x);
            let ys = image.y_coords_within(bounds.min().y, bounds.max().y);
            if xs.is_empty() || ys.is_empty() {
                debug!("Component {} of shape {:?} lies outside the image", i, shape.label());
                return Ok(Signatures::empty(image.bands()));
            }

            let prepared = PreparedPolygon::new(hull);
            let rows = ys.iter().map(|y| prepared.row(*y)).collect::<Vec<_>>();

            let mut pixels = Vec::new();
            let mut signals = Vec::new();
            for x in &xs {
                for (y, row) in ys.iter().zip(&rows) {
                    if !row.contains(*x) {
                        continue;
                    }
                    match image.lookup_exact(*x, *y) {
                        Ok(signal) => {
                            pixels.push(PixelCoordinate::new(*x, *y));
                            signals.push(signal);
                        }
                        Err(err) => trace!("Skipping pixel ({}, {}) : {}", x, y, err),
                    }
                }
            }
            debug!(
                "Component {} of shape {:?} covers {} pixels",
                i,
                shape.label(),
                pixels.len()
            );
            assemble(image, Pixels::new(pixels), signals)
        })
        .collect()
}

/// Signatures of the given image pixels. Every pixel must be an exact coordinate of the image.
pub fn get_signatures_from_pixels<I>(image: &I, pixels: Pixels) -> Result<Signatures>
where
    I: SpectralImage + ?Sized,
{
    Signatures::from_array_and_pixels(image, pixels)
}

fn assemble<I>(image: &I, pixels: Pixels, signals: Vec<Vec<f32>>) -> Result<Signatures>
where
    I: SpectralImage + ?Sized,
{
    if signals.is_empty() {
        return Ok(Signatures::empty(image.bands()));
    }
    Signatures::from_signals_and_pixels(Signals::from_iterable(signals)?, pixels)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{cube::ImageCube, error::Error};

    fn cube() -> ImageCube {
        ImageCube::from_fn(10, 8, 3, |x, y, band| (x + 10 * y + 100 * band) as f32).unwrap()
    }

    fn pixels(coords: &[(f64, f64)]) -> Pixels {
        Pixels::from_iterable(coords.iter().copied()).unwrap()
    }

    /// Cube that only holds even columns, anything else fails the exact lookup.
    struct Sparse(ImageCube);

    impl SpectralImage for Sparse {
        fn x_coords(&self) -> &[f64] {
            self.0.x_coords()
        }
        fn y_coords(&self) -> &[f64] {
            self.0.y_coords()
        }
        fn bands(&self) -> usize {
            self.0.bands()
        }
        fn lookup_exact(&self, x: f64, y: f64) -> Result<Vec<f32>> {
            if x as i64 % 2 == 1 {
                return Err(Error::InvalidInput("odd column".to_string()));
            }
            self.0.lookup_exact(x, y)
        }
        fn lookup_nearest(&self, x: f64, y: f64) -> Result<Vec<f32>> {
            self.0.lookup_nearest(x, y)
        }
    }

    #[test]
    fn rectangle_signatures() {
        let shape = Shape::from_rectangle(1.0, 2.0, 3.0, 3.0).unwrap();
        let result = get_signatures_within_convex_hull(&cube(), &shape).unwrap();
        assert_eq!(result.len(), 1);
        let signatures = &result[0];
        assert_eq!(signatures.len(), 6);
        assert_eq!(signatures.pixels().len(), signatures.signals().len());
        for (pixel, signal) in signatures.pixels().iter().zip(signatures.signals().rows()) {
            let base = (pixel.x + 10.0 * pixel.y) as f32;
            assert_eq!(signal, &vec![base, base + 100.0, base + 200.0]);
        }
    }

    #[test]
    fn one_signatures_per_disjoint_component() {
        let rings = [
            pixels(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]),
            pixels(&[(4.0, 4.0), (5.0, 4.0), (5.0, 5.0)]),
            pixels(&[(8.0, 0.0), (9.0, 0.0), (9.0, 2.0), (8.0, 2.0)]),
        ];
        let shape = Shape::from_multipolygon(&rings).unwrap();
        let result = get_signatures_within_convex_hull(&cube(), &shape).unwrap();
        assert_eq!(result.iter().map(Signatures::len).collect::<Vec<_>>(), vec![4, 3, 6]);
    }

    #[test]
    fn triangle_keeps_boundary_pixels() {
        let shape = Shape::from_polygon(&pixels(&[(2.0, 1.0), (3.0, 3.0), (2.0, 3.0)]), None).unwrap();
        let result = get_signatures_within_convex_hull(&cube(), &shape).unwrap();
        let found = result[0]
            .pixels()
            .iter()
            .map(|p| (p.x as i64, p.y as i64))
            .collect::<HashSet<_>>();
        assert_eq!(found, [(2, 1), (2, 2), (2, 3), (3, 3)].into_iter().collect::<HashSet<_>>());
    }

    #[test]
    fn points_use_nearest_pixel_and_stay_grouped() {
        let shape = Shape::from_multipoint(&pixels(&[(2.2, 3.9), (7.0, 1.0), (50.0, -3.0)])).unwrap();
        let result = get_signatures_within_convex_hull(&cube(), &shape).unwrap();
        assert_eq!(result.len(), 1);
        let signatures = &result[0];
        assert_eq!(signatures.pixels().get(0), Some(PixelCoordinate::new(2.2, 3.9)));
        assert_eq!(signatures.signals().get(0), Some(&[42.0f32, 142.0, 242.0][..]));
        assert_eq!(signatures.signals().get(1), Some(&[17.0f32, 117.0, 217.0][..]));
        assert_eq!(signatures.signals().get(2), Some(&[9.0f32, 109.0, 209.0][..]));
    }

    #[test]
    fn line_covers_the_pixels_on_its_segment() {
        let shape = Shape::from_line(&pixels(&[(1.0, 1.0), (4.0, 4.0)])).unwrap();
        let result = get_signatures_within_convex_hull(&cube(), &shape).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].pixels(), &pixels(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0)]));
        assert_eq!(result[0].signals().get(3), Some(&[44.0f32, 144.0, 244.0][..]));
    }

    #[test]
    fn one_signatures_per_line_of_a_multiline() {
        let shape = Shape::from_multiline(&[
            pixels(&[(0.0, 0.0), (3.0, 0.0)]),
            pixels(&[(5.0, 2.0), (5.0, 5.0)]),
        ])
        .unwrap();
        let result = get_signatures_within_convex_hull(&cube(), &shape).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].pixels(), &pixels(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]));
        assert_eq!(result[1].pixels(), &pixels(&[(5.0, 2.0), (5.0, 3.0), (5.0, 4.0), (5.0, 5.0)]));
        let first_band = result[1].signals().rows().iter().map(|row| row[0]).collect::<Vec<_>>();
        assert_eq!(first_band, vec![25.0, 35.0, 45.0, 55.0]);
    }

    #[test]
    fn component_outside_the_image_is_empty() {
        let shape = Shape::from_rectangle(100.0, 100.0, 120.0, 110.0).unwrap();
        let result = get_signatures_within_convex_hull(&cube(), &shape).unwrap();
        assert_eq!(result.len(), 1);
        assert!(result[0].is_empty());
        assert_eq!(result[0].signals().bands(), 3);
    }

    #[test]
    fn partial_overlap_is_clipped() {
        let shape = Shape::from_rectangle(8.0, 6.0, 12.0, 12.0).unwrap();
        let result = get_signatures_within_convex_hull(&cube(), &shape).unwrap();
        assert_eq!(result[0].len(), 4);
    }

    #[test]
    fn failed_lookups_are_skipped() {
        let shape = Shape::from_rectangle(0.0, 0.0, 3.0, 0.0).unwrap();
        let result = get_signatures_within_convex_hull(&Sparse(cube()), &shape).unwrap();
        assert_eq!(result[0].pixels().x(), vec![0.0, 2.0]);
    }

    #[test]
    fn native_resolution_is_used() {
        let xs = (0..10).map(|x| x as f64 * 0.5).collect();
        let ys = (0..8).map(|y| y as f64).collect();
        let cube = cube().with_coords(xs, ys).unwrap();
        let shape = Shape::from_rectangle(0.0, 0.0, 1.0, 0.0).unwrap();
        let result = get_signatures_within_convex_hull(&cube, &shape).unwrap();
        assert_eq!(result[0].pixels().x(), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn from_pixels() {
        let signatures = get_signatures_from_pixels(&cube(), pixels(&[(1.0, 1.0)])).unwrap();
        assert_eq!(signatures.signals().get(0), Some(&[11.0f32, 111.0, 211.0][..]));
    }
}
