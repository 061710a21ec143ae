/*!
Spectral image cubes.

[`SpectralImage`] is the narrow capability the extraction needs: coordinate axes, exact and nearest lookups.
[`ImageCube`] is the in-memory implementation, laid out as `[y][x][band]`.
 */
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use geo::{coord, Rect};
use log::debug;

use crate::{
    error::{Error, Result},
    pixels::Pixels,
    shapes::GeometricShapes,
};

const AXIS_TOLERANCE: f64 = 1e-9;

pub trait SpectralImage {
    /// Column coordinates, strictly increasing.
    fn x_coords(&self) -> &[f64];
    /// Row coordinates, strictly increasing.
    fn y_coords(&self) -> &[f64];
    fn bands(&self) -> usize;
    /// Spectral vector at exactly `(x, y)`.
    fn lookup_exact(&self, x: f64, y: f64) -> Result<Vec<f32>>;
    /// Spectral vector of the pixel closest to `(x, y)`.
    fn lookup_nearest(&self, x: f64, y: f64) -> Result<Vec<f32>>;

    fn x_coords_within(&self, min: f64, max: f64) -> Vec<f64> {
        within(self.x_coords(), min, max)
    }

    fn y_coords_within(&self, min: f64, max: f64) -> Vec<f64> {
        within(self.y_coords(), min, max)
    }

    /// `(rows, cols, bands)`
    fn shape(&self) -> (usize, usize, usize) {
        (self.y_coords().len(), self.x_coords().len(), self.bands())
    }

    fn bounds(&self) -> Option<Rect<f64>> {
        let (xs, ys) = (self.x_coords(), self.y_coords());
        Some(Rect::new(
            coord! { x: *xs.first()?, y: *ys.first()? },
            coord! { x: *xs.last()?, y: *ys.last()? },
        ))
    }

    fn filepath(&self) -> Result<&Path> {
        Err(Error::NotImplemented("filepath"))
    }

    fn metadata(&self) -> Result<&HashMap<String, String>> {
        Err(Error::NotImplemented("metadata"))
    }

    fn default_bands(&self) -> Result<Vec<usize>> {
        Err(Error::NotImplemented("default_bands"))
    }

    fn wavelengths(&self) -> Result<Vec<f64>> {
        Err(Error::NotImplemented("wavelengths"))
    }

    fn camera_id(&self) -> Result<String> {
        Err(Error::NotImplemented("camera_id"))
    }
}

fn within(axis: &[f64], min: f64, max: f64) -> Vec<f64> {
    axis.iter()
        .copied()
        .filter(|value| *value >= min - AXIS_TOLERANCE && *value <= max + AXIS_TOLERANCE)
        .collect()
}

/// Index of `value` in a sorted axis, if present.
fn exact_index(axis: &[f64], value: f64) -> Option<usize> {
    let i = axis.partition_point(|v| *v < value - AXIS_TOLERANCE);
    axis.get(i)
        .filter(|v| (**v - value).abs() <= AXIS_TOLERANCE)
        .map(|_| i)
}

fn nearest_index(axis: &[f64], value: f64) -> Option<usize> {
    if axis.is_empty() || value.is_nan() {
        return None;
    }
    let i = axis.partition_point(|v| *v < value);
    if i == 0 {
        return Some(0);
    }
    if i == axis.len() {
        return Some(axis.len() - 1);
    }
    if (value - axis[i - 1]) <= (axis[i] - value) {
        Some(i - 1)
    } else {
        Some(i)
    }
}

fn check_axis(name: &str, axis: &[f64], len: usize) -> Result<()> {
    if axis.len() != len {
        return Err(Error::InvalidInput(format!(
            "{name} axis has {} coordinates for {len} pixels",
            axis.len()
        )));
    }
    if axis.windows(2).any(|w| !(w[0] < w[1])) {
        return Err(Error::InvalidInput(format!("{name} axis must be strictly increasing")));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ImageCube {
    width: usize,
    height: usize,
    bands: usize,
    data: Vec<f32>,
    x_coords: Vec<f64>,
    y_coords: Vec<f64>,
    path: Option<PathBuf>,
    metadata: HashMap<String, String>,
    wavelengths: Option<Vec<f64>>,
    camera_id: Option<String>,
    geometric_shapes: GeometricShapes,
}

impl ImageCube {
    /**
    Wrap raw cube data laid out as `[y][x][band]`. Coordinates default to the pixel indices.
     */
    pub fn new(width: usize, height: usize, bands: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != width * height * bands {
            return Err(Error::InvalidInput(format!(
                "cube of {width}x{height}x{bands} needs {} values, got {}",
                width * height * bands,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            bands,
            data,
            x_coords: (0..width).map(|x| x as f64).collect(),
            y_coords: (0..height).map(|y| y as f64).collect(),
            path: None,
            metadata: HashMap::new(),
            wavelengths: None,
            camera_id: None,
            geometric_shapes: GeometricShapes::new("in-memory"),
        })
    }

    pub fn from_fn<F>(width: usize, height: usize, bands: usize, f: F) -> Result<Self>
    where
        F: Fn(usize, usize, usize) -> f32,
    {
        let mut data = Vec::with_capacity(width * height * bands);
        for y in 0..height {
            for x in 0..width {
                for band in 0..bands {
                    data.push(f(x, y, band));
                }
            }
        }
        Self::new(width, height, bands, data)
    }

    /**
    Open a raster image (any format the `image` crate reads) as a 3 band RGB cube with values in `[0, 1]`.
     */
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let rgb = image::open(path)?.into_rgb32f();
        let (width, height) = (rgb.width() as usize, rgb.height() as usize);
        debug!("Opened {:?} ({}x{})", path, width, height);

        let mut cube = Self::new(width, height, 3, rgb.into_raw())?;
        cube.metadata.insert("width".to_string(), width.to_string());
        cube.metadata.insert("height".to_string(), height.to_string());
        cube.camera_id = Some("rgb".to_string());
        cube.geometric_shapes = GeometricShapes::new(path.display().to_string());
        cube.path = Some(path.to_path_buf());
        Ok(cube)
    }

    pub fn with_coords(mut self, x_coords: Vec<f64>, y_coords: Vec<f64>) -> Result<Self> {
        check_axis("x", &x_coords, self.width)?;
        check_axis("y", &y_coords, self.height)?;
        self.x_coords = x_coords;
        self.y_coords = y_coords;
        Ok(self)
    }

    pub fn with_wavelengths(mut self, wavelengths: Vec<f64>) -> Result<Self> {
        if wavelengths.len() != self.bands {
            return Err(Error::InvalidInput(format!(
                "{} wavelengths for {} bands",
                wavelengths.len(),
                self.bands
            )));
        }
        self.wavelengths = Some(wavelengths);
        Ok(self)
    }

    pub fn with_camera_id(mut self, camera_id: impl Into<String>) -> Self {
        self.camera_id = Some(camera_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn geometric_shapes(&self) -> &GeometricShapes {
        &self.geometric_shapes
    }

    pub fn geometric_shapes_mut(&mut self) -> &mut GeometricShapes {
        &mut self.geometric_shapes
    }

    fn signal_at(&self, col: usize, row: usize) -> Vec<f32> {
        let start = (row * self.width + col) * self.bands;
        self.data[start..start + self.bands].to_vec()
    }

    /// Mean of every band over the whole cube, ignoring NaN values.
    pub fn average_intensity(&self) -> Vec<f32> {
        let mut sums = vec![0.0f64; self.bands];
        let mut counts = vec![0usize; self.bands];
        for pixel in self.data.chunks_exact(self.bands.max(1)) {
            for (band, value) in pixel.iter().enumerate() {
                if !value.is_nan() {
                    sums[band] += *value as f64;
                    counts[band] += 1;
                }
            }
        }
        sums.into_iter()
            .zip(counts)
            .map(|(sum, count)| if count == 0 { f32::NAN } else { (sum / count as f64) as f32 })
            .collect()
    }

    /**
    Crop the cube to the bounding box of `pixels`. Pixels of the box that are not listed are set to NaN.
     */
    pub fn to_subarray(&self, pixels: &Pixels) -> Result<Self> {
        let indices = pixels
            .iter()
            .map(|pixel| {
                match (exact_index(&self.x_coords, pixel.x), exact_index(&self.y_coords, pixel.y)) {
                    (Some(col), Some(row)) => Ok((col, row)),
                    _ => Err(Error::InvalidInput(format!(
                        "pixel ({}, {}) is not in the image",
                        pixel.x, pixel.y
                    ))),
                }
            })
            .collect::<Result<Vec<_>>>()?;
        let (Some(col_min), Some(col_max), Some(row_min), Some(row_max)) = (
            indices.iter().map(|i| i.0).min(),
            indices.iter().map(|i| i.0).max(),
            indices.iter().map(|i| i.1).min(),
            indices.iter().map(|i| i.1).max(),
        ) else {
            return Err(Error::InvalidInput("no pixel to crop to".to_string()));
        };
        let (width, height) = (col_max - col_min + 1, row_max - row_min + 1);
        let mut data = vec![f32::NAN; width * height * self.bands];
        for (col, row) in indices {
            let start = ((row - row_min) * width + (col - col_min)) * self.bands;
            data[start..start + self.bands].copy_from_slice(&self.signal_at(col, row));
        }
        let mut cube = Self::new(width, height, self.bands, data)?.with_coords(
            self.x_coords[col_min..=col_max].to_vec(),
            self.y_coords[row_min..=row_max].to_vec(),
        )?;
        cube.wavelengths = self.wavelengths.clone();
        cube.camera_id = self.camera_id.clone();
        cube.metadata = self.metadata.clone();
        Ok(cube)
    }
}

impl SpectralImage for ImageCube {
    fn x_coords(&self) -> &[f64] {
        &self.x_coords
    }

    fn y_coords(&self) -> &[f64] {
        &self.y_coords
    }

    fn bands(&self) -> usize {
        self.bands
    }

    fn lookup_exact(&self, x: f64, y: f64) -> Result<Vec<f32>> {
        match (exact_index(&self.x_coords, x), exact_index(&self.y_coords, y)) {
            (Some(col), Some(row)) => Ok(self.signal_at(col, row)),
            _ => Err(Error::InvalidInput(format!("no pixel at ({x}, {y})"))),
        }
    }

    fn lookup_nearest(&self, x: f64, y: f64) -> Result<Vec<f32>> {
        match (nearest_index(&self.x_coords, x), nearest_index(&self.y_coords, y)) {
            (Some(col), Some(row)) => Ok(self.signal_at(col, row)),
            _ => Err(Error::InvalidInput(format!("no pixel near ({x}, {y})"))),
        }
    }

    fn filepath(&self) -> Result<&Path> {
        self.path
            .as_deref()
            .ok_or_else(|| Error::InvalidInput("cube was not loaded from a file".to_string()))
    }

    fn metadata(&self) -> Result<&HashMap<String, String>> {
        Ok(&self.metadata)
    }

    fn default_bands(&self) -> Result<Vec<usize>> {
        Ok((0..self.bands.min(3)).collect())
    }

    fn wavelengths(&self) -> Result<Vec<f64>> {
        self.wavelengths
            .clone()
            .ok_or_else(|| Error::InvalidInput("no wavelengths recorded for this image".to_string()))
    }

    fn camera_id(&self) -> Result<String> {
        self.camera_id
            .clone()
            .ok_or_else(|| Error::InvalidInput("no camera id recorded for this image".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube() -> ImageCube {
        ImageCube::from_fn(4, 3, 2, |x, y, band| (x * 10 + y * 100 + band) as f32).unwrap()
    }

    struct AxesOnly;

    impl SpectralImage for AxesOnly {
        fn x_coords(&self) -> &[f64] {
            &[0.0, 1.0]
        }
        fn y_coords(&self) -> &[f64] {
            &[0.0]
        }
        fn bands(&self) -> usize {
            1
        }
        fn lookup_exact(&self, _: f64, _: f64) -> Result<Vec<f32>> {
            Ok(vec![0.0])
        }
        fn lookup_nearest(&self, _: f64, _: f64) -> Result<Vec<f32>> {
            Ok(vec![0.0])
        }
    }

    #[test]
    fn exact_lookup() {
        let cube = cube();
        assert_eq!(cube.lookup_exact(3.0, 2.0).unwrap(), vec![230.0, 231.0]);
        assert!(cube.lookup_exact(4.0, 0.0).is_err());
        assert!(cube.lookup_exact(0.5, 0.0).is_err());
    }

    #[test]
    fn nearest_lookup_snaps_and_clamps() {
        let cube = cube();
        assert_eq!(cube.lookup_nearest(0.6, 1.4).unwrap(), vec![110.0, 111.0]);
        assert_eq!(cube.lookup_nearest(-5.0, 99.0).unwrap(), vec![200.0, 201.0]);
    }

    #[test]
    fn axis_restriction_is_inclusive() {
        let cube = cube();
        assert_eq!(cube.x_coords_within(1.0, 2.0), vec![1.0, 2.0]);
        assert!(cube.y_coords_within(10.0, 20.0).is_empty());
        assert_eq!(cube.shape(), (3, 4, 2));
    }

    #[test]
    fn custom_coordinates() {
        let cube = cube()
            .with_coords(vec![10.0, 12.0, 14.0, 16.0], vec![0.5, 1.5, 2.5])
            .unwrap();
        assert_eq!(cube.lookup_exact(12.0, 2.5).unwrap(), vec![210.0, 211.0]);
        assert!(cube.clone().with_coords(vec![1.0, 0.0, 2.0, 3.0], vec![0.0, 1.0, 2.0]).is_err());
        let bounds = cube.bounds().unwrap();
        assert_eq!(bounds.min().x, 10.0);
        assert_eq!(bounds.max().y, 2.5);
    }

    #[test]
    fn unimplemented_facts() {
        assert!(matches!(AxesOnly.wavelengths(), Err(Error::NotImplemented(_))));
        assert!(matches!(AxesOnly.camera_id(), Err(Error::NotImplemented(_))));
        assert_eq!(AxesOnly.shape(), (1, 2, 1));
        assert_eq!(cube().default_bands().unwrap(), vec![0, 1]);
    }

    #[test]
    fn average_and_subarray() {
        let cube = cube();
        assert_eq!(cube.average_intensity(), vec![115.0, 116.0]);

        let pixels = Pixels::from_iterable([(1i64, 1i64), (2, 2)]).unwrap();
        let sub = cube.to_subarray(&pixels).unwrap();
        assert_eq!(sub.shape(), (2, 2, 2));
        assert_eq!(sub.lookup_exact(2.0, 2.0).unwrap(), vec![220.0, 221.0]);
        assert!(sub.lookup_exact(2.0, 1.0).unwrap()[0].is_nan());
    }

    #[test]
    fn missing_file() {
        assert!(matches!(ImageCube::open("/no/such/image.png"), Err(Error::FileNotFound(_))));
    }
}
