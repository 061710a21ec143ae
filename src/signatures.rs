/*!
Row aligned pairs of pixel coordinates and spectral vectors.

A [`Signatures`] can only be obtained through its named factories, each of which checks that the two sides have
the same number of rows. Every filtering operation applies the same row selection to both sides.
 */
use std::{ops::Range, path::Path};

use polars::prelude::*;

use crate::{
    cube::SpectralImage,
    error::{Error, Result},
    io,
    pixels::{PixelCoordinate, Pixels, X_COLUMN, Y_COLUMN},
    signals::Signals,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Signatures {
    pixels: Pixels,
    signals: Signals,
}

impl Signatures {
    fn new(pixels: Pixels, signals: Signals) -> Result<Self> {
        if pixels.len() != signals.len() {
            return Err(Error::InvalidInput(format!(
                "{} pixels for {} signals",
                pixels.len(),
                signals.len()
            )));
        }
        Ok(Self { pixels, signals })
    }

    /// Zero row signatures with `bands` band columns.
    pub(crate) fn empty(bands: usize) -> Self {
        Self {
            pixels: Pixels::default(),
            signals: Signals::empty(bands),
        }
    }

    /**
    Look up the spectral vector of every pixel in the image cube.

    # Errors
    Fails on the first pixel that is not an exact coordinate of the image.
     */
    pub fn from_array_and_pixels<I>(image: &I, pixels: Pixels) -> Result<Self>
    where
        I: SpectralImage + ?Sized,
    {
        let rows = pixels
            .iter()
            .map(|pixel| image.lookup_exact(pixel.x, pixel.y))
            .collect::<Result<Vec<_>>>()?;
        let signals = if rows.is_empty() {
            Signals::empty(image.bands())
        } else {
            Signals::from_iterable(rows)?
        };
        Self::new(pixels, signals)
    }

    pub fn from_signals_and_pixels(signals: Signals, pixels: Pixels) -> Result<Self> {
        Self::new(pixels, signals)
    }

    /**
    Build from a combined table: the pixel columns (`x`,`y` or `u`,`v`) and every other column as a band, in
    table order.
     */
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let names = df.get_column_names();
        let pixel_columns: &[&str] = if names.contains(&X_COLUMN) && names.contains(&Y_COLUMN) {
            &[X_COLUMN, Y_COLUMN]
        } else if names.contains(&"u") && names.contains(&"v") {
            &["u", "v"]
        } else {
            return Err(Error::InvalidInput(format!(
                "signature table needs pixel columns, got {names:?}"
            )));
        };
        let pixels = Pixels::from_dataframe(&df.select(pixel_columns.iter().copied())?)?;
        let band_columns = names
            .iter()
            .filter(|name| !pixel_columns.contains(*name))
            .copied()
            .collect::<Vec<_>>();
        let signals = if band_columns.is_empty() {
            Signals::from_iterable(vec![Vec::<f32>::new(); pixels.len()])?
        } else {
            Signals::from_dataframe(&df.select(band_columns)?)?
        };
        Self::new(pixels, signals)
    }

    /// Combined table: `x`, `y`, then one column per band.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = self.pixels.to_dataframe()?.get_columns().to_vec();
        columns.extend(self.signals.band_series(|band| band.to_string()));
        Ok(DataFrame::new(columns)?)
    }

    pub fn pixels(&self) -> &Pixels {
        &self.pixels
    }

    pub fn signals(&self) -> &Signals {
        &self.signals
    }

    pub fn into_parts(self) -> (Pixels, Signals) {
        (self.pixels, self.signals)
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn slice(&self, range: Range<usize>) -> Result<Self> {
        Self::new(self.pixels.slice(range.clone())?, self.signals.slice(range)?)
    }

    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        Self::new(self.pixels.select(indices)?, self.signals.select(indices)?)
    }

    pub fn filter(&self, mask: &[bool]) -> Result<Self> {
        Self::new(self.pixels.filter(mask)?, self.signals.filter(mask)?)
    }

    /// Keep the rows for which `predicate` holds on the (pixel, signal) pair.
    pub fn filter_rows<F>(&self, mut predicate: F) -> Result<Self>
    where
        F: FnMut(&PixelCoordinate, &[f32]) -> bool,
    {
        let mask = self
            .pixels
            .iter()
            .zip(self.signals.rows())
            .map(|(pixel, signal)| predicate(pixel, signal.as_slice()))
            .collect::<Vec<_>>();
        self.filter(&mask)
    }

    pub fn select_bands(&self, bands: &[usize]) -> Result<Self> {
        Self::new(self.pixels.clone(), self.signals.select_bands(bands)?)
    }

    pub fn save_to_parquet(&self, path: impl AsRef<Path>) -> Result<()> {
        io::write_table(path.as_ref(), &mut self.to_dataframe()?)
    }

    pub fn load_from_parquet(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_dataframe(&io::read_table(path.as_ref())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::ImageCube;

    fn sample() -> Signatures {
        let pixels = Pixels::from_iterable([(0i64, 0i64), (1, 0), (2, 1)]).unwrap();
        let signals = Signals::from_iterable(vec![vec![1.0f32, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        Signatures::from_signals_and_pixels(signals, pixels).unwrap()
    }

    #[test]
    fn mismatched_rows_are_rejected() {
        let pixels = Pixels::from_iterable([(0i64, 0i64)]).unwrap();
        let signals = Signals::from_iterable(vec![vec![1.0f32], vec![2.0]]).unwrap();
        let err = Signatures::from_signals_and_pixels(signals, pixels).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn filtering_keeps_rows_aligned() {
        let signatures = sample();
        let kept = signatures.filter(&[false, true, true]).unwrap();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept.pixels().x(), vec![1.0, 2.0]);
        assert_eq!(kept.signals().get(0), Some(&[3.0f32, 4.0][..]));

        let picked = signatures.select(&[2, 0]).unwrap();
        assert_eq!(picked.pixels().get(0).map(|p| p.y), Some(1.0));
        assert_eq!(picked.signals().get(0), Some(&[5.0f32, 6.0][..]));

        let bright = signatures.filter_rows(|_, signal| signal[0] > 2.0).unwrap();
        assert_eq!(bright.pixels().x(), vec![1.0, 2.0]);

        let sliced = signatures.slice(0..1).unwrap();
        assert_eq!(sliced.signals().len(), sliced.pixels().len());
        assert_eq!(signatures.len(), 3);
    }

    #[test]
    fn band_selection_leaves_pixels() {
        let signatures = sample().select_bands(&[1]).unwrap();
        assert_eq!(signatures.signals().bands(), 1);
        assert_eq!(signatures.pixels().len(), 3);
    }

    #[test]
    fn combined_table() {
        let df = sample().to_dataframe().unwrap();
        assert_eq!(df.get_column_names(), vec!["x", "y", "0", "1"]);
        assert_eq!(Signatures::from_dataframe(&df).unwrap(), sample());
    }

    #[test]
    fn combined_table_without_pixels_is_rejected() {
        let df = DataFrame::new(vec![Series::new("0", &[1.0f32])]).unwrap();
        assert!(Signatures::from_dataframe(&df).is_err());
    }

    #[test]
    fn from_array_and_pixels_reads_cube() {
        let cube = ImageCube::from_fn(3, 2, 2, |x, y, band| (x * 10 + y * 100 + band) as f32).unwrap();
        let pixels = Pixels::from_iterable([(2i64, 1i64), (0, 0)]).unwrap();
        let signatures = Signatures::from_array_and_pixels(&cube, pixels).unwrap();
        assert_eq!(signatures.signals().get(0), Some(&[120.0f32, 121.0][..]));
        assert_eq!(signatures.signals().get(1), Some(&[0.0f32, 1.0][..]));

        let outside = Pixels::from_iterable([(5i64, 5i64)]).unwrap();
        assert!(Signatures::from_array_and_pixels(&cube, outside).is_err());
    }

    #[test]
    fn parquet_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signatures.parquet");
        let signatures = sample();
        signatures.save_to_parquet(&path).unwrap();
        assert_eq!(Signatures::load_from_parquet(&path).unwrap(), signatures);
    }
}
