/*!
Ordered collections of 2D pixel coordinates.
 */
use std::{ops::Range, path::Path};

use polars::prelude::*;

use crate::{
    error::{Error, Result},
    io,
};

pub const X_COLUMN: &str = "x";
pub const Y_COLUMN: &str = "y";
const LEGACY_X_COLUMN: &str = "u";
const LEGACY_Y_COLUMN: &str = "v";
const HOMOGENEOUS_COLUMN: &str = "homogeneous";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelCoordinate {
    pub x: f64,
    pub y: f64,
}

impl PixelCoordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for PixelCoordinate {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for PixelCoordinate {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<PixelCoordinate> for geo::Coord<f64> {
    fn from(pixel: PixelCoordinate) -> Self {
        geo::Coord { x: pixel.x, y: pixel.y }
    }
}

/**
A row accepted by [`Pixels::from_iterable`].
Tuples and fixed arrays always have two values, slices and vectors are checked.
 */
pub trait CoordinateRow {
    fn values(&self) -> Vec<f64>;
}

impl CoordinateRow for (f64, f64) {
    fn values(&self) -> Vec<f64> {
        vec![self.0, self.1]
    }
}

impl CoordinateRow for (i64, i64) {
    fn values(&self) -> Vec<f64> {
        vec![self.0 as f64, self.1 as f64]
    }
}

impl CoordinateRow for [f64; 2] {
    fn values(&self) -> Vec<f64> {
        self.to_vec()
    }
}

impl CoordinateRow for PixelCoordinate {
    fn values(&self) -> Vec<f64> {
        vec![self.x, self.y]
    }
}

impl CoordinateRow for Vec<f64> {
    fn values(&self) -> Vec<f64> {
        self.clone()
    }
}

impl CoordinateRow for &[f64] {
    fn values(&self) -> Vec<f64> {
        self.to_vec()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pixels {
    coordinates: Vec<PixelCoordinate>,
}

impl Pixels {
    pub fn new(coordinates: Vec<PixelCoordinate>) -> Self {
        Self { coordinates }
    }

    /**
    Build from any sequence of 2-value rows.

    # Errors
    `InvalidInput` if a row does not hold exactly two values.
     */
    pub fn from_iterable<I>(rows: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: CoordinateRow,
    {
        let coordinates = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| match row.values().as_slice() {
                &[x, y] => Ok(PixelCoordinate { x, y }),
                values => Err(Error::InvalidInput(format!(
                    "row {i} has {} values, expected 2",
                    values.len()
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { coordinates })
    }

    /**
    Build from a two column table. Columns are looked up by name (`x`,`y` or the legacy `u`,`v`), not position.
     */
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        if df.width() != 2 {
            return Err(Error::InvalidInput(format!(
                "pixel table must have 2 columns, got {}",
                df.width()
            )));
        }
        let names = df.get_column_names();
        let (x_name, y_name) = if names.contains(&X_COLUMN) && names.contains(&Y_COLUMN) {
            (X_COLUMN, Y_COLUMN)
        } else if names.contains(&LEGACY_X_COLUMN) && names.contains(&LEGACY_Y_COLUMN) {
            (LEGACY_X_COLUMN, LEGACY_Y_COLUMN)
        } else {
            return Err(Error::InvalidInput(format!(
                "pixel table columns must be (x, y) or (u, v), got {names:?}"
            )));
        };
        let xs = io::f64_column(df, x_name)?;
        let ys = io::f64_column(df, y_name)?;
        Ok(Self::new(
            xs.into_iter().zip(ys).map(PixelCoordinate::from).collect(),
        ))
    }

    pub fn to_dataframe(&self) -> Result<DataFrame> {
        Ok(DataFrame::new(vec![
            Series::new(X_COLUMN, self.x().as_slice()),
            Series::new(Y_COLUMN, self.y().as_slice()),
        ])?)
    }

    /**
    Table with an extra constant column of ones, for affine transforms in matrix form.
     */
    pub fn df_homogeneous(&self) -> Result<DataFrame> {
        let mut df = self.to_dataframe()?;
        df.with_column(Series::new(HOMOGENEOUS_COLUMN, vec![1.0f64; self.len()]))?;
        Ok(df)
    }

    pub fn to_homogeneous(&self) -> Vec<[f64; 3]> {
        self.coordinates.iter().map(|c| [c.x, c.y, 1.0]).collect()
    }

    /**
    Apply a 3x3 affine matrix (row major, last row `[0, 0, 1]` for a pure affine map).
     */
    pub fn transform(&self, matrix: &[[f64; 3]; 3]) -> Self {
        let coordinates = self
            .to_homogeneous()
            .into_iter()
            .map(|row| {
                let apply = |r: &[f64; 3]| r[0] * row[0] + r[1] * row[1] + r[2] * row[2];
                let w = apply(&matrix[2]);
                let w = if w == 0.0 { 1.0 } else { w };
                PixelCoordinate::new(apply(&matrix[0]) / w, apply(&matrix[1]) / w)
            })
            .collect();
        Self { coordinates }
    }

    pub fn x(&self) -> Vec<f64> {
        self.coordinates.iter().map(|c| c.x).collect()
    }

    pub fn y(&self) -> Vec<f64> {
        self.coordinates.iter().map(|c| c.y).collect()
    }

    pub fn u(&self) -> Vec<f64> {
        self.x()
    }

    pub fn v(&self) -> Vec<f64> {
        self.y()
    }

    pub fn to_array(&self) -> Vec<[f64; 2]> {
        self.coordinates.iter().map(|c| [c.x, c.y]).collect()
    }

    pub fn coordinates(&self) -> &[PixelCoordinate] {
        &self.coordinates
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PixelCoordinate> {
        self.coordinates.iter()
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<PixelCoordinate> {
        self.coordinates.get(index).copied()
    }

    pub fn slice(&self, range: Range<usize>) -> Result<Self> {
        self.coordinates
            .get(range.clone())
            .map(|rows| Self::new(rows.to_vec()))
            .ok_or_else(|| Error::InvalidInput(format!("slice {range:?} out of bounds for {} pixels", self.len())))
    }

    /**
    Select rows by index, in the order given.
     */
    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        let coordinates = indices
            .iter()
            .map(|&i| {
                self.get(i).ok_or_else(|| {
                    Error::InvalidInput(format!("index {i} out of bounds for {} pixels", self.len()))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { coordinates })
    }

    pub fn filter(&self, mask: &[bool]) -> Result<Self> {
        check_mask_len(mask, self.len())?;
        Ok(Self::new(
            self.coordinates
                .iter()
                .zip(mask)
                .filter(|(_, keep)| **keep)
                .map(|(c, _)| *c)
                .collect(),
        ))
    }

    pub fn save_to_parquet(&self, path: impl AsRef<Path>) -> Result<()> {
        io::write_table(path.as_ref(), &mut self.to_dataframe()?)
    }

    pub fn load_from_parquet(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_dataframe(&io::read_table(path.as_ref())?)
    }
}

impl FromIterator<PixelCoordinate> for Pixels {
    fn from_iter<T: IntoIterator<Item = PixelCoordinate>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Pixels {
    type Item = &'a PixelCoordinate;
    type IntoIter = std::slice::Iter<'a, PixelCoordinate>;

    fn into_iter(self) -> Self::IntoIter {
        self.coordinates.iter()
    }
}

pub(crate) fn check_mask_len(mask: &[bool], len: usize) -> Result<()> {
    if mask.len() != len {
        return Err(Error::InvalidInput(format!(
            "boolean mask has {} entries for {len} rows",
            mask.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Pixels {
        Pixels::from_iterable([(1i64, 2i64), (3, 4), (5, 6)]).unwrap()
    }

    #[test]
    fn from_iterable_keeps_order() {
        let pixels = sample();
        assert_eq!(pixels.x(), vec![1.0, 3.0, 5.0]);
        assert_eq!(pixels.y(), vec![2.0, 4.0, 6.0]);
        assert_eq!(pixels.u(), pixels.x());
        assert_eq!(pixels.to_array()[1], [3.0, 4.0]);
    }

    #[test]
    fn from_iterable_rejects_wrong_row_width() {
        let rows = vec![vec![1.0, 2.0], vec![1.0, 2.0, 3.0]];
        let err = Pixels::from_iterable(rows).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn homogeneous_adds_ones() {
        let pixels = sample();
        let df = pixels.df_homogeneous().unwrap();
        assert_eq!(df.width(), 3);
        assert_eq!(io::f64_column(&df, HOMOGENEOUS_COLUMN).unwrap(), vec![1.0; 3]);
        assert_eq!(pixels.len(), 3);
        assert_eq!(pixels.to_homogeneous()[0], [1.0, 2.0, 1.0]);
    }

    #[test]
    fn transform_translates() {
        let shift = [[1.0, 0.0, 10.0], [0.0, 1.0, -1.0], [0.0, 0.0, 1.0]];
        let moved = sample().transform(&shift);
        assert_eq!(moved.get(0), Some(PixelCoordinate::new(11.0, 1.0)));
    }

    #[test]
    fn indexing_preserves_order() {
        let pixels = sample();
        assert_eq!(pixels.select(&[2, 0]).unwrap().x(), vec![5.0, 1.0]);
        assert_eq!(pixels.filter(&[true, false, true]).unwrap().x(), vec![1.0, 5.0]);
        assert_eq!(pixels.slice(1..3).unwrap().y(), vec![4.0, 6.0]);
        assert!(pixels.select(&[3]).is_err());
        assert!(pixels.filter(&[true]).is_err());
    }

    #[test]
    fn column_order_is_irrelevant() {
        let df = DataFrame::new(vec![
            Series::new("v", &[2i64, 4]),
            Series::new("u", &[1i64, 3]),
        ])
        .unwrap();
        let pixels = Pixels::from_dataframe(&df).unwrap();
        assert_eq!(pixels.x(), vec![1.0, 3.0]);
        assert_eq!(pixels.y(), vec![2.0, 4.0]);
    }

    #[test]
    fn parquet_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixels.parquet");
        let pixels = Pixels::from_iterable([(0.5, 1.25), (3.0, 4.0)]).unwrap();
        pixels.save_to_parquet(&path).unwrap();
        assert_eq!(Pixels::load_from_parquet(&path).unwrap(), pixels);
    }
}
