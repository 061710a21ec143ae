/*!
Tables of spectral vectors, one row per sample and one positional column per band.
 */
use std::{ops::Range, path::Path};

use polars::prelude::*;

use crate::{
    error::{Error, Result},
    io,
    pixels::check_mask_len,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signals {
    rows: Vec<Vec<f32>>,
    bands: usize,
}

impl Signals {
    /**
    Build from rows of band values.

    # Errors
    `InvalidInput` if the rows do not all have the same band count.
     */
    pub fn from_iterable<I, R>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: Into<Vec<f32>>,
    {
        let rows = rows.into_iter().map(Into::into).collect::<Vec<Vec<f32>>>();
        let bands = rows.first().map(Vec::len).unwrap_or(0);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != bands) {
            return Err(Error::InvalidInput(format!(
                "signal row {i} has {} bands, expected {bands}",
                row.len()
            )));
        }
        Ok(Self { rows, bands })
    }

    pub(crate) fn empty(bands: usize) -> Self {
        Self { rows: Vec::new(), bands }
    }

    /**
    Band columns are read in the table's column order, whatever their names.
     */
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let columns = df
            .get_column_names()
            .into_iter()
            .map(|name| io::f32_column(df, name))
            .collect::<Result<Vec<_>>>()?;
        let rows = (0..df.height())
            .map(|i| columns.iter().map(|column| column[i]).collect())
            .collect();
        Ok(Self { rows, bands: columns.len() })
    }

    /**
    # Errors
    `InvalidInput` for rows without any band, a column-less table cannot hold them.
     */
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        if self.bands == 0 && !self.rows.is_empty() {
            return Err(Error::InvalidInput(format!(
                "{} signal rows have no band to store",
                self.rows.len()
            )));
        }
        Ok(DataFrame::new(self.band_series(|band| band.to_string()))?)
    }

    pub(crate) fn band_series(&self, name: impl Fn(usize) -> String) -> Vec<Series> {
        (0..self.bands)
            .map(|band| {
                let values = self.rows.iter().map(|row| row[band]).collect::<Vec<f32>>();
                Series::new(&name(band), values)
            })
            .collect()
    }

    /**
    Mean of every band over all rows. `None` when there is no row.
     */
    pub fn average_signal(&self) -> Option<Vec<f32>> {
        if self.rows.is_empty() {
            return None;
        }
        let mut mean = vec![0.0f64; self.bands];
        for row in &self.rows {
            for (acc, value) in mean.iter_mut().zip(row) {
                *acc += *value as f64;
            }
        }
        Some(mean.into_iter().map(|sum| (sum / self.rows.len() as f64) as f32).collect())
    }

    pub fn rows(&self) -> &[Vec<f32>] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&[f32]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn bands(&self) -> usize {
        self.bands
    }

    pub fn slice(&self, range: Range<usize>) -> Result<Self> {
        let rows = self.rows.get(range.clone()).ok_or_else(|| {
            Error::InvalidInput(format!("slice {range:?} out of bounds for {} signals", self.len()))
        })?;
        Ok(Self { rows: rows.to_vec(), bands: self.bands })
    }

    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        let rows = indices
            .iter()
            .map(|&i| {
                self.rows.get(i).cloned().ok_or_else(|| {
                    Error::InvalidInput(format!("index {i} out of bounds for {} signals", self.len()))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rows, bands: self.bands })
    }

    pub fn filter(&self, mask: &[bool]) -> Result<Self> {
        check_mask_len(mask, self.len())?;
        let rows = self
            .rows
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(row, _)| row.clone())
            .collect();
        Ok(Self { rows, bands: self.bands })
    }

    /**
    Keep only the given band columns, in the given order.
     */
    pub fn select_bands(&self, bands: &[usize]) -> Result<Self> {
        if let Some(band) = bands.iter().find(|&&band| band >= self.bands) {
            return Err(Error::InvalidInput(format!(
                "band {band} out of bounds for {} bands",
                self.bands
            )));
        }
        let rows = self
            .rows
            .iter()
            .map(|row| bands.iter().map(|&band| row[band]).collect())
            .collect();
        Ok(Self { rows, bands: bands.len() })
    }

    pub fn save_to_parquet(&self, path: impl AsRef<Path>) -> Result<()> {
        io::write_table(path.as_ref(), &mut self.to_dataframe()?)
    }

    pub fn load_from_parquet(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_dataframe(&io::read_table(path.as_ref())?)
    }
}
