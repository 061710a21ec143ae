/*!
Columnar persistence of tables.
The format is picked from the file extension: `.ipc`, `.arrow` and `.feather` use Arrow IPC, anything else Parquet.
 */
use std::{fs::File, path::Path};

use polars::prelude::*;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Parquet,
    Ipc,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("ipc") | Some("arrow") | Some("feather") => TableFormat::Ipc,
            _ => TableFormat::Parquet,
        }
    }
}

pub fn write_table(path: &Path, df: &mut DataFrame) -> Result<()> {
    let mut file = File::create(path)?;
    match TableFormat::from_path(path) {
        TableFormat::Parquet => {
            ParquetWriter::new(&mut file).finish(df)?;
        }
        TableFormat::Ipc => {
            IpcWriter::new(&mut file).finish(df)?;
        }
    }
    Ok(())
}

pub fn read_table(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let df = match TableFormat::from_path(path) {
        TableFormat::Parquet => ParquetReader::new(file).finish()?,
        TableFormat::Ipc => IpcReader::new(file).finish()?,
    };
    Ok(df)
}

/**
Read a column as `f64` values, casting integer columns.
Null values are rejected.
 */
pub(crate) fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let series = df.column(name)?.cast(&DataType::Float64)?;
    series
        .f64()?
        .into_iter()
        .map(|value| value.ok_or_else(|| Error::InvalidInput(format!("null value in column {name}"))))
        .collect()
}

pub(crate) fn f32_column(df: &DataFrame, name: &str) -> Result<Vec<f32>> {
    let series = df.column(name)?.cast(&DataType::Float32)?;
    series
        .f32()?
        .into_iter()
        .map(|value| value.ok_or_else(|| Error::InvalidInput(format!("null value in column {name}"))))
        .collect()
}
