//! Data loading and writing for the ronda CLI.

use chrono::NaiveDate;
use log::debug;
use polars::prelude::*;
use ronda_calc::Grouper;
use ronda_frame::{Dataset, Frame, Result, RondaError, keys::entity_keys};
use std::path::Path;

fn read_csv(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_try_parse_dates(true))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Load a CSV file and classify it by the named index columns.
///
/// Date-like columns are parsed by polars, so `time` should name a column
/// of `YYYY-MM-DD` dates or timestamps.
pub(crate) fn load_frame(path: &Path, time: Option<&str>, entity: Option<&str>) -> Result<Frame> {
    let df = read_csv(path)?;
    debug!("read {} rows x {} columns from {}", df.height(), df.width(), path.display());

    let dataset = match (time, entity) {
        (Some(time), Some(entity)) => Dataset::panel(df, time, entity)?,
        (Some(time), None) => Dataset::time_series(df, time)?,
        (None, Some(entity)) => Dataset::new(df, [entity])?,
        (None, None) => Dataset::cross_section(df),
    };
    Frame::new(dataset)
}

/// Load an entity to label mapping from a two-column CSV.
pub(crate) fn load_grouper(path: &Path) -> Result<Grouper> {
    let df = read_csv(path)?;
    let columns = df.get_columns();
    let [entity, label] = columns else {
        return Err(RondaError::InvalidData(format!(
            "grouper file {} needs exactly two columns (entity, label), found {}",
            path.display(),
            columns.len()
        )));
    };
    let grouper: Grouper = entity_keys(entity)?
        .into_iter()
        .zip(entity_keys(label)?)
        .collect();
    debug!("loaded {} group labels", grouper.len());
    Ok(grouper)
}

/// Write a dataset to stdout as CSV.
pub(crate) fn write_csv(dataset: Dataset) -> Result<()> {
    let mut df = dataset.into_inner();
    let stdout = std::io::stdout();
    CsvWriter::new(stdout.lock()).finish(&mut df)?;
    Ok(())
}

/// Parse a date string in YYYY-MM-DD format.
pub(crate) fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|e| RondaError::InvalidData(format!("Invalid date format: {}", e)))
}
