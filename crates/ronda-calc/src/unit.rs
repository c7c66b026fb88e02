//! Built-in unit functions for [`Rolling`](crate::Rolling).
//!
//! Each reduces every numeric value column of the window to one number.
//! Non-finite values are skipped, except by [`last`].

use crate::{Window, WindowOutput};
use polars::prelude::*;
use ronda_frame::{
    Result, RondaError,
    keys::{entity_keys, numeric_values},
    stats::{Moments, finite_sum},
};
use std::collections::BTreeMap;

/// Column-wise mean over the whole window.
pub fn mean(window: &Window<'_>) -> Result<WindowOutput> {
    reduce(window, |values| Moments::of(values).mean)
}

/// Column-wise sum over the whole window.
pub fn sum(window: &Window<'_>) -> Result<WindowOutput> {
    reduce(window, finite_sum)
}

/// Column-wise sample standard deviation over the whole window.
pub fn std(window: &Window<'_>) -> Result<WindowOutput> {
    reduce(window, |values| Moments::of(values).std)
}

/// Value of the window's last row, per column.
pub fn last(window: &Window<'_>) -> Result<WindowOutput> {
    reduce(window, |values| values.last().copied().unwrap_or(f64::NAN))
}

/// Column-wise mean per entity, one row per entity in sorted order.
///
/// The output keeps the entity column, so the rolled result of a panel is
/// again a panel.
pub fn entity_mean(window: &Window<'_>) -> Result<WindowOutput> {
    let frame = window.frame();
    let entity = frame.shape().entity().ok_or_else(|| {
        RondaError::Shape(format!(
            "entity_mean requires panel data, got {}",
            frame.tag()
        ))
    })?;

    let data = frame.data();
    let mut rows: BTreeMap<String, Vec<IdxSize>> = BTreeMap::new();
    for (row, key) in entity_keys(data.column(entity)?)?.into_iter().enumerate() {
        rows.entry(key).or_default().push(row as IdxSize);
    }

    let columns = numeric_columns(window)?;
    let mut output = vec![Column::new(entity.clone(), rows.keys().cloned().collect::<Vec<_>>())];
    for name in &columns {
        let values = numeric_values(data, name)?;
        let means: Vec<f64> = rows
            .values()
            .map(|idx| {
                let group: Vec<f64> = idx.iter().map(|&i| values[i as usize]).collect();
                Moments::of(&group).mean
            })
            .collect();
        output.push(Column::new(name.clone(), means));
    }

    Ok(WindowOutput::Frame(DataFrame::new(output)?))
}

fn numeric_columns(window: &Window<'_>) -> Result<Vec<PlSmallStr>> {
    let columns = window.frame().numeric_columns();
    if columns.is_empty() {
        return Err(RondaError::InvalidData(
            "window has no numeric value columns".to_string(),
        ));
    }
    Ok(columns)
}

fn reduce(window: &Window<'_>, f: impl Fn(&[f64]) -> f64) -> Result<WindowOutput> {
    let data = window.data();
    let output = numeric_columns(window)?
        .into_iter()
        .map(|name| {
            let value = f(&numeric_values(data, &name)?);
            Ok(Column::new(name, [value]))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(WindowOutput::Frame(DataFrame::new(output)?))
}
