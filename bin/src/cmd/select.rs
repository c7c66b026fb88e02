//! Select command implementation.

use crate::data;
use anyhow::Result;
use ronda_frame::{Frame, Selected, Selector};

/// Positional selection by date, entity and value column.
pub(crate) fn select(
    frame: &Frame,
    dates: &[String],
    keys: &[String],
    columns: &[String],
) -> Result<()> {
    let mut selector = Selector::new();
    match dates {
        [] => {}
        [date] => selector = selector.time(data::parse_date(date)?),
        _ => {
            let parsed = dates
                .iter()
                .map(|d| data::parse_date(d))
                .collect::<ronda_frame::Result<Vec<_>>>()?;
            selector = selector.times(parsed);
        }
    }
    match keys {
        [] => {}
        [key] => selector = selector.entity(key.as_str()),
        _ => selector = selector.entities(keys.iter().map(String::as_str)),
    }
    match columns {
        [] => {}
        [column] => selector = selector.value(column.as_str()),
        _ => selector = selector.values(columns.iter().map(String::as_str)),
    }

    match frame.select(&selector)? {
        Selected::Scalar(value) => println!("{}", value),
        Selected::Data(dataset) => data::write_csv(dataset)?,
    }
    Ok(())
}
