//! Information Coefficient (IC) calculations.
//!
//! IC is the correlation between a factor and the forward return it is
//! meant to predict, computed across entities. A panel yields one IC per
//! temporal key; a cross-section yields a single IC.

use crate::CorrMethod;
use crate::corr::correlate;
use log::{debug, warn};
use polars::prelude::*;
use ronda_calc::Grouper;
use ronda_frame::{Dataset, Frame, Result, RondaError, Shape, keys::numeric_values};

/// Name of the IC column in results.
pub const IC_COLUMN: &str = "ic";

/// Name of the group column in grouped results.
pub const GROUP_COLUMN: &str = "group";

/// IC between `factor` and `forward` columns of a frame.
///
/// | shape         | no grouper             | grouper                    |
/// |---------------|------------------------|----------------------------|
/// | panel         | `ic` indexed by time   | indexed by `(time, group)` |
/// | cross-section | one row, no index      | indexed by `group`         |
/// | time-series   | error                  | error                      |
///
/// Groups are visited in sorted label order and entities without a label
/// are left out. An empty grouper means no grouping.
///
/// # Errors
///
/// - [`RondaError::Shape`] for time-series, or for a grouped cross-section
///   without an entity index
/// - [`RondaError::MissingColumn`] if either column is absent
pub fn information_coefficient(
    frame: &Frame,
    factor: &str,
    forward: &str,
    method: CorrMethod,
    grouper: Option<&Grouper>,
) -> Result<Dataset> {
    let grouper = match grouper {
        Some(g) if g.is_empty() => {
            warn!("empty grouper passed to ic, computing ungrouped");
            None
        }
        other => other,
    };

    match frame.shape() {
        Shape::TimeSeries { .. } => Err(RondaError::Shape(
            "ic needs entities to correlate across, got time-series data".to_string(),
        )),
        Shape::Panel { time, entity } => {
            let periods = frame.periods()?;
            let data = periods.data();
            let x = numeric_values(data, factor)?;
            let y = numeric_values(data, forward)?;

            let Some(grouper) = grouper else {
                let ics: Vec<f64> = periods
                    .periods()
                    .iter()
                    .map(|p| correlate(&x[p.offset..p.end()], &y[p.offset..p.end()], method))
                    .collect();
                debug!("{} ic of {} on {} over {} periods", method, factor, forward, ics.len());
                let df = DataFrame::new(vec![periods.keys()?, Column::new(IC_COLUMN.into(), ics)])?;
                return Dataset::new(df, [time.clone()]);
            };

            let labels = grouper.label_rows(data.column(entity)?)?;
            let mut counts = Vec::with_capacity(periods.len());
            let mut groups = Vec::new();
            let mut ics = Vec::new();
            for p in periods.periods() {
                let found = grouped_ics(
                    &x[p.offset..p.end()],
                    &y[p.offset..p.end()],
                    &labels[p.offset..p.end()],
                    grouper,
                    method,
                );
                counts.push(found.len());
                for (group, ic) in found {
                    groups.push(group);
                    ics.push(ic);
                }
            }
            debug!(
                "{} ic of {} on {} over {} periods in {} groups",
                method,
                factor,
                forward,
                periods.len(),
                grouper.groups().len()
            );

            let df = DataFrame::new(vec![
                periods.repeat_keys(&counts)?,
                Column::new(GROUP_COLUMN.into(), groups),
                Column::new(IC_COLUMN.into(), ics),
            ])?;
            Dataset::new(df, [time.clone(), GROUP_COLUMN.into()])
        }
        Shape::CrossSection { entity } => {
            let data = frame.data();
            let x = numeric_values(data, factor)?;
            let y = numeric_values(data, forward)?;

            let Some(grouper) = grouper else {
                let ic = correlate(&x, &y, method);
                let df = DataFrame::new(vec![Column::new(IC_COLUMN.into(), [ic])])?;
                return Ok(Dataset::cross_section(df));
            };
            let Some(entity) = entity else {
                return Err(RondaError::Shape(
                    "grouped ic needs an entity index to look up groups".to_string(),
                ));
            };

            let labels = grouper.label_rows(data.column(entity)?)?;
            let (groups, ics): (Vec<&str>, Vec<f64>) =
                grouped_ics(&x, &y, &labels, grouper, method).into_iter().unzip();
            let df = DataFrame::new(vec![
                Column::new(GROUP_COLUMN.into(), groups),
                Column::new(IC_COLUMN.into(), ics),
            ])?;
            Dataset::new(df, [GROUP_COLUMN])
        }
    }
}

/// IC per non-empty group, in sorted label order.
fn grouped_ics<'g>(
    x: &[f64],
    y: &[f64],
    labels: &[Option<&str>],
    grouper: &'g Grouper,
    method: CorrMethod,
) -> Vec<(&'g str, f64)> {
    grouper
        .groups()
        .into_iter()
        .filter_map(|group| {
            let (xs, ys): (Vec<f64>, Vec<f64>) = labels
                .iter()
                .zip(x.iter().zip(y))
                .filter(|(label, _)| **label == Some(group))
                .map(|(_, (a, b))| (*a, *b))
                .unzip();
            (!xs.is_empty()).then(|| (group, correlate(&xs, &ys, method)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use ronda_frame::{ShapeTag, classify, keys::entity_keys};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, day).unwrap()
    }

    fn panel() -> Frame {
        let df = df! {
            "date" => [d(2), d(2), d(2), d(2), d(1), d(1), d(1), d(1)],
            "asset" => ["a", "b", "c", "d", "a", "b", "c", "d"],
            "factor" => [1.0, 2.0, 3.0, 4.0, 1.0, 2.0, 3.0, 4.0],
            "ret" => [0.4, 0.3, 0.2, 0.1, 0.1, 0.2, 0.3, 0.4],
        }
        .unwrap();
        Frame::new(Dataset::panel(df, "date", "asset").unwrap()).unwrap()
    }

    #[test]
    fn test_panel_ic_per_period() {
        let ic = information_coefficient(&panel(), "factor", "ret", CorrMethod::Spearman, None)
            .unwrap();
        assert_eq!(classify(&ic).unwrap().tag(), ShapeTag::TimeSeries);
        let values = numeric_values(ic.data(), IC_COLUMN).unwrap();
        assert_eq!(values.len(), 2);
        assert_relative_eq!(values[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(values[1], -1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_panel_ic_grouped() {
        let grouper: Grouper = [("a", "g1"), ("b", "g1"), ("c", "g2"), ("d", "g2")]
            .into_iter()
            .collect();
        let ic = information_coefficient(
            &panel(),
            "factor",
            "ret",
            CorrMethod::Pearson,
            Some(&grouper),
        )
        .unwrap();

        assert_eq!(ic.columns(), vec!["date", "group", "ic"]);
        assert_eq!(classify(&ic).unwrap().tag(), ShapeTag::Panel);
        let groups = entity_keys(ic.column("group").unwrap()).unwrap();
        assert_eq!(groups, vec!["g1", "g2", "g1", "g2"]);
        let values = numeric_values(ic.data(), IC_COLUMN).unwrap();
        assert_eq!(values.iter().map(|v| v.signum()).collect::<Vec<_>>(), vec![1.0, 1.0, -1.0, -1.0]);
    }

    #[test]
    fn test_unlabelled_entities_are_left_out() {
        let grouper: Grouper = [("a", "g1")].into_iter().collect();
        let ic = information_coefficient(
            &panel(),
            "factor",
            "ret",
            CorrMethod::Spearman,
            Some(&grouper),
        )
        .unwrap();
        assert_eq!(ic.len(), 2);
        assert!(numeric_values(ic.data(), IC_COLUMN).unwrap()[0].is_nan());
    }

    #[test]
    fn test_cross_section_ic() {
        let rows = panel().data().head(Some(4));
        let frame = Frame::new(Dataset::new(rows.drop("date").unwrap(), ["asset"]).unwrap()).unwrap();

        let ic = information_coefficient(&frame, "factor", "ret", CorrMethod::Spearman, None).unwrap();
        assert_eq!(ic.len(), 1);
        assert_relative_eq!(numeric_values(ic.data(), IC_COLUMN).unwrap()[0], -1.0, epsilon = 1e-10);

        let grouper: Grouper = [("a", "x"), ("b", "x"), ("c", "y"), ("d", "y")]
            .into_iter()
            .collect();
        let grouped =
            information_coefficient(&frame, "factor", "ret", CorrMethod::Spearman, Some(&grouper))
                .unwrap();
        assert_eq!(grouped.index()[0].as_str(), "group");
        assert_eq!(grouped.len(), 2);
    }

    #[test]
    fn test_time_series_rejected() {
        let rows = panel().data().head(Some(4)).drop("asset").unwrap();
        let frame = Frame::new(Dataset::time_series(rows, "date").unwrap()).unwrap();
        let err = information_coefficient(&frame, "factor", "ret", CorrMethod::Spearman, None)
            .unwrap_err();
        assert!(matches!(err, RondaError::Shape(_)));
    }

    #[test]
    fn test_missing_column() {
        let err = information_coefficient(&panel(), "factor", "nope", CorrMethod::Spearman, None)
            .unwrap_err();
        assert!(matches!(err, RondaError::MissingColumn(_)));
    }
}
