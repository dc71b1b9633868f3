//! Tracker/SQL library (SPEC_FULL.md §4.9): builds the parameterised SQL for
//! the three interval-aggregation kinds. Table/column names are interpolated
//! once at construction time and validated as safe identifiers; only `lap`
//! is left as a bind parameter, bound at execution time by the evaluator.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerKind {
    Max,
    Min,
    TimeWeightedAvg,
}

impl TrackerKind {
    pub fn from_config_name(name: &str) -> Result<Self> {
        match name {
            "maximum_interval" => Ok(TrackerKind::Max),
            "minimum_interval" => Ok(TrackerKind::Min),
            "average_interval" => Ok(TrackerKind::TimeWeightedAvg),
            other => Err(Error::UnknownTrackerKind(other.to_string())),
        }
    }
}

/// A sub-interval `[lo, hi]` of some monotonic interval column (e.g.
/// `normalised_car_position`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

/// A single registered evaluation tracker. The SQL is built once, at
/// construction, from `table`/`interval_column`/`tracked_column`; `lap` is
/// bound per execution via the query's `$1` (or `%(lap)s`-equivalent)
/// placeholder.
#[derive(Debug, Clone)]
pub struct Tracker {
    pub name: String,
    pub kind: TrackerKind,
    pub table: String,
    pub interval_column: String,
    pub tracked_column: String,
    pub interval: Interval,
    query: String,
}

fn validate_identifier(ident: &str) -> Result<()> {
    let ok = !ident.is_empty()
        && ident
            .chars()
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false)
        && ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(Error::UnsafeIdentifier(ident.to_string()))
    }
}

impl Tracker {
    pub fn new(
        name: impl Into<String>,
        kind: TrackerKind,
        table: impl Into<String>,
        interval_column: impl Into<String>,
        tracked_column: impl Into<String>,
        interval: Interval,
    ) -> Result<Self> {
        let table = table.into();
        let interval_column = interval_column.into();
        let tracked_column = tracked_column.into();
        validate_identifier(&table)?;
        validate_identifier(&interval_column)?;
        validate_identifier(&tracked_column)?;

        let query = build_query(kind, &table, &interval_column, &tracked_column, &interval);

        Ok(Self {
            name: name.into(),
            kind,
            table,
            interval_column,
            tracked_column,
            interval,
            query,
        })
    }

    /// The parameterised SQL text; bind `lap` to its single placeholder.
    pub fn query(&self) -> &str {
        &self.query
    }
}

fn build_query(
    kind: TrackerKind,
    table: &str,
    interval_column: &str,
    tracked_column: &str,
    interval: &Interval,
) -> String {
    let Interval { lo, hi } = interval;
    match kind {
        TrackerKind::Max => format!(
            "SELECT MAX({tracked_column}) FROM {table} \
             WHERE completed_laps = $1 AND {interval_column} BETWEEN {lo} AND {hi}"
        ),
        TrackerKind::Min => format!(
            "SELECT MIN({tracked_column}) FROM {table} \
             WHERE completed_laps = $1 AND {interval_column} BETWEEN {lo} AND {hi}"
        ),
        TrackerKind::TimeWeightedAvg => format!(
            "WITH setup AS (\
                SELECT LAG(i_total_time) OVER (ORDER BY i_total_time) AS prev_ts, \
                       LAG({tracked_column}) OVER (ORDER BY i_total_time) AS prev_v, \
                       {tracked_column}, i_total_time \
                FROM {table} \
                WHERE completed_laps = $1 AND {interval_column} BETWEEN {lo} AND {hi}\
             ), step AS (\
                SELECT CASE WHEN prev_v IS NULL THEN NULL \
                            ELSE (prev_v + {tracked_column}) / 2 * (i_total_time - prev_ts) END AS w, \
                       i_total_time \
                FROM setup\
             ) \
             SELECT SUM(w) / (MAX(i_total_time) - MIN(i_total_time)) FROM step"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_query_interpolates_identifiers_and_bounds() {
        let t = Tracker::new(
            "top-speed",
            TrackerKind::Max,
            "session_0001",
            "normalised_car_position",
            "speed_kmh",
            Interval { lo: 0.0, hi: 0.3 },
        )
        .unwrap();
        assert!(t.query().contains("MAX(speed_kmh)"));
        assert!(t.query().contains("session_0001"));
        assert!(t.query().contains("BETWEEN 0 AND 0.3"));
    }

    #[test]
    fn rejects_unsafe_identifiers() {
        let err = Tracker::new(
            "bad",
            TrackerKind::Min,
            "session; DROP TABLE users --",
            "x",
            "y",
            Interval { lo: 0.0, hi: 1.0 },
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsafeIdentifier(_)));
    }

    #[test]
    fn from_config_name_maps_all_three_kinds() {
        assert_eq!(
            TrackerKind::from_config_name("maximum_interval").unwrap(),
            TrackerKind::Max
        );
        assert_eq!(
            TrackerKind::from_config_name("minimum_interval").unwrap(),
            TrackerKind::Min
        );
        assert_eq!(
            TrackerKind::from_config_name("average_interval").unwrap(),
            TrackerKind::TimeWeightedAvg
        );
        assert!(TrackerKind::from_config_name("nonsense").is_err());
    }
}
