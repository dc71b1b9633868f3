//! Builds the registered [`Tracker`] list from `evaluation.monitors`
//! (SPEC_FULL.md §4.9, §6). One [`IntervalMonitorConfig`] fans out into one
//! `Tracker` per named sub-interval it declares.

use crate::error::{Error, Result};
use harness_config::IntervalMonitorConfig;
use harness_types::{Interval, Tracker, TrackerKind};

fn safe_identifier(ident: &str) -> Result<()> {
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

/// Builds one `Tracker` per `(monitor, named sub-interval)` pair, named
/// `"{monitor.name}_{interval_name}"`.
pub fn build_trackers(table: &str, monitors: &[IntervalMonitorConfig]) -> Result<Vec<Tracker>> {
    safe_identifier(table)?;

    let mut trackers = Vec::new();
    for monitor in monitors {
        let kind = TrackerKind::from_config_name(&monitor.kind)?;
        let mut names: Vec<&String> = monitor.intervals.keys().collect();
        names.sort();
        for interval_name in names {
            let (lo, hi) = monitor.intervals[interval_name];
            let tracker = Tracker::new(
                format!("{}_{interval_name}", monitor.name),
                kind,
                table,
                &monitor.interval_column,
                &monitor.column,
                Interval { lo, hi },
            )?;
            trackers.push(tracker);
        }
    }
    Ok(trackers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn one_tracker_per_named_interval() {
        let mut intervals = HashMap::new();
        intervals.insert("sector1".to_string(), (0.0, 0.3));
        intervals.insert("sector2".to_string(), (0.3, 0.6));
        let monitors = vec![IntervalMonitorConfig {
            name: "top_speed".to_string(),
            kind: "maximum_interval".to_string(),
            column: "speed_kmh".to_string(),
            interval_column: "normalised_car_position".to_string(),
            intervals,
        }];

        let trackers = build_trackers("session_0001", &monitors).unwrap();
        assert_eq!(trackers.len(), 2);
        assert!(trackers.iter().any(|t| t.name == "top_speed_sector1"));
        assert!(trackers.iter().any(|t| t.name == "top_speed_sector2"));
    }

    #[test]
    fn rejects_an_unsafe_table_name() {
        let err = build_trackers("session; DROP TABLE users --", &[]).unwrap_err();
        assert!(matches!(err, Error::UnsafeIdentifier(_)));
    }
}
