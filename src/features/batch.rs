//! Batch feature construction with column-mean imputation for training data.

use super::{FeatureVector, TrafficLevel, assemble, validate_distance, validate_hour};
use crate::error::ValidationError;
use thiserror::Error;

/// One training row before imputation. `None` marks a missing numeric cell.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialTripInputs {
    pub home_lat: Option<f64>,
    pub home_lon: Option<f64>,
    pub office_lat: Option<f64>,
    pub office_lon: Option<f64>,
    pub distance_km: Option<f64>,
    pub hour_of_day: Option<f64>,
    pub is_weekday: Option<f64>,
    pub traffic_level: TrafficLevel,
}

#[derive(Debug, Error, PartialEq)]
pub enum BatchError {
    #[error("column {0} has no values to compute a mean from")]
    EmptyColumn(&'static str),
    #[error("row {index}: {source}")]
    Row {
        index: usize,
        #[source]
        source: ValidationError,
    },
}

/// Mean of the present values, or `None` when every value is missing.
pub fn column_mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Build feature vectors for a batch, filling missing numeric cells with the
/// column mean over the batch.
///
/// Present values are validated before means are taken so that an
/// out-of-range cell cannot leak into the imputed values. A filled hour is
/// rounded to the nearest whole hour and a filled weekday flag becomes
/// `mean >= 0.5`.
pub fn build_batch(rows: &[PartialTripInputs]) -> Result<Vec<FeatureVector>, BatchError> {
    for (index, row) in rows.iter().enumerate() {
        validate_present(row).map_err(|source| BatchError::Row { index, source })?;
    }

    let home_lat_mean = mean_of(rows, "HomeLat", |row| row.home_lat)?;
    let home_lon_mean = mean_of(rows, "HomeLon", |row| row.home_lon)?;
    let office_lat_mean = mean_of(rows, "OfficeLat", |row| row.office_lat)?;
    let office_lon_mean = mean_of(rows, "OfficeLon", |row| row.office_lon)?;
    let distance_mean = mean_of(rows, "DistanceKM", |row| row.distance_km)?;
    let hour_mean = mean_of(rows, "HourOfDay", |row| row.hour_of_day)?.round();
    let weekday_mean = mean_of(rows, "IsWeekday", |row| row.is_weekday)?;

    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            assemble(
                [
                    row.home_lat.unwrap_or(home_lat_mean),
                    row.home_lon.unwrap_or(home_lon_mean),
                    row.office_lat.unwrap_or(office_lat_mean),
                    row.office_lon.unwrap_or(office_lon_mean),
                ],
                row.distance_km.unwrap_or(distance_mean),
                row.hour_of_day.unwrap_or(hour_mean),
                row.is_weekday.unwrap_or(weekday_mean) >= 0.5,
                row.traffic_level,
            )
            .map_err(|source| BatchError::Row { index, source })
        })
        .collect()
}

fn mean_of(
    rows: &[PartialTripInputs],
    name: &'static str,
    pick: fn(&PartialTripInputs) -> Option<f64>,
) -> Result<f64, BatchError> {
    if rows.iter().all(|row| pick(row).is_some()) {
        return Ok(0.0);
    }
    column_mean(rows.iter().map(pick)).ok_or(BatchError::EmptyColumn(name))
}

fn validate_present(row: &PartialTripInputs) -> Result<(), ValidationError> {
    if let Some(hour) = row.hour_of_day {
        validate_hour(hour)?;
    }
    if let Some(distance) = row.distance_km {
        validate_distance(distance)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_row(hour: f64, distance: f64, level: TrafficLevel) -> PartialTripInputs {
        PartialTripInputs {
            home_lat: Some(12.97),
            home_lon: Some(77.59),
            office_lat: Some(12.93),
            office_lon: Some(77.61),
            distance_km: Some(distance),
            hour_of_day: Some(hour),
            is_weekday: Some(1.0),
            traffic_level: level,
        }
    }

    #[test]
    fn column_mean_skips_missing_values() {
        assert_eq!(column_mean([Some(2.0), None, Some(4.0)]), Some(3.0));
        assert_eq!(column_mean([None, None]), None);
    }

    #[test]
    fn missing_cells_take_the_column_mean() -> Result<(), BatchError> {
        let mut sparse = complete_row(9.0, 10.0, TrafficLevel::Low);
        sparse.distance_km = None;
        sparse.hour_of_day = None;
        let rows = vec![
            complete_row(8.0, 4.0, TrafficLevel::High),
            sparse,
            complete_row(11.0, 8.0, TrafficLevel::Medium),
        ];

        let features = build_batch(&rows)?;

        assert_eq!(features.len(), 3);
        assert_eq!(features[1].distance_km, 6.0);
        // mean(8, 11) = 9.5 rounds to 10
        assert_eq!(features[1].hour_of_day, 10.0);
        Ok(())
    }

    #[test]
    fn missing_weekday_uses_majority_of_batch() -> Result<(), BatchError> {
        let mut sparse = complete_row(9.0, 1.0, TrafficLevel::Low);
        sparse.is_weekday = None;
        let mut weekend = complete_row(9.0, 1.0, TrafficLevel::Low);
        weekend.is_weekday = Some(0.0);
        let rows = vec![
            complete_row(9.0, 1.0, TrafficLevel::Low),
            complete_row(9.0, 1.0, TrafficLevel::Low),
            weekend,
            sparse,
        ];

        let features = build_batch(&rows)?;

        assert_eq!(features[3].is_weekday, 1.0);
        Ok(())
    }

    #[test]
    fn every_row_keeps_one_hot_invariant() -> Result<(), BatchError> {
        let rows: Vec<_> = TrafficLevel::ALL
            .into_iter()
            .map(|level| complete_row(12.0, 3.0, level))
            .collect();

        for features in build_batch(&rows)? {
            let sum = features.traffic_low + features.traffic_medium + features.traffic_high;
            assert_eq!(sum, 1.0);
        }
        Ok(())
    }

    #[test]
    fn fully_missing_column_fails() {
        let mut row = complete_row(9.0, 1.0, TrafficLevel::Low);
        row.home_lat = None;

        assert_eq!(build_batch(&[row]), Err(BatchError::EmptyColumn("HomeLat")));
    }

    #[test]
    fn invalid_present_value_reports_row_index() {
        let rows = vec![
            complete_row(9.0, 1.0, TrafficLevel::Low),
            complete_row(25.0, 1.0, TrafficLevel::Low),
        ];

        assert_eq!(
            build_batch(&rows),
            Err(BatchError::Row {
                index: 1,
                source: ValidationError::HourOutOfRange(25.0),
            })
        );
    }

    #[test]
    fn fractional_hour_cell_is_rejected() {
        let rows = vec![
            complete_row(9.0, 1.0, TrafficLevel::Low),
            complete_row(9.5, 1.0, TrafficLevel::Low),
        ];

        assert_eq!(
            build_batch(&rows),
            Err(BatchError::Row {
                index: 1,
                source: ValidationError::FractionalHour(9.5),
            })
        );
    }
}
