//! Historical trip dataset loading.

use crate::error::ValidationError;
use crate::features::batch::{BatchError, PartialTripInputs, build_batch, column_mean};
use crate::features::{FeatureVector, TrafficLevel};
use crate::regressor::Row;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Column names expected in the CSV header.
pub const DATASET_COLUMNS: [&str; 9] = [
    "HomeLat",
    "HomeLon",
    "OfficeLat",
    "OfficeLon",
    "DistanceKM",
    "HourOfDay",
    "IsWeekday",
    "TrafficLevel",
    "ETA_Minutes",
];

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Csv(#[from] csv::Error),
    #[error("dataset is missing column {0}")]
    MissingColumn(&'static str),
    #[error("record {record}: {source}")]
    Record {
        record: usize,
        #[source]
        source: ValidationError,
    },
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error("dataset has no records")]
    Empty,
    #[error("column ETA_Minutes has no values")]
    NoLabels,
}

/// One historical trip. Missing numeric cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub inputs: PartialTripInputs,
    pub eta_minutes: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CsvTripRow {
    #[serde(rename = "HomeLat")]
    home_lat: Option<f64>,
    #[serde(rename = "HomeLon")]
    home_lon: Option<f64>,
    #[serde(rename = "OfficeLat")]
    office_lat: Option<f64>,
    #[serde(rename = "OfficeLon")]
    office_lon: Option<f64>,
    #[serde(rename = "DistanceKM")]
    distance_km: Option<f64>,
    #[serde(rename = "HourOfDay")]
    hour_of_day: Option<f64>,
    #[serde(rename = "IsWeekday")]
    is_weekday: Option<f64>,
    #[serde(rename = "TrafficLevel")]
    traffic_level: String,
    #[serde(rename = "ETA_Minutes")]
    eta_minutes: Option<f64>,
}

impl CsvTripRow {
    fn into_record(self) -> Result<TripRecord, ValidationError> {
        let traffic_level: TrafficLevel = self.traffic_level.parse()?;
        if let Some(weekday) = self.is_weekday
            && weekday != 0.0
            && weekday != 1.0
        {
            return Err(ValidationError::InvalidWeekdayFlag(weekday));
        }
        Ok(TripRecord {
            inputs: PartialTripInputs {
                home_lat: self.home_lat,
                home_lon: self.home_lon,
                office_lat: self.office_lat,
                office_lon: self.office_lon,
                distance_km: self.distance_km,
                hour_of_day: self.hour_of_day,
                is_weekday: self.is_weekday,
                traffic_level,
            },
            eta_minutes: self.eta_minutes,
        })
    }
}

pub fn load_trip_records(path: impl AsRef<Path>) -> Result<Vec<TripRecord>, DatasetError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    read_records(reader)
}

pub fn parse_trip_records<R: Read>(input: R) -> Result<Vec<TripRecord>, DatasetError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);
    read_records(reader)
}

fn read_records<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<TripRecord>, DatasetError> {
    let headers = reader.headers()?.clone();
    for column in DATASET_COLUMNS {
        if !headers.iter().any(|header| header == column) {
            return Err(DatasetError::MissingColumn(column));
        }
    }

    let mut records = Vec::new();
    for (index, row) in reader.deserialize::<CsvTripRow>().enumerate() {
        let record = row?
            .into_record()
            .map_err(|source| DatasetError::Record {
                record: index + 1,
                source,
            })?;
        records.push(record);
    }
    Ok(records)
}

/// Imputed model inputs and labels, row-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    pub features: Vec<FeatureVector>,
    pub rows: Vec<Row>,
    pub targets: Vec<f64>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn select(&self, indices: &[usize]) -> (Vec<Row>, Vec<f64>) {
        indices
            .iter()
            .map(|&i| (self.rows[i], self.targets[i]))
            .unzip()
    }
}

/// Build features for every record and mean-fill the missing labels.
pub fn build_training_set(records: &[TripRecord]) -> Result<TrainingSet, DatasetError> {
    if records.is_empty() {
        return Err(DatasetError::Empty);
    }
    let inputs: Vec<PartialTripInputs> =
        records.iter().map(|record| record.inputs.clone()).collect();
    let features = build_batch(&inputs)?;

    let label_mean = column_mean(records.iter().map(|record| record.eta_minutes))
        .ok_or(DatasetError::NoLabels)?;
    let targets = records
        .iter()
        .map(|record| record.eta_minutes.unwrap_or(label_mean))
        .collect();
    let rows = features.iter().map(FeatureVector::to_array).collect();

    Ok(TrainingSet {
        features,
        rows,
        targets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "HomeLat,HomeLon,OfficeLat,OfficeLon,DistanceKM,HourOfDay,IsWeekday,TrafficLevel,ETA_Minutes";

    #[test]
    fn parses_complete_and_sparse_rows() -> Result<(), DatasetError> {
        let csv = format!(
            "{HEADER}\n\
             12.97,77.59,12.93,77.61,4.6,9,1,High,28.5\n\
             12.91,77.60,12.95,77.70,,18,0,low,\n"
        );

        let records = parse_trip_records(csv.as_bytes())?;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].inputs.traffic_level, TrafficLevel::High);
        assert_eq!(records[0].eta_minutes, Some(28.5));
        assert_eq!(records[1].inputs.distance_km, None);
        assert_eq!(records[1].inputs.traffic_level, TrafficLevel::Low);
        assert_eq!(records[1].eta_minutes, None);
        Ok(())
    }

    #[test]
    fn missing_column_is_reported() {
        let csv = "HomeLat,HomeLon\n1,2\n";
        assert!(matches!(
            parse_trip_records(csv.as_bytes()),
            Err(DatasetError::MissingColumn("OfficeLat"))
        ));
    }

    #[test]
    fn unknown_traffic_level_names_the_record() {
        let csv = format!("{HEADER}\n12.97,77.59,12.93,77.61,4.6,9,1,Jammed,28.5\n");
        assert!(matches!(
            parse_trip_records(csv.as_bytes()),
            Err(DatasetError::Record { record: 1, .. })
        ));
    }

    #[test]
    fn training_set_fills_missing_labels_with_mean() -> Result<(), DatasetError> {
        let csv = format!(
            "{HEADER}\n\
             12.97,77.59,12.93,77.61,4.0,9,1,High,20\n\
             12.97,77.59,12.93,77.61,6.0,10,1,Medium,\n\
             12.97,77.59,12.93,77.61,8.0,11,1,Low,40\n"
        );
        let records = parse_trip_records(csv.as_bytes())?;

        let set = build_training_set(&records)?;

        assert_eq!(set.len(), 3);
        assert_eq!(set.targets, vec![20.0, 30.0, 40.0]);
        assert_eq!(set.rows[1][4], 6.0);
        Ok(())
    }

    #[test]
    fn empty_dataset_is_rejected() {
        assert!(matches!(build_training_set(&[]), Err(DatasetError::Empty)));
    }

    #[test]
    fn out_of_range_hour_fails_the_batch() -> Result<(), DatasetError> {
        let csv = format!("{HEADER}\n12.97,77.59,12.93,77.61,4.0,30,1,High,20\n");
        let records = parse_trip_records(csv.as_bytes())?;

        assert!(matches!(
            build_training_set(&records),
            Err(DatasetError::Batch(BatchError::Row { index: 0, .. }))
        ));
        Ok(())
    }
}
