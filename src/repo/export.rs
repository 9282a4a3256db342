//! Ingestion of the merged per-plant telemetry export.
//!
//! Expected header (column order is irrelevant):
//! `DATE_TIME,SOURCE_KEY,DC_POWER,AC_POWER,DAILY_YIELD,TOTAL_YIELD,AMBIENT_TEMPERATURE,MODULE_TEMPERATURE,IRRADIATION`

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::domain::{parse_timestamp, Plant, TelemetryPoint};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct ExportRow {
    date_time: String,
    source_key: String,
    #[serde(default)]
    dc_power: Option<f64>,
    #[serde(default)]
    ac_power: Option<f64>,
    #[serde(default)]
    daily_yield: Option<f64>,
    #[serde(default)]
    total_yield: Option<f64>,
    #[serde(default)]
    ambient_temperature: Option<f64>,
    #[serde(default)]
    module_temperature: Option<f64>,
    #[serde(default)]
    irradiation: Option<f64>,
}

impl ExportRow {
    fn into_point(self, plant: Plant) -> Result<TelemetryPoint> {
        let timestamp = parse_timestamp(&self.date_time)?;
        Ok(TelemetryPoint {
            plant,
            source_key: self.source_key,
            timestamp,
            ac_power: self.ac_power,
            module_temperature: self.module_temperature,
            ambient_temperature: self.ambient_temperature,
            irradiation: self.irradiation,
            dc_power: self.dc_power,
            daily_yield: self.daily_yield,
            total_yield: self.total_yield,
        })
    }
}

pub fn load_plant_csv(path: &Path, plant: Plant) -> Result<Vec<TelemetryPoint>> {
    let file = File::open(path)
        .with_context(|| format!("unable to open telemetry export {}", path.display()))?;
    read_points(file, plant).with_context(|| format!("invalid telemetry export {}", path.display()))
}

pub fn read_points<R: Read>(reader: R, plant: Plant) -> Result<Vec<TelemetryPoint>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    rdr.deserialize::<ExportRow>()
        .enumerate()
        .map(|(idx, row)| {
            // +2: header line and 1-based numbering
            let line = idx + 2;
            row.with_context(|| format!("line {line}: malformed row"))?
                .into_point(plant)
                .with_context(|| format!("line {line}: bad DATE_TIME"))
        })
        .collect()
}
