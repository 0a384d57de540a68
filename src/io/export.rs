//! CSV export of batch results.
//!
//! Two tables: the estimator table with one distance per candidate path, and
//! the filtered table with the selected branch per record.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::batch::{BatchResult, RecordOutcome};
use crate::error::Result;
use crate::phasor::Phase;
use crate::record::MeasurementSchema;

use super::import::CsvFormat;

const RECORD: &str = "record";
const SKIPPED: &str = "skipped";

/// Column header of the filtered table.
const FILTERED_HEADER: [&str; 9] = [
    RECORD,
    "selected_line",
    "selected_distance",
    "faulted_line",
    "true_distance",
    "fault_type",
    "fault_resistance",
    "error_pct",
    "confidence",
];

/// Exports the estimator table to a CSV file.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn export_estimates(result: &BatchResult, path: &Path, format: &CsvFormat) -> Result<()> {
    let file = File::create(path)?;
    write_estimates(result, io::BufWriter::new(file), format)
}

/// Writes the estimator table to any writer.
///
/// One row per record: the record index and ground truth, then `ckt<k>_d`,
/// `ckt<k>_line`, `ckt<k>_found` per candidate path, the number of sweep steps
/// skipped over all paths, then the sensor magnitudes. Distances are in
/// output units; a failed path leaves its cells empty.
pub fn write_estimates(result: &BatchResult, writer: impl Write, format: &CsvFormat) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(format.delimiter)
        .from_writer(writer);

    let schema = MeasurementSchema::new(&result.sensors);
    let mut header: Vec<String> = [
        RECORD,
        MeasurementSchema::FAULTED_LINE,
        MeasurementSchema::DISTANCE,
        MeasurementSchema::FAULT_TYPE,
        MeasurementSchema::RESISTANCE,
    ]
    .map(String::from)
    .to_vec();
    for name in &result.path_names {
        header.push(format!("{name}_d"));
        header.push(format!("{name}_line"));
        header.push(format!("{name}_found"));
    }
    header.push(SKIPPED.to_string());
    header.extend(schema.sensor_columns());
    wtr.write_record(&header)?;

    for o in &result.outcomes {
        let mut row = vec![o.record.to_string()];
        row.extend(truth_cells(o, format));
        row.push(o.fault_type.code());
        row.push(resistance_cell(o));
        for e in &o.estimates {
            match e {
                Some(e) => {
                    row.push(format.format_number(e.distance * result.length_scale, 2));
                    row.push(e.line.clone());
                    row.push(e.is_crossing().to_string());
                }
                None => row.extend([String::new(), String::new(), String::new()]),
            }
        }
        row.push(o.skipped_steps().to_string());
        for sensor in &result.sensors {
            for phase in Phase::ALL {
                row.push(
                    o.readings
                        .get(sensor, phase)
                        .map(|v| format.format_number(v, 4))
                        .unwrap_or_default(),
                );
            }
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports the filtered table to a CSV file.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn export_filtered(result: &BatchResult, path: &Path, format: &CsvFormat) -> Result<()> {
    let file = File::create(path)?;
    write_filtered(result, io::BufWriter::new(file), format)
}

/// Writes the filtered table to any writer. Records without a selection are
/// left out.
pub fn write_filtered(result: &BatchResult, writer: impl Write, format: &CsvFormat) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(format.delimiter)
        .from_writer(writer);
    wtr.write_record(FILTERED_HEADER)?;

    for o in &result.outcomes {
        let Some(sel) = &o.selection else {
            continue;
        };
        let [line, distance] = truth_cells(o, format);
        wtr.write_record([
            o.record.to_string(),
            sel.estimate.line.clone(),
            format.format_number(sel.estimate.distance * result.length_scale, 2),
            line,
            distance,
            o.fault_type.code(),
            resistance_cell(o),
            o.error_pct
                .map(|e| format.format_number(e, 4))
                .unwrap_or_default(),
            sel.reliability.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn truth_cells(o: &RecordOutcome, format: &CsvFormat) -> [String; 2] {
    match &o.truth {
        Some(t) => [t.line.clone(), format.format_number(t.distance, 2)],
        None => [String::new(), String::new()],
    }
}

fn resistance_cell(o: &RecordOutcome) -> String {
    o.truth
        .as_ref()
        .and_then(|t| t.resistance.clone())
        .unwrap_or_default()
}
