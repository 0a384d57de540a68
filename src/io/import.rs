//! CSV import of fault records.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use num_complex::Complex64;

use crate::error::{LocatorError, RecordFailure, Result};
use crate::locate::FaultType;
use crate::phasor::{Phase, Phasors};
use crate::record::{FaultRecord, GroundTruth, MeasurementSchema, SensorReadings};

/// Field separator and decimal mark of a measurement table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvFormat {
    pub delimiter: u8,
    pub decimal_comma: bool,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            delimiter: b';',
            decimal_comma: true,
        }
    }
}

impl CsvFormat {
    /// Plain comma-separated values with `.` decimals.
    pub fn plain() -> Self {
        Self {
            delimiter: b',',
            decimal_comma: false,
        }
    }

    pub fn parse_number(&self, cell: &str) -> Option<f64> {
        let cell = cell.trim();
        let value = if self.decimal_comma {
            cell.replace(',', ".").parse::<f64>()
        } else {
            cell.parse::<f64>()
        };
        value.ok().filter(|v| v.is_finite())
    }

    pub fn format_number(&self, value: f64, precision: usize) -> String {
        let s = format!("{value:.precision$}");
        if self.decimal_comma {
            s.replace('.', ",")
        } else {
            s
        }
    }
}

/// Records that parsed, plus one failure per row that did not.
#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub records: Vec<FaultRecord>,
    pub failures: Vec<RecordFailure>,
}

/// Reads fault records from a CSV file.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened; see [`read_records`]
/// for header errors.
pub fn import_records(
    path: &Path,
    schema: &MeasurementSchema,
    format: &CsvFormat,
) -> Result<ImportOutcome> {
    let file = File::open(path)?;
    read_records(io::BufReader::new(file), schema, format)
}

/// Reads fault records from any reader.
///
/// The header must contain the substation phasor columns, `fault_type`, and
/// every sensor column of `schema`. Ground-truth columns are optional. A row
/// with an unparsable or missing cell becomes a [`RecordFailure`] and the
/// remaining rows are still read.
///
/// # Errors
///
/// Returns `LocatorError::Schema` if a required column is absent from the
/// header and `LocatorError::Csv` if the header itself cannot be read.
pub fn read_records(
    reader: impl Read,
    schema: &MeasurementSchema,
    format: &CsvFormat,
) -> Result<ImportOutcome> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(format.delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let layout = Layout::resolve(&headers, schema)?;

    let mut outcome = ImportOutcome::default();
    for (index, row) in rdr.records().enumerate() {
        let parsed = row
            .map_err(LocatorError::from)
            .and_then(|row| layout.parse_row(index, &row, format));
        match parsed {
            Ok(record) => outcome.records.push(record),
            Err(error) => outcome.failures.push(RecordFailure {
                record: index,
                path: None,
                error,
            }),
        }
    }
    Ok(outcome)
}

/// Column positions resolved from the header.
struct Layout {
    voltage: [(usize, usize); 3],
    current: [(usize, usize); 3],
    fault_type: usize,
    faulted_line: Option<usize>,
    distance: Option<usize>,
    resistance: Option<usize>,
    sensors: Vec<(String, Phase, usize)>,
}

impl Layout {
    fn resolve(headers: &csv::StringRecord, schema: &MeasurementSchema) -> Result<Self> {
        let by_name: HashMap<&str, usize> =
            headers.iter().enumerate().map(|(i, h)| (h, i)).collect();
        let require = |name: &str| {
            by_name.get(name).copied().ok_or_else(|| LocatorError::Schema {
                record: 0,
                column: name.to_string(),
                message: "missing from header".to_string(),
            })
        };
        let pairs = |names: [(&str, &str); 3]| -> Result<[(usize, usize); 3]> {
            let mut out = [(0, 0); 3];
            for (slot, (re, im)) in out.iter_mut().zip(names) {
                *slot = (require(re)?, require(im)?);
            }
            Ok(out)
        };

        let mut sensors = Vec::with_capacity(schema.sensors().len() * 3);
        for sensor in schema.sensors() {
            for phase in Phase::ALL {
                let column = MeasurementSchema::sensor_column(sensor, phase);
                sensors.push((sensor.clone(), phase, require(&column)?));
            }
        }

        Ok(Self {
            voltage: pairs(MeasurementSchema::VOLTAGE)?,
            current: pairs(MeasurementSchema::CURRENT)?,
            fault_type: require(MeasurementSchema::FAULT_TYPE)?,
            faulted_line: by_name.get(MeasurementSchema::FAULTED_LINE).copied(),
            distance: by_name.get(MeasurementSchema::DISTANCE).copied(),
            resistance: by_name.get(MeasurementSchema::RESISTANCE).copied(),
            sensors,
        })
    }

    fn parse_row(
        &self,
        index: usize,
        row: &csv::StringRecord,
        format: &CsvFormat,
    ) -> Result<FaultRecord> {
        let cell = |col: usize| row.get(col).unwrap_or("");
        let number = |col: usize, name: &str| {
            let raw = cell(col);
            format
                .parse_number(raw)
                .ok_or_else(|| LocatorError::Schema {
                    record: index,
                    column: name.to_string(),
                    message: format!("cannot parse \"{raw}\" as a number"),
                })
        };
        let phasors = |cols: &[(usize, usize); 3], names: [(&str, &str); 3]| -> Result<Phasors> {
            let mut out = Phasors::zeros();
            for ((slot, &(re, im)), (re_name, im_name)) in out.iter_mut().zip(cols).zip(names) {
                *slot = Complex64::new(number(re, re_name)?, number(im, im_name)?);
            }
            Ok(out)
        };

        let v_fault = phasors(&self.voltage, MeasurementSchema::VOLTAGE)?;
        let i_fault = phasors(&self.current, MeasurementSchema::CURRENT)?;
        let fault_type = FaultType::parse(cell(self.fault_type));

        let mut sensors = SensorReadings::new();
        for (sensor, phase, col) in &self.sensors {
            let name = MeasurementSchema::sensor_column(sensor, *phase);
            sensors.insert(sensor.clone(), *phase, number(*col, &name)?);
        }

        let truth = match self.faulted_line.map(cell).filter(|l| !l.is_empty()) {
            Some(line) => {
                let distance = match self.distance {
                    Some(col) => number(col, MeasurementSchema::DISTANCE)?,
                    None => {
                        return Err(LocatorError::Schema {
                            record: index,
                            column: MeasurementSchema::DISTANCE.to_string(),
                            message: "faulted line given without a distance column".to_string(),
                        });
                    }
                };
                Some(GroundTruth {
                    line: line.to_string(),
                    distance,
                    resistance: self.resistance.map(|c| cell(c).to_string()),
                })
            }
            None => None,
        };

        Ok(FaultRecord {
            index,
            fault_type,
            v_fault,
            i_fault,
            sensors,
            truth,
        })
    }
}
