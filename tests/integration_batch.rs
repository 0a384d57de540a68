mod common;

use common::{FaultSpec, METRES_PER_KFT, RadialFeeder};
use fault_locator::batch::Locator;
use fault_locator::config::LocatorConfig;
use fault_locator::io::{CsvFormat, read_records, write_estimates, write_filtered};
use fault_locator::locate::Confidence;
use fault_locator::phasor::Phase;
use fault_locator::record::{FaultRecord, MeasurementSchema};
use fault_locator::report::AccuracyReport;

fn config(feeder: &RadialFeeder) -> LocatorConfig {
    let mut cfg = LocatorConfig::generic();
    cfg.feeder.root = feeder.root.clone();
    cfg
}

/// Fault cases spread over the trunk and all three laterals.
fn study(feeder: &RadialFeeder, sensors: &[String]) -> Vec<FaultRecord> {
    let cases = [
        (FaultSpec::to_ground("l1b", 0.5, &[Phase::A], 1e-4), ".1.0"),
        (FaultSpec::phase_pair("l2a", 0.3, Phase::B, Phase::C, 1e-4), ".2.3"),
        (FaultSpec::to_ground("l3b", 0.6, &Phase::ALL, 1e-4), ".1.2.3.0"),
        (FaultSpec::to_ground("l3a", 0.5, &[Phase::C], 1e-4), ".3.0"),
        (FaultSpec::to_ground("t1", 0.5, &[Phase::B], 1e-4), ".2.0"),
        (FaultSpec::to_ground("l2b", 0.9, &[Phase::A], 5.0), ".1.0"),
    ];
    cases
        .iter()
        .enumerate()
        .map(|(i, (fault, code))| feeder.record(i, fault, code, sensors))
        .collect()
}

/// Writes records the way a recorder export lays them out.
fn to_csv(records: &[FaultRecord], schema: &MeasurementSchema, format: &CsvFormat) -> String {
    let delimiter = char::from(format.delimiter).to_string();
    let mut out = schema.columns().join(delimiter.as_str());
    for r in records {
        let mut cells: Vec<String> = r
            .v_fault
            .iter()
            .chain(r.i_fault.iter())
            .flat_map(|z| [format.format_number(z.re, 6), format.format_number(z.im, 6)])
            .collect();
        let truth = r.truth.as_ref().expect("study records carry truth");
        cells.push(truth.line.clone());
        cells.push(format.format_number(truth.distance, 2));
        cells.push(r.fault_type.code());
        cells.push(String::new());
        for sensor in schema.sensors() {
            for phase in Phase::ALL {
                let reading = r.sensors.get(sensor, phase).unwrap_or_default();
                cells.push(format.format_number(reading, 4));
            }
        }
        out.push('\n');
        out.push_str(&cells.join(delimiter.as_str()));
    }
    out.push('\n');
    out
}

#[test]
fn study_table_round_trip() {
    let feeder = RadialFeeder::three_lateral();
    let locator = Locator::from_model(&feeder.network_file(), &config(&feeder))
        .expect("fixture model is valid");
    let schema = locator.schema();
    let format = CsvFormat::default();

    let records = study(&feeder, schema.sensors());
    let mut table = to_csv(&records, &schema, &format);
    // A seventh row with a corrupted current cell.
    let last_row = table.lines().last().expect("rows written").to_string();
    let mut cells: Vec<&str> = last_row.split(';').collect();
    cells[6] = "n/a";
    table.push_str(&cells.join(";"));
    table.push('\n');

    let imported = read_records(table.as_bytes(), &schema, &format).expect("header complete");
    assert_eq!(imported.records.len(), records.len());
    assert_eq!(imported.failures.len(), 1);
    assert_eq!(imported.failures[0].record, records.len());

    let mut result = locator.run(&imported.records);
    assert!(result.failures.is_empty(), "{:?}", result.failures);
    result.failures.extend(imported.failures);

    for outcome in &result.outcomes {
        let selection = outcome.selection.as_ref().expect("branch selected");
        assert_eq!(selection.estimate.confidence, Confidence::Crossing);
        assert_eq!(outcome.branch_hit, Some(true), "record {}", outcome.record);
    }

    let report = AccuracyReport::from_batch(&result);
    assert_eq!(report.records, records.len());
    assert_eq!(report.failed, 1);
    assert_eq!(report.selected, records.len());
    assert_eq!(report.branch_hit_pct, 100.0);
    assert!(report.mean_abs_error_pct < 1.0, "{report}");
    assert!(report.max_abs_error_pct < 3.0, "{report}");
    assert!((locator.reference_length() - 5.0 * METRES_PER_KFT).abs() < 1e-9);

    let mut estimates = Vec::new();
    write_estimates(&result, &mut estimates, &format).expect("in-memory write");
    let estimates = String::from_utf8(estimates).expect("utf-8");
    assert_eq!(estimates.lines().count(), 1 + records.len());
    let header = estimates.lines().next().expect("header");
    assert!(header.contains("ckt1_d"));
    assert!(header.contains("l3a_ic"));
    assert!(header.starts_with("record;faulted_line;"));
    assert!(header.contains(";skipped;"));

    let mut filtered = Vec::new();
    write_filtered(&result, &mut filtered, &format).expect("in-memory write");
    let filtered = String::from_utf8(filtered).expect("utf-8");
    assert_eq!(filtered.lines().count(), 1 + records.len());
    let indices: Vec<&str> = filtered
        .lines()
        .skip(1)
        .filter_map(|row| row.split(';').next())
        .collect();
    assert_eq!(indices, ["0", "1", "2", "3", "4", "5"]);
}
