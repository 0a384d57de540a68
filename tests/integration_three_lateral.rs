mod common;

use common::{FaultSpec, RadialFeeder};
use fault_locator::batch::Locator;
use fault_locator::config::LocatorConfig;
use fault_locator::locate::{Confidence, FaultType, Reliability, select_true_branch};
use fault_locator::phasor::Phase;

fn locator(feeder: &RadialFeeder) -> Locator {
    let mut cfg = LocatorConfig::generic();
    cfg.feeder.root = feeder.root.clone();
    Locator::new(&feeder.graph(), &feeder.line_table(), feeder.prefault(), &cfg)
        .expect("fixture feeder is valid")
}

/// 40% along lateral 2: 1.2 into l2a, 3.2 from the substation.
fn lateral_two_fault(rf: f64) -> FaultSpec {
    FaultSpec::to_ground("l2a", 0.8, &[Phase::A], rf)
}

#[test]
fn bolted_ground_fault_on_lateral_two() {
    let feeder = RadialFeeder::three_lateral();
    let loc = locator(&feeder);
    let sensors = loc.sensors().list_sensors().to_vec();
    assert_eq!(sensors, ["t1", "l1a", "l2a", "l3a"]);

    let record = feeder.record(0, &lateral_two_fault(1e-4), ".1.0", &sensors);
    let result = loc.run(std::slice::from_ref(&record));
    assert!(result.failures.is_empty());
    let outcome = &result.outcomes[0];

    let lateral_two = outcome.estimates[1].as_ref().expect("sweep succeeded");
    assert_eq!(lateral_two.confidence, Confidence::Crossing);
    assert_eq!(lateral_two.line, "l2a");
    assert!(
        (lateral_two.distance - 3.2).abs() < 0.15,
        "estimate {}",
        lateral_two.distance
    );

    // The other laterals either miss or land on their own lines.
    for (k, own) in [(0, "l1"), (2, "l3")] {
        let e = outcome.estimates[k].as_ref().expect("sweep succeeded");
        assert!(
            e.confidence == Confidence::Fallback || e.line.starts_with(own),
            "path {k} reported {}",
            e.line
        );
    }

    let reading = |s: &str| record.sensors.get(s, Phase::A).unwrap_or_default();
    assert!(reading("l2a") > reading("l1a"));
    assert!(reading("l2a") > reading("l3a"));

    let selection = outcome.selection.as_ref().expect("branch selected");
    assert_eq!(selection.sensor, "l2a");
    assert_eq!(selection.reliability, Reliability::Confident);
    assert_eq!(selection.estimate.path, 1);
    assert_eq!(outcome.branch_hit, Some(true));
}

#[test]
fn selection_ignores_candidate_order() {
    let feeder = RadialFeeder::three_lateral();
    let loc = locator(&feeder);
    let sensors = loc.sensors().list_sensors().to_vec();
    let record = feeder.record(0, &lateral_two_fault(1e-4), ".1.0", &sensors);
    let result = loc.run(std::slice::from_ref(&record));
    let outcome = &result.outcomes[0];

    let mut estimates: Vec<_> = outcome.estimates.iter().flatten().cloned().collect();
    let fault = FaultType::parse(".1.0");
    let first = select_true_branch(&fault, &estimates, &record.sensors, loc.sensors())
        .expect("selection");
    estimates.reverse();
    let reversed = select_true_branch(&fault, &estimates, &record.sensors, loc.sensors())
        .expect("selection");
    estimates.rotate_left(1);
    let rotated = select_true_branch(&fault, &estimates, &record.sensors, loc.sensors())
        .expect("selection");
    assert_eq!(first.estimate, reversed.estimate);
    assert_eq!(first.estimate, rotated.estimate);
}

#[test]
fn error_grows_with_fault_resistance() {
    let feeder = RadialFeeder::three_lateral();
    let loc = locator(&feeder);
    let sensors = loc.sensors().list_sensors().to_vec();

    let errors: Vec<f64> = [1e-4, 10.0, 20.0, 30.0, 40.0]
        .into_iter()
        .enumerate()
        .map(|(i, rf)| {
            let record = feeder.record(i, &lateral_two_fault(rf), ".1.0", &sensors);
            let result = loc.run(std::slice::from_ref(&record));
            let outcome = &result.outcomes[0];
            let selection = outcome.selection.as_ref().expect("branch selected");
            assert_eq!(selection.sensor, "l2a", "rf = {rf}");
            (selection.estimate.distance - 3.2).abs()
        })
        .collect();

    for pair in errors.windows(2) {
        assert!(pair[1] > pair[0], "errors not increasing: {errors:?}");
    }
}

#[test]
fn phase_pair_fault_on_lateral_two() {
    let feeder = RadialFeeder::three_lateral();
    let loc = locator(&feeder);
    let sensors = loc.sensors().list_sensors().to_vec();
    let fault = FaultSpec::phase_pair("l2a", 0.8, Phase::B, Phase::C, 1e-4);
    let record = feeder.record(0, &fault, ".2.3", &sensors);
    let result = loc.run(std::slice::from_ref(&record));
    let outcome = &result.outcomes[0];
    let selection = outcome.selection.as_ref().expect("branch selected");
    assert_eq!(selection.sensor, "l2a");
    assert!((selection.estimate.distance - 3.2).abs() < 0.15);
}
