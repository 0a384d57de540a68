//! Batch runner: every fault record against every candidate path.
//!
//! Path models are prepared once; the (record × path) sweeps then run on the
//! rayon pool and are collected back in input order before branch selection.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::LocatorConfig;
use crate::error::{LocatorError, RecordFailure, Result};
use crate::locate::{
    Estimate, FaultType, PathModel, PrefaultState, Selection, SweepSettings, select_true_branch,
};
use crate::network::{CircuitModel, LineTable, build_line_table};
use crate::record::{FaultRecord, GroundTruth, MeasurementSchema, SensorReadings};
use crate::topology::{PathSet, SensorMap, TopologyGraph};

/// Everything needed to locate faults on one feeder.
#[derive(Debug)]
pub struct Locator {
    sensors: SensorMap,
    paths: PathSet,
    models: Vec<PathModel>,
    length_scale: f64,
    reference_length: f64,
}

impl Locator {
    /// Builds the feeder model from a circuit model and a run configuration.
    ///
    /// # Errors
    ///
    /// Propagates model, topology, and line-table errors, and
    /// `LocatorError::Config` for an invalid configuration.
    pub fn from_model(model: &impl CircuitModel, config: &LocatorConfig) -> Result<Self> {
        if let Some(first) = config.validate().into_iter().next() {
            return Err(first.into());
        }
        let graph = TopologyGraph::from_model(model)?;
        let table = build_line_table(model)?;
        let substation = model.substation()?;
        let prefault = PrefaultState {
            voltage: substation.voltage,
            current: substation.current,
        };
        Self::new(&graph, &table, prefault, config)
    }

    /// Builds the locator from an already assembled graph and line table.
    pub fn new(
        graph: &TopologyGraph,
        table: &LineTable,
        prefault: PrefaultState,
        config: &LocatorConfig,
    ) -> Result<Self> {
        let root = config.feeder.root.as_str();
        graph.check_radial(root)?;

        let paths = match &config.feeder.paths {
            Some(lists) => PathSet::from_line_lists(lists.iter().map(|l| l.iter().cloned())),
            None => PathSet::enumerate(graph, root)?,
        };
        if paths.is_empty() {
            return Err(LocatorError::Topology(format!(
                "no candidate paths below `{root}`"
            )));
        }
        let uncovered = paths.uncovered_lines(graph);
        if !uncovered.is_empty() {
            warn!(lines = %uncovered.join(","), "lines on no candidate path cannot be located");
        }

        let sensors = SensorMap::build(graph, root)?;
        let settings: SweepSettings = config.sweep_settings();
        let models = paths
            .iter()
            .enumerate()
            .map(|(i, p)| PathModel::prepare(i, p, table, &prefault, &settings))
            .collect::<Result<Vec<_>>>()?;

        let reference_native = match &config.feeder.reference_lateral {
            Some(lines) => table.path_length(lines)?,
            None => models.iter().map(PathModel::length).fold(0.0, f64::max),
        };
        let length_scale = config.report.length_scale;

        info!(
            buses = graph.bus_count(),
            lines = table.len(),
            paths = paths.len(),
            sensors = sensors.list_sensors().len(),
            "feeder model ready"
        );

        Ok(Self {
            sensors,
            paths,
            models,
            length_scale,
            reference_length: reference_native * length_scale,
        })
    }

    pub fn sensors(&self) -> &SensorMap {
        &self.sensors
    }

    pub fn paths(&self) -> &PathSet {
        &self.paths
    }

    /// Column layout of records for this feeder.
    pub fn schema(&self) -> MeasurementSchema {
        MeasurementSchema::new(self.sensors.list_sensors())
    }

    /// Reference lateral length in output units.
    pub fn reference_length(&self) -> f64 {
        self.reference_length
    }

    pub fn length_scale(&self) -> f64 {
        self.length_scale
    }

    /// Locates every record on the current rayon pool.
    pub fn run(&self, records: &[FaultRecord]) -> BatchResult {
        let n_paths = self.models.len();
        info!(
            records = records.len(),
            paths = n_paths,
            "locating faults"
        );

        let mut sweeps = (0..records.len() * n_paths)
            .into_par_iter()
            .map(|k| {
                let record = &records[k / n_paths];
                self.models[k % n_paths].estimate(
                    &record.fault_type,
                    &record.v_fault,
                    &record.i_fault,
                )
            })
            .collect::<Vec<Result<Estimate>>>()
            .into_iter();

        let mut outcomes = Vec::with_capacity(records.len());
        let mut failures = Vec::new();
        for record in records {
            let per_path: Vec<Result<Estimate>> = sweeps.by_ref().take(n_paths).collect();
            let outcome = self.assemble(record, per_path, &mut failures);
            outcomes.push(outcome);
        }

        for f in &failures {
            warn!(record = f.record, path = ?f.path.map(|p| p + 1), error = %f.error, "record failed");
        }
        info!(
            records = outcomes.len(),
            failures = failures.len(),
            "batch complete"
        );

        BatchResult {
            path_names: self.paths.iter().map(|p| p.name.clone()).collect(),
            sensors: self.sensors.list_sensors().to_vec(),
            length_scale: self.length_scale,
            reference_length: self.reference_length,
            outcomes,
            failures,
        }
    }

    /// Runs on a dedicated pool of `threads` workers, or the global pool.
    ///
    /// # Errors
    ///
    /// Returns `LocatorError::ThreadPool` if the pool cannot be built.
    pub fn run_with_threads(
        &self,
        records: &[FaultRecord],
        threads: Option<usize>,
    ) -> Result<BatchResult> {
        match threads {
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new().num_threads(n).build()?;
                Ok(pool.install(|| self.run(records)))
            }
            None => Ok(self.run(records)),
        }
    }

    fn assemble(
        &self,
        record: &FaultRecord,
        per_path: Vec<Result<Estimate>>,
        failures: &mut Vec<RecordFailure>,
    ) -> RecordOutcome {
        let mut outcome = RecordOutcome {
            record: record.index,
            fault_type: record.fault_type.clone(),
            estimates: Vec::with_capacity(per_path.len()),
            selection: None,
            truth: record.truth.clone(),
            readings: record.sensors.clone(),
            error_pct: None,
            branch_hit: None,
        };

        if let FaultType::Unrecognized(code) = &record.fault_type {
            outcome.estimates = vec![None; per_path.len()];
            failures.push(RecordFailure {
                record: record.index,
                path: None,
                error: LocatorError::UndefinedReactance(code.clone()),
            });
            return outcome;
        }

        for (path, result) in per_path.into_iter().enumerate() {
            match result {
                Ok(estimate) => {
                    if !estimate.is_crossing() {
                        debug!(record = record.index, path = path + 1, "no crossing on path");
                    }
                    outcome.estimates.push(Some(estimate));
                }
                Err(error) => {
                    failures.push(RecordFailure {
                        record: record.index,
                        path: Some(path),
                        error,
                    });
                    outcome.estimates.push(None);
                }
            }
        }

        let found: Vec<Estimate> = outcome.estimates.iter().flatten().cloned().collect();
        match select_true_branch(&record.fault_type, &found, &record.sensors, &self.sensors) {
            Ok(selection) => {
                if selection.reliability.is_low() {
                    warn!(
                        record = record.index,
                        reliability = %selection.reliability,
                        "low-confidence branch selection"
                    );
                }
                if let Some(truth) = &record.truth {
                    let selected = selection.estimate.distance * self.length_scale;
                    if self.reference_length > 0.0 {
                        outcome.error_pct =
                            Some(100.0 * (selected - truth.distance) / self.reference_length);
                    }
                    outcome.branch_hit = self
                        .sensors
                        .sensor_of(&truth.line)
                        .map(|s| s == selection.sensor);
                }
                outcome.selection = Some(selection);
            }
            Err(error) => failures.push(RecordFailure {
                record: record.index,
                path: None,
                error,
            }),
        }
        outcome
    }
}

/// Result of locating one record.
#[derive(Debug, Clone)]
pub struct RecordOutcome {
    pub record: usize,
    pub fault_type: FaultType,
    /// One entry per candidate path; `None` where the sweep failed.
    pub estimates: Vec<Option<Estimate>>,
    pub selection: Option<Selection>,
    pub truth: Option<GroundTruth>,
    pub readings: SensorReadings,
    /// Signed error relative to the reference lateral, in percent.
    pub error_pct: Option<f64>,
    /// Whether the selected sensor governs the true faulted line.
    pub branch_hit: Option<bool>,
}

impl RecordOutcome {
    pub fn is_low_confidence(&self) -> bool {
        self.selection
            .as_ref()
            .is_some_and(|s| s.reliability.is_low())
    }

    /// Sweep steps skipped over every path of this record.
    pub fn skipped_steps(&self) -> usize {
        self.estimates.iter().flatten().map(|e| e.skipped_steps).sum()
    }
}

/// All outcomes of a batch plus the layout needed to export them.
#[derive(Debug)]
pub struct BatchResult {
    pub path_names: Vec<String>,
    pub sensors: Vec<String>,
    /// Native length unit to output unit.
    pub length_scale: f64,
    /// Reference lateral length in output units.
    pub reference_length: f64,
    pub outcomes: Vec<RecordOutcome>,
    pub failures: Vec<RecordFailure>,
}

impl BatchResult {
    /// Number of distinct records with at least one failure.
    pub fn failed_records(&self) -> usize {
        let mut ids: Vec<usize> = self.failures.iter().map(|f| f.record).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }
}
