//! Shared test fixtures for integration tests.
//!
//! [`RadialFeeder`] is a small three-phase short-circuit solver: an ideal
//! source behind a source impedance, mutually coupled lines, wye loads at
//! terminal buses, and a fault shunt somewhere along one line. It produces
//! the substation phasors and lateral currents a real recorder would see.

#![allow(dead_code)]

use std::collections::HashMap;

use num_complex::Complex64;

use fault_locator::locate::{FaultType, PrefaultState};
use fault_locator::network::model::{LineSection, SubstationSection};
use fault_locator::network::{LineCodeData, LineSegment, LineTable, NetworkFile};
use fault_locator::phasor::{Matrix3, Phase, Phasors, invert};
use fault_locator::record::{FaultRecord, GroundTruth, SensorReadings};
use fault_locator::topology::{EdgeKind, TopologyGraph};

/// Metres per kft, the default output scale.
pub const METRES_PER_KFT: f64 = 304.8;

pub fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

fn inv(m: &Matrix3) -> Matrix3 {
    invert(m, 1e-20).expect("solver matrices are invertible")
}

/// Per-unit-length impedance shared by every line of the fixtures.
pub fn unit_impedance() -> Matrix3 {
    let s = c(0.3, 0.6);
    let m = c(0.1, 0.25);
    Matrix3::new(s, m, m, m, s, m, m, m, s)
}

/// Balanced 7.2 kV source, phases a-b-c.
pub fn balanced_source() -> Phasors {
    let a = Complex64::from_polar(1.0, -2.0 * std::f64::consts::PI / 3.0);
    let v = 7200.0;
    Phasors::new(c(v, 0.0), a * v, a * a * v)
}

/// A line of the fixture feeder.
#[derive(Debug, Clone)]
pub struct FixtureLine {
    pub id: String,
    pub from: String,
    pub to: String,
    pub length: f64,
}

/// Fault shunt placed `fraction` of the way along `line`.
#[derive(Debug, Clone)]
pub struct FaultSpec {
    pub line: String,
    pub fraction: f64,
    pub shunt: Matrix3,
}

impl FaultSpec {
    /// Phase(s) to ground through `rf` each.
    pub fn to_ground(line: &str, fraction: f64, phases: &[Phase], rf: f64) -> Self {
        let mut shunt = Matrix3::zeros();
        for p in phases {
            shunt[(p.index(), p.index())] = c(1.0 / rf, 0.0);
        }
        Self {
            line: line.into(),
            fraction,
            shunt,
        }
    }

    /// Phase to phase through `rf`.
    pub fn phase_pair(line: &str, fraction: f64, p: Phase, q: Phase, rf: f64) -> Self {
        let g = c(1.0 / rf, 0.0);
        let (i, j) = (p.index(), q.index());
        let mut shunt = Matrix3::zeros();
        shunt[(i, i)] = g;
        shunt[(j, j)] = g;
        shunt[(i, j)] = -g;
        shunt[(j, i)] = -g;
        Self {
            line: line.into(),
            fraction,
            shunt,
        }
    }
}

/// Steady-state solution at the substation and along every line.
#[derive(Debug, Clone)]
pub struct Solution {
    pub voltage: Phasors,
    pub current: Phasors,
    /// Current entering each line at its upstream end.
    pub line_currents: HashMap<String, Phasors>,
}

/// Radial feeder with wye loads at its terminal buses.
#[derive(Debug, Clone)]
pub struct RadialFeeder {
    pub root: String,
    pub source: Phasors,
    pub z_source: Matrix3,
    pub z_unit: Matrix3,
    pub lines: Vec<FixtureLine>,
    pub loads: HashMap<String, Matrix3>,
}

impl RadialFeeder {
    /// `s -t1- b`, then three identical laterals `b -lKa- xK -lKb- yK`.
    /// Trunk 2.0 long, each lateral line 1.5.
    pub fn three_lateral() -> Self {
        let mut lines = vec![FixtureLine {
            id: "t1".into(),
            from: "s".into(),
            to: "b".into(),
            length: 2.0,
        }];
        let mut loads = HashMap::new();
        let load_z = [c(280.0, 120.0), c(300.0, 140.0), c(320.0, 110.0)];
        for (k, z) in (1..=3).zip(load_z) {
            lines.push(FixtureLine {
                id: format!("l{k}a"),
                from: "b".into(),
                to: format!("x{k}"),
                length: 1.5,
            });
            lines.push(FixtureLine {
                id: format!("l{k}b"),
                from: format!("x{k}"),
                to: format!("y{k}"),
                length: 1.5,
            });
            loads.insert(format!("y{k}"), Matrix3::from_diagonal_element(z));
        }
        Self {
            root: "s".into(),
            source: balanced_source(),
            z_source: Matrix3::from_diagonal_element(c(0.05, 0.5)),
            z_unit: unit_impedance(),
            lines,
            loads,
        }
    }

    fn line(&self, id: &str) -> &FixtureLine {
        self.lines
            .iter()
            .find(|l| l.id == id)
            .expect("fixture line exists")
    }

    fn children<'a>(&'a self, bus: &'a str) -> impl Iterator<Item = &'a FixtureLine> + 'a {
        self.lines.iter().filter(move |l| l.from == bus)
    }

    /// Admittance seen looking into `bus` from upstream.
    fn bus_admittance(&self, bus: &str, fault: Option<&FaultSpec>) -> Matrix3 {
        let mut y = match self.loads.get(bus) {
            Some(z) => inv(z),
            None => Matrix3::zeros(),
        };
        for line in self.children(bus) {
            y += self.branch_admittance(line, fault);
        }
        y
    }

    /// Admittance seen looking into `line` from its upstream bus.
    fn branch_admittance(&self, line: &FixtureLine, fault: Option<&FaultSpec>) -> Matrix3 {
        let z_below = inv(&self.bus_admittance(&line.to, fault));
        match fault.filter(|f| f.line == line.id) {
            Some(f) => {
                let after = self.z_unit.scale(line.length * (1.0 - f.fraction)) + z_below;
                let y_node = inv(&after) + f.shunt;
                inv(&(self.z_unit.scale(line.length * f.fraction) + inv(&y_node)))
            }
            None => inv(&(self.z_unit.scale(line.length) + z_below)),
        }
    }

    pub fn solve(&self, fault: Option<&FaultSpec>) -> Solution {
        let z_feeder = inv(&self.bus_admittance(&self.root, fault));
        let current = inv(&(self.z_source + z_feeder)) * self.source;
        let voltage = self.source - self.z_source * current;

        let mut line_currents = HashMap::new();
        let mut stack = vec![(self.root.clone(), voltage)];
        while let Some((bus, v_bus)) = stack.pop() {
            for line in self.children(&bus) {
                let i_line = self.branch_admittance(line, fault) * v_bus;
                line_currents.insert(line.id.clone(), i_line);
                let v_end = match fault.filter(|f| f.line == line.id) {
                    Some(f) => {
                        let z_up = self.z_unit.scale(line.length * f.fraction);
                        let z_rest = self.z_unit.scale(line.length * (1.0 - f.fraction));
                        let v_fault = v_bus - z_up * i_line;
                        let z_below = inv(&self.bus_admittance(&line.to, fault));
                        let i_rest = inv(&(z_rest + z_below)) * v_fault;
                        v_fault - z_rest * i_rest
                    }
                    None => v_bus - self.z_unit.scale(line.length) * i_line,
                };
                stack.push((line.to.clone(), v_end));
            }
        }

        Solution {
            voltage,
            current,
            line_currents,
        }
    }

    pub fn prefault(&self) -> PrefaultState {
        let s = self.solve(None);
        PrefaultState {
            voltage: s.voltage,
            current: s.current,
        }
    }

    pub fn graph(&self) -> TopologyGraph {
        TopologyGraph::from_edges(
            self.lines
                .iter()
                .map(|l| (l.from.as_str(), l.to.as_str(), l.id.as_str(), EdgeKind::Line)),
        )
        .expect("fixture ids are unique")
    }

    pub fn line_table(&self) -> LineTable {
        let mut table = LineTable::new();
        for l in &self.lines {
            table.insert(LineSegment {
                id: l.id.clone(),
                length: l.length,
                phases: Phase::ALL.to_vec(),
                impedance: self.z_unit,
                upstream_bus: l.from.clone(),
                downstream_bus: l.to.clone(),
                line_code: "mtx".into(),
            });
        }
        table
    }

    /// The feeder as a circuit-model export, pre-fault state included.
    pub fn network_file(&self) -> NetworkFile {
        let interleave = |p: &Phasors| p.iter().flat_map(|z| [z.re, z.im]).collect::<Vec<f64>>();
        let pre = self.prefault();
        let z = &self.z_unit;
        let row_major = |part: fn(&Complex64) -> f64| -> Vec<f64> {
            (0..3)
                .flat_map(|i| (0..3).map(move |j| part(&z[(i, j)])))
                .collect()
        };
        NetworkFile {
            substation: SubstationSection {
                element: self.lines[0].id.clone(),
                prefault_voltage: interleave(&pre.voltage),
                prefault_current: interleave(&pre.current),
            },
            linecodes: vec![LineCodeData {
                name: "mtx".into(),
                rmatrix: row_major(|e| e.re),
                xmatrix: row_major(|e| e.im),
            }],
            lines: self
                .lines
                .iter()
                .map(|l| LineSection {
                    name: l.id.clone(),
                    bus1: format!("{}.1.2.3", l.from),
                    bus2: format!("{}.1.2.3", l.to),
                    linecode: "mtx".into(),
                    length: l.length,
                })
                .collect(),
            regulators: Vec::new(),
        }
    }

    /// Distance from the root to the fault point, in line-length units.
    pub fn fault_distance(&self, fault: &FaultSpec) -> f64 {
        let line = self.line(&fault.line);
        let mut distance = line.length * fault.fraction;
        let mut bus = line.from.clone();
        while let Some(parent) = self.lines.iter().find(|l| l.to == bus) {
            distance += parent.length;
            bus = parent.from.clone();
        }
        distance
    }

    /// Fault record as the substation recorder and lateral sensors see it.
    pub fn record(&self, index: usize, fault: &FaultSpec, code: &str, sensors: &[String]) -> FaultRecord {
        let solution = self.solve(Some(fault));
        let mut readings = SensorReadings::new();
        for sensor in sensors {
            let i = solution.line_currents[sensor];
            for phase in Phase::ALL {
                readings.insert(sensor.clone(), phase, i[phase.index()].norm());
            }
        }
        FaultRecord {
            index,
            fault_type: FaultType::parse(code),
            v_fault: solution.voltage,
            i_fault: solution.current,
            sensors: readings,
            truth: Some(GroundTruth {
                line: fault.line.clone(),
                distance: self.fault_distance(fault) * METRES_PER_KFT,
                resistance: None,
            }),
        }
    }
}
