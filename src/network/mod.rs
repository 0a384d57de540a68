//! Circuit-model access and the line parameter table.

pub mod model;
pub mod table;

pub use model::{
    CircuitModel, LineCodeData, LineElement, NetworkFile, SeriesElement, SubstationMeasurement,
    parse_bus_spec,
};
pub use table::{LineSegment, LineTable, build_line_table, expand_impedance};
