//! Built-in feeder data: the IEEE 34-bus test feeder.

use crate::error::Result;
use crate::topology::{EdgeKind, PathSet, TopologyGraph};

/// Substation bus of the IEEE 34-bus feeder.
pub const IEEE34_ROOT: &str = "800";

/// The eight root-to-terminal circuits, in the order their estimates are
/// reported.
pub const IEEE34_CIRCUITS: [&[&str]; 8] = [
    &["l1", "l2", "l3", "l4"],
    &["l1", "l2", "l3", "l5", "l6", "l7", "l24", "l8", "l10", "l11"],
    &["l1", "l2", "l3", "l5", "l6", "l7", "l24", "l9", "l12"],
    &[
        "l1", "l2", "l3", "l5", "l6", "l7", "l24", "l9", "l13", "l14", "l15", "l26",
    ],
    &[
        "l1", "l2", "l3", "l5", "l6", "l7", "l24", "l9", "l13", "l14", "l15", "l27", "l25",
        "l16", "l28",
    ],
    &[
        "l1", "l2", "l3", "l5", "l6", "l7", "l24", "l9", "l13", "l14", "l15", "l27", "l25",
        "l16", "l29", "l18", "l21", "l22", "l23",
    ],
    &[
        "l1", "l2", "l3", "l5", "l6", "l7", "l24", "l9", "l13", "l14", "l15", "l27", "l25",
        "l16", "l29", "l17", "l30", "l20", "l31",
    ],
    &[
        "l1", "l2", "l3", "l5", "l6", "l7", "l24", "l9", "l13", "l14", "l15", "l27", "l25",
        "l16", "l29", "l17", "l30", "l19",
    ],
];

/// Main lateral used as the denominator of the percentage error.
pub const IEEE34_REFERENCE_LATERAL: &[&str] = &[
    "l1", "l2", "l3", "l5", "l6", "l24", "l9", "l13", "l14", "l15", "l27", "l16", "l29", "l17",
    "l30", "l20",
];

/// `(upstream bus, downstream bus, element, kind)` for every series element.
pub const IEEE34_EDGES: &[(&str, &str, &str, EdgeKind)] = &[
    ("800", "802", "l1", EdgeKind::Line),
    ("802", "806", "l2", EdgeKind::Line),
    ("806", "808", "l3", EdgeKind::Line),
    ("808", "810", "l4", EdgeKind::Line),
    ("808", "812", "l5", EdgeKind::Line),
    ("812", "814", "l6", EdgeKind::Line),
    ("814r", "850", "l7", EdgeKind::Line),
    ("816", "818", "l8", EdgeKind::Line),
    ("816", "824", "l9", EdgeKind::Line),
    ("818", "820", "l10", EdgeKind::Line),
    ("820", "822", "l11", EdgeKind::Line),
    ("824", "826", "l12", EdgeKind::Line),
    ("824", "828", "l13", EdgeKind::Line),
    ("828", "830", "l14", EdgeKind::Line),
    ("830", "854", "l15", EdgeKind::Line),
    ("832", "858", "l16", EdgeKind::Line),
    ("834", "860", "l17", EdgeKind::Line),
    ("834", "842", "l18", EdgeKind::Line),
    ("836", "840", "l19", EdgeKind::Line),
    ("836", "862", "l20", EdgeKind::Line),
    ("842", "844", "l21", EdgeKind::Line),
    ("844", "846", "l22", EdgeKind::Line),
    ("846", "848", "l23", EdgeKind::Line),
    ("850", "816", "l24", EdgeKind::Line),
    ("852r", "832", "l25", EdgeKind::Line),
    ("854", "856", "l26", EdgeKind::Line),
    ("854", "852", "l27", EdgeKind::Line),
    ("858", "864", "l28", EdgeKind::Line),
    ("858", "834", "l29", EdgeKind::Line),
    ("860", "836", "l30", EdgeKind::Line),
    ("862", "838", "l31", EdgeKind::Line),
    ("814", "814r", "reg1", EdgeKind::Regulator),
    ("852", "852r", "reg2", EdgeKind::Regulator),
];

/// Topology graph of the IEEE 34-bus feeder.
pub fn ieee34_topology() -> Result<TopologyGraph> {
    TopologyGraph::from_edges(IEEE34_EDGES.iter().copied())
}

/// The fixed candidate circuits `ckt1`..`ckt8`.
pub fn ieee34_paths() -> PathSet {
    PathSet::from_line_lists(IEEE34_CIRCUITS.iter().map(|c| c.iter().copied()))
}
