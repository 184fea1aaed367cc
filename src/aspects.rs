use serde::{Deserialize, Serialize};

use crate::AspectKind;

/// An aspect and the tolerance around its exact angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectDefinition {
    pub kind: AspectKind,
    pub angle: f64,
    pub orb: f64,
}

/// Major aspects in match priority order.
///
/// The orb windows do not overlap, so at most one entry can match a given
/// separation.
pub const ASPECT_TABLE: [AspectDefinition; 5] = [
    AspectDefinition {
        kind: AspectKind::Conjunction,
        angle: 0.0,
        orb: 8.0,
    },
    AspectDefinition {
        kind: AspectKind::Opposition,
        angle: 180.0,
        orb: 8.0,
    },
    AspectDefinition {
        kind: AspectKind::Trine,
        angle: 120.0,
        orb: 8.0,
    },
    AspectDefinition {
        kind: AspectKind::Square,
        angle: 90.0,
        orb: 7.0,
    },
    AspectDefinition {
        kind: AspectKind::Sextile,
        angle: 60.0,
        orb: 6.0,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectMatch {
    pub kind: AspectKind,
    /// `|separation - exact angle|`, never larger than the aspect's orb.
    pub orb: f64,
}

/// Shortest arc between two longitudes, in `[0, 180]`.
pub fn angular_distance(lon1: f64, lon2: f64) -> f64 {
    let diff = (lon1 - lon2).abs() % 360.0;
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Returns the first aspect in [`ASPECT_TABLE`] whose orb contains the
/// separation of the two longitudes.
pub fn find_aspect(lon1: f64, lon2: f64) -> Option<AspectMatch> {
    let distance = angular_distance(lon1, lon2);
    ASPECT_TABLE.iter().find_map(|def| {
        let orb = (distance - def.angle).abs();
        (orb <= def.orb).then_some(AspectMatch {
            kind: def.kind,
            orb,
        })
    })
}
