//! Natal chart engine.
//!
//! Converts a local birth time into a Julian Day, asks an [`EphemerisBackend`]
//! for planet and angle longitudes, places every point in a tropical zodiac sign
//! and detects the major aspects between every pair of points.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod analytic;
pub mod aspects;
pub mod chart;
pub mod config;
pub mod ephemeris;
pub mod report;
pub mod time;
pub mod zodiac;

pub use analytic::AnalyticEphemeris;
pub use aspects::{angular_distance, find_aspect, AspectDefinition, AspectMatch, ASPECT_TABLE};
pub use chart::{compute_natal_chart, detect_aspects};
pub use config::BackendConfig;
pub use ephemeris::{
    ChartAngles, EphemerisBackend, EphemerisError, FixedEphemeris, PlanetLongitude,
    PlanetLongitudes,
};
pub use report::ChartResponse;
pub use time::{to_julian_day, LocalDateTime};
pub use zodiac::{normalize_degrees, to_zodiac_placement};

pub type JulianDay = f64;

// ---------------------------
// ## Enumerations
// ---------------------------

/// The ten classical planets, in chart presentation order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Planet {
    Sun = 0,
    Moon,
    Mars,
    Mercury,
    Jupiter,
    Venus,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
}

impl Planet {
    pub const ALL: [Planet; 10] = [
        Planet::Sun,
        Planet::Moon,
        Planet::Mars,
        Planet::Mercury,
        Planet::Jupiter,
        Planet::Venus,
        Planet::Saturn,
        Planet::Uranus,
        Planet::Neptune,
        Planet::Pluto,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Planet::Sun => "Sun",
            Planet::Moon => "Moon",
            Planet::Mars => "Mars",
            Planet::Mercury => "Mercury",
            Planet::Jupiter => "Jupiter",
            Planet::Venus => "Venus",
            Planet::Saturn => "Saturn",
            Planet::Uranus => "Uranus",
            Planet::Neptune => "Neptune",
            Planet::Pluto => "Pluto",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Planet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Planet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Planet::ALL
            .iter()
            .copied()
            .find(|planet| planet.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown planet: {}", s))
    }
}

/// Every point that appears in a natal chart.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartPoint {
    Ascendant,
    Sun,
    Moon,
    Mars,
    Mercury,
    Jupiter,
    Venus,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
    Descendant,
    #[serde(rename = "MC")]
    Midheaven,
    #[serde(rename = "IC")]
    ImumCoeli,
}

/// Canonical point order. Drives both the chart listing and aspect pairing,
/// so downstream consumers see the same sequence in both places.
pub const CHART_POINTS: [ChartPoint; 14] = [
    ChartPoint::Ascendant,
    ChartPoint::Sun,
    ChartPoint::Moon,
    ChartPoint::Mars,
    ChartPoint::Mercury,
    ChartPoint::Jupiter,
    ChartPoint::Venus,
    ChartPoint::Saturn,
    ChartPoint::Uranus,
    ChartPoint::Neptune,
    ChartPoint::Pluto,
    ChartPoint::Descendant,
    ChartPoint::Midheaven,
    ChartPoint::ImumCoeli,
];

impl ChartPoint {
    pub fn name(self) -> &'static str {
        match self.planet() {
            Some(planet) => planet.name(),
            None => match self {
                ChartPoint::Ascendant => "Ascendant",
                ChartPoint::Descendant => "Descendant",
                ChartPoint::Midheaven => "MC",
                _ => "IC",
            },
        }
    }

    /// The planet behind this point, `None` for the four angles.
    pub fn planet(self) -> Option<Planet> {
        match self {
            ChartPoint::Sun => Some(Planet::Sun),
            ChartPoint::Moon => Some(Planet::Moon),
            ChartPoint::Mars => Some(Planet::Mars),
            ChartPoint::Mercury => Some(Planet::Mercury),
            ChartPoint::Jupiter => Some(Planet::Jupiter),
            ChartPoint::Venus => Some(Planet::Venus),
            ChartPoint::Saturn => Some(Planet::Saturn),
            ChartPoint::Uranus => Some(Planet::Uranus),
            ChartPoint::Neptune => Some(Planet::Neptune),
            ChartPoint::Pluto => Some(Planet::Pluto),
            ChartPoint::Ascendant
            | ChartPoint::Descendant
            | ChartPoint::Midheaven
            | ChartPoint::ImumCoeli => None,
        }
    }
}

impl From<Planet> for ChartPoint {
    fn from(planet: Planet) -> Self {
        match planet {
            Planet::Sun => ChartPoint::Sun,
            Planet::Moon => ChartPoint::Moon,
            Planet::Mars => ChartPoint::Mars,
            Planet::Mercury => ChartPoint::Mercury,
            Planet::Jupiter => ChartPoint::Jupiter,
            Planet::Venus => ChartPoint::Venus,
            Planet::Saturn => ChartPoint::Saturn,
            Planet::Uranus => ChartPoint::Uranus,
            Planet::Neptune => ChartPoint::Neptune,
            Planet::Pluto => ChartPoint::Pluto,
        }
    }
}

impl fmt::Display for ChartPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZodiacSign {
    Aries = 0,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl ZodiacSign {
    pub const ALL: [ZodiacSign; 12] = [
        ZodiacSign::Aries,
        ZodiacSign::Taurus,
        ZodiacSign::Gemini,
        ZodiacSign::Cancer,
        ZodiacSign::Leo,
        ZodiacSign::Virgo,
        ZodiacSign::Libra,
        ZodiacSign::Scorpio,
        ZodiacSign::Sagittarius,
        ZodiacSign::Capricorn,
        ZodiacSign::Aquarius,
        ZodiacSign::Pisces,
    ];

    pub fn from_longitude(longitude: f64) -> Self {
        zodiac::to_zodiac_placement(longitude).sign
    }

    /// 1-based position in the zodiac, Aries = 1.
    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    pub fn name(self) -> &'static str {
        match self {
            ZodiacSign::Aries => "Aries",
            ZodiacSign::Taurus => "Taurus",
            ZodiacSign::Gemini => "Gemini",
            ZodiacSign::Cancer => "Cancer",
            ZodiacSign::Leo => "Leo",
            ZodiacSign::Virgo => "Virgo",
            ZodiacSign::Libra => "Libra",
            ZodiacSign::Scorpio => "Scorpio",
            ZodiacSign::Sagittarius => "Sagittarius",
            ZodiacSign::Capricorn => "Capricorn",
            ZodiacSign::Aquarius => "Aquarius",
            ZodiacSign::Pisces => "Pisces",
        }
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectKind {
    Conjunction,
    Opposition,
    Trine,
    Square,
    Sextile,
}

impl AspectKind {
    pub fn name(self) -> &'static str {
        match self {
            AspectKind::Conjunction => "Conjunction",
            AspectKind::Opposition => "Opposition",
            AspectKind::Trine => "Trine",
            AspectKind::Square => "Square",
            AspectKind::Sextile => "Sextile",
        }
    }

    /// Exact separation in degrees.
    pub fn angle(self) -> f64 {
        self.definition().angle
    }

    /// Allowed deviation from the exact angle, in degrees.
    pub fn orb(self) -> f64 {
        self.definition().orb
    }

    // ASPECT_TABLE is laid out in declaration order.
    fn definition(self) -> AspectDefinition {
        ASPECT_TABLE[self as usize]
    }
}

impl fmt::Display for AspectKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------
// ## Structures
// ---------------------------

/// A named position on the ecliptic, as returned by the ephemeris.
///
/// `longitude` is kept exactly as the backend produced it and may lie outside
/// `[0, 360)`; consumers normalize on use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CelestialPoint {
    pub point: ChartPoint,
    pub longitude: f64,
    pub is_retrograde: bool,
}

impl CelestialPoint {
    pub fn new(point: ChartPoint, longitude: f64) -> Self {
        CelestialPoint {
            point,
            longitude,
            is_retrograde: false,
        }
    }

    pub fn retrograde(mut self, is_retrograde: bool) -> Self {
        self.is_retrograde = is_retrograde;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZodiacPlacement {
    pub sign: ZodiacSign,
    /// 1 = Aries ... 12 = Pisces.
    pub sign_index: u8,
    /// Always in `[0, 30)`.
    pub degree_in_sign: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPosition {
    pub point: CelestialPoint,
    pub placement: ZodiacPlacement,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aspect {
    /// Always precedes `point_b` in [`CHART_POINTS`].
    pub point_a: ChartPoint,
    pub point_b: ChartPoint,
    pub kind: AspectKind,
    /// Deviation from the exact aspect angle, in degrees.
    pub orb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NatalChart {
    pub julian_day: JulianDay,
    /// One entry per [`CHART_POINTS`] element, in that order.
    pub positions: Vec<ChartPosition>,
    pub aspects: Vec<Aspect>,
}

impl NatalChart {
    pub fn position(&self, point: ChartPoint) -> Option<&ChartPosition> {
        self.positions.iter().find(|pos| pos.point.point == point)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Location { latitude, longitude }
    }
}

/// Everything needed to cast a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthInput {
    pub datetime: LocalDateTime,
    /// Hours east of UTC; fractional offsets such as 5.5 are allowed.
    pub utc_offset_hours: f64,
    pub location: Location,
}

impl BirthInput {
    pub fn new(datetime: LocalDateTime, utc_offset_hours: f64, location: Location) -> Self {
        BirthInput {
            datetime,
            utc_offset_hours,
            location,
        }
    }

    /// Builds an input from a chrono datetime carrying its own offset.
    pub fn from_fixed_offset(
        date_time: chrono::DateTime<chrono::FixedOffset>,
        location: Location,
    ) -> Self {
        let offset_seconds = date_time.offset().local_minus_utc();
        BirthInput {
            datetime: LocalDateTime::from(date_time.naive_local()),
            utc_offset_hours: f64::from(offset_seconds) / 3600.0,
            location,
        }
    }

    pub fn julian_day(&self) -> JulianDay {
        time::to_julian_day(&self.datetime, self.utc_offset_hours)
    }
}

// ---------------------------
// ## Error Handling
// ---------------------------

#[derive(Debug, thiserror::Error)]
pub enum AstrologyError {
    /// The ephemeris failed to initialize or to answer a query.
    #[error("ephemeris backend unavailable: {0}")]
    BackendUnavailable(#[from] EphemerisError),

    /// Reserved; calendar fields are not range-checked today.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
