//! Low-precision analytic ephemeris.
//!
//! Planets come from the JPL approximate Keplerian elements valid for
//! 1800-2050 (Standish), the Moon from the leading terms of the ELP-2000/82
//! longitude series as tabulated by Meeus, and the chart angles from mean
//! sidereal time. Expect errors of a few arcminutes for the inner planets and
//! up to about a quarter degree for the Moon and the outer planets.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

use crate::ephemeris::{
    ChartAngles, EphemerisBackend, EphemerisError, PlanetLongitude, PlanetLongitudes,
};
use crate::zodiac::normalize_degrees;
use crate::{JulianDay, Location, Planet};

const J2000: JulianDay = 2451545.0;
const DAYS_PER_CENTURY: f64 = 36525.0;

/// 1800-01-01 00:00 UT and 2050-12-31 00:00 UT.
const VALID_FROM: JulianDay = 2378496.5;
const VALID_UNTIL: JulianDay = 2470171.5;

/// General precession in longitude, degrees per Julian century.
const PRECESSION_RATE: f64 = 1.396971;

/// Element value at J2000 and its rate per Julian century.
#[derive(Debug, Clone, Copy)]
struct Element(f64, f64);

impl Element {
    fn at(self, t: f64) -> f64 {
        self.0 + self.1 * t
    }
}

/// Mean orbital elements referred to the J2000 ecliptic and equinox.
#[derive(Debug, Clone, Copy)]
struct OrbitalElements {
    semi_major_axis: Element,
    eccentricity: Element,
    inclination: Element,
    mean_longitude: Element,
    perihelion_longitude: Element,
    node_longitude: Element,
}

const EARTH_MOON_BARYCENTRE: OrbitalElements = OrbitalElements {
    semi_major_axis: Element(1.00000261, 0.00000562),
    eccentricity: Element(0.01671123, -0.00004392),
    inclination: Element(-0.00001531, -0.01294668),
    mean_longitude: Element(100.46457166, 35999.37244981),
    perihelion_longitude: Element(102.93768193, 0.32327364),
    node_longitude: Element(0.0, 0.0),
};

const MERCURY: OrbitalElements = OrbitalElements {
    semi_major_axis: Element(0.38709927, 0.00000037),
    eccentricity: Element(0.20563593, 0.00001906),
    inclination: Element(7.00497902, -0.00594749),
    mean_longitude: Element(252.25032350, 149472.67411175),
    perihelion_longitude: Element(77.45779628, 0.16047689),
    node_longitude: Element(48.33076593, -0.12534081),
};

const VENUS: OrbitalElements = OrbitalElements {
    semi_major_axis: Element(0.72333566, 0.00000390),
    eccentricity: Element(0.00677672, -0.00004107),
    inclination: Element(3.39467605, -0.00078890),
    mean_longitude: Element(181.97909950, 58517.81538729),
    perihelion_longitude: Element(131.60246718, 0.00268329),
    node_longitude: Element(76.67984255, -0.27769418),
};

const MARS: OrbitalElements = OrbitalElements {
    semi_major_axis: Element(1.52371034, 0.00001847),
    eccentricity: Element(0.09339410, 0.00007882),
    inclination: Element(1.84969142, -0.00813131),
    mean_longitude: Element(-4.55343205, 19140.30268499),
    perihelion_longitude: Element(-23.94362959, 0.44441088),
    node_longitude: Element(49.55953891, -0.29257343),
};

const JUPITER: OrbitalElements = OrbitalElements {
    semi_major_axis: Element(5.20288700, -0.00011607),
    eccentricity: Element(0.04838624, -0.00013253),
    inclination: Element(1.30439695, -0.00183714),
    mean_longitude: Element(34.39644051, 3034.74612775),
    perihelion_longitude: Element(14.72847983, 0.21252668),
    node_longitude: Element(100.47390909, 0.20469106),
};

const SATURN: OrbitalElements = OrbitalElements {
    semi_major_axis: Element(9.53667594, -0.00125060),
    eccentricity: Element(0.05386179, -0.00050991),
    inclination: Element(2.48599187, 0.00193609),
    mean_longitude: Element(49.95424423, 1222.49362201),
    perihelion_longitude: Element(92.59887831, -0.41897216),
    node_longitude: Element(113.66242448, -0.28867794),
};

const URANUS: OrbitalElements = OrbitalElements {
    semi_major_axis: Element(19.18916464, -0.00196176),
    eccentricity: Element(0.04725744, -0.00004397),
    inclination: Element(0.77263783, -0.00242939),
    mean_longitude: Element(313.23810451, 428.48202785),
    perihelion_longitude: Element(170.95427630, 0.40805281),
    node_longitude: Element(74.01692503, 0.04240589),
};

const NEPTUNE: OrbitalElements = OrbitalElements {
    semi_major_axis: Element(30.06992276, 0.00026291),
    eccentricity: Element(0.00859048, 0.00005105),
    inclination: Element(1.77004347, 0.00035372),
    mean_longitude: Element(-55.12002969, 218.45945325),
    perihelion_longitude: Element(44.96476227, -0.32241464),
    node_longitude: Element(131.78422574, -0.00508664),
};

const PLUTO: OrbitalElements = OrbitalElements {
    semi_major_axis: Element(39.48211675, -0.00031596),
    eccentricity: Element(0.24882730, 0.00001700),
    inclination: Element(17.14001206, 0.00004818),
    mean_longitude: Element(238.92903833, 145.20780515),
    perihelion_longitude: Element(224.06891629, -0.04062942),
    node_longitude: Element(110.30393684, -0.01183482),
};

/// Moon longitude terms: multiples of D, M, M', F and the sine coefficient
/// in millionths of a degree.
const MOON_LONGITUDE_TERMS: [(f64, f64, f64, f64, f64); 25] = [
    (0.0, 0.0, 1.0, 0.0, 6288774.0),
    (2.0, 0.0, -1.0, 0.0, 1274027.0),
    (2.0, 0.0, 0.0, 0.0, 658314.0),
    (0.0, 0.0, 2.0, 0.0, 213618.0),
    (0.0, 1.0, 0.0, 0.0, -185116.0),
    (0.0, 0.0, 0.0, 2.0, -114332.0),
    (2.0, 0.0, -2.0, 0.0, 58793.0),
    (2.0, -1.0, -1.0, 0.0, 57066.0),
    (2.0, 0.0, 1.0, 0.0, 53322.0),
    (2.0, -1.0, 0.0, 0.0, 45758.0),
    (0.0, 1.0, -1.0, 0.0, -40923.0),
    (1.0, 0.0, 0.0, 0.0, -34720.0),
    (0.0, 1.0, 1.0, 0.0, -30383.0),
    (2.0, 0.0, 0.0, -2.0, 15327.0),
    (0.0, 0.0, 1.0, 2.0, -12528.0),
    (0.0, 0.0, 1.0, -2.0, 10980.0),
    (4.0, 0.0, -1.0, 0.0, 10675.0),
    (0.0, 0.0, 3.0, 0.0, 10034.0),
    (4.0, 0.0, -2.0, 0.0, 8548.0),
    (2.0, 1.0, -1.0, 0.0, -7888.0),
    (2.0, 1.0, 0.0, 0.0, -6766.0),
    (1.0, 0.0, -1.0, 0.0, -5163.0),
    (1.0, 1.0, 0.0, 0.0, 4987.0),
    (2.0, -1.0, 1.0, 0.0, 4036.0),
    (2.0, 0.0, 2.0, 0.0, 3994.0),
];

fn centuries_since_j2000(julian_day: JulianDay) -> f64 {
    (julian_day - J2000) / DAYS_PER_CENTURY
}

fn solve_kepler(mean_anomaly: f64, eccentricity: f64) -> f64 {
    let mut eccentric = mean_anomaly + eccentricity * mean_anomaly.sin();
    for _ in 0..15 {
        let delta = (eccentric - eccentricity * eccentric.sin() - mean_anomaly)
            / (1.0 - eccentricity * eccentric.cos());
        eccentric -= delta;
        if delta.abs() < 1e-12 {
            break;
        }
    }
    eccentric
}

/// Heliocentric rectangular coordinates in AU, J2000 ecliptic.
fn heliocentric_position(elements: &OrbitalElements, t: f64) -> [f64; 3] {
    let a = elements.semi_major_axis.at(t);
    let e = elements.eccentricity.at(t);
    let inclination = elements.inclination.at(t).to_radians();
    let perihelion = elements.perihelion_longitude.at(t);
    let node = elements.node_longitude.at(t);

    let argument = (perihelion - node).to_radians();
    let mean_anomaly = (normalize_degrees(elements.mean_longitude.at(t) - perihelion + 180.0)
        - 180.0)
        .to_radians();
    let eccentric = solve_kepler(mean_anomaly, e);

    let x_orbit = a * (eccentric.cos() - e);
    let y_orbit = a * (1.0 - e * e).sqrt() * eccentric.sin();

    let (sin_w, cos_w) = argument.sin_cos();
    let (sin_node, cos_node) = node.to_radians().sin_cos();
    let (sin_i, cos_i) = inclination.sin_cos();

    [
        (cos_w * cos_node - sin_w * sin_node * cos_i) * x_orbit
            + (-sin_w * cos_node - cos_w * sin_node * cos_i) * y_orbit,
        (cos_w * sin_node + sin_w * cos_node * cos_i) * x_orbit
            + (-sin_w * sin_node + cos_w * cos_node * cos_i) * y_orbit,
        sin_w * sin_i * x_orbit + cos_w * sin_i * y_orbit,
    ]
}

fn orbital_elements(planet: Planet) -> Option<&'static OrbitalElements> {
    match planet {
        Planet::Mercury => Some(&MERCURY),
        Planet::Venus => Some(&VENUS),
        Planet::Mars => Some(&MARS),
        Planet::Jupiter => Some(&JUPITER),
        Planet::Saturn => Some(&SATURN),
        Planet::Uranus => Some(&URANUS),
        Planet::Neptune => Some(&NEPTUNE),
        Planet::Pluto => Some(&PLUTO),
        Planet::Sun | Planet::Moon => None,
    }
}

fn moon_longitude(t: f64) -> f64 {
    let mean_longitude = 218.3164477 + 481267.88123421 * t - 0.0015786 * t * t;
    let elongation = 297.8501921 + 445267.1114034 * t - 0.0018819 * t * t;
    let sun_anomaly = 357.5291092 + 35999.0502909 * t - 0.0001536 * t * t;
    let moon_anomaly = 134.9633964 + 477198.8675055 * t + 0.0087414 * t * t;
    let latitude_argument = 93.2720950 + 483202.0175233 * t - 0.0036539 * t * t;
    let eccentricity = 1.0 - 0.002516 * t - 0.0000074 * t * t;

    let mut sum: f64 = MOON_LONGITUDE_TERMS
        .iter()
        .map(|&(d, m, mp, f, coefficient)| {
            let argument =
                d * elongation + m * sun_anomaly + mp * moon_anomaly + f * latitude_argument;
            coefficient * eccentricity.powi(m.abs() as i32) * argument.to_radians().sin()
        })
        .sum();

    // Venus and Jupiter perturbations and the flattening of the Earth.
    let a1 = 119.75 + 131.849 * t;
    sum += 3958.0 * a1.to_radians().sin()
        + 1962.0 * (mean_longitude - latitude_argument).to_radians().sin();

    normalize_degrees(mean_longitude + sum / 1_000_000.0)
}

/// Geocentric ecliptic longitude referred to the mean equinox of date.
pub fn geocentric_longitude(planet: Planet, julian_day: JulianDay) -> f64 {
    let t = centuries_since_j2000(julian_day);
    if planet == Planet::Moon {
        return moon_longitude(t);
    }

    let earth = heliocentric_position(&EARTH_MOON_BARYCENTRE, t);
    let (x, y) = match orbital_elements(planet) {
        Some(elements) => {
            let body = heliocentric_position(elements, t);
            (body[0] - earth[0], body[1] - earth[1])
        }
        // Sun
        None => (-earth[0], -earth[1]),
    };
    normalize_degrees(y.atan2(x).to_degrees() + PRECESSION_RATE * t)
}

/// Apparent direction of motion over the day centred on `julian_day`.
pub fn is_retrograde(planet: Planet, julian_day: JulianDay) -> bool {
    let before = geocentric_longitude(planet, julian_day - 0.5);
    let after = geocentric_longitude(planet, julian_day + 0.5);
    normalize_degrees(after - before + 180.0) - 180.0 < 0.0
}

/// Ascendant and midheaven from mean sidereal time; the opposite points are
/// derived.
pub fn chart_angles(julian_day: JulianDay, location: Location) -> ChartAngles {
    let t = centuries_since_j2000(julian_day);
    let sidereal_time = 280.46061837
        + 360.98564736629 * (julian_day - J2000)
        + 0.000387933 * t * t
        - t * t * t / 38_710_000.0;
    let ramc = normalize_degrees(sidereal_time + location.longitude).to_radians();
    let obliquity = (23.439291111 - 0.0130041667 * t).to_radians();
    let latitude = location.latitude.to_radians();

    let midheaven = ramc.sin().atan2(ramc.cos() * obliquity.cos()).to_degrees();
    let ascendant = ramc
        .cos()
        .atan2(-(ramc.sin() * obliquity.cos() + latitude.tan() * obliquity.sin()))
        .to_degrees();

    ChartAngles::from_ascendant_midheaven(normalize_degrees(ascendant), normalize_degrees(midheaven))
}

/// Self-contained backend needing no data files.
#[derive(Debug, Default)]
pub struct AnalyticEphemeris {
    ready: AtomicBool,
}

impl AnalyticEphemeris {
    pub fn new() -> Self {
        AnalyticEphemeris::default()
    }

    fn check_query(&self, julian_day: JulianDay) -> Result<(), EphemerisError> {
        if !self.ready.load(Ordering::Acquire) {
            return Err(EphemerisError::NotInitialized);
        }
        if !julian_day.is_finite() {
            return Err(EphemerisError::Calculation {
                julian_day,
                message: "julian day is not a finite number".to_string(),
            });
        }
        if !(VALID_FROM..=VALID_UNTIL).contains(&julian_day) {
            warn!(
                julian_day,
                "date outside 1800-2050, analytic positions will degrade"
            );
        }
        Ok(())
    }
}

#[async_trait]
impl EphemerisBackend for AnalyticEphemeris {
    async fn initialize(&self) -> Result<(), EphemerisError> {
        if !self.ready.swap(true, Ordering::AcqRel) {
            debug!("analytic ephemeris ready");
        }
        Ok(())
    }

    async fn planet_longitudes(
        &self,
        julian_day: JulianDay,
    ) -> Result<PlanetLongitudes, EphemerisError> {
        self.check_query(julian_day)?;
        Ok(PlanetLongitudes::from_fn(|planet| {
            PlanetLongitude::with_retrograde(
                geocentric_longitude(planet, julian_day),
                is_retrograde(planet, julian_day),
            )
        }))
    }

    async fn angles(
        &self,
        julian_day: JulianDay,
        location: Location,
    ) -> Result<ChartAngles, EphemerisError> {
        self.check_query(julian_day)?;
        if !location.latitude.is_finite() || location.latitude.abs() >= 90.0 {
            return Err(EphemerisError::Calculation {
                julian_day,
                message: format!("ascendant undefined at latitude {}", location.latitude),
            });
        }
        Ok(chart_angles(julian_day, location))
    }
}
