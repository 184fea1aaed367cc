use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

use crate::zodiac::normalize_degrees;
use crate::{JulianDay, Location, Planet};

/// Errors that can occur while talking to an ephemeris backend
#[derive(Error, Debug)]
pub enum EphemerisError {
    #[error("ephemeris queried before initialize() completed")]
    NotInitialized,
    #[error("ephemeris initialization failed: {message}")]
    Initialization { message: String },
    #[error("ephemeris calculation failed at JD {julian_day}: {message}")]
    Calculation {
        julian_day: JulianDay,
        message: String,
    },
    #[error("invalid ephemeris snapshot: {0}")]
    Snapshot(String),
    #[error("failed to read ephemeris snapshot: {0}")]
    Io(#[from] std::io::Error),
}

/// Longitude of one planet, with the retrograde flag when the backend knows it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanetLongitude {
    pub longitude: f64,
    #[serde(default)]
    pub retrograde: bool,
}

impl PlanetLongitude {
    pub fn new(longitude: f64) -> Self {
        PlanetLongitude {
            longitude,
            retrograde: false,
        }
    }

    pub fn with_retrograde(longitude: f64, retrograde: bool) -> Self {
        PlanetLongitude {
            longitude,
            retrograde,
        }
    }
}

/// One longitude per planet, stored in [`Planet::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanetLongitudes {
    entries: [PlanetLongitude; 10],
}

impl PlanetLongitudes {
    pub fn new(entries: [PlanetLongitude; 10]) -> Self {
        PlanetLongitudes { entries }
    }

    /// Plain longitudes in [`Planet::ALL`] order, none retrograde.
    pub fn from_degrees(degrees: [f64; 10]) -> Self {
        PlanetLongitudes {
            entries: degrees.map(PlanetLongitude::new),
        }
    }

    pub fn from_fn(mut f: impl FnMut(Planet) -> PlanetLongitude) -> Self {
        PlanetLongitudes {
            entries: Planet::ALL.map(&mut f),
        }
    }

    pub fn get(&self, planet: Planet) -> PlanetLongitude {
        self.entries[planet.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Planet, PlanetLongitude)> + '_ {
        Planet::ALL.iter().copied().zip(self.entries.iter().copied())
    }
}

/// The four chart angles, in ecliptic degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartAngles {
    pub ascendant: f64,
    pub descendant: f64,
    pub midheaven: f64,
    pub imum_coeli: f64,
}

impl ChartAngles {
    /// Derives the descendant and imum coeli as the points opposite the
    /// ascendant and midheaven.
    pub fn from_ascendant_midheaven(ascendant: f64, midheaven: f64) -> Self {
        ChartAngles {
            ascendant,
            descendant: normalize_degrees(ascendant + 180.0),
            midheaven,
            imum_coeli: normalize_degrees(midheaven + 180.0),
        }
    }
}

/// Source of raw positions for chart calculation.
///
/// `initialize` must succeed before any query; it may be called any number of
/// times. Queries made first fail with [`EphemerisError::NotInitialized`].
#[async_trait]
pub trait EphemerisBackend: Send + Sync {
    async fn initialize(&self) -> Result<(), EphemerisError>;

    async fn planet_longitudes(
        &self,
        julian_day: JulianDay,
    ) -> Result<PlanetLongitudes, EphemerisError>;

    async fn angles(
        &self,
        julian_day: JulianDay,
        location: Location,
    ) -> Result<ChartAngles, EphemerisError>;
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    planets: BTreeMap<String, SnapshotPlanet>,
    angles: ChartAngles,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SnapshotPlanet {
    Degrees(f64),
    Detailed(PlanetLongitude),
}

impl From<SnapshotPlanet> for PlanetLongitude {
    fn from(entry: SnapshotPlanet) -> Self {
        match entry {
            SnapshotPlanet::Degrees(longitude) => PlanetLongitude::new(longitude),
            SnapshotPlanet::Detailed(detailed) => detailed,
        }
    }
}

/// Backend that answers every query with the same stored positions.
///
/// Useful for replaying positions exported from another ephemeris and for
/// deterministic tests.
#[derive(Debug)]
pub struct FixedEphemeris {
    planets: PlanetLongitudes,
    angles: ChartAngles,
    ready: AtomicBool,
}

impl FixedEphemeris {
    pub fn new(planets: PlanetLongitudes, angles: ChartAngles) -> Self {
        FixedEphemeris {
            planets,
            angles,
            ready: AtomicBool::new(false),
        }
    }

    /// Parses a snapshot document. Planets may be given as a bare number or as
    /// `{ "longitude": .., "retrograde": .. }`; all ten are required.
    pub fn from_json(json: &str) -> Result<Self, EphemerisError> {
        let snapshot: Snapshot =
            serde_json::from_str(json).map_err(|e| EphemerisError::Snapshot(e.to_string()))?;

        let mut entries: [Option<PlanetLongitude>; 10] = [None; 10];
        for (name, entry) in snapshot.planets {
            let planet: Planet = name.parse().map_err(EphemerisError::Snapshot)?;
            let slot = &mut entries[planet.index()];
            if slot.is_some() {
                return Err(EphemerisError::Snapshot(format!(
                    "duplicate entry for {}",
                    planet
                )));
            }
            *slot = Some(entry.into());
        }

        let mut planets = [PlanetLongitude::new(0.0); 10];
        for planet in Planet::ALL {
            planets[planet.index()] = entries[planet.index()].ok_or_else(|| {
                EphemerisError::Snapshot(format!("missing longitude for {}", planet))
            })?;
        }

        Ok(FixedEphemeris::new(
            PlanetLongitudes::new(planets),
            snapshot.angles,
        ))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EphemerisError> {
        let text = fs::read_to_string(path)?;
        FixedEphemeris::from_json(&text)
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn ensure_ready(&self) -> Result<(), EphemerisError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(EphemerisError::NotInitialized)
        }
    }
}

#[async_trait]
impl EphemerisBackend for FixedEphemeris {
    async fn initialize(&self) -> Result<(), EphemerisError> {
        self.ready.store(true, Ordering::Release);
        Ok(())
    }

    async fn planet_longitudes(
        &self,
        _julian_day: JulianDay,
    ) -> Result<PlanetLongitudes, EphemerisError> {
        self.ensure_ready()?;
        Ok(self.planets)
    }

    async fn angles(
        &self,
        _julian_day: JulianDay,
        _location: Location,
    ) -> Result<ChartAngles, EphemerisError> {
        self.ensure_ready()?;
        Ok(self.angles)
    }
}
