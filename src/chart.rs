use tracing::{debug, instrument};

use crate::aspects::find_aspect;
use crate::ephemeris::{ChartAngles, EphemerisBackend, PlanetLongitude, PlanetLongitudes};
use crate::zodiac::to_zodiac_placement;
use crate::{
    Aspect, AstrologyError, BirthInput, CelestialPoint, ChartPoint, ChartPosition, NatalChart,
    CHART_POINTS,
};

/// Casts a natal chart for `input` using positions from `backend`.
///
/// The backend is initialized first, then planets and angles are requested
/// concurrently. Any backend failure aborts the whole computation; no partial
/// chart is returned.
#[instrument(skip(backend), err)]
pub async fn compute_natal_chart<B>(
    backend: &B,
    input: &BirthInput,
) -> Result<NatalChart, AstrologyError>
where
    B: EphemerisBackend + ?Sized,
{
    let julian_day = input.julian_day();
    debug!(julian_day, "converted birth time");

    backend.initialize().await?;

    let (planets, angles) = tokio::try_join!(
        backend.planet_longitudes(julian_day),
        backend.angles(julian_day, input.location),
    )?;
    debug!(?angles, "ephemeris answered");

    let points = chart_points(&planets, &angles);
    let aspects = detect_aspects(&points);
    debug!(aspects = aspects.len(), "aspects detected");

    let positions = points
        .iter()
        .map(|&point| ChartPosition {
            point,
            placement: to_zodiac_placement(point.longitude),
        })
        .collect();

    Ok(NatalChart {
        julian_day,
        positions,
        aspects,
    })
}

/// Lays out raw backend positions in [`CHART_POINTS`] order.
pub fn chart_points(planets: &PlanetLongitudes, angles: &ChartAngles) -> [CelestialPoint; 14] {
    CHART_POINTS.map(|point| {
        let raw = match point.planet() {
            Some(planet) => planets.get(planet),
            None => PlanetLongitude::new(match point {
                ChartPoint::Ascendant => angles.ascendant,
                ChartPoint::Descendant => angles.descendant,
                ChartPoint::Midheaven => angles.midheaven,
                _ => angles.imum_coeli,
            }),
        };
        CelestialPoint::new(point, raw.longitude).retrograde(raw.retrograde)
    })
}

/// Checks every unordered pair once, earlier point first, and keeps the pairs
/// that form an aspect.
pub fn detect_aspects(points: &[CelestialPoint]) -> Vec<Aspect> {
    points
        .iter()
        .enumerate()
        .flat_map(|(i, a)| {
            points[i + 1..].iter().filter_map(move |b| {
                find_aspect(a.longitude, b.longitude).map(|found| Aspect {
                    point_a: a.point,
                    point_b: b.point,
                    kind: found.kind,
                    orb: found.orb,
                })
            })
        })
        .collect()
}
