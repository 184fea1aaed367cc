//! JSON envelope for chart consumers.
//!
//! Field names and the stringly-typed retrograde flag follow the horoscope API
//! format the web client was written against, so a chart can replace a remote
//! API response without changes on the rendering side.

use serde::{Deserialize, Serialize};

use crate::{BirthInput, LocalDateTime, Location, NatalChart};

const STATUS_OK: u16 = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizedName {
    pub en: String,
}

impl LocalizedName {
    fn new(name: impl Into<String>) -> Self {
        LocalizedName { en: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignEntry {
    pub number: u8,
    pub name: LocalizedName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanetEntry {
    pub planet: LocalizedName,
    /// Longitude as the backend reported it.
    pub full_degree: f64,
    pub norm_degree: f64,
    /// `"True"` or `"False"`.
    pub is_retro: String,
    #[serde(rename = "zodiac_sign")]
    pub zodiac_sign: SignEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectEntry {
    pub planet_1: LocalizedName,
    pub planet_2: LocalizedName,
    pub aspect: LocalizedName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section<T> {
    pub status_code: u16,
    pub output: Vec<T>,
}

impl<T> Section<T> {
    fn ok(output: Vec<T>) -> Self {
        Section {
            status_code: STATUS_OK,
            output,
        }
    }
}

/// A natal chart shaped for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartResponse {
    pub planets: Section<PlanetEntry>,
    pub aspects: Section<AspectEntry>,
}

impl From<&NatalChart> for ChartResponse {
    fn from(chart: &NatalChart) -> Self {
        let planets = chart
            .positions
            .iter()
            .map(|position| PlanetEntry {
                planet: LocalizedName::new(position.point.point.name()),
                full_degree: position.point.longitude,
                norm_degree: position.placement.degree_in_sign,
                is_retro: if position.point.is_retrograde {
                    "True"
                } else {
                    "False"
                }
                .to_string(),
                zodiac_sign: SignEntry {
                    number: position.placement.sign_index,
                    name: LocalizedName::new(position.placement.sign.name()),
                },
            })
            .collect();

        let aspects = chart
            .aspects
            .iter()
            .map(|aspect| AspectEntry {
                planet_1: LocalizedName::new(aspect.point_a.name()),
                planet_2: LocalizedName::new(aspect.point_b.name()),
                aspect: LocalizedName::new(aspect.kind.name()),
            })
            .collect();

        ChartResponse {
            planets: Section::ok(planets),
            aspects: Section::ok(aspects),
        }
    }
}

impl ChartResponse {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Birth data as submitted by the web form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRequest {
    pub year: i32,
    pub month: i32,
    pub date: i32,
    pub hours: i32,
    pub minutes: i32,
    /// Whole seconds; any fraction is dropped on conversion.
    #[serde(default)]
    pub seconds: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// UTC offset in hours, e.g. 5.5 for IST.
    pub timezone: f64,
}

impl From<ChartRequest> for BirthInput {
    fn from(request: ChartRequest) -> Self {
        BirthInput::new(
            LocalDateTime::new(
                request.year,
                request.month,
                request.date,
                request.hours,
                request.minutes,
                request.seconds.trunc(),
            ),
            request.timezone,
            Location::new(request.latitude, request.longitude),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Aspect, AspectKind, CelestialPoint, ChartPoint, ChartPosition, ZodiacPlacement, ZodiacSign,
    };
    use serde_json::json;

    fn chart() -> NatalChart {
        NatalChart {
            julian_day: 2448057.875,
            positions: vec![
                ChartPosition {
                    point: CelestialPoint::new(ChartPoint::Midheaven, 123.5),
                    placement: ZodiacPlacement {
                        sign: ZodiacSign::Leo,
                        sign_index: 5,
                        degree_in_sign: 3.5,
                    },
                },
                ChartPosition {
                    point: CelestialPoint::new(ChartPoint::Mercury, -10.0).retrograde(true),
                    placement: ZodiacPlacement {
                        sign: ZodiacSign::Pisces,
                        sign_index: 12,
                        degree_in_sign: 20.0,
                    },
                },
            ],
            aspects: vec![Aspect {
                point_a: ChartPoint::Midheaven,
                point_b: ChartPoint::Mercury,
                kind: AspectKind::Trine,
                orb: 6.5,
            }],
        }
    }

    #[test]
    fn test_envelope_shape() {
        let value = serde_json::to_value(ChartResponse::from(&chart())).unwrap();
        assert_eq!(
            value,
            json!({
                "planets": {
                    "statusCode": 200,
                    "output": [
                        {
                            "planet": { "en": "MC" },
                            "fullDegree": 123.5,
                            "normDegree": 3.5,
                            "isRetro": "False",
                            "zodiac_sign": { "number": 5, "name": { "en": "Leo" } }
                        },
                        {
                            "planet": { "en": "Mercury" },
                            "fullDegree": -10.0,
                            "normDegree": 20.0,
                            "isRetro": "True",
                            "zodiac_sign": { "number": 12, "name": { "en": "Pisces" } }
                        }
                    ]
                },
                "aspects": {
                    "statusCode": 200,
                    "output": [
                        {
                            "planet_1": { "en": "MC" },
                            "planet_2": { "en": "Mercury" },
                            "aspect": { "en": "Trine" }
                        }
                    ]
                }
            })
        );
    }

    #[test]
    fn test_request_defaults_seconds() {
        let request: ChartRequest = serde_json::from_value(json!({
            "year": 1990, "month": 6, "date": 15, "hours": 14, "minutes": 30,
            "latitude": 28.6, "longitude": 77.2, "timezone": 5.5
        }))
        .unwrap();
        let input = BirthInput::from(request);
        assert_eq!(input.datetime, LocalDateTime::ymd_hm(1990, 6, 15, 14, 30));
        assert_eq!(input.utc_offset_hours, 5.5);
        assert_eq!(input.location, Location::new(28.6, 77.2));
    }

    #[test]
    fn test_request_drops_fractional_seconds() {
        let request: ChartRequest = serde_json::from_value(json!({
            "year": 1990, "month": 6, "date": 15, "hours": 14, "minutes": 30, "seconds": 30.25,
            "latitude": 28.6, "longitude": 77.2, "timezone": 5.5
        }))
        .unwrap();
        let input = BirthInput::from(request);
        assert_eq!(input.datetime.second, 30.0);
        assert_eq!(
            input.julian_day(),
            BirthInput::new(
                LocalDateTime::new(1990, 6, 15, 14, 30, 30.0),
                5.5,
                Location::new(28.6, 77.2)
            )
            .julian_day()
        );
    }
}
