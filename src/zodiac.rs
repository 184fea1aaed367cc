use crate::{ZodiacPlacement, ZodiacSign};

const SIGN_SPAN: f64 = 30.0;

/// Wraps any longitude into `[0, 360)`, negative inputs included.
pub fn normalize_degrees(degrees: f64) -> f64 {
    ((degrees % 360.0) + 360.0) % 360.0
}

/// Places an ecliptic longitude in the tropical zodiac.
pub fn to_zodiac_placement(longitude: f64) -> ZodiacPlacement {
    let normalized = normalize_degrees(longitude);
    let index = ((normalized / SIGN_SPAN).floor() as usize).min(ZodiacSign::ALL.len() - 1);
    let sign = ZodiacSign::ALL[index];
    ZodiacPlacement {
        sign,
        sign_index: sign.number(),
        degree_in_sign: normalized % SIGN_SPAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_start_of_aries() {
        let placement = to_zodiac_placement(0.0);
        assert_eq!(placement.sign, ZodiacSign::Aries);
        assert_eq!(placement.sign_index, 1);
        assert_eq!(placement.degree_in_sign, 0.0);
    }

    #[test]
    fn test_end_of_pisces() {
        let placement = to_zodiac_placement(359.9);
        assert_eq!(placement.sign, ZodiacSign::Pisces);
        assert_eq!(placement.sign_index, 12);
        assert_abs_diff_eq!(placement.degree_in_sign, 29.9, epsilon = 1e-9);
    }

    #[test]
    fn test_negative_longitude_wraps() {
        assert_eq!(to_zodiac_placement(-10.0), to_zodiac_placement(350.0));
        assert_eq!(to_zodiac_placement(-10.0).sign, ZodiacSign::Pisces);
        assert_eq!(to_zodiac_placement(-360.0), to_zodiac_placement(0.0));
    }

    #[test]
    fn test_longitude_above_full_circle() {
        let placement = to_zodiac_placement(725.0);
        assert_eq!(placement.sign, ZodiacSign::Aries);
        assert_abs_diff_eq!(placement.degree_in_sign, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sign_boundaries() {
        for (i, sign) in ZodiacSign::ALL.iter().enumerate() {
            let placement = to_zodiac_placement(i as f64 * 30.0);
            assert_eq!(placement.sign, *sign);
            assert_eq!(placement.degree_in_sign, 0.0);
        }
        assert_eq!(to_zodiac_placement(29.999).sign, ZodiacSign::Aries);
    }

    #[test]
    fn test_tiny_negative_stays_in_range() {
        let placement = to_zodiac_placement(-1e-20);
        assert!(placement.degree_in_sign >= 0.0 && placement.degree_in_sign < 30.0);
        assert!((1..=12).contains(&placement.sign_index));
    }
}
