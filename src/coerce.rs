// Value coercion for monitoring readings
// Monitoring endpoints report every value as text with an optional unit
// suffix ("120 bps"); this module turns those readings into integers
//
// Statistics values are already integers in the JSON and never pass
// through here.

use crate::errors::ExporterError;

/// Integer count or level published as a gauge.
pub type MetricValue = i64;

/// Parse the numeric token in front of the first whitespace and truncate
/// it toward zero.
pub fn coerce_reading(raw: &str) -> Result<MetricValue, ExporterError> {
    let token = raw.split_whitespace().next().ok_or_else(|| ExporterError::Coerce {
        value: raw.to_string(),
        reason: "empty reading".to_string(),
    })?;

    let parsed: f64 = token.parse().map_err(|e| ExporterError::Coerce {
        value: raw.to_string(),
        reason: format!("{e}"),
    })?;

    if !parsed.is_finite() {
        return Err(ExporterError::Coerce {
            value: raw.to_string(),
            reason: "not a finite number".to_string(),
        });
    }

    // `as` truncates toward zero and saturates at the i64 bounds
    Ok(parsed.trunc() as MetricValue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_unit_suffix() {
        assert_eq!(coerce_reading("120 bps").unwrap(), 120);
        assert_eq!(coerce_reading("42").unwrap(), 42);
    }

    #[test]
    fn truncates_instead_of_rounding() {
        assert_eq!(coerce_reading("3.9 Mbps").unwrap(), 3);
        assert_eq!(coerce_reading("-2.7 dB").unwrap(), -2);
        assert_eq!(coerce_reading("0.99").unwrap(), 0);
    }

    #[test]
    fn tolerates_leading_whitespace() {
        assert_eq!(coerce_reading("  17\tpps").unwrap(), 17);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            coerce_reading("abc"),
            Err(ExporterError::Coerce { .. })
        ));
        assert!(matches!(
            coerce_reading("bps 120"),
            Err(ExporterError::Coerce { .. })
        ));
    }

    #[test]
    fn rejects_blank_and_non_finite() {
        assert!(coerce_reading("").is_err());
        assert!(coerce_reading("   ").is_err());
        assert!(coerce_reading("NaN").is_err());
        assert!(coerce_reading("inf bps").is_err());
    }
}
