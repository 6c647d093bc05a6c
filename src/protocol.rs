use crate::error::SiglentError;
use crate::types::ScpiToken;
use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;

/// Bytes per sample in `:FORM REAL` trace replies
pub const REAL_SAMPLE_SIZE: usize = 8;

/// SCPI command formatting and response parsing
pub struct Protocol;

impl Protocol {
    /// Render a number the way the analyzer expects it: shortest exact
    /// decimal, no forced fraction (`500000000`, `0.00045`)
    pub fn format_number(value: f64) -> String {
        format!("{value}")
    }

    /// `{header} {value}`
    pub fn with_value(header: &str, value: f64) -> String {
        format!("{header} {}", Self::format_number(value))
    }

    /// `{header} {value}{suffix}`, the suffix carries its own spacing
    /// (`" Hz"`, `" DBM"`, `"s"`)
    pub fn with_suffix(header: &str, value: f64, suffix: &str) -> String {
        format!("{header} {}{suffix}", Self::format_number(value))
    }

    /// `{header} {token}`
    pub fn with_token<E: ScpiToken>(header: &str, value: E) -> String {
        format!("{header} {}", value.token())
    }

    /// `{header} ON` / `{header} OFF`
    pub fn with_switch(header: &str, enabled: bool) -> String {
        format!("{header} {}", if enabled { "ON" } else { "OFF" })
    }

    /// Reject values outside `min..=max` before anything is sent
    pub fn ensure_in_range(
        name: &str,
        value: f64,
        min: f64,
        max: f64,
        unit: &str,
    ) -> Result<(), SiglentError> {
        if !value.is_finite() {
            return Err(SiglentError::InvalidArgument(format!(
                "{name} must be a finite number, got {value}"
            )));
        }
        if value < min || value > max {
            return Err(SiglentError::InvalidArgument(format!(
                "{name} must be between {min} and {max} {unit}, got {value}"
            )));
        }
        Ok(())
    }

    pub fn parse_f64(response: &str) -> Result<f64, SiglentError> {
        let token = response.trim();
        token
            .parse::<f64>()
            .map_err(|_| SiglentError::Parse(format!("Expected a number, got {token:?}")))
    }

    /// Integer replies, tolerating an integral value in float notation
    pub fn parse_u32(response: &str) -> Result<u32, SiglentError> {
        let token = response.trim();
        if let Ok(value) = token.parse::<u32>() {
            return Ok(value);
        }
        match token.parse::<f64>() {
            Ok(value) if value.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&value) => {
                Ok(value as u32)
            }
            _ => Err(SiglentError::Parse(format!(
                "Expected an unsigned integer, got {token:?}"
            ))),
        }
    }

    pub fn parse_bool(response: &str) -> Result<bool, SiglentError> {
        let token = response.trim();
        if token == "1" || token.eq_ignore_ascii_case("ON") {
            Ok(true)
        } else if token == "0" || token.eq_ignore_ascii_case("OFF") {
            Ok(false)
        } else {
            Err(SiglentError::Parse(format!("Expected a boolean, got {token:?}")))
        }
    }

    pub fn parse_token<E: ScpiToken>(response: &str) -> Result<E, SiglentError> {
        E::from_token(response)
    }

    /// Parse a comma separated list of floats.
    ///
    /// An empty reply or any non-numeric entry is an error. A single trailing
    /// comma, which the analyzer appends after the last point, is accepted.
    pub fn parse_ascii_trace(response: &str) -> Result<Vec<f64>, SiglentError> {
        let body = response.trim();
        let body = body.strip_suffix(',').unwrap_or(body);
        if body.is_empty() {
            return Err(SiglentError::Parse("Empty trace response".to_string()));
        }

        body.split(',')
            .enumerate()
            .map(|(i, entry)| {
                let entry = entry.trim();
                entry.parse::<f64>().map_err(|_| {
                    SiglentError::Parse(format!("Trace point {i} is not a number: {entry:?}"))
                })
            })
            .collect()
    }

    /// Decode a `:FORM REAL` trace: `points` little-endian f64 values with no
    /// block header, optionally followed by a single newline terminator
    pub fn parse_binary_trace(bytes: &[u8], points: usize) -> Result<Vec<f64>, SiglentError> {
        let expected = points * REAL_SAMPLE_SIZE;
        let payload = match bytes.len() {
            n if n == expected => bytes,
            n if n == expected + 1 && bytes[expected] == b'\n' => &bytes[..expected],
            n => {
                return Err(SiglentError::Parse(format!(
                    "Binary trace must be {expected} bytes ({points} points), got {n}"
                )));
            }
        };
        debug!("Decoding {} binary trace points", points);

        let mut cursor = std::io::Cursor::new(payload);
        let mut samples = Vec::with_capacity(points);
        for _ in 0..points {
            samples.push(cursor.read_f64::<LittleEndian>()?);
        }
        Ok(samples)
    }

    /// Split an `*IDN?` reply into its four fields
    pub fn parse_identity(response: &str) -> Result<crate::types::Identity, SiglentError> {
        let fields: Vec<&str> = response.trim().split(',').map(str::trim).collect();
        match fields.as_slice() {
            [manufacturer, model, serial_number, firmware] => Ok(crate::types::Identity {
                manufacturer: manufacturer.to_string(),
                model: model.to_string(),
                serial_number: serial_number.to_string(),
                firmware: firmware.to_string(),
            }),
            _ => Err(SiglentError::Parse(format!(
                "Identification must have 4 fields, got {}: {response:?}",
                fields.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Bandwidth, DetectionMode};
    use byteorder::WriteBytesExt;

    #[test]
    fn test_number_formatting() {
        assert_eq!(Protocol::format_number(500000000.0), "500000000");
        assert_eq!(Protocol::format_number(3.2e9), "3200000000");
        assert_eq!(Protocol::format_number(450e-6), "0.00045");
        assert_eq!(Protocol::format_number(-12.5), "-12.5");
    }

    #[test]
    fn test_command_builders() {
        assert_eq!(
            Protocol::with_suffix(":FREQ:SPAN", 500000000.0, " Hz"),
            ":FREQ:SPAN 500000000 Hz"
        );
        assert_eq!(Protocol::with_suffix(":SWE:TIME", 0.5, "s"), ":SWE:TIME 0.5s");
        assert_eq!(Protocol::with_value(":POW:ATT", 20.0), ":POW:ATT 20");
        assert_eq!(Protocol::with_token(":BWID", Bandwidth::KHz100), ":BWID 100000");
        assert_eq!(
            Protocol::with_token(":DET:TRAC1", DetectionMode::Quasi),
            ":DET:TRAC1 QUAS"
        );
        assert_eq!(Protocol::with_switch(":POW:GAIN", true), ":POW:GAIN ON");
        assert_eq!(Protocol::with_switch(":POW:GAIN", false), ":POW:GAIN OFF");
    }

    #[test]
    fn test_range_check() {
        assert!(Protocol::ensure_in_range("Attenuation", 51.0, 0.0, 51.0, "dB").is_ok());
        assert!(matches!(
            Protocol::ensure_in_range("Attenuation", 52.0, 0.0, 51.0, "dB"),
            Err(SiglentError::InvalidArgument(_))
        ));
        assert!(Protocol::ensure_in_range("Span", f64::NAN, 0.0, 1.0, "Hz").is_err());
    }

    #[test]
    fn test_scalar_parsing() {
        assert_eq!(Protocol::parse_f64("1.500000e+09\n").unwrap(), 1.5e9);
        assert!(matches!(Protocol::parse_f64(""), Err(SiglentError::Parse(_))));
        assert_eq!(Protocol::parse_u32("100\n").unwrap(), 100);
        assert_eq!(Protocol::parse_u32("1.000000e+02").unwrap(), 100);
        assert!(Protocol::parse_u32("1.5").is_err());
        assert!(Protocol::parse_u32("-3").is_err());
    }

    #[test]
    fn test_bool_parsing() {
        assert!(Protocol::parse_bool("1\n").unwrap());
        assert!(Protocol::parse_bool("on").unwrap());
        assert!(!Protocol::parse_bool("0").unwrap());
        assert!(!Protocol::parse_bool("OFF").unwrap());
        assert!(Protocol::parse_bool("2").is_err());
    }

    #[test]
    fn test_ascii_trace() {
        assert_eq!(
            Protocol::parse_ascii_trace("1.0,2.0,3.0").unwrap(),
            vec![1.0, 2.0, 3.0]
        );
        assert_eq!(
            Protocol::parse_ascii_trace("-71.25, -70.5,-69.0,\n").unwrap(),
            vec![-71.25, -70.5, -69.0]
        );
    }

    #[test]
    fn test_ascii_trace_rejects_garbage() {
        assert!(matches!(
            Protocol::parse_ascii_trace(""),
            Err(SiglentError::Parse(_))
        ));
        assert!(matches!(
            Protocol::parse_ascii_trace("\r\n"),
            Err(SiglentError::Parse(_))
        ));
        assert!(matches!(
            Protocol::parse_ascii_trace("1.0,abc,3.0"),
            Err(SiglentError::Parse(_))
        ));
        assert!(matches!(
            Protocol::parse_ascii_trace("1.0,,3.0"),
            Err(SiglentError::Parse(_))
        ));
    }

    #[test]
    fn test_binary_trace() {
        let mut bytes = Vec::new();
        for value in [-80.0f64, -42.5, 0.125] {
            bytes.write_f64::<LittleEndian>(value).unwrap();
        }
        assert_eq!(
            Protocol::parse_binary_trace(&bytes, 3).unwrap(),
            vec![-80.0, -42.5, 0.125]
        );

        bytes.push(b'\n');
        assert_eq!(Protocol::parse_binary_trace(&bytes, 3).unwrap().len(), 3);

        assert!(matches!(
            Protocol::parse_binary_trace(&bytes[..20], 3),
            Err(SiglentError::Parse(_))
        ));
    }

    #[test]
    fn test_identity() {
        let identity = Protocol::parse_identity(
            "Siglent Technologies,SSA3032X Plus,SSA3PCEX1R0123,3.2.2.5.1R1\n",
        )
        .unwrap();
        assert_eq!(identity.manufacturer, "Siglent Technologies");
        assert_eq!(identity.model, "SSA3032X Plus");
        assert_eq!(identity.serial_number, "SSA3PCEX1R0123");
        assert_eq!(identity.firmware, "3.2.2.5.1R1");

        assert!(Protocol::parse_identity("just a string").is_err());
    }
}
