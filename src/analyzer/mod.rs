use crate::config::AnalyzerSettings;
use crate::error::SiglentError;
use crate::instrument::MessageInstrument;
use crate::protocol::Protocol;
use crate::transport::{self, ConnectionConfig, Transport};
use crate::types::{Bandwidth, TraceFormat};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod amplitude;
pub mod bandwidth;
pub mod frequency;
pub mod marker;
pub mod sweep;
pub mod trace;

pub use marker::Marker;
pub use trace::TraceHandle;

/// Display points per sweep, fixed for the whole SSA3000X family
pub const NUM_DATA_POINTS: usize = 751;

pub const MAX_FREQUENCY_HZ: f64 = 3.2e9;
pub const MIN_SPAN_HZ: f64 = 100.0;
pub const MAX_ATTENUATION_DB: f64 = 51.0;
pub const REF_LEVEL_RANGE_DBM: (f64, f64) = (-100.0, 30.0);
pub const SWEEP_TIME_RANGE_S: (f64, f64) = (450e-6, 1.5e3);
pub const MAX_TRACE_AVERAGES: u32 = 999;

pub(crate) fn check_frequency(name: &str, hz: f64) -> Result<(), SiglentError> {
    Protocol::ensure_in_range(name, hz, 0.0, MAX_FREQUENCY_HZ, "Hz")
}

// Zero span is legal and switches the analyzer to time domain
pub(crate) fn check_span(hz: f64) -> Result<(), SiglentError> {
    if hz == 0.0 {
        return Ok(());
    }
    Protocol::ensure_in_range("Span", hz, MIN_SPAN_HZ, MAX_FREQUENCY_HZ, "Hz").map_err(|_| {
        SiglentError::InvalidArgument(format!(
            "Span must be between {MIN_SPAN_HZ} Hz and {MAX_FREQUENCY_HZ} Hz or 0, got {hz}"
        ))
    })
}

pub(crate) fn check_attenuation(db: f64) -> Result<(), SiglentError> {
    Protocol::ensure_in_range("Attenuation", db, 0.0, MAX_ATTENUATION_DB, "dB")
}

pub(crate) fn check_ref_level(dbm: f64) -> Result<(), SiglentError> {
    let (min, max) = REF_LEVEL_RANGE_DBM;
    Protocol::ensure_in_range("Reference level", dbm, min, max, "dBm")
}

pub(crate) fn check_sweep_time(seconds: f64) -> Result<(), SiglentError> {
    let (min, max) = SWEEP_TIME_RANGE_S;
    Protocol::ensure_in_range("Sweep time", seconds, min, max, "s")
}

/// Builder for [`SpectrumAnalyzer`] sessions opened from an address.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use siglent_sa::SpectrumAnalyzer;
///
/// let analyzer = SpectrumAnalyzer::builder()
///     .address("TCPIP0::192.168.1.50::INSTR")
///     .read_timeout(Duration::from_secs(30))
///     .verify_identity(true)
///     .build()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Default)]
pub struct SpectrumAnalyzerBuilder {
    address: Option<String>,
    config: ConnectionConfig,
    verify_identity: bool,
}

impl SpectrumAnalyzerBuilder {
    pub fn address(mut self, address: &str) -> Self {
        self.address = Some(address.to_string());
        self
    }

    /// Set the full connection configuration
    pub fn config(mut self, config: ConnectionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_timeout = timeout;
        self
    }

    /// Refuse to talk to anything that does not identify as an SSA/SVA analyzer
    pub fn verify_identity(mut self, verify: bool) -> Self {
        self.verify_identity = verify;
        self
    }

    pub fn build(self) -> Result<SpectrumAnalyzer, SiglentError> {
        let address = self
            .address
            .ok_or_else(|| SiglentError::InvalidAddress("Address must be specified".to_string()))?;

        let transport = transport::open(&address, &self.config)?;
        let mut analyzer = SpectrumAnalyzer::new(transport);

        if self.verify_identity {
            let identity = analyzer.identity()?;
            if !is_supported_model(&identity.model) {
                return Err(SiglentError::Protocol(format!(
                    "{address} is a {} {}, not a supported spectrum analyzer",
                    identity.manufacturer, identity.model
                )));
            }
            info!("Connected to {} {} ({})", identity.manufacturer, identity.model, identity.firmware);
        } else {
            info!("Connected to {address}");
        }

        Ok(analyzer)
    }
}

fn is_supported_model(model: &str) -> bool {
    let model = model.to_ascii_uppercase();
    model.starts_with("SSA3") || model.starts_with("SVA1")
}

/// Controller for a Siglent SSA3000X / SSA3000X-R / SVA1000X spectrum analyzer.
///
/// Every method is one synchronous SCPI exchange. Nothing is cached: getters
/// always query the instrument, setters validate their argument and write.
/// Settings are grouped by subsystem across the `analyzer::*` modules.
///
/// # Examples
///
/// ```no_run
/// use siglent_sa::{Bandwidth, SpectrumAnalyzer};
///
/// let mut analyzer = SpectrumAnalyzer::connect("TCPIP0::192.168.1.50::INSTR")?;
///
/// analyzer.set_center_frequency(1.0e9)?;
/// analyzer.set_span(20e6)?;
/// analyzer.set_rbw(Bandwidth::KHz100)?;
/// analyzer.set_preamp(true)?;
///
/// let trace = analyzer.trace(1)?.data()?;
/// println!("{} points, peak {:?}", trace.len(), trace.peak());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct SpectrumAnalyzer<T: Transport = Box<dyn Transport>> {
    transport: T,
    trace_format: TraceFormat,
    format_synced: bool,
}

impl SpectrumAnalyzer {
    /// Open an analyzer with default timeouts
    pub fn connect(address: &str) -> Result<Self, SiglentError> {
        Self::builder().address(address).build()
    }

    pub fn builder() -> SpectrumAnalyzerBuilder {
        SpectrumAnalyzerBuilder::default()
    }
}

impl<T: Transport> SpectrumAnalyzer<T> {
    /// Wrap an already open session
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            trace_format: TraceFormat::default(),
            format_synced: false,
        }
    }

    /// Hand the session back to the caller
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Apply every setting present in `settings`.
    ///
    /// All values are checked first, so an invalid entry leaves the
    /// instrument untouched.
    pub fn apply_settings(&mut self, settings: &AnalyzerSettings) -> Result<(), SiglentError> {
        settings.validate()?;
        debug!("Applying {settings:?}");

        if let Some(enabled) = settings.preamp {
            self.set_preamp(enabled)?;
        }
        if let Some(db) = settings.attenuation_db {
            self.set_attenuation(db)?;
        }
        if let Some(dbm) = settings.ref_level_dbm {
            self.set_ref_level(dbm)?;
        }
        if let Some(hz) = settings.center_hz {
            self.set_center_frequency(hz)?;
        }
        if let Some(hz) = settings.span_hz {
            self.set_span(hz)?;
        }
        if let Some(hz) = settings.rbw_hz {
            self.set_rbw(Bandwidth::from_hz(hz)?)?;
        }
        if let Some(hz) = settings.vbw_hz {
            self.set_vbw(Bandwidth::from_hz(hz)?)?;
        }
        if let Some(seconds) = settings.sweep_time_s {
            self.set_sweep_time(seconds)?;
        }
        Ok(())
    }

    /// Read back the main acquisition settings in one go
    pub fn status(&mut self) -> Result<AnalyzerStatus, SiglentError> {
        Ok(AnalyzerStatus {
            center_hz: self.get_center_frequency()?,
            span_hz: self.get_span()?,
            start_hz: self.get_start_frequency()?,
            stop_hz: self.get_stop_frequency()?,
            rbw: self.get_rbw()?,
            vbw: self.get_vbw()?,
            attenuation_db: self.get_attenuation()?,
            preamp: self.get_preamp()?,
            ref_level_dbm: self.get_ref_level()?,
            sweep_time_s: self.get_sweep_time()?,
        })
    }
}

impl<T: Transport> MessageInstrument for SpectrumAnalyzer<T> {
    type Transport = T;

    fn transport(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Preset the analyzer. `*RST` also returns trace transfers to ASCII,
    /// so the requested format is sent again before the next trace.
    fn reset(&mut self) -> Result<(), SiglentError> {
        self.send("*RST")?;
        self.format_synced = false;
        Ok(())
    }
}

/// Snapshot of the acquisition settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerStatus {
    pub center_hz: f64,
    pub span_hz: f64,
    pub start_hz: f64,
    pub stop_hz: f64,
    pub rbw: Bandwidth,
    pub vbw: Bandwidth,
    pub attenuation_db: f64,
    pub preamp: bool,
    pub ref_level_dbm: f64,
    pub sweep_time_s: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    #[test]
    fn test_supported_models() {
        assert!(is_supported_model("SSA3032X Plus"));
        assert!(is_supported_model("SVA1015X"));
        assert!(!is_supported_model("SDS1202X-E"));
    }

    #[test]
    fn test_builder_requires_address() {
        assert!(matches!(
            SpectrumAnalyzer::builder().build(),
            Err(SiglentError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_apply_settings_order() {
        let settings = AnalyzerSettings {
            center_hz: Some(1e9),
            span_hz: Some(500000000.0),
            rbw_hz: Some(100e3),
            vbw_hz: Some(30e3),
            attenuation_db: Some(10.0),
            preamp: Some(false),
            ref_level_dbm: Some(-20.0),
            sweep_time_s: None,
        };
        let mut analyzer = SpectrumAnalyzer::new(MockTransport::new());
        analyzer.apply_settings(&settings).unwrap();

        assert_eq!(
            analyzer.into_transport().sent(),
            [
                ":POW:GAIN OFF",
                ":POW:ATT 10",
                ":DISP:WIND:TRAC:Y:RLEV -20 DBM",
                ":FREQ:CENT 1000000000 Hz",
                ":FREQ:SPAN 500000000 Hz",
                ":BWID 100000",
                ":BWID:VID 30000",
            ]
        );
    }

    #[test]
    fn test_invalid_settings_send_nothing() {
        let settings = AnalyzerSettings {
            span_hz: Some(1e6),
            rbw_hz: Some(42.0),
            ..AnalyzerSettings::default()
        };
        let mut analyzer = SpectrumAnalyzer::new(MockTransport::new());
        assert!(matches!(
            analyzer.apply_settings(&settings),
            Err(SiglentError::InvalidArgument(_))
        ));
        assert!(analyzer.into_transport().sent().is_empty());
    }

    #[test]
    fn test_status() {
        let mock = MockTransport::new()
            .with_reply("1.000000e+09")
            .with_reply("2.000000e+07")
            .with_reply("9.900000e+08")
            .with_reply("1.010000e+09")
            .with_reply("100000")
            .with_reply("30000")
            .with_reply("20")
            .with_reply("0")
            .with_reply("-10")
            .with_reply("0.1");
        let mut analyzer = SpectrumAnalyzer::new(mock);
        let status = analyzer.status().unwrap();

        assert_eq!(status.center_hz, 1e9);
        assert_eq!(status.span_hz, 2e7);
        assert_eq!(status.rbw, Bandwidth::KHz100);
        assert_eq!(status.vbw, Bandwidth::KHz30);
        assert!(!status.preamp);
        assert_eq!(status.ref_level_dbm, -10.0);
        assert_eq!(status.sweep_time_s, 0.1);
    }
}
