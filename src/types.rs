use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SiglentError;

/// Enumerated settings that travel over the wire as a fixed SCPI mnemonic.
pub trait ScpiToken: Sized + Copy + 'static {
    /// Human readable name used in error messages
    const NAME: &'static str;
    /// Every legal member, in declaration order
    const ALL: &'static [Self];

    /// The mnemonic sent to (and returned by) the instrument
    fn token(&self) -> &'static str;

    /// Look up the member matching a mnemonic, ignoring case and whitespace
    fn from_token(token: &str) -> Result<Self, SiglentError> {
        let token = token.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|member| member.token().eq_ignore_ascii_case(token))
            .ok_or_else(|| SiglentError::Parse(format!("Unknown {} token: {token:?}", Self::NAME)))
    }
}

/// Discrete resolution/video bandwidth values supported by the SSA3000X series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bandwidth {
    Hz1,
    Hz3,
    Hz10,
    Hz30,
    Hz100,
    Hz300,
    KHz1,
    KHz3,
    KHz10,
    KHz30,
    KHz100,
    KHz300,
    MHz1,
}

impl Bandwidth {
    /// Bandwidth in Hz
    pub fn hz(&self) -> f64 {
        match self {
            Bandwidth::Hz1 => 1.0,
            Bandwidth::Hz3 => 3.0,
            Bandwidth::Hz10 => 10.0,
            Bandwidth::Hz30 => 30.0,
            Bandwidth::Hz100 => 100.0,
            Bandwidth::Hz300 => 300.0,
            Bandwidth::KHz1 => 1e3,
            Bandwidth::KHz3 => 3e3,
            Bandwidth::KHz10 => 10e3,
            Bandwidth::KHz30 => 30e3,
            Bandwidth::KHz100 => 100e3,
            Bandwidth::KHz300 => 300e3,
            Bandwidth::MHz1 => 1e6,
        }
    }

    /// Find the member for a numeric bandwidth in Hz.
    ///
    /// The value must match one of the discrete steps (within a relative
    /// tolerance of 1e-6, enough to absorb exponent formatting such as
    /// `3.000000e+04`). Arbitrary frequencies are rejected, not rounded.
    ///
    /// # Examples
    /// ```
    /// use siglent_sa::Bandwidth;
    ///
    /// assert_eq!(Bandwidth::from_hz(100e3)?, Bandwidth::KHz100);
    /// assert!(Bandwidth::from_hz(42.0).is_err());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_hz(hz: f64) -> Result<Self, SiglentError> {
        Self::ALL
            .iter()
            .copied()
            .find(|bw| ((bw.hz() - hz) / bw.hz()).abs() < 1e-6)
            .ok_or_else(|| {
                SiglentError::InvalidArgument(format!("{hz} Hz is not a supported bandwidth"))
            })
    }
}

impl ScpiToken for Bandwidth {
    const NAME: &'static str = "bandwidth";
    const ALL: &'static [Self] = &[
        Bandwidth::Hz1,
        Bandwidth::Hz3,
        Bandwidth::Hz10,
        Bandwidth::Hz30,
        Bandwidth::Hz100,
        Bandwidth::Hz300,
        Bandwidth::KHz1,
        Bandwidth::KHz3,
        Bandwidth::KHz10,
        Bandwidth::KHz30,
        Bandwidth::KHz100,
        Bandwidth::KHz300,
        Bandwidth::MHz1,
    ];

    fn token(&self) -> &'static str {
        match self {
            Bandwidth::Hz1 => "1",
            Bandwidth::Hz3 => "3",
            Bandwidth::Hz10 => "10",
            Bandwidth::Hz30 => "30",
            Bandwidth::Hz100 => "100",
            Bandwidth::Hz300 => "300",
            Bandwidth::KHz1 => "1000",
            Bandwidth::KHz3 => "3000",
            Bandwidth::KHz10 => "10000",
            Bandwidth::KHz30 => "30000",
            Bandwidth::KHz100 => "100000",
            Bandwidth::KHz300 => "300000",
            Bandwidth::MHz1 => "1000000",
        }
    }

    // The analyzer answers bandwidth queries with a plain number, not a mnemonic
    fn from_token(token: &str) -> Result<Self, SiglentError> {
        let hz: f64 = token.trim().parse().map_err(|_| {
            SiglentError::Parse(format!("Expected a bandwidth in Hz, got {token:?}"))
        })?;
        Self::from_hz(hz).map_err(|_| SiglentError::Parse(format!("Unknown bandwidth: {hz} Hz")))
    }
}

impl TryFrom<f64> for Bandwidth {
    type Error = SiglentError;

    fn try_from(hz: f64) -> Result<Self, Self::Error> {
        Bandwidth::from_hz(hz)
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hz = self.hz();
        if hz >= 1e6 {
            write!(f, "{} MHz", hz / 1e6)
        } else if hz >= 1e3 {
            write!(f, "{} kHz", hz / 1e3)
        } else {
            write!(f, "{hz} Hz")
        }
    }
}

/// Trace averaging type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AverageType {
    LogPower,
    Power,
    Voltage,
}

impl ScpiToken for AverageType {
    const NAME: &'static str = "average type";
    const ALL: &'static [Self] = &[AverageType::LogPower, AverageType::Power, AverageType::Voltage];

    fn token(&self) -> &'static str {
        match self {
            AverageType::LogPower => "LOGP",
            AverageType::Power => "POW",
            AverageType::Voltage => "VOLT",
        }
    }
}

/// Trace display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceMode {
    /// Continuously update
    Write,
    /// Keep the maximum of each point
    MaxHold,
    /// Keep the minimum of each point
    MinHold,
    /// Freeze the last recorded sweep
    View,
    /// Trace averaging
    Average,
}

impl ScpiToken for TraceMode {
    const NAME: &'static str = "trace mode";
    const ALL: &'static [Self] = &[
        TraceMode::Write,
        TraceMode::MaxHold,
        TraceMode::MinHold,
        TraceMode::View,
        TraceMode::Average,
    ];

    fn token(&self) -> &'static str {
        match self {
            TraceMode::Write => "WRIT",
            TraceMode::MaxHold => "MAXH",
            TraceMode::MinHold => "MINH",
            TraceMode::View => "VIEW",
            TraceMode::Average => "AVER",
        }
    }
}

/// Trace detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionMode {
    /// Lowest sample in each display bucket
    Negative,
    /// Highest sample in each display bucket
    Positive,
    /// Instantaneous sample at the display point, meant for noise-like signals
    Sample,
    /// Average over each bucket
    Average,
    /// Alternates between max and min video values
    Normal,
    /// Quasi-peak, weighted by repetition rate
    Quasi,
}

impl ScpiToken for DetectionMode {
    const NAME: &'static str = "detection mode";
    const ALL: &'static [Self] = &[
        DetectionMode::Negative,
        DetectionMode::Positive,
        DetectionMode::Sample,
        DetectionMode::Average,
        DetectionMode::Normal,
        DetectionMode::Quasi,
    ];

    fn token(&self) -> &'static str {
        match self {
            DetectionMode::Negative => "NEG",
            DetectionMode::Positive => "POS",
            DetectionMode::Sample => "SAMP",
            DetectionMode::Average => "AVER",
            DetectionMode::Normal => "NORMAL",
            DetectionMode::Quasi => "QUAS",
        }
    }
}

/// Marker function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerMode {
    /// Normal marker positioned on a trace
    Position,
    /// Pair of markers, one fixed at the current location
    Delta,
    /// Marker frozen at its current position
    Fixed,
    Off,
}

impl ScpiToken for MarkerMode {
    const NAME: &'static str = "marker mode";
    const ALL: &'static [Self] = &[
        MarkerMode::Position,
        MarkerMode::Delta,
        MarkerMode::Fixed,
        MarkerMode::Off,
    ];

    fn token(&self) -> &'static str {
        match self {
            MarkerMode::Position => "POS",
            MarkerMode::Delta => "DELT",
            MarkerMode::Fixed => "FIX",
            MarkerMode::Off => "OFF",
        }
    }
}

/// Encoding used by the analyzer for `:TRAC:DATA?` replies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceFormat {
    /// Comma separated ASCII floats
    #[default]
    Ascii,
    /// Raw little-endian f64, no block header
    Real,
}

impl TraceFormat {
    pub fn command(&self) -> &'static str {
        match self {
            TraceFormat::Ascii => ":FORM ASCii",
            TraceFormat::Real => ":FORM REAL",
        }
    }
}

/// Analyzer trace number (1-4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceIndex(u8);

impl TraceIndex {
    pub fn new(index: u8) -> Result<Self, SiglentError> {
        if (1..=4).contains(&index) {
            Ok(TraceIndex(index))
        } else {
            Err(SiglentError::InvalidArgument(format!(
                "Trace index must be 1-4, got {index}"
            )))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for TraceIndex {
    type Error = SiglentError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        TraceIndex::new(index)
    }
}

impl fmt::Display for TraceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Analyzer marker number (1-8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerIndex(u8);

impl MarkerIndex {
    pub fn new(index: u8) -> Result<Self, SiglentError> {
        if (1..=8).contains(&index) {
            Ok(MarkerIndex(index))
        } else {
            Err(SiglentError::InvalidArgument(format!(
                "Marker index must be 1-8, got {index}"
            )))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for MarkerIndex {
    type Error = SiglentError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        MarkerIndex::new(index)
    }
}

impl fmt::Display for MarkerIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Power supply output channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    Ch1,
    Ch2,
}

impl Channel {
    pub fn number(&self) -> u8 {
        match self {
            Channel::Ch1 => 1,
            Channel::Ch2 => 2,
        }
    }
}

impl TryFrom<u8> for Channel {
    type Error = SiglentError;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        match number {
            1 => Ok(Channel::Ch1),
            2 => Ok(Channel::Ch2),
            _ => Err(SiglentError::InvalidArgument(format!(
                "Channel must be either 1 or 2, got {number}"
            ))),
        }
    }
}

/// Parsed `*IDN?` reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    pub firmware: String,
}

/// One captured sweep.
///
/// Samples are in whatever amplitude unit the analyzer is configured for,
/// one per display point, ordered from start to stop frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub index: TraceIndex,
    pub captured_at: DateTime<Utc>,
    pub samples: Vec<f64>,
}

impl Trace {
    pub fn new(index: TraceIndex, samples: Vec<f64>) -> Self {
        Self {
            index,
            captured_at: Utc::now(),
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Position and value of the largest sample
    pub fn peak(&self) -> Option<(usize, f64)> {
        self.samples
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best, (i, value)| match best {
                Some((_, best_value)) if best_value >= value => best,
                _ => Some((i, value)),
            })
    }

    /// Frequency of every bin, assuming points are spread linearly from
    /// `start_hz` to `stop_hz` inclusive
    pub fn frequency_axis(&self, start_hz: f64, stop_hz: f64) -> Vec<f64> {
        match self.samples.len() {
            0 => Vec::new(),
            1 => vec![start_hz],
            n => {
                let step = (stop_hz - start_hz) / (n - 1) as f64;
                (0..n).map(|i| start_hz + step * i as f64).collect()
            }
        }
    }
}
