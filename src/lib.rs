//! Control Siglent SSA3000X / SVA1000X spectrum analyzers over SCPI.
//!
//! ```no_run
//! use siglent_sa::{Bandwidth, SpectrumAnalyzer};
//!
//! let mut analyzer = SpectrumAnalyzer::connect("TCPIP0::192.168.1.50::INSTR")?;
//! analyzer.set_center_frequency(2.44e9)?;
//! analyzer.set_span(100e6)?;
//! analyzer.set_rbw(Bandwidth::KHz100)?;
//!
//! let trace = analyzer.trace(1)?.data()?;
//! println!("{} points, peak {:?}", trace.len(), trace.peak());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod analyzer;
pub mod config;
pub mod error;
pub mod instrument;
pub mod plotting;
pub mod power_supply;
pub mod protocol;
pub mod recorder;
pub mod transport;
pub mod types;

pub use analyzer::{
    AnalyzerStatus, Marker, SpectrumAnalyzer, SpectrumAnalyzerBuilder, TraceHandle,
    NUM_DATA_POINTS,
};
pub use config::{load_config, load_config_or_default, AnalyzerSettings, AppConfig};
pub use error::SiglentError;
pub use instrument::MessageInstrument;
pub use plotting::plot_trace;
pub use power_supply::Spd3303x;
pub use recorder::Recorder;
pub use transport::{
    ConnectionConfig, MockTransport, ResourceAddress, TcpTransport, Transport,
};
#[cfg(feature = "visa")]
pub use transport::VisaTransport;
pub use types::{
    AverageType, Bandwidth, Channel, DetectionMode, Identity, MarkerIndex, MarkerMode,
    ScpiToken, Trace, TraceFormat, TraceIndex, TraceMode,
};
