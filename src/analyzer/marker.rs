use super::SpectrumAnalyzer;
use crate::error::SiglentError;
use crate::instrument::MessageInstrument;
use crate::protocol::Protocol;
use crate::transport::Transport;
use crate::types::{MarkerIndex, MarkerMode, TraceIndex};

impl<T: Transport> SpectrumAnalyzer<T> {
    /// Turn every marker off
    pub fn clear_markers(&mut self) -> Result<(), SiglentError> {
        self.send(":CALC:MARK:AOFF")
    }

    /// Access one of the eight markers.
    ///
    /// # Examples
    /// ```no_run
    /// use siglent_sa::SpectrumAnalyzer;
    ///
    /// let mut analyzer = SpectrumAnalyzer::connect("192.168.1.50")?;
    ///
    /// let mut marker = analyzer.marker(1)?;
    /// marker.set_enabled(true)?;
    /// marker.peak()?;
    /// println!("{:.0} Hz: {:.2} dBm", marker.get_x()?, marker.get_y()?);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn marker(&mut self, index: u8) -> Result<Marker<'_, T>, SiglentError> {
        let index = MarkerIndex::new(index)?;
        Ok(Marker {
            analyzer: self,
            index,
        })
    }
}

/// One of the analyzer's eight markers, borrowed from the [`SpectrumAnalyzer`].
pub struct Marker<'a, T: Transport> {
    analyzer: &'a mut SpectrumAnalyzer<T>,
    index: MarkerIndex,
}

impl<T: Transport> Marker<'_, T> {
    pub fn index(&self) -> MarkerIndex {
        self.index
    }

    /// Whether the marker is shown.
    ///
    /// # Errors
    /// Returns `SiglentError::Parse` unless the reply is `1`, `0`, `ON` or `OFF`.
    pub fn is_enabled(&mut self) -> Result<bool, SiglentError> {
        let n = self.index;
        self.analyzer.ask_bool(&format!(":CALC:MARK{n}:STAT?"))
    }

    /// Show or hide the marker with `ON`/`OFF`.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), SiglentError> {
        let n = self.index;
        self.analyzer
            .send(&Protocol::with_switch(&format!(":CALC:MARK{n}:STAT"), enabled))
    }

    /// Get the marker type (normal, delta, fixed or off).
    pub fn get_mode(&mut self) -> Result<MarkerMode, SiglentError> {
        let n = self.index;
        self.analyzer.ask_token(&format!(":CALC:MARK{n}:MODE?"))
    }

    /// Set the marker type.
    pub fn set_mode(&mut self, mode: MarkerMode) -> Result<(), SiglentError> {
        let n = self.index;
        self.analyzer
            .send(&Protocol::with_token(&format!(":CALC:MARK{n}:MODE"), mode))
    }

    /// Trace the marker sits on
    ///
    /// # Errors
    /// Returns `SiglentError::Parse` if the instrument reports a trace number
    /// outside 1-4.
    pub fn get_trace(&mut self) -> Result<TraceIndex, SiglentError> {
        let n = self.index;
        let trace = self.analyzer.ask_u32(&format!(":CALC:MARK{n}:TRAC?"))?;
        u8::try_from(trace)
            .map_err(|_| SiglentError::Parse(format!("Trace number out of range: {trace}")))
            .and_then(|t| {
                TraceIndex::new(t)
                    .map_err(|_| SiglentError::Parse(format!("Trace number out of range: {t}")))
            })
    }

    /// Attach the marker to `trace`.
    pub fn set_trace(&mut self, trace: TraceIndex) -> Result<(), SiglentError> {
        let n = self.index;
        self.analyzer.send(&format!(":CALC:MARK{n}:TRAC {trace}"))
    }

    /// Peak search using the current search settings
    pub fn peak(&mut self) -> Result<(), SiglentError> {
        let n = self.index;
        self.analyzer.send(&format!(":CALC:MARK{n}:MAX"))
    }

    /// Marker position, in Hz on a frequency axis or seconds in zero span
    pub fn get_x(&mut self) -> Result<f64, SiglentError> {
        let n = self.index;
        self.analyzer.ask_f64(&format!(":CALC:MARK{n}:X?"))
    }

    /// Move the marker.
    ///
    /// # Arguments
    /// * `x` - Frequency in Hz, or time in seconds in zero span
    ///
    /// # Errors
    /// Returns `SiglentError::InvalidArgument` for NaN or infinite positions.
    pub fn set_x(&mut self, x: f64) -> Result<(), SiglentError> {
        if !x.is_finite() {
            return Err(SiglentError::InvalidArgument(format!(
                "Marker position must be finite, got {x}"
            )));
        }
        let n = self.index;
        self.analyzer
            .send(&Protocol::with_value(&format!(":CALC:MARK{n}:X"), x))
    }

    /// Marker amplitude in the current amplitude unit
    pub fn get_y(&mut self) -> Result<f64, SiglentError> {
        let n = self.index;
        self.analyzer.ask_f64(&format!(":CALC:MARK{n}:Y?"))
    }
}
