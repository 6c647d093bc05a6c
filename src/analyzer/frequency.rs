use super::{check_frequency, check_span, SpectrumAnalyzer};
use crate::error::SiglentError;
use crate::instrument::MessageInstrument;
use crate::protocol::Protocol;
use crate::transport::Transport;

impl<T: Transport> SpectrumAnalyzer<T> {
    /// Get the current frequency span.
    ///
    /// # Returns
    /// The span in Hz; 0 means the analyzer is in zero span.
    ///
    /// # Errors
    /// Returns `SiglentError` if:
    /// - The query fails or communication times out
    /// - The reply is not a number
    pub fn get_span(&mut self) -> Result<f64, SiglentError> {
        self.ask_f64(":FREQ:SPAN?")
    }

    /// Set the frequency span.
    ///
    /// The center frequency is kept; start and stop follow.
    ///
    /// # Arguments
    /// * `hz` - Span in Hz, 100 Hz to 3.2 GHz, or exactly 0 for zero span
    ///
    /// # Errors
    /// Returns `SiglentError::InvalidArgument` for any other value, before
    /// anything is sent. Transport failures propagate unchanged.
    ///
    /// # Examples
    /// ```no_run
    /// use siglent_sa::SpectrumAnalyzer;
    ///
    /// let mut analyzer = SpectrumAnalyzer::connect("192.168.1.50")?;
    ///
    /// // Sends ":FREQ:SPAN 500000000 Hz"
    /// analyzer.set_span(500e6)?;
    ///
    /// // Zero span, time domain view at the center frequency
    /// analyzer.set_span(0.0)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn set_span(&mut self, hz: f64) -> Result<(), SiglentError> {
        check_span(hz)?;
        self.send(&Protocol::with_suffix(":FREQ:SPAN", hz, " Hz"))
    }

    /// Get the center frequency in Hz.
    ///
    /// # Examples
    /// ```no_run
    /// use siglent_sa::SpectrumAnalyzer;
    ///
    /// let mut analyzer = SpectrumAnalyzer::connect("192.168.1.50")?;
    /// println!("Center: {:.3} MHz", analyzer.get_center_frequency()? / 1e6);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn get_center_frequency(&mut self) -> Result<f64, SiglentError> {
        self.ask_f64(":FREQ:CENT?")
    }

    /// Set the center frequency.
    ///
    /// # Arguments
    /// * `hz` - Center frequency in Hz, 0 to 3.2 GHz
    ///
    /// # Errors
    /// Returns `SiglentError::InvalidArgument` outside that range.
    pub fn set_center_frequency(&mut self, hz: f64) -> Result<(), SiglentError> {
        check_frequency("Center frequency", hz)?;
        self.send(&Protocol::with_suffix(":FREQ:CENT", hz, " Hz"))
    }

    /// Get the start frequency of the sweep in Hz.
    pub fn get_start_frequency(&mut self) -> Result<f64, SiglentError> {
        self.ask_f64(":FREQ:STAR?")
    }

    /// Set the start frequency.
    ///
    /// # Arguments
    /// * `hz` - Start frequency in Hz, 0 to 3.2 GHz
    ///
    /// # Errors
    /// Returns `SiglentError::InvalidArgument` outside that range.
    pub fn set_start_frequency(&mut self, hz: f64) -> Result<(), SiglentError> {
        check_frequency("Start frequency", hz)?;
        self.send(&Protocol::with_suffix(":FREQ:STAR", hz, " Hz"))
    }

    /// Get the stop frequency of the sweep in Hz.
    pub fn get_stop_frequency(&mut self) -> Result<f64, SiglentError> {
        self.ask_f64(":FREQ:STOP?")
    }

    /// Set the stop frequency.
    ///
    /// # Arguments
    /// * `hz` - Stop frequency in Hz, 0 to 3.2 GHz
    ///
    /// # Errors
    /// Returns `SiglentError::InvalidArgument` outside that range.
    pub fn set_stop_frequency(&mut self, hz: f64) -> Result<(), SiglentError> {
        check_frequency("Stop frequency", hz)?;
        self.send(&Protocol::with_suffix(":FREQ:STOP", hz, " Hz"))
    }

    /// Center frequency step size in Hz. Follows the span, so read-only.
    pub fn get_frequency_step(&mut self) -> Result<f64, SiglentError> {
        self.ask_f64(":FREQ:CENT:STEP?")
    }
}
