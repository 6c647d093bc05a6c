use super::SpectrumAnalyzer;
use crate::error::SiglentError;
use crate::instrument::MessageInstrument;
use crate::protocol::Protocol;
use crate::transport::Transport;
use crate::types::{AverageType, Bandwidth};

impl<T: Transport> SpectrumAnalyzer<T> {
    /// Get the resolution bandwidth.
    ///
    /// # Returns
    /// The RBW as one of the discrete [`Bandwidth`] steps
    ///
    /// # Errors
    /// Returns `SiglentError::Parse` if the reply is not numeric or does not
    /// match a known step.
    pub fn get_rbw(&mut self) -> Result<Bandwidth, SiglentError> {
        self.ask_token(":BWID?")
    }

    /// Set the resolution bandwidth.
    ///
    /// # Arguments
    /// * `bandwidth` - One of the discrete steps, 1 Hz to 1 MHz
    ///
    /// # Examples
    /// ```no_run
    /// use siglent_sa::{Bandwidth, SpectrumAnalyzer};
    ///
    /// let mut analyzer = SpectrumAnalyzer::connect("192.168.1.50")?;
    /// analyzer.set_rbw(Bandwidth::KHz10)?;
    /// analyzer.set_vbw(Bandwidth::from_hz(3e3)?)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn set_rbw(&mut self, bandwidth: Bandwidth) -> Result<(), SiglentError> {
        self.send(&Protocol::with_token(":BWID", bandwidth))
    }

    /// Get the video bandwidth.
    pub fn get_vbw(&mut self) -> Result<Bandwidth, SiglentError> {
        self.ask_token(":BWID:VID?")
    }

    /// Set the video bandwidth.
    ///
    /// # Arguments
    /// * `bandwidth` - One of the discrete steps, 1 Hz to 1 MHz
    pub fn set_vbw(&mut self, bandwidth: Bandwidth) -> Result<(), SiglentError> {
        self.send(&Protocol::with_token(":BWID:VID", bandwidth))
    }

    /// Get the scale used when averaging traces (log power, power, voltage).
    pub fn get_average_type(&mut self) -> Result<AverageType, SiglentError> {
        self.ask_token(":AVER:TYPE?")
    }

    /// Set the scale used when averaging traces.
    pub fn set_average_type(&mut self, average_type: AverageType) -> Result<(), SiglentError> {
        self.send(&Protocol::with_token(":AVER:TYPE", average_type))
    }
}
