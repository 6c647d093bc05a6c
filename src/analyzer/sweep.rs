use super::{check_sweep_time, SpectrumAnalyzer};
use crate::error::SiglentError;
use crate::instrument::MessageInstrument;
use crate::protocol::Protocol;
use crate::transport::Transport;

impl<T: Transport> SpectrumAnalyzer<T> {
    /// Get the sweep time in seconds.
    pub fn get_sweep_time(&mut self) -> Result<f64, SiglentError> {
        self.ask_f64(":SWE:TIME?")
    }

    /// Set the sweep time.
    ///
    /// # Arguments
    /// * `seconds` - Sweep time, 450 µs to 1.5 ks
    ///
    /// # Errors
    /// Returns `SiglentError::InvalidArgument` outside that range.
    ///
    /// # Examples
    /// ```no_run
    /// use siglent_sa::SpectrumAnalyzer;
    ///
    /// let mut analyzer = SpectrumAnalyzer::connect("192.168.1.50")?;
    ///
    /// // Sends ":SWE:TIME 0.05s"
    /// analyzer.set_sweep_time(0.05)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn set_sweep_time(&mut self, seconds: f64) -> Result<(), SiglentError> {
        check_sweep_time(seconds)?;
        self.send(&Protocol::with_suffix(":SWE:TIME", seconds, "s"))
    }

    /// Abort the current sweep and start a new one.
    pub fn sweep_restart(&mut self) -> Result<(), SiglentError> {
        self.send(":INIT:REST")
    }
}

#[cfg(test)]
mod tests {
    use crate::transport::MockTransport;
    use crate::SpectrumAnalyzer;

    #[test]
    fn test_sweep_time() {
        let mut analyzer = SpectrumAnalyzer::new(MockTransport::new().with_reply("1.5e-01"));
        analyzer.set_sweep_time(450e-6).unwrap();
        assert!(analyzer.set_sweep_time(1e-6).is_err());
        assert!(analyzer.set_sweep_time(2000.0).is_err());
        assert_eq!(analyzer.get_sweep_time().unwrap(), 0.15);
        analyzer.sweep_restart().unwrap();
        assert_eq!(
            analyzer.into_transport().sent(),
            [":SWE:TIME 0.00045s", ":SWE:TIME?", ":INIT:REST"]
        );
    }
}
