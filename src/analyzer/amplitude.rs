use super::{check_attenuation, check_ref_level, SpectrumAnalyzer};
use crate::error::SiglentError;
use crate::instrument::MessageInstrument;
use crate::protocol::Protocol;
use crate::transport::Transport;

impl<T: Transport> SpectrumAnalyzer<T> {
    /// Get the reference level, the amplitude at the top of the display.
    ///
    /// # Returns
    /// The reference level in dBm
    ///
    /// # Errors
    /// Returns `SiglentError` if:
    /// - The query fails or communication times out
    /// - The reply is not a number
    pub fn get_ref_level(&mut self) -> Result<f64, SiglentError> {
        self.ask_f64(":DISP:WIND:TRAC:Y:RLEV?")
    }

    /// Set the reference level.
    ///
    /// # Arguments
    /// * `dbm` - Reference level in dBm, -100 to 30
    ///
    /// # Errors
    /// Returns `SiglentError::InvalidArgument` outside that range; nothing is
    /// sent in that case.
    ///
    /// # Examples
    /// ```no_run
    /// use siglent_sa::SpectrumAnalyzer;
    ///
    /// let mut analyzer = SpectrumAnalyzer::connect("192.168.1.50")?;
    ///
    /// // Sends ":DISP:WIND:TRAC:Y:RLEV -20 DBM"
    /// analyzer.set_ref_level(-20.0)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn set_ref_level(&mut self, dbm: f64) -> Result<(), SiglentError> {
        check_ref_level(dbm)?;
        self.send(&Protocol::with_suffix(":DISP:WIND:TRAC:Y:RLEV", dbm, " DBM"))
    }

    /// Get the input attenuation in dB.
    pub fn get_attenuation(&mut self) -> Result<f64, SiglentError> {
        self.ask_f64(":POW:ATT?")
    }

    /// Set the input attenuation.
    ///
    /// # Arguments
    /// * `db` - Attenuation in dB, 0 to 51
    ///
    /// # Errors
    /// Returns `SiglentError::InvalidArgument` outside that range.
    pub fn set_attenuation(&mut self, db: f64) -> Result<(), SiglentError> {
        check_attenuation(db)?;
        self.send(&Protocol::with_value(":POW:ATT", db))
    }

    /// Whether the internal preamplifier is active.
    ///
    /// # Errors
    /// Returns `SiglentError::Parse` unless the reply is `1`, `0`, `ON` or `OFF`.
    pub fn get_preamp(&mut self) -> Result<bool, SiglentError> {
        self.ask_bool(":POW:GAIN?")
    }

    /// Switch the internal preamplifier with `ON`/`OFF`.
    ///
    /// # Examples
    /// ```no_run
    /// use siglent_sa::SpectrumAnalyzer;
    ///
    /// let mut analyzer = SpectrumAnalyzer::connect("192.168.1.50")?;
    /// analyzer.set_preamp(true)?;
    /// assert!(analyzer.get_preamp()?);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn set_preamp(&mut self, enabled: bool) -> Result<(), SiglentError> {
        self.send(&Protocol::with_switch(":POW:GAIN", enabled))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::SiglentError;
    use crate::transport::MockTransport;
    use crate::SpectrumAnalyzer;

    #[test]
    fn test_preamp_tokens() {
        let mut analyzer = SpectrumAnalyzer::new(MockTransport::new());
        analyzer.set_preamp(true).unwrap();
        analyzer.set_preamp(false).unwrap();
        assert_eq!(
            analyzer.into_transport().sent(),
            [":POW:GAIN ON", ":POW:GAIN OFF"]
        );
    }

    #[test]
    fn test_preamp_query() {
        let mock = MockTransport::new().with_reply("1\n").with_reply("0\n");
        let mut analyzer = SpectrumAnalyzer::new(mock);
        assert!(analyzer.get_preamp().unwrap());
        assert!(!analyzer.get_preamp().unwrap());
    }

    #[test]
    fn test_attenuation() {
        let mut analyzer = SpectrumAnalyzer::new(MockTransport::new().with_reply("30"));
        analyzer.set_attenuation(30.0).unwrap();
        assert!(matches!(
            analyzer.set_attenuation(60.0),
            Err(SiglentError::InvalidArgument(_))
        ));
        assert_eq!(analyzer.get_attenuation().unwrap(), 30.0);
        assert_eq!(
            analyzer.into_transport().sent(),
            [":POW:ATT 30", ":POW:ATT?"]
        );
    }

    #[test]
    fn test_ref_level() {
        let mut analyzer = SpectrumAnalyzer::new(MockTransport::new());
        analyzer.set_ref_level(-25.5).unwrap();
        assert!(analyzer.set_ref_level(31.0).is_err());
        assert!(analyzer.set_ref_level(-101.0).is_err());
        assert_eq!(
            analyzer.into_transport().sent(),
            [":DISP:WIND:TRAC:Y:RLEV -25.5 DBM"]
        );
    }
}
