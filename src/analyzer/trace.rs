use super::{MAX_TRACE_AVERAGES, NUM_DATA_POINTS, SpectrumAnalyzer};
use crate::error::SiglentError;
use crate::instrument::MessageInstrument;
use crate::protocol::{Protocol, REAL_SAMPLE_SIZE};
use crate::transport::Transport;
use crate::types::{DetectionMode, Trace, TraceFormat, TraceIndex, TraceMode};
use log::debug;

impl<T: Transport> SpectrumAnalyzer<T> {
    /// Access one of the four traces.
    ///
    /// # Arguments
    /// * `index` - Trace number, 1-4
    ///
    /// # Errors
    /// Returns `SiglentError::InvalidArgument` unless `index` is 1-4.
    ///
    /// # Examples
    /// ```no_run
    /// use siglent_sa::{SpectrumAnalyzer, TraceMode};
    ///
    /// let mut analyzer = SpectrumAnalyzer::connect("192.168.1.50")?;
    ///
    /// let mut trace = analyzer.trace(1)?;
    /// trace.set_mode(TraceMode::MaxHold)?;
    /// let sweep = trace.data()?;
    /// println!("{} points", sweep.len());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn trace(&mut self, index: u8) -> Result<TraceHandle<'_, T>, SiglentError> {
        let index = TraceIndex::new(index)?;
        Ok(TraceHandle {
            analyzer: self,
            index,
        })
    }

    /// Encoding requested for trace data transfers
    pub fn trace_format(&self) -> TraceFormat {
        self.trace_format
    }

    /// Select the encoding of `:TRAC:DATA?` replies.
    ///
    /// `Real` moves raw doubles and is several times faster than `Ascii` for
    /// full 751-point sweeps.
    ///
    /// # Errors
    /// Returns `SiglentError` if the command cannot be written.
    pub fn set_trace_format(&mut self, format: TraceFormat) -> Result<(), SiglentError> {
        self.send(format.command())?;
        self.trace_format = format;
        self.format_synced = true;
        Ok(())
    }

    fn ensure_trace_format(&mut self) -> Result<(), SiglentError> {
        if !self.format_synced {
            let format = self.trace_format;
            self.set_trace_format(format)?;
        }
        Ok(())
    }
}

/// One of the analyzer's four traces, borrowed from the [`SpectrumAnalyzer`].
pub struct TraceHandle<'a, T: Transport> {
    analyzer: &'a mut SpectrumAnalyzer<T>,
    index: TraceIndex,
}

impl<T: Transport> TraceHandle<'_, T> {
    pub fn index(&self) -> TraceIndex {
        self.index
    }

    /// Get the display mode of this trace.
    ///
    /// # Errors
    /// Returns `SiglentError::Parse` if the reply is not a known mode token.
    pub fn get_mode(&mut self) -> Result<TraceMode, SiglentError> {
        let n = self.index;
        self.analyzer.ask_token(&format!(":TRAC{n}:MODE?"))
    }

    /// Set the display mode (clear/write, max hold, min hold, view, average).
    pub fn set_mode(&mut self, mode: TraceMode) -> Result<(), SiglentError> {
        let n = self.index;
        self.analyzer
            .send(&Protocol::with_token(&format!(":TRAC{n}:MODE"), mode))
    }

    /// Number of sweeps averaged in `Average` mode
    pub fn get_averages(&mut self) -> Result<u32, SiglentError> {
        let n = self.index;
        self.analyzer.ask_u32(&format!(":AVER:TRAC{n}:COUN?"))
    }

    /// Set the number of sweeps to average.
    ///
    /// # Arguments
    /// * `count` - Sweeps to average, 1-999
    ///
    /// # Errors
    /// Returns `SiglentError::InvalidArgument` for counts outside 1-999;
    /// nothing is sent in that case.
    pub fn set_averages(&mut self, count: u32) -> Result<(), SiglentError> {
        if !(1..=MAX_TRACE_AVERAGES).contains(&count) {
            return Err(SiglentError::InvalidArgument(format!(
                "Average count must be between 1 and {MAX_TRACE_AVERAGES}, got {count}"
            )));
        }
        let n = self.index;
        self.analyzer.send(&format!(":AVER:TRAC{n}:COUN {count}"))
    }

    /// Sweeps averaged so far
    pub fn current_averages(&mut self) -> Result<u32, SiglentError> {
        let n = self.index;
        self.analyzer.ask_u32(&format!(":AVER:TRAC{n}?"))
    }

    pub fn average_restart(&mut self) -> Result<(), SiglentError> {
        let n = self.index;
        self.analyzer.send(&format!(":AVER:TRAC{n}:CLE"))
    }

    pub fn get_detection_mode(&mut self) -> Result<DetectionMode, SiglentError> {
        let n = self.index;
        self.analyzer.ask_token(&format!(":DET:TRAC{n}?"))
    }

    pub fn set_detection_mode(&mut self, mode: DetectionMode) -> Result<(), SiglentError> {
        let n = self.index;
        self.analyzer
            .send(&Protocol::with_token(&format!(":DET:TRAC{n}"), mode))
    }

    /// Capture a fresh sweep of this trace.
    ///
    /// Restarts the sweep, waits for the instrument to report completion and
    /// then transfers all points. Units follow the analyzer's amplitude
    /// setting. Nothing is cached; every call measures again.
    ///
    /// # Returns
    /// A [`Trace`] of exactly 751 points, timestamped at capture.
    ///
    /// # Errors
    /// Transport failures propagate unchanged. An empty, non-numeric or
    /// wrongly sized reply is a `SiglentError::Parse`.
    pub fn data(&mut self) -> Result<Trace, SiglentError> {
        self.analyzer.ensure_trace_format()?;
        self.analyzer.sweep_restart()?;
        self.analyzer.block_until_complete()?;

        let command = format!(":TRAC:DATA? {}", self.index);
        let samples = match self.analyzer.trace_format {
            TraceFormat::Ascii => {
                let samples = Protocol::parse_ascii_trace(&self.analyzer.ask(&command)?)?;
                if samples.len() != NUM_DATA_POINTS {
                    return Err(SiglentError::Parse(format!(
                        "Expected {NUM_DATA_POINTS} trace points, got {}",
                        samples.len()
                    )));
                }
                samples
            }
            TraceFormat::Real => {
                debug!(">> {command}");
                let bytes = self
                    .analyzer
                    .transport()
                    .query_raw(&command, NUM_DATA_POINTS * REAL_SAMPLE_SIZE)?;
                debug!("<< {} bytes", bytes.len());
                Protocol::parse_binary_trace(&bytes, NUM_DATA_POINTS)?
            }
        };

        debug!("Trace {} captured with {} points", self.index, samples.len());
        Ok(Trace::new(self.index, samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use byteorder::{LittleEndian, WriteBytesExt};

    /// Full-length ASCII sweep starting at `first` dBm, rising 0.01 dB per point
    fn ascii_sweep(first: f64) -> String {
        (0..NUM_DATA_POINTS)
            .map(|i| format!("{:.2}", first + i as f64 * 0.01))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn real_sweep(first: f64) -> Vec<u8> {
        let mut payload = Vec::new();
        for i in 0..NUM_DATA_POINTS {
            payload.write_f64::<LittleEndian>(first + i as f64 * 0.1).unwrap();
        }
        payload
    }

    #[test]
    fn test_trace_index_bounds() {
        let mut analyzer = SpectrumAnalyzer::new(MockTransport::new());
        assert!(analyzer.trace(0).is_err());
        assert!(analyzer.trace(5).is_err());
        assert_eq!(analyzer.trace(4).unwrap().index().get(), 4);
    }

    #[test]
    fn test_ascii_trace_acquisition() {
        let mock = MockTransport::new()
            .with_reply("1")
            .with_reply(&ascii_sweep(-90.0));
        let mut analyzer = SpectrumAnalyzer::new(mock);
        let trace = analyzer.trace(2).unwrap().data().unwrap();

        assert_eq!(trace.len(), NUM_DATA_POINTS);
        assert_eq!(trace.samples[0], -90.0);
        assert_eq!(trace.samples[1], -89.99);
        assert_eq!(trace.index.get(), 2);
        assert_eq!(
            analyzer.into_transport().sent(),
            [":FORM ASCii", ":INIT:REST", "*OPC?", ":TRAC:DATA? 2"]
        );
    }

    #[test]
    fn test_format_sent_once() {
        let mock = MockTransport::new()
            .with_reply("1")
            .with_reply(&ascii_sweep(-50.0))
            .with_reply("1")
            .with_reply(&ascii_sweep(-51.0));
        let mut analyzer = SpectrumAnalyzer::new(mock);
        analyzer.trace(1).unwrap().data().unwrap();
        analyzer.trace(1).unwrap().data().unwrap();

        let mock = analyzer.into_transport();
        let format_commands = mock.sent().iter().filter(|c| c.starts_with(":FORM")).count();
        assert_eq!(format_commands, 1);
    }

    #[test]
    fn test_reset_resends_format() {
        let mock = MockTransport::new()
            .with_reply("1")
            .with_raw_reply(real_sweep(-100.0));
        let mut analyzer = SpectrumAnalyzer::new(mock);
        analyzer.set_trace_format(TraceFormat::Real).unwrap();
        analyzer.reset().unwrap();
        assert_eq!(analyzer.trace_format(), TraceFormat::Real);

        let trace = analyzer.trace(1).unwrap().data().unwrap();
        assert_eq!(trace.len(), NUM_DATA_POINTS);
        assert_eq!(
            analyzer.into_transport().sent(),
            [
                ":FORM REAL",
                "*RST",
                ":FORM REAL",
                ":INIT:REST",
                "*OPC?",
                ":TRAC:DATA? 1",
            ]
        );
    }

    #[test]
    fn test_empty_trace_is_an_error() {
        let mock = MockTransport::new().with_reply("1").with_reply("");
        let mut analyzer = SpectrumAnalyzer::new(mock);
        assert!(matches!(
            analyzer.trace(1).unwrap().data(),
            Err(SiglentError::Parse(_))
        ));
    }

    #[test]
    fn test_non_numeric_trace_is_an_error() {
        let mock = MockTransport::new().with_reply("1").with_reply("-50.0,ERR,-49.0");
        let mut analyzer = SpectrumAnalyzer::new(mock);
        assert!(matches!(
            analyzer.trace(1).unwrap().data(),
            Err(SiglentError::Parse(_))
        ));
    }

    #[test]
    fn test_short_ascii_trace_is_an_error() {
        let mock = MockTransport::new()
            .with_reply("1")
            .with_reply("1.0,2.0,3.0");
        let mut analyzer = SpectrumAnalyzer::new(mock);
        assert!(matches!(
            analyzer.trace(1).unwrap().data(),
            Err(SiglentError::Parse(_))
        ));
    }

    #[test]
    fn test_incomplete_sweep_aborts_transfer() {
        let mock = MockTransport::new().with_reply("0");
        let mut analyzer = SpectrumAnalyzer::new(mock);
        assert!(matches!(
            analyzer.trace(1).unwrap().data(),
            Err(SiglentError::Protocol(_))
        ));
        assert_eq!(analyzer.into_transport().last_sent(), Some("*OPC?"));
    }

    #[test]
    fn test_binary_trace_acquisition() {
        let mock = MockTransport::new()
            .with_reply("1")
            .with_raw_reply(real_sweep(-100.0));
        let mut analyzer = SpectrumAnalyzer::new(mock);
        analyzer.set_trace_format(TraceFormat::Real).unwrap();
        assert_eq!(analyzer.trace_format(), TraceFormat::Real);

        let trace = analyzer.trace(3).unwrap().data().unwrap();
        assert_eq!(trace.len(), NUM_DATA_POINTS);
        assert_eq!(trace.samples[0], -100.0);
        assert_eq!(trace.peak().map(|(i, _)| i), Some(NUM_DATA_POINTS - 1));
        assert_eq!(
            analyzer.into_transport().sent(),
            [":FORM REAL", ":INIT:REST", "*OPC?", ":TRAC:DATA? 3"]
        );
    }

    #[test]
    fn test_truncated_binary_trace() {
        let mock = MockTransport::new()
            .with_reply("1")
            .with_raw_reply(vec![0u8; 100]);
        let mut analyzer = SpectrumAnalyzer::new(mock);
        analyzer.set_trace_format(TraceFormat::Real).unwrap();
        assert!(matches!(
            analyzer.trace(1).unwrap().data(),
            Err(SiglentError::Parse(_))
        ));
    }

    #[test]
    fn test_trace_settings() {
        let mock = MockTransport::new()
            .with_reply("MAXH")
            .with_reply("16")
            .with_reply("3")
            .with_reply("SAMP");
        let mut analyzer = SpectrumAnalyzer::new(mock);
        {
            let mut trace = analyzer.trace(1).unwrap();
            trace.set_mode(TraceMode::Average).unwrap();
            assert_eq!(trace.get_mode().unwrap(), TraceMode::MaxHold);
            trace.set_averages(16).unwrap();
            assert!(matches!(
                trace.set_averages(0),
                Err(SiglentError::InvalidArgument(_))
            ));
            assert!(trace.set_averages(1000).is_err());
            assert_eq!(trace.get_averages().unwrap(), 16);
            assert_eq!(trace.current_averages().unwrap(), 3);
            trace.average_restart().unwrap();
            trace.set_detection_mode(DetectionMode::Positive).unwrap();
            assert_eq!(trace.get_detection_mode().unwrap(), DetectionMode::Sample);
        }
        assert_eq!(
            analyzer.into_transport().sent(),
            [
                ":TRAC1:MODE AVER",
                ":TRAC1:MODE?",
                ":AVER:TRAC1:COUN 16",
                ":AVER:TRAC1:COUN?",
                ":AVER:TRAC1?",
                ":AVER:TRAC1:CLE",
                ":DET:TRAC1 POS",
                ":DET:TRAC1?",
            ]
        );
    }
}
