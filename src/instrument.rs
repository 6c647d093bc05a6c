use crate::error::SiglentError;
use crate::protocol::Protocol;
use crate::transport::Transport;
use crate::types::{Identity, ScpiToken};
use log::debug;

/// Operations shared by every message-based Siglent instrument.
///
/// Implementors only hand out their transport; command logging, reply
/// parsing and the IEEE-488.2 common commands come for free.
pub trait MessageInstrument {
    type Transport: Transport;

    fn transport(&mut self) -> &mut Self::Transport;

    /// Send a command that produces no reply
    fn send(&mut self, command: &str) -> Result<(), SiglentError> {
        debug!(">> {command}");
        self.transport().write(command)
    }

    /// Send a query and return the raw reply text
    fn ask(&mut self, command: &str) -> Result<String, SiglentError> {
        debug!(">> {command}");
        let reply = self.transport().query(command).map_err(|e| {
            debug!("Query {command:?} failed: {e}");
            e
        })?;
        debug!("<< {}", reply.trim_end());
        Ok(reply)
    }

    fn ask_f64(&mut self, command: &str) -> Result<f64, SiglentError> {
        Protocol::parse_f64(&self.ask(command)?)
    }

    fn ask_u32(&mut self, command: &str) -> Result<u32, SiglentError> {
        Protocol::parse_u32(&self.ask(command)?)
    }

    fn ask_bool(&mut self, command: &str) -> Result<bool, SiglentError> {
        Protocol::parse_bool(&self.ask(command)?)
    }

    fn ask_token<E: ScpiToken>(&mut self, command: &str) -> Result<E, SiglentError> {
        Protocol::parse_token(&self.ask(command)?)
    }

    /// Raw `*IDN?` reply
    fn identifier(&mut self) -> Result<String, SiglentError> {
        Ok(self.ask("*IDN?")?.trim().to_string())
    }

    /// `*IDN?` split into manufacturer, model, serial number and firmware
    fn identity(&mut self) -> Result<Identity, SiglentError> {
        Protocol::parse_identity(&self.ask("*IDN?")?)
    }

    /// Preset the instrument to its factory remote-programming state
    fn reset(&mut self) -> Result<(), SiglentError> {
        self.send("*RST")
    }

    /// Clear the status byte, the error queue and all event registers
    fn clear(&mut self) -> Result<(), SiglentError> {
        self.send("*CLS")
    }

    /// Block until the instrument has finished all pending operations
    fn block_until_complete(&mut self) -> Result<(), SiglentError> {
        let reply = self.ask("*OPC?")?;
        if reply.trim() == "1" {
            Ok(())
        } else {
            Err(SiglentError::Protocol(format!(
                "*OPC? returned {:?} instead of 1",
                reply.trim()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    struct Bare(MockTransport);

    impl MessageInstrument for Bare {
        type Transport = MockTransport;

        fn transport(&mut self) -> &mut MockTransport {
            &mut self.0
        }
    }

    #[test]
    fn test_common_commands() {
        let mut instrument = Bare(MockTransport::new().with_reply("Siglent,SSA3021X,SN9,2.1\n"));
        instrument.reset().unwrap();
        instrument.clear().unwrap();
        assert_eq!(instrument.identifier().unwrap(), "Siglent,SSA3021X,SN9,2.1");
        assert_eq!(instrument.0.sent(), ["*RST", "*CLS", "*IDN?"]);
    }

    #[test]
    fn test_identity() {
        let mut instrument = Bare(MockTransport::new().with_reply("Siglent,SSA3021X,SN9,2.1"));
        let identity = instrument.identity().unwrap();
        assert_eq!(identity.model, "SSA3021X");
    }

    #[test]
    fn test_block_until_complete() {
        let mut instrument = Bare(MockTransport::new().with_reply("1\n").with_reply("0"));
        assert!(instrument.block_until_complete().is_ok());
        assert!(matches!(
            instrument.block_until_complete(),
            Err(SiglentError::Protocol(_))
        ));
    }

    #[test]
    fn test_transport_errors_propagate() {
        let mut instrument = Bare(MockTransport::new().with_failure("socket closed"));
        assert!(matches!(
            instrument.ask_f64(":FREQ:SPAN?"),
            Err(SiglentError::Transport(_))
        ));
    }

    #[test]
    fn test_typed_queries() {
        let mut instrument = Bare(
            MockTransport::new()
                .with_reply("12.5")
                .with_reply("7")
                .with_reply("ON")
                .with_reply("VIEW"),
        );
        assert_eq!(instrument.ask_f64("A?").unwrap(), 12.5);
        assert_eq!(instrument.ask_u32("B?").unwrap(), 7);
        assert!(instrument.ask_bool("C?").unwrap());
        assert_eq!(
            instrument.ask_token::<crate::types::TraceMode>("D?").unwrap(),
            crate::types::TraceMode::View
        );
    }
}
