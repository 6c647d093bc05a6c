use super::{ConnectionConfig, Transport};
use crate::error::SiglentError;
use log::debug;
use std::ffi::CString;
use std::io::{BufRead, BufReader, Read, Write};
use visa_rs::{flags::AccessMode, DefaultRM, Instrument};

/// SCPI through the system VISA library (NI-VISA, Keysight IO, R&S VISA...).
///
/// Accepts any message-based resource string, e.g. `USB0::0xF4EC::0x1300::SN::INSTR`.
pub struct VisaTransport {
    // Declared before the resource manager so the session closes first
    instrument: Instrument,
    _rm: DefaultRM,
    resource: String,
}

fn visa_err(e: visa_rs::Error) -> SiglentError {
    SiglentError::Transport(format!("VISA: {e}"))
}

impl VisaTransport {
    pub fn open(resource: &str, config: &ConnectionConfig) -> Result<Self, SiglentError> {
        let rm = DefaultRM::new().map_err(visa_err)?;
        let resource_id = CString::new(resource)
            .map_err(|_| SiglentError::InvalidAddress(resource.to_string()))?
            .into();

        debug!("Opening VISA resource {resource}");
        let instrument = rm
            .open(&resource_id, AccessMode::NO_LOCK, config.connect_timeout)
            .map_err(visa_err)?;

        Ok(Self {
            instrument,
            _rm: rm,
            resource: resource.to_string(),
        })
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }
}

impl Transport for VisaTransport {
    fn write(&mut self, command: &str) -> Result<(), SiglentError> {
        self.instrument
            .write_all(format!("{command}\n").as_bytes())
            .map_err(|e| SiglentError::io(e, format!("Writing {command:?} to {}", self.resource)))
    }

    fn query(&mut self, command: &str) -> Result<String, SiglentError> {
        self.write(command)?;

        let mut line = String::new();
        BufReader::new(&self.instrument)
            .read_line(&mut line)
            .map_err(|e| SiglentError::io(e, format!("Reading reply to {command:?}")))?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn query_raw(&mut self, command: &str, len: usize) -> Result<Vec<u8>, SiglentError> {
        self.write(command)?;

        let mut payload = vec![0u8; len];
        (&self.instrument)
            .read_exact(&mut payload)
            .map_err(|e| SiglentError::io(e, format!("Reading {len} byte reply to {command:?}")))?;

        let mut terminator = [0u8; 1];
        (&self.instrument)
            .read_exact(&mut terminator)
            .map_err(|e| SiglentError::io(e, format!("Reading terminator of {command:?}")))?;
        if terminator[0] != b'\n' {
            return Err(SiglentError::Protocol(format!(
                "Expected newline after {len} byte reply to {command:?}, got {:#04x}",
                terminator[0]
            )));
        }
        Ok(payload)
    }
}
