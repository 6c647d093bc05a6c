use super::{ConnectionConfig, Transport};
use crate::error::SiglentError;
use log::{debug, warn};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

/// SCPI over a raw TCP socket.
///
/// Commands are terminated with `\n`; text replies are read up to the next
/// newline.
pub struct TcpTransport {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
    peer: String,
}

impl TcpTransport {
    pub fn connect(host: &str, port: u16, config: &ConnectionConfig) -> Result<Self, SiglentError> {
        let peer = format!("{host}:{port}");
        let socket_addr = (host, port)
            .to_socket_addrs()
            .map_err(|_| SiglentError::InvalidAddress(peer.clone()))?
            .next()
            .ok_or_else(|| SiglentError::InvalidAddress(peer.clone()))?;

        debug!("Connecting to {peer}");

        let stream = TcpStream::connect_timeout(&socket_addr, config.connect_timeout).map_err(|e| {
            warn!("Failed to connect to {peer}: {e}");
            SiglentError::io(e, format!("Failed to connect to {peer}"))
        })?;

        stream.set_read_timeout(Some(config.read_timeout))?;
        stream.set_write_timeout(Some(config.write_timeout))?;
        stream.set_nodelay(true)?;

        let reader = BufReader::new(
            stream
                .try_clone()
                .map_err(|e| SiglentError::io(e, "Cloning socket for reads"))?,
        );

        debug!("Connected to {peer}");

        Ok(Self {
            stream,
            reader,
            peer,
        })
    }

    /// `host:port` of the instrument
    pub fn peer(&self) -> &str {
        &self.peer
    }

    fn send_line(&mut self, command: &str) -> Result<(), SiglentError> {
        let line = format!("{command}\n");
        self.stream
            .write_all(line.as_bytes())
            .map_err(|e| SiglentError::io(e, format!("Writing {command:?}")))?;
        self.stream
            .flush()
            .map_err(|e| SiglentError::io(e, format!("Flushing {command:?}")))
    }
}

impl Transport for TcpTransport {
    fn write(&mut self, command: &str) -> Result<(), SiglentError> {
        self.send_line(command)
    }

    fn query(&mut self, command: &str) -> Result<String, SiglentError> {
        self.send_line(command)?;

        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .map_err(|e| SiglentError::io(e, format!("Reading reply to {command:?}")))?;
        if read == 0 {
            return Err(SiglentError::io(
                std::io::ErrorKind::UnexpectedEof.into(),
                format!("{} closed the connection", self.peer),
            ));
        }

        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn query_raw(&mut self, command: &str, len: usize) -> Result<Vec<u8>, SiglentError> {
        self.send_line(command)?;

        let mut payload = vec![0u8; len];
        self.reader
            .read_exact(&mut payload)
            .map_err(|e| SiglentError::io(e, format!("Reading {len} byte reply to {command:?}")))?;

        // The block is always followed by `\n`, possibly in a later segment
        let mut terminator = [0u8; 1];
        self.reader
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
