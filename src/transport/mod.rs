use crate::error::SiglentError;
use log::debug;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub mod mock;
pub mod tcp;
#[cfg(feature = "visa")]
pub mod visa;

pub use mock::MockTransport;
pub use tcp::TcpTransport;
#[cfg(feature = "visa")]
pub use visa::VisaTransport;

/// Raw SCPI socket port used by Siglent instruments
pub const DEFAULT_SCPI_PORT: u16 = 5025;

/// Message-based session to an instrument.
///
/// Implementations add and strip line terminators; commands are passed in
/// and replies handed back without them. Every call blocks until the
/// exchange has completed or the transport gives up.
pub trait Transport {
    /// Send a command that produces no reply
    fn write(&mut self, command: &str) -> Result<(), SiglentError>;

    /// Send a query and read back one line of text
    fn query(&mut self, command: &str) -> Result<String, SiglentError>;

    /// Send a query and read back exactly `len` bytes of binary payload
    fn query_raw(&mut self, command: &str, len: usize) -> Result<Vec<u8>, SiglentError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, command: &str) -> Result<(), SiglentError> {
        (**self).write(command)
    }

    fn query(&mut self, command: &str) -> Result<String, SiglentError> {
        (**self).query(command)
    }

    fn query_raw(&mut self, command: &str, len: usize) -> Result<Vec<u8>, SiglentError> {
        (**self).query_raw(command, len)
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, command: &str) -> Result<(), SiglentError> {
        (**self).write(command)
    }

    fn query(&mut self, command: &str) -> Result<String, SiglentError> {
        (**self).query(command)
    }

    fn query_raw(&mut self, command: &str, len: usize) -> Result<Vec<u8>, SiglentError> {
        (**self).query_raw(command, len)
    }
}

/// Connection configuration for opening a transport.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use siglent_sa::ConnectionConfig;
///
/// // Sweeps can take a while on narrow RBW settings
/// let config = ConnectionConfig {
///     read_timeout: Duration::from_secs(60),
///     ..ConnectionConfig::default()
/// };
/// assert_eq!(config.connect_timeout, Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Timeout for establishing the connection
    pub connect_timeout: Duration,
    /// Timeout for reading a reply
    pub read_timeout: Duration,
    /// Timeout for writing a command
    pub write_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(5),
        }
    }
}

/// Where an instrument lives.
///
/// Parsed from VISA resource syntax:
/// - `TCPIP0::192.168.1.50::5025::SOCKET` is a raw socket on the given port
/// - `TCPIP0::192.168.1.50::INSTR` and `TCPIP::host::inst0::INSTR` map to the
///   raw socket on port 5025
/// - a bare `host` or `host:port` is accepted as a shorthand
/// - everything else (GPIB, USB, HiSLIP...) is kept verbatim for a VISA library
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceAddress {
    Socket { host: String, port: u16 },
    Visa(String),
}

impl FromStr for ResourceAddress {
    type Err = SiglentError;

    fn from_str(address: &str) -> Result<Self, Self::Err> {
        let address = address.trim();
        if address.is_empty() {
            return Err(SiglentError::InvalidAddress("empty address".to_string()));
        }

        if !address.contains("::") {
            return parse_host_port(address);
        }

        let parts: Vec<&str> = address.split("::").collect();
        if !parts[0].to_ascii_uppercase().starts_with("TCPIP") {
            return Ok(ResourceAddress::Visa(address.to_string()));
        }

        let host = parts
            .get(1)
            .filter(|host| !host.is_empty())
            .ok_or_else(|| SiglentError::InvalidAddress(address.to_string()))?
            .to_string();
        let class = parts.last().map(|c| c.to_ascii_uppercase()).unwrap_or_default();

        match (class.as_str(), parts.len()) {
            ("SOCKET", 4) => {
                let port = parts[2]
                    .parse::<u16>()
                    .map_err(|_| SiglentError::InvalidAddress(address.to_string()))?;
                Ok(ResourceAddress::Socket { host, port })
            }
            ("INSTR", 3) => Ok(ResourceAddress::Socket {
                host,
                port: DEFAULT_SCPI_PORT,
            }),
            ("INSTR", 4) if parts[2].eq_ignore_ascii_case("inst0") => {
                Ok(ResourceAddress::Socket {
                    host,
                    port: DEFAULT_SCPI_PORT,
                })
            }
            ("INSTR", 4) => Ok(ResourceAddress::Visa(address.to_string())),
            _ => Err(SiglentError::InvalidAddress(address.to_string())),
        }
    }
}

fn parse_host_port(address: &str) -> Result<ResourceAddress, SiglentError> {
    match address.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => {
            let port = port
                .parse::<u16>()
                .map_err(|_| SiglentError::InvalidAddress(address.to_string()))?;
            Ok(ResourceAddress::Socket {
                host: host.to_string(),
                port,
            })
        }
        Some(_) => Err(SiglentError::InvalidAddress(address.to_string())),
        None => Ok(ResourceAddress::Socket {
            host: address.to_string(),
            port: DEFAULT_SCPI_PORT,
        }),
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceAddress::Socket { host, port } => {
                write!(f, "TCPIP0::{host}::{port}::SOCKET")
            }
            ResourceAddress::Visa(resource) => write!(f, "{resource}"),
        }
    }
}

/// Open a session to the instrument at `address`.
///
/// Socket addresses are served by [`TcpTransport`]. Other VISA resources
/// need the `visa` cargo feature and a system VISA library.
pub fn open(address: &str, config: &ConnectionConfig) -> Result<Box<dyn Transport>, SiglentError> {
    let resource: ResourceAddress = address.parse()?;
    debug!("Opening {resource}");

    match resource {
        ResourceAddress::Socket { host, port } => {
            Ok(Box::new(TcpTransport::connect(&host, port, config)?))
        }
        #[cfg(feature = "visa")]
        ResourceAddress::Visa(resource) => Ok(Box::new(VisaTransport::open(&resource, config)?)),
        #[cfg(not(feature = "visa"))]
        ResourceAddress::Visa(resource) => Err(SiglentError::InvalidAddress(format!(
            "{resource} needs a VISA library; rebuild with --features visa"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn socket(host: &str, port: u16) -> ResourceAddress {
        ResourceAddress::Socket {
            host: host.to_string(),
            port,
        }
    }

    #[test]
    fn test_socket_address() {
        assert_eq!(
            "TCPIP0::192.168.1.50::5025::SOCKET".parse::<ResourceAddress>().unwrap(),
            socket("192.168.1.50", 5025)
        );
        assert_eq!(
            "tcpip::analyzer.lab::5024::socket".parse::<ResourceAddress>().unwrap(),
            socket("analyzer.lab", 5024)
        );
        assert!("TCPIP0::192.168.1.50::http::SOCKET".parse::<ResourceAddress>().is_err());
    }

    #[test]
    fn test_instr_address_uses_scpi_port() {
        assert_eq!(
            "TCPIP0::192.168.1.50::INSTR".parse::<ResourceAddress>().unwrap(),
            socket("192.168.1.50", DEFAULT_SCPI_PORT)
        );
        assert_eq!(
            "TCPIP::10.0.0.7::inst0::INSTR".parse::<ResourceAddress>().unwrap(),
            socket("10.0.0.7", DEFAULT_SCPI_PORT)
        );
        assert_eq!(
            "TCPIP0::10.0.0.7::hislip0::INSTR".parse::<ResourceAddress>().unwrap(),
            ResourceAddress::Visa("TCPIP0::10.0.0.7::hislip0::INSTR".to_string())
        );
    }

    #[test]
    fn test_bare_host() {
        assert_eq!(
            "192.168.1.50".parse::<ResourceAddress>().unwrap(),
            socket("192.168.1.50", DEFAULT_SCPI_PORT)
        );
        assert_eq!(
            "localhost:15025".parse::<ResourceAddress>().unwrap(),
            socket("localhost", 15025)
        );
        assert!(":5025".parse::<ResourceAddress>().is_err());
        assert!("host:port".parse::<ResourceAddress>().is_err());
    }

    #[test]
    fn test_non_tcp_resources_pass_through() {
        assert_eq!(
            "USB0::0xF4EC::0x1300::SSA3XLBC1R0123::INSTR"
                .parse::<ResourceAddress>()
                .unwrap(),
            ResourceAddress::Visa("USB0::0xF4EC::0x1300::SSA3XLBC1R0123::INSTR".to_string())
        );
    }

    #[test]
    fn test_malformed_addresses() {
        assert!("".parse::<ResourceAddress>().is_err());
        assert!("TCPIP0::::INSTR".parse::<ResourceAddress>().is_err());
        assert!("TCPIP0::host::5025::BOGUS".parse::<ResourceAddress>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(socket("10.0.0.7", 5025).to_string(), "TCPIP0::10.0.0.7::5025::SOCKET");
    }

    #[cfg(not(feature = "visa"))]
    #[test]
    fn test_open_visa_resource_without_feature() {
        let result = open("GPIB0::18::INSTR", &ConnectionConfig::default());
        assert!(matches!(result, Err(SiglentError::InvalidAddress(_))));
    }
}
