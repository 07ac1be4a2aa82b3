//! fourway-link - FourWay session, transports and flashing workflow
//!
//! This crate drives the protocol implemented by `fourway-core` over a real
//! link: a [`Transport`] trait with serial and TCP implementations, the
//! [`FourWay`] half-duplex session with its bounded retry discipline, and
//! the page-oriented flash [`flash::program`] / [`flash::verify`] workflow.
//!
//! # Example
//!
//! ```no_run
//! use fourway_link::{FourWay, SerialTransport};
//! use fourway_link::flash::{self, FlashConfig, NoProgress};
//!
//! let transport = SerialTransport::open("/dev/ttyACM0", None)?;
//! let mut esc = FourWay::new(transport);
//! esc.enable_passthrough()?;
//! esc.connect(0)?;
//!
//! let image = std::fs::read("firmware.bin")?;
//! flash::program(&mut esc, &image, &FlashConfig::default(), &mut NoProgress)?;
//! flash::verify(&mut esc, &image, &FlashConfig::default(), &mut NoProgress)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod device;
pub mod error;
pub mod flash;
pub mod transport;

pub use device::{FourWay, LinkConfig};
pub use error::{LinkError, Result};
pub use transport::serial::SerialTransport;
pub use transport::tcp::TcpTransport;
pub use transport::Transport;

/// Connection options for a FourWay link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connection {
    /// Serial port connection
    Serial {
        /// Device path (e.g. "/dev/ttyACM0" or "COM3")
        device: String,
        /// Baud rate (None for the 115200 default)
        baud: Option<u32>,
    },
    /// TCP socket connection to a serial forwarder
    Tcp {
        /// Hostname or IP address
        host: String,
        /// Port number
        port: u16,
    },
}

impl Connection {
    /// Parse a connection string
    ///
    /// Formats:
    /// - `dev=/dev/ttyACM0` - serial with default baud
    /// - `dev=/dev/ttyACM0:115200` - serial with explicit baud
    /// - `ip=host:port` - TCP connection
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        if let Some(dev) = s.strip_prefix("dev=") {
            if let Some((device, baud_str)) = dev.rsplit_once(':') {
                let baud = baud_str
                    .parse()
                    .map_err(|_| format!("Invalid baud rate: {}", baud_str))?;
                Ok(Connection::Serial {
                    device: device.to_string(),
                    baud: Some(baud),
                })
            } else {
                Ok(Connection::Serial {
                    device: dev.to_string(),
                    baud: None,
                })
            }
        } else if let Some(ip) = s.strip_prefix("ip=") {
            let (host, port_str) = ip
                .rsplit_once(':')
                .ok_or_else(|| "Missing port in ip= parameter".to_string())?;
            let port = port_str
                .parse()
                .map_err(|_| format!("Invalid port: {}", port_str))?;
            Ok(Connection::Tcp {
                host: host.to_string(),
                port,
            })
        } else {
            Err(format!(
                "Invalid connection string: {}. Use dev=... or ip=...",
                s
            ))
        }
    }
}

/// Open a transport from a connection string
pub fn open_transport(options: &str) -> Result<Box<dyn Transport>> {
    let conn = Connection::parse(options).map_err(LinkError::ConnectionFailed)?;

    match conn {
        Connection::Serial { device, baud } => {
            Ok(Box::new(SerialTransport::open(&device, baud)?))
        }
        Connection::Tcp { host, port } => Ok(Box::new(TcpTransport::connect(&host, port)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serial_with_and_without_baud() {
        assert_eq!(
            Connection::parse("dev=/dev/ttyACM0").unwrap(),
            Connection::Serial {
                device: "/dev/ttyACM0".to_string(),
                baud: None,
            }
        );
        assert_eq!(
            Connection::parse("dev=/dev/ttyACM0:57600").unwrap(),
            Connection::Serial {
                device: "/dev/ttyACM0".to_string(),
                baud: Some(57600),
            }
        );
    }

    #[test]
    fn parses_tcp() {
        assert_eq!(
            Connection::parse("ip=localhost:4321").unwrap(),
            Connection::Tcp {
                host: "localhost".to_string(),
                port: 4321,
            }
        );
    }

    #[test]
    fn rejects_malformed_strings() {
        assert!(Connection::parse("/dev/ttyACM0").is_err());
        assert!(Connection::parse("ip=localhost").is_err());
        assert!(Connection::parse("dev=/dev/ttyACM0:fast").is_err());
    }
}
