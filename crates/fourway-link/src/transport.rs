//! Transport layer abstraction
//!
//! The session only needs two operations: send a frame, and collect one
//! reply within a bounded timeout. The protocol is half-duplex, so a reply
//! is whatever arrives between the send and the first idle gap on the line.

use std::time::Duration;

use crate::error::{LinkError, Result};

/// Idle gap that ends a reply once at least one byte has arrived
const REPLY_GAP: Duration = Duration::from_millis(20);

/// Transport trait for sending frames and collecting replies
pub trait Transport {
    /// Write a complete frame to the transport
    fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Collect one reply
    ///
    /// Waits up to `timeout` for the first byte, then accumulates until the
    /// line goes idle. Returns [`LinkError::Timeout`] if nothing arrives.
    fn receive(&mut self, timeout: Duration) -> Result<Vec<u8>>;
}

impl Transport for Box<dyn Transport> {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        (**self).send(data)
    }

    fn receive(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        (**self).receive(timeout)
    }
}

pub mod serial {
    //! Serial port transport implementation

    use super::*;
    use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
    use std::io::Read;

    /// Serial port transport
    pub struct SerialTransport {
        port: Box<dyn SerialPort>,
    }

    impl SerialTransport {
        /// Open a serial port with the specified baud rate
        ///
        /// Defaults to 115200 baud, 8N1, no flow control.
        pub fn open(device: &str, baud: Option<u32>) -> Result<Self> {
            let baud_rate = baud.unwrap_or(115_200);

            let port = serialport::new(device, baud_rate)
                .data_bits(DataBits::Eight)
                .parity(Parity::None)
                .stop_bits(StopBits::One)
                .flow_control(FlowControl::None)
                .timeout(Duration::from_secs(5))
                .open()?;

            log::info!("Opened serial port {} at {} baud", device, baud_rate);

            Ok(Self { port })
        }

        fn read_some(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
            let old_timeout = self.port.timeout();
            self.port.set_timeout(timeout)?;

            let result = match self.port.read(buf) {
                Ok(n) => Ok(n),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
                Err(e) => Err(LinkError::from(e)),
            };

            self.port.set_timeout(old_timeout)?;
            result
        }
    }

    impl Transport for SerialTransport {
        fn send(&mut self, data: &[u8]) -> Result<()> {
            use std::io::Write;
            self.port.write_all(data)?;
            self.port.flush()?;
            Ok(())
        }

        fn receive(&mut self, timeout: Duration) -> Result<Vec<u8>> {
            let mut chunk = [0u8; 270];
            let n = self.read_some(&mut chunk, timeout)?;
            if n == 0 {
                return Err(LinkError::Timeout(timeout));
            }

            let mut reply = chunk[..n].to_vec();
            loop {
                let n = self.read_some(&mut chunk, REPLY_GAP)?;
                if n == 0 {
                    break;
                }
                reply.extend_from_slice(&chunk[..n]);
            }

            log::trace!("received {} reply bytes", reply.len());
            Ok(reply)
        }
    }
}

pub mod tcp {
    //! TCP socket transport implementation
    //!
    //! Useful when the pass-through link is bridged over the network (e.g.
    //! a serial-to-TCP forwarder next to the flight controller).

    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpStream;

    /// TCP socket transport
    pub struct TcpTransport {
        stream: TcpStream,
    }

    impl TcpTransport {
        /// Connect to a forwarder at the specified host and port
        pub fn connect(host: &str, port: u16) -> Result<Self> {
            let addr = format!("{}:{}", host, port);
            log::info!("Connecting to {}", addr);

            let stream = TcpStream::connect(&addr)
                .map_err(|e| LinkError::ConnectionFailed(e.to_string()))?;
            stream.set_nodelay(true).map_err(|e| {
                LinkError::ConnectionFailed(format!("failed to set TCP_NODELAY: {}", e))
            })?;

            Ok(Self { stream })
        }

        fn read_some(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
            self.stream.set_read_timeout(Some(timeout))?;
            match self.stream.read(buf) {
                Ok(n) => Ok(n),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(0),
                Err(e) => Err(LinkError::from(e)),
            }
        }
    }

    impl Transport for TcpTransport {
        fn send(&mut self, data: &[u8]) -> Result<()> {
            self.stream.write_all(data)?;
            self.stream.flush()?;
            Ok(())
        }

        fn receive(&mut self, timeout: Duration) -> Result<Vec<u8>> {
            let mut chunk = [0u8; 270];
            let n = self.read_some(&mut chunk, timeout)?;
            if n == 0 {
                return Err(LinkError::Timeout(timeout));
            }

            let mut reply = chunk[..n].to_vec();
            loop {
                let n = self.read_some(&mut chunk, REPLY_GAP)?;
                if n == 0 {
                    break;
                }
                reply.extend_from_slice(&chunk[..n]);
            }

            Ok(reply)
        }
    }
}
