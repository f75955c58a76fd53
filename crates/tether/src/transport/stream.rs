//! Connected socket streams shared by the plain and TLS socket transports.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

#[cfg(unix)]
use std::os::fd::OwnedFd;
#[cfg(unix)]
use std::os::unix::net::UnixStream;

#[cfg(unix)]
use socket2::{Domain, SockAddr, Socket, Type};

use tether_config::Endpoint;

/// Connect timeout applied when `SOCKET_TIMEOUT_MS` is unset.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) enum SocketStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl SocketStream {
    /// Connects to a TCP or filesystem socket endpoint.
    ///
    /// `timeout` bounds the connect and, when set, every subsequent read and
    /// write.
    pub(crate) fn connect(endpoint: &Endpoint, timeout: Option<Duration>) -> io::Result<Self> {
        let connect_timeout = timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        let stream = match endpoint {
            Endpoint::Tcp { host, port } => connect_tcp(host, *port, connect_timeout)?,
            Endpoint::Unix { path } => connect_unix(path.as_str(), connect_timeout)?,
            Endpoint::Http { url, .. } => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("{url} is not a socket endpoint"),
                ));
            }
        };
        stream.set_timeouts(timeout)?;
        Ok(stream)
    }

    fn set_timeouts(&self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => {
                stream.set_nodelay(true)?;
                stream.set_read_timeout(timeout)?;
                stream.set_write_timeout(timeout)
            }
            #[cfg(unix)]
            Self::Unix(stream) => {
                stream.set_read_timeout(timeout)?;
                stream.set_write_timeout(timeout)
            }
        }
    }

    /// Shuts both directions down. A peer that already hung up is not an
    /// error.
    pub(crate) fn shutdown(&self) -> io::Result<()> {
        let result = match self {
            Self::Tcp(stream) => stream.shutdown(Shutdown::Both),
            #[cfg(unix)]
            Self::Unix(stream) => stream.shutdown(Shutdown::Both),
        };
        match result {
            Err(error) if error.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

impl Read for SocketStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for SocketStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

fn connect_tcp(host: &str, port: u16, timeout: Duration) -> io::Result<SocketStream> {
    let addresses: Vec<SocketAddr> = (host, port).to_socket_addrs()?.collect();
    let mut last_error = None;
    // Names such as `localhost` can resolve to both families; try each.
    for address in addresses {
        match TcpStream::connect_timeout(&address, timeout) {
            Ok(stream) => return Ok(SocketStream::Tcp(stream)),
            Err(error) => last_error = Some(error),
        }
    }
    Err(last_error.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses")
    }))
}

#[cfg(unix)]
fn connect_unix(path: &str, timeout: Duration) -> io::Result<SocketStream> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let address = SockAddr::unix(path)?;
    socket.connect_timeout(&address, timeout)?;
    Ok(SocketStream::Unix(UnixStream::from(OwnedFd::from(socket))))
}

#[cfg(not(unix))]
fn connect_unix(path: &str, _timeout: Duration) -> io::Result<SocketStream> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("filesystem sockets are unavailable on this platform: {path}"),
    ))
}
