//! In-memory transport double used by unit and behaviour tests.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use tether_config::Endpoint;

use super::Transport;
use crate::error::TransportError;

#[derive(Debug, Default)]
struct LoopbackState {
    open: bool,
    readable: VecDeque<u8>,
    written: Vec<u8>,
    opens: usize,
    closes: usize,
    refuse_open: bool,
    fail_close: bool,
    echo: bool,
}

/// Transport whose peer is a pair of in-memory buffers.
pub(crate) struct LoopbackTransport {
    state: Arc<Mutex<LoopbackState>>,
    endpoint: Endpoint,
}

/// Test-side view of a [`LoopbackTransport`].
#[derive(Clone)]
pub(crate) struct LoopbackProbe {
    state: Arc<Mutex<LoopbackState>>,
}

impl LoopbackTransport {
    pub(crate) fn new() -> (Self, LoopbackProbe) {
        let state = Arc::new(Mutex::new(LoopbackState::default()));
        let transport = Self {
            state: Arc::clone(&state),
            endpoint: Endpoint::Tcp {
                host: String::from("loopback"),
                port: 9090,
            },
        };
        (transport, LoopbackProbe { state })
    }

    fn state(&self) -> MutexGuard<'_, LoopbackState> {
        self.state.lock().expect("loopback state poisoned")
    }
}

impl LoopbackProbe {
    fn state(&self) -> MutexGuard<'_, LoopbackState> {
        self.state.lock().expect("loopback state poisoned")
    }

    pub(crate) fn written(&self) -> Vec<u8> {
        self.state().written.clone()
    }

    pub(crate) fn push_readable(&self, bytes: &[u8]) {
        self.state().readable.extend(bytes);
    }

    pub(crate) fn is_open(&self) -> bool {
        self.state().open
    }

    pub(crate) fn opens(&self) -> usize {
        self.state().opens
    }

    pub(crate) fn closes(&self) -> usize {
        self.state().closes
    }

    /// Makes every open fail as if the server were unreachable.
    pub(crate) fn refuse_open(&self) {
        self.state().refuse_open = true;
    }

    /// Makes every close report a shutdown failure.
    pub(crate) fn fail_close(&self) {
        self.state().fail_close = true;
    }

    /// Makes written bytes readable again, like an echo server.
    pub(crate) fn echo(&self) {
        self.state().echo = true;
    }
}

impl Transport for LoopbackTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        let mut state = self.state();
        if state.open {
            return Err(TransportError::AlreadyOpen {
                address: String::from("loopback"),
            });
        }
        if state.refuse_open {
            return Err(TransportError::Connect {
                address: String::from("loopback"),
                source: io::Error::from(io::ErrorKind::ConnectionRefused),
            });
        }
        state.open = true;
        state.opens += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        let mut state = self.state();
        if !state.open {
            return Err(TransportError::NotOpen {
                address: String::from("loopback"),
            });
        }
        state.open = false;
        state.closes += 1;
        if state.fail_close {
            return Err(TransportError::Close {
                address: String::from("loopback"),
                source: io::Error::from(io::ErrorKind::BrokenPipe),
            });
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state().open
    }

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn describe(&self) -> String {
        String::from("loopback")
    }
}

impl Read for LoopbackTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state();
        if !state.open {
            return Err(io::Error::from(io::ErrorKind::NotConnected));
        }
        state.readable.read(buf)
    }
}

impl Write for LoopbackTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state();
        if !state.open {
            return Err(io::Error::from(io::ErrorKind::NotConnected));
        }
        state.written.extend_from_slice(buf);
        if state.echo {
            state.readable.extend(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
