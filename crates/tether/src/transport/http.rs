//! HTTP(S) transport: each flush POSTs the buffered request and buffers the
//! response body for reading.

use std::io::{self, Cursor, Read, Write};
use std::mem;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tether_config::{ConnectionDescriptor, Endpoint};
use tracing::debug;

use super::{TRANSPORT_TARGET, Transport, address_of};
use crate::error::TransportError;

/// Media type used for Thrift payloads over HTTP.
pub const THRIFT_CONTENT_TYPE: &str = "application/x-thrift";

/// Transport for `http` and `https` URIs.
///
/// Opening prepares a client without contacting the server, so an open HTTP
/// transport says nothing about the server's reachability.
pub struct HttpTransport {
    endpoint: Endpoint,
    address: String,
    timeout: Option<Duration>,
    client: Option<Client>,
    request: Vec<u8>,
    response: Cursor<Vec<u8>>,
}

impl HttpTransport {
    /// Closed transport posting to the descriptor's URL.
    #[must_use]
    pub fn new(descriptor: &ConnectionDescriptor, timeout: Option<Duration>) -> Self {
        Self {
            endpoint: descriptor.endpoint().clone(),
            address: address_of(descriptor),
            timeout,
            client: None,
            request: Vec::new(),
            response: Cursor::new(Vec::new()),
        }
    }

    fn client(&self) -> io::Result<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "transport is not open"))
    }

    fn reset_buffers(&mut self) {
        self.request.clear();
        self.response = Cursor::new(Vec::new());
    }
}

impl Transport for HttpTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.client.is_some() {
            return Err(TransportError::AlreadyOpen {
                address: self.address.clone(),
            });
        }
        let mut builder = Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout).connect_timeout(timeout);
        }
        let client = builder.build().map_err(|source| TransportError::Http {
            address: self.address.clone(),
            source,
        })?;
        self.reset_buffers();
        self.client = Some(client);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if self.client.take().is_none() {
            return Err(TransportError::NotOpen {
                address: self.address.clone(),
            });
        }
        self.reset_buffers();
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.client.is_some()
    }

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn describe(&self) -> String {
        match &self.endpoint {
            Endpoint::Http { url, .. } => url.scheme().to_owned(),
            _ => String::from("http"),
        }
    }
}

impl Read for HttpTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.client()?;
        self.response.read(buf)
    }
}

impl Write for HttpTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.client()?;
        self.request.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.request.is_empty() {
            return Ok(());
        }
        let Endpoint::Http { url, .. } = &self.endpoint else {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("{} is not an HTTP endpoint", self.address),
            ));
        };
        let body = mem::take(&mut self.request);
        let sent = body.len();
        let response = self
            .client()?
            .post(url.clone())
            .header(CONTENT_TYPE, THRIFT_CONTENT_TYPE)
            .header(ACCEPT, THRIFT_CONTENT_TYPE)
            .body(body)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(io::Error::other)?;
        let payload = response.bytes().map_err(io::Error::other)?;
        debug!(
            target: TRANSPORT_TARGET,
            address = %self.address,
            sent,
            received = payload.len(),
            "HTTP exchange completed"
        );
        self.response = Cursor::new(payload.to_vec());
        Ok(())
    }
}
