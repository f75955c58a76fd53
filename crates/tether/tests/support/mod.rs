//! Shared fixtures for the integration suites: a ping client, echo servers,
//! and a minimal request-dispatching host.

#![allow(dead_code, reason = "each suite uses a different subset")]

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

use thrift::protocol::{TMessageIdentifier, TMessageType};

use tether::{
    BeforeRequestHook, InputProtocol, OutputProtocol, RequestLifecycle, TeardownHook,
};

/// Hand-written stand-in for a generated client with one `ping` call.
pub struct PingClient {
    input: InputProtocol,
    output: OutputProtocol,
}

impl PingClient {
    pub fn new(input: InputProtocol, output: OutputProtocol) -> Self {
        Self { input, output }
    }

    /// Sends a call and returns the sequence number the peer echoed back.
    pub fn ping(&mut self, sequence: i32) -> thrift::Result<i32> {
        let call = TMessageIdentifier::new("ping", TMessageType::Call, sequence);
        self.output.write_message_begin(&call)?;
        self.output.write_message_end()?;
        self.output.flush()?;
        Ok(self.input.read_message_begin()?.sequence_number)
    }
}

fn echo(mut stream: impl Read + Write) {
    let mut buf = [0_u8; 4096];
    loop {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(read) => {
                if stream.write_all(&buf[..read]).is_err() {
                    return;
                }
            }
        }
    }
}

/// Starts a TCP echo server and returns its port.
pub fn spawn_tcp_echo() -> u16 {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind echo listener");
    let port = listener.local_addr().expect("local addr").port();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            thread::spawn(move || echo(stream));
        }
    });
    port
}

/// Starts a filesystem socket echo server at `path`.
#[cfg(unix)]
pub fn spawn_unix_echo(path: &std::path::Path) {
    let listener = std::os::unix::net::UnixListener::bind(path).expect("bind unix listener");
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            thread::spawn(move || echo(stream));
        }
    });
}

/// Starts an HTTP server that answers every POST with its own body and
/// returns its port.
pub fn spawn_http_echo() -> u16 {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind http listener");
    let port = listener.local_addr().expect("local addr").port();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            thread::spawn(move || {
                let _ = serve_http(stream);
            });
        }
    });
    port
}

fn serve_http(stream: TcpStream) -> io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = stream;
    loop {
        let mut content_length = 0_usize;
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(());
        }
        loop {
            line.clear();
            reader.read_line(&mut line)?;
            let header = line.trim_end();
            if header.is_empty() {
                break;
            }
            if let Some((name, value)) = header.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
        }
        let mut body = vec![0; content_length];
        reader.read_exact(&mut body)?;
        write!(
            writer,
            "HTTP/1.1 200 OK\r\nContent-Type: application/x-thrift\r\nContent-Length: {}\r\n\r\n",
            body.len()
        )?;
        writer.write_all(&body)?;
        writer.flush()?;
    }
}

/// Response produced by [`FakeHost::dispatch`].
#[derive(Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

/// Minimal host framework: runs registered before-request hooks, the
/// handler, then teardown hooks.
#[derive(Default)]
pub struct FakeHost {
    before: Vec<BeforeRequestHook>,
    teardown: Vec<TeardownHook>,
}

impl RequestLifecycle for FakeHost {
    fn on_before_request(&mut self, hook: BeforeRequestHook) {
        self.before.push(hook);
    }

    fn on_teardown_request(&mut self, hook: TeardownHook) {
        self.teardown.push(hook);
    }
}

impl FakeHost {
    pub fn dispatch(&self, handler: impl FnOnce() -> String) -> Response {
        let response = match self.before.iter().try_for_each(|hook| hook()) {
            Ok(()) => Response {
                status: 200,
                body: handler(),
            },
            Err(error) => Response {
                status: error.status_code(),
                body: error.to_string(),
            },
        };
        for hook in &self.teardown {
            hook();
        }
        response
    }
}
