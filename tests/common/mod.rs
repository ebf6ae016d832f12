//! Shared mock peers and frame helpers for integration tests
#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use fdfs_client::protocol::{
    Command, FrameHeader, GROUP_NAME_MAX_LEN, HEADER_SIZE, IP_ADDRESS_LEN,
};

/// Initialize test logging once per process
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One request frame received by a mock peer
pub struct Frame {
    pub header: FrameHeader,
    pub payload: Vec<u8>,
}

/// Read one frame; None on clean or dirty disconnect
pub fn read_frame(stream: &mut TcpStream) -> Option<Frame> {
    let mut head = [0u8; HEADER_SIZE];
    let mut filled = 0;
    while filled < HEADER_SIZE {
        match stream.read(&mut head[filled..]) {
            Ok(0) | Err(_) => return None,
            Ok(n) => filled += n,
        }
    }
    let header = FrameHeader::decode(&head).ok()?;
    let mut payload = vec![0u8; header.payload_len as usize];
    stream.read_exact(&mut payload).ok()?;
    Some(Frame { header, payload })
}

/// Write a response frame with the given status and payload
pub fn write_reply(stream: &mut TcpStream, status: u8, payload: &[u8]) {
    let mut header = FrameHeader::new(Command::Response, payload.len() as u64);
    header.status = status;
    header.write_to(stream).expect("write reply header");
    stream.write_all(payload).expect("write reply payload");
}

/// Whether a frame is a liveness probe; answers it when it is
pub fn answer_probe(stream: &mut TcpStream, frame: &Frame) -> bool {
    if frame.header.command == Command::ActiveTest.as_i8() {
        write_reply(stream, 0, &[]);
        return true;
    }
    false
}

/// Zero-pad (or truncate) a string to a fixed-width wire field
pub fn fixed_str(value: &str, width: usize) -> Vec<u8> {
    let mut bytes = value.as_bytes().to_vec();
    bytes.resize(width, 0);
    bytes.truncate(width);
    bytes
}

/// Build a tracker storage-server reply body
pub fn storage_server_body(group: &str, ip: &str, port: u16, store_path_index: u8) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&fixed_str(group, GROUP_NAME_MAX_LEN));
    body.extend_from_slice(&fixed_str(ip, IP_ADDRESS_LEN));
    body.extend_from_slice(&(port as u64).to_be_bytes());
    body.push(store_path_index);
    body
}

/// Build an upload reply body: group (16) + remote filename
pub fn upload_reply_body(group: &str, remote_filename: &str) -> Vec<u8> {
    let mut body = fixed_str(group, GROUP_NAME_MAX_LEN);
    body.extend_from_slice(remote_filename.as_bytes());
    body
}

/// A TCP peer serving each accepted connection with `handler` on its own
/// thread until the process exits
pub struct MockPeer {
    addr: SocketAddr,
}

impl MockPeer {
    pub fn spawn<F>(handler: F) -> Self
    where
        F: Fn(&mut TcpStream) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock peer");
        let addr = listener.local_addr().expect("local addr");
        let handler = Arc::new(handler);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let handler = Arc::clone(&handler);
                thread::spawn(move || handler(&mut stream));
            }
        });
        Self { addr }
    }

    /// Peer that answers probes and serves every other frame with `serve`
    pub fn spawn_frames<F>(serve: F) -> Self
    where
        F: Fn(&mut TcpStream, Frame) + Send + Sync + 'static,
    {
        Self::spawn(move |stream| {
            while let Some(frame) = read_frame(stream) {
                if answer_probe(stream, &frame) {
                    continue;
                }
                serve(stream, frame);
            }
        })
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn hosts(&self) -> Vec<String> {
        vec![self.host()]
    }
}
