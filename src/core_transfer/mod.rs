// The transfer engine: one cancellable background copy between a file and
// the data channel, spawned onto the shared runtime pool so the control
// loop stays responsive to ABOR and further commands.

use crate::core_ftpcommand::reply::{send_reply, Reply};
use crate::core_stream::record::{RecordDecoder, RecordEncoder};
use crate::core_stream::{DecodeState, StreamError};
use crate::session::{ControlWriter, FileStructure, TransferType};
use log::{debug, error, info};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    Retrieve,
    Store,
}

#[derive(Error, Debug)]
enum CopyError {
    #[error("transfer cancelled")]
    Cancelled,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Stream(#[from] StreamError),
}

/// Everything a copy task needs to run.
pub struct TransferSpec {
    pub direction: TransferDirection,
    pub file: File,
    pub file_name: String,
    pub transfer_type: TransferType,
    pub structure: FileStructure,
    /// ASCII-mode files on disk use bare LF line endings.
    pub ascii_lf_on_disk: bool,
    pub buffer_size: usize,
}

/// Handle to an in-flight transfer, owned by the session that started it.
///
/// The session only reads the progress counter; the copy task is its sole
/// writer. Liveness of the join handle enforces "at most one transfer per
/// session".
pub struct TransferHandle {
    progress: Arc<AtomicU64>,
    error: Arc<AtomicBool>,
    cancel: Arc<AtomicBool>,
    join: JoinHandle<()>,
}

impl TransferHandle {
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Requests cooperative cancellation; the copy task observes the flag
    /// on its next chunk.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn bytes_processed(&self) -> u64 {
        self.progress.load(Ordering::Relaxed)
    }

    pub fn has_error(&self) -> bool {
        self.error.load(Ordering::Relaxed)
    }
}

/// Spawns one copy task onto the shared pool.
///
/// The task owns the data stream and closes it exactly once, in every
/// termination path; on success it emits the detailed completion reply
/// under the session write lock, on error or cancellation the
/// data-connection-abort reply.
pub fn spawn_transfer(writer: ControlWriter, stream: TcpStream, spec: TransferSpec) -> TransferHandle {
    let progress = Arc::new(AtomicU64::new(0));
    let error = Arc::new(AtomicBool::new(false));
    let cancel = Arc::new(AtomicBool::new(false));

    let task_progress = Arc::clone(&progress);
    let task_error = Arc::clone(&error);
    let task_cancel = Arc::clone(&cancel);

    let join = tokio::spawn(async move {
        let file_name = spec.file_name.clone();
        let started = Instant::now();
        let mut stream = stream;
        let result = run_copy(&mut stream, spec, &task_progress, &task_cancel).await;

        if let Err(e) = stream.shutdown().await {
            debug!("Could not shut down data stream: {}", e);
        }

        match result {
            Ok(bytes) => {
                let elapsed = started.elapsed().as_secs_f64().max(0.001);
                info!("Completed file transmission of {}", file_name);
                let reply = Reply::TransferCompletedDetailed {
                    bytes,
                    speed: bytes as f64 / elapsed,
                    name: file_name,
                };
                if let Err(e) = send_reply(&writer, &reply).await {
                    debug!("Send error: {}", e);
                }
            }
            Err(CopyError::Cancelled) => {
                info!("Transfer of {} cancelled", file_name);
                if let Err(e) = send_reply(&writer, &Reply::AbortDataConnection).await {
                    debug!("Send error: {}", e);
                }
            }
            Err(e) => {
                error!("Transfer of {} failed: {}", file_name, e);
                task_error.store(true, Ordering::Relaxed);
                if let Err(e) = send_reply(&writer, &Reply::AbortDataConnection).await {
                    debug!("Send error: {}", e);
                }
            }
        }
    });

    TransferHandle {
        progress,
        error,
        cancel,
        join,
    }
}

async fn run_copy(
    stream: &mut TcpStream,
    spec: TransferSpec,
    progress: &AtomicU64,
    cancel: &AtomicBool,
) -> Result<u64, CopyError> {
    let TransferSpec {
        direction,
        mut file,
        transfer_type,
        structure,
        ascii_lf_on_disk,
        buffer_size,
        ..
    } = spec;

    let ascii = transfer_type == TransferType::Ascii;
    let mut converter = AsciiConverter::new(ascii_lf_on_disk);
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut scratch = Vec::new();
    let mut wire = Vec::new();
    let mut total = 0u64;

    match direction {
        TransferDirection::Retrieve => {
            let mut encoder = match structure {
                FileStructure::Record => Some(RecordEncoder::new()),
                FileStructure::File => None,
            };
            loop {
                if cancel.load(Ordering::Relaxed) {
                    return Err(CopyError::Cancelled);
                }
                let n = file.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                let payload: &[u8] = if ascii {
                    scratch.clear();
                    converter.to_wire(&buf[..n], &mut scratch);
                    &scratch
                } else {
                    &buf[..n]
                };
                match encoder.as_mut() {
                    Some(enc) => {
                        wire.clear();
                        enc.encode_chunk(payload, &mut wire);
                        stream.write_all(&wire).await?;
                    }
                    None => stream.write_all(payload).await?,
                }
                total += n as u64;
                progress.fetch_add(n as u64, Ordering::Relaxed);
            }
            if let Some(enc) = encoder.as_mut() {
                wire.clear();
                enc.finish(&mut wire);
                stream.write_all(&wire).await?;
            }
            stream.flush().await?;
        }
        TransferDirection::Store => {
            let mut decoder = match structure {
                FileStructure::Record => Some(RecordDecoder::new()),
                FileStructure::File => None,
            };
            loop {
                if cancel.load(Ordering::Relaxed) {
                    return Err(CopyError::Cancelled);
                }
                let n = stream.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                let mut done = false;
                let payload: &[u8] = match decoder.as_mut() {
                    Some(dec) => {
                        wire.clear();
                        done = dec.decode_chunk(&buf[..n], &mut wire)? == DecodeState::EndOfFile;
                        &wire
                    }
                    None => &buf[..n],
                };
                let local: &[u8] = if ascii {
                    scratch.clear();
                    converter.to_local(payload, &mut scratch);
                    &scratch
                } else {
                    payload
                };
                file.write_all(local).await?;
                total += n as u64;
                progress.fetch_add(n as u64, Ordering::Relaxed);
                if done {
                    break;
                }
            }
            if let Some(dec) = decoder.as_ref() {
                dec.finish()?;
            }
            if ascii {
                scratch.clear();
                converter.finish_local(&mut scratch);
                file.write_all(&scratch).await?;
            }
            file.flush().await?;
        }
    }
    Ok(total)
}

/// CRLF <-> local line-convention conversion for ASCII-mode transfers.
///
/// Carries a pending CR across chunk boundaries so a CRLF split between two
/// reads still converts correctly.
pub struct AsciiConverter {
    lf_on_disk: bool,
    pending_cr: bool,
}

impl AsciiConverter {
    pub fn new(lf_on_disk: bool) -> Self {
        Self {
            lf_on_disk,
            pending_cr: false,
        }
    }

    /// Wire (CRLF) to the on-disk convention.
    pub fn to_local(&mut self, input: &[u8], out: &mut Vec<u8>) {
        if !self.lf_on_disk {
            out.extend_from_slice(input);
            return;
        }
        for &b in input {
            if self.pending_cr {
                self.pending_cr = false;
                if b == b'\n' {
                    out.push(b'\n');
                    continue;
                }
                out.push(b'\r');
            }
            if b == b'\r' {
                self.pending_cr = true;
            } else {
                out.push(b);
            }
        }
    }

    /// Flushes a dangling CR once the wire stream ended.
    pub fn finish_local(&mut self, out: &mut Vec<u8>) {
        if self.pending_cr {
            out.push(b'\r');
            self.pending_cr = false;
        }
    }

    /// On-disk convention to the wire (CRLF).
    pub fn to_wire(&mut self, input: &[u8], out: &mut Vec<u8>) {
        if !self.lf_on_disk {
            out.extend_from_slice(input);
            return;
        }
        for &b in input {
            if b == b'\n' {
                out.extend_from_slice(b"\r\n");
            } else {
                out.push(b);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    async fn tcp_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr);
        let server = listener.accept();
        let (client, server) = tokio::join!(client, server);
        (client.unwrap(), server.unwrap().0)
    }

    #[test]
    fn ascii_conversion_round_trips_split_crlf() {
        let mut conv = AsciiConverter::new(true);
        let mut out = Vec::new();
        conv.to_local(b"line one\r", &mut out);
        conv.to_local(b"\nline two\r\n", &mut out);
        conv.finish_local(&mut out);
        assert_eq!(out, b"line one\nline two\n");

        let mut conv = AsciiConverter::new(true);
        let mut wire = Vec::new();
        conv.to_wire(b"line one\nline two\n", &mut wire);
        assert_eq!(wire, b"line one\r\nline two\r\n");
    }

    #[test]
    fn ascii_conversion_keeps_lone_cr() {
        let mut conv = AsciiConverter::new(true);
        let mut out = Vec::new();
        conv.to_local(b"a\rb\r", &mut out);
        conv.finish_local(&mut out);
        assert_eq!(out, b"a\rb\r");
    }

    #[test]
    fn crlf_on_disk_passes_through() {
        let mut conv = AsciiConverter::new(false);
        let mut out = Vec::new();
        conv.to_local(b"one\r\ntwo\r\n", &mut out);
        assert_eq!(out, b"one\r\ntwo\r\n");
    }

    #[tokio::test]
    async fn retrieve_binary_streams_file_and_reports_completion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.bin");
        let content = vec![7u8; 20000];
        std::fs::write(&path, &content).unwrap();

        let (control_client, control_server) = tcp_pair().await;
        let (mut data_client, data_server) = tcp_pair().await;
        drop(control_client.into_split().0);
        let writer = Arc::new(Mutex::new(control_server.into_split().1));

        let spec = TransferSpec {
            direction: TransferDirection::Retrieve,
            file: File::open(&path).await.unwrap(),
            file_name: "payload.bin".to_string(),
            transfer_type: TransferType::Binary,
            structure: FileStructure::File,
            ascii_lf_on_disk: true,
            buffer_size: 4096,
        };
        let handle = spawn_transfer(writer, data_server, spec);

        let mut received = Vec::new();
        data_client.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, content);

        while !handle.is_finished() {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(handle.bytes_processed(), content.len() as u64);
        assert!(!handle.has_error());
    }

    #[tokio::test]
    async fn store_ascii_converts_line_endings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.txt");

        let (control_client, control_server) = tcp_pair().await;
        let (mut data_client, data_server) = tcp_pair().await;
        drop(control_client.into_split().0);
        let writer = Arc::new(Mutex::new(control_server.into_split().1));

        let spec = TransferSpec {
            direction: TransferDirection::Store,
            file: File::create(&path).await.unwrap(),
            file_name: "upload.txt".to_string(),
            transfer_type: TransferType::Ascii,
            structure: FileStructure::File,
            ascii_lf_on_disk: true,
            buffer_size: 4096,
        };
        let handle = spawn_transfer(writer, data_server, spec);

        data_client.write_all(b"alpha\r\nbeta\r\n").await.unwrap();
        data_client.shutdown().await.unwrap();

        while !handle.is_finished() {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert!(!handle.has_error());
        assert_eq!(std::fs::read(&path).unwrap(), b"alpha\nbeta\n");
    }
}
