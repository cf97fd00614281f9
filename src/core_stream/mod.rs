// RFC 959 transmission structure codecs (record, block, compressed).
//
// The codecs are pure byte transforms: they know nothing about sockets,
// sessions or files, and every one of them can be driven chunk by chunk so
// a transfer can feed them whatever the data connection delivers.
pub mod block;
pub mod compressed;
pub mod record;

use thiserror::Error;

/// Escape/descriptor flag bits shared by the three structures.
pub const FLAG_EOR: u8 = 0x80;
pub const FLAG_EOF: u8 = 0x40;
pub const FLAG_RESTART_MARKER: u8 = 0x10;

/// Errors raised while decoding a structured stream.
///
/// A restart marker is an out-of-band control event, not payload: it aborts
/// the current decode so the caller can react to it, and must never be
/// mistaken for data bytes or for a clean end of stream.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("restart marker detected ({} bytes)", .0.len())]
    RestartMarker(Vec<u8>),

    #[error("structure corruption detected ({0})")]
    Corrupt(&'static str),
}

/// Outcome of feeding a chunk into a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    /// The decoder is ready for more input.
    More,
    /// The end-of-file mark was seen; the logical stream is complete.
    EndOfFile,
}
