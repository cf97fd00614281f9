// RFC 959 part 3.4.2 block structure.
//
// Every block starts with a descriptor byte followed by a big-endian 16-bit
// byte count. A descriptor with the restart-marker bit carries the marker
// bytes instead of payload and is surfaced to the caller as a signal, never
// as data.

use crate::core_stream::{DecodeState, StreamError, FLAG_EOF, FLAG_EOR, FLAG_RESTART_MARKER};

const MAX_BLOCK: usize = 0xFFFF;

/// Frames a byte stream into blocks, closing with an end-of-file block.
pub struct BlockEncoder;

impl BlockEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn encode_chunk(&mut self, input: &[u8], out: &mut Vec<u8>) {
        for chunk in input.chunks(MAX_BLOCK) {
            out.push(0);
            out.extend_from_slice(&(chunk.len() as u16).to_be_bytes());
            out.extend_from_slice(chunk);
        }
    }

    pub fn finish(&mut self, out: &mut Vec<u8>) {
        out.push(FLAG_EOF);
        out.extend_from_slice(&0u16.to_be_bytes());
    }

    /// Emits a restart-marker block.
    pub fn encode_restart_marker(&mut self, marker: &[u8], out: &mut Vec<u8>) {
        assert!(
            !marker.is_empty() && marker.len() <= MAX_BLOCK,
            "restart marker must be 1-65535 bytes"
        );
        out.push(FLAG_RESTART_MARKER);
        out.extend_from_slice(&(marker.len() as u16).to_be_bytes());
        out.extend_from_slice(marker);
    }
}

enum BlockState {
    Descriptor,
    Length { descriptor: u8, high: Option<u8> },
    Payload { descriptor: u8, remaining: usize },
    Marker { remaining: usize, collected: Vec<u8> },
    Done,
}

/// Unframes a block-structured stream.
pub struct BlockDecoder {
    state: BlockState,
}

impl BlockDecoder {
    pub fn new() -> Self {
        Self {
            state: BlockState::Descriptor,
        }
    }

    pub fn decode_chunk(
        &mut self,
        input: &[u8],
        out: &mut Vec<u8>,
    ) -> Result<DecodeState, StreamError> {
        for &b in input {
            match &mut self.state {
                BlockState::Descriptor => {
                    self.state = BlockState::Length {
                        descriptor: b,
                        high: None,
                    };
                }
                BlockState::Length { descriptor, high } => match high {
                    None => *high = Some(b),
                    Some(hi) => {
                        let descriptor = *descriptor;
                        let count = usize::from(*hi) << 8 | usize::from(b);
                        if descriptor & FLAG_RESTART_MARKER != 0 {
                            if count == 0 {
                                return Err(StreamError::Corrupt("empty restart marker"));
                            }
                            self.state = BlockState::Marker {
                                remaining: count,
                                collected: Vec::with_capacity(count),
                            };
                        } else {
                            self.state = BlockState::Payload {
                                descriptor,
                                remaining: count,
                            };
                            self.end_of_payload_if_drained(out)?;
                        }
                    }
                },
                BlockState::Payload { remaining, .. } => {
                    out.push(b);
                    *remaining -= 1;
                    self.end_of_payload_if_drained(out)?;
                }
                BlockState::Marker {
                    remaining,
                    collected,
                } => {
                    collected.push(b);
                    *remaining -= 1;
                    if *remaining == 0 {
                        let marker = std::mem::take(collected);
                        self.state = BlockState::Descriptor;
                        return Err(StreamError::RestartMarker(marker));
                    }
                }
                BlockState::Done => break,
            }
            if matches!(self.state, BlockState::Done) {
                break;
            }
        }
        Ok(if matches!(self.state, BlockState::Done) {
            DecodeState::EndOfFile
        } else {
            DecodeState::More
        })
    }

    /// A block stream may only end on a block boundary after the EOF block.
    pub fn finish(&self) -> Result<(), StreamError> {
        match self.state {
            BlockState::Done => Ok(()),
            BlockState::Descriptor => Err(StreamError::Corrupt("missing end-of-file block")),
            _ => Err(StreamError::Corrupt("block truncated")),
        }
    }

    fn end_of_payload_if_drained(&mut self, out: &mut Vec<u8>) -> Result<(), StreamError> {
        if let BlockState::Payload {
            descriptor,
            remaining: 0,
        } = self.state
        {
            if descriptor & FLAG_EOR != 0 {
                out.extend_from_slice(b"\r\n");
            }
            self.state = if descriptor & FLAG_EOF != 0 {
                BlockState::Done
            } else {
                BlockState::Descriptor
            };
        }
        Ok(())
    }
}

/// Encodes a whole buffer, including the closing end-of-file block.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut enc = BlockEncoder::new();
    let mut out = Vec::with_capacity(data.len() + 6);
    enc.encode_chunk(data, &mut out);
    enc.finish(&mut out);
    out
}

/// Decodes a whole buffer produced by [`encode`].
pub fn decode(data: &[u8]) -> Result<Vec<u8>, StreamError> {
    let mut dec = BlockDecoder::new();
    let mut out = Vec::with_capacity(data.len());
    dec.decode_chunk(data, &mut out)?;
    dec.finish()?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_small_payload() {
        let data = b"block structured payload";
        assert_eq!(decode(&encode(data)).unwrap(), data);
    }

    #[test]
    fn round_trip_oversized_payload_splits_blocks() {
        let data = vec![0x5A; MAX_BLOCK + 17];
        let wire = encode(&data);
        // one full block, one 17-byte block, one EOF block
        assert_eq!(wire.len(), data.len() + 3 * 3);
        assert_eq!(decode(&wire).unwrap(), data);
    }

    #[test]
    fn restart_marker_surfaces_as_signal_not_payload() {
        let mut enc = BlockEncoder::new();
        let mut wire = Vec::new();
        enc.encode_chunk(b"data", &mut wire);
        enc.encode_restart_marker(b"MARK", &mut wire);

        let mut dec = BlockDecoder::new();
        let mut out = Vec::new();
        let err = dec.decode_chunk(&wire, &mut out).unwrap_err();
        match err {
            StreamError::RestartMarker(marker) => assert_eq!(marker, b"MARK"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(out, b"data");
    }

    #[test]
    fn end_of_record_flag_expands_terminator() {
        let wire = [FLAG_EOR, 0, 3, b'a', b'b', b'c', FLAG_EOF, 0, 0];
        let mut dec = BlockDecoder::new();
        let mut out = Vec::new();
        let state = dec.decode_chunk(&wire, &mut out).unwrap();
        assert_eq!(state, DecodeState::EndOfFile);
        assert_eq!(out, b"abc\r\n");
    }

    #[test]
    fn truncated_header_is_corruption() {
        let mut dec = BlockDecoder::new();
        let mut out = Vec::new();
        dec.decode_chunk(&[0, 0], &mut out).unwrap();
        assert!(matches!(dec.finish(), Err(StreamError::Corrupt(_))));
    }

    #[test]
    fn missing_eof_block_is_corruption() {
        let mut dec = BlockDecoder::new();
        let mut out = Vec::new();
        dec.decode_chunk(&[0, 0, 1, b'x'], &mut out).unwrap();
        assert!(matches!(dec.finish(), Err(StreamError::Corrupt(_))));
    }

    #[test]
    fn decoding_resumes_after_restart_marker() {
        let mut enc = BlockEncoder::new();
        let mut wire = Vec::new();
        enc.encode_restart_marker(&[1, 2], &mut wire);
        enc.encode_chunk(b"tail", &mut wire);
        enc.finish(&mut wire);

        let mut dec = BlockDecoder::new();
        let mut out = Vec::new();
        let consumed = match dec.decode_chunk(&wire, &mut out) {
            Err(StreamError::RestartMarker(m)) => {
                assert_eq!(m, vec![1, 2]);
                // descriptor + length + marker bytes
                3 + m.len()
            }
            other => panic!("unexpected result: {other:?}"),
        };
        let state = dec.decode_chunk(&wire[consumed..], &mut out).unwrap();
        assert_eq!(state, DecodeState::EndOfFile);
        assert_eq!(out, b"tail");
    }
}
