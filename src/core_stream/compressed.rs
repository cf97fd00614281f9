// RFC 959 part 3.4.3 compressed structure.
//
// Token grammar, by the top bits of the lead byte:
//   0b0nnnnnnn             literal run, n data bytes follow
//   0b10nnnnnn <byte>      replicated byte, n copies
//   0b11nnnnnn             filler-byte run, n copies of the configured filler
//   0x00 <flags> [...]     escape: end-of-record, end-of-file, restart
//                          marker (u16 length + bytes) or an extended
//                          literal-run length (u16)
// A zero-count replica or filler token is a structural corruption.

use crate::core_stream::{DecodeState, StreamError, FLAG_EOF, FLAG_EOR, FLAG_RESTART_MARKER};

const ESCAPE_PREFIX: u8 = 0x00;
const TOKEN_REPLICA: u8 = 0x80;
const TOKEN_FILLER: u8 = 0xC0;
const MAX_RUN: usize = 31;
const MAX_LITERAL: usize = 127;
pub const DEFAULT_FILLER: u8 = b' ';

/// Run-length encoder for the compressed transmission structure.
pub struct CompressedEncoder {
    filler: u8,
    run_byte: u8,
    run_len: usize,
    literal: Vec<u8>,
}

impl CompressedEncoder {
    pub fn new() -> Self {
        Self::with_filler(DEFAULT_FILLER)
    }

    pub fn with_filler(filler: u8) -> Self {
        Self {
            filler,
            run_byte: 0,
            run_len: 0,
            literal: Vec::with_capacity(MAX_LITERAL),
        }
    }

    pub fn encode_chunk(&mut self, input: &[u8], out: &mut Vec<u8>) {
        for &b in input {
            if self.run_len > 0 && b == self.run_byte {
                self.run_len += 1;
                if self.run_len == MAX_RUN {
                    self.flush_run(out);
                }
            } else {
                self.flush_run(out);
                self.run_byte = b;
                self.run_len = 1;
            }
        }
    }

    pub fn finish(&mut self, out: &mut Vec<u8>) {
        self.flush_run(out);
        self.flush_literal(out);
    }

    fn flush_run(&mut self, out: &mut Vec<u8>) {
        match self.run_len {
            0 => {}
            1 if self.run_byte != self.filler => {
                self.literal.push(self.run_byte);
                if self.literal.len() == MAX_LITERAL {
                    self.flush_literal(out);
                }
            }
            n if self.run_byte == self.filler => {
                self.flush_literal(out);
                out.push(TOKEN_FILLER | n as u8);
            }
            n => {
                self.flush_literal(out);
                out.push(TOKEN_REPLICA | n as u8);
                out.push(self.run_byte);
            }
        }
        self.run_len = 0;
    }

    fn flush_literal(&mut self, out: &mut Vec<u8>) {
        if !self.literal.is_empty() {
            out.push(self.literal.len() as u8);
            out.append(&mut self.literal);
        }
    }
}

enum CompressedState {
    AtToken,
    Literal { remaining: usize },
    ReplicaByte { count: usize },
    EscapeFlags,
    EscapeLength { marker: bool, high: Option<u8> },
    Marker { remaining: usize, collected: Vec<u8> },
    Done,
}

/// Decoder for the compressed transmission structure.
pub struct CompressedDecoder {
    filler: u8,
    state: CompressedState,
}

impl CompressedDecoder {
    pub fn new() -> Self {
        Self::with_filler(DEFAULT_FILLER)
    }

    pub fn with_filler(filler: u8) -> Self {
        Self {
            filler,
            state: CompressedState::AtToken,
        }
    }

    pub fn decode_chunk(
        &mut self,
        input: &[u8],
        out: &mut Vec<u8>,
    ) -> Result<DecodeState, StreamError> {
        for &b in input {
            match &mut self.state {
                CompressedState::AtToken => {
                    if b == ESCAPE_PREFIX {
                        self.state = CompressedState::EscapeFlags;
                    } else if b & 0x80 == 0 {
                        self.state = CompressedState::Literal {
                            remaining: usize::from(b),
                        };
                    } else if b & 0xC0 == TOKEN_REPLICA {
                        let count = usize::from(b & 0x3F);
                        if count == 0 {
                            return Err(StreamError::Corrupt("zero-length replica run"));
                        }
                        self.state = CompressedState::ReplicaByte { count };
                    } else {
                        let count = usize::from(b & 0x3F);
                        if count == 0 {
                            return Err(StreamError::Corrupt("zero-length filler run"));
                        }
                        out.resize(out.len() + count, self.filler);
                    }
                }
                CompressedState::Literal { remaining } => {
                    out.push(b);
                    *remaining -= 1;
                    if *remaining == 0 {
                        self.state = CompressedState::AtToken;
                    }
                }
                CompressedState::ReplicaByte { count } => {
                    let count = *count;
                    out.resize(out.len() + count, b);
                    self.state = CompressedState::AtToken;
                }
                CompressedState::EscapeFlags => {
                    if b & FLAG_EOR != 0 {
                        out.push(b'\n');
                        self.state = CompressedState::AtToken;
                    } else if b & FLAG_EOF != 0 {
                        self.state = CompressedState::Done;
                    } else {
                        self.state = CompressedState::EscapeLength {
                            marker: b & FLAG_RESTART_MARKER != 0,
                            high: None,
                        };
                    }
                }
                CompressedState::EscapeLength { marker, high } => match high {
                    None => *high = Some(b),
                    Some(hi) => {
                        let count = usize::from(*hi) << 8 | usize::from(b);
                        if *marker {
                            if count == 0 {
                                return Err(StreamError::Corrupt("empty restart marker"));
                            }
                            self.state = CompressedState::Marker {
                                remaining: count,
                                collected: Vec::with_capacity(count),
                            };
                        } else if count == 0 {
                            self.state = CompressedState::AtToken;
                        } else {
                            self.state = CompressedState::Literal { remaining: count };
                        }
                    }
                },
                CompressedState::Marker {
                    remaining,
                    collected,
                } => {
                    collected.push(b);
                    *remaining -= 1;
                    if *remaining == 0 {
                        let marker = std::mem::take(collected);
                        self.state = CompressedState::AtToken;
                        return Err(StreamError::RestartMarker(marker));
                    }
                }
                CompressedState::Done => break,
            }
        }
        Ok(if matches!(self.state, CompressedState::Done) {
            DecodeState::EndOfFile
        } else {
            DecodeState::More
        })
    }

    /// The stream may only end on a token boundary.
    pub fn finish(&self) -> Result<(), StreamError> {
        match self.state {
            CompressedState::AtToken | CompressedState::Done => Ok(()),
            _ => Err(StreamError::Corrupt("token truncated")),
        }
    }
}

/// Encodes a whole buffer.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut enc = CompressedEncoder::new();
    let mut out = Vec::with_capacity(data.len());
    enc.encode_chunk(data, &mut out);
    enc.finish(&mut out);
    out
}

/// Decodes a whole buffer produced by [`encode`].
pub fn decode(data: &[u8]) -> Result<Vec<u8>, StreamError> {
    let mut dec = CompressedDecoder::new();
    let mut out = Vec::with_capacity(data.len());
    dec.decode_chunk(data, &mut out)?;
    dec.finish()?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filler_run_of_forty_uses_two_tokens() {
        let data = [DEFAULT_FILLER; 40];
        let wire = encode(&data);
        assert_eq!(wire, vec![TOKEN_FILLER | 31, TOKEN_FILLER | 9]);
        assert_eq!(decode(&wire).unwrap(), data);
    }

    #[test]
    fn unrepeated_bytes_become_one_literal_token() {
        let data = b"abcdefgh";
        let wire = encode(data);
        assert_eq!(wire[0], data.len() as u8);
        assert_eq!(wire.len(), data.len() + 1);
        assert_eq!(decode(&wire).unwrap(), data);
    }

    #[test]
    fn repeated_byte_becomes_replica_token() {
        let data = [b'x'; 7];
        let wire = encode(&data);
        assert_eq!(wire, vec![TOKEN_REPLICA | 7, b'x']);
        assert_eq!(decode(&wire).unwrap(), data);
    }

    #[test]
    fn round_trip_mixed_input() {
        let mut data = Vec::new();
        data.extend_from_slice(b"header");
        data.extend_from_slice(&[DEFAULT_FILLER; 33]);
        data.extend_from_slice(&[0u8; 5]);
        data.extend_from_slice(b"trailer");
        data.extend_from_slice(&[0xAB; 64]);
        assert_eq!(decode(&encode(&data)).unwrap(), data);
    }

    #[test]
    fn long_literal_spills_into_multiple_tokens() {
        // no two adjacent bytes repeat and no filler bytes, 446 bytes total
        let data: Vec<u8> = (0x21..=0xFFu8).chain(0x21..=0xFFu8).collect();
        let wire = encode(&data);
        assert_eq!(decode(&wire).unwrap(), data);
        assert_eq!(wire[0] as usize, MAX_LITERAL);
    }

    #[test]
    fn zero_count_tokens_are_corruption() {
        assert!(matches!(
            decode(&[TOKEN_REPLICA]),
            Err(StreamError::Corrupt(_))
        ));
        assert!(matches!(
            decode(&[TOKEN_FILLER]),
            Err(StreamError::Corrupt(_))
        ));
    }

    #[test]
    fn escape_eof_ends_the_stream() {
        let wire = [2, b'h', b'i', ESCAPE_PREFIX, FLAG_EOF];
        let mut dec = CompressedDecoder::new();
        let mut out = Vec::new();
        let state = dec.decode_chunk(&wire, &mut out).unwrap();
        assert_eq!(state, DecodeState::EndOfFile);
        assert_eq!(out, b"hi");
    }

    #[test]
    fn extended_literal_length_is_honoured() {
        let mut wire = vec![ESCAPE_PREFIX, 0x00, 0x01, 0x2C];
        wire.extend_from_slice(&[b'y'; 300]);
        assert_eq!(decode(&wire).unwrap(), vec![b'y'; 300]);
    }

    #[test]
    fn restart_marker_surfaces_as_signal() {
        let wire = [2, b'o', b'k', ESCAPE_PREFIX, FLAG_RESTART_MARKER, 0, 2, 9, 8];
        let mut dec = CompressedDecoder::new();
        let mut out = Vec::new();
        match dec.decode_chunk(&wire, &mut out) {
            Err(StreamError::RestartMarker(m)) => assert_eq!(m, vec![9, 8]),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(out, b"ok");
    }

    #[test]
    fn truncated_token_is_corruption() {
        let mut dec = CompressedDecoder::new();
        let mut out = Vec::new();
        dec.decode_chunk(&[5, b'a'], &mut out).unwrap();
        assert!(matches!(dec.finish(), Err(StreamError::Corrupt(_))));
    }
}
