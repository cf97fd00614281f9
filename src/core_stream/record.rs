// RFC 959 part 3.4.1 record structure.
//
// The wire form replaces each record terminator with an escape byte (0xFF)
// followed by a flag byte (bit 0 = end of record, bit 1 = end of file); a
// literal 0xFF data byte is doubled so it stays distinguishable from a
// marker.

use crate::core_stream::{DecodeState, StreamError};

const ESCAPE: u8 = 0xFF;
const EOR: u8 = 0x01;
const EOF: u8 = 0x02;

/// Encodes a byte stream into the record transmission structure.
///
/// The record terminator is matched as an exact byte sequence, so
/// `decode(encode(x)) == x` holds for every input, including inputs with
/// bare line-feed runs or embedded escape bytes.
pub struct RecordEncoder {
    terminator: Vec<u8>,
    matched: usize,
}

impl RecordEncoder {
    pub fn new() -> Self {
        Self::with_terminator(b"\r\n")
    }

    /// Terminators of one or two bytes are supported (CRLF or bare LF).
    pub fn with_terminator(terminator: &[u8]) -> Self {
        assert!(
            !terminator.is_empty() && terminator.len() <= 2 && !terminator.contains(&ESCAPE),
            "record terminator must be 1-2 non-escape bytes"
        );
        Self {
            terminator: terminator.to_vec(),
            matched: 0,
        }
    }

    pub fn encode_chunk(&mut self, input: &[u8], out: &mut Vec<u8>) {
        for &b in input {
            self.push_byte(b, out);
        }
    }

    /// Flushes any half-matched terminator and emits the end-of-file mark.
    pub fn finish(&mut self, out: &mut Vec<u8>) {
        if self.matched > 0 {
            let head = self.terminator[0];
            emit_literal(head, out);
            self.matched = 0;
        }
        out.push(ESCAPE);
        out.push(EOF);
    }

    fn push_byte(&mut self, b: u8, out: &mut Vec<u8>) {
        if self.matched > 0 && b != self.terminator[self.matched] {
            // The pending byte turned out to be plain data after all.
            let head = self.terminator[0];
            emit_literal(head, out);
            self.matched = 0;
        }
        if b == self.terminator[self.matched] {
            self.matched += 1;
            if self.matched == self.terminator.len() {
                out.push(ESCAPE);
                out.push(EOR);
                self.matched = 0;
            }
        } else {
            emit_literal(b, out);
        }
    }
}

fn emit_literal(b: u8, out: &mut Vec<u8>) {
    if b == ESCAPE {
        out.push(ESCAPE);
    }
    out.push(b);
}

/// Decodes the record transmission structure back into plain bytes.
pub struct RecordDecoder {
    terminator: Vec<u8>,
    in_escape: bool,
    done: bool,
}

impl RecordDecoder {
    pub fn new() -> Self {
        Self::with_terminator(b"\r\n")
    }

    pub fn with_terminator(terminator: &[u8]) -> Self {
        Self {
            terminator: terminator.to_vec(),
            in_escape: false,
            done: false,
        }
    }

    pub fn decode_chunk(
        &mut self,
        input: &[u8],
        out: &mut Vec<u8>,
    ) -> Result<DecodeState, StreamError> {
        for &b in input {
            if self.done {
                break;
            }
            if self.in_escape {
                self.in_escape = false;
                if b == ESCAPE {
                    out.push(ESCAPE);
                } else {
                    if b & EOR != 0 {
                        out.extend_from_slice(&self.terminator);
                    }
                    if b & EOF != 0 {
                        self.done = true;
                    }
                }
            } else if b == ESCAPE {
                self.in_escape = true;
            } else {
                out.push(b);
            }
        }
        Ok(if self.done {
            DecodeState::EndOfFile
        } else {
            DecodeState::More
        })
    }

    /// Checks that the input did not stop in the middle of an escape pair.
    pub fn finish(&self) -> Result<(), StreamError> {
        if self.in_escape {
            Err(StreamError::Corrupt("unterminated escape sequence"))
        } else {
            Ok(())
        }
    }
}

/// Encodes a whole buffer, including the closing end-of-file mark.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut enc = RecordEncoder::new();
    let mut out = Vec::with_capacity(data.len() + 2);
    enc.encode_chunk(data, &mut out);
    enc.finish(&mut out);
    out
}

/// Decodes a whole buffer produced by [`encode`].
pub fn decode(data: &[u8]) -> Result<Vec<u8>, StreamError> {
    let mut dec = RecordDecoder::new();
    let mut out = Vec::with_capacity(data.len());
    dec.decode_chunk(data, &mut out)?;
    dec.finish()?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_plain_records() {
        let data = b"first\r\nsecond\r\nthird\r\n";
        let wire = encode(data);
        assert_eq!(decode(&wire).unwrap(), data);
    }

    #[test]
    fn round_trip_with_escape_bytes() {
        let data = b"escape\xFFescape\r\nnext\xFF\xFF\r\n";
        let wire = encode(data);
        assert_eq!(decode(&wire).unwrap(), data);
    }

    #[test]
    fn round_trip_bare_line_feeds_and_stray_cr() {
        let data = b"a\n\nb\rc\r\nd";
        let wire = encode(data);
        assert_eq!(decode(&wire).unwrap(), data);
    }

    #[test]
    fn terminator_becomes_marker() {
        let wire = encode(b"ab\r\n");
        assert_eq!(wire, vec![b'a', b'b', 0xFF, 0x01, 0xFF, 0x02]);
    }

    #[test]
    fn literal_escape_is_doubled() {
        let wire = encode(&[0xFF]);
        assert_eq!(wire, vec![0xFF, 0xFF, 0xFF, 0x02]);
    }

    #[test]
    fn eof_mark_ends_the_stream() {
        // Bytes after the end-of-file mark are not part of the record stream.
        let mut dec = RecordDecoder::new();
        let mut out = Vec::new();
        let state = dec
            .decode_chunk(&[b'a', 0xFF, 0x02, b'z'], &mut out)
            .unwrap();
        assert_eq!(state, DecodeState::EndOfFile);
        assert_eq!(out, b"a");
    }

    #[test]
    fn combined_flags_expand_terminator_then_end() {
        let mut dec = RecordDecoder::new();
        let mut out = Vec::new();
        let state = dec.decode_chunk(&[b'a', 0xFF, 0x03], &mut out).unwrap();
        assert_eq!(state, DecodeState::EndOfFile);
        assert_eq!(out, b"a\r\n");
    }

    #[test]
    fn truncated_escape_is_corruption() {
        let mut dec = RecordDecoder::new();
        let mut out = Vec::new();
        dec.decode_chunk(&[b'a', 0xFF], &mut out).unwrap();
        assert!(matches!(dec.finish(), Err(StreamError::Corrupt(_))));
    }

    #[test]
    fn chunked_input_matches_whole_buffer() {
        let data = b"one\r\ntwo\xFFthree\r\n";
        let whole = encode(data);

        let mut enc = RecordEncoder::new();
        let mut wire = Vec::new();
        for piece in data.chunks(3) {
            enc.encode_chunk(piece, &mut wire);
        }
        enc.finish(&mut wire);
        assert_eq!(wire, whole);
    }
}
