//! SLIP framing (RFC 1055) as spoken by the adapter.
//!
//! Packets on the wire are delimited by `END` on both sides. `END` and `ESC` bytes inside a
//! packet are replaced by two-byte escape sequences.

use std::fmt::{self, Display};

pub const END: u8 = 0xC0;
pub const ESC: u8 = 0xDB;
pub const ESC_END: u8 = 0xDC;
pub const ESC_ESC: u8 = 0xDD;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SlipError {
    /// More than the configured number of bytes arrived before an `END`.
    Overflow(usize),
    MismatchedCrc { expected: u16, found: u16 },
}

impl Display for SlipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlipError::Overflow(max_size) => {
                write!(f, "packet exceeds maximum size of {} bytes", max_size)
            }
            SlipError::MismatchedCrc { expected, found } => write!(
                f,
                "CRC mismatch: expected {:04x}, found {:04x}",
                expected, found
            ),
        }
    }
}

impl std::error::Error for SlipError {}

/// Escapes `packet` and surrounds it with `END` bytes.
pub fn encapsulate(packet: &[u8]) -> Vec<u8> {
    // Worst case every byte is escaped.
    let mut encoded = Vec::with_capacity(packet.len() * 2 + 2);
    encoded.push(END);
    for byte in packet {
        match *byte {
            END => {
                encoded.push(ESC);
                encoded.push(ESC_END);
            }
            ESC => {
                encoded.push(ESC);
                encoded.push(ESC_ESC);
            }
            byte => encoded.push(byte),
        }
    }
    encoded.push(END);
    encoded
}

/// Incremental decoder for a SLIP byte stream.
///
/// Chunks may be split anywhere, including between an `ESC` and the byte it escapes. Callers
/// must size `max_size` to the largest packet the link carries: bytes beyond it are dropped up
/// to the next `END`, which then reports `SlipError::Overflow` instead of a packet.
#[derive(Debug)]
pub struct Deframer {
    buffer: Vec<u8>,
    max_size: usize,
    escaping: bool,
    overflowed: bool,
}

impl Deframer {
    pub fn new(max_size: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(max_size),
            max_size,
            escaping: false,
            overflowed: false,
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Feeds a chunk of the stream, returning every packet completed by it, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<Vec<u8>, SlipError>> {
        let mut packets = Vec::new();

        for byte in chunk {
            let mut byte = *byte;

            if self.escaping {
                // Anything other than ESC_END or ESC_ESC is a protocol violation, which we
                // tolerate by keeping the byte as-is.
                byte = match byte {
                    ESC_END => END,
                    ESC_ESC => ESC,
                    other => other,
                };
                self.escaping = false;
                self.push(byte);
                continue;
            }

            match byte {
                END => {
                    if self.overflowed {
                        packets.push(Err(SlipError::Overflow(self.max_size)));
                        self.reset();
                    } else if !self.buffer.is_empty() {
                        let packet = std::mem::replace(
                            &mut self.buffer,
                            Vec::with_capacity(self.max_size),
                        );
                        trace!("deframed = {:?}", packet);
                        packets.push(Ok(packet));
                    }
                    // Skip back-to-back END bytes.
                }
                ESC => self.escaping = true,
                byte => self.push(byte),
            }
        }

        packets
    }

    fn push(&mut self, byte: u8) {
        if self.buffer.len() >= self.max_size {
            self.overflowed = true;
            return;
        }
        self.buffer.push(byte);
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.escaping = false;
        self.overflowed = false;
    }
}
