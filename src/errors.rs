use std::fmt::{self, Display};

use crate::{ParameterId, SlipError};

#[derive(Debug)]
pub enum ErrorKind {
    PacketTooShort(usize),
    LengthMismatch { declared: usize, actual: usize },
    UnsupportedFrameType(u8),
    UnsupportedParameter(ParameterId),
    InvalidParameter {
        parameter_id: ParameterId,
        inner: Box<Error>,
    },
    InvalidAddressMode(u8),
    InvalidNetworkState(u8),
    MissingAddress,
    PayloadTooLong(usize),
    InvalidHex(String),
    Slip(SlipError),
    Io(std::io::Error),
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::PacketTooShort(len) => write!(f, "packet too short: {} bytes", len),
            ErrorKind::LengthMismatch { declared, actual } => write!(
                f,
                "invalid frame length: declared {}, found {}",
                declared, actual
            ),
            ErrorKind::UnsupportedFrameType(frame_type) => {
                write!(f, "building frame type {:#04x} not supported", frame_type)
            }
            ErrorKind::UnsupportedParameter(parameter_id) => {
                write!(f, "parameter {} not supported for writing", parameter_id)
            }
            ErrorKind::InvalidParameter {
                parameter_id,
                inner,
            } => write!(f, "invalid parameter for ID {}: {}", parameter_id, inner),
            ErrorKind::InvalidAddressMode(mode) => write!(f, "invalid address mode: {}", mode),
            ErrorKind::InvalidNetworkState(state) => {
                write!(f, "invalid network state: {}", state)
            }
            ErrorKind::MissingAddress => write!(f, "no address given for destination"),
            ErrorKind::PayloadTooLong(len) => {
                write!(f, "payload of {} bytes does not fit a 16-bit length", len)
            }
            ErrorKind::InvalidHex(string) => write!(f, "invalid hex string: {:?}", string),
            ErrorKind::Slip(error) => write!(f, "SLIP error: {}", error),
            ErrorKind::Io(error) => write!(f, "IO error: {}", error),
        }
    }
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "deconz error: {}", self.kind)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(other: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io(other),
        }
    }
}

impl From<SlipError> for Error {
    fn from(other: SlipError) -> Self {
        Error {
            kind: ErrorKind::Slip(other),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self { kind }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
