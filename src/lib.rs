//! Host-side codec for the deCONZ serial protocol spoken by ConBee/RaspBee adapters.
//!
//! [`Session`] turns [`Request`]s into SLIP-encapsulated bytes and turns the adapter's byte
//! stream back into [`ResponseFrame`]s. The [`transport`] module drives the same halves over an
//! async byte stream.

mod aps;
mod checksum;
mod errors;
mod parameters;
mod protocol;
mod session;
mod slip;
mod types;

pub mod transport;

#[macro_use]
extern crate log;

pub use crate::aps::{
    ApsDataConfirm, ApsDataIndication, ApsDataRequest, Destination, DestinationAddress,
    SourceAddress,
};
pub use crate::checksum::{checksum, verify};
pub use crate::errors::{Error, ErrorKind, Result};
pub use crate::parameters::{NetworkKey, Parameter, ParameterId, PARAMETERS};
pub use crate::protocol::{
    Direction, Frame, FrameType, Request, RequestFrame, Response, ResponseFrame, HEADER_LEN,
};
pub use crate::session::{
    Decoder, Encoder, Event, IdCounter, Options, Session, DEFAULT_MAX_PACKET_SIZE,
};
pub use crate::slip::{encapsulate, Deframer, SlipError};
pub use crate::types::{
    swap_hex, ClusterId, DeviceState, Endpoint, ExtendedAddress, NetworkState, PanId, Platform,
    ProfileId, RequestId, SequenceId, ShortAddress, Status, Version,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

pub trait ReadWire: Sized {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read;
}

pub trait WriteWire {
    fn write_wire<W>(self, w: &mut W) -> Result<()>
    where
        W: Write;
}

impl ReadWire for u8 {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        Ok(r.read_u8()?)
    }
}

impl WriteWire for u8 {
    fn write_wire<W>(self, w: &mut W) -> Result<()>
    where
        W: Write,
    {
        w.write_u8(self)?;
        Ok(())
    }
}

impl ReadWire for i8 {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        Ok(r.read_i8()?)
    }
}

impl ReadWire for u16 {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        Ok(r.read_u16::<LittleEndian>()?)
    }
}

impl WriteWire for u16 {
    fn write_wire<W>(self, w: &mut W) -> Result<()>
    where
        W: Write,
    {
        w.write_u16::<LittleEndian>(self)?;
        Ok(())
    }
}

impl ReadWire for u32 {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        Ok(r.read_u32::<LittleEndian>()?)
    }
}

impl WriteWire for u32 {
    fn write_wire<W>(self, w: &mut W) -> Result<()>
    where
        W: Write,
    {
        w.write_u32::<LittleEndian>(self)?;
        Ok(())
    }
}

impl ReadWire for u64 {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        Ok(r.read_u64::<LittleEndian>()?)
    }
}

impl WriteWire for u64 {
    fn write_wire<W>(self, w: &mut W) -> Result<()>
    where
        W: Write,
    {
        w.write_u64::<LittleEndian>(self)?;
        Ok(())
    }
}

pub trait ReadWireExt {
    fn read_wire<T>(&mut self) -> Result<T>
    where
        T: ReadWire;

    /// Reads exactly `len` bytes.
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>>;

    /// Reads everything left.
    fn read_remaining(&mut self) -> Result<Vec<u8>>;
}

impl<R> ReadWireExt for R
where
    R: Read,
{
    fn read_wire<T>(&mut self) -> Result<T>
    where
        T: ReadWire,
    {
        T::read_wire(self)
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut bytes = vec![0; len];
        self.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    fn read_remaining(&mut self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

pub trait WriteWireExt {
    fn write_wire<T>(&mut self, value: T) -> Result<()>
    where
        T: WriteWire;
}

impl<W> WriteWireExt for W
where
    W: Write,
{
    fn write_wire<T>(&mut self, value: T) -> Result<()>
    where
        T: WriteWire,
    {
        value.write_wire(self)
    }
}
