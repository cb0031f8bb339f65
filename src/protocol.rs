use std::convert::TryFrom;
use std::fmt::{self, Display};
use std::io::{Cursor, Read};

use crate::{
    ApsDataConfirm, ApsDataIndication, ApsDataRequest, DeviceState, Error, ErrorKind,
    NetworkState, Parameter, ParameterId, ReadWireExt, RequestId, Result, SequenceId,
    Status, Version, WriteWireExt,
};

/// Type, sequence ID, reserved/status byte and 16-bit frame length.
pub const HEADER_LEN: usize = 5;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FrameType {
    ApsDataConfirm,
    DeviceState,
    ChangeNetworkState,
    ReadParameter,
    WriteParameter,
    Version,
    DeviceStateChanged,
    ApsDataRequest,
    ApsDataIndication,
}

impl From<FrameType> for u8 {
    fn from(frame_type: FrameType) -> u8 {
        match frame_type {
            FrameType::ApsDataConfirm => 0x04,
            FrameType::DeviceState => 0x07,
            FrameType::ChangeNetworkState => 0x08,
            FrameType::ReadParameter => 0x0A,
            FrameType::WriteParameter => 0x0B,
            FrameType::Version => 0x0D,
            FrameType::DeviceStateChanged => 0x0E,
            FrameType::ApsDataRequest => 0x12,
            FrameType::ApsDataIndication => 0x17,
        }
    }
}

impl TryFrom<u8> for FrameType {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self> {
        match byte {
            0x04 => Ok(FrameType::ApsDataConfirm),
            0x07 => Ok(FrameType::DeviceState),
            0x08 => Ok(FrameType::ChangeNetworkState),
            0x0A => Ok(FrameType::ReadParameter),
            0x0B => Ok(FrameType::WriteParameter),
            0x0D => Ok(FrameType::Version),
            0x0E => Ok(FrameType::DeviceStateChanged),
            0x12 => Ok(FrameType::ApsDataRequest),
            0x17 => Ok(FrameType::ApsDataIndication),
            _ => Err(ErrorKind::UnsupportedFrameType(byte).into()),
        }
    }
}

impl Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FrameType::ApsDataConfirm => "Query Send Data State",
            FrameType::DeviceState => "Device State",
            FrameType::ChangeNetworkState => "Change Network State",
            FrameType::ReadParameter => "Read Parameter",
            FrameType::WriteParameter => "Write Parameter",
            FrameType::Version => "Version",
            FrameType::DeviceStateChanged => "Device State Changed",
            FrameType::ApsDataRequest => "Enqueue Send Data",
            FrameType::ApsDataIndication => "Read Received Data",
        };
        write!(f, "{} ({:#04x})", name, u8::from(*self))
    }
}

/// Which way a frame travelled. Several frame types share a tag but differ in layout.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    /// Adapter to host. The header carries a status byte.
    Response,
    /// Host to adapter. The header carries a reserved byte.
    HostWrite,
}

/// Writes a placeholder length, runs `f`, then fills in how many bytes `f` wrote.
pub(crate) fn write_with_len<F>(buffer: &mut Vec<u8>, f: F) -> Result<()>
where
    F: FnOnce(&mut Vec<u8>) -> Result<()>,
{
    let len_offset = buffer.len();
    buffer.write_wire(0u16)?;

    f(buffer)?;

    let len = buffer.len() - len_offset - 2;
    backfill_len(buffer, len_offset, len)
}

/// Overwrites the 16-bit length placeholder at `offset`.
pub(crate) fn backfill_len(buffer: &mut [u8], offset: usize, len: usize) -> Result<()> {
    let wire_len = u16::try_from(len).map_err(|_| ErrorKind::PayloadTooLong(len))?;
    buffer[offset..offset + 2].copy_from_slice(&wire_len.to_le_bytes());
    Ok(())
}

/// Payload length and parameter ID, shared by both parameter frame types in both directions.
fn read_parameter_header<R>(r: &mut R) -> Result<(u16, ParameterId)>
where
    R: Read,
{
    let payload_len = r.read_wire()?;
    let parameter_id = r.read_wire()?;
    Ok((payload_len, parameter_id))
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Request {
    /// Query the outcome of an earlier APS data request.
    ApsDataConfirm,
    /// Read data received over the air.
    ApsDataIndication { flags: Option<u8> },
    ApsDataRequest(ApsDataRequest),
    ChangeNetworkState(NetworkState),
    DeviceState,
    ReadParameter {
        parameter_id: ParameterId,
        /// Only meaningful for the network key. Defaults to 0 when building.
        key_index: Option<u8>,
    },
    Version,
    WriteParameter(Parameter),
    /// A host-to-adapter frame of a type with no known layout.
    Unknown { frame_type: u8, payload: Vec<u8> },
}

impl Request {
    pub fn frame_type(&self) -> u8 {
        let frame_type = match self {
            Request::ApsDataConfirm => FrameType::ApsDataConfirm,
            Request::ApsDataIndication { .. } => FrameType::ApsDataIndication,
            Request::ApsDataRequest(_) => FrameType::ApsDataRequest,
            Request::ChangeNetworkState(_) => FrameType::ChangeNetworkState,
            Request::DeviceState => FrameType::DeviceState,
            Request::ReadParameter { .. } => FrameType::ReadParameter,
            Request::Version => FrameType::Version,
            Request::WriteParameter(_) => FrameType::WriteParameter,
            Request::Unknown { frame_type, .. } => return *frame_type,
        };
        frame_type.into()
    }

    /// Writes the type-specific part of the frame. APS data requests without a request ID take
    /// one from `next_request_id` and keep it.
    pub(crate) fn write_payload<F>(&mut self, buffer: &mut Vec<u8>, next_request_id: F) -> Result<()>
    where
        F: FnOnce() -> RequestId,
    {
        match self {
            Request::ApsDataConfirm => buffer.write_wire(0u16)?,
            Request::ApsDataIndication { flags } => match flags {
                Some(flags) => {
                    buffer.write_wire(1u16)?;
                    buffer.write_wire(*flags)?;
                }
                None => buffer.write_wire(0u16)?,
            },
            Request::ApsDataRequest(request) => {
                write_with_len(buffer, |buffer| request.write_payload(buffer, next_request_id))?
            }
            Request::ChangeNetworkState(network_state) => buffer.write_wire(*network_state)?,
            Request::DeviceState => {
                buffer.write_wire(0u8)?;
                buffer.write_wire(0u16)?;
            }
            Request::ReadParameter {
                parameter_id,
                key_index,
            } => {
                let key_index = match parameter_id {
                    ParameterId::NetworkKey => Some(key_index.unwrap_or(0)),
                    _ => *key_index,
                };
                write_with_len(buffer, |buffer| {
                    buffer.write_wire(*parameter_id)?;
                    if let Some(key_index) = key_index {
                        buffer.write_wire(key_index)?;
                    }
                    Ok(())
                })?
            }
            Request::Version => buffer.write_wire(0u32)?,
            Request::WriteParameter(parameter) => {
                let parameter_id = parameter.id();
                if !parameter_id.writable() {
                    return Err(ErrorKind::UnsupportedParameter(parameter_id).into());
                }
                write_with_len(buffer, |buffer| {
                    buffer.write_wire(parameter_id)?;
                    buffer.write_wire(parameter.clone())
                })?
            }
            Request::Unknown { frame_type, .. } => {
                return Err(ErrorKind::UnsupportedFrameType(*frame_type).into())
            }
        }

        Ok(())
    }

    /// Reads the type-specific part of a captured host-to-adapter frame.
    pub(crate) fn read_payload<R>(frame_type: u8, r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        let known = match FrameType::try_from(frame_type) {
            Ok(known) => known,
            Err(_) => {
                let payload = r.read_remaining()?;
                return Ok(Request::Unknown {
                    frame_type,
                    payload,
                });
            }
        };

        let request = match known {
            FrameType::ApsDataConfirm => {
                let _payload_len: u16 = r.read_wire()?;
                Request::ApsDataConfirm
            }
            FrameType::ApsDataIndication => {
                let payload_len: u16 = r.read_wire()?;
                let flags = match payload_len {
                    0 => None,
                    _ => Some(r.read_wire()?),
                };
                Request::ApsDataIndication { flags }
            }
            FrameType::ApsDataRequest => {
                let _payload_len: u16 = r.read_wire()?;
                Request::ApsDataRequest(r.read_wire()?)
            }
            FrameType::ChangeNetworkState => Request::ChangeNetworkState(r.read_wire()?),
            FrameType::DeviceState => Request::DeviceState,
            FrameType::Version => Request::Version,
            // Laid out like a WRITE_PARAMETER response, plus the optional key index.
            FrameType::ReadParameter => {
                let (payload_len, parameter_id) = read_parameter_header(r)?;
                let key_index = match payload_len {
                    0 | 1 => None,
                    _ => Some(r.read_wire()?),
                };
                Request::ReadParameter {
                    parameter_id,
                    key_index,
                }
            }
            // Laid out like a READ_PARAMETER response. With no status byte in this direction the
            // value is always present.
            FrameType::WriteParameter => {
                let (_payload_len, parameter_id) = read_parameter_header(r)?;
                Request::WriteParameter(parameter_id.read_parameter(r)?)
            }
            FrameType::DeviceStateChanged => Request::Unknown {
                frame_type,
                payload: r.read_remaining()?,
            },
        };

        Ok(request)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Response {
    ApsDataConfirm {
        device_state: DeviceState,
        /// Absent when the query itself failed.
        confirm: Option<ApsDataConfirm>,
    },
    ApsDataIndication {
        device_state: DeviceState,
        indication: ApsDataIndication,
    },
    ApsDataRequest {
        device_state: DeviceState,
        request_id: RequestId,
    },
    ChangeNetworkState(NetworkState),
    DeviceState(DeviceState),
    DeviceStateChanged(DeviceState),
    ReadParameter {
        parameter_id: ParameterId,
        /// Absent when the adapter reported a failure.
        parameter: Option<Parameter>,
    },
    Version(Version),
    WriteParameter(ParameterId),
    /// An adapter frame of a type with no known layout.
    Unknown { frame_type: u8, payload: Vec<u8> },
}

impl Response {
    pub fn frame_type(&self) -> u8 {
        let frame_type = match self {
            Response::ApsDataConfirm { .. } => FrameType::ApsDataConfirm,
            Response::ApsDataIndication { .. } => FrameType::ApsDataIndication,
            Response::ApsDataRequest { .. } => FrameType::ApsDataRequest,
            Response::ChangeNetworkState(_) => FrameType::ChangeNetworkState,
            Response::DeviceState(_) => FrameType::DeviceState,
            Response::DeviceStateChanged(_) => FrameType::DeviceStateChanged,
            Response::ReadParameter { .. } => FrameType::ReadParameter,
            Response::Version(_) => FrameType::Version,
            Response::WriteParameter(_) => FrameType::WriteParameter,
            Response::Unknown { frame_type, .. } => return *frame_type,
        };
        frame_type.into()
    }

    /// Whether a response of this kind was solicited by a request.
    pub fn solicited(&self) -> bool {
        !matches!(self, Response::DeviceStateChanged(_))
    }

    pub fn device_state(&self) -> Option<DeviceState> {
        match self {
            Response::DeviceState(device_state)
            | Response::DeviceStateChanged(device_state)
            | Response::ApsDataConfirm { device_state, .. }
            | Response::ApsDataIndication { device_state, .. }
            | Response::ApsDataRequest { device_state, .. } => Some(*device_state),
            _ => None,
        }
    }

    pub(crate) fn read_payload<R>(frame_type: u8, status: Status, r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        let known = match FrameType::try_from(frame_type) {
            Ok(known) => known,
            Err(_) => {
                let payload = r.read_remaining()?;
                return Ok(Response::Unknown {
                    frame_type,
                    payload,
                });
            }
        };

        let response = match known {
            FrameType::ApsDataConfirm => {
                let _payload_len: u16 = r.read_wire()?;
                let device_state = r.read_wire()?;

                // A failed query carries nothing after the device state.
                let confirm = if status.is_success() {
                    Some(r.read_wire()?)
                } else {
                    None
                };

                Response::ApsDataConfirm {
                    device_state,
                    confirm,
                }
            }
            FrameType::ApsDataIndication => {
                let _payload_len: u16 = r.read_wire()?;
                let device_state = r.read_wire()?;
                let indication = r.read_wire()?;

                Response::ApsDataIndication {
                    device_state,
                    indication,
                }
            }
            FrameType::ApsDataRequest => {
                let _payload_len: u16 = r.read_wire()?;
                let device_state = r.read_wire()?;
                let request_id = r.read_wire()?;

                Response::ApsDataRequest {
                    device_state,
                    request_id,
                }
            }
            FrameType::ChangeNetworkState => Response::ChangeNetworkState(r.read_wire()?),
            FrameType::DeviceState => Response::DeviceState(r.read_wire()?),
            FrameType::DeviceStateChanged => Response::DeviceStateChanged(r.read_wire()?),
            FrameType::ReadParameter => {
                let (_payload_len, parameter_id) = read_parameter_header(r)?;
                let parameter = if status.is_success() {
                    Some(parameter_id.read_parameter(r)?)
                } else {
                    None
                };
                Response::ReadParameter {
                    parameter_id,
                    parameter,
                }
            }
            FrameType::Version => Response::Version(r.read_wire()?),
            FrameType::WriteParameter => {
                let (_payload_len, parameter_id) = read_parameter_header(r)?;
                Response::WriteParameter(parameter_id)
            }
        };

        Ok(response)
    }
}

/// Splits the trailing checksum off a packet and reads the common header fields.
fn read_header(packet: &[u8]) -> Result<(Cursor<&[u8]>, u8, SequenceId, u8)> {
    let len = packet.len().saturating_sub(2);
    let mut reader = Cursor::new(&packet[..len]);

    let frame_type = reader.read_wire()?;
    let sequence_id = reader.read_wire()?;
    let status_or_reserved = reader.read_wire()?;
    // Already checked against the packet length.
    let _frame_len: u16 = reader.read_wire()?;

    Ok((reader, frame_type, sequence_id, status_or_reserved))
}

/// A frame sent from the adapter to the host.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResponseFrame {
    pub sequence_id: SequenceId,
    pub status: Status,
    pub response: Response,
}

impl ResponseFrame {
    /// Decodes a packet, including its trailing checksum, in the adapter-to-host layout.
    pub fn decode(packet: &[u8]) -> Result<Self> {
        let (mut reader, frame_type, sequence_id, status) = read_header(packet)?;
        let mut status = Status::from(status);

        let response = Response::read_payload(frame_type, status, &mut reader)?;

        // A successful confirm carries the status of the data request itself, which replaces
        // the status of the query.
        if let Response::ApsDataConfirm {
            confirm: Some(confirm),
            ..
        } = &response
        {
            status = confirm.status;
        }

        Ok(Self {
            sequence_id,
            status,
            response,
        })
    }
}

/// A frame sent from the host to the adapter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RequestFrame {
    /// Assigned when the frame is built if unset.
    pub sequence_id: Option<SequenceId>,
    pub request: Request,
}

impl RequestFrame {
    pub fn new(request: Request) -> Self {
        Self {
            sequence_id: None,
            request,
        }
    }

    /// Decodes a captured packet, including its trailing checksum, in the host-to-adapter
    /// layout.
    pub fn decode(packet: &[u8]) -> Result<Self> {
        let (mut reader, frame_type, sequence_id, _reserved) = read_header(packet)?;
        let request = Request::read_payload(frame_type, &mut reader)?;

        Ok(Self {
            sequence_id: Some(sequence_id),
            request,
        })
    }
}

impl From<Request> for RequestFrame {
    fn from(request: Request) -> Self {
        RequestFrame::new(request)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Frame {
    Request(RequestFrame),
    Response(ResponseFrame),
}

impl Frame {
    pub fn decode(packet: &[u8], direction: Direction) -> Result<Self> {
        match direction {
            Direction::Response => ResponseFrame::decode(packet).map(Frame::Response),
            Direction::HostWrite => RequestFrame::decode(packet).map(Frame::Request),
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Frame::Request(_) => Direction::HostWrite,
            Frame::Response(_) => Direction::Response,
        }
    }

    pub fn frame_type(&self) -> u8 {
        match self {
            Frame::Request(frame) => frame.request.frame_type(),
            Frame::Response(frame) => frame.response.frame_type(),
        }
    }

    pub fn sequence_id(&self) -> Option<SequenceId> {
        match self {
            Frame::Request(frame) => frame.sequence_id,
            Frame::Response(frame) => Some(frame.sequence_id),
        }
    }
}
