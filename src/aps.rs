use std::convert::TryFrom;
use std::fmt::{self, Debug};
use std::io::{Read, Write};

use crate::{
    ClusterId, Endpoint, ErrorKind, ExtendedAddress, ProfileId, ReadWire, ReadWireExt, RequestId,
    Result, ShortAddress, Status, WriteWire, WriteWireExt,
};

const NO_ADDRESS: u8 = 0x0;
const GROUP_ADDRESS: u8 = 0x1;
const NWK_ADDRESS: u8 = 0x2;
const IEEE_ADDRESS: u8 = 0x3;
const NWK_AND_IEEE_ADDRESS: u8 = 0x4;

/// Flags byte announcing two extension bytes.
const FLAGS_EXTENDED: u8 = 0x1;

/// Transmit option asking the destination to acknowledge at the APS layer.
pub const TX_OPTIONS_USE_ACKS: u8 = 0x04;

#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Destination {
    Group(ShortAddress),
    Nwk(ShortAddress, Endpoint),
    Ieee(ExtendedAddress, Endpoint),
}

impl Destination {
    /// Chooses the addressing mode from whichever fields are known.
    ///
    /// Without an endpoint the destination is a group. With one, the network address wins
    /// unless it is missing or `ShortAddress::UNKNOWN`, in which case the IEEE address is used.
    pub fn select(
        short: Option<ShortAddress>,
        extended: Option<ExtendedAddress>,
        endpoint: Option<Endpoint>,
    ) -> Result<Self> {
        let destination = match (short, extended, endpoint) {
            (Some(group), _, None) => Destination::Group(group),
            (Some(short), _, Some(endpoint)) if short != ShortAddress::UNKNOWN => {
                Destination::Nwk(short, endpoint)
            }
            (_, Some(extended), Some(endpoint)) => Destination::Ieee(extended, endpoint),
            _ => return Err(ErrorKind::MissingAddress.into()),
        };
        Ok(destination)
    }

    pub fn endpoint(&self) -> Option<Endpoint> {
        match self {
            Destination::Group(_) => None,
            Destination::Nwk(_, endpoint) | Destination::Ieee(_, endpoint) => Some(*endpoint),
        }
    }

    fn address_mode(&self) -> u8 {
        match self {
            Destination::Group(_) => GROUP_ADDRESS,
            Destination::Nwk(_, _) => NWK_ADDRESS,
            Destination::Ieee(_, _) => IEEE_ADDRESS,
        }
    }

    fn read_with_mode<R>(address_mode: u8, r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        match address_mode {
            GROUP_ADDRESS => Ok(Destination::Group(r.read_wire()?)),
            NWK_ADDRESS => {
                let short_address = r.read_wire()?;
                let endpoint = r.read_wire()?;
                Ok(Destination::Nwk(short_address, endpoint))
            }
            IEEE_ADDRESS => {
                let extended_address = r.read_wire()?;
                let endpoint = r.read_wire()?;
                Ok(Destination::Ieee(extended_address, endpoint))
            }
            _ => Err(ErrorKind::InvalidAddressMode(address_mode).into()),
        }
    }

    /// Reads a destination that may be absent (address mode 0), as in APS_DATA_CONFIRM.
    fn read_optional<R>(r: &mut R) -> Result<Option<Self>>
    where
        R: Read,
    {
        match u8::read_wire(r)? {
            NO_ADDRESS => Ok(None),
            address_mode => Destination::read_with_mode(address_mode, r).map(Some),
        }
    }
}

impl Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Group(addr) => write!(f, "Group({})", addr),
            Destination::Nwk(addr, endpoint) => write!(f, "Nwk({}, {:#04x})", addr, endpoint),
            Destination::Ieee(addr, endpoint) => write!(f, "Ieee({}, {:#04x})", addr, endpoint),
        }
    }
}

impl ReadWire for Destination {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        let address_mode = r.read_wire()?;
        Destination::read_with_mode(address_mode, r)
    }
}

impl WriteWire for Destination {
    fn write_wire<W>(self, w: &mut W) -> Result<()>
    where
        W: Write,
    {
        w.write_wire(self.address_mode())?;

        match self {
            Destination::Group(addr) => w.write_wire(addr)?,
            Destination::Nwk(addr, _) => w.write_wire(addr)?,
            Destination::Ieee(addr, _) => w.write_wire(addr)?,
        };

        if let Some(endpoint) = self.endpoint() {
            w.write_wire(endpoint)?;
        }

        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DestinationAddress {
    Group(ShortAddress),
    Nwk(ShortAddress),
    Ieee(ExtendedAddress),
}

impl ReadWire for DestinationAddress {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        match u8::read_wire(r)? {
            GROUP_ADDRESS => Ok(DestinationAddress::Group(r.read_wire()?)),
            NWK_ADDRESS => Ok(DestinationAddress::Nwk(r.read_wire()?)),
            IEEE_ADDRESS => Ok(DestinationAddress::Ieee(r.read_wire()?)),
            address_mode => Err(ErrorKind::InvalidAddressMode(address_mode).into()),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SourceAddress {
    Nwk(ShortAddress),
    Ieee(ExtendedAddress),
    Both {
        short: ShortAddress,
        extended: ExtendedAddress,
    },
}

impl SourceAddress {
    pub fn short(&self) -> Option<ShortAddress> {
        match self {
            SourceAddress::Nwk(short) | SourceAddress::Both { short, .. } => Some(*short),
            SourceAddress::Ieee(_) => None,
        }
    }

    pub fn extended(&self) -> Option<ExtendedAddress> {
        match self {
            SourceAddress::Ieee(extended) | SourceAddress::Both { extended, .. } => {
                Some(*extended)
            }
            SourceAddress::Nwk(_) => None,
        }
    }
}

impl ReadWire for SourceAddress {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        match u8::read_wire(r)? {
            NWK_ADDRESS => Ok(SourceAddress::Nwk(r.read_wire()?)),
            IEEE_ADDRESS => Ok(SourceAddress::Ieee(r.read_wire()?)),
            NWK_AND_IEEE_ADDRESS => {
                let short = r.read_wire()?;
                let extended = r.read_wire()?;
                Ok(SourceAddress::Both { short, extended })
            }
            address_mode => Err(ErrorKind::InvalidAddressMode(address_mode).into()),
        }
    }
}

/// Data to enqueue for sending over the air.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApsDataRequest {
    /// Correlates the later APS_DATA_CONFIRM. Assigned when the frame is built if unset.
    pub request_id: Option<RequestId>,
    /// Extension flag bytes. When set, the flags byte is sent as 1 followed by these.
    pub flags: Option<u16>,
    pub destination: Destination,
    pub profile_id: ProfileId,
    pub cluster_id: ClusterId,
    pub source_endpoint: Endpoint,
    pub asdu: Vec<u8>,
    pub tx_options: u8,
    pub radius: u8,
}

impl ApsDataRequest {
    pub fn new<P, C>(
        destination: Destination,
        profile_id: P,
        cluster_id: C,
        source_endpoint: Endpoint,
        asdu: Vec<u8>,
    ) -> Self
    where
        P: Into<ProfileId>,
        C: Into<ClusterId>,
    {
        Self {
            request_id: None,
            flags: None,
            destination,
            profile_id: profile_id.into(),
            cluster_id: cluster_id.into(),
            source_endpoint,
            asdu,
            tx_options: TX_OPTIONS_USE_ACKS,
            radius: 0,
        }
    }

    /// Writes everything after the payload length, using `request_id` if none is set yet.
    pub(crate) fn write_payload<W, F>(&mut self, w: &mut W, next_request_id: F) -> Result<()>
    where
        W: Write,
        F: FnOnce() -> RequestId,
    {
        let asdu_len = u16::try_from(self.asdu.len())
            .map_err(|_| ErrorKind::PayloadTooLong(self.asdu.len()))?;
        let request_id = *self.request_id.get_or_insert_with(next_request_id);

        w.write_wire(request_id)?;
        match self.flags {
            Some(extension) => {
                w.write_wire(FLAGS_EXTENDED)?;
                w.write_wire(extension)?;
            }
            None => w.write_wire(0u8)?,
        }
        w.write_wire(self.destination)?;
        w.write_wire(self.profile_id)?;
        w.write_wire(self.cluster_id)?;
        w.write_wire(self.source_endpoint)?;
        w.write_wire(asdu_len)?;
        w.write_all(&self.asdu)?;
        w.write_wire(self.tx_options)?;
        w.write_wire(self.radius)?;

        Ok(())
    }
}

impl ReadWire for ApsDataRequest {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        let request_id = r.read_wire()?;
        let flags = match u8::read_wire(r)? {
            FLAGS_EXTENDED => Some(r.read_wire()?),
            _ => None,
        };
        let destination = r.read_wire()?;
        let profile_id = r.read_wire()?;
        let cluster_id = r.read_wire()?;
        let source_endpoint = r.read_wire()?;

        let asdu_length: u16 = r.read_wire()?;
        let asdu = r.read_bytes(usize::from(asdu_length))?;

        let tx_options = r.read_wire()?;
        let radius = r.read_wire()?;

        Ok(Self {
            request_id: Some(request_id),
            flags,
            destination,
            profile_id,
            cluster_id,
            source_endpoint,
            asdu,
            tx_options,
            radius,
        })
    }
}

/// Data received over the air.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApsDataIndication {
    pub destination_address: DestinationAddress,
    pub destination_endpoint: Endpoint,
    pub source_address: SourceAddress,
    pub source_endpoint: Endpoint,
    pub profile_id: ProfileId,
    pub cluster_id: ClusterId,
    pub asdu: Vec<u8>,
    pub lqi: u8,
    pub rssi: i8,
}

impl ReadWire for ApsDataIndication {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        let destination_address = r.read_wire()?;
        let destination_endpoint = r.read_wire()?;
        let source_address = r.read_wire()?;
        let source_endpoint = r.read_wire()?;
        let profile_id = r.read_wire()?;
        let cluster_id = r.read_wire()?;

        let asdu_length: u16 = r.read_wire()?;
        let asdu = r.read_bytes(usize::from(asdu_length))?;

        let _reserved = r.read_bytes(2)?;
        let lqi = r.read_wire()?;
        let _reserved = r.read_bytes(4)?;
        let rssi = r.read_wire()?;

        Ok(Self {
            destination_address,
            destination_endpoint,
            source_address,
            source_endpoint,
            profile_id,
            cluster_id,
            asdu,
            lqi,
            rssi,
        })
    }
}

/// Outcome of an earlier APS data request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApsDataConfirm {
    pub request_id: RequestId,
    /// `None` when the adapter had nowhere to send, e.g. a group without bindings.
    pub destination: Option<Destination>,
    pub source_endpoint: Endpoint,
    pub status: Status,
}

impl ReadWire for ApsDataConfirm {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        let request_id = r.read_wire()?;
        let destination = Destination::read_optional(r)?;
        let source_endpoint = r.read_wire()?;
        let status = r.read_wire()?;

        Ok(Self {
            request_id,
            destination,
            source_endpoint,
            status,
        })
    }
}
