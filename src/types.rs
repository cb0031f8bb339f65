use std::convert::TryFrom;
use std::fmt::{self, Debug, Display};
use std::io::{Read, Write};
use std::str::FromStr;

use crate::{Error, ErrorKind, ReadWire, ReadWireExt, Result, WriteWire, WriteWireExt};

pub type SequenceId = u8;
pub type RequestId = u8;
pub type Endpoint = u8;

/// Reverses the order of the byte pairs in a hex string.
///
/// Multi-byte values travel little-endian but are conventionally written most significant
/// byte first, so `"0123456789abcdef"` becomes `"efcdab8967452301"`.
pub fn swap_hex(string: &str) -> Result<String> {
    if string.len() % 2 != 0 || !string.is_ascii() {
        return Err(ErrorKind::InvalidHex(string.to_owned()).into());
    }

    let pairs = string.as_bytes().chunks(2).rev();
    Ok(pairs.map(|pair| String::from_utf8_lossy(pair)).collect())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{:02x}", byte)).collect()
}

macro_rules! define_hex_ids {
    ($(($name:ident, $ty:ty, $digits:expr)),+ $(,)?) => {
        $(
            /// Little-endian on the wire, shown as fixed-width hex.
            #[derive(Copy, Clone, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
            pub struct $name(pub $ty);

            impl $name {
                /// Parses hex copied from the wire, least significant byte first.
                pub fn from_wire_hex(string: &str) -> Result<Self> {
                    swap_hex(string)?.parse()
                }

                /// Hex in wire order, least significant byte first.
                pub fn wire_hex(&self) -> String {
                    to_hex(&self.0.to_le_bytes())
                }
            }

            impl Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{:0width$x}", self.0, width = $digits)
                }
            }

            impl Debug for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}({})", stringify!($name), self)
                }
            }

            impl FromStr for $name {
                type Err = Error;

                fn from_str(string: &str) -> Result<Self> {
                    if string.is_empty() || string.len() > $digits {
                        return Err(ErrorKind::InvalidHex(string.to_owned()).into());
                    }
                    <$ty>::from_str_radix(string, 16)
                        .map($name)
                        .map_err(|_| ErrorKind::InvalidHex(string.to_owned()).into())
                }
            }

            impl From<$ty> for $name {
                fn from(value: $ty) -> Self {
                    $name(value)
                }
            }

            impl From<$name> for $ty {
                fn from(value: $name) -> $ty {
                    value.0
                }
            }

            impl ReadWire for $name {
                fn read_wire<R>(r: &mut R) -> Result<Self>
                where
                    R: Read,
                {
                    Ok($name(r.read_wire()?))
                }
            }

            impl WriteWire for $name {
                fn write_wire<W>(self, w: &mut W) -> Result<()>
                where
                    W: Write,
                {
                    w.write_wire(self.0)
                }
            }
        )+
    };
}

define_hex_ids! {
    (ShortAddress, u16, 4),
    (ExtendedAddress, u64, 16),
    (PanId, u16, 4),
    (ProfileId, u16, 4),
    (ClusterId, u16, 4),
}

impl ShortAddress {
    /// Placeholder for a device whose network address is not known.
    pub const UNKNOWN: ShortAddress = ShortAddress(0xfffe);
}

impl ProfileId {
    pub const ZDO: ProfileId = ProfileId(0x0000);
    pub const HOME_AUTOMATION: ProfileId = ProfileId(0x0104);
    pub const LIGHT_LINK: ProfileId = ProfileId(0xc05e);
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Status {
    Success,
    Failure,
    Busy,
    Timeout,
    Unsupported,
    Error,
    NoNetwork,
    InvalidValue,
    Unknown(u8),
}

impl Status {
    pub fn is_success(&self) -> bool {
        *self == Status::Success
    }
}

impl From<u8> for Status {
    fn from(byte: u8) -> Self {
        match byte {
            0 => Status::Success,
            1 => Status::Failure,
            2 => Status::Busy,
            3 => Status::Timeout,
            4 => Status::Unsupported,
            5 => Status::Error,
            6 => Status::NoNetwork,
            7 => Status::InvalidValue,
            unknown => Status::Unknown(unknown),
        }
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> u8 {
        match status {
            Status::Success => 0,
            Status::Failure => 1,
            Status::Busy => 2,
            Status::Timeout => 3,
            Status::Unsupported => 4,
            Status::Error => 5,
            Status::NoNetwork => 6,
            Status::InvalidValue => 7,
            Status::Unknown(byte) => byte,
        }
    }
}

impl ReadWire for Status {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        Ok(Status::from(u8::read_wire(r)?))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NetworkState {
    Offline,
    Joining,
    Connected,
    Leaving,
}

impl TryFrom<u8> for NetworkState {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self> {
        match byte {
            0x0 => Ok(NetworkState::Offline),
            0x1 => Ok(NetworkState::Joining),
            0x2 => Ok(NetworkState::Connected),
            0x3 => Ok(NetworkState::Leaving),
            _ => Err(ErrorKind::InvalidNetworkState(byte).into()),
        }
    }
}

impl From<NetworkState> for u8 {
    fn from(network_state: NetworkState) -> u8 {
        match network_state {
            NetworkState::Offline => 0x0,
            NetworkState::Joining => 0x1,
            NetworkState::Connected => 0x2,
            NetworkState::Leaving => 0x3,
        }
    }
}

impl ReadWire for NetworkState {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        NetworkState::try_from(u8::read_wire(r)?)
    }
}

impl WriteWire for NetworkState {
    fn write_wire<W>(self, w: &mut W) -> Result<()>
    where
        W: Write,
    {
        w.write_wire(u8::from(self))
    }
}

const DATA_CONFIRM: u8 = 0x04;
const DATA_INDICATION: u8 = 0x08;
const CONFIGURATION_CHANGED: u8 = 0x10;
const DATA_REQUEST_FREE_SLOTS: u8 = 0x20;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DeviceState {
    pub network_state: NetworkState,
    /// A confirmation for an earlier APS data request is waiting to be queried.
    pub data_confirm: bool,
    /// Received data is waiting to be read.
    pub data_indication: bool,
    pub configuration_changed: bool,
    /// The adapter can accept another APS data request.
    pub data_request_free_slots: bool,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            network_state: NetworkState::Offline,
            data_confirm: false,
            data_indication: false,
            configuration_changed: false,
            data_request_free_slots: false,
        }
    }
}

impl From<u8> for DeviceState {
    fn from(byte: u8) -> Self {
        let network_state = match byte & 0b11 {
            0x0 => NetworkState::Offline,
            0x1 => NetworkState::Joining,
            0x2 => NetworkState::Connected,
            _ => NetworkState::Leaving,
        };

        Self {
            network_state,
            data_confirm: byte & DATA_CONFIRM != 0,
            data_indication: byte & DATA_INDICATION != 0,
            configuration_changed: byte & CONFIGURATION_CHANGED != 0,
            data_request_free_slots: byte & DATA_REQUEST_FREE_SLOTS != 0,
        }
    }
}

impl From<DeviceState> for u8 {
    fn from(device_state: DeviceState) -> u8 {
        let flags = [
            (device_state.data_confirm, DATA_CONFIRM),
            (device_state.data_indication, DATA_INDICATION),
            (device_state.configuration_changed, CONFIGURATION_CHANGED),
            (device_state.data_request_free_slots, DATA_REQUEST_FREE_SLOTS),
        ];

        flags
            .iter()
            .filter(|(set, _)| *set)
            .fold(u8::from(device_state.network_state), |byte, (_, bit)| {
                byte | bit
            })
    }
}

impl ReadWire for DeviceState {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        Ok(DeviceState::from(u8::read_wire(r)?))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Platform {
    Avr,
    Arm,
    Unknown(u8),
}

/// Firmware version, e.g. `26580700` for 0x26 / 0x58 on ARM.
#[derive(Copy, Clone, Eq, Ord, PartialEq, PartialOrd)]
pub struct Version(pub u32);

impl Version {
    pub fn major(&self) -> u8 {
        self.0.to_le_bytes()[3]
    }

    pub fn minor(&self) -> u8 {
        self.0.to_le_bytes()[2]
    }

    pub fn platform(&self) -> Platform {
        match self.0.to_le_bytes()[1] {
            0x05 => Platform::Avr,
            0x07 => Platform::Arm,
            unknown => Platform::Unknown(unknown),
        }
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Version({})", self)
    }
}

impl ReadWire for Version {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        Ok(Version(r.read_wire()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_hex() {
        assert_eq!(swap_hex("0123456789abcdef").unwrap(), "efcdab8967452301");
        assert_eq!(swap_hex("").unwrap(), "");
        assert!(swap_hex("abc").is_err());
    }

    #[test]
    fn test_swap_hex_twice() {
        for string in &["01234567", "deadbeef", "00ff00ff"] {
            let swapped = swap_hex(string).unwrap();
            assert_eq!(swap_hex(&swapped).unwrap(), *string);
        }
    }

    #[test]
    fn test_address_display() {
        assert_eq!(ShortAddress(0x12).to_string(), "0012");
        assert_eq!(
            ExtendedAddress(0x00212effff012345).to_string(),
            "00212effff012345"
        );
        assert_eq!(format!("{:?}", ClusterId(0x8031)), "ClusterId(8031)");
    }

    #[test]
    fn test_address_parse() {
        assert_eq!("0104".parse::<ProfileId>().unwrap(), ProfileId::HOME_AUTOMATION);
        assert_eq!("fffe".parse::<ShortAddress>().unwrap(), ShortAddress::UNKNOWN);
        assert!("".parse::<ShortAddress>().is_err());
        assert!("12345".parse::<ShortAddress>().is_err());
        assert!("zz".parse::<ClusterId>().is_err());
    }

    #[test]
    fn test_numeric_and_hex_agree() {
        assert_eq!(ClusterId::from(0x0031), "0031".parse::<ClusterId>().unwrap());
        assert_eq!(ProfileId::from(260), ProfileId::HOME_AUTOMATION);
    }

    #[test]
    fn test_wire_hex() {
        let address = ExtendedAddress::from_wire_hex("efcdab8967452301").unwrap();
        assert_eq!(address, ExtendedAddress(0x0123456789abcdef));
        assert_eq!(address.wire_hex(), "efcdab8967452301");
        assert_eq!(ShortAddress(0x1234).wire_hex(), "3412");
    }

    #[test]
    fn test_address_read_is_byte_reversed() {
        let mut wire: &[u8] = &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let address: ExtendedAddress = wire.read_wire().unwrap();
        assert_eq!(address.to_string(), "0807060504030201");
    }

    #[test]
    fn test_device_state_decode() {
        // 0b0010_1101
        let device_state = DeviceState::from(0x2D);
        assert_eq!(device_state.network_state, NetworkState::Joining);
        assert!(device_state.data_confirm);
        assert!(device_state.data_indication);
        assert!(!device_state.configuration_changed);
        assert!(device_state.data_request_free_slots);

        // 0b0001_0110
        let device_state = DeviceState::from(0x16);
        assert_eq!(device_state.network_state, NetworkState::Connected);
        assert!(device_state.data_confirm);
        assert!(!device_state.data_indication);
        assert!(device_state.configuration_changed);
        assert!(!device_state.data_request_free_slots);
    }

    #[test]
    fn test_device_state_encode() {
        for byte in 0..0x40u8 {
            assert_eq!(u8::from(DeviceState::from(byte)), byte);
        }
    }

    #[test]
    fn test_network_state() {
        assert_eq!(NetworkState::try_from(2).unwrap(), NetworkState::Connected);
        assert!(NetworkState::try_from(4).is_err());
    }

    #[test]
    fn test_status() {
        assert!(Status::from(0).is_success());
        assert_eq!(Status::from(6), Status::NoNetwork);
        assert_eq!(Status::from(0x80), Status::Unknown(0x80));
        assert_eq!(u8::from(Status::Unknown(0x80)), 0x80);
    }

    #[test]
    fn test_version() {
        let mut wire: &[u8] = &[0x00, 0x07, 0x58, 0x26];
        let version: Version = wire.read_wire().unwrap();
        assert_eq!(version.to_string(), "26580700");
        assert_eq!(version.major(), 0x26);
        assert_eq!(version.minor(), 0x58);
        assert_eq!(version.platform(), Platform::Arm);
    }
}
