use std::fmt::{self, Debug, Display};
use std::io::{Read, Write};

use crate::{
    Error, ErrorKind, ExtendedAddress, PanId, ReadWire, ReadWireExt, Result, ShortAddress,
    WriteWire, WriteWireExt,
};

macro_rules! define_parameters {
    ($(($param:ident, $id:literal, $ty:ty, $writable:expr)),+ $(,)?) => {
        pub const PARAMETERS: &[ParameterId] = &[$(ParameterId::$param),+];

        #[derive(Copy, Clone, Debug, Eq, PartialEq)]
        pub enum ParameterId {
            $($param,)+
            Unknown(u8),
        }

        #[derive(Clone, Debug, Eq, PartialEq)]
        pub enum Parameter {
            $($param($ty),)+
            /// A parameter we have no layout for, with the rest of the payload.
            Unknown(u8, Vec<u8>),
        }

        impl Parameter {
            pub fn id(&self) -> ParameterId {
                match self {
                    $(Parameter::$param(_) => ParameterId::$param,)+
                    Parameter::Unknown(id, _) => ParameterId::Unknown(*id),
                }
            }
        }

        impl WriteWire for Parameter {
            fn write_wire<W>(self, w: &mut W) -> Result<()>
            where
                W: Write,
            {
                match self {
                    $(Parameter::$param(value) => w.write_wire(value),)+
                    Parameter::Unknown(_, data) => {
                        w.write_all(&data)?;
                        Ok(())
                    }
                }
            }
        }

        impl ParameterId {
            /// Whether the adapter accepts this parameter in a WRITE_PARAMETER request.
            pub fn writable(&self) -> bool {
                match self {
                    $(ParameterId::$param => $writable,)+
                    ParameterId::Unknown(_) => false,
                }
            }

            pub fn read_parameter<R>(&self, r: &mut R) -> Result<Parameter>
            where
                R: Read,
            {
                let parameter = match self {
                    $(ParameterId::$param => r.read_wire().map(Parameter::$param),)+
                    ParameterId::Unknown(id) => r.read_remaining().map(|data| Parameter::Unknown(*id, data)),
                };

                parameter.map_err(|err| Error {
                    kind: ErrorKind::InvalidParameter {
                        parameter_id: *self,
                        inner: Box::new(err),
                    },
                })
            }
        }

        impl Display for ParameterId {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(ParameterId::$param => write!(f, "{} ({:#04x})", stringify!($param), $id),)+
                    ParameterId::Unknown(id) => write!(f, "Unknown ({:#04x})", id),
                }
            }
        }

        impl From<u8> for ParameterId {
            fn from(byte: u8) -> Self {
                match byte {
                    $($id => ParameterId::$param,)+
                    unknown => ParameterId::Unknown(unknown),
                }
            }
        }

        impl From<ParameterId> for u8 {
            fn from(id: ParameterId) -> u8 {
                match id {
                    $(ParameterId::$param => $id,)+
                    ParameterId::Unknown(id) => id,
                }
            }
        }
    };
}

define_parameters! {
    (MacAddress, 0x01, ExtendedAddress, false),
    (NwkPanId, 0x05, PanId, false),
    (NwkAddress, 0x07, ShortAddress, false),
    (NwkExtendedPanId, 0x08, ExtendedAddress, false),
    (ApsDesignatedCoordinator, 0x09, u8, true),
    (ChannelMask, 0x0A, u32, true),
    (ApsExtendedPanId, 0x0B, ExtendedAddress, true),
    (TrustCenterAddress, 0x0E, ExtendedAddress, true),
    (SecurityMode, 0x10, u8, true),
    (NetworkKey, 0x18, NetworkKey, true),
    (CurrentChannel, 0x1C, u8, false),
    (PermitJoin, 0x21, u8, true),
    (ProtocolVersion, 0x22, u16, false),
    (NwkUpdateId, 0x24, u8, true),
    (WatchdogTtl, 0x26, u32, true),
}

impl ReadWire for ParameterId {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        Ok(ParameterId::from(u8::read_wire(r)?))
    }
}

impl WriteWire for ParameterId {
    fn write_wire<W>(self, w: &mut W) -> Result<()>
    where
        W: Write,
    {
        w.write_wire(u8::from(self))
    }
}

/// 128-bit network key, kept and displayed in wire order.
///
/// Unlike the addresses, the bytes are not reversed for display, so the hex differs from dumps
/// that print the key byte-swapped.
#[derive(Copy, Clone, Default, Eq, PartialEq)]
pub struct NetworkKey(pub [u8; 16]);

impl Display for NetworkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl Debug for NetworkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NetworkKey({})", self)
    }
}

impl From<[u8; 16]> for NetworkKey {
    fn from(key: [u8; 16]) -> Self {
        NetworkKey(key)
    }
}

impl ReadWire for NetworkKey {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        let mut key = [0; 16];
        r.read_exact(&mut key)?;
        Ok(NetworkKey(key))
    }
}

impl WriteWire for NetworkKey {
    fn write_wire<W>(self, w: &mut W) -> Result<()>
    where
        W: Write,
    {
        w.write_all(&self.0)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(id: u8, mut wire: &[u8]) -> Result<Parameter> {
        ParameterId::from(id).read_parameter(&mut wire)
    }

    #[test]
    fn test_id_round_trip() {
        for id in PARAMETERS {
            assert_eq!(ParameterId::from(u8::from(*id)), *id);
        }
        assert_eq!(ParameterId::from(0x42), ParameterId::Unknown(0x42));
    }

    #[test]
    fn test_read_mac_address() {
        let parameter = read(0x01, &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]).unwrap();
        match parameter {
            Parameter::MacAddress(address) => assert_eq!(address.to_string(), "0807060504030201"),
            other => panic!("unexpected parameter {:?}", other),
        }
    }

    #[test]
    fn test_read_widths() {
        assert_eq!(
            read(0x05, &[0x34, 0x12]).unwrap(),
            Parameter::NwkPanId(PanId(0x1234))
        );
        assert_eq!(
            read(0x0A, &[0x00, 0x08, 0x00, 0x00]).unwrap(),
            Parameter::ChannelMask(0x0000_0800)
        );
        assert_eq!(
            read(0x22, &[0x0B, 0x01]).unwrap(),
            Parameter::ProtocolVersion(0x010B)
        );
        assert_eq!(read(0x1C, &[0x0F]).unwrap(), Parameter::CurrentChannel(15));
    }

    #[test]
    fn test_read_network_key() {
        let key = [0xAB; 16];
        assert_eq!(
            read(0x18, &key).unwrap(),
            Parameter::NetworkKey(NetworkKey(key))
        );
    }

    #[test]
    fn test_network_key_displays_in_wire_order() {
        let mut wire = [0; 16];
        for (i, byte) in wire.iter_mut().enumerate() {
            *byte = i as u8;
        }
        match read(0x18, &wire).unwrap() {
            Parameter::NetworkKey(key) => {
                assert_eq!(key.to_string(), "000102030405060708090a0b0c0d0e0f")
            }
            other => panic!("unexpected parameter {:?}", other),
        }
    }

    #[test]
    fn test_read_unknown() {
        assert_eq!(
            read(0x42, &[0x01, 0x02, 0x03]).unwrap(),
            Parameter::Unknown(0x42, vec![0x01, 0x02, 0x03])
        );
    }

    #[test]
    fn test_read_truncated() {
        let err = read(0x0A, &[0x00, 0x08]).unwrap_err();
        match err.kind {
            ErrorKind::InvalidParameter { parameter_id, .. } => {
                assert_eq!(parameter_id, ParameterId::ChannelMask)
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_write() {
        let mut buffer = Vec::new();
        buffer
            .write_wire(Parameter::TrustCenterAddress(ExtendedAddress(
                0x0807060504030201,
            )))
            .unwrap();
        assert_eq!(buffer, vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);

        let mut buffer = Vec::new();
        buffer.write_wire(Parameter::ChannelMask(0x0200_0000)).unwrap();
        assert_eq!(buffer, vec![0x00, 0x00, 0x00, 0x02]);
    }

    #[test]
    fn test_writable() {
        assert!(ParameterId::ChannelMask.writable());
        assert!(ParameterId::NetworkKey.writable());
        assert!(!ParameterId::MacAddress.writable());
        assert!(!ParameterId::Unknown(0x42).writable());
    }
}
