use std::convert::TryFrom;

use crate::protocol::backfill_len;
use crate::{
    checksum, encapsulate, verify, Deframer, Error, ErrorKind, FrameType, Request, RequestFrame,
    RequestId, ResponseFrame, Result, WriteWireExt, HEADER_LEN,
};

/// Header, at least one payload byte and the checksum.
const MIN_PACKET_LEN: usize = HEADER_LEN + 3;

/// Largest packet a ConBee or RaspBee sends.
pub const DEFAULT_MAX_PACKET_SIZE: usize = 160;

/// Generates u8 IDs from 1 to 255, wrapping back to 1. Zero is never handed out.
#[derive(Clone, Debug, Default)]
pub struct IdCounter {
    last: u8,
}

impl IdCounter {
    pub fn new() -> Self {
        Default::default()
    }

    /// A counter whose first ID is `first`, or 1 if `first` is 0.
    pub fn starting_at(first: u8) -> Self {
        Self {
            last: first.wrapping_sub(1),
        }
    }

    pub fn next(&mut self) -> u8 {
        self.last = match self.last {
            0xFF => 1,
            last => last + 1,
        };
        self.last
    }
}

#[derive(Clone, Debug)]
pub struct Options {
    /// Emit every valid packet as `Event::Raw` instead of decoding it.
    pub raw_frames: bool,
    /// Capacity of the deframer. Longer packets are dropped with an overflow error.
    pub max_packet_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            raw_frames: false,
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
        }
    }
}

/// Something that happened on the adapter-to-host byte stream.
#[derive(Debug)]
pub enum Event {
    Frame(ResponseFrame),
    /// A valid packet that was not decoded, either because raw frames were asked for or because
    /// its type is unknown. Still carries its checksum.
    Raw(Vec<u8>),
    /// A packet that was dropped. The stream carries on with the next one.
    Error(Error),
}

/// Host-to-adapter half: turns requests into SLIP-encapsulated bytes.
#[derive(Debug, Default)]
pub struct Encoder {
    sequence_ids: IdCounter,
    request_ids: IdCounter,
}

impl Encoder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_counters(sequence_ids: IdCounter, request_ids: IdCounter) -> Self {
        Self {
            sequence_ids,
            request_ids,
        }
    }

    pub fn next_request_id(&mut self) -> RequestId {
        self.request_ids.next()
    }

    /// Builds the unframed packet for `frame`, checksum included.
    ///
    /// A missing sequence ID, or a missing request ID on an APS data request, is assigned from
    /// the counters and stored back into `frame`. On error neither `frame` nor the counters
    /// change.
    pub fn build_packet(&mut self, frame: &mut RequestFrame) -> Result<Vec<u8>> {
        if let Request::Unknown { frame_type, .. } = frame.request {
            return Err(ErrorKind::UnsupportedFrameType(frame_type).into());
        }

        let mut request = frame.request.clone();
        let mut request_ids = self.request_ids.clone();

        let mut packet = Vec::with_capacity(DEFAULT_MAX_PACKET_SIZE);
        packet.write_wire(request.frame_type())?;
        // Sequence ID, committed once the payload is built.
        packet.write_wire(0u8)?;
        packet.write_wire(0u8)?;
        packet.write_wire(0u16)?;

        request.write_payload(&mut packet, || request_ids.next())?;

        let len = packet.len();
        backfill_len(&mut packet, 3, len)?;

        let sequence_ids = &mut self.sequence_ids;
        let sequence_id = *frame.sequence_id.get_or_insert_with(|| sequence_ids.next());
        packet[1] = sequence_id;
        frame.request = request;
        self.request_ids = request_ids;

        let crc = checksum(&packet);
        packet.write_wire(crc)?;

        Ok(packet)
    }

    /// Builds `frame` and encapsulates it, ready to write to the adapter.
    pub fn encode(&mut self, frame: &mut RequestFrame) -> Result<Vec<u8>> {
        let packet = self.build_packet(frame)?;
        debug!("built = {:?}", frame);
        trace!("sending = {:?}", packet);
        Ok(encapsulate(&packet))
    }
}

/// Adapter-to-host half: turns chunks of the byte stream into events.
#[derive(Debug)]
pub struct Decoder {
    deframer: Deframer,
    options: Options,
}

impl Decoder {
    pub fn new(options: Options) -> Self {
        Self {
            deframer: Deframer::new(options.max_packet_size),
            options,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Feeds a chunk of any size, returning an event for every packet it completes, in stream
    /// order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Event> {
        let packets = self.deframer.feed(chunk);

        packets
            .into_iter()
            .map(|packet| match packet {
                Ok(packet) => self.process_packet(packet),
                Err(error) => {
                    warn!("dropping packet: {}", error);
                    Event::Error(error.into())
                }
            })
            .collect()
    }

    fn process_packet(&self, packet: Vec<u8>) -> Event {
        if let Err(error) = Decoder::validate(&packet) {
            warn!("dropping packet {:?}: {}", packet, error);
            return Event::Error(error);
        }

        if self.options.raw_frames || !Decoder::can_decode(&packet) {
            return Event::Raw(packet);
        }

        match Decoder::decode_response(&packet) {
            Ok(frame) => {
                debug!("received = {:?}", frame);
                Event::Frame(frame)
            }
            Err(error) => {
                warn!("undecodable packet {:?}: {}", packet, error);
                Event::Error(error)
            }
        }
    }

    /// Checks a packet's size, declared length and checksum.
    pub fn validate(packet: &[u8]) -> Result<()> {
        if packet.len() < MIN_PACKET_LEN {
            return Err(ErrorKind::PacketTooShort(packet.len()).into());
        }

        let declared = usize::from(u16::from_le_bytes([packet[3], packet[4]]));
        let actual = packet.len() - 2;
        if declared != actual {
            return Err(ErrorKind::LengthMismatch { declared, actual }.into());
        }

        verify(packet)?;
        Ok(())
    }

    /// Whether the packet's type has a known adapter-to-host layout.
    pub fn can_decode(packet: &[u8]) -> bool {
        packet
            .first()
            .map_or(false, |frame_type| FrameType::try_from(*frame_type).is_ok())
    }

    /// Decodes a packet received from, or captured as sent by, the adapter.
    pub fn decode_response(packet: &[u8]) -> Result<ResponseFrame> {
        ResponseFrame::decode(packet)
    }

    /// Decodes a packet captured as sent by the host.
    pub fn decode_host_write(packet: &[u8]) -> Result<RequestFrame> {
        RequestFrame::decode(packet)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Decoder::new(Options::default())
    }
}

/// Both halves of a connection to one adapter.
#[derive(Debug, Default)]
pub struct Session {
    encoder: Encoder,
    decoder: Decoder,
}

impl Session {
    pub fn new(options: Options) -> Self {
        Self {
            encoder: Encoder::new(),
            decoder: Decoder::new(options),
        }
    }

    /// Separates the halves so they can be driven independently.
    pub fn split(self) -> (Encoder, Decoder) {
        (self.encoder, self.decoder)
    }

    pub fn build(&mut self, frame: &mut RequestFrame) -> Result<Vec<u8>> {
        self.encoder.encode(frame)
    }

    pub fn ingest(&mut self, chunk: &[u8]) -> Vec<Event> {
        self.decoder.feed(chunk)
    }

    pub fn can_decode(&self, packet: &[u8]) -> bool {
        Decoder::can_decode(packet)
    }

    pub fn decode_response(&self, packet: &[u8]) -> Result<ResponseFrame> {
        Decoder::decode_response(packet)
    }

    pub fn decode_host_write(&self, packet: &[u8]) -> Result<RequestFrame> {
        Decoder::decode_host_write(packet)
    }

    pub fn options(&self) -> &Options {
        self.decoder.options()
    }
}
