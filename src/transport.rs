//! Drives a [`Decoder`] and an [`Encoder`] over async byte streams, such as the two halves of a
//! serial port split with `tokio::io::split`.

use std::collections::VecDeque;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};

use crate::{
    Decoder, Encoder, Event, Request, RequestFrame, ResponseFrame, Result, SequenceId, Session,
};

const READ_CHUNK_SIZE: usize = 64;

/// Wraps the two halves of a stream to the adapter.
pub fn connect<R, W>(reader: R, writer: W, session: Session) -> (Reader<R>, Writer<W>)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (encoder, decoder) = session.split();
    (Reader::new(reader, decoder), Writer::new(writer, encoder))
}

pub struct Reader<R>
where
    R: AsyncRead + Unpin,
{
    inner: R,
    decoder: Decoder,
    pending: VecDeque<Event>,
}

impl<R> Reader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(read: R, decoder: Decoder) -> Self {
        Self {
            inner: read,
            decoder,
            pending: VecDeque::new(),
        }
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// Waits for the next event on the stream. Returns `None` once the stream ends.
    pub async fn next_event(&mut self) -> Result<Option<Event>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }

            let mut chunk = [0; READ_CHUNK_SIZE];
            let len = self.inner.read(&mut chunk).await?;
            if len == 0 {
                return Ok(None);
            }

            trace!("read = {:?}", &chunk[..len]);
            self.pending.extend(self.decoder.feed(&chunk[..len]));
        }
    }

    /// Waits for the next decoded frame, logging and skipping anything else.
    pub async fn next_frame(&mut self) -> Result<Option<ResponseFrame>> {
        while let Some(event) = self.next_event().await? {
            match event {
                Event::Frame(frame) => return Ok(Some(frame)),
                Event::Raw(packet) => debug!("rx: skipping raw packet {:?}", packet),
                Event::Error(error) => error!("rx: {}", error),
            }
        }

        Ok(None)
    }
}

pub struct Writer<W>
where
    W: AsyncWrite + Unpin,
{
    inner: BufWriter<W>,
    encoder: Encoder,
}

impl<W> Writer<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(write: W, encoder: Encoder) -> Self {
        Self {
            inner: BufWriter::new(write),
            encoder,
        }
    }

    /// Encodes and sends `frame`, returning its sequence ID.
    pub async fn write_frame(&mut self, frame: &mut RequestFrame) -> Result<SequenceId> {
        let encoded = self.encoder.encode(frame)?;

        self.inner.write_all(&encoded).await?;
        self.inner.flush().await?;

        // Always set once encoded.
        Ok(frame.sequence_id.unwrap_or_default())
    }

    /// Sends `request` with fresh IDs, returning the frame as sent.
    pub async fn send(&mut self, request: Request) -> Result<RequestFrame> {
        let mut frame = RequestFrame::new(request);
        self.write_frame(&mut frame).await?;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::backfill_len;
    use crate::{checksum, encapsulate, ErrorKind, NetworkState, Response, SlipError};

    use tokio::io::duplex;

    fn seal(mut packet: Vec<u8>) -> Vec<u8> {
        let len = packet.len();
        backfill_len(&mut packet, 3, len).unwrap();
        let crc = checksum(&packet);
        packet.extend_from_slice(&crc.to_le_bytes());
        packet
    }

    #[tokio::test]
    async fn test_writer_sends_encapsulated_frames() {
        let _ = pretty_env_logger::try_init();

        let (host, mut adapter) = duplex(64);
        let mut writer = Writer::new(host, Encoder::new());

        let sent = writer.send(Request::DeviceState).await.unwrap();
        assert_eq!(sent.sequence_id, Some(1));

        let mut frame = RequestFrame::new(Request::Version);
        assert_eq!(writer.write_frame(&mut frame).await.unwrap(), 2);

        let mut received = [0; 12];
        adapter.read_exact(&mut received).await.unwrap();
        assert_eq!(
            received,
            [0xC0, 0x07, 0x01, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00, 0xF0, 0xFF, 0xC0]
        );
    }

    #[tokio::test]
    async fn test_reader_yields_events_in_order() {
        let _ = pretty_env_logger::try_init();

        let (host, mut adapter) = duplex(64);
        let mut reader = Reader::new(host, Decoder::default());

        let mut corrupted = seal(vec![0x08, 0x02, 0x00, 0x00, 0x00, 0x01]);
        corrupted[5] = 0x03;

        let mut stream = encapsulate(&seal(vec![0x08, 0x01, 0x00, 0x00, 0x00, 0x02]));
        stream.extend(encapsulate(&corrupted));
        stream.extend(encapsulate(&seal(vec![0x0E, 0x03, 0x00, 0x00, 0x00, 0x22])));

        tokio::spawn(async move {
            for chunk in stream.chunks(3) {
                adapter.write_all(chunk).await.unwrap();
            }
        });

        match reader.next_event().await.unwrap() {
            Some(Event::Frame(frame)) => {
                assert_eq!(frame.sequence_id, 1);
                assert_eq!(
                    frame.response,
                    Response::ChangeNetworkState(NetworkState::Connected)
                );
            }
            other => panic!("unexpected event {:?}", other),
        }

        match reader.next_event().await.unwrap() {
            Some(Event::Error(error)) => assert!(matches!(
                error.kind,
                ErrorKind::Slip(SlipError::MismatchedCrc { .. })
            )),
            other => panic!("unexpected event {:?}", other),
        }

        match reader.next_event().await.unwrap() {
            Some(Event::Frame(frame)) => {
                assert_eq!(frame.sequence_id, 3);
                assert!(matches!(frame.response, Response::DeviceStateChanged(_)));
            }
            other => panic!("unexpected event {:?}", other),
        }

        assert!(reader.next_event().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_next_frame_skips_raw_and_errors() {
        let (host, mut adapter) = duplex(64);
        let (mut reader, _writer) = connect(host, tokio::io::sink(), Session::default());

        let mut stream = encapsulate(&seal(vec![0x1C, 0x01, 0x00, 0x00, 0x00, 0x99]));
        stream.extend(encapsulate(&[0x01, 0x02]));
        stream.extend(encapsulate(&seal(vec![0x07, 0x02, 0x00, 0x00, 0x00, 0x02])));
        adapter.write_all(&stream).await.unwrap();
        drop(adapter);

        let frame = reader.next_frame().await.unwrap().unwrap();
        assert_eq!(frame.sequence_id, 2);
        assert!(reader.next_frame().await.unwrap().is_none());
    }
}
