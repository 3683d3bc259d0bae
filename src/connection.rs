// ABOUTME: Length-delimited SMPP frame transport over any ordered byte stream
// ABOUTME: Reader half buffers and parses frames, writer half encodes and flushes PDUs

use crate::codec::{CodecError, Encodable, Frame, PduHeader};
use crate::pdu::Pdu;
use bytes::BytesMut;
use std::io::{self, Cursor};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("connection reset by peer")]
    ResetByPeer,

    /// The length prefix is unusable, no later frame boundary can be trusted
    #[error("framing lost: {0}")]
    Framing(CodecError),

    /// A complete frame arrived but its body did not decode. The header is
    /// kept so the sender can be told which PDU was rejected.
    #[error("malformed frame discarded: {source}")]
    Malformed {
        header: PduHeader,
        source: CodecError,
    },

    #[error("failed to encode PDU: {0}")]
    Encode(CodecError),
}

impl ConnectionError {
    /// Whether the byte stream is unusable after this error
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConnectionError::Io(_) | ConnectionError::ResetByPeer | ConnectionError::Framing(_)
        )
    }
}

/// Splits a TCP stream into independently owned frame halves.
pub fn split(socket: TcpStream) -> (FrameReader<OwnedReadHalf>, FrameWriter<OwnedWriteHalf>) {
    let (read_half, write_half) = socket.into_split();
    (FrameReader::new(read_half), FrameWriter::new(write_half))
}

/// Reading half of an SMPP connection.
#[derive(Debug)]
pub struct FrameReader<R> {
    reader: R,

    // The buffer for reading frames.
    buffer: BytesMut,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            // Most PDUs a transmitter sees are responses well under 100 octets.
            buffer: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// Read a single `Frame` value from the underlying stream.
    ///
    /// The function waits until it has retrieved enough data to parse a frame.
    /// Any data remaining in the read buffer after the frame has been parsed is
    /// kept there for the next call to `read_frame`. Cancelling the future
    /// loses no data.
    ///
    /// # Returns
    ///
    /// On success, the received frame is returned. If the stream is closed in
    /// a way that doesn't break a frame in half, it returns `None`. A frame
    /// that arrives whole but fails to decode yields `Malformed` and the
    /// reader stays usable.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, ConnectionError> {
        loop {
            // Attempt to parse a frame from the buffered data. If enough data
            // has been buffered, the frame is returned.
            if let Some(frame) = self.parse_frame()? {
                return Ok(Some(frame));
            }

            // `0` indicates "end of stream".
            if 0 == self.reader.read_buf(&mut self.buffer).await? {
                // The remote closed the connection. For this to be a clean
                // shutdown, there should be no data in the read buffer. If
                // there is, this means that the peer closed the socket while
                // sending a frame.
                return if self.buffer.is_empty() {
                    Ok(None)
                } else {
                    Err(ConnectionError::ResetByPeer)
                };
            }
        }
    }

    fn parse_frame(&mut self) -> Result<Option<Frame>, ConnectionError> {
        // Checking the length prefix first avoids decoding anything until
        // the whole frame is buffered.
        let len = match Frame::check(&self.buffer[..]) {
            Ok(len) => len,
            Err(CodecError::Incomplete) => return Ok(None),
            Err(e) => return Err(ConnectionError::Framing(e)),
        };

        // The frame is consumed from the buffer whether or not it decodes,
        // so the next read starts at the following boundary.
        let bytes = self.buffer.split_to(len);
        Frame::decode(&bytes).map(Some).map_err(|source| {
            match PduHeader::decode(&mut Cursor::new(&bytes[..])) {
                Ok(header) => ConnectionError::Malformed { header, source },
                Err(_) => ConnectionError::Framing(source),
            }
        })
    }
}

/// Writing half of an SMPP connection.
#[derive(Debug)]
pub struct FrameWriter<W: AsyncWrite> {
    // Decorated with a `BufWriter` so the header and body reach the socket
    // in one write.
    stream: BufWriter<W>,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            stream: BufWriter::new(writer),
        }
    }

    /// Encode and write a PDU, then flush.
    ///
    /// Encoding happens before any byte is written, so an `Encode` error
    /// leaves the stream untouched.
    pub async fn write_pdu(&mut self, pdu: &Pdu) -> Result<(), ConnectionError> {
        let bytes = pdu.to_bytes().map_err(ConnectionError::Encode)?;

        tracing::trace!(
            command_id = %pdu.command_id,
            sequence_number = pdu.sequence_number,
            len = bytes.len(),
            "writing PDU"
        );

        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Flush buffered output and close the write direction.
    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.stream.flush().await?;
        self.stream.shutdown().await
    }
}
