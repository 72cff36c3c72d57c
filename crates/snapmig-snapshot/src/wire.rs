//! Little-endian wire primitives shared by the writer and reader.

use std::io::{ErrorKind, Read};

use crate::error::{SnapshotError, SnapshotResult, StreamKind};

/// Tag preceding every record of a sub-stream.
pub(crate) const RECORD_TAG: u8 = 0x01;
/// Sentinel closing a sub-stream.
pub(crate) const END_OF_STREAM: u8 = 0x00;

pub(crate) fn put_u8(buf: &mut Vec<u8>, v: u8) {
    buf.push(v);
}

pub(crate) fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn put_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Reader wrapper tracking the absolute byte offset for error reporting.
pub(crate) struct WireReader<R> {
    inner: R,
    offset: u64,
}

impl<R: Read> WireReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self { inner, offset: 0 }
    }

    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }

    pub(crate) fn into_inner(self) -> R {
        self.inner
    }

    pub(crate) fn corrupt(&self, reason: impl Into<String>) -> SnapshotError {
        SnapshotError::Corrupt {
            offset: self.offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn bytes<const N: usize>(&mut self, stream: StreamKind) -> SnapshotResult<[u8; N]> {
        let mut buf = [0u8; N];
        match self.inner.read_exact(&mut buf) {
            Ok(()) => {
                self.offset += N as u64;
                Ok(buf)
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(SnapshotError::TruncatedStream {
                stream,
                offset: self.offset,
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn u8(&mut self, stream: StreamKind) -> SnapshotResult<u8> {
        Ok(self.bytes::<1>(stream)?[0])
    }

    pub(crate) fn u32(&mut self, stream: StreamKind) -> SnapshotResult<u32> {
        Ok(u32::from_le_bytes(self.bytes(stream)?))
    }

    pub(crate) fn u64(&mut self, stream: StreamKind) -> SnapshotResult<u64> {
        Ok(u64::from_le_bytes(self.bytes(stream)?))
    }

    pub(crate) fn bool(&mut self, stream: StreamKind) -> SnapshotResult<bool> {
        match self.u8(stream)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(self.corrupt(format!("invalid bool byte {other}"))),
        }
    }

    /// Read a record tag. `Ok(false)` means the stream sentinel was reached.
    pub(crate) fn record_tag(&mut self, stream: StreamKind) -> SnapshotResult<bool> {
        match self.u8(stream)? {
            RECORD_TAG => Ok(true),
            END_OF_STREAM => Ok(false),
            other => Err(self.corrupt(format!("invalid {stream} record tag {other:#04x}"))),
        }
    }

    /// Whether the underlying source is exhausted.
    pub(crate) fn at_eof(&mut self) -> SnapshotResult<bool> {
        let mut next = [0u8; 1];
        loop {
            match self.inner.read(&mut next) {
                Ok(0) => return Ok(true),
                Ok(_) => return Ok(false),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn little_endian_layout() {
        let mut buf = Vec::new();
        put_u32(&mut buf, 0x03040506);
        put_u64(&mut buf, 1);
        assert_eq!(buf, vec![0x06, 0x05, 0x04, 0x03, 1, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn reader_tracks_offset() {
        let mut buf = Vec::new();
        put_u64(&mut buf, 42);
        put_u8(&mut buf, 7);
        let mut r = WireReader::new(buf.as_slice());
        assert_eq!(r.u64(StreamKind::Header).unwrap(), 42);
        assert_eq!(r.offset(), 8);
        assert_eq!(r.u8(StreamKind::Header).unwrap(), 7);
        assert!(r.at_eof().unwrap());
    }

    #[test]
    fn short_read_is_truncation() {
        let data = [1u8, 2];
        let mut r = WireReader::new(&data[..]);
        let err = r.u32(StreamKind::Outputs).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::TruncatedStream { stream: StreamKind::Outputs, offset: 0 }
        ));
    }

    #[test]
    fn bad_tag_is_corrupt() {
        let data = [0x07u8];
        let mut r = WireReader::new(&data[..]);
        let err = r.record_tag(StreamKind::SolidEntryPoints).unwrap_err();
        assert!(matches!(err, SnapshotError::Corrupt { .. }));
    }
}
