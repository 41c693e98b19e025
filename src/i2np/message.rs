//! I2NP message envelope
//!
//! An owned buffer with two logical cursors: `offset` (where the header
//! begins) and `len` (one past the payload). The two bytes in front of
//! `offset` are reserved scratch for the outer transport header and are
//! never payload. The same trailing region supports two header views:
//! the 16-byte long header used over the stream transport and the 5-byte
//! short header used by the size-constrained UDP transport.

use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use super::{
    InboundTunnel, I2NP_HEADER_CHKS_OFFSET, I2NP_HEADER_EXPIRATION_OFFSET,
    I2NP_HEADER_MSGID_OFFSET, I2NP_HEADER_SIZE, I2NP_HEADER_SIZE_OFFSET,
    I2NP_HEADER_TYPEID_OFFSET, I2NP_MAX_MESSAGE_SIZE, I2NP_MAX_SHORT_MESSAGE_SIZE,
    I2NP_SHORT_HEADER_EXPIRATION_OFFSET, I2NP_SHORT_HEADER_SIZE,
    I2NP_SHORT_HEADER_TYPEID_OFFSET, TRANSPORT_HEADER_RESERVE,
};
use crate::error::{Error, Result};

/// Length of a framed message given its raw leading bytes.
///
/// Reads the size field of the long header; the result counts header
/// plus payload.
pub fn message_length(buf: &[u8]) -> Result<usize> {
    if buf.len() < I2NP_HEADER_SIZE {
        return Err(Error::truncated(I2NP_HEADER_SIZE, buf.len()));
    }
    let size = u16::from_be_bytes([buf[I2NP_HEADER_SIZE_OFFSET], buf[I2NP_HEADER_SIZE_OFFSET + 1]]);
    Ok(I2NP_HEADER_SIZE + size as usize)
}

/// An I2NP message envelope
#[derive(Clone)]
pub struct Message {
    buf: Vec<u8>,
    /// Start of the header within `buf`
    offset: usize,
    /// One past the last payload byte within `buf`
    len: usize,
    /// Inbound tunnel that delivered this message, if any
    from: Option<Arc<dyn InboundTunnel>>,
}

impl Message {
    /// Envelope sized for the stream transport.
    pub fn new() -> Self {
        Self::with_capacity(I2NP_MAX_MESSAGE_SIZE)
    }

    /// Envelope sized for the size-constrained UDP transport.
    pub fn new_short() -> Self {
        Self::with_capacity(I2NP_MAX_SHORT_MESSAGE_SIZE)
    }

    /// Envelope with room for `capacity` payload bytes after the
    /// transport reserve and the long header.
    pub fn with_capacity(capacity: usize) -> Self {
        let offset = TRANSPORT_HEADER_RESERVE;
        Self {
            buf: vec![0; TRANSPORT_HEADER_RESERVE + I2NP_HEADER_SIZE + capacity],
            offset,
            len: offset + I2NP_HEADER_SIZE,
            from: None,
        }
    }

    /// Rebuild an envelope from framed wire bytes (long header first).
    ///
    /// The declared size field must fit within `bytes`; trailing bytes
    /// beyond it are ignored. A checksum mismatch is advisory only and
    /// logged rather than rejected.
    pub fn from_wire(bytes: &[u8]) -> Result<Self> {
        let total = message_length(bytes)?;
        if bytes.len() < total {
            return Err(Error::truncated(total, bytes.len()));
        }

        let mut msg = Self::with_capacity(total - I2NP_HEADER_SIZE);
        msg.buf[msg.offset..msg.offset + total].copy_from_slice(&bytes[..total]);
        msg.len = msg.offset + total;

        if let Err(Error::ChecksumMismatch { expected, actual }) = msg.verify_checksum() {
            log::warn!(
                "message checksum mismatch (expected {expected:#04x}, got {actual:#04x}), \
                 keeping message"
            );
        }
        Ok(msg)
    }

    // ----- header accessors -----

    fn header(&self) -> &[u8] {
        &self.buf[self.offset..self.offset + I2NP_HEADER_SIZE]
    }

    fn header_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.offset..self.offset + I2NP_HEADER_SIZE]
    }

    pub fn type_id(&self) -> u8 {
        self.header()[I2NP_HEADER_TYPEID_OFFSET]
    }

    pub fn set_type_id(&mut self, type_id: u8) {
        self.header_mut()[I2NP_HEADER_TYPEID_OFFSET] = type_id;
    }

    pub fn msg_id(&self) -> u32 {
        let h = self.header();
        u32::from_be_bytes([
            h[I2NP_HEADER_MSGID_OFFSET],
            h[I2NP_HEADER_MSGID_OFFSET + 1],
            h[I2NP_HEADER_MSGID_OFFSET + 2],
            h[I2NP_HEADER_MSGID_OFFSET + 3],
        ])
    }

    pub fn set_msg_id(&mut self, msg_id: u32) {
        self.header_mut()[I2NP_HEADER_MSGID_OFFSET..I2NP_HEADER_MSGID_OFFSET + 4]
            .copy_from_slice(&msg_id.to_be_bytes());
    }

    /// Expiration in milliseconds since the epoch.
    pub fn expiration(&self) -> u64 {
        let h = self.header();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&h[I2NP_HEADER_EXPIRATION_OFFSET..I2NP_HEADER_EXPIRATION_OFFSET + 8]);
        u64::from_be_bytes(bytes)
    }

    pub fn set_expiration(&mut self, expiration_ms: u64) {
        self.header_mut()[I2NP_HEADER_EXPIRATION_OFFSET..I2NP_HEADER_EXPIRATION_OFFSET + 8]
            .copy_from_slice(&expiration_ms.to_be_bytes());
    }

    /// Declared payload size from the header.
    pub fn size(&self) -> u16 {
        let h = self.header();
        u16::from_be_bytes([h[I2NP_HEADER_SIZE_OFFSET], h[I2NP_HEADER_SIZE_OFFSET + 1]])
    }

    pub fn set_size(&mut self, size: u16) {
        self.header_mut()[I2NP_HEADER_SIZE_OFFSET..I2NP_HEADER_SIZE_OFFSET + 2]
            .copy_from_slice(&size.to_be_bytes());
    }

    /// Recompute the size field from the current payload length.
    pub fn update_size(&mut self) {
        self.set_size(self.payload_length() as u16);
    }

    pub fn checksum(&self) -> u8 {
        self.header()[I2NP_HEADER_CHKS_OFFSET]
    }

    pub fn set_checksum(&mut self, checksum: u8) {
        self.header_mut()[I2NP_HEADER_CHKS_OFFSET] = checksum;
    }

    /// Store the first byte of SHA-256 over the payload as the checksum.
    ///
    /// The truncation to one byte is the wire format; it detects
    /// accidental corruption only and must not be strengthened.
    pub fn update_checksum(&mut self) {
        let digest = Sha256::digest(self.payload());
        self.set_checksum(digest[0]);
    }

    /// Check the stored checksum against the payload.
    pub fn verify_checksum(&self) -> Result<()> {
        let expected = Sha256::digest(self.payload())[0];
        let actual = self.checksum();
        if expected == actual {
            Ok(())
        } else {
            Err(Error::ChecksumMismatch { expected, actual })
        }
    }

    // ----- payload and logical window -----

    /// Logical length: header plus payload.
    pub fn length(&self) -> usize {
        self.len - self.offset
    }

    pub fn payload_length(&self) -> usize {
        self.length() - I2NP_HEADER_SIZE
    }

    pub fn payload(&self) -> &[u8] {
        &self.buf[self.offset + I2NP_HEADER_SIZE..self.len]
    }

    pub fn payload_mut(&mut self) -> &mut [u8] {
        let start = self.offset + I2NP_HEADER_SIZE;
        &mut self.buf[start..self.len]
    }

    /// Grow the logical window to hold `n` payload bytes.
    ///
    /// Capacity violations are a caller bug; envelopes must be pre-sized.
    pub fn set_payload_length(&mut self, n: usize) {
        let len = self.offset + I2NP_HEADER_SIZE + n;
        assert!(len <= self.buf.len(), "payload exceeds envelope capacity");
        self.len = len;
    }

    /// Write `payload` after the header and adjust the window.
    pub fn fill_payload(&mut self, payload: &[u8]) {
        self.set_payload_length(payload.len());
        self.payload_mut().copy_from_slice(payload);
    }

    /// The framed bytes to hand to the stream transport.
    pub fn as_wire(&self) -> &[u8] {
        &self.buf[self.offset..self.len]
    }

    /// Shift the window so the payload base address is `alignment`-byte
    /// aligned. Both cursors move by the same delta, preserving the
    /// logical length. Used before treating the payload as a packed
    /// numeric structure.
    pub fn align(&mut self, alignment: usize) {
        let base = self.buf.as_ptr() as usize + self.offset + I2NP_HEADER_SIZE;
        let rem = base % alignment;
        if rem != 0 {
            let delta = alignment - rem;
            assert!(self.len + delta <= self.buf.len(), "no room to align");
            self.offset += delta;
            self.len += delta;
        }
    }

    /// Duplicate another message's logical window into this envelope at
    /// its own offset. The destination must be pre-sized.
    pub fn copy_from(&mut self, other: &Message) {
        let length = other.length();
        assert!(
            self.offset + length <= self.buf.len(),
            "source window exceeds destination capacity"
        );
        self.buf[self.offset..self.offset + length].copy_from_slice(other.as_wire());
        self.len = self.offset + length;
        self.from = other.from.clone();
    }

    // ----- inbound tunnel back-reference -----

    pub fn from_tunnel(&self) -> Option<&Arc<dyn InboundTunnel>> {
        self.from.as_ref()
    }

    pub fn set_from_tunnel(&mut self, from: Option<Arc<dyn InboundTunnel>>) {
        self.from = from;
    }

    // ----- short header conversion (UDP transport) -----

    /// Short-header bytes occupy the tail of the long-header region, so
    /// the payload position is shared by both encodings.
    fn short_header_offset(&self) -> usize {
        self.offset + I2NP_HEADER_SIZE - I2NP_SHORT_HEADER_SIZE
    }

    /// Adopt a short-framed wire image (short header + payload) as
    /// received from the UDP transport, expanding it to the long form
    /// with the transport-supplied message ID.
    pub fn from_short_wire(bytes: &[u8], msg_id: u32) -> Result<Self> {
        if bytes.len() < I2NP_SHORT_HEADER_SIZE {
            return Err(Error::truncated(I2NP_SHORT_HEADER_SIZE, bytes.len()));
        }
        let mut msg = Self::with_capacity(bytes.len());
        let short = msg.short_header_offset();
        msg.buf[short..short + bytes.len()].copy_from_slice(bytes);
        msg.len = msg.offset + I2NP_HEADER_SIZE + (bytes.len() - I2NP_SHORT_HEADER_SIZE);
        msg.from_short_header(msg_id);
        Ok(msg)
    }

    /// The short-framed bytes to hand to the UDP transport after
    /// [`Message::to_short_header`].
    pub fn as_short_wire(&self) -> &[u8] {
        let start = self.offset + I2NP_HEADER_SIZE - I2NP_SHORT_HEADER_SIZE;
        &self.buf[start..start + (self.len - self.offset)]
    }

    /// Expand a received short header into the long form.
    ///
    /// The short header carries no message ID; the transport supplies it
    /// out-of-band. Expiration widens from whole seconds to milliseconds.
    pub fn from_short_header(&mut self, msg_id: u32) {
        let short = self.short_header_offset();
        let type_id = self.buf[short + I2NP_SHORT_HEADER_TYPEID_OFFSET];
        let exp = short + I2NP_SHORT_HEADER_EXPIRATION_OFFSET;
        let expiration_secs = u32::from_be_bytes([
            self.buf[exp],
            self.buf[exp + 1],
            self.buf[exp + 2],
            self.buf[exp + 3],
        ]);

        self.set_type_id(type_id);
        self.set_msg_id(msg_id);
        self.set_expiration(u64::from(expiration_secs) * 1000);
        self.set_size((self.len - self.offset - I2NP_HEADER_SIZE) as u16);
        self.set_checksum(0);
    }

    /// Collapse the long header into the short form, returning the
    /// message ID the transport must carry out-of-band. Expiration
    /// truncates to whole seconds; `len` is recomputed from the size
    /// field plus the short header.
    pub fn to_short_header(&mut self) -> u32 {
        let mut header = [0u8; I2NP_HEADER_SIZE];
        header.copy_from_slice(self.header());

        let short = self.short_header_offset();
        self.buf[short + I2NP_SHORT_HEADER_TYPEID_OFFSET] = header[I2NP_HEADER_TYPEID_OFFSET];

        let expiration_ms = u64::from_be_bytes([
            header[I2NP_HEADER_EXPIRATION_OFFSET],
            header[I2NP_HEADER_EXPIRATION_OFFSET + 1],
            header[I2NP_HEADER_EXPIRATION_OFFSET + 2],
            header[I2NP_HEADER_EXPIRATION_OFFSET + 3],
            header[I2NP_HEADER_EXPIRATION_OFFSET + 4],
            header[I2NP_HEADER_EXPIRATION_OFFSET + 5],
            header[I2NP_HEADER_EXPIRATION_OFFSET + 6],
            header[I2NP_HEADER_EXPIRATION_OFFSET + 7],
        ]);
        let expiration_secs = (expiration_ms / 1000) as u32;
        let exp = short + I2NP_SHORT_HEADER_EXPIRATION_OFFSET;
        self.buf[exp..exp + 4].copy_from_slice(&expiration_secs.to_be_bytes());

        let size = u16::from_be_bytes([
            header[I2NP_HEADER_SIZE_OFFSET],
            header[I2NP_HEADER_SIZE_OFFSET + 1],
        ]);
        self.len = self.offset + I2NP_SHORT_HEADER_SIZE + size as usize;

        u32::from_be_bytes([
            header[I2NP_HEADER_MSGID_OFFSET],
            header[I2NP_HEADER_MSGID_OFFSET + 1],
            header[I2NP_HEADER_MSGID_OFFSET + 2],
            header[I2NP_HEADER_MSGID_OFFSET + 3],
        ])
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("type_id", &self.type_id())
            .field("msg_id", &self.msg_id())
            .field("length", &self.length())
            .finish_non_exhaustive()
    }
}
