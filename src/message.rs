//! Message header module
//!
//! This module contains `MessageHeader`, a read/write wrapper around the
//! eight header bytes every OpenFlow message starts with.

use crate::error::{Error, ParseError, Result, ValidationError};
use crate::field;
use crate::object::Object;
use byteorder::{ByteOrder, NetworkEndian};
use core::fmt;

/// A read/write wrapper around an OpenFlow message buffer.
///
/// Header format:
/// - Version (1 byte)
/// - Type (1 byte)
/// - Length (2 bytes, whole message)
/// - Transaction id (4 bytes)
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MessageHeader<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> MessageHeader<T> {
    /// Creates a new unchecked `MessageHeader`.
    ///
    /// # Arguments
    ///
    /// * `buffer` - A buffer starting with a message header.
    pub const fn new_unchecked(buffer: T) -> MessageHeader<T> {
        MessageHeader { buffer }
    }

    /// Creates a new checked `MessageHeader`.
    ///
    /// # Returns
    ///
    /// * `Result<MessageHeader>` - The wrapper if the buffer holds a full header.
    pub fn new_checked(buffer: T) -> Result<MessageHeader<T>> {
        let header = Self::new_unchecked(buffer);
        header.check_len()?;
        Ok(header)
    }

    /// Checks that the buffer holds at least a full header.
    pub fn check_len(&self) -> Result<()> {
        let len = self.buffer.as_ref().len();
        if len < field::header::LEN {
            return Err(Error::Parse(ParseError::Validation(
                ValidationError::Truncated {
                    needed: field::header::LEN,
                    actual: len,
                },
            )));
        }
        Ok(())
    }

    /// Returns the inner buffer.
    pub fn into_inner(self) -> T {
        self.buffer
    }

    /// Protocol version byte.
    pub fn version(&self) -> u8 {
        self.buffer.as_ref()[field::header::VERSION.start]
    }

    /// Message type code.
    pub fn message_type(&self) -> u8 {
        self.buffer.as_ref()[field::header::TYPE.start]
    }

    /// Total message length from the header.
    ///
    /// # Returns
    ///
    /// * `u16` - The declared length, header included
    pub fn length(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[field::header::LENGTH])
    }

    /// Transaction id.
    pub fn xid(&self) -> u32 {
        NetworkEndian::read_u32(&self.buffer.as_ref()[field::header::XID])
    }

    /// Bytes following the header, up to the end of the buffer.
    pub fn body(&self) -> &[u8] {
        &self.buffer.as_ref()[field::header::LEN..]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> MessageHeader<T> {
    /// Sets the version byte.
    pub fn set_version(&mut self, version: u8) {
        self.buffer.as_mut()[field::header::VERSION.start] = version;
    }

    /// Sets the message type code.
    pub fn set_message_type(&mut self, code: u8) {
        self.buffer.as_mut()[field::header::TYPE.start] = code;
    }

    /// Sets the declared length.
    pub fn set_length(&mut self, length: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[field::header::LENGTH], length);
    }

    /// Sets the transaction id.
    pub fn set_xid(&mut self, xid: u32) {
        NetworkEndian::write_u32(&mut self.buffer.as_mut()[field::header::XID], xid);
    }
}

impl<T: AsRef<[u8]>> fmt::Display for MessageHeader<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "OpenFlow message: version=0x{:02x}, type={}, length={}, xid=0x{:08x}",
            self.version(),
            self.message_type(),
            self.length(),
            self.xid()
        )
    }
}

impl Object<'_> {
    /// Header view over the root message bytes.
    pub fn header(&self) -> Result<MessageHeader<&[u8]>> {
        MessageHeader::new_checked(self.as_bytes())
    }
}
