use crate::registry::ObjectType;
use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Status returned by every wire object operation.
///
/// These four variants are the complete taxonomy. Programming-contract
/// violations (an over-deep parent chain, an object extending past its
/// wire buffer) are not represented here: they panic.
///
/// # Examples
///
/// ```
/// use ofp_wire::error::Error;
/// use ofp_wire::object::Object;
///
/// let mut obj = Object::new(0).unwrap();
/// assert_eq!(
///     obj.buffer_bind(Vec::new(), 0, None),
///     Err(Error::InvalidArgument("cannot bind an empty buffer"))
/// );
/// ```
#[derive(Error, PartialEq, Debug, Clone, Copy, Eq)]
pub enum Error {
    /// Null, zero or malformed caller input.
    ///
    /// This occurs when:
    /// - Binding an empty buffer or a zero length
    /// - Operating on an object that has no wire buffer
    /// - Using a handle after its root was rebound or stolen
    /// - Reading or writing past the current end of the wire buffer
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Allocation failed or a growth request exceeds the buffer capacity.
    #[error("resource exhausted: {needed} bytes needed, {available} available")]
    ResourceExhausted {
        /// Total bytes the operation needed.
        needed: usize,
        /// Bytes the buffer could provide.
        available: usize,
    },

    /// Malformed wire content.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// List iteration boundary: the list is empty or the end was reached.
    #[error("out of range")]
    OutOfRange,
}

/// Wire content errors.
///
/// Raised while decoding discriminants and lengths from bytes that were
/// not produced by this crate.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// The wire type code is not defined for the family at this version.
    #[error("unknown wire type 0x{code:04x} in the {family:?} family")]
    UnknownType {
        /// Family the code was looked up in.
        family: ObjectType,
        /// Raw wire code.
        code: u16,
    },

    /// The decoded discriminant belongs to a different family.
    #[error("{found:?} is not a member of the {expected:?} family")]
    WrongFamily {
        /// Family the caller asked for.
        expected: ObjectType,
        /// Concrete type found on the wire.
        found: ObjectType,
    },

    /// The decoded length is shorter than the type's fixed part or longer
    /// than the caller's bound (a `max` of 0 means unbounded).
    #[error("length {length} outside the permitted range [{min}, {max}]")]
    BadLength {
        /// Decoded length.
        length: usize,
        /// Minimum for the concrete type.
        min: usize,
        /// Caller-supplied maximum.
        max: usize,
    },

    /// The structural validator rejected the message.
    #[error("message validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Reasons the structural validator rejects a raw message.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Fewer bytes than the structure requires.
    #[error("message truncated: {needed} bytes needed, {actual} present")]
    Truncated {
        /// Bytes required.
        needed: usize,
        /// Bytes present.
        actual: usize,
    },

    /// The header carries an unsupported protocol version.
    #[error("unsupported protocol version 0x{0:02x}")]
    UnsupportedVersion(u8),

    /// The header length field disagrees with the buffer length.
    #[error("header declares {declared} bytes but the message has {actual}")]
    LengthMismatch {
        /// Value of the header length field.
        declared: usize,
        /// Bytes handed to the validator.
        actual: usize,
    },

    /// Unknown message type for the version.
    #[error("unknown message type {0}")]
    UnknownMessageType(u8),

    /// A list element carries a type code unknown to its family.
    #[error("unknown element type 0x{code:04x} in the {family:?} family")]
    UnknownElementType {
        /// Family of the list being walked.
        family: ObjectType,
        /// Raw wire code.
        code: u16,
    },

    /// A list element length is below its minimum or runs past the list.
    #[error("element at list offset {offset} has invalid length {length}")]
    BadElementLength {
        /// Offset of the element relative to the list start.
        offset: usize,
        /// Decoded element length.
        length: usize,
    },

    /// An embedded list length runs past the end of the message.
    #[error("list of {length} bytes at offset {offset} overruns the message")]
    ListOverrun {
        /// Absolute offset of the list.
        offset: usize,
        /// Declared list length.
        length: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!("{}", Error::InvalidArgument("object has no wire buffer")),
            "invalid argument: object has no wire buffer"
        );
        assert_eq!(
            format!("{}", Error::ResourceExhausted { needed: 80, available: 64 }),
            "resource exhausted: 80 bytes needed, 64 available"
        );
        assert_eq!(format!("{}", Error::OutOfRange), "out of range");
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::UnknownType {
            family: ObjectType::Action,
            code: 0x1f,
        };
        assert_eq!(format!("{}", err), "unknown wire type 0x001f in the Action family");

        let err = ParseError::WrongFamily {
            expected: ObjectType::Action,
            found: ObjectType::HelloElemVersionbitmap,
        };
        assert_eq!(
            format!("{}", err),
            "HelloElemVersionbitmap is not a member of the Action family"
        );
    }

    #[test]
    fn test_nested_conversion() {
        let err: Error = ParseError::from(ValidationError::UnsupportedVersion(0x09)).into();
        assert_eq!(
            err,
            Error::Parse(ParseError::Validation(ValidationError::UnsupportedVersion(0x09)))
        );
        assert_eq!(
            format!("{}", err),
            "parse error: message validation failed: unsupported protocol version 0x09"
        );
    }

    #[test]
    fn test_error_clone_copy() {
        let err = Error::OutOfRange;
        let err2 = err;
        let err3 = err.clone();
        assert_eq!(err, err2);
        assert_eq!(err, err3);
    }
}
