//! Structural message validation.
//!
//! Run over received bytes before any object is bound to them. Checks only
//! structure (header, lengths, element framing), never field semantics,
//! and never writes.

use crate::error::ValidationError;
use crate::field;
use crate::message::MessageHeader;
use crate::registry::{ObjectType, REGISTRY, Version};
use byteorder::{ByteOrder, NetworkEndian};

type Result<T> = core::result::Result<T, ValidationError>;

/// Check that `bytes` holds exactly one well-formed message.
///
/// # Example
///
/// ```
/// use ofp_wire::validator::validate_message;
///
/// assert!(validate_message(&[0x04, 0x02, 0x00, 0x08, 0, 0, 0, 1]).is_ok());
/// assert!(validate_message(&[0x04, 0x02, 0x00, 0x10, 0, 0, 0, 1]).is_err());
/// ```
pub fn validate_message(bytes: &[u8]) -> Result<()> {
    let actual = bytes.len();
    if actual < field::header::LEN {
        return Err(ValidationError::Truncated {
            needed: field::header::LEN,
            actual,
        });
    }

    let header = MessageHeader::new_unchecked(bytes);
    let version =
        Version::from_wire(header.version()).ok_or(ValidationError::UnsupportedVersion(header.version()))?;

    let declared = header.length() as usize;
    if declared != actual {
        return Err(ValidationError::LengthMismatch { declared, actual });
    }

    let code = header.message_type();
    let ty = REGISTRY
        .resolve(version, ObjectType::Header, u16::from(code))
        .map_err(|_| ValidationError::UnknownMessageType(code))?;

    let min = REGISTRY.fixed_length_for(version, ty);
    if actual < min {
        return Err(ValidationError::Truncated {
            needed: min,
            actual,
        });
    }

    match ty {
        ObjectType::PacketOut => validate_packet_out(bytes, version),
        ObjectType::Hello if version == Version::V1_3 => walk_elements(
            &bytes[field::hello::ELEMENTS..],
            version,
            ObjectType::HelloElem,
        ),
        _ => Ok(()),
    }
}

fn validate_packet_out(bytes: &[u8], version: Version) -> Result<()> {
    let (actions_len, start) = if version == Version::V1_0 {
        (field::packet_out_v1::ACTIONS_LEN, field::packet_out_v1::ACTIONS)
    } else {
        (field::packet_out_v2::ACTIONS_LEN, field::packet_out_v2::ACTIONS)
    };
    let length = NetworkEndian::read_u16(&bytes[actions_len]) as usize;
    let actions = bytes
        .get(start..start + length)
        .ok_or(ValidationError::ListOverrun {
            offset: start,
            length,
        })?;
    walk_elements(actions, version, ObjectType::Action)
}

/// Walk a run of type/length elements, checking that each one is known,
/// at least as long as its fixed part, and inside the list.
fn walk_elements(list: &[u8], version: Version, family: ObjectType) -> Result<()> {
    let mut offset = 0;
    while offset < list.len() {
        let rest = &list[offset..];
        if rest.len() < field::tlv::LEN {
            return Err(ValidationError::BadElementLength {
                offset,
                length: rest.len(),
            });
        }
        let code = NetworkEndian::read_u16(&rest[field::tlv::TYPE]);
        let length = NetworkEndian::read_u16(&rest[field::tlv::LENGTH]) as usize;
        let ty = REGISTRY
            .resolve(version, family, code)
            .map_err(|_| ValidationError::UnknownElementType { family, code })?;

        let min = REGISTRY.fixed_length_for(version, ty).max(field::tlv::LEN);
        if length < min || length > rest.len() {
            return Err(ValidationError::BadElementLength { offset, length });
        }
        offset += length;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet_out_v1(actions: &[u8]) -> Vec<u8> {
        let total = 16 + actions.len();
        let mut bytes = vec![0x01, 13, 0, total as u8, 0, 0, 0, 1];
        bytes.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x01]);
        bytes.extend_from_slice(&(actions.len() as u16).to_be_bytes());
        bytes.extend_from_slice(actions);
        bytes
    }

    #[test]
    fn test_truncated_header() {
        assert_eq!(
            validate_message(&[0x04, 0x00, 0x00]),
            Err(ValidationError::Truncated { needed: 8, actual: 3 })
        );
    }

    #[test]
    fn test_unsupported_version() {
        assert_eq!(
            validate_message(&[0x07, 0x00, 0x00, 0x08, 0, 0, 0, 0]),
            Err(ValidationError::UnsupportedVersion(0x07))
        );
    }

    #[test]
    fn test_unknown_message_type() {
        assert_eq!(
            validate_message(&[0x01, 0x63, 0x00, 0x08, 0, 0, 0, 0]),
            Err(ValidationError::UnknownMessageType(0x63))
        );
        // barrier request is 18 only in 1.0
        assert!(validate_message(&[0x01, 18, 0x00, 0x08, 0, 0, 0, 0]).is_ok());
        assert!(validate_message(&[0x04, 18, 0x00, 0x08, 0, 0, 0, 0]).is_err());
    }

    #[test]
    fn test_short_fixed_part() {
        let bytes = [0x01, 13, 0x00, 0x0A, 0, 0, 0, 0, 0, 0];
        assert_eq!(
            validate_message(&bytes),
            Err(ValidationError::Truncated {
                needed: 16,
                actual: 10
            })
        );
    }

    #[test]
    fn test_packet_out_actions() {
        let output = [0x00, 0x00, 0x00, 0x08, 0x00, 0x02, 0xFF, 0xFF];
        assert!(validate_message(&packet_out_v1(&output)).is_ok());
        assert!(validate_message(&packet_out_v1(&[])).is_ok());

        let bad_len = [0x00, 0x00, 0x00, 0x06, 0x00, 0x02, 0xFF, 0xFF];
        assert_eq!(
            validate_message(&packet_out_v1(&bad_len)),
            Err(ValidationError::BadElementLength {
                offset: 0,
                length: 6
            })
        );

        let unknown = [0x00, 0x30, 0x00, 0x08, 0, 0, 0, 0];
        assert_eq!(
            validate_message(&packet_out_v1(&unknown)),
            Err(ValidationError::UnknownElementType {
                family: ObjectType::Action,
                code: 0x30
            })
        );
    }

    #[test]
    fn test_packet_out_actions_overrun() {
        let mut bytes = packet_out_v1(&[0x00, 0x00, 0x00, 0x08, 0x00, 0x02, 0xFF, 0xFF]);
        bytes[15] = 0x10;
        assert_eq!(
            validate_message(&bytes),
            Err(ValidationError::ListOverrun {
                offset: 16,
                length: 16
            })
        );
    }

    #[test]
    fn test_hello_elements() {
        let hello = [
            0x04, 0x00, 0x00, 0x10, 0, 0, 0, 0, // header
            0x00, 0x01, 0x00, 0x08, 0x00, 0x00, 0x00, 0x12, // versionbitmap
        ];
        assert!(validate_message(&hello).is_ok());

        let mut truncated = hello;
        truncated[11] = 0x0C;
        assert_eq!(
            validate_message(&truncated),
            Err(ValidationError::BadElementLength {
                offset: 0,
                length: 12
            })
        );

        // elements are not inspected before 1.3
        let mut older = hello;
        older[0] = 0x01;
        older[8] = 0x7F;
        assert!(validate_message(&older).is_ok());
    }
}
