//! Field offset definitions for OpenFlow wire structures.
//!
//! Every offset here is relative to the start of the structure it belongs
//! to; the object layer adds the object's absolute buffer offset. Following
//! the smoltcp pattern, all offsets are const ranges so they fold at
//! compile time.
//!
//! # Wire Format Structure
//!
//! OpenFlow message header (all versions):
//! ```text
//! +----------------+----------------+---------------------------------+
//! | VERSION (1)    | TYPE (1)       | LENGTH (2)                      |
//! +----------------+----------------+---------------------------------+
//! | XID (4)                                                           |
//! +-------------------------------------------------------------------+
//! | BODY (variable, LENGTH - 8 bytes)                                 |
//! +-------------------------------------------------------------------+
//! ```
//!
//! Actions and hello elements are TLVs:
//! ```text
//! +---------------------------------+---------------------------------+
//! | TYPE (2)                        | LENGTH (2, includes header)     |
//! +---------------------------------+---------------------------------+
//! ```

/// Type alias for a byte range (slice index range).
pub type Field = ::core::ops::Range<usize>;

/// Message header field offsets, common to every protocol version.
pub mod header {
    use crate::field::Field;

    /// Protocol version (1 byte at offset 0).
    pub const VERSION: Field = 0..1;

    /// Message type code (1 byte at offset 1).
    pub const TYPE: Field = 1..2;

    /// Total message length including the header (2 bytes at offset 2-3).
    pub const LENGTH: Field = 2..4;

    /// Transaction id (4 bytes at offset 4-7).
    ///
    /// Sits at the same offset in every version, so one accessor serves all.
    pub const XID: Field = 4..8;

    /// Header length in bytes.
    pub const LEN: usize = XID.end;
}

/// Type/length header shared by actions and hello elements.
pub mod tlv {
    use crate::field::Field;

    /// Type code (2 bytes at offset 0-1).
    pub const TYPE: Field = 0..2;

    /// Length of the whole element including this header (2 bytes at offset 2-3).
    pub const LENGTH: Field = 2..4;

    /// TLV header length in bytes.
    pub const LEN: usize = LENGTH.end;
}

/// OpenFlow 1.0 packet-out body.
pub mod packet_out_v1 {
    use crate::field::Field;

    /// Buffer id (4 bytes at offset 8-11).
    pub const BUFFER_ID: Field = 8..12;

    /// Ingress port (2 bytes at offset 12-13).
    pub const IN_PORT: Field = 12..14;

    /// Length of the actions list (2 bytes at offset 14-15).
    pub const ACTIONS_LEN: Field = 14..16;

    /// Start of the actions list; also the fixed length.
    pub const ACTIONS: usize = ACTIONS_LEN.end;
}

/// OpenFlow 1.1+ packet-out body.
pub mod packet_out_v2 {
    use crate::field::Field;

    /// Buffer id (4 bytes at offset 8-11).
    pub const BUFFER_ID: Field = 8..12;

    /// Ingress port (4 bytes at offset 12-15).
    pub const IN_PORT: Field = 12..16;

    /// Length of the actions list (2 bytes at offset 16-17).
    pub const ACTIONS_LEN: Field = 16..18;

    /// Padding (6 bytes at offset 18-23).
    pub const PAD: Field = 18..24;

    /// Start of the actions list; also the fixed length.
    pub const ACTIONS: usize = PAD.end;
}

/// Hello message body (1.3).
pub mod hello {
    /// Start of the hello elements list.
    pub const ELEMENTS: usize = crate::field::header::LEN;
}

/// OpenFlow 1.0 output action (8 bytes).
pub mod action_output_v1 {
    use crate::field::Field;

    /// Output port (2 bytes at offset 4-5).
    pub const PORT: Field = 4..6;

    /// Bytes to send to the controller (2 bytes at offset 6-7).
    pub const MAX_LEN: Field = 6..8;

    /// Action length in bytes.
    pub const LEN: usize = MAX_LEN.end;
}

/// OpenFlow 1.1+ output action (16 bytes).
pub mod action_output_v2 {
    use crate::field::Field;

    /// Output port (4 bytes at offset 4-7).
    pub const PORT: Field = 4..8;

    /// Bytes to send to the controller (2 bytes at offset 8-9).
    pub const MAX_LEN: Field = 8..10;

    /// Padding (6 bytes at offset 10-15).
    pub const PAD: Field = 10..16;

    /// Action length in bytes.
    pub const LEN: usize = PAD.end;
}

/// Set-VLAN-id action (1.0 and 1.1, 8 bytes).
pub mod action_set_vlan_vid {
    use crate::field::Field;

    /// VLAN id (2 bytes at offset 4-5).
    pub const VLAN_VID: Field = 4..6;

    /// Action length in bytes.
    pub const LEN: usize = 8;
}

/// Group action (1.1+, 8 bytes).
pub mod action_group {
    use crate::field::Field;

    /// Group id (4 bytes at offset 4-7).
    pub const GROUP_ID: Field = 4..8;

    /// Action length in bytes.
    pub const LEN: usize = GROUP_ID.end;
}

/// Set-IP-TTL action (1.1+, 8 bytes).
pub mod action_set_nw_ttl {
    use crate::field::Field;

    /// New TTL (1 byte at offset 4).
    pub const NW_TTL: Field = 4..5;

    /// Action length in bytes.
    pub const LEN: usize = 8;
}

/// Actions carrying nothing but a padded header (pop-vlan, dec-nw-ttl).
pub mod action_header_only {
    /// Action length in bytes.
    pub const LEN: usize = 8;
}

/// Version-bitmap hello element (1.3, variable length).
pub mod hello_elem_versionbitmap {
    /// Start of the bitmap words.
    pub const BITMAPS: usize = crate::field::tlv::LEN;

    /// Size of one bitmap word.
    pub const BITMAP_LEN: usize = 4;
}
