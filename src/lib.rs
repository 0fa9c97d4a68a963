#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

//! # ofp-wire
//!
//! This crate provides an object model over OpenFlow wire bytes: typed
//! views into a single growable buffer, nested without copying, that can be
//! read in place, appended to, and iterated. It is a `no_std` crate that
//! needs only `alloc`.
//!
//! ## Features
//!
//! - `no_std` compatible, heap only for the wire buffer and node arena
//! - Zero-copy parsing of received messages, including a path that
//!   allocates nothing at all
//! - Appending list elements grows the buffer and every enclosing length
//! - Polymorphic elements decoded from their wire type tag
//!
//! ## Architecture
//!
//! - `wire_buffer` - The growable byte region and its big-endian accessors
//! - `object` - Root objects, child attachment and length propagation
//! - `list` - Append and iterate lists of elements
//! - `registry` - Compile-time `(version, type)` table of tag accessors
//! - `validator` - Structural checks run before binding received bytes
//! - `message` - Zero-copy wrapper around the message header
//! - `accessors` - Per-type field accessors
//! - `field` - Field offset definitions
//!
//! ## Example
//!
//! ```
//! use ofp_wire::prelude::*;
//!
//! let mut hello = Object::create_with_capacity(Version::V1_3, ObjectType::Hello, 64).unwrap();
//! let elements = hello.hello_elements().unwrap();
//! let bitmap = hello
//!     .new_child(Version::V1_3, ObjectType::HelloElemVersionbitmap, Some(8))
//!     .unwrap();
//! hello.append_bind(elements, bitmap).unwrap();
//! hello.set_hello_elem_bitmap(bitmap, 0, 1 << 4).unwrap();
//! assert_eq!(hello.length(), 16);
//!
//! let bytes = hello.steal().unwrap();
//! let parsed = Object::new_from_message(bytes, 16).unwrap();
//! assert_eq!(parsed.root().object_type(), ObjectType::Hello);
//! ```

extern crate alloc;

/// Per-type field accessors.
pub mod accessors;

/// Per-tree configuration.
pub mod config;

/// Error types for every wire object operation.
pub mod error;

/// Field offset definitions for all wire format structures.
pub mod field;

/// List append and iteration.
pub mod list;

/// Zero-copy message header wrapper.
pub mod message;

/// Root objects, child attachment and length propagation.
pub mod object;

/// Protocol versions, object types and the type registry.
pub mod registry;

/// Structural message validation.
pub mod validator;

/// Growable wire buffer.
pub mod wire_buffer;

/// Prelude module for convenient imports.
pub mod prelude;

#[cfg(test)]
mod layout_tests {
    use super::*;
    use core::mem::size_of;

    /// Handles are plain indices, cheap to copy around.
    #[test]
    fn test_node_id_is_two_words() {
        assert_eq!(size_of::<object::NodeId>(), 2 * size_of::<u32>());
    }

    /// The header view adds nothing beyond the slice it wraps.
    #[test]
    fn test_zero_cost_header_wrapper() {
        assert_eq!(
            size_of::<message::MessageHeader<&[u8]>>(),
            size_of::<&[u8]>()
        );
    }

    /// Field offsets fold at compile time.
    #[test]
    fn test_const_field_calculations() {
        const HEADER: usize = field::header::LEN;
        const ACTIONS_V1: usize = field::packet_out_v1::ACTIONS;
        const ACTIONS_V2: usize = field::packet_out_v2::ACTIONS;
        assert_eq!(HEADER, 8);
        assert_eq!(ACTIONS_V1, 16);
        assert_eq!(ACTIONS_V2, 24);
    }

    /// The preallocated parse path works entirely on stack memory.
    #[test]
    fn test_stack_only_parse() {
        let mut buffer = [0x04u8, 0x03, 0x00, 0x08, 0x00, 0x00, 0x00, 0x09];
        let mut storage = object::ObjectStorage::new();
        let obj =
            object::Object::new_from_message_preallocated(&mut storage, &mut buffer, 8).unwrap();
        assert_eq!(obj.root().object_type(), registry::ObjectType::EchoReply);
        assert_eq!(obj.xid(), Ok(9));
        assert_eq!(obj.wire_buffer().unwrap().alloc_bytes(), 8);
    }
}
