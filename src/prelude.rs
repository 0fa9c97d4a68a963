//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate,
//! allowing for convenient glob imports:
//!
//! ```
//! use ofp_wire::prelude::*;
//! ```

pub use crate::config::{DEFAULT_MAX_PARENT_DEPTH, ObjectConfig, WIRE_BUFFER_MAX_LENGTH};
pub use crate::error::{Error, ParseError, ValidationError};
pub use crate::message::MessageHeader;
pub use crate::object::{Node, NodeId, Object, ObjectStorage};
pub use crate::registry::{ObjectType, REGISTRY, Version};
pub use crate::validator::validate_message;
pub use crate::wire_buffer::{ReleaseFn, WireBuffer};
