//! Type registry module
//!
//! This module contains the protocol `Version` and `ObjectType` enums and
//! the compile-time table mapping each `(version, type)` pair to the
//! accessors that read and write the type's own tag and length in wire
//! bytes.

use crate::error::{Error, ParseError, Result};
use crate::field;
use crate::wire_buffer::WireBuffer;

/// OpenFlow protocol versions understood by the registry.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Version {
    /// OpenFlow 1.0 (wire version 0x01)
    V1_0 = 0x01,
    /// OpenFlow 1.1 (wire version 0x02)
    V1_1 = 0x02,
    /// OpenFlow 1.2 (wire version 0x03)
    V1_2 = 0x03,
    /// OpenFlow 1.3 (wire version 0x04)
    V1_3 = 0x04,
}

impl Version {
    /// Number of supported versions.
    pub const COUNT: usize = 4;

    /// Every supported version, oldest first.
    pub const ALL: [Version; Version::COUNT] =
        [Version::V1_0, Version::V1_1, Version::V1_2, Version::V1_3];

    /// Decode a wire version byte.
    ///
    /// # Returns
    ///
    /// * `Option<Version>` - `None` for bytes outside the supported range.
    pub const fn from_wire(byte: u8) -> Option<Version> {
        match byte {
            0x01 => Some(Version::V1_0),
            0x02 => Some(Version::V1_1),
            0x03 => Some(Version::V1_2),
            0x04 => Some(Version::V1_3),
            _ => None,
        }
    }

    /// The wire version byte.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    const fn index(self) -> usize {
        self as usize - 1
    }
}

/// Type discriminant of a wire object.
///
/// Types are grouped into families. Each family has a base type
/// (`Header`, `Action`, `HelloElem`) standing for "some member, not yet
/// decoded"; [`Object::wire_init`](crate::object::Object::wire_init) turns a
/// base into the concrete member found on the wire. Lists form their own
/// single-member families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    /// Any message (family base).
    Header,
    /// Hello message.
    Hello,
    /// Echo request message.
    EchoRequest,
    /// Echo reply message.
    EchoReply,
    /// Features request message.
    FeaturesRequest,
    /// Barrier request message.
    BarrierRequest,
    /// Packet-out message.
    PacketOut,
    /// Any action (family base).
    Action,
    /// Output action.
    ActionOutput,
    /// Set-VLAN-id action.
    ActionSetVlanVid,
    /// Pop-VLAN action.
    ActionPopVlan,
    /// Group action.
    ActionGroup,
    /// Set-IP-TTL action.
    ActionSetNwTtl,
    /// Decrement-IP-TTL action.
    ActionDecNwTtl,
    /// Any hello element (family base).
    HelloElem,
    /// Version-bitmap hello element.
    HelloElemVersionbitmap,
    /// List of actions.
    ListAction,
    /// List of hello elements.
    ListHelloElem,
}

impl ObjectType {
    /// Number of type discriminants.
    pub const COUNT: usize = 18;

    /// Every type discriminant, in declaration order.
    pub const ALL: [ObjectType; ObjectType::COUNT] = [
        ObjectType::Header,
        ObjectType::Hello,
        ObjectType::EchoRequest,
        ObjectType::EchoReply,
        ObjectType::FeaturesRequest,
        ObjectType::BarrierRequest,
        ObjectType::PacketOut,
        ObjectType::Action,
        ObjectType::ActionOutput,
        ObjectType::ActionSetVlanVid,
        ObjectType::ActionPopVlan,
        ObjectType::ActionGroup,
        ObjectType::ActionSetNwTtl,
        ObjectType::ActionDecNwTtl,
        ObjectType::HelloElem,
        ObjectType::HelloElemVersionbitmap,
        ObjectType::ListAction,
        ObjectType::ListHelloElem,
    ];

    /// The base type of the family this type belongs to.
    pub const fn family(self) -> ObjectType {
        match self {
            ObjectType::Header
            | ObjectType::Hello
            | ObjectType::EchoRequest
            | ObjectType::EchoReply
            | ObjectType::FeaturesRequest
            | ObjectType::BarrierRequest
            | ObjectType::PacketOut => ObjectType::Header,
            ObjectType::Action
            | ObjectType::ActionOutput
            | ObjectType::ActionSetVlanVid
            | ObjectType::ActionPopVlan
            | ObjectType::ActionGroup
            | ObjectType::ActionSetNwTtl
            | ObjectType::ActionDecNwTtl => ObjectType::Action,
            ObjectType::HelloElem | ObjectType::HelloElemVersionbitmap => ObjectType::HelloElem,
            ObjectType::ListAction => ObjectType::ListAction,
            ObjectType::ListHelloElem => ObjectType::ListHelloElem,
        }
    }

    /// True for family base types.
    pub const fn is_base(self) -> bool {
        matches!(
            self,
            ObjectType::Header | ObjectType::Action | ObjectType::HelloElem
        )
    }

    /// True for list types.
    pub const fn is_list(self) -> bool {
        matches!(self, ObjectType::ListAction | ObjectType::ListHelloElem)
    }

    /// The family of the elements a list holds, `None` for non-lists.
    pub const fn element_family(self) -> Option<ObjectType> {
        match self {
            ObjectType::ListAction => Some(ObjectType::Action),
            ObjectType::ListHelloElem => Some(ObjectType::HelloElem),
            _ => None,
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Reads an object's type tag at an absolute buffer offset.
pub type TypeGetFn = fn(&WireBuffer<'_>, usize, Version) -> Result<ObjectType>;

/// Writes an object's type tag at an absolute buffer offset.
pub type TypeSetFn = fn(&mut WireBuffer<'_>, usize, Version, ObjectType) -> Result<()>;

/// Reads an object's length field at an absolute buffer offset.
pub type LengthGetFn = fn(&WireBuffer<'_>, usize) -> Result<usize>;

/// Writes an object's length field at an absolute buffer offset.
pub type LengthSetFn = fn(&mut WireBuffer<'_>, usize, usize) -> Result<()>;

/// Accessor vtable stamped onto an object by its initializer.
///
/// Absent entries mean the type has no such field: lists carry neither tag
/// nor length, and family bases cannot write a tag they do not know.
#[derive(Debug, Clone, Copy, Default)]
pub struct WireOps {
    /// Tag reader.
    pub type_get: Option<TypeGetFn>,
    /// Tag writer.
    pub type_set: Option<TypeSetFn>,
    /// Length reader.
    pub length_get: Option<LengthGetFn>,
    /// Length writer.
    pub length_set: Option<LengthSetFn>,
}

impl WireOps {
    /// No accessors.
    pub const NONE: WireOps = WireOps {
        type_get: None,
        type_set: None,
        length_get: None,
        length_set: None,
    };
}

/// One registry entry.
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    /// The type this entry describes.
    pub object_type: ObjectType,
    /// Length of the fixed part; the full length of fixed-size types.
    pub fixed_length: usize,
    /// Wire code, `None` for family bases and lists.
    pub wire_type: Option<u16>,
    /// Tag and length accessors.
    pub ops: WireOps,
}

/// Immutable `(version, type)` lookup table.
#[derive(Debug)]
pub struct TypeRegistry {
    table: [[Option<TypeInfo>; ObjectType::COUNT]; Version::COUNT],
}

/// The registry, built at compile time.
pub static REGISTRY: TypeRegistry = TypeRegistry::build();

const MESSAGE_OPS: WireOps = WireOps {
    type_get: Some(message_type_get),
    type_set: Some(message_type_set),
    length_get: Some(message_length_get),
    length_set: Some(message_length_set),
};

const ACTION_OPS: WireOps = WireOps {
    type_get: Some(action_type_get),
    type_set: Some(tlv_type_set),
    length_get: Some(tlv_length_get),
    length_set: Some(tlv_length_set),
};

const HELLO_ELEM_OPS: WireOps = WireOps {
    type_get: Some(hello_elem_type_get),
    type_set: Some(tlv_type_set),
    length_get: Some(tlv_length_get),
    length_set: Some(tlv_length_set),
};

const fn base_ops(ops: WireOps) -> WireOps {
    WireOps {
        type_set: None,
        ..ops
    }
}

const fn entry(
    object_type: ObjectType,
    fixed_length: usize,
    wire_type: Option<u16>,
    ops: WireOps,
) -> Option<TypeInfo> {
    Some(TypeInfo {
        object_type,
        fixed_length,
        wire_type,
        ops,
    })
}

/// The protocol schema: which types exist at which version, with what code
/// and fixed length.
const fn describe(version: Version, ty: ObjectType) -> Option<TypeInfo> {
    let v1_0 = matches!(version, Version::V1_0);
    let v1_3 = matches!(version, Version::V1_3);
    let header = field::header::LEN;
    let action = field::tlv::LEN;

    match ty {
        ObjectType::Header => entry(ty, header, None, base_ops(MESSAGE_OPS)),
        ObjectType::Hello => entry(ty, header, Some(0), MESSAGE_OPS),
        ObjectType::EchoRequest => entry(ty, header, Some(2), MESSAGE_OPS),
        ObjectType::EchoReply => entry(ty, header, Some(3), MESSAGE_OPS),
        ObjectType::FeaturesRequest => entry(ty, header, Some(5), MESSAGE_OPS),
        ObjectType::BarrierRequest => {
            entry(ty, header, Some(if v1_0 { 18 } else { 20 }), MESSAGE_OPS)
        }
        ObjectType::PacketOut => {
            let len = if v1_0 {
                field::packet_out_v1::ACTIONS
            } else {
                field::packet_out_v2::ACTIONS
            };
            entry(ty, len, Some(13), MESSAGE_OPS)
        }

        ObjectType::Action => entry(ty, action, None, base_ops(ACTION_OPS)),
        ObjectType::ActionOutput => {
            let len = if v1_0 {
                field::action_output_v1::LEN
            } else {
                field::action_output_v2::LEN
            };
            entry(ty, len, Some(0), ACTION_OPS)
        }
        ObjectType::ActionSetVlanVid => match version {
            Version::V1_0 | Version::V1_1 => {
                entry(ty, field::action_set_vlan_vid::LEN, Some(1), ACTION_OPS)
            }
            _ => None,
        },
        ObjectType::ActionPopVlan if !v1_0 => {
            entry(ty, field::action_header_only::LEN, Some(18), ACTION_OPS)
        }
        ObjectType::ActionGroup if !v1_0 => {
            entry(ty, field::action_group::LEN, Some(22), ACTION_OPS)
        }
        ObjectType::ActionSetNwTtl if !v1_0 => {
            entry(ty, field::action_set_nw_ttl::LEN, Some(23), ACTION_OPS)
        }
        ObjectType::ActionDecNwTtl if !v1_0 => {
            entry(ty, field::action_header_only::LEN, Some(24), ACTION_OPS)
        }
        ObjectType::ActionPopVlan
        | ObjectType::ActionGroup
        | ObjectType::ActionSetNwTtl
        | ObjectType::ActionDecNwTtl => None,

        ObjectType::HelloElem if v1_3 => entry(ty, action, None, base_ops(HELLO_ELEM_OPS)),
        ObjectType::HelloElemVersionbitmap if v1_3 => entry(
            ty,
            field::hello_elem_versionbitmap::BITMAPS,
            Some(1),
            HELLO_ELEM_OPS,
        ),
        ObjectType::HelloElem | ObjectType::HelloElemVersionbitmap => None,

        ObjectType::ListAction => entry(ty, 0, None, WireOps::NONE),
        ObjectType::ListHelloElem if v1_3 => entry(ty, 0, None, WireOps::NONE),
        ObjectType::ListHelloElem => None,
    }
}

impl TypeRegistry {
    const fn build() -> TypeRegistry {
        let mut table = [[None; ObjectType::COUNT]; Version::COUNT];
        let mut v = 0;
        while v < Version::COUNT {
            let mut t = 0;
            while t < ObjectType::COUNT {
                table[v][t] = describe(Version::ALL[v], ObjectType::ALL[t]);
                t += 1;
            }
            v += 1;
        }
        TypeRegistry { table }
    }

    /// Look up the entry for `(version, ty)`.
    ///
    /// # Returns
    ///
    /// * `Option<&TypeInfo>` - `None` if the type does not exist at this version.
    #[inline]
    pub fn initializer_for(&self, version: Version, ty: ObjectType) -> Option<&TypeInfo> {
        self.table[version.index()][ty.index()].as_ref()
    }

    /// Fixed length of `base` at `version`, 0 if the type does not exist.
    pub fn fixed_length_for(&self, version: Version, base: ObjectType) -> usize {
        self.initializer_for(version, base)
            .map_or(0, |info| info.fixed_length)
    }

    /// Wire code of a concrete type.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for family bases, lists and types absent at `version`.
    pub fn wire_type_for(&self, version: Version, ty: ObjectType) -> Result<u16> {
        self.initializer_for(version, ty)
            .and_then(|info| info.wire_type)
            .ok_or(Error::InvalidArgument("type has no wire code at this version"))
    }

    /// Map a wire code to the concrete type of `family` carrying it.
    ///
    /// # Errors
    ///
    /// `Parse(UnknownType)` if no member of the family uses `code` at `version`.
    pub fn resolve(&self, version: Version, family: ObjectType, code: u16) -> Result<ObjectType> {
        ObjectType::ALL
            .iter()
            .copied()
            .filter(|ty| ty.family() == family && !ty.is_base())
            .find(|&ty| {
                self.initializer_for(version, ty)
                    .is_some_and(|info| info.wire_type == Some(code))
            })
            .ok_or(Error::Parse(ParseError::UnknownType { family, code }))
    }
}

pub(crate) fn message_type_get(
    wbuf: &WireBuffer<'_>,
    offset: usize,
    version: Version,
) -> Result<ObjectType> {
    let code = wbuf.read_u8(offset + field::header::TYPE.start)?;
    REGISTRY.resolve(version, ObjectType::Header, u16::from(code))
}

fn message_type_set(
    wbuf: &mut WireBuffer<'_>,
    offset: usize,
    version: Version,
    ty: ObjectType,
) -> Result<()> {
    let code = u8::try_from(REGISTRY.wire_type_for(version, ty)?)
        .map_err(|_| Error::InvalidArgument("message type code does not fit in one byte"))?;
    wbuf.write_u8(offset + field::header::VERSION.start, version.as_u8())?;
    wbuf.write_u8(offset + field::header::TYPE.start, code)
}

fn message_length_get(wbuf: &WireBuffer<'_>, offset: usize) -> Result<usize> {
    Ok(wbuf.read_u16(offset + field::header::LENGTH.start)? as usize)
}

fn message_length_set(wbuf: &mut WireBuffer<'_>, offset: usize, length: usize) -> Result<()> {
    let length = u16::try_from(length)
        .map_err(|_| Error::InvalidArgument("message length exceeds the 16-bit length field"))?;
    wbuf.write_u16(offset + field::header::LENGTH.start, length)
}

fn action_type_get(wbuf: &WireBuffer<'_>, offset: usize, version: Version) -> Result<ObjectType> {
    let code = wbuf.read_u16(offset + field::tlv::TYPE.start)?;
    REGISTRY.resolve(version, ObjectType::Action, code)
}

fn hello_elem_type_get(
    wbuf: &WireBuffer<'_>,
    offset: usize,
    version: Version,
) -> Result<ObjectType> {
    let code = wbuf.read_u16(offset + field::tlv::TYPE.start)?;
    REGISTRY.resolve(version, ObjectType::HelloElem, code)
}

fn tlv_type_set(
    wbuf: &mut WireBuffer<'_>,
    offset: usize,
    version: Version,
    ty: ObjectType,
) -> Result<()> {
    let code = REGISTRY.wire_type_for(version, ty)?;
    wbuf.write_u16(offset + field::tlv::TYPE.start, code)
}

fn tlv_length_get(wbuf: &WireBuffer<'_>, offset: usize) -> Result<usize> {
    Ok(wbuf.read_u16(offset + field::tlv::LENGTH.start)? as usize)
}

fn tlv_length_set(wbuf: &mut WireBuffer<'_>, offset: usize, length: usize) -> Result<()> {
    let length = u16::try_from(length)
        .map_err(|_| Error::InvalidArgument("element length exceeds the 16-bit length field"))?;
    wbuf.write_u16(offset + field::tlv::LENGTH.start, length)
}
