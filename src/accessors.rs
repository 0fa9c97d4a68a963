//! Per-type field accessors.
//!
//! A small set of message and element accessors layered on the object
//! model: list getters that bind a list node over the body of a message,
//! and scalar getters and setters at fixed offsets within a typed node.

use crate::error::{Error, Result};
use crate::field;
use crate::object::{NO_BUFFER, Node, NodeId, Object};
use crate::registry::{LengthSetFn, ObjectType, REGISTRY, Version};
use crate::wire_buffer::WireBuffer;
use alloc::vec::Vec;

impl<'a> Object<'a> {
    fn typed(&self, id: NodeId, ty: ObjectType) -> Result<Node> {
        let node = *self.node(id)?;
        if node.object_type != ty {
            return Err(Error::InvalidArgument("object has the wrong type for this field"));
        }
        if !node.attached {
            return Err(Error::InvalidArgument("object is not attached to a wire buffer"));
        }
        Ok(node)
    }

    fn field_offset(&self, id: NodeId, ty: ObjectType, range: field::Field) -> Result<usize> {
        let node = self.typed(id, ty)?;
        if range.end > node.length {
            return Err(Error::InvalidArgument("field lies outside the object"));
        }
        Ok(node.offset + range.start)
    }

    fn read_u16_field(&self, id: NodeId, ty: ObjectType, range: field::Field) -> Result<u16> {
        let offset = self.field_offset(id, ty, range)?;
        self.wbuf.as_ref().ok_or(NO_BUFFER)?.read_u16(offset)
    }

    fn read_u32_field(&self, id: NodeId, ty: ObjectType, range: field::Field) -> Result<u32> {
        let offset = self.field_offset(id, ty, range)?;
        self.wbuf.as_ref().ok_or(NO_BUFFER)?.read_u32(offset)
    }

    fn write_u16_field(
        &mut self,
        id: NodeId,
        ty: ObjectType,
        range: field::Field,
        value: u16,
    ) -> Result<()> {
        let offset = self.field_offset(id, ty, range)?;
        self.buffer_mut()?.write_u16(offset, value)
    }

    fn write_u32_field(
        &mut self,
        id: NodeId,
        ty: ObjectType,
        range: field::Field,
        value: u32,
    ) -> Result<()> {
        let offset = self.field_offset(id, ty, range)?;
        self.buffer_mut()?.write_u32(offset, value)
    }

    /// Re-initialize the tree's cached body list as `ty`, or create it.
    fn body_list(&mut self, version: Version, ty: ObjectType, length: usize) -> Result<NodeId> {
        let Some(id) = self.body_list.filter(|id| self.node(*id).is_ok()) else {
            let id = self.new_child(version, ty, Some(length))?;
            self.body_list = Some(id);
            return Ok(id);
        };
        let info = REGISTRY
            .initializer_for(version, ty)
            .ok_or(Error::InvalidArgument("type does not exist at this version"))?;
        let node = self.node_mut(id)?;
        node.version = version;
        node.object_type = ty;
        node.length = length;
        node.ops = info.ops;
        Ok(id)
    }

    /// Bind a list node over the elements of a 1.3 hello message.
    ///
    /// Every call returns the same node, re-bound over the current body,
    /// until it is released or the buffer is rebound.
    ///
    /// # Returns
    ///
    /// * `Result<NodeId>` - The list node, attached at offset 8.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the root is not a 1.3 hello.
    pub fn hello_elements(&mut self) -> Result<NodeId> {
        let root = self.typed(NodeId::ROOT, ObjectType::Hello)?;
        if root.version != Version::V1_3 {
            return Err(Error::InvalidArgument("hello elements exist only in 1.3"));
        }
        let length = root
            .length
            .checked_sub(field::hello::ELEMENTS)
            .ok_or(Error::InvalidArgument("hello message shorter than its header"))?;
        let list = self.body_list(root.version, ObjectType::ListHelloElem, length)?;
        self.attach_child(NodeId::ROOT, list, field::hello::ELEMENTS, 0)?;
        Ok(list)
    }

    /// Bind a list node over the actions of a packet-out message.
    ///
    /// The list's length is kept in the message's `actions_len` field, so
    /// appending to it updates that field as well as the message length.
    /// Like [`Object::hello_elements`], repeated calls reuse one node.
    ///
    /// # Returns
    ///
    /// * `Result<NodeId>` - The list node, spanning `actions_len` bytes.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the root is not a packet-out or its actions
    /// run past the end of the message.
    pub fn packet_out_actions(&mut self) -> Result<NodeId> {
        let root = self.typed(NodeId::ROOT, ObjectType::PacketOut)?;
        let (actions_len, start, writer): (field::Field, usize, LengthSetFn) =
            if root.version == Version::V1_0 {
                (
                    field::packet_out_v1::ACTIONS_LEN,
                    field::packet_out_v1::ACTIONS,
                    actions_len_set_v1,
                )
            } else {
                (
                    field::packet_out_v2::ACTIONS_LEN,
                    field::packet_out_v2::ACTIONS,
                    actions_len_set_v2,
                )
            };
        let length = self.read_u16_field(NodeId::ROOT, ObjectType::PacketOut, actions_len)? as usize;
        if start.saturating_add(length) > root.length {
            return Err(Error::InvalidArgument("actions run past the end of the message"));
        }

        let list = self.body_list(root.version, ObjectType::ListAction, length)?;
        self.attach_child(NodeId::ROOT, list, start, 0)?;
        self.set_length_writer(list, writer)?;
        Ok(list)
    }

    /// Buffer id of a packet-out message.
    pub fn packet_out_buffer_id(&self) -> Result<u32> {
        let range = match self.root.version {
            Version::V1_0 => field::packet_out_v1::BUFFER_ID,
            _ => field::packet_out_v2::BUFFER_ID,
        };
        self.read_u32_field(NodeId::ROOT, ObjectType::PacketOut, range)
    }

    /// Set the buffer id of a packet-out message.
    ///
    /// # Arguments
    ///
    /// * `buffer_id` - Switch buffer id, or `0xFFFF_FFFF` for none.
    pub fn set_packet_out_buffer_id(&mut self, buffer_id: u32) -> Result<()> {
        let range = match self.root.version {
            Version::V1_0 => field::packet_out_v1::BUFFER_ID,
            _ => field::packet_out_v2::BUFFER_ID,
        };
        self.write_u32_field(NodeId::ROOT, ObjectType::PacketOut, range, buffer_id)
    }

    /// Ingress port of a packet-out message, widened to 32 bits for 1.0.
    pub fn packet_out_in_port(&self) -> Result<u32> {
        match self.root.version {
            Version::V1_0 => self
                .read_u16_field(NodeId::ROOT, ObjectType::PacketOut, field::packet_out_v1::IN_PORT)
                .map(u32::from),
            _ => self.read_u32_field(
                NodeId::ROOT,
                ObjectType::PacketOut,
                field::packet_out_v2::IN_PORT,
            ),
        }
    }

    /// Set the ingress port of a packet-out message.
    ///
    /// # Arguments
    ///
    /// * `port` - Port number; 1.0 messages carry only the low 16 bits.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if a 1.0 port does not fit in 16 bits.
    pub fn set_packet_out_in_port(&mut self, port: u32) -> Result<()> {
        match self.root.version {
            Version::V1_0 => {
                let port = u16::try_from(port)
                    .map_err(|_| Error::InvalidArgument("1.0 ports are 16 bits wide"))?;
                self.write_u16_field(
                    NodeId::ROOT,
                    ObjectType::PacketOut,
                    field::packet_out_v1::IN_PORT,
                    port,
                )
            }
            _ => self.write_u32_field(
                NodeId::ROOT,
                ObjectType::PacketOut,
                field::packet_out_v2::IN_PORT,
                port,
            ),
        }
    }

    /// Output port of an output action.
    pub fn action_output_port(&self, id: NodeId) -> Result<u32> {
        match self.node(id)?.version {
            Version::V1_0 => self
                .read_u16_field(id, ObjectType::ActionOutput, field::action_output_v1::PORT)
                .map(u32::from),
            _ => self.read_u32_field(id, ObjectType::ActionOutput, field::action_output_v2::PORT),
        }
    }

    /// Set the output port of an output action.
    ///
    /// # Arguments
    ///
    /// * `id` - An attached output action.
    /// * `port` - Port number, at most 16 bits wide for 1.0.
    pub fn set_action_output_port(&mut self, id: NodeId, port: u32) -> Result<()> {
        match self.node(id)?.version {
            Version::V1_0 => {
                let port = u16::try_from(port)
                    .map_err(|_| Error::InvalidArgument("1.0 ports are 16 bits wide"))?;
                self.write_u16_field(id, ObjectType::ActionOutput, field::action_output_v1::PORT, port)
            }
            _ => self.write_u32_field(
                id,
                ObjectType::ActionOutput,
                field::action_output_v2::PORT,
                port,
            ),
        }
    }

    /// Bytes an output action sends to the controller.
    pub fn action_output_max_len(&self, id: NodeId) -> Result<u16> {
        let range = match self.node(id)?.version {
            Version::V1_0 => field::action_output_v1::MAX_LEN,
            _ => field::action_output_v2::MAX_LEN,
        };
        self.read_u16_field(id, ObjectType::ActionOutput, range)
    }

    /// Set the controller byte count of an output action.
    pub fn set_action_output_max_len(&mut self, id: NodeId, max_len: u16) -> Result<()> {
        let range = match self.node(id)?.version {
            Version::V1_0 => field::action_output_v1::MAX_LEN,
            _ => field::action_output_v2::MAX_LEN,
        };
        self.write_u16_field(id, ObjectType::ActionOutput, range, max_len)
    }

    /// Group id of a group action.
    pub fn action_group_id(&self, id: NodeId) -> Result<u32> {
        self.read_u32_field(id, ObjectType::ActionGroup, field::action_group::GROUP_ID)
    }

    /// Set the group id of a group action.
    pub fn set_action_group_id(&mut self, id: NodeId, group_id: u32) -> Result<()> {
        self.write_u32_field(id, ObjectType::ActionGroup, field::action_group::GROUP_ID, group_id)
    }

    /// TTL of a set-IP-TTL action.
    pub fn action_nw_ttl(&self, id: NodeId) -> Result<u8> {
        let offset =
            self.field_offset(id, ObjectType::ActionSetNwTtl, field::action_set_nw_ttl::NW_TTL)?;
        self.wbuf.as_ref().ok_or(NO_BUFFER)?.read_u8(offset)
    }

    /// Set the TTL of a set-IP-TTL action.
    pub fn set_action_nw_ttl(&mut self, id: NodeId, ttl: u8) -> Result<()> {
        let offset =
            self.field_offset(id, ObjectType::ActionSetNwTtl, field::action_set_nw_ttl::NW_TTL)?;
        self.buffer_mut()?.write_u8(offset, ttl)
    }

    /// Bitmap words of a version-bitmap hello element.
    pub fn hello_elem_bitmaps(&self, id: NodeId) -> Result<Vec<u32>> {
        let node = self.typed(id, ObjectType::HelloElemVersionbitmap)?;
        let wbuf = self.wbuf.as_ref().ok_or(NO_BUFFER)?;
        let start = field::hello_elem_versionbitmap::BITMAPS;
        let count = node.length.saturating_sub(start) / field::hello_elem_versionbitmap::BITMAP_LEN;
        (0..count)
            .map(|i| {
                wbuf.read_u32(node.offset + start + i * field::hello_elem_versionbitmap::BITMAP_LEN)
            })
            .collect()
    }

    /// Set one bitmap word of a version-bitmap hello element.
    ///
    /// # Arguments
    ///
    /// * `id` - An attached version-bitmap element.
    /// * `index` - Word index; word `i` covers versions `32 * i` upwards.
    /// * `bitmap` - The word's value.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `index` is past the element's last word.
    pub fn set_hello_elem_bitmap(&mut self, id: NodeId, index: usize, bitmap: u32) -> Result<()> {
        let word = field::hello_elem_versionbitmap::BITMAP_LEN;
        let past_end = Error::InvalidArgument("field lies outside the object");
        let start = index
            .checked_mul(word)
            .and_then(|offset| offset.checked_add(field::hello_elem_versionbitmap::BITMAPS))
            .ok_or(past_end)?;
        let end = start.checked_add(word).ok_or(past_end)?;
        let offset = self.field_offset(id, ObjectType::HelloElemVersionbitmap, start..end)?;
        self.buffer_mut()?.write_u32(offset, bitmap)
    }
}

fn actions_len_set(
    wbuf: &mut WireBuffer<'_>,
    list_offset: usize,
    length: usize,
    actions_len: field::Field,
    actions: usize,
) -> Result<()> {
    let offset = list_offset
        .checked_sub(actions - actions_len.start)
        .ok_or(Error::InvalidArgument("actions list is not inside a packet-out"))?;
    let length = u16::try_from(length)
        .map_err(|_| Error::InvalidArgument("actions length exceeds the 16-bit field"))?;
    wbuf.write_u16(offset, length)
}

fn actions_len_set_v1(wbuf: &mut WireBuffer<'_>, list_offset: usize, length: usize) -> Result<()> {
    actions_len_set(
        wbuf,
        list_offset,
        length,
        field::packet_out_v1::ACTIONS_LEN,
        field::packet_out_v1::ACTIONS,
    )
}

fn actions_len_set_v2(wbuf: &mut WireBuffer<'_>, list_offset: usize, length: usize) -> Result<()> {
    actions_len_set(
        wbuf,
        list_offset,
        length,
        field::packet_out_v2::ACTIONS_LEN,
        field::packet_out_v2::ACTIONS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_out_scalars_v1() {
        let mut obj = Object::create_with_capacity(Version::V1_0, ObjectType::PacketOut, 64).unwrap();
        obj.set_packet_out_buffer_id(0xFFFF_FFFF).unwrap();
        obj.set_packet_out_in_port(3).unwrap();
        assert_eq!(obj.packet_out_buffer_id(), Ok(0xFFFF_FFFF));
        assert_eq!(obj.packet_out_in_port(), Ok(3));
        assert!(obj.set_packet_out_in_port(0x1_0000).is_err());
        assert_eq!(&obj.as_bytes()[8..14], &[0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x03]);
    }

    #[test]
    fn test_packet_out_scalars_v2() {
        let mut obj = Object::create_with_capacity(Version::V1_3, ObjectType::PacketOut, 64).unwrap();
        obj.set_packet_out_in_port(0xFFFF_FFFD).unwrap();
        assert_eq!(obj.packet_out_in_port(), Ok(0xFFFF_FFFD));
        assert_eq!(&obj.as_bytes()[12..16], &[0xFF, 0xFF, 0xFF, 0xFD]);
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let obj = Object::create_with_capacity(Version::V1_3, ObjectType::Hello, 64).unwrap();
        assert!(obj.packet_out_buffer_id().is_err());
        assert!(obj.action_group_id(NodeId::ROOT).is_err());
    }

    #[test]
    fn test_packet_out_actions_tracks_actions_len() {
        let mut obj = Object::create_with_capacity(Version::V1_3, ObjectType::PacketOut, 64).unwrap();
        let actions = obj.packet_out_actions().unwrap();

        let output = obj
            .new_child(Version::V1_3, ObjectType::ActionOutput, None)
            .unwrap();
        obj.append_bind(actions, output).unwrap();
        obj.set_action_output_port(output, 7).unwrap();
        obj.set_action_output_max_len(output, 0xFFE5).unwrap();

        let group = obj
            .new_child(Version::V1_3, ObjectType::ActionGroup, None)
            .unwrap();
        obj.append_bind(actions, group).unwrap();
        obj.set_action_group_id(group, 42).unwrap();

        assert_eq!(obj.length(), 48);
        assert_eq!(&obj.as_bytes()[16..18], &[0x00, 24]);
        assert_eq!(obj.action_output_port(output), Ok(7));
        assert_eq!(obj.action_output_max_len(output), Ok(0xFFE5));
        assert_eq!(obj.action_group_id(group), Ok(42));
    }

    #[test]
    fn test_packet_out_actions_v1_len_field() {
        let mut obj = Object::create_with_capacity(Version::V1_0, ObjectType::PacketOut, 64).unwrap();
        let actions = obj.packet_out_actions().unwrap();
        let output = obj
            .new_child(Version::V1_0, ObjectType::ActionOutput, None)
            .unwrap();
        obj.append_bind(actions, output).unwrap();
        assert_eq!(obj.length(), 24);
        assert_eq!(&obj.as_bytes()[14..16], &[0x00, 8]);
        assert_eq!(&obj.as_bytes()[16..20], &[0x00, 0x00, 0x00, 0x08]);
    }

    #[test]
    fn test_nw_ttl() {
        let mut obj = Object::create_with_capacity(Version::V1_2, ObjectType::ActionSetNwTtl, 8).unwrap();
        obj.set_action_nw_ttl(NodeId::ROOT, 64).unwrap();
        assert_eq!(obj.action_nw_ttl(NodeId::ROOT), Ok(64));
        assert_eq!(obj.as_bytes(), &[0x00, 23, 0x00, 0x08, 64, 0, 0, 0]);
    }

    #[test]
    fn test_hello_elements_and_bitmaps() {
        let mut obj = Object::create_with_capacity(Version::V1_3, ObjectType::Hello, 64).unwrap();
        let list = obj.hello_elements().unwrap();
        assert_eq!(obj[list].length(), 0);

        let elem = obj
            .new_child(Version::V1_3, ObjectType::HelloElemVersionbitmap, Some(12))
            .unwrap();
        obj.append_bind(list, elem).unwrap();
        obj.set_hello_elem_bitmap(elem, 0, 0x12).unwrap();
        obj.set_hello_elem_bitmap(elem, 1, 0x80).unwrap();
        assert!(obj.set_hello_elem_bitmap(elem, 2, 0).is_err());
        assert_eq!(
            obj.set_hello_elem_bitmap(elem, usize::MAX / 2, 1),
            Err(Error::InvalidArgument("field lies outside the object"))
        );
        assert_eq!(
            obj.set_hello_elem_bitmap(elem, usize::MAX, 1),
            Err(Error::InvalidArgument("field lies outside the object"))
        );
        assert_eq!(obj.hello_elem_bitmaps(elem), Ok(vec![0x12, 0x80]));
        assert_eq!(obj.length(), 20);
    }

    #[test]
    fn test_list_getters_reuse_one_node() {
        let mut obj = Object::create_with_capacity(Version::V1_3, ObjectType::PacketOut, 64).unwrap();
        let first = obj.packet_out_actions().unwrap();
        for _ in 0..1000 {
            assert_eq!(obj.packet_out_actions(), Ok(first));
        }
        assert_eq!(obj.child_count(), 1);
        assert_eq!(obj.children.len(), 1);

        let group = obj
            .new_child(Version::V1_3, ObjectType::ActionGroup, None)
            .unwrap();
        obj.append_bind(first, group).unwrap();
        let again = obj.packet_out_actions().unwrap();
        assert_eq!(again, first);
        assert_eq!(obj[again].length(), 8);
        assert_eq!(obj.child_count(), 2);
    }

    #[test]
    fn test_released_list_is_recreated() {
        let mut obj = Object::create_with_capacity(Version::V1_3, ObjectType::Hello, 64).unwrap();
        let list = obj.hello_elements().unwrap();
        obj.release_child(list).unwrap();
        assert!(obj.get(list).is_none());

        let list = obj.hello_elements().unwrap();
        assert_eq!(obj[list].offset(), 8);
        assert_eq!(obj.children.len(), 1);
    }

    #[test]
    fn test_hello_elements_require_1_3() {
        let mut obj = Object::create_with_capacity(Version::V1_0, ObjectType::Hello, 64).unwrap();
        assert!(obj.hello_elements().is_err());
    }
}
