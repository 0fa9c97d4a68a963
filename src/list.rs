//! List module
//!
//! A list is a node whose content is a run of same-family elements with no
//! list-level header: its length is exactly the sum of its elements'
//! lengths. Elements are appended at the tail, growing the buffer and
//! every enclosing length, and iterated with a cursor node that is moved
//! along the list by re-attaching it.

use crate::error::{Error, Result};
use crate::object::{NO_BUFFER, NodeId, Object};

impl<'a> Object<'a> {
    /// Append `child` at the tail of `list`, reserving `child`'s length.
    ///
    /// The child's length and type tags are written into the reserved
    /// bytes, then the length delta is propagated from `list` upwards.
    ///
    /// # Arguments
    ///
    /// * `list` - Attached list node.
    /// * `child` - Node to append; its current length is reserved.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` for a missing buffer, stale handles, or a list
    ///   length that overflows.
    /// * `ResourceExhausted` if the list would grow past the buffer's
    ///   allocated capacity.
    pub fn append_bind(&mut self, list: NodeId, child: NodeId) -> Result<()> {
        let list_node = *self.node(list)?;
        let child_len = self.node(child)?.length;
        let new_len = grown_length(list_node.length, child_len)?;
        self.ensure_can_grow(list, new_len)?;

        self.attach_child(list, child, list_node.length, child_len)?;
        self.push_wire_values(child)?;
        self.propagate_length_delta(list, child_len)
    }

    /// Append a complete, separately built object to the tail of `list` by
    /// copying its bytes.
    ///
    /// `list` must end where its buffer ends.
    ///
    /// # Arguments
    ///
    /// * `list` - Attached list node.
    /// * `item` - Root object whose bytes are copied in.
    ///
    /// # Errors
    ///
    /// As [`Object::append_bind`].
    pub fn append(&mut self, list: NodeId, item: &Object<'_>) -> Result<()> {
        let bytes = item.bytes(NodeId::ROOT)?;
        let list_node = *self.node(list)?;
        self.ensure_can_grow(list, grown_length(list_node.length, bytes.len())?)?;

        let start = list_node.offset + list_node.length;
        let wbuf = self.buffer_mut()?;
        wbuf.grow(start + bytes.len())?;
        wbuf.write_bytes(start, bytes)?;
        self.propagate_length_delta(list, bytes.len())
    }

    /// Position `child` on the first element of `list`.
    ///
    /// The child's length is not known until it is initialized from the
    /// wire, see [`Object::first_element`].
    ///
    /// # Errors
    ///
    /// `OutOfRange` if the list is empty; `child` is left untouched.
    pub fn first(&mut self, list: NodeId, child: NodeId) -> Result<()> {
        let list_node = *self.node(list)?;
        self.node(child)?;
        if list_node.length == 0 {
            return Err(Error::OutOfRange);
        }
        self.attach_child(list, child, 0, 0)
    }

    /// Whether `child` ends at or beyond the end of `list`.
    ///
    /// # Returns
    ///
    /// * `Result<bool>` - `true` when no element follows `child`.
    pub fn is_last(&self, list: NodeId, child: NodeId) -> Result<bool> {
        let list_node = self.node(list)?;
        let child_node = self.node(child)?;
        Ok(child_node.offset.saturating_add(child_node.length)
            >= list_node.offset.saturating_add(list_node.length))
    }

    /// Move `child` to the element following it in `list`.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` if the child's length is still 0 or it does not
    ///   lie inside the list.
    /// * `OutOfRange` if `child` is the last element.
    pub fn next(&mut self, list: NodeId, child: NodeId) -> Result<()> {
        let list_node = *self.node(list)?;
        let child_node = *self.node(child)?;
        if child_node.length == 0 {
            return Err(Error::InvalidArgument(
                "list cursor has no length; initialize it from the wire first",
            ));
        }
        if self.is_last(list, child)? {
            return Err(Error::OutOfRange);
        }
        let relative = child_node
            .offset
            .checked_sub(list_node.offset)
            .ok_or(Error::InvalidArgument("list cursor lies before the list"))?;
        let offset = relative
            .checked_add(child_node.length)
            .ok_or(Error::InvalidArgument("list cursor length overflows"))?;
        self.attach_child(list, child, offset, 0)
    }

    /// [`Object::first`], then decode the element's concrete type and
    /// length, bounded by the list.
    pub fn first_element(&mut self, list: NodeId, child: NodeId) -> Result<()> {
        self.first(list, child)?;
        self.init_element(list, child)
    }

    /// [`Object::next`], then decode the element's concrete type and
    /// length, bounded by what remains of the list.
    pub fn next_element(&mut self, list: NodeId, child: NodeId) -> Result<()> {
        self.next(list, child)?;
        self.init_element(list, child)
    }

    fn init_element(&mut self, list: NodeId, child: NodeId) -> Result<()> {
        let list_node = *self.node(list)?;
        let child_node = *self.node(child)?;
        let family = list_node
            .object_type()
            .element_family()
            .unwrap_or(child_node.object_type().family());
        let remaining = (list_node.offset + list_node.length).saturating_sub(child_node.offset);
        self.wire_init(child, family, remaining)
    }

    fn ensure_can_grow(&self, list: NodeId, new_len: usize) -> Result<()> {
        if self.can_grow(list, new_len) {
            return Ok(());
        }
        let wbuf = self.wire_buffer().ok_or(NO_BUFFER)?;
        Err(Error::ResourceExhausted {
            needed: self.node(list)?.offset.saturating_add(new_len),
            available: wbuf.alloc_bytes(),
        })
    }
}

fn grown_length(length: usize, delta: usize) -> Result<usize> {
    length
        .checked_add(delta)
        .ok_or(Error::InvalidArgument("list length overflows"))
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::object::{NodeId, Object};
    use crate::registry::{ObjectType, Version};

    fn hello_with_list(capacity: usize) -> (Object<'static>, NodeId) {
        let mut obj = Object::create_with_capacity(Version::V1_3, ObjectType::Hello, capacity).unwrap();
        let list = obj
            .new_child(Version::V1_3, ObjectType::ListHelloElem, None)
            .unwrap();
        obj.attach_child(NodeId::ROOT, list, 8, 0).unwrap();
        (obj, list)
    }

    fn bitmap(obj: &mut Object<'_>, len: usize) -> NodeId {
        obj.new_child(Version::V1_3, ObjectType::HelloElemVersionbitmap, Some(len))
            .unwrap()
    }

    #[test]
    fn test_append_bind_accumulates_lengths() {
        let (mut obj, list) = hello_with_list(64);
        for len in [8, 12, 8] {
            let elem = bitmap(&mut obj, len);
            obj.append_bind(list, elem).unwrap();
        }
        assert_eq!(obj[list].length(), 28);
        assert_eq!(obj.length(), 36);
        assert_eq!(obj.wire_buffer().unwrap().current_bytes(), 36);
        assert_eq!(&obj.as_bytes()[2..4], &[0x00, 36]);
        assert_eq!(&obj.as_bytes()[16..20], &[0x00, 0x01, 0x00, 12]);
    }

    #[test]
    fn test_iteration_visits_prefix_sums() {
        let (mut obj, list) = hello_with_list(64);
        for len in [8, 12, 8] {
            let elem = bitmap(&mut obj, len);
            obj.append_bind(list, elem).unwrap();
        }

        let cursor = obj
            .new_child(Version::V1_3, ObjectType::HelloElem, None)
            .unwrap();
        let mut seen = Vec::new();
        obj.first_element(list, cursor).unwrap();
        loop {
            seen.push((obj[cursor].offset() - obj[list].offset(), obj[cursor].length()));
            match obj.next_element(list, cursor) {
                Ok(()) => {}
                Err(Error::OutOfRange) => break,
                Err(err) => panic!("unexpected error {:?}", err),
            }
        }
        assert_eq!(seen, vec![(0, 8), (8, 12), (20, 8)]);
        assert_eq!(
            obj[cursor].object_type(),
            ObjectType::HelloElemVersionbitmap
        );
        assert_eq!(obj.is_last(list, cursor), Ok(true));
    }

    #[test]
    fn test_first_on_empty_list() {
        let (mut obj, list) = hello_with_list(64);
        let cursor = obj
            .new_child(Version::V1_3, ObjectType::HelloElem, None)
            .unwrap();
        assert_eq!(obj.first(list, cursor), Err(Error::OutOfRange));
        assert!(!obj[cursor].is_attached());
        assert_eq!(obj[cursor].offset(), 0);
        assert_eq!(obj[cursor].parent(), None);
    }

    #[test]
    fn test_append_bind_respects_capacity() {
        let (mut obj, list) = hello_with_list(16);
        let elem = bitmap(&mut obj, 12);
        assert_eq!(
            obj.append_bind(list, elem),
            Err(Error::ResourceExhausted {
                needed: 20,
                available: 16
            })
        );
        assert_eq!(obj.length(), 8);
        assert!(!obj[elem].is_attached());

        let elem = bitmap(&mut obj, 8);
        obj.append_bind(list, elem).unwrap();
        assert_eq!(obj.length(), 16);
    }

    #[test]
    fn test_append_bind_oversized_child() {
        let (mut obj, list) = hello_with_list(64);
        let huge = bitmap(&mut obj, usize::MAX);
        assert_eq!(
            obj.append_bind(list, huge),
            Err(Error::ResourceExhausted {
                needed: usize::MAX,
                available: 64
            })
        );

        let elem = bitmap(&mut obj, 8);
        obj.append_bind(list, elem).unwrap();
        assert_eq!(
            obj.append_bind(list, huge),
            Err(Error::InvalidArgument("list length overflows"))
        );
        assert_eq!(obj.length(), 16);
        assert!(!obj[huge].is_attached());
    }

    #[test]
    fn test_next_requires_initialized_cursor() {
        let (mut obj, list) = hello_with_list(64);
        let elem = bitmap(&mut obj, 8);
        obj.append_bind(list, elem).unwrap();

        let cursor = obj
            .new_child(Version::V1_3, ObjectType::HelloElem, Some(0))
            .unwrap();
        obj.first(list, cursor).unwrap();
        assert!(matches!(
            obj.next(list, cursor),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_append_copies_built_object() {
        let mut msg = Object::create_with_capacity(Version::V1_3, ObjectType::Hello, 64).unwrap();
        let list = msg
            .new_child(Version::V1_3, ObjectType::ListHelloElem, None)
            .unwrap();
        msg.attach_child(NodeId::ROOT, list, 8, 0).unwrap();

        let item = Object::create_with_capacity(
            Version::V1_3,
            ObjectType::HelloElemVersionbitmap,
            8,
        )
        .unwrap();
        msg.append(list, &item).unwrap();
        msg.append(list, &item).unwrap();

        assert_eq!(msg.length(), 16);
        assert_eq!(msg[list].length(), 8);
        assert_eq!(&msg.as_bytes()[8..16], &[0x00, 0x01, 0x00, 0x04, 0x00, 0x01, 0x00, 0x04]);
    }
}
