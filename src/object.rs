//! Object module
//!
//! This module contains the `Object` type, a typed view into a
//! [`WireBuffer`](crate::wire_buffer::WireBuffer), together with the
//! child-attach, length-propagation and polymorphic wire-init protocols.
//!
//! An `Object` is the root of a tree. The root owns the wire buffer and an
//! arena of child nodes; children are addressed by [`NodeId`] handles that
//! carry only an offset/length view plus a parent link. Rebinding or
//! stealing the buffer invalidates every child handle at once.

use crate::config::{ObjectConfig, WIRE_BUFFER_MAX_LENGTH};
use crate::error::{Error, ParseError, Result};
use crate::field;
use crate::registry::{LengthSetFn, ObjectType, REGISTRY, Version, WireOps, message_type_get};
use crate::validator::validate_message;
use crate::wire_buffer::{ReleaseFn, WireBuffer};
use alloc::{boxed::Box, vec::Vec};
use core::fmt;
use core::mem;
use core::ops::Index;

/// Callback run right before a root object is destroyed.
pub type DeleteFn<'a> = Box<dyn FnOnce(&Object<'a>) + 'a>;

pub(crate) const NO_BUFFER: Error = Error::InvalidArgument("object has no wire buffer");
const STALE_HANDLE: Error = Error::InvalidArgument("stale or unknown object handle");

/// Handle to a node in an object tree.
///
/// A handle is stamped with the tree's buffer epoch and the generation of
/// its arena slot, so it goes stale when the buffer is rebound or stolen
/// and when the node is released with [`Object::release_child`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    slot: u32,
    epoch: u32,
    generation: u32,
}

impl NodeId {
    /// The root object itself. Never goes stale.
    pub const ROOT: NodeId = NodeId {
        slot: 0,
        epoch: 0,
        generation: 0,
    };

    /// True for [`NodeId::ROOT`].
    pub const fn is_root(self) -> bool {
        self.slot == 0
    }
}

/// A typed `(offset, length)` view into the tree's wire buffer.
#[derive(Debug, Clone, Copy)]
pub struct Node {
    pub(crate) version: Version,
    pub(crate) object_type: ObjectType,
    pub(crate) offset: usize,
    pub(crate) length: usize,
    pub(crate) parent: Option<NodeId>,
    pub(crate) attached: bool,
    pub(crate) ops: WireOps,
}

impl Node {
    const fn root() -> Node {
        Node {
            version: Version::V1_0,
            object_type: ObjectType::Header,
            offset: 0,
            length: 0,
            parent: None,
            attached: true,
            ops: WireOps::NONE,
        }
    }

    const fn detached(version: Version, object_type: ObjectType, length: usize, ops: WireOps) -> Node {
        Node {
            version,
            object_type,
            offset: 0,
            length,
            parent: None,
            attached: false,
            ops,
        }
    }

    /// Protocol version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Type discriminant.
    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    /// Absolute offset in the wire buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length in bytes.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Parent link, `None` for the root and for detached nodes.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Whether the node is attached to the wire buffer.
    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

/// One arena entry. Released slots keep their generation and are handed
/// out again by [`Object::new_child`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Slot {
    node: Node,
    generation: u32,
    live: bool,
}

/// A root wire object and the tree of views hanging off it.
///
/// The lifetime `'a` is that of caller memory the buffer borrows; objects
/// that allocate or adopt their bytes are `Object<'static>`.
pub struct Object<'a> {
    pub(crate) wbuf: Option<WireBuffer<'a>>,
    pub(crate) root: Node,
    pub(crate) children: Vec<Slot>,
    pub(crate) body_list: Option<NodeId>,
    epoch: u32,
    config: ObjectConfig,
    on_delete: Option<DeleteFn<'a>>,
}

impl Object<'static> {
    /// Create a root object.
    ///
    /// # Arguments
    ///
    /// * `bytes` - Capacity of a freshly allocated wire buffer. With 0 the
    ///   object has no buffer until [`Object::buffer_bind`] is called.
    ///
    /// # Returns
    ///
    /// * `Result<Object>` - An uninitialized root object.
    ///
    /// # Errors
    ///
    /// `ResourceExhausted` if the allocation fails.
    pub fn new(bytes: usize) -> Result<Object<'static>> {
        Self::with_config(bytes, ObjectConfig::default())
    }

    /// [`Object::new`] with an explicit configuration.
    pub fn with_config(bytes: usize, config: ObjectConfig) -> Result<Object<'static>> {
        let wbuf = if bytes > 0 {
            Some(WireBuffer::allocate(bytes)?)
        } else {
            None
        };
        Ok(Object::from_parts(wbuf, config))
    }

    /// Allocate a maximum-size buffer and initialize the root as `ty`.
    pub fn create(version: Version, ty: ObjectType) -> Result<Object<'static>> {
        Self::create_with_capacity(version, ty, WIRE_BUFFER_MAX_LENGTH)
    }

    /// Allocate `capacity` bytes and initialize the root as `ty`, writing
    /// its length and type tags.
    ///
    /// # Example
    ///
    /// ```
    /// use ofp_wire::object::Object;
    /// use ofp_wire::registry::{ObjectType, Version};
    ///
    /// let obj = Object::create_with_capacity(Version::V1_3, ObjectType::EchoRequest, 64).unwrap();
    /// assert_eq!(obj.as_bytes(), &[0x04, 0x02, 0x00, 0x08, 0, 0, 0, 0]);
    /// ```
    pub fn create_with_capacity(
        version: Version,
        ty: ObjectType,
        capacity: usize,
    ) -> Result<Object<'static>> {
        let mut obj = Object::new(capacity)?;
        obj.init(NodeId::ROOT, version, ty, None, true)?;
        Ok(obj)
    }

    /// Parse a received message, adopting `buffer` without copying.
    ///
    /// # Arguments
    ///
    /// * `buffer` - Received bytes; the first `length` must hold exactly
    ///   one message.
    /// * `length` - Length of the message in `buffer`.
    ///
    /// # Returns
    ///
    /// * `Result<Object>` - A root object typed from the message header.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` if `length` is 0 or exceeds the buffer, or the
    ///   version byte is not supported.
    /// * `Parse(Validation)` if the message is structurally invalid.
    pub fn new_from_message(buffer: Vec<u8>, length: usize) -> Result<Object<'static>> {
        let version = check_message(&buffer, length)?;
        let mut obj = Object::new(0)?;
        obj.adopt(WireBuffer::bind(buffer, length, None)?, version, length)?;
        Ok(obj)
    }
}

impl<'a> Object<'a> {
    fn from_parts(wbuf: Option<WireBuffer<'a>>, config: ObjectConfig) -> Object<'a> {
        Object {
            wbuf,
            root: Node::root(),
            children: Vec::new(),
            body_list: None,
            epoch: 1,
            config,
            on_delete: None,
        }
    }

    /// Parse a received message without allocating.
    ///
    /// The object is written into `storage` and borrows `buffer`; neither
    /// may be released while the returned object is in use. Any object
    /// already in `storage` is dropped first. The node arena is taken over
    /// from the previous object or from [`ObjectStorage::with_child_capacity`],
    /// so navigating the message allocates nothing while that capacity
    /// holds.
    ///
    /// # Errors
    ///
    /// As [`Object::new_from_message`].
    pub fn new_from_message_preallocated<'s>(
        storage: &'s mut ObjectStorage<'a>,
        buffer: &'a mut [u8],
        length: usize,
    ) -> Result<&'s mut Object<'a>> {
        let version = check_message(buffer, length)?;
        let mut children = match storage.slot.take() {
            Some(mut previous) => mem::take(&mut previous.children),
            None => mem::take(&mut storage.spare),
        };
        children.clear();
        let mut obj = Object::from_parts(None, ObjectConfig::default());
        obj.children = children;
        obj.adopt(WireBuffer::borrowed(buffer, length)?, version, length)?;
        Ok(storage.slot.insert(obj))
    }

    fn adopt(&mut self, wbuf: WireBuffer<'a>, version: Version, length: usize) -> Result<()> {
        let ty = message_type_get(&wbuf, 0, version)?;
        self.install(wbuf, length);
        self.init(NodeId::ROOT, version, ty, Some(length), false)
    }

    fn install(&mut self, wbuf: WireBuffer<'a>, length: usize) {
        self.reset_wire_state();
        self.wbuf = Some(wbuf);
        self.root.offset = 0;
        self.root.length = length;
    }

    fn reset_wire_state(&mut self) {
        self.children.clear();
        self.body_list = None;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Bind caller bytes to this object, replacing any prior wire state.
    ///
    /// The root comes to span the first `length` bytes. Handles to
    /// children of the previous buffer go stale. The previous buffer is
    /// dropped, running its release callback if it had one.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `buffer` is empty or `length` is 0 or exceeds
    /// it; the object is left untouched.
    pub fn buffer_bind(
        &mut self,
        buffer: Vec<u8>,
        length: usize,
        release: Option<ReleaseFn>,
    ) -> Result<()> {
        let wbuf = WireBuffer::bind(buffer, length, release)?;
        self.install(wbuf, length);
        Ok(())
    }

    /// Take the wire bytes out of the object.
    ///
    /// The object is left without a buffer and every child handle goes
    /// stale. No release callback runs.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if there is no buffer or it borrows caller memory.
    pub fn steal(&mut self) -> Result<Vec<u8>> {
        match &self.wbuf {
            None => return Err(NO_BUFFER),
            Some(wbuf) if wbuf.is_borrowed() => {
                return Err(Error::InvalidArgument(
                    "a borrowed wire buffer cannot be stolen",
                ));
            }
            Some(_) => {}
        }
        let wbuf = self.wbuf.take().ok_or(NO_BUFFER)?;
        self.reset_wire_state();
        self.root.length = 0;
        wbuf.steal()
    }

    /// Register a callback run when the object is deleted or dropped.
    pub fn set_delete_callback(&mut self, callback: impl FnOnce(&Object<'a>) + 'a) {
        self.on_delete = Some(Box::new(callback));
    }

    /// Destroy the object: run the delete callback, then release the buffer.
    pub fn delete(self) {
        drop(self);
    }

    /// Copy the bytes of `src` into a new, independent root object.
    ///
    /// The new buffer is sized to exactly `src`'s length; it has no spare
    /// capacity, so appending to the duplicate fails until it is rebound.
    pub fn duplicate(&self, src: NodeId) -> Result<Object<'static>> {
        let node = *self.node(src)?;
        if !node.attached {
            return Err(Error::InvalidArgument("object is not attached to a wire buffer"));
        }
        let bytes = self.wbuf.as_ref().ok_or(NO_BUFFER)?.bytes(node.offset, node.length)?;

        let mut dup = Object::with_config(node.length, self.config)?;
        dup.init(
            NodeId::ROOT,
            node.version,
            node.object_type,
            Some(node.length),
            false,
        )?;
        if let Some(wbuf) = dup.wbuf.as_mut() {
            wbuf.write_bytes(0, bytes)?;
        }
        Ok(dup)
    }

    /// Apply the registry initializer for `(version, ty)` to a node.
    ///
    /// # Arguments
    ///
    /// * `id` - Node to initialize.
    /// * `version` - Protocol version of the node.
    /// * `ty` - Concrete or base type to give it.
    /// * `length` - Object length; `None` uses the type's fixed length.
    /// * `clean_wire` - Write the length and type tags into the buffer.
    ///
    /// An attached node grows the buffer to cover itself.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the type does not exist at `version`.
    pub fn init(
        &mut self,
        id: NodeId,
        version: Version,
        ty: ObjectType,
        length: Option<usize>,
        clean_wire: bool,
    ) -> Result<()> {
        let info = REGISTRY
            .initializer_for(version, ty)
            .ok_or(Error::InvalidArgument("type does not exist at this version"))?;
        let node = self.node_mut(id)?;
        node.version = version;
        node.object_type = ty;
        node.length = length.unwrap_or(info.fixed_length);
        node.ops = info.ops;
        let node = *node;

        if node.attached {
            if let Some(wbuf) = self.wbuf.as_mut() {
                let end = node
                    .offset
                    .checked_add(node.length)
                    .ok_or(Error::InvalidArgument("object length overflows"))?;
                wbuf.grow(end)?;
                if clean_wire {
                    self.push_wire_values(id)?;
                }
            }
        }
        Ok(())
    }

    /// Create a detached node in this tree.
    ///
    /// The node is positioned later with [`Object::attach_child`] or one of
    /// the list operations. A slot freed by [`Object::release_child`] is
    /// reused before the arena grows.
    ///
    /// # Arguments
    ///
    /// * `version` - Protocol version of the node.
    /// * `ty` - Its type.
    /// * `length` - Object length; `None` uses the type's fixed length.
    ///
    /// # Returns
    ///
    /// * `Result<NodeId>` - A handle to the new node.
    pub fn new_child(
        &mut self,
        version: Version,
        ty: ObjectType,
        length: Option<usize>,
    ) -> Result<NodeId> {
        let info = REGISTRY
            .initializer_for(version, ty)
            .ok_or(Error::InvalidArgument("type does not exist at this version"))?;
        let node = Node::detached(version, ty, length.unwrap_or(info.fixed_length), info.ops);

        if let Some(index) = self.children.iter().position(|slot| !slot.live) {
            let slot = &mut self.children[index];
            slot.node = node;
            slot.live = true;
            return Ok(NodeId {
                slot: index as u32 + 1,
                epoch: self.epoch,
                generation: slot.generation,
            });
        }

        let slot = u32::try_from(self.children.len() + 1)
            .map_err(|_| Error::InvalidArgument("too many child objects"))?;
        self.children.push(Slot {
            node,
            generation: 0,
            live: true,
        });
        Ok(NodeId {
            slot,
            epoch: self.epoch,
            generation: 0,
        })
    }

    /// Free the arena slot of `id`; the handle goes stale.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for the root, a stale handle, or a node that is
    /// still the parent of another live node.
    pub fn release_child(&mut self, id: NodeId) -> Result<()> {
        if id.is_root() {
            return Err(Error::InvalidArgument("the root object cannot be released"));
        }
        self.node(id)?;
        if self
            .children
            .iter()
            .any(|slot| slot.live && slot.node.parent == Some(id))
        {
            return Err(Error::InvalidArgument("object still has children attached"));
        }
        let slot = self.slot_mut(id)?;
        slot.live = false;
        slot.generation = slot.generation.wrapping_add(1);
        if self.body_list == Some(id) {
            self.body_list = None;
        }
        Ok(())
    }

    /// Number of live child nodes in the arena.
    pub fn child_count(&self) -> usize {
        self.children.iter().filter(|slot| slot.live).count()
    }

    /// Attach `child` to `parent` at `offset` bytes into the parent.
    ///
    /// With `bytes == 0` this is read navigation: the child's length is
    /// left for a later [`Object::wire_init`]. With `bytes > 0` the buffer
    /// is grown to cover the reservation and the child takes that length.
    /// No length is propagated either way.
    ///
    /// # Arguments
    ///
    /// * `parent` - Attached node the child is positioned in.
    /// * `child` - Node to position.
    /// * `offset` - Offset of the child relative to the parent's start.
    /// * `bytes` - Bytes to reserve for the child, or 0 to navigate.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a missing buffer, a stale handle, a detached
    /// parent, an attempt to attach the root, or a position that overflows.
    /// `ResourceExhausted` if the reservation does not fit the buffer.
    pub fn attach_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        offset: usize,
        bytes: usize,
    ) -> Result<()> {
        if child.is_root() {
            return Err(Error::InvalidArgument("the root object cannot be attached"));
        }
        if parent == child {
            return Err(Error::InvalidArgument("an object cannot be its own parent"));
        }
        if self.wbuf.is_none() {
            return Err(NO_BUFFER);
        }
        let parent_node = *self.node(parent)?;
        if !parent_node.attached {
            return Err(Error::InvalidArgument("parent is not attached to a wire buffer"));
        }
        let absolute = parent_node
            .offset
            .checked_add(offset)
            .ok_or(Error::InvalidArgument("child offset overflows"))?;
        let end = absolute
            .checked_add(bytes)
            .ok_or(Error::InvalidArgument("child reservation overflows"))?;
        self.node(child)?;
        if bytes > 0 {
            self.buffer_mut()?.grow(end)?;
        }

        let node = self.node_mut(child)?;
        node.parent = Some(parent);
        node.offset = absolute;
        node.attached = true;
        if bytes > 0 {
            node.length = bytes;
        }
        log::trace!(
            "attached {:?} at offset {} ({} bytes reserved)",
            child,
            absolute,
            bytes
        );
        Ok(())
    }

    /// Whether `id` could reach `new_len` bytes without exceeding the
    /// buffer's allocated capacity.
    pub fn can_grow(&self, id: NodeId, new_len: usize) -> bool {
        match (self.node(id), self.wbuf.as_ref()) {
            (Ok(node), Some(wbuf)) => node
                .offset
                .checked_add(new_len)
                .is_some_and(|end| end <= wbuf.alloc_bytes()),
            _ => false,
        }
    }

    /// Add `delta` to the length of `id` and of every ancestor, writing each
    /// new length into the wire.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a stale or detached node, or a length that
    /// overflows.
    ///
    /// # Panics
    ///
    /// If the chain is longer than the configured maximum parent depth, if
    /// an object ends past the buffer, or if the root does not end exactly
    /// at the buffer's current length.
    pub fn propagate_length_delta(&mut self, id: NodeId, delta: usize) -> Result<()> {
        let max_depth = self.config.max_parent_depth;
        let mut cursor = Some(id);
        let mut depth = 0;

        while let Some(current) = cursor {
            depth += 1;
            assert!(
                depth <= max_depth,
                "length propagation exceeded the maximum parent depth of {}",
                max_depth
            );

            let mut node = *self.node(current)?;
            if !node.attached {
                return Err(Error::InvalidArgument("object is not attached to a wire buffer"));
            }
            node.length = node
                .length
                .checked_add(delta)
                .ok_or(Error::InvalidArgument("object length overflows"))?;
            self.node_mut(current)?.length = node.length;

            let wbuf = self.wbuf.as_mut().ok_or(NO_BUFFER)?;
            if let Some(length_set) = node.ops.length_set {
                length_set(wbuf, node.offset, node.length)?;
            }
            let end = node
                .offset
                .checked_add(node.length)
                .ok_or(Error::InvalidArgument("object length overflows"))?;
            let current_bytes = wbuf.current_bytes();
            assert!(
                end <= current_bytes,
                "object ends at {} past the wire buffer end {}",
                end,
                current_bytes
            );
            if node.parent.is_none() {
                assert_eq!(
                    end, current_bytes,
                    "root object does not span its wire buffer"
                );
            }
            cursor = node.parent;
        }
        Ok(())
    }

    /// Decode the concrete type of `id` from the wire.
    ///
    /// Reads the type tag with the node's current accessor, checks that it
    /// belongs to `family`, re-initializes the node as that type and reads
    /// its length. A node without a type tag keeps its type and only has
    /// its length read, or set to the family's fixed length when it has no
    /// length field either.
    ///
    /// # Arguments
    ///
    /// * `id` - Attached node to decode.
    /// * `family` - Base type the tag must belong to.
    /// * `max_len` - Upper bound on the decoded length; 0 means unbounded.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` if the node is not attached.
    /// * `Parse(UnknownType)` or `Parse(WrongFamily)` for a bad tag.
    /// * `Parse(BadLength)` if the length is below the type's fixed part
    ///   or above `max_len`.
    pub fn wire_init(&mut self, id: NodeId, family: ObjectType, max_len: usize) -> Result<()> {
        let node = *self.node(id)?;
        if !node.attached {
            return Err(Error::InvalidArgument("object is not attached to a wire buffer"));
        }
        let wbuf = self.wbuf.as_ref().ok_or(NO_BUFFER)?;
        let (ty, kept_ops) = match node.ops.type_get {
            Some(type_get) => {
                let ty = type_get(wbuf, node.offset, node.version)?;
                if ty.family() != family {
                    return Err(ParseError::WrongFamily {
                        expected: family,
                        found: ty,
                    }
                    .into());
                }
                (ty, None)
            }
            None => (node.object_type, Some(node.ops)),
        };

        let info = REGISTRY
            .initializer_for(node.version, ty)
            .ok_or(Error::InvalidArgument("type does not exist at this version"))?;
        let ops = kept_ops.unwrap_or(info.ops);
        let length = match ops.length_get {
            Some(length_get) => length_get(wbuf, node.offset)?,
            None => REGISTRY.fixed_length_for(node.version, family),
        };
        let min = info.fixed_length;
        if length < min || (max_len > 0 && length > max_len) {
            return Err(ParseError::BadLength {
                length,
                min,
                max: max_len,
            }
            .into());
        }

        let node = self.node_mut(id)?;
        node.object_type = ty;
        node.ops = ops;
        node.length = length;
        Ok(())
    }

    /// Transaction id of the root message.
    pub fn xid(&self) -> Result<u32> {
        let wbuf = self.wbuf.as_ref().ok_or(NO_BUFFER)?;
        wbuf.read_u32(self.root.offset + field::header::XID.start)
    }

    /// Set the transaction id of the root message.
    pub fn set_xid(&mut self, xid: u32) -> Result<()> {
        let offset = self.root.offset + field::header::XID.start;
        self.buffer_mut()?.write_u32(offset, xid)
    }

    /// Bytes of an attached node.
    pub fn bytes(&self, id: NodeId) -> Result<&[u8]> {
        let node = self.node(id)?;
        if !node.attached {
            return Err(Error::InvalidArgument("object is not attached to a wire buffer"));
        }
        self.wbuf
            .as_ref()
            .ok_or(NO_BUFFER)?
            .bytes(node.offset, node.length)
    }

    /// Mutable bytes of an attached node.
    pub fn bytes_mut(&mut self, id: NodeId) -> Result<&mut [u8]> {
        let node = *self.node(id)?;
        if !node.attached {
            return Err(Error::InvalidArgument("object is not attached to a wire buffer"));
        }
        self.buffer_mut()?.bytes_mut(node.offset, node.length)
    }

    /// The root object's bytes; empty without a buffer.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.wbuf {
            Some(wbuf) => wbuf.as_slice(),
            None => &[],
        }
    }

    /// Look up a node; `None` for stale or unknown handles.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.node(id).ok()
    }

    /// The root node.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Root length in bytes.
    pub fn length(&self) -> usize {
        self.root.length
    }

    /// The wire buffer, if bound.
    pub fn wire_buffer(&self) -> Option<&WireBuffer<'a>> {
        self.wbuf.as_ref()
    }

    /// Whether a wire buffer is bound.
    pub fn is_bound(&self) -> bool {
        self.wbuf.is_some()
    }

    /// The tree's configuration.
    pub fn config(&self) -> &ObjectConfig {
        &self.config
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node> {
        if id.is_root() {
            return Ok(&self.root);
        }
        if id.epoch != self.epoch {
            return Err(STALE_HANDLE);
        }
        self.children
            .get(id.slot as usize - 1)
            .filter(|slot| slot.live && slot.generation == id.generation)
            .map(|slot| &slot.node)
            .ok_or(STALE_HANDLE)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        if id.is_root() {
            return Ok(&mut self.root);
        }
        Ok(&mut self.slot_mut(id)?.node)
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut Slot> {
        if id.is_root() || id.epoch != self.epoch {
            return Err(STALE_HANDLE);
        }
        self.children
            .get_mut(id.slot as usize - 1)
            .filter(|slot| slot.live && slot.generation == id.generation)
            .ok_or(STALE_HANDLE)
    }

    pub(crate) fn buffer_mut(&mut self) -> Result<&mut WireBuffer<'a>> {
        self.wbuf.as_mut().ok_or(NO_BUFFER)
    }

    /// Write the node's length and type tags through its accessors.
    pub(crate) fn push_wire_values(&mut self, id: NodeId) -> Result<()> {
        let node = *self.node(id)?;
        let wbuf = self.buffer_mut()?;
        if let Some(length_set) = node.ops.length_set {
            length_set(wbuf, node.offset, node.length)?;
        }
        if let Some(type_set) = node.ops.type_set {
            type_set(wbuf, node.offset, node.version, node.object_type)?;
        }
        Ok(())
    }

    /// Replace the length writer of a node, for lists whose length lives in
    /// a field of the enclosing message.
    pub(crate) fn set_length_writer(&mut self, id: NodeId, length_set: LengthSetFn) -> Result<()> {
        self.node_mut(id)?.ops.length_set = Some(length_set);
        Ok(())
    }
}

/// Check `buffer[..length]` is a supported, structurally valid message.
fn check_message(buffer: &[u8], length: usize) -> Result<Version> {
    let message = buffer
        .get(..length)
        .filter(|message| !message.is_empty())
        .ok_or(Error::InvalidArgument("message length must lie within the buffer"))?;
    let version = Version::from_wire(message[field::header::VERSION.start])
        .ok_or(Error::InvalidArgument("unsupported protocol version"))?;
    validate_message(message).map_err(|err| {
        log::error!("rejecting {} byte message: {}", length, err);
        Error::from(ParseError::from(err))
    })?;
    Ok(version)
}

impl<'a> Index<NodeId> for Object<'a> {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        match self.node(id) {
            Ok(node) => node,
            Err(_) => panic!("stale or unknown object handle {:?}", id),
        }
    }
}

impl Drop for Object<'_> {
    fn drop(&mut self) {
        if let Some(callback) = self.on_delete.take() {
            callback(self);
        }
    }
}

impl fmt::Debug for Object<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Object")
            .field("wbuf", &self.wbuf)
            .field("root", &self.root)
            .field("children", &self.child_count())
            .field("config", &self.config)
            .finish()
    }
}

/// Caller-provided slot for [`Object::new_from_message_preallocated`].
///
/// Besides the object itself the storage keeps the node arena across
/// parses, so a reused storage stops allocating once it has seen the
/// deepest navigation it is used for.
#[derive(Default)]
pub struct ObjectStorage<'a> {
    slot: Option<Object<'a>>,
    spare: Vec<Slot>,
}

impl<'a> ObjectStorage<'a> {
    /// An empty slot.
    pub const fn new() -> Self {
        ObjectStorage {
            slot: None,
            spare: Vec::new(),
        }
    }

    /// An empty slot with room for `children` live child nodes.
    ///
    /// # Errors
    ///
    /// `ResourceExhausted` if the arena cannot be allocated.
    pub fn with_child_capacity(children: usize) -> Result<Self> {
        let mut spare = Vec::new();
        spare
            .try_reserve_exact(children)
            .map_err(|_| Error::ResourceExhausted {
                needed: children,
                available: 0,
            })?;
        Ok(ObjectStorage { slot: None, spare })
    }

    /// The object in the slot, if any.
    pub fn get(&self) -> Option<&Object<'a>> {
        self.slot.as_ref()
    }

    /// Drop the object in the slot, keeping its node arena.
    pub fn clear(&mut self) {
        if let Some(mut obj) = self.slot.take() {
            self.spare = mem::take(&mut obj.children);
            self.spare.clear();
        }
    }
}
