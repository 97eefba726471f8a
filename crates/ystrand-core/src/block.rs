//! Blocks of a replica's operation log
//!
//! A [`Block`] is either a live or tombstoned [`Item`] or a garbage-collected
//! range. Structural links between items are [`ID`] handles; the owner of
//! every block is its client's list in the block store.

use serde::{Deserialize, Serialize};

use crate::content::{ItemContent, OffsetKind, BLOCK_GC_REF_NUMBER};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{Error, Result};
use crate::id::{BlockRange, ID};

pub const ITEM_FLAG_MARKED: u8 = 0b0000_1000;
pub const ITEM_FLAG_DELETED: u8 = 0b0000_0100;
pub const ITEM_FLAG_COUNTABLE: u8 = 0b0000_0010;
pub const ITEM_FLAG_KEEP: u8 = 0b0000_0001;

pub const HAS_ORIGIN: u8 = 0b1000_0000;
pub const HAS_RIGHT_ORIGIN: u8 = 0b0100_0000;
pub const HAS_PARENT_SUB: u8 = 0b0010_0000;

/// Mask of the ref number inside an info byte
pub const REF_NUMBER_MASK: u8 = 0b0000_1111;

/// Item state bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemFlags(u8);

impl ItemFlags {
    pub fn new(source: u8) -> Self {
        Self(source)
    }

    pub fn set(&mut self, value: u8) {
        self.0 |= value;
    }

    pub fn clear(&mut self, value: u8) {
        self.0 &= !value;
    }

    /// All bits of `value` are set
    pub fn check(&self, value: u8) -> bool {
        self.0 & value == value
    }

    pub fn is_keep(&self) -> bool {
        self.check(ITEM_FLAG_KEEP)
    }

    pub fn is_countable(&self) -> bool {
        self.check(ITEM_FLAG_COUNTABLE)
    }

    pub fn is_deleted(&self) -> bool {
        self.check(ITEM_FLAG_DELETED)
    }

    pub fn is_marked(&self) -> bool {
        self.check(ITEM_FLAG_MARKED)
    }

    pub fn set_countable(&mut self) {
        self.set(ITEM_FLAG_COUNTABLE)
    }

    pub fn clear_countable(&mut self) {
        self.clear(ITEM_FLAG_COUNTABLE)
    }

    pub fn set_deleted(&mut self) {
        self.set(ITEM_FLAG_DELETED)
    }
}

impl From<ItemFlags> for u8 {
    fn from(flags: ItemFlags) -> u8 {
        flags.0
    }
}

/// Where an item lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parent {
    /// A root type addressed by name
    Root(String),
    /// A nested type, addressed by the item that created it
    Branch(ID),
    /// Not transmitted; derived from the origins during integration
    Unknown,
}

/// A single insertion
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ID,
    pub len: u32,
    pub left: Option<ID>,
    pub right: Option<ID>,
    pub origin: Option<ID>,
    pub right_origin: Option<ID>,
    pub content: ItemContent,
    pub parent: Parent,
    pub parent_sub: Option<String>,
    pub moved: Option<ID>,
    pub info: ItemFlags,
}

impl Item {
    /// Create an item. Its length and countable flag follow from `content`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ID,
        left: Option<ID>,
        origin: Option<ID>,
        right: Option<ID>,
        right_origin: Option<ID>,
        parent: Parent,
        parent_sub: Option<String>,
        content: ItemContent,
    ) -> Self {
        let mut info = ItemFlags::default();
        if content.is_countable() {
            info.set_countable();
        }
        Self {
            id,
            len: content.len(OffsetKind::Utf16),
            left,
            right,
            origin,
            right_origin,
            content,
            parent,
            parent_sub,
            moved: None,
            info,
        }
    }

    pub fn contains(&self, id: &ID) -> bool {
        self.id.client == id.client
            && id.clock >= self.id.clock
            && id.clock - self.id.clock < self.len
    }

    pub fn last_id(&self) -> ID {
        ID::new(
            self.id.client,
            self.id.clock.saturating_add(self.len.saturating_sub(1)),
        )
    }

    pub fn is_deleted(&self) -> bool {
        self.info.is_deleted()
    }

    pub fn is_countable(&self) -> bool {
        self.info.is_countable()
    }

    pub fn mark_as_deleted(&mut self) {
        self.info.set_deleted();
    }

    pub fn content_len(&self, kind: OffsetKind) -> u32 {
        self.content.len(kind)
    }

    /// Wire info byte: origin bits plus the content ref number
    pub fn info(&self) -> u8 {
        let mut info = 0;
        if self.origin.is_some() {
            info |= HAS_ORIGIN;
        }
        if self.right_origin.is_some() {
            info |= HAS_RIGHT_ORIGIN;
        }
        if self.parent_sub.is_some() {
            info |= HAS_PARENT_SUB;
        }
        info | (self.content.ref_number() & REF_NUMBER_MASK)
    }

    /// Write the item as if it started `offset` clocks later.
    ///
    /// A sliced item's origin becomes the clock right before the slice.
    /// Nothing is written when the item cannot be encoded.
    pub fn encode<E: Encoder>(&self, encoder: &mut E, offset: u32) -> Result<()> {
        self.content.check_offset(offset)?;
        let origin = if offset > 0 {
            Some(ID::new(self.id.client, self.id.clock.saturating_add(offset - 1)))
        } else {
            self.origin
        };
        if origin.is_none() && self.right_origin.is_none() && self.parent == Parent::Unknown {
            return Err(Error::UnknownParent(self.id));
        }
        let mut info = self.info();
        if origin.is_some() {
            info |= HAS_ORIGIN;
        }

        encoder.write_info(info);
        if let Some(origin) = &origin {
            encoder.write_left_id(origin);
        }
        if let Some(right_origin) = &self.right_origin {
            encoder.write_right_id(right_origin);
        }
        if origin.is_none() && self.right_origin.is_none() {
            match &self.parent {
                Parent::Root(name) => {
                    encoder.write_parent_info(true);
                    encoder.write_key(name);
                }
                Parent::Branch(id) => {
                    encoder.write_parent_info(false);
                    encoder.write_left_id(id);
                }
                Parent::Unknown => return Err(Error::UnknownParent(self.id)),
            }
            if let Some(parent_sub) = &self.parent_sub {
                encoder.write_key(parent_sub);
            }
        }
        self.content.encode(encoder, offset)
    }

    /// Read the rest of an item whose `info` byte was already consumed
    pub fn decode<D: Decoder>(decoder: &mut D, id: ID, info: u8) -> Result<Self> {
        let origin = if info & HAS_ORIGIN != 0 {
            Some(decoder.read_left_id()?)
        } else {
            None
        };
        let right_origin = if info & HAS_RIGHT_ORIGIN != 0 {
            Some(decoder.read_right_id()?)
        } else {
            None
        };

        let mut parent = Parent::Unknown;
        let mut parent_sub = None;
        if origin.is_none() && right_origin.is_none() {
            parent = if decoder.read_parent_info()? {
                Parent::Root(decoder.read_key()?)
            } else {
                Parent::Branch(decoder.read_left_id()?)
            };
            if info & HAS_PARENT_SUB != 0 {
                parent_sub = Some(decoder.read_key()?);
            }
        }

        let content = ItemContent::decode(decoder, info & REF_NUMBER_MASK)?;
        Ok(Item::new(
            id,
            None,
            origin,
            None,
            right_origin,
            parent,
            parent_sub,
            content,
        ))
    }
}

/// An entry in a client's block list
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Item(Box<Item>),
    /// Garbage-collected clocks
    GC(BlockRange),
}

impl Block {
    pub fn id(&self) -> &ID {
        match self {
            Block::Item(item) => &item.id,
            Block::GC(gc) => &gc.id,
        }
    }

    pub fn len(&self) -> u32 {
        match self {
            Block::Item(item) => item.len,
            Block::GC(gc) => gc.len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last_id(&self) -> ID {
        match self {
            Block::Item(item) => item.last_id(),
            Block::GC(gc) => gc.last_id(),
        }
    }

    /// GC blocks always count as deleted
    pub fn is_deleted(&self) -> bool {
        match self {
            Block::Item(item) => item.is_deleted(),
            Block::GC(_) => true,
        }
    }

    pub fn is_gc(&self) -> bool {
        matches!(self, Block::GC(_))
    }

    pub fn is_item(&self) -> bool {
        matches!(self, Block::Item(_))
    }

    pub fn as_item(&self) -> Option<&Item> {
        match self {
            Block::Item(item) => Some(&**item),
            Block::GC(_) => None,
        }
    }

    pub fn as_item_mut(&mut self) -> Option<&mut Item> {
        match self {
            Block::Item(item) => Some(&mut **item),
            Block::GC(_) => None,
        }
    }

    /// Both are items or both are GC
    pub fn same_type(&self, other: &Block) -> bool {
        self.is_item() == other.is_item()
    }

    pub fn contains(&self, id: &ID) -> bool {
        match self {
            Block::Item(item) => item.contains(id),
            Block::GC(gc) => gc.contains(id),
        }
    }

    pub fn encode<E: Encoder>(&self, encoder: &mut E, offset: u32) -> Result<()> {
        match self {
            Block::Item(item) => item.encode(encoder, offset),
            Block::GC(gc) => {
                if offset > gc.len {
                    return Err(Error::InvalidOffset {
                        offset,
                        len: gc.len,
                    });
                }
                encoder.write_info(BLOCK_GC_REF_NUMBER);
                encoder.write_len(gc.len - offset);
                Ok(())
            }
        }
    }
}

impl From<Item> for Block {
    fn from(item: Item) -> Self {
        Block::Item(Box::new(item))
    }
}
