//! Updates exchanged between replicas
//!
//! ## V1 layout
//! ```text
//! var-uint clients
//! per client:  var-uint structs, client, var-uint first clock, struct*
//! struct:      info byte, then a GC length, a skip length or an item body
//! delete set
//! ```

use std::collections::HashMap;

use bytes::Bytes;
use tracing::debug;

use crate::block::{Block, Item, REF_NUMBER_MASK};
use crate::content::{BLOCK_GC_REF_NUMBER, BLOCK_SKIP_REF_NUMBER};
use crate::decoder::{Decoder, DecoderV1};
use crate::delete_set::DeleteSet;
use crate::encoder::{Encoder, EncoderV1};
use crate::error::{Error, Result};
use crate::id::{BlockRange, ClientID, ID};
use crate::state_vector::StateVector;

/// A block in transit, or a range of clocks the sender skipped
#[derive(Debug, Clone, PartialEq)]
pub enum BlockCarrier {
    Block(Block),
    Skip(BlockRange),
}

impl BlockCarrier {
    pub fn id(&self) -> &ID {
        match self {
            BlockCarrier::Block(block) => block.id(),
            BlockCarrier::Skip(skip) => &skip.id,
        }
    }

    pub fn len(&self) -> u32 {
        match self {
            BlockCarrier::Block(block) => block.len(),
            BlockCarrier::Skip(skip) => skip.len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, BlockCarrier::Skip(_))
    }

    pub fn encode<E: Encoder>(&self, encoder: &mut E, offset: u32) -> Result<()> {
        match self {
            BlockCarrier::Block(block) => block.encode(encoder, offset),
            BlockCarrier::Skip(skip) => {
                if offset > skip.len {
                    return Err(Error::InvalidOffset {
                        offset,
                        len: skip.len,
                    });
                }
                encoder.write_info(BLOCK_SKIP_REF_NUMBER);
                encoder.write_var_u32(skip.len - offset);
                Ok(())
            }
        }
    }
}

impl From<Block> for BlockCarrier {
    fn from(block: Block) -> Self {
        BlockCarrier::Block(block)
    }
}

/// Client → carriers ordered by clock
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateBlocks {
    clients: HashMap<ClientID, Vec<BlockCarrier>>,
}

impl UpdateBlocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_block(&mut self, carrier: BlockCarrier) {
        self.clients
            .entry(carrier.id().client)
            .or_default()
            .push(carrier);
    }

    pub fn is_empty(&self) -> bool {
        self.clients.values().all(Vec::is_empty)
    }

    pub fn get(&self, client: &ClientID) -> Option<&Vec<BlockCarrier>> {
        self.clients.get(client)
    }

    pub fn clients(&self) -> std::collections::hash_map::Iter<'_, ClientID, Vec<BlockCarrier>> {
        self.clients.iter()
    }

    /// Non-empty client lists, highest client first
    fn sorted_desc(&self) -> Vec<(&ClientID, &Vec<BlockCarrier>)> {
        let mut clients: Vec<_> = self
            .clients
            .iter()
            .filter(|(_, carriers)| !carriers.is_empty())
            .collect();
        clients.sort_by(|a, b| b.0.cmp(a.0));
        clients
    }
}

/// Blocks plus the deletions that go with them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    pub blocks: UpdateBlocks,
    pub delete_set: DeleteSet,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.delete_set.is_empty()
    }

    /// Clock each client's blocks start at
    pub fn state_vector_lower(&self) -> StateVector {
        self.blocks
            .clients()
            .filter_map(|(client, carriers)| {
                carriers
                    .iter()
                    .find(|carrier| !carrier.is_skip())
                    .map(|carrier| (*client, carrier.id().clock))
            })
            .collect()
    }

    /// Whether every client's blocks continue directly from `local`
    pub fn is_applicable(&self, local: &StateVector) -> bool {
        self.state_vector_lower()
            .iter()
            .all(|(client, clock)| *clock <= local.get(client))
    }

    /// Park this update when `local` lacks clocks it builds on
    pub fn into_pending(self, local: &StateVector) -> std::result::Result<Update, PendingUpdate> {
        let mut missing = StateVector::new();
        for (client, clock) in self.state_vector_lower().iter() {
            let known = local.get(client);
            if *clock > known {
                missing.set_min(*client, known);
            }
        }
        if missing.is_empty() {
            return Ok(self);
        }
        debug!(missing = ?missing, "Update depends on unknown clocks, stored as pending");
        Err(PendingUpdate {
            update: self,
            missing,
        })
    }

    pub fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<()> {
        let clients = self.blocks.sorted_desc();
        encoder.write_var_u64(clients.len() as u64);
        for (client, carriers) in clients {
            encoder.write_var_u64(carriers.len() as u64);
            encoder.write_client(*client);
            encoder.write_var_u32(carriers[0].id().clock);
            for carrier in carriers {
                carrier.encode(encoder, 0)?;
            }
        }
        self.delete_set.encode(encoder)?;
        Ok(())
    }

    pub fn decode<D: Decoder>(decoder: &mut D) -> Result<Self> {
        let mut blocks = UpdateBlocks::new();
        let clients = decoder.read_var_u64()?;
        for _ in 0..clients {
            let structs = decoder.read_var_u64()?;
            let client = decoder.read_client()?;
            let mut clock = decoder.read_var_u32()?;
            for _ in 0..structs {
                let id = ID::new(client, clock);
                let info = decoder.read_info()?;
                let carrier = match info & REF_NUMBER_MASK {
                    BLOCK_GC_REF_NUMBER => {
                        let len = decoder.read_len()?;
                        BlockCarrier::Block(Block::GC(BlockRange::new(id, len)))
                    }
                    BLOCK_SKIP_REF_NUMBER => {
                        let len = decoder.read_var_u32()?;
                        BlockCarrier::Skip(BlockRange::new(id, len))
                    }
                    _ => BlockCarrier::Block(Item::decode(decoder, id, info)?.into()),
                };
                clock = match clock.checked_add(carrier.len()) {
                    Some(next) => next,
                    None => {
                        decoder.exhaust();
                        return Err(Error::Codec(ystrand_codec::Error::IntegerOutOfRange {
                            value: clock as i128 + carrier.len() as i128,
                            target: "u32",
                        }));
                    }
                };
                blocks.add_block(carrier);
            }
        }
        let delete_set = DeleteSet::decode(decoder)?;
        debug!(clients, "Decoded update");
        Ok(Update { blocks, delete_set })
    }

    pub fn encode_v1(&self) -> Result<Bytes> {
        let mut encoder = EncoderV1::new();
        self.encode(&mut encoder)?;
        Ok(encoder.to_bytes())
    }

    pub fn decode_v1(data: &[u8]) -> Result<Self> {
        Self::decode(&mut DecoderV1::new(data))
    }
}

/// An update waiting for the clocks it builds on
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpdate {
    pub update: Update,
    /// Per client, the lowest clock still missing locally
    pub missing: StateVector,
}
