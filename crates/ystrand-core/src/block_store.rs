//! Per-client block lists

use std::collections::HashMap;

use tracing::warn;

use crate::block::Block;
use crate::error::{Error, Result};
use crate::id::{ClientID, ID};
use crate::state_vector::StateVector;

/// Blocks of one client, ordered by clock without gaps
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ClientBlockList {
    list: Vec<Block>,
}

impl ClientBlockList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.list.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Block> {
        self.list.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Next clock expected from this client
    pub fn get_state(&self) -> u32 {
        self.list
            .last()
            .map(|block| block.id().clock.saturating_add(block.len()))
            .unwrap_or(0)
    }

    /// Index of the block containing `clock`
    pub fn find_pivot(&self, clock: u32) -> Option<usize> {
        let index = self
            .list
            .partition_point(|block| block.id().clock.saturating_add(block.len()) <= clock);
        match self.list.get(index) {
            Some(block) if block.id().clock <= clock => Some(index),
            _ => None,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.list.iter()
    }
}

/// Client → block list
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BlockStore {
    clients: HashMap<ClientID, ClientBlockList>,
}

impl BlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn get_client(&self, client: &ClientID) -> Option<&ClientBlockList> {
        self.clients.get(client)
    }

    pub fn clients(&self) -> std::collections::hash_map::Iter<'_, ClientID, ClientBlockList> {
        self.clients.iter()
    }

    /// Append a block to its client's list.
    ///
    /// The block must start exactly where the list currently ends and must
    /// not run past the last representable clock.
    pub fn push_block(&mut self, block: Block) -> Result<()> {
        let id = *block.id();
        let expected = self.get_state(&id.client);
        if id.clock != expected {
            warn!(client = id.client, expected, got = id.clock, "Rejected block with clock gap");
            return Err(Error::ClockGap {
                client: id.client,
                expected,
                got: id.clock,
            });
        }
        if id.clock.checked_add(block.len()).is_none() {
            warn!(
                client = id.client,
                clock = id.clock,
                len = block.len(),
                "Rejected block past the clock space"
            );
            return Err(Error::Codec(ystrand_codec::Error::IntegerOutOfRange {
                value: id.clock as i128 + block.len() as i128,
                target: "u32",
            }));
        }
        self.clients.entry(id.client).or_default().list.push(block);
        Ok(())
    }

    /// Next clock expected from `client`
    pub fn get_state(&self, client: &ClientID) -> u32 {
        self.clients
            .get(client)
            .map(ClientBlockList::get_state)
            .unwrap_or(0)
    }

    pub fn get_state_vector(&self) -> StateVector {
        self.clients
            .iter()
            .map(|(client, list)| (*client, list.get_state()))
            .collect()
    }

    /// Block containing `id`
    pub fn find(&self, id: &ID) -> Option<&Block> {
        let list = self.clients.get(&id.client)?;
        list.find_pivot(id.clock).and_then(|index| list.get(index))
    }

    pub fn find_mut(&mut self, id: &ID) -> Option<&mut Block> {
        let list = self.clients.get_mut(&id.client)?;
        let index = list.find_pivot(id.clock)?;
        list.get_mut(index)
    }
}
