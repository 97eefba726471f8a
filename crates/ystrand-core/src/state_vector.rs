//! Per-client knowledge of contiguous clocks

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::decoder::{Decoder, DecoderV1};
use crate::encoder::{Encoder, EncoderV1};
use crate::error::Result;
use crate::id::{ClientID, ID};
use crate::range::{diff_range, Range};

/// Client → exclusive upper bound of the clocks known without gaps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateVector(HashMap<ClientID, u32>);

impl StateVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Known clock of `client`, 0 if unseen
    pub fn get(&self, client: &ClientID) -> u32 {
        self.0.get(client).copied().unwrap_or(0)
    }

    pub fn contains_client(&self, client: &ClientID) -> bool {
        self.0.contains_key(client)
    }

    /// Whether the operation `id` is already known
    pub fn contains(&self, id: &ID) -> bool {
        id.clock < self.get(&id.client)
    }

    pub fn increase_by(&mut self, client: ClientID, delta: u32) {
        if delta > 0 {
            let clock = self.0.entry(client).or_default();
            *clock = clock.saturating_add(delta);
        }
    }

    /// Lower the client's clock to `clock` if it is above it, or set it
    pub fn set_min(&mut self, client: ClientID, clock: u32) {
        self.0
            .entry(client)
            .and_modify(|c| *c = (*c).min(clock))
            .or_insert(clock);
    }

    /// Raise the client's clock to `clock` if it is below it, or set it
    pub fn set_max(&mut self, client: ClientID, clock: u32) {
        self.0
            .entry(client)
            .and_modify(|c| *c = (*c).max(clock))
            .or_insert(clock);
    }

    /// Point-wise maximum
    pub fn merge(&mut self, other: &StateVector) {
        for (client, clock) in other.iter() {
            self.set_max(*client, *clock);
        }
    }

    pub fn iter(&self) -> std::collections::hash_map::Iter<'_, ClientID, u32> {
        self.0.iter()
    }

    /// Clock ranges known here but not in `remote`, per client.
    ///
    /// Clients where `remote` is ahead contribute nothing.
    pub fn missing_from(&self, remote: &StateVector) -> BTreeMap<ClientID, Vec<Range>> {
        let mut missing = BTreeMap::new();
        for (client, clock) in self.iter() {
            let old = [Range::new(0, remote.get(client) as u64)];
            let new = [Range::new(0, *clock as u64)];
            let diff = diff_range(&old, &new);
            if !diff.is_empty() {
                missing.insert(*client, diff);
            }
        }
        missing
    }

    /// Clients ordered by descending id, the order they are written in
    pub(crate) fn sorted_desc(&self) -> Vec<(ClientID, u32)> {
        let mut entries: Vec<_> = self.0.iter().map(|(c, k)| (*c, *k)).collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        entries
    }

    pub fn encode<E: Encoder>(&self, encoder: &mut E) {
        encoder.write_var_u64(self.0.len() as u64);
        for (client, clock) in self.sorted_desc() {
            encoder.write_var_u64(client);
            encoder.write_var_u32(clock);
        }
    }

    pub fn decode<D: Decoder>(decoder: &mut D) -> Result<Self> {
        let len = decoder.read_var_u64()?;
        let mut sv = StateVector::new();
        for _ in 0..len {
            let client = decoder.read_var_u64()?;
            let clock = decoder.read_var_u32()?;
            sv.0.insert(client, clock);
        }
        Ok(sv)
    }

    pub fn encode_v1(&self) -> Bytes {
        let mut encoder = EncoderV1::new();
        self.encode(&mut encoder);
        encoder.to_bytes()
    }

    pub fn decode_v1(data: &[u8]) -> Result<Self> {
        Self::decode(&mut DecoderV1::new(data))
    }
}

impl FromIterator<(ClientID, u32)> for StateVector {
    fn from_iter<T: IntoIterator<Item = (ClientID, u32)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
