//! Tombstoned clock ranges per client

use std::collections::HashMap;

use crate::block_store::BlockStore;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{Error, Result};
use crate::id::{ClientID, ID};
use crate::range::{Fragmented, OrderRange, Range};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteSet(HashMap<ClientID, Fragmented>);

impl DeleteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|ranges| OrderRange::is_empty(ranges))
    }

    /// Mark `len` clocks starting at `id` as deleted
    pub fn insert(&mut self, id: ID, len: u32) {
        if len == 0 {
            return;
        }
        let start = id.clock as u64;
        self.0
            .entry(id.client)
            .or_default()
            .push(Range::new(start, start + len as u64));
    }

    /// Sort and merge every client's ranges
    pub fn squash(&mut self) {
        for ranges in self.0.values_mut() {
            ranges.squash();
        }
    }

    pub fn is_deleted(&self, id: &ID) -> bool {
        self.0
            .get(&id.client)
            .map(|ranges| OrderRange::contains(ranges, id.clock as u64))
            .unwrap_or(false)
    }

    pub fn get(&self, client: &ClientID) -> Option<&Fragmented> {
        self.0.get(client)
    }

    pub fn merge(&mut self, other: &DeleteSet) {
        for (client, ranges) in &other.0 {
            let target = self.0.entry(*client).or_default();
            for range in ranges.iter() {
                target.push(*range);
            }
        }
        self.squash();
    }

    /// Write every client's ranges in squashed form, highest client first.
    ///
    /// Fails without writing anything when a range does not fit the
    /// 32-bit clock and length fields.
    pub fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<()> {
        let mut clients = Vec::with_capacity(self.0.len());
        for (client, ranges) in &self.0 {
            let mut ranges = ranges.clone();
            ranges.squash();
            let fields = ranges
                .iter()
                .filter(|range| !range.is_empty())
                .map(|range| -> Result<(u32, u32)> {
                    Ok((clock_field(range.start)?, clock_field(range.len())?))
                })
                .collect::<Result<Vec<_>>>()?;
            clients.push((*client, fields));
        }
        clients.sort_by(|a, b| b.0.cmp(&a.0));

        encoder.write_var_u64(clients.len() as u64);
        for (client, fields) in clients {
            encoder.reset_ds_cur_val();
            encoder.write_var_u64(client);
            encoder.write_var_u64(fields.len() as u64);
            for (clock, len) in fields {
                encoder.write_ds_clock(clock);
                encoder.write_ds_len(len);
            }
        }
        Ok(())
    }

    pub fn decode<D: Decoder>(decoder: &mut D) -> Result<Self> {
        let mut ds = DeleteSet::new();
        let clients = decoder.read_var_u64()?;
        for _ in 0..clients {
            decoder.reset_ds_cur_val();
            let client = decoder.read_var_u64()?;
            let ranges = decoder.read_var_u64()?;
            for _ in 0..ranges {
                let clock = decoder.read_ds_clock()?;
                let len = decoder.read_ds_len()?;
                ds.insert(ID::new(client, clock), len);
            }
        }
        ds.squash();
        Ok(ds)
    }
}

fn clock_field(value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        Error::Codec(ystrand_codec::Error::IntegerOutOfRange {
            value: value as i128,
            target: "u32",
        })
    })
}

impl From<&BlockStore> for DeleteSet {
    /// Collect the tombstones of every deleted block
    fn from(store: &BlockStore) -> Self {
        let mut ds = DeleteSet::new();
        for (_, list) in store.clients() {
            for block in list.iter().filter(|block| block.is_deleted()) {
                ds.insert(*block.id(), block.len());
            }
        }
        ds.squash();
        ds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, Item, Parent};
    use crate::content::ItemContent;
    use crate::decoder::DecoderV1;
    use crate::encoder::EncoderV1;
    use crate::id::BlockRange;

    #[test]
    fn test_insert_and_is_deleted() {
        let mut ds = DeleteSet::new();
        assert!(ds.is_empty());
        ds.insert(ID::new(1, 5), 3);
        ds.insert(ID::new(1, 0), 2);
        ds.insert(ID::new(1, 8), 1);
        ds.squash();
        assert!(ds.is_deleted(&ID::new(1, 0)));
        assert!(!ds.is_deleted(&ID::new(1, 2)));
        assert!(ds.is_deleted(&ID::new(1, 8)));
        assert!(!ds.is_deleted(&ID::new(1, 9)));
        assert!(!ds.is_deleted(&ID::new(2, 0)));
        assert_eq!(
            ds.get(&1).unwrap().ranges(),
            &[Range::new(0, 2), Range::new(5, 9)]
        );
    }

    #[test]
    fn test_encode_v1() {
        let mut ds = DeleteSet::new();
        ds.insert(ID::new(1, 0), 2);
        ds.insert(ID::new(1, 5), 4);
        ds.insert(ID::new(7, 128), 1);

        let mut encoder = EncoderV1::new();
        ds.encode(&mut encoder).unwrap();
        let data = encoder.to_bytes();
        assert_eq!(
            data.as_ref(),
            &[
                0x02, // clients
                0x07, 0x01, 0x80, 0x01, 0x01, // client 7
                0x01, 0x02, 0x00, 0x02, 0x05, 0x04, // client 1
            ]
        );

        let decoded = DeleteSet::decode(&mut DecoderV1::new(&data)).unwrap();
        assert_eq!(decoded, ds);
    }

    #[test]
    fn test_encode_squashes_ranges() {
        let mut ds = DeleteSet::new();
        ds.insert(ID::new(1, 5), 2);
        ds.insert(ID::new(1, 0), 2);
        ds.insert(ID::new(1, 7), 1);

        let mut encoder = EncoderV1::new();
        ds.encode(&mut encoder).unwrap();
        let data = encoder.to_bytes();
        assert_eq!(
            data.as_ref(),
            &[0x01, 0x01, 0x02, 0x00, 0x02, 0x05, 0x03]
        );

        let decoded = DeleteSet::decode(&mut DecoderV1::new(&data)).unwrap();
        ds.squash();
        assert_eq!(decoded, ds);
    }

    #[test]
    fn test_encode_range_past_clock_space() {
        let mut ds = DeleteSet::new();
        ds.insert(ID::new(2, 0), 3);
        ds.insert(ID::new(1, 0), u32::MAX);
        ds.insert(ID::new(1, u32::MAX), 1);

        let mut encoder = EncoderV1::new();
        assert!(matches!(
            ds.encode(&mut encoder),
            Err(Error::Codec(ystrand_codec::Error::IntegerOutOfRange { .. }))
        ));
        assert!(encoder.to_bytes().is_empty());
    }

    #[test]
    fn test_merge() {
        let mut a = DeleteSet::new();
        a.insert(ID::new(1, 0), 2);
        let mut b = DeleteSet::new();
        b.insert(ID::new(1, 2), 2);
        b.insert(ID::new(2, 0), 1);
        a.merge(&b);
        assert_eq!(a.get(&1).unwrap().ranges(), &[Range::new(0, 4)]);
        assert!(a.is_deleted(&ID::new(2, 0)));
    }

    #[test]
    fn test_from_block_store() {
        let mut store = BlockStore::new();
        let mut item = Item::new(
            ID::new(1, 0),
            None,
            None,
            None,
            None,
            Parent::Root("t".into()),
            None,
            ItemContent::from("ab"),
        );
        item.mark_as_deleted();
        store.push_block(item.into()).unwrap();
        store
            .push_block(Block::GC(BlockRange::new(ID::new(1, 2), 3)))
            .unwrap();
        let ds = DeleteSet::from(&store);
        assert_eq!(ds.get(&1).unwrap().ranges(), &[Range::new(0, 5)]);
    }
}
