//! Document state: blocks plus updates that could not be applied yet

use tracing::debug;

use crate::block_store::{BlockStore, ClientBlockList};
use crate::delete_set::DeleteSet;
use crate::doc::DocOptions;
use crate::encoder::Encoder;
use crate::error::Result;
use crate::id::ClientID;
use crate::state_vector::StateVector;
use crate::update::PendingUpdate;

#[derive(Debug)]
pub struct Store {
    pub options: DocOptions,
    pub blocks: BlockStore,
    /// Update waiting for missing clocks
    pub pending: Option<PendingUpdate>,
    /// Deletions that refer to blocks not received yet
    pub pending_ds: Option<DeleteSet>,
}

impl Store {
    pub fn new(options: DocOptions) -> Self {
        Self {
            options,
            blocks: BlockStore::new(),
            pending: None,
            pending_ds: None,
        }
    }

    pub fn get_state_vector(&self) -> StateVector {
        self.blocks.get_state_vector()
    }

    /// Write every block `remote_sv` does not know yet, plus the full delete set.
    ///
    /// The first block of a client is sliced so the update starts exactly at
    /// the remote clock.
    pub fn encode_diff<E: Encoder>(&self, remote_sv: &StateVector, encoder: &mut E) -> Result<()> {
        let mut diffs: Vec<(ClientID, u32, &ClientBlockList, usize)> = Vec::new();
        for (client, list) in self.blocks.clients() {
            let remote_clock = remote_sv.get(client);
            if list.get_state() <= remote_clock {
                continue;
            }
            if let Some(pivot) = list.find_pivot(remote_clock) {
                diffs.push((*client, remote_clock, list, pivot));
            }
        }
        diffs.sort_by(|a, b| b.0.cmp(&a.0));

        encoder.write_var_u64(diffs.len() as u64);
        for (client, remote_clock, list, pivot) in &diffs {
            encoder.write_var_u64((list.len() - pivot) as u64);
            encoder.write_client(*client);
            encoder.write_var_u32(*remote_clock);
            for (index, block) in list.iter().enumerate().skip(*pivot) {
                let offset = if index == *pivot {
                    remote_clock - block.id().clock
                } else {
                    0
                };
                block.encode(encoder, offset)?;
            }
        }
        DeleteSet::from(&self.blocks).encode(encoder)?;
        debug!(clients = diffs.len(), "Encoded state diff");
        Ok(())
    }
}
