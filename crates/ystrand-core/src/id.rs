//! Replica identity

use serde::{Deserialize, Serialize};

/// Identifier of a replica (client)
pub type ClientID = u64;

/// The `clock`-th operation issued by replica `client`.
///
/// Clocks only compare within one client, so there is no `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ID {
    pub client: ClientID,
    pub clock: u32,
}

impl ID {
    pub fn new(client: ClientID, clock: u32) -> Self {
        Self { client, clock }
    }
}

impl std::fmt::Display for ID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}#{}>", self.client, self.clock)
    }
}

/// A run of `len` consecutive clocks starting at `id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRange {
    pub id: ID,
    pub len: u32,
}

impl BlockRange {
    pub fn new(id: ID, len: u32) -> Self {
        Self { id, len }
    }

    pub fn last_id(&self) -> ID {
        ID::new(
            self.id.client,
            self.id.clock.saturating_add(self.len.saturating_sub(1)),
        )
    }

    pub fn contains(&self, id: &ID) -> bool {
        self.id.client == id.client
            && id.clock >= self.id.clock
            && id.clock - self.id.clock < self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_equality_is_structural() {
        assert_eq!(ID::new(1, 5), ID::new(1, 5));
        assert_ne!(ID::new(1, 5), ID::new(2, 5));
        assert_eq!(ID::new(7, 3).to_string(), "<7#3>");
    }

    #[test]
    fn test_block_range_contains() {
        let range = BlockRange::new(ID::new(1, 10), 5);
        assert!(range.contains(&ID::new(1, 10)));
        assert!(range.contains(&ID::new(1, 14)));
        assert!(!range.contains(&ID::new(1, 15)));
        assert!(!range.contains(&ID::new(1, 9)));
        assert!(!range.contains(&ID::new(2, 12)));
        assert_eq!(range.last_id(), ID::new(1, 14));
    }

    #[test]
    fn test_block_range_at_clock_space_end() {
        let range = BlockRange::new(ID::new(1, u32::MAX - 1), 5);
        assert!(range.contains(&ID::new(1, u32::MAX)));
        assert!(!range.contains(&ID::new(1, 0)));
        assert_eq!(range.last_id(), ID::new(1, u32::MAX));
    }
}
