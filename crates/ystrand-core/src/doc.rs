//! Replica handle and its options

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::encoder::{Encoder, EncoderV1};
use crate::error::{Error, Result};
use crate::id::ClientID;
use crate::state_vector::StateVector;
use crate::store::Store;

/// Options a replica is created with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocOptions {
    /// Replica id stamped on every local operation
    pub client_id: ClientID,
    /// Globally unique document id
    pub guid: String,
    /// Collapse deleted content into GC blocks
    pub gc: bool,
}

impl DocOptions {
    pub fn with_client_id(mut self, client_id: ClientID) -> Self {
        self.client_id = client_id;
        self
    }

    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = guid.into();
        self
    }

    pub fn with_gc(mut self, gc: bool) -> Self {
        self.gc = gc;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.guid.is_empty() {
            return Err(Error::InvalidOptions("guid must not be empty".into()));
        }
        Ok(())
    }
}

impl Default for DocOptions {
    fn default() -> Self {
        Self {
            // 32 bits keep the id inside the safe integer range of JS peers
            client_id: rand::random::<u32>() as ClientID,
            guid: uuid::Uuid::new_v4().to_string(),
            gc: false,
        }
    }
}

/// A single replica of a document
#[derive(Debug)]
pub struct Doc {
    store: Store,
}

impl Doc {
    /// Create a replica with a random client id and guid
    pub fn new() -> Self {
        Self {
            store: Store::new(DocOptions::default()),
        }
    }

    pub fn with_options(options: DocOptions) -> Result<Self> {
        options.validate()?;
        debug!(client_id = options.client_id, guid = %options.guid, "Created document");
        Ok(Self {
            store: Store::new(options),
        })
    }

    pub fn client_id(&self) -> ClientID {
        self.store.options.client_id
    }

    pub fn guid(&self) -> &str {
        &self.store.options.guid
    }

    pub fn options(&self) -> &DocOptions {
        &self.store.options
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn state_vector(&self) -> StateVector {
        self.store.get_state_vector()
    }

    pub fn encode_state_vector_v1(&self) -> Bytes {
        self.state_vector().encode_v1()
    }

    /// Encode everything `remote_sv` has not seen as a V1 update
    pub fn encode_state_as_update_v1(&self, remote_sv: &StateVector) -> Result<Bytes> {
        let mut encoder = EncoderV1::new();
        self.store.encode_diff(remote_sv, &mut encoder)?;
        Ok(encoder.to_bytes())
    }
}

impl Default for Doc {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, Item, Parent};
    use crate::content::ItemContent;
    use crate::id::{BlockRange, ID};
    use crate::update::{BlockCarrier, Update};

    #[test]
    fn test_default_options() {
        let a = DocOptions::default();
        let b = DocOptions::default();
        assert!(a.client_id <= u32::MAX as ClientID);
        assert_ne!(a.guid, b.guid);
        assert!(!a.gc);
        assert!(a.validate().is_ok());
    }

    #[test]
    fn test_empty_guid_rejected() {
        let options = DocOptions::default().with_guid("");
        assert!(matches!(
            Doc::with_options(options),
            Err(Error::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_options_from_json() {
        let options: DocOptions =
            serde_json::from_str(r#"{"client_id": 42, "guid": "notes"}"#).unwrap();
        assert_eq!(options.client_id, 42);
        assert_eq!(options.guid, "notes");
        assert!(!options.gc);

        let json = serde_json::to_string(&options).unwrap();
        let back: DocOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);
    }

    #[test]
    fn test_encode_state_as_update() {
        let options = DocOptions::default().with_client_id(5).with_guid("doc");
        let mut doc = Doc::with_options(options).unwrap();
        assert_eq!(doc.client_id(), 5);
        assert_eq!(doc.guid(), "doc");

        let first = Item::new(
            ID::new(5, 0),
            None,
            None,
            None,
            None,
            Parent::Root("text".into()),
            None,
            ItemContent::from("hello"),
        );
        let mut second = Item::new(
            ID::new(5, 5),
            None,
            Some(ID::new(5, 4)),
            None,
            None,
            Parent::Root("text".into()),
            None,
            ItemContent::from("!"),
        );
        second.mark_as_deleted();
        let blocks = &mut doc.store_mut().blocks;
        blocks.push_block(first.into()).unwrap();
        blocks.push_block(second.into()).unwrap();
        blocks
            .push_block(Block::GC(BlockRange::new(ID::new(5, 6), 2)))
            .unwrap();

        let sv = doc.state_vector();
        assert_eq!(sv.get(&5), 8);
        assert_eq!(StateVector::decode_v1(&doc.encode_state_vector_v1()).unwrap(), sv);

        let remote: StateVector = [(5, 3)].into_iter().collect();
        let data = doc.encode_state_as_update_v1(&remote).unwrap();
        let update = Update::decode_v1(&data).unwrap();
        let carriers = update.blocks.get(&5).unwrap();
        assert_eq!(carriers.len(), 3);
        assert_eq!(carriers[0].id(), &ID::new(5, 3));
        assert_eq!(carriers[0].len(), 2);
        match &carriers[0] {
            BlockCarrier::Block(Block::Item(item)) => {
                assert_eq!(item.origin, Some(ID::new(5, 2)));
                assert_eq!(item.content, ItemContent::from("lo"));
            }
            other => panic!("unexpected carrier {other:?}"),
        }
        assert!(update.delete_set.is_deleted(&ID::new(5, 5)));
        assert!(update.delete_set.is_deleted(&ID::new(5, 7)));
        assert!(!update.delete_set.is_deleted(&ID::new(5, 4)));
    }
}
