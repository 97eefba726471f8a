//! ystrand core - replica identity and the structural model of an edit
//!
//! This crate layers CRDT bookkeeping on top of `ystrand-codec`:
//! - Client ids, clocks and the half-open range algebra behind delta sync
//! - State vectors and delete sets
//! - Items, GC tombstones and their content kinds
//! - The V1 update encoding through the [`Encoder`] / [`Decoder`] traits

pub mod block;
pub mod block_store;
pub mod content;
pub mod decoder;
pub mod delete_set;
pub mod doc;
pub mod encoder;
pub mod error;
pub mod id;
pub mod range;
pub mod state_vector;
pub mod store;
pub mod update;

pub use block::{Block, Item, ItemFlags, Parent};
pub use block_store::{BlockStore, ClientBlockList};
pub use content::{ItemContent, OffsetKind, TypeRef};
pub use decoder::{Decoder, DecoderV1};
pub use delete_set::DeleteSet;
pub use doc::{Doc, DocOptions};
pub use encoder::{Encoder, EncoderV1};
pub use error::{Error, Result};
pub use id::{BlockRange, ClientID, ID};
pub use range::{diff_range, is_covered, Fragmented, OrderRange, Range};
pub use state_vector::StateVector;
pub use store::Store;
pub use update::{BlockCarrier, PendingUpdate, Update, UpdateBlocks};
pub use ystrand_codec::Any;
