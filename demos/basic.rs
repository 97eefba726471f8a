//! Basic ystrand Example
//!
//! Builds a replica, encodes its state vector and a delta update for a peer
//! that has seen part of it, then decodes both again.
//!
//! Run with: RUST_LOG=debug cargo run --example basic

use tracing_subscriber::EnvFilter;

use ystrand_codec::{Any, BufferWrite, Cursor, Read, Write};
use ystrand_core::{
    Block, BlockRange, Doc, DocOptions, Item, ItemContent, Parent, StateVector, Update, ID,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    println!("ystrand Basic Example\n");

    println!("=== Codec ===\n");
    codec_example()?;

    println!("\n=== Delta Sync ===\n");
    sync_example()?;

    Ok(())
}

fn codec_example() -> Result<(), Box<dyn std::error::Error>> {
    let mut buf = BufferWrite::new();
    buf.write_var_i64(-300);
    buf.write_string("héllo");
    buf.write_any(&Any::Array(vec![Any::Bool(true), Any::Float64(1.5), "x".into()]));
    let data = buf.into_bytes();
    println!("Encoded {} bytes: {:02x?}", data.len(), data.as_ref());

    let mut cursor = Cursor::new(&data);
    println!("var-int: {}", cursor.read_var_i64()?);
    println!("string:  {}", cursor.read_string()?);
    println!("any:     {:?}", cursor.read_any()?);
    Ok(())
}

fn sync_example() -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = Doc::with_options(DocOptions::default().with_client_id(1).with_guid("notes"))?;

    let text = Item::new(
        ID::new(1, 0),
        None,
        None,
        None,
        None,
        Parent::Root("text".into()),
        None,
        ItemContent::from("hello world"),
    );
    let mut typo = Item::new(
        ID::new(1, 11),
        None,
        Some(ID::new(1, 10)),
        None,
        None,
        Parent::Root("text".into()),
        None,
        ItemContent::from("!!"),
    );
    typo.mark_as_deleted();

    let blocks = &mut doc.store_mut().blocks;
    blocks.push_block(text.into())?;
    blocks.push_block(typo.into())?;
    blocks.push_block(Block::GC(BlockRange::new(ID::new(1, 13), 4)))?;

    let sv = doc.encode_state_vector_v1();
    println!("State vector: {:02x?}", sv.as_ref());
    println!("Decoded:      {:?}", StateVector::decode_v1(&sv)?);

    // Peer already knows "hello"
    let remote: StateVector = [(1, 5)].into_iter().collect();
    let data = doc.encode_state_as_update_v1(&remote)?;
    println!("Update for peer ({} bytes): {:02x?}", data.len(), data.as_ref());

    let update = Update::decode_v1(&data)?;
    for (client, carriers) in update.blocks.clients() {
        for carrier in carriers {
            println!("  client {client}: {:?}", carrier);
        }
    }
    println!("Delete set: {:?}", update.delete_set);
    println!("Applicable to peer: {}", update.is_applicable(&remote));
    Ok(())
}
