//! ystrand codec - the byte-level substrate of the replicated document engine
//!
//! ## Layers
//! ```text
//! write / read      fixed-width integers and floats, var-uint, var-int, var-buf
//! any               self-describing tagged values
//! rle / string      run-length encoders for compact update streams
//! ```
//!
//! ## Var-int layout
//! ```text
//! var-uint   7 payload bits per byte, bit 7 = continuation
//! var-int    first byte: bit 7 continuation, bit 6 sign, 6 payload bits
//!            then 7 payload bits per byte
//! ```

pub mod any;
pub mod error;
pub mod number;
pub mod read;
pub mod rle;
pub mod string;
pub mod write;

pub use any::Any;
pub use error::{Error, Result};
pub use read::{Cursor, Read};
pub use rle::{
    IntDiffOptRleDecoder, IntDiffOptRleEncoder, RleDecoder, RleEncoder, UIntOptRleDecoder,
    UIntOptRleEncoder,
};
pub use string::{StringDecoder, StringEncoder};
pub use write::{BufferWrite, Write};
