//! Object identity: the SHA-1 `ObjectId`, hex encoding, and the fan-out
//! table used for fast lookup inside a pack index.

mod error;
pub mod hex;
mod oid;
pub mod hasher;
pub mod fanout;

pub use error::HashError;
pub use oid::{ObjectId, OID_HEX_LEN, OID_LEN};
