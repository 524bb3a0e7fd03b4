//! Content-addressed dataset encoding.
//!
//! A dataset becomes an `index.json` manifest plus one raw little-endian
//! blob per array under `data/<id>`, where the id hashes the stored bytes.

mod blob;
mod writer;

pub use blob::{encode_blob, md5_hex, EncodedBlob};
pub use writer::{DataSetWriter, DATA_DIR, INDEX_FILE};
