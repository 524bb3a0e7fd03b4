//! Content-addressed array blobs.

use md5::{Digest, Md5};

use crate::dataset::DataArray;
use crate::util::ArrayKind;

/// Raw little-endian bytes of one array plus their content identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedBlob {
    /// `<ShortKind>_<valueCount>_<md5 hex>`
    pub id: String,
    /// Kind of the stored elements (after narrowing).
    pub kind: ArrayKind,
    /// Number of stored values.
    pub size: usize,
    pub bytes: Vec<u8>,
}

/// 128-bit MD5 digest of `data` as lowercase hex.
pub fn md5_hex(data: &[u8]) -> String {
    let digest = Md5::digest(data);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Encode `array` for storage.
///
/// 64-bit integers are narrowed to 32 bits before hashing, so the identifier
/// names what is actually stored. Bit arrays have no blob form and yield
/// `None`.
pub fn encode_blob(array: &DataArray) -> Option<EncodedBlob> {
    let kind = array.kind().stored()?;
    let bytes = array.to_le_bytes()?;
    let size = array.len();
    let id = format!("{}_{}_{}", kind.short_name(), size, md5_hex(&bytes));
    Some(EncodedBlob { id, kind, size, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ArrayValues;

    #[test]
    fn test_md5_known_value() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(md5_hex(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_identical_content_same_id() {
        let a = DataArray::from_f32("a", 1, vec![1.0, 2.0, 3.0]);
        let b = DataArray::from_f32("b", 3, vec![1.0, 2.0, 3.0]);
        assert_eq!(encode_blob(&a).unwrap().id, encode_blob(&b).unwrap().id);
    }

    #[test]
    fn test_kind_and_count_in_id() {
        let a = DataArray::from_f32("a", 1, vec![0.0; 4]);
        let id = encode_blob(&a).unwrap().id;
        assert!(id.starts_with("Float32_4_"));

        // Same bytes, different kind: different identifier
        let b = DataArray::new(Some("b"), 1, ArrayValues::Int32(vec![0; 4]));
        assert_ne!(encode_blob(&b).unwrap().id, id);
    }

    #[test]
    fn test_narrowed_blob() {
        let wide = DataArray::from_i64("ids", 1, vec![1, 2, 3]);
        let narrow = DataArray::from_i32("ids", 1, vec![1, 2, 3]);
        let blob = encode_blob(&wide).unwrap();
        assert_eq!(blob.kind, ArrayKind::Int32);
        assert_eq!(blob.bytes.len(), 12);
        assert_eq!(blob, encode_blob(&narrow).unwrap());
    }

    #[test]
    fn test_bit_array_skipped() {
        assert!(encode_blob(&DataArray::from_bits("mask", &[true, false])).is_none());
    }
}
