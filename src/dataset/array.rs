//! Typed attribute arrays.

use byteorder::{ByteOrder, LittleEndian};

use crate::util::ArrayKind;

/// Storage of a [`DataArray`], one variant per element kind.
#[derive(Clone, Debug, PartialEq)]
pub enum ArrayValues {
    /// Packed booleans (8 per byte, most significant bit first) and the bit count.
    Bit { bits: Vec<u8>, len: usize },
    Int8(Vec<i8>),
    Uint8(Vec<u8>),
    Int16(Vec<i16>),
    Uint16(Vec<u16>),
    Int32(Vec<i32>),
    Uint32(Vec<u32>),
    Int64(Vec<i64>),
    Uint64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

impl ArrayValues {
    /// Element kind.
    pub fn kind(&self) -> ArrayKind {
        match self {
            Self::Bit { .. } => ArrayKind::Bit,
            Self::Int8(_) => ArrayKind::Int8,
            Self::Uint8(_) => ArrayKind::Uint8,
            Self::Int16(_) => ArrayKind::Int16,
            Self::Uint16(_) => ArrayKind::Uint16,
            Self::Int32(_) => ArrayKind::Int32,
            Self::Uint32(_) => ArrayKind::Uint32,
            Self::Int64(_) => ArrayKind::Int64,
            Self::Uint64(_) => ArrayKind::Uint64,
            Self::Float32(_) => ArrayKind::Float32,
            Self::Float64(_) => ArrayKind::Float64,
        }
    }

    /// Number of stored values (tuples × components).
    pub fn len(&self) -> usize {
        match self {
            Self::Bit { len, .. } => *len,
            Self::Int8(v) => v.len(),
            Self::Uint8(v) => v.len(),
            Self::Int16(v) => v.len(),
            Self::Uint16(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Uint32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Uint64(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::Float64(v) => v.len(),
        }
    }

    /// True if no values are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value `i` widened to `f64`.
    pub fn get_f64(&self, i: usize) -> f64 {
        match self {
            Self::Bit { bits, .. } => f64::from((bits[i / 8] >> (7 - i % 8)) & 1),
            Self::Int8(v) => f64::from(v[i]),
            Self::Uint8(v) => f64::from(v[i]),
            Self::Int16(v) => f64::from(v[i]),
            Self::Uint16(v) => f64::from(v[i]),
            Self::Int32(v) => f64::from(v[i]),
            Self::Uint32(v) => f64::from(v[i]),
            Self::Int64(v) => v[i] as f64,
            Self::Uint64(v) => v[i] as f64,
            Self::Float32(v) => f64::from(v[i]),
            Self::Float64(v) => v[i],
        }
    }

    /// Bytes held in memory.
    pub fn memory_size(&self) -> usize {
        match self {
            Self::Bit { bits, .. } => bits.len(),
            other => other.len() * other.kind().num_bytes(),
        }
    }

    /// Gather the values of tuples `indices` (each `components` wide).
    pub fn gather(&self, indices: &[usize], components: usize) -> Self {
        fn pick<T: Copy>(v: &[T], indices: &[usize], nc: usize) -> Vec<T> {
            let mut out = Vec::with_capacity(indices.len() * nc);
            for &t in indices {
                out.extend_from_slice(&v[t * nc..(t + 1) * nc]);
            }
            out
        }
        match self {
            Self::Bit { bits, .. } => {
                let len = indices.len() * components;
                let mut out = vec![0u8; len.div_ceil(8)];
                let mut o = 0;
                for &t in indices {
                    for c in 0..components {
                        let i = t * components + c;
                        if (bits[i / 8] >> (7 - i % 8)) & 1 == 1 {
                            out[o / 8] |= 1 << (7 - o % 8);
                        }
                        o += 1;
                    }
                }
                Self::Bit { bits: out, len }
            }
            Self::Int8(v) => Self::Int8(pick(v, indices, components)),
            Self::Uint8(v) => Self::Uint8(pick(v, indices, components)),
            Self::Int16(v) => Self::Int16(pick(v, indices, components)),
            Self::Uint16(v) => Self::Uint16(pick(v, indices, components)),
            Self::Int32(v) => Self::Int32(pick(v, indices, components)),
            Self::Uint32(v) => Self::Uint32(pick(v, indices, components)),
            Self::Int64(v) => Self::Int64(pick(v, indices, components)),
            Self::Uint64(v) => Self::Uint64(pick(v, indices, components)),
            Self::Float32(v) => Self::Float32(pick(v, indices, components)),
            Self::Float64(v) => Self::Float64(pick(v, indices, components)),
        }
    }
}

/// Named array of fixed-width tuples.
#[derive(Clone, Debug, PartialEq)]
pub struct DataArray {
    name: Option<String>,
    components: usize,
    values: ArrayValues,
}

impl DataArray {
    /// Create an array; `components` is clamped to at least 1.
    pub fn new(name: Option<&str>, components: usize, values: ArrayValues) -> Self {
        Self {
            name: name.map(str::to_string),
            components: components.max(1),
            values,
        }
    }

    pub fn from_f32(name: &str, components: usize, values: Vec<f32>) -> Self {
        Self::new(Some(name), components, ArrayValues::Float32(values))
    }

    pub fn from_f64(name: &str, components: usize, values: Vec<f64>) -> Self {
        Self::new(Some(name), components, ArrayValues::Float64(values))
    }

    pub fn from_i32(name: &str, components: usize, values: Vec<i32>) -> Self {
        Self::new(Some(name), components, ArrayValues::Int32(values))
    }

    pub fn from_i64(name: &str, components: usize, values: Vec<i64>) -> Self {
        Self::new(Some(name), components, ArrayValues::Int64(values))
    }

    pub fn from_u8(name: &str, components: usize, values: Vec<u8>) -> Self {
        Self::new(Some(name), components, ArrayValues::Uint8(values))
    }

    /// Packed bit array from booleans.
    pub fn from_bits(name: &str, values: &[bool]) -> Self {
        let mut bits = vec![0u8; values.len().div_ceil(8)];
        for (i, &b) in values.iter().enumerate() {
            if b {
                bits[i / 8] |= 1 << (7 - i % 8);
            }
        }
        Self::new(Some(name), 1, ArrayValues::Bit { bits, len: values.len() })
    }

    /// Array name, if any. Empty names count as absent.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    pub fn components(&self) -> usize {
        self.components
    }

    pub fn values(&self) -> &ArrayValues {
        &self.values
    }

    pub fn kind(&self) -> ArrayKind {
        self.values.kind()
    }

    /// Number of values (tuples × components).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of tuples.
    pub fn num_tuples(&self) -> usize {
        self.values.len() / self.components
    }

    /// Component `c` of tuple `t`, widened to `f64`.
    pub fn component(&self, t: usize, c: usize) -> f64 {
        self.values.get_f64(t * self.components + c)
    }

    /// Bytes held in memory.
    pub fn memory_size(&self) -> usize {
        self.values.memory_size()
    }

    /// `[min, max]` of component `c`, or of the tuple magnitude when `c` is `None`.
    ///
    /// Returns `[0, 0]` for empty arrays.
    pub fn range(&self, c: Option<usize>) -> [f64; 2] {
        let n = self.num_tuples();
        if n == 0 {
            return [0.0, 0.0];
        }
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for t in 0..n {
            let v = match c {
                Some(c) => self.component(t, c),
                None if self.components == 1 => self.component(t, 0),
                None => (0..self.components)
                    .map(|c| self.component(t, c).powi(2))
                    .sum::<f64>()
                    .sqrt(),
            };
            lo = lo.min(v);
            hi = hi.max(v);
        }
        [lo, hi]
    }

    /// New array holding tuples `indices`, same name and width.
    pub fn gather(&self, indices: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            components: self.components,
            values: self.values.gather(indices, self.components),
        }
    }

    /// Copy with 64-bit integers narrowed to 32 bits.
    ///
    /// Values outside the 32-bit range are truncated (`as` cast keeps the
    /// low 32 bits). Returns `None` for arrays that need no narrowing.
    pub fn narrowed(&self) -> Option<Self> {
        let values = match &self.values {
            ArrayValues::Int64(v) => ArrayValues::Int32(v.iter().map(|&x| x as i32).collect()),
            ArrayValues::Uint64(v) => ArrayValues::Uint32(v.iter().map(|&x| x as u32).collect()),
            _ => return None,
        };
        Some(Self {
            name: self.name.clone(),
            components: self.components,
            values,
        })
    }

    /// Raw little-endian bytes as stored in an exported blob.
    ///
    /// `None` for bit arrays. 64-bit integers must be narrowed first; they are
    /// narrowed here if the caller did not.
    pub fn to_le_bytes(&self) -> Option<Vec<u8>> {
        let kind = self.kind().stored()?;
        let mut out = vec![0u8; self.len() * kind.num_bytes()];
        match &self.values {
            ArrayValues::Bit { .. } => return None,
            ArrayValues::Int8(v) => {
                for (o, x) in out.iter_mut().zip(v) {
                    *o = *x as u8;
                }
            }
            ArrayValues::Uint8(v) => out.copy_from_slice(v),
            ArrayValues::Int16(v) => LittleEndian::write_i16_into(v, &mut out),
            ArrayValues::Uint16(v) => LittleEndian::write_u16_into(v, &mut out),
            ArrayValues::Int32(v) => LittleEndian::write_i32_into(v, &mut out),
            ArrayValues::Uint32(v) => LittleEndian::write_u32_into(v, &mut out),
            ArrayValues::Float32(v) => LittleEndian::write_f32_into(v, &mut out),
            ArrayValues::Float64(v) => LittleEndian::write_f64_into(v, &mut out),
            ArrayValues::Int64(_) | ArrayValues::Uint64(_) => {
                return self.narrowed().and_then(|n| n.to_le_bytes())
            }
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuples_and_range() {
        let a = DataArray::from_f32("v", 3, vec![0.0, 0.0, 1.0, 3.0, 4.0, 0.0]);
        assert_eq!(a.num_tuples(), 2);
        assert_eq!(a.range(Some(0)), [0.0, 3.0]);
        assert_eq!(a.range(None), [1.0, 5.0]);
        assert_eq!(a.memory_size(), 24);
    }

    #[test]
    fn test_narrowing_truncates() {
        let big = (1i64 << 32) + 7;
        let a = DataArray::from_i64("ids", 1, vec![5, -3, i64::from(i32::MAX), big]);
        let n = a.narrowed().unwrap();
        assert_eq!(n.kind(), ArrayKind::Int32);
        // Values that fit are preserved, others keep their low 32 bits
        assert_eq!(n.values(), &ArrayValues::Int32(vec![5, -3, i32::MAX, 7]));
        assert!(DataArray::from_i32("x", 1, vec![1]).narrowed().is_none());
    }

    #[test]
    fn test_unsigned_narrowing() {
        let a = DataArray::new(Some("u"), 1, ArrayValues::Uint64(vec![1, u64::from(u32::MAX) + 2]));
        let n = a.narrowed().unwrap();
        assert_eq!(n.values(), &ArrayValues::Uint32(vec![1, 1]));
    }

    #[test]
    fn test_le_bytes() {
        let a = DataArray::from_f32("f", 1, vec![1.0]);
        assert_eq!(a.to_le_bytes().unwrap(), 1.0f32.to_le_bytes().to_vec());

        let wide = DataArray::from_i64("w", 1, vec![258, 1]);
        assert_eq!(wide.to_le_bytes().unwrap(), vec![2, 1, 0, 0, 1, 0, 0, 0]);

        let bits = DataArray::from_bits("b", &[true, false, true]);
        assert!(bits.to_le_bytes().is_none());
        assert_eq!(bits.len(), 3);
        assert_eq!(bits.component(2, 0), 1.0);
    }

    #[test]
    fn test_gather() {
        let a = DataArray::from_i32("s", 2, vec![0, 1, 10, 11, 20, 21]);
        let g = a.gather(&[2, 0]);
        assert_eq!(g.values(), &ArrayValues::Int32(vec![20, 21, 0, 1]));
        assert_eq!(g.name(), Some("s"));

        let b = DataArray::from_bits("b", &[false, true, true]);
        let gb = b.gather(&[1, 0]);
        assert_eq!(gb.component(0, 0), 1.0);
        assert_eq!(gb.component(1, 0), 0.0);
    }
}
