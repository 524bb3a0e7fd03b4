//! Minimal zip container used as the envelope of in-memory archives.
//!
//! Writes local file headers, a central directory and the end record.
//! Entries are deflated unless deflate does not shrink them, in which case
//! they are stored. No zip64: entries and offsets must fit 32 bits.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};

use crate::util::{Error, Result};

const LOCAL_HEADER_SIG: u32 = 0x0403_4b50;
const CENTRAL_HEADER_SIG: u32 = 0x0201_4b50;
const END_OF_CENTRAL_SIG: u32 = 0x0605_4b50;

const LOCAL_HEADER_SIZE: usize = 30;
const CENTRAL_HEADER_SIZE: usize = 46;
const END_OF_CENTRAL_SIZE: usize = 22;

const VERSION_NEEDED: u16 = 20;
/// Unix host (3) in the high byte.
const VERSION_MADE_BY: u16 = (3 << 8) | 20;
/// Regular file, rw-r--r--.
const FILE_MODE: u32 = 0o100644;

/// 1980-01-01 00:00:00 in DOS format, keeps output reproducible.
const DOS_TIME: u16 = 0;
const DOS_DATE: u16 = (1 << 5) | 1;

/// Compression method of one entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Stored = 0,
    Deflated = 8,
}

impl Method {
    fn from_u16(v: u16) -> Result<Self> {
        match v {
            0 => Ok(Self::Stored),
            8 => Ok(Self::Deflated),
            other => Err(Error::Zip(format!("unsupported compression method {other}"))),
        }
    }
}

struct CentralRecord {
    name: String,
    method: Method,
    crc: u32,
    compressed_size: u32,
    size: u32,
    offset: u32,
}

/// Streaming zip writer over any `Write` sink.
pub struct ZipWriter<W: Write> {
    inner: W,
    offset: u64,
    records: Vec<CentralRecord>,
    level: Compression,
}

impl<W: Write> ZipWriter<W> {
    /// Start a new archive.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            offset: 0,
            records: Vec::new(),
            level: Compression::default(),
        }
    }

    /// Set the deflate level (0-9).
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = Compression::new(level.min(9));
        self
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Mutably borrow the underlying sink.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Bytes of completed entries. A failed `add_entry` leaves this unchanged.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of entries written so far.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append one entry.
    pub fn add_entry(&mut self, name: &str, data: &[u8]) -> Result<()> {
        let size = to_u32(data.len(), "entry size")?;
        let offset = to_u32(self.offset as usize, "entry offset")?;
        let name_len = u16::try_from(name.len())
            .map_err(|_| Error::Zip(format!("entry name too long: {name}")))?;

        let mut crc = Crc::new();
        crc.update(data);
        let crc = crc.sum();

        let mut encoder = DeflateEncoder::new(Vec::new(), self.level);
        encoder.write_all(data)?;
        let deflated = encoder.finish()?;

        // Only use compression if it actually saves space
        let (method, payload) = if deflated.len() < data.len() {
            (Method::Deflated, deflated.as_slice())
        } else {
            (Method::Stored, data)
        };
        let compressed_size = to_u32(payload.len(), "compressed size")?;

        let w = &mut self.inner;
        w.write_u32::<LittleEndian>(LOCAL_HEADER_SIG)?;
        w.write_u16::<LittleEndian>(VERSION_NEEDED)?;
        w.write_u16::<LittleEndian>(0)?; // flags
        w.write_u16::<LittleEndian>(method as u16)?;
        w.write_u16::<LittleEndian>(DOS_TIME)?;
        w.write_u16::<LittleEndian>(DOS_DATE)?;
        w.write_u32::<LittleEndian>(crc)?;
        w.write_u32::<LittleEndian>(compressed_size)?;
        w.write_u32::<LittleEndian>(size)?;
        w.write_u16::<LittleEndian>(name_len)?;
        w.write_u16::<LittleEndian>(0)?; // extra
        w.write_all(name.as_bytes())?;
        w.write_all(payload)?;

        self.offset += (LOCAL_HEADER_SIZE + name.len() + payload.len()) as u64;
        self.records.push(CentralRecord {
            name: name.to_string(),
            method,
            crc,
            compressed_size,
            size,
            offset,
        });
        Ok(())
    }

    /// Write the central directory and end record, returning the sink.
    pub fn finish(mut self) -> Result<W> {
        let cd_offset = to_u32(self.offset as usize, "central directory offset")?;
        let count = u16::try_from(self.records.len())
            .map_err(|_| Error::Zip("too many entries".into()))?;
        let mut cd_size = 0usize;

        let w = &mut self.inner;
        for rec in &self.records {
            w.write_u32::<LittleEndian>(CENTRAL_HEADER_SIG)?;
            w.write_u16::<LittleEndian>(VERSION_MADE_BY)?;
            w.write_u16::<LittleEndian>(VERSION_NEEDED)?;
            w.write_u16::<LittleEndian>(0)?;
            w.write_u16::<LittleEndian>(rec.method as u16)?;
            w.write_u16::<LittleEndian>(DOS_TIME)?;
            w.write_u16::<LittleEndian>(DOS_DATE)?;
            w.write_u32::<LittleEndian>(rec.crc)?;
            w.write_u32::<LittleEndian>(rec.compressed_size)?;
            w.write_u32::<LittleEndian>(rec.size)?;
            w.write_u16::<LittleEndian>(rec.name.len() as u16)?;
            w.write_u16::<LittleEndian>(0)?; // extra
            w.write_u16::<LittleEndian>(0)?; // comment
            w.write_u16::<LittleEndian>(0)?; // disk
            w.write_u16::<LittleEndian>(0)?; // internal attributes
            w.write_u32::<LittleEndian>(FILE_MODE << 16)?;
            w.write_u32::<LittleEndian>(rec.offset)?;
            w.write_all(rec.name.as_bytes())?;
            cd_size += CENTRAL_HEADER_SIZE + rec.name.len();
        }

        w.write_u32::<LittleEndian>(END_OF_CENTRAL_SIG)?;
        w.write_u16::<LittleEndian>(0)?;
        w.write_u16::<LittleEndian>(0)?;
        w.write_u16::<LittleEndian>(count)?;
        w.write_u16::<LittleEndian>(count)?;
        w.write_u32::<LittleEndian>(to_u32(cd_size, "central directory size")?)?;
        w.write_u32::<LittleEndian>(cd_offset)?;
        w.write_u16::<LittleEndian>(0)?;
        w.flush()?;
        Ok(self.inner)
    }
}

fn to_u32(v: usize, what: &str) -> Result<u32> {
    u32::try_from(v).map_err(|_| Error::Zip(format!("{what} exceeds 4 GiB")))
}

/// One decoded zip entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZipEntry {
    pub name: String,
    pub data: Vec<u8>,
}

/// Decode every entry of an in-memory zip archive, verifying CRCs.
pub fn read_entries(bytes: &[u8]) -> Result<Vec<ZipEntry>> {
    let eocd = find_end_record(bytes)?;
    let mut cur = &bytes[eocd + 10..];
    let count = cur.read_u16::<LittleEndian>()? as usize;
    let _cd_size = cur.read_u32::<LittleEndian>()?;
    let cd_offset = cur.read_u32::<LittleEndian>()? as usize;

    let mut entries = Vec::with_capacity(count);
    let mut pos = cd_offset;
    for _ in 0..count {
        let header = bytes
            .get(pos..pos + CENTRAL_HEADER_SIZE)
            .ok_or_else(|| Error::Zip("truncated central directory".into()))?;
        let mut cur = header;
        if cur.read_u32::<LittleEndian>()? != CENTRAL_HEADER_SIG {
            return Err(Error::Zip(format!("bad central header at {pos}")));
        }
        let mut skip = [0u8; 6];
        cur.read_exact(&mut skip)?; // made by, needed, flags
        let method = Method::from_u16(cur.read_u16::<LittleEndian>()?)?;
        cur.read_exact(&mut skip[..4])?; // time, date
        let crc = cur.read_u32::<LittleEndian>()?;
        let compressed_size = cur.read_u32::<LittleEndian>()? as usize;
        let size = cur.read_u32::<LittleEndian>()? as usize;
        let name_len = cur.read_u16::<LittleEndian>()? as usize;
        let extra_len = cur.read_u16::<LittleEndian>()? as usize;
        let comment_len = cur.read_u16::<LittleEndian>()? as usize;
        cur.read_exact(&mut skip[..4])?; // disk, internal
        let _external = cur.read_u32::<LittleEndian>()?;
        let local_offset = cur.read_u32::<LittleEndian>()? as usize;

        let name_start = pos + CENTRAL_HEADER_SIZE;
        let name = bytes
            .get(name_start..name_start + name_len)
            .ok_or_else(|| Error::Zip("truncated entry name".into()))?;
        let name = String::from_utf8(name.to_vec())
            .map_err(|e| Error::Zip(format!("entry name is not UTF-8: {e}")))?;
        pos = name_start + name_len + extra_len + comment_len;

        let data = read_local_payload(bytes, local_offset, compressed_size, size, method)?;
        let mut check = Crc::new();
        check.update(&data);
        if check.sum() != crc {
            return Err(Error::Zip(format!("CRC mismatch in '{name}'")));
        }
        entries.push(ZipEntry { name, data });
    }
    Ok(entries)
}

fn find_end_record(bytes: &[u8]) -> Result<usize> {
    if bytes.len() < END_OF_CENTRAL_SIZE {
        return Err(Error::Zip("buffer too small for a zip archive".into()));
    }
    let sig = END_OF_CENTRAL_SIG.to_le_bytes();
    (0..=bytes.len() - END_OF_CENTRAL_SIZE)
        .rev()
        .find(|&i| bytes[i..i + 4] == sig)
        .ok_or_else(|| Error::Zip("end of central directory not found".into()))
}

fn read_local_payload(
    bytes: &[u8],
    offset: usize,
    compressed_size: usize,
    size: usize,
    method: Method,
) -> Result<Vec<u8>> {
    let mut cur = bytes
        .get(offset..offset + LOCAL_HEADER_SIZE)
        .ok_or_else(|| Error::Zip(format!("truncated local header at {offset}")))?;
    if cur.read_u32::<LittleEndian>()? != LOCAL_HEADER_SIG {
        return Err(Error::Zip(format!("bad local header at {offset}")));
    }
    let name_len = u16::from_le_bytes([bytes[offset + 26], bytes[offset + 27]]) as usize;
    let extra_len = u16::from_le_bytes([bytes[offset + 28], bytes[offset + 29]]) as usize;
    let start = offset + LOCAL_HEADER_SIZE + name_len + extra_len;
    let payload = bytes
        .get(start..start + compressed_size)
        .ok_or_else(|| Error::Zip("truncated entry payload".into()))?;

    match method {
        Method::Stored => Ok(payload.to_vec()),
        Method::Deflated => {
            let mut out = Vec::with_capacity(size);
            DeflateDecoder::new(payload).read_to_end(&mut out)?;
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_entries() {
        let repeated = b"scene data that compresses well ".repeat(64);
        let mut zip = ZipWriter::new(Vec::new());
        zip.add_entry("index.json", b"{}").unwrap();
        zip.add_entry("data/abc", &repeated).unwrap();
        assert_eq!(zip.len(), 2);
        let bytes = zip.finish().unwrap();

        // The big entry is deflated, so the archive is smaller than the input
        assert!(bytes.len() < repeated.len());

        let entries = read_entries(&bytes).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "index.json");
        assert_eq!(entries[0].data, b"{}");
        assert_eq!(entries[1].name, "data/abc");
        assert_eq!(entries[1].data, repeated);
    }

    #[test]
    fn test_empty_archive() {
        let bytes = ZipWriter::new(Vec::new()).finish().unwrap();
        assert_eq!(bytes.len(), END_OF_CENTRAL_SIZE);
        assert!(read_entries(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_reject_garbage() {
        assert!(matches!(read_entries(b"not a zip"), Err(Error::Zip(_))));
        assert!(read_entries(&[0u8; 64]).is_err());
    }

    #[test]
    fn test_corrupted_payload_detected() {
        let mut zip = ZipWriter::new(Vec::new()).with_level(0);
        zip.add_entry("a", b"xyz").unwrap();
        let mut bytes = zip.finish().unwrap();
        // Stored payload starts right after the 30-byte header and 1-byte name
        bytes[LOCAL_HEADER_SIZE + 1] ^= 0xff;
        assert!(matches!(read_entries(&bytes), Err(Error::Zip(_))));
    }
}
