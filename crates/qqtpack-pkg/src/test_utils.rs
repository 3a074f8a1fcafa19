//! Fixture builders for IDX/PKG tests.

use std::io::Write;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use qqtpack_common::text::GBK;

use crate::header::ArchiveHeader;

/// A raw IDX record, written verbatim.
#[derive(Debug, Clone)]
pub(crate) struct Record {
    pub name: Vec<u8>,
    pub offset: u32,
    pub flag: u32,
    pub uncompressed_size: u32,
    pub compressed_size: u32,
}

impl Record {
    pub fn new(name: &str, offset: u32, uncompressed_size: u32, compressed_size: u32) -> Self {
        Self {
            name: gbk(name),
            offset,
            flag: 0,
            uncompressed_size,
            compressed_size,
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.write_u16::<LittleEndian>(self.name.len() as u16).unwrap();
        out.extend_from_slice(&self.name);
        out.write_u32::<LittleEndian>(self.offset).unwrap();
        out.write_u32::<LittleEndian>(self.flag).unwrap();
        out.write_u32::<LittleEndian>(self.uncompressed_size).unwrap();
        out.write_u32::<LittleEndian>(self.compressed_size).unwrap();
    }
}

/// Encode `name` as GBK.
pub(crate) fn gbk(name: &str) -> Vec<u8> {
    let (bytes, _, had_errors) = GBK.encode(name);
    assert!(!had_errors, "{name:?} is not representable in GBK");
    bytes.into_owned()
}

/// Serialize a complete IDX stream.
pub(crate) fn idx_bytes(magic: u32, records: &[Record]) -> Vec<u8> {
    let mut table = Vec::new();
    for record in records {
        record.write_to(&mut table);
    }

    let mut out = Vec::with_capacity(ArchiveHeader::SIZE + table.len());
    out.write_u32::<LittleEndian>(magic).unwrap();
    out.write_u32::<LittleEndian>(records.len() as u32).unwrap();
    out.write_u32::<LittleEndian>(ArchiveHeader::SIZE as u32).unwrap();
    out.write_u32::<LittleEndian>(table.len() as u32).unwrap();
    out.extend_from_slice(&table);
    out
}

/// Compress `data` into a zlib stream.
pub(crate) fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Builds matching IDX and PKG streams.
#[derive(Debug, Default)]
pub(crate) struct ArchiveBuilder {
    pub records: Vec<Record>,
    pub pkg: Vec<u8>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a well-formed entry holding `data`.
    pub fn add(mut self, name: &str, data: &[u8]) -> Self {
        let compressed = zlib(data);
        let record = Record::new(
            name,
            self.pkg.len() as u32,
            data.len() as u32,
            compressed.len() as u32,
        );
        self.pkg.extend_from_slice(&compressed);
        self.records.push(record);
        self
    }

    /// Append an arbitrary record without touching the PKG stream.
    pub fn add_record(mut self, record: Record) -> Self {
        self.records.push(record);
        self
    }

    pub fn idx(&self) -> Vec<u8> {
        idx_bytes(ArchiveHeader::MAGIC, &self.records)
    }

    /// Write `object.idx` and `object.pkg` into `dir`.
    pub fn write_to(&self, dir: &Path) -> (PathBuf, PathBuf) {
        let idx_path = dir.join("object.idx");
        let pkg_path = dir.join("object.pkg");
        std::fs::write(&idx_path, self.idx()).unwrap();
        std::fs::write(&pkg_path, &self.pkg).unwrap();
        (idx_path, pkg_path)
    }
}
