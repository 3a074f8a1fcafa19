//! IDX archive header.

use zerocopy::byteorder::little_endian::U32;
use zerocopy::{FromBytes, Immutable, KnownLayout};

/// On-disk header layout.
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout)]
#[repr(C)]
pub(crate) struct RawHeader {
    magic: U32,
    entry_count: U32,
    table_offset: U32,
    table_size: U32,
}

/// The fixed 16-byte header at the start of an IDX stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveHeader {
    /// Format marker, always [`ArchiveHeader::MAGIC`] for valid archives.
    pub magic: u32,
    /// Number of entry records following the header.
    pub entry_count: u32,
    /// Position of the entry table within the IDX stream.
    pub table_offset: u32,
    /// Size of the entry table in bytes.
    pub table_size: u32,
}

impl ArchiveHeader {
    /// Magic value identifying an IDX stream.
    pub const MAGIC: u32 = 100;

    /// Size of the header in bytes.
    pub const SIZE: usize = std::mem::size_of::<RawHeader>();
}

impl From<RawHeader> for ArchiveHeader {
    fn from(raw: RawHeader) -> Self {
        Self {
            magic: raw.magic.get(),
            entry_count: raw.entry_count.get(),
            table_offset: raw.table_offset.get(),
            table_size: raw.table_size.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_size() {
        assert_eq!(ArchiveHeader::SIZE, 16);
    }

    #[test]
    fn test_raw_header_is_little_endian() {
        let bytes = [
            0x64, 0, 0, 0, // magic
            0x02, 0x01, 0, 0, // entry_count
            0x10, 0, 0, 0, // table_offset
            0x00, 0x00, 0x01, 0x00, // table_size
        ];
        let raw = RawHeader::read_from_bytes(&bytes[..]).unwrap();
        let header = ArchiveHeader::from(raw);

        assert_eq!(header.magic, ArchiveHeader::MAGIC);
        assert_eq!(header.entry_count, 0x0102);
        assert_eq!(header.table_offset, 16);
        assert_eq!(header.table_size, 0x10000);
    }
}
