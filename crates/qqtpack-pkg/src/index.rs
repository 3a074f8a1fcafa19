//! IDX stream decoding.

use std::io::Read;

use qqtpack_common::text::GBK;
use qqtpack_common::StreamReader;
use tracing::{debug, trace};

use crate::entry::EntryDescriptor;
use crate::error::FormatError;
use crate::header::{ArchiveHeader, RawHeader};
use crate::Result;

/// Upper bound on up-front record allocation; larger counts grow on demand.
const MAX_PREALLOCATED_ENTRIES: usize = 4096;

/// Read and validate the 16-byte archive header.
pub fn read_header<R: Read>(stream: R) -> Result<ArchiveHeader> {
    read_header_from(&mut StreamReader::new(stream))
}

/// Read `count` entry records, in file order.
pub fn read_entries<R: Read>(stream: R, count: u32) -> Result<Vec<EntryDescriptor>> {
    read_entries_from(&mut StreamReader::new(stream), count)
}

/// Read the header and every record it announces.
pub fn read_index<R: Read>(stream: R) -> Result<(ArchiveHeader, Vec<EntryDescriptor>)> {
    let mut reader = StreamReader::new(stream);
    let header = read_header_from(&mut reader)?;
    let entries = read_entries_from(&mut reader, header.entry_count)?;

    debug!(
        entries = entries.len(),
        bytes = reader.position(),
        "read archive index"
    );

    Ok((header, entries))
}

fn read_header_from<R: Read>(reader: &mut StreamReader<R>) -> Result<ArchiveHeader> {
    let header: ArchiveHeader = reader.read_struct::<RawHeader>()?.into();

    if header.magic != ArchiveHeader::MAGIC {
        return Err(FormatError::BadMagic {
            expected: ArchiveHeader::MAGIC,
            actual: header.magic,
        }
        .into());
    }

    debug!(
        entry_count = header.entry_count,
        table_offset = header.table_offset,
        table_size = header.table_size,
        "read archive header"
    );

    Ok(header)
}

fn read_entries_from<R: Read>(
    reader: &mut StreamReader<R>,
    count: u32,
) -> Result<Vec<EntryDescriptor>> {
    let mut entries = Vec::with_capacity((count as usize).min(MAX_PREALLOCATED_ENTRIES));

    for _ in 0..count {
        entries.push(read_entry(reader)?);
    }

    Ok(entries)
}

fn read_entry<R: Read>(reader: &mut StreamReader<R>) -> Result<EntryDescriptor> {
    let name_length = reader.read_u16()?;
    let name = reader.read_string(u64::from(name_length), GBK)?;

    let offset = reader.read_u32()?;
    let flag = reader.read_u32()?;
    if flag != 0 {
        return Err(FormatError::UnexpectedFlag { name, flag }.into());
    }

    let uncompressed_size = reader.read_u32()?;
    let compressed_size = reader.read_u32()?;

    trace!(
        name = %name,
        offset,
        uncompressed_size,
        compressed_size,
        "read entry record"
    );

    Ok(EntryDescriptor {
        name,
        flag,
        offset,
        uncompressed_size,
        compressed_size,
    })
}
