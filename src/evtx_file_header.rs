use crate::err::{DeserializationError, DeserializationResult};

use bitflags::bitflags;
use byteorder::ReadBytesExt;
use std::io::{Read, Seek, SeekFrom};

/// The file header occupies the first 4 KiB; chunks follow back to back.
pub const EVTX_FILE_HEADER_SIZE: usize = 4096;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HeaderFlags: u32 {
        const EMPTY = 0x0;
        const DIRTY = 0x1;
        const FULL = 0x2;
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct EvtxFileHeader {
    pub first_chunk_number: u64,
    pub last_chunk_number: u64,
    pub next_record_id: u64,
    pub header_size: u32,
    pub minor_version: u16,
    pub major_version: u16,
    pub header_block_size: u16,
    pub chunk_count: u16,
    pub flags: HeaderFlags,
    pub checksum: u32,
}

impl EvtxFileHeader {
    pub fn from_stream<T: Read + Seek>(stream: &mut T) -> DeserializationResult<EvtxFileHeader> {
        let mut magic = [0_u8; 8];
        stream
            .read_exact(&mut magic)
            .map_err(|e| DeserializationError::FailedToRead {
                t: "file_header.magic",
                source: e,
            })?;

        if &magic != b"ElfFile\x00" {
            return Err(DeserializationError::InvalidEvtxFileHeaderMagic { magic });
        }

        let first_chunk_number = try_read!(stream, u64, "file_header.first_chunk_number")?;
        let last_chunk_number = try_read!(stream, u64, "file_header.last_chunk_number")?;
        let next_record_id = try_read!(stream, u64, "file_header.next_record_id")?;
        let header_size = try_read!(stream, u32, "file_header.header_size")?;
        let minor_version = try_read!(stream, u16, "file_header.minor_version")?;
        let major_version = try_read!(stream, u16, "file_header.major_version")?;
        let header_block_size = try_read!(stream, u16, "file_header.header_block_size")?;
        let chunk_count = try_read!(stream, u16, "file_header.chunk_count")?;

        // Reserved
        stream
            .seek(SeekFrom::Current(76))
            .map_err(|e| DeserializationError::FailedToRead {
                t: "file_header.reserved",
                source: e,
            })?;

        let flags = HeaderFlags::from_bits_truncate(try_read!(stream, u32, "file_header.flags")?);
        let checksum = try_read!(stream, u32, "file_header.checksum")?;

        Ok(EvtxFileHeader {
            first_chunk_number,
            last_chunk_number,
            next_record_id,
            header_size,
            minor_version,
            major_version,
            header_block_size,
            chunk_count,
            flags,
            checksum,
        })
    }
}
