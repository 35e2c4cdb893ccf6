use crate::binxml::decode_record;
use crate::err::{DeserializationError, DeserializationResult, EvtxError, Result};
use crate::evtx_record::{EvtxRecordHeader, EVTX_RECORD_HEADER_SIZE};
use crate::tables::EventTables;
use crate::template_registry::TemplateRegistry;

use byteorder::ReadBytesExt;
use log::{debug, trace};
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

pub const EVTX_CHUNK_SIZE: usize = 0x10000;
pub const EVTX_CHUNK_HEADER_SIZE: usize = 512;

#[derive(Debug, PartialEq, Eq)]
pub struct EvtxChunkHeader {
    pub first_event_record_number: u64,
    pub last_event_record_number: u64,
    pub first_event_record_id: u64,
    pub last_event_record_id: u64,
    pub header_size: u32,
    pub last_event_record_data_offset: u32,
    pub free_space_offset: u32,
    pub events_checksum: u32,
}

impl EvtxChunkHeader {
    pub fn from_reader(input: &mut Cursor<&[u8]>) -> DeserializationResult<EvtxChunkHeader> {
        let mut magic = [0_u8; 8];
        input
            .read_exact(&mut magic)
            .map_err(|e| DeserializationError::FailedToRead {
                t: "chunk_header.magic",
                source: e,
            })?;

        if &magic != b"ElfChnk\x00" {
            return Err(DeserializationError::InvalidEvtxChunkMagic { magic });
        }

        let first_event_record_number =
            try_read!(input, u64, "chunk_header.first_event_record_number")?;
        let last_event_record_number =
            try_read!(input, u64, "chunk_header.last_event_record_number")?;
        let first_event_record_id = try_read!(input, u64, "chunk_header.first_event_record_id")?;
        let last_event_record_id = try_read!(input, u64, "chunk_header.last_event_record_id")?;
        let header_size = try_read!(input, u32, "chunk_header.header_size")?;
        let last_event_record_data_offset =
            try_read!(input, u32, "chunk_header.last_event_record_data_offset")?;
        let free_space_offset = try_read!(input, u32, "chunk_header.free_space_offset")?;
        let events_checksum = try_read!(input, u32, "chunk_header.events_checksum")?;

        // The rest of the 512-byte header block (reserved area, header
        // checksum, string and template offset tables) does not affect
        // decoding; templates are materialized from the record streams.
        input
            .seek(SeekFrom::Start(EVTX_CHUNK_HEADER_SIZE as u64))
            .map_err(|e| DeserializationError::FailedToRead {
                t: "chunk_header.reserved",
                source: e,
            })?;

        Ok(EvtxChunkHeader {
            first_event_record_number,
            last_event_record_number,
            first_event_record_id,
            last_event_record_id,
            header_size,
            last_event_record_data_offset,
            free_space_offset,
            events_checksum,
        })
    }
}

/// One 64 KiB chunk and the decode state scoped to it.
///
/// The template registry lives exactly as long as the chunk: it is cleared
/// on construction and never shared across chunks, so two chunks decode to
/// identical output whether processed together or in isolation.
pub struct EvtxChunk<'a> {
    pub data: &'a [u8],
    pub header: EvtxChunkHeader,
    registry: TemplateRegistry,
}

impl<'a> EvtxChunk<'a> {
    /// Will fail if the data does not start with a valid chunk header.
    pub fn new(data: &'a [u8]) -> DeserializationResult<EvtxChunk<'a>> {
        let mut cursor = Cursor::new(data);
        let header = EvtxChunkHeader::from_reader(&mut cursor)?;

        Ok(EvtxChunk {
            data,
            header,
            registry: TemplateRegistry::new(),
        })
    }

    /// Decode every record in the chunk, writing one line per record.
    ///
    /// Record headers chain by their size field starting at offset 512. A
    /// record that fails to decode fails the chunk only when its number is
    /// inside the header's live range; a failure past the last live record
    /// means the iteration ran into stale space and the chunk ends cleanly.
    pub fn write_records<W: Write>(&mut self, tables: &EventTables, out: &mut W) -> Result<()> {
        self.registry.reset();

        let mut offset = EVTX_CHUNK_HEADER_SIZE;
        let mut line = String::new();

        loop {
            if offset + EVTX_RECORD_HEADER_SIZE > self.data.len() {
                break;
            }

            let record_header = match EvtxRecordHeader::from_bytes_at(self.data, offset) {
                Ok(record_header) => record_header,
                Err(e) => {
                    debug!("no record at offset {:#x} ({}), chunk ends", offset, e);
                    break;
                }
            };

            trace!(
                "record {} at offset {:#x}",
                record_header.event_record_id,
                offset
            );

            match self.decode_record_line(&record_header, offset, tables, &mut line) {
                Ok(()) => {
                    writeln!(out, "{}", line)?;
                    offset += record_header.data_size as usize;
                }
                Err(e) => {
                    if self.record_is_live(record_header.event_record_id) {
                        return Err(EvtxError::FailedToDecodeRecord {
                            record_id: record_header.event_record_id,
                            source: Box::new(e),
                        });
                    }
                    debug!(
                        "record {} failed past the live range ({}), chunk ends",
                        record_header.event_record_id, e
                    );
                    break;
                }
            }
        }

        Ok(())
    }

    fn record_is_live(&self, record_id: u64) -> bool {
        record_id >= self.header.first_event_record_number
            && record_id <= self.header.last_event_record_number
    }

    fn decode_record_line(
        &mut self,
        record_header: &EvtxRecordHeader,
        offset: usize,
        tables: &EventTables,
        line: &mut String,
    ) -> DeserializationResult<()> {
        line.clear();
        line.push_str(&record_header.render_prefix()?);

        let payload_size = record_header.record_data_size()? as usize;
        decode_record(
            self.data,
            offset + EVTX_RECORD_HEADER_SIZE,
            payload_size,
            &mut self.registry,
            tables,
            line,
        )
    }
}
