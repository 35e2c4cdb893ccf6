use crate::err::{EvtxError, Result};
use crate::evtx_chunk::{EvtxChunk, EVTX_CHUNK_SIZE};
use crate::evtx_file_header::{EvtxFileHeader, EVTX_FILE_HEADER_SIZE};
use crate::tables::EventTables;

use log::{debug, info};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Reads an EVTX file chunk by chunk and renders every record as one line
/// of `'key':value, ` pairs.
///
/// Each chunk gets a fresh template registry; no decode state survives a
/// chunk boundary, and none survives the file.
pub struct EvtxParser<T: Read + Seek> {
    input: T,
    header: EvtxFileHeader,
    tables: EventTables,
}

impl EvtxParser<BufReader<File>> {
    /// Attempts to load an evtx file from a given path, will fail if the
    /// path does not exist or the file header is not a supported version.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| EvtxError::FailedToOpenFile {
            source: e,
            path: path.to_path_buf(),
        })?;

        Self::from_read_seek(BufReader::new(file))
    }
}

impl<T: Read + Seek> EvtxParser<T> {
    pub fn from_read_seek(mut input: T) -> Result<Self> {
        let header = EvtxFileHeader::from_stream(&mut input)?;

        if (header.major_version, header.minor_version) != (3, 1) {
            return Err(EvtxError::UnsupportedVersion {
                major: header.major_version,
                minor: header.minor_version,
            });
        }

        debug!("EVTX header: {:?}", header);

        Ok(EvtxParser {
            input,
            header,
            tables: EventTables::windows_defaults(),
        })
    }

    /// Replace the injected annotation tables.
    pub fn with_tables(mut self, tables: EventTables) -> Self {
        self.tables = tables;
        self
    }

    pub fn header(&self) -> &EvtxFileHeader {
        &self.header
    }

    /// Decode all chunks in file order, writing one line per record.
    ///
    /// Iteration stops cleanly at the first short read or missing chunk
    /// magic (allocated-but-unused tail space); a record failure inside a
    /// chunk's live range fails the whole file.
    pub fn write_records<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let mut buffer = vec![0_u8; EVTX_CHUNK_SIZE];

        for chunk_number in 0_u64.. {
            let chunk_offset =
                EVTX_FILE_HEADER_SIZE as u64 + chunk_number * EVTX_CHUNK_SIZE as u64;
            self.input.seek(SeekFrom::Start(chunk_offset))?;

            if !read_full(&mut self.input, &mut buffer)? {
                debug!("short read at chunk {}, done", chunk_number);
                break;
            }

            let mut chunk = match EvtxChunk::new(&buffer) {
                Ok(chunk) => chunk,
                Err(e) => {
                    debug!("no chunk at {} ({}), done", chunk_number, e);
                    break;
                }
            };

            info!(
                "decoding chunk {} (records {}..={})",
                chunk_number,
                chunk.header.first_event_record_number,
                chunk.header.last_event_record_number
            );

            chunk.write_records(&self.tables, out)?;
        }

        Ok(())
    }
}

/// Fill `buf` completely. `Ok(false)` means a clean EOF or a trailing
/// partial chunk, either of which ends the file.
fn read_full<T: Read>(input: &mut T, buf: &mut [u8]) -> Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => return Ok(false),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}
