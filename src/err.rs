use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EvtxError>;
pub type DeserializationResult<T> = std::result::Result<T, DeserializationError>;

/// Errors produced while decoding the binary structures inside a chunk.
/// Offsets are expressed in chunk coordinates.
#[derive(Debug, Error)]
pub enum DeserializationError {
    #[error("Offset {offset}: unexpected end of data while reading {t} (need {need}, have {have})")]
    UnexpectedEof {
        t: &'static str,
        offset: u64,
        need: usize,
        have: usize,
    },

    #[error("Offset {offset}: tried to read an invalid byte `{value:x}` as a binxml token")]
    InvalidToken { value: u8, offset: u64 },

    #[error("Offset {offset}: template instance discriminant was `{value:x}`, expected `01`")]
    MalformedTemplateInstance { value: u8, offset: u64 },

    #[error("Offset {offset}: failed to parse an inline template body")]
    FailedToParseTemplateBody {
        offset: u64,
        source: Box<DeserializationError>,
    },

    #[error("Offset {offset}: binxml nesting exceeded {limit} levels")]
    RecursionLimitExceeded { limit: u8, offset: u64 },

    #[error(
        "Offset {offset}: argument map of {num_arguments} entries cannot fit in the remaining {have} bytes"
    )]
    OversizedArgumentMap {
        num_arguments: u32,
        have: usize,
        offset: u64,
    },

    #[error("Invalid EVTX record header magic, expected `2a2a0000`, found `{magic:02x?}`")]
    InvalidEvtxRecordHeaderMagic { magic: [u8; 4] },

    #[error("Invalid EVTX chunk header magic, expected `ElfChnk0`, found `{magic:02x?}`")]
    InvalidEvtxChunkMagic { magic: [u8; 8] },

    #[error("Invalid EVTX file header magic, expected `ElfFile0`, found `{magic:02x?}`")]
    InvalidEvtxFileHeaderMagic { magic: [u8; 8] },

    #[error("Record size {size} cannot cover the record header and its trailing size copy")]
    InvalidRecordDataSize { size: u32 },

    #[error("Record timestamp `{filetime:016X}` is not a representable FILETIME")]
    InvalidRecordTimestamp { filetime: u64 },

    #[error("An I/O error has occurred while reading {t}")]
    FailedToRead {
        t: &'static str,
        source: std::io::Error,
    },
}

/// Top-level errors, carrying file and record context around the
/// deserialization kinds above.
#[derive(Debug, Error)]
pub enum EvtxError {
    #[error("An I/O error has occurred")]
    IO {
        #[from]
        source: std::io::Error,
    },

    #[error("Failed to open file {}", path.display())]
    FailedToOpenFile {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("Unsupported EVTX version {major}.{minor}, expected 3.1")]
    UnsupportedVersion { major: u16, minor: u16 },

    #[error(transparent)]
    DeserializationError(#[from] DeserializationError),

    #[error("Failed to decode record {record_id}")]
    FailedToDecodeRecord {
        record_id: u64,
        source: Box<DeserializationError>,
    },
}
