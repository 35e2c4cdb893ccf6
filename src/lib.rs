#![deny(unused_must_use)]
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

pub use evtx_chunk::{EvtxChunk, EvtxChunkHeader, EVTX_CHUNK_HEADER_SIZE, EVTX_CHUNK_SIZE};
pub use evtx_file_header::{EvtxFileHeader, HeaderFlags, EVTX_FILE_HEADER_SIZE};
pub use evtx_parser::EvtxParser;
pub use evtx_record::{EvtxRecordHeader, RecordId};
pub use guid::Guid;
pub use kv_output::KvEmitter;
pub use ntsid::Sid;
pub use tables::EventTables;
pub use template_registry::{
    TemplateArgPair, TemplateDescription, TemplateRegistry, MAX_TEMPLATES_PER_CHUNK,
};

pub use binxml::decode_record;

pub mod binxml;
pub mod err;

mod evtx_chunk;
mod evtx_file_header;
mod evtx_parser;
mod evtx_record;
mod guid;
mod kv_output;
mod ntsid;
mod tables;
mod template_registry;
mod utils;

pub type ChunkOffset = u32;
pub type FileOffset = u64;

// For tests, we only initialize logging once.
#[cfg(test)]
use std::sync::Once;

#[cfg(test)]
static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
#[cfg(test)]
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}
