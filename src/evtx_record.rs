use crate::binxml::cursor::ByteCursor;
use crate::err::{DeserializationError, DeserializationResult};
use crate::utils::format_filetime;

pub type RecordId = u64;

pub(crate) const EVTX_RECORD_HEADER_SIZE: usize = 24;
/// The record's size field is repeated after the payload.
pub(crate) const EVTX_RECORD_TRAILER_SIZE: usize = 4;

const EVTX_RECORD_MAGIC: [u8; 4] = [0x2a, 0x2a, 0x00, 0x00];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvtxRecordHeader {
    /// Total record size, header and trailing size copy included.
    pub data_size: u32,
    pub event_record_id: RecordId,
    pub timestamp_filetime: u64,
}

impl EvtxRecordHeader {
    pub fn from_bytes_at(buf: &[u8], offset: usize) -> DeserializationResult<EvtxRecordHeader> {
        let mut cursor = ByteCursor::with_pos(buf, offset, "record header")?;

        let magic = cursor.array::<4>("record.magic")?;
        if magic != EVTX_RECORD_MAGIC {
            return Err(DeserializationError::InvalidEvtxRecordHeaderMagic { magic });
        }

        let data_size = cursor.u32("record.data_size")?;
        let event_record_id = cursor.u64("record.event_record_id")?;
        let timestamp_filetime = cursor.u64("record.filetime")?;

        Ok(EvtxRecordHeader {
            data_size,
            event_record_id,
            timestamp_filetime,
        })
    }

    /// Size of the binxml payload between the header and the trailing size
    /// copy.
    pub fn record_data_size(&self) -> DeserializationResult<u32> {
        let overhead = (EVTX_RECORD_HEADER_SIZE + EVTX_RECORD_TRAILER_SIZE) as u32;
        if self.data_size < overhead {
            return Err(DeserializationError::InvalidRecordDataSize {
                size: self.data_size,
            });
        }
        Ok(self.data_size - overhead)
    }

    /// The per-record line prefix: `Record #<number> <timestamp> `.
    pub fn render_prefix(&self) -> DeserializationResult<String> {
        let timestamp = format_filetime(self.timestamp_filetime).ok_or(
            DeserializationError::InvalidRecordTimestamp {
                filetime: self.timestamp_filetime,
            },
        )?;
        Ok(format!("Record #{} {} ", self.event_record_id, timestamp))
    }
}
