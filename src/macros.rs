/// Reads a little-endian value from an io reader, tagging failures with the
/// field being read. Callers need `byteorder::ReadBytesExt` in scope.
macro_rules! try_read {
    ($stream:expr, u16, $field:expr) => {
        $stream
            .read_u16::<byteorder::LittleEndian>()
            .map_err(|e| $crate::err::DeserializationError::FailedToRead {
                t: $field,
                source: e,
            })
    };

    ($stream:expr, u32, $field:expr) => {
        $stream
            .read_u32::<byteorder::LittleEndian>()
            .map_err(|e| $crate::err::DeserializationError::FailedToRead {
                t: $field,
                source: e,
            })
    };

    ($stream:expr, u64, $field:expr) => {
        $stream
            .read_u64::<byteorder::LittleEndian>()
            .map_err(|e| $crate::err::DeserializationError::FailedToRead {
                t: $field,
                source: e,
            })
    };
}
