use crate::binxml::cursor::ByteCursor;
use crate::err::DeserializationResult;

use log::warn;

/// Resolve a name reference against the chunk's string table.
///
/// The stream carries a 32-bit chunk-relative offset. For a freshly written
/// name (the common case inside a just-defined template body) the offset
/// equals the cursor's own chunk position and the name bytes follow in
/// place; otherwise the name was placed earlier in the chunk and is read
/// through a temporary cursor, leaving the main cursor just past the offset
/// field.
///
/// Resolution failures yield an empty name rather than aborting the record;
/// the emission rules tolerate empty keys.
pub(crate) fn read_name(
    cursor: &mut ByteCursor<'_>,
    chunk: &[u8],
) -> DeserializationResult<String> {
    let name_offset = cursor.u32("name_offset")?;

    if cursor.chunk_position() == u64::from(name_offset) {
        return Ok(read_name_entry(cursor).unwrap_or_else(|e| {
            warn!("failed to read in-place name at {}: {}", name_offset, e);
            String::new()
        }));
    }

    let name = match ByteCursor::with_pos(chunk, name_offset as usize, "name entry") {
        Ok(mut temporary) => read_name_entry(&mut temporary).unwrap_or_else(|e| {
            warn!("failed to read name at chunk offset {}: {}", name_offset, e);
            String::new()
        }),
        Err(_) => {
            warn!("name offset {} is outside the chunk", name_offset);
            String::new()
        }
    };

    Ok(name)
}

/// A name entry is a 32-bit link to the next name in the same hash bucket,
/// a 16-bit hash, and a length-prefixed null-terminated UTF-16LE string.
/// Neither the link nor the hash affect decoding.
fn read_name_entry(cursor: &mut ByteCursor<'_>) -> DeserializationResult<String> {
    let _next_string_offset = cursor.u32("name.link")?;
    let _name_hash = cursor.u16("name.hash")?;
    cursor.len_prefixed_utf16_string(true, "name.string")
}
