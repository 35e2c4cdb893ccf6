/// Decode UTF-16 code units until the first NUL (0x0000), if present.
///
/// Invalid sequences (lone surrogates) are replaced rather than failed;
/// dirty samples routinely contain garbage in string payloads and a
/// replacement character preserves the rest of the record.
pub(crate) fn decode_utf16_units(units: &[u16]) -> String {
    let end = units.iter().position(|&c| c == 0).unwrap_or(units.len());
    let slice = &units[..end];

    // Fast path: all code units <= 0x7F is pure ASCII and can be converted
    // directly without surrogate handling overhead.
    if slice.iter().all(|&c| c <= 0x7F) {
        return slice.iter().map(|&c| c as u8 as char).collect();
    }

    String::from_utf16_lossy(slice)
}

/// Decode a UTF-16LE byte slice until the first NUL, if present.
/// An odd trailing byte is ignored.
pub(crate) fn decode_utf16le_bytes(bytes: &[u8]) -> String {
    let mut units = Vec::with_capacity(bytes.len() / 2);
    for chunk in bytes.chunks_exact(2) {
        units.push(u16::from_le_bytes([chunk[0], chunk[1]]));
    }
    decode_utf16_units(&units)
}
