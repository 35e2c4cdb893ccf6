mod time;
mod utf16;

pub(crate) use self::time::format_filetime;
pub(crate) use self::utf16::decode_utf16le_bytes;
