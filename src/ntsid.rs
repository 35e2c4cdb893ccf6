use crate::binxml::cursor::ByteCursor;
use crate::err::{DeserializationError, DeserializationResult};

use std::fmt::{self, Debug, Display, Write};

const SID_HEADER_SIZE: usize = 8;

/// A Windows security identifier.
///
/// The identifier-authority bytes are stored big-endian on disk; the
/// sub-authorities follow as little-endian `u32`s.
#[derive(PartialOrd, PartialEq, Eq, Clone)]
pub struct Sid {
    revision: u8,
    authority: u64,
    sub_authorities: Vec<u32>,
}

impl Sid {
    /// Read a SID from exactly `size` bytes. The on-disk sub-authority count
    /// byte is not trusted; as many sub-authorities are read as fit in `size`.
    pub(crate) fn from_cursor_sized(
        cursor: &mut ByteCursor<'_>,
        size: usize,
    ) -> DeserializationResult<Sid> {
        if size < SID_HEADER_SIZE {
            return Err(DeserializationError::UnexpectedEof {
                t: "sid header",
                offset: cursor.chunk_position(),
                need: SID_HEADER_SIZE,
                have: size,
            });
        }

        let revision = cursor.u8("sid.revision")?;
        let _sub_authority_count = cursor.u8("sid.sub_authority_count")?;

        let mut authority: u64 = 0;
        for b in cursor.array::<6>("sid.authority")? {
            authority = (authority << 8) | u64::from(b);
        }

        let sub_authority_slots = (size - SID_HEADER_SIZE) / 4;
        let mut sub_authorities = Vec::with_capacity(sub_authority_slots);
        for _ in 0..sub_authority_slots {
            sub_authorities.push(cursor.u32("sid.sub_authority")?);
        }

        Ok(Sid {
            revision,
            authority,
            sub_authorities,
        })
    }

    /// Bytes consumed by `from_cursor_sized` for a given declared size.
    pub(crate) fn consumed_size(size: usize) -> usize {
        SID_HEADER_SIZE + ((size - SID_HEADER_SIZE) / 4) * 4
    }
}

impl Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}-{}", self.revision, self.authority)?;
        for sub_authority in &self.sub_authorities {
            write!(f, "-{}", sub_authority)?;
        }
        Ok(())
    }
}

impl Debug for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = String::new();
        write!(s, "{}", self).expect("writing to a String cannot fail");
        f.write_str(&s)
    }
}
