use crate::error::{DecodeError, Result};

// Widest single field in any schema is a 32-bit word; 64 covers a full
// memory line and is the most a u64 can hold anyway.
const MAX_FIELD_BITS: usize = 64;

/// Drops a one-character marker prefix (e.g. the `b` the capture pipeline
/// puts in front of binary values). A leading '0'/'1' is kept.
pub fn strip_marker(bits: &str) -> &str {
    let mut chars = bits.chars();
    match chars.next() {
        Some('0') | Some('1') | None => bits,
        Some(_) => chars.as_str(),
    }
}

/// Borrows `bits[offset..offset+width]`, for nested packet decoders.
/// Byte indexing is only sound over '0'/'1' text, so a boundary that
/// lands inside a multi-byte character reports that character as a bad
/// bit instead of panicking.
pub fn slice(bits: &str, offset: usize, width: usize) -> Result<&str> {
    if offset + width > bits.len() {
        return Err(DecodeError::OutOfRange {
            offset,
            width,
            len: bits.len(),
        });
    }
    match bits.get(offset..offset + width) {
        Some(sub) => Ok(sub),
        // in bounds but off a char boundary: some multi-byte char is
        // in the string, and it cannot be a valid bit
        None => match bits.char_indices().find(|&(_, c)| c != '0' && c != '1') {
            Some((at, found)) => Err(DecodeError::InvalidBit { found, offset: at }),
            None => Err(DecodeError::OutOfRange {
                offset,
                width,
                len: bits.len(),
            }),
        },
    }
}

/// Parses `bits[offset..offset+width]` as an MSB-first unsigned integer.
/// A zero-width slice is 0.
pub fn extract_uint(bits: &str, offset: usize, width: usize) -> Result<u64> {
    let raw = bits.as_bytes();
    if width > MAX_FIELD_BITS || offset + width > raw.len() {
        return Err(DecodeError::OutOfRange {
            offset,
            width,
            len: raw.len(),
        });
    }
    let mut value: u64 = 0;
    for (i, &ch) in raw[offset..offset + width].iter().enumerate() {
        value = (value << 1)
            | match ch {
                b'0' => 0,
                b'1' => 1,
                _ => {
                    return Err(DecodeError::InvalidBit {
                        found: ch as char,
                        offset: offset + i,
                    })
                }
            };
    }
    Ok(value)
}

/// True iff the character at `offset` is '1'.
pub fn extract_bool(bits: &str, offset: usize) -> Result<bool> {
    let raw = bits.as_bytes();
    if offset >= raw.len() {
        return Err(DecodeError::OutOfRange {
            offset,
            width: 1,
            len: raw.len(),
        });
    }
    Ok(raw[offset] == b'1')
}

/// Per-character '1' tests over `bits[offset..offset+width]`, in wire order.
pub fn extract_bool_vec(bits: &str, offset: usize, width: usize) -> Result<Vec<bool>> {
    let raw = bits.as_bytes();
    if offset + width > raw.len() {
        return Err(DecodeError::OutOfRange {
            offset,
            width,
            len: raw.len(),
        });
    }
    Ok(raw[offset..offset + width].iter().map(|&c| c == b'1').collect())
}

/// Character-order reversal. Masks are stored MSB-first on the wire;
/// reversing puts index 0 at vector position 0.
pub fn reverse(bits: &str) -> String {
    bits.chars().rev().collect()
}

/// Whole-string mask read, LSB first: element i is wire bit i.
pub fn to_mask(bits: &str) -> Vec<bool> {
    bits.as_bytes().iter().rev().map(|&c| c == b'1').collect()
}

/// Sequential reader over a bit-string. Field order in a packet schema is
/// wire order, so decoders just take fields front to back.
pub struct BitCursor<'a> {
    bits: &'a str,
    pos: usize,
}

impl<'a> BitCursor<'a> {
    pub fn new(bits: &'a str) -> Self {
        BitCursor { bits, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bits.len() - self.pos
    }

    pub fn take_uint(&mut self, width: usize) -> Result<u64> {
        let value = extract_uint(self.bits, self.pos, width)?;
        self.pos += width;
        Ok(value)
    }

    pub fn take_bool(&mut self) -> Result<bool> {
        let value = extract_bool(self.bits, self.pos)?;
        self.pos += 1;
        Ok(value)
    }

    /// Hands out the raw sub-slice, for nested packet decoders.
    pub fn take_bits(&mut self, width: usize) -> Result<&'a str> {
        let sub = slice(self.bits, self.pos, width)?;
        self.pos += width;
        Ok(sub)
    }

    /// Takes a mask field and reverses it, so bit 0 of the mask lands at
    /// index 0 of the vector.
    pub fn take_mask(&mut self, width: usize) -> Result<Vec<bool>> {
        let mut mask = extract_bool_vec(self.bits, self.pos, width)?;
        mask.reverse();
        self.pos += width;
        Ok(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uint_msb_first() {
        assert_eq!(extract_uint("1010", 0, 4).unwrap(), 0b1010);
        assert_eq!(extract_uint("1010", 1, 3).unwrap(), 0b010);
        assert_eq!(extract_uint("1010", 2, 0).unwrap(), 0);
    }

    #[test]
    fn uint_out_of_bounds() {
        assert_eq!(
            extract_uint("101", 1, 3),
            Err(DecodeError::OutOfRange {
                offset: 1,
                width: 3,
                len: 3
            })
        );
    }

    #[test]
    fn uint_rejects_four_state_digits() {
        assert_eq!(
            extract_uint("1x0", 0, 3),
            Err(DecodeError::InvalidBit {
                found: 'x',
                offset: 1
            })
        );
    }

    #[test]
    fn marker_stripping() {
        assert_eq!(strip_marker("b0101"), "0101");
        assert_eq!(strip_marker("0101"), "0101");
        assert_eq!(strip_marker(""), "");
    }

    #[test]
    fn marker_may_be_multi_byte() {
        assert_eq!(strip_marker("Σ0101"), "0101");
        assert_eq!(strip_marker("b"), "");
    }

    #[test]
    fn slicing_into_a_wide_char_is_an_invalid_bit() {
        assert_eq!(
            slice("01Σ1", 0, 3),
            Err(DecodeError::InvalidBit {
                found: 'Σ',
                offset: 2
            })
        );
        let mut cur = BitCursor::new("01Σ1");
        assert_eq!(
            cur.take_bits(3),
            Err(DecodeError::InvalidBit {
                found: 'Σ',
                offset: 2
            })
        );
    }

    #[test]
    fn mask_reverses_to_lsb_first() {
        let mut cur = BitCursor::new("1100");
        assert_eq!(cur.take_mask(4).unwrap(), vec![false, false, true, true]);
    }

    #[test]
    fn cursor_walks_fields_in_order() {
        let mut cur = BitCursor::new("101100");
        assert_eq!(cur.take_uint(3).unwrap(), 0b101);
        assert!(cur.take_bool().unwrap());
        assert_eq!(cur.take_bits(2).unwrap(), "00");
        assert_eq!(cur.remaining(), 0);
    }
}
