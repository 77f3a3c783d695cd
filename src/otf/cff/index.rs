// Copyright 2017 The Servo Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The CFF INDEX structure: a count-prefixed array of variable-length byte strings, used
//! throughout a `CFF ` table for the Name, Top DICT, String, Global Subr, CharStrings, FDArray,
//! and local Subr collections.

use byteorder::{BigEndian, ReadBytesExt};
use crate::error::Error;
use crate::util::Jump;

#[derive(Clone, Copy)]
pub struct Index<'a> {
    offsets: &'a [u8],
    off_size: u8,
    count: u32,
    data: &'a [u8],
}

impl<'a> Index<'a> {
    /// Parses an INDEX starting at `reader`'s current position, advancing `reader` past it.
    pub fn parse(reader: &mut &'a [u8]) -> Result<Index<'a>, Error> {
        let count = reader.read_u16::<BigEndian>().map_err(Error::eof)? as u32;
        if count == 0 {
            return Ok(Index::empty())
        }

        let off_size = reader.read_u8().map_err(Error::eof)?;
        if off_size == 0 || off_size > 4 {
            return Err(Error::CffBadOffset)
        }

        let offset_array_len = off_size as usize * (count as usize + 1);
        if reader.len() < offset_array_len {
            return Err(Error::UnexpectedEof)
        }
        let offsets = &reader[0..offset_array_len];
        reader.jump(offset_array_len).map_err(Error::eof)?;

        let data_len = read_offset_at(offsets, off_size, count) as usize - 1;
        if reader.len() < data_len {
            return Err(Error::UnexpectedEof)
        }
        let data = &reader[0..data_len];
        reader.jump(data_len).map_err(Error::eof)?;

        Ok(Index { offsets, off_size, count, data })
    }

    pub fn empty() -> Index<'static> {
        Index { offsets: &[], off_size: 1, count: 0, data: &[] }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Returns the `index`th element's bytes. Offsets in the INDEX are 1-based, so element `i`
    /// spans `[offset[i], offset[i + 1])`.
    pub fn get(&self, index: usize) -> Result<&'a [u8], Error> {
        if index as u32 >= self.count {
            return Err(Error::FontIndexOutOfBounds)
        }
        let start = read_offset_at(self.offsets, self.off_size, index as u32) as usize - 1;
        let end = read_offset_at(self.offsets, self.off_size, index as u32 + 1) as usize - 1;
        if end < start || end > self.data.len() {
            return Err(Error::CffBadOffset)
        }
        Ok(&self.data[start..end])
    }
}

fn read_offset_at(offsets: &[u8], off_size: u8, index: u32) -> u32 {
    let start = off_size as usize * index as usize;
    let bytes = &offsets[start..start + off_size as usize];
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_index_has_no_elements() {
        let index = Index::empty();
        assert_eq!(index.count(), 0);
        assert!(index.get(0).is_err());
    }

    #[test]
    fn parses_a_two_element_index() {
        // count=2, offSize=1, offsets=[1, 3, 5], data=b"abcd"
        let bytes: &[u8] = &[0, 2, 1, 1, 3, 5, b'a', b'b', b'c', b'd'];
        let mut reader = bytes;
        let index = Index::parse(&mut reader).unwrap();
        assert_eq!(index.count(), 2);
        assert_eq!(index.get(0).unwrap(), b"ab");
        assert_eq!(index.get(1).unwrap(), b"cd");
        assert!(reader.is_empty());
    }
}
