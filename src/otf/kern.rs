// Copyright 2017 The Servo Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The legacy `kern` (pair kerning) table. Ambient supplement: optional, absent without failing
//! the subfont. Only format-0 horizontal subtables are understood; others are skipped.

use byteorder::{BigEndian, ReadBytesExt};
use crate::error::Error;
use crate::otf::FontTable;
use crate::util::Jump;

pub const TAG: u32 = ((b'k' as u32) << 24) | ((b'e' as u32) << 16) |
                      ((b'r' as u32) << 8)  |  (b'n' as u32);

bitflags! {
    struct Coverage: u16 {
        const HORIZONTAL   = 1 << 0;
        const MINIMUM      = 1 << 1;
        const CROSS_STREAM = 1 << 2;
        const OVERRIDE     = 1 << 3;
    }
}

#[derive(Clone, Copy)]
pub struct KernTable<'a> {
    horizontal_table: &'a [u8],
}

impl<'a> KernTable<'a> {
    pub fn new(table: FontTable<'a>) -> Result<KernTable<'a>, Error> {
        let mut kern_reader = table.bytes;
        let version = kern_reader.read_u16::<BigEndian>().map_err(Error::eof)?;
        if version != 0 {
            return Err(Error::UnsupportedVersion)
        }

        let n_tables = kern_reader.read_u16::<BigEndian>().map_err(Error::eof)?;
        let mut horizontal_table = None;
        for _ in 0..n_tables {
            let mut table_reader = kern_reader;
            let _subtable_version = table_reader.read_u16::<BigEndian>().map_err(Error::eof)?;
            let length = table_reader.read_u16::<BigEndian>().map_err(Error::eof)?;
            let coverage = table_reader.read_u16::<BigEndian>().map_err(Error::eof)?;
            let coverage_flags = Coverage::from_bits_truncate(coverage);

            if coverage_flags.contains(Coverage::HORIZONTAL) &&
                    !coverage_flags.contains(Coverage::MINIMUM) &&
                    !coverage_flags.contains(Coverage::CROSS_STREAM) &&
                    (coverage >> 8) == 0 {
                let body_length = length as usize - std::mem::size_of::<u16>() * 3;
                horizontal_table = Some(&table_reader[0..body_length]);
                break
            }

            kern_reader.jump(length as usize).map_err(Error::eof)?;
        }

        match horizontal_table {
            Some(horizontal_table) => Ok(KernTable { horizontal_table }),
            None => Err(Error::UnsupportedVersion),
        }
    }

    pub fn kerning_for_glyph_pair(&self, left_glyph_id: u16, right_glyph_id: u16)
                                  -> Result<i16, Error> {
        let mut table_reader = self.horizontal_table;
        let n_pairs = table_reader.read_u16::<BigEndian>().map_err(Error::eof)?;
        table_reader.jump(std::mem::size_of::<[u16; 3]>()).map_err(Error::eof)?;

        let (mut low, mut high) = (0, n_pairs as u32);
        while low < high {
            let mut reader = table_reader;
            let mid = (low + high) / 2;

            reader.jump(mid as usize * std::mem::size_of::<[u16; 3]>()).map_err(Error::eof)?;
            let left = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
            let right = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
            let value = reader.read_i16::<BigEndian>().map_err(Error::eof)?;

            if left_glyph_id < left || (left_glyph_id == left && right_glyph_id < right) {
                high = mid
            } else if left_glyph_id > left || (left_glyph_id == left && right_glyph_id > right) {
                low = mid + 1
            } else {
                return Ok(value)
            }
        }

        Ok(0)
    }
}
