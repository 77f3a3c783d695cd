// Copyright 2017 The Servo Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The `loca` (glyph location) table.

use byteorder::{BigEndian, ReadBytesExt};
use crate::error::Error;
use crate::otf::head::HeadTable;
use crate::otf::FontTable;
use crate::util::Jump;

pub const TAG: u32 = ((b'l' as u32) << 24) | ((b'o' as u32) << 16) |
                      ((b'c' as u32) << 8)  |  (b'a' as u32);

pub struct LocaTable<'a> {
    table: FontTable<'a>,
    long: bool,
}

impl<'a> LocaTable<'a> {
    pub fn new(loca_table: FontTable<'a>, head_table: &HeadTable)
              -> Result<LocaTable<'a>, Error> {
        let long = match head_table.index_to_loc_format {
            0 => false,
            1 => true,
            _ => return Err(Error::UnsupportedVersion),
        };

        Ok(LocaTable { table: loca_table, long })
    }

    /// Returns the byte offset, relative to the start of `glyf`, at which `glyph_id`'s outline
    /// begins. Short offsets are stored pre-divided by 2 and must be multiplied back out.
    pub fn location_of(&self, glyph_id: u32) -> Result<u32, Error> {
        let mut reader = self.table.bytes;
        if !self.long {
            reader.jump(glyph_id as usize * 2).map_err(Error::eof)?;
            Ok(reader.read_u16::<BigEndian>().map_err(Error::eof)? as u32 * 2)
        } else {
            reader.jump(glyph_id as usize * 4).map_err(Error::eof)?;
            reader.read_u32::<BigEndian>().map_err(Error::eof)
        }
    }
}
