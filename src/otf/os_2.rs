// Copyright 2017 The Servo Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The `OS/2` table. Ambient supplement: optional, absent without failing the subfont.

use byteorder::{BigEndian, ReadBytesExt};
use crate::error::Error;
use crate::otf::FontTable;
use crate::util::Jump;

pub const TAG: u32 = ((b'O' as u32) << 24) | ((b'S' as u32) << 16) |
                      ((b'/' as u32) << 8)  |  (b'2' as u32);

#[derive(Clone, Copy, Debug)]
pub struct Os2Table {
    pub typo_ascender: i16,
    pub typo_descender: i16,
    pub typo_line_gap: i16,
}

impl Os2Table {
    pub fn new(table: FontTable) -> Result<Os2Table, Error> {
        let mut reader = table.bytes;

        // We accept any version; fields through typoLineGap have been stable since version 0.
        let version = reader.read_u16::<BigEndian>().map_err(Error::eof)?;

        reader.jump(std::mem::size_of::<u16>() * 15).map_err(Error::eof)?;
        reader.jump(10).map_err(Error::eof)?;
        if version == 0 {
            reader.jump(std::mem::size_of::<u32>() * 2).map_err(Error::eof)?;
        } else {
            reader.jump(std::mem::size_of::<u32>() * 5).map_err(Error::eof)?;
        }
        reader.jump(std::mem::size_of::<u16>() * 3).map_err(Error::eof)?;

        let typo_ascender = reader.read_i16::<BigEndian>().map_err(Error::eof)?;
        let typo_descender = reader.read_i16::<BigEndian>().map_err(Error::eof)?;
        let typo_line_gap = reader.read_i16::<BigEndian>().map_err(Error::eof)?;

        Ok(Os2Table { typo_ascender, typo_descender, typo_line_gap })
    }
}
