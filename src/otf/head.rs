// Copyright 2017 The Servo Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The `head` (font header) table.

use byteorder::{BigEndian, ReadBytesExt};
use crate::error::Error;
use crate::otf::FontTable;
use crate::util::Jump;

pub const TAG: u32 = ((b'h' as u32) << 24) | ((b'e' as u32) << 16) |
                      ((b'a' as u32) << 8)  |  (b'd' as u32);

const MAGIC_NUMBER: u32 = 0x5f0f3cf5;

/// The byte offset of the `checkSumAdjustment` field within the `head` table. The directory
/// checksum pass zeroes these four bytes before summing, per the spec for this one table.
pub const CHECKSUM_ADJUSTMENT_OFFSET: usize = 8;

#[derive(Clone, Copy, Debug)]
pub struct HeadTable {
    pub units_per_em: u16,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub index_to_loc_format: i16,
}

impl HeadTable {
    pub fn new(table: FontTable) -> Result<HeadTable, Error> {
        let mut reader = table.bytes;

        let major_version = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
        let minor_version = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
        if (major_version, minor_version) != (1, 0) {
            return Err(Error::UnsupportedVersion)
        }

        // fontRevision, checkSumAdjustment
        reader.jump(std::mem::size_of::<u32>() * 2).map_err(Error::eof)?;
        let magic_number = reader.read_u32::<BigEndian>().map_err(Error::eof)?;
        if magic_number != MAGIC_NUMBER {
            return Err(Error::MalformedTable)
        }

        // flags
        reader.jump(std::mem::size_of::<u16>()).map_err(Error::eof)?;
        let units_per_em = reader.read_u16::<BigEndian>().map_err(Error::eof)?;

        // created, modified
        reader.jump(std::mem::size_of::<i64>() * 2).map_err(Error::eof)?;

        let x_min = reader.read_i16::<BigEndian>().map_err(Error::eof)?;
        let y_min = reader.read_i16::<BigEndian>().map_err(Error::eof)?;
        let x_max = reader.read_i16::<BigEndian>().map_err(Error::eof)?;
        let y_max = reader.read_i16::<BigEndian>().map_err(Error::eof)?;

        // macStyle, lowestRecPPEM, fontDirectionHint
        reader.jump(std::mem::size_of::<u16>() * 2 + std::mem::size_of::<i16>())
              .map_err(Error::eof)?;

        let index_to_loc_format = reader.read_i16::<BigEndian>().map_err(Error::eof)?;

        Ok(HeadTable { units_per_em, x_min, y_min, x_max, y_max, index_to_loc_format })
    }
}
