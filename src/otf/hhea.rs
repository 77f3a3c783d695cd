// Copyright 2017 The Servo Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The `hhea` (horizontal header) table.

use byteorder::{BigEndian, ReadBytesExt};
use crate::error::Error;
use crate::otf::FontTable;
use crate::util::Jump;

pub const TAG: u32 = ((b'h' as u32) << 24) | ((b'h' as u32) << 16) |
                      ((b'e' as u32) << 8)  |  (b'a' as u32);

#[derive(Clone, Copy, Debug)]
pub struct HheaTable {
    pub number_of_h_metrics: u16,
}

impl HheaTable {
    pub fn new(table: FontTable) -> Result<HheaTable, Error> {
        let mut reader = table.bytes;

        let major_version = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
        let minor_version = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
        if (major_version, minor_version) != (1, 0) {
            return Err(Error::UnsupportedVersion)
        }

        // ascender, descender, lineGap, advanceWidthMax, minLeftSideBearing,
        // minRightSideBearing, xMaxExtent, caretSlopeRise, caretSlopeRun, caretOffset,
        // four reserved fields, metricDataFormat.
        reader.jump(std::mem::size_of::<u16>() * 15).map_err(Error::eof)?;
        let number_of_h_metrics = reader.read_u16::<BigEndian>().map_err(Error::eof)?;

        Ok(HheaTable { number_of_h_metrics })
    }
}
