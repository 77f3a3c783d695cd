// Copyright 2017 The Servo Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The `maxp` (maximum profile) table.

use byteorder::{BigEndian, ReadBytesExt};
use crate::error::Error;
use crate::otf::FontTable;
use crate::util::Jump;

pub const TAG: u32 = ((b'm' as u32) << 24) | ((b'a' as u32) << 16) |
                      ((b'x' as u32) << 8)  |  (b'p' as u32);

/// Version-0.5 CFF fonts carry only `num_glyphs`; version-1.0 TrueType fonts carry a full set of
/// interpreter-sizing hints that this decoder has no use for but keeps around for completeness.
#[derive(Clone, Copy, Debug)]
pub struct MaxpTable {
    pub num_glyphs: u16,
    pub max_points: u16,
    pub max_contours: u16,
    pub max_component_points: u16,
    pub max_component_contours: u16,
}

impl MaxpTable {
    pub fn new(table: FontTable) -> Result<MaxpTable, Error> {
        let mut reader = table.bytes;

        let version = reader.read_u32::<BigEndian>().map_err(Error::eof)?;
        let num_glyphs = reader.read_u16::<BigEndian>().map_err(Error::eof)?;

        if version == 0x00005000 {
            return Ok(MaxpTable {
                num_glyphs,
                max_points: 0,
                max_contours: 0,
                max_component_points: 0,
                max_component_contours: 0,
            })
        }

        if version != 0x00010000 {
            return Err(Error::UnsupportedVersion)
        }

        let max_points = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
        let max_contours = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
        let max_component_points = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
        let max_component_contours = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
        reader.jump(std::mem::size_of::<u16>() * 8).map_err(Error::eof)?;

        Ok(MaxpTable { num_glyphs, max_points, max_contours, max_component_points,
                        max_component_contours })
    }
}
