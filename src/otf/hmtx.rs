// Copyright 2017 The Servo Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The `hmtx` (horizontal metrics) table.

use byteorder::{BigEndian, ReadBytesExt};
use crate::error::Error;
use crate::otf::hhea::HheaTable;
use crate::otf::FontTable;
use crate::util::Jump;

pub const TAG: u32 = ((b'h' as u32) << 24) | ((b'm' as u32) << 16) |
                      ((b't' as u32) << 8)  |  (b'x' as u32);

#[derive(Clone, Copy)]
pub struct HmtxTable<'a> {
    table: FontTable<'a>,
}

impl<'a> HmtxTable<'a> {
    pub fn new(table: FontTable<'a>) -> HmtxTable<'a> {
        HmtxTable { table }
    }

    /// Returns the advance width and left side bearing for `glyph_id`. Per the `hmtx` spec, if
    /// `glyph_id` is beyond the `longHorMetric` array, its advance width is the last entry's and
    /// only its left side bearing comes from the trailing `leftSideBearing` array.
    pub fn metrics_for_glyph(&self, hhea_table: &HheaTable, glyph_id: u16)
                             -> Result<HorizontalMetrics, Error> {
        let mut reader = self.table.bytes;

        let advance_width;
        if glyph_id < hhea_table.number_of_h_metrics {
            reader.jump(std::mem::size_of::<u16>() * 2 * glyph_id as usize).map_err(Error::eof)?;
            advance_width = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
        } else {
            reader.jump(std::mem::size_of::<u16>() * 2 *
                        (hhea_table.number_of_h_metrics.max(1) - 1) as usize)
                  .map_err(Error::eof)?;
            advance_width = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
            let extra = glyph_id - hhea_table.number_of_h_metrics;
            reader.jump(std::mem::size_of::<i16>() * extra as usize).map_err(Error::eof)?;
        }

        let lsb = reader.read_i16::<BigEndian>().map_err(Error::eof)?;

        Ok(HorizontalMetrics { advance_width, lsb })
    }
}

#[derive(Clone, Copy, Default, Debug)]
pub struct HorizontalMetrics {
    pub advance_width: u16,
    pub lsb: i16,
}
