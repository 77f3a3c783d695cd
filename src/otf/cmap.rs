// Copyright 2017 The Servo Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The `cmap` (character to glyph mapping) table: subtable selection by platform/encoding
//! preference, and formats 0, 4, and 12.

use byteorder::{BigEndian, ReadBytesExt};
use crate::error::Error;
use crate::otf::FontTable;
use crate::util::Jump;

pub const TAG: u32 = ((b'c' as u32) << 24) | ((b'm' as u32) << 16) |
                      ((b'a' as u32) << 8)  |  (b'p' as u32);

const MISSING_GLYPH: u16 = 0;

/// Preference order for `(platformID, platformSpecificID)`, highest-priority first.
const SUBTABLE_PREFERENCE: [(u16, u16); 5] = [(0, 4), (0, 3), (3, 10), (3, 1), (3, 0)];

/// A parsed `cmap` subtable, picked from the font's encoding records by the preference list in
/// [`select_subtable`]. Each format is a tagged variant rather than a polymorphic base class.
#[derive(Clone)]
pub enum CmapTable<'a> {
    Format0 { glyph_ids: &'a [u8; 256] },
    Format4(Format4<'a>),
    Format12(Format12<'a>),
}

impl<'a> CmapTable<'a> {
    /// Picks the best subtable out of the `cmap` table's encoding records per §4.B's preference
    /// list, then parses it. Returns `Err(UnsupportedCmapEncoding)` if no acceptable record is
    /// present, or `Err(UnsupportedCmapFormat)` if the chosen subtable's format isn't 0, 4, or 12.
    pub fn select_subtable(table: FontTable<'a>) -> Result<CmapTable<'a>, Error> {
        let mut reader = table.bytes;
        let _version = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
        let num_tables = reader.read_u16::<BigEndian>().map_err(Error::eof)?;

        let mut best: Option<(usize, u32)> = None;
        for _ in 0..num_tables {
            let platform_id = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
            let encoding_id = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
            let offset = reader.read_u32::<BigEndian>().map_err(Error::eof)?;

            if let Some(rank) = SUBTABLE_PREFERENCE.iter()
                                                    .position(|&p| p == (platform_id, encoding_id)) {
                if best.map_or(true, |(best_rank, _)| rank < best_rank) {
                    best = Some((rank, offset));
                }
            }
        }

        let (_, offset) = best.ok_or(Error::UnsupportedCmapEncoding)?;
        let mut subtable_reader = table.bytes;
        subtable_reader.jump(offset as usize).map_err(Error::eof)?;
        let format = subtable_reader.read_u16::<BigEndian>().map_err(Error::eof)?;

        match format {
            0 => Format0Data::parse(subtable_reader),
            4 => Format4::parse(subtable_reader).map(CmapTable::Format4),
            12 => Format12::parse(subtable_reader).map(CmapTable::Format12),
            _ => Err(Error::UnsupportedCmapFormat),
        }
    }

    /// Maps a Unicode code point to a glyph index, or 0 (`.notdef`) if unmapped.
    pub fn glyph_index(&self, code_point: u32) -> u16 {
        match *self {
            CmapTable::Format0 { glyph_ids } => {
                if code_point < 256 { glyph_ids[code_point as usize] as u16 } else { MISSING_GLYPH }
            }
            CmapTable::Format4(ref table) => table.glyph_index(code_point),
            CmapTable::Format12(ref table) => table.glyph_index(code_point),
        }
    }
}

// Format 0's 256-byte array is most naturally a `&[u8; 256]`, which needs a distinct parse helper
// since it can't be constructed as an enum-variant literal directly from a fallible conversion.
struct Format0Data;

impl Format0Data {
    fn parse(mut reader: &[u8]) -> Result<CmapTable, Error> {
        let _length = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
        let _language = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
        if reader.len() < 256 {
            return Err(Error::MalformedTable)
        }
        let glyph_ids: &[u8; 256] = reader[0..256].try_into().map_err(Error::eof)?;
        Ok(CmapTable::Format0 { glyph_ids })
    }
}

/// Format 4: segmented mapping with delta/range-offset encoding.
#[derive(Clone, Copy)]
pub struct Format4<'a> {
    seg_count: u16,
    end_codes: &'a [u8],
    start_codes: &'a [u8],
    id_deltas: &'a [u8],
    id_range_offsets: &'a [u8],
}

impl<'a> Format4<'a> {
    fn parse(mut reader: &'a [u8]) -> Result<Format4<'a>, Error> {
        let _length = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
        let _language = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
        let seg_count = reader.read_u16::<BigEndian>().map_err(Error::eof)? / 2;
        reader.jump(std::mem::size_of::<u16>() * 3).map_err(Error::eof)?;

        let end_codes = reader;
        let mut start_codes = reader;
        start_codes.jump((seg_count as usize + 1) * 2).map_err(Error::eof)?;
        let mut id_deltas = start_codes;
        id_deltas.jump(seg_count as usize * 2).map_err(Error::eof)?;
        let mut id_range_offsets = id_deltas;
        id_range_offsets.jump(seg_count as usize * 2).map_err(Error::eof)?;

        Ok(Format4 { seg_count, end_codes, start_codes, id_deltas, id_range_offsets })
    }

    fn read_u16_at(slice: &[u8], index: u16) -> Result<u16, Error> {
        let mut reader = slice;
        reader.jump(index as usize * 2).map_err(Error::eof)?;
        reader.read_u16::<BigEndian>().map_err(Error::eof)
    }

    fn glyph_index(&self, code_point: u32) -> u16 {
        if code_point > u16::MAX as u32 {
            return MISSING_GLYPH
        }
        let code_point = code_point as u16;

        // Binary search for the first segment whose endCode >= code_point. Segments are
        // required to be sorted ascending by endCode, so this finds the same segment a linear
        // "first match wins" scan would.
        let (mut low, mut high) = (0u16, self.seg_count);
        while low < high {
            let mid = low + (high - low) / 2;
            let end_code = match Self::read_u16_at(self.end_codes, mid) {
                Ok(v) => v,
                Err(_) => return MISSING_GLYPH,
            };
            if end_code < code_point {
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        if low >= self.seg_count {
            return MISSING_GLYPH
        }

        let start_code = match Self::read_u16_at(self.start_codes, low) {
            Ok(v) => v,
            Err(_) => return MISSING_GLYPH,
        };
        if start_code > code_point {
            return MISSING_GLYPH
        }

        let id_delta = match Self::read_u16_at(self.id_deltas, low) {
            Ok(v) => v as i16,
            Err(_) => return MISSING_GLYPH,
        };
        let id_range_offset = match Self::read_u16_at(self.id_range_offsets, low) {
            Ok(v) => v,
            Err(_) => return MISSING_GLYPH,
        };

        if id_range_offset == 0 {
            return (id_delta as i32 + code_point as i32).rem_euclid(65536) as u16
        }

        // *(&idRangeOffset[i] + idRangeOffset[i]/2 + (code_point - startCode[i]))
        let glyph_array_byte_offset = low as usize * 2 + id_range_offset as usize +
            (code_point - start_code) as usize * 2;
        let mut reader = self.id_range_offsets;
        if reader.jump(glyph_array_byte_offset).is_err() {
            return MISSING_GLYPH
        }
        let raw_glyph_id = match reader.read_u16::<BigEndian>() {
            Ok(v) => v,
            Err(_) => return MISSING_GLYPH,
        };
        if raw_glyph_id == 0 {
            MISSING_GLYPH
        } else {
            (raw_glyph_id as i32 + id_delta as i32).rem_euclid(65536) as u16
        }
    }
}

/// Format 12: sparse ranges, each mapping a contiguous run of code points to a contiguous run of
/// glyph indices.
#[derive(Clone, Copy)]
pub struct Format12<'a> {
    groups: &'a [u8],
    num_groups: u32,
}

impl<'a> Format12<'a> {
    fn parse(mut reader: &'a [u8]) -> Result<Format12<'a>, Error> {
        reader.jump(std::mem::size_of::<u16>()).map_err(Error::eof)?; // reserved
        let _length = reader.read_u32::<BigEndian>().map_err(Error::eof)?;
        let _language = reader.read_u32::<BigEndian>().map_err(Error::eof)?;
        let num_groups = reader.read_u32::<BigEndian>().map_err(Error::eof)?;
        Ok(Format12 { groups: reader, num_groups })
    }

    fn glyph_index(&self, code_point: u32) -> u16 {
        let mut reader = self.groups;
        for _ in 0..self.num_groups {
            let start_char_code = match reader.read_u32::<BigEndian>() {
                Ok(v) => v,
                Err(_) => return MISSING_GLYPH,
            };
            let end_char_code = match reader.read_u32::<BigEndian>() {
                Ok(v) => v,
                Err(_) => return MISSING_GLYPH,
            };
            let start_glyph_code = match reader.read_u32::<BigEndian>() {
                Ok(v) => v,
                Err(_) => return MISSING_GLYPH,
            };

            if code_point >= start_char_code && code_point <= end_char_code {
                let glyph = start_glyph_code + (code_point - start_char_code);
                return glyph as u16
            }
        }
        MISSING_GLYPH
    }
}
