// Copyright 2017 The Servo Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! sfnt/OpenType container parsing: table directories, TrueType collections, and per-subfont
//! table wiring.

use byteorder::{BigEndian, ReadBytesExt};
use log::warn;
use crate::error::Error;
use crate::otf::cff::CffTable;
use crate::otf::cmap::CmapTable;
use crate::otf::glyf::GlyfTable;
use crate::otf::head::{HeadTable, CHECKSUM_ADJUSTMENT_OFFSET};
use crate::otf::hhea::HheaTable;
use crate::otf::hmtx::{HmtxTable, HorizontalMetrics};
use crate::otf::kern::KernTable;
use crate::otf::loca::LocaTable;
use crate::otf::maxp::MaxpTable;
use crate::otf::os_2::Os2Table;
use crate::util::Jump;

pub mod cff;
mod cff_std_strings;
pub mod cmap;
pub mod glyf;
pub mod head;
pub mod hhea;
pub mod hmtx;
pub mod kern;
pub mod loca;
pub mod maxp;
pub mod os_2;

const TTCF: u32 = ((b't' as u32) << 24) | ((b't' as u32) << 16) |
                   ((b'c' as u32) << 8)  |  (b'f' as u32);
const OTTO: u32 = ((b'O' as u32) << 24) | ((b'T' as u32) << 16) |
                   ((b'T' as u32) << 8)  |  (b'O' as u32);
const TYP1: u32 = ((b't' as u32) << 24) | ((b'y' as u32) << 16) |
                   ((b'p' as u32) << 8)  |  (b'1' as u32);
const TRUE: u32 = ((b't' as u32) << 24) | ((b'r' as u32) << 16) |
                   ((b'u' as u32) << 8)  |  (b'e' as u32);

static SFNT_VERSIONS: [u32; 3] = [0x00010000, TRUE, OTTO];

/// A `(offset, length)` byte-slice view into the font's owned buffer, rather than a raw pointer
/// into the file image: structures are parsed lazily from these views.
#[doc(hidden)]
#[derive(Clone, Copy, Debug)]
pub struct FontTable<'a> {
    pub bytes: &'a [u8],
}

/// A single parsed font within a file or collection.
pub struct Subfont<'a> {
    cmap: CmapTable<'a>,
    head: HeadTable,
    hhea: HheaTable,
    hmtx: HmtxTable<'a>,
    maxp: MaxpTable,

    os_2: Option<Os2Table>,
    kern: Option<KernTable<'a>>,

    outlines: Outlines<'a>,
}

enum Outlines<'a> {
    TrueType { glyf: GlyfTable<'a>, loca: LocaTable<'a> },
    Cff(CffTable<'a>),
    /// `typ1` PostScript fonts are loaded (their sfnt tables parse fine) but carry no outline
    /// source this decoder understands; glyph requests on them always yield an empty outline.
    None,
}

impl<'a> Subfont<'a> {
    /// Maps a Unicode code point to a glyph index, or 0 (`.notdef`) if unmapped.
    #[inline]
    pub fn glyph_index(&self, code_point: u32) -> u16 {
        let glyph_id = self.cmap.glyph_index(code_point);
        if glyph_id as u32 >= self.maxp.num_glyphs as u32 { 0 } else { glyph_id }
    }

    #[inline]
    pub fn num_glyphs(&self) -> u16 {
        self.maxp.num_glyphs
    }

    #[inline]
    pub fn units_per_em(&self) -> u16 {
        self.head.units_per_em
    }

    #[inline]
    pub fn ascender(&self) -> i16 {
        self.os_2.map_or(0, |os_2| os_2.typo_ascender)
    }

    #[inline]
    pub fn descender(&self) -> i16 {
        self.os_2.map_or(0, |os_2| os_2.typo_descender)
    }

    #[inline]
    pub fn line_gap(&self) -> i16 {
        self.os_2.map_or(0, |os_2| os_2.typo_line_gap)
    }

    #[inline]
    pub fn metrics_for_glyph(&self, glyph_id: u16) -> Result<HorizontalMetrics, Error> {
        self.hmtx.metrics_for_glyph(&self.hhea, glyph_id)
    }

    #[inline]
    pub fn kerning_for_glyph_pair(&self, left_glyph_id: u16, right_glyph_id: u16) -> i16 {
        match self.kern {
            None => 0,
            Some(ref kern) => {
                kern.kerning_for_glyph_pair(left_glyph_id, right_glyph_id).unwrap_or(0)
            }
        }
    }

    pub(crate) fn glyf_outline(&self, glyph_id: u16)
                               -> Result<Option<glyf::GlyfOutline>, Error> {
        match self.outlines {
            Outlines::TrueType { ref glyf, ref loca } => {
                Ok(Some(glyf.outline_for_glyph(&self.head, loca, glyph_id)?))
            }
            Outlines::Cff(_) | Outlines::None => Ok(None),
        }
    }

    pub(crate) fn cff_table(&self) -> Option<&CffTable<'a>> {
        match self.outlines {
            Outlines::Cff(ref cff) => Some(cff),
            Outlines::TrueType { .. } | Outlines::None => None,
        }
    }
}

/// A handle to a font file: one or more [`Subfont`]s backed by a single owned byte buffer.
///
/// For optimum performance, consider using the `memmap2` crate to provide the byte buffer
/// without copying the file into the heap.
pub struct FontCollection<'a> {
    pub bytes: &'a [u8],
    subfonts: Vec<Subfont<'a>>,
}

impl<'a> FontCollection<'a> {
    /// Parses every subfont reachable from `bytes`. A single sfnt file yields one subfont; a
    /// `ttcf` collection yields one per listed offset table. A subfont that fails to parse is
    /// dropped (logged at `warn`) rather than failing the whole collection; the collection itself
    /// fails only if every subfont failed, or the container signature is unrecognized.
    pub fn new(bytes: &'a [u8]) -> Result<FontCollection<'a>, Error> {
        let mut reader = bytes;
        let magic_number = reader.read_u32::<BigEndian>().map_err(Error::eof)?;

        let offsets = match magic_number {
            TTCF => {
                let major_version = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
                let minor_version = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
                if (major_version != 1 && major_version != 2) || minor_version != 0 {
                    return Err(Error::UnsupportedVersion)
                }

                let num_fonts = reader.read_u32::<BigEndian>().map_err(Error::eof)?;
                let mut offsets = Vec::with_capacity(num_fonts as usize);
                for _ in 0..num_fonts {
                    offsets.push(reader.read_u32::<BigEndian>().map_err(Error::eof)?);
                }

                // Version 2 appends a 12-byte DSIG reference block, which this decoder has no
                // use for but must not mistake for more table data.
                if major_version == 2 {
                    reader.jump(std::mem::size_of::<u32>() * 3).map_err(Error::eof)?;
                }

                offsets
            }
            magic_number if SFNT_VERSIONS.contains(&magic_number) || magic_number == TYP1 => {
                vec![0]
            }
            _ => return Err(Error::UnknownContainer),
        };

        let mut subfonts = Vec::with_capacity(offsets.len());
        for offset in offsets {
            match parse_subfont(bytes, offset) {
                Ok(subfont) => subfonts.push(subfont),
                Err(error) => warn!("dropping subfont at offset {}: {}", offset, error),
            }
        }

        if subfonts.is_empty() {
            return Err(Error::RequiredTableMissing)
        }

        Ok(FontCollection { bytes, subfonts })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.subfonts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subfonts.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Result<&Subfont<'a>, Error> {
        self.subfonts.get(index).ok_or(Error::FontIndexOutOfBounds)
    }
}

fn parse_subfont<'a>(bytes: &'a [u8], offset: u32) -> Result<Subfont<'a>, Error> {
    let mut reader = bytes;
    reader.jump(offset as usize).map_err(Error::eof)?;

    let magic_number = reader.read_u32::<BigEndian>().map_err(Error::eof)?;
    if !SFNT_VERSIONS.contains(&magic_number) && magic_number != TYP1 {
        return Err(Error::UnknownContainer)
    }

    let num_tables = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
    // searchRange, entrySelector, rangeShift.
    reader.jump(std::mem::size_of::<u16>() * 3).map_err(Error::eof)?;

    let mut tables: Vec<(u32, u32, u32, u32)> = Vec::with_capacity(num_tables as usize);
    for _ in 0..num_tables {
        let tag = reader.read_u32::<BigEndian>().map_err(Error::eof)?;
        let checksum = reader.read_u32::<BigEndian>().map_err(Error::eof)?;
        let table_offset = reader.read_u32::<BigEndian>().map_err(Error::eof)?;
        let length = reader.read_u32::<BigEndian>().map_err(Error::eof)?;
        tables.push((tag, checksum, table_offset, length));
    }

    let mut cff_table = None;
    let mut cmap_table = None;
    let mut glyf_table = None;
    let mut head_table = None;
    let mut hhea_table = None;
    let mut hmtx_table = None;
    let mut kern_table = None;
    let mut loca_table = None;
    let mut maxp_table = None;
    let mut os_2_table = None;

    for &(tag, checksum, table_offset, length) in &tables {
        let end = (table_offset as usize).checked_add(length as usize)
                                          .ok_or(Error::MalformedTable)?;
        if end > bytes.len() {
            return Err(Error::MalformedTable)
        }
        let table_bytes = &bytes[table_offset as usize..end];
        verify_checksum(tag, table_bytes, checksum);

        let table = FontTable { bytes: table_bytes };
        match tag {
            cff::TAG => cff_table = Some(table),
            cmap::TAG => cmap_table = Some(table),
            glyf::TAG => glyf_table = Some(table),
            head::TAG => head_table = Some(table),
            hhea::TAG => hhea_table = Some(table),
            hmtx::TAG => hmtx_table = Some(table),
            kern::TAG => kern_table = Some(table),
            loca::TAG => loca_table = Some(table),
            maxp::TAG => maxp_table = Some(table),
            os_2::TAG => os_2_table = Some(table),
            _ => {}
        }
    }

    let head = HeadTable::new(head_table.ok_or(Error::RequiredTableMissing)?)?;
    let maxp = MaxpTable::new(maxp_table.ok_or(Error::RequiredTableMissing)?)?;
    let hhea = HheaTable::new(hhea_table.ok_or(Error::RequiredTableMissing)?)?;
    let hmtx = HmtxTable::new(hmtx_table.ok_or(Error::RequiredTableMissing)?);
    let cmap = CmapTable::select_subtable(cmap_table.ok_or(Error::RequiredTableMissing)?)?;

    let outlines = match (glyf_table, loca_table, cff_table) {
        (Some(glyf_table), Some(loca_table), None) => {
            let loca = LocaTable::new(loca_table, &head)?;
            Outlines::TrueType { glyf: GlyfTable::new(glyf_table), loca }
        }
        (None, None, Some(cff_table)) => Outlines::Cff(CffTable::new(cff_table)?),
        (None, None, None) if magic_number == TYP1 => Outlines::None,
        _ => return Err(Error::MalformedTable),
    };

    let os_2 = os_2_table.and_then(|table| Os2Table::new(table).ok());
    let kern = kern_table.and_then(|table| KernTable::new(table).ok());

    Ok(Subfont { cmap, head, hhea, hmtx, maxp, os_2, kern, outlines })
}

/// Verifies a table's checksum (sum of big-endian u32 words, wrapping) against the value the
/// directory claims. Mismatches are logged, never fatal: real-world fonts occasionally get this
/// wrong, and the decoder tolerates it.
fn verify_checksum(tag: u32, bytes: &[u8], expected: u32) {
    let mut sum: u32 = 0;
    let mut word_start = 0;
    while word_start < bytes.len() {
        let mut word_bytes = [0u8; 4];
        let word_end = (word_start + 4).min(bytes.len());
        word_bytes[..word_end - word_start].copy_from_slice(&bytes[word_start..word_end]);

        // The head table's checkSumAdjustment field is excluded from its own checksum.
        if tag == head::TAG && word_start == CHECKSUM_ADJUSTMENT_OFFSET {
            word_bytes = [0; 4];
        }

        sum = sum.wrapping_add(u32::from_be_bytes(word_bytes));
        word_start += 4;
    }

    if sum != expected {
        warn!("checksum mismatch in table {:?}", crate::util::Tag(tag));
    }
}
