// Copyright 2017 The Servo Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The `CFF ` (Compact Font Format) table: container parsing and a Type 2 charstring
//! interpreter.

use byteorder::{BigEndian, ReadBytesExt};
use log::warn;
use crate::error::Error;
use crate::otf::cff_std_strings::STANDARD_STRINGS;
use crate::otf::FontTable;
use crate::util::Jump;

mod dict;
mod index;
mod interp;

use self::dict::{Dict, DictKey};
use self::index::Index;
use self::interp::ExecContext;

pub const TAG: u32 = ((b'C' as u32) << 24) | ((b'F' as u32) << 16) |
                      ((b'F' as u32) << 8)  |  (b' ' as u32);

/// One segment of a decoded glyph outline. Cubic curves are left uncombined here; reducing them
/// to the quadratic curves the rest of the crate works with happens in `outline`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathSegment {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    CurveTo(f32, f32, f32, f32, f32, f32),
}

struct FontDict<'a> {
    local_subrs: Index<'a>,
    nominal_width_x: f32,
}

enum FdSelect<'a> {
    Format0(&'a [u8]),
    Format3 { ranges: Vec<(u16, u8)>, sentinel: u16 },
}

impl<'a> FdSelect<'a> {
    fn font_dict_index(&self, glyph_id: u16) -> u8 {
        match *self {
            FdSelect::Format0(bytes) => bytes.get(glyph_id as usize).cloned().unwrap_or(0),
            FdSelect::Format3 { ref ranges, sentinel } => {
                for window in ranges.windows(2) {
                    let (first, fd) = window[0];
                    let (next, _) = window[1];
                    if glyph_id >= first && glyph_id < next {
                        return fd
                    }
                }
                if let Some(&(first, fd)) = ranges.last() {
                    if glyph_id >= first && glyph_id < sentinel {
                        return fd
                    }
                }
                0
            }
        }
    }
}

/// A parsed `CFF ` table: the CharStrings INDEX plus whatever private-dict and CID plumbing is
/// needed to pick the right local subroutines and width for a given glyph.
pub struct CffTable<'a> {
    charstrings: Index<'a>,
    global_subrs: Index<'a>,
    font_dicts: Vec<FontDict<'a>>,
    fd_select: Option<FdSelect<'a>>,
    charset: Option<Vec<u16>>,
    string_index: Index<'a>,
}

impl<'a> CffTable<'a> {
    pub fn new(table: FontTable<'a>) -> Result<CffTable<'a>, Error> {
        let bytes = table.bytes;
        let mut reader = bytes;

        let major = reader.read_u8().map_err(Error::eof)?;
        let _minor = reader.read_u8().map_err(Error::eof)?;
        if major != 1 {
            return Err(Error::UnsupportedCffVersion)
        }
        let header_size = reader.read_u8().map_err(Error::eof)?;
        let mut reader = bytes;
        reader.jump(header_size as usize).map_err(Error::eof)?;

        let name_index = Index::parse(&mut reader)?;
        if name_index.count() != 1 {
            return Err(Error::UnsupportedCff)
        }
        let top_dict_index = Index::parse(&mut reader)?;
        let string_index = Index::parse(&mut reader)?;
        let global_subrs = Index::parse(&mut reader)?;

        let top_dict_bytes = top_dict_index.get(0)?;
        let top_dict = Dict::parse(top_dict_bytes)?;

        let charstring_type = top_dict.get_int(DictKey::CharstringType).unwrap_or(2);
        if charstring_type != 2 {
            return Err(Error::UnsupportedCff)
        }

        let charstrings_offset = top_dict.get_int(DictKey::CharStrings)
                                          .ok_or(Error::CffIntegerNotFound)? as usize;
        let mut charstrings_reader = bytes;
        charstrings_reader.jump(charstrings_offset).map_err(Error::eof)?;
        let charstrings = Index::parse(&mut charstrings_reader)?;
        let num_glyphs = charstrings.count();

        let is_cid = top_dict.get(DictKey::Ros).is_some();

        let (font_dicts, fd_select) = if is_cid {
            let fdarray_offset = top_dict.get_int(DictKey::FdArray)
                                          .ok_or(Error::CffIntegerNotFound)? as usize;
            let fdselect_offset = top_dict.get_int(DictKey::FdSelect)
                                           .ok_or(Error::CffIntegerNotFound)? as usize;

            let mut fdarray_reader = bytes;
            fdarray_reader.jump(fdarray_offset).map_err(Error::eof)?;
            let fdarray_index = Index::parse(&mut fdarray_reader)?;

            let mut font_dicts = Vec::with_capacity(fdarray_index.count() as usize);
            for i in 0..fdarray_index.count() {
                let dict_bytes = fdarray_index.get(i as usize)?;
                let dict = Dict::parse(dict_bytes)?;
                font_dicts.push(resolve_font_dict(&dict, bytes)?);
            }

            let mut fdselect_reader = bytes;
            fdselect_reader.jump(fdselect_offset).map_err(Error::eof)?;
            let fd_select = parse_fd_select(fdselect_reader, num_glyphs)?;

            (font_dicts, Some(fd_select))
        } else {
            (vec![resolve_font_dict(&top_dict, bytes)?], None)
        };

        let charset = match top_dict.get_int(DictKey::Charset) {
            None | Some(0) | Some(1) | Some(2) => None,
            Some(offset) => {
                let mut charset_reader = bytes;
                charset_reader.jump(offset as usize).map_err(Error::eof)?;
                Some(parse_charset(charset_reader, num_glyphs)?)
            }
        };

        Ok(CffTable { charstrings, global_subrs, font_dicts, fd_select, charset, string_index })
    }

    /// Decodes a glyph's outline. Charstring interpretation errors are logged and treated as an
    /// empty glyph rather than failing the whole font.
    pub fn glyph_outline(&self, glyph_id: u16) -> Vec<PathSegment> {
        match self.decode(glyph_id) {
            Ok(segments) => segments,
            Err(err) => {
                warn!("failed to decode CFF glyph {}: {}", glyph_id, err);
                Vec::new()
            }
        }
    }

    fn decode(&self, glyph_id: u16) -> Result<Vec<PathSegment>, Error> {
        let charstring = self.charstrings.get(glyph_id as usize)?;
        let fd_index = self.fd_select.as_ref()
                                      .map_or(0, |select| select.font_dict_index(glyph_id) as usize);
        let font_dict = self.font_dicts.get(fd_index).ok_or(Error::MalformedTable)?;

        let mut ctx = ExecContext::new(&self.global_subrs,
                                        &font_dict.local_subrs,
                                        font_dict.nominal_width_x);
        ctx.run(charstring)?;
        Ok(ctx.finish())
    }

    /// Ambient: the PostScript glyph name for a glyph, if the font carries a custom charset.
    pub fn glyph_name(&self, glyph_id: u16) -> Option<String> {
        let sid = *self.charset.as_ref()?.get(glyph_id as usize)?;
        Some(self.string_for_sid(sid))
    }

    fn string_for_sid(&self, sid: u16) -> String {
        if (sid as usize) < STANDARD_STRINGS.len() {
            STANDARD_STRINGS[sid as usize].to_owned()
        } else {
            let index = sid as usize - STANDARD_STRINGS.len();
            match self.string_index.get(index) {
                Ok(bytes) => String::from_utf8_lossy(bytes).into_owned(),
                Err(_) => String::new(),
            }
        }
    }
}

fn resolve_font_dict<'a>(dict: &Dict, bytes: &'a [u8]) -> Result<FontDict<'a>, Error> {
    let private = match dict.get(DictKey::Private) {
        Some(operands) if operands.len() == 2 => operands,
        Some(_) => return Err(Error::MalformedTable),
        None => return Ok(FontDict { local_subrs: Index::empty(), nominal_width_x: 0.0 }),
    };

    let size = private[0].as_i32() as usize;
    let offset = private[1].as_i32() as usize;
    let end = offset.checked_add(size).ok_or(Error::CffBadOffset)?;
    let private_bytes = bytes.get(offset..end).ok_or(Error::CffBadOffset)?;
    let private_dict = Dict::parse(private_bytes)?;

    let nominal_width_x = private_dict.get_f32(DictKey::NominalWidthX).unwrap_or(0.0);

    let local_subrs = match private_dict.get_int(DictKey::Subrs) {
        Some(relative_offset) => {
            let mut reader = bytes;
            reader.jump(offset + relative_offset as usize).map_err(Error::eof)?;
            Index::parse(&mut reader)?
        }
        None => Index::empty(),
    };

    Ok(FontDict { local_subrs, nominal_width_x })
}

fn parse_fd_select(mut reader: &[u8], num_glyphs: u32) -> Result<FdSelect, Error> {
    let format = reader.read_u8().map_err(Error::eof)?;
    match format {
        0 => {
            if reader.len() < num_glyphs as usize {
                return Err(Error::UnexpectedEof)
            }
            Ok(FdSelect::Format0(&reader[0..num_glyphs as usize]))
        }
        3 => {
            let num_ranges = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
            let mut ranges = Vec::with_capacity(num_ranges as usize);
            for _ in 0..num_ranges {
                let first = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
                let fd = reader.read_u8().map_err(Error::eof)?;
                ranges.push((first, fd));
            }
            let sentinel = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
            Ok(FdSelect::Format3 { ranges, sentinel })
        }
        _ => Err(Error::UnsupportedVersion),
    }
}

fn parse_charset(mut reader: &[u8], num_glyphs: u32) -> Result<Vec<u16>, Error> {
    let mut sids = vec![0u16; num_glyphs as usize];
    let format = reader.read_u8().map_err(Error::eof)?;
    let mut glyph_id = 1u32;
    match format {
        0 => {
            while glyph_id < num_glyphs {
                sids[glyph_id as usize] = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
                glyph_id += 1;
            }
        }
        1 => {
            while glyph_id < num_glyphs {
                let first = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
                let n_left = reader.read_u8().map_err(Error::eof)?;
                for i in 0..=(n_left as u32) {
                    if glyph_id >= num_glyphs {
                        break
                    }
                    sids[glyph_id as usize] = first + i as u16;
                    glyph_id += 1;
                }
            }
        }
        2 => {
            while glyph_id < num_glyphs {
                let first = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
                let n_left = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
                for i in 0..=(n_left as u32) {
                    if glyph_id >= num_glyphs {
                        break
                    }
                    sids[glyph_id as usize] = first + i as u16;
                    glyph_id += 1;
                }
            }
        }
        _ => return Err(Error::UnsupportedVersion),
    }
    Ok(sids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fd_select_format0_looks_up_by_index() {
        let bytes: &[u8] = &[0, 1, 2, 0];
        let select = FdSelect::Format0(bytes);
        assert_eq!(select.font_dict_index(0), 0);
        assert_eq!(select.font_dict_index(2), 2);
    }

    #[test]
    fn fd_select_format3_matches_ranges() {
        let select = FdSelect::Format3 {
            ranges: vec![(0, 0), (5, 1), (10, 0)],
            sentinel: 20,
        };
        assert_eq!(select.font_dict_index(0), 0);
        assert_eq!(select.font_dict_index(5), 1);
        assert_eq!(select.font_dict_index(9), 1);
        assert_eq!(select.font_dict_index(10), 0);
        assert_eq!(select.font_dict_index(19), 0);
    }
}
