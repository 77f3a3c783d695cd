// Copyright 2017 The Servo Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The `glyf` (TrueType glyph outline) table: simple and composite glyph decoding.
//!
//! This module only decodes the raw point/component records. Composite recursion, point
//! matching, and unification with CFF outlines live in `outline`.

use byteorder::{BigEndian, ReadBytesExt};
use euclid::Point2D;
use crate::error::Error;
use crate::otf::head::HeadTable;
use crate::otf::loca::LocaTable;
use crate::otf::FontTable;
use crate::util::{Jump, ReadFontExt};

pub const TAG: u32 = ((b'g' as u32) << 24) | ((b'l' as u32) << 16) |
                      ((b'y' as u32) << 8)  |  (b'f' as u32);

/// Composite glyphs may reference other composites; this bounds the recursion so a cyclic
/// reference (malformed or adversarial font) can't recurse forever.
pub const MAX_COMPONENT_DEPTH: u32 = 16;

bitflags! {
    struct SimpleGlyphFlags: u8 {
        const ON_CURVE        = 1 << 0;
        const X_SHORT_VECTOR  = 1 << 1;
        const Y_SHORT_VECTOR  = 1 << 2;
        const REPEAT          = 1 << 3;
        const THIS_X_IS_SAME  = 1 << 4;
        const THIS_Y_IS_SAME  = 1 << 5;
    }
}

bitflags! {
    struct ComponentFlags: u16 {
        const ARGS_ARE_WORDS           = 1 << 0;
        const ARGS_ARE_XY_VALUES       = 1 << 1;
        const ROUND_XY_TO_GRID         = 1 << 2;
        const WE_HAVE_A_SCALE          = 1 << 3;
        const MORE_COMPONENTS          = 1 << 5;
        const WE_HAVE_AN_X_AND_Y_SCALE = 1 << 6;
        const WE_HAVE_A_TWO_BY_TWO     = 1 << 7;
        const WE_HAVE_INSTRUCTIONS     = 1 << 8;
        const USE_MY_METRICS           = 1 << 9;
        const OVERLAP_COMPOUND         = 1 << 10;
        const SCALED_COMPONENT_OFFSET  = 1 << 11;
        const UNSCALED_COMPONENT_OFFSET = 1 << 12;
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Point {
    pub position: Point2D<i16, euclid::UnknownUnit>,
    pub on_curve: bool,
}

/// One component of a composite glyph, in raw (un-resolved) form.
#[derive(Clone, Copy, Debug)]
pub struct Component {
    pub glyph_index: u16,
    /// 2x2 linear part of the component's transform (identity if none was present).
    pub scale: [f32; 4],
    pub round_xy_to_grid: bool,
    pub use_my_metrics: bool,
    pub scaled_component_offset: bool,
    pub args: ComponentArgs,
}

/// Either a literal (dx, dy) offset, or a pair of point indices (in the compound glyph's already
/// placed points, and in this component's own contours respectively) to be matched up.
#[derive(Clone, Copy, Debug)]
pub enum ComponentArgs {
    Offset { dx: f32, dy: f32 },
    MatchPoints { parent_point: u16, component_point: u16 },
}

pub enum GlyfOutline {
    Simple(Vec<Vec<Point>>),
    Composite(Vec<Component>),
    Empty,
}

#[derive(Clone, Copy, Debug)]
pub struct GlyfTable<'a> {
    pub table: FontTable<'a>,
}

impl<'a> GlyfTable<'a> {
    #[inline]
    pub fn new(table: FontTable<'a>) -> GlyfTable<'a> {
        GlyfTable { table }
    }

    pub fn outline_for_glyph(&self, head_table: &HeadTable, loca_table: &LocaTable,
                              glyph_id: u16)
                             -> Result<GlyfOutline, Error> {
        let start = loca_table.location_of(glyph_id as u32)?;
        let end = loca_table.location_of(glyph_id as u32 + 1)?;
        if end <= start {
            return Ok(GlyfOutline::Empty)
        }

        let mut reader = self.table.bytes;
        reader.jump(start as usize).map_err(Error::eof)?;

        let number_of_contours = reader.read_i16::<BigEndian>().map_err(Error::eof)?;

        // xMin, yMin, xMax, yMax.
        reader.jump(std::mem::size_of::<i16>() * 4).map_err(Error::eof)?;
        let _ = head_table;

        if number_of_contours >= 0 {
            Ok(GlyfOutline::Simple(decode_simple_glyph(reader, number_of_contours as u16)?))
        } else {
            Ok(GlyfOutline::Composite(decode_composite_glyph(reader)?))
        }
    }
}

fn decode_simple_glyph(mut reader: &[u8], number_of_contours: u16)
                       -> Result<Vec<Vec<Point>>, Error> {
    if number_of_contours == 0 {
        return Ok(Vec::new())
    }

    let mut endpoints_reader = reader;
    reader.jump(std::mem::size_of::<u16>() * (number_of_contours as usize - 1))
          .map_err(Error::eof)?;
    let number_of_points = reader.read_u16::<BigEndian>().map_err(Error::eof)? + 1;

    let instruction_length = reader.read_u16::<BigEndian>().map_err(Error::eof)?;
    reader.jump(instruction_length as usize).map_err(Error::eof)?;

    let flags_reader = reader;
    let x_coordinate_length = calculate_size_of_x_coordinates(&mut reader, number_of_points)?;

    let mut flag_parser = FlagParser::new(flags_reader)?;
    let mut x_coordinate_reader = reader;
    reader.jump(x_coordinate_length as usize).map_err(Error::eof)?;
    let mut y_coordinate_reader = reader;

    let mut contours = Vec::with_capacity(number_of_contours as usize);
    let mut position: Point2D<i16, euclid::UnknownUnit> = Point2D::new(0i16, 0i16);
    let mut point_index = 0u16;

    for _ in 0..number_of_contours {
        let end_point = endpoints_reader.read_u16::<BigEndian>().map_err(Error::eof)?;
        let contour_point_count = end_point - point_index + 1;

        let mut raw_points = Vec::with_capacity(contour_point_count as usize);
        for _ in 0..contour_point_count {
            let flags = SimpleGlyphFlags::from_bits_truncate(*flag_parser.current);
            flag_parser.next()?;

            let mut delta: Point2D<i16, euclid::UnknownUnit> = Point2D::new(0i16, 0i16);
            if flags.contains(SimpleGlyphFlags::X_SHORT_VECTOR) {
                delta.x = x_coordinate_reader.read_u8().map_err(Error::eof)? as i16;
                if !flags.contains(SimpleGlyphFlags::THIS_X_IS_SAME) {
                    delta.x = -delta.x
                }
            } else if !flags.contains(SimpleGlyphFlags::THIS_X_IS_SAME) {
                delta.x = x_coordinate_reader.read_i16::<BigEndian>().map_err(Error::eof)?
            }
            if flags.contains(SimpleGlyphFlags::Y_SHORT_VECTOR) {
                delta.y = y_coordinate_reader.read_u8().map_err(Error::eof)? as i16;
                if !flags.contains(SimpleGlyphFlags::THIS_Y_IS_SAME) {
                    delta.y = -delta.y
                }
            } else if !flags.contains(SimpleGlyphFlags::THIS_Y_IS_SAME) {
                delta.y = y_coordinate_reader.read_i16::<BigEndian>().map_err(Error::eof)?
            }

            position = Point2D::new(position.x.wrapping_add(delta.x),
                                     position.y.wrapping_add(delta.y));
            raw_points.push(Point {
                position,
                on_curve: flags.contains(SimpleGlyphFlags::ON_CURVE),
            });

            point_index += 1;
        }

        contours.push(close_contour(raw_points));
    }

    Ok(contours)
}

/// Inserts the implied on-curve point halfway between each pair of consecutive off-curve points,
/// and rotates the contour so it starts and ends on an on-curve point.
fn close_contour(raw_points: Vec<Point>) -> Vec<Point> {
    if raw_points.is_empty() {
        return raw_points
    }

    let mut expanded = Vec::with_capacity(raw_points.len() + 1);
    for i in 0..raw_points.len() {
        let current = raw_points[i];
        expanded.push(current);

        if !current.on_curve {
            let next = raw_points[(i + 1) % raw_points.len()];
            if !next.on_curve {
                let midpoint = Point2D::new(
                    current.position.x / 2 + next.position.x / 2,
                    current.position.y / 2 + next.position.y / 2,
                );
                expanded.push(Point { position: midpoint, on_curve: true });
            }
        }
    }

    // Rotate so the contour starts on an on-curve point; if none exist, synthesize one at the
    // midpoint of the first and last points (an all-off-curve contour, which is legal).
    let start = expanded.iter().position(|point| point.on_curve);
    match start {
        Some(start) => {
            expanded.rotate_left(start);
            expanded.push(expanded[0]);
        }
        None => {
            let first = expanded[0];
            let last = *expanded.last().unwrap();
            let midpoint = Point2D::new(first.position.x / 2 + last.position.x / 2,
                                         first.position.y / 2 + last.position.y / 2);
            expanded.insert(0, Point { position: midpoint, on_curve: true });
            expanded.push(Point { position: midpoint, on_curve: true });
        }
    }

    expanded
}

fn decode_composite_glyph(mut reader: &[u8]) -> Result<Vec<Component>, Error> {
    let mut components = Vec::new();

    loop {
        let flags = ComponentFlags::from_bits_truncate(
            reader.read_u16::<BigEndian>().map_err(Error::eof)?);
        let glyph_index = reader.read_u16::<BigEndian>().map_err(Error::eof)?;

        let args = if flags.contains(ComponentFlags::ARGS_ARE_WORDS) {
            let (a, b) = (reader.read_i16::<BigEndian>().map_err(Error::eof)?,
                          reader.read_i16::<BigEndian>().map_err(Error::eof)?);
            if flags.contains(ComponentFlags::ARGS_ARE_XY_VALUES) {
                ComponentArgs::Offset { dx: a as f32, dy: b as f32 }
            } else {
                ComponentArgs::MatchPoints { parent_point: a as u16, component_point: b as u16 }
            }
        } else {
            let (a, b) = (reader.read_i8().map_err(Error::eof)?,
                          reader.read_i8().map_err(Error::eof)?);
            if flags.contains(ComponentFlags::ARGS_ARE_XY_VALUES) {
                ComponentArgs::Offset { dx: a as f32, dy: b as f32 }
            } else {
                ComponentArgs::MatchPoints {
                    parent_point: a as u8 as u16,
                    component_point: b as u8 as u16,
                }
            }
        };

        let scale = if flags.contains(ComponentFlags::WE_HAVE_A_SCALE) {
            let s = reader.read_f2dot14().map_err(Error::eof)?.to_f32();
            [s, 0.0, 0.0, s]
        } else if flags.contains(ComponentFlags::WE_HAVE_AN_X_AND_Y_SCALE) {
            let sx = reader.read_f2dot14().map_err(Error::eof)?.to_f32();
            let sy = reader.read_f2dot14().map_err(Error::eof)?.to_f32();
            [sx, 0.0, 0.0, sy]
        } else if flags.contains(ComponentFlags::WE_HAVE_A_TWO_BY_TWO) {
            let a = reader.read_f2dot14().map_err(Error::eof)?.to_f32();
            let b = reader.read_f2dot14().map_err(Error::eof)?.to_f32();
            let c = reader.read_f2dot14().map_err(Error::eof)?.to_f32();
            let d = reader.read_f2dot14().map_err(Error::eof)?.to_f32();
            [a, b, c, d]
        } else {
            [1.0, 0.0, 0.0, 1.0]
        };

        components.push(Component {
            glyph_index,
            scale,
            round_xy_to_grid: flags.contains(ComponentFlags::ROUND_XY_TO_GRID),
            use_my_metrics: flags.contains(ComponentFlags::USE_MY_METRICS),
            scaled_component_offset: flags.contains(ComponentFlags::SCALED_COMPONENT_OFFSET),
            args,
        });

        if flags.contains(ComponentFlags::WE_HAVE_INSTRUCTIONS) {
            // Only present after the last component, but harmless to check every iteration.
        }
        if !flags.contains(ComponentFlags::MORE_COMPONENTS) {
            break
        }
    }

    Ok(components)
}

// Given a reader pointing to the start of the list of flags, returns the size in bytes of the
// list of X coordinates and positions the reader at the start of that list.
#[inline]
fn calculate_size_of_x_coordinates<'a, 'b>(reader: &'a mut &'b [u8], number_of_points: u16)
                                           -> Result<u16, Error> {
    let (mut x_coordinate_length, mut points_left) = (0u16, number_of_points);
    while points_left > 0 {
        let flags = SimpleGlyphFlags::from_bits_truncate(
            reader.read_u8().map_err(Error::eof)?);
        let repeat_count = if !flags.contains(SimpleGlyphFlags::REPEAT) {
            1
        } else {
            reader.read_u8().map_err(Error::eof)? as u16 + 1
        };

        if flags.contains(SimpleGlyphFlags::X_SHORT_VECTOR) {
            x_coordinate_length += repeat_count
        } else if !flags.contains(SimpleGlyphFlags::THIS_X_IS_SAME) {
            x_coordinate_length += repeat_count * 2
        }

        points_left = points_left.saturating_sub(repeat_count)
    }

    Ok(x_coordinate_length)
}

struct FlagParser<'a> {
    next: &'a [u8],
    current: &'a u8,
    repeats_left: u8,
}

impl<'a> FlagParser<'a> {
    #[inline]
    fn new(buffer: &[u8]) -> Result<FlagParser, Error> {
        let mut parser = FlagParser {
            next: buffer,
            current: buffer.get(0).ok_or(Error::MalformedTable)?,
            repeats_left: 0,
        };
        parser.next()?;
        Ok(parser)
    }

    #[inline]
    fn next(&mut self) -> Result<(), Error> {
        if self.repeats_left > 0 {
            self.repeats_left -= 1;
            return Ok(())
        }

        self.current = self.next.get(0).ok_or(Error::MalformedTable)?;
        let flags = SimpleGlyphFlags::from_bits_truncate(*self.current);
        self.next = &self.next[1..];

        if flags.contains(SimpleGlyphFlags::REPEAT) {
            self.repeats_left = *self.next.get(0).ok_or(Error::MalformedTable)?;
            self.next = &self.next[1..];
        } else {
            self.repeats_left = 0
        }

        Ok(())
    }
}
