// Copyright 2017 The Servo Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use byteorder::{BigEndian, ReadBytesExt};
use std::io;

/// A faster version of `Seek` that supports only forward motion from the current position.
pub trait Jump {
    /// Moves the pointer forward `n` bytes from the *current* position.
    fn jump(&mut self, n: usize) -> Result<(), ()>;
}

impl<'a> Jump for &'a [u8] {
    #[inline]
    fn jump(&mut self, n: usize) -> Result<(), ()> {
        if n <= self.len() {
            *self = &(*self)[n..];
            Ok(())
        } else {
            Err(())
        }
    }
}

/// A 4-byte sfnt table tag (e.g. `glyf`, `cmap`). Equality is byte-for-byte.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Tag(pub u32);

impl Tag {
    #[inline]
    pub const fn from_bytes(bytes: &[u8; 4]) -> Tag {
        Tag(((bytes[0] as u32) << 24) |
            ((bytes[1] as u32) << 16) |
            ((bytes[2] as u32) << 8) |
            (bytes[3] as u32))
    }
}

/// A 24-bit big-endian offset, as used by CFF INDEX structures.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Offset24(pub u32);

/// A `16.16` fixed-point value, used for version numbers and a handful of CFF fields.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Fixed(pub i32);

impl Fixed {
    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 65536.0
    }
}

/// A `2.14` signed fixed-point value, used for `glyf` composite-glyph scale factors.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct F2Dot14(pub i16);

impl F2Dot14 {
    /// Decodes the value per the four-quadrant mapping: the top two bits give the integer part
    /// `{0, +1, -2, -1}` for bit patterns `{00, 01, 10, 11}`, and the bottom 14 bits are the
    /// fractional part divided by 16384.
    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 16384.0
    }
}

/// Extends any big-endian byte reader with the primitive decoders this crate needs beyond what
/// `byteorder::ReadBytesExt` already provides.
pub trait ReadFontExt: ReadBytesExt {
    #[inline]
    fn read_tag(&mut self) -> io::Result<Tag> {
        self.read_u32::<BigEndian>().map(Tag)
    }

    #[inline]
    fn read_fixed(&mut self) -> io::Result<Fixed> {
        self.read_i32::<BigEndian>().map(Fixed)
    }

    #[inline]
    fn read_f2dot14(&mut self) -> io::Result<F2Dot14> {
        self.read_i16::<BigEndian>().map(F2Dot14)
    }

    /// Reads a big-endian 24-bit unsigned offset (high byte first).
    #[inline]
    fn read_offset24(&mut self) -> io::Result<Offset24> {
        let hi = self.read_u8()? as u32;
        let lo = self.read_u16::<BigEndian>()? as u32;
        Ok(Offset24((hi << 16) | lo))
    }
}

impl<R: ReadBytesExt + ?Sized> ReadFontExt for R {}
