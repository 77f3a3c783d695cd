// Copyright 2017 The Servo Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Errors.

use std::fmt;

/// Errors that can occur when parsing OpenType/CFF fonts.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Error {
    /// No path was supplied, or the path could not be read.
    FileNotFound,
    /// The first four bytes of the file matched no recognized sfnt signature.
    UnknownContainer,
    /// The file ended unexpectedly while a value was being read.
    UnexpectedEof,
    /// There is no font with this index in this font collection.
    FontIndexOutOfBounds,
    /// The file declared a version of some format that we don't support.
    UnsupportedVersion,
    /// A table was truncated or internally inconsistent (bad counts, bad offsets).
    MalformedTable,
    /// A required table is missing.
    RequiredTableMissing,
    /// The font had a glyph format we don't support.
    UnsupportedGlyphFormat,
    /// The CFF Name INDEX held more than one entry.
    UnsupportedCff,
    /// We don't support the declared version of the font's CFF outlines.
    UnsupportedCffVersion,
    /// The font character map has an unsupported format.
    UnsupportedCmapFormat,
    /// The font character map has an unsupported platform/encoding ID, or none at all.
    UnsupportedCmapEncoding,
    /// An integer operand with the given DICT operator was not found.
    CffIntegerNotFound,
    /// The CFF Top DICT was not found.
    CffTopDictNotFound,
    /// A CFF `Offset` value was formatted incorrectly.
    CffBadOffset,
    /// The CFF evaluation stack overflowed its 48-entry limit.
    CffStackOverflow,
    /// An unimplemented CFF CharString operator was encountered.
    CffUnimplementedOperator,
    /// A miscellaneous failure, typically a panicking rasterizer worker.
    Failed,
}

impl Error {
    /// Adapts any I/O or read failure into `Error::UnexpectedEof`, for use with
    /// `.map_err(Error::eof)` on the tail of a `byteorder` read chain.
    #[doc(hidden)]
    #[inline]
    pub fn eof<T>(_: T) -> Error {
        Error::UnexpectedEof
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let message = match *self {
            Error::FileNotFound => "font file not found or unreadable",
            Error::UnknownContainer => "unrecognized font container signature",
            Error::UnexpectedEof => "unexpected end of font data",
            Error::FontIndexOutOfBounds => "no font at this index in the collection",
            Error::UnsupportedVersion => "unsupported format version",
            Error::MalformedTable => "malformed or internally inconsistent table",
            Error::RequiredTableMissing => "a required table is missing",
            Error::UnsupportedGlyphFormat => "unsupported glyph outline format",
            Error::UnsupportedCff => "CFF Name INDEX has more than one entry",
            Error::UnsupportedCffVersion => "unsupported CFF table version",
            Error::UnsupportedCmapFormat => "unsupported cmap subtable format",
            Error::UnsupportedCmapEncoding => "no usable cmap platform/encoding found",
            Error::CffIntegerNotFound => "expected CFF DICT integer operand not found",
            Error::CffTopDictNotFound => "CFF Top DICT not found",
            Error::CffBadOffset => "invalid CFF INDEX offset size",
            Error::CffStackOverflow => "CFF charstring operand stack overflow",
            Error::CffUnimplementedOperator => "unimplemented CFF charstring operator",
            Error::Failed => "font-core operation failed",
        };
        f.write_str(message)
    }
}

impl std::error::Error for Error {}
