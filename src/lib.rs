// Copyright 2017 The Servo Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Decodes sfnt/OpenType/CFF font files into resolution-independent glyph outlines and packs
//! them into a signed-distance-field texture atlas.
//!
//! ```no_run
//! use font_core::FontBuilder;
//!
//! let bytes = std::fs::read("font.ttf").unwrap();
//! let collection = font_core::otf::FontCollection::new(&bytes).unwrap();
//! let subfont = collection.get(0).unwrap();
//!
//! let mut builder = FontBuilder::new(&subfont);
//! let glyph_id = builder.glyph_id_for_code_point('A' as u32);
//! builder.build().unwrap();
//! println!("{:?}", builder.glyph(glyph_id).unwrap().size);
//! ```

#[macro_use]
extern crate bitflags;
#[cfg(test)]
#[macro_use]
extern crate quickcheck;

pub mod atlas;
pub mod builder;
pub mod error;
pub mod geometry;
pub mod otf;
pub mod outline;
pub mod rasterizer;
mod util;

pub use crate::builder::FontBuilder;
pub use crate::error::Error;
pub use crate::otf::{FontCollection, Subfont};

/// Memory-maps a font file from disk rather than reading it into an owned `Vec<u8>`.
///
/// The returned `Mmap` derefs to `&[u8]` and can be passed directly to
/// [`otf::FontCollection::new`]; it must outlive every `Subfont` parsed from it.
pub fn map_font_file(path: &std::path::Path) -> Result<memmap2::Mmap, Error> {
    let file = std::fs::File::open(path).map_err(|_| Error::FileNotFound)?;
    unsafe { memmap2::Mmap::map(&file) }.map_err(|_| Error::FileNotFound)
}
