// Copyright 2017 The Servo Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Top-level entry point: assigns stable IDs to requested glyphs, decodes their outlines on
//! demand, and packs + rasterizes them into an SDF atlas a `build()` call at a time.

use crate::atlas::{AtlasBuilder, AtlasOptions};
use crate::error::Error;
use crate::geometry::vec2;
use crate::otf::Subfont;
use crate::outline::{self, Glyph, Vertex};
use crate::rasterizer::{self, RasterJob, RasterizerOptions};

/// A reference to a code point's resolved glyph, naming which of the builder's two fonts it came
/// from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Source {
    Primary,
    Fallback,
}

struct PendingGlyph {
    source: Source,
    glyph_index: u16,
}

/// Assembles a signed-distance-field atlas for a primary font, with an optional fallback font
/// consulted for code points the primary has no mapping for.
pub struct FontBuilder<'a> {
    primary: &'a Subfont<'a>,
    fallback: Option<&'a Subfont<'a>>,

    primary_slots: Vec<u32>,
    fallback_slots: Vec<u32>,
    slots: Vec<Glyph>,
    slot_sources: Vec<Source>,
    pending: Vec<PendingGlyph>,

    atlas: AtlasBuilder,
    atlas_options: AtlasOptions,
    rasterizer_options: RasterizerOptions,
    pixels: Vec<u8>,
    pixel_dim: u32,
}

impl<'a> FontBuilder<'a> {
    pub fn new(primary: &'a Subfont<'a>) -> FontBuilder<'a> {
        FontBuilder::with_options(
            primary,
            None,
            AtlasOptions::default(),
            RasterizerOptions::default(),
        )
    }

    pub fn with_options(
        primary: &'a Subfont<'a>,
        fallback: Option<&'a Subfont<'a>>,
        atlas_options: AtlasOptions,
        rasterizer_options: RasterizerOptions,
    ) -> FontBuilder<'a> {
        FontBuilder {
            primary,
            fallback,
            primary_slots: vec![0; primary.num_glyphs() as usize],
            fallback_slots: fallback.map_or_else(Vec::new, |f| vec![0; f.num_glyphs() as usize]),
            slots: vec![Glyph::default()],
            slot_sources: vec![Source::Primary],
            pending: Vec::new(),
            atlas: AtlasBuilder::new(atlas_options),
            atlas_options,
            rasterizer_options,
            pixels: Vec::new(),
            pixel_dim: 0,
        }
    }

    #[inline]
    pub fn units_per_em(&self) -> u16 {
        self.primary.units_per_em()
    }

    #[inline]
    pub fn ascender(&self) -> i16 {
        self.primary.ascender()
    }

    #[inline]
    pub fn descender(&self) -> i16 {
        self.primary.descender()
    }

    #[inline]
    pub fn line_gap(&self) -> i16 {
        self.primary.line_gap()
    }

    #[inline]
    pub fn kerning_for_glyph_pair(&self, left: u16, right: u16) -> i16 {
        self.primary.kerning_for_glyph_pair(left, right)
    }

    #[inline]
    pub fn atlas_pixel_dimension(&self) -> u32 {
        self.pixel_dim
    }

    #[inline]
    pub fn atlas_pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the advance, in em units, for `code_point`, or `0.0` if it hasn't been resolved to
    /// a glyph yet (via [`glyph_id_for_code_point`](Self::glyph_id_for_code_point)) or has no
    /// mapping in either font.
    pub fn advance_for(&self, code_point: u32) -> f32 {
        self.resolved_slot(code_point)
            .and_then(|id| self.slots.get(id as usize))
            .map_or(0.0, |glyph| glyph.advance.x)
    }

    /// Returns a previously-built glyph's placement and bounds.
    pub fn glyph(&self, glyph_id: u32) -> Option<&Glyph> {
        self.slots.get(glyph_id as usize)
    }

    /// The textured quad vertices for every requested glyph, densely packed in glyph-ID order
    /// (four vertices per glyph, see [`Glyph::quad`]). A glyph's vertices start at index
    /// `4 * glyph_id` within this list, which is also what
    /// [`vertex_base_index`](Self::vertex_base_index) returns.
    pub fn vertices(&self) -> Vec<Vertex> {
        self.slots.iter().flat_map(|glyph| glyph.quad()).collect()
    }

    /// The index into [`vertices`](Self::vertices) at which `glyph_id`'s quad begins, or `None`
    /// if `glyph_id` hasn't been assigned by this builder.
    pub fn vertex_base_index(&self, glyph_id: u32) -> Option<u32> {
        if (glyph_id as usize) < self.slots.len() {
            Some(glyph_id * 4)
        } else {
            None
        }
    }

    /// Resolves `code_point` to an already-assigned glyph-slot ID, without enqueuing it for
    /// decoding if it hasn't been requested before.
    fn resolved_slot(&self, code_point: u32) -> Option<u32> {
        let primary_index = self.primary.glyph_index(code_point);
        if primary_index != 0 {
            return self.primary_slots.get(primary_index as usize).copied()
        }

        if let Some(fallback) = self.fallback {
            let fallback_index = fallback.glyph_index(code_point);
            if fallback_index != 0 {
                return self.fallback_slots.get(fallback_index as usize).copied()
            }
        }

        None
    }

    /// Resolves `code_point` to a stable glyph ID, enqueuing it for decoding and packing on the
    /// next [`build`](Self::build) call if it hasn't been requested before. Glyph IDs are
    /// assigned densely from 1 upward, in the order code points are first requested; 0 is
    /// reserved and never returned for a successfully resolved code point.
    pub fn glyph_id_for_code_point(&mut self, code_point: u32) -> u32 {
        let primary_index = self.primary.glyph_index(code_point);
        if primary_index != 0 {
            return self.request(Source::Primary, primary_index)
        }

        if let Some(fallback) = self.fallback {
            let fallback_index = fallback.glyph_index(code_point);
            if fallback_index != 0 {
                return self.request(Source::Fallback, fallback_index)
            }
        }

        self.request(Source::Primary, 0)
    }

    fn request(&mut self, source: Source, glyph_index: u16) -> u32 {
        let slot_table = match source {
            Source::Primary => &mut self.primary_slots,
            Source::Fallback => &mut self.fallback_slots,
        };

        let existing = slot_table[glyph_index as usize];
        if existing != 0 {
            return existing
        }

        let id = self.slots.len() as u32;
        self.slots.push(Glyph::default());
        self.slot_sources.push(source);
        slot_table[glyph_index as usize] = id;
        self.pending.push(PendingGlyph { source, glyph_index });
        id
    }

    /// Decodes every pending glyph's outline, packs the new glyphs into the atlas, and
    /// rasterizes their pixels. Previously-built glyphs keep their pixels; if the atlas grows to
    /// fit the new glyphs, every already-built slot's `pos`, `size`, and `offset` are rescaled by
    /// the same `old / new` bound-square ratio (see [`crate::atlas::AtlasBuilder`]) so their
    /// normalized texture coordinates stay valid, and the pixel buffer is reallocated with the
    /// old contents copied into place at identical pixel coordinates.
    pub fn build(&mut self) -> Result<(), Error> {
        if self.pending.is_empty() {
            return Ok(())
        }

        let pending = std::mem::take(&mut self.pending);
        let mut decoded = Vec::with_capacity(pending.len());
        for pending_glyph in &pending {
            let font = match pending_glyph.source {
                Source::Primary => self.primary,
                Source::Fallback => self.fallback.expect("fallback glyph requested without a fallback font"),
            };
            let glyph = outline::build_glyph(font, pending_glyph.glyph_index)?;
            decoded.push(glyph);
        }

        let sizes: Vec<_> = decoded.iter().map(|g| g.size).collect();
        let (placements, rescale) = self.atlas.insert_batch(&sizes);

        if rescale != 1.0 {
            for slot in self.slots.iter_mut().skip(1) {
                slot.pos = vec2(slot.pos.x * rescale, slot.pos.y * rescale);
                slot.size = vec2(slot.size.x * rescale, slot.size.y * rescale);
                slot.offset = vec2(slot.offset.x * rescale, slot.offset.y * rescale);
            }
        }

        let mut jobs_storage: Vec<(u32, Glyph)> = Vec::with_capacity(decoded.len());
        for (pending_glyph, (mut glyph, placement)) in
            pending.into_iter().zip(decoded.into_iter().zip(placements.into_iter()))
        {
            glyph.pos = placement.pos;
            let slot_table = match pending_glyph.source {
                Source::Primary => &self.primary_slots,
                Source::Fallback => &self.fallback_slots,
            };
            let id = slot_table[pending_glyph.glyph_index as usize];
            jobs_storage.push((id, glyph));
        }

        let new_pixel_dim = self.atlas.pixel_dimension();
        let mut new_pixels = vec![0u8; (new_pixel_dim as usize) * (new_pixel_dim as usize)];
        for row in 0..self.pixel_dim.min(new_pixel_dim) {
            let old_start = (row * self.pixel_dim) as usize;
            let old_end = old_start + self.pixel_dim.min(new_pixel_dim) as usize;
            let new_start = (row * new_pixel_dim) as usize;
            let new_end = new_start + self.pixel_dim.min(new_pixel_dim) as usize;
            new_pixels[new_start..new_end].copy_from_slice(&self.pixels[old_start..old_end]);
        }
        self.pixels = new_pixels;
        self.pixel_dim = new_pixel_dim;

        let resolution = self.atlas_options.resolution as f32;
        let margin = crate::atlas::SDF_DISTANCE * 2.0;
        let jobs: Vec<RasterJob> = jobs_storage.iter().map(|(_, glyph)| {
            RasterJob {
                glyph,
                pixel_pos: (
                    (glyph.pos.x * resolution) as u32,
                    (glyph.pos.y * resolution) as u32,
                ),
                pixel_size: (
                    ((glyph.size.x + margin) * resolution).ceil() as u32,
                    ((glyph.size.y + margin) * resolution).ceil() as u32,
                ),
                resolution,
            }
        }).collect();

        rasterizer::rasterize_atlas(&mut self.pixels, self.pixel_dim, &jobs, self.rasterizer_options)?;

        for (id, glyph) in jobs_storage {
            self.slots[id as usize] = glyph;
        }

        Ok(())
    }
}
