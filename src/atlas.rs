// Copyright 2017 The Servo Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Packs rendered glyphs into a square atlas of SDF pixels.
//!
//! Placement favors predictable, incremental insertion cost over bin-packing optimality: a
//! sorted pool of candidate corners is probed in order, and a spatial grid of placed rectangles
//! keeps collision queries proportional to the rectangle's own footprint rather than the whole
//! atlas.

use crate::geometry::{vec2, Vec2};

/// The margin, in em units, reserved around each glyph for its distance-field falloff.
pub const SDF_DISTANCE: f32 = 0.12;

const CORNER_EPSILON: f32 = 0.002;
const BOX_LIST_SCALE: f32 = 1.0;

/// Customizable attributes of the atlas.
#[derive(Clone, Copy, Debug)]
pub struct AtlasOptions {
    /// Pixels per em unit; the atlas's pixel dimensions are `resolution * bound_square`.
    pub resolution: u32,
}

impl Default for AtlasOptions {
    fn default() -> AtlasOptions {
        AtlasOptions { resolution: 64 }
    }
}

/// A rectangle already placed in the atlas, in em units.
#[derive(Clone, Copy, Debug)]
struct PlacedRect {
    pos: Vec2,
    size: Vec2,
}

impl PlacedRect {
    fn intersects(&self, pos: Vec2, size: Vec2) -> bool {
        pos.x < self.pos.x + self.size.x && pos.x + size.x > self.pos.x &&
            pos.y < self.pos.y + self.size.y && pos.y + size.y > self.pos.y
    }
}

/// A candidate point at which a new glyph may be anchored, ordered by `max(x, y)` ascending,
/// ties broken by squared distance from the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Corner {
    pos: Vec2,
}

impl Corner {
    fn sort_key(&self) -> (f32, f32) {
        (self.pos.x.max(self.pos.y), self.pos.x * self.pos.x + self.pos.y * self.pos.y)
    }
}

/// Placement assigned to a glyph by [`AtlasBuilder::insert_batch`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub pos: Vec2,
    pub size: Vec2,
}

/// Builds up an atlas by inserting glyphs in batches sorted for good packing.
pub struct AtlasBuilder {
    options: AtlasOptions,
    corners: Vec<Corner>,
    bounding: Vec2,
    bound_square: f32,
    area: f32,
    boxes: Vec<Vec<usize>>,
    rects: Vec<PlacedRect>,
}

impl AtlasBuilder {
    pub fn new(options: AtlasOptions) -> AtlasBuilder {
        AtlasBuilder {
            options,
            corners: vec![Corner { pos: vec2(0.0, 0.0) }],
            bounding: vec2(0.0, 0.0),
            bound_square: 0.0,
            area: 0.0,
            boxes: Vec::new(),
            rects: Vec::new(),
        }
    }

    #[inline]
    pub fn bound_square(&self) -> f32 {
        self.bound_square
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.area
    }

    #[inline]
    pub fn pixel_dimension(&self) -> u32 {
        (self.bound_square * self.options.resolution as f32).ceil() as u32
    }

    /// Places `sizes` (em-unit glyph sizes, margin not yet applied), largest first, returning
    /// each glyph's placement in input order alongside the rescale factor that must be applied
    /// to any rectangles placed in a previous call, if the atlas grew this time.
    pub fn insert_batch(&mut self, sizes: &[Vec2]) -> (Vec<Placement>, f32) {
        let mut order: Vec<usize> = (0..sizes.len()).collect();
        order.sort_by(|&a, &b| {
            sizes[b].x.partial_cmp(&sizes[a].x).unwrap()
                .then(sizes[b].y.partial_cmp(&sizes[a].y).unwrap())
        });

        let mut placements = vec![Placement { pos: vec2(0.0, 0.0), size: vec2(0.0, 0.0) }; sizes.len()];
        for index in order {
            let margin = SDF_DISTANCE * 2.0;
            let padded = vec2(sizes[index].x + margin, sizes[index].y + margin);
            placements[index] = self.insert(padded);
        }

        let rescale = self.recompute_bound_square();
        if rescale != 1.0 {
            for placement in &mut placements {
                placement.pos = vec2(placement.pos.x * rescale, placement.pos.y * rescale);
                placement.size = vec2(placement.size.x * rescale, placement.size.y * rescale);
            }
        }
        (placements, rescale)
    }

    /// Finds the first non-colliding corner for a rectangle of the given (already margin-padded)
    /// size, places it there, and returns the placement.
    fn insert(&mut self, size: Vec2) -> Placement {
        self.corners.sort_by(|a, b| a.sort_key().partial_cmp(&b.sort_key()).unwrap());

        let mut chosen = self.corners.last().map(|c| c.pos).unwrap_or(vec2(0.0, 0.0));
        for corner in &self.corners {
            if !self.collides(corner.pos, size) {
                chosen = corner.pos;
                break;
            }
        }

        let rect = PlacedRect { pos: chosen, size };
        let rect_index = self.rects.len();
        self.rects.push(rect);
        self.index_box(rect_index, rect);

        self.corners.retain(|corner| !rect.intersects(corner.pos, vec2(0.0, 0.0)));
        self.corners.push(Corner { pos: vec2(chosen.x + size.x + CORNER_EPSILON, chosen.y) });
        self.corners.push(Corner { pos: vec2(chosen.x, chosen.y + size.y + CORNER_EPSILON) });

        self.bounding.x = self.bounding.x.max(chosen.x + size.x);
        self.bounding.y = self.bounding.y.max(chosen.y + size.y);
        self.area += size.x * size.y;

        Placement { pos: chosen, size }
    }

    fn collides(&self, pos: Vec2, size: Vec2) -> bool {
        let col_start = (pos.x / BOX_LIST_SCALE).floor().max(0.0) as usize;
        let col_end = ((pos.x + size.x) / BOX_LIST_SCALE).ceil().max(0.0) as usize;
        for column in col_start..=col_end {
            if let Some(indices) = self.boxes.get(column) {
                for &index in indices {
                    if self.rects[index].intersects(pos, size) {
                        return true;
                    }
                }
            }
        }
        false
    }

    fn index_box(&mut self, rect_index: usize, rect: PlacedRect) {
        let col_start = (rect.pos.x / BOX_LIST_SCALE).floor().max(0.0) as usize;
        let col_end = ((rect.pos.x + rect.size.x) / BOX_LIST_SCALE).ceil().max(0.0) as usize;
        if self.boxes.len() <= col_end {
            self.boxes.resize(col_end + 1, Vec::new());
        }
        for column in col_start..=col_end {
            self.boxes[column].push(rect_index);
        }
    }

    /// Recomputes `bound_square` from the current bounding extents. Returns the ratio
    /// `old / new` that previously-placed glyphs must be rescaled by, or `1.0` if unchanged.
    fn recompute_bound_square(&mut self) -> f32 {
        let new_square = (self.bounding.x.max(self.bounding.y) * 64.0).ceil() / 64.0;
        if self.bound_square == 0.0 {
            self.bound_square = new_square;
            return 1.0;
        }
        if (new_square - self.bound_square).abs() < f32::EPSILON {
            return 1.0;
        }
        let rescale = self.bound_square / new_square;
        self.bound_square = new_square;
        rescale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn places_non_overlapping_rectangles() {
        let mut builder = AtlasBuilder::new(AtlasOptions::default());
        let (placements, _) = builder.insert_batch(&[vec2(0.2, 0.3), vec2(0.1, 0.1), vec2(0.5, 0.1)]);
        for i in 0..placements.len() {
            for j in (i + 1)..placements.len() {
                let (a, b) = (placements[i], placements[j]);
                let overlap = a.pos.x < b.pos.x + b.size.x && a.pos.x + a.size.x > b.pos.x &&
                    a.pos.y < b.pos.y + b.size.y && a.pos.y + a.size.y > b.pos.y;
                assert!(!overlap, "placements {} and {} overlap: {:?} {:?}", i, j, a, b);
            }
        }
    }

    #[test]
    fn bound_square_covers_every_placed_rectangle() {
        let mut builder = AtlasBuilder::new(AtlasOptions::default());
        let (placements, _) = builder.insert_batch(&[vec2(0.3, 0.3), vec2(0.4, 0.2)]);
        let square = builder.bound_square();
        for placement in &placements {
            assert!(placement.pos.x + placement.size.x <= square + 1e-4);
            assert!(placement.pos.y + placement.size.y <= square + 1e-4);
        }
    }

    fn pack_sizes(sizes: Vec<(u16, u16)>) -> Vec<Placement> {
        let sizes: Vec<Vec2> = sizes.iter()
            .map(|&(w, h)| vec2(w as f32 / 1000.0, h as f32 / 1000.0))
            .collect();
        let mut builder = AtlasBuilder::new(AtlasOptions::default());
        builder.insert_batch(&sizes).0
    }

    quickcheck! {
        fn glyphs_dont_overlap(sizes: Vec<(u16, u16)>) -> bool {
            let placements = pack_sizes(sizes);
            for (i, a) in placements.iter().enumerate() {
                for b in &placements[(i + 1)..] {
                    let overlap = a.pos.x < b.pos.x + b.size.x && a.pos.x + a.size.x > b.pos.x &&
                        a.pos.y < b.pos.y + b.size.y && a.pos.y + a.size.y > b.pos.y;
                    if overlap {
                        return false;
                    }
                }
            }
            true
        }
    }
}
