// Copyright 2017 The Servo Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Exercises the rasterizer end to end against a hand-built square glyph and dumps the
//! resulting atlas through the `image` crate, the way a debug tool would when inspecting an
//! atlas visually rather than asserting on raw bytes.

use font_core::atlas::SDF_DISTANCE;
use font_core::geometry::vec2;
use font_core::outline::{Glyph, Line, Segment};
use font_core::rasterizer::{rasterize_atlas, RasterJob, RasterizerOptions};

fn square_glyph() -> Glyph {
    let p = |x: f32, y: f32| vec2(x, y);
    let contour = vec![
        Segment::Line(Line { p1: p(0.0, 0.0), p2: p(1.0, 0.0) }),
        Segment::Line(Line { p1: p(1.0, 0.0), p2: p(1.0, 1.0) }),
        Segment::Line(Line { p1: p(1.0, 1.0), p2: p(0.0, 1.0) }),
        Segment::Line(Line { p1: p(0.0, 1.0), p2: p(0.0, 0.0) }),
    ];
    Glyph { contours: vec![contour], size: vec2(1.0, 1.0), ..Default::default() }
}

#[test]
fn rasterized_square_dumps_to_a_sane_png() {
    let _ = env_logger::builder().is_test(true).try_init();

    let glyph = square_glyph();
    let resolution = 64u32;
    let margin_px = (SDF_DISTANCE * 2.0 * resolution as f32).ceil() as u32;
    let dim = resolution + margin_px;

    let mut atlas = vec![0u8; (dim * dim) as usize];
    let job = RasterJob {
        glyph: &glyph,
        pixel_pos: (0, 0),
        pixel_size: (dim, dim),
        resolution: resolution as f32,
    };
    rasterize_atlas(&mut atlas, dim, &[job], RasterizerOptions::default()).unwrap();

    let image = image::GrayImage::from_raw(dim, dim, atlas.clone())
        .expect("atlas buffer has the exact dimensions of the image");

    let dir = std::env::temp_dir();
    let path = dir.join("font_core_atlas_debug_dump_test.png");
    image.save(&path).unwrap();

    let decoded = image::open(&path).unwrap().to_luma8();
    assert_eq!(decoded.as_raw(), &atlas);

    // The square's interior sits well inside the shape, so its center should read as fully
    // inside (255), while the far corner of the reserved margin band sits well past the shape's
    // edge and should read as fully outside (0).
    let dim = dim as usize;
    let center = dim / 2;
    assert_eq!(atlas[center * dim + center], 255);
    assert_eq!(atlas[dim * dim - 1], 0);

    std::fs::remove_file(&path).ok();
}
