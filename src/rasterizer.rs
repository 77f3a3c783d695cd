// Copyright 2017 The Servo Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Fills atlas pixels with per-glyph signed-distance-field samples, fanned out across a pool of
//! worker threads sized from the detected hardware concurrency.

use crate::atlas::SDF_DISTANCE;
use crate::error::Error;
use crate::geometry::{solve_cubic, vec2, Vec2};
use crate::outline::{Glyph, Line, QuadCurve, Segment};
use std::thread;

/// Options controlling rasterization.
#[derive(Clone, Copy, Debug)]
pub struct RasterizerOptions {
    /// Number of worker threads to use. `None` means detect from hardware concurrency, falling
    /// back to 8 if that can't be determined.
    pub thread_count: Option<usize>,
}

impl Default for RasterizerOptions {
    fn default() -> RasterizerOptions {
        RasterizerOptions { thread_count: None }
    }
}

/// One glyph's placement into the atlas pixel buffer, in pixels.
#[derive(Clone, Copy, Debug)]
pub struct RasterJob<'a> {
    pub glyph: &'a Glyph,
    pub pixel_pos: (u32, u32),
    pub pixel_size: (u32, u32),
    /// Pixels per em unit, used to map a pixel back to glyph-local em space. `pixel_size` is
    /// larger than `glyph.size * resolution` by the SDF margin, reserved past the glyph's own
    /// bounding box on the right and bottom, so those extra pixels sample the falloff band.
    pub resolution: f32,
}

/// Fills `atlas` (a `stride * stride` byte buffer) with SDF samples for every job in `jobs`.
///
/// Jobs are striped across worker threads by index modulo the thread count; each worker renders
/// its assigned glyphs into a private buffer sized to that glyph's rectangle, and the results are
/// copied back into `atlas` once every worker has finished. A panicking worker is reported as
/// `Error::Failed` rather than silently dropping its glyphs' pixels.
pub fn rasterize_atlas(
    atlas: &mut [u8],
    stride: u32,
    jobs: &[RasterJob],
    options: RasterizerOptions,
) -> Result<(), Error> {
    let thread_count = options.thread_count
        .or_else(|| thread::available_parallelism().ok().map(|n| n.get()))
        .unwrap_or(8)
        .max(1)
        .min(jobs.len().max(1));

    let mut buckets: Vec<Vec<&RasterJob>> = vec![Vec::new(); thread_count];
    for (index, job) in jobs.iter().enumerate() {
        buckets[index % thread_count].push(job);
    }

    let results: Vec<thread::Result<Vec<(RasterJob, Vec<u8>)>>> = thread::scope(|scope| {
        let handles: Vec<_> = buckets.into_iter().map(|bucket| {
            scope.spawn(move || {
                bucket.into_iter().map(|job| (*job, rasterize_glyph(job))).collect()
            })
        }).collect();
        handles.into_iter().map(|handle| handle.join()).collect()
    });

    for result in results {
        let rendered = result.map_err(|_| Error::Failed)?;
        for (job, pixels) in rendered {
            blit(atlas, stride, job, &pixels);
        }
    }

    Ok(())
}

fn blit(atlas: &mut [u8], stride: u32, job: RasterJob, pixels: &[u8]) {
    let (px, py) = job.pixel_pos;
    let (w, h) = job.pixel_size;
    for row in 0..h {
        let atlas_y = py + row;
        if atlas_y >= stride {
            break;
        }
        let src_start = (row * w) as usize;
        let src = &pixels[src_start..src_start + w as usize];
        let dst_start = (atlas_y * stride + px) as usize;
        let dst_end = (dst_start + w as usize).min(atlas.len());
        let copy_len = dst_end.saturating_sub(dst_start).min(src.len());
        atlas[dst_start..dst_start + copy_len].copy_from_slice(&src[..copy_len]);
    }
}

fn rasterize_glyph(job: &RasterJob) -> Vec<u8> {
    let (w, h) = job.pixel_size;
    let mut pixels = vec![0u8; (w * h) as usize];
    if w == 0 || h == 0 {
        return pixels;
    }

    for y in 0..h {
        for x in 0..w {
            // Glyph-local point, in em units, with the origin at the glyph's own bounding box.
            // `pixel_size` reserves extra room past `glyph.size` on the right and bottom for the
            // SDF margin, so pixels past the tight bbox on those edges fall in the falloff band.
            let point = vec2(
                (x as f32 + 0.5) / job.resolution,
                (y as f32 + 0.5) / job.resolution,
            );
            let distance = distance_to_glyph(job.glyph, point).min(SDF_DISTANCE);
            let inside = is_inside(job.glyph, point);
            pixels[(y * w + x) as usize] = distance_to_byte(distance, inside);
        }
    }

    pixels
}

fn distance_to_byte(distance: f32, inside: bool) -> u8 {
    let normalized = if inside {
        if distance < SDF_DISTANCE {
            (1.0 + distance / SDF_DISTANCE) * 127.5
        } else {
            255.0
        }
    } else if distance < SDF_DISTANCE {
        (1.0 - distance / SDF_DISTANCE) * 127.5
    } else {
        0.0
    };
    normalized.round().clamp(0.0, 255.0) as u8
}

fn distance_to_glyph(glyph: &Glyph, point: Vec2) -> f32 {
    let mut best = f32::MAX;
    for contour in &glyph.contours {
        for segment in contour {
            let d = match *segment {
                Segment::Line(line) => distance_to_line(line, point),
                Segment::Curve(curve) => distance_to_quad(curve, point, best),
            };
            best = best.min(d);
        }
        if let Some(closing) = closing_line(contour) {
            best = best.min(distance_to_line(closing, point));
        }
    }
    best
}

/// Contours are stored without a trailing segment back to their start point; this synthesizes
/// that edge for distance/winding purposes, or returns `None` if the contour is already closed
/// (a `glyf` contour's decoder already duplicates the start point at the end).
fn closing_line(contour: &[Segment]) -> Option<Line> {
    let start = match *contour.first()? {
        Segment::Line(line) => line.p1,
        Segment::Curve(curve) => curve.p1,
    };
    let end = match *contour.last()? {
        Segment::Line(line) => line.p2,
        Segment::Curve(curve) => curve.p3,
    };
    if (end.x - start.x).abs() < 1e-9 && (end.y - start.y).abs() < 1e-9 {
        None
    } else {
        Some(Line { p1: end, p2: start })
    }
}

fn distance_to_line(line: Line, point: Vec2) -> f32 {
    let edge = vec2(line.p2.x - line.p1.x, line.p2.y - line.p1.y);
    let len_sq = edge.x * edge.x + edge.y * edge.y;
    let to_point = vec2(point.x - line.p1.x, point.y - line.p1.y);

    let t = if len_sq < 1e-12 {
        0.0
    } else {
        ((to_point.x * edge.x + to_point.y * edge.y) / len_sq).clamp(0.0, 1.0)
    };

    let closest = vec2(line.p1.x + edge.x * t, line.p1.y + edge.y * t);
    let dx = point.x - closest.x;
    let dy = point.y - closest.y;
    (dx * dx + dy * dy).sqrt()
}

/// Bernstein-basis evaluation of a quadratic Bezier at `t`.
fn quad_at(curve: QuadCurve, t: f32) -> Vec2 {
    let u = 1.0 - t;
    vec2(
        u * u * curve.p1.x + 2.0 * u * t * curve.p2.x + t * t * curve.p3.x,
        u * u * curve.p1.y + 2.0 * u * t * curve.p2.y + t * t * curve.p3.y,
    )
}

fn quad_derivative_at(curve: QuadCurve, t: f32) -> Vec2 {
    vec2(
        2.0 * (1.0 - t) * (curve.p2.x - curve.p1.x) + 2.0 * t * (curve.p3.x - curve.p2.x),
        2.0 * (1.0 - t) * (curve.p2.y - curve.p1.y) + 2.0 * t * (curve.p3.y - curve.p2.y),
    )
}

/// Minimum distance from `point` to the quadratic curve, early-exiting if a cheap bounding-disc
/// test proves the curve cannot beat `current_best`.
fn distance_to_quad(curve: QuadCurve, point: Vec2, current_best: f32) -> f32 {
    let center = vec2(
        (curve.p1.x + curve.p2.x + curve.p3.x) / 3.0,
        (curve.p1.y + curve.p2.y + curve.p3.y) / 3.0,
    );
    let radius = [curve.p1, curve.p2, curve.p3].iter()
        .map(|p| ((p.x - center.x).powi(2) + (p.y - center.y).powi(2)).sqrt())
        .fold(0.0f32, f32::max);
    let center_dist = ((point.x - center.x).powi(2) + (point.y - center.y).powi(2)).sqrt();
    if center_dist - radius > current_best {
        return f32::MAX;
    }

    // B(t) as a polynomial in t: B(t) = (p1 - 2p2 + p3) t^2 + (2p2 - 2p1) t + p1.
    let ax = curve.p1.x - 2.0 * curve.p2.x + curve.p3.x;
    let ay = curve.p1.y - 2.0 * curve.p2.y + curve.p3.y;
    let bx = 2.0 * curve.p2.x - 2.0 * curve.p1.x;
    let by = 2.0 * curve.p2.y - 2.0 * curve.p1.y;
    let cx = curve.p1.x - point.x;
    let cy = curve.p1.y - point.y;

    // d/dt |B(t) - point|^2 = 0 reduces to a cubic in t.
    let a3 = 2.0 * (ax * ax + ay * ay);
    let a2 = 3.0 * (ax * bx + ay * by);
    let a1 = 2.0 * (ax * cx + ay * cy) + bx * bx + by * by;
    let a0 = bx * cx + by * cy;

    let mut best = f32::MAX;
    let mut consider = |t: f32| {
        let t = t.clamp(0.0, 1.0);
        let p = quad_at(curve, t);
        let d = ((p.x - point.x).powi(2) + (p.y - point.y).powi(2)).sqrt();
        best = best.min(d);
    };

    for root in solve_cubic(a3 as f64, a2 as f64, a1 as f64, a0 as f64) {
        consider(root as f32);
    }
    consider(0.0);
    consider(1.0);

    best
}

/// Ray-casts a horizontal ray to the right of `point`, summing contour windings.
fn is_inside(glyph: &Glyph, point: Vec2) -> bool {
    let mut winding = 0i32;
    for contour in &glyph.contours {
        for segment in contour {
            winding += match *segment {
                Segment::Line(line) => line_winding(line, point),
                Segment::Curve(curve) => quad_winding(curve, point),
            };
        }
        if let Some(closing) = closing_line(contour) {
            winding += line_winding(closing, point);
        }
    }
    winding != 0
}

fn line_winding(line: Line, point: Vec2) -> i32 {
    let (a, b) = (line.p1, line.p2);
    if a.y <= point.y && point.y < b.y {
        if crosses_to_the_right(a, b, point) { 1 } else { 0 }
    } else if b.y <= point.y && point.y < a.y {
        if crosses_to_the_right(b, a, point) { -1 } else { 0 }
    } else {
        0
    }
}

fn crosses_to_the_right(a: Vec2, b: Vec2, point: Vec2) -> bool {
    let t = (point.y - a.y) / (b.y - a.y);
    let x_at_y = a.x + t * (b.x - a.x);
    x_at_y > point.x
}

fn quad_winding(curve: QuadCurve, point: Vec2) -> i32 {
    // y(t) = (p1.y - 2 p2.y + p3.y) t^2 + (2 p2.y - 2 p1.y) t + p1.y - point.y = 0.
    let a = curve.p1.y - 2.0 * curve.p2.y + curve.p3.y;
    let b = 2.0 * curve.p2.y - 2.0 * curve.p1.y;
    let c = curve.p1.y - point.y;

    let roots: Vec<f32> = if a.abs() < 1e-9 {
        if b.abs() < 1e-9 { vec![] } else { vec![-c / b] }
    } else {
        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            vec![]
        } else {
            let sqrt_disc = disc.sqrt();
            vec![(-b + sqrt_disc) / (2.0 * a), (-b - sqrt_disc) / (2.0 * a)]
        }
    };

    let mut winding = 0;
    for t in roots {
        if !(0.0..1.0).contains(&t) {
            continue;
        }
        let p = quad_at(curve, t);
        if p.x <= point.x {
            continue;
        }
        let dy = quad_derivative_at(curve, t).y;
        if dy > 0.0 {
            winding += 1;
        } else if dy < 0.0 {
            winding -= 1;
        }
    }
    winding
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::vec2;

    fn unit_square_glyph() -> Glyph {
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
    fn center_of_square_is_inside() {
        let glyph = unit_square_glyph();
        assert!(is_inside(&glyph, vec2(0.5, 0.5)));
    }

    #[test]
    fn point_outside_square_is_outside() {
        let glyph = unit_square_glyph();
        assert!(!is_inside(&glyph, vec2(1.5, 0.5)));
    }

    #[test]
    fn distance_to_line_is_zero_on_the_line() {
        let line = Line { p1: vec2(0.0, 0.0), p2: vec2(1.0, 0.0) };
        assert!(distance_to_line(line, vec2(0.5, 0.0)) < 1e-6);
    }
}
