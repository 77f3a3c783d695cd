// Copyright 2017 The Servo Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Unifies the `glyf` and CFF outline decoders into one normalized `Glyph` representation:
//! contours of lines and quadratic curves, scaled to em-normalized (0..1) units with the origin
//! moved to the glyph's own bounding box.

use crate::error::Error;
use crate::geometry::{Affine2, Vec2, vec2};
use crate::otf::cff::PathSegment;
use crate::otf::glyf::{self, ComponentArgs, GlyfOutline};
use crate::otf::Subfont;

/// A straight segment of a contour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    pub p1: Vec2,
    pub p2: Vec2,
}

/// A quadratic Bezier segment of a contour; `p2` is the control point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadCurve {
    pub p1: Vec2,
    pub p2: Vec2,
    pub p3: Vec2,
}

/// One piece of a contour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Segment {
    Line(Line),
    Curve(QuadCurve),
}

/// A reference to a base glyph used by a composite, with its placement transform already
/// resolved relative to the composite's own coordinate space.
#[derive(Clone, Copy, Debug)]
pub struct Component {
    pub glyph_index: u16,
    pub transform: Affine2,
}

/// A fully decoded, normalized glyph outline.
#[derive(Clone, Debug, Default)]
pub struct Glyph {
    pub contours: Vec<Vec<Segment>>,
    pub components: Vec<Component>,
    pub advance: Vec2,
    pub offset: Vec2,
    pub size: Vec2,
    pub pos: Vec2,
}

/// One corner of a glyph's textured quad: an em-space position paired with the atlas texture
/// coordinate sampled there. Both fields are in normalized (0..1-scale) units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub pos: Vec2,
    pub tex: Vec2,
}

impl Glyph {
    /// The four corners of this glyph's textured quad, in top-right, top-left, bottom-left,
    /// bottom-right order with a fixed winding. `pos` is not yet placed in the atlas (it's still
    /// `(0, 0)`) until after a [`FontBuilder::build`](crate::builder::FontBuilder::build) call.
    pub fn quad(&self) -> [Vertex; 4] {
        let left = self.offset.x;
        let bottom = self.offset.y;
        let right = self.offset.x + self.size.x;
        let top = self.offset.y + self.size.y;

        let tex_left = self.pos.x;
        let tex_top = self.pos.y;
        let tex_right = self.pos.x + self.size.x;
        let tex_bottom = self.pos.y + self.size.y;

        [
            Vertex { pos: vec2(right, top), tex: vec2(tex_right, tex_top) },
            Vertex { pos: vec2(left, top), tex: vec2(tex_left, tex_top) },
            Vertex { pos: vec2(left, bottom), tex: vec2(tex_left, tex_bottom) },
            Vertex { pos: vec2(right, bottom), tex: vec2(tex_right, tex_bottom) },
        ]
    }
}

/// Decodes and normalizes the outline for `glyph_id` in `font`.
pub fn build_glyph(font: &Subfont, glyph_id: u16) -> Result<Glyph, Error> {
    let units_per_em = font.units_per_em().max(1) as f32;
    let metrics = font.metrics_for_glyph(glyph_id)?;
    let lsb_factor = if font.cff_table().is_some() { 1.0 } else { 2.0 };

    let mut contours = raw_contours_for_glyph(font, glyph_id, 0)?;
    let components = match font.glyf_outline(glyph_id)? {
        Some(GlyfOutline::Composite(raw_components)) => resolve_components(&raw_components),
        _ => Vec::new(),
    };

    for contour in &mut contours {
        for segment in contour.iter_mut() {
            scale_segment(segment, 1.0 / units_per_em);
        }
    }

    let (min, max) = bounds_of(&contours).unwrap_or((vec2(0.0, 0.0), vec2(0.0, 0.0)));

    for contour in &mut contours {
        for segment in contour.iter_mut() {
            translate_segment(segment, -min.x, -min.y);
        }
    }

    let advance = vec2(metrics.advance_width as f32 / units_per_em, 0.0);
    let offset = vec2(min.x - lsb_factor * metrics.lsb as f32 / units_per_em, min.y);
    let size = vec2(max.x - min.x, max.y - min.y);

    Ok(Glyph { contours, components, advance, offset, size, pos: vec2(0.0, 0.0) })
}

// Composite glyphs carry both a flattened contour list, used for rendering, and a list of
// `Component` references with resolved transforms, used by callers that want to instance a base
// glyph rather than duplicate its geometry. This walks the glyf composite tree once per glyph,
// recursing into each referenced glyph (CFF glyphs can't be composites, so the CFF leg never
// recurses) and transforming its raw, un-normalized contours into the parent's coordinate space.
fn raw_contours_for_glyph(font: &Subfont, glyph_id: u16, depth: u32)
                          -> Result<Vec<Vec<Segment>>, Error> {
    if depth >= glyf::MAX_COMPONENT_DEPTH {
        return Ok(Vec::new())
    }

    if let Some(cff) = font.cff_table() {
        return Ok(cff_segments_to_contours(&cff.glyph_outline(glyph_id)))
    }

    match font.glyf_outline(glyph_id)? {
        Some(GlyfOutline::Simple(raw_contours)) => Ok(simple_contours_to_segments(&raw_contours)),
        Some(GlyfOutline::Composite(raw_components)) => {
            let mut contours = Vec::new();
            for component in &raw_components {
                let transform = component_transform(component);
                let mut sub_contours =
                    raw_contours_for_glyph(font, component.glyph_index, depth + 1)?;
                for contour in &mut sub_contours {
                    for segment in contour.iter_mut() {
                        transform_segment(segment, &transform);
                    }
                }
                contours.extend(sub_contours);
            }
            Ok(contours)
        }
        Some(GlyfOutline::Empty) | None => Ok(Vec::new()),
    }
}

fn resolve_components(raw: &[glyf::Component]) -> Vec<Component> {
    raw.iter().map(|component| {
        Component { glyph_index: component.glyph_index, transform: component_transform(component) }
    }).collect()
}

fn component_transform(component: &glyf::Component) -> Affine2 {
    let (dx, dy) = match component.args {
        ComponentArgs::Offset { dx, dy } => (dx, dy),
        // Point-matching composites are rare; approximate with a zero offset rather than
        // threading parent-contour state through every recursion level.
        ComponentArgs::MatchPoints { .. } => (0.0, 0.0),
    };

    let [a, b, c, d] = component.scale;
    let (dx, dy) = if component.scaled_component_offset {
        (a * dx + c * dy, b * dx + d * dy)
    } else {
        (dx, dy)
    };
    let (dx, dy) = if component.round_xy_to_grid {
        (dx.round(), dy.round())
    } else {
        (dx, dy)
    };

    Affine2 { a, b, c, d, dx, dy }
}

fn transform_segment(segment: &mut Segment, transform: &Affine2) {
    match segment {
        Segment::Line(line) => {
            line.p1 = transform.apply(line.p1);
            line.p2 = transform.apply(line.p2);
        }
        Segment::Curve(curve) => {
            curve.p1 = transform.apply(curve.p1);
            curve.p2 = transform.apply(curve.p2);
            curve.p3 = transform.apply(curve.p3);
        }
    }
}

fn simple_contours_to_segments(contours: &[Vec<glyf::Point>]) -> Vec<Vec<Segment>> {
    contours.iter().map(|points| {
        let mut segments = Vec::new();
        let mut i = 0;
        while i + 1 < points.len() {
            let current = points[i];
            let next = points[i + 1];
            let p1 = vec2(current.position.x as f32, current.position.y as f32);

            if next.on_curve {
                let p2 = vec2(next.position.x as f32, next.position.y as f32);
                segments.push(Segment::Line(Line { p1, p2 }));
                i += 1;
            } else {
                let control = vec2(next.position.x as f32, next.position.y as f32);
                let end = points.get(i + 2).copied().unwrap_or(current);
                let p3 = vec2(end.position.x as f32, end.position.y as f32);
                segments.push(Segment::Curve(QuadCurve { p1, p2: control, p3 }));
                i += 2;
            }
        }
        segments
    }).collect()
}

// CFF charstrings emit cubic curves; this crate's outline representation only carries quadratics,
// so each cubic is approximated with two quadratics sharing the cubic's midpoint tangent.
fn cff_segments_to_contours(segments: &[PathSegment]) -> Vec<Vec<Segment>> {
    let mut contours = Vec::new();
    let mut current: Vec<Segment> = Vec::new();
    let mut pos = vec2(0.0, 0.0);

    for segment in segments {
        match *segment {
            PathSegment::MoveTo(x, y) => {
                if !current.is_empty() {
                    contours.push(std::mem::take(&mut current));
                }
                pos = vec2(x, y);
            }
            PathSegment::LineTo(x, y) => {
                let p2 = vec2(x, y);
                current.push(Segment::Line(Line { p1: pos, p2 }));
                pos = p2;
            }
            PathSegment::CurveTo(x1, y1, x2, y2, x3, y3) => {
                let (c1, c2, end) = (vec2(x1, y1), vec2(x2, y2), vec2(x3, y3));
                let mid = cubic_point_at(pos, c1, c2, end, 0.5);

                let q1 = quadratic_control_for_cubic_half(pos, c1, mid);
                current.push(Segment::Curve(QuadCurve { p1: pos, p2: q1, p3: mid }));

                let q2 = quadratic_control_for_cubic_half(mid, c2, end);
                current.push(Segment::Curve(QuadCurve { p1: mid, p2: q2, p3: end }));

                pos = end;
            }
        }
    }

    if !current.is_empty() {
        contours.push(current);
    }
    contours
}

fn cubic_point_at(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    let a = u * u * u;
    let b = 3.0 * u * u * t;
    let c = 3.0 * u * t * t;
    let d = t * t * t;
    vec2(a * p0.x + b * p1.x + c * p2.x + d * p3.x,
         a * p0.y + b * p1.y + c * p2.y + d * p3.y)
}

// The quadratic with the same endpoints and the same tangent direction at the start as the cubic
// half it's replacing has its control point at `start + 1.5*(cubicControl - start)`.
fn quadratic_control_for_cubic_half(start: Vec2, cubic_control: Vec2, _end: Vec2) -> Vec2 {
    vec2(start.x + 1.5 * (cubic_control.x - start.x),
         start.y + 1.5 * (cubic_control.y - start.y))
}

fn scale_segment(segment: &mut Segment, factor: f32) {
    match segment {
        Segment::Line(line) => {
            line.p1 = vec2(line.p1.x * factor, line.p1.y * factor);
            line.p2 = vec2(line.p2.x * factor, line.p2.y * factor);
        }
        Segment::Curve(curve) => {
            curve.p1 = vec2(curve.p1.x * factor, curve.p1.y * factor);
            curve.p2 = vec2(curve.p2.x * factor, curve.p2.y * factor);
            curve.p3 = vec2(curve.p3.x * factor, curve.p3.y * factor);
        }
    }
}

fn translate_segment(segment: &mut Segment, dx: f32, dy: f32) {
    match segment {
        Segment::Line(line) => {
            line.p1 = vec2(line.p1.x + dx, line.p1.y + dy);
            line.p2 = vec2(line.p2.x + dx, line.p2.y + dy);
        }
        Segment::Curve(curve) => {
            curve.p1 = vec2(curve.p1.x + dx, curve.p1.y + dy);
            curve.p2 = vec2(curve.p2.x + dx, curve.p2.y + dy);
            curve.p3 = vec2(curve.p3.x + dx, curve.p3.y + dy);
        }
    }
}

fn bounds_of(contours: &[Vec<Segment>]) -> Option<(Vec2, Vec2)> {
    let mut min = vec2(f32::MAX, f32::MAX);
    let mut max = vec2(f32::MIN, f32::MIN);
    let mut seen = false;

    let mut visit = |p: Vec2| {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
        seen = true;
    };

    for contour in contours {
        for segment in contour {
            match *segment {
                Segment::Line(Line { p1, p2 }) => {
                    visit(p1);
                    visit(p2);
                }
                Segment::Curve(QuadCurve { p1, p2, p3 }) => {
                    visit(p1);
                    visit(p2);
                    visit(p3);
                }
            }
        }
    }

    if seen { Some((min, max)) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cubic_approximation_preserves_endpoints() {
        let segments = [
            PathSegment::MoveTo(0.0, 0.0),
            PathSegment::CurveTo(10.0, 0.0, 10.0, 10.0, 0.0, 10.0),
        ];
        let contours = cff_segments_to_contours(&segments);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 2);
        match contours[0][0] {
            Segment::Curve(QuadCurve { p1, .. }) => assert_eq!(p1, vec2(0.0, 0.0)),
            _ => panic!("expected a curve"),
        }
        match contours[0][1] {
            Segment::Curve(QuadCurve { p3, .. }) => assert_eq!(p3, vec2(0.0, 10.0)),
            _ => panic!("expected a curve"),
        }
    }

    #[test]
    fn quad_corners_combine_offset_size_and_atlas_pos() {
        let glyph = Glyph {
            offset: vec2(0.1, 0.2),
            size: vec2(0.3, 0.4),
            pos: vec2(0.5, 0.6),
            ..Glyph::default()
        };
        let [top_right, top_left, bottom_left, bottom_right] = glyph.quad();

        assert_eq!(top_right.pos, vec2(0.4, 0.6));
        assert_eq!(top_left.pos, vec2(0.1, 0.6));
        assert_eq!(bottom_left.pos, vec2(0.1, 0.2));
        assert_eq!(bottom_right.pos, vec2(0.4, 0.2));

        assert_eq!(top_right.tex, vec2(0.8, 0.6));
        assert_eq!(top_left.tex, vec2(0.5, 0.6));
        assert_eq!(bottom_left.tex, vec2(0.5, 1.0));
        assert_eq!(bottom_right.tex, vec2(0.8, 1.0));
    }
}
