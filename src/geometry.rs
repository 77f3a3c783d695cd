// Copyright 2017 The Servo Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Small vector/matrix helpers shared by the outline builder, the atlas packer, and the
//! rasterizer. Glyph-space arithmetic is all `f32`, normalized to the em square.

use euclid::{Point2D, Vector2D};

/// A point or displacement in normalized em-space.
pub type Vec2 = Point2D<f32, euclid::UnknownUnit>;

#[inline]
pub fn vec2(x: f32, y: f32) -> Vec2 {
    Vec2::new(x, y)
}

#[inline]
pub fn dot(a: Vector2D<f32, euclid::UnknownUnit>, b: Vector2D<f32, euclid::UnknownUnit>) -> f32 {
    a.x * b.x + a.y * b.y
}

#[inline]
pub fn to_vector(p: Vec2) -> Vector2D<f32, euclid::UnknownUnit> {
    Vector2D::new(p.x, p.y)
}

/// A 2x2 affine transform plus translation, as used by composite `glyf` components.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine2 {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub dx: f32,
    pub dy: f32,
}

impl Affine2 {
    pub const IDENTITY: Affine2 = Affine2 { a: 1.0, b: 0.0, c: 0.0, d: 1.0, dx: 0.0, dy: 0.0 };

    #[inline]
    pub fn apply(&self, p: Vec2) -> Vec2 {
        vec2(self.a * p.x + self.c * p.y + self.dx, self.b * p.x + self.d * p.y + self.dy)
    }

    #[inline]
    pub fn apply_vector(&self, v: Vec2) -> Vec2 {
        vec2(self.a * v.x + self.c * v.y, self.b * v.x + self.d * v.y)
    }
}

/// Finds the real roots of `a*t^3 + b*t^2 + c*t + d = 0`.
///
/// Used to minimize distance-to-quadratic-curve: the derivative of the squared distance from a
/// point to a quadratic Bezier is a cubic in `t`. Degenerates gracefully to quadratic/linear
/// solving when leading coefficients vanish.
pub fn solve_cubic(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    if a.abs() < 1e-12 {
        return solve_quadratic(b, c, d)
    }

    // Normalize to t^3 + pt^2 + qt + r = 0.
    let (p, q, r) = (b / a, c / a, d / a);

    // Depress: t = x - p/3.
    let shift = p / 3.0;
    let a2 = q - p * p / 3.0;
    let b2 = 2.0 * p * p * p / 27.0 - p * q / 3.0 + r;

    let mut roots = Vec::with_capacity(3);
    let discriminant = (b2 * b2) / 4.0 + (a2 * a2 * a2) / 27.0;

    if discriminant > 1e-12 {
        let sqrt_disc = discriminant.sqrt();
        let u = cbrt(-b2 / 2.0 + sqrt_disc);
        let v = cbrt(-b2 / 2.0 - sqrt_disc);
        roots.push(u + v - shift);
    } else if discriminant > -1e-12 {
        // Repeated roots.
        let u = cbrt(-b2 / 2.0);
        roots.push(2.0 * u - shift);
        roots.push(-u - shift);
    } else {
        // Three distinct real roots (casus irreducibilis): trigonometric solution.
        let m = 2.0 * (-a2 / 3.0).sqrt();
        let theta = (3.0 * b2 / (a2 * m)).acos() / 3.0;
        for k in 0..3 {
            let angle = theta - 2.0 * std::f64::consts::PI * (k as f64) / 3.0;
            roots.push(m * angle.cos() - shift);
        }
    }

    roots
}

fn solve_quadratic(a: f64, b: f64, c: f64) -> Vec<f64> {
    if a.abs() < 1e-12 {
        if b.abs() < 1e-12 {
            return vec![]
        }
        return vec![-c / b]
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return vec![]
    }

    let sqrt_disc = discriminant.sqrt();
    vec![(-b + sqrt_disc) / (2.0 * a), (-b - sqrt_disc) / (2.0 * a)]
}

#[inline]
fn cbrt(x: f64) -> f64 {
    if x < 0.0 { -(-x).powf(1.0 / 3.0) } else { x.powf(1.0 / 3.0) }
}

#[cfg(test)]
mod tests {
    use super::solve_cubic;

    fn eval(a: f64, b: f64, c: f64, d: f64, t: f64) -> f64 {
        a * t * t * t + b * t * t + c * t + d
    }

    #[test]
    fn finds_the_known_roots_of_a_factored_cubic() {
        // (t - 1)(t - 2)(t + 3) = t^3 - 7t - 6
        let roots = solve_cubic(1.0, 0.0, -7.0, -6.0);
        assert_eq!(roots.len(), 3);
        let mut sorted = roots.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((sorted[0] - (-3.0)).abs() < 1e-6);
        assert!((sorted[1] - 1.0).abs() < 1e-6);
        assert!((sorted[2] - 2.0).abs() < 1e-6);
    }

    quickcheck! {
        fn every_root_satisfies_the_equation(a: f64, b: f64, c: f64, d: f64) -> bool {
            if !(a.is_finite() && b.is_finite() && c.is_finite() && d.is_finite()) {
                return true;
            }
            if a.abs() > 1e6 || b.abs() > 1e6 || c.abs() > 1e6 || d.abs() > 1e6 {
                return true;
            }
            solve_cubic(a, b, c, d).iter().all(|&t| eval(a, b, c, d, t).abs() < 1e-2)
        }
    }
}
