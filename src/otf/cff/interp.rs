// Copyright 2017 The Servo Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A Type 2 charstring interpreter: walks a glyph's charstring bytecode and produces move/line/
//! curve path segments. Hinting operators are recognized only far enough to consume their
//! operands and the trailing hintmask bytes; no hints are actually applied to the outline.

use byteorder::{BigEndian, ReadBytesExt};
use crate::error::Error;
use crate::otf::cff::PathSegment;
use crate::otf::cff::index::Index;
use crate::util::Jump;

const MAX_STACK: usize = 48;
const MAX_SUBR_DEPTH: u32 = 10;
const TRANSIENT_ARRAY_LEN: usize = 32;

fn subr_bias(count: u32) -> i32 {
    if count < 1240 {
        107
    } else if count < 33900 {
        1131
    } else {
        32768
    }
}

pub struct ExecContext<'a> {
    global_subrs: &'a Index<'a>,
    local_subrs: &'a Index<'a>,
    #[allow(dead_code)]
    nominal_width_x: f32,

    stack: Vec<f32>,
    transient: [f32; TRANSIENT_ARRAY_LEN],
    depth: u32,
    rng_state: u32,

    x: f32,
    y: f32,
    hint_count: u32,
    width_parsed: bool,
    finished: bool,

    segments: Vec<PathSegment>,
}

impl<'a> ExecContext<'a> {
    pub fn new(global_subrs: &'a Index<'a>, local_subrs: &'a Index<'a>, nominal_width_x: f32)
               -> ExecContext<'a> {
        ExecContext {
            global_subrs,
            local_subrs,
            nominal_width_x,
            stack: Vec::with_capacity(MAX_STACK),
            transient: [0.0; TRANSIENT_ARRAY_LEN],
            depth: 0,
            rng_state: 0x2545_f491,
            x: 0.0,
            y: 0.0,
            hint_count: 0,
            width_parsed: false,
            finished: false,
            segments: Vec::new(),
        }
    }

    pub fn run(&mut self, charstring: &[u8]) -> Result<(), Error> {
        self.execute(charstring)
    }

    pub fn finish(self) -> Vec<PathSegment> {
        self.segments
    }

    fn push(&mut self, value: f32) -> Result<(), Error> {
        if self.stack.len() >= MAX_STACK {
            return Err(Error::CffStackOverflow)
        }
        self.stack.push(value);
        Ok(())
    }

    // Contours close implicitly: a `moveto` starts a new contour without emitting an explicit
    // trailing line back to the previous one's start. Callers that need a closed shape (the
    // rasterizer's winding test) treat each contour's last point as connected to its first.
    fn move_to(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
        self.segments.push(PathSegment::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
        self.segments.push(PathSegment::LineTo(x, y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32) {
        self.x = x3;
        self.y = y3;
        self.segments.push(PathSegment::CurveTo(x1, y1, x2, y2, x3, y3));
    }

    // Strips a leading width value off the operand stack, but only the first time any
    // stack-clearing operator runs in this charstring. `normal_args` is how many operands this
    // particular operator family consumes when no width is present.
    fn strip_width(&mut self, normal_args: usize) {
        if self.width_parsed {
            return
        }
        self.width_parsed = true;
        if self.stack.len() > normal_args {
            self.stack.remove(0);
        }
    }

    // hstem/vstem/hstemhm/vstemhm always take an even number of operands; an odd count means a
    // leading width value is present.
    fn strip_width_parity(&mut self) {
        if self.width_parsed {
            return
        }
        self.width_parsed = true;
        if self.stack.len() % 2 == 1 {
            self.stack.remove(0);
        }
    }

    fn count_hints(&mut self) {
        self.strip_width_parity();
        self.hint_count += self.stack.len() as u32 / 2;
        self.stack.clear();
    }

    fn next_random(&mut self) -> f32 {
        // xorshift32
        let mut x = self.rng_state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng_state = x;
        ((x as f64 / u32::MAX as f64) as f32).max(f32::MIN_POSITIVE)
    }

    fn execute(&mut self, charstring: &[u8]) -> Result<(), Error> {
        let mut reader = charstring;

        while !reader.is_empty() && !self.finished {
            let b0 = reader.read_u8().map_err(Error::eof)?;
            match b0 {
                32..=246 => self.push(b0 as f32 - 139.0)?,
                247..=250 => {
                    let b1 = reader.read_u8().map_err(Error::eof)?;
                    self.push((b0 as f32 - 247.0) * 256.0 + b1 as f32 + 108.0)?;
                }
                251..=254 => {
                    let b1 = reader.read_u8().map_err(Error::eof)?;
                    self.push(-(b0 as f32 - 251.0) * 256.0 - b1 as f32 - 108.0)?;
                }
                28 => {
                    let value = reader.read_i16::<BigEndian>().map_err(Error::eof)?;
                    self.push(value as f32)?;
                }
                255 => {
                    let value = reader.read_i32::<BigEndian>().map_err(Error::eof)?;
                    self.push(value as f32 / 65536.0)?;
                }

                1 | 3 | 18 | 23 => self.count_hints(), // h/vstem(hm)

                19 | 20 => {
                    // hintmask / cntrmask: any leftover operands are an implicit vstemhm batch.
                    self.count_hints();
                    let mask_bytes = (self.hint_count as usize + 7) / 8;
                    reader.jump(mask_bytes).map_err(Error::eof)?;
                }

                21 => {
                    // rmoveto
                    self.strip_width(2);
                    if self.stack.len() < 2 {
                        return Err(Error::MalformedTable)
                    }
                    let (dx, dy) = (self.stack[0], self.stack[1]);
                    self.move_to(self.x + dx, self.y + dy);
                    self.stack.clear();
                }
                22 => {
                    // hmoveto
                    self.strip_width(1);
                    let dx = *self.stack.get(0).ok_or(Error::MalformedTable)?;
                    self.move_to(self.x + dx, self.y);
                    self.stack.clear();
                }
                4 => {
                    // vmoveto
                    self.strip_width(1);
                    let dy = *self.stack.get(0).ok_or(Error::MalformedTable)?;
                    self.move_to(self.x, self.y + dy);
                    self.stack.clear();
                }

                5 => {
                    // rlineto
                    self.strip_width(0);
                    for pair in self.stack.clone().chunks(2) {
                        if pair.len() < 2 {
                            break
                        }
                        let (x, y) = (self.x + pair[0], self.y + pair[1]);
                        self.line_to(x, y);
                    }
                    self.stack.clear();
                }
                6 => {
                    // hlineto: alternating horizontal/vertical, starting horizontal
                    self.strip_width(0);
                    let values = self.stack.clone();
                    for (i, &delta) in values.iter().enumerate() {
                        let (x, y) = if i % 2 == 0 {
                            (self.x + delta, self.y)
                        } else {
                            (self.x, self.y + delta)
                        };
                        self.line_to(x, y);
                    }
                    self.stack.clear();
                }
                7 => {
                    // vlineto: alternating vertical/horizontal, starting vertical
                    self.strip_width(0);
                    let values = self.stack.clone();
                    for (i, &delta) in values.iter().enumerate() {
                        let (x, y) = if i % 2 == 0 {
                            (self.x, self.y + delta)
                        } else {
                            (self.x + delta, self.y)
                        };
                        self.line_to(x, y);
                    }
                    self.stack.clear();
                }

                8 => {
                    // rrcurveto: groups of 6
                    self.strip_width(0);
                    for chunk in self.stack.clone().chunks(6) {
                        if chunk.len() < 6 {
                            break
                        }
                        self.emit_relative_curve(chunk[0], chunk[1], chunk[2], chunk[3],
                                                  chunk[4], chunk[5]);
                    }
                    self.stack.clear();
                }
                24 => {
                    // rcurveline: curves, then a trailing line
                    self.strip_width(0);
                    let values = self.stack.clone();
                    let curve_len = values.len().saturating_sub(2) / 6 * 6;
                    for chunk in values[0..curve_len].chunks(6) {
                        self.emit_relative_curve(chunk[0], chunk[1], chunk[2], chunk[3],
                                                  chunk[4], chunk[5]);
                    }
                    if values.len() >= curve_len + 2 {
                        let (dx, dy) = (values[curve_len], values[curve_len + 1]);
                        let (x, y) = (self.x + dx, self.y + dy);
                        self.line_to(x, y);
                    }
                    self.stack.clear();
                }
                25 => {
                    // rlinecurve: lines, then a trailing curve
                    self.strip_width(0);
                    let values = self.stack.clone();
                    let line_len = values.len().saturating_sub(6) / 2 * 2;
                    for pair in values[0..line_len].chunks(2) {
                        let (x, y) = (self.x + pair[0], self.y + pair[1]);
                        self.line_to(x, y);
                    }
                    if values.len() >= line_len + 6 {
                        let chunk = &values[line_len..line_len + 6];
                        self.emit_relative_curve(chunk[0], chunk[1], chunk[2], chunk[3],
                                                  chunk[4], chunk[5]);
                    }
                    self.stack.clear();
                }
                26 => {
                    // vvcurveto: optional leading dx1, then groups of 4
                    self.strip_width(0);
                    let values = self.stack.clone();
                    let (mut dx1, rest) = if values.len() % 4 == 1 {
                        (values[0], &values[1..])
                    } else {
                        (0.0, &values[..])
                    };
                    for chunk in rest.chunks(4) {
                        if chunk.len() < 4 {
                            break
                        }
                        let x1 = self.x + dx1;
                        let y1 = self.y + chunk[0];
                        let x2 = x1 + chunk[1];
                        let y2 = y1 + chunk[2];
                        let x3 = x2;
                        let y3 = y2 + chunk[3];
                        self.curve_to(x1, y1, x2, y2, x3, y3);
                        dx1 = 0.0;
                    }
                    self.stack.clear();
                }
                27 => {
                    // hhcurveto: optional leading dy1, then groups of 4
                    self.strip_width(0);
                    let values = self.stack.clone();
                    let (mut dy1, rest) = if values.len() % 4 == 1 {
                        (values[0], &values[1..])
                    } else {
                        (0.0, &values[..])
                    };
                    for chunk in rest.chunks(4) {
                        if chunk.len() < 4 {
                            break
                        }
                        let x1 = self.x + chunk[0];
                        let y1 = self.y + dy1;
                        let x2 = x1 + chunk[1];
                        let y2 = y1 + chunk[2];
                        let x3 = x2 + chunk[3];
                        let y3 = y2;
                        self.curve_to(x1, y1, x2, y2, x3, y3);
                        dy1 = 0.0;
                    }
                    self.stack.clear();
                }
                30 | 31 => {
                    // vhcurveto (30) / hvcurveto (31): groups of 4, alternating start axis, with
                    // an optional trailing 5th value feeding the final curve's other axis.
                    self.strip_width(0);
                    let values = self.stack.clone();
                    let mut start_vertical = b0 == 30;
                    let mut i = 0;
                    while i + 4 <= values.len() {
                        let is_last_group = i + 8 > values.len();
                        let extra = if is_last_group && values.len() - i == 5 {
                            Some(values[i + 4])
                        } else {
                            None
                        };
                        let chunk = &values[i..i + 4];
                        if start_vertical {
                            let x1 = self.x;
                            let y1 = self.y + chunk[0];
                            let x2 = x1 + chunk[1];
                            let y2 = y1 + chunk[2];
                            let x3 = x2 + chunk[3];
                            let y3 = y2 + extra.unwrap_or(0.0);
                            self.curve_to(x1, y1, x2, y2, x3, y3);
                        } else {
                            let x1 = self.x + chunk[0];
                            let y1 = self.y;
                            let x2 = x1 + chunk[1];
                            let y2 = y1 + chunk[2];
                            let x3 = x2 + extra.unwrap_or(0.0);
                            let y3 = y2 + chunk[3];
                            self.curve_to(x1, y1, x2, y2, x3, y3);
                        }
                        start_vertical = !start_vertical;
                        i += 4;
                    }
                    self.stack.clear();
                }

                34 => {
                    // hflex
                    self.strip_width(7);
                    if self.stack.len() < 7 {
                        return Err(Error::MalformedTable)
                    }
                    let a = self.stack.clone();
                    let (x0, y0) = (self.x, self.y);
                    let x1 = x0 + a[0]; let y1 = y0;
                    let x2 = x1 + a[1]; let y2 = y1 + a[2];
                    let x3 = x2 + a[3]; let y3 = y2;
                    self.curve_to(x1, y1, x2, y2, x3, y3);
                    let x4 = x3 + a[4]; let y4 = y3;
                    let x5 = x4 + a[5]; let y5 = y4 - a[2];
                    let x6 = x5 + a[6]; let y6 = y0;
                    self.curve_to(x4, y4, x5, y5, x6, y6);
                    self.stack.clear();
                }
                35 => {
                    // flex
                    self.strip_width(13);
                    if self.stack.len() < 13 {
                        return Err(Error::MalformedTable)
                    }
                    let a = self.stack.clone();
                    let (x0, y0) = (self.x, self.y);
                    let x1 = x0 + a[0]; let y1 = y0 + a[1];
                    let x2 = x1 + a[2]; let y2 = y1 + a[3];
                    let x3 = x2 + a[4]; let y3 = y2 + a[5];
                    self.curve_to(x1, y1, x2, y2, x3, y3);
                    let x4 = x3 + a[6]; let y4 = y3 + a[7];
                    let x5 = x4 + a[8]; let y5 = y4 + a[9];
                    let x6 = x5 + a[10]; let y6 = y5 + a[11];
                    self.curve_to(x4, y4, x5, y5, x6, y6);
                    self.stack.clear();
                }
                36 => {
                    // hflex1
                    self.strip_width(9);
                    if self.stack.len() < 9 {
                        return Err(Error::MalformedTable)
                    }
                    let a = self.stack.clone();
                    let (x0, y0) = (self.x, self.y);
                    let x1 = x0 + a[0]; let y1 = y0 + a[1];
                    let x2 = x1 + a[2]; let y2 = y1 + a[3];
                    let x3 = x2 + a[4]; let y3 = y2;
                    self.curve_to(x1, y1, x2, y2, x3, y3);
                    let x4 = x3 + a[5]; let y4 = y3;
                    let x5 = x4 + a[6]; let y5 = y4 + a[7];
                    let x6 = x5 + a[8]; let y6 = y0;
                    self.curve_to(x4, y4, x5, y5, x6, y6);
                    self.stack.clear();
                }
                37 => {
                    // flex1
                    self.strip_width(11);
                    if self.stack.len() < 11 {
                        return Err(Error::MalformedTable)
                    }
                    let a = self.stack.clone();
                    let (x0, y0) = (self.x, self.y);
                    let x1 = x0 + a[0]; let y1 = y0 + a[1];
                    let x2 = x1 + a[2]; let y2 = y1 + a[3];
                    let x3 = x2 + a[4]; let y3 = y2 + a[5];
                    self.curve_to(x1, y1, x2, y2, x3, y3);
                    let x4 = x3 + a[6]; let y4 = y3 + a[7];
                    let x5 = x4 + a[8]; let y5 = y4 + a[9];
                    let dx: f32 = a[0] + a[2] + a[4] + a[6] + a[8];
                    let dy: f32 = a[1] + a[3] + a[5] + a[7] + a[9];
                    let (x6, y6) = if dx.abs() > dy.abs() {
                        (x5 + a[10], y0)
                    } else {
                        (x0, y5 + a[10])
                    };
                    self.curve_to(x4, y4, x5, y5, x6, y6);
                    self.stack.clear();
                }

                10 => {
                    // callsubr
                    let index = self.stack.pop().ok_or(Error::MalformedTable)? as i32;
                    self.call_subr(false, index)?;
                }
                29 => {
                    // callgsubr
                    let index = self.stack.pop().ok_or(Error::MalformedTable)? as i32;
                    self.call_subr(true, index)?;
                }
                11 => return Ok(()), // return

                14 => {
                    // endchar
                    self.strip_width(0);
                    self.finished = true;
                }

                12 => {
                    let b1 = reader.read_u8().map_err(Error::eof)?;
                    self.execute_escape(b1)?;
                }

                _ => return Err(Error::CffUnimplementedOperator),
            }
        }

        Ok(())
    }

    fn emit_relative_curve(&mut self, dx1: f32, dy1: f32, dx2: f32, dy2: f32, dx3: f32, dy3: f32) {
        let x1 = self.x + dx1;
        let y1 = self.y + dy1;
        let x2 = x1 + dx2;
        let y2 = y1 + dy2;
        let x3 = x2 + dx3;
        let y3 = y2 + dy3;
        self.curve_to(x1, y1, x2, y2, x3, y3);
    }

    fn call_subr(&mut self, global: bool, raw_index: i32) -> Result<(), Error> {
        if self.depth >= MAX_SUBR_DEPTH {
            return Err(Error::CffStackOverflow)
        }
        let subrs = if global { self.global_subrs } else { self.local_subrs };
        let bias = subr_bias(subrs.count());
        let real_index = raw_index + bias;
        if real_index < 0 {
            return Err(Error::FontIndexOutOfBounds)
        }
        let bytes = subrs.get(real_index as usize)?;

        self.depth += 1;
        self.execute(bytes)?;
        self.depth -= 1;
        Ok(())
    }

    fn execute_escape(&mut self, operator: u8) -> Result<(), Error> {
        match operator {
            3 => binop(&mut self.stack, |a, b| if a != 0.0 && b != 0.0 { 1.0 } else { 0.0 })?, // and
            4 => binop(&mut self.stack, |a, b| if a != 0.0 || b != 0.0 { 1.0 } else { 0.0 })?, // or
            5 => {
                // not
                let a = self.stack.pop().ok_or(Error::MalformedTable)?;
                self.push(if a == 0.0 { 1.0 } else { 0.0 })?;
            }
            9 => {
                // abs
                let a = self.stack.pop().ok_or(Error::MalformedTable)?;
                self.push(a.abs())?;
            }
            10 => binop(&mut self.stack, |a, b| a + b)?, // add
            11 => binop(&mut self.stack, |a, b| a - b)?, // sub
            12 => binop(&mut self.stack, |a, b| if b != 0.0 { a / b } else { 0.0 })?, // div
            14 => {
                // neg
                let a = self.stack.pop().ok_or(Error::MalformedTable)?;
                self.push(-a)?;
            }
            15 => binop(&mut self.stack, |a, b| if a == b { 1.0 } else { 0.0 })?, // eq
            18 => {
                // drop
                self.stack.pop();
            }
            24 => {
                // random
                let value = self.next_random();
                self.push(value)?;
            }
            25 => binop(&mut self.stack, |a, b| a * b)?, // mul
            26 => {
                // sqrt
                let a = self.stack.pop().ok_or(Error::MalformedTable)?;
                self.push(a.max(0.0).sqrt())?;
            }
            27 => {
                // dup
                let a = *self.stack.last().ok_or(Error::MalformedTable)?;
                self.push(a)?;
            }
            28 => {
                // exch
                let len = self.stack.len();
                if len < 2 {
                    return Err(Error::MalformedTable)
                }
                self.stack.swap(len - 1, len - 2);
            }
            29 => {
                // index
                let n = self.stack.pop().ok_or(Error::MalformedTable)? as isize;
                let n = n.max(0) as usize;
                let len = self.stack.len();
                let value = *self.stack.get(len.wrapping_sub(1 + n)).ok_or(Error::MalformedTable)?;
                self.push(value)?;
            }
            30 => {
                // roll
                let j = self.stack.pop().ok_or(Error::MalformedTable)? as i32;
                let n = self.stack.pop().ok_or(Error::MalformedTable)? as usize;
                if n > self.stack.len() {
                    return Err(Error::MalformedTable)
                }
                let start = self.stack.len() - n;
                let slice = &mut self.stack[start..];
                let shift = ((j % n as i32) + n as i32) as usize % n.max(1);
                slice.rotate_right(shift);
            }
            21 => {
                // put
                let index = self.stack.pop().ok_or(Error::MalformedTable)? as usize;
                let value = self.stack.pop().ok_or(Error::MalformedTable)?;
                if let Some(slot) = self.transient.get_mut(index) {
                    *slot = value;
                }
            }
            22 => {
                // get
                let index = self.stack.pop().ok_or(Error::MalformedTable)? as usize;
                let value = self.transient.get(index).copied().unwrap_or(0.0);
                self.push(value)?;
            }
            23 => {
                // ifelse
                let v2 = self.stack.pop().ok_or(Error::MalformedTable)?;
                let v1 = self.stack.pop().ok_or(Error::MalformedTable)?;
                let s2 = self.stack.pop().ok_or(Error::MalformedTable)?;
                let s1 = self.stack.pop().ok_or(Error::MalformedTable)?;
                self.push(if v1 <= v2 { s1 } else { s2 })?;
            }
            _ => return Err(Error::CffUnimplementedOperator),
        }
        Ok(())
    }
}

fn binop(stack: &mut Vec<f32>, f: impl Fn(f32, f32) -> f32) -> Result<(), Error> {
    let b = stack.pop().ok_or(Error::MalformedTable)?;
    let a = stack.pop().ok_or(Error::MalformedTable)?;
    stack.push(f(a, b));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_charstring(bytes: &[u8]) -> Vec<PathSegment> {
        let global = Index::empty();
        let local = Index::empty();
        let mut ctx = ExecContext::new(&global, &local, 0.0);
        ctx.run(bytes).unwrap();
        ctx.finish()
    }

    #[test]
    fn traces_a_closed_square() {
        // hmoveto(100) rlineto(200,0) rlineto(0,200) rlineto(-200,0) endchar
        let bytes: &[u8] = &[
            239, 22,                     // hmoveto 100
            247, 92, 139, 5,             // rlineto 200 0
            139, 247, 92, 5,             // rlineto 0 200
            251, 92, 139, 5,             // rlineto -200 0
            14,                          // endchar
        ];
        let segments = run_charstring(bytes);
        let lines = segments.iter().filter(|s| matches!(s, PathSegment::LineTo(..))).count();
        assert_eq!(lines, 3);
        assert_eq!(segments[0], PathSegment::MoveTo(100.0, 0.0));
    }

    #[test]
    fn strips_leading_width_on_hmoveto() {
        // width=50, dx=100: two operands feeding a 1-arg operator means the first is width.
        let bytes: &[u8] = &[139 + 50, 139 + 100, 22, 14];
        let segments = run_charstring(bytes);
        assert_eq!(segments[0], PathSegment::MoveTo(100.0, 0.0));
    }
}
