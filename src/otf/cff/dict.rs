// Copyright 2017 The Servo Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! CFF DICT structures: the key/value tables that make up a Top DICT, a Font DICT, or a Private
//! DICT. Operators are one or two bytes (the second byte following an escape of `12`); operands
//! are a small integer/real encoding shared with charstrings, minus the charstring-only `255`
//! fixed-point form and plus the DICT-only 32-bit integer and real number forms.

use byteorder::{BigEndian, ReadBytesExt};
use std::collections::HashMap;
use crate::error::Error;

#[derive(Clone, Copy, Debug)]
pub enum Operand {
    Integer(i32),
    Real(f32),
}

impl Operand {
    pub fn as_i32(&self) -> i32 {
        match *self {
            Operand::Integer(v) => v,
            Operand::Real(v) => v as i32,
        }
    }

    pub fn as_f32(&self) -> f32 {
        match *self {
            Operand::Integer(v) => v as f32,
            Operand::Real(v) => v,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DictKey {
    Charset,
    CharStrings,
    Private,
    Subrs,
    NominalWidthX,
    DefaultWidthX,
    CharstringType,
    Ros,
    FdArray,
    FdSelect,
}

impl DictKey {
    fn code(self) -> u16 {
        match self {
            DictKey::Charset => 15,
            DictKey::CharStrings => 17,
            DictKey::Private => 18,
            DictKey::Subrs => 19,
            DictKey::DefaultWidthX => 20,
            DictKey::NominalWidthX => 21,
            DictKey::CharstringType => 1200 + 6,
            DictKey::Ros => 1200 + 30,
            DictKey::FdArray => 1200 + 36,
            DictKey::FdSelect => 1200 + 37,
        }
    }
}

pub struct Dict {
    entries: HashMap<u16, Vec<Operand>>,
}

impl Dict {
    pub fn parse(mut reader: &[u8]) -> Result<Dict, Error> {
        let mut entries = HashMap::new();
        let mut operands = Vec::new();

        while !reader.is_empty() {
            let b0 = reader.read_u8().map_err(Error::eof)?;
            match b0 {
                32..=246 => operands.push(Operand::Integer(b0 as i32 - 139)),
                247..=250 => {
                    let b1 = reader.read_u8().map_err(Error::eof)?;
                    operands.push(Operand::Integer((b0 as i32 - 247) * 256 + b1 as i32 + 108));
                }
                251..=254 => {
                    let b1 = reader.read_u8().map_err(Error::eof)?;
                    operands.push(Operand::Integer(-(b0 as i32 - 251) * 256 - b1 as i32 - 108));
                }
                28 => {
                    let value = reader.read_i16::<BigEndian>().map_err(Error::eof)?;
                    operands.push(Operand::Integer(value as i32));
                }
                29 => {
                    let value = reader.read_i32::<BigEndian>().map_err(Error::eof)?;
                    operands.push(Operand::Integer(value));
                }
                30 => operands.push(Operand::Real(parse_real(&mut reader)?)),
                12 => {
                    let b1 = reader.read_u8().map_err(Error::eof)?;
                    let code = 1200 + b1 as u16;
                    entries.insert(code, std::mem::take(&mut operands));
                }
                0..=21 => {
                    entries.insert(b0 as u16, std::mem::take(&mut operands));
                }
                _ => return Err(Error::MalformedTable),
            }
        }

        Ok(Dict { entries })
    }

    pub fn get(&self, key: DictKey) -> Option<&[Operand]> {
        self.entries.get(&key.code()).map(|v| v.as_slice())
    }

    pub fn get_int(&self, key: DictKey) -> Option<i32> {
        self.get(key).and_then(|operands| operands.last()).map(Operand::as_i32)
    }

    pub fn get_f32(&self, key: DictKey) -> Option<f32> {
        self.get(key).and_then(|operands| operands.last()).map(Operand::as_f32)
    }
}

// Decodes a CFF real number: a stream of nibbles, each a digit, decimal point, exponent sign, or
// the 0xf terminator, packed two to a byte.
fn parse_real(reader: &mut &[u8]) -> Result<f32, Error> {
    let mut text = String::new();
    loop {
        let byte = reader.read_u8().map_err(Error::eof)?;
        for nibble in [byte >> 4, byte & 0xf] {
            match nibble {
                0..=9 => text.push((b'0' + nibble) as char),
                0xa => text.push('.'),
                0xb => text.push('E'),
                0xc => text.push_str("E-"),
                0xe => text.push('-'),
                0xf => return text.parse::<f32>().map_err(|_| Error::MalformedTable),
                _ => return Err(Error::MalformedTable),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_small_integer_operands() {
        // 139 encodes 0, operator 17 (CharStrings)
        let dict = Dict::parse(&[139, 17]).unwrap();
        assert_eq!(dict.get_int(DictKey::CharStrings), Some(0));
    }

    #[test]
    fn resolves_escape_operators() {
        // value 2, escape operator 12 6 (CharstringType)
        let dict = Dict::parse(&[141, 12, 6]).unwrap();
        assert_eq!(dict.get_int(DictKey::CharstringType), Some(2));
    }

    #[test]
    fn resolves_private_dict_pair_operand() {
        // [size=20, offset=100] Private
        let dict = Dict::parse(&[20 + 139, 100 + 139, 18]).unwrap();
        let operands = dict.get(DictKey::Private).unwrap();
        assert_eq!(operands.len(), 2);
        assert_eq!(operands[0].as_i32(), 20);
        assert_eq!(operands[1].as_i32(), 100);
    }
}
