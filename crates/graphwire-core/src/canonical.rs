// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deterministic CBOR (canonical subset) for node records.
//!
//! Encoding rules: shortest-width integers and lengths, map entries sorted by encoded key
//! bytes with no duplicates, no tags, no indefinite lengths, and floats in the narrowest width
//! that round-trips (integral floats become integers). The decoder rejects anything the
//! encoder would not have produced, so one record value has exactly one byte form.

use ciborium::value::{Integer, Value};
use half::f16;

/// Canonical CBOR encode/decode failures.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CanonError {
    /// Input ended in the middle of an item.
    #[error("incomplete input")]
    Incomplete,
    /// Bytes remain after the top-level item.
    #[error("trailing bytes after value")]
    Trailing,
    /// Tagged items are not part of the subset.
    #[error("tags not allowed")]
    Tag,
    /// Indefinite-length items are not part of the subset.
    #[error("indefinite length not allowed")]
    Indefinite,
    /// An integer or length used a wider encoding than necessary.
    #[error("non-canonical integer width")]
    NonCanonicalInt,
    /// A float used a wider encoding than necessary.
    #[error("non-canonical float width")]
    NonCanonicalFloat,
    /// A float carried an integral value that must be encoded as an integer.
    #[error("float encodes integral value; must be integer")]
    FloatShouldBeInt,
    /// Map keys were not in strictly increasing byte order.
    #[error("map keys not strictly increasing")]
    MapKeyOrder,
    /// Two map keys encoded to the same bytes.
    #[error("duplicate map key")]
    MapKeyDuplicate,
    /// Anything else outside the supported subset.
    #[error("decode error: {0}")]
    Decode(String),
}

type Result<T> = std::result::Result<T, CanonError>;

/// Encode a CBOR value canonically.
pub fn encode_value(val: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    enc_value(val, &mut out)?;
    Ok(out)
}

/// Decode exactly one canonical CBOR value from `bytes`.
pub fn decode_value(bytes: &[u8]) -> Result<Value> {
    let mut idx = 0usize;
    let v = dec_value(bytes, &mut idx)?;
    if idx != bytes.len() {
        return Err(CanonError::Trailing);
    }
    Ok(v)
}

fn enc_value(v: &Value, out: &mut Vec<u8>) -> Result<()> {
    match v {
        Value::Bool(b) => out.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => out.push(0xf6),
        Value::Integer(n) => enc_int(i128::from(*n), out),
        Value::Float(f) => enc_float(*f, out),
        Value::Text(s) => {
            enc_head(3, s.len(), out);
            out.extend_from_slice(s.as_bytes());
        }
        Value::Bytes(b) => {
            enc_head(2, b.len(), out);
            out.extend_from_slice(b);
        }
        Value::Array(items) => {
            enc_head(4, items.len(), out);
            for it in items {
                enc_value(it, out)?;
            }
        }
        Value::Map(entries) => {
            let mut encoded: Vec<(Vec<u8>, &Value)> = Vec::with_capacity(entries.len());
            for (k, v) in entries {
                let mut kb = Vec::new();
                enc_value(k, &mut kb)?;
                encoded.push((kb, v));
            }
            encoded.sort_by(|a, b| a.0.cmp(&b.0));
            if encoded.windows(2).any(|w| w[0].0 == w[1].0) {
                return Err(CanonError::MapKeyDuplicate);
            }
            enc_head(5, encoded.len(), out);
            for (kb, v) in encoded {
                out.extend_from_slice(&kb);
                enc_value(v, out)?;
            }
        }
        Value::Tag(_, _) => return Err(CanonError::Tag),
        _ => return Err(CanonError::Decode("unsupported simple value".into())),
    }
    Ok(())
}

fn enc_head(major: u8, len: usize, out: &mut Vec<u8>) {
    write_major(major, len as u128, out);
}

/// Integral floats inside this range are written as CBOR integers.
fn integral_in_range(f: f64) -> Option<i128> {
    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
    let i = f as i128;
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    let exact = f.fract() == 0.0 && i as f64 == f;
    (exact && i64::try_from(i).is_ok()).then_some(i)
}

fn enc_int(n: i128, out: &mut Vec<u8>) {
    if n >= 0 {
        write_major(0, n.unsigned_abs(), out);
    } else {
        write_major(1, (-1 - n).unsigned_abs(), out);
    }
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn enc_float(f: f64, out: &mut Vec<u8>) {
    if f.is_nan() {
        write_half(f16::NAN, out);
        return;
    }
    if f.is_infinite() {
        let h = if f.is_sign_positive() {
            f16::INFINITY
        } else {
            f16::NEG_INFINITY
        };
        write_half(h, out);
        return;
    }
    if let Some(i) = integral_in_range(f) {
        enc_int(i, out);
        return;
    }
    let h = f16::from_f64(f);
    if h.to_f64() == f {
        write_half(h, out);
        return;
    }
    let narrow = f as f32;
    if f64::from(narrow) == f {
        out.push(0xfa);
        out.extend_from_slice(&narrow.to_be_bytes());
    } else {
        out.push(0xfb);
        out.extend_from_slice(&f.to_be_bytes());
    }
}

fn write_half(h: f16, out: &mut Vec<u8>) {
    out.push(0xf9);
    out.extend_from_slice(&h.to_bits().to_be_bytes());
}

#[allow(clippy::cast_possible_truncation)]
fn write_major(major: u8, n: u128, out: &mut Vec<u8>) {
    debug_assert!(major <= 7);
    match n {
        0..=23 => out.push((major << 5) | n as u8),
        24..=0xff => {
            out.push((major << 5) | 24);
            out.push(n as u8);
        }
        0x100..=0xffff => {
            out.push((major << 5) | 25);
            out.extend_from_slice(&(n as u16).to_be_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push((major << 5) | 26);
            out.extend_from_slice(&(n as u32).to_be_bytes());
        }
        _ => {
            out.push((major << 5) | 27);
            out.extend_from_slice(&(n as u64).to_be_bytes());
        }
    }
}

fn take<'a>(bytes: &'a [u8], idx: &mut usize, n: usize) -> Result<&'a [u8]> {
    let end = idx.checked_add(n).ok_or(CanonError::Incomplete)?;
    let slice = bytes.get(*idx..end).ok_or(CanonError::Incomplete)?;
    *idx = end;
    Ok(slice)
}

fn read_uint(bytes: &[u8], idx: &mut usize, nbytes: usize) -> Result<u64> {
    Ok(take(bytes, idx, nbytes)?
        .iter()
        .fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

fn read_len(bytes: &[u8], idx: &mut usize, info: u8) -> Result<u64> {
    let n = match info {
        0..=23 => return Ok(u64::from(info)),
        24 => read_uint(bytes, idx, 1)?,
        25 => read_uint(bytes, idx, 2)?,
        26 => read_uint(bytes, idx, 4)?,
        27 => read_uint(bytes, idx, 8)?,
        31 => return Err(CanonError::Indefinite),
        _ => return Err(CanonError::Decode("invalid length info".into())),
    };
    let minimal = match info {
        24 => n > 23,
        25 => n > 0xff,
        26 => n > 0xffff,
        _ => n > 0xffff_ffff,
    };
    if minimal {
        Ok(n)
    } else {
        Err(CanonError::NonCanonicalInt)
    }
}

fn read_count(bytes: &[u8], idx: &mut usize, info: u8) -> Result<usize> {
    let n = read_len(bytes, idx, info)?;
    let n = usize::try_from(n).map_err(|_| CanonError::Incomplete)?;
    // Every item needs at least one byte; refuse counts the input cannot hold.
    if n > bytes.len().saturating_sub(*idx) {
        return Err(CanonError::Incomplete);
    }
    Ok(n)
}

#[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
fn read_float(bytes: &[u8], idx: &mut usize, info: u8) -> Result<f64> {
    let (value, width) = match info {
        25 => {
            let raw = take(bytes, idx, 2)?;
            (f16::from_bits(u16::from_be_bytes([raw[0], raw[1]])).to_f64(), 2)
        }
        26 => {
            let raw = take(bytes, idx, 4)?;
            (f64::from(f32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]])), 4)
        }
        _ => {
            let raw = take(bytes, idx, 8)?;
            let mut buf = [0u8; 8];
            buf.copy_from_slice(raw);
            (f64::from_be_bytes(buf), 8)
        }
    };
    if value.is_finite() && integral_in_range(value).is_some() {
        return Err(CanonError::FloatShouldBeInt);
    }
    if width > 2 && (value.is_nan() || value.is_infinite() || f16::from_f64(value).to_f64() == value) {
        return Err(CanonError::NonCanonicalFloat);
    }
    if width > 4 && f64::from(value as f32) == value {
        return Err(CanonError::NonCanonicalFloat);
    }
    Ok(value)
}

fn dec_value(bytes: &[u8], idx: &mut usize) -> Result<Value> {
    let b0 = take(bytes, idx, 1)?[0];
    let major = b0 >> 5;
    let info = b0 & 0x1f;

    match major {
        0 => Ok(Value::Integer(Integer::from(read_len(bytes, idx, info)?))),
        1 => {
            let n = read_len(bytes, idx, info)?;
            let signed = i64::try_from(-1i128 - i128::from(n))
                .map_err(|_| CanonError::Decode("integer out of range".into()))?;
            Ok(Value::Integer(Integer::from(signed)))
        }
        2 | 3 => {
            let len = read_count(bytes, idx, info)?;
            let data = take(bytes, idx, len)?;
            if major == 2 {
                Ok(Value::Bytes(data.to_vec()))
            } else {
                std::str::from_utf8(data)
                    .map(|s| Value::Text(s.to_owned()))
                    .map_err(|e| CanonError::Decode(format!("utf8: {e}")))
            }
        }
        4 => {
            let len = read_count(bytes, idx, info)?;
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(dec_value(bytes, idx)?);
            }
            Ok(Value::Array(items))
        }
        5 => {
            let len = read_count(bytes, idx, info)?;
            let mut entries = Vec::with_capacity(len);
            let mut last_key: Option<&[u8]> = None;
            for _ in 0..len {
                let key_start = *idx;
                let k = dec_value(bytes, idx)?;
                let kb = &bytes[key_start..*idx];
                if let Some(prev) = last_key {
                    if kb == prev {
                        return Err(CanonError::MapKeyDuplicate);
                    }
                    if kb < prev {
                        return Err(CanonError::MapKeyOrder);
                    }
                }
                last_key = Some(kb);
                let v = dec_value(bytes, idx)?;
                entries.push((k, v));
            }
            Ok(Value::Map(entries))
        }
        6 => Err(CanonError::Tag),
        _ => match info {
            20 => Ok(Value::Bool(false)),
            21 => Ok(Value::Bool(true)),
            22 => Ok(Value::Null),
            25..=27 => Ok(Value::Float(read_float(bytes, idx, info)?)),
            31 => Err(CanonError::Indefinite),
            _ => Err(CanonError::Decode("simple value not supported".into())),
        },
    }
}
