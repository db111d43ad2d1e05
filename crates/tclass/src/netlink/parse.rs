//! Strict parser combinators for netlink payloads, built on winnow.
//!
//! Unlike [`AttrIter`](super::attr::AttrIter), these parsers reject a
//! malformed attribute header instead of stopping early, so a corrupt dump
//! surfaces as an error rather than a silently shortened attribute list.

use winnow::binary::{Endianness, u16 as wu16};
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::take;

use super::attr::{NLA_HDRLEN, NLA_TYPE_MASK, nla_align};
use super::error::{Error, Result};

/// Result type for winnow parsers.
pub type PResult<T> = core::result::Result<T, ContextError>;

fn native_u16(input: &mut &[u8]) -> PResult<u16> {
    wu16(Endianness::Native).parse_next(input)
}

fn bytes<'a>(input: &mut &'a [u8], count: usize) -> PResult<&'a [u8]> {
    take(count).parse_next(input)
}

/// Parse one attribute and return (type, payload).
///
/// Fails when the declared length is shorter than the header or longer than
/// the remaining input. Alignment padding is consumed when present; a final
/// attribute whose padding was trimmed is accepted.
pub fn parse_attr<'a>(input: &mut &'a [u8]) -> PResult<(u16, &'a [u8])> {
    let len = native_u16(input)? as usize;
    let attr_type = native_u16(input)?;

    if len < NLA_HDRLEN {
        return Err(ContextError::new());
    }

    let payload = bytes(input, len - NLA_HDRLEN)?;

    let padding = (nla_align(len) - len).min(input.len());
    bytes(input, padding)?;

    Ok((attr_type & NLA_TYPE_MASK, payload))
}

/// Parse a whole buffer as a flat list of attributes.
///
/// Trailing bytes too short to hold an attribute header are ignored.
pub fn parse_attrs(data: &[u8]) -> Result<Vec<(u16, &[u8])>> {
    let mut input = data;
    let mut attrs = Vec::new();

    while input.len() >= NLA_HDRLEN {
        let offset = data.len() - input.len();
        let attr = parse_attr(&mut input).map_err(|_| {
            Error::parse(
                format!("malformed attribute at offset {}", offset),
                &data[offset..],
            )
        })?;
        attrs.push(attr);
    }

    Ok(attrs)
}
