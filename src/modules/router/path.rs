//! V3 multihop path codec
//!
//! Layout: `address(20) [fee(3) address(20)]*`, fees big-endian.

use crate::domain::router::{DecodeError, DecodedPath, PathElement};

pub const ADDRESS_LEN: usize = 20;
pub const FEE_LEN: usize = 3;
const HOP_LEN: usize = FEE_LEN + ADDRESS_LEN;

/// Decode a packed V3 path into alternating tokens and fee tiers
pub fn decode_path(path: &[u8]) -> Result<DecodedPath, DecodeError> {
    if path.len() < ADDRESS_LEN || (path.len() - ADDRESS_LEN) % HOP_LEN != 0 {
        return Err(DecodeError::MalformedPath { len: path.len() });
    }

    let (first, hops) = path.split_at(ADDRESS_LEN);
    let mut elements = Vec::with_capacity(1 + 2 * (hops.len() / HOP_LEN));
    elements.push(PathElement::Token(address_hex(first)));

    for hop in hops.chunks_exact(HOP_LEN) {
        let (fee, token) = hop.split_at(FEE_LEN);
        elements.push(PathElement::Fee(u32::from_be_bytes([0, fee[0], fee[1], fee[2]])));
        elements.push(PathElement::Token(address_hex(token)));
    }

    Ok(DecodedPath::new(elements))
}

fn address_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
