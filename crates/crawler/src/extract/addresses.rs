use libsonar_core::types::Address;

use super::lexer::{Token, TokenKind};

const NATIVE_TOKEN: Address = Address::repeat_byte(0xee);
const MAX_ADDRESS: Address = Address::repeat_byte(0xff);

/// Addresses that are placeholders rather than references: zero, all-`f` and
/// the all-`e` native token marker.
pub fn is_sentinel(address: &Address) -> bool {
    address.is_zero() || *address == MAX_ADDRESS || *address == NATIVE_TOKEN
}

/// A hex literal of exactly 20 bytes.
pub fn address_literal(token: &Token<'_>) -> Option<Address> {
    if token.kind != TokenKind::Hex || token.text.len() != 42 {
        return None;
    }
    token.text.parse().ok()
}

/// Push `address` unless it is excluded, already present or `out` is full.
pub(crate) fn collect(out: &mut Vec<Address>, address: Address, own: Address, cap: usize) {
    if out.len() >= cap || address == own || is_sentinel(&address) || out.contains(&address) {
        return;
    }
    out.push(address);
}

/// Every address literal in the file, code and comments alike.
pub fn scan_hardcoded_addresses(tokens: &[Token<'_>], own: Address, cap: usize) -> Vec<Address> {
    let mut found = Vec::new();
    for address in tokens.iter().filter_map(address_literal) {
        if found.len() >= cap {
            break;
        }
        collect(&mut found, address, own, cap);
    }
    found
}
