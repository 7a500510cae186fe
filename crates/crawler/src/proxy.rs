//! Proxy pattern detection.
//!
//! Two independent detectors: EIP-1967 reads the standardized storage slots
//! from live state, EIP-1167 matches the minimal-proxy bytecode template.

use libsonar_core::{
    adapters::ChainReader,
    types::{b256, canonical, Address, B256},
};
use libsonar_utils::log::debug;

/// `bytes32(uint256(keccak256("eip1967.proxy.implementation")) - 1)`
pub const EIP1967_IMPLEMENTATION_SLOT: B256 =
    b256!("360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc");
/// `bytes32(uint256(keccak256("eip1967.proxy.admin")) - 1)`
pub const EIP1967_ADMIN_SLOT: B256 =
    b256!("b53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103");
/// `bytes32(uint256(keccak256("eip1967.proxy.beacon")) - 1)`
pub const EIP1967_BEACON_SLOT: B256 =
    b256!("a3f0ad74e5423aebfd80d3ef4346578335a9a72aeaee59ff6cb3582b35133d50");

const EIP1167_PREFIX: [u8; 10] =
    [0x36, 0x3d, 0x3d, 0x37, 0x3d, 0x3d, 0x3d, 0x36, 0x3d, 0x73];
const EIP1167_SUFFIX: [u8; 15] = [
    0x5a, 0xf4, 0x3d, 0x82, 0x80, 0x3e, 0x90, 0x3d, 0x91, 0x60, 0x2b, 0x57, 0xfd,
    0x5b, 0xf3,
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Eip1967Evidence {
    pub implementation: Option<Address>,
    pub admin: Option<Address>,
    pub beacon: Option<Address>,
}

impl Eip1967Evidence {
    /// An implementation or a beacon slot makes the contract a proxy. An admin
    /// slot alone does not.
    pub fn is_proxy(&self) -> bool {
        self.implementation.is_some() || self.beacon.is_some()
    }

    /// The address the proxy delegates to, falling back to the beacon.
    pub fn target(&self) -> Option<Address> {
        self.implementation.or(self.beacon)
    }
}

/// Interpret a storage word as an address slot.
///
/// The upper 12 bytes must be zero and the address itself nonzero; anything
/// else is not a valid slot layout.
pub fn slot_to_address(word: &B256) -> Option<Address> {
    if word[..12].iter().any(|b| *b != 0) {
        return None;
    }
    let address = Address::from_slice(&word[12..]);
    if address.is_zero() {
        None
    } else {
        Some(address)
    }
}

/// Read the three EIP-1967 slots. A failed read counts as an empty slot.
pub async fn detect_eip1967(chain: &dyn ChainReader, address: Address) -> Eip1967Evidence {
    let (implementation, admin, beacon) = futures::join!(
        chain.read_storage_slot(address, EIP1967_IMPLEMENTATION_SLOT),
        chain.read_storage_slot(address, EIP1967_ADMIN_SLOT),
        chain.read_storage_slot(address, EIP1967_BEACON_SLOT),
    );
    let read = |slot: &str, word: Result<B256, _>| match word {
        Ok(word) => slot_to_address(&word),
        Err(err) => {
            debug!(address = canonical(&address), slot, err = ?err, "storage read failed");
            None
        }
    };
    Eip1967Evidence {
        implementation: read("implementation", implementation),
        admin: read("admin", admin),
        beacon: read("beacon", beacon),
    }
}

/// Match the 45-byte EIP-1167 runtime template and return the embedded
/// implementation address.
pub fn detect_eip1167(code: &[u8]) -> Option<Address> {
    let len = EIP1167_PREFIX.len() + 20 + EIP1167_SUFFIX.len();
    if code.len() != len {
        return None;
    }
    let (prefix, rest) = code.split_at(EIP1167_PREFIX.len());
    let (target, suffix) = rest.split_at(20);
    if prefix != EIP1167_PREFIX || suffix != EIP1167_SUFFIX {
        return None;
    }
    let target = Address::from_slice(target);
    if target.is_zero() {
        None
    } else {
        Some(target)
    }
}

#[cfg(test)]
pub(crate) fn minimal_proxy_code(target: Address) -> Vec<u8> {
    let mut code = EIP1167_PREFIX.to_vec();
    code.extend_from_slice(target.as_slice());
    code.extend_from_slice(&EIP1167_SUFFIX);
    code
}
