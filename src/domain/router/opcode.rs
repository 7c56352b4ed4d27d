//! Router opcode table
//!
//! One byte per command, 32 slots. The table is a protocol contract with
//! the deployed router and must track its published command set: an
//! opcode missing here fails loudly instead of being skipped.

use serde::Serialize;

/// Number of opcode slots defined by the router
pub const OPCODE_SLOTS: usize = 0x20;

/// V3 exact-input swap, carries a packed multihop path
pub const V3_SWAP_EXACT_IN: u8 = 0x00;
/// V3 exact-output swap, carries a packed multihop path
pub const V3_SWAP_EXACT_OUT: u8 = 0x01;
/// Position of the packed path among the V3 swap arguments
pub const PATH_ARG_INDEX: usize = 3;

/// Symbolic name and argument shape of one router command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OpcodeEntry {
    pub name: &'static str,
    pub arg_types: &'static [&'static str],
}

/// Result of looking up an opcode byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeLookup {
    /// The slot holds a command definition
    Found(&'static OpcodeEntry),
    /// The slot exists but is kept free for future router versions
    Reserved,
    /// The byte is outside the table
    NotInTable,
}

const fn command(name: &'static str, arg_types: &'static [&'static str]) -> Option<OpcodeEntry> {
    Some(OpcodeEntry { name, arg_types })
}

static OPCODES: [Option<OpcodeEntry>; OPCODE_SLOTS] = [
    // 0x00
    command("V3_SWAP_EXACT_IN", &["address", "uint256", "uint256", "bytes", "bool"]),
    command("V3_SWAP_EXACT_OUT", &["address", "uint256", "uint256", "bytes", "bool"]),
    command("PERMIT2_TRANSFER_FROM", &["address", "address", "uint256"]),
    command("PERMIT2_PERMIT_BATCH", &["bytes", "bytes"]),
    command("SWEEP", &["address", "address", "uint256"]),
    command("TRANSFER", &["address", "address", "uint256"]),
    command("PAY_PORTION", &["address", "address", "uint256"]),
    None,
    // 0x08
    command("V2_SWAP_EXACT_IN", &["address", "uint256", "uint256", "address[]", "bool"]),
    command("V2_SWAP_EXACT_OUT", &["address", "uint256", "uint256", "address[]", "bool"]),
    command(
        "PERMIT2_PERMIT",
        &["((address,uint160,uint48,uint48),address,uint256)", "bytes"],
    ),
    command("WRAP_ETH", &["address", "uint256"]),
    command("UNWRAP_WETH", &["address", "uint256"]),
    command("PERMIT2_TRANSFER_FROM_BATCH", &["(address,address,uint160,address)[]"]),
    None,
    None,
    // 0x10
    command("SEAPORT", &["uint256", "bytes"]),
    command("LOOKS_RARE_721", &["uint256", "bytes", "address", "address", "uint256"]),
    command("NFTX", &["uint256", "bytes"]),
    command("CRYPTOPUNKS", &["uint256", "address", "uint256"]),
    command(
        "LOOKS_RARE_1155",
        &["uint256", "bytes", "address", "address", "uint256", "uint256"],
    ),
    command("OWNER_CHECK_721", &["address", "address", "uint256", "uint256"]),
    command("OWNER_CHECK_1155", &["address", "address", "uint256", "uint256"]),
    command("SWEEP_ERC721", &["address", "address", "uint256"]),
    // 0x18
    command("X2Y2_721", &["uint256", "bytes", "address", "address", "uint256"]),
    command("SUDOSWAP", &["uint256", "bytes"]),
    command("NFT20", &["uint256", "bytes"]),
    command(
        "X2Y2_1155",
        &["uint256", "bytes", "address", "address", "uint256", "uint256"],
    ),
    command("FOUNDATION", &["uint256", "bytes", "address", "address", "uint256"]),
    command("SWEEP_ERC1155", &["address", "address", "uint256", "uint256"]),
    None,
    None,
];

/// Look up an opcode byte
pub fn lookup(opcode: u8) -> OpcodeLookup {
    match OPCODES.get(usize::from(opcode)) {
        Some(Some(entry)) => OpcodeLookup::Found(entry),
        Some(None) => OpcodeLookup::Reserved,
        None => OpcodeLookup::NotInTable,
    }
}

/// Whether the opcode's arguments carry a packed V3 path
pub fn is_path_bearing(opcode: u8) -> bool {
    matches!(opcode, V3_SWAP_EXACT_IN | V3_SWAP_EXACT_OUT)
}

/// Every slot in table order, reserved slots included
pub fn slots() -> impl Iterator<Item = (u8, Option<&'static OpcodeEntry>)> {
    (0u8..).zip(OPCODES.iter().map(Option::as_ref))
}
