//! Domain layer - types and contracts shared by the decoding engine
//!
//! - `abi`: the generic ABI codec capability and function registry
//! - `router`: router opcodes, functions and the decoded data model

pub mod abi;
pub mod router;
