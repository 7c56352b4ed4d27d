//! Router and batch functions recognised by selector

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::domain::abi::selector_of;

/// How the engine treats a decoded function call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionRole {
    /// Router envelope: packed opcodes plus one input blob per opcode
    Execute,
    /// Batch wrapper: the argument at `calls_arg` is a list of sub-calls
    Batch { calls_arg: usize },
    /// Plain call decoded by its declared types
    Call,
}

/// Functions the engine knows natively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouterFunction {
    Execute,
    ExecuteWithDeadline,
    Multicall,
    MulticallWithDeadline,
    MulticallWithPreviousBlockhash,
    ExactInputSingle,
    ExactInputSingleWithDeadline,
    ExactOutputSingle,
    ExactOutputSingleWithDeadline,
    ExactInput,
    ExactInputWithDeadline,
    ExactOutput,
    ExactOutputWithDeadline,
    SelfPermit,
    RefundEth,
    UnwrapWeth9,
    UnwrapWeth9WithRecipient,
    SweepToken,
    SweepTokenWithRecipient,
}

static BY_SELECTOR: LazyLock<HashMap<[u8; 4], RouterFunction>> = LazyLock::new(|| {
    RouterFunction::ALL
        .iter()
        .map(|function| (function.selector(), *function))
        .collect()
});

impl RouterFunction {
    pub const ALL: [RouterFunction; 19] = [
        RouterFunction::Execute,
        RouterFunction::ExecuteWithDeadline,
        RouterFunction::Multicall,
        RouterFunction::MulticallWithDeadline,
        RouterFunction::MulticallWithPreviousBlockhash,
        RouterFunction::ExactInputSingle,
        RouterFunction::ExactInputSingleWithDeadline,
        RouterFunction::ExactOutputSingle,
        RouterFunction::ExactOutputSingleWithDeadline,
        RouterFunction::ExactInput,
        RouterFunction::ExactInputWithDeadline,
        RouterFunction::ExactOutput,
        RouterFunction::ExactOutputWithDeadline,
        RouterFunction::SelfPermit,
        RouterFunction::RefundEth,
        RouterFunction::UnwrapWeth9,
        RouterFunction::UnwrapWeth9WithRecipient,
        RouterFunction::SweepToken,
        RouterFunction::SweepTokenWithRecipient,
    ];

    /// Solidity function name
    pub fn name(self) -> &'static str {
        match self {
            RouterFunction::Execute | RouterFunction::ExecuteWithDeadline => "execute",
            RouterFunction::Multicall
            | RouterFunction::MulticallWithDeadline
            | RouterFunction::MulticallWithPreviousBlockhash => "multicall",
            RouterFunction::ExactInputSingle | RouterFunction::ExactInputSingleWithDeadline => {
                "exactInputSingle"
            }
            RouterFunction::ExactOutputSingle | RouterFunction::ExactOutputSingleWithDeadline => {
                "exactOutputSingle"
            }
            RouterFunction::ExactInput | RouterFunction::ExactInputWithDeadline => "exactInput",
            RouterFunction::ExactOutput | RouterFunction::ExactOutputWithDeadline => "exactOutput",
            RouterFunction::SelfPermit => "selfPermit",
            RouterFunction::RefundEth => "refundETH",
            RouterFunction::UnwrapWeth9 | RouterFunction::UnwrapWeth9WithRecipient => "unwrapWETH9",
            RouterFunction::SweepToken | RouterFunction::SweepTokenWithRecipient => "sweepToken",
        }
    }

    /// Declared argument types in order
    pub fn arg_types(self) -> &'static [&'static str] {
        match self {
            RouterFunction::Execute => &["bytes", "bytes[]"],
            RouterFunction::ExecuteWithDeadline => &["bytes", "bytes[]", "uint256"],
            RouterFunction::Multicall => &["bytes[]"],
            RouterFunction::MulticallWithDeadline => &["uint256", "bytes[]"],
            RouterFunction::MulticallWithPreviousBlockhash => &["bytes32", "bytes[]"],
            RouterFunction::ExactInputSingle | RouterFunction::ExactOutputSingle => {
                &["(address,address,uint24,address,uint256,uint256,uint160)"]
            }
            RouterFunction::ExactInputSingleWithDeadline
            | RouterFunction::ExactOutputSingleWithDeadline => {
                &["(address,address,uint24,address,uint256,uint256,uint256,uint160)"]
            }
            RouterFunction::ExactInput | RouterFunction::ExactOutput => {
                &["(bytes,address,uint256,uint256)"]
            }
            RouterFunction::ExactInputWithDeadline | RouterFunction::ExactOutputWithDeadline => {
                &["(bytes,address,uint256,uint256,uint256)"]
            }
            RouterFunction::SelfPermit => {
                &["address", "uint256", "uint256", "uint8", "bytes32", "bytes32"]
            }
            RouterFunction::RefundEth => &[],
            RouterFunction::UnwrapWeth9 => &["uint256"],
            RouterFunction::UnwrapWeth9WithRecipient => &["uint256", "address"],
            RouterFunction::SweepToken => &["address", "uint256"],
            RouterFunction::SweepTokenWithRecipient => &["address", "uint256", "address"],
        }
    }

    pub fn role(self) -> FunctionRole {
        match self {
            RouterFunction::Execute | RouterFunction::ExecuteWithDeadline => FunctionRole::Execute,
            RouterFunction::Multicall => FunctionRole::Batch { calls_arg: 0 },
            RouterFunction::MulticallWithDeadline
            | RouterFunction::MulticallWithPreviousBlockhash => FunctionRole::Batch { calls_arg: 1 },
            _ => FunctionRole::Call,
        }
    }

    /// Canonical signature, e.g. `execute(bytes,bytes[],uint256)`
    pub fn signature(self) -> String {
        format!("{}({})", self.name(), self.arg_types().join(","))
    }

    pub fn selector(self) -> [u8; 4] {
        selector_of(&self.signature())
    }

    pub fn from_selector(selector: [u8; 4]) -> Option<Self> {
        BY_SELECTOR.get(&selector).copied()
    }
}
