//! Built-in registry of router and batch functions

use crate::domain::abi::{AbiRegistry, FunctionSignature, ParamSpec, SignatureSource};
use crate::domain::router::RouterFunction;

/// Registry holding every function the engine knows natively
pub fn builtin_registry() -> AbiRegistry {
    let mut registry = AbiRegistry::new();
    for function in RouterFunction::ALL {
        registry.insert(FunctionSignature {
            selector: function.selector(),
            name: function.name().to_string(),
            signature: function.signature(),
            inputs: function
                .arg_types()
                .iter()
                .map(|kind| ParamSpec {
                    name: String::new(),
                    kind: kind.to_string(),
                })
                .collect(),
            source: SignatureSource::Builtin,
        });
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_router_functions() {
        let registry = builtin_registry();
        assert_eq!(registry.len(), RouterFunction::ALL.len());

        let multicall = registry.lookup_hex("0x5ae401dc").unwrap();
        assert_eq!(multicall.name, "multicall");
        assert_eq!(multicall.kinds(), vec!["uint256", "bytes[]"]);
        assert_eq!(multicall.source, SignatureSource::Builtin);
    }
}
