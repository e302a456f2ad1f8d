//! Wavelet VM - Sandboxed, gas-metered WASM execution for contract calls.
//!
//! This crate provides:
//! - A runtime factory producing one isolated environment per call
//! - Gas metering (one unit per wasm operator plus host function costs)
//! - The host function table contracts import from `env`
//! - A read-only cache of compiled modules

pub mod cache;
pub mod error;
pub mod gas_metering;
pub mod host;
pub mod runtime;

pub use cache::ModuleCache;
pub use error::VmFault;
pub use gas_metering::GasSchedule;
pub use host::{
    EmittedTransaction, HostCallRecord, HostError, HostFunction, HostState, SignaturePolicy,
};
pub use runtime::{Environment, ExecutionResult, VmConfig, VmRuntime};

/// Size of one WASM linear memory page
pub const WASM_PAGE_SIZE: usize = 64 * 1024;

/// Default linear memory ceiling per contract (128 pages, 8 MB)
pub const DEFAULT_MEMORY_PAGES: u32 = 128;

/// Maximum contract code size (4 MB)
pub const MAX_CODE_SIZE: usize = 4 * 1024 * 1024;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vm_constants() {
        assert_eq!(DEFAULT_MEMORY_PAGES as usize * WASM_PAGE_SIZE, 8 * 1024 * 1024);
    }
}
