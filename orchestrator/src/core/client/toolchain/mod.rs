pub mod error;
pub mod snarkjs;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
pub use error::ToolchainError;

/// Outputs of the circuit compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledCircuit {
    /// Constraint system
    pub r1cs: PathBuf,
    /// Witness calculator
    pub wasm: PathBuf,
}

/// External compiler, key ceremony and prover commands.
///
/// Every call maps to one process invocation. A non-zero exit is reported as
/// [`ToolchainError::CommandFailed`] with the tail of the command's stderr.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CircuitToolchain: Send + Sync {
    async fn compile_circuit(&self, source: &Path, out_dir: &Path) -> Result<CompiledCircuit, ToolchainError>;

    /// Initial groth16 key setup against the shared powers-of-tau file
    async fn groth16_setup(&self, r1cs: &Path, zkey_out: &Path) -> Result<(), ToolchainError>;

    /// Finalize a proving key with the fixed public beacon
    async fn apply_beacon(&self, zkey_in: &Path, zkey_out: &Path) -> Result<(), ToolchainError>;

    async fn export_verification_key(&self, zkey: &Path, vkey_out: &Path) -> Result<(), ToolchainError>;

    async fn export_verifier(&self, zkey: &Path, verifier_out: &Path) -> Result<(), ToolchainError>;

    async fn calculate_witness(&self, wasm: &Path, input: &Path, witness_out: &Path) -> Result<(), ToolchainError>;

    async fn generate_proof(
        &self,
        zkey: &Path,
        witness: &Path,
        proof_out: &Path,
        public_out: &Path,
    ) -> Result<(), ToolchainError>;

    /// Compile a Solidity source and return the creation bytecode of its first deployable contract
    async fn compile_contract(&self, source: &Path) -> Result<Vec<u8>, ToolchainError>;
}
