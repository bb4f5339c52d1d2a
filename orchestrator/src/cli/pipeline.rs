use std::path::PathBuf;

use clap::Args;

/// Paths and commands of the circuit toolchain.
#[derive(Debug, Clone, Args)]
pub struct PipelineCliArgs {
    /// Shared powers-of-tau ceremony file used for key setup.
    #[arg(env = "ZKFLOW_PTAU_PATH", long, default_value = "tau/pot14_final.ptau")]
    pub ptau_path: PathBuf,

    /// Directory holding `<name>.template.circom` files.
    #[arg(env = "ZKFLOW_TEMPLATES_DIR", long, default_value = "templates")]
    pub templates_dir: PathBuf,

    /// Directory where per-job scratch workspaces are created.
    #[arg(env = "ZKFLOW_PROCESSING_DIR", long, default_value = "processing")]
    pub processing_dir: PathBuf,

    /// Circuit compiler command.
    #[arg(env = "ZKFLOW_CIRCOM_COMMAND", long, default_value = "circom")]
    pub circom_command: String,

    /// Include path handed to the compiler with `-l`.
    #[arg(env = "ZKFLOW_CIRCOM_LIBRARY_PATH", long, default_value = "node_modules")]
    pub circom_library_path: PathBuf,

    /// Key ceremony and prover command, may carry leading arguments.
    #[arg(env = "ZKFLOW_SNARKJS_COMMAND", long, default_value = "npx snarkjs")]
    pub snarkjs_command: String,

    /// Solidity compiler used by the legacy deploy path.
    #[arg(env = "ZKFLOW_SOLC_COMMAND", long, default_value = "solc")]
    pub solc_command: String,
}
