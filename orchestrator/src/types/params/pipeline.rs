use std::path::PathBuf;

use crate::cli::pipeline::PipelineCliArgs;

/// Locations and commands used by the key generation and proving pipelines.
#[derive(Debug, Clone)]
pub struct PipelineParams {
    pub ptau_path: PathBuf,
    pub templates_dir: PathBuf,
    pub processing_dir: PathBuf,
    pub circom_command: String,
    pub circom_library_path: PathBuf,
    pub snarkjs_command: String,
    pub solc_command: String,
}

impl From<PipelineCliArgs> for PipelineParams {
    fn from(args: PipelineCliArgs) -> Self {
        Self {
            ptau_path: args.ptau_path,
            templates_dir: args.templates_dir,
            processing_dir: args.processing_dir,
            circom_command: args.circom_command,
            circom_library_path: args.circom_library_path,
            snarkjs_command: args.snarkjs_command,
            solc_command: args.solc_command,
        }
    }
}
