use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::core::client::toolchain::{CircuitToolchain, CompiledCircuit, ToolchainError};
use crate::types::constant::{KEY_BEACON_HASH, KEY_BEACON_ITERATIONS_EXP, KEY_BEACON_NAME};
use crate::types::params::pipeline::PipelineParams;

const STDERR_TAIL_LINES: usize = 20;

/// A program and the arguments it always starts with, e.g. `npx snarkjs`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CommandLine {
    program: String,
    leading_args: Vec<String>,
}

impl CommandLine {
    fn parse(command: &str) -> Result<Self, ToolchainError> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| ToolchainError::InvalidCommand(command.to_string()))?;
        Ok(Self { program, leading_args: parts.collect() })
    }
}

/// circom + snarkjs + solc, driven through `tokio::process`.
#[derive(Debug, Clone)]
pub struct SnarkjsToolchain {
    circom: CommandLine,
    circom_library_path: PathBuf,
    snarkjs: CommandLine,
    solc: CommandLine,
    ptau_path: PathBuf,
}

impl SnarkjsToolchain {
    pub fn new(params: &PipelineParams) -> Result<Self, ToolchainError> {
        Ok(Self {
            circom: CommandLine::parse(&params.circom_command)?,
            circom_library_path: params.circom_library_path.clone(),
            snarkjs: CommandLine::parse(&params.snarkjs_command)?,
            solc: CommandLine::parse(&params.solc_command)?,
            ptau_path: params.ptau_path.clone(),
        })
    }

    async fn run(&self, command: &CommandLine, args: Vec<OsString>) -> Result<Vec<u8>, ToolchainError> {
        let command_line = std::iter::once(command.program.clone())
            .chain(command.leading_args.iter().cloned())
            .chain(args.iter().map(|arg| arg.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ");
        debug!(command = %command_line, "Running external tool");

        let output = Command::new(&command.program)
            .args(&command.leading_args)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ToolchainError::SpawnFailed { command: command_line.clone(), source })?;

        if !output.status.success() {
            return Err(ToolchainError::CommandFailed {
                command: command_line,
                code: output.status.code().unwrap_or(-1),
                stderr: stderr_tail(&output.stderr),
            });
        }
        Ok(output.stdout)
    }

    async fn snarkjs(&self, args: &[&OsStr]) -> Result<(), ToolchainError> {
        self.run(&self.snarkjs, args.iter().map(|arg| arg.to_os_string()).collect()).await?;
        Ok(())
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n")
}

fn ensure_exists(path: &Path) -> Result<(), ToolchainError> {
    if path.exists() {
        Ok(())
    } else {
        Err(ToolchainError::MissingOutput { path: path.to_path_buf() })
    }
}

/// Creation bytecode of the first contract with a non-empty `bin` in `solc --combined-json` output.
fn first_deployable_bytecode(output: &[u8]) -> Result<Vec<u8>, ToolchainError> {
    let json: Value = serde_json::from_slice(output).map_err(|e| ToolchainError::InvalidCompilerOutput(e.to_string()))?;
    let contracts = json
        .get("contracts")
        .and_then(Value::as_object)
        .ok_or_else(|| ToolchainError::InvalidCompilerOutput("missing contracts section".to_string()))?;

    let bin = contracts
        .values()
        .filter_map(|contract| contract.get("bin").and_then(Value::as_str))
        .find(|bin| !bin.is_empty())
        .ok_or_else(|| ToolchainError::InvalidCompilerOutput("no contract with bytecode".to_string()))?;

    hex::decode(bin.trim_start_matches("0x")).map_err(|e| ToolchainError::InvalidCompilerOutput(e.to_string()))
}

#[async_trait]
impl CircuitToolchain for SnarkjsToolchain {
    #[instrument(skip(self), fields(source = %source.display()))]
    async fn compile_circuit(&self, source: &Path, out_dir: &Path) -> Result<CompiledCircuit, ToolchainError> {
        let base = source
            .file_stem()
            .and_then(OsStr::to_str)
            .ok_or_else(|| ToolchainError::MissingOutput { path: source.to_path_buf() })?
            .to_string();

        let args: Vec<OsString> = vec![
            source.into(),
            "--r1cs".into(),
            "--wasm".into(),
            "--sym".into(),
            "--output".into(),
            out_dir.into(),
            "-l".into(),
            self.circom_library_path.clone().into(),
        ];
        self.run(&self.circom, args).await?;

        let compiled = CompiledCircuit {
            r1cs: out_dir.join(format!("{base}.r1cs")),
            wasm: out_dir.join(format!("{base}_js")).join(format!("{base}.wasm")),
        };
        ensure_exists(&compiled.r1cs)?;
        ensure_exists(&compiled.wasm)?;
        Ok(compiled)
    }

    async fn groth16_setup(&self, r1cs: &Path, zkey_out: &Path) -> Result<(), ToolchainError> {
        self.snarkjs(&[
            OsStr::new("groth16"),
            OsStr::new("setup"),
            r1cs.as_os_str(),
            self.ptau_path.as_os_str(),
            zkey_out.as_os_str(),
        ])
        .await
    }

    async fn apply_beacon(&self, zkey_in: &Path, zkey_out: &Path) -> Result<(), ToolchainError> {
        let name = format!("-n={}", KEY_BEACON_NAME);
        self.snarkjs(&[
            OsStr::new("zkey"),
            OsStr::new("beacon"),
            zkey_in.as_os_str(),
            zkey_out.as_os_str(),
            OsStr::new(KEY_BEACON_HASH),
            OsStr::new(KEY_BEACON_ITERATIONS_EXP),
            OsStr::new(&name),
        ])
        .await
    }

    async fn export_verification_key(&self, zkey: &Path, vkey_out: &Path) -> Result<(), ToolchainError> {
        self.snarkjs(&[
            OsStr::new("zkey"),
            OsStr::new("export"),
            OsStr::new("verificationkey"),
            zkey.as_os_str(),
            vkey_out.as_os_str(),
        ])
        .await
    }

    async fn export_verifier(&self, zkey: &Path, verifier_out: &Path) -> Result<(), ToolchainError> {
        self.snarkjs(&[
            OsStr::new("zkey"),
            OsStr::new("export"),
            OsStr::new("solidityverifier"),
            zkey.as_os_str(),
            verifier_out.as_os_str(),
        ])
        .await
    }

    async fn calculate_witness(&self, wasm: &Path, input: &Path, witness_out: &Path) -> Result<(), ToolchainError> {
        self.snarkjs(&[
            OsStr::new("wtns"),
            OsStr::new("calculate"),
            wasm.as_os_str(),
            input.as_os_str(),
            witness_out.as_os_str(),
        ])
        .await
    }

    async fn generate_proof(
        &self,
        zkey: &Path,
        witness: &Path,
        proof_out: &Path,
        public_out: &Path,
    ) -> Result<(), ToolchainError> {
        self.snarkjs(&[
            OsStr::new("groth16"),
            OsStr::new("prove"),
            zkey.as_os_str(),
            witness.as_os_str(),
            proof_out.as_os_str(),
            public_out.as_os_str(),
        ])
        .await
    }

    #[instrument(skip(self), fields(source = %source.display()))]
    async fn compile_contract(&self, source: &Path) -> Result<Vec<u8>, ToolchainError> {
        let args: Vec<OsString> = vec![
            "--optimize".into(),
            "--optimize-runs".into(),
            "200".into(),
            "--combined-json".into(),
            "abi,bin".into(),
            source.into(),
        ];
        let stdout = self.run(&self.solc, args).await?;
        first_deployable_bytecode(&stdout)
    }
}
