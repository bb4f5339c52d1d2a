/// Fixed beacon used to finalize every proving key, so finalization is reproducible
pub const KEY_BEACON_HASH: &str = "0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
pub const KEY_BEACON_ITERATIONS_EXP: &str = "10";
pub const KEY_BEACON_NAME: &str = "Final Beacon";

/// Initial (pre-beacon) proving key file name inside a scratch workspace
pub const INITIAL_ZKEY_FILE: &str = "circuit_0000.zkey";

pub const PROOF_INPUT_FILE: &str = "input.json";
pub const WITNESS_FILE: &str = "witness.wtns";
pub const PROOF_FILE: &str = "proof.json";
pub const PUBLIC_SIGNALS_FILE: &str = "public.json";
pub const LEGACY_VERIFIER_FILE: &str = "Verifier.sol";

pub const DEFAULT_DEPLOYMENT_FAILURE_MESSAGE: &str = "Deployment failed";
pub const DEFAULT_WEBHOOK_FAILURE_MESSAGE: &str = "Deployment failed (webhook notification)";
