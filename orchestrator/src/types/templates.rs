use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize)]
pub struct TemplateExample {
    #[serde(rename = "templateName")]
    pub template_name: &'static str,
    pub params: Value,
}

/// Entry of the built-in template catalogue
#[derive(Debug, Clone, Serialize)]
pub struct TemplateDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Vec<&'static str>,
    pub example: TemplateExample,
    pub show: bool,
}

fn descriptor(
    name: &'static str,
    description: &'static str,
    parameters: &[&'static str],
    params: Value,
    show: bool,
) -> TemplateDescriptor {
    TemplateDescriptor {
        name,
        description,
        parameters: parameters.to_vec(),
        example: TemplateExample { template_name: name, params },
        show,
    }
}

pub fn template_catalogue() -> Vec<TemplateDescriptor> {
    vec![
        descriptor(
            "rangeCheck",
            "Verifies that a private input falls within a specified range",
            &["min", "max"],
            json!({ "min": 1000, "max": 1500 }),
            true,
        ),
        descriptor(
            "ageVerification",
            "Verifies that a person's age meets certain criteria",
            &["minAge", "maxAge"],
            json!({ "minAge": 18, "maxAge": 100 }),
            true,
        ),
        descriptor(
            "balanceProof",
            "Proves that an account balance meets certain conditions",
            &["minBalance"],
            json!({ "minBalance": 1000 }),
            false,
        ),
        descriptor(
            "commitReveal",
            "Implements a commit-reveal scheme for private data",
            &["commitment"],
            json!({ "commitment": "0x123..." }),
            false,
        ),
        descriptor(
            "hashPreimage",
            "Proves knowledge of a preimage for a given hash",
            &["expectedHash"],
            json!({ "expectedHash": "0xabc..." }),
            false,
        ),
        descriptor(
            "merkleTreeMembership",
            "Proves membership in a Merkle tree",
            &["treeDepth", "root"],
            json!({ "treeDepth": 8, "root": "0x456..." }),
            false,
        ),
        descriptor(
            "passwordChecker",
            "Verifies a password without revealing it",
            &["passwordHash"],
            json!({ "passwordHash": "0x789..." }),
            true,
        ),
        descriptor(
            "socialSecurityProof",
            "Proves ownership of a social security number",
            &["ssnHash"],
            json!({ "ssnHash": "0xdef..." }),
            false,
        ),
        descriptor("sudokuVerifier", "Verifies a valid Sudoku solution", &["gridSize"], json!({ "gridSize": 9 }), false),
        descriptor(
            "votingBallot",
            "Enables private voting with verifiable results",
            &["candidateCount"],
            json!({ "candidateCount": 3 }),
            false,
        ),
    ]
}
