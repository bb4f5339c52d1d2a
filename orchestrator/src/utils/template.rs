use std::path::{Path, PathBuf};

use regex::Regex;

use crate::types::circuit::CircuitParams;

pub const TEMPLATE_EXTENSION: &str = "template.circom";

/// Template names become file names, so only a conservative character set is accepted.
pub fn is_valid_template_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

pub fn template_path(templates_dir: &Path, name: &str) -> PathBuf {
    templates_dir.join(format!("{name}.{TEMPLATE_EXTENSION}"))
}

/// Replace every `{{ key }}` placeholder (whitespace tolerant) with the string form of the matching param.
/// Placeholders without a param are left in place.
pub fn render_template(source: &str, params: &CircuitParams) -> Result<String, regex::Error> {
    let mut rendered = source.to_string();
    for (key, value) in params {
        let placeholder = Regex::new(&format!(r"\{{\{{\s*{}\s*\}}\}}", regex::escape(key)))?;
        let replacement = value.to_string();
        rendered = placeholder.replace_all(&rendered, regex::NoExpand(&replacement)).into_owned();
    }
    Ok(rendered)
}
