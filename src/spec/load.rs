use super::types::Contract;
use anyhow::Context;
use std::path::Path;

/// Load a contract document from disk.
///
/// `.yaml`/`.yml` files are parsed as YAML, anything else as JSON. The
/// document is only deserialized; its correctness as an API description is
/// assumed.
pub fn load_contract(file_path: impl AsRef<Path>) -> anyhow::Result<Contract> {
    let path = file_path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read contract {}", path.display()))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let contract: Contract = if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse YAML contract {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON contract {}", path.display()))?
    };

    tracing::info!(
        path = %path.display(),
        paths = contract.paths.len(),
        operations = contract.operations().count(),
        "Contract loaded"
    );
    Ok(contract)
}
