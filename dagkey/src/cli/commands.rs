use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::dag::{
    DynamicStepHandle, NodePath, StaticStepHandle, StepHandle, UnresolvedStepHandle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Text
    }
}

/// What the CLI prints for one step key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyReport {
    pub key: String,
    pub kind: String,
    pub node_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping_key: Option<String>,
}

impl KeyReport {
    pub fn from_handle(handle: &StepHandle) -> Self {
        Self {
            key: handle.to_key(),
            kind: handle.kind().to_string(),
            node_path: handle.node_path().to_string(),
            mapping_key: handle.mapping_key().map(str::to_string),
        }
    }

    fn as_line(&self) -> String {
        match &self.mapping_key {
            Some(mapping_key) => format!(
                "{}  kind={} node_path={} mapping_key={}",
                self.key, self.kind, self.node_path, mapping_key
            ),
            None => format!("{}  kind={} node_path={}", self.key, self.kind, self.node_path),
        }
    }
}

impl From<StepHandle> for KeyReport {
    fn from(handle: StepHandle) -> Self {
        Self::from_handle(&handle)
    }
}

/// Decode stored keys, failing on the first malformed one
pub fn decode_keys(keys: &[String]) -> Result<Vec<KeyReport>> {
    keys.iter()
        .map(|key| {
            StepHandle::from_key(key)
                .map(KeyReport::from)
                .with_context(|| format!("Failed to decode step key {:?}", key))
        })
        .collect()
}

/// Build the key for a node path in the requested form
pub fn encode_key(path: &str, mapping_key: Option<&str>, unresolved: bool) -> Result<KeyReport> {
    let node_path = NodePath::parse(path)
        .with_context(|| format!("Invalid node path {:?}", path))?;

    let handle: StepHandle = match (mapping_key, unresolved) {
        (Some(_), true) => bail!("A step key cannot be both unresolved and have a mapping key"),
        (Some(mapping_key), false) => DynamicStepHandle::try_new(node_path, mapping_key)?.into(),
        (None, true) => UnresolvedStepHandle::new(node_path).into(),
        (None, false) => StaticStepHandle::new(node_path).into(),
    };

    Ok(KeyReport::from(handle))
}

/// Resolve an unresolved key once per distinct mapping key
pub fn resolve_key(unresolved_key: &str, mapping_keys: &[String]) -> Result<Vec<KeyReport>> {
    let unresolved = UnresolvedStepHandle::from_key(unresolved_key)
        .with_context(|| format!("Cannot resolve {:?}", unresolved_key))?;

    for mapping_key in mapping_keys {
        DynamicStepHandle::try_new(unresolved.node_path().clone(), mapping_key.as_str())?;
    }

    Ok(unresolved
        .resolve_all(mapping_keys.iter().map(String::as_str))
        .into_iter()
        .map(|h| KeyReport::from(StepHandle::from(h)))
        .collect())
}

/// The unresolved key a dynamic key was resolved from
pub fn unresolve_key(dynamic_key: &str) -> Result<KeyReport> {
    let dynamic = DynamicStepHandle::from_key(dynamic_key)
        .with_context(|| format!("Cannot unresolve {:?}", dynamic_key))?;
    Ok(KeyReport::from(StepHandle::from(dynamic.unresolved_form())))
}

pub fn render(reports: &[KeyReport], format: OutputFormat) -> Result<String> {
    let output = match format {
        OutputFormat::Text => reports
            .iter()
            .map(KeyReport::as_line)
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => serde_json::to_string_pretty(reports)
            .context("Failed to serialize reports as JSON")?,
        OutputFormat::Yaml => serde_yaml::to_string(reports)
            .context("Failed to serialize reports as YAML")?,
    };
    Ok(output)
}
