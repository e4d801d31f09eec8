use std::sync::Arc;

use anyhow::{anyhow, bail, Result};

use llmc_core::api::{
    AppConfig, Capability, CapabilityConfig, InMemoryRegistry, JOIN_CAPABILITY,
};

use crate::capabilities::{EchoCapability, TemplateCapability};

pub fn build_capability(cfg: &CapabilityConfig) -> Result<Arc<dyn Capability>> {
    let name = cfg.name.trim();
    if name.is_empty() {
        bail!("capability name must not be empty");
    }
    if name == JOIN_CAPABILITY {
        bail!("`{JOIN_CAPABILITY}` is reserved for the terminal plan step");
    }

    match cfg.kind.as_str() {
        "echo" => {
            let mut cap = EchoCapability::new(name, cfg.arguments.clone())
                .with_description(cfg.description.clone());
            if let Some(field) = cfg.option_str("field") {
                cap = cap.with_field(field);
            }
            Ok(Arc::new(cap))
        }
        "template" => {
            let template = cfg
                .option_str("template")
                .ok_or_else(|| anyhow!("capability `{name}`: template kind requires `template`"))?;
            let cap = TemplateCapability::new(name, template, cfg.arguments.clone())
                .map_err(|e| anyhow!("capability `{name}`: {e}"))?
                .with_description(cfg.description.clone());
            Ok(Arc::new(cap))
        }
        other => bail!("capability `{name}`: unknown kind `{other}`"),
    }
}

/// Builds a registry from the `[[capabilities]]` entries of `cfg`.
pub fn build_registry(cfg: &AppConfig) -> Result<InMemoryRegistry> {
    let mut registry = InMemoryRegistry::new();
    for entry in &cfg.capabilities {
        let capability = build_capability(entry)?;
        if registry.register(capability).is_some() {
            bail!("capability `{}` is defined more than once", entry.name);
        }
        tracing::debug!(capability = %entry.name, kind = %entry.kind, "registered capability");
    }
    Ok(registry)
}
