use std::path::{Path, PathBuf};

use super::types::AppConfig;

const CONFIG_ENV: &str = "LLMC_CONFIG";
const LOCAL_CONFIG: &str = "llmc.toml";

pub fn load_from_str(s: &str) -> anyhow::Result<AppConfig> {
    Ok(toml::from_str::<AppConfig>(s)?)
}

pub fn load_from_path(path: impl AsRef<Path>) -> anyhow::Result<AppConfig> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("read config {} failed: {e}", path.display()))?;
    load_from_str(&s)
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: $LLMC_CONFIG
    let explicit = std::env::var(CONFIG_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from);

    // Priority 2: ./llmc.toml
    let local = Path::new(LOCAL_CONFIG);

    let mut cfg = if let Some(path) = explicit {
        load_from_path(path)?
    } else if local.exists() {
        load_from_path(local)?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut cfg)?;
    Ok(cfg)
}

/// Environment variable overrides (highest priority).
pub fn apply_env_overrides(cfg: &mut AppConfig) -> anyhow::Result<()> {
    if let Ok(v) = std::env::var("LLMC_MAX_CONCURRENCY") {
        let v = v.trim();
        if !v.is_empty() {
            let n: usize = v
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid LLMC_MAX_CONCURRENCY {v:?}: {e}"))?;
            cfg.scheduler.max_concurrency = (n > 0).then_some(n);
        }
    }
    if let Ok(v) = std::env::var("LLMC_LOG_LEVEL") {
        if !v.trim().is_empty() {
            cfg.logging.level = v.trim().to_string();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = load_from_str("").unwrap();
        assert!(cfg.logging.enabled);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.scheduler.max_concurrency, None);
        assert!(cfg.scheduler.record_join);
        assert!(cfg.scheduler.stop_after_join);
        assert!(cfg.capabilities.is_empty());
    }

    #[test]
    fn test_capability_entries() {
        let cfg = load_from_str(
            r#"
            [scheduler]
            max_concurrency = 4
            record_join = false

            [[capabilities]]
            name = "search"
            arguments = ["query"]
            field = "query"

            [[capabilities]]
            name = "plan"
            kind = "template"
            template = "go to {city}"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.scheduler.max_concurrency, Some(4));
        assert!(!cfg.scheduler.record_join);
        assert!(cfg.scheduler.stop_after_join);

        assert_eq!(cfg.capabilities.len(), 2);
        assert_eq!(cfg.capabilities[0].kind, "echo");
        assert_eq!(cfg.capabilities[0].option_str("field"), Some("query"));
        assert_eq!(cfg.capabilities[1].option_str("template"), Some("go to {city}"));
        assert!(cfg.capabilities[1].arguments.is_empty());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(load_from_str("[scheduler\nmax_concurrency = 1").is_err());
        assert!(load_from_str("[scheduler]\nmax_concurrency = \"many\"").is_err());
    }
}
