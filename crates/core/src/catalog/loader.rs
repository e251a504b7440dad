use std::{fs, path::Path};

use anyhow::{Context, Result};
use tracing::info;

use super::{FlagRecord, RoundCatalog};
use crate::config::AppConfig;

const BUNDLED_CATALOG: &str = include_str!("../../data/flags.json");

impl RoundCatalog {
    /// Catalog shipped with the crate.
    pub fn bundled() -> Result<Self> {
        parse_catalog(BUNDLED_CATALOG).context("bundled flag catalog is invalid")
    }

    /// Load a JSON array of flag records from `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        parse_catalog(&content).with_context(|| format!("failed to load catalog {}", path.display()))
    }

    /// Resolve the catalog named by `config`, falling back to the bundled one.
    pub fn load(config: &AppConfig) -> Result<Self> {
        let catalog = match config.catalog_path.as_ref() {
            Some(path) => Self::from_path(path)?,
            None => Self::bundled()?,
        };
        info!(rounds = catalog.len(), "Flag catalog loaded");
        Ok(catalog)
    }
}

fn parse_catalog(content: &str) -> Result<RoundCatalog> {
    let records: Vec<FlagRecord> =
        serde_json::from_str(content).context("failed to parse flag records")?;
    Ok(RoundCatalog::new(records)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogError;
    use tempfile::tempdir;

    #[test]
    fn bundled_catalog_is_valid() -> Result<()> {
        let catalog = RoundCatalog::bundled()?;
        assert_eq!(catalog.len(), 30);
        let usa = catalog.find("usa").expect("usa is bundled");
        assert_eq!(usa.country, "United States");
        Ok(())
    }

    #[test]
    fn loads_user_catalog_from_config() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("flags.json");
        fs::write(
            &path,
            r#"[{"id":"chad","country":"Chad","flag":"chad.png","options":["Romania","Chad","Andorra","Moldova"]}]"#,
        )?;

        let config = AppConfig {
            catalog_path: Some(path),
            ..AppConfig::default()
        };
        let catalog = RoundCatalog::load(&config)?;
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.records()[0].options[1], "Chad");
        Ok(())
    }

    #[test]
    fn empty_user_catalog_fails_fast() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("flags.json");
        fs::write(&path, "[]")?;

        let err = RoundCatalog::from_path(&path).unwrap_err();
        assert_eq!(err.downcast_ref::<CatalogError>(), Some(&CatalogError::Empty));
        Ok(())
    }
}
