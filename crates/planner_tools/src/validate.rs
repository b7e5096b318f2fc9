//! Catalog loading and validation.

use std::path::Path;

use planner_core::catalog::Catalog;
use planner_core::error::PlannerError;

use crate::error::{Result, ToolError};

/// Load every `*.ron` race file in a directory, in file name order.
///
/// # Errors
///
/// Returns an error if a file cannot be read or parsed, or if the catalog
/// fails validation.
pub fn load_data_directory(path: &Path) -> Result<Catalog> {
    let io_error = |source| ToolError::Io {
        path: path.display().to_string(),
        source,
    };
    let mut files: Vec<_> = std::fs::read_dir(path)
        .map_err(io_error)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "ron"))
        .collect();
    files.sort();

    let mut sources = Vec::with_capacity(files.len());
    for file in &files {
        let source = std::fs::read_to_string(file).map_err(|source| ToolError::Io {
            path: file.display().to_string(),
            source,
        })?;
        sources.push((file.display().to_string(), source));
    }
    tracing::debug!(files = sources.len(), "Loading catalog directory");

    Ok(Catalog::from_ron_sources(
        sources.iter().map(|(p, s)| (p.as_str(), s.as_str())),
    )?)
}

/// The built-in catalog, or the one in `path` when given.
pub fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        Some(path) => load_data_directory(path),
        None => Ok(Catalog::builtin()?),
    }
}

/// Validate a loaded catalog.
///
/// # Errors
///
/// Returns every validation problem at once.
pub fn validate_catalog(catalog: &Catalog) -> Result<()> {
    let errors = catalog.validate();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(PlannerError::InvalidCatalog(errors).into())
    }
}

/// Validate all RON race files in a directory.
///
/// # Errors
///
/// Returns an error if any data file fails to load or validate.
pub fn validate_data_directory(path: &Path) -> Result<()> {
    let catalog = load_data_directory(path)?;
    validate_catalog(&catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_validates() {
        let catalog = load_catalog(None).unwrap();
        assert!(validate_catalog(&catalog).is_ok());
    }

    #[test]
    fn test_shipped_data_directory_validates() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../planner_core/data");
        assert!(validate_data_directory(&dir).is_ok());
    }

    #[test]
    fn test_missing_directory() {
        let err = validate_data_directory(Path::new("/nonexistent/catalog")).unwrap_err();
        assert!(matches!(err, ToolError::Io { .. }));
    }
}
