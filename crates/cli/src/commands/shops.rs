//! `bazaar shops check`: validate tenant definitions before deploying them.

use std::path::PathBuf;

use bazaar_core::shop::ShopRegistry;
use bazaar_storefront::config::{ConfigError, load_shops};

/// Shops file used when none is given.
fn default_path() -> PathBuf {
    dotenvy::dotenv().ok();
    std::env::var("STOREFRONT_SHOPS_FILE")
        .map_or_else(|_| PathBuf::from("shops.yaml"), PathBuf::from)
}

/// One summary line per shop, default first.
fn summary(registry: &ShopRegistry) -> Vec<String> {
    let default = &registry.default_shop().slug;
    let mut lines: Vec<String> = registry
        .shops()
        .iter()
        .map(|shop| {
            let hosts = if shop.hosts.is_empty() {
                "(no hosts)".to_string()
            } else {
                shop.hosts.join(", ")
            };
            let marker = if &shop.slug == default { " [default]" } else { "" };
            format!("{:<16} id={:<6} {hosts}{marker}", shop.slug, shop.id)
        })
        .collect();
    lines.sort_by_key(|line| !line.ends_with("[default]"));
    lines
}

/// Load, validate and print the shops file.
///
/// # Errors
///
/// Returns the parse or validation error for the file.
pub fn check(file: Option<PathBuf>) -> Result<(), ConfigError> {
    let path = file.unwrap_or_else(default_path);
    let registry = load_shops(&path)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}: {} shop(s) OK", path.display(), registry.shops().len());
        for line in summary(&registry) {
            println!("  {line}");
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Path;

    use super::*;

    fn sample() -> ShopRegistry {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../shops.yaml");
        load_shops(&path).unwrap()
    }

    #[test]
    fn test_summary_lists_default_first() {
        let lines = summary(&sample());
        assert!(lines[0].starts_with("acme"));
        assert!(lines[0].ends_with("[default]"));
        assert!(lines[0].contains("localhost, acme.localhost"));
        assert!(lines.iter().any(|l| l.starts_with("nordic")));
    }

    #[test]
    fn test_missing_file_fails() {
        assert!(check(Some(PathBuf::from("does-not-exist.yaml"))).is_err());
    }
}
