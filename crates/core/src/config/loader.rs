use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix of environment variable overrides, e.g. `EBOOKFILL_CONVERSION__WORKERS=4`.
pub const ENV_PREFIX: &str = "EBOOKFILL_";

fn env() -> Env {
    Env::prefixed(ENV_PREFIX).split("__")
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(env())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from defaults and environment variables only
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    Figment::new()
        .merge(env())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[library]
library = "/books"

[conversion]
format = ".MOBI"
workers = 2
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.library.library, Some(PathBuf::from("/books")));
        assert_eq!(config.conversion.format.unwrap().as_str(), ".mobi");
        assert_eq!(config.conversion.workers, 2);
        assert_eq!(config.conversion.queue_capacity, 100);
    }

    #[test]
    fn test_load_config_from_str_empty_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.conversion.workers, 8);
        assert_eq!(config.library.calibredb_path, PathBuf::from("calibredb"));
        assert_eq!(
            config.converter.ebook_convert_path,
            PathBuf::from("ebook-convert")
        );
    }

    #[test]
    fn test_load_config_from_str_bad_format() {
        let result = load_config_from_str("[conversion]\nformat = \"...\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[converter]
ebook_convert_path = "/opt/calibre/ebook-convert"
timeout_secs = 300
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(
            config.converter.ebook_convert_path,
            PathBuf::from("/opt/calibre/ebook-convert")
        );
        assert_eq!(config.converter.timeout_secs, Some(300));
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "ebookfill.toml",
                r#"
[conversion]
workers = 2
format = "epub"
"#,
            )?;
            jail.set_env("EBOOKFILL_CONVERSION__WORKERS", "6");
            jail.set_env("EBOOKFILL_LIBRARY__LIBRARY", "/env/books");

            let config = load_config(Path::new("ebookfill.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.conversion.workers, 6);
            assert_eq!(config.conversion.format.unwrap().as_str(), ".epub");
            assert_eq!(config.library.library, Some(PathBuf::from("/env/books")));
            Ok(())
        });
    }

    #[test]
    fn test_load_config_from_env() {
        Jail::expect_with(|jail| {
            jail.set_env("EBOOKFILL_CONVERSION__DRY_RUN", "true");

            let config = load_config_from_env().map_err(|e| e.to_string())?;
            assert!(config.conversion.dry_run);
            assert_eq!(config.conversion.workers, 8);
            Ok(())
        });
    }
}
