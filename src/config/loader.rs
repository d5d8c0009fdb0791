//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    load_config_str(&content)
}

/// Parse and validate configuration from TOML text.
pub fn load_config_str(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{MissingPolicy, ResponderConfig, RouteConfig};

    const PEOPLE: &str = r#"
[listener]
bind_address = "127.0.0.1:0"
debug_not_found = true

[resolver]
catch = ["continue_resolving", "permission_denied"]

[[routes]]
kind = "multi"
namespace = "site"

[[routes.routes]]
kind = "route"
name = "person"
regex = '^(\w+)/$'
responder = { type = "lookup", param = "0", body = "Person: {value}", entries = { jane = "Jane Doe" } }

[[routes.routes]]
kind = "route"
name = "thing"
path = "{name}/"
responder = { type = "template", body = "Thing: {name|title}" }
"#;

    #[test]
    fn test_load_nested_tables() {
        let config = load_config_str(PEOPLE).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:0");
        assert!(config.listener.debug_not_found);
        assert_eq!(config.resolver.catch.len(), 2);
        assert_eq!(config.timeouts.request_secs, 30);

        let RouteConfig::Multi(multi) = &config.routes[0] else {
            panic!("expected a multi table");
        };
        assert_eq!(multi.namespace.as_deref(), Some("site"));
        assert_eq!(multi.routes.len(), 2);

        let RouteConfig::Route(person) = &multi.routes[0] else {
            panic!("expected a route");
        };
        assert_eq!(person.regex.as_deref(), Some(r"^(\w+)/$"));
        match &person.responder {
            ResponderConfig::Lookup { param, entries, status, missing, .. } => {
                assert_eq!(param, "0");
                assert_eq!(entries["jane"], "Jane Doe");
                assert_eq!(*status, 200);
                assert_eq!(*missing, MissingPolicy::Decline);
            }
            other => panic!("unexpected responder: {other:?}"),
        }
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = load_config_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.resolver.catch, vec!["continue_resolving".to_string()]);
    }

    #[test]
    fn test_parse_error() {
        let err = load_config_str("[[routes]]\nkind = \"bogus\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error_is_reported() {
        let err = load_config_str("[[routes]]\nkind = \"multi\"\nroutes = []\n").unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/multiroute.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
        assert!(err.to_string().starts_with("IO error"));
    }
}
