use std::path::Path;

use serde::de::DeserializeOwned;

use crate::environment::Environment;

/// Directory containing configuration files relative to the working directory.
const CONFIGURATION_DIR: &str = "configuration";

/// Base configuration file loaded for all environments.
const BASE_CONFIG_FILE: &str = "base.yaml";

/// Prefix for environment variable configuration overrides.
const ENV_PREFIX: &str = "APP";

/// Separator between environment variable prefix and key segments.
const ENV_PREFIX_SEPARATOR: &str = "_";

/// Separator for nested configuration keys in environment variables.
///
/// Example: `APP_PUBLISHER__INTERVAL_MS` sets the `publisher.interval_ms` field.
const ENV_SEPARATOR: &str = "__";

/// Separator for list elements in environment variables.
const LIST_SEPARATOR: &str = ",";

/// Trait defining the list of keys that should be parsed as lists in a given [`Config`]
/// implementation.
pub trait Config {
    /// Slice containing all the keys that should be parsed as lists when loading the configuration.
    const LIST_PARSE_KEYS: &'static [&'static str];
}

/// Loads hierarchical configuration from the `configuration` directory under the current
/// working directory.
///
/// See [`load_config_from`] for the layering rules.
pub fn load_config<T>() -> Result<T, config::ConfigError>
where
    T: Config + DeserializeOwned,
{
    let base_path =
        std::env::current_dir().map_err(|err| config::ConfigError::Foreign(Box::new(err)))?;

    load_config_from(&base_path.join(CONFIGURATION_DIR))
}

/// Loads hierarchical configuration from YAML files and environment variables.
///
/// Loads configuration in this order:
/// 1. Base configuration from `{configuration_directory}/base.yaml`
/// 2. Environment-specific file from `{configuration_directory}/{environment}.yaml`
/// 3. Environment variable overrides prefixed with `APP`
///
/// Nested keys use double underscores: `APP_PUBLISHER__INTERVAL_MS` → `publisher.interval_ms`
/// and lists are separated by `,`.
pub fn load_config_from<T>(configuration_directory: &Path) -> Result<T, config::ConfigError>
where
    T: Config + DeserializeOwned,
{
    let environment =
        Environment::load().map_err(|err| config::ConfigError::Foreign(Box::new(err)))?;
    let environment_filename = format!("{environment}.yaml");

    let mut environment_source = config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_PREFIX_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .try_parsing(true);

    if !<T as Config>::LIST_PARSE_KEYS.is_empty() {
        environment_source = environment_source.list_separator(LIST_SEPARATOR);

        for key in <T as Config>::LIST_PARSE_KEYS {
            environment_source = environment_source.with_list_parse_key(key);
        }
    }

    let settings = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join(BASE_CONFIG_FILE),
        ))
        // The environment file is optional so that a base file alone is a valid setup.
        .add_source(
            config::File::from(configuration_directory.join(environment_filename)).required(false),
        )
        .add_source(environment_source)
        .build()?;

    settings.try_deserialize::<T>()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use serde::Deserialize;

    use super::*;
    use crate::shared::PublisherConfig;

    #[derive(Debug, Deserialize)]
    struct TestConfig {
        name: String,
        publisher: PublisherConfig,
    }

    impl Config for TestConfig {
        const LIST_PARSE_KEYS: &'static [&'static str] = &[];
    }

    fn write_configuration_dir(test_name: &str, base: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "etl-config-{test_name}-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(BASE_CONFIG_FILE), base).unwrap();

        dir
    }

    #[test]
    fn test_load_base_file_without_environment_file() {
        let dir = write_configuration_dir(
            "base-only",
            "name: snapshot\npublisher:\n  interval_ms: 250\n",
        );

        let config = load_config_from::<TestConfig>(&dir).unwrap();
        assert_eq!(config.name, "snapshot");
        assert_eq!(config.publisher.interval_ms, 250);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_missing_base_file_fails() {
        let dir = std::env::temp_dir().join(format!(
            "etl-config-missing-{}",
            std::process::id()
        ));

        assert!(load_config_from::<TestConfig>(&dir).is_err());
    }
}
