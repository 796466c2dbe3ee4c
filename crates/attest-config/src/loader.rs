//! Finding, parsing, and layering configuration sources.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::runner::{ColorMode, ConfigFile, RunnerConfig};
use crate::{ConfigError, ConfigResult};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "attest.toml";

/// Loads the effective runner configuration. Three layers, lowest first:
/// the home-level file (`~/.attest/config.toml`), an `attest.toml` in the
/// working directory, and environment variables.
pub fn load() -> ConfigResult<RunnerConfig> {
    let mut config = global_config().unwrap_or_default();
    let path = Path::new(CONFIG_FILE_NAME);
    if path.exists() {
        config.merge(read_file(path)?);
    }
    config.merge(from_env()?);
    config.validate()?;
    Ok(config)
}

/// Loads a specific configuration file, overlaid with environment variables.
/// Unlike [`load`], a missing file is an error here and the home-level file
/// is not consulted.
pub fn load_from(path: &Path) -> ConfigResult<RunnerConfig> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let mut config = read_file(path)?;
    config.merge(from_env()?);
    config.validate()?;
    Ok(config)
}

/// Path of the home-level configuration file (`~/.attest/config.toml`).
pub fn global_config_path() -> ConfigResult<PathBuf> {
    let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
    Ok(home.join(".attest").join("config.toml"))
}

// The home-level file is optional: no home directory or no file yields an
// empty layer.
fn global_config() -> ConfigResult<RunnerConfig> {
    let path = global_config_path()?;
    if !path.exists() {
        return Ok(RunnerConfig::new());
    }
    read_file(&path)
}

fn read_file(path: &Path) -> ConfigResult<RunnerConfig> {
    let content = fs::read_to_string(path)?;
    let file: ConfigFile = toml::from_str(&content).map_err(|error| ConfigError::TomlParseError {
        file: path.to_path_buf(),
        error: error.to_string(),
    })?;
    Ok(file.runner)
}

/// Settings taken from the environment.
///
/// `ATTEST_PRIORITY` turns priority mode on or off, `ATTEST_RESULT_DIR`
/// relocates the pass markers, and the conventional `NO_COLOR` disables
/// colored output.
fn from_env() -> ConfigResult<RunnerConfig> {
    let mut config = RunnerConfig::new();
    if let Ok(value) = env::var("ATTEST_PRIORITY") {
        config.priority = Some(parse_bool("ATTEST_PRIORITY", &value)?);
    }
    if let Ok(value) = env::var("ATTEST_RESULT_DIR") {
        config.result_dir = Some(PathBuf::from(value));
    }
    if env::var_os("NO_COLOR").is_some() {
        config.color = Some(ColorMode::Never);
    }
    Ok(config)
}

fn parse_bool(field: &str, value: &str) -> ConfigResult<bool> {
    match value {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("expected a boolean, got {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::Verbosity;
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use std::io::Write;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILE_NAME);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    fn clear_env() {
        env::remove_var("ATTEST_PRIORITY");
        env::remove_var("ATTEST_RESULT_DIR");
        env::remove_var("NO_COLOR");
    }

    #[test]
    #[serial]
    fn load_from_reads_the_runner_table() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "[runner]\nverbosity = \"verbose\"\npriority = true\n",
        );

        let config = load_from(&path).unwrap();
        assert_eq!(config.verbosity, Some(Verbosity::Verbose));
        assert_eq!(config.priority, Some(true));
        assert_eq!(config.color, None);
    }

    #[test]
    #[serial]
    fn load_from_rejects_missing_files() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nowhere.toml");
        let error = load_from(&missing).unwrap_err();
        assert!(matches!(error, ConfigError::NotFound(path) if path == missing));
    }

    #[test]
    #[serial]
    fn load_from_reports_parse_errors_with_the_file_name() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[runner\nverbosity = !");
        let error = load_from(&path).unwrap_err();
        match error {
            ConfigError::TomlParseError { file, .. } => assert_eq!(file, path),
            other => panic!("expected a parse error, got {other}"),
        }
    }

    #[test]
    #[serial]
    fn the_global_file_lives_under_the_home_directory() {
        let path = global_config_path().unwrap();
        assert!(path.ends_with(".attest/config.toml"));
    }

    #[test]
    #[serial]
    fn the_home_level_file_sits_beneath_the_environment() {
        clear_env();
        let home = tempfile::tempdir().unwrap();
        let global_dir = home.path().join(".attest");
        fs::create_dir_all(&global_dir).unwrap();
        fs::write(
            global_dir.join("config.toml"),
            "[runner]\nverbosity = \"verbose\"\npriority = false\n",
        )
        .unwrap();

        let saved = env::var_os("HOME");
        env::set_var("HOME", home.path());
        env::set_var("ATTEST_PRIORITY", "1");
        let config = load();
        match saved {
            Some(value) => env::set_var("HOME", value),
            None => env::remove_var("HOME"),
        }
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.verbosity, Some(Verbosity::Verbose));
        assert_eq!(config.priority, Some(true));
    }

    #[test]
    #[serial]
    fn environment_overrides_the_file() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[runner]\npriority = false\n");

        env::set_var("ATTEST_PRIORITY", "1");
        env::set_var("ATTEST_RESULT_DIR", "/tmp/attest-markers");
        let config = load_from(&path).unwrap();
        clear_env();

        assert_eq!(config.priority, Some(true));
        assert_eq!(config.result_dir, Some(PathBuf::from("/tmp/attest-markers")));
    }

    #[test]
    #[serial]
    fn no_color_forces_color_off() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[runner]\ncolor = \"always\"\n");

        env::set_var("NO_COLOR", "1");
        let config = load_from(&path).unwrap();
        clear_env();

        assert_eq!(config.color, Some(ColorMode::Never));
    }

    #[test]
    #[serial]
    fn bad_boolean_values_are_invalid() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[runner]\n");

        env::set_var("ATTEST_PRIORITY", "perhaps");
        let error = load_from(&path).unwrap_err();
        clear_env();

        assert!(matches!(
            error,
            ConfigError::InvalidValue { field, .. } if field == "ATTEST_PRIORITY"
        ));
    }
}
