//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "copilot-oneshot";
const PROJECT_FILES: [&str; 2] = ["oneshot.toml", ".oneshot.toml"];
const ENV_PREFIX: &str = "COPILOT_ONESHOT_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(config_path).extract().map_err(Box::new)
    }

    /// Build the layered figment without extracting it.
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Describe the config file locations being used (for debugging)
    pub fn describe_sources(config_path: Option<&Path>) -> Vec<String> {
        let mark = |found: bool| if found { "FOUND" } else { "     " };
        let mut lines = Vec::new();

        if let Some(path) = config_path {
            lines.push(format!("[{}] Explicit: {}", mark(path.exists()), path.display()));
        }

        match Self::project_config_path() {
            Some(path) => lines.push(format!("[FOUND] Project:  {}", path.display())),
            None => lines.push("[     ] Project:  ./oneshot.toml or ./.oneshot.toml".to_string()),
        }

        if let Some(path) = Self::global_config_path() {
            lines.push(format!("[{}] Global:   {}", mark(path.exists()), path.display()));
        }

        lines.push(format!("[     ] Env:      {}*", ENV_PREFIX));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oneshot_domain::OutputFormat;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.session.model, "gpt-4.1");
        assert_eq!(config.session.timeout_secs, 60);
        assert!(config.copilot.cli_url.is_none());
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("copilot-oneshot"));
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[session]\nmodel = \"gpt-5\"\n\n[output]\nformat = \"json\"\n",
        )
        .unwrap();

        figment::Jail::expect_with(|_jail| {
            let config = ConfigLoader::load(Some(&path)).map_err(|e| *e)?;
            assert_eq!(config.session.model, "gpt-5");
            assert_eq!(config.session.timeout_secs, 60);
            assert_eq!(config.output.format, OutputFormat::Json);
            Ok(())
        });
    }

    #[test]
    fn test_project_file_then_env_override() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "oneshot.toml",
                "[session]\nmodel = \"claude-sonnet-4.5\"\ntimeout_secs = 30\n",
            )?;
            jail.set_env("COPILOT_ONESHOT_SESSION__TIMEOUT_SECS", "5");
            jail.set_env("COPILOT_ONESHOT_COPILOT__CLI_URL", "localhost:4321");

            let config = ConfigLoader::load(None).map_err(|e| *e)?;
            assert_eq!(config.session.model, "claude-sonnet-4.5");
            assert_eq!(config.session.timeout_secs, 5);
            assert_eq!(config.copilot.cli_url.as_deref(), Some("localhost:4321"));
            Ok(())
        });
    }

    #[test]
    fn test_hidden_project_file_is_found() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(".oneshot.toml", "[output]\ncolor = false\n")?;
            assert_eq!(
                ConfigLoader::project_config_path(),
                Some(PathBuf::from(".oneshot.toml"))
            );
            let config = ConfigLoader::load(None).map_err(|e| *e)?;
            assert!(!config.output.color);
            Ok(())
        });
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("oneshot.toml", "[session]\ntimeout_secs = \"soon\"\n")?;
            assert!(ConfigLoader::load(None).is_err());
            Ok(())
        });
    }
}
