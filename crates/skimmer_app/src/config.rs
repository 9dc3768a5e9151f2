use std::fs;
use std::path::Path;
use std::time::Duration;

use batch_logging::batch_warn;
use serde::Deserialize;
use skimmer_engine::DEFAULT_RAW_FETCH_PARAM;

use crate::args::Args;

/// Optional settings file, RON-encoded. Every field may be omitted.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub filter_keyword: Option<String>,
    pub delay_between_files_ms: Option<u64>,
    pub raw_fetch_param: Option<String>,
}

/// Reads a settings file, degrading to defaults on any problem. A missing
/// or broken file is worth a warning, never a failed run.
pub fn load_file_config(path: &Path) -> FileConfig {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            batch_warn!("Failed to read settings from {:?}: {}", path, err);
            return FileConfig::default();
        }
    };

    match ron::from_str(&content) {
        Ok(config) => config,
        Err(err) => {
            batch_warn!("Failed to parse settings from {:?}: {}", path, err);
            FileConfig::default()
        }
    }
}

/// Fully resolved run settings: file config overridden by explicit flags.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub filter_keyword: Option<String>,
    pub delay_between_files: Duration,
    pub raw_fetch_param: Option<String>,
}

impl RunSettings {
    pub fn resolve(args: &Args, file: &FileConfig) -> Self {
        let filter_keyword = args.filter.clone().or_else(|| file.filter_keyword.clone());

        let delay_ms = args.delay_ms.or(file.delay_between_files_ms).unwrap_or(0);

        let raw_fetch_param = if args.no_raw_param {
            None
        } else {
            args.raw_param
                .clone()
                .or_else(|| file.raw_fetch_param.clone())
                .or_else(|| Some(DEFAULT_RAW_FETCH_PARAM.to_string()))
        };

        Self {
            filter_keyword,
            delay_between_files: Duration::from_millis(delay_ms),
            raw_fetch_param,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(argv: &[&str]) -> Args {
        Args::parse_from([&["skimmer"], argv].concat())
    }

    #[test]
    fn flags_override_the_settings_file() {
        let args = parse(&["https://h/folder", "--filter", "Draft", "--delay-ms", "250"]);
        let file = FileConfig {
            filter_keyword: Some("Final".to_string()),
            delay_between_files_ms: Some(1000),
            raw_fetch_param: Some("dl=true".to_string()),
        };

        let settings = RunSettings::resolve(&args, &file);
        assert_eq!(settings.filter_keyword.as_deref(), Some("Draft"));
        assert_eq!(settings.delay_between_files, Duration::from_millis(250));
        assert_eq!(settings.raw_fetch_param.as_deref(), Some("dl=true"));
    }

    #[test]
    fn defaults_apply_without_flags_or_file() {
        let args = parse(&["https://h/folder"]);
        let settings = RunSettings::resolve(&args, &FileConfig::default());

        assert_eq!(settings.filter_keyword, None);
        assert_eq!(settings.delay_between_files, Duration::ZERO);
        assert_eq!(settings.raw_fetch_param.as_deref(), Some("download=1"));
    }

    #[test]
    fn no_raw_param_wins_over_everything() {
        let args = parse(&["https://h/folder", "--no-raw-param"]);
        let file = FileConfig {
            raw_fetch_param: Some("dl=true".to_string()),
            ..FileConfig::default()
        };

        let settings = RunSettings::resolve(&args, &file);
        assert_eq!(settings.raw_fetch_param, None);
    }

    #[test]
    fn settings_file_round_trips_from_ron() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("skimmer.ron");
        std::fs::write(
            &path,
            r#"(filter_keyword: Some("Report"), delay_between_files_ms: Some(50))"#,
        )
        .unwrap();

        let file = load_file_config(&path);
        assert_eq!(file.filter_keyword.as_deref(), Some("Report"));
        assert_eq!(file.delay_between_files_ms, Some(50));
        assert_eq!(file.raw_fetch_param, None);

        // Unreadable path degrades to defaults.
        let missing = load_file_config(&temp.path().join("nope.ron"));
        assert_eq!(missing.filter_keyword, None);
    }
}
