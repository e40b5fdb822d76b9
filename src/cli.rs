use std::path::PathBuf;

use anyhow::{Result, anyhow};

use crate::aggregate::FeedUploads;
use crate::settings::Settings;
use crate::state::FeedSource;

const DEFAULT_DEMO_MATCHES: usize = 3;

/// Hand-rolled `--flag value` / `--flag=value` lookups over the process args.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    args: Vec<String>,
}

impl CliArgs {
    pub fn from_env() -> Self {
        Self::new(std::env::args().skip(1))
    }

    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.args.iter().any(|arg| arg == name)
    }

    pub fn value(&self, name: &str) -> Option<String> {
        let prefix = format!("{name}=");
        for (idx, arg) in self.args.iter().enumerate() {
            if let Some(raw) = arg.strip_prefix(&prefix) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
            if arg == name
                && let Some(next) = self.args.get(idx + 1)
                && !next.trim().is_empty()
                && !next.starts_with("--")
            {
                return Some(next.trim().to_string());
            }
        }
        None
    }

    /// Comma/semicolon separated list value.
    pub fn list(&self, name: &str) -> Vec<String> {
        self.value(name)
            .map(|raw| split_list(&raw))
            .unwrap_or_default()
    }

    pub fn paths(&self, name: &str) -> Vec<PathBuf> {
        self.list(name).into_iter().map(PathBuf::from).collect()
    }

    /// Pick the feed source: explicit file lists, then `--dir`, then
    /// `--demo [N]`, then `OPTA_DATA_DIR`.
    pub fn feed_source(&self, settings: &Settings) -> Result<FeedSource> {
        let uploads = FeedUploads {
            lineups: self.paths("--lineups"),
            events: self.paths("--events"),
        };
        if !uploads.is_empty() {
            return Ok(FeedSource::Files(uploads));
        }
        if let Some(dir) = self.value("--dir") {
            return Ok(FeedSource::Directory(PathBuf::from(dir)));
        }
        if self.has_flag("--demo") || self.value("--demo").is_some() {
            let matches = self
                .value("--demo")
                .and_then(|raw| raw.parse::<usize>().ok())
                .unwrap_or(DEFAULT_DEMO_MATCHES)
                .clamp(1, 64);
            return Ok(FeedSource::Demo { matches });
        }
        if let Some(dir) = &settings.data_dir {
            return Ok(FeedSource::Directory(dir.clone()));
        }
        Err(anyhow!(
            "no feed files given: use --dir <path>, --lineups/--events <files>, or --demo"
        ))
    }
}

pub fn split_list(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_accept_both_spellings() {
        let args = CliArgs::new(["--dir=/data", "--type", "shot", "--verbose"]);
        assert_eq!(args.value("--dir").as_deref(), Some("/data"));
        assert_eq!(args.value("--type").as_deref(), Some("shot"));
        assert_eq!(args.value("--verbose"), None);
        assert!(args.has_flag("--verbose"));
    }

    #[test]
    fn explicit_files_win_over_directory() {
        let args = CliArgs::new(["--dir", "/data", "--lineups", "a_f7.json, b_f7.json"]);
        let source = args.feed_source(&Settings::default()).expect("source");
        let FeedSource::Files(uploads) = &source else {
            panic!("expected explicit files, got {source:?}");
        };
        assert_eq!(uploads.lineups.len(), 2);
        assert!(uploads.events.is_empty());
    }

    #[test]
    fn demo_flag_with_and_without_count() {
        let settings = Settings::default();
        let bare = CliArgs::new(["--demo"]).feed_source(&settings).expect("source");
        assert_eq!(bare, FeedSource::Demo { matches: DEFAULT_DEMO_MATCHES });
        let counted = CliArgs::new(["--demo", "5"]).feed_source(&settings).expect("source");
        assert_eq!(counted, FeedSource::Demo { matches: 5 });
    }

    #[test]
    fn missing_source_is_an_error() {
        assert!(CliArgs::default().feed_source(&Settings::default()).is_err());
    }
}
