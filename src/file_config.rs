//! INI configuration loading.
//!
//! Client settings live in a `[logtail]` section:
//!
//! ```ini
//! [logtail]
//! capacity = 500
//! subscription_id = MyGroup
//! reconnect_max_delay_ms = 5000
//! ```
//!
//! Files are decoded with `encoding_rs`, defaulting to UTF-8, and parsed with
//! `rust-ini`.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;

use encoding_rs::Encoding;
use ini::Ini;

use crate::config::TailClientBuilder;
use crate::error::BuildError;

/// Section holding client settings.
pub const CONFIG_SECTION: &str = "logtail";

impl TailClientBuilder {
    /// Load settings from an INI file, decoding it with `encoding` (UTF-8
    /// when `None`).
    pub fn from_ini_file(
        path: impl AsRef<Path>,
        encoding: Option<&str>,
    ) -> Result<Self, BuildError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let bytes = fs::read(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => BuildError::InvalidConfig(format!("{display} doesn't exist")),
            _ => BuildError::Io(err),
        })?;
        let text = decode_contents(&display, &bytes, encoding.unwrap_or("utf-8"))?;
        Self::from_ini_str(&display, &text)
    }

    /// Load settings from INI text. `origin` names the source in errors.
    pub fn from_ini_str(origin: &str, text: &str) -> Result<Self, BuildError> {
        let ini = Ini::load_from_str(text).map_err(|source| BuildError::Ini {
            path: origin.to_owned(),
            source,
        })?;
        let Some(section) = ini.section(Some(CONFIG_SECTION)) else {
            return Err(BuildError::InvalidConfig(format!(
                "{origin} has no [{CONFIG_SECTION}] section"
            )));
        };

        let mut builder = TailClientBuilder::new();
        for (key, value) in section.iter() {
            let value = value.trim();
            builder = match key {
                "capacity" => builder.with_capacity(parse_value(key, value)?),
                "subscription_id" => builder.with_subscription_id(value.to_owned()),
                "reconnect_max_delay_ms" => {
                    builder.with_reconnect_max_delay_ms(parse_value(key, value)?)
                }
                "command_capacity" => builder.with_command_capacity(parse_value(key, value)?),
                "warn_interval_ms" => builder.with_warn_interval_ms(parse_value(key, value)?),
                "jitter_seed" => builder.with_jitter_seed(parse_value(key, value)?),
                other => {
                    return Err(BuildError::InvalidConfig(format!(
                        "unknown setting {other} in [{CONFIG_SECTION}]"
                    )));
                }
            };
        }
        Ok(builder)
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, BuildError> {
    value
        .parse()
        .map_err(|_| BuildError::InvalidConfig(format!("{key} has invalid value {value:?}")))
}

fn decode_contents(path: &str, bytes: &[u8], label: &str) -> Result<String, BuildError> {
    let normalized_label = label.trim().to_ascii_lowercase();
    let encoding = Encoding::for_label(normalized_label.as_bytes()).ok_or_else(|| {
        BuildError::Decode {
            path: path.to_owned(),
            reason: format!("unknown encoding {label}"),
        }
    })?;
    let (decoded, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(BuildError::Decode {
            path: path.to_owned(),
            reason: format!("invalid {} sequence", encoding.name()),
        });
    }
    Ok(decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use std::time::Duration;

    #[rstest]
    fn reads_settings_from_section() {
        let builder = TailClientBuilder::from_ini_str(
            "inline",
            "[logtail]\ncapacity = 42\nsubscription_id = ops\nreconnect_max_delay_ms = 750\n",
        )
        .expect("parse ini");
        let config = builder.build_config().expect("valid config");
        assert_eq!(config.capacity.get(), 42);
        assert_eq!(config.subscription_id, "ops");
        assert_eq!(config.reconnect_max_delay, Duration::from_millis(750));
    }

    #[rstest]
    #[case::missing_section("[other]\ncapacity = 1\n", "no [logtail] section")]
    #[case::unknown_key("[logtail]\ncolour = blue\n", "unknown setting colour")]
    #[case::bad_number("[logtail]\ncapacity = lots\n", "capacity has invalid value")]
    fn rejects_bad_files(#[case] text: &str, #[case] needle: &str) {
        let err = TailClientBuilder::from_ini_str("inline", text).expect_err("must fail");
        assert!(err.to_string().contains(needle), "{err}");
    }

    #[rstest]
    fn zero_capacity_fails_at_build_time() {
        let builder = TailClientBuilder::from_ini_str("inline", "[logtail]\ncapacity = 0\n")
            .expect("parse ini");
        assert!(builder.build_config().is_err());
    }

    #[rstest]
    fn decodes_non_utf8_files() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        // "subscription_id = café" in Latin-1.
        file.write_all(b"[logtail]\nsubscription_id = caf\xe9\n")
            .expect("write config");
        let builder = TailClientBuilder::from_ini_file(file.path(), Some("latin1"))
            .expect("decode latin-1");
        let config = builder.build_config().expect("valid config");
        assert_eq!(config.subscription_id, "café");
    }

    #[rstest]
    fn missing_file_is_reported() {
        let err = TailClientBuilder::from_ini_file("/nonexistent/logtail.ini", None)
            .expect_err("missing file");
        assert!(err.to_string().contains("doesn't exist"), "{err}");
    }

    #[rstest]
    fn unknown_encoding_is_reported() {
        let file = tempfile::NamedTempFile::new().expect("create temp file");
        let err = TailClientBuilder::from_ini_file(file.path(), Some("klingon"))
            .expect_err("unknown encoding");
        assert!(matches!(err, BuildError::Decode { .. }));
    }
}
