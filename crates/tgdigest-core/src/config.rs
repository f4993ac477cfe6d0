use std::{env, fs, path::Path, time::Duration};

use crate::{
    domain::{Channel, Destination},
    errors::Error,
    pipeline::prompt::PromptTemplate,
    Result,
};

pub const DEFAULT_DAYS_BACK: f64 = 7.0;
pub const DEFAULT_FETCH_LIMIT: usize = 100;
pub const MAX_FETCH_LIMIT: usize = 100;
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Typed configuration for one digest run.
///
/// Everything comes from the environment (optionally seeded from `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram (MTProto user session)
    pub telegram_api_id: i32,
    pub telegram_api_hash: String,
    pub telegram_session: String,
    pub telegram_bot_token: Option<String>,

    // Sources / destination
    pub channels: Vec<Channel>,
    pub destination: Destination,

    // Generative service
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub openai_timeout: Duration,

    // Window and limits
    pub days_back: f64,
    pub fetch_limit: usize,
    pub telegram_message_limit: usize,

    pub template: PromptTemplate,

    /// Non-fatal problems found while loading (already logged).
    pub warnings: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (the process env in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);
        let require = |key: &str| {
            get(key).ok_or_else(|| {
                Error::Config(format!("{key} environment variable is required"))
            })
        };

        let mut warnings = Vec::new();

        let api_id_raw = require("TELEGRAM_API_ID")?;
        let telegram_api_id = api_id_raw
            .trim()
            .parse::<i32>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| {
                Error::Config(format!("TELEGRAM_API_ID must be a positive integer: {api_id_raw}"))
            })?;
        let telegram_api_hash = require("TELEGRAM_API_HASH")?.trim().to_string();
        let telegram_session = require("TELEGRAM_STRING_SESSION")?.trim().to_string();
        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").map(|s| s.trim().to_string());

        let channels = parse_channels(&require("TG_CHANNELS")?)?;
        let destination = require("TG_TARGET_CHAT_ID")?.parse::<Destination>()?;

        let openai_api_key = require("OPENAI_API_KEY")?.trim().to_string();
        let openai_model = get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let openai_base_url = get("OPENAI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let openai_timeout = Duration::from_secs(
            get("OPENAI_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(120),
        );

        let (days_back, days_warning) = parse_days_back(lookup("DAYS").as_deref());
        if let Some(w) = days_warning {
            tracing::warn!("{w}");
            warnings.push(w);
        }

        let fetch_limit = get("FETCH_LIMIT")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_FETCH_LIMIT)
            .clamp(1, MAX_FETCH_LIMIT);
        let telegram_message_limit = get("TELEGRAM_MESSAGE_LIMIT")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(4096);

        let mut template = PromptTemplate::default();
        if let Some(budget) = get("DIGEST_CHAR_BUDGET").and_then(|s| s.trim().parse().ok()) {
            template.char_budget = budget;
        }
        if let Some(v) = get("DIGEST_TOPICS").map(|s| parse_bool(&s)) {
            template.priority_topics = v;
        }
        if let Some(v) = get("DIGEST_JOKE").map(|s| parse_bool(&s)) {
            template.closing_joke = v;
        }
        if let Some(v) = get("DIGEST_STRUCTURED_TOPICS").map(|s| parse_bool(&s)) {
            template.structured_topics = v;
        }
        if let Some(focus) = get("DIGEST_FOCUS") {
            template.focus = focus.trim().to_string();
        }
        if template.char_budget >= telegram_message_limit {
            let w = format!(
                "DIGEST_CHAR_BUDGET ({}) is not below TELEGRAM_MESSAGE_LIMIT ({telegram_message_limit}); oversized digests will be dropped",
                template.char_budget
            );
            tracing::warn!("{w}");
            warnings.push(w);
        }

        Ok(Self {
            telegram_api_id,
            telegram_api_hash,
            telegram_session,
            telegram_bot_token,
            channels,
            destination,
            openai_api_key,
            openai_model,
            openai_base_url,
            openai_timeout,
            days_back,
            fetch_limit,
            telegram_message_limit,
            template,
            warnings,
        })
    }
}

/// Effective lookback window in days; fractions are allowed.
///
/// Unset or blank falls back silently; anything non-numeric, non-finite or
/// `<= 0` falls back with a warning message for the operator.
pub fn parse_days_back(raw: Option<&str>) -> (f64, Option<String>) {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return (DEFAULT_DAYS_BACK, None);
    };
    match raw.parse::<f64>() {
        Ok(days) if days.is_finite() && days > 0.0 => (days, None),
        _ => (
            DEFAULT_DAYS_BACK,
            Some(format!(
                "Invalid DAYS parameter: {raw}. Using default value of {DEFAULT_DAYS_BACK} days."
            )),
        ),
    }
}

/// Split `TG_CHANNELS`; blank entries are dropped, an empty result is an error.
pub fn parse_channels(raw: &str) -> Result<Vec<Channel>> {
    let channels = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Channel::new)
        .collect::<Result<Vec<_>>>()?;
    if channels.is_empty() {
        return Err(Error::Config(
            "TG_CHANNELS must list at least one channel".to_string(),
        ));
    }
    Ok(channels)
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() || env::var_os(key).is_some() {
            continue;
        }

        let mut val = v.trim().to_string();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("TELEGRAM_API_ID", "12345"),
            ("TELEGRAM_API_HASH", "hash"),
            ("TELEGRAM_STRING_SESSION", "c2Vzc2lvbg=="),
            ("TG_CHANNELS", " @alpha, @beta ,,"),
            ("TG_TARGET_CHAT_ID", "-1001234567"),
            ("OPENAI_API_KEY", "sk-test"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<Config> {
        Config::from_lookup(|k| env.get(k).map(|v| v.to_string()))
    }

    #[test]
    fn loads_required_values_with_defaults() {
        let cfg = load(&base_env()).unwrap();
        assert_eq!(cfg.telegram_api_id, 12345);
        assert_eq!(
            cfg.channels
                .iter()
                .map(|c| c.as_str().to_string())
                .collect::<Vec<_>>(),
            vec!["@alpha", "@beta"]
        );
        assert_eq!(cfg.destination, Destination::Id(-1001234567));
        assert_eq!(cfg.days_back, DEFAULT_DAYS_BACK);
        assert_eq!(cfg.fetch_limit, 100);
        assert_eq!(cfg.telegram_message_limit, 4096);
        assert_eq!(cfg.openai_model, DEFAULT_MODEL);
        assert!(cfg.telegram_bot_token.is_none());
        assert!(cfg.warnings.is_empty());
    }

    #[test]
    fn missing_required_value_is_config_error() {
        let mut env = base_env();
        env.remove("OPENAI_API_KEY");
        let err = load(&env).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("OPENAI_API_KEY")));

        let mut env = base_env();
        env.insert("TG_CHANNELS", " , ,");
        assert!(matches!(load(&env), Err(Error::Config(_))));

        let mut env = base_env();
        env.insert("TELEGRAM_API_ID", "abc");
        assert!(matches!(load(&env), Err(Error::Config(_))));
    }

    #[test]
    fn invalid_days_fall_back_with_warning() {
        for bad in ["abc", "0", "-3", "NaN", "inf"] {
            let (days, warning) = parse_days_back(Some(bad));
            assert_eq!(days, DEFAULT_DAYS_BACK, "input {bad}");
            assert!(warning.unwrap().contains(bad));
        }
        assert_eq!(parse_days_back(Some(" 3 ")), (3.0, None));
        assert_eq!(parse_days_back(Some("1.5")), (1.5, None));
        assert_eq!(parse_days_back(Some("0.25")), (0.25, None));
        assert_eq!(parse_days_back(None), (DEFAULT_DAYS_BACK, None));
        assert_eq!(parse_days_back(Some("")), (DEFAULT_DAYS_BACK, None));

        let mut env = base_env();
        env.insert("DAYS", "soon");
        let cfg = load(&env).unwrap();
        assert_eq!(cfg.days_back, DEFAULT_DAYS_BACK);
        assert_eq!(cfg.warnings.len(), 1);
    }

    #[test]
    fn toggles_and_limits_are_read() {
        let mut env = base_env();
        env.insert("DIGEST_JOKE", "off");
        env.insert("DIGEST_TOPICS", "0");
        env.insert("FETCH_LIMIT", "500");
        env.insert("OPENAI_BASE_URL", "http://localhost:8080/v1/");
        let cfg = load(&env).unwrap();
        assert!(!cfg.template.closing_joke);
        assert!(!cfg.template.priority_topics);
        assert!(cfg.template.structured_topics);
        assert_eq!(cfg.fetch_limit, MAX_FETCH_LIMIT);
        assert_eq!(cfg.openai_base_url, "http://localhost:8080/v1");
    }
}
