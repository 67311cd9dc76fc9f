use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3002";
const DEFAULT_TICK_MS: u64 = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub root: PathBuf,
    pub bind_addr: String,
    pub data_file: Option<PathBuf>,
    pub tick_period: Duration,
    pub tribe_multiplier: u32,
    pub seed: Option<u64>,
    pub ws_allowed_origins: Option<Vec<String>>,
}

impl AppConfig {
    pub fn from_args(args: &[String]) -> Result<Self, String> {
        Self::from_sources(args, |key| std::env::var(key).ok())
    }

    /// `wildwood [bind_addr] [data_file]`, with `WILDWOOD_*` overrides looked up through `env`.
    pub fn from_sources(
        args: &[String],
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, String> {
        if args.len() > 3 {
            return Err("usage: wildwood [bind_addr] [data_file]".to_string());
        }
        let env = |key: &str| {
            env(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind_addr = args
            .get(1)
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let data_file = args.get(2).map(PathBuf::from);
        let root = env("WILDWOOD_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let tick_ms = match env("WILDWOOD_TICK_MS") {
            Some(value) => parse_positive(&value, "WILDWOOD_TICK_MS")?,
            None => DEFAULT_TICK_MS,
        };
        let tribe_multiplier = match env("WILDWOOD_TRIBES") {
            Some(value) => value
                .parse::<u32>()
                .map_err(|_| format!("invalid WILDWOOD_TRIBES '{}'", value))?,
            None => 1,
        };
        let seed = env("WILDWOOD_SEED")
            .map(|value| {
                value
                    .parse::<u64>()
                    .map_err(|_| format!("invalid WILDWOOD_SEED '{}'", value))
            })
            .transpose()?;
        let ws_allowed_origins = env("WILDWOOD_WS_ORIGINS").and_then(|value| {
            let entries: Vec<String> = value
                .split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_string)
                .collect();
            if entries.is_empty() {
                None
            } else {
                Some(entries)
            }
        });

        Ok(Self {
            root,
            bind_addr,
            data_file,
            tick_period: Duration::from_millis(tick_ms),
            tribe_multiplier,
            seed,
            ws_allowed_origins,
        })
    }
}

fn parse_positive(value: &str, name: &str) -> Result<u64, String> {
    match value.parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(format!("invalid {} '{}'", name, value)),
    }
}
