use serde::Deserialize;
use std::{env, error::Error, fs::OpenOptions, io::Read};

pub const DEFAULT_NOTE: &str = "wear:uv3";
pub const DEFAULT_MIN_ROUND: u64 = 21_540_981;
pub const DEFAULT_CONFIRMATION_ROUNDS: u64 = 4;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub algod_url: String,
    #[serde(default)]
    pub algod_token: Option<String>,
    pub indexer_url: String,
    #[serde(default)]
    pub indexer_token: Option<String>,
    #[serde(default = "default_note")]
    pub note: String,
    #[serde(default = "default_min_round")]
    pub min_round: u64,
    #[serde(default = "default_confirmation_rounds")]
    pub confirmation_rounds: u64,
}

fn default_note() -> String {
    DEFAULT_NOTE.to_string()
}

fn default_min_round() -> u64 {
    DEFAULT_MIN_ROUND
}

fn default_confirmation_rounds() -> u64 {
    DEFAULT_CONFIRMATION_ROUNDS
}

impl Config {
    pub fn load(config_path: &str) -> std::result::Result<Self, Box<dyn Error>> {
        let mut file = OpenOptions::new().read(true).open(config_path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Ok(serde_json::from_str::<Config>(&contents)?)
    }

    /// Reads `ALGOD_URL`, `INDEXER_URL` (required) and the optional tokens and
    /// marketplace overrides from the process environment.
    pub fn from_env() -> std::result::Result<Self, Box<dyn Error>> {
        let optional = |key: &str| env::var(key).ok().filter(|v| !v.is_empty());
        let number = |key: &str, default: u64| -> std::result::Result<u64, Box<dyn Error>> {
            match optional(key) {
                Some(value) => Ok(value.parse::<u64>().map_err(|e| format!("{key}: {e}"))?),
                None => Ok(default),
            }
        };

        Ok(Config {
            algod_url: env::var("ALGOD_URL").map_err(|_| "ALGOD_URL must be set")?,
            algod_token: optional("ALGOD_TOKEN"),
            indexer_url: env::var("INDEXER_URL").map_err(|_| "INDEXER_URL must be set")?,
            indexer_token: optional("INDEXER_TOKEN"),
            note: optional("WEAR_NOTE").unwrap_or_else(default_note),
            min_round: number("WEAR_MIN_ROUND", DEFAULT_MIN_ROUND)?,
            confirmation_rounds: number("WEAR_CONFIRMATION_ROUNDS", DEFAULT_CONFIRMATION_ROUNDS)?,
        })
    }
}
