//! Application configuration loading from config.toml
//!
//! The file configures the bank itself (the default weekly interest rate) and lists users and
//! shop items to seed into the database on start. Every section is optional.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Default weekly interest rate as a fraction (2%)
pub const DEFAULT_INTEREST_RATE: f64 = 0.02;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Bank-wide settings
    #[serde(default)]
    pub bank: BankConfig,
    /// Users to seed (matched by Discord ID)
    #[serde(default)]
    pub users: Vec<UserConfig>,
    /// Shop items to seed (matched by name)
    #[serde(default)]
    pub shop_items: Vec<ShopItemConfig>,
}

/// Bank-wide settings
#[derive(Debug, Deserialize, Clone)]
pub struct BankConfig {
    /// Weekly interest rate as a fraction, e.g. `0.02` for 2%
    #[serde(default = "default_interest_rate")]
    pub interest_rate: f64,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            interest_rate: DEFAULT_INTEREST_RATE,
        }
    }
}

const fn default_interest_rate() -> f64 {
    DEFAULT_INTEREST_RATE
}

impl BankConfig {
    /// Converts the configured fraction into basis points (0.02 → 200).
    ///
    /// # Errors
    /// Returns `Error::Config` if the rate is negative, above 100%, or not finite.
    pub fn interest_rate_bps(&self) -> Result<i32> {
        let rate = self.interest_rate;
        if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
            return Err(Error::Config {
                message: format!("interest_rate must be between 0 and 1, got {rate}"),
            });
        }
        // Cast safety: rate ∈ [0, 1], so the rounded product is in [0, 10_000]
        #[allow(clippy::cast_possible_truncation)]
        let bps = (rate * 10_000.0).round() as i32;
        Ok(bps)
    }
}

/// Configuration for a single seeded user
#[derive(Debug, Deserialize, Clone)]
pub struct UserConfig {
    /// Display name
    pub name: String,
    /// Role: `student`, `teacher`, `parent` or `principal`
    pub role: String,
    /// Discord user ID
    pub discord_id: String,
}

/// Configuration for a single seeded shop item
#[derive(Debug, Deserialize, Clone)]
pub struct ShopItemConfig {
    /// Item name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Price in points
    pub price: i64,
    /// Initial stock
    pub stock: i32,
    /// Category label
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    "general".to_string()
}

/// Loads configuration from a TOML file
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from `POINTBANK_CONFIG`, or `./config.toml` when unset.
///
/// A missing file at the default location yields [`Config::default`], so the bank can start
/// with no configuration at all.
pub fn load_default_config() -> Result<Config> {
    if let Ok(path) = std::env::var("POINTBANK_CONFIG") {
        return load_config(path);
    }

    let default_path = Path::new("config.toml");
    if default_path.exists() {
        load_config(default_path)
    } else {
        tracing::warn!("No config.toml found, using defaults");
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [bank]
            interest_rate = 0.03

            [[users]]
            name = "Ms. Kim"
            role = "teacher"
            discord_id = "1234"

            [[shop_items]]
            name = "Homework Pass"
            description = "Skip one homework"
            price = 300
            stock = 5
            category = "privilege"

            [[shop_items]]
            name = "Sticker"
            price = 20
            stock = 100
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.bank.interest_rate, 0.03);
        assert_eq!(config.users.len(), 1);
        assert_eq!(config.users[0].role, "teacher");
        assert_eq!(config.shop_items.len(), 2);
        assert_eq!(config.shop_items[0].price, 300);
        assert_eq!(
            config.shop_items[0].description.as_deref(),
            Some("Skip one homework")
        );
        assert_eq!(config.shop_items[1].category, "general");
        assert!(config.shop_items[1].description.is_none());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.bank.interest_rate, DEFAULT_INTEREST_RATE);
        assert!(config.users.is_empty());
        assert!(config.shop_items.is_empty());
    }

    #[test]
    fn test_interest_rate_bps() {
        let bank = BankConfig { interest_rate: 0.02 };
        assert_eq!(bank.interest_rate_bps().unwrap(), 200);

        let bank = BankConfig {
            interest_rate: 0.015,
        };
        assert_eq!(bank.interest_rate_bps().unwrap(), 150);

        let bank = BankConfig {
            interest_rate: -0.01,
        };
        assert!(matches!(
            bank.interest_rate_bps(),
            Err(Error::Config { message: _ })
        ));

        let bank = BankConfig {
            interest_rate: f64::NAN,
        };
        assert!(bank.interest_rate_bps().is_err());
    }

    #[test]
    fn test_shipped_config_loads() {
        let config = load_config(concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml")).unwrap();
        assert_eq!(config.bank.interest_rate_bps().unwrap(), 200);
        assert!(config.shop_items.iter().all(|item| item.price > 0));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("does/not/exist.toml");
        assert!(matches!(result, Err(Error::Config { message: _ })));
    }
}
