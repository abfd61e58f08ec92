//! Game configuration loading from config.toml
//!
//! The file carries the drop tuning (cooldown, coin reward, rarity weight table) and the initial
//! catalog: rarities, cards and shop items that seed an empty database. Every section is
//! optional and falls back to the defaults below.

use crate::entities::ShopItemKind;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Default drop cooldown: six hours
pub const DEFAULT_COOLDOWN_SECS: i64 = 6 * 3600;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct GameConfig {
    /// Drop tuning
    #[serde(default)]
    pub drop: DropSettings,
    /// Rarities to seed
    #[serde(default)]
    pub rarities: Vec<RarityConfig>,
    /// Cards to seed into an empty catalog
    #[serde(default)]
    pub cards: Vec<CardConfig>,
    /// Shop items to seed into an empty shop
    #[serde(default)]
    pub shop_items: Vec<ShopItemConfig>,
}

/// Tuning of the random card drop
#[derive(Debug, Clone, Deserialize)]
pub struct DropSettings {
    /// Minimum seconds between two successful drops of the same user
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: i64,
    /// Smallest coin reward per drop (inclusive)
    #[serde(default = "default_min_coins")]
    pub min_coins: i64,
    /// Largest coin reward per drop (inclusive)
    #[serde(default = "default_max_coins")]
    pub max_coins: i64,
    /// Rarity weights in fallback order
    #[serde(default = "default_weights")]
    pub weights: Vec<RarityWeight>,
}

/// One entry of the rarity weight table
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RarityWeight {
    /// Rarity name
    pub rarity: String,
    /// Relative weight; the table does not have to sum to 1
    pub weight: f64,
}

/// Configuration for a single rarity
#[derive(Debug, Clone, Deserialize)]
pub struct RarityConfig {
    /// Unique rarity name
    pub name: String,
    /// Display glyph
    pub glyph: String,
    /// Whether cards of this rarity can drop
    #[serde(default = "default_true")]
    pub droppable: bool,
}

/// Configuration for a single card
#[derive(Debug, Clone, Deserialize)]
pub struct CardConfig {
    /// Display name
    pub name: String,
    /// Rarity name
    pub rarity: String,
    /// Flavour text
    #[serde(default)]
    pub description: String,
    /// Image file reference
    #[serde(default)]
    pub image: String,
}

/// Configuration for a single shop item
#[derive(Debug, Clone, Deserialize)]
pub struct ShopItemConfig {
    /// Display name
    pub name: String,
    /// Price in coins
    pub price: i64,
    /// `cooldown_reset` or `card_pack`
    pub kind: ShopItemKind,
    /// Candidate card ids for packs
    #[serde(default)]
    pub cards: Vec<i64>,
    /// Expiry in epoch seconds, 0 = never
    #[serde(default)]
    pub expires_at: i64,
}

const fn default_cooldown() -> i64 {
    DEFAULT_COOLDOWN_SECS
}

const fn default_min_coins() -> i64 {
    10
}

const fn default_max_coins() -> i64 {
    50
}

const fn default_true() -> bool {
    true
}

fn default_weights() -> Vec<RarityWeight> {
    [
        ("Legendary", 0.05),
        ("Witty", 0.07),
        ("Epic", 0.15),
        ("Rare", 0.30),
        ("Common", 0.50),
    ]
    .into_iter()
    .map(|(rarity, weight)| RarityWeight {
        rarity: rarity.to_string(),
        weight,
    })
    .collect()
}

impl Default for DropSettings {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown(),
            min_coins: default_min_coins(),
            max_coins: default_max_coins(),
            weights: default_weights(),
        }
    }
}

impl DropSettings {
    /// Rejects settings the drop engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.cooldown_secs < 0 {
            return Err(Error::Config {
                message: format!("drop.cooldown_secs must not be negative, got {}", self.cooldown_secs),
            });
        }
        if self.min_coins < 0 || self.min_coins > self.max_coins {
            return Err(Error::Config {
                message: format!(
                    "drop coin range {}..={} is invalid",
                    self.min_coins, self.max_coins
                ),
            });
        }
        if let Some(bad) = self
            .weights
            .iter()
            .find(|w| !w.weight.is_finite() || w.weight < 0.0)
        {
            return Err(Error::Config {
                message: format!("weight for rarity '{}' must be a non-negative number", bad.rarity),
            });
        }
        Ok(())
    }
}

/// Parses a game configuration from TOML text and validates it.
pub fn parse_config(contents: &str) -> Result<GameConfig> {
    let config: GameConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.drop.validate()?;
    Ok(config)
}

/// Loads the game configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - The drop settings are inconsistent
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<GameConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Loading game configuration from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;
    parse_config(&contents)
}

/// Loads the game configuration from `CARD_BUDDY_CONFIG`, or `./config.toml` by default.
///
/// A missing default file is not an error: the built-in defaults are used instead.
pub fn load_default_config() -> Result<GameConfig> {
    match std::env::var("CARD_BUDDY_CONFIG") {
        Ok(path) => load_config(path),
        Err(_) if Path::new("config.toml").exists() => load_config("config.toml"),
        Err(_) => {
            tracing::warn!("No config.toml found, using built-in defaults");
            Ok(GameConfig::default())
        }
    }
}
