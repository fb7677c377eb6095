//! Fortune cache
//!
//! Offline store of oracle lines, grouped by category. Lines learned from a
//! live narrative source are pushed to the front; each category keeps at most
//! [`MAX_LINES_PER_CATEGORY`] lines and never holds a duplicate.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::PersistError;

/// Upper bound on cached lines per category
pub const MAX_LINES_PER_CATEGORY: usize = 20;

/// Line shown when a category has nothing cached at all
pub const SILENT_LINE: &str = "The Count says nothing. The candles gutter.";

// ═══════════════════════════════════════════════════════════════════════════
// CATEGORY
// ═══════════════════════════════════════════════════════════════════════════

/// What kind of moment a line comments on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FortuneCategory {
    Win,
    Loss,
    BargainOffer,
    BargainWin,
    BargainLoss,
}

impl FortuneCategory {
    pub const ALL: [FortuneCategory; 5] = [
        Self::Win,
        Self::Loss,
        Self::BargainOffer,
        Self::BargainWin,
        Self::BargainLoss,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Loss => "loss",
            Self::BargainOffer => "bargain_offer",
            Self::BargainWin => "bargain_win",
            Self::BargainLoss => "bargain_loss",
        }
    }

    /// Built-in lines that ship with the game
    pub fn default_lines(&self) -> &'static [&'static str] {
        match self {
            Self::Win => &[
                "The crimson moon grins at your hunger.",
                "Warm coin, warm blood. The crypt approves.",
                "Tonight the dead pay tribute to you.",
                "Your veins run gold beneath the stars.",
            ],
            Self::Loss => &[
                "The dark drinks deep and leaves you dry.",
                "Cold reels. Colder hands.",
                "The bells toll for your purse.",
                "Even the bats turn their backs tonight.",
            ],
            Self::BargainOffer => &[
                "Two goblets wait. One doubles the feast, one bleeds you pale.",
                "Wager the night's spoils on a single sip?",
                "The shadow extends a hand. Will you take it?",
            ],
            Self::BargainWin => &[
                "Fortune kneels before you this once.",
                "You drank from the right cup, mortal.",
                "Twice the blood, twice the glory.",
            ],
            Self::BargainLoss => &[
                "The shadow keeps what it was promised.",
                "Greed opened the coffin lid.",
                "Drained to the last coin.",
            ],
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// CACHE
// ═══════════════════════════════════════════════════════════════════════════

/// Bounded per-category line cache
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FortuneCache {
    lines: BTreeMap<FortuneCategory, Vec<String>>,
}

impl FortuneCache {
    /// Cache with no lines in any category
    pub fn empty() -> Self {
        Self::default()
    }

    /// Cache seeded with the built-in lines
    pub fn with_defaults() -> Self {
        let mut cache = Self::empty();
        for category in FortuneCategory::ALL {
            let lines = category
                .default_lines()
                .iter()
                .map(|l| l.to_string())
                .collect();
            cache.lines.insert(category, lines);
        }
        cache
    }

    pub fn lines(&self, category: FortuneCategory) -> &[String] {
        self.lines.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self, category: FortuneCategory) -> usize {
        self.lines(category).len()
    }

    /// Record a new line at the front of its category.
    ///
    /// Blank lines and lines already cached are ignored. Returns whether the
    /// cache changed.
    pub fn learn(&mut self, category: FortuneCategory, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return false;
        }
        let entry = self.lines.entry(category).or_default();
        if entry.iter().any(|l| l == line) {
            return false;
        }
        entry.insert(0, line.to_string());
        entry.truncate(MAX_LINES_PER_CATEGORY);
        true
    }

    /// Uniformly pick a cached line
    pub fn pick<R: Rng + ?Sized>(&self, category: FortuneCategory, rng: &mut R) -> Option<&str> {
        let lines = self.lines(category);
        if lines.is_empty() {
            return None;
        }
        Some(lines[rng.random_range(0..lines.len())].as_str())
    }

    /// Fold persisted lines in after this cache's own lines, de-duplicating
    /// and capping each category.
    pub fn merge(&mut self, stored: FortuneCache) {
        for (category, stored_lines) in stored.lines {
            let entry = self.lines.entry(category).or_default();
            for line in stored_lines {
                if !entry.contains(&line) {
                    entry.push(line);
                }
            }
            entry.truncate(MAX_LINES_PER_CATEGORY);
        }
    }

    // ───────────────────────────────────────────────────────────────────────
    // Persistence
    // ───────────────────────────────────────────────────────────────────────

    /// Default cache file under the platform data directory
    pub fn default_path() -> Result<PathBuf, PersistError> {
        dirs_next::data_dir()
            .map(|d| d.join("crimson-reels").join("fortunes.json"))
            .ok_or(PersistError::NoDataDir)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Built-in lines merged with whatever is stored at `path`.
    /// A missing or unreadable file yields the defaults alone.
    pub fn load_with_defaults(path: impl AsRef<Path>) -> Self {
        let mut cache = Self::with_defaults();
        match Self::load(path.as_ref()) {
            Ok(stored) => cache.merge(stored),
            Err(e) => log::debug!(
                "[Oracle] no fortune cache at {}: {}",
                path.as_ref().display(),
                e
            ),
        }
        cache
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_defaults_cover_every_category() {
        let cache = FortuneCache::with_defaults();
        for category in FortuneCategory::ALL {
            assert!(cache.len(category) >= 3, "{}", category.as_str());
        }
    }

    #[test]
    fn test_learn_newest_first_and_dedup() {
        let mut cache = FortuneCache::empty();
        assert!(cache.learn(FortuneCategory::Win, "first"));
        assert!(cache.learn(FortuneCategory::Win, "  second  "));
        assert!(!cache.learn(FortuneCategory::Win, "first"));
        assert!(!cache.learn(FortuneCategory::Win, "   "));

        assert_eq!(cache.lines(FortuneCategory::Win), &["second", "first"]);
        assert!(cache.lines(FortuneCategory::Loss).is_empty());
    }

    #[test]
    fn test_learn_caps_category() {
        let mut cache = FortuneCache::with_defaults();
        for i in 0..30 {
            cache.learn(FortuneCategory::Loss, &format!("line {i}"));
        }
        let lines = cache.lines(FortuneCategory::Loss);
        assert_eq!(lines.len(), MAX_LINES_PER_CATEGORY);
        assert_eq!(lines[0], "line 29");
        assert_eq!(lines[19], "line 10");
    }

    #[test]
    fn test_merge_keeps_defaults_first() {
        let mut stored = FortuneCache::empty();
        stored.learn(FortuneCategory::Win, "from disk");
        stored.learn(FortuneCategory::Win, FortuneCategory::Win.default_lines()[0]);

        let mut cache = FortuneCache::with_defaults();
        cache.merge(stored);

        let lines = cache.lines(FortuneCategory::Win);
        assert_eq!(lines[0], FortuneCategory::Win.default_lines()[0]);
        assert_eq!(lines.last().map(String::as_str), Some("from disk"));
        assert_eq!(lines.len(), FortuneCategory::Win.default_lines().len() + 1);
    }

    #[test]
    fn test_pick() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let cache = FortuneCache::with_defaults();
        let line = cache.pick(FortuneCategory::BargainOffer, &mut rng).unwrap();
        assert!(FortuneCategory::BargainOffer.default_lines().contains(&line));
        assert!(FortuneCache::empty().pick(FortuneCategory::Win, &mut rng).is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("fortunes.json");

        let mut cache = FortuneCache::empty();
        cache.learn(FortuneCategory::BargainWin, "persisted");
        cache.save(&path).unwrap();

        let loaded = FortuneCache::load(&path).unwrap();
        assert_eq!(loaded, cache);

        let merged = FortuneCache::load_with_defaults(&path);
        assert!(merged
            .lines(FortuneCategory::BargainWin)
            .contains(&"persisted".to_string()));
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FortuneCache::load_with_defaults(dir.path().join("absent.json"));
        assert_eq!(cache, FortuneCache::with_defaults());
    }
}
