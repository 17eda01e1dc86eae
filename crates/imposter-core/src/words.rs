//! Word Pack Registry: the static catalog of themed word pairs.
//!
//! Every pair is two similar-but-distinguishable concepts ("Lion" /
//! "Tiger"), so an imposter's vague clue is plausible without being
//! identical. Packs carry one word list per language; lookups fall back to
//! English when a pack hasn't been translated.

use std::collections::HashMap;

use imposter_protocol::{Locale, PackId};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::DealError;

/// The two words of one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordPair {
    /// Shared by every crew member.
    pub main: String,
    /// Given to imposters.
    pub imposter: String,
}

impl WordPair {
    pub fn new(main: impl Into<String>, imposter: impl Into<String>) -> Self {
        Self {
            main: main.into(),
            imposter: imposter.into(),
        }
    }
}

/// A named collection of word pairs, keyed by language.
#[derive(Debug, Clone)]
pub struct WordPack {
    id: PackId,
    labels: HashMap<String, String>,
    pairs: HashMap<String, Vec<WordPair>>,
}

impl WordPack {
    /// Creates an empty pack. Add content with [`Self::with_label`] and
    /// [`Self::with_pairs`].
    pub fn new(id: PackId) -> Self {
        Self {
            id,
            labels: HashMap::new(),
            pairs: HashMap::new(),
        }
    }

    /// Adds a display label for `language`.
    pub fn with_label(mut self, language: &str, label: impl Into<String>) -> Self {
        self.labels.insert(language.to_ascii_lowercase(), label.into());
        self
    }

    /// Adds word pairs for `language`.
    pub fn with_pairs(mut self, language: &str, pairs: impl IntoIterator<Item = WordPair>) -> Self {
        self.pairs
            .entry(language.to_ascii_lowercase())
            .or_default()
            .extend(pairs);
        self
    }

    pub fn id(&self) -> &PackId {
        &self.id
    }

    /// Display label in `locale`, falling back to English, then the id.
    pub fn label(&self, locale: &Locale) -> &str {
        self.labels
            .get(&locale.language())
            .or_else(|| self.labels.get(Locale::DEFAULT))
            .map_or(self.id.as_str(), String::as_str)
    }

    /// Word pairs for `locale`, falling back to English.
    pub fn pairs(&self, locale: &Locale) -> &[WordPair] {
        self.pairs
            .get(&locale.language())
            .or_else(|| self.pairs.get(Locale::DEFAULT))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Languages this pack has word lists for.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.pairs.keys().map(String::as_str)
    }
}

/// The catalog of packs, keyed by [`PackId`].
///
/// [`WordPackRegistry::builtin`] is what the server and the pass-and-play
/// mode use; [`WordPackRegistry::new`] + [`WordPackRegistry::insert`] build
/// custom catalogs (tests use tiny ones).
#[derive(Debug, Clone, Default)]
pub struct WordPackRegistry {
    packs: Vec<WordPack>,
}

impl WordPackRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a pack. Insertion order is the listing order.
    pub fn insert(&mut self, pack: WordPack) {
        match self.packs.iter_mut().find(|p| p.id == pack.id) {
            Some(existing) => *existing = pack,
            None => self.packs.push(pack),
        }
    }

    /// The built-in catalog.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for def in BUILTIN {
            let mut pack = WordPack::new(PackId::new(def.id));
            for (lang, label) in def.labels {
                pack = pack.with_label(lang, *label);
            }
            for (lang, pairs) in def.pairs {
                pack = pack.with_pairs(
                    lang,
                    pairs.iter().map(|(main, imp)| WordPair::new(*main, *imp)),
                );
            }
            registry.insert(pack);
        }
        registry
    }

    pub fn get(&self, id: &PackId) -> Option<&WordPack> {
        self.packs.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &PackId) -> bool {
        self.get(id).is_some()
    }

    /// All packs in listing order.
    pub fn packs(&self) -> impl Iterator<Item = &WordPack> {
        self.packs.iter()
    }

    /// Samples one pair uniformly from the pack's list for `locale`.
    ///
    /// # Errors
    /// [`DealError::UnknownPack`] if the id isn't registered,
    /// [`DealError::EmptyPack`] if it has no pairs for the locale or English.
    pub fn pick_pair<R: Rng + ?Sized>(
        &self,
        id: &PackId,
        locale: &Locale,
        rng: &mut R,
    ) -> Result<WordPair, DealError> {
        let pack = self
            .get(id)
            .ok_or_else(|| DealError::UnknownPack(id.clone()))?;
        pack.pairs(locale)
            .choose(rng)
            .cloned()
            .ok_or_else(|| DealError::EmptyPack(id.clone()))
    }
}

// ---------------------------------------------------------------------------
// Built-in catalog
// ---------------------------------------------------------------------------

struct PackDef {
    id: &'static str,
    labels: &'static [(&'static str, &'static str)],
    pairs: &'static [(&'static str, &'static [(&'static str, &'static str)])],
}

const BUILTIN: &[PackDef] = &[
    PackDef {
        id: "everyday",
        labels: &[("en", "Everyday things"), ("es", "Cosas cotidianas")],
        pairs: &[
            (
                "en",
                &[
                    ("Coffee", "Tea"),
                    ("Pillow", "Blanket"),
                    ("Fork", "Spoon"),
                    ("Sofa", "Armchair"),
                    ("Toothbrush", "Comb"),
                    ("Umbrella", "Raincoat"),
                    ("Backpack", "Suitcase"),
                    ("Shower", "Bathtub"),
                    ("Keys", "Wallet"),
                    ("Candle", "Lamp"),
                    ("Sneakers", "Sandals"),
                    ("Newspaper", "Magazine"),
                ],
            ),
            (
                "es",
                &[
                    ("Café", "Té"),
                    ("Almohada", "Manta"),
                    ("Tenedor", "Cuchara"),
                    ("Sofá", "Sillón"),
                    ("Cepillo de dientes", "Peine"),
                    ("Paraguas", "Impermeable"),
                    ("Mochila", "Maleta"),
                    ("Ducha", "Bañera"),
                    ("Llaves", "Cartera"),
                    ("Vela", "Lámpara"),
                ],
            ),
        ],
    },
    PackDef {
        id: "animals",
        labels: &[("en", "Animals"), ("es", "Animales")],
        pairs: &[
            (
                "en",
                &[
                    ("Lion", "Tiger"),
                    ("Dolphin", "Shark"),
                    ("Horse", "Donkey"),
                    ("Owl", "Eagle"),
                    ("Frog", "Toad"),
                    ("Bee", "Wasp"),
                    ("Crocodile", "Alligator"),
                    ("Rabbit", "Hamster"),
                    ("Penguin", "Seal"),
                    ("Butterfly", "Moth"),
                ],
            ),
            (
                "es",
                &[
                    ("León", "Tigre"),
                    ("Delfín", "Tiburón"),
                    ("Caballo", "Burro"),
                    ("Búho", "Águila"),
                    ("Rana", "Sapo"),
                    ("Abeja", "Avispa"),
                    ("Conejo", "Hámster"),
                    ("Pingüino", "Foca"),
                ],
            ),
        ],
    },
    PackDef {
        id: "food",
        labels: &[("en", "Food & drinks"), ("es", "Comida y bebida")],
        pairs: &[(
            "en",
            &[
                ("Pizza", "Burger"),
                ("Sushi", "Ramen"),
                ("Pancakes", "Waffles"),
                ("Ice cream", "Frozen yogurt"),
                ("Croissant", "Bagel"),
                ("Lemonade", "Orange juice"),
                ("Taco", "Burrito"),
                ("Popcorn", "Chips"),
                ("Cheesecake", "Brownie"),
                ("Wine", "Beer"),
            ],
        )],
    },
    PackDef {
        id: "places",
        labels: &[("en", "Places"), ("es", "Lugares")],
        pairs: &[(
            "en",
            &[
                ("Beach", "Lake"),
                ("Library", "Bookstore"),
                ("Hospital", "Pharmacy"),
                ("Airport", "Train station"),
                ("Cinema", "Theater"),
                ("Gym", "Swimming pool"),
                ("Museum", "Art gallery"),
                ("Castle", "Palace"),
                ("Supermarket", "Street market"),
                ("Zoo", "Aquarium"),
            ],
        )],
    },
];
