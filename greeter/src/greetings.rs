use crate::errors::{Error, Result};
use rand::Rng;
use serde::Deserialize;

/// Catalog bundled into the binary.
pub static EMBEDDED_GREETINGS: &[u8] = include_bytes!("../greetings.json");

/// Lookup key that selects a random greeting.
pub const RANDOM: &str = "random";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Greeting {
    pub language: String,
    pub greeting: String,
}

/// Immutable list of greetings, in source order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    greetings: Vec<Greeting>,
}

impl Catalog {
    /// Parses a JSON array of `{"language", "greeting"}` objects.
    pub fn load(source: &[u8]) -> Result<Self> {
        let greetings = serde_json::from_slice::<Vec<Greeting>>(source)
            .map_err(|e| Error::Config(format!("invalid greeting catalog: {}", e)))?;
        Ok(Self { greetings })
    }

    pub fn embedded() -> Result<Self> {
        Self::load(EMBEDDED_GREETINGS)
    }

    pub fn len(&self) -> usize {
        self.greetings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.greetings.is_empty()
    }

    pub fn greetings(&self) -> &[Greeting] {
        &self.greetings
    }

    /// `"random"` picks uniformly; anything else is the first exact language match.
    pub fn select(&self, key: &str) -> Result<&Greeting> {
        if self.greetings.is_empty() {
            return Err(Error::NotFound("no greetings available".to_string()));
        }

        if key == RANDOM {
            let index = rand::thread_rng().gen_range(0..self.greetings.len());
            return Ok(&self.greetings[index]);
        }

        self.greetings
            .iter()
            .find(|g| g.language == key)
            .ok_or_else(|| Error::NotFound(format!("no greeting found for language '{}'", key)))
    }
}
