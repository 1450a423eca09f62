use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::error::{PipelineError, Result};

/// One ramp entry: 3 (RGB) or 4 (RGBA) channel values.
pub type Colour = Vec<u8>;

/// ColorBrewer-style scheme table: scheme name, then bin count (as a string
/// key, matching the JSON source), then the ordered colour list.
#[derive(Debug, Clone, Deserialize)]
pub struct ColourTable(HashMap<String, HashMap<String, Vec<Colour>>>);

impl ColourTable {
    /// The table shipped with the binary.
    pub fn builtin() -> anyhow::Result<ColourTable> {
        serde_json::from_str(include_str!("../data/colorbrewer.json"))
            .context("embedded colour table is not valid JSON")
    }

    /// Load a scheme table from a user-supplied JSON file.
    pub fn load(path: &Path) -> anyhow::Result<ColourTable> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read colour table {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse colour table {}", path.display()))
    }

    /// Look up the ramp for `scheme` at `bins` entries.
    pub fn ramp(&self, scheme: &str, bins: usize) -> Result<&[Colour]> {
        let missing = || PipelineError::UnknownColourScheme {
            scheme: scheme.to_string(),
            bins,
        };
        let ramp = self
            .0
            .get(scheme)
            .and_then(|by_bins| by_bins.get(&bins.to_string()))
            .ok_or_else(missing)?;
        if ramp.len() != bins {
            return Err(missing());
        }
        Ok(ramp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_has_default_scheme() {
        let table = ColourTable::builtin().unwrap();
        let ramp = table.ramp("MyViridis", 9).unwrap();
        assert_eq!(ramp.len(), 9);
        assert_eq!(ramp[0], vec![68, 1, 84]);
    }

    #[test]
    fn unknown_scheme_is_an_error() {
        let table = ColourTable::builtin().unwrap();
        assert!(matches!(
            table.ramp("NotAScheme", 9),
            Err(PipelineError::UnknownColourScheme { .. })
        ));
        assert!(matches!(
            table.ramp("MyViridis", 7),
            Err(PipelineError::UnknownColourScheme { .. })
        ));
    }

    #[test]
    fn four_channel_colours_deserialize() {
        let table: ColourTable =
            serde_json::from_str(r#"{"Test": {"2": [[0, 0, 0, 255], [255, 255, 255, 255]]}}"#)
                .unwrap();
        let ramp = table.ramp("Test", 2).unwrap();
        assert_eq!(ramp[1], vec![255, 255, 255, 255]);
    }
}
