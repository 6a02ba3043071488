//! Body layers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Region of a differentiated body.
///
/// `Bulk` is the whole-body composition, `Core` the metallic phase and `Mantle`
/// the silicate phase. `Crust` is carried for upstream normalisation only; the
/// equilibrium solver never writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Bulk,
    Core,
    Mantle,
    Crust,
}

impl Layer {
    pub const ALL: [Layer; 4] = [Layer::Bulk, Layer::Core, Layer::Mantle, Layer::Crust];

    pub fn key(&self) -> &'static str {
        match self {
            Layer::Bulk => "bulk",
            Layer::Core => "core",
            Layer::Mantle => "mantle",
            Layer::Crust => "crust",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layers_order_bulk_first() {
        let mut layers = vec![Layer::Mantle, Layer::Crust, Layer::Bulk, Layer::Core];
        layers.sort();
        assert_eq!(layers, Layer::ALL.to_vec());
    }

    #[test]
    fn serde_uses_lowercase_keys() {
        let json = serde_json::to_string(&Layer::Mantle).unwrap();
        assert_eq!(json, "\"mantle\"");
        let parsed: Layer = serde_json::from_str("\"core\"").unwrap();
        assert_eq!(parsed, Layer::Core);
    }
}
