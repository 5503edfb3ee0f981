//! Genre model

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref HEX_COLOR: Regex = Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap();
}

/// A catalog tag
///
/// Names are unique case-insensitively. A genre cannot be deleted while any
/// song references its name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genre {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default = "default_color")]
    pub color_hex: String,
    #[serde(default)]
    pub description: String,
}

fn default_color() -> String {
    "#808080".to_string()
}

impl Genre {
    pub fn new(name: String) -> Self {
        Self {
            id: 0,
            name,
            color_hex: default_color(),
            description: String::new(),
        }
    }

    /// Name key used for case-insensitive uniqueness comparison
    pub fn name_key(&self) -> String {
        self.name.trim().to_lowercase()
    }

    pub fn has_valid_color(&self) -> bool {
        HEX_COLOR.is_match(&self.color_hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_validation() {
        let mut g = Genre::new("Jazz".into());
        assert!(g.has_valid_color());

        g.color_hex = "#12AB3f".into();
        assert!(g.has_valid_color());

        g.color_hex = "red".into();
        assert!(!g.has_valid_color());

        g.color_hex = "#12345".into();
        assert!(!g.has_valid_color());
    }
}
