// Utility functions to generate consistent tile keys across the application.

use crate::error::{Result, TilePickError};

/// Generate a consistent key for a tile: "zoom-x-y".
pub fn make_tile_key(zoom: u32, x: u32, y: u32) -> String {
    format!("{}-{}-{}", zoom, x, y)
}

/// Generate the key of a sub-tile cell on its parent's 256-unit grid: "i-j".
pub fn make_cell_key(i: u32, j: u32) -> String {
    format!("{}-{}", i, j)
}

/// Parse a "zoom-x-y" key back into its parts.
/// Surrounding whitespace is ignored; anything else than three unsigned integers is rejected.
pub fn parse_tile_key(key: &str) -> Result<(u32, u32, u32)> {
    let mut parts = key.trim().split('-').map(|part| part.parse::<u32>());

    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(Ok(zoom)), Some(Ok(x)), Some(Ok(y)), None) => Ok((zoom, x, y)),
        _ => Err(TilePickError::InvalidTileKey(key.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_keys() {
        assert_eq!(make_tile_key(14, 14552, 6451), "14-14552-6451");
        assert_eq!(make_cell_key(128, 255), "128-255");
    }

    #[test]
    fn test_parse_tile_key() {
        assert_eq!(parse_tile_key("8-227-100").unwrap(), (8, 227, 100));
        assert_eq!(parse_tile_key(" 0-0-0\n").unwrap(), (0, 0, 0));
    }

    #[test]
    fn test_parse_tile_key_rejects_malformed() {
        for key in ["", "8-227", "8-227-100-1", "8-x-100", "-1-0-0", "8--100"] {
            assert!(
                matches!(parse_tile_key(key), Err(TilePickError::InvalidTileKey(_))),
                "key {:?} should be rejected",
                key
            );
        }
    }
}
