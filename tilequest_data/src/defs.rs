//! Canonical document layouts read by the engine.
//!
//! Each function returns the required-key [`Schema`] for one document kind.
//! The JSON literals mirror the documents themselves, so a designer can read
//! a schema next to a data file and see what is expected.

use serde_json::json;

use crate::Schema;

/// Sub-directory (under the assets root) holding image files.
pub const IMAGES_DIR: &str = "images";
/// Sub-directory holding font files.
pub const FONTS_DIR: &str = "fonts";
/// Sub-directory holding level documents.
pub const MAPS_DIR: &str = "maps";
/// Sub-directory holding configuration and question documents.
pub const CONFIG_DIR: &str = "config";
/// Name of the main configuration document inside [`CONFIG_DIR`].
pub const CONFIG_DOCUMENT: &str = "config.json";
/// Name of the screen layout document inside [`CONFIG_DIR`].
pub const SCREEN_DOCUMENT: &str = "screen.json";

/// A tile map: the `map` section of a level.
pub fn map_schema() -> Schema {
    Schema::from(json!([
        "solids",
        "legend",
        "tiles",
        {"dimensions": ["width", "height"]},
        {"player_start": ["x", "y"]},
    ]))
}

/// The monster section of a level.
pub fn monsters_schema() -> Schema {
    Schema::keys(["image", "number"])
}

/// A single monster built from the monster section plus its id.
pub fn monster_schema() -> Schema {
    Schema::keys(["id", "image"])
}

/// An item entry (also applied to every element of a level's `items`).
pub fn item_schema() -> Schema {
    Schema::keys(["id", "title", "image", "message"])
}

/// A full level document.
pub fn level_schema() -> Schema {
    Schema::Map(vec![
        ("map".into(), map_schema()),
        ("monsters".into(), monsters_schema()),
        ("items".into(), item_schema()),
    ])
}

/// The player description.
pub fn player_schema() -> Schema {
    Schema::keys(["image"])
}

/// The game configuration document.
pub fn config_schema() -> Schema {
    Schema::from(json!([
        "start",
        "player_image",
        "splash_image",
        "endscreen_image",
        "score_font",
        "music",
        {"popup_box": ["x", "y", "char_width", "char_height"]},
        {"keypress_repeat": ["delay", "interval"]},
        "questions",
        "monster_delay",
        {"joystick": ["delay", "pressed"]},
    ]))
}

/// A question document: a sequence of multiple-choice questions.
pub fn questions_schema() -> Schema {
    Schema::keys(["question", "answers", "correct"])
}

/// Display surface and camera settings.
pub fn screen_schema() -> Schema {
    Schema::keys([
        "title",
        "width",
        "height",
        "tile_width",
        "tile_height",
        "map_display_width",
        "map_display_height",
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate;

    #[test]
    fn level_schema_accepts_minimal_level() {
        let level = json!({
            "map": {
                "solids": [1],
                "legend": {"0": "grass.png", "1": "rock.png"},
                "tiles": [0, 1, 0, 0],
                "dimensions": {"width": 2, "height": 2},
                "player_start": {"x": 0, "y": 0},
            },
            "monsters": {"image": "ghost.png", "number": 1},
            "items": [
                {"id": "key", "title": "Key", "image": "key.png", "message": "A key."},
            ],
        });
        assert!(validate(&level, &level_schema()));
    }

    #[test]
    fn level_schema_rejects_item_without_message() {
        let level = json!({
            "map": {
                "solids": [],
                "legend": {},
                "tiles": [0],
                "dimensions": {"width": 1, "height": 1},
                "player_start": {"x": 0, "y": 0},
            },
            "monsters": {"image": "ghost.png", "number": 1},
            "items": [{"id": "key", "title": "Key", "image": "key.png"}],
        });
        assert!(!validate(&level, &level_schema()));
    }

    #[test]
    fn config_schema_requires_nested_sections() {
        let mut config = json!({
            "start": "level1.json",
            "player_image": "p.png",
            "splash_image": "s.png",
            "endscreen_image": "e.png",
            "score_font": ["font.ttf", 16],
            "music": null,
            "popup_box": {"x": 1, "y": 1, "char_width": 20, "char_height": 8},
            "keypress_repeat": {"delay": 200, "interval": 50},
            "questions": "questions.json",
            "monster_delay": 500,
            "joystick": {"delay": 150, "pressed": 0},
        });
        assert!(validate(&config, &config_schema()));
        config["keypress_repeat"].as_object_mut().unwrap().remove("interval");
        assert!(!validate(&config, &config_schema()));
    }
}
