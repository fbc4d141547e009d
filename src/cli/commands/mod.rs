mod import_ingredients;

pub use import_ingredients::{cmd_import_ingredients, parse_ingredients};
