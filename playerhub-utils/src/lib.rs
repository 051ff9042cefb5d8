/// Display formatting helpers (progress bars, ordinals, names).
pub mod formatting;
/// Pure input parsers and normalizers.
pub mod parse;
/// Shared time helpers.
pub mod time;
