//! Key name normalization — raw OS key names to canonical tokens.
//!
//! Raw names come from the key-event stream (e.g. `"Left Ctrl"`,
//! `"right shift"`, `"A"`). Side-specific modifiers collapse to their
//! unsided form. The `+` key becomes `"plus"` so it never collides with
//! the combination separator. Everything else is lower-cased and passed
//! through, so keys this table does not know about still round-trip.

/// Canonical modifier tokens, in the order they render in a combination.
pub const MODIFIER_TOKENS: [&str; 3] = ["ctrl", "alt", "shift"];

/// Tokens never captured by the recorder. They confirm and cancel the
/// recording dialog.
pub const RESERVED_TOKENS: [&str; 4] = ["enter", "return", "esc", "escape"];

/// Token for the `+` key.
pub const PLUS_TOKEN: &str = "plus";

/// Map a raw key-event name to its canonical token.
pub fn normalize(raw: &str) -> String {
    let lower = raw.to_lowercase();
    match lower.as_str() {
        "control" | "left ctrl" | "right ctrl" => "ctrl".to_string(),
        "left alt" | "right alt" => "alt".to_string(),
        "left shift" | "right shift" => "shift".to_string(),
        "+" => PLUS_TOKEN.to_string(),
        _ => lower,
    }
}

/// Whether `token` is one of the canonical modifiers.
pub fn is_modifier(token: &str) -> bool {
    MODIFIER_TOKENS.contains(&token)
}

/// Whether `token` is reserved for dialog confirm/cancel.
pub fn is_reserved(token: &str) -> bool {
    RESERVED_TOKENS.contains(&token)
}
