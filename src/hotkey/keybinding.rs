//! Key names ↔ X11 keysyms/keycodes, and combination → grab resolution.
//!
//! Names follow the raw names the recorder sees (`"left ctrl"`,
//! `"page up"`, `"f5"`, single characters), so anything recorded can be
//! bound again.

use crate::keys::{Combination, Modifier};
use crate::provider::ProviderError;

pub const SHIFT_MASK: u16 = 0x0001;
pub const CONTROL_MASK: u16 = 0x0004;
pub const MOD1_MASK: u16 = 0x0008; // Alt

/// Modifier bits that take part in matching. Lock bits are ignored.
pub const BINDING_MODS: u16 = SHIFT_MASK | CONTROL_MASK | MOD1_MASK;

const XK_F1: u32 = 0xffbe;
const F_KEYS: u32 = 24;

/// Named (non-printable) keysyms.
const NAMED_KEYSYMS: &[(&str, u32)] = &[
    ("space", 0x0020),
    ("plus", 0x002b),
    ("backspace", 0xff08),
    ("tab", 0xff09),
    ("enter", 0xff0d),
    ("pause", 0xff13),
    ("scroll lock", 0xff14),
    ("esc", 0xff1b),
    ("home", 0xff50),
    ("left", 0xff51),
    ("up", 0xff52),
    ("right", 0xff53),
    ("down", 0xff54),
    ("page up", 0xff55),
    ("page down", 0xff56),
    ("end", 0xff57),
    ("print screen", 0xff61),
    ("insert", 0xff63),
    ("menu", 0xff67),
    ("num lock", 0xff7f),
    ("alt gr", 0xfe03),
    ("left shift", 0xffe1),
    ("right shift", 0xffe2),
    ("left ctrl", 0xffe3),
    ("right ctrl", 0xffe4),
    ("caps lock", 0xffe5),
    ("left alt", 0xffe9),
    ("right alt", 0xffea),
    ("left windows", 0xffeb),
    ("right windows", 0xffec),
    ("delete", 0xffff),
];

/// Raw key name for a keysym, if it has one.
pub fn keysym_name(keysym: u32) -> Option<String> {
    if let Some((name, _)) = NAMED_KEYSYMS.iter().find(|(_, sym)| *sym == keysym) {
        return Some((*name).to_string());
    }
    if (XK_F1..XK_F1 + F_KEYS).contains(&keysym) {
        return Some(format!("f{}", keysym - XK_F1 + 1));
    }
    // Latin-1 printable keysyms equal their code point.
    char::from_u32(keysym)
        .filter(|c| c.is_ascii_graphic())
        .map(|c| c.to_ascii_lowercase().to_string())
}

/// Keysym for a canonical token.
pub fn token_keysym(token: &str) -> Option<u32> {
    let alias = match token {
        "return" => "enter",
        "escape" => "esc",
        "ctrl" => "left ctrl",
        "alt" => "left alt",
        "shift" => "left shift",
        "del" => "delete",
        other => other,
    };
    if let Some((_, sym)) = NAMED_KEYSYMS.iter().find(|(name, _)| *name == alias) {
        return Some(*sym);
    }

    let mut chars = alias.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return c.is_ascii_graphic().then(|| c.to_ascii_lowercase() as u32);
    }

    let n: u32 = alias.strip_prefix('f')?.parse().ok()?;
    (1..=F_KEYS).contains(&n).then(|| XK_F1 + n - 1)
}

fn modifier_mask(m: Modifier) -> u16 {
    match m {
        Modifier::Ctrl => CONTROL_MASK,
        Modifier::Alt => MOD1_MASK,
        Modifier::Shift => SHIFT_MASK,
    }
}

/// Left and right keysyms of a modifier.
fn modifier_keysyms(m: Modifier) -> [u32; 2] {
    match m {
        Modifier::Ctrl => [0xffe3, 0xffe4],
        Modifier::Alt => [0xffe9, 0xffea],
        Modifier::Shift => [0xffe1, 0xffe2],
    }
}

fn mask_of(modifiers: impl IntoIterator<Item = Modifier>) -> u16 {
    modifiers.into_iter().map(modifier_mask).fold(0, |acc, m| acc | m)
}

/// Keyboard mapping snapshot from `GetKeyboardMapping`.
#[derive(Debug, Clone)]
pub struct Keymap {
    min_keycode: u8,
    per_keycode: u8,
    keysyms: Vec<u32>,
}

impl Keymap {
    pub fn new(min_keycode: u8, per_keycode: u8, keysyms: Vec<u32>) -> Self {
        Self {
            min_keycode,
            per_keycode: per_keycode.max(1),
            keysyms,
        }
    }

    /// Unshifted keysym of `keycode`.
    pub fn keysym(&self, keycode: u8) -> Option<u32> {
        let row = usize::from(keycode.checked_sub(self.min_keycode)?);
        self.keysyms
            .get(row * usize::from(self.per_keycode))
            .copied()
            .filter(|&sym| sym != 0)
    }

    /// First keycode producing `keysym`, unshifted columns preferred.
    pub fn keycode(&self, keysym: u32) -> Option<u8> {
        let per = usize::from(self.per_keycode);
        for column in 0..per {
            for (row, syms) in self.keysyms.chunks(per).enumerate() {
                if syms.get(column) == Some(&keysym) {
                    return u8::try_from(row + usize::from(self.min_keycode)).ok();
                }
            }
        }
        None
    }
}

/// One X11 key grab: a keycode plus the modifier mask that must be held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Canonical combination string this grab belongs to.
    pub raw: String,
    pub modifiers: u16,
    pub keycode: u8,
}

impl Binding {
    /// Resolve `combination` against `keymap` into the grabs that
    /// together implement it.
    ///
    /// A combination with one non-modifier key is a single grab. A
    /// modifier-only combination grabs both keys of every member
    /// modifier with the others as mask, so `ctrl+shift` fires whichever
    /// side or order the user presses them in.
    pub fn resolve(combination: &str, keymap: &Keymap) -> Result<Vec<Self>, ProviderError> {
        let combo = Combination::parse(combination)
            .map_err(|_| ProviderError::Parse(combination.to_string()))?;
        let raw = combo.to_string();

        let keys: Vec<&str> = combo.keys().collect();
        let modifiers: Vec<Modifier> = combo.modifiers().collect();

        match keys.as_slice() {
            [key] => {
                let keycode = token_keysym(key)
                    .and_then(|sym| keymap.keycode(sym))
                    .ok_or_else(|| ProviderError::UnknownKey {
                        combination: raw.clone(),
                        key: (*key).to_string(),
                    })?;
                Ok(vec![Self {
                    raw,
                    modifiers: mask_of(modifiers),
                    keycode,
                }])
            }
            [] => Self::modifier_only(raw, &modifiers, keymap),
            _ => Err(ProviderError::Unsupported {
                combination: raw,
                reason: "more than one non-modifier key",
            }),
        }
    }

    fn modifier_only(
        raw: String,
        modifiers: &[Modifier],
        keymap: &Keymap,
    ) -> Result<Vec<Self>, ProviderError> {
        let mut bindings: Vec<Self> = Vec::new();
        for &trigger in modifiers {
            let mask = mask_of(modifiers.iter().copied().filter(|&m| m != trigger));
            for sym in modifier_keysyms(trigger) {
                let Some(keycode) = keymap.keycode(sym) else {
                    continue;
                };
                if !bindings.iter().any(|b| b.keycode == keycode && b.modifiers == mask) {
                    bindings.push(Self {
                        raw: raw.clone(),
                        modifiers: mask,
                        keycode,
                    });
                }
            }
        }

        match modifiers.last() {
            Some(_) if !bindings.is_empty() => Ok(bindings),
            Some(last) => Err(ProviderError::UnknownKey {
                combination: raw,
                key: last.token().to_string(),
            }),
            None => Err(ProviderError::Parse(raw)),
        }
    }

    /// Whether a key press with `keycode` and modifier `state` triggers
    /// this grab.
    pub fn matches(&self, keycode: u8, state: u16) -> bool {
        self.keycode == keycode && (state & BINDING_MODS) == self.modifiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // keycode 8: a/A, 9: left ctrl, 10: left shift, 11: f1, 12: t/T,
    // 13: left alt, 14: right ctrl, 15: right shift, 16: plus/asterisk
    fn keymap() -> Keymap {
        Keymap::new(
            8,
            2,
            vec![
                0x61, 0x41, 0xffe3, 0, 0xffe1, 0, 0xffbe, 0, 0x74, 0x54, 0xffe9, 0, 0xffe4, 0,
                0xffe2, 0, 0x2b, 0x2a,
            ],
        )
    }

    fn single(combination: &str) -> Binding {
        let mut bindings = Binding::resolve(combination, &keymap()).unwrap();
        assert_eq!(bindings.len(), 1, "{combination}");
        bindings.remove(0)
    }

    fn fires(bindings: &[Binding], keycode: u8, state: u16) -> bool {
        bindings.iter().any(|b| b.matches(keycode, state))
    }

    #[test]
    fn keysym_names() {
        assert_eq!(keysym_name(0x61).as_deref(), Some("a"));
        assert_eq!(keysym_name(0x41).as_deref(), Some("a"));
        assert_eq!(keysym_name(0x31).as_deref(), Some("1"));
        assert_eq!(keysym_name(0x20).as_deref(), Some("space"));
        assert_eq!(keysym_name(0x2b).as_deref(), Some("plus"));
        assert_eq!(keysym_name(0xffe4).as_deref(), Some("right ctrl"));
        assert_eq!(keysym_name(0xffc2).as_deref(), Some("f5"));
        assert_eq!(keysym_name(0x1008ff11), None);
    }

    #[test]
    fn token_keysyms() {
        assert_eq!(token_keysym("a"), Some(0x61));
        assert_eq!(token_keysym("-"), Some(0x2d));
        assert_eq!(token_keysym("plus"), Some(0x2b));
        assert_eq!(token_keysym("f12"), Some(0xffc9));
        assert_eq!(token_keysym("page up"), Some(0xff55));
        assert_eq!(token_keysym("ctrl"), Some(0xffe3));
        assert_eq!(token_keysym("escape"), Some(0xff1b));
        assert_eq!(token_keysym("f25"), None);
        assert_eq!(token_keysym("hyper"), None);
    }

    #[test]
    fn keymap_lookups() {
        let km = keymap();
        assert_eq!(km.keysym(8), Some(0x61));
        assert_eq!(km.keysym(9), Some(0xffe3));
        assert_eq!(km.keysym(7), None);
        assert_eq!(km.keysym(200), None);
        assert_eq!(km.keycode(0x74), Some(12));
        assert_eq!(km.keycode(0x54), Some(12));
        assert_eq!(km.keycode(0xffff), None);
    }

    #[test]
    fn resolve_key_with_modifiers() {
        let b = single("Alt+Ctrl+T");
        assert_eq!(b.raw, "ctrl+alt+t");
        assert_eq!(b.keycode, 12);
        assert_eq!(b.modifiers, CONTROL_MASK | MOD1_MASK);
    }

    #[test]
    fn recorded_plus_key_binds() {
        let b = single("ctrl++");
        assert_eq!(b.raw, "ctrl+plus");
        assert_eq!(b.keycode, 16);
        assert_eq!(b.modifiers, CONTROL_MASK);

        // What the key source reports for that key is bindable again.
        let name = keysym_name(keymap().keysym(16).unwrap()).unwrap();
        assert_eq!(single(&format!("ctrl+{name}")), b);
    }

    #[test]
    fn modifier_only_grabs_every_side() {
        let bindings = Binding::resolve("ctrl+shift", &keymap()).unwrap();
        let mut grabs: Vec<(u8, u16)> =
            bindings.iter().map(|b| (b.keycode, b.modifiers)).collect();
        grabs.sort();
        assert_eq!(
            grabs,
            vec![(9, SHIFT_MASK), (10, CONTROL_MASK), (14, SHIFT_MASK), (15, CONTROL_MASK)]
        );
        assert!(bindings.iter().all(|b| b.raw == "ctrl+shift"));
    }

    #[test]
    fn modifier_only_fires_in_either_order() {
        let bindings = Binding::resolve("shift+ctrl", &keymap()).unwrap();
        // ctrl held, shift pressed
        assert!(fires(&bindings, 10, CONTROL_MASK));
        assert!(fires(&bindings, 15, CONTROL_MASK));
        // shift held, ctrl pressed
        assert!(fires(&bindings, 9, SHIFT_MASK));
        assert!(fires(&bindings, 14, SHIFT_MASK));
        // lone modifier or extra modifier
        assert!(!fires(&bindings, 9, 0));
        assert!(!fires(&bindings, 10, CONTROL_MASK | MOD1_MASK));
    }

    #[test]
    fn modifier_only_skips_missing_keys() {
        // No right alt in the keymap.
        let bindings = Binding::resolve("ctrl+alt", &keymap()).unwrap();
        let mut grabs: Vec<(u8, u16)> =
            bindings.iter().map(|b| (b.keycode, b.modifiers)).collect();
        grabs.sort();
        assert_eq!(grabs, vec![(9, MOD1_MASK), (13, CONTROL_MASK), (14, MOD1_MASK)]);
    }

    #[test]
    fn resolve_failures() {
        let km = keymap();
        assert!(matches!(Binding::resolve("ctrl+", &km), Err(ProviderError::Parse(_))));
        assert!(matches!(
            Binding::resolve("ctrl+a+t", &km),
            Err(ProviderError::Unsupported { .. })
        ));
        assert!(matches!(
            Binding::resolve("ctrl+z", &km),
            Err(ProviderError::UnknownKey { ref key, .. }) if key == "z"
        ));

        let bare = Keymap::new(8, 1, vec![0x61]);
        assert!(matches!(
            Binding::resolve("ctrl+shift", &bare),
            Err(ProviderError::UnknownKey { ref key, .. }) if key == "shift"
        ));
    }

    #[test]
    fn matching_ignores_lock_bits() {
        let b = single("ctrl+a");
        let caps_and_num = 0x0002 | 0x0010;
        assert!(b.matches(8, CONTROL_MASK | caps_and_num));
        assert!(!b.matches(8, CONTROL_MASK | SHIFT_MASK));
        assert!(!b.matches(9, CONTROL_MASK));
    }
}
