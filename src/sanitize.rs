//! Filename sanitization for storage keys.
//!
//! Output filenames become object-storage keys, so the transformation must be
//! deterministic and total: any input string yields a safe ASCII-ish name.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use unicode_normalization::UnicodeNormalization;

/// Vietnamese precomposed letters mapped to their bare Latin base letter.
/// Applied before generic mark-stripping: đ/Đ carry no combining mark and
/// would otherwise survive untouched.
static VIETNAMESE_FOLD: Lazy<FxHashMap<char, char>> = Lazy::new(|| {
    const GROUPS: &[(&str, char)] = &[
        ("àáạảãâầấậẩẫăằắặẳẵ", 'a'),
        ("èéẹẻẽêềếệểễ", 'e'),
        ("ìíịỉĩ", 'i'),
        ("òóọỏõôồốộổỗơờớợởỡ", 'o'),
        ("ùúụủũưừứựửữ", 'u'),
        ("ỳýỵỷỹ", 'y'),
        ("đ", 'd'),
        ("ÀÁẠẢÃÂẦẤẬẨẪĂẰẮẶẲẴ", 'A'),
        ("ÈÉẸẺẼÊỀẾỆỂỄ", 'E'),
        ("ÌÍỊỈĨ", 'I'),
        ("ÒÓỌỎÕÔỒỐỘỔỖƠỜỚỢỞỠ", 'O'),
        ("ÙÚỤỦŨƯỪỨỰỬỮ", 'U'),
        ("ỲÝỴỶỸ", 'Y'),
        ("Đ", 'D'),
    ];

    let mut m = FxHashMap::default();
    for (letters, base) in GROUPS {
        for c in letters.chars() {
            m.insert(c, *base);
        }
    }
    m
});

/// Check if a character is a Unicode combining mark (diacritical mark).
/// Used to filter out accents during normalization.
pub fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0xFE20..=0xFE2F)
}

/// Generate a safe filename by folding Vietnamese letters to ASCII, stripping
/// diacritics, removing special characters, and replacing spaces with hyphens.
///
/// Steps, in order:
/// 1. Fold Vietnamese precomposed letters through the override table;
///    NFKD-decompose everything else and drop combining marks.
/// 2. Keep only alphanumerics, space, `-`, `_`, `.`.
/// 3. Replace spaces with hyphens.
/// 4. Collapse consecutive hyphens and trim leading/trailing ones.
pub fn sanitize_filename(name: &str) -> String {
    let mut folded = String::with_capacity(name.len());
    for c in name.chars() {
        if let Some(&base) = VIETNAMESE_FOLD.get(&c) {
            folded.push(base);
        } else {
            for d in std::iter::once(c).nfkd() {
                if !is_combining_mark(d) {
                    folded.push(d);
                }
            }
        }
    }

    let safe: String = folded
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.'))
        .collect();

    let mut result = safe.replace(' ', "-");
    while result.contains("--") {
        result = result.replace("--", "-");
    }

    result.trim_matches('-').to_string()
}
