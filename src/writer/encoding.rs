//! WinAnsi text encoding for base-14 fonts.
//!
//! Base-14 fonts are written with `/WinAnsiEncoding`, so every string shown
//! in a content stream is first mapped to Windows-1252 bytes. Characters with
//! no WinAnsi code point are transliterated when a readable equivalent exists
//! and replaced with `?` otherwise.

use std::borrow::Cow;

/// Map a Unicode code point to its WinAnsi byte.
pub fn unicode_to_winansi(ch: char) -> Option<u8> {
    let code = ch as u32;
    if code < 0x80 || (0xA0..=0xFF).contains(&code) {
        return Some(code as u8);
    }

    // 0x80-0x9F block of Windows-1252
    let byte = match ch {
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '•' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// Readable ASCII stand-ins for symbols WinAnsi cannot carry.
fn transliteration(ch: char) -> Option<&'static str> {
    match ch {
        '₹' => Some("Rs."),
        '₨' => Some("Rs"),
        '\u{2212}' => Some("-"),
        '\u{00A0}' | '\u{2009}' | '\u{202F}' => Some(" "),
        _ => None,
    }
}

/// Replace characters that WinAnsi cannot encode but that have a readable
/// substitute. Text that needs no substitution is borrowed unchanged.
///
/// Measure and encode the returned text so widths match what is drawn.
pub fn transliterate(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|c| transliteration(c).is_some()) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 4);
    for ch in text.chars() {
        match transliteration(ch) {
            Some(sub) => out.push_str(sub),
            None => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Encode text as WinAnsi bytes, transliterating first and replacing
/// anything left over with `?`.
pub fn encode_winansi(text: &str) -> Vec<u8> {
    transliterate(text)
        .chars()
        .map(|c| unicode_to_winansi(c).unwrap_or(b'?'))
        .collect()
}
