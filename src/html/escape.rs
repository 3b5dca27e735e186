//! HTML attribute escaping and entity decoding.

use std::borrow::Cow;

/// Characters that require escaping inside a quoted attribute value.
const ESCAPE_CHARS: [char; 4] = ['<', '>', '&', '"'];

/// Get the HTML entity for a special character.
#[inline]
fn escape_char(c: char) -> Option<&'static str> {
    match c {
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '&' => Some("&amp;"),
        '"' => Some("&quot;"),
        _ => None,
    }
}

/// Escape an attribute value for a double-quoted context.
///
/// Uses `Cow` to avoid allocation when no escaping is needed.
#[inline]
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    if !s.contains(ESCAPE_CHARS) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match escape_char(c) {
            Some(entity) => result.push_str(entity),
            None => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Neutralize every `</style` (any case) inside raw style text.
pub fn escape_style_text(content: &str) -> Cow<'_, str> {
    let lower = content.to_ascii_lowercase();
    if !lower.contains("</style") {
        return Cow::Borrowed(content);
    }

    let mut result = String::with_capacity(content.len() + 4);
    let mut last = 0;
    for (i, _) in lower.match_indices("</style") {
        result.push_str(&content[last..i]);
        result.push_str("<\\/");
        last = i + 2;
    }
    result.push_str(&content[last..]);
    Cow::Owned(result)
}

/// Decode HTML entities in an attribute value.
///
/// Handles the common named entities and numeric character references;
/// anything unrecognized is kept verbatim.
pub fn unescape(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        result.push_str(&rest[..amp]);
        rest = &rest[amp..];

        // Entities are short; a missing or distant ';' means literal '&'
        let Some(semi) = rest[1..].find(';').filter(|&i| i <= 10) else {
            result.push('&');
            rest = &rest[1..];
            continue;
        };
        let entity = &rest[1..=semi];

        let decoded = match entity {
            "lt" => Some('<'),
            "gt" => Some('>'),
            "amp" => Some('&'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{00A0}'),
            e if e.starts_with("#x") || e.starts_with("#X") => {
                u32::from_str_radix(&e[2..], 16).ok().and_then(char::from_u32)
            }
            e if e.starts_with('#') => e[1..].parse().ok().and_then(char::from_u32),
            _ => None,
        };

        match decoded {
            Some(c) => {
                result.push(c);
                rest = &rest[semi + 2..];
            }
            None => {
                result.push('&');
                rest = &rest[1..];
            }
        }
    }
    result.push_str(rest);

    Cow::Owned(result)
}
