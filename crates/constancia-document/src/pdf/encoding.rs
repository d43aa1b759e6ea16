// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text encoding for content streams.
//
// The page font declares `/WinAnsiEncoding`, so every string is transcoded to
// that single-byte code page before it is escaped and written. One character
// always becomes one byte, which keeps the layout engine's per-character
// widths and the emitted byte length in agreement.

/// Byte written for characters the encoding cannot represent.
pub const REPLACEMENT: u8 = b'?';

/// Map one character to its WinAnsiEncoding byte.
pub fn win_ansi_byte(ch: char) -> Option<u8> {
    let code = ch as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        0x09 | 0x0A | 0x0D => Some(code as u8),
        _ => win_ansi_high(ch),
    }
}

/// The 0x80-0x9F block, where WinAnsi departs from Latin-1.
fn win_ansi_high(ch: char) -> Option<u8> {
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
        '–' => 0x96,
        '—' => 0x97,
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

/// Transcode `text` to WinAnsiEncoding, replacing unmappable characters.
pub fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| win_ansi_byte(ch).unwrap_or(REPLACEMENT))
        .collect()
}

/// Encode `text` as a complete PDF literal string, parentheses included.
pub fn literal_string(text: &str) -> Vec<u8> {
    let encoded = to_win_ansi(text);
    let mut out = Vec::with_capacity(encoded.len() + 2);
    out.push(b'(');
    for byte in encoded {
        match byte {
            b'\\' | b'(' | b')' => {
                out.push(b'\\');
                out.push(byte);
            }
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            _ => out.push(byte),
        }
    }
    out.push(b')');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through() {
        assert_eq!(to_win_ansi("Caso COP-00001"), b"Caso COP-00001");
    }

    #[test]
    fn spanish_accents_become_single_bytes() {
        assert_eq!(to_win_ansi("Número"), vec![b'N', 0xFA, b'm', b'e', b'r', b'o']);
        assert_eq!(to_win_ansi("expedición").len(), "expedición".chars().count());
        assert_eq!(to_win_ansi("¿Año?"), vec![0xBF, b'A', 0xF1, b'o', b'?']);
    }

    #[test]
    fn windows_block_is_mapped() {
        assert_eq!(
            to_win_ansi("€ — “ok”"),
            vec![0x80, b' ', 0x97, b' ', 0x93, b'o', b'k', 0x94]
        );
    }

    #[test]
    fn unmappable_characters_are_replaced() {
        assert_eq!(to_win_ansi("漢字✓"), b"???");
    }

    #[test]
    fn literal_escapes_delimiters() {
        assert_eq!(literal_string(r"a(b)\c"), br"(a\(b\)\\c)".to_vec());
        assert_eq!(literal_string("x\ny"), b"(x\\ny)".to_vec());
    }
}
