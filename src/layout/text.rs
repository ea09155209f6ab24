/// Approximate advance widths (in ems) for a sans-serif face. The layout is a fixed grid,
/// so this only sizes the fragment header tabs; it never depends on installed fonts.
pub(super) fn char_width_factor(ch: char) -> f32 {
    match ch {
        ' ' => 0.306,
        '.' | ',' | ':' | ';' | '|' | '!' | '\'' | '(' | ')' | '[' | ']' => 0.321,
        'i' | 'j' | 'l' | 'I' => 0.25,
        'f' | 't' | 'r' => 0.34,
        'm' | 'w' => 0.84,
        'M' | 'W' => 0.93,
        '@' | '#' | '%' | '&' => 0.946,
        c if c.is_ascii_uppercase() => 0.68,
        c if c.is_ascii_lowercase() => 0.57,
        c if c.is_ascii_digit() => 0.6,
        c if c.is_ascii() => 0.568,
        // CJK and other wide glyphs
        _ => 1.0,
    }
}

pub(super) fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_width_factor).sum::<f32>() * font_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_width_factor_returns_positive_values() {
        for ch in ['a', 'Z', ' ', '0', '@', '\u{4e2d}'] {
            assert!(char_width_factor(ch) > 0.0, "char {:?} has zero width", ch);
        }
    }

    #[test]
    fn text_width_scales_with_font_size() {
        let w12 = text_width("critical", 12.0);
        let w24 = text_width("critical", 24.0);
        assert!((w24 - w12 * 2.0).abs() < 0.01);
        assert!(text_width("critical", 12.0) > text_width("opt", 12.0));
    }
}
