pub(crate) fn now_ms() -> i64 {
    js_sys::Date::now().round() as i64
}

/// Fallback used when the platform RNG is unavailable.
pub(crate) const DEFAULT_TAG_COLOR: &str = "#AF3FAF";

pub(crate) fn hex_color_from_bytes(bytes: [u8; 3]) -> String {
    format!("#{:02X}{:02X}{:02X}", bytes[0], bytes[1], bytes[2])
}

/// Random `#RRGGBB` for a new tag.
pub(crate) fn random_tag_color() -> String {
    let mut buf = [0u8; 3];
    match getrandom::getrandom(&mut buf) {
        Ok(()) => hex_color_from_bytes(buf),
        Err(_) => DEFAULT_TAG_COLOR.to_string(),
    }
}

/// `#rrggbb`, as stored by the backend and produced by `<input type="color">`.
pub(crate) fn is_hex_color(s: &str) -> bool {
    let Some(hex) = s.strip_prefix('#') else {
        return false;
    };
    hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_color_from_bytes() {
        assert_eq!(hex_color_from_bytes([0, 15, 255]), "#000FFF");
    }

    #[test]
    fn test_is_hex_color() {
        assert!(is_hex_color("#af3faf"));
        assert!(is_hex_color(DEFAULT_TAG_COLOR));
        assert!(!is_hex_color("af3faf"));
        assert!(!is_hex_color("#af3fa"));
        assert!(!is_hex_color("#gg0000"));
    }

    #[test]
    fn test_random_tag_color_is_valid() {
        // getrandom falls back to the OS RNG on native targets.
        for _ in 0..16 {
            assert!(is_hex_color(&random_tag_color()));
        }
    }
}
