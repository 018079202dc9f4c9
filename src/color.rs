/// Convert a normalized RGB triple to HSV, every channel in [0, 1].
///
/// Achromatic colors get hue 0; black gets saturation 0.
pub fn rgb_to_hsv([r, g, b]: [f64; 3]) -> [f64; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max > 0.0 { delta / max } else { 0.0 };
    let hue = if delta > 0.0 {
        let sector = if r == max {
            (g - b) / delta
        } else if g == max {
            2.0 + (b - r) / delta
        } else {
            4.0 + (r - g) / delta
        };
        (sector / 6.0).rem_euclid(1.0)
    } else {
        0.0
    };

    [hue, saturation, max]
}

/// Scale a normalized channel to 0-255.
pub fn unit_to_u8(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Scale a normalized RGB triple to 0-255.
pub fn rgb_to_u8(rgb: [f64; 3]) -> [u8; 3] {
    rgb.map(unit_to_u8)
}

/// Format an 0-255 RGB triple as `#rrggbb`.
pub fn rgb_to_hex([r, g, b]: [u8; 3]) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}
