//! Chart colours as the terminal encodes them (`0x00BBGGRR`).

/// Special value meaning "no colour".
pub const CLR_NONE: i32 = -1;

/// RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    /// Red component.
    pub r: u8,
    /// Green component.
    pub g: u8,
    /// Blue component.
    pub b: u8,
}

impl Color {
    /// Creates a colour from its components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// Terminal encoding of this colour.
    pub fn to_mt(self) -> i32 {
        (self.b as i32) << 16 | (self.g as i32) << 8 | self.r as i32
    }
}

/// Encodes an optional colour; `None` becomes `CLR_NONE`.
pub fn to_mt_color(color: Option<Color>) -> i32 {
    color.map(Color::to_mt).unwrap_or(CLR_NONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgr_layout() {
        assert_eq!(Color::rgb(0xFF, 0, 0).to_mt(), 0x0000FF);
        assert_eq!(Color::rgb(0, 0, 0xFF).to_mt(), 0xFF0000);
        assert_eq!(to_mt_color(None), CLR_NONE);
    }
}
