use palette::Srgb;

pub type Color = Srgb<u8>;

/// Fallback when neither the primitive nor its layer carries a usable color
pub const DEFAULT_COLOR: Color = Srgb::new(0x33, 0x88, 0xff);

/// Parse `#rrggbb` / `#rgb` (the `#` is optional)
pub fn parse_color(hex: &str) -> Option<Color> {
    hex.trim().parse::<Color>().ok()
}

pub fn to_hex(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

/// First candidate that parses, else [`DEFAULT_COLOR`]
pub fn first_color<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Color {
    candidates
        .into_iter()
        .flatten()
        .find_map(parse_color)
        .unwrap_or(DEFAULT_COLOR)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fill {
    pub color: Color,
    /// 0.0 (invisible) to 1.0 (opaque)
    pub opacity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathStyle {
    pub border_color: Color,
    /// Stroke width in screen pixels
    pub border_width: f32,
    pub fill: Option<Fill>,
}

impl PathStyle {
    pub fn solid_color(fill_color: Color, opacity: f32) -> Self {
        Self {
            border_color: DEFAULT_COLOR,
            border_width: 0.0,
            fill: Some(Fill {
                color: fill_color,
                opacity: opacity.clamp(0.0, 1.0),
            }),
        }
    }

    pub fn with_border(mut self, border_width: f32, border_color: Color) -> Self {
        self.border_color = border_color;
        self.border_width = border_width.max(0.0);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerIcon {
    pub color: Color,
}
