use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::AdForgeError;

/// Logical canvas width shared by every aspect ratio.
pub const BASE_WIDTH: u32 = 1920;

/// Brand gold used for the default call-to-action button.
pub const BRAND_GOLD: &str = "#ebb308";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AspectRatio {
    Square,
    Portrait2x3,
    Landscape3x2,
    Portrait3x4,
    Landscape4x3,
    Vertical9x16,
    #[default]
    Widescreen16x9,
    Ultrawide21x9,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 8] = [
        AspectRatio::Square,
        AspectRatio::Portrait2x3,
        AspectRatio::Landscape3x2,
        AspectRatio::Portrait3x4,
        AspectRatio::Landscape4x3,
        AspectRatio::Vertical9x16,
        AspectRatio::Widescreen16x9,
        AspectRatio::Ultrawide21x9,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait2x3 => "2:3",
            AspectRatio::Landscape3x2 => "3:2",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Vertical9x16 => "9:16",
            AspectRatio::Widescreen16x9 => "16:9",
            AspectRatio::Ultrawide21x9 => "21:9",
        }
    }

    /// Fixed logical canvas for this ratio. Heights are rounded to whole pixels.
    pub fn canvas(self) -> CanvasSize {
        let height = match self {
            AspectRatio::Square => 1920,
            AspectRatio::Portrait2x3 => 2880,
            AspectRatio::Landscape3x2 => 1280,
            AspectRatio::Portrait3x4 => 2560,
            AspectRatio::Landscape4x3 => 1440,
            AspectRatio::Vertical9x16 => 3413,
            AspectRatio::Widescreen16x9 => 1080,
            AspectRatio::Ultrawide21x9 => 823,
        };
        CanvasSize {
            width: BASE_WIDTH,
            height,
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = AdForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        AspectRatio::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == trimmed)
            .ok_or_else(|| AdForgeError::InvalidConfigValueError {
                field: "aspect_ratio".to_string(),
                value: s.to_string(),
                reason: "Expected one of 1:1, 2:3, 3:2, 3:4, 4:3, 9:16, 16:9, 21:9".to_string(),
            })
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = AdForgeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AspectRatio> for String {
    fn from(value: AspectRatio) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Gold,
    Minimal,
}

impl FromStr for Theme {
    type Err = AdForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "gold" => Ok(Theme::Gold),
            "minimal" => Ok(Theme::Minimal),
            _ => Err(AdForgeError::InvalidConfigValueError {
                field: "theme".to_string(),
                value: s.to_string(),
                reason: "Expected dark, gold or minimal".to_string(),
            }),
        }
    }
}

/// Export bitmap resolution. The logical canvas is 1920 px wide; 1K renders it 1:1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExportResolution {
    #[serde(rename = "1K")]
    OneK,
    #[serde(rename = "2K")]
    TwoK,
    #[default]
    #[serde(rename = "4K")]
    FourK,
}

impl ExportResolution {
    pub fn target_width(self) -> u32 {
        match self {
            ExportResolution::OneK => 1920,
            ExportResolution::TwoK => 2560,
            ExportResolution::FourK => 3840,
        }
    }

    /// Multiplier from logical canvas pixels to output pixels.
    pub fn scale(self) -> f32 {
        self.target_width() as f32 / BASE_WIDTH as f32
    }
}

impl FromStr for ExportResolution {
    type Err = AdForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1K" => Ok(ExportResolution::OneK),
            "2K" => Ok(ExportResolution::TwoK),
            "4K" => Ok(ExportResolution::FourK),
            _ => Err(AdForgeError::InvalidConfigValueError {
                field: "export.resolution".to_string(),
                value: s.to_string(),
                reason: "Expected 1K, 2K or 4K".to_string(),
            }),
        }
    }
}

fn is_auto(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty() || raw.eq_ignore_ascii_case("auto")
}

fn invalid(field: &str, value: &str, reason: &str) -> AdForgeError {
    AdForgeError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Font family override. `Auto` keeps the role's default family.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FontChoice {
    #[default]
    Auto,
    Family(String),
}

impl FromStr for FontChoice {
    type Err = AdForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_auto(s) {
            return Ok(FontChoice::Auto);
        }
        let family = s.trim();
        if family.contains(['<', '>', '"', '\'', ';']) {
            return Err(invalid("font", s, "Font family contains reserved characters"));
        }
        Ok(FontChoice::Family(family.to_string()))
    }
}

impl fmt::Display for FontChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontChoice::Auto => f.write_str("Auto"),
            FontChoice::Family(name) => f.write_str(name),
        }
    }
}

impl TryFrom<String> for FontChoice {
    type Error = AdForgeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FontChoice> for String {
    fn from(value: FontChoice) -> Self {
        value.to_string()
    }
}

/// Font size override in logical pixels, written as `"120px"`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SizeSetting {
    #[default]
    Auto,
    Px(f32),
}

impl FromStr for SizeSetting {
    type Err = AdForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_auto(s) {
            return Ok(SizeSetting::Auto);
        }
        let trimmed = s.trim();
        let number = trimmed.strip_suffix("px").unwrap_or(trimmed).trim();
        match number.parse::<f32>() {
            Ok(px) if px.is_finite() && px > 0.0 => Ok(SizeSetting::Px(px)),
            _ => Err(invalid("size", s, "Expected 'Auto' or a positive pixel size like '120px'")),
        }
    }
}

impl fmt::Display for SizeSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeSetting::Auto => f.write_str("Auto"),
            SizeSetting::Px(px) => write!(f, "{}px", px),
        }
    }
}

impl TryFrom<String> for SizeSetting {
    type Error = AdForgeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SizeSetting> for String {
    fn from(value: SizeSetting) -> Self {
        value.to_string()
    }
}

/// Unitless line-height multiplier, written as `"1.05"`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LineHeightSetting {
    #[default]
    Auto,
    Multiplier(f32),
}

impl FromStr for LineHeightSetting {
    type Err = AdForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_auto(s) {
            return Ok(LineHeightSetting::Auto);
        }
        match s.trim().parse::<f32>() {
            Ok(m) if m.is_finite() && m > 0.0 => Ok(LineHeightSetting::Multiplier(m)),
            _ => Err(invalid(
                "line_height",
                s,
                "Expected 'Auto' or a positive multiplier like '1.2'",
            )),
        }
    }
}

impl fmt::Display for LineHeightSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineHeightSetting::Auto => f.write_str("Auto"),
            LineHeightSetting::Multiplier(m) => write!(f, "{}", m),
        }
    }
}

impl TryFrom<String> for LineHeightSetting {
    type Error = AdForgeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LineHeightSetting> for String {
    fn from(value: LineHeightSetting) -> Self {
        value.to_string()
    }
}

/// Numeric CSS font weight. Accepts `Regular`, `Medium`, `Bold`, `Black` or a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FontWeight(pub u16);

impl FromStr for FontWeight {
    type Err = AdForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let named = match trimmed.to_ascii_lowercase().as_str() {
            "regular" => Some(400),
            "medium" => Some(500),
            "bold" => Some(700),
            "black" => Some(900),
            _ => None,
        };
        if let Some(weight) = named {
            return Ok(FontWeight(weight));
        }
        match trimmed.parse::<u16>() {
            Ok(w) if (1..=1000).contains(&w) => Ok(FontWeight(w)),
            _ => Err(invalid(
                "weight",
                s,
                "Expected Regular, Medium, Bold, Black or a weight between 1 and 1000",
            )),
        }
    }
}

impl TryFrom<String> for FontWeight {
    type Error = AdForgeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FontWeight> for String {
    fn from(value: FontWeight) -> Self {
        value.0.to_string()
    }
}

/// `#rrggbb` colour, stored lowercase. `#rgb` is expanded on parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_brand_gold(&self) -> bool {
        self.0 == BRAND_GOLD
    }
}

impl FromStr for HexColor {
    type Err = AdForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('#')
            .filter(|d| d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| invalid("color", s, "Expected a hex colour like '#ebb308'"))?;
        let expanded = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 => digits.to_string(),
            _ => return Err(invalid("color", s, "Expected a hex colour like '#ebb308'")),
        };
        Ok(HexColor(format!("#{}", expanded.to_ascii_lowercase())))
    }
}

impl TryFrom<String> for HexColor {
    type Error = AdForgeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HexColor> for String {
    fn from(value: HexColor) -> Self {
        value.0
    }
}

/// Per-field typography overrides.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub font: FontChoice,
    pub size: SizeSetting,
    pub line_height: LineHeightSetting,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<FontWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<HexColor>,
}

/// The in-memory ad being edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdComposition {
    pub headline: String,
    pub headline_style: TextStyle,
    pub subheadline: String,
    pub subheadline_style: TextStyle,
    pub cta: String,
    pub cta_style: TextStyle,
    pub image_url: String,
    pub theme: Theme,
    pub aspect_ratio: AspectRatio,
    pub show_badge: bool,
    pub prompt_strategy: String,
}

impl Default for AdComposition {
    fn default() -> Self {
        Self {
            headline: "Who Bought 26 Tons of Gold in 90 Days?".to_string(),
            headline_style: TextStyle::default(),
            subheadline:
                "Not a government. A $186 billion crypto company, stockpiling physical gold."
                    .to_string(),
            subheadline_style: TextStyle::default(),
            cta: "See the companies next".to_string(),
            cta_style: TextStyle::default(),
            image_url: "https://images.unsplash.com/photo-1581091226825-a6a2a5aee158?auto=format&fit=crop&q=80&w=1200".to_string(),
            theme: Theme::Dark,
            aspect_ratio: AspectRatio::Widescreen16x9,
            show_badge: false,
            prompt_strategy: String::new(),
        }
    }
}

/// Headline/subheadline pair suggested by image analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopySuggestion {
    pub headline: String,
    pub subheadline: String,
}

impl CopySuggestion {
    pub const FALLBACK_HEADLINE: &'static str = "Stunning Visual";
    pub const FALLBACK_SUBHEADLINE: &'static str = "Explore the possibilities today.";

    pub fn fallback() -> Self {
        Self {
            headline: Self::FALLBACK_HEADLINE.to_string(),
            subheadline: Self::FALLBACK_SUBHEADLINE.to_string(),
        }
    }
}
