use crate::domain::model::{
    AspectRatio, CanvasSize, FontChoice, LineHeightSetting, SizeSetting, TextStyle, BRAND_GOLD,
};

/// Smallest preview scale; the canvas never shrinks below 10%.
pub const MIN_SCALE: f64 = 0.1;

/// Share of the viewport the canvas may occupy.
pub const VIEWPORT_FILL: f64 = 0.98;

pub const DEFAULT_FONT_FAMILY: &str = "Inter";
pub const DEFAULT_TEXT_COLOR: &str = "#ffffff";

/// Uniform scale fitting `canvas` into a `viewport_width` x `viewport_height` area.
///
/// Returns `None` when the viewport has no usable area yet; callers keep their
/// previous scale in that case.
pub fn fit_scale(viewport_width: f64, viewport_height: f64, canvas: CanvasSize) -> Option<f64> {
    if !(viewport_width > 0.0 && viewport_height > 0.0) {
        return None;
    }
    let width_scale = viewport_width * VIEWPORT_FILL / f64::from(canvas.width);
    let height_scale = viewport_height * VIEWPORT_FILL / f64::from(canvas.height);
    Some(width_scale.min(height_scale).max(MIN_SCALE))
}

/// Scaled preview placement for the current viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewFrame {
    pub canvas: CanvasSize,
    pub scale: f64,
    /// On-screen footprint after scaling.
    pub display_width: f64,
    pub display_height: f64,
}

impl PreviewFrame {
    pub fn fit(
        viewport_width: f64,
        viewport_height: f64,
        aspect_ratio: AspectRatio,
        previous_scale: f64,
    ) -> Self {
        let canvas = aspect_ratio.canvas();
        let scale = fit_scale(viewport_width, viewport_height, canvas).unwrap_or(previous_scale);
        Self {
            canvas,
            scale,
            display_width: f64::from(canvas.width) * scale,
            display_height: f64::from(canvas.height) * scale,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Headline,
    Subheadline,
    Cta,
}

impl TextRole {
    pub fn default_size(self) -> f32 {
        match self {
            TextRole::Headline => 120.0,
            TextRole::Subheadline => 42.0,
            TextRole::Cta => 32.0,
        }
    }

    pub fn default_line_height(self) -> f32 {
        match self {
            TextRole::Headline => 1.05,
            TextRole::Subheadline => 1.5,
            TextRole::Cta => 1.2,
        }
    }

    pub fn default_weight(self) -> u16 {
        match self {
            TextRole::Headline | TextRole::Cta => 700,
            TextRole::Subheadline => 400,
        }
    }
}

/// Concrete typography after applying a field's overrides to its role defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTypography {
    pub family: String,
    pub font_size: f32,
    pub line_height: f32,
    pub weight: u16,
    pub color: String,
}

impl ResolvedTypography {
    /// Line box height in logical pixels.
    pub fn line_box(&self) -> f32 {
        self.font_size * self.line_height
    }

    pub fn font_family_css(&self) -> String {
        format!("'{}', sans-serif", self.family)
    }
}

pub fn resolve_typography(role: TextRole, style: &TextStyle) -> ResolvedTypography {
    let family = match &style.font {
        FontChoice::Auto => DEFAULT_FONT_FAMILY.to_string(),
        FontChoice::Family(name) => name.clone(),
    };
    let font_size = match style.size {
        SizeSetting::Auto => role.default_size(),
        SizeSetting::Px(px) => px,
    };
    let line_height = match (role, style.line_height) {
        // The button label is single-line; its line height is fixed.
        (TextRole::Cta, _) | (_, LineHeightSetting::Auto) => role.default_line_height(),
        (_, LineHeightSetting::Multiplier(m)) => m,
    };

    ResolvedTypography {
        family,
        font_size,
        line_height,
        weight: style.weight.map(|w| w.0).unwrap_or_else(|| role.default_weight()),
        color: style
            .color
            .as_ref()
            .map(|c| c.as_str().to_string())
            .unwrap_or_else(|| DEFAULT_TEXT_COLOR.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CtaColors {
    pub background: String,
    pub text: String,
}

/// Button colours: unset or brand gold gives gold with black text, anything else white text.
pub fn cta_colors(style: &TextStyle) -> CtaColors {
    match &style.color {
        Some(color) if !color.is_brand_gold() => CtaColors {
            background: color.as_str().to_string(),
            text: "#ffffff".to_string(),
        },
        _ => CtaColors {
            background: BRAND_GOLD.to_string(),
            text: "#000000".to_string(),
        },
    }
}
