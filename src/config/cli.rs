
use crate::domain::model::{
    AdComposition, AspectRatio, ExportResolution, FontChoice, FontWeight, HexColor,
    LineHeightSetting, SizeSetting, TextStyle, Theme,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "adforge")]
#[command(about = "Compose, generate and export advertisement graphics")]
pub struct CliConfig {
    #[arg(long, global = true, default_value = "adforge.toml")]
    pub config: PathBuf,

    #[arg(long, global = true, default_value = "ad.toml")]
    pub composition: PathBuf,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Write the default composition document
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Print the composition with its resolved typography
    Show,
    /// Compute the preview scale for a viewport
    Scale {
        #[arg(long)]
        width: f64,
        #[arg(long)]
        height: f64,
        #[arg(long)]
        aspect_ratio: Option<AspectRatio>,
    },
    /// Change composition fields
    Set(SetArgs),
    /// Generate a background image from the prompt strategy
    Generate {
        #[arg(long, help = "Replace the prompt strategy before generating")]
        prompt: Option<String>,
    },
    /// Edit the current background image
    Edit { instruction: String },
    /// Use a photo as background and take suggested copy from it
    Analyze { image: PathBuf },
    /// Render the ad to a local PNG
    Render {
        #[arg(long, short)]
        output: PathBuf,
        #[arg(long)]
        resolution: Option<ExportResolution>,
    },
    /// Render the ad and upload it to storage
    Export {
        #[arg(long)]
        resolution: Option<ExportResolution>,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct SetArgs {
    #[arg(long)]
    pub headline: Option<String>,
    #[arg(long)]
    pub headline_font: Option<FontChoice>,
    #[arg(long)]
    pub headline_size: Option<SizeSetting>,
    #[arg(long)]
    pub headline_line_height: Option<LineHeightSetting>,
    #[arg(long)]
    pub headline_weight: Option<FontWeight>,
    #[arg(long)]
    pub headline_color: Option<HexColor>,

    #[arg(long)]
    pub subheadline: Option<String>,
    #[arg(long)]
    pub subheadline_font: Option<FontChoice>,
    #[arg(long)]
    pub subheadline_size: Option<SizeSetting>,
    #[arg(long)]
    pub subheadline_line_height: Option<LineHeightSetting>,
    #[arg(long)]
    pub subheadline_weight: Option<FontWeight>,
    #[arg(long)]
    pub subheadline_color: Option<HexColor>,

    #[arg(long)]
    pub cta: Option<String>,
    #[arg(long)]
    pub cta_font: Option<FontChoice>,
    #[arg(long)]
    pub cta_size: Option<SizeSetting>,
    #[arg(long)]
    pub cta_weight: Option<FontWeight>,
    #[arg(long)]
    pub cta_color: Option<HexColor>,

    #[arg(long)]
    pub image_url: Option<String>,
    #[arg(long)]
    pub theme: Option<Theme>,
    #[arg(long)]
    pub aspect_ratio: Option<AspectRatio>,
    #[arg(long)]
    pub show_badge: Option<bool>,
    #[arg(long)]
    pub prompt: Option<String>,
}

struct StyleEdit {
    font: Option<FontChoice>,
    size: Option<SizeSetting>,
    line_height: Option<LineHeightSetting>,
    weight: Option<FontWeight>,
    color: Option<HexColor>,
}

impl StyleEdit {
    fn apply(self, style: &mut TextStyle) {
        if let Some(font) = self.font {
            style.font = font;
        }
        if let Some(size) = self.size {
            style.size = size;
        }
        if let Some(line_height) = self.line_height {
            style.line_height = line_height;
        }
        if let Some(weight) = self.weight {
            style.weight = Some(weight);
        }
        if let Some(color) = self.color {
            style.color = Some(color);
        }
    }
}

impl SetArgs {
    pub fn is_empty(&self) -> bool {
        let mut probe = AdComposition::default();
        let before = probe.clone();
        self.clone().apply(&mut probe);
        probe == before
    }

    pub fn apply(self, composition: &mut AdComposition) {
        if let Some(v) = self.headline {
            composition.headline = v;
        }
        if let Some(v) = self.subheadline {
            composition.subheadline = v;
        }
        if let Some(v) = self.cta {
            composition.cta = v;
        }
        if let Some(v) = self.image_url {
            composition.image_url = v;
        }
        if let Some(v) = self.theme {
            composition.theme = v;
        }
        if let Some(v) = self.aspect_ratio {
            composition.aspect_ratio = v;
        }
        if let Some(v) = self.show_badge {
            composition.show_badge = v;
        }
        if let Some(v) = self.prompt {
            composition.prompt_strategy = v;
        }

        StyleEdit {
            font: self.headline_font,
            size: self.headline_size,
            line_height: self.headline_line_height,
            weight: self.headline_weight,
            color: self.headline_color,
        }
        .apply(&mut composition.headline_style);
        StyleEdit {
            font: self.subheadline_font,
            size: self.subheadline_size,
            line_height: self.subheadline_line_height,
            weight: self.subheadline_weight,
            color: self.subheadline_color,
        }
        .apply(&mut composition.subheadline_style);
        StyleEdit {
            font: self.cta_font,
            size: self.cta_size,
            line_height: None,
            weight: self.cta_weight,
            color: self.cta_color,
        }
        .apply(&mut composition.cta_style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_command() {
        let cli = CliConfig::parse_from([
            "adforge",
            "set",
            "--headline",
            "New Copy",
            "--headline-size",
            "140px",
            "--subheadline-line-height",
            "Auto",
            "--cta-color",
            "#1d4ed8",
            "--aspect-ratio",
            "9:16",
            "--show-badge",
            "true",
        ]);

        let Command::Set(args) = cli.command else {
            panic!("expected set command");
        };
        assert!(!args.is_empty());

        let mut comp = AdComposition::default();
        comp.subheadline_style.line_height = LineHeightSetting::Multiplier(1.8);
        args.apply(&mut comp);

        assert_eq!(comp.headline, "New Copy");
        assert_eq!(comp.headline_style.size, SizeSetting::Px(140.0));
        assert_eq!(comp.subheadline_style.line_height, LineHeightSetting::Auto);
        assert_eq!(comp.cta_style.color.unwrap().as_str(), "#1d4ed8");
        assert_eq!(comp.aspect_ratio, AspectRatio::Vertical9x16);
        assert!(comp.show_badge);
    }

    #[test]
    fn test_invalid_values_are_rejected_by_parser() {
        let result = CliConfig::try_parse_from(["adforge", "set", "--headline-size", "huge"]);
        assert!(result.is_err());
        let result = CliConfig::try_parse_from(["adforge", "scale", "--width", "800", "--height", "600", "--aspect-ratio", "5:4"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_and_defaults() {
        let cli = CliConfig::parse_from(["adforge", "export", "--verbose", "--resolution", "2K"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("adforge.toml"));
        assert!(matches!(
            cli.command,
            Command::Export {
                resolution: Some(ExportResolution::TwoK)
            }
        ));
        assert!(SetArgs::default().is_empty());
    }
}
