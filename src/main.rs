use adforge::config::document::{init_composition, load_composition, save_composition};
use adforge::config::{CliConfig, Command};
use adforge::core::layout::{resolve_typography, PreviewFrame, TextRole};
use adforge::domain::image::ImagePayload;
use adforge::domain::model::FontChoice;
use adforge::domain::options;
use adforge::utils::error::ErrorSeverity;
use adforge::utils::logger;
use adforge::{
    AdComposition, AdForgeError, AdRenderer, AppSettings, ConfiguredStore, EditorSession,
    GeminiClient, Result,
};
use clap::Parser;

type Session = EditorSession<GeminiClient, ConfiguredStore>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting adforge CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = run(cli).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(cli: CliConfig) -> Result<()> {
    if let Command::Init { force } = cli.command {
        init_composition(&cli.composition, force)?;
        println!("✅ Wrote {}", cli.composition.display());
        return Ok(());
    }

    let settings = AppSettings::load_or_default(&cli.config)?;
    let composition = load_composition(&cli.composition)?;

    match cli.command {
        // Written above, before any document is read.
        Command::Init { .. } => {}
        Command::Show => show(&composition)?,
        Command::Scale {
            width,
            height,
            aspect_ratio,
        } => {
            let ratio = aspect_ratio.unwrap_or(composition.aspect_ratio);
            let frame = PreviewFrame::fit(width, height, ratio, 1.0);
            println!(
                "{} canvas {}x{} at scale {:.4}",
                ratio, frame.canvas.width, frame.canvas.height, frame.scale
            );
        }
        Command::Set(args) => {
            if args.is_empty() {
                return Err(AdForgeError::ValidationError {
                    message: "No fields given to set".to_string(),
                });
            }
            let mut composition = composition;
            args.apply(&mut composition);
            warn_unknown_fonts(&composition);
            save_composition(&cli.composition, &composition)?;
            println!("✅ Updated {}", cli.composition.display());
        }
        Command::Generate { prompt } => {
            settings.validate_for_generation()?;
            let session = open_session(&settings, composition).await?;
            if let Some(prompt) = prompt {
                session.update(|c| c.prompt_strategy = prompt);
            }
            let outcome = session.generate_background().await;
            finish(session, outcome, &cli.composition)?;
        }
        Command::Edit { instruction } => {
            settings.validate_for_generation()?;
            let session = open_session(&settings, composition).await?;
            session.set_edit_instruction(instruction);
            let outcome = session.edit_background().await;
            finish(session, outcome, &cli.composition)?;
        }
        Command::Analyze { image } => {
            settings.validate_for_generation()?;
            let bytes = tokio::fs::read(&image).await?;
            let session = open_session(&settings, composition).await?;
            let outcome = session
                .analyze_upload(ImagePayload::from_file_bytes(bytes))
                .await;
            finish(session, outcome, &cli.composition)?;
        }
        Command::Render { output, resolution } => {
            let session = open_session(&settings, composition).await?;
            let resolution = resolution.unwrap_or(settings.export.resolution);
            let png = session.render_png(resolution).await?;
            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&output, &png).await?;
            println!("✅ Rendered {} ({} bytes)", output.display(), png.len());
        }
        Command::Export { resolution } => {
            settings.validate_for_export()?;
            let session = open_session(&settings, composition)
                .await?
                .with_resolution(resolution.unwrap_or(settings.export.resolution));
            let key = settings
                .storage
                .export_key(chrono::Utc::now().timestamp_millis());
            let stored = session.export(&key).await?;
            if let Some(status) = session.status() {
                println!("✅ {}", status);
            }
            println!("📁 {}", stored.location);
        }
    }

    Ok(())
}

async fn open_session(settings: &AppSettings, composition: AdComposition) -> Result<Session> {
    let generator = GeminiClient::new(&settings.gemini);
    let store = ConfiguredStore::from_settings(&settings.storage).await?;
    let renderer = AdRenderer::new(settings.render.fonts_dir.as_deref());
    Ok(EditorSession::new(generator, store, renderer, composition)
        .with_resolution(settings.export.resolution))
}

/// Persists the composition after an action. Partial progress such as a
/// synthesized prompt is kept even when the action failed.
fn finish(session: Session, outcome: Result<()>, path: &std::path::Path) -> Result<()> {
    let status = session.status();
    save_composition(path, &session.into_composition())?;
    match (&outcome, status) {
        (Ok(()), Some(status)) => println!("✅ {}", status),
        (Err(_), Some(status)) => eprintln!("⚠️  {}", status),
        _ => {}
    }
    outcome?;
    println!("📄 Saved {}", path.display());
    Ok(())
}

fn warn_unknown_fonts(composition: &AdComposition) {
    let styles = [
        &composition.headline_style,
        &composition.subheadline_style,
        &composition.cta_style,
    ];
    for style in styles {
        if let FontChoice::Family(family) = &style.font {
            if !options::is_known_font(family) {
                tracing::warn!("Font {} is not in the font list, rendering may fall back", family);
            }
        }
    }
}

fn show(composition: &AdComposition) -> Result<()> {
    println!("{}", toml::to_string_pretty(composition)?);

    let roles = [
        ("headline", TextRole::Headline, &composition.headline_style),
        ("subheadline", TextRole::Subheadline, &composition.subheadline_style),
        ("cta", TextRole::Cta, &composition.cta_style),
    ];
    for (name, role, style) in roles {
        let t = resolve_typography(role, style);
        println!(
            "# {:<12} {} {}px/{} weight {} {}",
            name, t.family, t.font_size, t.line_height, t.weight, t.color
        );
    }
    Ok(())
}
