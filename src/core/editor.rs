use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::adapters::assets::ImageLoader;
use crate::core::layout::PreviewFrame;
use crate::core::render::{AdRenderer, RenderOptions};
use crate::domain::image::ImagePayload;
use crate::domain::model::{AdComposition, AspectRatio, ExportResolution};
use crate::domain::ports::{AssetStore, GenerativeClient, StoredObject};
use crate::utils::error::{AdForgeError, Result};

/// Prompts shorter than this are replaced by a synthesized one.
pub const MIN_PROMPT_LEN: usize = 5;

pub mod status {
    pub const ANALYZING_HOOKS: &str = "Analyzing hooks...";
    pub const SYNTHESIZING_PROMPT: &str = "Synthesizing prompt...";
    pub const RENDERING: &str = "Rendering (Flash)...";
    pub const EDITING: &str = "Editing...";
    pub const ANALYZING: &str = "Analyzing...";
    pub const GENERATING_IMAGE: &str = "Generating image...";
    pub const UPLOADING: &str = "Uploading...";
    pub const SAVED: &str = "Saved to storage!";
    pub const ERROR: &str = "Error.";
    pub const EXPORT_ERROR: &str = "Export Error";
}

/// Clears the busy flag when the action finishes, however it finishes.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AdForgeError::Busy)?;
        Ok(Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// One editing session: the composition plus the single in-flight request gate.
pub struct EditorSession<G: GenerativeClient, S: AssetStore> {
    generator: G,
    store: S,
    renderer: AdRenderer,
    images: ImageLoader,
    resolution: ExportResolution,
    composition: Mutex<AdComposition>,
    edit_instruction: Mutex<String>,
    status: Mutex<Option<String>>,
    busy: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // State is only ever replaced wholesale, so a poisoned value is still consistent.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<G: GenerativeClient, S: AssetStore> EditorSession<G, S> {
    pub fn new(generator: G, store: S, renderer: AdRenderer, composition: AdComposition) -> Self {
        Self {
            generator,
            store,
            renderer,
            images: ImageLoader::default(),
            resolution: ExportResolution::default(),
            composition: Mutex::new(composition),
            edit_instruction: Mutex::new(String::new()),
            status: Mutex::new(None),
            busy: AtomicBool::new(false),
        }
    }

    pub fn with_resolution(mut self, resolution: ExportResolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_image_loader(mut self, images: ImageLoader) -> Self {
        self.images = images;
        self
    }

    pub fn composition(&self) -> AdComposition {
        lock(&self.composition).clone()
    }

    pub fn into_composition(self) -> AdComposition {
        self.composition
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn status(&self) -> Option<String> {
        lock(&self.status).clone()
    }

    pub fn clear_status(&self) {
        self.set_status(None);
    }

    fn set_status(&self, message: Option<&str>) {
        *lock(&self.status) = message.map(str::to_string);
    }

    pub fn edit_instruction(&self) -> String {
        lock(&self.edit_instruction).clone()
    }

    pub fn set_edit_instruction(&self, instruction: impl Into<String>) {
        *lock(&self.edit_instruction) = instruction.into();
    }

    /// Apply a field edit to the composition.
    pub fn update(&self, edit: impl FnOnce(&mut AdComposition)) {
        let mut composition = lock(&self.composition);
        edit(&mut *composition);
    }

    pub fn set_aspect_ratio(&self, ratio: AspectRatio) {
        self.update(|c| c.aspect_ratio = ratio);
    }

    /// Preview placement for a viewport of the given size.
    pub fn preview_frame(
        &self,
        viewport_width: f64,
        viewport_height: f64,
        previous_scale: f64,
    ) -> PreviewFrame {
        let ratio = lock(&self.composition).aspect_ratio;
        PreviewFrame::fit(viewport_width, viewport_height, ratio, previous_scale)
    }

    /// Generate a background from the prompt strategy, synthesizing a prompt first when it is too short.
    pub async fn generate_background(&self) -> Result<()> {
        let _guard = BusyGuard::acquire(&self.busy)?;
        let result = self.run_generate().await;
        self.finish(result, status::ERROR, "Image generation")
    }

    async fn run_generate(&self) -> Result<()> {
        self.set_status(Some(status::ANALYZING_HOOKS));
        let snapshot = self.composition();

        let mut prompt = snapshot.prompt_strategy.clone();
        if prompt.trim().chars().count() < MIN_PROMPT_LEN {
            self.set_status(Some(status::SYNTHESIZING_PROMPT));
            prompt = self
                .generator
                .refine_prompt(&snapshot.headline, &snapshot.subheadline)
                .await?;
            tracing::info!("Synthesized prompt: {}", prompt);
            let stored = prompt.clone();
            self.update(|c| c.prompt_strategy = stored);
        }

        self.set_status(Some(status::RENDERING));
        let image = self
            .generator
            .generate_background(&prompt, snapshot.aspect_ratio)
            .await?;
        let url = image.to_data_url();
        self.update(|c| c.image_url = url);
        Ok(())
    }

    /// Apply the pending edit instruction to the current background. No-op without an instruction.
    pub async fn edit_background(&self) -> Result<()> {
        let instruction = self.edit_instruction();
        if instruction.trim().is_empty() {
            return Ok(());
        }
        let _guard = BusyGuard::acquire(&self.busy)?;
        let result = self.run_edit(&instruction).await;
        self.finish(result, status::ERROR, "Image edit")
    }

    async fn run_edit(&self, instruction: &str) -> Result<()> {
        self.set_status(Some(status::EDITING));
        let image_url = lock(&self.composition).image_url.clone();
        let current = self
            .images
            .load(&image_url)
            .await?
            .ok_or_else(|| AdForgeError::ValidationError {
                message: "There is no background image to edit".to_string(),
            })?;

        let edited = self.generator.edit_image(&current, instruction).await?;
        let url = edited.to_data_url();
        self.update(|c| c.image_url = url);
        self.set_edit_instruction(String::new());
        Ok(())
    }

    /// Suggest copy for an uploaded photo and make it the background.
    pub async fn analyze_upload(&self, image: ImagePayload) -> Result<()> {
        let _guard = BusyGuard::acquire(&self.busy)?;
        let result = self.run_analyze(image).await;
        self.finish(result, status::ERROR, "Image analysis")
    }

    async fn run_analyze(&self, image: ImagePayload) -> Result<()> {
        self.set_status(Some(status::ANALYZING));
        let suggestion = self.generator.analyze_image(&image).await?;
        let url = image.to_data_url();
        self.update(|c| {
            c.headline = suggestion.headline;
            c.subheadline = suggestion.subheadline;
            c.image_url = url;
        });
        Ok(())
    }

    pub fn resolution(&self) -> ExportResolution {
        self.resolution
    }

    /// Final bitmap at `resolution`, without the in-progress overlay.
    pub async fn render_png(&self, resolution: ExportResolution) -> Result<Vec<u8>> {
        let snapshot = self.composition();
        let background = self.images.load(&snapshot.image_url).await?;
        self.renderer.render_png(
            &snapshot,
            background.as_ref(),
            RenderOptions {
                scale: resolution.scale(),
                busy: false,
            },
        )
    }

    /// Preview bitmap, including the in-progress overlay while a request runs.
    pub async fn preview_png(&self, scale: f32) -> Result<Vec<u8>> {
        let snapshot = self.composition();
        let background = self.images.load(&snapshot.image_url).await?;
        self.renderer.render_png(
            &snapshot,
            background.as_ref(),
            RenderOptions {
                scale,
                busy: self.is_busy(),
            },
        )
    }

    /// Render the ad and upload it under `key`.
    pub async fn export(&self, key: &str) -> Result<StoredObject> {
        let _guard = BusyGuard::acquire(&self.busy)?;
        let result = self.run_export(key).await;
        match result {
            Ok(stored) => {
                self.set_status(Some(status::SAVED));
                Ok(stored)
            }
            Err(e) => {
                tracing::error!("Export failed: {}", e);
                self.set_status(Some(status::EXPORT_ERROR));
                Err(e)
            }
        }
    }

    async fn run_export(&self, key: &str) -> Result<StoredObject> {
        self.set_status(Some(status::GENERATING_IMAGE));
        let png = self.render_png(self.resolution).await?;

        self.set_status(Some(status::UPLOADING));
        self.store.put_object(key, &png, "image/png").await
    }

    fn finish(
        &self,
        result: Result<()>,
        failure_status: &str,
        action: &str,
    ) -> Result<()> {
        match result {
            Ok(()) => {
                self.set_status(None);
                Ok(())
            }
            Err(e) => {
                tracing::error!("{} failed: {}", action, e);
                self.set_status(Some(failure_status));
                Err(e)
            }
        }
    }
}
