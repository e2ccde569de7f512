use std::path::PathBuf;

use eframe::egui::{self, Button, TextEdit, TextureHandle, TextureOptions};
use log::warn;

use crate::{Error, FillMode, Session, SessionEvent, Upload};

mod canvas;
mod native;

pub use native::run_native;

pub(crate) struct InpainterApp {
    session: Session,
    canvas: canvas::CanvasView,
    result: Option<TextureHandle>,
    seen_revision: Option<u64>,
    status: Option<String>,
    download_dir: PathBuf,
}

impl InpainterApp {
    pub fn new(session: Session, download_dir: PathBuf) -> Self {
        Self {
            session,
            canvas: canvas::CanvasView::default(),
            result: None,
            seen_revision: None,
            status: None,
            download_dir,
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let Some(file) = ctx.input(|i| i.raw.dropped_files.first().cloned()) else {
            return;
        };
        let upload = match (file.path, file.bytes) {
            (Some(path), _) => Upload::from_path(path),
            (None, Some(bytes)) => Ok(Upload::new(file.name, file.mime, bytes.to_vec())),
            (None, None) => return,
        };
        let result = upload.and_then(|upload| self.session.upload(upload));
        self.report("Upload", result);
    }

    fn on_event(&mut self, event: SessionEvent) {
        self.status = match event {
            SessionEvent::ImageLoaded { width, height } => {
                Some(format!("Loaded {width}x{height} image"))
            }
            SessionEvent::FillCompleted => {
                Some("Inpainting Complete! Your image has been updated.".into())
            }
            SessionEvent::ImageLoadFailed(_)
            | SessionEvent::FillFailed(_)
            | SessionEvent::StaleFillDiscarded => None,
        };
    }

    fn report(&mut self, action: &str, result: Result<(), Error>) {
        if let Err(e) = result {
            warn!("{action} failed: {e}");
            self.status = Some(e.to_string());
        }
    }

    fn refresh_result(&mut self, ctx: &egui::Context) {
        if self.seen_revision == Some(self.session.revision()) {
            return;
        }
        self.seen_revision = Some(self.session.revision());
        self.result = self.session.filled_image().and_then(|filled| {
            match image::load_from_memory(filled.bytes()) {
                Ok(image) => Some(ctx.load_texture(
                    "fill-result",
                    canvas::to_color_image(&image.to_rgba8()),
                    TextureOptions::LINEAR,
                )),
                Err(e) => {
                    warn!("Cannot preview fill result: {e}");
                    None
                }
            }
        });
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        let busy = self.session.is_busy();
        let has_selection =
            self.session.scaled_photo().is_some() && self.session.mask().is_some();
        let has_prompt = !self.session.prompt.trim().is_empty();

        ui.add_enabled(
            !busy,
            TextEdit::multiline(&mut self.session.prompt)
                .hint_text("e.g., 'a field of wildflowers', 'a futuristic cityscape'")
                .desired_rows(2),
        );

        ui.horizontal(|ui| {
            if ui
                .add_enabled(!busy && has_selection, Button::new("Clear Selection"))
                .clicked()
            {
                let result = self.session.clear_selection();
                self.report("Clear selection", result);
            }
            if ui
                .add_enabled(
                    !busy && has_selection && has_prompt,
                    Button::new("Fill with Prompt"),
                )
                .clicked()
            {
                let result = self.session.start_fill(FillMode::Prompt);
                self.report("Fill", result);
            }
            if ui
                .add_enabled(!busy && has_selection, Button::new("Fill with Context"))
                .clicked()
            {
                let result = self.session.start_fill(FillMode::Context);
                self.report("Fill", result);
            }
        });

        if busy {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Inpainting in progress... this may take a moment.");
            });
        }
        if let Some(error) = self.session.error() {
            ui.colored_label(ui.visuals().error_fg_color, error);
        }
    }

    fn result_ui(&mut self, ui: &mut egui::Ui) {
        if let Some(texture) = &self.result {
            let canvas = self.session.editor().canvas();
            ui.label("Result");
            ui.add(
                egui::Image::new((texture.id(), texture.size_vec2()))
                    .max_size(egui::vec2(canvas.width as f32, canvas.height as f32))
                    .maintain_aspect_ratio(true),
            );
        }

        ui.horizontal(|ui| {
            if ui
                .add_enabled(self.result.is_some(), Button::new("Download"))
                .clicked()
            {
                match self.session.download(&self.download_dir) {
                    Ok(path) => self.status = Some(format!("Saved {}", path.display())),
                    Err(e) => self.report("Download", Err(e)),
                }
            }
            if ui.button("Upload New Image").clicked() {
                let result = self.session.reset();
                self.status = None;
                self.report("Reset", result);
            }
        });
    }
}

impl eframe::App for InpainterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_dropped_files(ctx);
        while let Some(event) = self.session.poll() {
            self.on_event(event);
        }
        if self.session.is_busy() || self.session.is_loading_image() {
            ctx.request_repaint();
        }
        self.refresh_result(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("InPainter");
            ui.label("Drop an image, paint over the area to replace, then fill it.");

            if let Err(e) = self.canvas.ui(ui, &mut self.session) {
                self.report("Selection", Err(e));
            }
            self.controls(ui);
            ui.separator();
            self.result_ui(ui);

            if let Some(status) = &self.status {
                ui.weak(status);
            }
        });
    }
}
