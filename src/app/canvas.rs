use eframe::egui::{
    self, Align2, Color32, ColorImage, FontId, Pos2, Rect, Sense, TextureHandle, TextureOptions,
};
use image::RgbaImage;

use crate::{Error, Session};

/// Scaled photo with the selection overlay on top. Pointer input is fed into
/// the session in canvas coordinates.
#[derive(Default)]
pub(super) struct CanvasView {
    photo: Option<TextureHandle>,
    overlay: Option<TextureHandle>,
    seen_editor_revision: Option<u64>,
    seen_session_revision: Option<u64>,
}

impl CanvasView {
    pub(super) fn ui(&mut self, ui: &mut egui::Ui, session: &mut Session) -> Result<(), Error> {
        let canvas = session.editor().canvas();
        let size = egui::vec2(canvas.width as f32, canvas.height as f32);
        let (response, painter) = ui.allocate_painter(size, Sense::click_and_drag());
        let rect = response.rect;
        self.refresh_textures(ui.ctx(), session);

        painter.rect_filled(rect, 4.0, ui.visuals().extreme_bg_color);
        let uv = Rect::from_min_max(Pos2::ZERO, egui::pos2(1.0, 1.0));
        for texture in [&self.photo, &self.overlay].into_iter().flatten() {
            painter.image(texture.id(), rect, uv, Color32::WHITE);
        }
        if !session.editor().has_image() {
            let text = if session.is_loading_image() {
                "Loading image..."
            } else {
                "Drop an image here to start"
            };
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                text,
                FontId::proportional(16.0),
                ui.visuals().weak_text_color(),
            );
        }

        Self::handle_pointer(ui, rect, session)
    }

    fn handle_pointer(ui: &egui::Ui, rect: Rect, session: &mut Session) -> Result<(), Error> {
        let (pressed, down, released, pos) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.pointer.primary_released(),
                i.pointer.interact_pos(),
            )
        });
        let inside = pos
            .filter(|p| rect.contains(*p))
            .map(|p| (p - rect.min).to_pos2());

        if pressed {
            if let Some(p) = inside {
                session.begin_stroke(p);
            }
        } else if session.editor().is_drawing() {
            match inside {
                Some(p) if down => session.continue_stroke(p),
                None => session.leave_canvas()?,
                _ => (),
            }
        }
        if released {
            session.end_stroke()?;
        }
        Ok(())
    }

    fn refresh_textures(&mut self, ctx: &egui::Context, session: &Session) {
        let editor = session.editor();
        if self.seen_editor_revision != Some(editor.revision()) {
            self.seen_editor_revision = Some(editor.revision());
            let overlay = to_color_image(editor.visual());
            match &mut self.overlay {
                Some(handle) => handle.set(overlay, TextureOptions::NEAREST),
                None => {
                    self.overlay =
                        Some(ctx.load_texture("selection", overlay, TextureOptions::NEAREST))
                }
            }
        }

        if self.seen_session_revision != Some(session.revision()) {
            self.seen_session_revision = Some(session.revision());
            self.photo = editor.display().map(|display| {
                ctx.load_texture(
                    "scaled-photo",
                    to_color_image(display),
                    TextureOptions::LINEAR,
                )
            });
        }
    }
}

pub(super) fn to_color_image(image: &RgbaImage) -> ColorImage {
    ColorImage::from_rgba_unmultiplied(
        [image.width() as usize, image.height() as usize],
        image.as_raw(),
    )
}
