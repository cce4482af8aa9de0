//! Renderer seam. Backends implement [`Renderer`]; the artboard walks its
//! drawables in draw order and emits one `draw_path` per visible paint.

use kurbo::{Affine, BezPath};

use crate::artboard::Artboard;
use crate::component::ComponentKind;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PaintStyle {
    Fill,
    Stroke { thickness: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderPaint {
    pub style: PaintStyle,
    /// Packed ARGB with render opacity applied.
    pub color: u32,
}

pub trait Renderer {
    fn save(&mut self);
    fn restore(&mut self);
    fn transform(&mut self, transform: Affine);
    /// `path` is in the coordinate space established by prior `transform`
    /// calls.
    fn draw_path(&mut self, path: &BezPath, paint: &RenderPaint);
}

impl Artboard {
    pub fn draw(&self, renderer: &mut dyn Renderer) {
        self.draw_with_transform(renderer, Affine::IDENTITY);
    }

    /// Draw with `view` applied on top of artboard space.
    pub fn draw_with_transform(&self, renderer: &mut dyn Renderer, view: Affine) {
        renderer.save();
        renderer.transform(view);
        for &drawable in &self.draw_order {
            let Some(ComponentKind::Shape(shape)) = self.resolve(drawable).map(|c| c.kind()) else {
                continue;
            };
            let Some(path) = self.shape_path(drawable) else {
                continue;
            };
            for &paint_id in &shape.paints {
                let Some(component) = self.resolve(paint_id) else {
                    continue;
                };
                let (style, paint) = match &component.kind {
                    ComponentKind::Fill(p) => (PaintStyle::Fill, p),
                    ComponentKind::Stroke(p) => (PaintStyle::Stroke { thickness: p.thickness }, p),
                    _ => continue,
                };
                if !paint.is_visible {
                    continue;
                }
                renderer.save();
                renderer.draw_path(
                    path,
                    &RenderPaint {
                        style,
                        color: paint.render_color,
                    },
                );
                renderer.restore();
            }
        }
        renderer.restore();
    }
}
