//! Bi-level paged drawing surface
//!
//! The face renderer only talks to a [`PixelSurface`]. Every primitive has a
//! default implementation on top of [`embedded_graphics`], so a surface only
//! needs to be an infallible `DrawTarget<Color = BinaryColor>` and say how a
//! page is committed to the panel.
//!
//! Colors follow the e-paper convention used throughout this crate:
//! `BinaryColor::On` is black ink, `BinaryColor::Off` is white paper.
//!
//! Circles use the GFX convention: radius `r` spans `2r + 1` pixels centred on
//! the given point.

use core::convert::Infallible;

use embedded_graphics::mono_font::{ascii::FONT_9X15_BOLD, MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Line, PrimitiveStyle, Rectangle, Triangle};
use embedded_graphics::text::{renderer::TextRenderer, Baseline, Text};

pub mod framebuffer;

pub use framebuffer::FrameBuffer;

/// Black ink
pub const BLACK: BinaryColor = BinaryColor::On;
/// White paper
pub const WHITE: BinaryColor = BinaryColor::Off;

/// Font used for labels and the small glyphs drawn on faces
pub const TEXT_FONT: &MonoFont<'static> = &FONT_9X15_BOLD;

pub(crate) fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

fn text_style() -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyle::new(TEXT_FONT, BLACK)
}

/// A monochrome display that is painted a full window at a time.
///
/// Draw calls between [`begin_full_window_paint`](Self::begin_full_window_paint)
/// and [`commit_page`](Self::commit_page) are not guaranteed to be visible until
/// `commit_page` returns `false`. Paged displays return `true` while more pages
/// remain; the caller then repeats the same drawing sequence.
pub trait PixelSurface: DrawTarget<Color = BinaryColor, Error = Infallible> + Sized {
    /// Start painting the whole window from the first page
    fn begin_full_window_paint(&mut self) {}

    /// Finish the current page. Returns `true` when another page must be drawn.
    fn commit_page(&mut self) -> bool;

    fn fill_screen(&mut self, color: BinaryColor) {
        infallible(self.clear(color));
    }

    fn draw_pixel(&mut self, x: i32, y: i32, color: BinaryColor) {
        infallible(Pixel(Point::new(x, y), color).draw(self));
    }

    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: BinaryColor) {
        let line = Line::new(Point::new(x0, y0), Point::new(x1, y1));
        infallible(line.into_styled(PrimitiveStyle::with_stroke(color, 1)).draw(self));
    }

    fn draw_circle(&mut self, x: i32, y: i32, radius: u32, color: BinaryColor) {
        let circle = Circle::with_center(Point::new(x, y), 2 * radius + 1);
        infallible(circle.into_styled(PrimitiveStyle::with_stroke(color, 1)).draw(self));
    }

    fn fill_circle(&mut self, x: i32, y: i32, radius: u32, color: BinaryColor) {
        let circle = Circle::with_center(Point::new(x, y), 2 * radius + 1);
        infallible(circle.into_styled(PrimitiveStyle::with_fill(color)).draw(self));
    }

    fn fill_triangle(&mut self, vertices: [(i32, i32); 3], color: BinaryColor) {
        let [a, b, c] = vertices.map(|(x, y)| Point::new(x, y));
        infallible(Triangle::new(a, b, c).into_styled(PrimitiveStyle::with_fill(color)).draw(self));
    }

    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: BinaryColor) {
        let rect = Rectangle::new(Point::new(x, y), Size::new(width, height));
        infallible(rect.into_styled(PrimitiveStyle::with_fill(color)).draw(self));
    }

    /// Draw `text` in black with its left edge at `x` and its baseline at `y`
    fn draw_text(&mut self, text: &str, x: i32, y: i32) {
        let text = Text::with_baseline(text, Point::new(x, y), text_style(), Baseline::Alphabetic);
        infallible(text.draw(self));
    }

    /// Width and height of the box `text` covers when drawn
    fn measure_text(&self, text: &str) -> (u32, u32) {
        let metrics = text_style().measure_string(text, Point::zero(), Baseline::Alphabetic);
        let size = metrics.bounding_box.size;
        (size.width, size.height)
    }
}
