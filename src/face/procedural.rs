//! Faces drawn from primitives when no image is stored for an expression
//!
//! Each routine is a fixed sequence of draws on top of a white page, so the
//! same expression always produces the same pixels.

use super::layout::FaceLayout;
use super::Expression;
use crate::surface::{PixelSurface, BLACK, WHITE};

/// Mouth lines are this many pixel rows thick
const MOUTH_THICKNESS: i32 = 2;

pub(super) fn draw<S: PixelSurface>(surface: &mut S, layout: &FaceLayout, expression: Expression) {
    match expression {
        Expression::Happy => happy(surface, layout),
        Expression::Sad => sad(surface, layout),
        Expression::Thinking => thinking(surface, layout),
        Expression::Excited => excited(surface, layout),
        Expression::Sleepy => sleepy(surface, layout),
        Expression::Curious => curious(surface, layout),
    }
}

/// Double ring eye with a pupil offset by `gaze`
fn eye<S: PixelSurface>(surface: &mut S, l: &FaceLayout, x: i32, radius: u32, gaze: (i32, i32)) {
    surface.draw_circle(x, l.eye_y, radius, BLACK);
    surface.draw_circle(x, l.eye_y, radius - 1, BLACK);
    surface.fill_circle(x + gaze.0, l.eye_y + gaze.1, l.pupil_radius, BLACK);
}

fn eyes<S: PixelSurface>(
    surface: &mut S,
    l: &FaceLayout,
    left_gaze: (i32, i32),
    right_gaze: (i32, i32),
) {
    eye(surface, l, l.left_eye_x, l.eye_radius, left_gaze);
    eye(surface, l, l.right_eye_x, l.eye_radius, right_gaze);
}

/// Parabola through the face centre. `smile` curves the ends up, otherwise down.
fn mouth<S: PixelSurface>(surface: &mut S, l: &FaceLayout, width: i32, depth: i32, smile: bool) {
    for t in 0..MOUTH_THICKNESS {
        for i in -width..=width {
            let bend = (i * i * depth) / (width * width);
            let y = if smile {
                l.mouth_y + bend
            } else {
                l.mouth_y + depth - bend
            };
            surface.draw_pixel(l.center_x() + i, y + t, BLACK);
        }
    }
}

fn happy<S: PixelSurface>(surface: &mut S, l: &FaceLayout) {
    eyes(surface, l, (0, 0), (0, 0));
    mouth(surface, l, 20, 6, true);
    // Blush
    surface.draw_circle(l.left_eye_x - 12, l.eye_y + 15, 6, BLACK);
    surface.draw_circle(l.right_eye_x + 12, l.eye_y + 15, 6, BLACK);
}

fn sad<S: PixelSurface>(surface: &mut S, l: &FaceLayout) {
    let (lx, rx, y) = (l.left_eye_x, l.right_eye_x, l.eye_y);
    eyes(surface, l, (0, 3), (0, 3));
    // Brows slanting down towards the outside
    surface.draw_line(lx - 12, y - 16, lx + 8, y - 13, BLACK);
    surface.draw_line(lx - 12, y - 17, lx + 8, y - 14, BLACK);
    surface.draw_line(rx - 8, y - 13, rx + 12, y - 16, BLACK);
    surface.draw_line(rx - 8, y - 14, rx + 12, y - 17, BLACK);
    mouth(surface, l, 18, 5, false);
    // Sweat drop
    surface.fill_circle(lx + 14, y + 12, 3, BLACK);
    surface.fill_triangle([(lx + 14, y + 6), (lx + 11, y + 12), (lx + 17, y + 12)], BLACK);
}

fn thinking<S: PixelSurface>(surface: &mut S, l: &FaceLayout) {
    let (rx, y, cx) = (l.right_eye_x, l.eye_y, l.center_x());
    eye(surface, l, l.left_eye_x, l.eye_radius, (-2, -3));
    // Squinting right eye
    for dy in [-2, 0, 2] {
        surface.draw_line(rx - 10, y + dy, rx + 10, y + dy, BLACK);
    }
    for dx in [-12, 0, 12] {
        surface.fill_circle(cx + dx, l.mouth_y, 3, BLACK);
    }
    // Thought bubbles
    surface.draw_circle(rx + 18, y - 20, 2, BLACK);
    surface.draw_circle(rx + 24, y - 28, 4, BLACK);
}

fn excited<S: PixelSurface>(surface: &mut S, l: &FaceLayout) {
    let (lx, rx, y) = (l.left_eye_x, l.right_eye_x, l.eye_y);
    // Arched eyes
    for x in [lx, rx] {
        for i in -8..=8 {
            let arc_y = y - 4 + (i * i) / 10;
            surface.draw_pixel(x + i, arc_y, BLACK);
            surface.draw_pixel(x + i, arc_y + 1, BLACK);
        }
    }
    // Sparkles
    surface.draw_line(lx - 18, y - 3, lx - 24, y - 3, BLACK);
    surface.draw_line(lx - 21, y - 8, lx - 21, y + 2, BLACK);
    surface.draw_line(rx + 18, y - 3, rx + 24, y - 3, BLACK);
    surface.draw_line(rx + 21, y - 8, rx + 21, y + 2, BLACK);
    mouth(surface, l, 22, 10, true);
    surface.draw_circle(lx - 8, y + 12, 5, BLACK);
    surface.draw_circle(rx + 8, y + 12, 5, BLACK);
}

fn sleepy<S: PixelSurface>(surface: &mut S, l: &FaceLayout) {
    let (y, cx, my) = (l.eye_y, l.center_x(), l.mouth_y);
    for x in [l.left_eye_x, l.right_eye_x] {
        surface.draw_line(x - 8, y - 2, x + 8, y - 2, BLACK);
        surface.draw_line(x - 8, y - 1, x + 8, y - 1, BLACK);
    }
    // Yawning "O" with the top and bottom of the ring cut away
    surface.draw_circle(cx, my, 8, BLACK);
    surface.draw_circle(cx, my, 7, BLACK);
    surface.fill_rect(cx - 6, my - 8, 12, 4, WHITE);
    surface.fill_rect(cx - 6, my + 5, 12, 4, WHITE);
    surface.draw_text("z", 80, 40);
    surface.draw_text("Z", 92, 28);
    surface.draw_text("Z", 104, 16);
}

fn curious<S: PixelSurface>(surface: &mut S, l: &FaceLayout) {
    let (rx, y, cx) = (l.right_eye_x, l.eye_y, l.center_x());
    eye(surface, l, l.left_eye_x, l.eye_radius, (3, -1));
    eye(surface, l, rx, l.eye_radius + 2, (3, -1));
    // Raised brow over the big eye
    surface.draw_line(rx - 14, y - 18, rx + 10, y - 15, BLACK);
    surface.draw_line(rx - 14, y - 19, rx + 10, y - 16, BLACK);
    surface.draw_circle(cx, l.mouth_y, 6, BLACK);
    surface.draw_circle(cx, l.mouth_y, 5, BLACK);
    surface.draw_text("?", 5, 45);
}
