/*
 * Renderer Module
 *
 * This module paints one frame of the molecular background.
 * Drawing goes through the Surface trait so the frame can be sent to nannou
 * in the window, or recorded in tests and headless runs.
 *
 * Paint order per frame:
 * - Full clear with the background colour
 * - Every connection as a straight line
 * - Every molecule as a body disc followed by a larger, fainter glow disc
 */

use nannou::prelude::*;

use crate::linker::Connection;
use crate::molecule::Molecule;
use crate::theme::{parse_hex, ColorValue, Rgba, ThemeColors, DEFAULT_BACKGROUND};

pub const BODY_ALPHA: f32 = 0.8;
pub const GLOW_ALPHA: f32 = 0.1;
pub const GLOW_EXTRA_RADIUS: f32 = 1.5;

// A 2D target in screen space (top-left origin, y down)
pub trait Surface {
    fn clear(&mut self, background: &ColorValue);
    fn stroke_line(&mut self, from: Point2, to: Point2, thickness: f32, color: Rgba);
    fn fill_circle(&mut self, center: Point2, radius: f32, color: Rgba);
}

// Render one frame
pub fn render<S: Surface + ?Sized>(
    surface: &mut S,
    molecules: &[Molecule],
    connections: &[Connection],
    colors: &ThemeColors,
    thickness: f32,
) {
    surface.clear(&colors.background);

    for connection in connections {
        let (a, b) = match (molecules.get(connection.from), molecules.get(connection.to)) {
            (Some(a), Some(b)) => (a, b),
            _ => continue,
        };
        let color = colors.connection.with_alpha(colors.connection.a * connection.opacity);
        surface.stroke_line(a.position, b.position, thickness, color);
    }

    for molecule in molecules {
        let body = colors.particle.with_alpha(colors.particle.a * molecule.opacity * BODY_ALPHA);
        surface.fill_circle(molecule.position, molecule.radius, body);

        let glow = colors.glow.with_alpha(colors.glow.a * molecule.opacity * GLOW_ALPHA);
        surface.fill_circle(molecule.position, molecule.radius + GLOW_EXTRA_RADIUS, glow);
    }
}

// nannou's Draw with the engine's screen space mapped onto the window rect
pub struct NannouSurface<'a> {
    draw: &'a Draw,
    window: Rect,
}

impl<'a> NannouSurface<'a> {
    pub fn new(draw: &'a Draw, window: Rect) -> Self {
        Self { draw, window }
    }

    fn to_window(&self, p: Point2) -> Point2 {
        pt2(self.window.left() + p.x, self.window.top() - p.y)
    }

    fn color(c: Rgba) -> nannou::color::Srgba {
        nannou::color::srgba(
            c.r as f32 / 255.0,
            c.g as f32 / 255.0,
            c.b as f32 / 255.0,
            c.a,
        )
    }
}

impl<'a> Surface for NannouSurface<'a> {
    fn clear(&mut self, background: &ColorValue) {
        let color = match background.to_rgba() {
            Some(color) => color,
            None => {
                log::debug!("Background {:?} is not drawable, using {}", background, DEFAULT_BACKGROUND);
                parse_hex(DEFAULT_BACKGROUND).unwrap_or(Rgba::rgb(26, 26, 26))
            }
        };
        self.draw.background().color(Self::color(color));
    }

    fn stroke_line(&mut self, from: Point2, to: Point2, thickness: f32, color: Rgba) {
        self.draw
            .line()
            .start(self.to_window(from))
            .end(self.to_window(to))
            .weight(thickness)
            .color(Self::color(color));
    }

    fn fill_circle(&mut self, center: Point2, radius: f32, color: Rgba) {
        self.draw
            .ellipse()
            .xy(self.to_window(center))
            .radius(radius)
            .color(Self::color(color));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(ColorValue),
    Line {
        from: Point2,
        to: Point2,
        thickness: f32,
        color: Rgba,
    },
    Circle {
        center: Point2,
        radius: f32,
        color: Rgba,
    },
}

// Keeps every draw call instead of painting it
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line { .. }))
            .count()
    }

    pub fn circles(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Circle { .. }))
            .count()
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self, background: &ColorValue) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear(background.clone()));
    }

    fn stroke_line(&mut self, from: Point2, to: Point2, thickness: f32, color: Rgba) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            thickness,
            color,
        });
    }

    fn fill_circle(&mut self, center: Point2, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }
}
