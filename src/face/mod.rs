//! Expression rendering
//!
//! [`Renderer::render`] paints one full window for a [`RenderRequest`]:
//!
//! 1. the stored image for the expression, if the asset store has a usable one
//! 2. otherwise the procedural face for the expression (unknown names draw "happy")
//! 3. the label, centred near the bottom of the panel
//!
//! Rendering never fails. A broken image only costs a warning in the log.

use std::fmt;

use embedded_graphics::Drawable;

use crate::asset::{self, AssetError, AssetStore};
use crate::surface::{infallible, PixelSurface, WHITE};

pub mod layout;
mod procedural;

use layout::FaceLayout;

/// The faces the device knows how to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Expression {
    #[default]
    Happy,
    Sad,
    Thinking,
    Excited,
    Sleepy,
    Curious,
}

impl Expression {
    pub const ALL: [Expression; 6] = [
        Expression::Happy,
        Expression::Sad,
        Expression::Thinking,
        Expression::Excited,
        Expression::Sleepy,
        Expression::Curious,
    ];

    /// Exact name match, `None` for anything else
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.name() == name)
    }

    /// Like [`from_name`](Self::from_name) but unknown names fall back to happy
    pub fn parse(name: &str) -> Self {
        Self::from_name(name).unwrap_or_default()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Expression::Happy => "happy",
            Expression::Sad => "sad",
            Expression::Thinking => "thinking",
            Expression::Excited => "excited",
            Expression::Sleepy => "sleepy",
            Expression::Curious => "curious",
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What to show next
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Expression name as received, also the asset name
    pub expression: String,
    /// Free text shown instead of the expression name
    pub label: Option<String>,
}

impl RenderRequest {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Which path produced the face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderSource {
    Asset,
    Procedural(Expression),
}

pub struct Renderer {
    layout: FaceLayout,
    store: Option<Box<dyn AssetStore>>,
}

impl Renderer {
    /// Renderer that only draws procedural faces
    pub fn new(layout: FaceLayout) -> Self {
        Self {
            layout,
            store: None,
        }
    }

    /// Prefer images from `store` when it has one for the expression
    pub fn with_store(mut self, store: impl AssetStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn layout(&self) -> &FaceLayout {
        &self.layout
    }

    pub fn render<S: PixelSurface>(
        &self,
        surface: &mut S,
        request: &RenderRequest,
    ) -> RenderSource {
        log::info!("Showing expression: {}", request.expression);

        // Read from the store on every render, decoded images are not kept around
        let image = self.store.as_deref().and_then(|store| {
            match asset::try_load(store, &request.expression) {
                Ok(image) => Some(image),
                Err(AssetError::NotFound) => {
                    log::debug!("No stored image for {}", request.expression);
                    None
                }
                Err(e) => {
                    log::warn!("Ignoring stored image for {}: {}", request.expression, e);
                    None
                }
            }
        });

        let expression = Expression::parse(&request.expression);
        let source = match image {
            Some(_) => RenderSource::Asset,
            None => RenderSource::Procedural(expression),
        };
        // A stored image is labelled with the tag it was stored under
        let label = request.label.as_deref().unwrap_or(match source {
            RenderSource::Asset => request.expression.as_str(),
            RenderSource::Procedural(expression) => expression.name(),
        });

        surface.begin_full_window_paint();
        loop {
            surface.fill_screen(WHITE);
            match &image {
                Some(image) => infallible(image.draw(surface)),
                None => procedural::draw(surface, &self.layout, expression),
            }
            self.draw_label(surface, label);

            if !surface.commit_page() {
                break;
            }
        }

        match source {
            RenderSource::Asset => log::info!("Loaded from SD card"),
            RenderSource::Procedural(_) => log::info!("Using programmatic drawing"),
        }
        source
    }

    fn draw_label<S: PixelSurface>(&self, surface: &mut S, label: &str) {
        let (text_width, _) = surface.measure_text(label);
        let x = (self.layout.width as i32 - text_width as i32) / 2;
        surface.draw_text(label, x, self.layout.label_y);
    }
}
