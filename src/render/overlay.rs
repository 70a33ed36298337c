//! Text overlays drawn on top of composited frames.
//!
//! Text is laid out and rasterized by `usvg`/`resvg` from a single-line SVG text node, using
//! only the fonts named by the overlay's [`FontSpec`].

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};

use crate::assets::fonts::{FontSpec, overlay_font_resolver};
use crate::foundation::color::Rgba8;
use crate::foundation::error::{MotionError, MotionResult};
use crate::render::composite::over_in_place;
use crate::render::raster::Raster;
use crate::scene::playback::TimeWindow;
use crate::scene::viewport::ViewportSpec;

/// Default timestamp layout for annotations.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Font spec plus its loaded font database; shared by every frame of a render.
#[derive(Clone, Debug)]
pub struct TextStyle {
    font: FontSpec,
    fontdb: Arc<usvg::fontdb::Database>,
    color: Rgba8,
}

impl TextStyle {
    /// Validate `font` and load its fonts.
    ///
    /// Fails when the spec yields no font faces, since the text could not be drawn.
    pub fn new(font: FontSpec, color: Rgba8) -> MotionResult<Self> {
        font.validate()?;
        let fontdb = font.load_fontdb()?;
        if fontdb.is_empty() {
            return Err(MotionError::validation(format!(
                "no fonts loaded for family '{}'; set font_files, font_dirs or system_fonts",
                font.family
            )));
        }
        Ok(Self {
            font,
            fontdb,
            color,
        })
    }

    /// Font selection.
    pub fn font(&self) -> &FontSpec {
        &self.font
    }

    /// Text color.
    pub fn color(&self) -> Rgba8 {
        self.color
    }
}

/// Time range and viewport center label, drawn at `(x, y)` on every frame.
#[derive(Clone, Debug)]
pub struct FrameAnnotation {
    /// Left edge of the text in pixels.
    pub x: i32,
    /// Top edge of the text in pixels.
    pub y: i32,
    style: TextStyle,
    date_format: String,
    lon_lat: bool,
}

impl FrameAnnotation {
    /// Create an annotation. `date_format` is a strftime layout and is validated here.
    pub fn new(
        x: i32,
        y: i32,
        font: FontSpec,
        color: Rgba8,
        lon_lat: bool,
        date_format: impl Into<String>,
    ) -> MotionResult<Self> {
        let date_format = date_format.into();
        if StrftimeItems::new(&date_format).any(|item| matches!(item, Item::Error)) {
            return Err(MotionError::validation(format!(
                "invalid annotation date_format '{date_format}'"
            )));
        }
        Ok(Self {
            x,
            y,
            style: TextStyle::new(font, color)?,
            date_format,
            lon_lat,
        })
    }

    /// Text style.
    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    /// strftime layout used for the window bounds.
    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// `true` when the center is written longitude first.
    pub fn lon_lat(&self) -> bool {
        self.lon_lat
    }

    /// Label text for one window: `"{start} - {end} ({a}, {b})"`.
    pub fn label(&self, window: &TimeWindow, viewport: &ViewportSpec) -> MotionResult<String> {
        let (a, b) = if self.lon_lat {
            (viewport.center_lon(), viewport.center_lat())
        } else {
            (viewport.center_lat(), viewport.center_lon())
        };

        let mut out = String::new();
        write!(
            out,
            "{} - {} ({a:.6}, {b:.6})",
            window.start.format(&self.date_format),
            window.end.format(&self.date_format)
        )
        .map_err(|_| {
            MotionError::render(format!(
                "failed to format window {window} with '{}'",
                self.date_format
            ))
        })?;
        Ok(out)
    }

    /// Draw the label for `window` onto `target`.
    pub fn apply(
        &self,
        target: &mut Raster,
        window: &TimeWindow,
        viewport: &ViewportSpec,
    ) -> MotionResult<()> {
        let text = self.label(window, viewport)?;
        draw_text(target, &text, self.x, self.y, &self.style)
    }
}

/// Fixed text drawn at `(x, y)` on every frame.
#[derive(Clone, Debug)]
pub struct FrameWatermark {
    /// Watermark text.
    pub text: String,
    /// Left edge of the text in pixels.
    pub x: i32,
    /// Top edge of the text in pixels.
    pub y: i32,
    style: TextStyle,
}

impl FrameWatermark {
    /// Create a watermark.
    pub fn new(
        text: impl Into<String>,
        x: i32,
        y: i32,
        font: FontSpec,
        color: Rgba8,
    ) -> MotionResult<Self> {
        Ok(Self {
            text: text.into(),
            x,
            y,
            style: TextStyle::new(font, color)?,
        })
    }

    /// Text style.
    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    /// Draw the watermark onto `target`.
    pub fn apply(&self, target: &mut Raster) -> MotionResult<()> {
        draw_text(target, &self.text, self.x, self.y, &self.style)
    }
}

/// Rasterize one line of text with its top-left at `(x, y)` and composite it onto `target`.
pub fn draw_text(
    target: &mut Raster,
    text: &str,
    x: i32,
    y: i32,
    style: &TextStyle,
) -> MotionResult<()> {
    if text.is_empty() {
        return Ok(());
    }

    let svg = text_svg(target.width, target.height, text, x, y, style);
    let opts = usvg::Options {
        fontdb: style.fontdb.clone(),
        font_resolver: overlay_font_resolver(),
        ..Default::default()
    };
    let tree = usvg::Tree::from_str(&svg, &opts)
        .map_err(|e| MotionError::render(format!("failed to lay out overlay text: {e}")))?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(target.width, target.height)
        .ok_or_else(|| MotionError::render("failed to allocate overlay pixmap"))?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::identity(),
        &mut pixmap.as_mut(),
    );

    let layer = Raster::from_premul(target.width, target.height, pixmap.take())?;
    over_in_place(target, &layer)
}

fn text_svg(width: u32, height: u32, text: &str, x: i32, y: i32, style: &TextStyle) -> String {
    let size = style.font.size_px;
    let c = style.color;
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            r#"<text x="{x}" y="{baseline}" font-family="{family}" font-size="{size}" "#,
            r##"fill="#{r:02x}{g:02x}{b:02x}" fill-opacity="{opacity}" xml:space="preserve">{text}</text>"##,
            "</svg>"
        ),
        w = width,
        h = height,
        x = x,
        baseline = f64::from(y) + f64::from(size),
        family = xml_escape(&style.font.family),
        size = size,
        r = c.r,
        g = c.g,
        b = c.b,
        opacity = f64::from(c.a) / 255.0,
        text = xml_escape(text),
    )
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/overlay.rs"]
mod tests;
