use crate::foundation::core::{Canvas, Rect};

/// Where the cover image lands inside the output frame.
///
/// The rectangle preserves the image's aspect ratio, touches the canvas on the major axis, and is
/// centered (letterboxed) on the minor axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoverPlacement {
    /// Drawn width in pixels.
    pub draw_width: f64,
    /// Drawn height in pixels.
    pub draw_height: f64,
    /// Left edge in pixels.
    pub draw_x: f64,
    /// Top edge in pixels.
    pub draw_y: f64,
}

impl CoverPlacement {
    /// Fit an `image_width x image_height` image into `canvas`.
    pub fn fit(image_width: u32, image_height: u32, canvas: Canvas) -> Self {
        let canvas_w = f64::from(canvas.width);
        let canvas_h = f64::from(canvas.height);
        if image_width == 0 || image_height == 0 {
            return Self {
                draw_width: 0.0,
                draw_height: 0.0,
                draw_x: canvas_w / 2.0,
                draw_y: canvas_h / 2.0,
            };
        }

        let image_aspect = f64::from(image_width) / f64::from(image_height);
        if image_aspect > canvas.aspect() {
            // wider than the frame: fit by width
            let draw_height = canvas_w / image_aspect;
            Self {
                draw_width: canvas_w,
                draw_height,
                draw_x: 0.0,
                draw_y: (canvas_h - draw_height) / 2.0,
            }
        } else {
            let draw_width = canvas_h * image_aspect;
            Self {
                draw_width,
                draw_height: canvas_h,
                draw_x: (canvas_w - draw_width) / 2.0,
                draw_y: 0.0,
            }
        }
    }

    /// The placement as a `kurbo` rectangle.
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.draw_x,
            self.draw_y,
            self.draw_x + self.draw_width,
            self.draw_y + self.draw_height,
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/placement.rs"]
mod tests;
