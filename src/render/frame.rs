use std::sync::Arc;

use vello_cpu::kurbo::Shape as _;

use crate::animation::ease::Ease;
use crate::assets::decode::CoverImage;
use crate::foundation::core::{Affine, Canvas, FrameIndex, Rect};
use crate::foundation::error::{StoryVideoError, StoryVideoResult};
use crate::render::surface::FrameRGBA;
use crate::scene::motion::{CameraMotion, KenBurnsPath, motion_rng};
use crate::scene::particles::{Particle, create_particles};
use crate::scene::placement::CoverPlacement;

/// Warm white used for the dust particles (alpha comes from each particle).
const PARTICLE_RGB: [u8; 3] = [255, 244, 220];
const CIRCLE_TOLERANCE: f64 = 0.1;

/// Per-compile visual toggles.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Slow pan/zoom over the cover image.
    pub enable_ken_burns: bool,
    /// Ambient dust overlay.
    pub enable_particles: bool,
    /// Time remapping applied to clip progress before computing the camera.
    pub motion_ease: Ease,
    /// Seed for the path pick and particle field. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            enable_ken_burns: true,
            enable_particles: true,
            motion_ease: Ease::InOutSine,
            seed: None,
        }
    }
}

/// Linear clip progress of `frame`: 0 at the first frame, 1 at the last.
pub fn frame_progress(frame: FrameIndex, total_frames: u64) -> f64 {
    let denom = total_frames.saturating_sub(1).max(1);
    ((frame.0 as f64) / (denom as f64)).clamp(0.0, 1.0)
}

/// Everything that stays fixed for one clip: geometry, the chosen path, and the particle field.
#[derive(Clone, Debug, PartialEq)]
pub struct StoryScene {
    /// Output raster size.
    pub canvas: Canvas,
    /// Where the cover sits before any camera motion.
    pub placement: CoverPlacement,
    /// Direction of the Ken Burns pan.
    pub path: KenBurnsPath,
    /// Dust particles (empty when particles are disabled).
    pub particles: Vec<Particle>,
    /// Visual toggles.
    pub options: RenderOptions,
}

impl StoryScene {
    /// Lay out a cover of `image_width x image_height` on `canvas`, picking the path and particles
    /// from `options.seed`.
    pub fn new(image_width: u32, image_height: u32, canvas: Canvas, options: RenderOptions) -> Self {
        let mut rng = motion_rng(options.seed);
        let path = KenBurnsPath::pick(&mut rng);
        let particles = if options.enable_particles {
            create_particles(canvas, &mut rng)
        } else {
            Vec::new()
        };
        Self {
            canvas,
            placement: CoverPlacement::fit(image_width, image_height, canvas),
            path,
            particles,
            options,
        }
    }

    /// Camera for `frame` of a `total_frames` clip.
    pub fn frame_transform(&self, frame: FrameIndex, total_frames: u64) -> CameraMotion {
        if !self.options.enable_ken_burns {
            return CameraMotion::STILL;
        }
        let eased = self
            .options
            .motion_ease
            .apply(frame_progress(frame, total_frames));
        CameraMotion::ken_burns(self.path, &self.placement, eased)
    }
}

/// CPU rasterizer for story frames.
///
/// Owns one raster surface that is overwritten by every [`FrameRenderer::render_frame`] call, so
/// frames must be consumed before the next one is drawn.
pub struct FrameRenderer {
    scene: StoryScene,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    cover: vello_cpu::Image,
    cover_width: f64,
    cover_height: f64,
    frame: FrameRGBA,
}

impl FrameRenderer {
    /// Upload `cover` and allocate the surface for `scene.canvas`.
    pub fn new(cover: &CoverImage, scene: StoryScene) -> StoryVideoResult<Self> {
        let (w, h) = surface_size(scene.canvas)?;
        let pixmap = pixmap_from_premul_bytes(&cover.rgba8_premul, cover.width, cover.height)?;
        let cover_paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        Ok(Self {
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
            cover: cover_paint,
            cover_width: f64::from(cover.width),
            cover_height: f64::from(cover.height),
            frame: FrameRGBA::new(scene.canvas.width, scene.canvas.height),
            scene,
        })
    }

    /// The fixed scene this renderer draws.
    pub fn scene(&self) -> &StoryScene {
        &self.scene
    }

    /// Draw `frame` of a `total_frames` clip at `time_secs` and return the surface.
    pub fn render_frame(
        &mut self,
        frame: FrameIndex,
        total_frames: u64,
        time_secs: f64,
    ) -> StoryVideoResult<&FrameRGBA> {
        let canvas = self.scene.canvas;
        let camera = self.scene.frame_transform(frame, total_frames);
        let dest = camera.apply(&self.scene.placement);

        let ctx = &mut self.ctx;
        ctx.reset();

        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(0, 0, 0, 255));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(canvas.width),
            f64::from(canvas.height),
        ));

        if dest.width() > 0.0 && dest.height() > 0.0 {
            ctx.set_transform(affine_to_cpu(cover_transform(
                dest,
                self.cover_width,
                self.cover_height,
            )));
            ctx.set_paint(self.cover.clone());
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                self.cover_width,
                self.cover_height,
            ));
        }

        if self.scene.options.enable_particles {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            for p in &self.scene.particles {
                let at = p.position_at(time_secs, canvas);
                let alpha = (p.alpha * 255.0).round().clamp(0.0, 255.0) as u8;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    PARTICLE_RGB[0],
                    PARTICLE_RGB[1],
                    PARTICLE_RGB[2],
                    alpha,
                ));
                let dot = vello_cpu::kurbo::Circle::new((at.x, at.y), p.radius);
                ctx.fill_path(&dot.to_path(CIRCLE_TOLERANCE));
            }
        }

        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);
        self.frame
            .data
            .copy_from_slice(self.pixmap.data_as_u8_slice());

        if frame.0 % 50 == 0 {
            tracing::debug!(
                frame = frame.0,
                total_frames,
                zoom = camera.zoom,
                pan_x = camera.pan.x,
                pan_y = camera.pan.y,
                "rendered frame"
            );
        }
        Ok(&self.frame)
    }
}

/// Maps cover image space onto `dest`.
fn cover_transform(dest: Rect, image_width: f64, image_height: f64) -> Affine {
    Affine::translate((dest.x0, dest.y0))
        * Affine::scale_non_uniform(dest.width() / image_width, dest.height() / image_height)
}

fn surface_size(canvas: Canvas) -> StoryVideoResult<(u16, u16)> {
    let w: u16 = canvas
        .width
        .try_into()
        .map_err(|_| StoryVideoError::invalid_config("canvas width exceeds u16"))?;
    let h: u16 = canvas
        .height
        .try_into()
        .map_err(|_| StoryVideoError::invalid_config("canvas height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(StoryVideoError::invalid_config("canvas must be non-empty"));
    }
    Ok((w, h))
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> StoryVideoResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| StoryVideoError::image_load("cover width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| StoryVideoError::image_load("cover height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(StoryVideoError::image_load("cover image is empty"));
    }
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(StoryVideoError::image_load("cover pixel buffer has the wrong length"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
