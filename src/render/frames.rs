use std::sync::Arc;

use crate::{
    animation::arrival::{Pose, arrival_progress, pose_at},
    animation::ease::Ease,
    assets::decode::decode_source_image,
    assets::raster::PreparedImage,
    foundation::core::{Point, Size},
    foundation::error::{DwiError, DwiResult},
    overlay::model::Direction,
    render::composite::{FrameRGBA, blit_over, output_dimensions},
    render::job::RenderJob,
    styles::catalog::{StyleCatalog, StyleVariant},
};

struct Sprite {
    image: PreparedImage,
    rest: Pose,
    direction: Direction,
}

/// Everything needed to compose any frame of a job, prepared once per job.
///
/// The background is the source image with the whole-image flips applied and resized to the
/// output size. Each overlay is rasterized once at its output size.
pub struct FramePlan {
    background: PreparedImage,
    sprites: Vec<Sprite>,
    canvas: Size,
    frame_count: u32,
    ease: Ease,
}

impl FramePlan {
    #[tracing::instrument(skip_all, fields(overlays = job.overlays().len()))]
    pub fn prepare(job: &RenderJob, catalog: &dyn StyleCatalog) -> DwiResult<Self> {
        let source = decode_source_image(job.source_image())?;
        let config = job.config();
        let (out_w, out_h) =
            output_dimensions(source.width, source.height, config.output_max_dimension);
        let background = prepare_background(source, job, out_w, out_h)?;

        let display = job.display();
        let fx = f64::from(out_w) / display.rendered_width;
        let fy = f64::from(out_h) / display.rendered_height;

        let mut sprites = Vec::with_capacity(job.overlays().len());
        for overlay in job.overlays() {
            let rest = facing_box(
                Point::new(overlay.position.x * fx, overlay.position.y * fy),
                Size::new(overlay.size().width * fx, overlay.size().height * fy),
                overlay.direction,
            );
            let (w, h) = sprite_pixels(rest.size)?;
            let image = catalog.rasterize(
                &overlay.style,
                w,
                h,
                StyleVariant {
                    horizontal: overlay.flip_horizontal,
                    vertical: overlay.flip_vertical,
                    direction: overlay.direction,
                },
            )?;
            sprites.push(Sprite {
                image,
                rest,
                direction: overlay.direction,
            });
        }

        tracing::debug!(width = out_w, height = out_h, "prepared frame plan");
        Ok(Self {
            background,
            sprites,
            canvas: Size::new(f64::from(out_w), f64::from(out_h)),
            frame_count: config.frame_count,
            ease: config.ease,
        })
    }

    pub fn width(&self) -> u32 {
        self.background.width
    }

    pub fn height(&self) -> u32 {
        self.background.height
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Compose frame `index`: background, then every overlay at its arrival pose in stacking
    /// order.
    pub fn compose(&self, index: u32) -> FrameRGBA {
        let t = arrival_progress(index, self.frame_count);
        let mut frame = FrameRGBA::from_prepared(&self.background);
        for sprite in &self.sprites {
            let pose = pose_at(sprite.rest, sprite.direction, self.canvas, t, self.ease);
            let (x, y) = self.blit_origin(pose.position, &sprite.image);
            blit_over(&mut frame, &sprite.image, x, y);
        }
        frame
    }

    /// Pixel origin of a sprite, clamped to just outside the canvas so far-away overlays
    /// stay representable.
    fn blit_origin(&self, position: Point, sprite: &PreparedImage) -> (i64, i64) {
        let clamp = |v: f64, extent: f64, canvas: f64| -> i64 {
            let v = if v.is_nan() { canvas } else { v };
            v.round().clamp(-extent - 1.0, canvas + 1.0) as i64
        };
        (
            clamp(position.x, f64::from(sprite.width), self.canvas.width),
            clamp(position.y, f64::from(sprite.height), self.canvas.height),
        )
    }
}

/// Box an overlay occupies once `direction` is applied: sideways facings rotate the
/// `position`/`size` box a quarter turn about its center.
fn facing_box(position: Point, size: Size, direction: Direction) -> Pose {
    if !direction.is_sideways() {
        return Pose { position, size };
    }
    let shift = (size.width - size.height) / 2.0;
    Pose {
        position: Point::new(position.x + shift, position.y - shift),
        size: Size::new(size.height, size.width),
    }
}

fn prepare_background(
    source: PreparedImage,
    job: &RenderJob,
    out_w: u32,
    out_h: u32,
) -> DwiResult<PreparedImage> {
    let (w, h) = (source.width, source.height);
    let mut buf = image::RgbaImage::from_raw(w, h, Arc::unwrap_or_clone(source.rgba8_premul))
        .ok_or_else(|| DwiError::render("source buffer does not match its dimensions"))?;
    let options = job.image_options();
    if options.flip_horizontal {
        image::imageops::flip_horizontal_in_place(&mut buf);
    }
    if options.flip_vertical {
        image::imageops::flip_vertical_in_place(&mut buf);
    }
    // Premultiplied data filters without dark fringes.
    let buf = if (w, h) == (out_w, out_h) {
        buf
    } else {
        image::imageops::resize(&buf, out_w, out_h, image::imageops::FilterType::Triangle)
    };
    PreparedImage::new(out_w, out_h, buf.into_raw())
        .ok_or_else(|| DwiError::render("resized background has unexpected length"))
}

fn sprite_pixels(size: Size) -> DwiResult<(u32, u32)> {
    let px = |v: f64| -> DwiResult<u32> {
        let r = v.round().max(1.0);
        if !r.is_finite() || r > f64::from(u32::MAX) {
            return Err(DwiError::render(format!("overlay size out of range: {v}")));
        }
        Ok(r as u32)
    };
    Ok((px(size.width)?, px(size.height)?))
}

#[cfg(test)]
#[path = "../../tests/unit/render/frames.rs"]
mod tests;
