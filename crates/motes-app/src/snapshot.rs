//! Software rasterizer for recorded draw commands, used to save a frame as PNG.

use std::path::Path;

use glam::{Vec2, Vec4};
use image::{Rgba, RgbaImage};
use motes_platform::headless::DrawCommand;
use motes_platform::{sample_gradient, SurfaceSize};

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Source-over blend of a straight-alpha colour onto an opaque pixel.
fn blend(pixel: &mut Rgba<u8>, color: Vec4) {
    let a = color.w.clamp(0.0, 1.0);
    if a <= 0.0 {
        return;
    }
    let src = [color.x, color.y, color.z];
    for (channel, src) in pixel.0.iter_mut().zip(src) {
        let dst = *channel as f32 / 255.0;
        let out = src.clamp(0.0, 1.0) * a + dst * (1.0 - a);
        *channel = (out * 255.0).round() as u8;
    }
}

/// Pixels whose centres may fall inside the box `min..max`, clipped to the image.
fn bounds(image: &RgbaImage, min: Vec2, max: Vec2) -> (u32, u32, u32, u32) {
    let clip = |v: f32, max: u32| v.max(0.0).min(max as f32) as u32;
    (
        clip(min.x.floor(), image.width()),
        clip(min.y.floor(), image.height()),
        clip(max.x.ceil(), image.width()),
        clip(max.y.ceil(), image.height()),
    )
}

fn circle_bounds(image: &RgbaImage, center: Vec2, radius: f32) -> (u32, u32, u32, u32) {
    bounds(image, center - Vec2::splat(radius), center + Vec2::splat(radius))
}

fn pixel_center(x: u32, y: u32) -> Vec2 {
    Vec2::new(x as f32 + 0.5, y as f32 + 0.5)
}

pub fn rasterize(commands: &[DrawCommand], size: SurfaceSize) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(size.width, size.height, BACKGROUND);
    for command in commands {
        match command {
            DrawCommand::Clear => {
                for pixel in image.pixels_mut() {
                    *pixel = BACKGROUND;
                }
            }
            DrawCommand::Rect { min, size, color } => {
                let max = *min + *size;
                let (x0, y0, x1, y1) = bounds(&image, *min, max);
                for y in y0..y1 {
                    for x in x0..x1 {
                        let c = pixel_center(x, y);
                        if c.cmpge(*min).all() && c.cmplt(max).all() {
                            blend(image.get_pixel_mut(x, y), *color);
                        }
                    }
                }
            }
            DrawCommand::Circle {
                center,
                radius,
                color,
            } => {
                let (x0, y0, x1, y1) = circle_bounds(&image, *center, *radius);
                for y in y0..y1 {
                    for x in x0..x1 {
                        if pixel_center(x, y).distance(*center) <= *radius {
                            blend(image.get_pixel_mut(x, y), *color);
                        }
                    }
                }
            }
            DrawCommand::RadialGradient {
                center,
                inner_radius,
                outer_radius,
                stops,
            } => {
                let span = (outer_radius - inner_radius).max(f32::EPSILON);
                let (x0, y0, x1, y1) = circle_bounds(&image, *center, *outer_radius);
                for y in y0..y1 {
                    for x in x0..x1 {
                        let d = pixel_center(x, y).distance(*center);
                        if d > *outer_radius {
                            continue;
                        }
                        let t = ((d - inner_radius) / span).clamp(0.0, 1.0);
                        blend(image.get_pixel_mut(x, y), sample_gradient(stops, t));
                    }
                }
            }
        }
    }
    image
}

pub fn save_png(frame: &RgbaImage, path: impl AsRef<Path>) -> image::ImageResult<()> {
    frame.save_with_format(path, image::ImageFormat::Png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;
    use motes_platform::GradientStop;

    #[test]
    fn opaque_rect_covers_exact_pixels() {
        let commands = [
            DrawCommand::Clear,
            DrawCommand::Rect {
                min: Vec2::new(1.0, 1.0),
                size: Vec2::new(2.0, 2.0),
                color: Vec4::ONE,
            },
        ];
        let image = rasterize(&commands, SurfaceSize::new(4, 4));
        assert_eq!(*image.get_pixel(1, 1), Rgba([255, 255, 255, 255]));
        assert_eq!(*image.get_pixel(2, 2), Rgba([255, 255, 255, 255]));
        assert_eq!(*image.get_pixel(0, 0), BACKGROUND);
        assert_eq!(*image.get_pixel(3, 3), BACKGROUND);
    }

    #[test]
    fn rect_hanging_off_the_edge_is_clipped() {
        let commands = [
            DrawCommand::Rect {
                min: Vec2::new(-2.0, -2.0),
                size: Vec2::new(4.0, 4.0),
                color: Vec4::ONE,
            },
            DrawCommand::Rect {
                min: Vec2::new(100.0, 100.0),
                size: Vec2::new(4.0, 4.0),
                color: Vec4::ONE,
            },
        ];
        let image = rasterize(&commands, SurfaceSize::new(4, 4));
        assert_eq!(*image.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*image.get_pixel(1, 1), Rgba([255, 255, 255, 255]));
        assert_eq!(*image.get_pixel(2, 2), BACKGROUND);
        assert_eq!(*image.get_pixel(3, 3), BACKGROUND);
    }

    #[test]
    fn half_alpha_blends_over_black() {
        let commands = [DrawCommand::Circle {
            center: Vec2::new(5.0, 5.0),
            radius: 2.0,
            color: Vec4::new(1.0, 1.0, 1.0, 0.5),
        }];
        let image = rasterize(&commands, SurfaceSize::new(10, 10));
        assert_eq!(image.get_pixel(5, 5).0[0], 128);
        assert_eq!(*image.get_pixel(0, 0), BACKGROUND);
    }

    #[test]
    fn gradient_fades_outward() {
        let commands = [DrawCommand::RadialGradient {
            center: Vec2::new(10.0, 10.0),
            inner_radius: 0.0,
            outer_radius: 8.0,
            stops: vec![
                GradientStop::new(0.0, Vec4::new(1.0, 1.0, 1.0, 1.0)),
                GradientStop::new(1.0, Vec4::new(1.0, 1.0, 1.0, 0.0)),
            ],
        }];
        let image = rasterize(&commands, SurfaceSize::new(20, 20));
        let near = image.get_pixel(10, 10).0[0];
        let far = image.get_pixel(15, 10).0[0];
        assert!(near > far);
        assert_eq!(*image.get_pixel(0, 0), BACKGROUND);
    }

    #[test]
    fn shapes_off_canvas_are_clipped() {
        let commands = [DrawCommand::Circle {
            center: Vec2::new(-50.0, -50.0),
            radius: 10.0,
            color: Vec4::ONE,
        }];
        let image = rasterize(&commands, SurfaceSize::new(4, 4));
        assert!(image.pixels().all(|p| *p == BACKGROUND));
    }

    #[test]
    fn saves_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let frame = rasterize(&[DrawCommand::Clear], SurfaceSize::new(3, 2));
        save_png(&frame, &path).unwrap();
        let loaded = image::open(&path).unwrap();
        assert_eq!(loaded.dimensions(), (3, 2));
    }
}
