//! Color and shape heuristics for a leaf photo.
//!
//! Hue, saturation and value follow the 8-bit OpenCV convention
//! (H in `0..180`, S and V in `0..=255`) so the fixed ranges below keep
//! their usual meaning. All range bounds are inclusive.

use crate::error::LeafError;
use crate::models::LeafMetrics;
use image::{GrayImage, ImageFormat, ImageReader, Limits, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;
use std::io::Cursor;

/// Gray level above which a pixel counts as leaf.
const BINARY_THRESHOLD: u8 = 127;

/// Largest width or height accepted before decoding.
pub const MAX_DIMENSION: u32 = 8192;

/// Inclusive HSV box.
#[derive(Debug, Clone, Copy)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| self.lower[i] <= hsv[i] && hsv[i] <= self.upper[i])
    }
}

pub const YELLOW: HsvRange = HsvRange {
    lower: [20, 100, 100],
    upper: [30, 255, 255],
};

pub const BROWN: HsvRange = HsvRange {
    lower: [10, 100, 20],
    upper: [20, 255, 200],
};

/// Decode `bytes` and compute its [`LeafMetrics`].
///
/// CPU-bound; callers on the async runtime should go through
/// `tokio::task::spawn_blocking`.
pub fn extract_metrics(bytes: &[u8]) -> Result<LeafMetrics, LeafError> {
    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| LeafError::InvalidImage(e.to_string()))?;

    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_DIMENSION);
    limits.max_image_height = Some(MAX_DIMENSION);
    reader.limits(limits);

    let image = reader
        .decode()
        .map_err(|e| LeafError::InvalidImage(e.to_string()))?;

    if image.width() == 0 || image.height() == 0 {
        return Err(LeafError::InvalidImage("image has no pixels".to_string()));
    }

    Ok(metrics_for(&image.to_rgb8()))
}

pub fn metrics_for(image: &RgbImage) -> LeafMetrics {
    let total = f64::from(image.width()) * f64::from(image.height());

    let (mut yellow, mut brown) = (0u64, 0u64);
    for pixel in image.pixels() {
        let hsv = rgb_to_hsv(pixel.0);
        if YELLOW.contains(hsv) {
            yellow += 1;
        }
        if BROWN.contains(hsv) {
            brown += 1;
        }
    }

    LeafMetrics {
        yellow_spots: round2(yellow as f64 / total * 100.0),
        brown_spots: round2(brown as f64 / total * 100.0),
        solidity: round2(solidity(&binarize(image))),
    }
}

/// MIME type and file extension for a decodable upload. Unknown formats
/// are reported as JPEG.
pub fn image_kind(bytes: &[u8]) -> (&'static str, &'static str) {
    image::guess_format(bytes)
        .ok()
        .map(|format| {
            let ext = format.extensions_str().first().copied().unwrap_or("bin");
            (format.to_mime_type(), ext)
        })
        .unwrap_or((ImageFormat::Jpeg.to_mime_type(), "jpg"))
}

/// OpenCV-compatible `RGB2HSV` for 8-bit images.
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let v = r.max(g).max(b);
    let diff = v - r.min(g).min(b);

    let s = if v == 0 {
        0
    } else {
        round_half_up(f64::from(255 * diff) / f64::from(v))
    };

    let h = if diff == 0 {
        0
    } else {
        let sector = if v == r {
            g - b
        } else if v == g {
            b - r + 2 * diff
        } else {
            r - g + 4 * diff
        };
        let h = round_half_up(f64::from(sector) * 30.0 / f64::from(diff));
        if h < 0 {
            h + 180
        } else {
            h
        }
    };

    [h as u8, s as u8, v as u8]
}

/// BT.601 luma with OpenCV's fixed-point weights, thresholded to 0/255.
fn binarize(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let luma = (u32::from(r) * 4899 + u32::from(g) * 9617 + u32::from(b) * 1868 + 8192) >> 14;
        Luma([if luma > u32::from(BINARY_THRESHOLD) { 255 } else { 0 }])
    })
}

/// Area of the largest external contour over the area of its convex hull,
/// as a percentage. Zero when there is no contour or the hull is flat.
fn solidity(binary: &GrayImage) -> f64 {
    let largest = find_contours::<i32>(binary)
        .into_iter()
        .filter(|c| c.parent.is_none() && c.border_type == BorderType::Outer)
        .map(|c| {
            let area = polygon_area(&c.points);
            (area, c.points)
        })
        .fold(None::<(f64, Vec<Point<i32>>)>, |best, (area, points)| match best {
            Some((best_area, _)) if best_area >= area => best,
            _ => Some((area, points)),
        });

    let Some((area, points)) = largest else {
        return 0.0;
    };

    let hull_area = polygon_area(&convex_hull(&points));
    if hull_area > 0.0 {
        area / hull_area * 100.0
    } else {
        0.0
    }
}

/// Shoelace area of a closed polygon.
fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y))
        .sum();
    twice.abs() as f64 / 2.0
}

/// Andrew's monotone chain; collinear points are dropped.
fn convex_hull(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let mut sorted: Vec<Point<i32>> = points.to_vec();
    sorted.sort_by_key(|p| (p.x, p.y));
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let mut hull = half_hull(sorted.iter());
    hull.extend(half_hull(sorted.iter().rev()));
    hull
}

/// One side of the hull, without its last point (the other side starts there).
fn half_hull<'a>(points: impl Iterator<Item = &'a Point<i32>>) -> Vec<Point<i32>> {
    let mut chain: Vec<Point<i32>> = Vec::new();
    for &p in points {
        while chain.len() >= 2 && cross(chain[chain.len() - 2], chain[chain.len() - 1], p) <= 0 {
            chain.pop();
        }
        chain.push(p);
    }
    chain.pop();
    chain
}

fn cross(o: Point<i32>, a: Point<i32>, b: Point<i32>) -> i64 {
    i64::from(a.x - o.x) * i64::from(b.y - o.y) - i64::from(a.y - o.y) * i64::from(b.x - o.x)
}

fn round_half_up(x: f64) -> i32 {
    (x + 0.5).floor() as i32
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
