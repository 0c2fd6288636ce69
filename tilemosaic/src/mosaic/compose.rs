//! Blocking image compositing.
//!
//! These functions do file and pixel work synchronously and are meant to be
//! called from `spawn_blocking`.

use std::path::{Path, PathBuf};

use image::{imageops, RgbaImage};

use super::MosaicError;

/// Direction pieces are laid out in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Top to bottom.
    Vertical,
    /// Left to right.
    Horizontal,
}

/// Loads `path` and checks it is exactly `width` x `height` pixels.
fn load_piece(path: &Path, width: u32, height: u32) -> Result<RgbaImage, MosaicError> {
    if !path.is_file() {
        return Err(MosaicError::MissingFragment(path.to_path_buf()));
    }
    let piece = image::open(path)
        .map_err(|source| MosaicError::Image {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();

    if piece.dimensions() != (width, height) {
        return Err(MosaicError::Dimensions {
            path: path.to_path_buf(),
            expected: (width, height),
            actual: piece.dimensions(),
        });
    }
    Ok(piece)
}

fn save(canvas: &RgbaImage, output: &Path) -> Result<(), MosaicError> {
    canvas
        .save_with_format(output, image::ImageFormat::Png)
        .map_err(|source| MosaicError::Image {
            path: output.to_path_buf(),
            source,
        })
}

/// Stacks equally sized pieces along `axis` and writes the result to `output`.
///
/// Every piece must exist and measure `piece_width` x `piece_height`.
pub fn stack(
    pieces: &[PathBuf],
    axis: Axis,
    piece_width: u32,
    piece_height: u32,
    output: &Path,
) -> Result<(), MosaicError> {
    if pieces.is_empty() {
        return Err(MosaicError::NoFragments);
    }

    let count = pieces.len() as u32;
    let (width, height) = match axis {
        Axis::Vertical => (piece_width, piece_height * count),
        Axis::Horizontal => (piece_width * count, piece_height),
    };
    let mut canvas = RgbaImage::new(width, height);

    for (index, path) in pieces.iter().enumerate() {
        let piece = load_piece(path, piece_width, piece_height)?;
        let (x, y) = match axis {
            Axis::Vertical => (0, piece_height * index as u32),
            Axis::Horizontal => (piece_width * index as u32, 0),
        };
        imageops::replace(&mut canvas, &piece, x as i64, y as i64);
    }

    save(&canvas, output)
}

/// Copies the `width` x `height` region at (`x`, `y`) of `source` to `output`.
pub fn crop(
    source: &Path,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    output: &Path,
) -> Result<(), MosaicError> {
    if !source.is_file() {
        return Err(MosaicError::MissingFragment(source.to_path_buf()));
    }
    let image = image::open(source)
        .map_err(|e| MosaicError::Image {
            path: source.to_path_buf(),
            source: e,
        })?
        .to_rgba8();

    let (source_width, source_height) = image.dimensions();
    if x + width > source_width || y + height > source_height {
        return Err(MosaicError::Dimensions {
            path: source.to_path_buf(),
            expected: (x + width, y + height),
            actual: (source_width, source_height),
        });
    }

    let region = imageops::crop_imm(&image, x, y, width, height).to_image();
    save(&region, output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_solid(path: &Path, width: u32, height: u32, value: u8) {
        RgbaImage::from_pixel(width, height, image::Rgba([value, value, value, 255]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_vertical_stack_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let pieces: Vec<PathBuf> = (0..3).map(|i| dir.path().join(format!("p{}.png", i))).collect();
        for (i, path) in pieces.iter().enumerate() {
            write_solid(path, 4, 4, i as u8 * 100);
        }

        let out = dir.path().join("out.png");
        stack(&pieces, Axis::Vertical, 4, 4, &out).unwrap();

        let result = image::open(&out).unwrap().to_rgba8();
        assert_eq!(result.dimensions(), (4, 12));
        assert_eq!(result.get_pixel(0, 0)[0], 0);
        assert_eq!(result.get_pixel(0, 5)[0], 100);
        assert_eq!(result.get_pixel(3, 11)[0], 200);
    }

    #[test]
    fn test_horizontal_stack() {
        let dir = tempfile::tempdir().unwrap();
        let pieces: Vec<PathBuf> = (0..2).map(|i| dir.path().join(format!("p{}.png", i))).collect();
        write_solid(&pieces[0], 4, 8, 10);
        write_solid(&pieces[1], 4, 8, 20);

        let out = dir.path().join("out.png");
        stack(&pieces, Axis::Horizontal, 4, 8, &out).unwrap();

        let result = image::open(&out).unwrap().to_rgba8();
        assert_eq!(result.dimensions(), (8, 8));
        assert_eq!(result.get_pixel(5, 7)[0], 20);
    }

    #[test]
    fn test_missing_piece_fails() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a.png");
        write_solid(&present, 4, 4, 0);
        let missing = dir.path().join("b.png");

        let result = stack(
            &[present, missing.clone()],
            Axis::Vertical,
            4,
            4,
            &dir.path().join("out.png"),
        );
        assert!(matches!(result, Err(MosaicError::MissingFragment(p)) if p == missing));
    }

    #[test]
    fn test_wrong_size_piece_fails() {
        let dir = tempfile::tempdir().unwrap();
        let piece = dir.path().join("a.png");
        write_solid(&piece, 4, 5, 0);

        let result = stack(&[piece], Axis::Vertical, 4, 4, &dir.path().join("out.png"));
        assert!(matches!(
            result,
            Err(MosaicError::Dimensions {
                actual: (4, 5),
                ..
            })
        ));
    }

    #[test]
    fn test_crop_center() {
        let dir = tempfile::tempdir().unwrap();
        let pieces: Vec<PathBuf> = (0..3).map(|i| dir.path().join(format!("p{}.png", i))).collect();
        for (i, path) in pieces.iter().enumerate() {
            write_solid(path, 4, 4, i as u8 * 100);
        }
        let strip = dir.path().join("strip.png");
        stack(&pieces, Axis::Horizontal, 4, 4, &strip).unwrap();

        let out = dir.path().join("crop.png");
        crop(&strip, 2, 0, 8, 4, &out).unwrap();

        let result = image::open(&out).unwrap().to_rgba8();
        assert_eq!(result.dimensions(), (8, 4));
        assert_eq!(result.get_pixel(0, 0)[0], 0);
        assert_eq!(result.get_pixel(2, 0)[0], 100);
        assert_eq!(result.get_pixel(7, 0)[0], 200);
    }

    #[test]
    fn test_crop_out_of_bounds_fails() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("s.png");
        write_solid(&source, 4, 4, 0);

        let result = crop(&source, 2, 2, 4, 4, &dir.path().join("out.png"));
        assert!(matches!(result, Err(MosaicError::Dimensions { .. })));
    }
}
