//! Next-zoom bounding boxes.
//!
//! Every tile at zoom `z` splits into four tiles at `z + 1`, so index `i`
//! becomes `2i` and `2i + 1`. A padded mosaic also covers half a tile (one
//! deeper tile) beyond each padded edge, or a whole tile (two deeper tiles)
//! when a pole made the padding one-sided.

use crate::bbox::BoundingBox;
use crate::coord::{dec_x, inc_x};
use crate::padding::PaddingMethod;

fn doubled(axis: &[u32]) -> Vec<u32> {
    axis.iter().flat_map(|&i| [2 * i, 2 * i + 1]).collect()
}

fn extend_west(axis: &mut Vec<u32>, zoom: u8) {
    if let Some(&first) = axis.first() {
        axis.insert(0, dec_x(first, zoom));
    }
}

fn extend_east(axis: &mut Vec<u32>, zoom: u8) {
    if let Some(&last) = axis.last() {
        axis.push(inc_x(last, zoom));
    }
}

fn extend_north(axis: &mut Vec<u32>) {
    if let Some(north) = axis.first().and_then(|y| y.checked_sub(1)) {
        axis.insert(0, north);
    }
}

fn extend_south(axis: &mut Vec<u32>) {
    if let Some(&last) = axis.last() {
        axis.push(last + 1);
    }
}

/// Box at `zoom + 1` covering the image built from `bbox` at `zoom`.
///
/// `bbox` is the box before padding and `method` the padding that was applied
/// to it, so the result lines up exactly with the squared image.
pub fn next_zoom_bounding_box(method: PaddingMethod, bbox: &BoundingBox, zoom: u8) -> BoundingBox {
    let next = zoom + 1;
    let mut x_axis = doubled(&bbox.x_axis);
    let mut y_axis = doubled(&bbox.y_axis);

    match method {
        PaddingMethod::NorthSouthWestEast => {
            extend_west(&mut x_axis, next);
            extend_east(&mut x_axis, next);
            extend_north(&mut y_axis);
            extend_south(&mut y_axis);
        }
        PaddingMethod::WestEast => {
            extend_west(&mut x_axis, next);
            extend_east(&mut x_axis, next);
        }
        PaddingMethod::NorthSouth => {
            extend_north(&mut y_axis);
            extend_south(&mut y_axis);
        }
        PaddingMethod::North => {
            extend_north(&mut y_axis);
            extend_north(&mut y_axis);
        }
        PaddingMethod::South => {
            extend_south(&mut y_axis);
            extend_south(&mut y_axis);
        }
        PaddingMethod::None => {}
    }

    BoundingBox::new(x_axis, y_axis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::padding::plan;

    #[test]
    fn test_unpadded_box_doubles() {
        let bbox = BoundingBox::new(vec![3, 4], vec![7, 8]);
        let next = next_zoom_bounding_box(PaddingMethod::None, &bbox, 4);
        assert_eq!(next.x_axis, vec![6, 7, 8, 9]);
        assert_eq!(next.y_axis, vec![14, 15, 16, 17]);
    }

    #[test]
    fn test_all_sides() {
        let next = next_zoom_bounding_box(
            PaddingMethod::NorthSouthWestEast,
            &BoundingBox::single(16, 16),
            5,
        );
        assert_eq!(next.x_axis, vec![31, 32, 33, 34]);
        assert_eq!(next.y_axis, vec![31, 32, 33, 34]);
    }

    #[test]
    fn test_west_east_wraps_at_deeper_zoom() {
        let bbox = BoundingBox::new(vec![0], vec![4, 5]);
        let next = next_zoom_bounding_box(PaddingMethod::WestEast, &bbox, 3);
        assert_eq!(next.x_axis, vec![15, 0, 1, 2]);
        assert_eq!(next.y_axis, vec![8, 9, 10, 11]);
    }

    #[test]
    fn test_north_south() {
        let bbox = BoundingBox::new(vec![7, 8], vec![5]);
        let next = next_zoom_bounding_box(PaddingMethod::NorthSouth, &bbox, 4);
        assert_eq!(next.x_axis, vec![14, 15, 16, 17]);
        assert_eq!(next.y_axis, vec![9, 10, 11, 12]);
    }

    #[test]
    fn test_one_sided_polar_padding() {
        let south_pole = BoundingBox::new(vec![1, 2], vec![3]);
        let north = next_zoom_bounding_box(PaddingMethod::North, &south_pole, 2);
        assert_eq!(north.y_axis, vec![4, 5, 6, 7]);

        let north_pole = BoundingBox::new(vec![1, 2], vec![0]);
        let south = next_zoom_bounding_box(PaddingMethod::South, &north_pole, 2);
        assert_eq!(south.y_axis, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_result_covers_squared_box() {
        // The deeper box is exactly the doubled squared box, shifted by the
        // half-tile crop where one was applied
        for (bbox, zoom) in [
            (BoundingBox::single(9, 9), 5),
            (BoundingBox::new(vec![4], vec![2, 3]), 4),
            (BoundingBox::new(vec![4, 5], vec![3]), 4),
            (BoundingBox::new(vec![4, 5], vec![0]), 4),
            (BoundingBox::new(vec![4, 5], vec![15]), 4),
        ] {
            let plan = plan(&bbox, zoom).unwrap();
            let next = next_zoom_bounding_box(plan.method, &bbox, zoom);
            assert_eq!(next.width(), 4, "{}", plan.method);
            assert_eq!(next.height(), 4, "{}", plan.method);

            let (half_x, half_y) = plan.crop.origin(2);
            assert_eq!(next.x_axis[0], 2 * plan.square.x_axis[0] + half_x);
            assert_eq!(next.y_axis[0], 2 * plan.square.y_axis[0] + half_y);
        }
    }
}
