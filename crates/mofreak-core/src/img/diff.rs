use image::{GrayImage, Luma};
use imageproc::map::map_colors2;

/// Absolute pixel-wise difference between two consecutive frames.
///
/// Frames of one video share dimensions; a mismatch is a contract
/// violation and panics.
pub fn difference_image(current: &GrayImage, previous: &GrayImage) -> GrayImage {
    assert_eq!(
        current.dimensions(),
        previous.dimensions(),
        "difference requires equally sized frames"
    );
    map_colors2(current, previous, |c, p| Luma([c[0].abs_diff(p[0])]))
}

/// Prefix-sum transform of a difference image with a zero-padded top-left
/// row and column, so any rectangular sum is four lookups.
#[derive(Debug, Clone)]
pub struct IntegralImage {
    /// Padded dimensions: one larger than the source in each direction.
    cols: usize,
    rows: usize,
    data: Vec<u64>,
}

impl IntegralImage {
    pub fn new(diff: &GrayImage) -> Self {
        let cols = diff.width() as usize + 1;
        let rows = diff.height() as usize + 1;
        let mut data = vec![0u64; cols * rows];

        for y in 1..rows {
            let mut row_sum = 0u64;
            for x in 1..cols {
                row_sum += diff.get_pixel(x as u32 - 1, y as u32 - 1)[0] as u64;
                data[y * cols + x] = data[(y - 1) * cols + x] + row_sum;
            }
        }

        Self { cols, rows, data }
    }

    /// Largest valid padded column index.
    pub fn max_col(&self) -> i64 {
        self.cols as i64 - 1
    }

    /// Largest valid padded row index.
    pub fn max_row(&self) -> i64 {
        self.rows as i64 - 1
    }

    /// Sum of the source rectangle with padded-image corners
    /// `(tl_x, tl_y)` and `(br_x, br_y)`, corners clamped into bounds.
    ///
    /// Standard four-corner formula: br + tl - tr - bl.
    pub fn clamped_box_sum(&self, tl_x: i64, tl_y: i64, br_x: i64, br_y: i64) -> u64 {
        let tl_x = tl_x.clamp(0, self.max_col()) as usize;
        let tl_y = tl_y.clamp(0, self.max_row()) as usize;
        let br_x = br_x.clamp(0, self.max_col()) as usize;
        let br_y = br_y.clamp(0, self.max_row()) as usize;

        let br = self.data[br_y * self.cols + br_x];
        let tl = self.data[tl_y * self.cols + tl_x];
        let tr = self.data[tl_y * self.cols + br_x];
        let bl = self.data[br_y * self.cols + tl_x];
        br + tl - tr - bl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difference_is_symmetric_and_zero_on_identical_frames() {
        let a = GrayImage::from_pixel(8, 8, Luma([90]));
        let diff = difference_image(&a, &a);
        assert!(diff.pixels().all(|p| p[0] == 0));

        let b = GrayImage::from_pixel(8, 8, Luma([110]));
        let ab = difference_image(&a, &b);
        let ba = difference_image(&b, &a);
        assert!(ab.pixels().all(|p| p[0] == 20));
        assert_eq!(ab.as_raw(), ba.as_raw());
    }

    #[test]
    fn integral_box_sum_matches_direct_summation() {
        let mut diff = GrayImage::new(6, 5);
        for y in 0..5 {
            for x in 0..6 {
                diff.put_pixel(x, y, Luma([(x + 2 * y) as u8]));
            }
        }
        let integral = IntegralImage::new(&diff);

        // Rectangle covering source pixels x in 1..4, y in 2..4.
        let expected: u64 = (2..4)
            .flat_map(|y| (1..4).map(move |x| (x + 2 * y) as u64))
            .sum();
        assert_eq!(integral.clamped_box_sum(1, 2, 4, 4), expected);

        // The whole image.
        let total: u64 = diff.pixels().map(|p| p[0] as u64).sum();
        assert_eq!(integral.clamped_box_sum(0, 0, 6, 5), total);
    }

    #[test]
    fn integral_clamps_out_of_range_corners() {
        let diff = GrayImage::from_pixel(4, 4, Luma([3]));
        let integral = IntegralImage::new(&diff);
        assert_eq!(integral.clamped_box_sum(-5, -5, 100, 100), 16 * 3);
    }
}
