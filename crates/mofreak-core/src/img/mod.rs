pub mod diff;
pub mod roi;

pub use diff::{difference_image, IntegralImage};
pub use roi::{bilinear_sample, clamped_square_roi, resample_to_grid};
