use image::GrayImage;

/// Edge length of the square patches compared by the SSD test.
pub const PATCH_EDGE: u32 = 3;

/// SSD threshold for a single direction bit. 288 over a 3x3 patch
/// corresponds to an average intensity difference of 32 per pixel.
pub const SSD_THRESHOLD: u32 = 288;

/// Ring of previous-frame patch centers tested against the current patch,
/// one compass-like direction per bit, bit 0 first. The radius-4 spacing is
/// part of the calibrated algorithm and must not change.
pub const MIP_RING_OFFSETS: [(i32, i32); 8] = [
    (-4, 0),
    (-3, 3),
    (0, 4),
    (3, 3),
    (4, 0),
    (3, -3),
    (0, -4),
    (-3, -3),
];

/// Edge length of the canonical grid every keypoint ROI is resampled to
/// before MIP evaluation.
pub const CANONICAL_GRID_EDGE: u32 = 19;

/// MIP evaluation centers inside the canonical grid that make up the motion
/// descriptor: the eight off-center cells of a 3x3 arrangement. The exact
/// center (9, 9) is reserved for the sufficiency test and deliberately
/// absent here.
pub const DESCRIPTOR_CENTERS: [(u32, u32); 8] = [
    (5, 5),
    (5, 9),
    (5, 13),
    (9, 5),
    (9, 13),
    (13, 5),
    (13, 9),
    (13, 13),
];

/// MIP evaluation center used by the keypoint sufficiency gate.
pub const GATE_CENTER: (u32, u32) = (9, 9);

/// Sum of squared differences between the 3x3 patch centered at `(ax, ay)`
/// in `a` and the one centered at `(bx, by)` in `b`.
///
/// Both patches must lie fully inside their frames; callers clip
/// coordinates before calling.
pub fn patch_ssd(a: &GrayImage, (ax, ay): (u32, u32), b: &GrayImage, (bx, by): (u32, u32)) -> u32 {
    let r = (PATCH_EDGE / 2) as i64;
    debug_assert!(
        patch_in_bounds(a, ax, ay) && patch_in_bounds(b, bx, by),
        "patch centers ({ax}, {ay}) / ({bx}, {by}) leave the frame"
    );

    let mut ssd = 0u32;
    for dy in -r..=r {
        for dx in -r..=r {
            let pa = a.get_pixel((ax as i64 + dx) as u32, (ay as i64 + dy) as u32)[0] as i32;
            let pb = b.get_pixel((bx as i64 + dx) as u32, (by as i64 + dy) as u32)[0] as i32;
            let d = pa - pb;
            ssd += (d * d) as u32;
        }
    }
    ssd
}

/// Motion interchange pattern for the patch centered at `(x, y)`.
///
/// Compares the current-frame patch against eight previous-frame patches on
/// the [`MIP_RING_OFFSETS`] ring and sets one bit per direction whose SSD
/// exceeds [`SSD_THRESHOLD`]. Callers must keep `(x, y)` far enough from
/// the border that every ring patch stays in bounds (5 pixels suffice).
pub fn motion_interchange_pattern(current: &GrayImage, previous: &GrayImage, x: u32, y: u32) -> u8 {
    let mut descriptor = 0u8;
    for (bit, &(ox, oy)) in MIP_RING_OFFSETS.iter().enumerate() {
        let px = (x as i32 + ox) as u32;
        let py = (y as i32 + oy) as u32;
        if patch_ssd(current, (x, y), previous, (px, py)) > SSD_THRESHOLD {
            descriptor |= 1 << bit;
        }
    }
    descriptor
}

fn patch_in_bounds(img: &GrayImage, x: u32, y: u32) -> bool {
    let r = PATCH_EDGE / 2;
    x >= r && y >= r && x + r < img.width() && y + r < img.height()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(width: u32, height: u32, value: u8) -> GrayImage {
        GrayImage::from_pixel(width, height, image::Luma([value]))
    }

    #[test]
    fn ssd_of_identical_patches_is_zero() {
        let a = uniform(9, 9, 120);
        assert_eq!(patch_ssd(&a, (4, 4), &a, (4, 4)), 0);
    }

    #[test]
    fn ssd_of_constant_offset_patches() {
        let a = uniform(9, 9, 100);
        let b = uniform(9, 9, 107);
        // Nine pixels each differing by 7.
        assert_eq!(patch_ssd(&a, (4, 4), &b, (4, 4)), 9 * 49);
    }

    #[test]
    fn mip_is_zero_for_identical_frames() {
        let frame = uniform(CANONICAL_GRID_EDGE, CANONICAL_GRID_EDGE, 64);
        for &(x, y) in DESCRIPTOR_CENTERS.iter().chain(std::iter::once(&GATE_CENTER)) {
            assert_eq!(motion_interchange_pattern(&frame, &frame, x, y), 0);
        }
    }

    #[test]
    fn mip_sets_all_bits_for_large_uniform_change() {
        // Average per-pixel difference of 64 is well past the 32/pixel
        // threshold in every direction.
        let current = uniform(CANONICAL_GRID_EDGE, CANONICAL_GRID_EDGE, 192);
        let previous = uniform(CANONICAL_GRID_EDGE, CANONICAL_GRID_EDGE, 128);
        assert_eq!(
            motion_interchange_pattern(&current, &previous, GATE_CENTER.0, GATE_CENTER.1),
            0xFF
        );
    }

    #[test]
    fn mip_threshold_is_strict() {
        // An SSD of exactly 288 must not set a bit. Give every 3x3 patch
        // eight pixels differing by 6 and one matching pixel: 8 * 36 = 288.
        let previous = uniform(CANONICAL_GRID_EDGE, CANONICAL_GRID_EDGE, 100);
        let mut current = uniform(CANONICAL_GRID_EDGE, CANONICAL_GRID_EDGE, 106);
        for y in 0..CANONICAL_GRID_EDGE {
            for x in 0..CANONICAL_GRID_EDGE {
                if x % 3 == 0 && y % 3 == 0 {
                    current.put_pixel(x, y, image::Luma([100]));
                }
            }
        }
        assert_eq!(
            patch_ssd(&current, GATE_CENTER, &previous, GATE_CENTER),
            SSD_THRESHOLD
        );
        assert_eq!(
            motion_interchange_pattern(&current, &previous, GATE_CENTER.0, GATE_CENTER.1),
            0
        );
    }
}
