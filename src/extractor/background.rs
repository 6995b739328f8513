//! Per-pixel background model and the two update passes.
//!
//! Each downscaled pixel carries a smoothed current estimate, a
//! background reference, a counter of consecutive unchanged frames,
//! and the all-time record of that counter. A pixel displaces the
//! background at the moment it sets a new stability record; once the
//! record saturates at the cap, the reference only moves again for a
//! still-run that strictly exceeds the cap.

use super::BYTES_PER_PIXEL;
use std::cmp::Ordering;

/// Returns true when any channel of the two pixels differs by more
/// than `threshold`.
#[inline]
pub(crate) fn pixels_differ(a: &[u8], b: &[u8], threshold: u8) -> bool {
    a.iter().zip(b).any(|(&pa, &pb)| pa.abs_diff(pb) > threshold)
}

/// Per-pixel state driving mask generation.
#[derive(Debug)]
pub(crate) struct BackgroundModel {
    /// Smoothed estimate of the scene, 3 bytes per pixel.
    current: Vec<u8>,
    /// Background estimate, 3 bytes per pixel.
    reference: Vec<u8>,
    /// Consecutive frames each pixel has been judged unchanged.
    stable: Vec<u32>,
    /// High-water mark of `stable`, clamped at the stability cap.
    record: Vec<u32>,
    first_frame: bool,
}

impl BackgroundModel {
    pub fn new(area: usize) -> Self {
        Self {
            current: vec![0; area * BYTES_PER_PIXEL],
            reference: vec![0; area * BYTES_PER_PIXEL],
            stable: vec![0; area],
            record: vec![0; area],
            first_frame: true,
        }
    }

    /// Zeroes the stability state and re-arms the first-frame branch.
    pub fn reset(&mut self) {
        self.stable.fill(0);
        self.record.fill(0);
        self.first_frame = true;
    }

    /// False until a frame has been absorbed since the last reset.
    #[inline]
    pub fn is_primed(&self) -> bool {
        !self.first_frame
    }

    /// Runs one frame's update over the downscaled image and writes the
    /// motion channel (byte 0) of `mask`; bytes 1 and 2 are untouched.
    ///
    /// The first frame after construction or a reset becomes both the
    /// current and the reference estimate and clears the motion
    /// channel; no motion is ever reported for it.
    pub fn update(&mut self, incoming: &[u8], threshold: u8, stable_cap: u32, mask: &mut [u8]) {
        if self.first_frame {
            self.absorb(incoming, mask);
            return;
        }

        // Pass 1: compare each incoming pixel against the current
        // estimate. A significant change restarts the pixel's still-run
        // and adopts the new value wholesale; an insignificant one
        // nudges the estimate one count per channel towards the input.
        for ((cur, inc), stable) in self
            .current
            .chunks_exact_mut(BYTES_PER_PIXEL)
            .zip(incoming.chunks_exact(BYTES_PER_PIXEL))
            .zip(self.stable.iter_mut())
        {
            if pixels_differ(inc, cur, threshold) {
                *stable = 0;
                cur.copy_from_slice(inc);
            } else {
                // Saturate one past the cap: that is exactly the count
                // needed to keep out-promoting a saturated record.
                *stable = (*stable + 1).min(stable_cap + 1);
                for (c, i) in cur.iter_mut().zip(inc) {
                    match i.cmp(c) {
                        Ordering::Greater => *c += 1,
                        Ordering::Less => *c -= 1,
                        Ordering::Equal => {}
                    }
                }
            }
        }

        // Pass 2: a pixel that beat its own stability record becomes
        // background, with the record clamped at the cap. The mask then
        // marks every pixel whose current estimate strayed from the
        // reference.
        for ((((cur, reference), px), stable), record) in self
            .current
            .chunks_exact(BYTES_PER_PIXEL)
            .zip(self.reference.chunks_exact_mut(BYTES_PER_PIXEL))
            .zip(mask.chunks_exact_mut(BYTES_PER_PIXEL))
            .zip(self.stable.iter())
            .zip(self.record.iter_mut())
        {
            if *stable > *record {
                reference.copy_from_slice(cur);
                *record = (*stable).min(stable_cap);
            }
            px[0] = if pixels_differ(reference, cur, threshold) {
                255
            } else {
                0
            };
        }
    }

    fn absorb(&mut self, incoming: &[u8], mask: &mut [u8]) {
        self.current.copy_from_slice(incoming);
        self.reference.copy_from_slice(incoming);
        self.stable.fill(0);
        self.record.fill(0);
        for px in mask.chunks_exact_mut(BYTES_PER_PIXEL) {
            px[0] = 0;
        }
        self.first_frame = false;
    }

    #[cfg(test)]
    pub fn stable_counts(&self) -> &[u32] {
        &self.stable
    }

    #[cfg(test)]
    pub fn records(&self) -> &[u32] {
        &self.record
    }

    #[cfg(test)]
    pub fn current_estimate(&self) -> &[u8] {
        &self.current
    }

    #[cfg(test)]
    pub fn reference_estimate(&self) -> &[u8] {
        &self.reference
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AREA: usize = 4;
    const CAP: u32 = 30;

    fn image(rgb: [u8; 3]) -> Vec<u8> {
        rgb.iter()
            .copied()
            .cycle()
            .take(AREA * BYTES_PER_PIXEL)
            .collect()
    }

    fn mask() -> Vec<u8> {
        vec![0; AREA * BYTES_PER_PIXEL]
    }

    #[test]
    fn test_pixels_differ_threshold_is_exclusive() {
        assert!(!pixels_differ(&[100, 100, 100], &[126, 100, 100], 26));
        assert!(pixels_differ(&[100, 100, 100], &[127, 100, 100], 26));
        assert!(pixels_differ(&[100, 100, 73], &[100, 100, 100], 26));
    }

    #[test]
    fn test_first_frame_absorbed_silently() {
        let mut model = BackgroundModel::new(AREA);
        let mut m = mask();
        // Pre-set the motion channel to prove absorb clears it.
        m.fill(255);

        model.update(&image([100, 100, 100]), 26, CAP, &mut m);

        assert!(model.is_primed());
        assert!(m.chunks_exact(BYTES_PER_PIXEL).all(|px| px[0] == 0));
        // Bytes 1 and 2 are caller scratch and stay put.
        assert!(m.chunks_exact(BYTES_PER_PIXEL).all(|px| px[1] == 255));
        assert_eq!(model.current_estimate(), model.reference_estimate());
    }

    #[test]
    fn test_sudden_change_resets_still_run() {
        let mut model = BackgroundModel::new(AREA);
        let mut m = mask();
        for _ in 0..5 {
            model.update(&image([100, 100, 100]), 26, CAP, &mut m);
        }
        assert!(model.stable_counts().iter().all(|&s| s == 4));
        assert!(model.records().iter().all(|&r| r == 4));

        model.update(&image([200, 100, 100]), 26, CAP, &mut m);

        assert!(m.chunks_exact(BYTES_PER_PIXEL).all(|px| px[0] == 255));
        assert!(model.stable_counts().iter().all(|&s| s == 0));
        assert!(model.records().iter().all(|&r| r == 4));
        assert!(model
            .current_estimate()
            .chunks_exact(BYTES_PER_PIXEL)
            .all(|px| px == [200, 100, 100]));
    }

    #[test]
    fn test_nudge_tracks_slow_drift() {
        let mut model = BackgroundModel::new(AREA);
        let mut m = mask();
        model.update(&image([100, 100, 100]), 26, CAP, &mut m);

        for step in 1..=20u8 {
            model.update(&image([100 + step, 100, 100]), 26, CAP, &mut m);
            assert!(m.chunks_exact(BYTES_PER_PIXEL).all(|px| px[0] == 0));
            // The estimate rises one count per frame, tracking the input.
            assert_eq!(model.current_estimate()[0], 100 + step);
        }
        assert!(model.stable_counts().iter().all(|&s| s == 20));
    }

    #[test]
    fn test_promotion_requires_beating_the_record() {
        let mut model = BackgroundModel::new(AREA);
        let mut m = mask();
        let a = image([100, 100, 100]);
        let b = image([140, 100, 100]);

        for _ in 0..30 {
            model.update(&a, 26, CAP, &mut m);
        }
        let record = model.records()[0];
        assert_eq!(record, 29);

        // B differs by +40: motion until its still-run beats the record.
        // The first B frame resets the counter, so the run reaches
        // record + 1 on B frame record + 2.
        for n in 1..=(record + 2) {
            model.update(&b, 26, CAP, &mut m);
            let promoted = n == record + 2;
            assert_eq!(m[0] == 0, promoted, "frame {n} of B");
        }
        assert!(model
            .reference_estimate()
            .chunks_exact(BYTES_PER_PIXEL)
            .all(|px| px == [140, 100, 100]));
    }

    #[test]
    fn test_stable_saturates_one_past_cap() {
        let mut model = BackgroundModel::new(AREA);
        let mut m = mask();
        let frame = image([100, 100, 100]);
        for _ in 0..(CAP + 20) {
            model.update(&frame, 26, CAP, &mut m);
        }
        assert!(model.stable_counts().iter().all(|&s| s == CAP + 1));
        assert!(model.records().iter().all(|&r| r == CAP));
    }

    #[test]
    fn test_reset_restores_fresh_state() {
        let mut model = BackgroundModel::new(AREA);
        let mut m = mask();
        for _ in 0..10 {
            model.update(&image([100, 100, 100]), 26, CAP, &mut m);
        }
        model.reset();
        assert!(!model.is_primed());
        assert!(model.stable_counts().iter().all(|&s| s == 0));
        assert!(model.records().iter().all(|&r| r == 0));
    }
}
