//! Synthetic test pattern renderer

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Renders a moving RGB test pattern, one frame per sequence number
///
/// The pattern is a diagonal gradient with a vertical sweep bar plus a little
/// seeded noise so consecutive JPEG frames differ in size and content. The
/// same (seed, sequence) pair always renders the same pixels.
pub struct PatternGenerator {
    width: u32,
    height: u32,
    seed: u64,
}

impl PatternGenerator {
    pub fn new(width: u32, height: u32, seed: u64) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            seed,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Render frame `seq` as packed RGB8
    pub fn render(&self, seq: u64) -> Vec<u8> {
        let w = self.width as usize;
        let h = self.height as usize;
        let bar = (seq as usize * 4) % w;
        let mut rng = StdRng::seed_from_u64(self.seed ^ seq);

        let mut rgb = vec![0u8; w * h * 3];
        for y in 0..h {
            for x in 0..w {
                let i = (y * w + x) * 3;
                let grad = ((x + y + seq as usize) % 256) as u8;
                let noise: u8 = rng.gen_range(0..16);
                if x >= bar && x < bar + 8 {
                    // sweep bar
                    rgb[i] = 255;
                    rgb[i + 1] = 255 - grad;
                    rgb[i + 2] = noise;
                } else {
                    rgb[i] = grad;
                    rgb[i + 1] = grad.wrapping_add(noise);
                    rgb[i + 2] = 255 - grad;
                }
            }
        }
        rgb
    }
}
