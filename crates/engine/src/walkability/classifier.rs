/// Thresholds for masks that mark walkable ground with bright overlay paint.
///
/// A pixel is walkable when any one rule holds. Brightness is the real-valued
/// mean of the three color channels; alpha never participates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightOverlayThresholds {
    pub very_bright: f32,
    pub neutral_brightness: f32,
    pub neutral_max_spread: u8,
    pub light_brightness: f32,
    pub light_min_channel: u8,
    pub bright: f32,
    pub pale_brightness: f32,
    pub pale_channel_floor: u8,
    pub warm_brightness: f32,
    pub warm_channel_sum: u32,
    /// Final conservative rule. `None` keeps only the stricter rules above.
    pub catch_all: Option<f32>,
}

impl Default for BrightOverlayThresholds {
    fn default() -> Self {
        Self {
            very_bright: 220.0,
            neutral_brightness: 200.0,
            neutral_max_spread: 30,
            light_brightness: 190.0,
            light_min_channel: 150,
            bright: 210.0,
            pale_brightness: 180.0,
            pale_channel_floor: 150,
            warm_brightness: 170.0,
            warm_channel_sum: 400,
            catch_all: Some(160.0),
        }
    }
}

impl BrightOverlayThresholds {
    pub fn is_walkable(&self, r: u8, g: u8, b: u8) -> bool {
        let sum = r as u32 + g as u32 + b as u32;
        let brightness = sum as f32 / 3.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);

        brightness >= self.very_bright
            || (brightness >= self.neutral_brightness && max - min <= self.neutral_max_spread)
            || (brightness >= self.light_brightness && min >= self.light_min_channel)
            || brightness >= self.bright
            || (brightness >= self.pale_brightness && min >= self.pale_channel_floor)
            || (brightness >= self.warm_brightness && sum > self.warm_channel_sum)
            || self
                .catch_all
                .is_some_and(|threshold| brightness >= threshold)
    }
}

/// Per-scene rule for turning one mask pixel into a walkable flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PixelClassifier {
    BrightOverlay(BrightOverlayThresholds),
    /// Every channel, alpha included, must be strictly above `min_channel`.
    ChannelFloor { min_channel: u8 },
}

impl Default for PixelClassifier {
    fn default() -> Self {
        Self::BrightOverlay(BrightOverlayThresholds::default())
    }
}

impl PixelClassifier {
    pub fn classify(&self, r: u8, g: u8, b: u8, a: u8) -> bool {
        match self {
            PixelClassifier::BrightOverlay(thresholds) => thresholds.is_walkable(r, g, b),
            PixelClassifier::ChannelFloor { min_channel } => {
                r > *min_channel && g > *min_channel && b > *min_channel && a > *min_channel
            }
        }
    }

    pub fn classify_rgba(&self, pixel: &[u8]) -> bool {
        match pixel {
            [r, g, b, a, ..] => self.classify(*r, *g, *b, *a),
            _ => false,
        }
    }
}

/// Canonical classifier: default bright-overlay thresholds.
pub fn is_walkable(r: u8, g: u8, b: u8, a: u8) -> bool {
    PixelClassifier::default().classify(r, g, b, a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brightness_at_or_above_220_is_always_walkable() {
        for r in (0..=255u32).step_by(5) {
            for g in (0..=255u32).step_by(5) {
                let needed = (660i64 - r as i64 - g as i64).clamp(0, 255) as u32;
                for b in needed..=255 {
                    if r + g + b < 660 {
                        continue;
                    }
                    assert!(
                        is_walkable(r as u8, g as u8, b as u8, 0),
                        "rgb({r},{g},{b}) rejected"
                    );
                }
            }
        }
    }

    #[test]
    fn catch_all_admits_mid_gray_and_can_be_disabled() {
        let strict = PixelClassifier::BrightOverlay(BrightOverlayThresholds {
            catch_all: None,
            ..BrightOverlayThresholds::default()
        });
        assert!(is_walkable(165, 160, 160, 255));
        assert!(!strict.classify(250, 100, 130, 255));
        assert!(is_walkable(250, 100, 130, 255));
    }

    #[test]
    fn dark_pixels_are_blocked() {
        assert!(!is_walkable(0, 0, 0, 255));
        assert!(!is_walkable(120, 140, 100, 255));
        assert!(!is_walkable(255, 0, 0, 255));
    }

    #[test]
    fn neutral_rule_requires_low_spread() {
        let thresholds = BrightOverlayThresholds {
            catch_all: None,
            bright: 255.0,
            light_brightness: 255.0,
            pale_brightness: 255.0,
            warm_brightness: 255.0,
            ..BrightOverlayThresholds::default()
        };
        assert!(thresholds.is_walkable(205, 200, 195));
        assert!(!thresholds.is_walkable(240, 200, 160));
    }

    #[test]
    fn alpha_is_ignored_by_bright_overlay() {
        assert_eq!(is_walkable(230, 230, 230, 0), is_walkable(230, 230, 230, 255));
    }

    #[test]
    fn channel_floor_is_strict_and_checks_alpha() {
        let woods = PixelClassifier::ChannelFloor { min_channel: 200 };
        assert!(woods.classify(201, 201, 201, 201));
        assert!(!woods.classify(200, 255, 255, 255));
        assert!(!woods.classify(255, 255, 255, 100));
    }

    #[test]
    fn short_pixel_slice_is_not_walkable() {
        assert!(!PixelClassifier::default().classify_rgba(&[255, 255, 255]));
        assert!(PixelClassifier::default().classify_rgba(&[255, 255, 255, 255]));
    }
}
