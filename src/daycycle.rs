//! World time and the sky/light colors derived from it.

use fastnoise_lite::{FastNoiseLite, NoiseType};

const NIGHT_SKY: [u8; 4] = [20, 20, 40, 255];
const DAY_SKY: [u8; 4] = [200, 230, 255, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];
const INDOOR_BASE: [u8; 4] = [255, 230, 204, 255];

/// Colors the render collaborator feeds its shading with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkyState {
    /// Fraction of the current day in [0, 1); 0.5 is noon.
    pub time_of_day: f32,
    pub sky_color: [u8; 4],
    pub outdoor_light_color: [u8; 4],
    pub indoor_light_color: [u8; 4],
}

pub struct DayCycle {
    /// World time in days.
    pub world_time: f32,
    /// Simulated seconds per real second.
    pub time_scale: f32,
    /// Debug: pin the sky to noon.
    pub fixed_to_day: bool,
    /// Debug: suppress the lightning flicker.
    pub lightning_enabled: bool,
    flicker: FastNoiseLite,
}

impl DayCycle {
    pub fn new(time_scale: f32) -> Self {
        let mut flicker = FastNoiseLite::with_seed(0);
        flicker.set_noise_type(Some(NoiseType::Perlin));
        flicker.set_frequency(Some(1000.0));
        Self {
            world_time: 0.5,
            time_scale,
            fixed_to_day: false,
            lightning_enabled: true,
            flicker,
        }
    }

    pub fn advance(&mut self, dt_seconds: f32) {
        self.world_time += (dt_seconds * self.time_scale) / (60.0 * 60.0 * 24.0);
    }

    /// High-octave 1-D noise over world time, shared by the lightning and
    /// glow flickers.
    fn flicker_noise(&self) -> f32 {
        let mut sum = 0.0;
        let mut amp = 1.0;
        let mut freq = 1.0;
        let mut norm = 0.0;
        for _ in 0..9 {
            sum += self.flicker.get_noise_2d(self.world_time * freq, 0.0) * amp;
            norm += amp;
            amp *= 0.5;
            freq *= 2.0;
        }
        sum / norm
    }

    pub fn sky_state(&self) -> SkyState {
        let time_of_day = if self.fixed_to_day {
            0.5
        } else {
            self.world_time.rem_euclid(1.0)
        };

        let mut sky = if !(0.25..=0.75).contains(&time_of_day) {
            NIGHT_SKY
        } else if time_of_day <= 0.5 {
            lerp_color(NIGHT_SKY, DAY_SKY, (time_of_day - 0.25) / 0.25)
        } else {
            lerp_color(DAY_SKY, NIGHT_SKY, (time_of_day - 0.5) / 0.25)
        };

        let flicker = self.flicker_noise();
        if self.lightning_enabled {
            let strike = ((flicker - 0.6) / 0.3).clamp(0.0, 1.0);
            sky = lerp_color(sky, WHITE, strike);
        }

        // Glow sources breathe between 80% and 100% brightness.
        let glow = 0.8 + 0.2 * ((flicker + 1.0) * 0.5).clamp(0.0, 1.0);
        let indoor = [
            (INDOOR_BASE[0] as f32 * glow) as u8,
            (INDOOR_BASE[1] as f32 * glow) as u8,
            (INDOOR_BASE[2] as f32 * glow) as u8,
            255,
        ];

        SkyState {
            time_of_day,
            sky_color: sky,
            outdoor_light_color: sky,
            indoor_light_color: indoor,
        }
    }
}

fn lerp_color(a: [u8; 4], b: [u8; 4], t: f32) -> [u8; 4] {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t) as u8;
    [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2]), 255]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_advances_at_the_configured_scale() {
        let mut cycle = DayCycle::new(86_400.0);
        cycle.world_time = 0.0;
        cycle.advance(0.5);
        assert!((cycle.world_time - 0.5).abs() < 1.0e-6);
    }

    #[test]
    fn night_wraps_around_midnight() {
        let mut cycle = DayCycle::new(200.0);
        cycle.lightning_enabled = false;
        cycle.world_time = 2.1; // 0.1 of a day: deep night
        assert_eq!(cycle.sky_state().sky_color, NIGHT_SKY);
        cycle.world_time = 2.5; // noon
        assert_eq!(cycle.sky_state().sky_color, DAY_SKY);
    }

    #[test]
    fn fixed_to_day_pins_noon() {
        let mut cycle = DayCycle::new(200.0);
        cycle.lightning_enabled = false;
        cycle.fixed_to_day = true;
        cycle.world_time = 0.05;
        let sky = cycle.sky_state();
        assert_eq!(sky.time_of_day, 0.5);
        assert_eq!(sky.sky_color, DAY_SKY);
    }

    #[test]
    fn indoor_glow_stays_within_band() {
        let mut cycle = DayCycle::new(200.0);
        for i in 0..100 {
            cycle.world_time = i as f32 * 0.013;
            let indoor = cycle.sky_state().indoor_light_color;
            assert!(indoor[0] >= (INDOOR_BASE[0] as f32 * 0.8) as u8 - 1);
            assert!(indoor[0] <= INDOOR_BASE[0]);
        }
    }
}
