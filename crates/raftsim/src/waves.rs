//! Ocean wave field: sum-of-sines directional waves with Gerstner-style
//! horizontal displacement.
//!
//! The field is a pure function of world position and time. The only
//! externally mutable input is `storm_intensity`, set by the weather
//! collaborator. For a fixed `(position, time)` every output is
//! reproducible, which the deterministic tests rely on.

use crate::constants::{SEA_LEVEL, WAVE_NORMAL_EPSILON};
use glam::{Vec2, Vec3};
use std::f32::consts::TAU;

/// One directional wave component.
#[derive(Clone, Copy, Debug)]
pub struct WaveComponent {
    /// Horizontal travel direction (normalized on construction).
    pub direction: Vec2,
    /// Steepness multiplier (0-1). Scales both height and horizontal bob.
    pub steepness: f32,
    /// Crest-to-crest wavelength (m).
    pub wavelength: f32,
    /// Base amplitude (m).
    pub amplitude: f32,
    /// Phase speed (m/s).
    pub speed: f32,
}

impl WaveComponent {
    pub fn new(direction: Vec2, steepness: f32, wavelength: f32, amplitude: f32, speed: f32) -> Self {
        Self {
            direction: direction.normalize_or_zero(),
            steepness,
            wavelength: wavelength.max(0.01),
            amplitude,
            speed,
        }
    }
}

/// Instantaneous wave state at one world position.
#[derive(Clone, Copy, Debug)]
pub struct WaveSample {
    /// Water surface height (world Y).
    pub height: f32,
    /// Surface normal, estimated by finite differences.
    pub normal: Vec3,
    /// Horizontal displacement so floating objects orbit instead of
    /// bobbing straight up and down.
    pub bob_offset: Vec3,
    /// Horizontal drift velocity (slow sinusoid plus storm turbulence).
    pub current: Vec3,
}

impl WaveSample {
    /// A flat, still sea. Used when no wave field is registered.
    pub fn calm() -> Self {
        Self {
            height: SEA_LEVEL,
            normal: Vec3::Y,
            bob_offset: Vec3::ZERO,
            current: Vec3::ZERO,
        }
    }
}

/// Directional wave field sampled by the buoyancy aggregator.
#[derive(Clone, Debug)]
pub struct WaveField {
    components: Vec<WaveComponent>,
    storm_intensity: f32,
    /// Extra amplitude gain at full storm (multiplier on top of calm).
    pub storm_amplitude_gain: f32,
    /// Base drift speed of the ambient current (m/s).
    pub current_strength: f32,
    /// How strongly storm turbulence bends the current along wave slopes.
    pub turbulence_strength: f32,
}

impl Default for WaveField {
    fn default() -> Self {
        // Four components: one long swell, two mid-length cross seas, one
        // short chop. Matches the reference ocean's layered look.
        Self::new(vec![
            WaveComponent::new(Vec2::new(1.0, 0.3), 0.8, 24.0, 0.6, 3.0),
            WaveComponent::new(Vec2::new(-0.4, 1.0), 0.6, 13.0, 0.35, 2.2),
            WaveComponent::new(Vec2::new(0.7, -0.8), 0.5, 9.0, 0.22, 1.8),
            WaveComponent::new(Vec2::new(-1.0, -0.2), 0.9, 5.0, 0.12, 1.4),
        ])
    }
}

impl WaveField {
    pub fn new(components: Vec<WaveComponent>) -> Self {
        Self {
            components,
            storm_intensity: 0.0,
            storm_amplitude_gain: 2.0,
            current_strength: 0.4,
            turbulence_strength: 1.2,
        }
    }

    /// A perfectly flat sea (no components). Handy for tests that need
    /// deterministic submersion numbers.
    pub fn flat() -> Self {
        Self::new(Vec::new())
    }

    pub fn storm_intensity(&self) -> f32 {
        self.storm_intensity
    }

    /// Set storm intensity, clamped to [0, 1]. Called by the weather
    /// collaborator; scales amplitude, bob, and current turbulence.
    pub fn set_storm_intensity(&mut self, intensity: f32) {
        self.storm_intensity = intensity.clamp(0.0, 1.0);
    }

    fn amplitude_scale(&self) -> f32 {
        1.0 + self.storm_intensity * self.storm_amplitude_gain
    }

    /// Water surface height at `position` (only X/Z are read).
    pub fn height_at(&self, position: Vec3, time: f64) -> f32 {
        let scale = self.amplitude_scale();
        let p = Vec2::new(position.x, position.z);
        let mut height = SEA_LEVEL;

        for c in &self.components {
            let k = TAU / c.wavelength;
            let phase = k * (c.direction.dot(p) - c.speed * time as f32);
            height += c.steepness * c.amplitude * scale * phase.sin();
        }

        height
    }

    /// Full wave sample: height, normal, bob offset, and current.
    pub fn sample(&self, position: Vec3, time: f64) -> WaveSample {
        let scale = self.amplitude_scale();
        let p = Vec2::new(position.x, position.z);

        let height = self.height_at(position, time);

        // Horizontal Gerstner displacement: each component pushes points
        // along its travel direction by the cosine of its phase.
        let mut bob = Vec2::ZERO;
        for c in &self.components {
            let k = TAU / c.wavelength;
            let phase = k * (c.direction.dot(p) - c.speed * time as f32);
            bob += c.direction * (c.steepness * c.amplitude * scale * phase.cos());
        }

        // Normal from central differences of the height function.
        let eps = WAVE_NORMAL_EPSILON;
        let hx0 = self.height_at(position - Vec3::X * eps, time);
        let hx1 = self.height_at(position + Vec3::X * eps, time);
        let hz0 = self.height_at(position - Vec3::Z * eps, time);
        let hz1 = self.height_at(position + Vec3::Z * eps, time);
        let normal = Vec3::new(hx0 - hx1, 2.0 * eps, hz0 - hz1).normalize_or_zero();
        let normal = if normal.length_squared() > 0.0 { normal } else { Vec3::Y };

        // Ambient drift: slow rotating current, plus a storm term that
        // follows the local wave slope.
        let t = time as f32;
        let drift = Vec3::new((t * 0.13).sin(), 0.0, (t * 0.11).cos()) * self.current_strength;
        let slope = Vec3::new(normal.x, 0.0, normal.z);
        let current = drift + slope * (self.storm_intensity * self.turbulence_strength);

        WaveSample {
            height,
            normal,
            bob_offset: Vec3::new(bob.x, 0.0, bob.y),
            current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_field_is_still_water() {
        let field = WaveField::flat();
        let s = field.sample(Vec3::new(4.0, 0.0, -7.0), 123.0);
        assert!((s.height - SEA_LEVEL).abs() < 1e-6);
        assert!((s.normal - Vec3::Y).length() < 1e-6);
        assert!(s.bob_offset.length() < 1e-6);
    }

    #[test]
    fn sampling_is_deterministic() {
        let field = WaveField::default();
        let p = Vec3::new(12.5, 0.0, -3.0);
        let a = field.sample(p, 42.75);
        let b = field.sample(p, 42.75);
        assert_eq!(a.height, b.height);
        assert_eq!(a.normal, b.normal);
        assert_eq!(a.current, b.current);
    }

    #[test]
    fn storm_increases_wave_height_range() {
        let mut field = WaveField::default();
        let p = Vec3::new(3.0, 0.0, 8.0);

        let calm_range = height_range(&field, p);
        field.set_storm_intensity(1.0);
        let storm_range = height_range(&field, p);

        assert!(storm_range > calm_range * 1.5);
    }

    #[test]
    fn storm_intensity_is_clamped() {
        let mut field = WaveField::default();
        field.set_storm_intensity(7.0);
        assert!((field.storm_intensity() - 1.0).abs() < 1e-6);
        field.set_storm_intensity(-2.0);
        assert!(field.storm_intensity().abs() < 1e-6);
    }

    #[test]
    fn normal_points_up_on_average() {
        let field = WaveField::default();
        for i in 0..32 {
            let p = Vec3::new(i as f32 * 1.7, 0.0, i as f32 * -0.9);
            let s = field.sample(p, i as f64 * 0.31);
            assert!(s.normal.y > 0.0, "normal flipped at {p:?}");
            assert!((s.normal.length() - 1.0).abs() < 1e-4);
        }
    }

    fn height_range(field: &WaveField, p: Vec3) -> f32 {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for i in 0..200 {
            let h = field.height_at(p, i as f64 * 0.05);
            min = min.min(h);
            max = max.max(h);
        }
        max - min
    }
}
