//! External drive elements: a Gaussian bump and white noise.

use crate::element::{Component, ComponentSet, ElementCommonParameters};
use crate::mathtools::{circular_gauss, gauss};
use crate::prng::Prng;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GaussStimulusParameters {
    pub width: f64,
    pub amplitude: f64,
    pub position: f64,
    pub circular: bool,
    pub normalized: bool,
}

impl Default for GaussStimulusParameters {
    fn default() -> Self {
        Self {
            width: 5.0,
            amplitude: 15.0,
            position: 0.0,
            circular: true,
            normalized: false,
        }
    }
}

/// A stationary Gaussian bump injected into downstream fields.
#[derive(Debug, Clone)]
pub struct GaussStimulus {
    parameters: GaussStimulusParameters,
    bump: Vec<f64>,
}

impl GaussStimulus {
    pub fn new(parameters: GaussStimulusParameters) -> Self {
        Self {
            parameters,
            bump: Vec::new(),
        }
    }

    pub fn parameters(&self) -> &GaussStimulusParameters {
        &self.parameters
    }

    /// Requires a subsequent `init()` to rebuild the bump.
    pub fn set_parameters(&mut self, parameters: GaussStimulusParameters) {
        self.parameters = parameters;
    }

    pub(crate) fn init(&mut self, common: &ElementCommonParameters, components: &mut ComponentSet) {
        let size = common.dimensions.size;
        let p = self.parameters;

        let mut bump = if p.circular {
            circular_gauss(size, p.width, p.position)
        } else {
            gauss(0..size as i64, p.position, p.width)
        };
        if p.normalized {
            let sum: f64 = bump.iter().sum();
            if sum != 0.0 {
                for v in &mut bump {
                    *v /= sum;
                }
            }
        }
        for v in &mut bump {
            *v *= p.amplitude;
        }

        if let Some(output) = components.get_mut(Component::Output) {
            output.copy_from_slice(&bump);
        }
        if let Some(input) = components.get_mut(Component::Input) {
            input.fill(0.0);
        }
        self.bump = bump;
    }

    pub(crate) fn step(
        &mut self,
        _common: &ElementCommonParameters,
        components: &mut ComponentSet,
        _t: f64,
        _dt: f64,
    ) {
        if let (Some(input), Some(output)) = components.two_mut(Component::Input, Component::Output)
        {
            for ((o, b), s) in output.iter_mut().zip(self.bump.iter()).zip(input.iter()) {
                *o = b + s;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalNoiseParameters {
    pub amplitude: f64,
}

impl Default for NormalNoiseParameters {
    fn default() -> Self {
        Self { amplitude: 0.2 }
    }
}

/// Per-position white noise, scaled by `amplitude / sqrt(dt)` so the injected
/// variance per unit time stays independent of the step size.
#[derive(Debug, Clone)]
pub struct NormalNoise {
    parameters: NormalNoiseParameters,
    rng: Prng,
}

impl NormalNoise {
    pub fn new(parameters: NormalNoiseParameters) -> Self {
        Self::with_seed(parameters, 1)
    }

    pub fn with_seed(parameters: NormalNoiseParameters, seed: u64) -> Self {
        Self {
            parameters,
            rng: Prng::new(seed),
        }
    }

    pub fn parameters(&self) -> &NormalNoiseParameters {
        &self.parameters
    }

    pub fn set_parameters(&mut self, parameters: NormalNoiseParameters) {
        self.parameters = parameters;
    }

    pub(crate) fn init(&mut self, _common: &ElementCommonParameters, components: &mut ComponentSet) {
        components.zero_all();
    }

    pub(crate) fn step(
        &mut self,
        _common: &ElementCommonParameters,
        components: &mut ComponentSet,
        _t: f64,
        dt: f64,
    ) {
        let scale = if dt > 0.0 {
            self.parameters.amplitude / dt.sqrt()
        } else {
            self.parameters.amplitude
        };
        if let Some(output) = components.get_mut(Component::Output) {
            for o in output.iter_mut() {
                *o = scale * self.rng.next_normal();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{
        Element, ElementCommonParameters, ElementDimensions, ElementKind, ElementLabel,
    };

    fn make_stimulus(size: usize, parameters: GaussStimulusParameters) -> Element {
        let common = ElementCommonParameters::new(
            "stimulus",
            ElementLabel::GaussStimulus,
            ElementDimensions::with_size(size),
        );
        Element::new(common, ElementKind::GaussStimulus(GaussStimulus::new(parameters))).unwrap()
    }

    #[test]
    fn bump_peaks_at_position_with_amplitude() {
        let mut stim = make_stimulus(
            50,
            GaussStimulusParameters {
                width: 3.0,
                amplitude: 8.0,
                position: 20.0,
                circular: true,
                normalized: false,
            },
        );
        stim.init();
        let output = stim.component(Component::Output).unwrap();
        assert!((output[20] - 8.0).abs() < 1e-12);
        assert!(output[20] > output[15]);
        assert!(output[20] > output[25]);
    }

    #[test]
    fn normalized_bump_sums_to_amplitude() {
        let mut stim = make_stimulus(
            40,
            GaussStimulusParameters {
                width: 2.0,
                amplitude: 6.0,
                position: 10.0,
                circular: true,
                normalized: true,
            },
        );
        stim.init();
        let sum: f64 = stim.component(Component::Output).unwrap().iter().sum();
        assert!((sum - 6.0).abs() < 1e-9, "sum was {}", sum);
    }

    #[test]
    fn step_keeps_emitting_the_bump() {
        let mut stim = make_stimulus(30, GaussStimulusParameters::default());
        stim.init();
        let baked = stim.component(Component::Output).unwrap().to_vec();
        stim.step(0.0, 1.0);
        stim.step(1.0, 1.0);
        assert_eq!(stim.component(Component::Output).unwrap(), &baked[..]);
    }

    #[test]
    fn noise_is_reproducible_per_seed() {
        let params = NormalNoiseParameters { amplitude: 1.5 };
        let common = ElementCommonParameters::new(
            "noise",
            ElementLabel::NormalNoise,
            ElementDimensions::with_size(16),
        );
        let mut a = Element::new(
            common.clone(),
            ElementKind::NormalNoise(NormalNoise::with_seed(params, 99)),
        )
        .unwrap();
        let common_b = ElementCommonParameters::new(
            "noise b",
            ElementLabel::NormalNoise,
            ElementDimensions::with_size(16),
        );
        let mut b = Element::new(
            common_b,
            ElementKind::NormalNoise(NormalNoise::with_seed(params, 99)),
        )
        .unwrap();
        a.init();
        b.init();
        a.step(0.0, 1.0);
        b.step(0.0, 1.0);
        assert_eq!(
            a.component(Component::Output).unwrap(),
            b.component(Component::Output).unwrap()
        );
        assert!(a
            .component(Component::Output)
            .unwrap()
            .iter()
            .any(|&v| v != 0.0));
    }
}
