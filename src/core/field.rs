//! Neural field integration: a leaky integrator over a spatial buffer.

use crate::element::{Component, ComponentSet, ElementCommonParameters};
use crate::error::Result;
use crate::mathtools::{heaviside, sigmoid};

/// Pointwise output nonlinearity applied to the activation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActivationFunction {
    Sigmoid { x_shift: f64, steepness: f64 },
    Heaviside { threshold: f64 },
}

impl ActivationFunction {
    #[inline]
    pub fn apply(&self, x: f64) -> f64 {
        match *self {
            ActivationFunction::Sigmoid { x_shift, steepness } => sigmoid(x, steepness, x_shift),
            ActivationFunction::Heaviside { threshold } => heaviside(x, threshold),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NeuralFieldParameters {
    /// Time constant of the leaky integrator.
    pub tau: f64,
    /// Decay target absent any input.
    pub resting_level: f64,
    pub activation_function: ActivationFunction,
}

impl Default for NeuralFieldParameters {
    fn default() -> Self {
        Self {
            tau: 25.0,
            resting_level: -5.0,
            activation_function: ActivationFunction::Sigmoid {
                x_shift: 0.0,
                steepness: 4.0,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct NeuralField {
    parameters: NeuralFieldParameters,
}

impl NeuralField {
    pub fn new(parameters: NeuralFieldParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &NeuralFieldParameters {
        &self.parameters
    }

    /// Takes effect on the next `step`, not retroactively.
    pub fn set_parameters(&mut self, parameters: NeuralFieldParameters) {
        self.parameters = parameters;
    }

    pub(crate) fn attach(
        &mut self,
        common: &ElementCommonParameters,
        components: &mut ComponentSet,
    ) -> Result<()> {
        components.insert(Component::Activation, vec![0.0; common.dimensions.size]);
        Ok(())
    }

    pub(crate) fn init(&mut self, _common: &ElementCommonParameters, components: &mut ComponentSet) {
        let resting = self.parameters.resting_level;
        if let Some(input) = components.get_mut(Component::Input) {
            input.fill(0.0);
        }
        if let Some(output) = components.get_mut(Component::Output) {
            output.fill(0.0);
        }
        if let Some(activation) = components.get_mut(Component::Activation) {
            activation.fill(resting);
        }
    }

    pub(crate) fn step(
        &mut self,
        _common: &ElementCommonParameters,
        components: &mut ComponentSet,
        _t: f64,
        dt: f64,
    ) {
        let NeuralFieldParameters {
            tau,
            resting_level,
            activation_function,
        } = self.parameters;
        let rate = dt / tau;

        // Explicit forward-Euler: u += dt/tau * (-u + h + s).
        if let (Some(input), Some(activation)) =
            components.two_mut(Component::Input, Component::Activation)
        {
            for (u, s) in activation.iter_mut().zip(input.iter()) {
                *u += rate * (-*u + resting_level + s);
            }
        }
        if let (Some(activation), Some(output)) =
            components.two_mut(Component::Activation, Component::Output)
        {
            for (o, u) in output.iter_mut().zip(activation.iter()) {
                *o = activation_function.apply(*u);
            }
        }
    }

    /// Centroid of the supra-threshold output bump, circular-aware.
    /// `None` when no position is active.
    pub fn centroid(&self, components: &ComponentSet) -> Option<f64> {
        let output = components.get(Component::Output)?;
        let n = output.len();
        if n == 0 {
            return None;
        }
        let total: f64 = output.iter().filter(|v| **v > 0.0).sum();
        if total <= 0.0 {
            return None;
        }
        // Mean direction on the circle avoids splitting a wrap-straddling bump.
        let (mut sin_sum, mut cos_sum) = (0.0, 0.0);
        for (i, &v) in output.iter().enumerate() {
            if v > 0.0 {
                let angle = core::f64::consts::TAU * i as f64 / n as f64;
                sin_sum += v * angle.sin();
                cos_sum += v * angle.cos();
            }
        }
        let mean_angle = sin_sum.atan2(cos_sum).rem_euclid(core::f64::consts::TAU);
        Some(mean_angle * n as f64 / core::f64::consts::TAU)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, ElementDimensions, ElementKind, ElementLabel};

    fn make_field(size: usize, parameters: NeuralFieldParameters) -> Element {
        let common = crate::element::ElementCommonParameters::new(
            "test field",
            ElementLabel::NeuralField,
            ElementDimensions::with_size(size),
        );
        Element::new(common, ElementKind::NeuralField(NeuralField::new(parameters))).unwrap()
    }

    fn heaviside_params() -> NeuralFieldParameters {
        NeuralFieldParameters {
            tau: 25.0,
            resting_level: -10.0,
            activation_function: ActivationFunction::Heaviside { threshold: 0.0 },
        }
    }

    #[test]
    fn init_seeds_activation_to_resting_level() {
        let mut field = make_field(8, heaviside_params());
        field.init();
        let activation = field.component(Component::Activation).unwrap();
        assert!(activation.iter().all(|&u| u == -10.0));
        let output = field.component(Component::Output).unwrap();
        assert!(output.iter().all(|&o| o == 0.0));
    }

    #[test]
    fn zero_input_stays_below_threshold() {
        let mut field = make_field(8, heaviside_params());
        field.init();
        for _ in 0..500 {
            field.step(0.0, 1.0);
        }
        let activation = field.component(Component::Activation).unwrap();
        assert!(activation.iter().all(|&u| u < 0.0), "activation rose without input");
        let output = field.component(Component::Output).unwrap();
        assert!(output.iter().all(|&o| o == 0.0));
    }

    #[test]
    fn sustained_input_crosses_threshold() {
        let mut field = make_field(8, heaviside_params());
        field.init();
        let mut crossed_at = None;
        for tick in 0..500 {
            field
                .components_mut()
                .get_mut(Component::Input)
                .unwrap()
                .fill(20.0);
            field.step(tick as f64, 1.0);
            let output = field.component(Component::Output).unwrap();
            if output.iter().all(|&o| o == 1.0) {
                crossed_at = Some(tick);
                break;
            }
        }
        let tick = crossed_at.expect("activation never crossed the threshold");
        assert!(tick > 0, "crossing cannot happen on the very first tick from -10");
    }

    #[test]
    fn activation_converges_to_resting_plus_input() {
        let mut field = make_field(4, NeuralFieldParameters {
            tau: 10.0,
            resting_level: -5.0,
            activation_function: ActivationFunction::Sigmoid { x_shift: 0.0, steepness: 1.0 },
        });
        field.init();
        for _ in 0..2000 {
            field
                .components_mut()
                .get_mut(Component::Input)
                .unwrap()
                .fill(8.0);
            field.step(0.0, 0.5);
        }
        let activation = field.component(Component::Activation).unwrap();
        for &u in activation {
            assert!((u - 3.0).abs() < 1e-6, "fixed point should be h + s = 3, got {}", u);
        }
    }

    #[test]
    fn centroid_of_symmetric_bump() {
        let mut field = make_field(11, heaviside_params());
        field.init();
        let output = field.components_mut().get_mut(Component::Output).unwrap();
        output[4] = 0.5;
        output[5] = 1.0;
        output[6] = 0.5;
        let ElementKind::NeuralField(nf) = field.kind() else {
            unreachable!()
        };
        let c = nf.centroid(field.components()).unwrap();
        assert!((c - 5.0).abs() < 1e-9, "centroid was {}", c);
    }

    #[test]
    fn centroid_handles_wraparound_bump() {
        let mut field = make_field(10, heaviside_params());
        field.init();
        let output = field.components_mut().get_mut(Component::Output).unwrap();
        output[9] = 1.0;
        output[0] = 1.0;
        let ElementKind::NeuralField(nf) = field.kind() else {
            unreachable!()
        };
        let c = nf.centroid(field.components()).unwrap();
        let wrapped = c.min(10.0 - c);
        assert!(wrapped < 1.0, "wrap bump centroid should sit near 0/10, got {}", c);
    }

    #[test]
    fn centroid_none_without_activity() {
        let mut field = make_field(10, heaviside_params());
        field.init();
        let ElementKind::NeuralField(nf) = field.kind() else {
            unreachable!()
        };
        assert_eq!(nf.centroid(field.components()), None);
    }
}
