//! Interaction kernels: closed-form lateral connectivity convolved with the
//! aggregated input, plus a shift-invariant global term.
//!
//! All kinds share the same step shape: sum the input, gather the extended
//! (wrapped) vector when circular, convolve, add `amplitude_global * sum`.

use crate::convolution::{conv_same, conv_valid};
use crate::element::{Component, ComponentSet, ElementCommonParameters};
use crate::mathtools::{
    compute_kernel_range, create_extended_index, gather_extended, gauss_norm, KernelRange,
};

/// Truncation factor: taps beyond `width * CUTOFF_FACTOR` are dropped.
pub const CUTOFF_FACTOR: f64 = 5.0;

/// Shared geometry/state of every kernel-like element.
#[derive(Debug, Clone)]
pub struct KernelGeometry {
    circular: bool,
    normalized: bool,
    cutoff_factor: f64,
    kernel_range: KernelRange,
    extended_index: Vec<usize>,
    full_sum: f64,
}

impl KernelGeometry {
    pub fn new(circular: bool, normalized: bool) -> Self {
        Self {
            circular,
            normalized,
            cutoff_factor: CUTOFF_FACTOR,
            kernel_range: KernelRange::default(),
            extended_index: Vec::new(),
            full_sum: 0.0,
        }
    }

    pub fn circular(&self) -> bool {
        self.circular
    }

    pub fn normalized(&self) -> bool {
        self.normalized
    }

    pub fn kernel_range(&self) -> KernelRange {
        self.kernel_range
    }

    pub fn extended_index(&self) -> &[usize] {
        &self.extended_index
    }

    /// Total input of the last step (drives the global term).
    pub fn full_sum(&self) -> f64 {
        self.full_sum
    }

    /// Reserve the kernel buffer; filled at `init`.
    pub(crate) fn attach(&mut self, components: &mut ComponentSet) {
        components.insert(Component::Kernel, Vec::new());
    }

    /// Compute the truncation range and, if circular, the extended index.
    pub(crate) fn prepare(&mut self, field_size: usize, range_width: f64) {
        self.kernel_range =
            compute_kernel_range(range_width, self.cutoff_factor, field_size, self.circular);
        self.extended_index = if self.circular {
            create_extended_index(field_size, self.kernel_range)
        } else {
            Vec::new()
        };
    }

    /// Tap offsets spanning the support, center at 0.
    pub(crate) fn taps(&self) -> impl Iterator<Item = i64> {
        -(self.kernel_range.lower as i64)..=(self.kernel_range.upper as i64)
    }

    /// Install the kernel buffer and reset the i/o state.
    pub(crate) fn install(&mut self, components: &mut ComponentSet, kernel: Vec<f64>) {
        components.insert(Component::Kernel, kernel);
        if let Some(input) = components.get_mut(Component::Input) {
            input.fill(0.0);
        }
        if let Some(output) = components.get_mut(Component::Output) {
            output.fill(0.0);
        }
        self.full_sum = 0.0;
    }

    /// The shared step: convolve the input and fold in the global term.
    /// A convolution shorter than the output leaves the excess taps at the
    /// global term alone (the size-mismatch hazard is clamped, not UB).
    pub(crate) fn step_convolve(&mut self, components: &mut ComponentSet, amplitude_global: f64) {
        let convolution = {
            let input = components.get(Component::Input).unwrap_or(&[]);
            let kernel = components.get(Component::Kernel).unwrap_or(&[]);
            self.full_sum = input.iter().sum();
            if self.circular {
                let extended = gather_extended(&self.extended_index, input);
                conv_valid(&extended, kernel)
            } else {
                conv_same(input, kernel)
            }
        };
        let global = amplitude_global * self.full_sum;
        if let Some(output) = components.get_mut(Component::Output) {
            for (i, o) in output.iter_mut().enumerate() {
                *o = convolution.get(i).copied().unwrap_or(0.0) + global;
            }
        }
    }
}

fn scaled_gauss(taps: impl Iterator<Item = i64>, sigma: f64, normalized: bool) -> Vec<f64> {
    if normalized {
        gauss_norm(taps, 0.0, sigma)
    } else {
        crate::mathtools::gauss(taps, 0.0, sigma)
    }
}

// ---------------------------------------------------------------------------
// Gauss
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GaussKernelParameters {
    pub width: f64,
    pub amplitude: f64,
    pub amplitude_global: f64,
    pub circular: bool,
    pub normalized: bool,
}

impl Default for GaussKernelParameters {
    fn default() -> Self {
        Self {
            width: 3.0,
            amplitude: 2.0,
            amplitude_global: 0.0,
            circular: true,
            normalized: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GaussKernel {
    parameters: GaussKernelParameters,
    geometry: KernelGeometry,
}

impl GaussKernel {
    pub fn new(parameters: GaussKernelParameters) -> Self {
        let geometry = KernelGeometry::new(parameters.circular, parameters.normalized);
        Self {
            parameters,
            geometry,
        }
    }

    pub fn parameters(&self) -> &GaussKernelParameters {
        &self.parameters
    }

    /// Requires a subsequent `init()` to rebuild the kernel buffer.
    pub fn set_parameters(&mut self, parameters: GaussKernelParameters) {
        self.geometry = KernelGeometry::new(parameters.circular, parameters.normalized);
        self.parameters = parameters;
    }

    pub fn geometry(&self) -> &KernelGeometry {
        &self.geometry
    }

    pub(crate) fn geometry_mut(&mut self) -> &mut KernelGeometry {
        &mut self.geometry
    }

    pub(crate) fn init(&mut self, common: &ElementCommonParameters, components: &mut ComponentSet) {
        let p = self.parameters;
        self.geometry.prepare(common.dimensions.size, p.width);
        let kernel: Vec<f64> = scaled_gauss(self.geometry.taps(), p.width, p.normalized)
            .into_iter()
            .map(|g| p.amplitude * g)
            .collect();
        self.geometry.install(components, kernel);
    }

    pub(crate) fn step(
        &mut self,
        _common: &ElementCommonParameters,
        components: &mut ComponentSet,
        _t: f64,
        _dt: f64,
    ) {
        self.geometry
            .step_convolve(components, self.parameters.amplitude_global);
    }
}

// ---------------------------------------------------------------------------
// Mexican hat (difference of Gaussians)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MexicanHatKernelParameters {
    pub width_exc: f64,
    pub amplitude_exc: f64,
    pub width_inh: f64,
    pub amplitude_inh: f64,
    pub amplitude_global: f64,
    pub circular: bool,
    pub normalized: bool,
}

impl Default for MexicanHatKernelParameters {
    fn default() -> Self {
        Self {
            width_exc: 2.5,
            amplitude_exc: 11.0,
            width_inh: 5.0,
            amplitude_inh: 15.0,
            amplitude_global: 0.0,
            circular: true,
            normalized: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MexicanHatKernel {
    parameters: MexicanHatKernelParameters,
    geometry: KernelGeometry,
}

impl MexicanHatKernel {
    pub fn new(parameters: MexicanHatKernelParameters) -> Self {
        let geometry = KernelGeometry::new(parameters.circular, parameters.normalized);
        Self {
            parameters,
            geometry,
        }
    }

    pub fn parameters(&self) -> &MexicanHatKernelParameters {
        &self.parameters
    }

    pub fn set_parameters(&mut self, parameters: MexicanHatKernelParameters) {
        self.geometry = KernelGeometry::new(parameters.circular, parameters.normalized);
        self.parameters = parameters;
    }

    pub fn geometry(&self) -> &KernelGeometry {
        &self.geometry
    }

    pub(crate) fn geometry_mut(&mut self) -> &mut KernelGeometry {
        &mut self.geometry
    }

    pub(crate) fn init(&mut self, common: &ElementCommonParameters, components: &mut ComponentSet) {
        let p = self.parameters;
        // Support must cover the wider (inhibitory) lobe.
        self.geometry
            .prepare(common.dimensions.size, p.width_exc.max(p.width_inh));
        let exc = scaled_gauss(self.geometry.taps(), p.width_exc, p.normalized);
        let inh = scaled_gauss(self.geometry.taps(), p.width_inh, p.normalized);
        let kernel: Vec<f64> = exc
            .iter()
            .zip(inh.iter())
            .map(|(e, i)| p.amplitude_exc * e - p.amplitude_inh * i)
            .collect();
        self.geometry.install(components, kernel);
    }

    pub(crate) fn step(
        &mut self,
        _common: &ElementCommonParameters,
        components: &mut ComponentSet,
        _t: f64,
        _dt: f64,
    ) {
        self.geometry
            .step_convolve(components, self.parameters.amplitude_global);
    }
}

// ---------------------------------------------------------------------------
// Lateral interactions (exc - inh, always-on global inhibition/excitation)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LateralInteractionsParameters {
    pub width_exc: f64,
    pub amplitude_exc: f64,
    pub width_inh: f64,
    pub amplitude_inh: f64,
    pub amplitude_global: f64,
    pub circular: bool,
    pub normalized: bool,
}

impl Default for LateralInteractionsParameters {
    fn default() -> Self {
        Self {
            width_exc: 5.3,
            amplitude_exc: 26.0,
            width_inh: 7.4,
            amplitude_inh: 27.0,
            amplitude_global: -0.55,
            circular: true,
            normalized: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LateralInteractions {
    parameters: LateralInteractionsParameters,
    geometry: KernelGeometry,
}

impl LateralInteractions {
    pub fn new(parameters: LateralInteractionsParameters) -> Self {
        let geometry = KernelGeometry::new(parameters.circular, parameters.normalized);
        Self {
            parameters,
            geometry,
        }
    }

    pub fn parameters(&self) -> &LateralInteractionsParameters {
        &self.parameters
    }

    pub fn set_parameters(&mut self, parameters: LateralInteractionsParameters) {
        self.geometry = KernelGeometry::new(parameters.circular, parameters.normalized);
        self.parameters = parameters;
    }

    pub fn geometry(&self) -> &KernelGeometry {
        &self.geometry
    }

    pub(crate) fn geometry_mut(&mut self) -> &mut KernelGeometry {
        &mut self.geometry
    }

    pub(crate) fn init(&mut self, common: &ElementCommonParameters, components: &mut ComponentSet) {
        let p = self.parameters;
        self.geometry
            .prepare(common.dimensions.size, p.width_exc.max(p.width_inh));
        let exc = scaled_gauss(self.geometry.taps(), p.width_exc, p.normalized);
        let inh = scaled_gauss(self.geometry.taps(), p.width_inh, p.normalized);
        let kernel: Vec<f64> = exc
            .iter()
            .zip(inh.iter())
            .map(|(e, i)| p.amplitude_exc * e - p.amplitude_inh * i)
            .collect();
        self.geometry.install(components, kernel);
    }

    pub(crate) fn step(
        &mut self,
        _common: &ElementCommonParameters,
        components: &mut ComponentSet,
        _t: f64,
        _dt: f64,
    ) {
        self.geometry
            .step_convolve(components, self.parameters.amplitude_global);
    }
}

// ---------------------------------------------------------------------------
// Asymmetric Gauss (shifted lobe)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AsymmetricGaussKernelParameters {
    pub width: f64,
    pub amplitude: f64,
    pub amplitude_global: f64,
    /// Center offset of the lobe, in taps.
    pub shift: f64,
    pub circular: bool,
    pub normalized: bool,
}

impl Default for AsymmetricGaussKernelParameters {
    fn default() -> Self {
        Self {
            width: 3.0,
            amplitude: 2.0,
            amplitude_global: 0.0,
            shift: 2.0,
            circular: true,
            normalized: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AsymmetricGaussKernel {
    parameters: AsymmetricGaussKernelParameters,
    geometry: KernelGeometry,
}

impl AsymmetricGaussKernel {
    pub fn new(parameters: AsymmetricGaussKernelParameters) -> Self {
        let geometry = KernelGeometry::new(parameters.circular, parameters.normalized);
        Self {
            parameters,
            geometry,
        }
    }

    pub fn parameters(&self) -> &AsymmetricGaussKernelParameters {
        &self.parameters
    }

    pub fn set_parameters(&mut self, parameters: AsymmetricGaussKernelParameters) {
        self.geometry = KernelGeometry::new(parameters.circular, parameters.normalized);
        self.parameters = parameters;
    }

    pub fn geometry(&self) -> &KernelGeometry {
        &self.geometry
    }

    pub(crate) fn geometry_mut(&mut self) -> &mut KernelGeometry {
        &mut self.geometry
    }

    pub(crate) fn init(&mut self, common: &ElementCommonParameters, components: &mut ComponentSet) {
        let p = self.parameters;
        // Widen the support so the shifted lobe is not truncated on one side.
        self.geometry
            .prepare(common.dimensions.size, p.width + p.shift.abs());
        let mut kernel: Vec<f64> = self
            .geometry
            .taps()
            .map(|x| {
                let d = x as f64 - p.shift;
                (-d * d / (2.0 * p.width * p.width)).exp()
            })
            .collect();
        if p.normalized {
            let sum: f64 = kernel.iter().sum();
            if sum != 0.0 {
                for v in &mut kernel {
                    *v /= sum;
                }
            }
        }
        for v in &mut kernel {
            *v *= p.amplitude;
        }
        self.geometry.install(components, kernel);
    }

    pub(crate) fn step(
        &mut self,
        _common: &ElementCommonParameters,
        components: &mut ComponentSet,
        _t: f64,
        _dt: f64,
    ) {
        self.geometry
            .step_convolve(components, self.parameters.amplitude_global);
    }
}

// ---------------------------------------------------------------------------
// Oscillatory (damped cosine)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OscillatoryKernelParameters {
    pub amplitude: f64,
    /// Exponential envelope rate; support radius scales with `1/decay`.
    pub decay: f64,
    /// Spatial frequency of the cosine.
    pub zero_crossings: f64,
    pub amplitude_global: f64,
    pub circular: bool,
    pub normalized: bool,
}

impl Default for OscillatoryKernelParameters {
    fn default() -> Self {
        Self {
            amplitude: 1.0,
            decay: 0.08,
            zero_crossings: 0.3,
            amplitude_global: 0.0,
            circular: true,
            normalized: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OscillatoryKernel {
    parameters: OscillatoryKernelParameters,
    geometry: KernelGeometry,
}

impl OscillatoryKernel {
    pub fn new(parameters: OscillatoryKernelParameters) -> Self {
        let geometry = KernelGeometry::new(parameters.circular, parameters.normalized);
        Self {
            parameters,
            geometry,
        }
    }

    pub fn parameters(&self) -> &OscillatoryKernelParameters {
        &self.parameters
    }

    pub fn set_parameters(&mut self, parameters: OscillatoryKernelParameters) {
        self.geometry = KernelGeometry::new(parameters.circular, parameters.normalized);
        self.parameters = parameters;
    }

    pub fn geometry(&self) -> &KernelGeometry {
        &self.geometry
    }

    pub(crate) fn geometry_mut(&mut self) -> &mut KernelGeometry {
        &mut self.geometry
    }

    pub(crate) fn init(&mut self, common: &ElementCommonParameters, components: &mut ComponentSet) {
        let p = self.parameters;
        let envelope_width = if p.decay > 0.0 { 1.0 / p.decay } else { 1.0 };
        self.geometry.prepare(common.dimensions.size, envelope_width);
        let mut kernel: Vec<f64> = self
            .geometry
            .taps()
            .map(|x| {
                let x = x as f64;
                p.amplitude * (-p.decay * x.abs()).exp() * (p.zero_crossings * x).cos()
            })
            .collect();
        if p.normalized {
            let sum: f64 = kernel.iter().map(|v| v.abs()).sum();
            if sum != 0.0 {
                for v in &mut kernel {
                    *v /= sum;
                }
            }
        }
        self.geometry.install(components, kernel);
    }

    pub(crate) fn step(
        &mut self,
        _common: &ElementCommonParameters,
        components: &mut ComponentSet,
        _t: f64,
        _dt: f64,
    ) {
        self.geometry
            .step_convolve(components, self.parameters.amplitude_global);
    }
}
