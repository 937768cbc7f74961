//! Inter-field couplings: a trainable dense matrix, a sparse hand-authored
//! set of Gaussian projections, and a fixed kernel between differently-sized
//! fields.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::element::{Component, ComponentSet, ElementCommonParameters};
use crate::error::{ElementError, Result};
use crate::kernels::KernelGeometry;
use crate::mathtools::circular_gauss;
use crate::prng::Prng;

/// Weight-update law for a trainable coupling matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LearningRule {
    Hebbian,
    Oja,
    DeltaWidrowHoff,
    DeltaKroghHertz,
}

/// `w_ij += eta * input_i * output_j`
fn hebb_rule(weights: &mut [f64], cols: usize, input: &[f64], output: &[f64], eta: f64) {
    for (i, &x) in input.iter().enumerate() {
        for (j, &y) in output.iter().enumerate() {
            weights[i * cols + j] += eta * x * y;
        }
    }
}

/// Hebbian update with a decay proportional to `output_j^2 * w_ij`,
/// keeping the weights bounded.
fn oja_rule(weights: &mut [f64], cols: usize, input: &[f64], output: &[f64], eta: f64) {
    for (i, &x) in input.iter().enumerate() {
        for (j, &y) in output.iter().enumerate() {
            let w = &mut weights[i * cols + j];
            *w += eta * (x * y - y * y * *w);
        }
    }
}

/// Prediction of the coupling for `input` under the current weights.
fn predict(weights: &[f64], cols: usize, input: &[f64], predicted: &mut [f64]) {
    predicted.fill(0.0);
    for (i, &x) in input.iter().enumerate() {
        for (j, p) in predicted.iter_mut().enumerate() {
            *p += weights[i * cols + j] * x;
        }
    }
}

/// `w_ij += eta * (target_j - predicted_j) * input_i`
fn delta_widrow_hoff_rule(
    weights: &mut [f64],
    cols: usize,
    input: &[f64],
    target: &[f64],
    eta: f64,
) {
    let mut predicted = vec![0.0; cols];
    predict(weights, cols, input, &mut predicted);
    for (i, &x) in input.iter().enumerate() {
        for (j, &t) in target.iter().enumerate() {
            weights[i * cols + j] += eta * (t - predicted[j]) * x;
        }
    }
}

/// Widrow-Hoff with a sigmoid-gradient factor `y * (1 - y)` on the prediction.
fn delta_krogh_hertz_rule(
    weights: &mut [f64],
    cols: usize,
    input: &[f64],
    target: &[f64],
    eta: f64,
) {
    let mut predicted = vec![0.0; cols];
    predict(weights, cols, input, &mut predicted);
    for (i, &x) in input.iter().enumerate() {
        for (j, &t) in target.iter().enumerate() {
            let y = predicted[j];
            weights[i * cols + j] += eta * (t - y) * y * (1.0 - y) * x;
        }
    }
}

// ---------------------------------------------------------------------------
// FieldCoupling: dense trainable matrix
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldCouplingParameters {
    pub input_field_size: usize,
    pub scalar: f64,
    pub learning_rate: f64,
    pub learning_rule: LearningRule,
}

impl Default for FieldCouplingParameters {
    fn default() -> Self {
        Self {
            input_field_size: 0,
            scalar: 1.0,
            learning_rate: 0.01,
            learning_rule: LearningRule::Hebbian,
        }
    }
}

/// Dense coupling `output_j = scalar * max(0, sum_i w_ij * max(0, input_i))`
/// with weights learned online and persisted as a plain-text matrix.
#[derive(Debug, Clone)]
pub struct FieldCoupling {
    parameters: FieldCouplingParameters,
    rows: usize,
    cols: usize,
    trained: bool,
    weights_directory: PathBuf,
    weights_file: PathBuf,
}

impl FieldCoupling {
    pub fn new(parameters: FieldCouplingParameters) -> Self {
        Self {
            parameters,
            rows: 0,
            cols: 0,
            trained: false,
            weights_directory: PathBuf::from("inter-field-synaptic-connections"),
            weights_file: PathBuf::new(),
        }
    }

    pub fn parameters(&self) -> &FieldCouplingParameters {
        &self.parameters
    }

    pub fn set_parameters(&mut self, parameters: FieldCouplingParameters) {
        self.parameters = parameters;
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) {
        self.parameters.learning_rate = learning_rate;
    }

    /// Whether the current weights were loaded or learned rather than
    /// randomly seeded.
    pub fn trained(&self) -> bool {
        self.trained
    }

    pub fn weights_file(&self) -> &Path {
        &self.weights_file
    }

    pub(crate) fn set_weights_directory(&mut self, directory: impl Into<PathBuf>, name: &str) {
        self.weights_directory = directory.into();
        self.weights_file = self.weights_directory.join(format!("{}_weights.txt", name));
    }

    pub(crate) fn attach(
        &mut self,
        common: &ElementCommonParameters,
        components: &mut ComponentSet,
    ) -> Result<()> {
        if self.parameters.input_field_size == 0 {
            return Err(ElementError::InvalidSize {
                element: common.identifiers.unique_name.clone(),
                size: self.parameters.input_field_size,
            });
        }
        self.rows = self.parameters.input_field_size;
        self.cols = common.dimensions.size;
        components.insert(Component::Input, vec![0.0; self.rows]);

        // Untrained couplings start from uniform random weights in [-1, 1];
        // seeding off the unique id keeps runs reproducible.
        let mut rng = Prng::new(common.identifiers.unique_id as u64);
        let weights: Vec<f64> = (0..self.rows * self.cols)
            .map(|_| rng.gen_range_f64(-1.0, 1.0))
            .collect();
        components.insert(Component::Weights, weights);
        self.trained = false;

        self.weights_file = self
            .weights_directory
            .join(format!("{}_weights.txt", common.identifiers.unique_name));
        Ok(())
    }

    pub(crate) fn init(&mut self, common: &ElementCommonParameters, components: &mut ComponentSet) {
        if let Some(input) = components.get_mut(Component::Input) {
            input.fill(0.0);
        }
        if let Some(output) = components.get_mut(Component::Output) {
            output.fill(0.0);
        }
        if self.read_weights(components) {
            self.trained = true;
        } else {
            // Fall back to a blank matrix and persist it so the next run
            // starts from the same state.
            if let Some(weights) = components.get_mut(Component::Weights) {
                weights.fill(0.0);
            }
            self.trained = false;
            self.write_weights(components, &common.identifiers.unique_name);
        }
    }

    pub(crate) fn step(
        &mut self,
        _common: &ElementCommonParameters,
        components: &mut ComponentSet,
        _t: f64,
        _dt: f64,
    ) {
        // Only positive input activity is projected.
        if let Some(input) = components.get_mut(Component::Input) {
            for v in input.iter_mut() {
                if *v < 0.0 {
                    *v = 0.0;
                }
            }
        }

        let cols = self.cols;
        let scalar = self.parameters.scalar;
        let mut projected = vec![0.0; cols];
        {
            let input = components.get(Component::Input).unwrap_or(&[]);
            let weights = components.get(Component::Weights).unwrap_or(&[]);
            for (i, &x) in input.iter().enumerate() {
                for (j, p) in projected.iter_mut().enumerate() {
                    *p += weights[i * cols + j] * x;
                }
            }
        }
        if let Some(output) = components.get_mut(Component::Output) {
            for (o, &p) in output.iter_mut().zip(projected.iter()) {
                *o = if p < 0.0 { 0.0 } else { p * scalar };
            }
        }
    }

    pub(crate) fn close(&mut self) {
        self.trained = false;
    }

    /// Apply exactly one learning-rule update. For the delta rules `activity`
    /// is the target pattern and the prediction is recomputed from the
    /// current weights.
    pub(crate) fn update_weights(
        &mut self,
        components: &mut ComponentSet,
        input: &[f64],
        activity: &[f64],
    ) {
        let cols = self.cols;
        let eta = self.parameters.learning_rate;
        let Some(weights) = components.get_mut(Component::Weights) else {
            return;
        };
        match self.parameters.learning_rule {
            LearningRule::Hebbian => hebb_rule(weights, cols, input, activity, eta),
            LearningRule::Oja => oja_rule(weights, cols, input, activity, eta),
            LearningRule::DeltaWidrowHoff => {
                delta_widrow_hoff_rule(weights, cols, input, activity, eta)
            }
            LearningRule::DeltaKroghHertz => {
                delta_krogh_hertz_rule(weights, cols, input, activity, eta)
            }
        }
        self.trained = true;
    }

    /// Load the weight matrix from the coupling's text file.
    /// Keeps the existing matrix and returns `false` when the file is
    /// missing, malformed, or of the wrong dimensions.
    pub(crate) fn read_weights(&mut self, components: &mut ComponentSet) -> bool {
        let text = match fs::read_to_string(&self.weights_file) {
            Ok(text) => text,
            Err(err) => {
                warn!(
                    file = %self.weights_file.display(),
                    %err,
                    "failed to read coupling weights"
                );
                return false;
            }
        };

        let mut parsed: Vec<f64> = Vec::with_capacity(self.rows * self.cols);
        let mut row_count = 0usize;
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            row_count += 1;
            for token in line.split_whitespace() {
                match token.parse::<f64>() {
                    Ok(v) => parsed.push(v),
                    Err(_) => {
                        warn!(
                            file = %self.weights_file.display(),
                            token,
                            "malformed value in weight file"
                        );
                        return false;
                    }
                }
            }
        }

        if row_count != self.rows || parsed.len() != self.rows * self.cols {
            warn!(
                file = %self.weights_file.display(),
                expected_rows = self.rows,
                expected_cols = self.cols,
                read_rows = row_count,
                read_values = parsed.len(),
                "weight matrix in file has a different dimensionality"
            );
            return false;
        }

        if let Some(weights) = components.get_mut(Component::Weights) {
            weights.copy_from_slice(&parsed);
        }
        info!(file = %self.weights_file.display(), "coupling weights read");
        true
    }

    /// Persist the weight matrix as whitespace-separated rows.
    pub(crate) fn write_weights(&self, components: &ComponentSet, name: &str) -> bool {
        let Some(weights) = components.get(Component::Weights) else {
            return false;
        };
        if let Some(parent) = self.weights_file.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(err) = fs::create_dir_all(parent) {
                    warn!(coupling = name, %err, "could not create weights directory");
                    return false;
                }
            }
        }
        let mut text = String::new();
        for row in weights.chunks(self.cols) {
            let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            text.push_str(&line.join(" "));
            text.push('\n');
        }
        match fs::write(&self.weights_file, text) {
            Ok(()) => {
                info!(
                    coupling = name,
                    file = %self.weights_file.display(),
                    "coupling weights saved"
                );
                true
            }
            Err(err) => {
                warn!(coupling = name, %err, "failed to save coupling weights");
                false
            }
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }
}

// ---------------------------------------------------------------------------
// GaussFieldCoupling: sparse hand-authored projections
// ---------------------------------------------------------------------------

/// One projection: activity at source position `x_i` injects a Gaussian of
/// the given width and amplitude centered at target position `x_j`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeightedCoupling {
    pub x_i: f64,
    pub x_j: f64,
    pub amplitude: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GaussFieldCouplingParameters {
    pub input_field_size: usize,
    pub couplings: Vec<WeightedCoupling>,
}

#[derive(Debug, Clone)]
pub struct GaussFieldCoupling {
    parameters: GaussFieldCouplingParameters,
}

impl GaussFieldCoupling {
    pub fn new(parameters: GaussFieldCouplingParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &GaussFieldCouplingParameters {
        &self.parameters
    }

    /// Appends a projection. Consumers reading derived state should `init()`
    /// again; the step itself always reads the current set.
    pub fn add_coupling(&mut self, coupling: WeightedCoupling) {
        self.parameters.couplings.push(coupling);
    }

    pub(crate) fn attach(
        &mut self,
        common: &ElementCommonParameters,
        components: &mut ComponentSet,
    ) -> Result<()> {
        if self.parameters.input_field_size == 0 {
            return Err(ElementError::InvalidSize {
                element: common.identifiers.unique_name.clone(),
                size: self.parameters.input_field_size,
            });
        }
        components.insert(
            Component::Input,
            vec![0.0; self.parameters.input_field_size],
        );
        Ok(())
    }

    pub(crate) fn init(&mut self, _common: &ElementCommonParameters, components: &mut ComponentSet) {
        if let Some(input) = components.get_mut(Component::Input) {
            input.fill(0.0);
        }
        if let Some(output) = components.get_mut(Component::Output) {
            output.fill(0.0);
        }
    }

    pub(crate) fn step(
        &mut self,
        common: &ElementCommonParameters,
        components: &mut ComponentSet,
        _t: f64,
        _dt: f64,
    ) {
        let size = common.dimensions.size;
        let mut summed = vec![0.0; size];
        {
            let input = components.get(Component::Input).unwrap_or(&[]);
            for c in &self.parameters.couplings {
                let source = c.x_i.round() as usize;
                let activity = input.get(source).copied().unwrap_or(0.0);
                if activity > 0.0 {
                    let bump = circular_gauss(size, c.width, c.x_j);
                    for (s, g) in summed.iter_mut().zip(bump.iter()) {
                        *s += c.amplitude * activity * g;
                    }
                }
            }
        }
        if let Some(output) = components.get_mut(Component::Output) {
            output.copy_from_slice(&summed);
        }
    }
}

// ---------------------------------------------------------------------------
// KernelCoupling: fixed kernel between differently-sized fields
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KernelCouplingParameters {
    /// Source field size; defaults to the element's own size.
    pub input_size: Option<usize>,
    /// Target field size; defaults to the element's own size.
    pub output_size: Option<usize>,
    pub width: f64,
    pub amplitude: f64,
    pub amplitude_global: f64,
    pub circular: bool,
    pub normalized: bool,
}

impl Default for KernelCouplingParameters {
    fn default() -> Self {
        Self {
            input_size: None,
            output_size: None,
            width: 3.0,
            amplitude: 1.0,
            amplitude_global: 0.0,
            circular: true,
            normalized: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct KernelCoupling {
    parameters: KernelCouplingParameters,
    geometry: KernelGeometry,
    input_dimension: usize,
    output_dimension: usize,
}

impl KernelCoupling {
    pub fn new(parameters: KernelCouplingParameters) -> Self {
        let geometry = KernelGeometry::new(parameters.circular, parameters.normalized);
        Self {
            parameters,
            geometry,
            input_dimension: 0,
            output_dimension: 0,
        }
    }

    pub fn parameters(&self) -> &KernelCouplingParameters {
        &self.parameters
    }

    pub fn geometry(&self) -> &KernelGeometry {
        &self.geometry
    }

    pub fn input_dimension(&self) -> usize {
        self.input_dimension
    }

    pub fn output_dimension(&self) -> usize {
        self.output_dimension
    }

    pub(crate) fn attach(
        &mut self,
        common: &ElementCommonParameters,
        components: &mut ComponentSet,
    ) -> Result<()> {
        self.input_dimension = self
            .parameters
            .input_size
            .unwrap_or(common.dimensions.size);
        self.output_dimension = self
            .parameters
            .output_size
            .unwrap_or(common.dimensions.size);
        if self.input_dimension == 0 || self.output_dimension == 0 {
            return Err(ElementError::InvalidSize {
                element: common.identifiers.unique_name.clone(),
                size: self.input_dimension.min(self.output_dimension),
            });
        }
        components.insert(Component::Input, vec![0.0; self.input_dimension]);
        components.insert(Component::Output, vec![0.0; self.output_dimension]);
        self.geometry.attach(components);
        Ok(())
    }

    pub(crate) fn init(&mut self, _common: &ElementCommonParameters, components: &mut ComponentSet) {
        let p = self.parameters;
        self.geometry.prepare(self.input_dimension, p.width);
        let kernel: Vec<f64> = if p.normalized {
            crate::mathtools::gauss_norm(self.geometry.taps(), 0.0, p.width)
        } else {
            crate::mathtools::gauss(self.geometry.taps(), 0.0, p.width)
        }
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
