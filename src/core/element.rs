//! The graph node abstraction: identity, component buffers, input edges.
//!
//! Elements live in the simulation's arena and refer to each other through
//! generation-checked handles, so removing an element invalidates every edge
//! pointing at it without reference counting. Component buffers are indexed
//! by a small enum; string lookup happens only at the accessor boundary used
//! by external visualization/persistence layers.

use core::fmt;
use core::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::couplings::{FieldCoupling, GaussFieldCoupling, KernelCoupling};
use crate::error::{ElementError, Result};
use crate::field::NeuralField;
use crate::kernels::{
    AsymmetricGaussKernel, GaussKernel, LateralInteractions, MexicanHatKernel, OscillatoryKernel,
};
use crate::stimulus::{GaussStimulus, NormalNoise};

/// Concrete element kinds known to the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementLabel {
    NeuralField,
    GaussStimulus,
    NormalNoise,
    GaussKernel,
    MexicanHatKernel,
    LateralInteractions,
    AsymmetricGaussKernel,
    OscillatoryKernel,
    FieldCoupling,
    GaussFieldCoupling,
    KernelCoupling,
}

impl ElementLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementLabel::NeuralField => "neural field",
            ElementLabel::GaussStimulus => "gauss stimulus",
            ElementLabel::NormalNoise => "normal noise",
            ElementLabel::GaussKernel => "gauss kernel",
            ElementLabel::MexicanHatKernel => "mexican hat kernel",
            ElementLabel::LateralInteractions => "lateral interactions",
            ElementLabel::AsymmetricGaussKernel => "asymmetric gauss kernel",
            ElementLabel::OscillatoryKernel => "oscillatory kernel",
            ElementLabel::FieldCoupling => "field coupling",
            ElementLabel::GaussFieldCoupling => "gauss field coupling",
            ElementLabel::KernelCoupling => "kernel coupling",
        }
    }
}

impl fmt::Display for ElementLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static NEXT_UNIQUE_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of an element; the integer id is process-wide unique.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementIdentifiers {
    pub unique_name: String,
    pub unique_id: u32,
    pub label: ElementLabel,
}

impl ElementIdentifiers {
    pub fn new(unique_name: impl Into<String>, label: ElementLabel) -> Self {
        Self {
            unique_name: unique_name.into(),
            unique_id: NEXT_UNIQUE_ID.fetch_add(1, Ordering::Relaxed),
            label,
        }
    }
}

/// Spatial descriptor of an element's buffers.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementDimensions {
    pub x_max: f64,
    pub d_x: f64,
    pub size: usize,
}

impl ElementDimensions {
    /// Unit spacing over `size` samples.
    pub fn with_size(size: usize) -> Self {
        Self {
            x_max: size as f64,
            d_x: 1.0,
            size,
        }
    }

    /// Sampled domain `[0, x_max]` with spacing `d_x`.
    pub fn with_extent(x_max: f64, d_x: f64) -> Self {
        let size = if d_x > 0.0 {
            (x_max / d_x).round() as usize
        } else {
            0
        };
        Self { x_max, d_x, size }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementCommonParameters {
    pub identifiers: ElementIdentifiers,
    pub dimensions: ElementDimensions,
}

impl ElementCommonParameters {
    pub fn new(
        unique_name: impl Into<String>,
        label: ElementLabel,
        dimensions: ElementDimensions,
    ) -> Self {
        Self {
            identifiers: ElementIdentifiers::new(unique_name, label),
            dimensions,
        }
    }
}

/// Named buffers an element can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Component {
    Input,
    Output,
    Activation,
    Kernel,
    Weights,
}

impl Component {
    const ALL: [Component; 5] = [
        Component::Input,
        Component::Output,
        Component::Activation,
        Component::Kernel,
        Component::Weights,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Input => "input",
            Component::Output => "output",
            Component::Activation => "activation",
            Component::Kernel => "kernel",
            Component::Weights => "weights",
        }
    }

    fn slot(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Component {
    type Err = ();

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s {
            "input" => Ok(Component::Input),
            "output" => Ok(Component::Output),
            "activation" => Ok(Component::Activation),
            "kernel" => Ok(Component::Kernel),
            "weights" => Ok(Component::Weights),
            _ => Err(()),
        }
    }
}

/// Fixed set of buffers; only the components a kind uses are present.
#[derive(Debug, Clone, Default)]
pub struct ComponentSet {
    buffers: [Option<Vec<f64>>; 5],
}

impl ComponentSet {
    /// Input and output buffers of the given length; nothing else.
    pub fn with_io(size: usize) -> Self {
        let mut set = Self::default();
        set.insert(Component::Input, vec![0.0; size]);
        set.insert(Component::Output, vec![0.0; size]);
        set
    }

    pub fn insert(&mut self, component: Component, values: Vec<f64>) {
        self.buffers[component.slot()] = Some(values);
    }

    pub fn get(&self, component: Component) -> Option<&[f64]> {
        self.buffers[component.slot()].as_deref()
    }

    pub fn get_mut(&mut self, component: Component) -> Option<&mut Vec<f64>> {
        self.buffers[component.slot()].as_mut()
    }

    /// Components present on this element, in declaration order.
    pub fn list(&self) -> Vec<Component> {
        Component::ALL
            .iter()
            .copied()
            .filter(|c| self.buffers[c.slot()].is_some())
            .collect()
    }

    /// Mutable access to two distinct components at once.
    pub fn two_mut(
        &mut self,
        a: Component,
        b: Component,
    ) -> (Option<&mut Vec<f64>>, Option<&mut Vec<f64>>) {
        debug_assert_ne!(a, b);
        let (ai, bi) = (a.slot(), b.slot());
        if ai < bi {
            let (left, right) = self.buffers.split_at_mut(bi);
            (left[ai].as_mut(), right[0].as_mut())
        } else {
            let (left, right) = self.buffers.split_at_mut(ai);
            (right[0].as_mut(), left[bi].as_mut())
        }
    }

    pub fn zero_all(&mut self) {
        for buffer in self.buffers.iter_mut().flatten() {
            buffer.fill(0.0);
        }
    }
}

/// Stable reference into the simulation's element arena.
///
/// The generation distinguishes a live slot from a reused one, so an edge
/// into a removed element simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// A directed edge: read `component` of `source`, accumulate into `input`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEdge {
    pub source: ElementHandle,
    pub component: Component,
}

/// Kind-specific behavior and state, dispatched as a closed sum.
#[derive(Debug, Clone)]
pub enum ElementKind {
    NeuralField(NeuralField),
    GaussStimulus(GaussStimulus),
    NormalNoise(NormalNoise),
    GaussKernel(GaussKernel),
    MexicanHatKernel(MexicanHatKernel),
    LateralInteractions(LateralInteractions),
    AsymmetricGaussKernel(AsymmetricGaussKernel),
    OscillatoryKernel(OscillatoryKernel),
    FieldCoupling(FieldCoupling),
    GaussFieldCoupling(GaussFieldCoupling),
    KernelCoupling(KernelCoupling),
}

impl ElementKind {
    pub fn label(&self) -> ElementLabel {
        match self {
            ElementKind::NeuralField(_) => ElementLabel::NeuralField,
            ElementKind::GaussStimulus(_) => ElementLabel::GaussStimulus,
            ElementKind::NormalNoise(_) => ElementLabel::NormalNoise,
            ElementKind::GaussKernel(_) => ElementLabel::GaussKernel,
            ElementKind::MexicanHatKernel(_) => ElementLabel::MexicanHatKernel,
            ElementKind::LateralInteractions(_) => ElementLabel::LateralInteractions,
            ElementKind::AsymmetricGaussKernel(_) => ElementLabel::AsymmetricGaussKernel,
            ElementKind::OscillatoryKernel(_) => ElementLabel::OscillatoryKernel,
            ElementKind::FieldCoupling(_) => ElementLabel::FieldCoupling,
            ElementKind::GaussFieldCoupling(_) => ElementLabel::GaussFieldCoupling,
            ElementKind::KernelCoupling(_) => ElementLabel::KernelCoupling,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    common: ElementCommonParameters,
    components: ComponentSet,
    kind: ElementKind,
    inputs: Vec<InputEdge>,
    // Mirrored back-references: who reads which of our components.
    outputs: Vec<InputEdge>,
}

impl Element {
    /// Validates the common parameters and runs kind-specific buffer setup.
    pub fn new(common: ElementCommonParameters, mut kind: ElementKind) -> Result<Self> {
        if common.dimensions.size == 0 {
            return Err(ElementError::InvalidSize {
                element: common.identifiers.unique_name.clone(),
                size: common.dimensions.size,
            });
        }
        if common.dimensions.d_x <= 0.0 {
            return Err(ElementError::InvalidSpacing {
                element: common.identifiers.unique_name.clone(),
                d_x: common.dimensions.d_x,
            });
        }

        let mut components = ComponentSet::with_io(common.dimensions.size);
        match &mut kind {
            ElementKind::NeuralField(f) => f.attach(&common, &mut components)?,
            ElementKind::GaussStimulus(_) | ElementKind::NormalNoise(_) => {}
            ElementKind::GaussKernel(k) => k.geometry_mut().attach(&mut components),
            ElementKind::MexicanHatKernel(k) => k.geometry_mut().attach(&mut components),
            ElementKind::LateralInteractions(k) => k.geometry_mut().attach(&mut components),
            ElementKind::AsymmetricGaussKernel(k) => k.geometry_mut().attach(&mut components),
            ElementKind::OscillatoryKernel(k) => k.geometry_mut().attach(&mut components),
            ElementKind::FieldCoupling(c) => c.attach(&common, &mut components)?,
            ElementKind::GaussFieldCoupling(c) => c.attach(&common, &mut components)?,
            ElementKind::KernelCoupling(c) => c.attach(&common, &mut components)?,
        }

        Ok(Self {
            common,
            components,
            kind,
            inputs: Vec::new(),
            outputs: Vec::new(),
        })
    }

    pub fn init(&mut self) {
        let Self {
            common,
            components,
            kind,
            ..
        } = self;
        match kind {
            ElementKind::NeuralField(f) => f.init(common, components),
            ElementKind::GaussStimulus(s) => s.init(common, components),
            ElementKind::NormalNoise(n) => n.init(common, components),
            ElementKind::GaussKernel(k) => k.init(common, components),
            ElementKind::MexicanHatKernel(k) => k.init(common, components),
            ElementKind::LateralInteractions(k) => k.init(common, components),
            ElementKind::AsymmetricGaussKernel(k) => k.init(common, components),
            ElementKind::OscillatoryKernel(k) => k.init(common, components),
            ElementKind::FieldCoupling(c) => c.init(common, components),
            ElementKind::GaussFieldCoupling(c) => c.init(common, components),
            ElementKind::KernelCoupling(c) => c.init(common, components),
        }
    }

    /// One integration tick. The simulation refreshes the `input` buffer
    /// from the element's edges before calling this.
    pub fn step(&mut self, t: f64, dt: f64) {
        let Self {
            common,
            components,
            kind,
            ..
        } = self;
        match kind {
            ElementKind::NeuralField(f) => f.step(common, components, t, dt),
            ElementKind::GaussStimulus(s) => s.step(common, components, t, dt),
            ElementKind::NormalNoise(n) => n.step(common, components, t, dt),
            ElementKind::GaussKernel(k) => k.step(common, components, t, dt),
            ElementKind::MexicanHatKernel(k) => k.step(common, components, t, dt),
            ElementKind::LateralInteractions(k) => k.step(common, components, t, dt),
            ElementKind::AsymmetricGaussKernel(k) => k.step(common, components, t, dt),
            ElementKind::OscillatoryKernel(k) => k.step(common, components, t, dt),
            ElementKind::FieldCoupling(c) => c.step(common, components, t, dt),
            ElementKind::GaussFieldCoupling(c) => c.step(common, components, t, dt),
            ElementKind::KernelCoupling(c) => c.step(common, components, t, dt),
        }
    }

    /// Zero every buffer; kind-specific extra teardown where needed.
    pub fn close(&mut self) {
        self.components.zero_all();
        if let ElementKind::FieldCoupling(c) = &mut self.kind {
            c.close();
        }
    }

    pub fn unique_name(&self) -> &str {
        &self.common.identifiers.unique_name
    }

    pub fn unique_id(&self) -> u32 {
        self.common.identifiers.unique_id
    }

    pub fn label(&self) -> ElementLabel {
        self.common.identifiers.label
    }

    pub fn size(&self) -> usize {
        self.common.dimensions.size
    }

    pub fn step_size(&self) -> f64 {
        self.common.dimensions.d_x
    }

    pub fn max_spatial_dimension(&self) -> f64 {
        self.common.dimensions.x_max
    }

    pub fn common_parameters(&self) -> &ElementCommonParameters {
        &self.common
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut ElementKind {
        &mut self.kind
    }

    /// The named buffer, or `ComponentNotFound` if this kind lacks it.
    pub fn component(&self, component: Component) -> Result<&[f64]> {
        self.components
            .get(component)
            .ok_or_else(|| ElementError::ComponentNotFound {
                element: self.common.identifiers.unique_name.clone(),
                component: component.as_str().to_string(),
            })
    }

    /// String-keyed variant for external accessor layers.
    pub fn component_by_name(&self, name: &str) -> Result<&[f64]> {
        let component = Component::from_str(name).map_err(|_| ElementError::ComponentNotFound {
            element: self.common.identifiers.unique_name.clone(),
            component: name.to_string(),
        })?;
        self.component(component)
    }

    pub fn component_list(&self) -> Vec<Component> {
        self.components.list()
    }

    pub(crate) fn components(&self) -> &ComponentSet {
        &self.components
    }

    pub(crate) fn components_mut(&mut self) -> &mut ComponentSet {
        &mut self.components
    }

    pub fn input_edges(&self) -> &[InputEdge] {
        &self.inputs
    }

    /// Back-references to elements reading from this one.
    pub fn output_edges(&self) -> &[InputEdge] {
        &self.outputs
    }

    pub fn has_input(&self, source: ElementHandle, component: Component) -> bool {
        self.inputs
            .iter()
            .any(|e| e.source == source && e.component == component)
    }

    pub(crate) fn has_input_from(&self, source: ElementHandle) -> bool {
        self.inputs.iter().any(|e| e.source == source)
    }

    pub(crate) fn input_edges_mut(&mut self) -> &mut Vec<InputEdge> {
        &mut self.inputs
    }

    pub(crate) fn push_input_edge(&mut self, edge: InputEdge) {
        self.inputs.push(edge);
    }

    pub(crate) fn push_output_edge(&mut self, edge: InputEdge) {
        self.outputs.push(edge);
    }

    pub(crate) fn remove_input_edge(&mut self, source: ElementHandle) -> bool {
        let before = self.inputs.len();
        self.inputs.retain(|e| e.source != source);
        before != self.inputs.len()
    }

    pub(crate) fn remove_output_edge(&mut self, target: ElementHandle) {
        self.outputs.retain(|e| e.source != target);
    }

    pub(crate) fn retain_input_edges(&mut self, mut live: impl FnMut(&InputEdge) -> bool) {
        self.inputs.retain(|e| live(e));
    }

    /// Directory for this coupling's weight file. No-op (with a warning) on
    /// elements without trainable weights.
    pub fn set_weights_directory(&mut self, directory: impl Into<std::path::PathBuf>) {
        let name = self.common.identifiers.unique_name.clone();
        if let ElementKind::FieldCoupling(c) = &mut self.kind {
            c.set_weights_directory(directory, &name);
        } else {
            tracing::warn!(element = %name, "element has no weight file to relocate");
        }
    }

    /// Apply one learning-rule update to a trainable coupling.
    /// Returns `false` (with a warning) for any other element kind.
    pub fn update_coupling_weights(&mut self, input: &[f64], activity: &[f64]) -> bool {
        let Self {
            common,
            components,
            kind,
            ..
        } = self;
        match kind {
            ElementKind::FieldCoupling(c) => {
                c.update_weights(components, input, activity);
                true
            }
            _ => {
                tracing::warn!(
                    element = %common.identifiers.unique_name,
                    "element has no trainable weights"
                );
                false
            }
        }
    }

    /// Reload coupling weights from the element's weight file.
    pub fn read_coupling_weights(&mut self) -> bool {
        let Self {
            components, kind, ..
        } = self;
        match kind {
            ElementKind::FieldCoupling(c) => c.read_weights(components),
            _ => false,
        }
    }

    /// Persist coupling weights to the element's weight file.
    pub fn save_coupling_weights(&self) -> bool {
        match &self.kind {
            ElementKind::FieldCoupling(c) => {
                c.write_weights(&self.components, &self.common.identifiers.unique_name)
            }
            _ => false,
        }
    }
}
