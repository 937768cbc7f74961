//! Simulation orchestrator: owns the element arena and drives the clock.
//!
//! Elements are stepped in insertion order, once per tick. Each element's
//! input buffer is refreshed from its edges immediately before it steps, so
//! an element reads the current-tick output of anything stepped earlier this
//! pass and the previous-tick output of anything stepped later. Interaction
//! loops therefore settle with a one-tick lag instead of requiring a solver.

use core::str::FromStr;
use std::fs;
use std::io::Write as _;
use std::path::PathBuf;

use hashbrown::HashMap;

use crate::element::{Component, Element, ElementHandle, InputEdge};
use crate::error::{ElementError, Result};

#[derive(Debug)]
struct Slot {
    generation: u32,
    element: Option<Element>,
}

/// The element graph plus the integration clock.
#[derive(Debug)]
pub struct Simulation {
    identifier: String,
    slots: Vec<Slot>,
    free: Vec<usize>,
    /// Stepping order; also the authoritative list of live handles.
    order: Vec<ElementHandle>,
    names: HashMap<String, ElementHandle>,
    delta_t: f64,
    t_zero: f64,
    t: f64,
    paused: bool,
    initialized: bool,
    export_directory: PathBuf,
}

impl Simulation {
    pub fn new(identifier: impl Into<String>, delta_t: f64, t_zero: f64) -> Self {
        let identifier = identifier.into();
        let delta_t = if delta_t > 0.0 {
            delta_t
        } else {
            tracing::warn!(
                simulation = %identifier,
                delta_t,
                "non-positive time step, falling back to 1.0"
            );
            1.0
        };
        Self {
            identifier,
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
            names: HashMap::new(),
            delta_t,
            t_zero,
            t: t_zero,
            paused: false,
            initialized: false,
            export_directory: PathBuf::from("exports"),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn time(&self) -> f64 {
        self.t
    }

    pub fn start_time(&self) -> f64 {
        self.t_zero
    }

    pub fn delta_t(&self) -> f64 {
        self.delta_t
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn element_count(&self) -> usize {
        self.order.len()
    }

    pub fn set_export_directory(&mut self, directory: impl Into<PathBuf>) {
        self.export_directory = directory.into();
    }

    /// Add an element at the end of the stepping order. Rejects a second
    /// element with the same unique name.
    pub fn add_element(&mut self, element: Element) -> Result<ElementHandle> {
        let name = element.unique_name().to_string();
        if self.names.contains_key(&name) {
            return Err(ElementError::DuplicateElement { name });
        }

        let mut element = element;
        if self.initialized {
            element.init();
        }

        let handle = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.element = Some(element);
                ElementHandle {
                    index: index as u32,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len();
                self.slots.push(Slot {
                    generation: 0,
                    element: Some(element),
                });
                ElementHandle {
                    index: index as u32,
                    generation: 0,
                }
            }
        };
        self.order.push(handle);
        tracing::info!(simulation = %self.identifier, element = %name, "element added");
        self.names.insert(name, handle);
        Ok(handle)
    }

    /// Remove an element by name. Its slot generation is bumped so every
    /// edge still pointing at it goes dead; readers prune those edges the
    /// next time they refresh their input.
    pub fn remove_element(&mut self, name: &str) -> Result<()> {
        let handle = self.handle_of(name).ok_or_else(|| ElementError::ElementNotFound {
            name: name.to_string(),
        })?;

        let index = handle.index as usize;
        let slot = &mut self.slots[index];
        let removed = slot.element.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        self.order.retain(|h| *h != handle);
        self.names.remove(name);

        // Sources no longer have a reader; drop their back-references now.
        // Readers of the removed element keep their edges until the next
        // refresh notices the stale generation.
        if let Some(removed) = removed {
            for edge in removed.input_edges() {
                if let Some(source) = self.live_mut(edge.source) {
                    source.remove_output_edge(handle);
                }
            }
        }
        tracing::info!(simulation = %self.identifier, element = name, "element removed");
        Ok(())
    }

    pub fn handle_of(&self, name: &str) -> Option<ElementHandle> {
        self.names.get(name).copied()
    }

    pub fn element(&self, handle: ElementHandle) -> Option<&Element> {
        self.live(handle)
    }

    pub fn element_mut(&mut self, handle: ElementHandle) -> Option<&mut Element> {
        self.live_mut(handle)
    }

    pub fn element_by_name(&self, name: &str) -> Result<&Element> {
        self.handle_of(name)
            .and_then(|h| self.live(h))
            .ok_or_else(|| ElementError::ElementNotFound {
                name: name.to_string(),
            })
    }

    pub fn element_by_name_mut(&mut self, name: &str) -> Result<&mut Element> {
        let handle = self.handle_of(name).ok_or_else(|| ElementError::ElementNotFound {
            name: name.to_string(),
        })?;
        self.live_mut(handle).ok_or_else(|| ElementError::ElementNotFound {
            name: name.to_string(),
        })
    }

    pub fn element_by_id(&self, id: u32) -> Result<&Element> {
        self.elements()
            .find(|e| e.unique_id() == id)
            .ok_or(ElementError::ElementIdNotFound { id })
    }

    /// Live elements in stepping order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.order.iter().filter_map(|h| self.live(*h))
    }

    /// Copy of the named component, for accessor layers that outlive the
    /// borrow (plotters, file exporters).
    pub fn get_component(&self, element_name: &str, component_name: &str) -> Result<Vec<f64>> {
        Ok(self
            .element_by_name(element_name)?
            .component_by_name(component_name)?
            .to_vec())
    }

    pub fn get_component_list(&self, element_name: &str) -> Result<Vec<Component>> {
        Ok(self.element_by_name(element_name)?.component_list())
    }

    /// Wire `component` of `source` into the input of `target`. Returns
    /// `false` with a warning when the wiring is impossible; the graph is
    /// left untouched in that case.
    pub fn connect(
        &mut self,
        source: ElementHandle,
        component: Component,
        target: ElementHandle,
    ) -> bool {
        let Some(src) = self.live(source) else {
            tracing::warn!(simulation = %self.identifier, "connect: source element is gone");
            return false;
        };
        let Some(dst) = self.live(target) else {
            tracing::warn!(simulation = %self.identifier, "connect: target element is gone");
            return false;
        };
        if dst.has_input_from(source) {
            tracing::warn!(
                source = %src.unique_name(),
                target = %dst.unique_name(),
                "connect: elements are already connected"
            );
            return false;
        }
        let Some(values) = src.components().get(component) else {
            tracing::warn!(
                source = %src.unique_name(),
                component = %component,
                "connect: source has no such component"
            );
            return false;
        };
        let input_len = dst.components().get(Component::Input).map_or(0, <[f64]>::len);
        if values.len() != input_len && values.len() != dst.size() {
            tracing::warn!(
                source = %src.unique_name(),
                target = %dst.unique_name(),
                source_len = values.len(),
                target_len = input_len,
                "connect: component sizes are incompatible"
            );
            return false;
        }

        let edge = InputEdge { source, component };
        let back = InputEdge {
            source: target,
            component,
        };
        if source == target {
            if let Some(element) = self.live_mut(target) {
                element.push_input_edge(edge);
                element.push_output_edge(back);
            }
        } else {
            let (lo, hi) = (
                source.index.min(target.index) as usize,
                source.index.max(target.index) as usize,
            );
            let (left, right) = self.slots.split_at_mut(hi);
            let (a, b) = (&mut left[lo], &mut right[0]);
            let (src_slot, dst_slot) = if source.index < target.index {
                (a, b)
            } else {
                (b, a)
            };
            if let (Some(src), Some(dst)) = (src_slot.element.as_mut(), dst_slot.element.as_mut())
            {
                dst.push_input_edge(edge);
                src.push_output_edge(back);
            }
        }
        true
    }

    /// Name-based wiring entry point used by scenario setup code.
    pub fn create_interaction(
        &mut self,
        source_name: &str,
        component_name: &str,
        target_name: &str,
    ) -> bool {
        let Some(source) = self.handle_of(source_name) else {
            tracing::warn!(element = source_name, "create interaction: no such element");
            return false;
        };
        let Some(target) = self.handle_of(target_name) else {
            tracing::warn!(element = target_name, "create interaction: no such element");
            return false;
        };
        let Ok(component) = Component::from_str(component_name) else {
            tracing::warn!(component = component_name, "create interaction: no such component");
            return false;
        };
        self.connect(source, component, target)
    }

    /// Remove every edge from `source_name` into `target_name`. A no-op
    /// (returning `false`) when either element or the edge does not exist.
    pub fn remove_interaction(&mut self, source_name: &str, target_name: &str) -> bool {
        let (Some(source), Some(target)) = (self.handle_of(source_name), self.handle_of(target_name))
        else {
            return false;
        };
        let removed = match self.live_mut(target) {
            Some(dst) => dst.remove_input_edge(source),
            None => false,
        };
        if removed {
            if let Some(src) = self.live_mut(source) {
                src.remove_output_edge(target);
            }
        }
        removed
    }

    /// Id-based variant of [`remove_interaction`](Self::remove_interaction).
    pub fn remove_interaction_by_id(&mut self, source_id: u32, target_id: u32) -> bool {
        let mut source = None;
        let mut target = None;
        for &handle in &self.order {
            if let Some(element) = self.live(handle) {
                if element.unique_id() == source_id {
                    source = Some(handle);
                }
                if element.unique_id() == target_id {
                    target = Some(handle);
                }
            }
        }
        let (Some(source), Some(target)) = (source, target) else {
            return false;
        };
        let removed = match self.live_mut(target) {
            Some(dst) => dst.remove_input_edge(source),
            None => false,
        };
        if removed {
            if let Some(src) = self.live_mut(source) {
                src.remove_output_edge(target);
            }
        }
        removed
    }

    /// Initialize every element and reset the clock to `t_zero`.
    pub fn init(&mut self) {
        for handle in self.order.clone() {
            if let Some(element) = self.live_mut(handle) {
                element.init();
            }
        }
        self.t = self.t_zero;
        self.paused = false;
        self.initialized = true;
        tracing::info!(simulation = %self.identifier, "simulation initialized");
    }

    /// Advance the simulation by one tick. Does nothing while paused.
    pub fn step(&mut self) -> Result<()> {
        if !self.initialized {
            return Err(ElementError::UninitializedSimulation);
        }
        if self.paused {
            return Ok(());
        }

        for handle in self.order.clone() {
            let Some(index) = self.take_index(handle) else {
                continue;
            };
            let Some(mut element) = self.slots[index].element.take() else {
                continue;
            };
            refresh_input(&self.slots, handle, &mut element);
            element.step(self.t, self.delta_t);
            self.slots[index].element = Some(element);
        }
        self.t += self.delta_t;
        Ok(())
    }

    /// Step repeatedly until `duration` simulated time has elapsed.
    pub fn run_for(&mut self, duration: f64) -> Result<()> {
        let end = self.t + duration;
        while self.t < end && !self.paused {
            self.step()?;
        }
        Ok(())
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Zero every element's buffers and drop back to the uninitialized state.
    pub fn close(&mut self) {
        for handle in self.order.clone() {
            if let Some(element) = self.live_mut(handle) {
                element.close();
            }
        }
        self.initialized = false;
        tracing::info!(simulation = %self.identifier, "simulation closed");
    }

    /// Dump one component to a plain text file, one value per line, under
    /// the export directory. Logged boolean outcome, never an error.
    pub fn export_component_to_file(&self, element_name: &str, component_name: &str) -> bool {
        let values = match self.get_component(element_name, component_name) {
            Ok(values) => values,
            Err(error) => {
                tracing::warn!(%error, "export: component lookup failed");
                return false;
            }
        };
        if let Err(error) = fs::create_dir_all(&self.export_directory) {
            tracing::warn!(%error, path = %self.export_directory.display(), "export: cannot create directory");
            return false;
        }
        let path = self.export_directory.join(format!(
            "{}_{}_{}.txt",
            self.identifier, element_name, component_name
        ));
        let mut text = String::with_capacity(values.len() * 12);
        for v in &values {
            text.push_str(&v.to_string());
            text.push('\n');
        }
        match fs::File::create(&path).and_then(|mut f| f.write_all(text.as_bytes())) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "component exported");
                true
            }
            Err(error) => {
                tracing::warn!(%error, path = %path.display(), "export failed");
                false
            }
        }
    }

    fn live(&self, handle: ElementHandle) -> Option<&Element> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.element.as_ref()
    }

    fn live_mut(&mut self, handle: ElementHandle) -> Option<&mut Element> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.element.as_mut()
    }

    fn take_index(&self, handle: ElementHandle) -> Option<usize> {
        let index = handle.index as usize;
        (self.slots.get(index)?.generation == handle.generation).then_some(index)
    }
}

/// Zero the element's input buffer, then accumulate every live edge's source
/// component into it. Edges whose source slot was reused or vacated are
/// pruned here. The element itself is already taken out of its slot, so a
/// self-edge reads the element's own previous-tick buffers.
fn refresh_input(slots: &[Slot], own: ElementHandle, element: &mut Element) {
    let Some(input_len) = element.components().get(Component::Input).map(<[f64]>::len) else {
        return;
    };
    let mut accumulated = vec![0.0; input_len];
    let mut edges = core::mem::take(element.input_edges_mut());
    edges.retain(|edge| {
        let components = if edge.source == own {
            Some(element.components())
        } else {
            slots
                .get(edge.source.index as usize)
                .filter(|slot| slot.generation == edge.source.generation)
                .and_then(|slot| slot.element.as_ref())
                .map(Element::components)
        };
        let Some(components) = components else {
            tracing::debug!(
                element = %element.unique_name(),
                "pruning edge from a removed element"
            );
            return false;
        };
        match components.get(edge.component) {
            Some(values) => {
                for (acc, v) in accumulated.iter_mut().zip(values.iter()) {
                    *acc += v;
                }
            }
            None => tracing::warn!(
                element = %element.unique_name(),
                component = %edge.component,
                "input edge reads a missing component"
            ),
        }
        true
    });
    *element.input_edges_mut() = edges;
    if let Some(input) = element.components_mut().get_mut(Component::Input) {
        input.copy_from_slice(&accumulated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{
        ElementCommonParameters, ElementDimensions, ElementKind, ElementLabel,
    };
    use crate::field::{ActivationFunction, NeuralField, NeuralFieldParameters};
    use crate::kernels::{GaussKernel, GaussKernelParameters};
    use crate::stimulus::{GaussStimulus, GaussStimulusParameters};

    fn field(name: &str, size: usize, threshold: f64) -> Element {
        let common = ElementCommonParameters::new(
            name,
            ElementLabel::NeuralField,
            ElementDimensions::with_size(size),
        );
        Element::new(
            common,
            ElementKind::NeuralField(NeuralField::new(NeuralFieldParameters {
                tau: 1.0,
                resting_level: -5.0,
                activation_function: ActivationFunction::Heaviside { threshold },
            })),
        )
        .unwrap()
    }

    fn kernel(name: &str, size: usize) -> Element {
        let common = ElementCommonParameters::new(
            name,
            ElementLabel::GaussKernel,
            ElementDimensions::with_size(size),
        );
        Element::new(
            common,
            ElementKind::GaussKernel(GaussKernel::new(GaussKernelParameters::default())),
        )
        .unwrap()
    }

    fn stimulus(name: &str, size: usize) -> Element {
        let common = ElementCommonParameters::new(
            name,
            ElementLabel::GaussStimulus,
            ElementDimensions::with_size(size),
        );
        Element::new(
            common,
            ElementKind::GaussStimulus(GaussStimulus::new(GaussStimulusParameters::default())),
        )
        .unwrap()
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut sim = Simulation::new("sim", 1.0, 0.0);
        sim.add_element(field("a", 10, 0.0)).unwrap();
        let err = sim.add_element(field("a", 10, 0.0)).unwrap_err();
        assert!(matches!(err, ElementError::DuplicateElement { .. }));
        assert_eq!(sim.element_count(), 1);
    }

    #[test]
    fn step_before_init_errors() {
        let mut sim = Simulation::new("sim", 1.0, 0.0);
        sim.add_element(field("a", 10, 0.0)).unwrap();
        assert!(matches!(
            sim.step(),
            Err(ElementError::UninitializedSimulation)
        ));
    }

    #[test]
    fn earlier_elements_see_a_one_tick_lag() {
        let mut sim = Simulation::new("sim", 1.0, 0.0);
        // Kernel first, so the field it reads from steps after it.
        let k = sim.add_element(kernel("kernel", 10)).unwrap();
        // Threshold below resting level, so the field fires everywhere
        // from its first step on.
        let f = sim.add_element(field("field", 10, -10.0)).unwrap();
        assert!(sim.connect(f, Component::Output, k));
        sim.init();

        sim.step().unwrap();
        // The field had not fired yet when the kernel refreshed its input.
        let kernel_input = sim.get_component("kernel", "input").unwrap();
        assert_eq!(kernel_input, vec![0.0; 10]);
        let field_output = sim.get_component("field", "output").unwrap();
        assert_eq!(field_output, vec![1.0; 10]);

        sim.step().unwrap();
        // One tick later the kernel sees the field's previous output.
        let kernel_input = sim.get_component("kernel", "input").unwrap();
        assert_eq!(kernel_input, vec![1.0; 10]);
    }

    #[test]
    fn later_elements_see_the_current_tick() {
        let mut sim = Simulation::new("sim", 1.0, 0.0);
        let f = sim.add_element(field("field", 10, -10.0)).unwrap();
        let k = sim.add_element(kernel("kernel", 10)).unwrap();
        assert!(sim.connect(f, Component::Output, k));
        sim.init();

        sim.step().unwrap();
        // The field steps first, so the kernel already reads its output.
        let kernel_input = sim.get_component("kernel", "input").unwrap();
        assert_eq!(kernel_input, vec![1.0; 10]);
    }

    #[test]
    fn inputs_from_two_sources_accumulate() {
        let mut sim = Simulation::new("sim", 1.0, 0.0);
        let a = sim.add_element(field("a", 10, -10.0)).unwrap();
        let b = sim.add_element(field("b", 10, -10.0)).unwrap();
        let k = sim.add_element(kernel("kernel", 10)).unwrap();
        assert!(sim.connect(a, Component::Output, k));
        assert!(sim.connect(b, Component::Output, k));
        sim.init();
        sim.step().unwrap();
        let kernel_input = sim.get_component("kernel", "input").unwrap();
        assert_eq!(kernel_input, vec![2.0; 10]);
    }

    #[test]
    fn duplicate_and_mismatched_connections_are_refused() {
        let mut sim = Simulation::new("sim", 1.0, 0.0);
        let a = sim.add_element(field("a", 10, 0.0)).unwrap();
        let k = sim.add_element(kernel("kernel", 10)).unwrap();
        let small = sim.add_element(field("small", 7, 0.0)).unwrap();

        assert!(sim.connect(a, Component::Output, k));
        assert!(!sim.connect(a, Component::Output, k), "second edge from the same pair");
        assert!(!sim.connect(small, Component::Output, k), "incompatible sizes");
        assert!(!sim.connect(a, Component::Kernel, small), "field has no kernel buffer");
        assert_eq!(sim.element(k).unwrap().input_edges().len(), 1);
    }

    #[test]
    fn removed_sources_are_pruned_lazily() {
        let mut sim = Simulation::new("sim", 1.0, 0.0);
        let s = sim.add_element(stimulus("stimulus", 20)).unwrap();
        let k = sim.add_element(kernel("kernel", 20)).unwrap();
        assert!(sim.connect(s, Component::Output, k));
        sim.init();
        sim.step().unwrap();
        assert!(sim
            .get_component("kernel", "input")
            .unwrap()
            .iter()
            .any(|&v| v != 0.0));

        sim.remove_element("stimulus").unwrap();
        assert_eq!(sim.element(k).unwrap().input_edges().len(), 1);

        sim.step().unwrap();
        assert_eq!(sim.get_component("kernel", "input").unwrap(), vec![0.0; 20]);
        assert!(sim.element(k).unwrap().input_edges().is_empty());
        assert!(sim.element(s).is_none());
    }

    #[test]
    fn slot_reuse_does_not_resurrect_old_handles() {
        let mut sim = Simulation::new("sim", 1.0, 0.0);
        let old = sim.add_element(field("old", 10, 0.0)).unwrap();
        sim.remove_element("old").unwrap();
        let new = sim.add_element(field("new", 10, 0.0)).unwrap();
        assert_eq!(old.index, new.index, "slot should be reused");
        assert!(sim.element(old).is_none());
        assert_eq!(sim.element(new).unwrap().unique_name(), "new");
    }

    #[test]
    fn remove_interaction_is_a_safe_no_op_when_absent() {
        let mut sim = Simulation::new("sim", 1.0, 0.0);
        let s = sim.add_element(stimulus("stimulus", 10)).unwrap();
        let k = sim.add_element(kernel("kernel", 10)).unwrap();
        assert!(!sim.remove_interaction("stimulus", "kernel"));
        assert!(!sim.remove_interaction("ghost", "kernel"));

        assert!(sim.connect(s, Component::Output, k));
        assert!(sim.remove_interaction("stimulus", "kernel"));
        assert!(sim.element(k).unwrap().input_edges().is_empty());
        assert!(sim.element(s).unwrap().output_edges().is_empty());
        assert!(!sim.remove_interaction("stimulus", "kernel"));
    }

    #[test]
    fn remove_interaction_by_id_matches_the_name_variant() {
        let mut sim = Simulation::new("sim", 1.0, 0.0);
        let s = sim.add_element(stimulus("stimulus", 10)).unwrap();
        let k = sim.add_element(kernel("kernel", 10)).unwrap();
        assert!(sim.connect(s, Component::Output, k));

        let source_id = sim.element(s).unwrap().unique_id();
        let target_id = sim.element(k).unwrap().unique_id();
        assert!(!sim.remove_interaction_by_id(source_id, u32::MAX));
        assert!(sim.remove_interaction_by_id(source_id, target_id));
        assert!(sim.element(k).unwrap().input_edges().is_empty());
    }

    #[test]
    fn create_interaction_resolves_names_and_components() {
        let mut sim = Simulation::new("sim", 1.0, 0.0);
        sim.add_element(stimulus("stimulus", 10)).unwrap();
        sim.add_element(kernel("kernel", 10)).unwrap();
        assert!(sim.create_interaction("stimulus", "output", "kernel"));
        assert!(!sim.create_interaction("stimulus", "no such buffer", "kernel"));
        assert!(!sim.create_interaction("ghost", "output", "kernel"));
    }

    #[test]
    fn pause_freezes_the_clock() {
        let mut sim = Simulation::new("sim", 0.5, 0.0);
        sim.add_element(stimulus("stimulus", 10)).unwrap();
        sim.init();
        sim.step().unwrap();
        assert!((sim.time() - 0.5).abs() < 1e-12);

        sim.pause();
        sim.step().unwrap();
        sim.step().unwrap();
        assert!((sim.time() - 0.5).abs() < 1e-12);

        sim.resume();
        sim.step().unwrap();
        assert!((sim.time() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn run_for_advances_to_the_requested_time() {
        let mut sim = Simulation::new("sim", 1.0, 5.0);
        sim.add_element(stimulus("stimulus", 10)).unwrap();
        sim.init();
        assert!((sim.time() - 5.0).abs() < 1e-12);
        sim.run_for(10.0).unwrap();
        assert!((sim.time() - 15.0).abs() < 1e-12);
    }

    #[test]
    fn close_zeroes_buffers_and_requires_reinit() {
        let mut sim = Simulation::new("sim", 1.0, 0.0);
        sim.add_element(stimulus("stimulus", 10)).unwrap();
        sim.init();
        sim.step().unwrap();
        sim.close();
        assert_eq!(sim.get_component("stimulus", "output").unwrap(), vec![0.0; 10]);
        assert!(matches!(
            sim.step(),
            Err(ElementError::UninitializedSimulation)
        ));
        sim.init();
        sim.step().unwrap();
    }

    #[test]
    fn elements_added_while_running_are_initialized() {
        let mut sim = Simulation::new("sim", 1.0, 0.0);
        sim.init();
        sim.add_element(stimulus("late", 10)).unwrap();
        // Stimulus init bakes the bump into its output immediately.
        assert!(sim
            .get_component("late", "output")
            .unwrap()
            .iter()
            .any(|&v| v != 0.0));
        sim.step().unwrap();
    }

    #[test]
    fn lookup_failures_are_typed_errors() {
        let sim = Simulation::new("sim", 1.0, 0.0);
        assert!(matches!(
            sim.element_by_name("ghost"),
            Err(ElementError::ElementNotFound { .. })
        ));
        assert!(matches!(
            sim.element_by_id(u32::MAX),
            Err(ElementError::ElementIdNotFound { .. })
        ));
        assert!(matches!(
            sim.get_component("ghost", "output"),
            Err(ElementError::ElementNotFound { .. })
        ));
    }

    #[test]
    fn exports_a_component_as_plain_text() {
        let mut sim = Simulation::new("export sim", 1.0, 0.0);
        sim.set_export_directory(std::env::temp_dir().join(format!(
            "dynfield-export-{}",
            std::process::id()
        )));
        sim.add_element(stimulus("stimulus", 8)).unwrap();
        sim.init();
        assert!(sim.export_component_to_file("stimulus", "output"));
        assert!(!sim.export_component_to_file("ghost", "output"));

        let path = std::env::temp_dir()
            .join(format!("dynfield-export-{}", std::process::id()))
            .join("export sim_stimulus_output.txt");
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 8);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
