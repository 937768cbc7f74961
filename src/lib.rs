#[path = "core/convolution.rs"]
pub mod convolution;

#[path = "core/couplings.rs"]
pub mod couplings;

#[path = "core/element.rs"]
pub mod element;

#[path = "core/error.rs"]
pub mod error;

#[path = "core/factory.rs"]
pub mod factory;

#[path = "core/field.rs"]
pub mod field;

#[path = "core/kernels.rs"]
pub mod kernels;

#[path = "core/mathtools.rs"]
pub mod mathtools;

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/simulation.rs"]
pub mod simulation;

#[path = "core/stimulus.rs"]
pub mod stimulus;

pub use element::{
    Component, Element, ElementCommonParameters, ElementDimensions, ElementHandle, ElementLabel,
};
pub use error::{ElementError, Result};
pub use factory::{create_element, ElementParameters};
pub use simulation::Simulation;
