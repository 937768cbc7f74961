//! Error taxonomy for element construction and graph lookups.
//!
//! Construction and lookup failures are hard errors; runtime wiring and
//! persistence report logged boolean outcomes instead.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ElementError {
    #[error("element '{element}' has invalid size {size}")]
    InvalidSize { element: String, size: usize },

    #[error("element '{element}' has non-positive spatial spacing {d_x}")]
    InvalidSpacing { element: String, d_x: f64 },

    #[error("element '{element}' has no component '{component}'")]
    ComponentNotFound { element: String, component: String },

    #[error("no element named '{name}'")]
    ElementNotFound { name: String },

    #[error("no element with id {id}")]
    ElementIdNotFound { id: u32 },

    #[error("an element named '{name}' already exists")]
    DuplicateElement { name: String },

    #[error("parameters do not match element label '{label}'")]
    WrongParameters { label: String },

    #[error("simulation must be initialized before stepping")]
    UninitializedSimulation,
}

pub type Result<T> = core::result::Result<T, ElementError>;
