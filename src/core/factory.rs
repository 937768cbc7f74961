//! Element construction from a label and a label-specific parameter struct.
//!
//! This is the contract the external scenario/UI layer builds against: it
//! never touches element internals, only labels and parameter values.

use crate::couplings::{
    FieldCoupling, FieldCouplingParameters, GaussFieldCoupling, GaussFieldCouplingParameters,
    KernelCoupling, KernelCouplingParameters,
};
use crate::element::{
    Element, ElementCommonParameters, ElementDimensions, ElementKind, ElementLabel,
};
use crate::error::{ElementError, Result};
use crate::field::{NeuralField, NeuralFieldParameters};
use crate::kernels::{
    AsymmetricGaussKernel, AsymmetricGaussKernelParameters, GaussKernel, GaussKernelParameters,
    LateralInteractions, LateralInteractionsParameters, MexicanHatKernel,
    MexicanHatKernelParameters, OscillatoryKernel, OscillatoryKernelParameters,
};
use crate::stimulus::{GaussStimulus, GaussStimulusParameters, NormalNoise, NormalNoiseParameters};

/// Label-specific parameters, one variant per element kind.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementParameters {
    NeuralField(NeuralFieldParameters),
    GaussStimulus(GaussStimulusParameters),
    NormalNoise(NormalNoiseParameters),
    GaussKernel(GaussKernelParameters),
    MexicanHatKernel(MexicanHatKernelParameters),
    LateralInteractions(LateralInteractionsParameters),
    AsymmetricGaussKernel(AsymmetricGaussKernelParameters),
    OscillatoryKernel(OscillatoryKernelParameters),
    FieldCoupling(FieldCouplingParameters),
    GaussFieldCoupling(GaussFieldCouplingParameters),
    KernelCoupling(KernelCouplingParameters),
}

impl ElementParameters {
    pub fn label(&self) -> ElementLabel {
        match self {
            ElementParameters::NeuralField(_) => ElementLabel::NeuralField,
            ElementParameters::GaussStimulus(_) => ElementLabel::GaussStimulus,
            ElementParameters::NormalNoise(_) => ElementLabel::NormalNoise,
            ElementParameters::GaussKernel(_) => ElementLabel::GaussKernel,
            ElementParameters::MexicanHatKernel(_) => ElementLabel::MexicanHatKernel,
            ElementParameters::LateralInteractions(_) => ElementLabel::LateralInteractions,
            ElementParameters::AsymmetricGaussKernel(_) => ElementLabel::AsymmetricGaussKernel,
            ElementParameters::OscillatoryKernel(_) => ElementLabel::OscillatoryKernel,
            ElementParameters::FieldCoupling(_) => ElementLabel::FieldCoupling,
            ElementParameters::GaussFieldCoupling(_) => ElementLabel::GaussFieldCoupling,
            ElementParameters::KernelCoupling(_) => ElementLabel::KernelCoupling,
        }
    }
}

/// Build an element from its label, name, spatial descriptor, and parameters.
/// Fails with `WrongParameters` when the parameter variant does not match the
/// label, and with the usual size errors on bad dimensions.
pub fn create_element(
    label: ElementLabel,
    unique_name: impl Into<String>,
    dimensions: ElementDimensions,
    parameters: ElementParameters,
) -> Result<Element> {
    if parameters.label() != label {
        return Err(ElementError::WrongParameters {
            label: label.as_str().to_string(),
        });
    }
    let common = ElementCommonParameters::new(unique_name, label, dimensions);
    let kind = match parameters {
        ElementParameters::NeuralField(p) => ElementKind::NeuralField(NeuralField::new(p)),
        ElementParameters::GaussStimulus(p) => ElementKind::GaussStimulus(GaussStimulus::new(p)),
        ElementParameters::NormalNoise(p) => ElementKind::NormalNoise(NormalNoise::new(p)),
        ElementParameters::GaussKernel(p) => ElementKind::GaussKernel(GaussKernel::new(p)),
        ElementParameters::MexicanHatKernel(p) => {
            ElementKind::MexicanHatKernel(MexicanHatKernel::new(p))
        }
        ElementParameters::LateralInteractions(p) => {
            ElementKind::LateralInteractions(LateralInteractions::new(p))
        }
        ElementParameters::AsymmetricGaussKernel(p) => {
            ElementKind::AsymmetricGaussKernel(AsymmetricGaussKernel::new(p))
        }
        ElementParameters::OscillatoryKernel(p) => {
            ElementKind::OscillatoryKernel(OscillatoryKernel::new(p))
        }
        ElementParameters::FieldCoupling(p) => ElementKind::FieldCoupling(FieldCoupling::new(p)),
        ElementParameters::GaussFieldCoupling(p) => {
            ElementKind::GaussFieldCoupling(GaussFieldCoupling::new(p))
        }
        ElementParameters::KernelCoupling(p) => ElementKind::KernelCoupling(KernelCoupling::new(p)),
    };
    Element::new(common, kind)
}
