use serde::{Deserialize, Serialize};

use crate::dataset::domain::descriptor::Descriptor;

/// One enrolled sample: an identity label and the descriptor extracted
/// for it. Several samples may share a label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabeledDescriptor {
    label: String,
    descriptor: Descriptor,
}

impl LabeledDescriptor {
    pub fn new(label: impl Into<String>, descriptor: impl Into<Descriptor>) -> Self {
        Self {
            label: label.into(),
            descriptor: descriptor.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }
}
