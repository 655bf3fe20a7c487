// MIT License - Copyright (c) 2026 Peter Wright
// Model registry

use std::fmt;

use crate::config::Route;
use crate::error::{IsecError, Result};

/// Protocol generation spoken by a central.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generation {
    /// Single-byte commands wrapped in a password-bearing ISEC frame
    V1,
    /// 16-bit commands with source/destination header and separate AUTHORIZE
    V2,
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => f.write_str("ISECNet V1"),
            Self::V2 => f.write_str("ISECNet V2"),
        }
    }
}

/// Device category. Fence controllers reuse panel byte offsets with different meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Panel,
    Fence,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Panel => f.write_str("alarm panel"),
            Self::Fence => f.write_str("electric fence"),
        }
    }
}

/// One row of the model table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    pub code: u8,
    pub name: &'static str,
    /// Generation spoken over an IP receiver. Fence controllers switch to V2
    /// on the cloud relay, see [`ModelSpec::generation_for`].
    pub generation: Generation,
    /// Independently armable partitions. 0 means the central is not partitioned.
    pub partitions: u8,
    pub category: Category,
}

impl ModelSpec {
    pub fn is_fence(&self) -> bool {
        self.category == Category::Fence
    }

    /// Generation used to reach this model over `route`.
    pub fn generation_for(&self, route: &Route) -> Generation {
        match (self.category, route) {
            (Category::Fence, Route::Cloud) => Generation::V2,
            _ => self.generation,
        }
    }
}

const fn model(
    code: u8,
    name: &'static str,
    generation: Generation,
    partitions: u8,
    category: Category,
) -> ModelSpec {
    ModelSpec {
        code,
        name,
        generation,
        partitions,
        category,
    }
}

use Category::{Fence, Panel};
use Generation::{V1, V2};

/// Known centrals, keyed by the model code the central reports.
static MODELS: [ModelSpec; 16] = [
    model(0x01, "AMT_8000", V2, 16, Panel),
    model(0x02, "AMT_8000_LITE", V2, 16, Panel),
    model(0x03, "AMT_8000_PRO", V2, 16, Panel),
    model(0x1E, "AMT_2018_E_EG", V1, 2, Panel),
    model(0x24, "ANM_24_NET", V1, 0, Panel),
    model(0x25, "ANM_24_NET_G2", V1, 0, Panel),
    model(0x2E, "AMT_2118_EG", V1, 2, Panel),
    model(0x31, "AMT_2016_E3G", V1, 2, Panel),
    model(0x32, "AMT_2018_E3G", V1, 2, Panel),
    model(0x34, "AMT_2018_E_SMART", V1, 2, Panel),
    model(0x35, "ELC_6012_NET", V1, 2, Fence),
    model(0x36, "AMT_1000_SMART", V1, 0, Panel),
    model(0x39, "ELC_6012_IND", V1, 2, Fence),
    model(0x41, "AMT_4010", V1, 4, Panel),
    model(0x61, "AMT_1016_NET", V1, 2, Panel),
    model(0x90, "AMT_9000", V2, 8, Panel),
];

/// Resolve a model code. Unknown codes fail; the generation is never guessed.
pub fn resolve(code: u8) -> Result<&'static ModelSpec> {
    MODELS
        .iter()
        .find(|m| m.code == code)
        .ok_or(IsecError::UnknownModel(code))
}

/// Look up a model by its name (case-insensitive), e.g. "AMT_4010".
pub fn resolve_name(name: &str) -> Option<&'static ModelSpec> {
    MODELS.iter().find(|m| m.name.eq_ignore_ascii_case(name))
}

/// Every registered model.
pub fn all() -> &'static [ModelSpec] {
    &MODELS
}
