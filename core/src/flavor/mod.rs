#![deny(missing_docs)]

//! # Output Flavors
//!
//! Pluggable rendering targets for generated models.
//!
//! - **traits**: Defines `ModelFlavor`, the capability set every flavor implements.
//! - **config**: Config parameter derivation shared by the flavors.
//! - **pydantic_v2** / **pydantic_v1** / **dataclass**: The concrete flavors.

pub mod config;
pub mod dataclass;
mod pydantic;
pub mod pydantic_v1;
pub mod pydantic_v2;
pub mod traits;

pub use config::{ConfigEntry, ConfigInput, ConfigParams};
pub use dataclass::DataclassFlavor;
pub use pydantic_v1::PydanticV1Flavor;
pub use pydantic_v2::PydanticV2Flavor;
pub use traits::ModelFlavor;

use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::fmt::Display;
use std::str::FromStr;

/// Selects the model/field variants, default base class and templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum OutputFlavor {
    /// Pydantic 2 (`BaseModel`, `RootModel`, `ConfigDict`).
    #[default]
    #[serde(rename = "pydantic_v2.BaseModel")]
    PydanticV2,
    /// Pydantic 1 (`BaseModel`, `__root__`, nested `Config`).
    #[serde(rename = "pydantic.BaseModel")]
    PydanticV1,
    /// Standard library `@dataclass`.
    #[serde(rename = "dataclasses.dataclass")]
    Dataclass,
}

static PYDANTIC_V2: PydanticV2Flavor = PydanticV2Flavor;
static PYDANTIC_V1: PydanticV1Flavor = PydanticV1Flavor;
static DATACLASS: DataclassFlavor = DataclassFlavor;

impl OutputFlavor {
    /// Every flavor, in CLI listing order.
    pub const ALL: [OutputFlavor; 3] = [
        OutputFlavor::PydanticV2,
        OutputFlavor::PydanticV1,
        OutputFlavor::Dataclass,
    ];

    /// The capability set behind this flavor.
    pub fn strategy(self) -> &'static dyn ModelFlavor {
        match self {
            OutputFlavor::PydanticV2 => &PYDANTIC_V2,
            OutputFlavor::PydanticV1 => &PYDANTIC_V1,
            OutputFlavor::Dataclass => &DATACLASS,
        }
    }

    /// The name used on the command line and in config files.
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFlavor::PydanticV2 => "pydantic_v2.BaseModel",
            OutputFlavor::PydanticV1 => "pydantic.BaseModel",
            OutputFlavor::Dataclass => "dataclasses.dataclass",
        }
    }
}

impl Display for OutputFlavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFlavor {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        OutputFlavor::ALL
            .into_iter()
            .find(|flavor| flavor.as_str() == s)
            .ok_or_else(|| AppError::Config(format!("Unknown output model type: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelKind;

    #[test]
    fn test_parse_flavor_names() {
        for flavor in OutputFlavor::ALL {
            assert_eq!(flavor.as_str().parse::<OutputFlavor>().unwrap(), flavor);
        }
        let err = "attrs.define".parse::<OutputFlavor>().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_strategy_dispatch() {
        assert_eq!(
            OutputFlavor::PydanticV2.strategy().template_id(ModelKind::Root),
            "pydantic_v2/RootModel.jinja2"
        );
        assert_eq!(
            OutputFlavor::PydanticV1.strategy().template_id(ModelKind::Root),
            "pydantic/BaseModel_root.jinja2"
        );
        assert_eq!(
            OutputFlavor::Dataclass.strategy().template_id(ModelKind::Base),
            "dataclass.jinja2"
        );
    }
}
