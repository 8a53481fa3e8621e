use std::collections::BTreeSet;
use std::fs;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::error::SnipError;

/// Buffer ratio assumed for every QC liquid.
// TODO: derive from the QC template once it carries a buffer ratio field.
pub const DEFAULT_BUFFER_RATIO: &str = "1:9";

/// Particle diameter of the reference sample, in micrometres.
pub const REFERENCE_PARTICLE_DIAMETER_UM: f64 = 1.0;

/// Experiment metadata attached to a packaged run (`metadata.msc.json`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Miscellaneous {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub customizations: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquid: Option<Liquid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment: Option<Experiment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Liquid {
    Reference {
        target_concentration: f64,
        particle_diameter_um: f64,
        buffer_ratio: String,
    },
    Blank {
        buffer_ratio: String,
    },
}

impl Liquid {
    pub fn reference(target_concentration: f64) -> Self {
        Liquid::Reference {
            target_concentration,
            particle_diameter_um: REFERENCE_PARTICLE_DIAMETER_UM,
            buffer_ratio: DEFAULT_BUFFER_RATIO.to_string(),
        }
    }

    pub fn blank() -> Self {
        Liquid::Blank {
            buffer_ratio: DEFAULT_BUFFER_RATIO.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Experiment {
    ComponentQc {
        identifier: String,
        component: String,
        index: usize,
        maintenance_procedure: String,
    },
}

impl Miscellaneous {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn load(path: &Utf8Path) -> Result<Self, SnipError> {
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|_| SnipError::MetadataRead(path.to_path_buf()))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, SnipError> {
        serde_json::from_str(content).map_err(|err| SnipError::MetadataParse(err.to_string()))
    }

    pub fn to_json(&self) -> Result<String, SnipError> {
        serde_json::to_string(self).map_err(|err| SnipError::Serialize(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_serializes_to_empty_object() {
        assert_eq!(Miscellaneous::default().to_json().unwrap(), "{}");
    }

    #[test]
    fn parse_tagged_liquid() {
        let misc = Miscellaneous::from_json(
            r#"{"operator":"kim","liquid":{"type":"blank","buffer_ratio":"1:9"}}"#,
        )
        .unwrap();
        assert_eq!(misc.operator.as_deref(), Some("kim"));
        assert_eq!(misc.liquid, Some(Liquid::blank()));
        assert!(misc.experiment.is_none());
    }
}
