use std::collections::BTreeSet;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::domain::RawIdentity;
use crate::error::SnipError;
use crate::metadata::{Experiment, Liquid, Miscellaneous};

/// A component QC run: which mnemonic ids are reference samples, which are
/// blanks, and in what order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcTemplate {
    pub identifier: String,
    pub operator: String,
    pub maintenance_procedure: String,
    pub component: String,
    pub hostname: String,
    #[serde(default)]
    pub customizations: BTreeSet<String>,
    pub target_reference_concentration: f64,
    pub reference_id_sequence: Vec<String>,
    pub blank_id_sequence: Vec<String>,
}

impl QcTemplate {
    pub fn load(path: &Utf8Path) -> Result<Self, SnipError> {
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|_| SnipError::TemplateRead(path.to_path_buf()))?;
        let template: QcTemplate = serde_json::from_str(&content)
            .map_err(|err| SnipError::TemplateParse(err.to_string()))?;
        template.check()?;
        Ok(template)
    }

    /// Rejects templates that break the reference/blank contract.
    pub fn check(&self) -> Result<(), SnipError> {
        if !(self.target_reference_concentration.is_finite()
            && self.target_reference_concentration > 0.0)
        {
            return Err(SnipError::InvalidTemplate(format!(
                "target_reference_concentration must be positive, got {}",
                self.target_reference_concentration
            )));
        }
        if let Some(shared) = self
            .reference_id_sequence
            .iter()
            .find(|id| self.blank_id_sequence.contains(id))
        {
            return Err(SnipError::InvalidTemplate(format!(
                "id {shared} is listed as both reference and blank"
            )));
        }
        Ok(())
    }

    /// Reference ids followed by blank ids, each in template order.
    pub fn all_identifiers(&self) -> impl Iterator<Item = &str> {
        self.reference_id_sequence
            .iter()
            .chain(self.blank_id_sequence.iter())
            .map(String::as_str)
    }

    /// Fails on the first template id that no file provides.
    ///
    /// Only names are inspected. Names outside the raw file grammar carry no
    /// id and are ignored here.
    pub fn validate_files(&self, files: &[Utf8PathBuf]) -> Result<(), SnipError> {
        let existing = files
            .iter()
            .filter_map(|file| RawIdentity::from_path(file).ok())
            .map(|identity| identity.mnemonic_id().to_string())
            .collect::<BTreeSet<_>>();
        match self.all_identifiers().find(|id| !existing.contains(*id)) {
            Some(missing) => Err(SnipError::MissingTemplateMember(missing.to_string())),
            None => Ok(()),
        }
    }

    pub fn belongs_to(&self, file: &Utf8Path) -> bool {
        let Ok(identity) = RawIdentity::from_path(file) else {
            return false;
        };
        identity.hostname() == self.hostname
            && self.all_identifiers().any(|id| id == identity.mnemonic_id())
    }

    pub fn resolve_metadata(&self, file: &Utf8Path) -> Result<Miscellaneous, SnipError> {
        let identity = RawIdentity::from_path(file)?;
        let id = identity.mnemonic_id();

        let (liquid, index) = if let Some(index) = position(&self.reference_id_sequence, id) {
            (Liquid::reference(self.target_reference_concentration), index)
        } else if let Some(index) = position(&self.blank_id_sequence, id) {
            (Liquid::blank(), index)
        } else {
            return Err(SnipError::UnknownIdentifier(id.to_string()));
        };

        Ok(Miscellaneous {
            operator: Some(self.operator.clone()),
            customizations: self.customizations.clone(),
            liquid: Some(liquid),
            experiment: Some(Experiment::ComponentQc {
                identifier: self.identifier.clone(),
                component: self.component.clone(),
                index,
                maintenance_procedure: self.maintenance_procedure.clone(),
            }),
        })
    }
}

fn position(sequence: &[String], id: &str) -> Option<usize> {
    sequence.iter().position(|candidate| candidate == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> QcTemplate {
        QcTemplate {
            identifier: "qc-1".to_string(),
            operator: "kim".to_string(),
            maintenance_procedure: "monthly".to_string(),
            component: "pump".to_string(),
            hostname: "HOSTAAA01".to_string(),
            customizations: BTreeSet::new(),
            target_reference_concentration: 2.5,
            reference_id_sequence: vec!["R1".to_string(), "R2".to_string()],
            blank_id_sequence: vec!["B1".to_string()],
        }
    }

    #[test]
    fn all_identifiers_keeps_order() {
        let t = template();
        let ids = t.all_identifiers().collect::<Vec<_>>();
        assert_eq!(ids, vec!["R1", "R2", "B1"]);
    }

    #[test]
    fn check_rejects_overlap() {
        let mut t = template();
        t.blank_id_sequence.push("R2".to_string());
        assert!(matches!(t.check(), Err(SnipError::InvalidTemplate(_))));
    }

    #[test]
    fn check_rejects_non_positive_concentration() {
        let mut t = template();
        t.target_reference_concentration = 0.0;
        assert!(matches!(t.check(), Err(SnipError::InvalidTemplate(_))));
    }
}
