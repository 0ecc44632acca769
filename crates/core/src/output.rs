//! Output file naming
//!
//! Per-species drought maps are named from a path template holding
//! `{species}` and `{timestep}` placeholders. Templates are checked when the
//! scenario loads, so a bad placeholder fails before any output is produced.

use crate::error::{DroughtError, DroughtResult};

/// Default template for per-species drought mortality maps
pub const DEFAULT_SPECIES_MAP_NAMES: &str = "drought/{species}-mortality-{timestep}.img";

/// Placeholder replaced by the species name
pub const SPECIES_VAR: &str = "species";

/// Placeholder replaced by the timestep
pub const TIMESTEP_VAR: &str = "timestep";

/// Path template for per-species, per-timestep maps
pub struct SpeciesMapNames;

impl SpeciesMapNames {
    /// Reject templates with unknown or unterminated placeholders.
    ///
    /// # Errors
    /// [`DroughtError::UnknownTemplateVariable`] for a name other than
    /// `species` or `timestep`; [`DroughtError::UnterminatedTemplateVariable`]
    /// for a `{` without a closing `}`.
    pub fn check_template(template: &str) -> DroughtResult<()> {
        for variable in variables(template)? {
            if variable != SPECIES_VAR && variable != TIMESTEP_VAR {
                return Err(DroughtError::UnknownTemplateVariable {
                    template: template.to_string(),
                    variable: variable.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Substitute species and timestep into a template.
    ///
    /// # Errors
    /// Same conditions as [`SpeciesMapNames::check_template`].
    pub fn replace(template: &str, species: &str, timestep: u32) -> DroughtResult<String> {
        Self::check_template(template)?;
        Ok(template
            .replace(&format!("{{{SPECIES_VAR}}}"), species)
            .replace(&format!("{{{TIMESTEP_VAR}}}"), &timestep.to_string()))
    }
}

/// Placeholder names in order of appearance
fn variables(template: &str) -> DroughtResult<Vec<&str>> {
    let mut found = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            return Err(DroughtError::UnterminatedTemplateVariable(
                template.to_string(),
            ));
        };
        found.push(&after[..close]);
        rest = &after[close + 1..];
    }
    Ok(found)
}
