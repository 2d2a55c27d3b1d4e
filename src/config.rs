use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::resolve::{DilutionTarget, DEFAULT_DILUTED_VOLUME_UL, DEFAULT_TOTAL_VOLUME_UL};
use crate::Result;

/// A rung of the calibration ladder: the label a standard carries in the plate layout and the
/// concentration it was prepared at, in mg/mL
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct StandardDefinition {
    pub label: String,
    pub concentration: f64,
}

impl StandardDefinition {
    fn new(label: &str, concentration: f64) -> Self {
        Self {
            label: label.to_owned(),
            concentration,
        }
    }
}

/// Names of the columns in a plate reader export
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ColumnLayout {
    /// Column tagging each well as a standard or a sample
    pub content: String,
    pub sample_name: String,
    /// Blank corrected absorbance, averaged over replicate wells
    pub absorbance: String,
    /// Content tags of unknown samples are this prefix followed by the sample number
    pub sample_prefix: String,
    /// Instrument preamble lines preceding the header row
    pub skip_rows: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            content: "Content".into(),
            sample_name: "Sample Name".into(),
            absorbance: "Average based on Blank corrected (595)".into(),
            sample_prefix: "Sample X".into(),
            skip_rows: 0,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DilutionSettings {
    /// Token in a data file name which is followed by the fold pre-dilution, as in `lysate_1zu10`
    pub file_name_marker: String,
    pub target_diluted_volume_ul: f64,
    pub target_total_volume_ul: f64,
}

impl Default for DilutionSettings {
    fn default() -> Self {
        Self {
            file_name_marker: "zu".into(),
            target_diluted_volume_ul: DEFAULT_DILUTED_VOLUME_UL,
            target_total_volume_ul: DEFAULT_TOTAL_VOLUME_UL,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub standards: Vec<StandardDefinition>,
    pub columns: ColumnLayout,
    pub dilution: DilutionSettings,
}

impl Default for Config {
    /// The five point BSA ladder of the Bradford assay
    fn default() -> Self {
        Self {
            standards: vec![
                StandardDefinition::new("Standard S1", 1.5),
                StandardDefinition::new("Standard S2", 1.0),
                StandardDefinition::new("Standard S3", 0.75),
                StandardDefinition::new("Standard S4", 0.5),
                StandardDefinition::new("Standard S5", 0.25),
            ],
            columns: ColumnLayout::default(),
            dilution: DilutionSettings::default(),
        }
    }
}

impl Config {
    /// Parse a configuration from TOML. Missing keys take their default values.
    ///
    /// # Errors
    /// Returns an error if `contents` is not valid TOML or has fields of the wrong type.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Read a configuration from a TOML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or does not parse.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        log::info!("read configuration from {path:?}");
        Ok(config)
    }

    pub const fn dilution_target(&self) -> DilutionTarget<f64> {
        DilutionTarget {
            target_diluted_volume_ul: self.dilution.target_diluted_volume_ul,
            target_total_volume_ul: self.dilution.target_total_volume_ul,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, StandardDefinition};
    use crate::Result;

    #[test]
    fn empty_configuration_is_the_bradford_default() -> Result<()> {
        assert_eq!(Config::from_toml("")?, Config::default());
        Ok(())
    }

    #[test]
    fn partial_configuration_keeps_remaining_defaults() -> Result<()> {
        let config = Config::from_toml(
            r#"
            [[standards]]
            label = "BSA 2"
            concentration = 2.0

            [[standards]]
            label = "BSA 0"
            concentration = 0.0

            [columns]
            skip_rows = 10

            [dilution]
            target_total_volume_ul = 20.0
            "#,
        )?;

        assert_eq!(
            config.standards,
            vec![
                StandardDefinition::new("BSA 2", 2.0),
                StandardDefinition::new("BSA 0", 0.0),
            ]
        );
        assert_eq!(config.columns.skip_rows, 10);
        assert_eq!(config.columns.content, "Content");
        assert_eq!(config.dilution.file_name_marker, "zu");

        let target = config.dilution_target();
        approx::assert_relative_eq!(target.target_diluted_volume_ul, 10.0);
        approx::assert_relative_eq!(target.target_total_volume_ul, 20.0);
        Ok(())
    }

    #[test]
    fn configuration_round_trips_through_a_file() -> Result<()> {
        let tmp_dir = tempdir::TempDir::new("configuration_round_trips_through_a_file")?;
        let path = tmp_dir.path().join("bradford.toml");
        std::fs::write(&path, toml::to_string(&Config::default())?)?;

        assert_eq!(Config::from_file(&path)?, Config::default());
        Ok(())
    }

    #[test]
    fn malformed_configuration_is_an_error() {
        assert!(Config::from_toml("standards = 3").is_err());
    }
}
