use crate::error::{Error, Result};
use schemata_datatype::TypeCatalog;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_NAME_LEN: usize = 63;
pub const DEFAULT_DUPLICATE_NAME_SEPARATOR: &str = "_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // Maximum length of a column name in bytes.
    pub max_name_len: usize,
    // Type names that expose valid cast targets of their columns.
    // If absent, all string types do.
    pub cast_analysis_types: Option<Vec<String>>,
    // Joins source name and sequence number of a generated
    // duplicate column name, e.g. mycolumn_1.
    pub duplicate_name_separator: String,
}

impl Default for EngineConfig {
    #[inline]
    fn default() -> Self {
        EngineConfig {
            max_name_len: DEFAULT_MAX_NAME_LEN,
            cast_analysis_types: None,
            duplicate_name_separator: String::from(DEFAULT_DUPLICATE_NAME_SEPARATOR),
        }
    }
}

impl EngineConfig {
    #[inline]
    pub fn from_toml(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    #[inline]
    pub fn max_name_len(mut self, max_name_len: usize) -> Self {
        self.max_name_len = max_name_len;
        self
    }

    #[inline]
    pub fn cast_analysis_types<S: Into<String>>(
        mut self,
        types: impl IntoIterator<Item = S>,
    ) -> Self {
        self.cast_analysis_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    #[inline]
    pub fn duplicate_name_separator(mut self, separator: impl Into<String>) -> Self {
        self.duplicate_name_separator = separator.into();
        self
    }

    /// Build the type catalog this configuration describes.
    #[inline]
    pub fn build_type_catalog(&self) -> Result<TypeCatalog> {
        if self.max_name_len == 0 {
            return Err(Error::InvalidConfig(
                "max_name_len must be positive".to_string(),
            ));
        }
        match &self.cast_analysis_types {
            None => Ok(TypeCatalog::global().clone()),
            Some(names) => TypeCatalog::builtin()
                .with_cast_analysis_names(names.as_slice())
                .map_err(|e| Error::InvalidConfig(e.to_string())),
        }
    }
}
