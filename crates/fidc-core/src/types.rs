//! Identifier, descriptor and field-value types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::convert::{brazilian_decimal, normalize_cnpj};

/// A fund identifier (CNPJ), normalized to exactly 14 numeric digits.
///
/// Raw identifiers are stripped of punctuation, truncated to 14 digits and
/// left-padded with zeros on creation, so two snapshots of the same fund always
/// key identically.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FundId(String);

impl FundId {
    /// Creates a normalized fund identifier from any raw CNPJ spelling.
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(normalize_cnpj(raw.as_ref()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for FundId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for FundId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One discoverable document in the remote registry.
///
/// Field names follow the registry's wire format; the descriptor is ephemeral
/// and only lives between discovery and download.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilingDescriptor {
    /// Registry document id, used for download.
    pub id: u64,
    /// Fund legal name as reported by the registry.
    #[serde(rename = "denominacaoSocial", default)]
    pub fund_name: String,
    /// Free-text document type, e.g. "Informe Mensal".
    #[serde(rename = "tipoDocumento", default)]
    pub document_type: String,
    /// Document status flag; `"A"` means active.
    #[serde(rename = "situacaoDocumento", default)]
    pub status: String,
    /// Reference period, `MM/YYYY` or `DD/MM/YYYY`.
    #[serde(rename = "dataReferencia", default)]
    pub reference_period: String,
}

impl FilingDescriptor {
    /// Whether the registry still considers this document current.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case("A")
    }
}

/// Static classification of an extraction path.
///
/// Decided once from the path text, never inferred from the value's runtime
/// representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Identifier, date, code or classification text.
    Text,
    /// Monetary or quantity value in Brazilian number format.
    Numeric,
}

/// Path fragments that mark a field as textual: dates (`DT_`), identifiers
/// (`NR_`), codes (`CD_`) and fund-structure classifications.
const TEXT_MARKERS: &[&str] = &["DT_", "NR_", "CD_", "FDO_", "CLASS_", "COTST_", "TP_"];

impl FieldKind {
    /// Classifies an extraction path by its static prefix table.
    #[must_use]
    pub fn of_path(path: &str) -> Self {
        if TEXT_MARKERS.iter().any(|m| path.contains(m)) {
            Self::Text
        } else {
            Self::Numeric
        }
    }
}

/// A tagged field value, decided at parse time.
///
/// `Text` always originates from filing text and is the only form the
/// locale conversion may be applied to. `Numeric` is already a machine float
/// and passes through every later normalization unchanged; the two can never
/// be confused because the tag is part of the type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Trimmed filing text, `""` when the element was absent.
    Text(String),
    /// Converted numeric value, `0.0` when the element was absent.
    Numeric(f64),
}

impl FieldValue {
    /// Coerces the value to a float for bulk numeric processing.
    ///
    /// Filing text goes through the Brazilian-locale conversion; machine
    /// floats are returned as-is, never re-stringified.
    #[must_use]
    pub fn as_numeric(&self) -> f64 {
        match self {
            Self::Text(s) => brazilian_decimal(s),
            Self::Numeric(v) => *v,
        }
    }

    /// The numeric payload, if this is a numeric field.
    #[must_use]
    pub const fn numeric(&self) -> Option<f64> {
        match self {
            Self::Numeric(v) => Some(*v),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Numeric(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fund_id_normalizes_on_creation() {
        assert_eq!(FundId::new("51.199.121/0001-45").as_str(), "51199121000145");
        assert_eq!(FundId::new("123456").as_str(), "00000000123456");
        assert_eq!(FundId::new("123456"), FundId::new("00000000123456"));
    }

    #[test]
    fn descriptor_active_flag() {
        let mut descriptor = FilingDescriptor {
            id: 1,
            fund_name: "FIDC Teste".into(),
            document_type: "Informe Mensal".into(),
            status: " a ".into(),
            reference_period: "01/2025".into(),
        };
        assert!(descriptor.is_active());
        descriptor.status = "I".into();
        assert!(!descriptor.is_active());
    }

    #[test]
    fn path_classification_is_static() {
        assert_eq!(FieldKind::of_path("NR_CNPJ_FUNDO"), FieldKind::Text);
        assert_eq!(FieldKind::of_path("DT_COMPT"), FieldKind::Text);
        assert_eq!(FieldKind::of_path("TP_CONDOMINIO"), FieldKind::Text);
        assert_eq!(FieldKind::of_path("VL_DISPONIB"), FieldKind::Numeric);
        assert_eq!(
            FieldKind::of_path("CRED_EXISTE/VL_CRED_EXISTE_INAD"),
            FieldKind::Numeric
        );
        // VL_CDB must not trip the CD_ marker
        assert_eq!(FieldKind::of_path("VL_CDB"), FieldKind::Numeric);
    }

    #[test]
    fn machine_float_passes_through_unchanged() {
        // Regression guard: a ratio that is already a float must not be
        // round-tripped through the locale conversion, which would read the
        // exponent's minus sign as locale formatting.
        let ratio = FieldValue::Numeric(3.15e-10);
        assert_eq!(ratio.as_numeric(), 3.15e-10);

        // Whereas genuine filing text is converted.
        let text = FieldValue::Text("1.234,50".into());
        assert_eq!(text.as_numeric(), 1_234.5);
    }
}
