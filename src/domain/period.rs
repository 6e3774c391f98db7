//! Reporting periods used to key client statuses.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::types::TypeConstraintError;

/// Earliest reporting year accepted.
pub const MIN_PERIOD_YEAR: i32 = 1970;
/// Latest reporting year accepted.
pub const MAX_PERIOD_YEAR: i32 = 2100;

/// Granularity of a reporting period.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Monthly,
    Quarterly,
}

impl PeriodType {
    pub const fn as_str(self) -> &'static str {
        match self {
            PeriodType::Monthly => "monthly",
            PeriodType::Quarterly => "quarterly",
        }
    }
}

impl Display for PeriodType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodType {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(PeriodType::Monthly),
            "quarterly" => Ok(PeriodType::Quarterly),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown period type `{other}`"
            ))),
        }
    }
}

/// Identifies one reporting period: a month or a quarter of a given year.
///
/// The month/quarter exclusivity lives in the variants, so a key can never
/// carry both or neither.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "period_type", rename_all = "lowercase")]
pub enum PeriodKey {
    Monthly { year: i32, month: i32 },
    Quarterly { year: i32, quarter: i32 },
}

fn check_year(year: i32) -> Result<(), TypeConstraintError> {
    if (MIN_PERIOD_YEAR..=MAX_PERIOD_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(TypeConstraintError::InvalidValue(format!(
            "period year {year} is outside {MIN_PERIOD_YEAR}..={MAX_PERIOD_YEAR}"
        )))
    }
}

impl PeriodKey {
    pub fn monthly(year: i32, month: i32) -> Result<Self, TypeConstraintError> {
        check_year(year)?;
        if !(1..=12).contains(&month) {
            return Err(TypeConstraintError::InvalidValue(format!(
                "period month {month} is outside 1..=12"
            )));
        }
        Ok(PeriodKey::Monthly { year, month })
    }

    pub fn quarterly(year: i32, quarter: i32) -> Result<Self, TypeConstraintError> {
        check_year(year)?;
        if !(1..=4).contains(&quarter) {
            return Err(TypeConstraintError::InvalidValue(format!(
                "period quarter {quarter} is outside 1..=4"
            )));
        }
        Ok(PeriodKey::Quarterly { year, quarter })
    }

    /// Builds a key from loose column/query values.
    ///
    /// A monthly key requires `month` and rejects `quarter`; a quarterly key
    /// requires `quarter` and rejects `month`.
    pub fn from_parts(
        period_type: PeriodType,
        year: i32,
        month: Option<i32>,
        quarter: Option<i32>,
    ) -> Result<Self, TypeConstraintError> {
        match (period_type, month, quarter) {
            (PeriodType::Monthly, Some(month), None) => Self::monthly(year, month),
            (PeriodType::Quarterly, None, Some(quarter)) => Self::quarterly(year, quarter),
            (PeriodType::Monthly, _, _) => Err(TypeConstraintError::InvalidValue(
                "monthly period requires a month and no quarter".to_string(),
            )),
            (PeriodType::Quarterly, _, _) => Err(TypeConstraintError::InvalidValue(
                "quarterly period requires a quarter and no month".to_string(),
            )),
        }
    }

    pub const fn period_type(&self) -> PeriodType {
        match self {
            PeriodKey::Monthly { .. } => PeriodType::Monthly,
            PeriodKey::Quarterly { .. } => PeriodType::Quarterly,
        }
    }

    pub const fn year(&self) -> i32 {
        match self {
            PeriodKey::Monthly { year, .. } | PeriodKey::Quarterly { year, .. } => *year,
        }
    }

    pub const fn month(&self) -> Option<i32> {
        match self {
            PeriodKey::Monthly { month, .. } => Some(*month),
            PeriodKey::Quarterly { .. } => None,
        }
    }

    pub const fn quarter(&self) -> Option<i32> {
        match self {
            PeriodKey::Monthly { .. } => None,
            PeriodKey::Quarterly { quarter, .. } => Some(*quarter),
        }
    }
}

impl Display for PeriodKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PeriodKey::Monthly { year, month } => write!(f, "{year}-{month:02}"),
            PeriodKey::Quarterly { year, quarter } => write!(f, "{year}-Q{quarter}"),
        }
    }
}
