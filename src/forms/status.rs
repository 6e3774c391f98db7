use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::period::{PeriodKey, PeriodType};
use crate::domain::status::StatusUpdateRequest;
use crate::domain::types::{ClientId, Remarks, StatusReasonId, StatusTypeId};
use crate::forms::FormError;

/// Largest number of items accepted in one bulk request.
pub const MAX_BULK_ITEMS: usize = 100;

fn parse_period(
    period_type: &str,
    year: i32,
    month: Option<i32>,
    quarter: Option<i32>,
) -> Result<PeriodKey, FormError> {
    let period_type = period_type
        .parse::<PeriodType>()
        .map_err(|e| FormError::InvalidPeriod(e.to_string()))?;
    PeriodKey::from_parts(period_type, year, month, quarter)
        .map_err(|e| FormError::InvalidPeriod(e.to_string()))
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
/// Body of a single status change.
pub struct StatusUpdateForm {
    #[validate(range(min = 1))]
    pub client_id: i32,
    pub period_type: String,
    pub year: i32,
    pub month: Option<i32>,
    pub quarter: Option<i32>,
    #[validate(range(min = 1))]
    pub status_type_id: i32,
    pub reason_id: Option<i32>,
    pub remarks: Option<String>,
    #[serde(default)]
    pub has_payment: bool,
}

fn validate_batch_size(updates: &[StatusUpdateForm]) -> Result<(), ValidationError> {
    if (1..=MAX_BULK_ITEMS).contains(&updates.len()) {
        return Ok(());
    }
    let mut err = ValidationError::new("batch_size");
    err.add_param("len".into(), &updates.len());
    err.add_param("max".into(), &MAX_BULK_ITEMS);
    Err(err)
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
/// Body of a bulk status change.
pub struct BulkStatusUpdateForm {
    #[validate(custom(function = "validate_batch_size"))]
    pub updates: Vec<StatusUpdateForm>,
}

/// Well-formed values extracted from a [`StatusUpdateForm`].
#[derive(Debug, Clone)]
pub struct StatusUpdatePayload {
    pub client_id: ClientId,
    pub period: PeriodKey,
    pub status_type_id: StatusTypeId,
    pub reason_id: Option<StatusReasonId>,
    pub remarks: Option<Remarks>,
    pub has_payment: bool,
}

impl TryFrom<StatusUpdateForm> for StatusUpdatePayload {
    type Error = FormError;

    fn try_from(form: StatusUpdateForm) -> Result<Self, Self::Error> {
        form.validate()?;

        Ok(Self {
            client_id: ClientId::new(form.client_id).map_err(|_| FormError::InvalidClientId)?,
            period: parse_period(&form.period_type, form.year, form.month, form.quarter)?,
            status_type_id: StatusTypeId::new(form.status_type_id)
                .map_err(|_| FormError::InvalidStatusTypeId)?,
            reason_id: form
                .reason_id
                .map(StatusReasonId::new)
                .transpose()
                .map_err(|_| FormError::InvalidReasonId)?,
            remarks: Remarks::optional(form.remarks)
                .map_err(|e| FormError::InvalidRemarks(e.to_string()))?,
            has_payment: form.has_payment,
        })
    }
}

impl StatusUpdatePayload {
    pub fn into_domain(self) -> StatusUpdateRequest {
        StatusUpdateRequest {
            client_id: self.client_id,
            period: self.period,
            status_type_id: self.status_type_id,
            reason_id: self.reason_id,
            remarks: self.remarks,
            has_payment: self.has_payment,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
/// Query string naming one period, with an optional page.
pub struct PeriodQuery {
    pub period_type: String,
    pub year: i32,
    pub month: Option<i32>,
    pub quarter: Option<i32>,
    pub page: Option<usize>,
}

impl PeriodQuery {
    pub fn period(&self) -> Result<PeriodKey, FormError> {
        parse_period(&self.period_type, self.year, self.month, self.quarter)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
/// Query string of the history endpoint; the period is optional.
pub struct HistoryQuery {
    pub period_type: Option<String>,
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub quarter: Option<i32>,
    pub page: Option<usize>,
}

impl HistoryQuery {
    pub fn period(&self) -> Result<Option<PeriodKey>, FormError> {
        match (&self.period_type, self.year) {
            (None, None) if self.month.is_none() && self.quarter.is_none() => Ok(None),
            (Some(period_type), Some(year)) => {
                parse_period(period_type, year, self.month, self.quarter).map(Some)
            }
            _ => Err(FormError::InvalidPeriod(
                "period_type and year must be given together".to_string(),
            )),
        }
    }
}
