//! Client and product records consumed by the status engine.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::types::{BranchId, ClientId, ClientName, OrganizationId, ProductId};

/// A pension-loan client as seen by the status engine.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Client {
    pub id: ClientId,
    pub product_id: ProductId,
    pub branch_id: BranchId,
    pub full_name: ClientName,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Loan product; its organization owns every client sold the product.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub organization_id: OrganizationId,
    pub name: String,
}
