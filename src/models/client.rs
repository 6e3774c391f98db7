use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::client::{Client as DomainClient, Product as DomainProduct};
use crate::domain::types::{
    BranchId, ClientId, ClientName, OrganizationId, ProductId, TypeConstraintError,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::clients)]
/// Diesel model for [`crate::domain::client::Client`].
pub struct Client {
    pub id: i32,
    pub product_id: i32,
    pub branch_id: i32,
    pub full_name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::products)]
/// Diesel model for [`crate::domain::client::Product`].
pub struct Product {
    pub id: i32,
    pub organization_id: i32,
    pub name: String,
}

impl TryFrom<Client> for DomainClient {
    type Error = TypeConstraintError;

    fn try_from(client: Client) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ClientId::try_from(client.id)?,
            product_id: ProductId::try_from(client.product_id)?,
            branch_id: BranchId::try_from(client.branch_id)?,
            full_name: ClientName::new(client.full_name)?,
            created_at: client.created_at,
            updated_at: client.updated_at,
        })
    }
}

impl TryFrom<Product> for DomainProduct {
    type Error = TypeConstraintError;

    fn try_from(product: Product) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProductId::try_from(product.id)?,
            organization_id: OrganizationId::try_from(product.organization_id)?,
            name: product.name,
        })
    }
}
