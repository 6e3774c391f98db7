use diesel::prelude::*;

use crate::domain::client::{Client, Product};
use crate::domain::types::{ClientId, ProductId};
use crate::models::client::{Client as DbClient, Product as DbProduct};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{ClientReader, DieselRepository};

impl ClientReader for DieselRepository {
    fn get_client_by_id(&self, id: ClientId) -> RepositoryResult<Option<Client>> {
        use crate::schema::clients;

        let mut conn = self.conn()?;
        let db_client = clients::table
            .find(id.get())
            .first::<DbClient>(&mut conn)
            .optional()?;

        db_client
            .map(|c| Client::try_from(c).map_err(RepositoryError::from))
            .transpose()
    }

    fn get_product_by_id(&self, id: ProductId) -> RepositoryResult<Option<Product>> {
        use crate::schema::products;

        let mut conn = self.conn()?;
        let db_product = products::table
            .find(id.get())
            .first::<DbProduct>(&mut conn)
            .optional()?;

        db_product
            .map(|p| Product::try_from(p).map_err(RepositoryError::from))
            .transpose()
    }
}
