use async_graphql::dataloader::Loader;
use infra::{db::Db, models::RestaurantImageRow, models::RestaurantRow};
use std::{collections::HashMap, future::Future, sync::Arc};
use uuid::Uuid;

// RestaurantLoader - batch load restaurants by ID
#[derive(Clone)]
pub struct RestaurantLoader {
    pool: Db,
}

impl RestaurantLoader {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }
}

impl Loader<Uuid> for RestaurantLoader {
    type Value = RestaurantRow;
    type Error = Arc<sqlx::Error>;

    fn load(
        &self,
        keys: &[Uuid],
    ) -> impl Future<Output = std::result::Result<HashMap<Uuid, Self::Value>, Self::Error>> + Send
    {
        let pool = self.pool.clone();
        let ids: Vec<Uuid> = keys.to_vec();

        async move {
            let rows = infra::repos::restaurants::get_by_ids(&pool, &ids)
                .await
                .map_err(Arc::new)?;

            Ok(rows.into_iter().map(|r| (r.id, r)).collect())
        }
    }
}

// RestaurantImagesLoader - batch load the image lists of many restaurants
#[derive(Clone)]
pub struct RestaurantImagesLoader {
    pool: Db,
}

impl RestaurantImagesLoader {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }
}

impl Loader<Uuid> for RestaurantImagesLoader {
    type Value = Vec<RestaurantImageRow>;
    type Error = Arc<sqlx::Error>;

    fn load(
        &self,
        keys: &[Uuid],
    ) -> impl Future<Output = std::result::Result<HashMap<Uuid, Self::Value>, Self::Error>> + Send
    {
        let pool = self.pool.clone();
        let ids: Vec<Uuid> = keys.to_vec();

        async move {
            let rows = infra::repos::restaurant_images::list_by_restaurants(&pool, &ids)
                .await
                .map_err(Arc::new)?;

            let mut grouped: HashMap<Uuid, Vec<RestaurantImageRow>> = HashMap::new();
            for row in rows {
                grouped.entry(row.restaurant_id).or_default().push(row);
            }
            Ok(grouped)
        }
    }
}
