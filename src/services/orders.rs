//! Order service

use sqlx::SqliteConnection;

use crate::{
    error::{AppError, AppResult, FieldErrors},
    models::{Listing, NewOrder, Order, OrderPayload, PageQuery},
    repository::{items, orders, users, Repository},
    services::cache::ResponseCache,
};

pub const RESOURCE: &str = "orders";

#[derive(Clone)]
pub struct OrdersService {
    repository: Repository,
    cache: ResponseCache,
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Order with id {} not found", id))
}

async fn check_references(conn: &mut SqliteConnection, record: &NewOrder) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    if !users::exists(conn, record.user_id).await? {
        errors.add("user_id", format!("User {} does not exist.", record.user_id));
    }
    if !items::exists(conn, record.item_id).await? {
        errors.add("item_id", format!("Item {} does not exist.", record.item_id));
    }
    errors.into_result()
}

impl OrdersService {
    pub fn new(repository: Repository, cache: ResponseCache) -> Self {
        Self { repository, cache }
    }

    pub async fn list(&self, query: &PageQuery) -> AppResult<Listing<Order>> {
        let window = query.resolve()?;
        let mut conn = self.repository.acquire().await?;
        let rows = orders::list(&mut conn, window.as_ref()).await?;
        match window {
            None => Ok(Listing::All(rows)),
            Some(window) => {
                let total = orders::count(&mut conn).await?;
                Ok(Listing::page(rows, total, window))
            }
        }
    }

    pub async fn get(&self, id: i64) -> AppResult<Order> {
        let mut conn = self.repository.acquire().await?;
        orders::get_by_id(&mut conn, id).await?.ok_or_else(|| not_found(id))
    }

    pub async fn ensure_exists(&self, id: i64) -> AppResult<()> {
        self.get(id).await.map(|_| ())
    }

    pub async fn create(&self, payload: OrderPayload) -> AppResult<Order> {
        let record = payload.into_record()?;

        let mut tx = self.repository.begin().await?;
        check_references(&mut *tx, &record).await?;
        let order = orders::insert(&mut *tx, &record).await?;
        tx.commit().await?;

        tracing::info!(order_id = order.id, user_id = order.user_id, "order created");
        self.cache.invalidate(RESOURCE).await;
        Ok(order)
    }

    pub async fn update(&self, id: i64, payload: OrderPayload) -> AppResult<Order> {
        let record = payload.into_record()?;

        let mut tx = self.repository.begin().await?;
        if orders::get_by_id(&mut *tx, id).await?.is_none() {
            return Err(not_found(id));
        }
        check_references(&mut *tx, &record).await?;
        let order = orders::update(&mut *tx, id, &record)
            .await?
            .ok_or_else(|| not_found(id))?;
        tx.commit().await?;

        tracing::info!(order_id = id, "order updated");
        self.cache.invalidate(RESOURCE).await;
        Ok(order)
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tx = self.repository.begin().await?;
        if !orders::delete(&mut *tx, id).await? {
            return Err(not_found(id));
        }
        tx.commit().await?;

        tracing::info!(order_id = id, "order deleted");
        self.cache.invalidate(RESOURCE).await;
        Ok(())
    }
}
