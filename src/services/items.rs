//! Shop item service

use crate::{
    error::{AppError, AppResult, FieldErrors},
    models::{Item, ItemPayload, Listing, PageQuery},
    repository::{items, Repository},
    services::cache::ResponseCache,
};

pub const RESOURCE: &str = "items";

#[derive(Clone)]
pub struct ItemsService {
    repository: Repository,
    cache: ResponseCache,
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Item with id {} not found", id))
}

fn name_taken() -> AppError {
    AppError::InvalidFields(FieldErrors::single(
        "item_name",
        "An item with this name already exists.",
    ))
}

impl ItemsService {
    pub fn new(repository: Repository, cache: ResponseCache) -> Self {
        Self { repository, cache }
    }

    pub async fn list(&self, query: &PageQuery) -> AppResult<Listing<Item>> {
        let window = query.resolve()?;
        let mut conn = self.repository.acquire().await?;
        let rows = items::list(&mut conn, window.as_ref()).await?;
        match window {
            None => Ok(Listing::All(rows)),
            Some(window) => {
                let total = items::count(&mut conn).await?;
                Ok(Listing::page(rows, total, window))
            }
        }
    }

    pub async fn get(&self, id: i64) -> AppResult<Item> {
        let mut conn = self.repository.acquire().await?;
        items::get_by_id(&mut conn, id).await?.ok_or_else(|| not_found(id))
    }

    pub async fn ensure_exists(&self, id: i64) -> AppResult<()> {
        let mut conn = self.repository.acquire().await?;
        if items::exists(&mut conn, id).await? {
            Ok(())
        } else {
            Err(not_found(id))
        }
    }

    pub async fn create(&self, payload: ItemPayload) -> AppResult<Item> {
        let record = payload.into_record()?;

        let mut tx = self.repository.begin().await?;
        if items::name_exists(&mut *tx, &record.item_name, None).await? {
            return Err(name_taken());
        }
        let item = items::insert(&mut *tx, &record).await?;
        tx.commit().await?;

        tracing::info!(item_id = item.id, "item created");
        self.cache.invalidate(RESOURCE).await;
        Ok(item)
    }

    pub async fn update(&self, id: i64, payload: ItemPayload) -> AppResult<Item> {
        let record = payload.into_record()?;

        let mut tx = self.repository.begin().await?;
        if !items::exists(&mut *tx, id).await? {
            return Err(not_found(id));
        }
        if items::name_exists(&mut *tx, &record.item_name, Some(id)).await? {
            return Err(name_taken());
        }
        let item = items::update(&mut *tx, id, &record)
            .await?
            .ok_or_else(|| not_found(id))?;
        tx.commit().await?;

        tracing::info!(item_id = id, "item updated");
        self.cache.invalidate(RESOURCE).await;
        Ok(item)
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tx = self.repository.begin().await?;
        if !items::exists(&mut *tx, id).await? {
            return Err(not_found(id));
        }
        if items::is_referenced(&mut *tx, id).await? {
            return Err(AppError::Conflict(format!("Item {} has been ordered", id)));
        }
        items::delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(item_id = id, "item deleted");
        self.cache.invalidate(RESOURCE).await;
        Ok(())
    }
}
