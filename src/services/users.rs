//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    auth::{Claims, Role, TokenCodec},
    error::{AppError, AppResult, FieldErrors},
    models::{Listing, Loan, NewUser, PageQuery, User, UserPayload},
    repository::{loan_books, loans, users, Repository},
    services::cache::ResponseCache,
};

pub const RESOURCE: &str = "users";

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    tokens: TokenCodec,
    cache: ResponseCache,
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("User with id {} not found", id))
}

impl UsersService {
    pub fn new(repository: Repository, tokens: TokenCodec, cache: ResponseCache) -> Self {
        Self {
            repository,
            tokens,
            cache,
        }
    }

    /// Authenticate by email and return a bearer token
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let mut conn = self.repository.acquire().await?;
        let user = users::get_by_email(&mut conn, email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;
        drop(conn);

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication("Invalid email or password".to_string()));
        }

        let token = self.tokens.encode(user.id, user.role)?;
        tracing::info!(user_id = user.id, "user logged in");
        Ok((token, user))
    }

    pub async fn list(&self, query: &PageQuery) -> AppResult<Listing<User>> {
        let window = query.resolve()?;
        let mut conn = self.repository.acquire().await?;
        let items = users::list(&mut conn, window.as_ref()).await?;
        match window {
            None => Ok(Listing::All(items)),
            Some(window) => {
                let total = users::count(&mut conn).await?;
                Ok(Listing::page(items, total, window))
            }
        }
    }

    pub async fn get(&self, id: i64) -> AppResult<User> {
        let mut conn = self.repository.acquire().await?;
        users::get_by_id(&mut conn, id).await?.ok_or_else(|| not_found(id))
    }

    pub async fn ensure_exists(&self, id: i64) -> AppResult<()> {
        let mut conn = self.repository.acquire().await?;
        if users::exists(&mut conn, id).await? {
            Ok(())
        } else {
            Err(not_found(id))
        }
    }

    /// Loans owned by the user
    pub async fn loans(&self, id: i64) -> AppResult<Vec<Loan>> {
        let mut conn = self.repository.acquire().await?;
        if !users::exists(&mut conn, id).await? {
            return Err(not_found(id));
        }
        let rows = loans::list_for_user(&mut conn, id).await?;
        let mut books = loan_books::book_ids_for_user(&mut conn, id).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let book_ids = books.remove(&row.id).unwrap_or_default();
                Loan::from_row(row, book_ids)
            })
            .collect())
    }

    /// Public registration; only an admin caller may grant the admin role
    pub async fn register(&self, caller: Option<&Claims>, payload: UserPayload) -> AppResult<User> {
        let record = payload.into_record()?;
        let caller_is_admin = caller.is_some_and(Claims::is_admin);
        let role = match record.role {
            Some(Role::Admin) if !caller_is_admin => {
                return Err(AppError::Authorization(
                    "Only administrators may create admin accounts".to_string(),
                ));
            }
            Some(role) => role,
            None => Role::User,
        };
        self.provision(record, role).await
    }

    /// Create a user with an explicit role, bypassing caller checks
    pub async fn provision(&self, record: NewUser, role: Role) -> AppResult<User> {
        let password_hash = self.hash_password(&record.password)?;

        let mut tx = self.repository.begin().await?;
        self.check_unique(&mut *tx, &record, None).await?;
        let user = users::insert(&mut *tx, &record, &password_hash, role).await?;
        tx.commit().await?;

        tracing::info!(user_id = user.id, role = %role, "user created");
        self.cache.invalidate(RESOURCE).await;
        Ok(user)
    }

    /// Full replacement; a non-admin may not change their own role
    pub async fn update(&self, caller: &Claims, id: i64, payload: UserPayload) -> AppResult<User> {
        let record = payload.into_record()?;
        let password_hash = self.hash_password(&record.password)?;

        let mut tx = self.repository.begin().await?;
        let existing = users::get_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| not_found(id))?;

        let role = match record.role {
            Some(role) if role != existing.role && !caller.is_admin() => {
                return Err(AppError::Authorization(
                    "Only administrators may change roles".to_string(),
                ));
            }
            Some(role) => role,
            None => existing.role,
        };

        self.check_unique(&mut *tx, &record, Some(id)).await?;
        let user = users::update(&mut *tx, id, &record, &password_hash, role)
            .await?
            .ok_or_else(|| not_found(id))?;
        tx.commit().await?;

        tracing::info!(user_id = id, "user updated");
        self.cache.invalidate(RESOURCE).await;
        Ok(user)
    }

    /// Refuses to delete a user that still owns loans or orders
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tx = self.repository.begin().await?;
        if !users::exists(&mut *tx, id).await? {
            return Err(not_found(id));
        }
        if users::is_referenced(&mut *tx, id).await? {
            return Err(AppError::Conflict(format!(
                "User {} still has loans or orders",
                id
            )));
        }
        users::delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(user_id = id, "user deleted");
        self.cache.invalidate(RESOURCE).await;
        Ok(())
    }

    async fn check_unique(
        &self,
        conn: &mut sqlx::SqliteConnection,
        record: &NewUser,
        exclude_id: Option<i64>,
    ) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        if users::username_exists(conn, &record.username, exclude_id).await? {
            errors.add("username", "Username is already taken.");
        }
        if users::email_exists(conn, &record.email, exclude_id).await? {
            errors.add("email", "Email is already registered.");
        }
        errors.into_result()
    }

    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(&user.password)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}
