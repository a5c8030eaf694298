use crate::{
    auth::{self, AuthService},
    db::DbPool,
    entities::{
        user::{self, ActiveModel as UserActiveModel, Entity as UserEntity, UserRole},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct AssignRoleRequest {
    #[validate(length(min = 1, message = "Role is required"))]
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Service for registration, login and admin customer management.
#[derive(Clone)]
pub struct AccountService {
    db_pool: Arc<DbPool>,
    auth: Arc<AuthService>,
    event_sender: EventSender,
}

impl AccountService {
    pub fn new(db_pool: Arc<DbPool>, auth: Arc<AuthService>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            auth,
            event_sender,
        }
    }

    /// Register a new customer account and issue an access token.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let email = request.email.to_lowercase();

        let existing = UserEntity::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        let password_hash = auth::hash_password(&request.password)
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;

        let now = Utc::now();
        let model = UserActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            email: Set(email),
            password_hash: Set(password_hash),
            phone: Set(request.phone),
            role: Set(UserRole::User),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(user_id = %model.id, "User registered");
        self.event_sender
            .send(Event::UserRegistered { user_id: model.id })
            .await;

        let token = self
            .auth
            .generate_token(model.id, &model.email, model.role)
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;

        Ok(AuthResponse {
            token,
            user: model_to_response(model),
        })
    }

    /// Authenticate by email and password; issue an access token.
    ///
    /// Unknown email and wrong password produce the same error so a caller
    /// cannot probe which addresses hold accounts.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let email = request.email.to_lowercase();

        let user_model = UserEntity::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("Invalid email or password".to_string()))?;

        let valid = auth::verify_password(&request.password, &user_model.password_hash)
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;
        if !valid {
            warn!(user_id = %user_model.id, "Failed login attempt");
            return Err(ServiceError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        let token = self
            .auth
            .generate_token(user_model.id, &user_model.email, user_model.role)
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;

        info!(user_id = %user_model.id, "User logged in");
        Ok(AuthResponse {
            token,
            user: model_to_response(user_model),
        })
    }

    /// Admin: all customer accounts, newest first.
    #[instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<UserResponse>, ServiceError> {
        let db = &*self.db_pool;
        let users = UserEntity::find()
            .order_by_desc(user::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(users.into_iter().map(model_to_response).collect())
    }

    /// Admin: change a customer's role.
    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn assign_role(
        &self,
        user_id: Uuid,
        request: AssignRoleRequest,
    ) -> Result<UserResponse, ServiceError> {
        request.validate()?;

        let role: UserRole = request
            .role
            .parse()
            .map_err(|_| ServiceError::InvalidInput(format!("Unknown role: {}", request.role)))?;

        let db = &*self.db_pool;
        let user_model = UserEntity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))?;

        let mut active: UserActiveModel = user_model.into();
        active.role = Set(role);
        active.updated_at = Set(Utc::now());
        let updated = active.update(db).await?;

        info!(user_id = %user_id, role = ?role, "Role assigned");
        Ok(model_to_response(updated))
    }
}

fn model_to_response(model: user::Model) -> UserResponse {
    UserResponse {
        id: model.id,
        name: model.name,
        email: model.email,
        phone: model.phone,
        role: model.role,
        created_at: model.created_at,
    }
}
