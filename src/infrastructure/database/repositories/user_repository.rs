//! SeaORM implementation of UserRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

use crate::domain::user::{User, UserProjection, UserRepository};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::user;

use super::{db_err, decode_json, encode_json};

fn entity_to_domain(m: user::Model) -> User {
    User {
        id: m.id,
        email: m.email,
        first_name: m.first_name,
        last_name: m.last_name,
        credential: m.credential,
        is_admin: m.is_admin,
        is_confirmed: m.is_confirmed,
        wishlist: decode_json(&m.wishlist),
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

fn entity_to_projection(m: user::Model) -> UserProjection {
    UserProjection {
        id: m.id,
        email: m.email,
        first_name: m.first_name,
        last_name: m.last_name,
        is_admin: m.is_admin,
        is_confirmed: m.is_confirmed,
    }
}

pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn save(&self, u: User) -> DomainResult<()> {
        let wishlist = encode_json(&u.wishlist)?;
        let existing = user::Entity::find_by_id(&u.id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        let model = user::ActiveModel {
            id: Set(u.id),
            email: Set(u.email),
            first_name: Set(u.first_name),
            last_name: Set(u.last_name),
            credential: Set(u.credential),
            is_admin: Set(u.is_admin),
            is_confirmed: Set(u.is_confirmed),
            wishlist: Set(wishlist),
            created_at: Set(u.created_at),
            updated_at: Set(u.updated_at),
        };

        if existing.is_some() {
            model.update(&self.db).await.map_err(db_err)?;
        } else {
            model.insert(&self.db).await.map_err(db_err)?;
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(entity_to_domain))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        // emails are stored lowercase, so lowering the input suffices
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email.to_lowercase()))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(entity_to_domain))
    }

    async fn find_all_projected(&self) -> DomainResult<Vec<UserProjection>> {
        let models = user::Entity::find().all(&self.db).await.map_err(db_err)?;
        Ok(models.into_iter().map(entity_to_projection).collect())
    }

    async fn count(&self) -> DomainResult<u64> {
        user::Entity::find().count(&self.db).await.map_err(db_err)
    }
}
