//! SeaORM implementation of CategoryRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::category::{Category, CategoryRepository};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::category;

use super::{db_err, decode_json, encode_json};

fn entity_to_domain(m: category::Model) -> Category {
    Category {
        id: m.id,
        name: m.name,
        description: m.description,
        image: m.image,
        products: decode_json(&m.products),
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

pub struct SeaOrmCategoryRepository {
    db: DatabaseConnection,
}

impl SeaOrmCategoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CategoryRepository for SeaOrmCategoryRepository {
    async fn save(&self, c: Category) -> DomainResult<()> {
        let products = encode_json(&c.products)?;
        let existing = category::Entity::find_by_id(&c.id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        let model = category::ActiveModel {
            id: Set(c.id),
            name: Set(c.name),
            description: Set(c.description),
            image: Set(c.image),
            products: Set(products),
            created_at: Set(c.created_at),
            updated_at: Set(c.updated_at),
        };

        if existing.is_some() {
            model.update(&self.db).await.map_err(db_err)?;
        } else {
            model.insert(&self.db).await.map_err(db_err)?;
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Category>> {
        let model = category::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(entity_to_domain))
    }

    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Category>> {
        let model = category::Entity::find()
            .filter(category::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(entity_to_domain))
    }

    async fn find_by_product(&self, product_id: &str) -> DomainResult<Option<Category>> {
        // Membership lives in a JSON text column, so scan in memory.
        // Category counts stay tiny (tens, not thousands).
        let models = category::Entity::find().all(&self.db).await.map_err(db_err)?;
        Ok(models
            .into_iter()
            .map(entity_to_domain)
            .find(|c| c.contains_product(product_id)))
    }

    async fn find_all(&self) -> DomainResult<Vec<Category>> {
        let models = category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(entity_to_domain).collect())
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        category::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
