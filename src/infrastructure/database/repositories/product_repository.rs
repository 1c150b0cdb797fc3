//! SeaORM implementation of ProductRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::product::{Address, Policy, Product, ProductRepository};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::product;

use super::{db_err, decode_json, encode_json};

fn entity_to_domain(m: product::Model) -> Product {
    Product {
        id: m.id,
        name: m.name,
        description: m.description,
        images: decode_json(&m.images),
        features: decode_json(&m.features),
        address: Address {
            country: m.country,
            city: m.city,
            street: m.street,
        },
        map_url: m.map_url,
        map_embed: m.map_embed,
        policies: decode_json::<Vec<Policy>>(&m.policies),
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

pub struct SeaOrmProductRepository {
    db: DatabaseConnection,
}

impl SeaOrmProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductRepository for SeaOrmProductRepository {
    async fn save(&self, p: Product) -> DomainResult<()> {
        let images = encode_json(&p.images)?;
        let features = encode_json(&p.features)?;
        let policies = encode_json(&p.policies)?;

        let existing = product::Entity::find_by_id(&p.id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        let model = product::ActiveModel {
            id: Set(p.id),
            name: Set(p.name),
            description: Set(p.description),
            images: Set(images),
            features: Set(features),
            country: Set(p.address.country),
            city: Set(p.address.city),
            street: Set(p.address.street),
            map_url: Set(p.map_url),
            map_embed: Set(p.map_embed),
            policies: Set(policies),
            created_at: Set(p.created_at),
            updated_at: Set(p.updated_at),
        };

        if existing.is_some() {
            model.update(&self.db).await.map_err(db_err)?;
        } else {
            model.insert(&self.db).await.map_err(db_err)?;
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Product>> {
        let model = product::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(entity_to_domain))
    }

    async fn find_all(&self) -> DomainResult<Vec<Product>> {
        let models = product::Entity::find()
            .order_by_asc(product::Column::Name)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(entity_to_domain).collect())
    }

    async fn find_by_country_city(
        &self,
        country: &str,
        city: &str,
    ) -> DomainResult<Vec<Product>> {
        // SQLite LIKE without wildcards compares case-insensitively
        let models = product::Entity::find()
            .filter(product::Column::Country.like(country))
            .filter(product::Column::City.like(city))
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(entity_to_domain).collect())
    }

    async fn find_all_addresses(&self) -> DomainResult<Vec<Address>> {
        let models = product::Entity::find().all(&self.db).await.map_err(db_err)?;
        let mut addresses: Vec<Address> = Vec::new();
        for m in models {
            let address = Address {
                country: m.country,
                city: m.city,
                street: m.street,
            };
            if !addresses.contains(&address) {
                addresses.push(address);
            }
        }
        Ok(addresses)
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        product::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
