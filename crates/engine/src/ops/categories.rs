use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Category, ChangeScope, EngineError, ResultEngine, TransactionKind, categories,
    util::{normalize_required_name, require_name_key, require_owner},
};

use super::{Engine, with_tx};

impl Engine {
    /// Categories of the owner, optionally restricted to one kind, by name.
    pub async fn list_categories(
        &self,
        owner_id: &str,
        kind: Option<TransactionKind>,
    ) -> ResultEngine<Vec<Category>> {
        let owner_id = require_owner(owner_id)?;
        let mut query = categories::Entity::find()
            .filter(categories::Column::OwnerId.eq(owner_id))
            .order_by_asc(categories::Column::Kind)
            .order_by_asc(categories::Column::NameNorm);
        if let Some(kind) = kind {
            query = query.filter(categories::Column::Kind.eq(kind.as_str()));
        }
        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }

    /// Register a category name for a kind.
    ///
    /// Names are unique per owner and kind on their normalized key, so
    /// "Café" and "cafe" collide.
    pub async fn create_category(
        &self,
        owner_id: &str,
        kind: TransactionKind,
        name: &str,
    ) -> ResultEngine<Category> {
        let owner_id = require_owner(owner_id)?;
        let name = normalize_required_name(name, "category")?;
        let name_norm = require_name_key(&name, "category")?;
        let category = self.create_category_unit(owner_id, kind, name, name_norm).await?;

        tracing::info!(
            owner_id,
            category_id = %category.id,
            "created {} category {}",
            category.kind,
            category.name
        );
        self.publish(owner_id, &[ChangeScope::Categories]);
        Ok(category)
    }

    async fn create_category_unit(
        &self,
        owner_id: &str,
        kind: TransactionKind,
        name: String,
        name_norm: String,
    ) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            let exists = categories::Entity::find()
                .filter(categories::Column::OwnerId.eq(owner_id))
                .filter(categories::Column::Kind.eq(kind.as_str()))
                .filter(categories::Column::NameNorm.eq(name_norm.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            let category = Category {
                id: Uuid::new_v4(),
                owner_id: owner_id.to_string(),
                kind,
                name,
            };
            categories::ActiveModel::from_category(&category, name_norm)
                .insert(&db_tx)
                .await?;
            Ok(category)
        })
    }

    /// Delete a category. Recorded transactions keep their copied name.
    pub async fn delete_category(&self, owner_id: &str, category_id: Uuid) -> ResultEngine<()> {
        let owner_id = require_owner(owner_id)?;
        let result = categories::Entity::delete_many()
            .filter(categories::Column::Id.eq(category_id))
            .filter(categories::Column::OwnerId.eq(owner_id))
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound("category not exists".to_string()));
        }

        tracing::info!(owner_id, category_id = %category_id, "deleted category");
        self.publish(owner_id, &[ChangeScope::Categories]);
        Ok(())
    }
}
