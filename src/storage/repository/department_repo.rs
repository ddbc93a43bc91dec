use crate::storage::entity::department::{
    self, ActiveModel as DepartmentActiveModel, Entity as Department, Model as DepartmentModel,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentForm {
    pub name: String,
    pub description: Option<String>,
}

pub struct DepartmentRepository;

impl DepartmentRepository {
    pub async fn list(db: &DatabaseConnection) -> Result<Vec<DepartmentModel>, sea_orm::DbErr> {
        Department::find()
            .order_by_asc(department::Column::Name)
            .all(db)
            .await
    }

    pub async fn find(
        db: &DatabaseConnection,
        id: i32,
    ) -> Result<Option<DepartmentModel>, sea_orm::DbErr> {
        Department::find_by_id(id).one(db).await
    }

    pub async fn count<C: ConnectionTrait>(db: &C) -> Result<u64, sea_orm::DbErr> {
        Department::find().count(db).await
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        form: DepartmentForm,
    ) -> Result<DepartmentModel, sea_orm::DbErr> {
        let now = Utc::now().timestamp_millis();
        let active_model = DepartmentActiveModel {
            name: Set(form.name),
            description: Set(form.description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        active_model.insert(db).await
    }

    pub async fn update(
        db: &DatabaseConnection,
        id: i32,
        form: DepartmentForm,
    ) -> Result<DepartmentModel, sea_orm::DbErr> {
        let update = DepartmentActiveModel {
            id: Set(id),
            name: Set(form.name),
            description: Set(form.description),
            updated_at: Set(Utc::now().timestamp_millis()),
            ..Default::default()
        };
        update.update(db).await
    }

    pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<u64, sea_orm::DbErr> {
        let res = Department::delete_by_id(id).exec(db).await?;
        Ok(res.rows_affected)
    }

    pub async fn names_by_ids(
        db: &DatabaseConnection,
        ids: Vec<i32>,
    ) -> Result<HashMap<i32, String>, sea_orm::DbErr> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = Department::find()
            .filter(department::Column::Id.is_in(ids))
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|d| (d.id, d.name)).collect())
    }
}
