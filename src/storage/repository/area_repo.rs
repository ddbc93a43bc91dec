use crate::storage::entity::area::{
    self, ActiveModel as AreaActiveModel, Entity as Area, Model as AreaModel,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaForm {
    pub name: String,
    pub code: String,
    pub department_id: Option<i32>,
}

pub struct AreaRepository;

impl AreaRepository {
    pub async fn list(db: &DatabaseConnection) -> Result<Vec<AreaModel>, sea_orm::DbErr> {
        Area::find()
            .order_by_asc(area::Column::DepartmentId)
            .order_by_asc(area::Column::Name)
            .all(db)
            .await
    }

    pub async fn find(db: &DatabaseConnection, id: i32) -> Result<Option<AreaModel>, sea_orm::DbErr> {
        Area::find_by_id(id).one(db).await
    }

    /// `department_id` must already be checked by the caller.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        name: String,
        code: String,
        department_id: i32,
    ) -> Result<AreaModel, sea_orm::DbErr> {
        let now = Utc::now().timestamp_millis();
        let active_model = AreaActiveModel {
            name: Set(name),
            code: Set(code),
            department_id: Set(department_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        active_model.insert(db).await
    }

    pub async fn update(
        db: &DatabaseConnection,
        id: i32,
        name: String,
        code: String,
        department_id: i32,
    ) -> Result<AreaModel, sea_orm::DbErr> {
        let update = AreaActiveModel {
            id: Set(id),
            name: Set(name),
            code: Set(code),
            department_id: Set(department_id),
            updated_at: Set(Utc::now().timestamp_millis()),
            ..Default::default()
        };
        update.update(db).await
    }

    pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<u64, sea_orm::DbErr> {
        let res = Area::delete_by_id(id).exec(db).await?;
        Ok(res.rows_affected)
    }

    pub async fn names_by_ids(
        db: &DatabaseConnection,
        ids: Vec<i32>,
    ) -> Result<HashMap<i32, String>, sea_orm::DbErr> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = Area::find()
            .filter(area::Column::Id.is_in(ids))
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|a| (a.id, a.name)).collect())
    }
}
