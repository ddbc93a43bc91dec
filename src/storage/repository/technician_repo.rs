use crate::storage::entity::technician::{
    self, ActiveModel as TechnicianActiveModel, Entity as Technician, Model as TechnicianModel,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicianForm {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub is_active: bool,
}

impl Default for TechnicianForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            phone: String::new(),
            email: None,
            is_active: true,
        }
    }
}

impl From<&TechnicianModel> for TechnicianForm {
    fn from(model: &TechnicianModel) -> Self {
        Self {
            name: model.name.clone(),
            phone: model.phone.clone(),
            email: model.email.clone(),
            is_active: model.is_active,
        }
    }
}

pub struct TechnicianRepository;

impl TechnicianRepository {
    pub async fn list(db: &DatabaseConnection) -> Result<Vec<TechnicianModel>, sea_orm::DbErr> {
        Technician::find()
            .order_by_asc(technician::Column::Name)
            .all(db)
            .await
    }

    pub async fn active(db: &DatabaseConnection) -> Result<Vec<TechnicianModel>, sea_orm::DbErr> {
        Technician::find()
            .filter(technician::Column::IsActive.eq(true))
            .order_by_asc(technician::Column::Name)
            .all(db)
            .await
    }

    pub async fn find(
        db: &DatabaseConnection,
        id: i32,
    ) -> Result<Option<TechnicianModel>, sea_orm::DbErr> {
        Technician::find_by_id(id).one(db).await
    }

    pub async fn create(
        db: &DatabaseConnection,
        form: TechnicianForm,
    ) -> Result<TechnicianModel, sea_orm::DbErr> {
        let now = Utc::now().timestamp_millis();
        let active_model = TechnicianActiveModel {
            name: Set(form.name),
            phone: Set(form.phone),
            email: Set(form.email),
            is_active: Set(form.is_active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        active_model.insert(db).await
    }

    pub async fn update(
        db: &DatabaseConnection,
        id: i32,
        form: TechnicianForm,
    ) -> Result<TechnicianModel, sea_orm::DbErr> {
        let update = TechnicianActiveModel {
            id: Set(id),
            name: Set(form.name),
            phone: Set(form.phone),
            email: Set(form.email),
            is_active: Set(form.is_active),
            updated_at: Set(Utc::now().timestamp_millis()),
            ..Default::default()
        };
        update.update(db).await
    }

    pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<u64, sea_orm::DbErr> {
        let res = Technician::delete_by_id(id).exec(db).await?;
        Ok(res.rows_affected)
    }

    /// Includes inactive technicians so tickets assigned before deactivation
    /// keep their display name.
    pub async fn names_by_ids(
        db: &DatabaseConnection,
        ids: Vec<i32>,
    ) -> Result<HashMap<i32, String>, sea_orm::DbErr> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = Technician::find()
            .filter(technician::Column::Id.is_in(ids))
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|t| (t.id, t.name)).collect())
    }
}
