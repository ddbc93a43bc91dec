use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String, // TPM-YYYYMMDD-NNNN
    #[sea_orm(nullable)]
    pub title: Option<String>,
    #[sea_orm(nullable)]
    pub description: Option<String>,
    pub requester_name: String,
    #[sea_orm(nullable)]
    pub requester_contact: Option<String>,
    pub department_id: i32,
    #[sea_orm(nullable)]
    pub area_id: Option<i32>,
    pub request_type: String, // corrective/repair/procurement/support
    #[sea_orm(nullable)]
    pub priority: Option<String>, // low/medium/high/critical
    pub status: String,           // Open/In Progress/Menunggu Material/Closed/Reject
    #[sea_orm(nullable)]
    pub assigned_technician_id: Option<i32>,

    // JSON arrays of attachment references
    pub before_photos: String,
    pub after_photos: String,

    #[sea_orm(nullable)]
    pub admin_notes: Option<String>,
    #[sea_orm(nullable)]
    pub after_description: Option<String>,
    #[sea_orm(nullable)]
    pub requester_notes: Option<String>,
    pub created_at: i64, // unix millis
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
