use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::error::DeskError;
use crate::storage::repository::{TicketRepository, TicketView};

pub struct LookupService {
    db: Arc<DatabaseConnection>,
}

impl LookupService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Blank queries return `Ok(None)` without touching the store.
    pub async fn find(&self, query: &str) -> Result<Option<TicketView>, DeskError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }
        Ok(TicketRepository::search_one(&self.db, query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vocab::RequestType;
    use crate::storage::connection::test_connection;
    use crate::storage::repository::{
        AreaRepository, DepartmentForm, DepartmentRepository, NewTicket,
    };

    async fn seeded() -> (tempfile::TempDir, Arc<DatabaseConnection>) {
        let (dir, db) = test_connection().await;
        let dept = DepartmentRepository::create(
            &db,
            DepartmentForm {
                name: "MAINTENANCE".into(),
                description: None,
            },
        )
        .await
        .unwrap();
        let area = AreaRepository::create(&db, "Workshop".into(), "MT-01".into(), dept.id)
            .await
            .unwrap();
        TicketRepository::insert(
            &db,
            NewTicket {
                id: "TPM-20240115-0042".into(),
                title: Some("Conveyor Belt Repair".into()),
                description: None,
                requester_name: "Budi".into(),
                requester_contact: None,
                department_id: dept.id,
                area_id: Some(area.id),
                request_type: RequestType::Repair,
                priority: None,
                before_photos: vec![],
            },
            1_705_300_000_000,
        )
        .await
        .unwrap();
        (dir, Arc::new(db))
    }

    #[tokio::test]
    async fn matches_id_or_title_ignoring_case() {
        let (_dir, db) = seeded().await;
        let lookup = LookupService::new(db);

        for q in ["20240115", "conveyor", "BELT", "TPM-20240115-0042", "  tpm-2024 "] {
            let view = lookup.find(q).await.unwrap();
            let view = view.unwrap_or_else(|| panic!("no match for {q:?}"));
            assert_eq!(view.ticket.id, "TPM-20240115-0042");
            assert_eq!(view.department_name.as_deref(), Some("MAINTENANCE"));
            assert_eq!(view.area_name.as_deref(), Some("Workshop"));
            assert_eq!(view.technician_name, None);
        }
        assert!(lookup.find("xyz123").await.unwrap().is_none());
    }

    async fn add_ticket(db: &DatabaseConnection, id: &str, title: &str, department_id: i32) {
        TicketRepository::insert(
            db,
            NewTicket {
                id: id.into(),
                title: Some(title.into()),
                description: None,
                requester_name: "Sari".into(),
                requester_contact: None,
                department_id,
                area_id: None,
                request_type: RequestType::Corrective,
                priority: None,
                before_photos: vec![],
            },
            1_705_300_000_000,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn non_ascii_titles_are_found() {
        let (_dir, db) = seeded().await;
        let dept = lookup_dept(&db).await;
        add_ticket(&db, "TPM-20240116-0001", "PERAWATAN MESIN ÉLECTRIQUE", dept).await;
        let lookup = LookupService::new(db);

        for q in ["PERAWATAN MESIN ÉLECTRIQUE", "ÉLECTRIQUE", "mesin Élec"] {
            let view = lookup.find(q).await.unwrap();
            let view = view.unwrap_or_else(|| panic!("no match for {q:?}"));
            assert_eq!(view.ticket.id, "TPM-20240116-0001");
        }
    }

    #[tokio::test]
    async fn wildcards_match_literally() {
        let (_dir, db) = seeded().await;
        let lookup = LookupService::new(db.clone());
        for q in ["_", "c%m", "%", "TPM_2024"] {
            assert!(lookup.find(q).await.unwrap().is_none(), "{q:?} matched");
        }

        let dept = lookup_dept(&db).await;
        add_ticket(&db, "TPM-20240116-0002", "Oli 100% bocor", dept).await;
        let view = lookup.find("100%").await.unwrap().unwrap();
        assert_eq!(view.ticket.id, "TPM-20240116-0002");
    }

    async fn lookup_dept(db: &DatabaseConnection) -> i32 {
        DepartmentRepository::list(db).await.unwrap()[0].id
    }

    #[tokio::test]
    async fn blank_query_is_a_no_op() {
        let (_dir, db) = seeded().await;
        let lookup = LookupService::new(db);
        assert!(lookup.find("").await.unwrap().is_none());
        assert!(lookup.find("   ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleted_department_leaves_name_empty() {
        let (_dir, db) = seeded().await;
        let lookup = LookupService::new(db.clone());
        let view = lookup.find("0042").await.unwrap().unwrap();
        DepartmentRepository::delete(&db, view.ticket.department_id)
            .await
            .unwrap();
        let view = lookup.find("0042").await.unwrap().unwrap();
        assert_eq!(view.department_name, None);
        assert_eq!(view.area_name.as_deref(), Some("Workshop"));
    }
}
