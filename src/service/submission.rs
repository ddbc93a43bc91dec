use chrono::{NaiveDate, Utc};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::form::SubmissionForm;
use crate::domain::upload::{AttachmentStore, PhotoKind, UploadPolicy};
use crate::domain::TicketId;
use crate::error::{DeskError, ValidationError};
use crate::service::reference::ReferenceData;
use crate::storage::repository::TicketRepository;

const ID_ATTEMPTS: usize = 5;

pub struct SubmissionService {
    db: Arc<DatabaseConnection>,
    refs: Arc<dyn ReferenceData>,
    store: AttachmentStore,
    policy: UploadPolicy,
}

impl SubmissionService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        refs: Arc<dyn ReferenceData>,
        store: AttachmentStore,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            db,
            refs,
            store,
            policy,
        }
    }

    pub async fn submit(&self, form: &SubmissionForm) -> Result<TicketId, DeskError> {
        let mut rng = StdRng::from_entropy();
        self.submit_with(form, Utc::now().date_naive(), &mut rng).await
    }

    /// Nothing is written unless every check passes. The new ticket starts
    /// `Open` with no technician and no notes.
    pub async fn submit_with<R: Rng + Send>(
        &self,
        form: &SubmissionForm,
        date: NaiveDate,
        rng: &mut R,
    ) -> Result<TicketId, DeskError> {
        let (_, _, department_id) = form.validate()?;
        self.check_location(department_id, form.area_id).await?;
        self.policy.check_batch(0, &form.photos)?;

        let id = self.allocate_id(date, rng).await?;
        let photos = self
            .store
            .store(id.as_str(), PhotoKind::Before, 0, &form.photos)
            .await?;

        let new = form.to_new_ticket(id.to_string(), photos)?;
        let now = Utc::now().timestamp_millis();
        if let Err(e) = TicketRepository::insert(&self.db, new, now).await {
            if !form.photos.is_empty() {
                let dir = self.store.root().join(id.as_str());
                if let Err(io) = tokio::fs::remove_dir_all(&dir).await {
                    warn!("Could not clean up {}: {}", dir.display(), io);
                }
            }
            return Err(e.into());
        }

        info!(
            "Ticket {} submitted for department #{} with {} photo(s)",
            id,
            department_id,
            form.photos.len()
        );
        Ok(id)
    }

    async fn check_location(&self, department_id: i32, area_id: Option<i32>) -> Result<(), DeskError> {
        if self.refs.department(department_id).await?.is_none() {
            return Err(ValidationError::UnknownDepartment(department_id).into());
        }
        if let Some(area_id) = area_id {
            let area = self
                .refs
                .area(area_id)
                .await?
                .ok_or(ValidationError::UnknownArea(area_id))?;
            if area.department_id != department_id {
                return Err(ValidationError::AreaOutsideDepartment {
                    area: area_id,
                    department: department_id,
                }
                .into());
            }
        }
        Ok(())
    }

    async fn allocate_id<R: Rng + Send>(
        &self,
        date: NaiveDate,
        rng: &mut R,
    ) -> Result<TicketId, DeskError> {
        for attempt in 1..=ID_ATTEMPTS {
            let id = TicketId::generate(date, rng);
            if !TicketRepository::exists(&self.db, id.as_str()).await? {
                return Ok(id);
            }
            warn!("Ticket id {} already taken (attempt {})", id, attempt);
        }
        Err(DeskError::IdExhausted(ID_ATTEMPTS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::upload::PendingFile;
    use crate::domain::vocab::{Priority, RequestType, TicketStatus};
    use crate::service::reference::DbReferenceData;
    use crate::storage::connection::test_connection;
    use crate::storage::repository::{AreaForm, DepartmentForm, NewTicket};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        files: TempDir,
        db: Arc<DatabaseConnection>,
        service: SubmissionService,
        maintenance: i32,
        workshop: i32,
        line_a1: i32,
    }

    async fn fixture() -> Fixture {
        let (dir, db) = test_connection().await;
        let db = Arc::new(db);
        let refs = Arc::new(DbReferenceData::new(db.clone()));

        let maintenance = refs
            .create_department(DepartmentForm {
                name: "MAINTENANCE".into(),
                description: None,
            })
            .await
            .unwrap()
            .id;
        let produksi = refs
            .create_department(DepartmentForm {
                name: "PRODUKSI SECTION 1".into(),
                description: None,
            })
            .await
            .unwrap()
            .id;
        let workshop = refs
            .create_area(AreaForm {
                name: "Workshop".into(),
                code: "MT-01".into(),
                department_id: Some(maintenance),
            })
            .await
            .unwrap()
            .id;
        let line_a1 = refs
            .create_area(AreaForm {
                name: "Line A1".into(),
                code: "PS1-01".into(),
                department_id: Some(produksi),
            })
            .await
            .unwrap()
            .id;

        let files = tempfile::tempdir().unwrap();
        let service = SubmissionService::new(
            db.clone(),
            refs,
            AttachmentStore::new(files.path().join("attachments")),
            UploadPolicy::default(),
        );
        Fixture {
            _dir: dir,
            files,
            db,
            service,
            maintenance,
            workshop,
            line_a1,
        }
    }

    fn budi_form(department_id: i32, area_id: i32) -> SubmissionForm {
        SubmissionForm {
            request_type: Some(RequestType::Repair),
            requester_name: "Budi".into(),
            requester_contact: "0812-3456".into(),
            department_id: Some(department_id),
            area_id: Some(area_id),
            title: "Belt conveyor aus".into(),
            description: "Belt conveyor line 3 sudah aus".into(),
            priority: Some(Priority::High),
            photos: Vec::new(),
        }
    }

    #[tokio::test]
    async fn submits_an_open_ticket() {
        let fx = fixture().await;
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let mut rng = StdRng::seed_from_u64(11);

        let id = fx
            .service
            .submit_with(&budi_form(fx.maintenance, fx.workshop), date, &mut rng)
            .await
            .unwrap();
        assert!(id.as_str().starts_with("TPM-20240115-"));

        let stored = TicketRepository::find_by_id(&fx.db, id.as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, TicketStatus::Open);
        assert_eq!(stored.assigned_technician_id, None);
        assert_eq!(stored.admin_notes, None);
        assert_eq!(stored.priority, Some(Priority::High));
        assert_eq!(stored.area_id, Some(fx.workshop));
        assert_eq!(stored.created_at, stored.updated_at);
    }

    #[tokio::test]
    async fn invalid_forms_write_nothing() {
        let fx = fixture().await;

        let mut no_name = budi_form(fx.maintenance, fx.workshop);
        no_name.requester_name.clear();
        let err = fx.service.submit(&no_name).await.unwrap_err();
        assert!(matches!(
            err,
            DeskError::Validation(ValidationError::MissingRequesterName)
        ));

        let wrong_area = budi_form(fx.maintenance, fx.line_a1);
        let err = fx.service.submit(&wrong_area).await.unwrap_err();
        assert!(matches!(
            err,
            DeskError::Validation(ValidationError::AreaOutsideDepartment { .. })
        ));

        assert_eq!(TicketRepository::count(&fx.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn only_type_name_and_department_are_required() {
        let fx = fixture().await;
        let form = SubmissionForm {
            request_type: Some(RequestType::Support),
            requester_name: "Sari".into(),
            department_id: Some(fx.maintenance),
            ..Default::default()
        };
        let id = fx.service.submit(&form).await.unwrap();
        let stored = TicketRepository::find_by_id(&fx.db, id.as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.title, None);
        assert_eq!(stored.priority, None);
        assert_eq!(stored.area_id, None);
    }

    #[tokio::test]
    async fn regenerates_on_id_collision() {
        let fx = fixture().await;
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let taken = TicketId::generate(date, &mut StdRng::seed_from_u64(5));
        TicketRepository::insert(
            &fx.db,
            NewTicket {
                id: taken.to_string(),
                title: None,
                description: None,
                requester_name: "Lama".into(),
                requester_contact: None,
                department_id: fx.maintenance,
                area_id: None,
                request_type: RequestType::Support,
                priority: None,
                before_photos: vec![],
            },
            0,
        )
        .await
        .unwrap();

        let id = fx
            .service
            .submit_with(
                &budi_form(fx.maintenance, fx.workshop),
                date,
                &mut StdRng::seed_from_u64(5),
            )
            .await
            .unwrap();
        assert_ne!(id, taken);
        assert_eq!(TicketRepository::count(&fx.db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn before_photos_are_stored_with_the_ticket() {
        let fx = fixture().await;
        let src = fx.files.path().join("belt.jpg");
        std::fs::write(&src, b"jpeg bytes").unwrap();

        let mut form = budi_form(fx.maintenance, fx.workshop);
        form.photos.push(PendingFile::from_path(&src).unwrap());
        let id = fx.service.submit(&form).await.unwrap();

        let stored = TicketRepository::find_by_id(&fx.db, id.as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.before_photos, vec![format!("{}/before-1.jpg", id)]);
        assert!(fx
            .files
            .path()
            .join("attachments")
            .join(&stored.before_photos[0])
            .exists());
    }
}
