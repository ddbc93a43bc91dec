use chrono::Utc;
use log::info;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::ticket::{TicketDraft, TicketFilter, TicketPage, TicketUpdate};
use crate::domain::upload::{AttachmentStore, PendingFile, PhotoKind, UploadPolicy};
use crate::error::{DeskError, ValidationError};
use crate::service::reference::ReferenceData;
use crate::storage::entity::technician::Model as TechnicianModel;
use crate::storage::repository::{TicketRepository, TicketView};

pub struct AdminService {
    db: Arc<DatabaseConnection>,
    refs: Arc<dyn ReferenceData>,
    store: AttachmentStore,
    policy: UploadPolicy,
    page_size: u64,
}

impl AdminService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        refs: Arc<dyn ReferenceData>,
        store: AttachmentStore,
        policy: UploadPolicy,
        page_size: u64,
    ) -> Self {
        Self {
            db,
            refs,
            store,
            policy,
            page_size: page_size.max(1),
        }
    }

    pub async fn list(&self, filter: &TicketFilter) -> Result<TicketPage, DeskError> {
        let page = filter.page.max(1);
        let (items, total) =
            TicketRepository::list_page(&self.db, &filter.to_query(), page - 1, self.page_size)
                .await?;
        Ok(TicketPage {
            items,
            total,
            total_pages: TicketPage::pages_for(total, self.page_size),
            page,
        })
    }

    pub async fn open(&self, id: &str) -> Result<TicketView, DeskError> {
        TicketRepository::find_view(&self.db, id)
            .await?
            .ok_or_else(|| DeskError::TicketNotFound(id.to_string()))
    }

    pub async fn active_technicians(&self) -> Result<Vec<TechnicianModel>, DeskError> {
        self.refs.active_technicians().await
    }

    /// Last write wins; there is no version check against concurrent edits.
    pub async fn update(&self, id: &str, draft: &TicketDraft) -> Result<TicketView, DeskError> {
        let current = TicketRepository::find_by_id(&self.db, id)
            .await?
            .ok_or_else(|| DeskError::TicketNotFound(id.to_string()))?;

        let update = TicketUpdate::diff(&current, draft);
        if let Some(Some(tech_id)) = update.technician {
            let usable = self
                .refs
                .technician(tech_id)
                .await?
                .map(|t| t.is_active)
                .unwrap_or(false);
            if !usable {
                return Err(ValidationError::UnknownTechnician(tech_id).into());
            }
        }

        let now = Utc::now().timestamp_millis();
        if !TicketRepository::apply_update(&self.db, id, &update, now).await? {
            return Err(DeskError::TicketNotFound(id.to_string()));
        }
        info!("Ticket {} updated: {:?}", id, update);
        self.open(id).await
    }

    /// Appends after-repair photos. The count limit includes photos already
    /// attached.
    pub async fn attach_after_photos(
        &self,
        id: &str,
        files: &[PendingFile],
    ) -> Result<Vec<String>, DeskError> {
        let current = TicketRepository::find_by_id(&self.db, id)
            .await?
            .ok_or_else(|| DeskError::TicketNotFound(id.to_string()))?;
        self.policy.check_batch(current.after_photos.len(), files)?;

        let added = self
            .store
            .store(id, PhotoKind::After, current.after_photos.len(), files)
            .await?;
        let mut photos = current.after_photos;
        photos.extend(added);

        let now = Utc::now().timestamp_millis();
        if !TicketRepository::set_after_photos(&self.db, id, &photos, now).await? {
            return Err(DeskError::TicketNotFound(id.to_string()));
        }
        Ok(photos)
    }
}
