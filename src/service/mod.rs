pub mod admin;
pub mod lookup;
pub mod reference;
pub mod report;
pub mod submission;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::upload::{AttachmentStore, UploadPolicy};

pub use admin::AdminService;
pub use lookup::LookupService;
pub use reference::{DbReferenceData, ReferenceData};
pub use report::ReportService;
pub use submission::SubmissionService;

/// Everything the background actor needs, wired from one store handle.
pub struct Services {
    pub submission: SubmissionService,
    pub lookup: LookupService,
    pub admin: AdminService,
    pub reference: Arc<dyn ReferenceData>,
    pub report: ReportService,
}

impl Services {
    pub fn new(db: Arc<DatabaseConnection>, cfg: &AppConfig) -> Self {
        let reference: Arc<dyn ReferenceData> = Arc::new(DbReferenceData::new(db.clone()));
        let store = AttachmentStore::new(cfg.attachment_dir.clone());
        let policy = UploadPolicy::from_config(cfg);

        Self {
            submission: SubmissionService::new(
                db.clone(),
                reference.clone(),
                store.clone(),
                policy.clone(),
            ),
            lookup: LookupService::new(db.clone()),
            admin: AdminService::new(db.clone(), reference.clone(), store, policy, cfg.page_size),
            report: ReportService::new(db, cfg.report_dir.clone()),
            reference,
        }
    }
}
