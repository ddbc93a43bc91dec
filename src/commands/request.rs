use chrono::NaiveDate;

use crate::domain::form::SubmissionForm;
use crate::domain::ticket::{TicketDraft, TicketFilter};
use crate::domain::upload::PendingFile;
use crate::service::report::{ExportFormat, ReportRequest};
use crate::storage::repository::{AreaForm, DepartmentForm, TechnicianForm};

/// Work handed from the UI thread to the background actor.
#[derive(Debug, Clone)]
pub enum Request {
    LoadReference,
    Submit(SubmissionForm),
    Track(String),
    ListTickets(TicketFilter),
    OpenTicket(String),
    UpdateTicket {
        id: String,
        draft: TicketDraft,
    },
    AttachAfterPhotos {
        id: String,
        files: Vec<PendingFile>,
    },
    SaveDepartment {
        id: Option<i32>,
        form: DepartmentForm,
    },
    DeleteDepartment(i32),
    SaveArea {
        id: Option<i32>,
        form: AreaForm,
    },
    DeleteArea(i32),
    SaveTechnician {
        id: Option<i32>,
        form: TechnicianForm,
    },
    DeleteTechnician(i32),
    Dashboard,
    Report {
        request: ReportRequest,
        format: ExportFormat,
        date: NaiveDate,
    },
    ExportCode(String),
}
