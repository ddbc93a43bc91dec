use serde::{Deserialize, Serialize};

use crate::domain::vocab::{Priority, TicketStatus};
use crate::storage::repository::{TicketDto, TicketQuery};

/// Technician selection in the admin editor. `Unassigned` clears the
/// assignment when saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assignment {
    Unassigned,
    Technician(i32),
}

impl Assignment {
    pub fn from_column(id: Option<i32>) -> Self {
        match id {
            Some(id) => Assignment::Technician(id),
            None => Assignment::Unassigned,
        }
    }

    pub fn to_column(self) -> Option<i32> {
        match self {
            Assignment::Unassigned => None,
            Assignment::Technician(id) => Some(id),
        }
    }
}

/// Editable admin state for one ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDraft {
    pub status: TicketStatus,
    pub assignment: Assignment,
    pub admin_notes: String,
    pub after_description: String,
    pub requester_notes: String,
}

impl TicketDraft {
    pub fn from_ticket(ticket: &TicketDto) -> Self {
        Self {
            status: ticket.status,
            assignment: Assignment::from_column(ticket.assigned_technician_id),
            admin_notes: ticket.admin_notes.clone().unwrap_or_default(),
            after_description: ticket.after_description.clone().unwrap_or_default(),
            requester_notes: ticket.requester_notes.clone().unwrap_or_default(),
        }
    }
}

/// Partial patch produced by comparing a draft against the stored ticket.
///
/// `technician` is doubly optional: the outer `None` leaves the column
/// alone, `Some(None)` writes NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketUpdate {
    pub status: Option<TicketStatus>,
    pub technician: Option<Option<i32>>,
    pub admin_notes: Option<String>,
    pub after_description: Option<String>,
    pub requester_notes: Option<String>,
}

fn non_blank(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

impl TicketUpdate {
    /// Text fields are only carried when they hold something other than
    /// whitespace, so an emptied note never erases the stored one.
    pub fn diff(current: &TicketDto, draft: &TicketDraft) -> Self {
        let technician = draft.assignment.to_column();
        Self {
            status: (draft.status != current.status).then_some(draft.status),
            technician: (technician != current.assigned_technician_id).then_some(technician),
            admin_notes: non_blank(&draft.admin_notes),
            after_description: non_blank(&draft.after_description),
            requester_notes: non_blank(&draft.requester_notes),
        }
    }
}

/// Admin list filter. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketFilter {
    pub search: String,
    pub status: Option<TicketStatus>,
    pub priority: Option<Priority>,
    pub page: u64,
}

impl Default for TicketFilter {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: None,
            priority: None,
            page: 1,
        }
    }
}

impl TicketFilter {
    pub fn to_query(&self) -> TicketQuery {
        let search = self.search.trim();
        TicketQuery {
            search: (!search.is_empty()).then(|| search.to_string()),
            status: self.status,
            priority: self.priority,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketPage {
    pub items: Vec<crate::storage::repository::TicketView>,
    pub total: u64,
    pub total_pages: u64,
    pub page: u64,
}

impl TicketPage {
    pub fn pages_for(total: u64, page_size: u64) -> u64 {
        total.div_ceil(page_size.max(1)).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vocab::RequestType;

    fn stored() -> TicketDto {
        TicketDto {
            id: "TPM-20240115-0042".into(),
            title: Some("Belt conveyor aus".into()),
            description: None,
            requester_name: "Budi".into(),
            requester_contact: None,
            department_id: 7,
            area_id: Some(25),
            request_type: RequestType::Repair,
            priority: Some(Priority::High),
            status: TicketStatus::Open,
            assigned_technician_id: Some(3),
            before_photos: vec![],
            after_photos: vec![],
            admin_notes: Some("old".into()),
            after_description: None,
            requester_notes: None,
            created_at: 1_705_300_000_000,
            updated_at: 1_705_300_000_000,
        }
    }

    #[test]
    fn untouched_draft_is_empty() {
        let t = stored();
        let update = TicketUpdate::diff(&t, &TicketDraft::from_ticket(&t));
        // the stored admin note is non-blank, so it is re-sent
        assert_eq!(update.admin_notes.as_deref(), Some("old"));
        assert_eq!(update.status, None);
        assert_eq!(update.technician, None);
    }

    #[test]
    fn status_and_assignment_only_when_changed() {
        let t = stored();
        let mut draft = TicketDraft::from_ticket(&t);
        draft.status = TicketStatus::InProgress;
        draft.assignment = Assignment::Technician(3);
        let update = TicketUpdate::diff(&t, &draft);
        assert_eq!(update.status, Some(TicketStatus::InProgress));
        assert_eq!(update.technician, None);
    }

    #[test]
    fn blank_note_keeps_the_old_one() {
        let t = stored();
        let mut draft = TicketDraft::from_ticket(&t);
        draft.admin_notes = "   ".into();
        draft.after_description = "  ganti belt baru ".into();
        let update = TicketUpdate::diff(&t, &draft);
        assert_eq!(update.admin_notes, None);
        assert_eq!(update.after_description.as_deref(), Some("  ganti belt baru "));
    }

    #[test]
    fn unassigned_clears_the_technician() {
        let t = stored();
        let mut draft = TicketDraft::from_ticket(&t);
        draft.assignment = Assignment::Unassigned;
        draft.admin_notes.clear();
        let update = TicketUpdate::diff(&t, &draft);
        assert_eq!(update.technician, Some(None));
        assert_ne!(update, TicketUpdate::default());
    }

    #[test]
    fn filter_trims_search_and_pages_round_up() {
        let filter = TicketFilter {
            search: "  conveyor ".into(),
            ..Default::default()
        };
        assert_eq!(filter.to_query().search.as_deref(), Some("conveyor"));
        assert_eq!(TicketFilter::default().to_query().search, None);
        assert_eq!(TicketPage::pages_for(0, 10), 1);
        assert_eq!(TicketPage::pages_for(21, 10), 3);
    }
}
