use crate::domain::upload::{PendingFile, UploadPolicy};
use crate::domain::vocab::{Priority, RequestType};
use crate::error::ValidationError;
use crate::storage::entity::area::Model as AreaModel;
use crate::storage::repository::NewTicket;

/// In-progress submission, edited field by field from the console.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionForm {
    pub request_type: Option<RequestType>,
    pub requester_name: String,
    pub requester_contact: String,
    pub department_id: Option<i32>,
    pub area_id: Option<i32>,
    pub title: String,
    pub description: String,
    pub priority: Option<Priority>,
    pub photos: Vec<PendingFile>,
}

fn optional(text: &str) -> Option<String> {
    let t = text.trim();
    (!t.is_empty()).then(|| t.to_string())
}

impl SubmissionForm {
    /// Changing the department always drops the selected area.
    pub fn select_department(&mut self, department_id: Option<i32>) {
        self.department_id = department_id;
        self.area_id = None;
    }

    pub fn area_options<'a>(&self, areas: &'a [AreaModel]) -> Vec<&'a AreaModel> {
        match self.department_id {
            Some(dept) => areas.iter().filter(|a| a.department_id == dept).collect(),
            None => Vec::new(),
        }
    }

    pub fn select_area(&mut self, area_id: i32, areas: &[AreaModel]) -> Result<(), ValidationError> {
        let dept = self.department_id.ok_or(ValidationError::MissingDepartment)?;
        let area = areas
            .iter()
            .find(|a| a.id == area_id)
            .ok_or(ValidationError::UnknownArea(area_id))?;
        if area.department_id != dept {
            return Err(ValidationError::AreaOutsideDepartment {
                area: area_id,
                department: dept,
            });
        }
        self.area_id = Some(area_id);
        Ok(())
    }

    pub fn add_photo(&mut self, file: PendingFile, policy: &UploadPolicy) -> Result<(), ValidationError> {
        policy.check_batch(self.photos.len(), std::slice::from_ref(&file))?;
        self.photos.push(file);
        Ok(())
    }

    pub fn remove_photo(&mut self, index: usize) -> Option<PendingFile> {
        (index < self.photos.len()).then(|| self.photos.remove(index))
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Only request type, requester name and department are required.
    pub fn validate(&self) -> Result<(RequestType, String, i32), ValidationError> {
        let request_type = self.request_type.ok_or(ValidationError::MissingRequestType)?;
        let name = optional(&self.requester_name).ok_or(ValidationError::MissingRequesterName)?;
        let department_id = self.department_id.ok_or(ValidationError::MissingDepartment)?;
        Ok((request_type, name, department_id))
    }

    pub fn to_new_ticket(
        &self,
        id: String,
        before_photos: Vec<String>,
    ) -> Result<NewTicket, ValidationError> {
        let (request_type, requester_name, department_id) = self.validate()?;
        Ok(NewTicket {
            id,
            title: optional(&self.title),
            description: optional(&self.description),
            requester_name,
            requester_contact: optional(&self.requester_contact),
            department_id,
            area_id: self.area_id,
            request_type,
            priority: self.priority,
            before_photos,
        })
    }
}
