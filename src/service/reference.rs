use async_trait::async_trait;
use log::info;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::error::{DeskError, ValidationError};
use crate::storage::entity::area::Model as AreaModel;
use crate::storage::entity::department::Model as DepartmentModel;
use crate::storage::entity::technician::Model as TechnicianModel;
use crate::storage::repository::{
    AreaForm, AreaRepository, DepartmentForm, DepartmentRepository, TechnicianForm,
    TechnicianRepository,
};

pub type Result<T> = std::result::Result<T, DeskError>;

/// Departments, areas and technicians. Deletes are unconditional: an area
/// whose department is gone simply shows without a department name.
#[async_trait]
pub trait ReferenceData: Send + Sync {
    async fn departments(&self) -> Result<Vec<DepartmentModel>>;
    async fn department(&self, id: i32) -> Result<Option<DepartmentModel>>;
    async fn create_department(&self, form: DepartmentForm) -> Result<DepartmentModel>;
    async fn update_department(&self, id: i32, form: DepartmentForm) -> Result<DepartmentModel>;
    async fn delete_department(&self, id: i32) -> Result<bool>;

    async fn areas(&self) -> Result<Vec<AreaModel>>;
    async fn area(&self, id: i32) -> Result<Option<AreaModel>>;
    async fn create_area(&self, form: AreaForm) -> Result<AreaModel>;
    async fn update_area(&self, id: i32, form: AreaForm) -> Result<AreaModel>;
    async fn delete_area(&self, id: i32) -> Result<bool>;

    async fn technicians(&self) -> Result<Vec<TechnicianModel>>;
    async fn active_technicians(&self) -> Result<Vec<TechnicianModel>>;
    async fn technician(&self, id: i32) -> Result<Option<TechnicianModel>>;
    async fn create_technician(&self, form: TechnicianForm) -> Result<TechnicianModel>;
    async fn update_technician(&self, id: i32, form: TechnicianForm) -> Result<TechnicianModel>;
    async fn delete_technician(&self, id: i32) -> Result<bool>;
}

fn required(value: &str, field: &'static str) -> std::result::Result<String, ValidationError> {
    let v = value.trim();
    if v.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(v.to_string())
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct DbReferenceData {
    db: Arc<DatabaseConnection>,
}

impl DbReferenceData {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn department_form(form: DepartmentForm) -> std::result::Result<DepartmentForm, ValidationError> {
        Ok(DepartmentForm {
            name: required(&form.name, "nama departemen")?,
            description: trimmed(form.description),
        })
    }

    async fn area_fields(&self, form: AreaForm) -> Result<(String, String, i32)> {
        let name = required(&form.name, "nama area")?;
        let code = required(&form.code, "kode area")?;
        let department_id = form
            .department_id
            .ok_or(ValidationError::MissingDepartment)?;
        if DepartmentRepository::find(&self.db, department_id).await?.is_none() {
            return Err(ValidationError::UnknownDepartment(department_id).into());
        }
        Ok((name, code, department_id))
    }

    fn technician_form(form: TechnicianForm) -> std::result::Result<TechnicianForm, ValidationError> {
        Ok(TechnicianForm {
            name: required(&form.name, "nama teknisi")?,
            phone: required(&form.phone, "nomor telepon")?,
            email: trimmed(form.email),
            is_active: form.is_active,
        })
    }
}

#[async_trait]
impl ReferenceData for DbReferenceData {
    async fn departments(&self) -> Result<Vec<DepartmentModel>> {
        Ok(DepartmentRepository::list(&self.db).await?)
    }

    async fn department(&self, id: i32) -> Result<Option<DepartmentModel>> {
        Ok(DepartmentRepository::find(&self.db, id).await?)
    }

    async fn create_department(&self, form: DepartmentForm) -> Result<DepartmentModel> {
        let form = Self::department_form(form)?;
        let dept = DepartmentRepository::create(self.db.as_ref(), form).await?;
        info!("Department #{} created: {}", dept.id, dept.name);
        Ok(dept)
    }

    async fn update_department(&self, id: i32, form: DepartmentForm) -> Result<DepartmentModel> {
        let form = Self::department_form(form)?;
        Ok(DepartmentRepository::update(&self.db, id, form).await?)
    }

    async fn delete_department(&self, id: i32) -> Result<bool> {
        let rows = DepartmentRepository::delete(&self.db, id).await?;
        info!("Department #{} delete, rows affected: {}", id, rows);
        Ok(rows > 0)
    }

    async fn areas(&self) -> Result<Vec<AreaModel>> {
        Ok(AreaRepository::list(&self.db).await?)
    }

    async fn area(&self, id: i32) -> Result<Option<AreaModel>> {
        Ok(AreaRepository::find(&self.db, id).await?)
    }

    async fn create_area(&self, form: AreaForm) -> Result<AreaModel> {
        let (name, code, department_id) = self.area_fields(form).await?;
        let area = AreaRepository::create(self.db.as_ref(), name, code, department_id).await?;
        info!("Area #{} created under department #{}", area.id, department_id);
        Ok(area)
    }

    async fn update_area(&self, id: i32, form: AreaForm) -> Result<AreaModel> {
        let (name, code, department_id) = self.area_fields(form).await?;
        Ok(AreaRepository::update(&self.db, id, name, code, department_id).await?)
    }

    async fn delete_area(&self, id: i32) -> Result<bool> {
        Ok(AreaRepository::delete(&self.db, id).await? > 0)
    }

    async fn technicians(&self) -> Result<Vec<TechnicianModel>> {
        Ok(TechnicianRepository::list(&self.db).await?)
    }

    async fn active_technicians(&self) -> Result<Vec<TechnicianModel>> {
        Ok(TechnicianRepository::active(&self.db).await?)
    }

    async fn technician(&self, id: i32) -> Result<Option<TechnicianModel>> {
        Ok(TechnicianRepository::find(&self.db, id).await?)
    }

    async fn create_technician(&self, form: TechnicianForm) -> Result<TechnicianModel> {
        let form = Self::technician_form(form)?;
        let tech = TechnicianRepository::create(&self.db, form).await?;
        info!("Technician #{} created: {}", tech.id, tech.name);
        Ok(tech)
    }

    async fn update_technician(&self, id: i32, form: TechnicianForm) -> Result<TechnicianModel> {
        let form = Self::technician_form(form)?;
        Ok(TechnicianRepository::update(&self.db, id, form).await?)
    }

    async fn delete_technician(&self, id: i32) -> Result<bool> {
        Ok(TechnicianRepository::delete(&self.db, id).await? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::connection::test_connection;

    #[tokio::test]
    async fn department_requires_a_name() {
        let (_dir, db) = test_connection().await;
        let refs = DbReferenceData::new(Arc::new(db));

        let err = refs
            .create_department(DepartmentForm {
                name: "  ".into(),
                description: None,
            })
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let dept = refs
            .create_department(DepartmentForm {
                name: " MAINTENANCE ".into(),
                description: Some("".into()),
            })
            .await
            .unwrap();
        assert_eq!(dept.name, "MAINTENANCE");
        assert_eq!(dept.description, None);
    }

    #[tokio::test]
    async fn area_must_point_at_an_existing_department() {
        let (_dir, db) = test_connection().await;
        let refs = DbReferenceData::new(Arc::new(db));

        let err = refs
            .create_area(AreaForm {
                name: "Workshop".into(),
                code: "MT-01".into(),
                department_id: Some(99),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeskError::Validation(ValidationError::UnknownDepartment(99))
        ));

        let dept = refs
            .create_department(DepartmentForm {
                name: "MAINTENANCE".into(),
                description: None,
            })
            .await
            .unwrap();
        let area = refs
            .create_area(AreaForm {
                name: "Workshop".into(),
                code: "MT-01".into(),
                department_id: Some(dept.id),
            })
            .await
            .unwrap();
        assert_eq!(refs.areas().await.unwrap(), vec![area.clone()]);

        // no cascade: the area outlives its department
        assert!(refs.delete_department(dept.id).await.unwrap());
        assert_eq!(refs.areas().await.unwrap().len(), 1);
        assert!(!refs.delete_department(dept.id).await.unwrap());
    }

    #[tokio::test]
    async fn inactive_technicians_are_not_offered() {
        let (_dir, db) = test_connection().await;
        let refs = DbReferenceData::new(Arc::new(db));

        let andi = refs
            .create_technician(TechnicianForm {
                name: "Andi".into(),
                phone: "0812".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        refs.create_technician(TechnicianForm {
            name: "Citra".into(),
            phone: "0813".into(),
            email: Some("citra@plant.local".into()),
            is_active: false,
        })
        .await
        .unwrap();

        assert!(refs
            .create_technician(TechnicianForm {
                name: "Dodi".into(),
                ..Default::default()
            })
            .await
            .unwrap_err()
            .is_validation());

        let active = refs.active_technicians().await.unwrap();
        assert_eq!(active.iter().map(|t| t.id).collect::<Vec<_>>(), vec![andi.id]);
        assert_eq!(refs.technicians().await.unwrap().len(), 2);

        let mut form = TechnicianForm::from(&andi);
        form.is_active = false;
        let updated = refs.update_technician(andi.id, form).await.unwrap();
        assert!(!updated.is_active);
        assert!(refs.active_technicians().await.unwrap().is_empty());
    }
}
