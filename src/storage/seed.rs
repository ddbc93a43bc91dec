use crate::storage::repository::{AreaRepository, DepartmentForm, DepartmentRepository};
use log::info;
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};

/// Default plant departments with their lines/areas.
pub const DEFAULT_DEPARTMENTS: &[(&str, &[&str])] = &[
    ("ACCOUNTING/FINANCE", &["Finance Office", "Accounting Dept", "Treasury", "Admin Office"]),
    ("DEPARTEMEN LAINYA", &["Area Umum", "Kantin", "Parkir", "Security Post"]),
    ("ENGINEERING", &["Design Office", "Testing Lab", "R&D Lab", "Prototype Area"]),
    ("FACTORY INNOVATION & TPM", &["TPM Office", "Kaizen Center", "Training Room", "Analysis Center"]),
    ("HRD&GA", &["HR Office", "Training Center", "GA Office", "Facilities"]),
    ("IT", &["Server Room", "Network Center", "User Support", "Development"]),
    ("MAINTENANCE", &["Workshop", "Spare Parts", "Tool Room", "Utilities"]),
    ("MARKETING", &["Marketing Office", "Customer Service", "Sales Office", "Showroom"]),
    ("PPIC & WAREHOUSE", &["Raw Material", "Finished Goods", "WIP Storage", "Shipping"]),
    ("PRODUKSI SECTION 1", &["Line A1", "Line A2", "Line A3", "QC Area A"]),
    ("PRODUKSI SECTION 2", &["Line B1", "Line B2", "Line B3", "QC Area B"]),
    ("PRODUKSI SMT", &["SMT Line 1", "SMT Line 2", "SMT Line 3", "SMT QC"]),
    ("PURCHASE", &["Procurement Office", "Vendor Area", "Receiving Dock", "Inspection Area"]),
    ("QMR", &["QMR Office", "Document Control", "Audit Room", "Management Review"]),
    ("QUALITY", &["QC Lab", "QA Office", "Inspection Area", "Calibration Room"]),
    ("R&D", &["Research Lab", "Development Center", "Testing Facility", "Innovation Hub"]),
    ("SYSTEM", &["System Office", "Integration Center", "Control Room", "Monitoring Station"]),
];

/// Inserts the default departments and areas into an empty store.
/// Returns `false` when departments already exist and nothing was written.
/// Runs in one transaction: a failed seed leaves the store empty.
pub async fn seed_reference_data(db: &DatabaseConnection) -> Result<bool, DbErr> {
    let txn = db.begin().await?;
    if DepartmentRepository::count(&txn).await? > 0 {
        return Ok(false);
    }

    let mut areas = 0;
    for (d_idx, (name, lines)) in DEFAULT_DEPARTMENTS.iter().enumerate() {
        let dept = DepartmentRepository::create(
            &txn,
            DepartmentForm {
                name: name.to_string(),
                description: None,
            },
        )
        .await?;

        for (a_idx, line) in lines.iter().enumerate() {
            let code = format!("D{:02}-{:02}", d_idx + 1, a_idx + 1);
            AreaRepository::create(&txn, line.to_string(), code, dept.id).await?;
            areas += 1;
        }
    }
    txn.commit().await?;

    info!(
        "Seeded {} departments and {} areas",
        DEFAULT_DEPARTMENTS.len(),
        areas
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::connection::test_connection;
    use sea_orm::{ConnectionTrait, Statement};

    #[tokio::test]
    async fn seeds_once() {
        let (_dir, db) = test_connection().await;

        assert!(seed_reference_data(&db).await.unwrap());
        assert!(!seed_reference_data(&db).await.unwrap());

        let departments = DepartmentRepository::list(&db).await.unwrap();
        assert_eq!(departments.len(), 17);

        let maintenance = departments
            .iter()
            .find(|d| d.name == "MAINTENANCE")
            .unwrap();
        let areas = AreaRepository::list(&db).await.unwrap();
        let mut names: Vec<_> = areas
            .iter()
            .filter(|a| a.department_id == maintenance.id)
            .map(|a| a.name.as_str())
            .collect();
        names.sort();
        assert_eq!(names, ["Spare Parts", "Tool Room", "Utilities", "Workshop"]);
    }

    #[tokio::test]
    async fn failed_seed_writes_nothing() {
        let (_dir, db) = test_connection().await;
        db.execute(Statement::from_string(
            db.get_database_backend(),
            "CREATE TRIGGER reject_last_area BEFORE INSERT ON areas \
             WHEN NEW.code = 'D17-04' BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        ))
        .await
        .unwrap();

        assert!(seed_reference_data(&db).await.is_err());
        assert_eq!(DepartmentRepository::count(&db).await.unwrap(), 0);
        assert!(AreaRepository::list(&db).await.unwrap().is_empty());

        db.execute(Statement::from_string(
            db.get_database_backend(),
            "DROP TRIGGER reject_last_area;",
        ))
        .await
        .unwrap();
        assert!(seed_reference_data(&db).await.unwrap());
        assert_eq!(AreaRepository::list(&db).await.unwrap().len(), 68);
    }
}
