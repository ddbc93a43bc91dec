use crate::app_state::AppEvent;
use crate::commands::Request;
use crate::domain::qr::TicketCode;
use crate::error::DeskError;
use crate::service::Services;
use log::error;
use tokio::sync::mpsc;

type EventTx = mpsc::UnboundedSender<AppEvent>;

/// Logs the detail of a failure and hands the UI the notice it may show.
fn report_failure(tx: &EventTx, action: &str, err: &DeskError) -> String {
    if err.is_validation() {
        log::warn!("{} rejected: {}", action, err);
    } else {
        error!("{} failed: {:?}", action, err);
    }
    let notice = err.user_notice(action);
    let _ = tx.send(AppEvent::Error(notice.clone()));
    notice
}

pub async fn refresh_reference(services: &Services, tx: &EventTx) {
    let refs = &services.reference;
    match futures::try_join!(refs.departments(), refs.areas(), refs.technicians()) {
        Ok((departments, areas, technicians)) => {
            let _ = tx.send(AppEvent::Reference {
                departments,
                areas,
                technicians,
            });
        }
        Err(e) => {
            report_failure(tx, "memuat data master", &e);
        }
    }
}

pub async fn handle_request(services: &Services, req: Request, tx: &EventTx) {
    match req {
        Request::LoadReference => refresh_reference(services, tx).await,
        Request::Submit(form) => match services.submission.submit(&form).await {
            Ok(id) => {
                let _ = tx.send(AppEvent::Submitted(id.into_string()));
            }
            Err(e) => {
                let notice = report_failure(tx, "mengirim tiket", &e);
                let _ = tx.send(AppEvent::SubmitFailed(notice));
            }
        },
        Request::Track(query) => match services.lookup.find(&query).await {
            Ok(found) => {
                let _ = tx.send(AppEvent::TrackResult { query, found });
            }
            Err(e) => {
                report_failure(tx, "mencari tiket", &e);
                let _ = tx.send(AppEvent::TrackFailed);
            }
        },
        Request::ListTickets(filter) => match services.admin.list(&filter).await {
            Ok(page) => {
                let _ = tx.send(AppEvent::Tickets(page));
            }
            Err(e) => {
                report_failure(tx, "memuat daftar tiket", &e);
            }
        },
        Request::OpenTicket(id) => {
            let opened = futures::try_join!(
                services.admin.open(&id),
                services.admin.active_technicians()
            );
            match opened {
                Ok((view, technicians)) => {
                    let _ = tx.send(AppEvent::TicketOpened { view, technicians });
                }
                Err(e) => {
                    report_failure(tx, "membuka tiket", &e);
                }
            }
        }
        Request::UpdateTicket { id, draft } => match services.admin.update(&id, &draft).await {
            Ok(view) => {
                let _ = tx.send(AppEvent::TicketSaved(view));
            }
            Err(e) => {
                let notice = report_failure(tx, "menyimpan tiket", &e);
                let _ = tx.send(AppEvent::SaveFailed(notice));
            }
        },
        Request::AttachAfterPhotos { id, files } => {
            match services.admin.attach_after_photos(&id, &files).await {
                Ok(photos) => {
                    let _ = tx.send(AppEvent::AfterPhotos { id, photos });
                }
                Err(e) => {
                    report_failure(tx, "mengunggah foto", &e);
                }
            }
        }
        Request::SaveDepartment { id, form } => {
            let res = match id {
                Some(id) => services.reference.update_department(id, form).await,
                None => services.reference.create_department(form).await,
            };
            match res {
                Ok(dept) => {
                    let _ = tx.send(AppEvent::DepartmentSaved(dept));
                }
                Err(e) => {
                    report_failure(tx, "menyimpan departemen", &e);
                }
            }
        }
        Request::DeleteDepartment(id) => match services.reference.delete_department(id).await {
            Ok(true) => {
                let _ = tx.send(AppEvent::DepartmentDeleted(id));
            }
            Ok(false) => {
                let _ = tx.send(AppEvent::Error(format!("Departemen #{} tidak ditemukan", id)));
            }
            Err(e) => {
                report_failure(tx, "menghapus departemen", &e);
            }
        },
        Request::SaveArea { id, form } => {
            let res = match id {
                Some(id) => services.reference.update_area(id, form).await,
                None => services.reference.create_area(form).await,
            };
            match res {
                Ok(area) => {
                    let _ = tx.send(AppEvent::AreaSaved(area));
                }
                Err(e) => {
                    report_failure(tx, "menyimpan area", &e);
                }
            }
        }
        Request::DeleteArea(id) => match services.reference.delete_area(id).await {
            Ok(true) => {
                let _ = tx.send(AppEvent::AreaDeleted(id));
            }
            Ok(false) => {
                let _ = tx.send(AppEvent::Error(format!("Area #{} tidak ditemukan", id)));
            }
            Err(e) => {
                report_failure(tx, "menghapus area", &e);
            }
        },
        Request::SaveTechnician { id, form } => {
            let res = match id {
                Some(id) => services.reference.update_technician(id, form).await,
                None => services.reference.create_technician(form).await,
            };
            match res {
                Ok(tech) => {
                    let _ = tx.send(AppEvent::TechnicianSaved(tech));
                }
                Err(e) => {
                    report_failure(tx, "menyimpan teknisi", &e);
                }
            }
        }
        Request::DeleteTechnician(id) => match services.reference.delete_technician(id).await {
            Ok(true) => {
                let _ = tx.send(AppEvent::TechnicianDeleted(id));
            }
            Ok(false) => {
                let _ = tx.send(AppEvent::Error(format!("Teknisi #{} tidak ditemukan", id)));
            }
            Err(e) => {
                report_failure(tx, "menghapus teknisi", &e);
            }
        },
        Request::Dashboard => match services.report.dashboard().await {
            Ok(stats) => {
                let _ = tx.send(AppEvent::Dashboard(Box::new(stats)));
            }
            Err(e) => {
                report_failure(tx, "memuat dashboard", &e);
            }
        },
        Request::Report {
            request,
            format,
            date,
        } => {
            let written = match services.report.build(request).await {
                Ok(report) => services.report.export(&report, format, date).await,
                Err(e) => Err(e),
            };
            match written {
                Ok(path) => {
                    let _ = tx.send(AppEvent::Message(format!(
                        "Laporan berhasil disimpan: {}",
                        path.display()
                    )));
                }
                Err(e) => {
                    report_failure(tx, "membuat laporan", &e);
                }
            }
        }
        Request::ExportCode(ticket) => {
            let code = TicketCode::for_ticket(&ticket);
            match code.save_svg(services.report.report_dir()).await {
                Ok(path) => {
                    let _ = tx.send(AppEvent::Message(format!(
                        "Kode tiket disimpan: {}",
                        path.display()
                    )));
                }
                Err(e) => {
                    report_failure(tx, "menyimpan kode tiket", &DeskError::Io(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::domain::form::SubmissionForm;
    use crate::domain::ticket_id::TicketId;
    use crate::domain::vocab::{Priority, RequestType, TicketStatus};
    use crate::storage::connection::test_connection;
    use crate::storage::seed::seed_reference_data;
    use std::sync::Arc;

    async fn services() -> (tempfile::TempDir, Services) {
        let (dir, db) = test_connection().await;
        seed_reference_data(&db).await.unwrap();
        let cfg = AppConfig {
            attachment_dir: dir.path().join("attachments"),
            report_dir: dir.path().join("reports"),
            ..AppConfig::default()
        };
        (dir, Services::new(Arc::new(db), &cfg))
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> Vec<AppEvent> {
        let mut out = Vec::new();
        while let Ok(evt) = rx.try_recv() {
            out.push(evt);
        }
        out
    }

    #[tokio::test]
    async fn submit_then_track() {
        let (_dir, services) = services().await;
        let (tx, mut rx) = mpsc::unbounded_channel();

        handle_request(&services, Request::LoadReference, &tx).await;
        let departments = match drain(&mut rx).pop() {
            Some(AppEvent::Reference { departments, .. }) => departments,
            other => panic!("unexpected {:?}", other),
        };
        let maintenance = departments.iter().find(|d| d.name == "MAINTENANCE").unwrap();

        let form = SubmissionForm {
            request_type: Some(RequestType::Repair),
            requester_name: "Budi".into(),
            department_id: Some(maintenance.id),
            title: "Belt conveyor aus".into(),
            ..Default::default()
        };
        handle_request(&services, Request::Submit(form), &tx).await;
        let id = match drain(&mut rx).pop() {
            Some(AppEvent::Submitted(id)) => id,
            other => panic!("unexpected {:?}", other),
        };

        handle_request(&services, Request::Track("CONVEYOR".into()), &tx).await;
        match drain(&mut rx).pop() {
            Some(AppEvent::TrackResult { found: Some(view), .. }) => {
                assert_eq!(view.ticket.id, id);
                assert_eq!(view.department_name.as_deref(), Some("MAINTENANCE"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn submitted_ticket_is_tracked_by_its_id() {
        let (_dir, services) = services().await;
        let (tx, mut rx) = mpsc::unbounded_channel();

        handle_request(&services, Request::LoadReference, &tx).await;
        let (departments, areas) = match drain(&mut rx).pop() {
            Some(AppEvent::Reference {
                departments, areas, ..
            }) => (departments, areas),
            other => panic!("unexpected {:?}", other),
        };
        let maintenance = departments.iter().find(|d| d.name == "MAINTENANCE").unwrap();
        let workshop = areas
            .iter()
            .find(|a| a.department_id == maintenance.id && a.name == "Workshop")
            .unwrap();

        let mut form = SubmissionForm {
            request_type: Some(RequestType::Corrective),
            requester_name: "Budi".into(),
            priority: Some(Priority::High),
            ..Default::default()
        };
        form.select_department(Some(maintenance.id));
        form.select_area(workshop.id, &areas).unwrap();
        handle_request(&services, Request::Submit(form), &tx).await;
        let id = match drain(&mut rx).pop() {
            Some(AppEvent::Submitted(id)) => id,
            other => panic!("unexpected {:?}", other),
        };
        assert!(TicketId::is_well_formed(&id), "{}", id);

        handle_request(&services, Request::Track(id.clone()), &tx).await;
        match drain(&mut rx).pop() {
            Some(AppEvent::TrackResult { found: Some(view), .. }) => {
                assert_eq!(view.ticket.id, id);
                assert_eq!(view.ticket.status, TicketStatus::Open);
                assert_eq!(view.ticket.request_type, RequestType::Corrective);
                assert_eq!(view.ticket.priority, Some(Priority::High));
                assert_eq!(view.ticket.requester_name, "Budi");
                assert_eq!(view.ticket.assigned_technician_id, None);
                assert_eq!(view.technician_name, None);
                assert_eq!(view.department_name.as_deref(), Some("MAINTENANCE"));
                assert_eq!(view.area_name.as_deref(), Some("Workshop"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn failed_submit_reports_a_notice() {
        let (_dir, services) = services().await;
        let (tx, mut rx) = mpsc::unbounded_channel();

        handle_request(&services, Request::Submit(SubmissionForm::default()), &tx).await;
        let events = drain(&mut rx);
        assert!(matches!(events[0], AppEvent::Error(_)));
        match &events[1] {
            AppEvent::SubmitFailed(notice) => assert_eq!(notice, "jenis permintaan wajib dipilih"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
