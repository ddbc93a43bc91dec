use crate::auth::AdminGate;
use crate::commands::app_command::HELP;
use crate::commands::{AppCommand, Request};
use crate::domain::form::SubmissionForm;
use crate::domain::qr::TicketCode;
use crate::domain::ticket::{Assignment, TicketDraft, TicketFilter, TicketPage};
use crate::domain::upload::{PendingFile, UploadPolicy};
use crate::service::report::{DashboardStats, ReportRequest};
use crate::storage::entity::area::Model as AreaModel;
use crate::storage::entity::department::Model as DepartmentModel;
use crate::storage::entity::technician::Model as TechnicianModel;
use crate::storage::repository::{AreaForm, DepartmentForm, TechnicianForm, TicketView};
use chrono::Utc;
use crossterm::event::KeyCode;
use ratatui::widgets::TableState;
use std::str::FromStr;
use tokio::sync::mpsc;

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum ViewMode {
    Submit,
    Track,
    Dashboard,
    Tickets,
    TicketDetail,
    MasterData,
    Reports,
}

impl ViewMode {
    pub fn title(&self) -> &'static str {
        match self {
            ViewMode::Submit => "Ajukan Tiket",
            ViewMode::Track => "Lacak Tiket",
            ViewMode::Dashboard => "Dashboard",
            ViewMode::Tickets => "Kelola Tiket",
            ViewMode::TicketDetail => "Detail Tiket",
            ViewMode::MasterData => "Master Data",
            ViewMode::Reports => "Laporan",
        }
    }

    pub fn admin_only(&self) -> bool {
        !matches!(self, ViewMode::Submit | ViewMode::Track)
    }
}

const PUBLIC_MENU: [ViewMode; 2] = [ViewMode::Submit, ViewMode::Track];
const ADMIN_MENU: [ViewMode; 4] = [
    ViewMode::Dashboard,
    ViewMode::Tickets,
    ViewMode::MasterData,
    ViewMode::Reports,
];

#[derive(PartialEq, Debug, Clone)]
pub enum InputMode {
    Normal,
    Command,
}

#[derive(PartialEq, Debug, Clone)]
pub enum FocusArea {
    Menu,
    MainView,
}

#[derive(Debug)]
pub enum AppEvent {
    Message(String),
    Error(String),
    Reference {
        departments: Vec<DepartmentModel>,
        areas: Vec<AreaModel>,
        technicians: Vec<TechnicianModel>,
    },
    Submitted(String),
    SubmitFailed(String),
    TrackResult {
        query: String,
        found: Option<TicketView>,
    },
    TrackFailed,
    Tickets(TicketPage),
    TicketOpened {
        view: TicketView,
        technicians: Vec<TechnicianModel>,
    },
    TicketSaved(TicketView),
    SaveFailed(String),
    AfterPhotos {
        id: String,
        photos: Vec<String>,
    },
    DepartmentSaved(DepartmentModel),
    DepartmentDeleted(i32),
    AreaSaved(AreaModel),
    AreaDeleted(i32),
    TechnicianSaved(TechnicianModel),
    TechnicianDeleted(i32),
    Dashboard(Box<DashboardStats>),
}

fn upsert<T, F>(list: &mut Vec<T>, item: T, same: F)
where
    F: Fn(&T, &T) -> bool,
{
    match list.iter_mut().find(|x| same(x, &item)) {
        Some(slot) => *slot = item,
        None => list.push(item),
    }
}

fn requires_admin(cmd: &AppCommand) -> bool {
    use AppCommand::*;
    matches!(
        cmd,
        Search(_)
            | StatusFilter(_)
            | PrioFilter(_)
            | Page(_)
            | Next
            | Prev
            | Open(_)
            | SetStatus(_)
            | Assign(_)
            | Note(_)
            | After(_)
            | ReqNote(_)
            | AfterPhoto(_)
            | Save
            | DeptAdd { .. }
            | DeptEdit { .. }
            | DeptRm(_)
            | AreaAdd { .. }
            | AreaEdit { .. }
            | AreaRm(_)
            | TechAdd { .. }
            | TechEdit { .. }
            | TechRm(_)
            | TechToggle(_)
            | Dashboard
            | Report { .. }
    )
}

pub struct App {
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub focus_area: FocusArea,
    pub menu_selected_index: usize,
    pub is_admin: bool,
    gate: AdminGate,

    pub form: SubmissionForm,
    pub policy: UploadPolicy,
    pub busy: bool,
    pub last_ticket: Option<String>,
    pub ticket_code: Option<TicketCode>,
    pub show_code: bool,

    pub departments: Vec<DepartmentModel>,
    pub areas: Vec<AreaModel>,
    pub technicians: Vec<TechnicianModel>,

    pub track_result: Option<TicketView>,
    pub track_detail: bool,

    pub filter: TicketFilter,
    pub ticket_page: Option<TicketPage>,
    pub selected_index: usize,
    pub ticket_table_state: TableState,
    pub detail: Option<TicketView>,
    pub draft: Option<TicketDraft>,
    pub picker: Vec<TechnicianModel>,
    pub saving: bool,
    pub detail_scroll: u16,
    /// Last failed submit or save, shown until the next success.
    pub failure: Option<String>,

    pub dashboard: Option<DashboardStats>,

    pub command_input: String,
    pub command_cursor: usize,
    pub command_history: Vec<String>,
    pub command_history_index: Option<usize>,
    pub log_messages: Vec<String>,
    pub cmd_tx: mpsc::UnboundedSender<Request>,
    pub evt_rx: Option<mpsc::UnboundedReceiver<AppEvent>>,
}

impl App {
    pub fn new(
        startup_info: Vec<String>,
        gate: AdminGate,
        policy: UploadPolicy,
        cmd_tx: mpsc::UnboundedSender<Request>,
        evt_rx: mpsc::UnboundedReceiver<AppEvent>,
    ) -> App {
        let mut log_messages = vec!["Aplikasi dimulai. Tekan / untuk perintah, help untuk bantuan.".to_string()];
        log_messages.extend(startup_info);

        App {
            view_mode: ViewMode::Submit,
            input_mode: InputMode::Normal,
            focus_area: FocusArea::Menu,
            menu_selected_index: 0,
            is_admin: false,
            gate,
            form: SubmissionForm::default(),
            policy,
            busy: false,
            last_ticket: None,
            ticket_code: None,
            show_code: false,
            departments: Vec::new(),
            areas: Vec::new(),
            technicians: Vec::new(),
            track_result: None,
            track_detail: false,
            filter: TicketFilter::default(),
            ticket_page: None,
            selected_index: 0,
            ticket_table_state: TableState::default().with_selected(Some(0)),
            detail: None,
            draft: None,
            picker: Vec::new(),
            saving: false,
            detail_scroll: 0,
            failure: None,
            dashboard: None,
            command_input: String::new(),
            command_cursor: 0,
            command_history: Vec::new(),
            command_history_index: None,
            log_messages,
            cmd_tx,
            evt_rx: Some(evt_rx),
        }
    }

    pub fn add_log(&mut self, msg: String) {
        self.log_messages.push(msg);
    }

    fn send(&mut self, req: Request) {
        if self.cmd_tx.send(req).is_err() {
            self.add_log("✗ Layanan latar belakang tidak berjalan".to_string());
        }
    }

    pub fn menu(&self) -> Vec<ViewMode> {
        let mut items = PUBLIC_MENU.to_vec();
        if self.is_admin {
            items.extend(ADMIN_MENU);
        }
        items
    }

    pub fn switch_view(&mut self, view: ViewMode) {
        if view.admin_only() && !self.is_admin {
            self.add_log("✗ Silakan login sebagai admin terlebih dahulu".to_string());
            return;
        }
        self.view_mode = view;
        if let Some(idx) = self.menu().iter().position(|v| *v == view) {
            self.menu_selected_index = idx;
        }
        match view {
            ViewMode::Dashboard => self.send(Request::Dashboard),
            ViewMode::Tickets => self.reload_tickets(),
            ViewMode::MasterData | ViewMode::Submit => self.send(Request::LoadReference),
            _ => {}
        }
    }

    fn reload_tickets(&mut self) {
        let filter = self.filter.clone();
        self.send(Request::ListTickets(filter));
    }

    pub fn department_name(&self, id: i32) -> Option<&str> {
        self.departments
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.name.as_str())
    }

    fn resolve_department(&self, text: &str) -> Option<i32> {
        let t = text.trim();
        if let Ok(id) = t.parse::<i32>() {
            return self.departments.iter().find(|d| d.id == id).map(|d| d.id);
        }
        self.departments
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(t))
            .map(|d| d.id)
    }

    fn resolve_area(&self, text: &str) -> Option<i32> {
        let t = text.trim();
        let options = self.form.area_options(&self.areas);
        if let Ok(id) = t.parse::<i32>() {
            if self.areas.iter().any(|a| a.id == id) {
                return Some(id);
            }
        }
        options
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(t) || a.code.eq_ignore_ascii_case(t))
            .map(|a| a.id)
    }

    fn with_draft<F: FnOnce(&mut TicketDraft)>(&mut self, edit: F) {
        match self.draft.as_mut() {
            Some(draft) => edit(draft),
            None => self.add_log("✗ Buka tiket terlebih dahulu (open <id>)".to_string()),
        }
    }

    fn go_to_page(&mut self, page: u64) {
        let last = self
            .ticket_page
            .as_ref()
            .map(|p| p.total_pages)
            .unwrap_or(u64::MAX);
        let page = page.clamp(1, last.max(1));
        if page != self.filter.page || self.ticket_page.is_none() {
            self.filter.page = page;
            self.reload_tickets();
        }
    }

    /// Runs one console command. Returns true when the app should exit.
    pub fn run_command(&mut self, cmd: AppCommand) -> bool {
        if requires_admin(&cmd) && !self.is_admin {
            self.add_log("✗ Perintah ini hanya untuk admin. Gunakan login <user> <pass>".to_string());
            return false;
        }

        match cmd {
            AppCommand::FormType(t) => self.form.request_type = Some(t),
            AppCommand::FormName(v) => self.form.requester_name = v,
            AppCommand::FormContact(v) => self.form.requester_contact = v,
            AppCommand::FormTitle(v) => self.form.title = v,
            AppCommand::FormDesc(v) => self.form.description = v,
            AppCommand::FormPriority(p) => self.form.priority = p,
            AppCommand::FormDept(text) => {
                if matches!(text.trim(), "" | "-" | "none") {
                    self.form.select_department(None);
                } else {
                    match self.resolve_department(&text) {
                        Some(id) => self.form.select_department(Some(id)),
                        None => self.add_log(format!("✗ Departemen tidak ditemukan: {}", text)),
                    }
                }
            }
            AppCommand::FormArea(text) => match self.resolve_area(&text) {
                Some(id) => {
                    if let Err(e) = self.form.select_area(id, &self.areas) {
                        self.add_log(format!("✗ {}", e));
                    }
                }
                None => self.add_log(format!("✗ Area tidak ditemukan: {}", text)),
            },
            AppCommand::Photo(path) => match PendingFile::from_path(&path) {
                Ok(file) => {
                    let name = file.file_name();
                    match self.form.add_photo(file, &self.policy) {
                        Ok(()) => self.add_log(format!("✓ Foto ditambahkan: {}", name)),
                        Err(e) => self.add_log(format!("✗ {}", e)),
                    }
                }
                Err(e) => self.add_log(format!("✗ Tidak bisa membaca {}: {}", path.display(), e)),
            },
            AppCommand::Unphoto(n) => {
                if n.checked_sub(1).and_then(|i| self.form.remove_photo(i)).is_none() {
                    self.add_log(format!("✗ Tidak ada foto nomor {}", n));
                }
            }
            AppCommand::Reset => self.form.clear(),
            AppCommand::Submit => {
                if self.busy {
                    self.add_log("Pengiriman sedang berlangsung...".to_string());
                } else {
                    self.busy = true;
                    let form = self.form.clone();
                    self.send(Request::Submit(form));
                }
            }
            AppCommand::QrSave => match self.last_ticket.clone() {
                Some(id) => self.send(Request::ExportCode(id)),
                None => self.add_log("✗ Belum ada tiket yang dibuat".to_string()),
            },
            AppCommand::Track(query) => {
                if !query.trim().is_empty() {
                    self.view_mode = ViewMode::Track;
                    self.menu_selected_index = 1;
                    self.send(Request::Track(query));
                }
            }
            AppCommand::Login { username, password } => {
                if self.gate.verify(&username, &password) {
                    self.is_admin = true;
                    self.add_log("✓ Login admin berhasil".to_string());
                } else {
                    self.add_log("✗ Username atau password salah".to_string());
                }
            }
            AppCommand::Logout => {
                self.is_admin = false;
                self.detail = None;
                self.draft = None;
                if self.view_mode.admin_only() {
                    self.view_mode = ViewMode::Submit;
                }
                self.menu_selected_index = self.menu_selected_index.min(PUBLIC_MENU.len() - 1);
                self.add_log("Logout berhasil".to_string());
            }
            AppCommand::Search(text) => {
                self.filter.search = text;
                self.filter.page = 1;
                self.reload_tickets();
            }
            AppCommand::StatusFilter(status) => {
                self.filter.status = status;
                self.filter.page = 1;
                self.reload_tickets();
            }
            AppCommand::PrioFilter(prio) => {
                self.filter.priority = prio;
                self.filter.page = 1;
                self.reload_tickets();
            }
            AppCommand::Page(n) => self.go_to_page(n),
            AppCommand::Next => self.go_to_page(self.filter.page + 1),
            AppCommand::Prev => self.go_to_page(self.filter.page.saturating_sub(1)),
            AppCommand::Open(id) => self.send(Request::OpenTicket(id)),
            AppCommand::SetStatus(status) => self.with_draft(|d| d.status = status),
            AppCommand::Assign(None) => self.with_draft(|d| d.assignment = Assignment::Unassigned),
            AppCommand::Assign(Some(id)) => {
                if self.draft.is_some() && !self.picker.iter().any(|t| t.id == id) {
                    self.add_log(format!("✗ Teknisi #{} tidak aktif atau tidak ditemukan", id));
                } else {
                    self.with_draft(|d| d.assignment = Assignment::Technician(id));
                }
            }
            AppCommand::Note(text) => self.with_draft(|d| d.admin_notes = text),
            AppCommand::After(text) => self.with_draft(|d| d.after_description = text),
            AppCommand::ReqNote(text) => self.with_draft(|d| d.requester_notes = text),
            AppCommand::AfterPhoto(paths) => {
                let Some(view) = self.detail.as_ref() else {
                    self.add_log("✗ Buka tiket terlebih dahulu (open <id>)".to_string());
                    return false;
                };
                let id = view.ticket.id.clone();
                let existing = view.ticket.after_photos.len();
                let mut files = Vec::with_capacity(paths.len());
                for path in &paths {
                    match PendingFile::from_path(path) {
                        Ok(f) => files.push(f),
                        Err(e) => {
                            self.add_log(format!("✗ Tidak bisa membaca {}: {}", path.display(), e));
                            return false;
                        }
                    }
                }
                match self.policy.check_batch(existing, &files) {
                    Ok(()) => self.send(Request::AttachAfterPhotos { id, files }),
                    Err(e) => self.add_log(format!("✗ {}", e)),
                }
            }
            AppCommand::Save => {
                if self.saving {
                    self.add_log("Penyimpanan sedang berlangsung...".to_string());
                } else if let (Some(view), Some(draft)) = (self.detail.as_ref(), self.draft.as_ref()) {
                    let req = Request::UpdateTicket {
                        id: view.ticket.id.clone(),
                        draft: draft.clone(),
                    };
                    self.saving = true;
                    self.send(req);
                } else {
                    self.add_log("✗ Buka tiket terlebih dahulu (open <id>)".to_string());
                }
            }
            AppCommand::DeptAdd { name } => self.send(Request::SaveDepartment {
                id: None,
                form: DepartmentForm {
                    name,
                    description: None,
                },
            }),
            AppCommand::DeptEdit { id, name } => {
                let description = self
                    .departments
                    .iter()
                    .find(|d| d.id == id)
                    .and_then(|d| d.description.clone());
                self.send(Request::SaveDepartment {
                    id: Some(id),
                    form: DepartmentForm { name, description },
                });
            }
            AppCommand::DeptRm(id) => self.send(Request::DeleteDepartment(id)),
            AppCommand::AreaAdd {
                department_id,
                code,
                name,
            } => self.send(Request::SaveArea {
                id: None,
                form: AreaForm {
                    name,
                    code,
                    department_id: Some(department_id),
                },
            }),
            AppCommand::AreaEdit {
                id,
                department_id,
                code,
                name,
            } => self.send(Request::SaveArea {
                id: Some(id),
                form: AreaForm {
                    name,
                    code,
                    department_id: Some(department_id),
                },
            }),
            AppCommand::AreaRm(id) => self.send(Request::DeleteArea(id)),
            AppCommand::TechAdd { phone, name } => self.send(Request::SaveTechnician {
                id: None,
                form: TechnicianForm {
                    name,
                    phone,
                    ..Default::default()
                },
            }),
            AppCommand::TechEdit { id, phone, name } => {
                let mut form = self
                    .technicians
                    .iter()
                    .find(|t| t.id == id)
                    .map(TechnicianForm::from)
                    .unwrap_or_default();
                form.name = name;
                form.phone = phone;
                self.send(Request::SaveTechnician { id: Some(id), form });
            }
            AppCommand::TechRm(id) => self.send(Request::DeleteTechnician(id)),
            AppCommand::TechToggle(id) => match self.technicians.iter().find(|t| t.id == id) {
                Some(tech) => {
                    let mut form = TechnicianForm::from(tech);
                    form.is_active = !form.is_active;
                    self.send(Request::SaveTechnician { id: Some(id), form });
                }
                None => self.add_log(format!("✗ Teknisi #{} tidak ditemukan", id)),
            },
            AppCommand::Dashboard => self.switch_view(ViewMode::Dashboard),
            AppCommand::Report {
                kind,
                format,
                from,
                to,
                department_id,
            } => {
                self.view_mode = ViewMode::Reports;
                self.send(Request::Report {
                    request: ReportRequest {
                        kind,
                        from,
                        to,
                        department_id,
                    },
                    format,
                    date: Utc::now().date_naive(),
                });
            }
            AppCommand::Help => self.add_log(HELP.to_string()),
            AppCommand::Quit => return true,
            AppCommand::Unknown(msg) => {
                if !msg.is_empty() {
                    self.add_log(format!("✗ {}", msg));
                }
            }
        }
        false
    }

    pub fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Message(msg) => self.add_log(msg),
            AppEvent::Error(msg) => self.add_log(format!("✗ {}", msg)),
            AppEvent::Reference {
                departments,
                areas,
                technicians,
            } => {
                self.departments = departments;
                self.areas = areas;
                self.technicians = technicians;
            }
            AppEvent::Submitted(id) => {
                self.busy = false;
                self.failure = None;
                self.form.clear();
                self.add_log(format!("✓ Tiket berhasil dibuat: {}", id));
                self.ticket_code = Some(TicketCode::for_ticket(&id));
                self.last_ticket = Some(id);
                self.show_code = true;
            }
            AppEvent::SubmitFailed(notice) => {
                self.busy = false;
                self.failure = Some(notice);
            }
            AppEvent::TrackResult { query, found } => {
                if found.is_none() {
                    self.add_log(format!("Tiket tidak ditemukan: {}", query));
                }
                self.track_result = found;
                self.track_detail = false;
            }
            AppEvent::TrackFailed => self.track_result = None,
            AppEvent::Tickets(page) => {
                self.filter.page = page.page;
                self.ticket_page = Some(page);
                self.clamp_selection();
            }
            AppEvent::TicketOpened { view, technicians } => {
                self.draft = Some(TicketDraft::from_ticket(&view.ticket));
                self.detail = Some(view);
                self.picker = technicians;
                self.detail_scroll = 0;
                self.failure = None;
                self.view_mode = ViewMode::TicketDetail;
            }
            AppEvent::TicketSaved(view) => {
                self.saving = false;
                self.failure = None;
                self.add_log(format!("✓ Tiket {} diperbarui", view.ticket.id));
                self.draft = Some(TicketDraft::from_ticket(&view.ticket));
                self.detail = Some(view);
                self.reload_tickets();
            }
            AppEvent::SaveFailed(notice) => {
                self.saving = false;
                self.failure = Some(notice);
            }
            AppEvent::AfterPhotos { id, photos } => {
                self.add_log(format!("✓ {} foto setelah perbaikan tersimpan", photos.len()));
                if let Some(view) = self.detail.as_mut().filter(|v| v.ticket.id == id) {
                    view.ticket.after_photos = photos;
                }
            }
            AppEvent::DepartmentSaved(dept) => {
                self.add_log(format!("✓ Departemen tersimpan: {}", dept.name));
                upsert(&mut self.departments, dept, |a, b| a.id == b.id);
            }
            AppEvent::DepartmentDeleted(id) => self.departments.retain(|d| d.id != id),
            AppEvent::AreaSaved(area) => {
                self.add_log(format!("✓ Area tersimpan: {}", area.name));
                upsert(&mut self.areas, area, |a, b| a.id == b.id);
            }
            AppEvent::AreaDeleted(id) => {
                self.areas.retain(|a| a.id != id);
                if self.form.area_id == Some(id) {
                    self.form.area_id = None;
                }
            }
            AppEvent::TechnicianSaved(tech) => {
                self.add_log(format!("✓ Teknisi tersimpan: {}", tech.name));
                upsert(&mut self.technicians, tech, |a, b| a.id == b.id);
            }
            AppEvent::TechnicianDeleted(id) => self.technicians.retain(|t| t.id != id),
            AppEvent::Dashboard(stats) => self.dashboard = Some(*stats),
        }
    }

    pub fn clamp_selection(&mut self) {
        let len = self.ticket_page.as_ref().map(|p| p.items.len()).unwrap_or(0);
        if self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
        }
        self.ticket_table_state.select(Some(self.selected_index));
    }

    pub fn get_completion_hint(&self) -> Option<String> {
        let commands = [
            "type", "name", "contact", "dept", "area", "title", "desc", "prio", "prio-filter",
            "photo", "unphoto", "reset", "submit", "qr", "track", "login", "logout", "search",
            "status", "page", "next", "prev", "open", "set-status", "assign", "note", "after",
            "afterphoto", "reqnote", "save", "tech", "dashboard", "report", "help", "quit",
        ];
        let input = self.command_input.trim_start();
        if input.is_empty() {
            return None;
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        if parts.len() == 1 && !input.ends_with(' ') {
            return commands
                .iter()
                .find(|c| c.starts_with(parts[0]) && **c != parts[0])
                .map(|c| c[parts[0].len()..].to_string());
        }

        let subs: &[&str] = match parts[0] {
            "dept" | "area" => &["add", "edit", "rm"],
            "tech" => &["add", "edit", "rm", "toggle"],
            "report" if parts.len() <= 2 => &["summary", "detailed", "performance", "trend"],
            "type" => &["corrective", "repair", "procurement", "support"],
            "prio" | "prio-filter" => &["low", "medium", "high", "critical"],
            "qr" => &["save"],
            _ => return None,
        };
        let cur = parts.get(1).copied().unwrap_or("");
        subs.iter()
            .find(|s| s.starts_with(cur) && **s != cur)
            .map(|s| s[cur.len()..].to_string())
    }

    fn byte_at(&self, char_idx: usize) -> usize {
        self.command_input
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.command_input.len())
    }

    fn leave_command_mode(&mut self) {
        self.command_input.clear();
        self.command_cursor = 0;
        self.input_mode = InputMode::Normal;
    }

    pub fn handle_key_event(&mut self, key: KeyCode) -> bool {
        if self.input_mode == InputMode::Command {
            let len = self.command_input.chars().count();
            match key {
                KeyCode::Enter => {
                    let cmd_owned = self.command_input.trim().to_string();
                    self.leave_command_mode();
                    if cmd_owned.is_empty() {
                        return false;
                    }
                    self.command_history.push(cmd_owned.clone());
                    self.command_history_index = None;
                    let cmd = AppCommand::from_str(&cmd_owned)
                        .unwrap_or_else(|_| AppCommand::Unknown(cmd_owned.clone()));
                    return self.run_command(cmd);
                }
                KeyCode::Esc => self.leave_command_mode(),
                KeyCode::Tab => {
                    if let Some(hint) = self.get_completion_hint() {
                        let insert = format!("{} ", hint);
                        let at = self.byte_at(self.command_cursor);
                        self.command_input.insert_str(at, &insert);
                        self.command_cursor += insert.chars().count();
                    }
                }
                KeyCode::Up => {
                    if self.command_history.is_empty() {
                        return false;
                    }
                    let next = match self.command_history_index {
                        None => self.command_history.len() - 1,
                        Some(i) => i.saturating_sub(1),
                    };
                    self.command_history_index = Some(next);
                    self.command_input = self.command_history[next].clone();
                    self.command_cursor = self.command_input.chars().count();
                }
                KeyCode::Down => {
                    let Some(i) = self.command_history_index else {
                        return false;
                    };
                    if i + 1 >= self.command_history.len() {
                        self.command_history_index = None;
                        self.command_input.clear();
                        self.command_cursor = 0;
                    } else {
                        self.command_history_index = Some(i + 1);
                        self.command_input = self.command_history[i + 1].clone();
                        self.command_cursor = self.command_input.chars().count();
                    }
                }
                KeyCode::Backspace => {
                    if self.command_cursor > 0 {
                        let at = self.byte_at(self.command_cursor - 1);
                        self.command_input.remove(at);
                        self.command_cursor -= 1;
                    }
                }
                KeyCode::Delete => {
                    if self.command_cursor < len {
                        let at = self.byte_at(self.command_cursor);
                        self.command_input.remove(at);
                    }
                }
                KeyCode::Left => self.command_cursor = self.command_cursor.saturating_sub(1),
                KeyCode::Right => self.command_cursor = (self.command_cursor + 1).min(len),
                KeyCode::Home => self.command_cursor = 0,
                KeyCode::End => self.command_cursor = len,
                KeyCode::Char(c) => {
                    let at = self.byte_at(self.command_cursor);
                    self.command_input.insert(at, c);
                    self.command_cursor += 1;
                }
                _ => {}
            }
            return false;
        }

        match key {
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Command;
                self.command_input.clear();
                self.command_cursor = 0;
            }
            KeyCode::Char('q') => return true,
            KeyCode::Esc => self.show_code = false,
            KeyCode::Left => self.focus_area = FocusArea::Menu,
            KeyCode::Right => self.focus_area = FocusArea::MainView,
            KeyCode::Up => {
                if self.focus_area == FocusArea::Menu {
                    self.menu_selected_index = self.menu_selected_index.saturating_sub(1);
                } else if matches!(self.view_mode, ViewMode::TicketDetail | ViewMode::Track) {
                    self.detail_scroll = self.detail_scroll.saturating_sub(1);
                } else if self.selected_index > 0 {
                    self.selected_index -= 1;
                    self.ticket_table_state.select(Some(self.selected_index));
                }
            }
            KeyCode::Down => {
                if self.focus_area == FocusArea::Menu {
                    let count = self.menu().len();
                    if self.menu_selected_index + 1 < count {
                        self.menu_selected_index += 1;
                    }
                } else if matches!(self.view_mode, ViewMode::TicketDetail | ViewMode::Track) {
                    self.detail_scroll = self.detail_scroll.saturating_add(1);
                } else {
                    let len = self.ticket_page.as_ref().map(|p| p.items.len()).unwrap_or(0);
                    if self.selected_index + 1 < len {
                        self.selected_index += 1;
                        self.ticket_table_state.select(Some(self.selected_index));
                    }
                }
            }
            KeyCode::Enter | KeyCode::Char('c') => {
                if self.focus_area == FocusArea::Menu {
                    if let Some(view) = self.menu().get(self.menu_selected_index).copied() {
                        self.switch_view(view);
                    }
                    self.focus_area = FocusArea::MainView;
                } else if self.view_mode == ViewMode::Tickets {
                    let id = self
                        .ticket_page
                        .as_ref()
                        .and_then(|p| p.items.get(self.selected_index))
                        .map(|v| v.ticket.id.clone());
                    if let Some(id) = id {
                        self.send(Request::OpenTicket(id));
                    }
                } else if self.view_mode == ViewMode::Track && self.track_result.is_some() {
                    self.track_detail = !self.track_detail;
                    self.detail_scroll = 0;
                }
            }
            KeyCode::Char('t') => {
                if self.show_code {
                    if let Some(id) = self.last_ticket.clone() {
                        self.show_code = false;
                        self.run_command(AppCommand::Track(id));
                    }
                }
            }
            KeyCode::Char('x') => {
                if self.view_mode == ViewMode::TicketDetail {
                    self.view_mode = ViewMode::Tickets;
                }
            }
            KeyCode::Char('n') if self.view_mode == ViewMode::Tickets => {
                self.run_command(AppCommand::Next);
            }
            KeyCode::Char('p') if self.view_mode == ViewMode::Tickets => {
                self.run_command(AppCommand::Prev);
            }
            KeyCode::Char('r') => {
                let view = self.view_mode;
                if view != ViewMode::TicketDetail {
                    self.switch_view(view);
                }
            }
            _ => {}
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vocab::{RequestType, TicketStatus};

    fn app() -> (App, mpsc::UnboundedReceiver<Request>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (_evt_tx, evt_rx) = mpsc::unbounded_channel();
        let app = App::new(
            Vec::new(),
            AdminGate::new("admin", "admin123"),
            UploadPolicy::default(),
            cmd_tx,
            evt_rx,
        );
        (app, cmd_rx)
    }

    fn dept(id: i32, name: &str) -> DepartmentModel {
        DepartmentModel {
            id,
            name: name.into(),
            description: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn area(id: i32, department_id: i32, name: &str) -> AreaModel {
        AreaModel {
            id,
            name: name.into(),
            code: format!("A{id}"),
            department_id,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn admin_views_hidden_until_login() {
        let (mut app, mut rx) = app();
        assert_eq!(app.menu(), vec![ViewMode::Submit, ViewMode::Track]);

        app.run_command(AppCommand::Dashboard);
        assert_eq!(app.view_mode, ViewMode::Submit);
        assert!(rx.try_recv().is_err());

        app.run_command(AppCommand::Login {
            username: "admin".into(),
            password: "salah".into(),
        });
        assert!(!app.is_admin);

        app.run_command(AppCommand::Login {
            username: "admin".into(),
            password: "admin123".into(),
        });
        assert_eq!(app.menu().len(), 6);
        app.run_command(AppCommand::Dashboard);
        assert_eq!(app.view_mode, ViewMode::Dashboard);
        assert!(matches!(rx.try_recv(), Ok(Request::Dashboard)));

        app.run_command(AppCommand::Logout);
        assert_eq!(app.view_mode, ViewMode::Submit);
        assert_eq!(app.menu().len(), 2);
    }

    #[test]
    fn department_by_name_clears_area() {
        let (mut app, _rx) = app();
        app.apply_event(AppEvent::Reference {
            departments: vec![dept(1, "MAINTENANCE"), dept(2, "IT")],
            areas: vec![area(10, 1, "Workshop"), area(20, 2, "Server Room")],
            technicians: vec![],
        });

        app.run_command(AppCommand::FormDept("maintenance".into()));
        app.run_command(AppCommand::FormArea("workshop".into()));
        assert_eq!(app.form.area_id, Some(10));

        app.run_command(AppCommand::FormArea("20".into()));
        assert_eq!(app.form.area_id, Some(10));

        app.run_command(AppCommand::FormDept("IT".into()));
        assert_eq!(app.form.department_id, Some(2));
        assert_eq!(app.form.area_id, None);
    }

    #[test]
    fn double_submit_is_ignored_while_busy() {
        let (mut app, mut rx) = app();
        app.run_command(AppCommand::FormType(RequestType::Repair));
        app.run_command(AppCommand::Submit);
        app.run_command(AppCommand::Submit);
        assert!(app.busy);
        assert!(matches!(rx.try_recv(), Ok(Request::Submit(_))));
        assert!(rx.try_recv().is_err());

        app.apply_event(AppEvent::SubmitFailed("departemen wajib dipilih".into()));
        assert!(!app.busy);
        assert_eq!(app.failure.as_deref(), Some("departemen wajib dipilih"));
        assert_eq!(app.form.request_type, Some(RequestType::Repair));

        app.run_command(AppCommand::Submit);
        app.apply_event(AppEvent::Submitted("TPM-20240115-0042".into()));
        assert!(!app.busy);
        assert_eq!(app.form, SubmissionForm::default());
        assert!(app.show_code);
        assert_eq!(app.failure, None);
        assert_eq!(app.last_ticket.as_deref(), Some("TPM-20240115-0042"));
    }

    #[test]
    fn blank_track_leaves_state_alone() {
        let (mut app, mut rx) = app();
        app.run_command(AppCommand::Track("   ".into()));
        assert!(rx.try_recv().is_err());
        assert_eq!(app.view_mode, ViewMode::Submit);

        app.run_command(AppCommand::Track("conveyor".into()));
        assert_eq!(app.view_mode, ViewMode::Track);
        assert!(matches!(rx.try_recv(), Ok(Request::Track(q)) if q == "conveyor"));
    }

    #[test]
    fn draft_edits_need_an_open_ticket() {
        let (mut app, _rx) = app();
        app.is_admin = true;
        app.run_command(AppCommand::SetStatus(TicketStatus::Closed));
        assert!(app.draft.is_none());
        assert!(app.log_messages.last().unwrap().contains("open <id>"));
    }

    #[test]
    fn saved_master_data_merges_locally() {
        let (mut app, _rx) = app();
        app.apply_event(AppEvent::DepartmentSaved(dept(1, "IT")));
        app.apply_event(AppEvent::DepartmentSaved(dept(2, "QMR")));
        app.apply_event(AppEvent::DepartmentSaved(dept(1, "IT & SYSTEM")));
        assert_eq!(app.departments.len(), 2);
        assert_eq!(app.department_name(1), Some("IT & SYSTEM"));
        app.apply_event(AppEvent::DepartmentDeleted(2));
        assert_eq!(app.departments.len(), 1);
    }

    #[test]
    fn console_typing_and_completion() {
        let (mut app, _rx) = app();
        app.handle_key_event(KeyCode::Char('/'));
        for c in "dashb".chars() {
            app.handle_key_event(KeyCode::Char(c));
        }
        assert_eq!(app.get_completion_hint().as_deref(), Some("oard"));
        app.handle_key_event(KeyCode::Tab);
        assert_eq!(app.command_input, "dashboard ");
        app.handle_key_event(KeyCode::Esc);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.command_input.is_empty());
    }
}
