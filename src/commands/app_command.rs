use chrono::NaiveDate;
use std::path::PathBuf;
use std::str::FromStr;

use crate::domain::vocab::{Priority, RequestType, TicketStatus};
use crate::domain::TicketId;
use crate::service::report::{ExportFormat, ReportKind};

/// One line typed into the `/` console.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    // submission form
    FormType(RequestType),
    FormName(String),
    FormContact(String),
    FormDept(String),
    FormArea(String),
    FormTitle(String),
    FormDesc(String),
    FormPriority(Option<Priority>),
    Photo(PathBuf),
    Unphoto(usize),
    Reset,
    Submit,
    QrSave,

    Track(String),

    Login {
        username: String,
        password: String,
    },
    Logout,

    // admin ticket list
    Search(String),
    StatusFilter(Option<TicketStatus>),
    PrioFilter(Option<Priority>),
    Page(u64),
    Next,
    Prev,
    Open(String),

    // admin ticket editor
    SetStatus(TicketStatus),
    Assign(Option<i32>),
    Note(String),
    After(String),
    ReqNote(String),
    AfterPhoto(Vec<PathBuf>),
    Save,

    // master data
    DeptAdd {
        name: String,
    },
    DeptEdit {
        id: i32,
        name: String,
    },
    DeptRm(i32),
    AreaAdd {
        department_id: i32,
        code: String,
        name: String,
    },
    AreaEdit {
        id: i32,
        department_id: i32,
        code: String,
        name: String,
    },
    AreaRm(i32),
    TechAdd {
        phone: String,
        name: String,
    },
    TechEdit {
        id: i32,
        phone: String,
        name: String,
    },
    TechRm(i32),
    TechToggle(i32),

    Dashboard,
    Report {
        kind: ReportKind,
        format: ExportFormat,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        department_id: Option<i32>,
    },

    Help,
    Quit,
    Unknown(String),
}

pub const HELP: &str = "Perintah: type <jenis> | name <nama> | contact <kontak> | dept <id|nama> | area <id|nama> | title <judul> | desc <deskripsi> | prio <low|medium|high|critical|none> | photo <path> | unphoto <n> | reset | submit | qr save | track <nomor/judul> | login <user> <pass> | logout | search <teks> | status <status|all> | prio-filter <prioritas|all> | page <n> | next | prev | open <id> | set-status <status> | assign <id|none> | note <teks> | after <teks> | reqnote <teks> | afterphoto <path...> | save | dept add|edit|rm | area add|edit|rm | tech add|edit|rm|toggle | dashboard | report <kind> <csv|txt> [from] [to] [dept] | help | quit";

fn rest(parts: &[&str], from: usize) -> String {
    parts.get(from..).map(|p| p.join(" ")).unwrap_or_default()
}

fn id_at(parts: &[&str], idx: usize) -> Option<i32> {
    parts.get(idx).and_then(|s| s.parse::<i32>().ok())
}

fn usage(u: &str) -> Result<AppCommand, ()> {
    Ok(AppCommand::Unknown(format!("Cara pakai: {}", u)))
}

fn is_all(s: &str) -> bool {
    matches!(s.to_ascii_lowercase().as_str(), "all" | "semua" | "none" | "-" | "")
}

fn date_arg(s: Option<&&str>) -> Result<Option<NaiveDate>, String> {
    match s {
        None => Ok(None),
        Some(&"-") => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| format!("tanggal tidak valid: {} (format YYYY-MM-DD)", raw)),
    }
}

impl FromStr for AppCommand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(AppCommand::Unknown("".to_string()));
        }

        match parts[0] {
            "type" => match parts.get(1).map(|t| t.parse::<RequestType>()) {
                Some(Ok(t)) => Ok(AppCommand::FormType(t)),
                Some(Err(e)) => Ok(AppCommand::Unknown(e.to_string())),
                None => usage("type <corrective|repair|procurement|support>"),
            },
            "name" => Ok(AppCommand::FormName(rest(&parts, 1))),
            "contact" => Ok(AppCommand::FormContact(rest(&parts, 1))),
            "title" => Ok(AppCommand::FormTitle(rest(&parts, 1))),
            "desc" => Ok(AppCommand::FormDesc(rest(&parts, 1))),
            "prio" => match parts.get(1) {
                Some(p) if is_all(p) => Ok(AppCommand::FormPriority(None)),
                Some(p) => match p.parse::<Priority>() {
                    Ok(p) => Ok(AppCommand::FormPriority(Some(p))),
                    Err(e) => Ok(AppCommand::Unknown(e.to_string())),
                },
                None => usage("prio <low|medium|high|critical|none>"),
            },
            "photo" => {
                let path = rest(&parts, 1);
                if path.is_empty() {
                    usage("photo <path>")
                } else {
                    Ok(AppCommand::Photo(PathBuf::from(path)))
                }
            }
            "unphoto" => match parts.get(1).and_then(|n| n.parse::<usize>().ok()) {
                Some(n) if n > 0 => Ok(AppCommand::Unphoto(n)),
                _ => usage("unphoto <n>"),
            },
            "reset" => Ok(AppCommand::Reset),
            "submit" => Ok(AppCommand::Submit),
            "qr" => match parts.get(1) {
                Some(&"save") => Ok(AppCommand::QrSave),
                _ => usage("qr save"),
            },
            "track" => Ok(AppCommand::Track(rest(&parts, 1))),
            "login" => match (parts.get(1), parts.get(2)) {
                (Some(u), Some(p)) => Ok(AppCommand::Login {
                    username: u.to_string(),
                    password: p.to_string(),
                }),
                _ => usage("login <user> <pass>"),
            },
            "logout" => Ok(AppCommand::Logout),
            "search" => Ok(AppCommand::Search(rest(&parts, 1))),
            "status" => {
                let value = rest(&parts, 1);
                if is_all(&value) {
                    Ok(AppCommand::StatusFilter(None))
                } else {
                    match value.parse::<TicketStatus>() {
                        Ok(st) => Ok(AppCommand::StatusFilter(Some(st))),
                        Err(e) => Ok(AppCommand::Unknown(e.to_string())),
                    }
                }
            }
            "prio-filter" => {
                let value = rest(&parts, 1);
                if is_all(&value) {
                    Ok(AppCommand::PrioFilter(None))
                } else {
                    match value.parse::<Priority>() {
                        Ok(p) => Ok(AppCommand::PrioFilter(Some(p))),
                        Err(e) => Ok(AppCommand::Unknown(e.to_string())),
                    }
                }
            }
            "page" => match parts.get(1).and_then(|n| n.parse::<u64>().ok()) {
                Some(n) if n > 0 => Ok(AppCommand::Page(n)),
                _ => usage("page <n>"),
            },
            "next" => Ok(AppCommand::Next),
            "prev" => Ok(AppCommand::Prev),
            "open" => match parts.get(1).map(|id| id.to_ascii_uppercase()) {
                Some(id) if TicketId::is_well_formed(&id) => Ok(AppCommand::Open(id)),
                Some(id) => Ok(AppCommand::Unknown(format!("nomor tiket tidak valid: {}", id))),
                None => usage("open <id>"),
            },
            "set-status" => match rest(&parts, 1).parse::<TicketStatus>() {
                Ok(st) => Ok(AppCommand::SetStatus(st)),
                Err(e) => Ok(AppCommand::Unknown(e.to_string())),
            },
            "assign" => match parts.get(1) {
                Some(v) if is_all(v) || *v == "unassigned" => Ok(AppCommand::Assign(None)),
                Some(v) => match v.parse::<i32>() {
                    Ok(id) => Ok(AppCommand::Assign(Some(id))),
                    Err(_) => usage("assign <id|none>"),
                },
                None => usage("assign <id|none>"),
            },
            "note" => Ok(AppCommand::Note(rest(&parts, 1))),
            "after" => Ok(AppCommand::After(rest(&parts, 1))),
            "reqnote" => Ok(AppCommand::ReqNote(rest(&parts, 1))),
            "afterphoto" => {
                let files: Vec<PathBuf> = parts[1..].iter().map(PathBuf::from).collect();
                if files.is_empty() {
                    usage("afterphoto <path...>")
                } else {
                    Ok(AppCommand::AfterPhoto(files))
                }
            }
            "save" => Ok(AppCommand::Save),
            "dept" => match parts.get(1).copied() {
                Some("add") => {
                    let name = rest(&parts, 2);
                    if name.is_empty() {
                        usage("dept add <nama>")
                    } else {
                        Ok(AppCommand::DeptAdd { name })
                    }
                }
                Some("edit") => match id_at(&parts, 2) {
                    Some(id) => Ok(AppCommand::DeptEdit {
                        id,
                        name: rest(&parts, 3),
                    }),
                    None => usage("dept edit <id> <nama>"),
                },
                Some("rm") => match id_at(&parts, 2) {
                    Some(id) => Ok(AppCommand::DeptRm(id)),
                    None => usage("dept rm <id>"),
                },
                Some(_) => Ok(AppCommand::FormDept(rest(&parts, 1))),
                None => usage("dept <id|nama> | dept add|edit|rm"),
            },
            "area" => match parts.get(1).copied() {
                Some("add") => match (id_at(&parts, 2), parts.get(3)) {
                    (Some(department_id), Some(code)) => Ok(AppCommand::AreaAdd {
                        department_id,
                        code: code.to_string(),
                        name: rest(&parts, 4),
                    }),
                    _ => usage("area add <dept_id> <kode> <nama>"),
                },
                Some("edit") => match (id_at(&parts, 2), id_at(&parts, 3), parts.get(4)) {
                    (Some(id), Some(department_id), Some(code)) => Ok(AppCommand::AreaEdit {
                        id,
                        department_id,
                        code: code.to_string(),
                        name: rest(&parts, 5),
                    }),
                    _ => usage("area edit <id> <dept_id> <kode> <nama>"),
                },
                Some("rm") => match id_at(&parts, 2) {
                    Some(id) => Ok(AppCommand::AreaRm(id)),
                    None => usage("area rm <id>"),
                },
                Some(_) => Ok(AppCommand::FormArea(rest(&parts, 1))),
                None => usage("area <id|nama> | area add|edit|rm"),
            },
            "tech" => match parts.get(1).copied() {
                Some("add") => match parts.get(2) {
                    Some(phone) => Ok(AppCommand::TechAdd {
                        phone: phone.to_string(),
                        name: rest(&parts, 3),
                    }),
                    None => usage("tech add <telepon> <nama>"),
                },
                Some("edit") => match (id_at(&parts, 2), parts.get(3)) {
                    (Some(id), Some(phone)) => Ok(AppCommand::TechEdit {
                        id,
                        phone: phone.to_string(),
                        name: rest(&parts, 4),
                    }),
                    _ => usage("tech edit <id> <telepon> <nama>"),
                },
                Some("rm") => match id_at(&parts, 2) {
                    Some(id) => Ok(AppCommand::TechRm(id)),
                    None => usage("tech rm <id>"),
                },
                Some("toggle") => match id_at(&parts, 2) {
                    Some(id) => Ok(AppCommand::TechToggle(id)),
                    None => usage("tech toggle <id>"),
                },
                _ => usage("tech add|edit|rm|toggle"),
            },
            "dashboard" | "refresh" => Ok(AppCommand::Dashboard),
            "report" => {
                let kind = parts.get(1).map(|k| k.parse::<ReportKind>());
                let format = parts.get(2).map(|f| f.parse::<ExportFormat>());
                match (kind, format) {
                    (Some(Ok(kind)), Some(Ok(format))) => {
                        let from = date_arg(parts.get(3));
                        let to = date_arg(parts.get(4));
                        let (from, to) = match (from, to) {
                            (Ok(f), Ok(t)) => (f, t),
                            (Err(e), _) | (_, Err(e)) => return Ok(AppCommand::Unknown(e)),
                        };
                        Ok(AppCommand::Report {
                            kind,
                            format,
                            from,
                            to,
                            department_id: id_at(&parts, 5),
                        })
                    }
                    (Some(Err(e)), _) | (_, Some(Err(e))) => Ok(AppCommand::Unknown(e.to_string())),
                    _ => usage("report <summary|detailed|performance|trend> <csv|txt> [from] [to] [dept]"),
                }
            }
            "help" | "h" => Ok(AppCommand::Help),
            "quit" | "q" | "exit" => Ok(AppCommand::Quit),
            _ => Ok(AppCommand::Unknown(format!("Perintah tidak dikenal: {}", parts[0]))),
        }
    }
}
