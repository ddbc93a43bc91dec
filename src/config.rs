use log::warn;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub attachment_dir: PathBuf,
    pub report_dir: PathBuf,
    pub page_size: u64,
    pub upload_max_files: usize,
    pub upload_max_mb: u64,
    pub admin_username: String,
    pub admin_password: String,
    pub seed_reference_data: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://tpmdesk.db?mode=rwc".to_string(),
            db_max_connections: 10,
            db_min_connections: 2,
            attachment_dir: PathBuf::from("attachments"),
            report_dir: PathBuf::from("reports"),
            page_size: 10,
            upload_max_files: 5,
            upload_max_mb: 10,
            admin_username: "admin".to_string(),
            admin_password: "admin123".to_string(),
            seed_reference_data: true,
        }
    }
}

impl AppConfig {
    /// Reads the process environment. Call `dotenv::dotenv()` first if a
    /// `.env` file should be honoured.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let text = |key: &str, default: String| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };

        Self {
            database_url: text("DATABASE_URL", d.database_url),
            db_max_connections: parsed(&lookup, "TPM_DB_MAX_CONNECTIONS", d.db_max_connections),
            db_min_connections: parsed(&lookup, "TPM_DB_MIN_CONNECTIONS", d.db_min_connections),
            attachment_dir: PathBuf::from(text(
                "TPM_ATTACHMENT_DIR",
                d.attachment_dir.display().to_string(),
            )),
            report_dir: PathBuf::from(text(
                "TPM_REPORT_DIR",
                d.report_dir.display().to_string(),
            )),
            page_size: parsed(&lookup, "TPM_PAGE_SIZE", d.page_size).max(1),
            upload_max_files: parsed(&lookup, "TPM_UPLOAD_MAX_FILES", d.upload_max_files),
            upload_max_mb: parsed(&lookup, "TPM_UPLOAD_MAX_MB", d.upload_max_mb),
            admin_username: text("TPM_ADMIN_USERNAME", d.admin_username),
            admin_password: text("TPM_ADMIN_PASSWORD", d.admin_password),
            seed_reference_data: lookup("TPM_SEED_REFERENCE_DATA")
                .map(|v| parse_flag(&v).unwrap_or(d.seed_reference_data))
                .unwrap_or(d.seed_reference_data),
        }
    }
}

fn parsed<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                warn!("{}={} is not valid, using {}", key, raw, default);
                default
            }
        },
        None => default,
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
