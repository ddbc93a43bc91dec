/// Input problems detected before any store call. Messages are shown to the
/// user as-is.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("jenis permintaan wajib dipilih")]
    MissingRequestType,
    #[error("nama pemohon wajib diisi")]
    MissingRequesterName,
    #[error("departemen wajib dipilih")]
    MissingDepartment,
    #[error("{0} wajib diisi")]
    MissingField(&'static str),
    #[error("departemen #{0} tidak ditemukan")]
    UnknownDepartment(i32),
    #[error("area #{area} bukan bagian dari departemen #{department}")]
    AreaOutsideDepartment { area: i32, department: i32 },
    #[error("area #{0} tidak ditemukan")]
    UnknownArea(i32),
    #[error("teknisi #{0} tidak aktif atau tidak ditemukan")]
    UnknownTechnician(i32),
    #[error("{field} tidak valid: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("{file}: hanya file gambar (JPG, PNG, GIF) yang diperbolehkan")]
    UnsupportedFileType { file: String },
    #[error("{file}: ukuran file maksimal {limit_mb}MB")]
    FileTooLarge { file: String, limit_mb: u64 },
    #[error("maksimal {max} file gambar yang dapat diupload")]
    TooManyFiles { max: usize },
}

#[derive(thiserror::Error, Debug)]
pub enum DeskError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("storage error: {0}")]
    Storage(#[from] sea_orm::DbErr),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("ticket {0} not found")]
    TicketNotFound(String),
    #[error("no free ticket id after {0} attempts")]
    IdExhausted(usize),
}

impl DeskError {
    pub fn is_validation(&self) -> bool {
        matches!(self, DeskError::Validation(_))
    }

    /// Text safe to show in the UI. Operation failures collapse into a
    /// generic notice; the detail belongs in the log.
    pub fn user_notice(&self, action: &str) -> String {
        match self {
            DeskError::Validation(v) => v.to_string(),
            DeskError::TicketNotFound(id) => format!("Tiket {} tidak ditemukan", id),
            _ => format!("Gagal {}. Silakan coba lagi.", action),
        }
    }
}
