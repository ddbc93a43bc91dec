use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    Corrective,
    Repair,
    Procurement,
    Support,
}

impl RequestType {
    pub const ALL: [RequestType; 4] = [
        RequestType::Corrective,
        RequestType::Repair,
        RequestType::Procurement,
        RequestType::Support,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Corrective => "corrective",
            RequestType::Repair => "repair",
            RequestType::Procurement => "procurement",
            RequestType::Support => "support",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            RequestType::Corrective => "Tindakan Korektif",
            RequestType::Repair => "Perbaikan",
            RequestType::Procurement => "Pengadaan",
            RequestType::Support => "Dukungan",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RequestType::Corrective => "Perbaikan untuk mencegah masalah berulang",
            RequestType::Repair => "Perbaikan kerusakan mesin atau peralatan",
            RequestType::Procurement => "Permintaan suku cadang atau material",
            RequestType::Support => "Bantuan teknis dan konsultasi",
        }
    }
}

/// Ordering is used for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "RENDAH",
            Priority::Medium => "SEDANG",
            Priority::High => "TINGGI",
            Priority::Critical => "KRITIS",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Priority::Low => "Tidak mengganggu produksi",
            Priority::Medium => "Berpotensi mengganggu produksi",
            Priority::High => "Mengganggu produksi secara signifikan",
            Priority::Critical => "Menghentikan produksi",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Priority::Low => "green",
            Priority::Medium => "yellow",
            Priority::High => "orange",
            Priority::Critical => "red",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Priority::Low => "🟢",
            Priority::Medium => "🟡",
            Priority::High => "🟠",
            Priority::Critical => "🔴",
        }
    }
}

/// Plain label: any status may be set from any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
    Open,
    InProgress,
    AwaitingMaterial,
    Closed,
    Reject,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 5] = [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::AwaitingMaterial,
        TicketStatus::Closed,
        TicketStatus::Reject,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::InProgress => "In Progress",
            TicketStatus::AwaitingMaterial => "Menunggu Material",
            TicketStatus::Closed => "Closed",
            TicketStatus::Reject => "Reject",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            TicketStatus::Open => "blue",
            TicketStatus::InProgress => "yellow",
            TicketStatus::AwaitingMaterial => "purple",
            TicketStatus::Closed => "green",
            TicketStatus::Reject => "red",
        }
    }

    /// Fill of the status progress bar, in percent.
    pub fn progress(&self) -> u16 {
        match self {
            TicketStatus::Open => 20,
            TicketStatus::AwaitingMaterial => 40,
            TicketStatus::InProgress => 60,
            TicketStatus::Closed | TicketStatus::Reject => 100,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, TicketStatus::Closed | TicketStatus::Reject)
    }
}

macro_rules! vocab_text {
    ($ty:ty, $field:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| ValidationError::InvalidValue {
                        field: $field,
                        value: s.to_string(),
                    })
            }
        }
    };
}

vocab_text!(RequestType, "jenis permintaan");
vocab_text!(Priority, "prioritas");
vocab_text!(TicketStatus, "status");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_are_exact() {
        let statuses: Vec<&str> = TicketStatus::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            statuses,
            ["Open", "In Progress", "Menunggu Material", "Closed", "Reject"]
        );
        let prios: Vec<&str> = Priority::ALL.iter().map(|p| p.as_str()).collect();
        assert_eq!(prios, ["low", "medium", "high", "critical"]);
        let types: Vec<&str> = RequestType::ALL.iter().map(|t| t.as_str()).collect();
        assert_eq!(types, ["corrective", "repair", "procurement", "support"]);
    }

    #[test]
    fn parse_ignores_case_but_not_spelling() {
        assert_eq!(
            "menunggu material".parse::<TicketStatus>().unwrap(),
            TicketStatus::AwaitingMaterial
        );
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert!("urgent".parse::<Priority>().is_err());
        assert!("InProgress".parse::<TicketStatus>().is_err());
    }

    #[test]
    fn priority_orders_for_display() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::High < Priority::Critical);
        assert_eq!(Priority::Critical.label(), "KRITIS");
    }

    #[test]
    fn closed_and_rejected_are_not_active() {
        assert!(TicketStatus::AwaitingMaterial.is_active());
        assert!(!TicketStatus::Closed.is_active());
        assert!(!TicketStatus::Reject.is_active());
    }
}
