use chrono::NaiveDate;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

const PREFIX: &str = "TPM";

fn id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^TPM-\d{8}-\d{4}$").expect("static ticket id pattern"))
}

/// Human readable ticket number, `TPM-YYYYMMDD-NNNN`.
///
/// Not globally unique: two tickets created on the same day share the date
/// segment and only differ by the 4-digit random suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(String);

impl TicketId {
    pub fn generate<R: Rng + ?Sized>(date: NaiveDate, rng: &mut R) -> Self {
        let suffix: u16 = rng.gen_range(0..=9999);
        TicketId(format!("{}-{}-{:04}", PREFIX, date.format("%Y%m%d"), suffix))
    }

    pub fn is_well_formed(s: &str) -> bool {
        id_pattern().is_match(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn format_carries_the_date() {
        let mut rng = StdRng::seed_from_u64(7);
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let id = TicketId::generate(date, &mut rng);
        assert!(TicketId::is_well_formed(id.as_str()), "{}", id);
        assert_eq!(&id.as_str()[4..12], "20240115");
    }

    #[test]
    fn suffix_is_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..500 {
            let id = TicketId::generate(date, &mut rng);
            assert_eq!(id.as_str().len(), "TPM-20251231-0000".len());
        }
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(TicketId::is_well_formed("TPM-20240115-0007"));
        assert!(!TicketId::is_well_formed("TPM-2024011-0007"));
        assert!(!TicketId::is_well_formed("tpm-20240115-0007"));
        assert!(!TicketId::is_well_formed("TPM-20240115-00071"));
    }

    #[test]
    fn suffix_spreads_over_the_whole_range() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let mut buckets = [0u32; 10];
        let draws = 10_000;
        for _ in 0..draws {
            let id = TicketId::generate(date, &mut rng);
            let n: usize = id.as_str()[13..].parse().unwrap();
            assert!(n <= 9999);
            buckets[n / 1000] += 1;
        }
        // 1000 expected per bucket; 5 sigma is roughly 150
        for count in buckets {
            assert!((850..=1150).contains(&count), "bucket count {}", count);
        }
    }
}
