use crate::app::db::SendCounts;

/// Total recipients shown for a campaign: the send-time snapshot, else the
/// number of log rows, else the live ledger size.
pub fn resolve_total_recipients(target_recipient_count: i64, counts: SendCounts, ledger_count: i64) -> i64 {
    if target_recipient_count > 0 {
        return target_recipient_count;
    }

    if counts.total() > 0 {
        return counts.total();
    }

    ledger_count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_wins() {
        let counts = SendCounts { sent: 1, failed: 1 };
        assert_eq!(resolve_total_recipients(10, counts, 50), 10);
    }

    #[test]
    fn falls_back_to_log_rows() {
        let counts = SendCounts { sent: 3, failed: 1 };
        assert_eq!(resolve_total_recipients(0, counts, 50), 4);
    }

    #[test]
    fn falls_back_to_ledger() {
        assert_eq!(resolve_total_recipients(0, SendCounts::default(), 7), 7);
    }
}
