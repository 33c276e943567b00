/// Running counters of remote activity for one session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncStats {
    pub writes_confirmed: usize,
    pub writes_failed: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
    pub ids_resolved: usize,
}
