use crate::marker::MarkerId;
use crate::notify::NotifyError;
use crate::remote::RemoteError;

/// Remote store operation mirrored from a local mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Create,
    Update,
    Delete,
    DeleteAll,
}

impl WriteOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteOp::Create => "create",
            WriteOp::Update => "update",
            WriteOp::Delete => "delete",
            WriteOp::DeleteAll => "delete_all",
        }
    }
}

/// Outcome of a background task, applied by the session on its own thread.
#[derive(Debug)]
pub(crate) enum Completion {
    /// Remote create for a marker still carrying a placeholder id.
    Assigned {
        placeholder: MarkerId,
        result: Result<MarkerId, RemoteError>,
    },
    Written {
        operation: WriteOp,
        id: Option<MarkerId>,
        result: Result<(), RemoteError>,
    },
    Notified {
        event: &'static str,
        result: Result<(), NotifyError>,
    },
}
