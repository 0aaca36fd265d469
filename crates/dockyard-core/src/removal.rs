/// Outcome of a stop/remove/delete against something that may not exist.
///
/// Absence is a success, not an error: the caller wanted the thing gone and
/// it is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    NotFound,
}

impl Removal {
    pub fn was_removed(&self) -> bool {
        matches!(self, Removal::Removed)
    }
}
