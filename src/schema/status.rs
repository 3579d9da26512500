//! The one visibility rule shared by every read path: an entity is visible
//! when neither it nor any ancestor in its chain is soft-deleted.

pub trait SoftDeletable {
    fn is_deleted(&self) -> bool;
}

pub fn is_visible(chain: &[&dyn SoftDeletable]) -> bool {
    chain.iter().all(|entity| !entity.is_deleted())
}
