pub mod id;
pub mod party;

pub use id::{generate_id, PartyId};
pub use party::{MemberSnapshot, Party, Role, RoomSnapshot, RoomState};
