pub mod event;
pub mod user;

pub use event::{Event, EventDraft, EventInput, EventStatus, EventWithOrganizer, OrganizerSummary};
pub use user::{
    NewUserInput, Role, SignInInput, UpdateUserInput, User, UserProfile, UserWithEvents,
};
