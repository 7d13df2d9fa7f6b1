/// Business logic layer
pub mod feed;
pub mod interactions;
pub mod media;
pub mod profile;

pub use feed::FeedService;
pub use interactions::InteractionService;
pub use media::ImageUploader;
pub use profile::{ProfileEdit, ProfileService};
