mod ids;
mod item_kind;
mod track;

pub use ids::{AlbumId, ArtistId, TrackId};
pub use item_kind::ItemKind;
pub use track::Track;
