#![forbid(unsafe_code)]

pub mod assets;
pub mod band;
pub mod catalog;
pub mod composite;
pub mod core;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod providers;
pub mod scores;
pub mod text;

pub use assets::{
    PreparedImage,
    logos::{FitBox, LogoStore},
};
pub use band::composite_band;
pub use catalog::{MediaRef, MediaType};
pub use self::core::{Band, Canvas, PosterRgba, Rgba8};
pub use error::{ScorebandError, ScorebandResult};
pub use layout::{BandStyle, LayoutPlan, StripPlan, layout_badges};
pub use pipeline::annotate_poster;
pub use providers::{ProviderConfig, RatingSource, collect_scores};
pub use scores::{Badge, SourceScore, badges_from_scores};
pub use text::{BrushRgba8, TextShaper};
