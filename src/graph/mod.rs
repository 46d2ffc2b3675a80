mod highlight;
mod model;
mod neighbors;
mod normalize;
mod organize;
mod physics;
mod placement;
mod search;
mod session;
mod view;

pub use highlight::{Highlight, NeighborDirection, NeighborEntry, NodeDetails, keep_set};
pub use model::{Category, DisplayMode, Graph, Link, Node};
pub use neighbors::{NeighborIndex, Neighbors};
pub use normalize::{GraphFilter, coerce_metric, normalize};
pub use organize::{OrganizeReport, OrganizerConfig, connected_components, organize, radial_layout};
pub use physics::{ForceConfig, ForceLayout, LayoutState, collision_radius};
pub use placement::{GridShape, grid_shape, place, place_with_rng};
pub use search::{FOCUS_SCALE, SearchMatch, SearchOutcome, find_exact, suggestions};
pub use session::{Session, SessionConfig};
pub use view::ViewTransform;
