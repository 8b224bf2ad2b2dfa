//! The avatar view
//!
//! Ties the pieces together on a single task:
//! - `AvatarView` - owns model, animation, lip-sync, inactivity and playback
//! - `AvatarHandle` - how the UI layer sends input and watches status
//! - `RenderLoop` - the per-frame update
//! - `AvatarModel` / `AssetLoader` / `SceneRenderer` - the 3D collaborators

mod assets;
mod render;
mod runtime;

pub use assets::{AssetLoader, AvatarModel, SceneRenderer};
pub use render::{Frame, RenderLoop};
pub use runtime::{AvatarHandle, AvatarView, Collaborators, ViewCommand, ViewStatus};
