pub mod export;
pub mod renderer;

pub use export::{save_frame, SaveError};
pub use renderer::{CanvasRenderer, RenderedFrame, RendererError, StrokeLayout};
