//! Frame handoff to the rendering side.

pub mod frame_buffer;

pub use frame_buffer::{FramePublisher, FrameReceiver, RgbaFrame, frame_exchange};
