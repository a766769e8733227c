// Purpose: Voice management, polyphony, control events
// This layer sits above the dsp primitives and owns every sounding note

pub mod handle;
pub mod message;
pub mod mixer;
pub mod pool;
pub mod poly;
pub mod voice;
