mod codec;
mod dynamics;
mod error;
mod grouping;
mod interp;
mod model;
mod monotonize;
mod normalization;
mod note_io;
mod tempo;
mod time_codec;
mod util;

pub use codec::*;
pub use dynamics::*;
pub use error::*;
pub use grouping::*;
pub use interp::*;
pub use model::config::*;
pub use model::notes::*;
pub use model::parameters::*;
pub use monotonize::*;
pub use normalization::*;
pub use note_io::*;
pub use tempo::*;
pub use time_codec::*;
pub use util::*;
