//! Local audio library: the `Track` model and the directory scanner that
//! produces it.

mod display;
mod model;
mod scan;

pub use display::display_from_fields;
pub use model::*;
pub use scan::scan;

#[cfg(test)]
mod tests;
