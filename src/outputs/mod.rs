//! Output artifacts written per restaurant URL.
//!
//! # Submodules
//!
//! - [`json`]: Writes a [`RestaurantRecord`](crate::models::RestaurantRecord) as pretty JSON
//! - [`debug`]: Saves the raw page markup when no menu could be extracted
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── joes-pizza-12-main-st_data.json   # menu found
//! └── debug_2345678.html                # no menu; markup kept for diagnosis
//! ```

pub mod debug;
pub mod json;
