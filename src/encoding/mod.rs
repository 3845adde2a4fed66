//! Feature encoding (training-exact preprocessing).
//!
//! Turns a loosely-typed [`RawInput`] into the fixed-order [`FeatureVector`]
//! the regression model was trained on:
//!
//! ```text
//! [rating_scaled, age_scaled] ++ [one-hot location (known.. , overflow)] ++ [skill flags..]
//! ```
//!
//! Segment order and widths are positional contracts with the exported model.
//! Nothing here looks features up by name once the vector is built.

pub mod encoder;
pub mod flags;
pub mod raw;
pub mod scaler;
pub mod schema;
pub mod vector;
pub mod vocabulary;

pub use encoder::FeatureEncoder;
pub use flags::encode_binary_flag;
pub use raw::{RawInput, RawValue};
pub use scaler::{encode_numeric, ScalerParameters};
pub use schema::{FeatureSchema, FeatureSlot, Segment};
pub use vector::{assemble_vector, FeatureVector};
pub use vocabulary::{encode_category, CategoryVocabulary};
