pub mod point;
pub mod vec;

pub use point::Cell;
pub use vec::Offset;
