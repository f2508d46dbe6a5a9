//! Dashboard state slices. Each slice is a value with a `reduce` that takes
//! the slice by value and returns the next one.

pub mod channels;
pub mod form;
pub mod modal;
pub mod notifications;
pub mod records;
