pub mod marker;
pub mod reconciler;
pub mod vector;
