// small shared helpers

pub mod ids;
pub mod normalize;
pub mod similar_aliases;
pub mod similarity;
pub mod validation;
