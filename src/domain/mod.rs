// Domain layer - Plain data types and pure rules
pub mod alert;
pub mod error;
pub mod plant;
pub mod reading;
pub mod threshold;
