pub mod domain;
pub mod dubbing;
pub mod infra;
pub mod observability;
pub mod payments;
pub mod platforms;
