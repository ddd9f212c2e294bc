mod health;
mod run;

pub use health::*;
pub use run::*;
