pub mod driver;
pub mod lockstep;

pub use driver::Sim;
pub use lockstep::Lockstep;
