//! Testing utilities and harness for Tether

pub mod testing;

pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
}
