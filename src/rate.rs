use std::fmt::{Debug, Display};
use std::iter::Sum;
use std::ops::{AddAssign, SubAssign};

use num_traits::Float;

/// A trait representing a throughput rate, typically a floating point number.
pub trait Rate:
    Float + AddAssign + SubAssign + Sum<Self> + Debug + Display + Default
{
}

impl Rate for f64 {}
