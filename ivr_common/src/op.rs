/// Implements the standard arithmetic traits for a single-field newtype.
///
/// `op!(binary Foo, Add, add)` expands to `impl Add for Foo`, and so on for
/// `inplace` and `unary` operators.
#[macro_export]
macro_rules! op {
    (binary $ty:ty, $trait:ident, $fn:ident) => {
        impl std::ops::$trait for $ty {
            type Output = Self;

            fn $fn(self, rhs: Self) -> Self::Output {
                Self(std::ops::$trait::$fn(self.0, rhs.0))
            }
        }
    };
    (inplace $ty:ty, $trait:ident, $fn:ident) => {
        impl std::ops::$trait for $ty {
            fn $fn(&mut self, rhs: Self) {
                std::ops::$trait::$fn(&mut self.0, rhs.0)
            }
        }
    };
    (unary $ty:ty, $trait:ident, $fn:ident) => {
        impl std::ops::$trait for $ty {
            type Output = Self;

            fn $fn(self) -> Self::Output {
                Self(std::ops::$trait::$fn(self.0))
            }
        }
    };
}
