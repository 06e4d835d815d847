//! Multi-argument operations
//!
//! An element that is a tuple can be spread across the operation's
//! parameters instead of being passed whole.
//!
//! ```
//! use racepool::spread;
//!
//! let repeat = spread::<(usize, &str), _>(|count: usize, s: &str| s.repeat(count));
//! assert_eq!(repeat((3, "ab")), "ababab");
//! ```

/// A callable that accepts its arguments packed as a tuple
pub trait Apply<Args> {
    /// Value returned by the call
    type Output;

    /// Call with `args` spread as separate arguments
    fn apply(&self, args: Args) -> Self::Output;
}

macro_rules! impl_apply {
    ($($ty:ident $var:ident),+) => {
        impl<Func, Out, $($ty),+> Apply<($($ty,)+)> for Func
        where
            Func: Fn($($ty),+) -> Out,
        {
            type Output = Out;

            fn apply(&self, ($($var,)+): ($($ty,)+)) -> Out {
                (self)($($var),+)
            }
        }
    };
}

impl_apply!(A a);
impl_apply!(A a, B b);
impl_apply!(A a, B b, C c);
impl_apply!(A a, B b, C c, D d);
impl_apply!(A a, B b, C c, D d, E e);
impl_apply!(A a, B b, C c, D d, E e, F f);

/// Adapt a multi-parameter function into one taking a tuple element
pub fn spread<Args, F>(func: F) -> impl Fn(Args) -> F::Output + Send + Sync
where
    F: Apply<Args> + Send + Sync,
{
    move |args| func.apply(args)
}
