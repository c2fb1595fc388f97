//! Receiver rebinding with partial application.
//!
//! A [`Method`] is a shared callable that reads its receiver explicitly.
//! [`rebind`] fixes the receiver and yields a [`Rebound`]; rebinding a
//! `Rebound` again reuses its origin and prefix instead of wrapping it, so a
//! chain of rebinds is always one level deep.

use std::fmt;
use std::rc::Rc;

pub type Method<Ctx, A, Out> = Rc<dyn Fn(&Ctx, Vec<A>) -> Out>;

/// Wraps `f` as a shareable [`Method`].
pub fn method<Ctx, A, Out>(f: impl Fn(&Ctx, Vec<A>) -> Out + 'static) -> Method<Ctx, A, Out> {
    Rc::new(f)
}

/// Turns a free function that takes its receiver as an explicit leading
/// parameter into a method that reads the receiver it is invoked with.
pub fn as_receiver_parameter<Ctx, A, Out>(
    f: impl Fn(Ctx, Vec<A>) -> Out + 'static,
) -> Method<Ctx, A, Out>
where
    Ctx: Clone + 'static,
    A: 'static,
    Out: 'static,
{
    Rc::new(move |receiver: &Ctx, args: Vec<A>| f(receiver.clone(), args))
}

/// A method with a fixed receiver and a prefix of pre-applied arguments.
pub struct Rebound<Ctx, A, Out> {
    origin: Method<Ctx, A, Out>,
    context: Ctx,
    prefix: Vec<A>,
}

impl<Ctx, A, Out> Rebound<Ctx, A, Out> {
    /// The callable this wrapper ultimately calls.
    pub fn origin(&self) -> &Method<Ctx, A, Out> {
        &self.origin
    }

    pub fn context(&self) -> &Ctx {
        &self.context
    }

    pub fn prefix(&self) -> &[A] {
        &self.prefix
    }

    pub fn is_bound_to(&self, origin: &Method<Ctx, A, Out>) -> bool {
        Rc::ptr_eq(&self.origin, origin)
    }

    pub fn rebind(self, context: Ctx) -> Self {
        rebind(self, context)
    }

    pub fn rebind_with(self, context: Ctx, args: impl IntoIterator<Item = A>) -> Self {
        rebind_with(self, context, args)
    }
}

impl<Ctx, A: Clone, Out> Rebound<Ctx, A, Out> {
    /// Calls the origin with the bound receiver and `prefix ++ args`.
    pub fn call(&self, args: impl IntoIterator<Item = A>) -> Out {
        let mut arguments = self.prefix.clone();
        arguments.extend(args);
        (self.origin)(&self.context, arguments)
    }
}

impl<Ctx: Clone, A: Clone, Out> Clone for Rebound<Ctx, A, Out> {
    fn clone(&self) -> Self {
        Self {
            origin: Rc::clone(&self.origin),
            context: self.context.clone(),
            prefix: self.prefix.clone(),
        }
    }
}

impl<Ctx, A: fmt::Debug, Out> fmt::Debug for Rebound<Ctx, A, Out> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rebound")
            .field("origin", &Rc::as_ptr(&self.origin).cast::<()>())
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// Anything [`rebind`] accepts: a bare method or an existing [`Rebound`].
pub trait Rebindable<Ctx, A, Out> {
    /// Splits into the origin callable and the accumulated prefix.
    fn into_origin(self) -> (Method<Ctx, A, Out>, Vec<A>);
}

impl<Ctx, A, Out> Rebindable<Ctx, A, Out> for Method<Ctx, A, Out> {
    fn into_origin(self) -> (Method<Ctx, A, Out>, Vec<A>) {
        (self, Vec::new())
    }
}

impl<Ctx, A, Out> Rebindable<Ctx, A, Out> for Rebound<Ctx, A, Out> {
    fn into_origin(self) -> (Method<Ctx, A, Out>, Vec<A>) {
        (self.origin, self.prefix)
    }
}

pub fn rebind<Ctx, A, Out>(
    original: impl Rebindable<Ctx, A, Out>,
    context: Ctx,
) -> Rebound<Ctx, A, Out> {
    rebind_with(original, context, std::iter::empty())
}

/// Like [`rebind`], additionally appending `args` to the pre-applied prefix.
pub fn rebind_with<Ctx, A, Out>(
    original: impl Rebindable<Ctx, A, Out>,
    context: Ctx,
    args: impl IntoIterator<Item = A>,
) -> Rebound<Ctx, A, Out> {
    let (origin, mut prefix) = original.into_origin();
    prefix.extend(args);
    Rebound {
        origin,
        context,
        prefix,
    }
}

#[cfg(test)]
#[path = "tests/rebind_tests.rs"]
mod tests;
