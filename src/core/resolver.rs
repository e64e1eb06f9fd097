//! BD-004: Recipe resolution.
//!
//! Turns a recipe value into the value handed to a component constructor.
//! The set of resolvable shapes is closed:
//!
//! - scalars and [`Opaque`] handles resolve to themselves
//! - `Vec<V>` resolves element-wise, order and length preserved
//! - tuples (arity 0 to 12) resolve element-wise, arity and order preserved
//! - blueprint handles resolve to their bound instance
//!
//! [`Resolve`] is sealed; no other crate can add a case.

use super::blueprint::{
    BindableFrom, Blueprint, Category, Component, InCategory, RecipeTrailer, TypedBlueprint,
};
use super::cache::BindingCache;
use super::error::BindError;
use super::types::{BindingContext, Verbosity};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

mod sealed {
    pub trait Sealed {}
}

/// A recipe value that can be resolved against a binding context.
pub trait Resolve<C: BindingContext>: sealed::Sealed {
    /// Shape after resolution, as seen by the target constructor.
    type Resolved;

    fn resolve(&self, ctx: &Arc<C>, cache: &mut BindingCache) -> Result<Self::Resolved, BindError>;
}

// ============================================================================
// Scalars
// ============================================================================

macro_rules! resolve_as_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl<C: BindingContext> Resolve<C> for $ty {
                type Resolved = $ty;

                fn resolve(&self, _ctx: &Arc<C>, _cache: &mut BindingCache) -> Result<$ty, BindError> {
                    Ok(<$ty as Clone>::clone(self))
                }
            }
        )*
    };
}

resolve_as_scalar!(
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    bool,
    char,
    String,
    &'static str,
    Verbosity,
);

/// Shared handle to a value the resolver passes through untouched.
///
/// Use this for constructor arguments that are neither scalars nor
/// blueprints, e.g. a pre-built lookup table shared by several components.
pub struct Opaque<T: ?Sized>(pub Arc<T>);

impl<T> Opaque<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(value))
    }
}

impl<T: ?Sized> Opaque<T> {
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: ?Sized> Clone for Opaque<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> Deref for Opaque<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Opaque<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Opaque").field(&&*self.0).finish()
    }
}

impl<T: ?Sized + Send + Sync + 'static> sealed::Sealed for Opaque<T> {}

impl<C: BindingContext, T: ?Sized + Send + Sync + 'static> Resolve<C> for Opaque<T> {
    type Resolved = Opaque<T>;

    fn resolve(&self, _ctx: &Arc<C>, _cache: &mut BindingCache) -> Result<Opaque<T>, BindError> {
        Ok(self.clone())
    }
}

// ============================================================================
// Sequences
// ============================================================================

impl<V: sealed::Sealed> sealed::Sealed for Vec<V> {}

impl<C: BindingContext, V: Resolve<C>> Resolve<C> for Vec<V> {
    type Resolved = Vec<V::Resolved>;

    fn resolve(&self, ctx: &Arc<C>, cache: &mut BindingCache) -> Result<Self::Resolved, BindError> {
        let mut resolved = Vec::with_capacity(self.len());
        for elem in self {
            resolved.push(elem.resolve(ctx, cache)?);
        }
        Ok(resolved)
    }
}

// ============================================================================
// Tuples
// ============================================================================

macro_rules! resolve_tuple {
    ($($name:ident $idx:tt),*) => {
        impl<$($name: sealed::Sealed),*> sealed::Sealed for ($($name,)*) {}

        impl<C: BindingContext, $($name: Resolve<C>),*> Resolve<C> for ($($name,)*) {
            type Resolved = ($($name::Resolved,)*);

            #[allow(unused_variables, clippy::unused_unit)]
            fn resolve(&self, ctx: &Arc<C>, cache: &mut BindingCache) -> Result<Self::Resolved, BindError> {
                Ok(($(self.$idx.resolve(ctx, cache)?,)*))
            }
        }
    };
}

resolve_tuple!();
resolve_tuple!(A 0);
resolve_tuple!(A 0, B 1);
resolve_tuple!(A 0, B 1, D 2);
resolve_tuple!(A 0, B 1, D 2, E 3);
resolve_tuple!(A 0, B 1, D 2, E 3, F 4);
resolve_tuple!(A 0, B 1, D 2, E 3, F 4, G 5);
resolve_tuple!(A 0, B 1, D 2, E 3, F 4, G 5, H 6);
resolve_tuple!(A 0, B 1, D 2, E 3, F 4, G 5, H 6, I 7);
resolve_tuple!(A 0, B 1, D 2, E 3, F 4, G 5, H 6, I 7, J 8);
resolve_tuple!(A 0, B 1, D 2, E 3, F 4, G 5, H 6, I 7, J 8, L 9);
resolve_tuple!(A 0, B 1, D 2, E 3, F 4, G 5, H 6, I 7, J 8, L 9, M 10);
resolve_tuple!(A 0, B 1, D 2, E 3, F 4, G 5, H 6, I 7, J 8, L 9, M 10, N 11);

// ============================================================================
// Blueprint references
// ============================================================================

impl<C: BindingContext, K: Category + ?Sized> sealed::Sealed for Arc<dyn TypedBlueprint<C, K>> {}

impl<C: BindingContext, K: Category + ?Sized> Resolve<C> for Arc<dyn TypedBlueprint<C, K>> {
    type Resolved = Arc<K>;

    fn resolve(&self, ctx: &Arc<C>, cache: &mut BindingCache) -> Result<Arc<K>, BindError> {
        self.bind_with_cache(ctx, cache)
    }
}

impl<T, K: ?Sized, A> sealed::Sealed for Arc<Blueprint<T, K, A>> {}

impl<C, T, K, A> Resolve<C> for Arc<Blueprint<T, K, A>>
where
    C: BindingContext,
    K: Category + ?Sized,
    A: Resolve<C> + RecipeTrailer + Send + Sync + 'static,
    T: Component<Context = C> + BindableFrom<A::Resolved> + InCategory<K>,
{
    type Resolved = Arc<K>;

    fn resolve(&self, ctx: &Arc<C>, cache: &mut BindingCache) -> Result<Arc<K>, BindError> {
        self.bind_with_cache(ctx, cache)
    }
}
