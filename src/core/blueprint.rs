//! BD-005: Blueprints, categories, and the constructibility contract.
//!
//! A [`Blueprint`] is a task-independent recipe for one component. Binding it
//! against a context resolves its recipe (see [`super::resolver`]) and calls
//! the target type's constructor with the context followed by the resolved
//! arguments. Bound instances are memoized per `(blueprint, context)` in a
//! [`BindingCache`].
//!
//! Whether a target type accepts a recipe is decided by trait bounds when
//! the blueprint is created, so a mismatched recipe never compiles:
//!
//! ```compile_fail
//! use bindery::core::blueprint::make_blueprint;
//! use bindery::core::types::Verbosity;
//! use bindery::domain::evaluator::{ConstEvaluator, Evaluator};
//!
//! // ConstEvaluator takes an integer, not a string.
//! let bp = make_blueprint::<ConstEvaluator, dyn Evaluator, _>(("two", "c", Verbosity::Normal));
//! ```
//!
//! The recipe must also end in the `(description, verbosity)` trailer, even
//! when the target type accepts the bare arguments:
//!
//! ```compile_fail
//! use bindery::core::blueprint::{make_blueprint, BindableFrom, Category, Component};
//! use bindery::core::error::BindError;
//! use bindery::domain::task::Task;
//! use std::sync::Arc;
//!
//! trait Gauge: Send + Sync {}
//!
//! impl Category for dyn Gauge {
//!     const NAME: &'static str = "Gauge";
//! }
//!
//! struct Level(i64);
//!
//! impl Gauge for Level {}
//!
//! impl Component for Level {
//!     type Context = Task;
//! }
//!
//! impl BindableFrom<(i64,)> for Level {
//!     fn bind_from(_task: &Arc<Task>, (v,): (i64,)) -> Result<Self, BindError> {
//!         Ok(Level(v))
//!     }
//! }
//!
//! bindery::impl_category!(dyn Gauge: Level);
//!
//! let bp = make_blueprint::<Level, dyn Gauge, _>((2i64,));
//! ```

use super::cache::BindingCache;
use super::error::BindError;
use super::resolver::Resolve;
use super::types::{BindingContext, BlueprintId, CacheKey, Verbosity};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, trace};

// ============================================================================
// Categories and components
// ============================================================================

/// A role that interchangeable components play, e.g. `dyn Evaluator`.
///
/// Implemented on the trait-object type of the role's trait.
pub trait Category: Send + Sync + 'static {
    const NAME: &'static str;
}

/// Membership of a concrete component type in a category.
///
/// Usually declared with [`impl_category!`](crate::impl_category).
pub trait InCategory<K: Category + ?Sized>: Send + Sync + 'static {
    fn into_category(self: Arc<Self>) -> Arc<K>;
}

/// Declare that concrete types belong to a category.
///
/// ```ignore
/// impl_category!(dyn Evaluator: ConstEvaluator, SumEvaluator);
/// ```
#[macro_export]
macro_rules! impl_category {
    (dyn $category:path: $($ty:ty),+ $(,)?) => {
        $(
            impl $crate::core::blueprint::InCategory<dyn $category> for $ty {
                fn into_category(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<dyn $category> {
                    self
                }
            }
        )+
    };
}

/// A type that can be bound from a blueprint.
pub trait Component: Send + Sync + 'static {
    /// The binding context the component is constructed against.
    type Context: BindingContext;
}

/// Construction from the context plus a resolved recipe.
///
/// A type may implement this for several recipe shapes; each shape is a
/// separate constructor.
pub trait BindableFrom<Args>: Component + Sized {
    fn bind_from(ctx: &Arc<Self::Context>, args: Args) -> Result<Self, BindError>;
}

// ============================================================================
// Recipe trailer
// ============================================================================

/// Recipes end in `(description, verbosity)`.
///
/// Implemented only for tuples whose last two elements are a string-like
/// description and a [`Verbosity`], so the convention is checked at compile
/// time.
pub trait RecipeTrailer {
    /// Number of recipe arguments in front of the trailer.
    const LEADING: usize;

    fn description(&self) -> &str;
    fn verbosity(&self) -> Verbosity;
}

macro_rules! recipe_trailer {
    ($desc:tt, $verb:tt; $($name:ident),*) => {
        impl<$($name,)* S: AsRef<str>> RecipeTrailer for ($($name,)* S, Verbosity) {
            const LEADING: usize = $desc;

            fn description(&self) -> &str {
                self.$desc.as_ref()
            }

            fn verbosity(&self) -> Verbosity {
                self.$verb
            }
        }
    };
}

recipe_trailer!(0, 1;);
recipe_trailer!(1, 2; A);
recipe_trailer!(2, 3; A, B);
recipe_trailer!(3, 4; A, B, D);
recipe_trailer!(4, 5; A, B, D, E);
recipe_trailer!(5, 6; A, B, D, E, F);
recipe_trailer!(6, 7; A, B, D, E, F, G);
recipe_trailer!(7, 8; A, B, D, E, F, G, H);
recipe_trailer!(8, 9; A, B, D, E, F, G, H, I);
recipe_trailer!(9, 10; A, B, D, E, F, G, H, I, J);
recipe_trailer!(10, 11; A, B, D, E, F, G, H, I, J, L);

// ============================================================================
// Blueprints
// ============================================================================

/// Category-typed handle to a blueprint of any concrete target type.
pub trait TypedBlueprint<C: BindingContext, K: Category + ?Sized>: Send + Sync {
    fn id(&self) -> BlueprintId;

    fn description(&self) -> &str;

    fn verbosity(&self) -> Verbosity;

    /// Name of the concrete target type.
    fn target(&self) -> &'static str;

    /// Bind against `ctx`, sharing instances through `cache`.
    fn bind_with_cache(&self, ctx: &Arc<C>, cache: &mut BindingCache) -> Result<Arc<K>, BindError>;

    /// Bind as a root component with a fresh cache.
    ///
    /// Instances are shared only within this call. Two calls never share
    /// instances, even for the same context; thread a cache through
    /// [`bind_with_cache`](Self::bind_with_cache) for that.
    fn bind(&self, ctx: &Arc<C>) -> Result<Arc<K>, BindError> {
        if self.verbosity() > Verbosity::Silent {
            info!(
                description = self.description(),
                category = K::NAME,
                context = %ctx.context_id(),
                "binding root component"
            );
        }
        let mut cache = BindingCache::new();
        self.bind_with_cache(ctx, &mut cache)
    }
}

/// Shared, category-typed blueprint handle.
pub type BlueprintRef<C, K> = Arc<dyn TypedBlueprint<C, K>>;

/// Binding context of component type `T`.
pub type ContextOf<T> = <T as Component>::Context;

/// Shape of recipe `A` after resolution against context `C`.
pub type ResolvedOf<A, C> = <A as Resolve<C>>::Resolved;

/// Recipe `A` for target type `T` in category `K`.
pub struct Blueprint<T, K: ?Sized, A> {
    id: BlueprintId,
    description: String,
    verbosity: Verbosity,
    args: A,
    _target: PhantomData<fn() -> (Arc<T>, Arc<K>)>,
}

impl<C, T, K, A> Blueprint<T, K, A>
where
    C: BindingContext,
    K: Category + ?Sized,
    A: Resolve<C> + RecipeTrailer + Send + Sync + 'static,
    T: Component<Context = C> + BindableFrom<A::Resolved> + InCategory<K>,
{
    pub fn new(args: A) -> Self {
        Self {
            id: BlueprintId::next(),
            description: args.description().to_string(),
            verbosity: args.verbosity(),
            args,
            _target: PhantomData,
        }
    }

    /// Erase the target type, keeping the category.
    pub fn into_ref(self) -> BlueprintRef<C, K> {
        Arc::new(self)
    }

    fn construct(&self, ctx: &Arc<C>, cache: &mut BindingCache) -> Result<Arc<K>, BindError> {
        let resolved = self.args.resolve(ctx, cache)?;
        if self.verbosity >= Verbosity::Debug {
            trace!(
                blueprint = %self.id,
                arguments = A::LEADING,
                "recipe resolved"
            );
        }
        let component = T::bind_from(ctx, resolved)?;
        Ok(<T as InCategory<K>>::into_category(Arc::new(component)))
    }
}

impl<T, K: ?Sized, A> Blueprint<T, K, A> {
    pub fn args(&self) -> &A {
        &self.args
    }
}

impl<C, T, K, A> TypedBlueprint<C, K> for Blueprint<T, K, A>
where
    C: BindingContext,
    K: Category + ?Sized,
    A: Resolve<C> + RecipeTrailer + Send + Sync + 'static,
    T: Component<Context = C> + BindableFrom<A::Resolved> + InCategory<K>,
{
    fn id(&self) -> BlueprintId {
        self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    fn target(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn bind_with_cache(
        &self,
        ctx: &Arc<C>,
        cache: &mut BindingCache,
    ) -> Result<Arc<K>, BindError> {
        let key = CacheKey::new(self.id, ctx.context_id());
        let logged = self.verbosity > Verbosity::Silent;

        if let Some(instance) = cache.lookup::<K>(&key) {
            if logged {
                debug!(
                    blueprint = %self.id,
                    context = %key.context,
                    description = %self.description,
                    "reusing bound component"
                );
            }
            return Ok(instance);
        }

        if logged {
            debug!(
                blueprint = %self.id,
                context = %key.context,
                description = %self.description,
                category = K::NAME,
                "creating bound component"
            );
        }

        let checkpoint = cache.checkpoint();
        match self.construct(ctx, cache) {
            Ok(instance) => {
                cache.insert(key, Arc::clone(&instance));
                Ok(instance)
            }
            Err(e) => {
                let dropped = cache.rollback(checkpoint);
                if logged {
                    debug!(
                        blueprint = %self.id,
                        description = %self.description,
                        dropped,
                        error = %e,
                        "binding failed"
                    );
                }
                Err(e)
            }
        }
    }
}

impl<T, K: ?Sized, A: fmt::Debug> fmt::Debug for Blueprint<T, K, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blueprint")
            .field("id", &self.id)
            .field("target", &std::any::type_name::<T>())
            .field("description", &self.description)
            .field("verbosity", &self.verbosity)
            .field("args", &self.args)
            .finish()
    }
}

/// Create a shared blueprint for `T` in category `K` from recipe `args`.
pub fn make_blueprint<T, K, A>(args: A) -> BlueprintRef<ContextOf<T>, K>
where
    K: Category + ?Sized,
    T: Component + BindableFrom<ResolvedOf<A, ContextOf<T>>> + InCategory<K>,
    A: Resolve<ContextOf<T>> + RecipeTrailer + Send + Sync + 'static,
{
    Blueprint::<T, K, A>::new(args).into_ref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ContextId;

    // Minimal self-contained domain: a counter context and two "meters".

    struct Ctx {
        id: ContextId,
        scale: i64,
    }

    impl Ctx {
        fn new(scale: i64) -> Arc<Self> {
            Arc::new(Self {
                id: ContextId::next(),
                scale,
            })
        }
    }

    impl BindingContext for Ctx {
        fn context_id(&self) -> ContextId {
            self.id
        }
    }

    trait Meter: Send + Sync {
        fn read(&self) -> i64;

        fn context_scale(&self) -> Option<i64> {
            None
        }
    }

    impl Category for dyn Meter {
        const NAME: &'static str = "Meter";
    }

    struct Fixed {
        reading: i64,
    }

    impl Component for Fixed {
        type Context = Ctx;
    }

    impl BindableFrom<(i64, &'static str, Verbosity)> for Fixed {
        fn bind_from(
            ctx: &Arc<Ctx>,
            (value, _, _): (i64, &'static str, Verbosity),
        ) -> Result<Self, BindError> {
            if value < 0 {
                return Err(BindError::invalid_parameter("fixed", "value", "must be >= 0"));
            }
            Ok(Self {
                reading: value * ctx.scale,
            })
        }
    }

    // Bare-argument constructor; usable directly but never as a recipe.
    impl BindableFrom<(i64,)> for Fixed {
        fn bind_from(ctx: &Arc<Ctx>, (value,): (i64,)) -> Result<Self, BindError> {
            Ok(Self {
                reading: value * ctx.scale,
            })
        }
    }

    impl Meter for Fixed {
        fn read(&self) -> i64 {
            self.reading
        }
    }

    struct Total {
        parts: Vec<Arc<dyn Meter>>,
        retained: Arc<Ctx>,
    }

    impl Component for Total {
        type Context = Ctx;
    }

    impl BindableFrom<(Vec<Arc<dyn Meter>>, String, Verbosity)> for Total {
        fn bind_from(
            ctx: &Arc<Ctx>,
            (parts, _, _): (Vec<Arc<dyn Meter>>, String, Verbosity),
        ) -> Result<Self, BindError> {
            Ok(Self {
                parts,
                retained: Arc::clone(ctx),
            })
        }
    }

    impl Meter for Total {
        fn read(&self) -> i64 {
            self.parts.iter().map(|p| p.read()).sum()
        }

        fn context_scale(&self) -> Option<i64> {
            Some(self.retained.scale)
        }
    }

    crate::impl_category!(dyn Meter: Fixed, Total);

    fn fixed(v: i64) -> BlueprintRef<Ctx, dyn Meter> {
        make_blueprint::<Fixed, dyn Meter, _>((v, "fixed", Verbosity::Silent))
    }

    fn total(parts: Vec<BlueprintRef<Ctx, dyn Meter>>) -> BlueprintRef<Ctx, dyn Meter> {
        make_blueprint::<Total, dyn Meter, _>((parts, "total".to_string(), Verbosity::Normal))
    }

    #[test]
    fn test_bd005_metadata_from_trailer() {
        let bp = make_blueprint::<Fixed, dyn Meter, _>((3i64, "three", Verbosity::Verbose));
        assert_eq!(bp.description(), "three");
        assert_eq!(bp.verbosity(), Verbosity::Verbose);
        assert!(bp.target().ends_with("Fixed"));
    }

    #[test]
    fn test_bd005_trailer_leading_count() {
        assert_eq!(<(&str, Verbosity) as RecipeTrailer>::LEADING, 0);
        assert_eq!(<(i64, bool, String, Verbosity) as RecipeTrailer>::LEADING, 2);
    }

    #[test]
    fn test_bd005_bare_arguments_need_trailer_for_recipes() {
        let ctx = Ctx::new(2);
        let direct = <Fixed as BindableFrom<(i64,)>>::bind_from(&ctx, (4i64,)).unwrap();
        assert_eq!(direct.read(), 8);
        // The same value goes through a blueprint only with the trailer attached.
        let bp = make_blueprint::<Fixed, dyn Meter, _>((4i64, "four", Verbosity::Silent));
        assert_eq!(bp.bind(&ctx).unwrap().read(), 8);
    }

    #[test]
    fn test_bd005_bind_passes_context() {
        let ctx = Ctx::new(10);
        let bound = fixed(4).bind(&ctx).unwrap();
        assert_eq!(bound.read(), 40);
    }

    #[test]
    fn test_bd005_distinct_contexts_distinct_instances() {
        let bp = fixed(1);
        let a = Ctx::new(1);
        let b = Ctx::new(2);
        let mut cache = BindingCache::new();
        let x = bp.bind_with_cache(&a, &mut cache).unwrap();
        let y = bp.bind_with_cache(&b, &mut cache).unwrap();
        assert!(!Arc::ptr_eq(&x, &y));
        assert_eq!(x.read(), 1);
        assert_eq!(y.read(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_bd005_shared_cache_across_roots() {
        let bp = fixed(5);
        let ctx = Ctx::new(1);
        let mut cache = BindingCache::new();
        let first = bp.bind_with_cache(&ctx, &mut cache).unwrap();
        let second = bp.bind_with_cache(&ctx, &mut cache).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_bd005_fresh_cache_per_root_bind() {
        let bp = fixed(5);
        let ctx = Ctx::new(1);
        let first = bp.bind(&ctx).unwrap();
        let second = bp.bind(&ctx).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.read(), second.read());
    }

    #[test]
    fn test_bd005_domain_error_passes_through() {
        let ctx = Ctx::new(1);
        let err = fixed(-1).bind(&ctx).err().unwrap();
        assert_eq!(
            err,
            BindError::invalid_parameter("fixed", "value", "must be >= 0")
        );
    }

    #[test]
    fn test_bd005_failed_bind_leaves_cache_untouched() {
        let ctx = Ctx::new(1);
        let ok = fixed(1);
        let bad = total(vec![fixed(2), ok.clone(), fixed(-3)]);
        let mut cache = BindingCache::new();

        assert!(bad.bind_with_cache(&ctx, &mut cache).is_err());
        assert!(cache.is_empty());

        ok.bind_with_cache(&ctx, &mut cache).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(bad.bind_with_cache(&ctx, &mut cache).is_err());
        assert_eq!(cache.keys(), vec![CacheKey::new(ok.id(), ctx.context_id())]);
    }

    #[test]
    fn test_bd005_shared_child_bound_once() {
        let ctx = Ctx::new(1);
        let shared = fixed(7);
        let root = total(vec![shared.clone(), shared.clone(), fixed(1)]);
        let mut cache = BindingCache::new();
        let bound = root.bind_with_cache(&ctx, &mut cache).unwrap();
        assert_eq!(bound.read(), 15);
        assert_eq!(cache.len(), 3);
        assert!(cache.contains(&CacheKey::new(shared.id(), ctx.context_id())));
    }

    #[test]
    fn test_bd005_component_may_retain_context() {
        let ctx = Ctx::new(3);
        let bp = Blueprint::<Total, dyn Meter, _>::new((
            vec![fixed(1)],
            "kept".to_string(),
            Verbosity::Silent,
        ));
        let mut cache = BindingCache::new();
        bp.bind_with_cache(&ctx, &mut cache).unwrap();
        let key = CacheKey::new(TypedBlueprint::id(&bp), ctx.context_id());
        let bound = cache.get::<dyn Meter>(&key).unwrap();
        assert_eq!(bound.context_scale(), Some(3));
        // The constructed Total holds its own handle to the context.
        assert_eq!(Arc::strong_count(&ctx), 2);
    }

    #[test]
    fn test_bd005_debug_format() {
        let bp = Blueprint::<Fixed, dyn Meter, _>::new((8i64, "eight", Verbosity::Normal));
        let text = format!("{:?}", bp);
        assert!(text.contains("eight"));
        assert!(text.contains("Fixed"));
        assert_eq!(bp.args().0, 8);
    }
}
