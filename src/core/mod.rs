//! Pure reconciliation core: spec model, validator, drift detector, rate
//! limiter, and the reconciler that ties them together. Free of any
//! `tonic`/`ContainerRuntime`-implementation detail beyond the trait, so it
//! is independently unit-testable against `runtime::FakeRuntime`.

pub mod drift;
pub mod ratelimit;
pub mod reconcile;
pub mod spec;
pub mod validate;
